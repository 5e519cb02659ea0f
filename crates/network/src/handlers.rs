//! # Packet Handler System
//!
//! This module provides the build-once table mapping packet keys to
//! handlers.
//!
//! # Architecture
//!
//! ## Dispatch Table
//!
//! A [`DispatchTableBuilder`] collects handlers during client construction
//! and is frozen into a [`DispatchTable`]. After that the table is never
//! modified, so lookups need no locking.
//!
//! ## Per-Entry Locks
//!
//! Every [`HandlerEntry`] owns an async mutex. Two packets with the same key
//! never run their handler at the same time, while packets with different
//! keys run unimpeded.
//!
//! # Thread Safety
//!
//! Handlers are called from many tasks. Any state they share beyond their
//! own entry must be protected by the handler (`Mutex`, `RwLock`, etc.).
//!
//! # Example
//!
//! ```no_run
//! use eoclient_network::DispatchTableBuilder;
//! use eoclient_protocol::{PacketAction, PacketFamily, PacketKey};
//!
//! let mut builder = DispatchTableBuilder::new();
//!
//! builder.register_function(
//!     PacketKey::new(PacketFamily::Login, PacketAction::Reply),
//!     false,
//!     |packet| async move {
//!         println!("Login reply: {} bytes", packet.body.len());
//!         Ok(())
//!     },
//! );
//!
//! let table = builder.build();
//! assert_eq!(table.len(), 1);
//! ```

use crate::routes::known_route;
use async_trait::async_trait;
use eoclient_core::{EoError, Result};
use eoclient_protocol::{Packet, PacketKey};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Type for packet handler functions
///
/// The packet is passed by value (its body is reference counted) so the
/// returned future is `'static` and can run on any task.
pub type HandlerFunction = Arc<dyn Fn(Packet) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> + Send + Sync>;

/// Trait for stateful packet handlers
#[async_trait]
pub trait PacketHandler: Send + Sync {
    async fn handle(&self, packet: Packet) -> Result<()>;
}

/// One routed handler
pub struct HandlerEntry {
    handler: HandlerFunction,
    in_game_only: bool,
    lock: Mutex<()>,
}

impl HandlerEntry {
    fn new(handler: HandlerFunction, in_game_only: bool) -> Self {
        Self {
            handler,
            in_game_only,
            lock: Mutex::new(()),
        }
    }

    /// Whether the handler only runs while in game
    #[inline]
    pub fn in_game_only(&self) -> bool {
        self.in_game_only
    }

    pub(crate) fn handler(&self) -> &HandlerFunction {
        &self.handler
    }

    pub(crate) fn lock(&self) -> &Mutex<()> {
        &self.lock
    }
}

impl std::fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("in_game_only", &self.in_game_only)
            .finish_non_exhaustive()
    }
}

/// Collects handlers before the table is frozen
#[derive(Default)]
pub struct DispatchTableBuilder {
    entries: HashMap<PacketKey, HandlerEntry>,
}

impl DispatchTableBuilder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function-based handler
    ///
    /// Registering the same key twice replaces the earlier handler.
    pub fn register_function<F, Fut>(&mut self, key: PacketKey, in_game_only: bool, handler: F)
    where
        F: Fn(Packet) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let handler: HandlerFunction = Arc::new(move |packet: Packet| -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
            Box::pin(handler(packet))
        });
        self.insert(key, HandlerEntry::new(handler, in_game_only));
    }

    /// Register a [`PacketHandler`] implementation
    pub fn register_handler<H>(&mut self, key: PacketKey, in_game_only: bool, handler: Arc<H>)
    where
        H: PacketHandler + 'static,
    {
        let handler: HandlerFunction = Arc::new(move |packet: Packet| -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
            let handler = Arc::clone(&handler);
            Box::pin(async move { handler.handle(packet).await })
        });
        self.insert(key, HandlerEntry::new(handler, in_game_only));
    }

    /// Register a handler for one of the [`KNOWN_ROUTES`](crate::KNOWN_ROUTES),
    /// taking the in-game gate from the route table
    ///
    /// # Errors
    /// [`EoError::Handler`] if `key` is not a known route.
    pub fn register_known<F, Fut>(&mut self, key: PacketKey, handler: F) -> Result<()>
    where
        F: Fn(Packet) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let route = known_route(key)
            .ok_or_else(|| EoError::Handler(format!("{} is not a known route", key)))?;
        self.register_function(key, route.in_game_only, handler);
        Ok(())
    }

    fn insert(&mut self, key: PacketKey, entry: HandlerEntry) {
        tracing::debug!("Registered handler for {} (in game only: {})", key, entry.in_game_only);
        if self.entries.insert(key, entry).is_some() {
            tracing::warn!("Handler for {} replaced", key);
        }
    }

    /// Check if a handler is registered for a key
    pub fn has_handler(&self, key: PacketKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Freeze the table
    pub fn build(self) -> DispatchTable {
        DispatchTable {
            entries: self.entries,
        }
    }
}

/// Read-only mapping from packet keys to handlers
#[derive(Debug, Default)]
pub struct DispatchTable {
    entries: HashMap<PacketKey, HandlerEntry>,
}

impl DispatchTable {
    #[inline]
    pub fn get(&self, key: PacketKey) -> Option<&HandlerEntry> {
        self.entries.get(&key)
    }

    pub fn has_handler(&self, key: PacketKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Get the number of registered handlers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = PacketKey> + '_ {
        self.entries.keys().copied()
    }
}
