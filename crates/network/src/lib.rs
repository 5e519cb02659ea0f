//! # EOClient Packet Dispatch
//!
//! Routes decoded packets to the handlers registered for their
//! `(family, action)` key.
//!
//! ## Modules
//!
//! - [`state`] - Injected game state repository
//! - [`handlers`] - Handler types and the build-once dispatch table
//! - [`routes`] - Packets the client knows how to handle
//! - [`dispatcher`] - Gating, per-entry locking and the dispatch loop

pub mod state;
pub mod handlers;
pub mod routes;
pub mod dispatcher;

// Re-export commonly used items
pub use state::GameStateRepository;
pub use handlers::{DispatchTable, DispatchTableBuilder, HandlerEntry, HandlerFunction, PacketHandler};
pub use routes::{known_route, KnownRoute, KNOWN_ROUTES};
pub use dispatcher::{spawn_dispatch_loop, DispatchOutcome, PacketDispatcher};
