//! Packet dispatcher
//!
//! Unknown packets and packets arriving in the wrong game state are dropped
//! without error, so a newer server or a late message during a state change
//! never breaks the client. Handler errors and panics are logged and the
//! dispatcher keeps going.

use crate::handlers::DispatchTable;
use crate::state::GameStateRepository;
use eoclient_core::GameState;
use eoclient_protocol::Packet;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};

/// What happened to a dispatched packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The handler ran and succeeded
    Handled,
    /// No handler is registered for the key
    Unhandled,
    /// In-game-only handler while not in game
    Gated,
    /// The dispatcher was disconnected
    Disconnected,
    /// The handler returned an error or panicked
    Failed,
    /// The raw frame could not be decoded
    Malformed,
}

/// Routes packets through a [`DispatchTable`]
pub struct PacketDispatcher {
    table: Arc<DispatchTable>,
    state: Arc<GameStateRepository>,
    connected: AtomicBool,
    shutdown: watch::Sender<bool>,
}

impl PacketDispatcher {
    pub fn new(table: DispatchTable, state: Arc<GameStateRepository>) -> Self {
        Self {
            table: Arc::new(table),
            state,
            connected: AtomicBool::new(true),
            shutdown: watch::channel(false).0,
        }
    }

    pub fn table(&self) -> &DispatchTable {
        &self.table
    }

    pub fn state(&self) -> &Arc<GameStateRepository> {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Stop dispatching and return to the initial state
    ///
    /// Handlers already running are left to finish.
    pub fn disconnect(&self) {
        if self.connected.swap(false, Ordering::AcqRel) {
            tracing::info!("Packet dispatcher disconnected");
            self.state.set_state(GameState::Initial);
            self.shutdown.send_replace(true);
        }
    }

    /// Receiver that sees `true` once [`disconnect`](Self::disconnect) runs
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Dispatch one packet
    pub async fn dispatch(&self, packet: Packet) -> DispatchOutcome {
        let key = packet.key();

        if !self.is_connected() {
            tracing::trace!("Dropping {} after disconnect", key);
            return DispatchOutcome::Disconnected;
        }

        let Some(entry) = self.table.get(key) else {
            tracing::trace!("Dropping unhandled packet {}", key);
            return DispatchOutcome::Unhandled;
        };

        if self.is_gated(entry.in_game_only()) {
            tracing::trace!("Ignoring {} while {}", key, self.state.state().as_str());
            return DispatchOutcome::Gated;
        }

        let _guard = entry.lock().lock().await;

        // The state may have moved on while this packet waited for the entry
        if !self.is_connected() {
            tracing::trace!("Dropping {} after disconnect", key);
            return DispatchOutcome::Disconnected;
        }
        if self.is_gated(entry.in_game_only()) {
            tracing::trace!("Ignoring queued {} while {}", key, self.state.state().as_str());
            return DispatchOutcome::Gated;
        }

        let handler = entry.handler();
        let result = match std::panic::catch_unwind(AssertUnwindSafe(|| handler(packet))) {
            Ok(future) => AssertUnwindSafe(future).catch_unwind().await,
            Err(panic) => Err(panic),
        };

        match result {
            Ok(Ok(())) => DispatchOutcome::Handled,
            Ok(Err(e)) => {
                tracing::warn!("Handler for {} failed: {}", key, e);
                DispatchOutcome::Failed
            }
            Err(panic) => {
                tracing::error!("Handler for {} panicked: {}", key, panic_message(&*panic));
                DispatchOutcome::Failed
            }
        }
    }

    fn is_gated(&self, in_game_only: bool) -> bool {
        in_game_only && !self.state.is_in_game()
    }

    /// Decode a de-framed buffer and dispatch it
    pub async fn dispatch_raw(&self, data: &[u8]) -> DispatchOutcome {
        match Packet::from_bytes(data) {
            Ok(packet) => self.dispatch(packet).await,
            Err(e) => {
                tracing::warn!("Dropping malformed packet: {}", e);
                DispatchOutcome::Malformed
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

/// Run every packet from `receiver` on its own task
///
/// The loop ends when the channel closes or the dispatcher disconnects, and
/// the returned handle resolves once all started handlers have finished.
pub fn spawn_dispatch_loop(dispatcher: Arc<PacketDispatcher>, mut receiver: mpsc::Receiver<Packet>) -> JoinHandle<()> {
    let mut shutdown = dispatcher.shutdown_signal();
    tokio::spawn(async move {
        let mut in_flight = JoinSet::new();

        // A disconnect before the subscription is caught by the flag check
        while dispatcher.is_connected() {
            tokio::select! {
                packet = receiver.recv() => {
                    let Some(packet) = packet else { break };
                    if !dispatcher.is_connected() {
                        break;
                    }
                    let dispatcher = Arc::clone(&dispatcher);
                    in_flight.spawn(async move { dispatcher.dispatch(packet).await });
                }
                // Only ever flips to true
                _ = shutdown.changed() => break,
                Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
            }
        }

        while in_flight.join_next().await.is_some() {}
        tracing::debug!("Dispatch loop stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::DispatchTableBuilder;
    use eoclient_core::EoError;
    use eoclient_protocol::{PacketAction, PacketFamily, PacketKey};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::Barrier;

    fn login_reply() -> PacketKey {
        PacketKey::new(PacketFamily::Login, PacketAction::Reply)
    }

    fn walk_player() -> PacketKey {
        PacketKey::new(PacketFamily::Walk, PacketAction::Player)
    }

    fn packet(key: PacketKey) -> Packet {
        Packet::new(key.family, key.action, Vec::new())
    }

    fn counting(builder: &mut DispatchTableBuilder, key: PacketKey, in_game_only: bool) -> Arc<AtomicUsize> {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        builder.register_function(key, in_game_only, move |_packet| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        calls
    }

    fn dispatcher(builder: DispatchTableBuilder) -> PacketDispatcher {
        PacketDispatcher::new(builder.build(), Arc::new(GameStateRepository::new()))
    }

    #[tokio::test]
    async fn test_registered_handler_runs_once() {
        let mut builder = DispatchTableBuilder::new();
        let calls = counting(&mut builder, login_reply(), false);
        let dispatcher = dispatcher(builder);

        assert_eq!(dispatcher.dispatch(packet(login_reply())).await, DispatchOutcome::Handled);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let unregistered = PacketKey::new(PacketFamily::Other(200), PacketAction::Other(99));
        assert_eq!(dispatcher.dispatch(packet(unregistered)).await, DispatchOutcome::Unhandled);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_in_game_gating() {
        let mut builder = DispatchTableBuilder::new();
        let calls = counting(&mut builder, walk_player(), true);
        let dispatcher = dispatcher(builder);

        dispatcher.state().set_state(GameState::LoggedIn);
        assert_eq!(dispatcher.dispatch(packet(walk_player())).await, DispatchOutcome::Gated);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        dispatcher.state().set_state(GameState::InGame);
        assert_eq!(dispatcher.dispatch(packet(walk_player())).await, DispatchOutcome::Handled);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_dispatch() {
        let mut builder = DispatchTableBuilder::new();
        builder.register_function(login_reply(), false, |_packet| async move {
            Err(EoError::Handler("bad reply".into()))
        });
        builder.register_function(walk_player(), false, |packet| async move {
            if packet.body.is_empty() {
                panic!("handler bug");
            }
            Ok(())
        });
        let calls = counting(&mut builder, PacketKey::new(PacketFamily::Init, PacketAction::Init), false);
        let dispatcher = dispatcher(builder);

        assert_eq!(dispatcher.dispatch(packet(login_reply())).await, DispatchOutcome::Failed);
        assert_eq!(dispatcher.dispatch(packet(walk_player())).await, DispatchOutcome::Failed);
        // The panicking entry's lock is released
        assert_eq!(dispatcher.dispatch(packet(walk_player())).await, DispatchOutcome::Failed);

        let init = PacketKey::new(PacketFamily::Init, PacketAction::Init);
        assert_eq!(dispatcher.dispatch(packet(init)).await, DispatchOutcome::Handled);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disconnect_stops_dispatch() {
        let mut builder = DispatchTableBuilder::new();
        let calls = counting(&mut builder, login_reply(), false);
        let dispatcher = dispatcher(builder);
        dispatcher.state().set_state(GameState::InGame);

        dispatcher.disconnect();
        assert!(!dispatcher.is_connected());
        assert_eq!(dispatcher.state().state(), GameState::Initial);
        assert_eq!(dispatcher.dispatch(packet(login_reply())).await, DispatchOutcome::Disconnected);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_queued_packet_rechecks_gate() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut builder = DispatchTableBuilder::new();
        builder.register_function(walk_player(), true, move |_packet| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(())
            }
        });
        let dispatcher = Arc::new(dispatcher(builder));
        dispatcher.state().set_state(GameState::InGame);

        let first = {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move { dispatcher.dispatch(packet(walk_player())).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move { dispatcher.dispatch(packet(walk_player())).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Leave the world while the second packet waits for the entry
        dispatcher.state().set_state(GameState::LoggedIn);

        assert_eq!(first.await.unwrap(), DispatchOutcome::Handled);
        assert_eq!(second.await.unwrap(), DispatchOutcome::Gated);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispatch_raw() {
        let mut builder = DispatchTableBuilder::new();
        let calls = counting(&mut builder, login_reply(), false);
        let dispatcher = dispatcher(builder);

        assert_eq!(dispatcher.dispatch_raw(&[3]).await, DispatchOutcome::Malformed);
        // action Reply, family Login
        assert_eq!(dispatcher.dispatch_raw(&[3, 4, 2]).await, DispatchOutcome::Handled);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_key_never_overlaps() {
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));

        let mut builder = DispatchTableBuilder::new();
        let (a, m) = (Arc::clone(&active), Arc::clone(&max_active));
        builder.register_function(login_reply(), false, move |_packet| {
            let (active, max_active) = (Arc::clone(&a), Arc::clone(&m));
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_active.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        });
        let dispatcher = Arc::new(dispatcher(builder));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let dispatcher = Arc::clone(&dispatcher);
                tokio::spawn(async move { dispatcher.dispatch(packet(login_reply())).await })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap(), DispatchOutcome::Handled);
        }

        assert_eq!(max_active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_different_keys_overlap() {
        // Both handlers must be inside their bodies at once to pass the barrier
        let barrier = Arc::new(Barrier::new(2));
        let mut builder = DispatchTableBuilder::new();
        for key in [login_reply(), walk_player()] {
            let barrier = Arc::clone(&barrier);
            builder.register_function(key, false, move |_packet| {
                let barrier = Arc::clone(&barrier);
                async move {
                    tokio::time::timeout(Duration::from_secs(5), barrier.wait())
                        .await
                        .map_err(|_| EoError::Handler("handlers did not overlap".into()))?;
                    Ok(())
                }
            });
        }
        let dispatcher = dispatcher(builder);

        let (first, second) = tokio::join!(
            dispatcher.dispatch(packet(login_reply())),
            dispatcher.dispatch(packet(walk_player()))
        );
        assert_eq!(first, DispatchOutcome::Handled);
        assert_eq!(second, DispatchOutcome::Handled);
    }

    #[tokio::test]
    async fn test_dispatch_loop_drains_channel() {
        let mut builder = DispatchTableBuilder::new();
        let calls = counting(&mut builder, login_reply(), false);
        let dispatcher = Arc::new(dispatcher(builder));

        let (sender, receiver) = mpsc::channel(16);
        let handle = spawn_dispatch_loop(Arc::clone(&dispatcher), receiver);
        for _ in 0..3 {
            sender.send(packet(login_reply())).await.unwrap();
        }
        sender.send(packet(walk_player())).await.unwrap();
        drop(sender);

        handle.await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_dispatch_loop_stops_on_idle_disconnect() {
        let mut builder = DispatchTableBuilder::new();
        let calls = counting(&mut builder, login_reply(), false);
        let dispatcher = Arc::new(dispatcher(builder));

        let (sender, receiver) = mpsc::channel(16);
        let handle = spawn_dispatch_loop(Arc::clone(&dispatcher), receiver);
        sender.send(packet(login_reply())).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        // The sender stays alive, so only the disconnect can end the loop
        dispatcher.disconnect();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("dispatch loop kept running after disconnect")
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        drop(sender);
    }

    #[tokio::test]
    async fn test_dispatch_loop_after_earlier_disconnect() {
        let dispatcher = Arc::new(dispatcher(DispatchTableBuilder::new()));
        dispatcher.disconnect();

        let (_sender, receiver) = mpsc::channel::<Packet>(1);
        let handle = spawn_dispatch_loop(Arc::clone(&dispatcher), receiver);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("dispatch loop started after disconnect")
            .unwrap();
    }
}
