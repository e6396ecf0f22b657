//! Session construction
//!
//! Wires the channel lanes, spawns the session task, and hands back the
//! endpoints a caller actually uses: a command sender, an app-event
//! receiver, and watch handles over the replicated state and the
//! connected-peer roster.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use lorelink_core::{PeerId, ReplicatedState};

use crate::channel::{
    create_app_event_channel, create_command_channel, AppEvent, AppEventReceiver, Command,
    CommandSender, LinkEventReceiver,
};
use crate::persistence::{MemorySnapshotStore, SnapshotStore};
use crate::session::{SessionConfig, SessionManager};
use crate::signaling::SignalingClient;
use crate::{Result, RuntimeError};

// ----------------------------------------------------------------------------
// Builder
// ----------------------------------------------------------------------------

/// Builder for one session task
pub struct SessionBuilder {
    config: SessionConfig,
    signaling: Box<dyn SignalingClient>,
    link_events: LinkEventReceiver,
    snapshots: Arc<dyn SnapshotStore>,
}

impl SessionBuilder {
    /// Start from a config and the signaling client plus the link-event
    /// receiver it was constructed with
    pub fn new(
        config: SessionConfig,
        signaling: impl SignalingClient + 'static,
        link_events: LinkEventReceiver,
    ) -> Self {
        Self {
            config,
            signaling: Box::new(signaling),
            link_events,
            snapshots: Arc::new(MemorySnapshotStore::new()),
        }
    }

    /// Replace the default in-memory snapshot store
    pub fn with_snapshot_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.snapshots = store;
        self
    }

    /// Spawn the session task and return its handle
    pub fn spawn(self) -> SessionHandle {
        let (command_tx, command_rx) = create_command_channel();
        let (app_tx, app_rx) = create_app_event_channel();
        let (state_tx, state_rx) = watch::channel(ReplicatedState::new());
        let (roster_tx, roster_rx) = watch::channel(Vec::new());

        let manager = SessionManager::new(
            self.config,
            self.signaling,
            self.link_events,
            self.snapshots,
            command_rx,
            app_tx,
            state_tx,
            roster_tx,
        );
        let task = tokio::spawn(manager.run());

        SessionHandle {
            commands: command_tx,
            app_events: app_rx,
            state: state_rx,
            roster: roster_rx,
            task,
        }
    }
}

// ----------------------------------------------------------------------------
// Handle
// ----------------------------------------------------------------------------

/// Caller-side endpoints of a running session
pub struct SessionHandle {
    pub commands: CommandSender,
    pub app_events: AppEventReceiver,
    state: watch::Receiver<ReplicatedState>,
    roster: watch::Receiver<Vec<PeerId>>,
    task: JoinHandle<Result<()>>,
}

impl SessionHandle {
    /// Enqueue a command; a session that has already shut down ignores it
    pub fn send(&self, command: Command) {
        let _ = self.commands.send(command);
    }

    /// Current replicated state, as last published by the session task
    pub fn state(&self) -> ReplicatedState {
        self.state.borrow().clone()
    }

    /// Current connected-peer roster
    pub fn roster(&self) -> Vec<PeerId> {
        self.roster.borrow().clone()
    }

    /// Next app event, or `None` once the session is gone
    pub async fn next_event(&mut self) -> Option<AppEvent> {
        self.app_events.recv().await
    }

    /// Request shutdown and wait for the session task to finish
    pub async fn shutdown(self) -> Result<()> {
        self.send(Command::Shutdown);
        self.task
            .await
            .map_err(|error| RuntimeError::Task(error.to_string()))?
    }
}
