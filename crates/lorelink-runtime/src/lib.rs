//! Lorelink Runtime Engine
//!
//! This crate contains the session engine for the lorelink mesh, including:
//! - `ConnectionRegistry`: ownership of open peer channels
//! - `broadcast`: fire-and-forget fan-out to every open connection
//! - `SessionManager`: the task orchestrating handshake, reconciliation, and
//!   the visible connected-peer roster
//! - The `SignalingClient` and `SnapshotStore` collaborator seams, with
//!   in-process implementations for tests and demos
//!
//! This is the "engine" of lorelink — it drives the protocol and state rules
//! that `lorelink-core` defines.

pub mod broadcast;
pub mod builder;
pub mod channel;
pub mod persistence;
pub mod registry;
pub mod session;
pub mod signaling;

pub use broadcast::broadcast;
pub use builder::{SessionBuilder, SessionHandle};
pub use channel::{
    create_app_event_channel, create_command_channel, create_link_channel, AppEvent,
    AppEventReceiver, AppEventSender, Command, CommandReceiver, CommandSender, LinkEvent,
    LinkEventReceiver, LinkEventSender, SessionPhase,
};
pub use persistence::{MemorySnapshotStore, SnapshotStore};
pub use registry::{Connection, ConnectionRegistry, ConnectionStatus, FrameSender};
pub use session::{SessionConfig, SessionManager};
pub use signaling::{MemoryHub, MemorySignaling, SignalingClient};

// Re-export core types for convenience
pub use lorelink_core::{Message, PeerId, ReplicatedState};

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Runtime error types for the session engine
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("Core protocol error: {0}")]
    Core(#[from] lorelink_core::LorelinkError),

    #[error("Signaling error: {0}")]
    Signaling(String),

    #[error("No peer registered under identity {peer}")]
    UnknownPeer { peer: String },

    #[error("No local identity assigned yet")]
    NotBootstrapped,

    #[error("Snapshot store error: {0}")]
    Snapshot(String),

    #[error("Session task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
