//! Lorelink Core Protocol Implementation
//!
//! This crate provides the message catalog, the replicated session state
//! model, and the reconciliation rules that keep every participant's local
//! copy of shared state convergent. It performs no I/O: connection handling
//! and broadcast live in `lorelink-runtime`.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod model;
pub mod protocol;
pub mod reconcile;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use model::{
    Account, Archetype, Campaign, Character, CharacterPatch, Friend, Item, LogEntry, MapToken,
    Monster, ReplicatedState, Rumor,
};
pub use protocol::{IdentityPayload, Message};
pub use types::{PeerId, Timestamp};

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Core error types for the lorelink protocol
#[derive(Debug, thiserror::Error)]
pub enum LorelinkError {
    #[error("Wire codec error: {0}")]
    Wire(#[from] serde_json::Error),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

impl LorelinkError {
    /// Convenience constructor for malformed-message errors
    pub fn invalid_message(reason: impl Into<String>) -> Self {
        Self::InvalidMessage(reason.into())
    }
}

pub type Result<T> = core::result::Result<T, LorelinkError>;
