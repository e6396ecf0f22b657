//! Signaling collaborator seam
//!
//! The signaling/rendezvous service is external to this repository: it hands
//! a process a globally addressable peer identity and brokers the initial
//! connection handshake between two identities. The session engine reaches
//! it only through [`SignalingClient`]; everything after the handshake
//! (frames, closes) arrives as [`LinkEvent`]s on the receiver handed out
//! when the client was constructed.

mod memory;

pub use memory::{MemoryHub, MemorySignaling};

use async_trait::async_trait;

use lorelink_core::PeerId;

use crate::registry::Connection;
use crate::Result;

/// Client view of the external signaling service.
///
/// Both operations are asynchronous and may fail or never resolve; callers
/// degrade silently on failure rather than retrying.
#[async_trait]
pub trait SignalingClient: Send {
    /// Request a globally addressable identity for this process
    async fn request_identity(&mut self) -> Result<PeerId>;

    /// Dial a remote identity.
    ///
    /// Resolves to a connection still in `Connecting`; the matching
    /// `ConnectionOpened` event arrives on the link-event stream once the
    /// channel is usable.
    async fn connect(&mut self, target: &PeerId) -> Result<Connection>;
}
