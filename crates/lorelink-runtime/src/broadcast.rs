//! Broadcast emitter
//!
//! Fans a locally produced message out to every open connection in the
//! registry. Fire-and-forget by contract: no return value, no partial
//! failure reporting, no queuing or coalescing. A connection closing
//! mid-iteration simply misses the frame.

use lorelink_core::Message;
use tracing::{trace, warn};

use crate::registry::ConnectionRegistry;

/// Send one message to every open connection.
pub fn broadcast(registry: &ConnectionRegistry, message: &Message) {
    let frame = match message.to_wire() {
        Ok(frame) => frame,
        Err(error) => {
            warn!(kind = message.kind(), %error, "unencodable message not broadcast");
            return;
        }
    };

    for connection in registry.open_connections() {
        connection.send_frame(&frame);
    }
    trace!(
        kind = message.kind(),
        peers = registry.open_count(),
        "broadcast"
    );
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
