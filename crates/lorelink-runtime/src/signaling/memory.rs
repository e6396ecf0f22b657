//! In-process signaling hub
//!
//! A rendezvous implementation of [`SignalingClient`] for tests and demos:
//! identities are allocated locally, and "connections" are pairs of ordered
//! in-memory pipes with pump tasks translating them into link events. Frame
//! delivery is per-connection FIFO, matching the channel guarantee the real
//! transport provides; nothing orders frames across different peers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use lorelink_core::PeerId;

use crate::channel::{create_link_channel, LinkEvent, LinkEventReceiver, LinkEventSender};
use crate::registry::Connection;
use crate::signaling::SignalingClient;
use crate::{Result, RuntimeError};

// ----------------------------------------------------------------------------
// Hub
// ----------------------------------------------------------------------------

/// Shared rendezvous point; every endpoint created from one hub can dial
/// every other by identity.
#[derive(Debug, Clone, Default)]
pub struct MemoryHub {
    endpoints: Arc<Mutex<HashMap<PeerId, LinkEventSender>>>,
}

impl MemoryHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client plus the receiver its link events arrive on
    pub fn endpoint(&self) -> (MemorySignaling, LinkEventReceiver) {
        let (events_tx, events_rx) = create_link_channel();
        (
            MemorySignaling {
                hub: self.clone(),
                events: events_tx,
                identity: None,
            },
            events_rx,
        )
    }

    fn register(&self, identity: PeerId, events: LinkEventSender) {
        self.endpoints
            .lock()
            .expect("hub lock poisoned")
            .insert(identity, events);
    }

    fn lookup(&self, identity: &PeerId) -> Option<LinkEventSender> {
        self.endpoints
            .lock()
            .expect("hub lock poisoned")
            .get(identity)
            .cloned()
    }
}

// ----------------------------------------------------------------------------
// Client
// ----------------------------------------------------------------------------

/// One process's view of the in-memory hub
#[derive(Debug)]
pub struct MemorySignaling {
    hub: MemoryHub,
    events: LinkEventSender,
    identity: Option<PeerId>,
}

#[async_trait]
impl SignalingClient for MemorySignaling {
    async fn request_identity(&mut self) -> Result<PeerId> {
        if let Some(identity) = &self.identity {
            return Ok(identity.clone());
        }

        let identity = PeerId::new(format!("mem-{}", Uuid::new_v4().simple()));
        self.hub.register(identity.clone(), self.events.clone());
        self.identity = Some(identity.clone());
        debug!(%identity, "identity assigned");
        Ok(identity)
    }

    async fn connect(&mut self, target: &PeerId) -> Result<Connection> {
        let caller = self
            .identity
            .clone()
            .ok_or(RuntimeError::NotBootstrapped)?;
        let callee_events = self.hub.lookup(target).ok_or_else(|| RuntimeError::UnknownPeer {
            peer: target.to_string(),
        })?;

        // One ordered pipe per direction; the pumps die with their pipe and
        // report the close to whichever side is still listening.
        let (to_callee_tx, to_callee_rx) = mpsc::unbounded_channel();
        let (to_caller_tx, to_caller_rx) = mpsc::unbounded_channel();
        tokio::spawn(pump_frames(
            to_callee_rx,
            callee_events.clone(),
            caller.clone(),
        ));
        tokio::spawn(pump_frames(to_caller_rx, self.events.clone(), target.clone()));

        // Callee learns of the connection, then both sides see it open. The
        // caller's open event queues behind this call returning, so the
        // session registers the connection before handling the open.
        let _ = callee_events.send(LinkEvent::IncomingConnection {
            connection: Connection::connecting(caller.clone(), false, to_caller_tx),
        });
        let _ = callee_events.send(LinkEvent::ConnectionOpened { peer: caller });
        let _ = self.events.send(LinkEvent::ConnectionOpened {
            peer: target.clone(),
        });

        Ok(Connection::connecting(target.clone(), true, to_callee_tx))
    }
}

/// Forward one pipe into a link-event stream until either end goes away
async fn pump_frames(
    mut frames: mpsc::UnboundedReceiver<String>,
    events: LinkEventSender,
    from: PeerId,
) {
    while let Some(frame) = frames.recv().await {
        let delivered = events.send(LinkEvent::FrameReceived {
            peer: from.clone(),
            frame,
        });
        if delivered.is_err() {
            return;
        }
    }
    let _ = events.send(LinkEvent::ConnectionClosed { peer: from });
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_identities_are_unique_and_stable() {
        let hub = MemoryHub::new();
        let (mut a, _rx_a) = hub.endpoint();
        let (mut b, _rx_b) = hub.endpoint();

        let id_a = a.request_identity().await.unwrap();
        let id_b = b.request_identity().await.unwrap();
        assert_ne!(id_a, id_b);

        // Asking again returns the same identity
        assert_eq!(a.request_identity().await.unwrap(), id_a);
    }

    #[tokio::test]
    async fn test_connect_unknown_identity_fails() {
        let hub = MemoryHub::new();
        let (mut a, _rx_a) = hub.endpoint();
        a.request_identity().await.unwrap();

        let result = a.connect(&PeerId::new("nobody")).await;
        assert!(matches!(result, Err(RuntimeError::UnknownPeer { .. })));
    }

    #[tokio::test]
    async fn test_frames_flow_both_ways_in_order() {
        let hub = MemoryHub::new();
        let (mut a, mut rx_a) = hub.endpoint();
        let (mut b, mut rx_b) = hub.endpoint();

        let id_a = a.request_identity().await.unwrap();
        let id_b = b.request_identity().await.unwrap();

        let mut a_to_b = a.connect(&id_b).await.unwrap();
        a_to_b.mark_open();

        // Callee side: incoming connection, then open
        let incoming = rx_b.recv().await.unwrap();
        let mut b_to_a = match incoming {
            LinkEvent::IncomingConnection { connection } => connection,
            other => panic!("expected incoming connection, got {other:?}"),
        };
        b_to_a.mark_open();
        assert!(matches!(
            rx_b.recv().await.unwrap(),
            LinkEvent::ConnectionOpened { .. }
        ));
        assert!(matches!(
            rx_a.recv().await.unwrap(),
            LinkEvent::ConnectionOpened { .. }
        ));

        a_to_b.send_frame("first");
        a_to_b.send_frame("second");
        b_to_a.send_frame("reply");

        match rx_b.recv().await.unwrap() {
            LinkEvent::FrameReceived { peer, frame } => {
                assert_eq!(peer, id_a);
                assert_eq!(frame, "first");
            }
            other => panic!("expected frame, got {other:?}"),
        }
        match rx_b.recv().await.unwrap() {
            LinkEvent::FrameReceived { frame, .. } => assert_eq!(frame, "second"),
            other => panic!("expected frame, got {other:?}"),
        }
        match rx_a.recv().await.unwrap() {
            LinkEvent::FrameReceived { peer, frame } => {
                assert_eq!(peer, id_b);
                assert_eq!(frame, "reply");
            }
            other => panic!("expected frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dropping_a_connection_closes_the_remote_side() {
        let hub = MemoryHub::new();
        let (mut a, _rx_a) = hub.endpoint();
        let (mut b, mut rx_b) = hub.endpoint();

        a.request_identity().await.unwrap();
        let id_b = b.request_identity().await.unwrap();

        let a_to_b = a.connect(&id_b).await.unwrap();
        let _incoming = rx_b.recv().await.unwrap();
        let _opened = rx_b.recv().await.unwrap();

        drop(a_to_b);

        match rx_b.recv().await.unwrap() {
            LinkEvent::ConnectionClosed { .. } => {}
            other => panic!("expected close, got {other:?}"),
        }
    }
}
