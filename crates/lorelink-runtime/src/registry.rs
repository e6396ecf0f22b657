//! Connection registry
//!
//! The registry owns the set of peer channels for the lifetime of the
//! session. Connections are created by the signaling layer, added here, and
//! leave exactly once, driven by their own close event — no component polls
//! or force-removes a healthy connection.

use std::collections::HashMap;

use lorelink_core::PeerId;
use tokio::sync::mpsc;
use tracing::trace;

// ----------------------------------------------------------------------------
// Connection
// ----------------------------------------------------------------------------

/// Send half of one duplex channel; frames written here are delivered to the
/// remote peer in order.
pub type FrameSender = mpsc::UnboundedSender<String>;

/// Lifecycle state of one peer channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Open,
    Closed,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Connecting => write!(f, "Connecting"),
            ConnectionStatus::Open => write!(f, "Open"),
            ConnectionStatus::Closed => write!(f, "Closed"),
        }
    }
}

/// One duplex channel to one remote peer identity.
///
/// The send capability is honored only while `Open`; sending on a channel
/// whose remote has gone away is silently dropped, matching the
/// fire-and-forget contract.
#[derive(Debug)]
pub struct Connection {
    peer: PeerId,
    status: ConnectionStatus,
    /// True when this process dialed the remote side
    outbound: bool,
    frames: FrameSender,
}

impl Connection {
    /// Create a connection still completing its open handshake
    pub fn connecting(peer: PeerId, outbound: bool, frames: FrameSender) -> Self {
        Self {
            peer,
            status: ConnectionStatus::Connecting,
            outbound,
            frames,
        }
    }

    pub fn peer(&self) -> &PeerId {
        &self.peer
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn is_open(&self) -> bool {
        self.status == ConnectionStatus::Open
    }

    pub fn is_outbound(&self) -> bool {
        self.outbound
    }

    pub(crate) fn mark_open(&mut self) {
        self.status = ConnectionStatus::Open;
    }

    pub(crate) fn mark_closed(&mut self) {
        self.status = ConnectionStatus::Closed;
    }

    /// Send one wire frame, valid only while `Open`.
    ///
    /// A send to a connection that closed mid-iteration is dropped; the
    /// frame either lands or is lost with the channel.
    pub fn send_frame(&self, frame: &str) {
        if !self.is_open() {
            trace!(peer = %self.peer, status = %self.status, "send on non-open connection dropped");
            return;
        }
        if self.frames.send(frame.to_string()).is_err() {
            trace!(peer = %self.peer, "send on closing connection dropped");
        }
    }
}

// ----------------------------------------------------------------------------
// Connection Registry
// ----------------------------------------------------------------------------

/// Owner of all live peer channels for the session
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<PeerId, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection, replacing any stale entry under the same identity
    pub fn add(&mut self, connection: Connection) {
        self.connections
            .insert(connection.peer().clone(), connection);
    }

    /// Remove a connection. Idempotent: removing an identity not present is
    /// a no-op.
    pub fn remove(&mut self, peer: &PeerId) -> Option<Connection> {
        let mut removed = self.connections.remove(peer);
        if let Some(connection) = removed.as_mut() {
            connection.mark_closed();
        }
        removed
    }

    /// Flip the identified connection to `Open`, returning whether it was
    /// outbound. `None` when no such connection is registered.
    pub fn mark_open(&mut self, peer: &PeerId) -> Option<bool> {
        let connection = self.connections.get_mut(peer)?;
        connection.mark_open();
        Some(connection.is_outbound())
    }

    pub fn get(&self, peer: &PeerId) -> Option<&Connection> {
        self.connections.get(peer)
    }

    /// All connections currently `Open`. Never yields a `Closed` entry.
    pub fn open_connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values().filter(|c| c.is_open())
    }

    /// Identities of the open connections, the visible connected-peer roster
    pub fn open_peers(&self) -> Vec<PeerId> {
        self.open_connections().map(|c| c.peer().clone()).collect()
    }

    pub fn open_count(&self) -> usize {
        self.open_connections().count()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_connection(id: &str) -> (Connection, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Connection::connecting(PeerId::new(id), false, tx), rx)
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut registry = ConnectionRegistry::new();
        let (connection, _rx) = test_connection("p1");
        registry.add(connection);

        assert!(registry.remove(&PeerId::new("p1")).is_some());
        assert!(registry.remove(&PeerId::new("p1")).is_none());
        assert!(registry.remove(&PeerId::new("never-added")).is_none());
    }

    #[test]
    fn test_open_connections_excludes_connecting() {
        let mut registry = ConnectionRegistry::new();
        let (a, _rx_a) = test_connection("a");
        let (b, _rx_b) = test_connection("b");
        registry.add(a);
        registry.add(b);

        assert_eq!(registry.open_count(), 0);

        registry.mark_open(&PeerId::new("a"));
        assert_eq!(registry.open_count(), 1);
        assert_eq!(registry.open_peers(), vec![PeerId::new("a")]);
    }

    #[test]
    fn test_mark_open_reports_direction() {
        let mut registry = ConnectionRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        registry.add(Connection::connecting(PeerId::new("out"), true, tx));

        assert_eq!(registry.mark_open(&PeerId::new("out")), Some(true));
        assert_eq!(registry.mark_open(&PeerId::new("missing")), None);
    }

    #[test]
    fn test_send_frame_only_while_open() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut connection = Connection::connecting(PeerId::new("p"), false, tx);

        connection.send_frame("early");
        assert!(rx.try_recv().is_err());

        connection.mark_open();
        connection.send_frame("hello");
        assert_eq!(rx.try_recv().unwrap(), "hello");

        connection.mark_closed();
        connection.send_frame("late");
        assert!(rx.try_recv().is_err());
    }
}
