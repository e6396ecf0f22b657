//! Session channel protocol types
//!
//! All communication with the session task flows through these typed
//! channels: `Command` in from the UI boundary, `LinkEvent` in from the
//! signaling transport, `AppEvent` out to whatever renders the session.
//! The session task never blocks on a send; every lane is an unbounded
//! fire-and-continue channel.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

use lorelink_core::model::{
    Archetype, Character, CharacterPatch, Item, LogEntry, MapToken, Monster, Rumor,
};
use lorelink_core::PeerId;

use crate::registry::Connection;

// ----------------------------------------------------------------------------
// Command: UI Boundary → Session
// ----------------------------------------------------------------------------

/// Discrete intents accepted from the UI boundary (or any local producer,
/// including the generative-content collaborator). Each state-mutating
/// command becomes a local reconcile plus a broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Command {
    /// Begin a sharing session unprompted; this process's snapshot becomes
    /// the authoritative world for joiners
    HostSession,
    /// Dial another peer; joining an existing mesh defers authority to the
    /// remote side
    JoinSession { target: PeerId },
    AddCharacter(Character),
    UpdateCharacter { id: String, updates: CharacterPatch },
    SetParty(Vec<String>),
    SetMapTokens(Vec<MapToken>),
    ShareArchetype(Archetype),
    ShareItem(Item),
    ShareMonster(Monster),
    PostLogEntry(LogEntry),
    SetRumors(Vec<Rumor>),
    /// Local-only: create a campaign (replicated to joiners via SYNC_STATE)
    CreateCampaign { name: String },
    /// Local-only: choose which campaign receives NEW_MESSAGE appends
    SetActiveCampaign(Option<String>),
    /// The only way friend records die
    ClearFriends,
    SaveSnapshot,
    Shutdown,
}

// ----------------------------------------------------------------------------
// LinkEvent: Signaling Transport → Session
// ----------------------------------------------------------------------------

/// Events delivered by the signaling transport: inbound connections, open
/// and close transitions, and raw wire frames.
#[derive(Debug)]
pub enum LinkEvent {
    /// A remote peer dialed us; the connection is still completing its open
    IncomingConnection { connection: Connection },
    /// A connection (either direction) finished opening
    ConnectionOpened { peer: PeerId },
    /// One wire frame arrived; frames from a single peer arrive in the
    /// order that peer sent them
    FrameReceived { peer: PeerId, frame: String },
    /// The channel closed or errored; terminal for that connection
    ConnectionClosed { peer: PeerId },
}

// ----------------------------------------------------------------------------
// AppEvent: Session → UI Boundary
// ----------------------------------------------------------------------------

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Process started, no identity requested yet
    Idle,
    /// Waiting on the signaling round-trip for a peer identity
    Bootstrapping,
    /// Identity assigned; accepting and initiating connections
    Active,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "Idle"),
            SessionPhase::Bootstrapping => write!(f, "Bootstrapping"),
            SessionPhase::Active => write!(f, "Active"),
        }
    }
}

/// State changes the UI boundary needs to know about
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AppEvent {
    PhaseChanged { phase: SessionPhase },
    /// Identity assigned; the session can now host or join
    SessionReady { identity: PeerId },
    PeerConnected { peer: PeerId },
    PeerDisconnected { peer: PeerId },
    /// The replicated state changed; `kind` is the wire tag (or a local
    /// mutation label) that caused it
    StateChanged { kind: String },
    SnapshotSaved { account_key: String },
}

// ----------------------------------------------------------------------------
// Channel Plumbing
// ----------------------------------------------------------------------------

pub type CommandSender = mpsc::UnboundedSender<Command>;
pub type CommandReceiver = mpsc::UnboundedReceiver<Command>;
pub type LinkEventSender = mpsc::UnboundedSender<LinkEvent>;
pub type LinkEventReceiver = mpsc::UnboundedReceiver<LinkEvent>;
pub type AppEventSender = mpsc::UnboundedSender<AppEvent>;
pub type AppEventReceiver = mpsc::UnboundedReceiver<AppEvent>;

pub fn create_command_channel() -> (CommandSender, CommandReceiver) {
    mpsc::unbounded_channel()
}

pub fn create_link_channel() -> (LinkEventSender, LinkEventReceiver) {
    mpsc::unbounded_channel()
}

pub fn create_app_event_channel() -> (AppEventSender, AppEventReceiver) {
    mpsc::unbounded_channel()
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_phase_display() {
        assert_eq!(format!("{}", SessionPhase::Idle), "Idle");
        assert_eq!(format!("{}", SessionPhase::Active), "Active");
    }

    #[test]
    fn test_command_serialization() {
        let cmd = Command::SetParty(vec!["c1".to_string()]);
        let json = serde_json::to_string(&cmd).unwrap();
        let back: Command = serde_json::from_str(&json).unwrap();
        match back {
            Command::SetParty(ids) => assert_eq!(ids, vec!["c1".to_string()]),
            other => panic!("wrong command variant: {other:?}"),
        }
    }
}
