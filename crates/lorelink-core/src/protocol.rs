//! Wire message protocol
//!
//! This module defines the envelope format and the enumerated message
//! catalog exchanged between peers. Every frame on the wire is one JSON
//! object `{"type": ..., "payload": ...}`; the catalog is a closed tagged
//! union, so adding a message type is a compile-time-checked change to the
//! reconciler's exhaustive match.
//!
//! There are no sequence numbers, acknowledgments, or checksums: delivery
//! and per-peer ordering are whatever the underlying channel guarantees.

use serde::{Deserialize, Serialize};

use crate::model::{
    Archetype, Character, CharacterPatch, Item, LogEntry, MapToken, Monster, ReplicatedState,
    Rumor,
};
use crate::types::PeerId;
use crate::Result;

// ----------------------------------------------------------------------------
// Identity Handshake Payload
// ----------------------------------------------------------------------------

/// Handshake announcement: who this process is and the complete set of
/// characters it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityPayload {
    pub identity: PeerId,
    pub display_name: String,
    /// The announcing owner's full roster; replaces any prior set on receipt
    pub characters: Vec<Character>,
}

// ----------------------------------------------------------------------------
// Message Catalog
// ----------------------------------------------------------------------------

/// The enumerated message catalog.
///
/// One variant per wire message type; the serde representation is the
/// `{"type", "payload"}` envelope used on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Handshake: announce self and owned characters
    Identity(IdentityPayload),
    /// Host-to-joiner bootstrap: the whole world
    SyncState(Box<ReplicatedState>),
    /// A new character entity was created somewhere
    AddCharacter(Character),
    /// Incremental field-level mutation of an existing character
    UpdateCharacter { id: String, updates: CharacterPatch },
    /// Full replacement of active party membership
    UpdateParty(Vec<String>),
    /// Full replacement of map token positions
    UpdateMap(Vec<MapToken>),
    /// Upsert a shared archetype into the catalog
    ShareArchetype(Archetype),
    /// Upsert a shared item into the catalog
    ShareItem(Item),
    /// Upsert a shared monster into the catalog
    ShareMonster(Monster),
    /// Append to the active campaign's log
    NewMessage(LogEntry),
    /// Full replacement of the ambient rumor feed
    UpdateRumors(Vec<Rumor>),
}

impl Message {
    /// Wire tag of this message, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Identity(_) => "IDENTITY",
            Message::SyncState(_) => "SYNC_STATE",
            Message::AddCharacter(_) => "ADD_CHARACTER",
            Message::UpdateCharacter { .. } => "UPDATE_CHARACTER",
            Message::UpdateParty(_) => "UPDATE_PARTY",
            Message::UpdateMap(_) => "UPDATE_MAP",
            Message::ShareArchetype(_) => "SHARE_ARCHETYPE",
            Message::ShareItem(_) => "SHARE_ITEM",
            Message::ShareMonster(_) => "SHARE_MONSTER",
            Message::NewMessage(_) => "NEW_MESSAGE",
            Message::UpdateRumors(_) => "UPDATE_RUMORS",
        }
    }

    /// Encode to a single wire frame
    pub fn to_wire(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode one wire frame.
    ///
    /// Any failure here (malformed JSON, unknown type tag, wrong payload
    /// shape) is a protocol failure: callers drop the frame with no side
    /// effect.
    pub fn from_wire(frame: &str) -> Result<Self> {
        Ok(serde_json::from_str(frame)?)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
