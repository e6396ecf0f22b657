//! Replicated session state model
//!
//! This module defines the shared session payload kept convergent across
//! peers: character rosters, party composition, map tokens, campaign logs,
//! shared creations, and the durable friend roster. The reconciliation rules
//! that mutate this state live in [`crate::reconcile`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{PeerId, Timestamp};

// ----------------------------------------------------------------------------
// Account
// ----------------------------------------------------------------------------

/// The local user-account identity.
///
/// This is the one field of [`ReplicatedState`] that an inbound SYNC_STATE
/// never overwrites: a joiner absorbing the host's world keeps its own login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Persistence key for snapshot load/save
    pub key: String,
    /// Display name announced in the IDENTITY handshake
    pub display_name: String,
}

impl Account {
    pub fn new(key: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
        }
    }
}

// ----------------------------------------------------------------------------
// Friend
// ----------------------------------------------------------------------------

/// Durable record of a peer learned through the IDENTITY handshake.
///
/// Keyed by display name; replaced whole on every handshake and never
/// deleted automatically (explicit clear only). A disconnected friend
/// remains known, just inactive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
    pub display_name: String,
    pub identity: PeerId,
    /// Dialable address for reconnecting; for the current signaling service
    /// this is the identity string itself.
    pub peer_address: String,
}

impl Friend {
    pub fn new(display_name: impl Into<String>, identity: PeerId) -> Self {
        let peer_address = identity.as_str().to_string();
        Self {
            display_name: display_name.into(),
            identity,
            peer_address,
        }
    }
}

// ----------------------------------------------------------------------------
// Characters
// ----------------------------------------------------------------------------

/// A character entity in the shared roster.
///
/// Every character has exactly one `owner_name`; the characters belonging to
/// an owner are always transmitted as a complete replacement set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// Unique id within the roster (duplicates are an accepted degraded state)
    pub id: String,
    pub name: String,
    /// Display name of the contributor who owns this character
    pub owner_name: String,
    /// Archetype (class) name, referencing the shared archetype catalog
    pub archetype: String,
    pub level: u32,
    pub max_hp: i32,
    pub current_hp: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Character {
    /// Create a fresh level-1 character with a generated id
    pub fn new(
        name: impl Into<String>,
        owner_name: impl Into<String>,
        archetype: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            owner_name: owner_name.into(),
            archetype: archetype.into(),
            level: 1,
            max_hp: 10,
            current_hp: 10,
            notes: None,
        }
    }

    pub fn with_hp(mut self, max_hp: i32) -> Self {
        self.max_hp = max_hp;
        self.current_hp = max_hp;
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }
}

/// Partial character update carrying only the fields to overwrite.
///
/// Applied as a shallow field-level merge: each present field replaces the
/// corresponding field on the target, last writer wins per field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archetype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hp: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_hp: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CharacterPatch {
    /// Shallow-merge this patch into a character
    pub fn apply_to(&self, character: &mut Character) {
        if let Some(name) = &self.name {
            character.name = name.clone();
        }
        if let Some(archetype) = &self.archetype {
            character.archetype = archetype.clone();
        }
        if let Some(level) = self.level {
            character.level = level;
        }
        if let Some(max_hp) = self.max_hp {
            character.max_hp = max_hp;
        }
        if let Some(current_hp) = self.current_hp {
            character.current_hp = current_hp;
        }
        if let Some(notes) = &self.notes {
            character.notes = Some(notes.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

// ----------------------------------------------------------------------------
// Map Tokens
// ----------------------------------------------------------------------------

/// Position of one token on the shared battle map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapToken {
    pub id: String,
    /// Character this token stands for, if any; a dangling reference is a
    /// valid degraded state and is never cleaned by the reconciler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_id: Option<String>,
    pub label: String,
    pub x: i32,
    pub y: i32,
}

// ----------------------------------------------------------------------------
// Campaign Log
// ----------------------------------------------------------------------------

/// One chat or narrative entry in a campaign log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub author: String,
    pub body: String,
    pub timestamp: Timestamp,
}

impl LogEntry {
    pub fn new(author: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            author: author.into(),
            body: body.into(),
            timestamp: Timestamp::now(),
        }
    }
}

/// A campaign with its narrative history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub log: Vec<LogEntry>,
}

impl Campaign {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            log: Vec::new(),
        }
    }
}

// ----------------------------------------------------------------------------
// Shared Creations
// ----------------------------------------------------------------------------

/// A custom character class shared into the session catalog. Keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archetype {
    pub name: String,
    pub description: String,
    pub hit_die: u32,
}

/// A custom item shared into the session catalog. Keyed by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub value: u32,
}

impl Item {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            value: 0,
        }
    }
}

/// A custom monster shared into the session catalog. Keyed by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monster {
    pub id: String,
    pub name: String,
    pub challenge: u32,
    pub max_hp: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lore: Option<String>,
}

impl Monster {
    pub fn new(name: impl Into<String>, challenge: u32, max_hp: i32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            challenge,
            max_hp,
            lore: None,
        }
    }
}

// ----------------------------------------------------------------------------
// Rumors
// ----------------------------------------------------------------------------

/// One entry in the ambient rumor feed (replaced whole on every update)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rumor {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

// ----------------------------------------------------------------------------
// Replicated State
// ----------------------------------------------------------------------------

/// The shared session payload kept convergent across peers.
///
/// Created empty at process start, hydrated from a snapshot or an inbound
/// SYNC_STATE, then mutated continuously by local actions and inbound
/// messages for the life of the process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplicatedState {
    /// Local login identity; preserved untouched through SYNC_STATE
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<Account>,
    /// Durable friend roster keyed by display name. Local bookkeeping:
    /// upserted by the IDENTITY handshake and never replaced by SYNC_STATE.
    #[serde(default)]
    pub friends: BTreeMap<String, Friend>,
    /// Player characters; each owner's entries form a complete replacement set
    #[serde(default)]
    pub characters: Vec<Character>,
    /// Mentor/NPC collection, addressed by UPDATE_CHARACTER alongside `characters`
    #[serde(default)]
    pub npcs: Vec<Character>,
    /// Active party membership, ordered character ids
    #[serde(default)]
    pub party: Vec<String>,
    #[serde(default)]
    pub map_tokens: Vec<MapToken>,
    #[serde(default)]
    pub campaigns: Vec<Campaign>,
    /// Campaign id receiving NEW_MESSAGE appends; local marker, may be None
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_campaign: Option<String>,
    /// Shared archetype catalog, keyed by name
    #[serde(default)]
    pub archetypes: Vec<Archetype>,
    /// Shared item catalog, keyed by id
    #[serde(default)]
    pub items: Vec<Item>,
    /// Shared monster catalog, keyed by id
    #[serde(default)]
    pub monsters: Vec<Monster>,
    #[serde(default)]
    pub rumors: Vec<Rumor>,
}

impl ReplicatedState {
    /// Create empty state for a fresh process
    pub fn new() -> Self {
        Self::default()
    }

    /// Characters owned by the given display name, in roster order.
    ///
    /// This is the complete set announced in an IDENTITY handshake.
    pub fn characters_owned_by(&self, owner_name: &str) -> Vec<Character> {
        self.characters
            .iter()
            .filter(|c| c.owner_name == owner_name)
            .cloned()
            .collect()
    }

    /// Look up a character by id across both the player and NPC collections
    pub fn find_character_mut(&mut self, id: &str) -> Option<&mut Character> {
        if let Some(position) = self.characters.iter().position(|c| c.id == id) {
            return self.characters.get_mut(position);
        }
        self.npcs.iter_mut().find(|c| c.id == id)
    }

    /// The campaign currently receiving narrative appends, if any
    pub fn active_campaign_mut(&mut self) -> Option<&mut Campaign> {
        let active = self.active_campaign.clone()?;
        self.campaigns.iter_mut().find(|c| c.id == active)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
