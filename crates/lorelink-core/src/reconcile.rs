//! State reconciliation rules
//!
//! One pure transformation per message type, mapping (current replicated
//! state, inbound message) onto the new authoritative local view. The match
//! is exhaustive over the closed catalog.
//!
//! Reconciliation never fails: referential failures (an unknown character
//! id, no active campaign) drop the message with no side effect, and the
//! worst outcome of any inbound frame is state divergence that a future
//! SYNC_STATE or IDENTITY resolves.

use tracing::debug;

use crate::model::{Friend, ReplicatedState};
use crate::protocol::Message;

/// Apply one inbound message to the replicated state.
///
/// Local mutations travel through this same function before being
/// broadcast, so no message is ever executed twice via two paths.
pub fn apply(state: &mut ReplicatedState, message: Message) {
    match message {
        // Handshake: upsert the friend record whole, then replace the
        // announcing owner's roster as a complete set. Stale entries from a
        // prior snapshot must not linger.
        Message::Identity(payload) => {
            state.friends.insert(
                payload.display_name.clone(),
                Friend::new(payload.display_name.clone(), payload.identity),
            );
            state
                .characters
                .retain(|c| c.owner_name != payload.display_name);
            state
                .characters
                .extend(payload.characters.into_iter().map(|mut c| {
                    c.owner_name = payload.display_name.clone();
                    c
                }));
        }

        // Total replacement of the shared payload. The receiver keeps its
        // own login identity (a joiner must not lose its account when
        // absorbing the host's world) and its durable friend roster, which
        // is local bookkeeping rather than part of the shared world.
        Message::SyncState(world) => {
            let own_account = state.account.take();
            let own_friends = std::mem::take(&mut state.friends);
            *state = *world;
            state.account = own_account;
            state.friends = own_friends;
        }

        // Append without an id-collision check; duplicate ids are an
        // accepted degraded state.
        Message::AddCharacter(character) => {
            state.characters.push(character);
        }

        // Shallow field merge, last writer wins per field. The id belongs
        // to exactly one of the player or NPC collections; an unknown id
        // drops the message.
        Message::UpdateCharacter { id, updates } => {
            match state.find_character_mut(&id) {
                Some(character) => updates.apply_to(character),
                None => debug!(%id, "UPDATE_CHARACTER for unknown id, dropped"),
            }
        }

        // The sender always transmits the complete current list, so an
        // unconditional full replace is the cheapest correct policy.
        Message::UpdateParty(party) => {
            state.party = party;
        }
        Message::UpdateMap(tokens) => {
            state.map_tokens = tokens;
        }
        Message::UpdateRumors(rumors) => {
            state.rumors = rumors;
        }

        // Upsert-by-replace: drop any prior entry with the same key, then
        // insert the incoming entity whole. Archetypes key on name, items
        // and monsters on id.
        Message::ShareArchetype(archetype) => {
            state.archetypes.retain(|a| a.name != archetype.name);
            state.archetypes.push(archetype);
        }
        Message::ShareItem(item) => {
            state.items.retain(|i| i.id != item.id);
            state.items.push(item);
        }
        Message::ShareMonster(monster) => {
            state.monsters.retain(|m| m.id != monster.id);
            state.monsters.push(monster);
        }

        // Append to whichever campaign is marked active locally; with no
        // active campaign the entry is discarded from visible history.
        Message::NewMessage(entry) => match state.active_campaign_mut() {
            Some(campaign) => campaign.log.push(entry),
            None => debug!("NEW_MESSAGE with no active campaign, dropped"),
        },
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
