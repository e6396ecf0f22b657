//! Property-based tests for reconciler invariants
//!
//! Verifies idempotence of field-merge updates and key-uniqueness of
//! shared-creation upserts over arbitrary payloads.

use lorelink_core::model::{Character, CharacterPatch, Item, Monster, ReplicatedState};
use lorelink_core::protocol::Message;
use lorelink_core::reconcile;
use proptest::prelude::*;
use std::collections::HashSet;

/// Generate arbitrary printable names
fn arb_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][A-Za-z0-9 ]{0,30}").unwrap()
}

/// Generate an arbitrary character patch (any subset of fields present)
fn arb_patch() -> impl Strategy<Value = CharacterPatch> {
    (
        prop::option::of(arb_name()),
        prop::option::of(arb_name()),
        prop::option::of(1u32..=20),
        prop::option::of(-10i32..=200),
        prop::option::of(-10i32..=200),
        prop::option::of(arb_name()),
    )
        .prop_map(
            |(name, archetype, level, max_hp, current_hp, notes)| CharacterPatch {
                name,
                archetype,
                level,
                max_hp,
                current_hp,
                notes,
            },
        )
}

/// Generate an arbitrary item with an id drawn from a small pool so that
/// collisions actually happen
fn arb_item() -> impl Strategy<Value = Item> {
    ("item-[0-9]", arb_name(), 0u32..=1000).prop_map(|(id, name, value)| {
        let mut item = Item::new(name, "generated");
        item.id = id;
        item.value = value;
        item
    })
}

fn arb_monster() -> impl Strategy<Value = Monster> {
    ("mon-[0-9]", arb_name(), 0u32..=30, 1i32..=500).prop_map(|(id, name, challenge, hp)| {
        let mut monster = Monster::new(name, challenge, hp);
        monster.id = id;
        monster
    })
}

proptest! {
    /// Property: applying the same UPDATE_CHARACTER twice in a row yields
    /// the same state as applying it once
    #[test]
    fn update_character_is_idempotent(patch in arb_patch()) {
        let mut character = Character::new("Wren", "alice", "Bard");
        character.id = "c1".to_string();

        let mut once = ReplicatedState::new();
        once.characters.push(character);
        let mut twice = once.clone();

        let update = Message::UpdateCharacter { id: "c1".to_string(), updates: patch };

        reconcile::apply(&mut once, update.clone());
        reconcile::apply(&mut twice, update.clone());
        reconcile::apply(&mut twice, update);

        prop_assert_eq!(once, twice);
    }

    /// Property: no sequence of SHARE_ITEM messages ever produces two
    /// catalog entries sharing an id
    #[test]
    fn share_item_keeps_ids_unique(items in prop::collection::vec(arb_item(), 1..40)) {
        let mut state = ReplicatedState::new();
        for item in items {
            reconcile::apply(&mut state, Message::ShareItem(item));
        }

        let mut seen = HashSet::new();
        for item in &state.items {
            prop_assert!(seen.insert(item.id.clone()), "duplicate item id {}", item.id);
        }
    }

    /// Property: same invariant for SHARE_MONSTER
    #[test]
    fn share_monster_keeps_ids_unique(monsters in prop::collection::vec(arb_monster(), 1..40)) {
        let mut state = ReplicatedState::new();
        for monster in monsters {
            reconcile::apply(&mut state, Message::ShareMonster(monster));
        }

        let mut seen = HashSet::new();
        for monster in &state.monsters {
            prop_assert!(seen.insert(monster.id.clone()), "duplicate monster id {}", monster.id);
        }
    }

    /// Property: the latest share with a given id wins whole
    #[test]
    fn newest_share_replaces_older(items in prop::collection::vec(arb_item(), 2..40)) {
        let mut state = ReplicatedState::new();
        let last = items.last().cloned().unwrap();
        for item in items {
            reconcile::apply(&mut state, Message::ShareItem(item));
        }

        let stored = state.items.iter().find(|i| i.id == last.id).unwrap();
        prop_assert_eq!(stored, &last);
    }
}
