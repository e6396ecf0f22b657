//! Session integration tests
//!
//! Drive whole sessions over the in-memory signaling hub and assert the
//! replication guarantees end to end: bootstrap convergence, full-replace
//! party updates across the mesh, host authority deferral on dial, and
//! friend durability across disconnects.

use std::sync::Arc;
use std::time::Duration;

use lorelink_core::model::{Account, Character, Item};
use lorelink_core::PeerId;
use lorelink_runtime::{
    AppEvent, Command, MemoryHub, MemorySnapshotStore, SessionBuilder, SessionConfig,
    SessionHandle,
};

// ----------------------------------------------------------------------------
// Test Utilities
// ----------------------------------------------------------------------------

fn spawn_session(hub: &MemoryHub, account_key: &str, display_name: &str) -> SessionHandle {
    let (signaling, link_events) = hub.endpoint();
    SessionBuilder::new(
        SessionConfig::new(account_key, display_name),
        signaling,
        link_events,
    )
    .spawn()
}

async fn wait_for_event<F>(handle: &mut SessionHandle, mut predicate: F) -> AppEvent
where
    F: FnMut(&AppEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = handle.next_event().await.expect("session ended early");
            if predicate(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for app event")
}

async fn wait_ready(handle: &mut SessionHandle) -> PeerId {
    let event = wait_for_event(handle, |e| matches!(e, AppEvent::SessionReady { .. })).await;
    match event {
        AppEvent::SessionReady { identity } => identity,
        _ => unreachable!(),
    }
}

async fn wait_state_kind(handle: &mut SessionHandle, kind: &str) {
    wait_for_event(handle, |e| {
        matches!(e, AppEvent::StateChanged { kind: k } if k == kind)
    })
    .await;
}

fn character_with_id(id: &str, name: &str, owner: &str) -> Character {
    let mut character = Character::new(name, owner, "Fighter");
    character.id = id.to_string();
    character
}

// ----------------------------------------------------------------------------
// Bootstrap Convergence
// ----------------------------------------------------------------------------

#[tokio::test]
async fn joiner_converges_on_host_world() {
    let hub = MemoryHub::new();

    let mut host = spawn_session(&hub, "host-key", "alice");
    let host_id = wait_ready(&mut host).await;
    host.send(Command::HostSession);
    host.send(Command::AddCharacter(character_with_id("c1", "Wren", "alice")));
    host.send(Command::AddCharacter(character_with_id("c2", "Tove", "alice")));
    host.send(Command::SetParty(vec!["c1".to_string(), "c2".to_string()]));
    wait_state_kind(&mut host, "UPDATE_PARTY").await;

    let world = host.state();

    let mut joiner = spawn_session(&hub, "joiner-key", "bob");
    wait_ready(&mut joiner).await;
    joiner.send(Command::JoinSession {
        target: host_id.clone(),
    });
    wait_state_kind(&mut joiner, "SYNC_STATE").await;

    // Equal to the host's world at handshake time, except the joiner keeps
    // its own login identity and its own friend roster
    let mut expected = world;
    let mut actual = joiner.state();
    assert_eq!(actual.account, Some(Account::new("joiner-key", "bob")));
    assert!(actual.friends.contains_key("alice"));
    expected.account = None;
    expected.friends.clear();
    actual.account = None;
    actual.friends.clear();
    assert_eq!(actual, expected);

    assert_eq!(joiner.roster(), vec![host_id]);
}

// ----------------------------------------------------------------------------
// Party Scenario (full replace across the mesh)
// ----------------------------------------------------------------------------

#[tokio::test]
async fn joiner_party_update_fully_replaces_host_party() {
    let hub = MemoryHub::new();

    let mut host = spawn_session(&hub, "host-key", "alice");
    let host_id = wait_ready(&mut host).await;
    host.send(Command::HostSession);
    host.send(Command::SetParty(vec!["c1".to_string(), "c2".to_string()]));
    wait_state_kind(&mut host, "UPDATE_PARTY").await;

    let mut joiner = spawn_session(&hub, "joiner-key", "bob");
    wait_ready(&mut joiner).await;
    joiner.send(Command::JoinSession {
        target: host_id.clone(),
    });
    wait_state_kind(&mut joiner, "SYNC_STATE").await;
    assert_eq!(joiner.state().party, vec!["c1".to_string(), "c2".to_string()]);

    joiner.send(Command::SetParty(vec!["c1".to_string(), "c3".to_string()]));
    wait_state_kind(&mut host, "UPDATE_PARTY").await;

    // Full replace, not merge
    assert_eq!(host.state().party, vec!["c1".to_string(), "c3".to_string()]);
}

// ----------------------------------------------------------------------------
// Multi-peer propagation
// ----------------------------------------------------------------------------

#[tokio::test]
async fn host_broadcast_reaches_every_joiner() {
    let hub = MemoryHub::new();

    let mut host = spawn_session(&hub, "host-key", "alice");
    let host_id = wait_ready(&mut host).await;
    host.send(Command::HostSession);

    let mut joiners = Vec::new();
    for i in 0..3 {
        let mut joiner = spawn_session(&hub, &format!("key-{i}"), &format!("joiner-{i}"));
        wait_ready(&mut joiner).await;
        joiner.send(Command::JoinSession {
            target: host_id.clone(),
        });
        wait_state_kind(&mut joiner, "SYNC_STATE").await;
        joiners.push(joiner);
    }
    assert_eq!(host.roster().len(), 3);

    let mut item = Item::new("Waystone", "A humming waystone");
    item.id = "item-1".to_string();
    host.send(Command::ShareItem(item));

    for joiner in joiners.iter_mut() {
        wait_state_kind(joiner, "SHARE_ITEM").await;
        let items = joiner.state().items;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "item-1");
    }
}

// ----------------------------------------------------------------------------
// Authority deferral on dial
// ----------------------------------------------------------------------------

#[tokio::test]
async fn dialing_peer_defers_authority_to_the_remote_side() {
    let hub = MemoryHub::new();

    let mut host = spawn_session(&hub, "host-key", "alice");
    let host_id = wait_ready(&mut host).await;
    host.send(Command::HostSession);
    host.send(Command::SetParty(vec!["host-pick".to_string()]));
    wait_state_kind(&mut host, "UPDATE_PARTY").await;

    // The other side also thinks it is hosting, with a world of its own,
    // but then dials in: joining an existing mesh defers authority.
    let mut latecomer = spawn_session(&hub, "late-key", "bob");
    wait_ready(&mut latecomer).await;
    latecomer.send(Command::HostSession);
    latecomer.send(Command::SetParty(vec!["late-pick".to_string()]));
    wait_state_kind(&mut latecomer, "UPDATE_PARTY").await;

    latecomer.send(Command::JoinSession {
        target: host_id.clone(),
    });
    wait_state_kind(&mut latecomer, "SYNC_STATE").await;

    // The latecomer absorbed the host's world and never pushed its own
    assert_eq!(latecomer.state().party, vec!["host-pick".to_string()]);

    // The host saw only the latecomer's IDENTITY, not a SYNC_STATE
    wait_state_kind(&mut host, "IDENTITY").await;
    assert_eq!(host.state().party, vec!["host-pick".to_string()]);
}

// ----------------------------------------------------------------------------
// Friend durability across disconnects
// ----------------------------------------------------------------------------

#[tokio::test]
async fn disconnected_friend_remains_known() {
    let hub = MemoryHub::new();

    let mut host = spawn_session(&hub, "host-key", "alice");
    let host_id = wait_ready(&mut host).await;
    host.send(Command::HostSession);

    let mut joiner = spawn_session(&hub, "joiner-key", "bob");
    wait_ready(&mut joiner).await;
    joiner.send(Command::JoinSession {
        target: host_id.clone(),
    });
    wait_state_kind(&mut joiner, "SYNC_STATE").await;

    // Handshake recorded the friend on the host side
    wait_state_kind(&mut host, "IDENTITY").await;
    assert!(host.state().friends.contains_key("bob"));
    assert_eq!(host.roster().len(), 1);

    joiner.shutdown().await.unwrap();

    wait_for_event(&mut host, |e| matches!(e, AppEvent::PeerDisconnected { .. })).await;
    assert!(host.roster().is_empty());
    // The roster shrank; the friend record did not
    assert!(host.state().friends.contains_key("bob"));
}

// ----------------------------------------------------------------------------
// Handshake announces owned characters
// ----------------------------------------------------------------------------

#[tokio::test]
async fn identity_handshake_carries_owned_roster_both_ways() {
    let hub = MemoryHub::new();

    let mut host = spawn_session(&hub, "host-key", "alice");
    let host_id = wait_ready(&mut host).await;
    host.send(Command::HostSession);
    host.send(Command::AddCharacter(character_with_id("a1", "Wren", "alice")));
    wait_state_kind(&mut host, "ADD_CHARACTER").await;

    let mut joiner = spawn_session(&hub, "joiner-key", "bob");
    wait_ready(&mut joiner).await;
    joiner.send(Command::AddCharacter(character_with_id("b1", "Tove", "bob")));
    wait_state_kind(&mut joiner, "ADD_CHARACTER").await;

    joiner.send(Command::JoinSession {
        target: host_id.clone(),
    });
    wait_state_kind(&mut joiner, "SYNC_STATE").await;
    wait_state_kind(&mut host, "IDENTITY").await;

    // Host learned bob's roster through the handshake
    let host_chars = host.state().characters;
    assert!(host_chars.iter().any(|c| c.id == "a1"));
    assert!(host_chars.iter().any(|c| c.id == "b1" && c.owner_name == "bob"));
}

// ----------------------------------------------------------------------------
// Snapshot hydration
// ----------------------------------------------------------------------------

#[tokio::test]
async fn saved_snapshot_hydrates_the_next_session() {
    let hub = MemoryHub::new();
    let store = Arc::new(MemorySnapshotStore::new());

    let (signaling, link_events) = hub.endpoint();
    let mut first = SessionBuilder::new(
        SessionConfig::new("alice-key", "alice"),
        signaling,
        link_events,
    )
    .with_snapshot_store(store.clone())
    .spawn();
    wait_ready(&mut first).await;
    first.send(Command::AddCharacter(character_with_id("c1", "Wren", "alice")));
    first.send(Command::SaveSnapshot);
    wait_for_event(&mut first, |e| matches!(e, AppEvent::SnapshotSaved { .. })).await;
    first.shutdown().await.unwrap();

    // A fresh session under the same account key starts from the snapshot,
    // applied exactly like an inbound SYNC_STATE
    let (signaling, link_events) = hub.endpoint();
    let mut second = SessionBuilder::new(
        SessionConfig::new("alice-key", "alice"),
        signaling,
        link_events,
    )
    .with_snapshot_store(store)
    .spawn();
    wait_ready(&mut second).await;

    let state = second.state();
    assert!(state.characters.iter().any(|c| c.id == "c1"));
    assert_eq!(state.account, Some(Account::new("alice-key", "alice")));
}
