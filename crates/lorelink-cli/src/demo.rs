//! In-process mesh demo
//!
//! Spawns a host and N joiners on one in-memory signaling hub, drives a
//! short session (campaign, characters, party, a shared item, narrative
//! entries), and prints every peer's converged view. The same runtime code
//! paths run here as against a real signaling service; only the
//! `SignalingClient` implementation differs.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use lorelink_core::model::{Character, Item, LogEntry};
use lorelink_runtime::{
    AppEvent, Command, MemoryHub, PeerId, SessionBuilder, SessionConfig, SessionHandle,
    SnapshotStore,
};

use crate::config::AppConfig;
use crate::error::{CliError, Result};

// ----------------------------------------------------------------------------
// Event helpers
// ----------------------------------------------------------------------------

async fn wait_for_event<F>(handle: &mut SessionHandle, mut predicate: F) -> Result<AppEvent>
where
    F: FnMut(&AppEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match handle.next_event().await {
                Some(event) if predicate(&event) => return Ok(event),
                Some(_) => continue,
                None => return Err(CliError::Demo("session ended early".to_string())),
            }
        }
    })
    .await
    .map_err(|_| CliError::Demo("timed out waiting for session event".to_string()))?
}

async fn wait_ready(handle: &mut SessionHandle) -> Result<PeerId> {
    match wait_for_event(handle, |e| matches!(e, AppEvent::SessionReady { .. })).await? {
        AppEvent::SessionReady { identity } => Ok(identity),
        _ => unreachable!(),
    }
}

async fn wait_state_kind(handle: &mut SessionHandle, kind: &str) -> Result<()> {
    wait_for_event(handle, |e| {
        matches!(e, AppEvent::StateChanged { kind: k } if k == kind)
    })
    .await?;
    Ok(())
}

// ----------------------------------------------------------------------------
// Demo
// ----------------------------------------------------------------------------

pub async fn run(
    config: &AppConfig,
    host_name: &str,
    peers: usize,
    store: Arc<dyn SnapshotStore>,
) -> Result<()> {
    let hub = MemoryHub::new();

    // Host: builds the world, then starts sharing it
    let (signaling, link_events) = hub.endpoint();
    let mut host = SessionBuilder::new(
        SessionConfig::new(config.identity.account_key.as_str(), host_name),
        signaling,
        link_events,
    )
    .with_snapshot_store(store)
    .spawn();

    let host_id = wait_ready(&mut host).await?;
    info!(%host_id, name = host_name, "host session ready");
    host.send(Command::HostSession);

    host.send(Command::CreateCampaign {
        name: "The Sunken Vale".to_string(),
    });
    let wren = Character::new("Wren", host_name, "Bard").with_hp(14);
    let wren_id = wren.id.clone();
    let tove = Character::new("Tove", host_name, "Ranger").with_hp(16);
    let tove_id = tove.id.clone();
    host.send(Command::AddCharacter(wren));
    host.send(Command::AddCharacter(tove));
    host.send(Command::SetParty(vec![wren_id, tove_id]));
    host.send(Command::ShareItem(Item::new(
        "Waystone",
        "A humming stone that always points home",
    )));
    host.send(Command::PostLogEntry(LogEntry::new(
        host_name,
        "The party gathers at the drowned mill.",
    )));
    wait_state_kind(&mut host, "NEW_MESSAGE").await?;

    // Joiners: dial the host for the world, then every earlier joiner, so
    // the mesh is fully connected — there is no relaying, a message only
    // reaches direct connections.
    let mut joiners = Vec::new();
    let mut joined_ids: Vec<PeerId> = Vec::new();
    for i in 1..=peers {
        let guest_name = format!("guest-{i}");
        let (signaling, link_events) = hub.endpoint();
        let mut joiner = SessionBuilder::new(
            SessionConfig::new(format!("{guest_name}-key"), guest_name.clone()),
            signaling,
            link_events,
        )
        .spawn();

        let joiner_id = wait_ready(&mut joiner).await?;
        info!(%joiner_id, name = %guest_name, "joiner session ready");
        joiner.send(Command::JoinSession {
            target: host_id.clone(),
        });
        wait_state_kind(&mut joiner, "SYNC_STATE").await?;

        for earlier in &joined_ids {
            joiner.send(Command::JoinSession {
                target: earlier.clone(),
            });
            wait_state_kind(&mut joiner, "IDENTITY").await?;
        }
        joined_ids.push(joiner_id);
        joiners.push((guest_name, joiner));
    }

    // First joiner contributes a character and reshapes the party
    if let Some((guest_name, joiner)) = joiners.first_mut() {
        let mysa = Character::new("Mysa", guest_name.as_str(), "Druid").with_hp(12);
        let mysa_id = mysa.id.clone();
        joiner.send(Command::AddCharacter(mysa));

        let mut party = joiner.state().party;
        party.push(mysa_id);
        joiner.send(Command::SetParty(party));
    }
    if !joiners.is_empty() {
        wait_state_kind(&mut host, "UPDATE_PARTY").await?;
        for (_, other) in joiners.iter_mut().skip(1) {
            wait_state_kind(other, "UPDATE_PARTY").await?;
        }
    }

    // Every peer now renders the same world
    println!("=== converged session ===");
    print_view(host_name, &host);
    for (guest_name, joiner) in &joiners {
        print_view(guest_name, joiner);
    }

    host.send(Command::SaveSnapshot);
    wait_for_event(&mut host, |e| matches!(e, AppEvent::SnapshotSaved { .. })).await?;
    info!(account = %config.identity.account_key, "host snapshot saved");

    for (_, joiner) in joiners {
        joiner.shutdown().await?;
    }
    host.shutdown().await?;
    Ok(())
}

fn print_view(name: &str, handle: &SessionHandle) {
    let state = handle.state();
    println!("-- {name} --");
    println!("   connected peers: {}", handle.roster().len());
    let roster: Vec<String> = state
        .characters
        .iter()
        .map(|c| format!("{} ({}, owned by {})", c.name, c.archetype, c.owner_name))
        .collect();
    println!("   characters: {}", roster.join(", "));
    println!("   party size: {}", state.party.len());
    println!("   shared items: {}", state.items.len());
    if let Some(campaign) = state.campaigns.first() {
        println!("   campaign '{}', {} log entries", campaign.name, campaign.log.len());
    }
}
