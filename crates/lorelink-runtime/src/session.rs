//! Session manager
//!
//! One task owns everything mutable — the replicated state, the connection
//! registry, the host flag — and drains two streams: commands from the UI
//! boundary and link events from the signaling transport. All connection
//! events, message arrivals, and state mutations are handled as discrete
//! steps on this single logical thread, so no locks guard the session.
//!
//! Lifecycle: `Idle → Bootstrapping → Active`. Bootstrapping covers the
//! snapshot hydration and the signaling round-trip that assigns the local
//! peer identity; only an Active session accepts or initiates connections.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use lorelink_core::model::{Account, Campaign};
use lorelink_core::protocol::IdentityPayload;
use lorelink_core::{reconcile, Message, PeerId, ReplicatedState};

use crate::broadcast::broadcast;
use crate::channel::{
    AppEvent, AppEventSender, Command, CommandReceiver, LinkEvent, LinkEventReceiver, SessionPhase,
};
use crate::persistence::SnapshotStore;
use crate::registry::ConnectionRegistry;
use crate::signaling::SignalingClient;
use crate::Result;

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Static configuration for one session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Key under which snapshots are loaded and saved
    pub account_key: String,
    /// Display name announced in the IDENTITY handshake; owns this
    /// process's contributed characters
    pub display_name: String,
}

impl SessionConfig {
    pub fn new(account_key: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            account_key: account_key.into(),
            display_name: display_name.into(),
        }
    }
}

// ----------------------------------------------------------------------------
// Session Manager
// ----------------------------------------------------------------------------

/// The session task: handshake orchestration, reconciliation wiring, and
/// the visible connected-peer roster.
pub struct SessionManager {
    config: SessionConfig,
    phase: SessionPhase,
    /// Local peer identity; absent until the signaling round-trip completes
    identity: Option<PeerId>,
    /// True for the process that began sharing unprompted; flipped to false
    /// the moment this process dials into an existing mesh
    is_host: bool,
    state: ReplicatedState,
    registry: ConnectionRegistry,
    signaling: Box<dyn SignalingClient>,
    snapshots: Arc<dyn SnapshotStore>,
    commands: CommandReceiver,
    link_events: LinkEventReceiver,
    link_stream_open: bool,
    app_events: AppEventSender,
    state_watch: watch::Sender<ReplicatedState>,
    roster_watch: watch::Sender<Vec<PeerId>>,
    running: bool,
}

impl SessionManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: SessionConfig,
        signaling: Box<dyn SignalingClient>,
        link_events: LinkEventReceiver,
        snapshots: Arc<dyn SnapshotStore>,
        commands: CommandReceiver,
        app_events: AppEventSender,
        state_watch: watch::Sender<ReplicatedState>,
        roster_watch: watch::Sender<Vec<PeerId>>,
    ) -> Self {
        Self {
            config,
            phase: SessionPhase::Idle,
            identity: None,
            is_host: false,
            state: ReplicatedState::new(),
            registry: ConnectionRegistry::new(),
            signaling,
            snapshots,
            commands,
            link_events,
            link_stream_open: true,
            app_events,
            state_watch,
            roster_watch,
            running: true,
        }
    }

    /// Run the session until shutdown or until the command channel closes
    pub async fn run(mut self) -> Result<()> {
        self.bootstrap().await;

        while self.running {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => {
                        info!("command channel closed, shutting down");
                        break;
                    }
                },
                event = self.link_events.recv(), if self.link_stream_open => match event {
                    Some(event) => self.handle_link_event(event),
                    None => {
                        info!("link event stream ended");
                        self.link_stream_open = false;
                    }
                },
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Bootstrap
    // ------------------------------------------------------------------

    async fn bootstrap(&mut self) {
        self.set_phase(SessionPhase::Bootstrapping);

        self.state.account = Some(Account::new(
            self.config.account_key.as_str(),
            self.config.display_name.as_str(),
        ));

        // A loaded snapshot is treated exactly like a SYNC_STATE payload,
        // which preserves the account identity just installed.
        match self.snapshots.load(&self.config.account_key).await {
            Ok(Some(snapshot)) => {
                reconcile::apply(&mut self.state, Message::SyncState(Box::new(snapshot)));
                debug!(account = %self.config.account_key, "state hydrated from snapshot");
            }
            Ok(None) => {}
            Err(error) => warn!(%error, "snapshot load failed, starting empty"),
        }
        self.publish_state("BOOTSTRAP");

        match self.signaling.request_identity().await {
            Ok(identity) => {
                info!(%identity, "peer identity assigned");
                self.identity = Some(identity.clone());
                self.set_phase(SessionPhase::Active);
                self.emit(AppEvent::SessionReady { identity });
            }
            Err(error) => {
                // Transport failure: no retry, no propagation. The session
                // simply never becomes reachable.
                warn!(%error, "peer identity was never assigned");
            }
        }
    }

    // ------------------------------------------------------------------
    // Commands (UI boundary → local mutation + broadcast)
    // ------------------------------------------------------------------

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::HostSession => {
                if self.phase != SessionPhase::Active {
                    warn!("cannot host before an identity is assigned");
                    return;
                }
                self.is_host = true;
                info!("hosting session");
            }
            Command::JoinSession { target } => self.join(target).await,

            Command::AddCharacter(character) => {
                self.mutate_and_broadcast(Message::AddCharacter(character))
            }
            Command::UpdateCharacter { id, updates } => {
                self.mutate_and_broadcast(Message::UpdateCharacter { id, updates })
            }
            Command::SetParty(party) => self.mutate_and_broadcast(Message::UpdateParty(party)),
            Command::SetMapTokens(tokens) => self.mutate_and_broadcast(Message::UpdateMap(tokens)),
            Command::ShareArchetype(archetype) => {
                self.mutate_and_broadcast(Message::ShareArchetype(archetype))
            }
            Command::ShareItem(item) => self.mutate_and_broadcast(Message::ShareItem(item)),
            Command::ShareMonster(monster) => {
                self.mutate_and_broadcast(Message::ShareMonster(monster))
            }
            Command::PostLogEntry(entry) => self.mutate_and_broadcast(Message::NewMessage(entry)),
            Command::SetRumors(rumors) => self.mutate_and_broadcast(Message::UpdateRumors(rumors)),

            // Local-only mutations; replicated to joiners via SYNC_STATE
            Command::CreateCampaign { name } => {
                let campaign = Campaign::new(name);
                self.state.active_campaign = Some(campaign.id.clone());
                self.state.campaigns.push(campaign);
                self.publish_state("CREATE_CAMPAIGN");
            }
            Command::SetActiveCampaign(campaign_id) => {
                self.state.active_campaign = campaign_id;
                self.publish_state("SET_ACTIVE_CAMPAIGN");
            }
            Command::ClearFriends => {
                self.state.friends.clear();
                self.publish_state("CLEAR_FRIENDS");
            }

            Command::SaveSnapshot => self.save_snapshot().await,
            Command::Shutdown => {
                info!("shutdown requested");
                self.running = false;
            }
        }
    }

    async fn join(&mut self, target: PeerId) {
        if self.phase != SessionPhase::Active {
            warn!(%target, "cannot join before an identity is assigned");
            return;
        }
        match self.signaling.connect(&target).await {
            Ok(connection) => {
                debug!(%target, "dialing");
                self.registry.add(connection);
            }
            // Transport failure: the dial just never happened
            Err(error) => warn!(%target, %error, "dial failed"),
        }
    }

    /// Apply a locally produced message and fan it out. Local and inbound
    /// mutations go through the same reconciler, so no message is ever
    /// executed twice via two paths.
    fn mutate_and_broadcast(&mut self, message: Message) {
        let kind = message.kind();
        reconcile::apply(&mut self.state, message.clone());
        broadcast(&self.registry, &message);
        self.publish_state(kind);
    }

    async fn save_snapshot(&mut self) {
        match self
            .snapshots
            .save(&self.config.account_key, &self.state)
            .await
        {
            Ok(()) => self.emit(AppEvent::SnapshotSaved {
                account_key: self.config.account_key.clone(),
            }),
            Err(error) => warn!(%error, "snapshot save failed"),
        }
    }

    // ------------------------------------------------------------------
    // Link events (signaling transport → reconciler + roster)
    // ------------------------------------------------------------------

    fn handle_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::IncomingConnection { connection } => {
                debug!(peer = %connection.peer(), "inbound connection");
                self.registry.add(connection);
            }
            LinkEvent::ConnectionOpened { peer } => self.handle_open(peer),
            LinkEvent::FrameReceived { peer, frame } => self.handle_frame(peer, &frame),
            LinkEvent::ConnectionClosed { peer } => {
                // Idempotent removal; friend records are not purged, a
                // disconnected friend remains known.
                if self.registry.remove(&peer).is_some() {
                    info!(%peer, "peer disconnected");
                    self.publish_roster();
                    self.emit(AppEvent::PeerDisconnected { peer });
                }
            }
        }
    }

    fn handle_open(&mut self, peer: PeerId) {
        let outbound = match self.registry.mark_open(&peer) {
            Some(outbound) => outbound,
            None => {
                debug!(%peer, "open event for unknown connection dropped");
                return;
            }
        };

        // Joining an existing mesh defers authority to the remote side.
        if outbound {
            self.is_host = false;
        }

        self.send_identity_to(&peer);
        if self.is_host {
            self.send_to(&peer, &Message::SyncState(Box::new(self.state.clone())));
        }

        info!(%peer, outbound, "peer connected");
        self.publish_roster();
        self.emit(AppEvent::PeerConnected { peer });
    }

    fn handle_frame(&mut self, peer: PeerId, frame: &str) {
        let message = match Message::from_wire(frame) {
            Ok(message) => message,
            Err(error) => {
                // Protocol failure: dropped with no side effect
                debug!(%peer, %error, "undecodable frame dropped");
                return;
            }
        };

        trace!(%peer, kind = message.kind(), "frame received");
        let kind = message.kind();
        reconcile::apply(&mut self.state, message);
        self.publish_state(kind);
    }

    // ------------------------------------------------------------------
    // Handshake sends
    // ------------------------------------------------------------------

    fn send_identity_to(&self, peer: &PeerId) {
        // Connections only exist while Active, so the identity is present.
        let Some(identity) = self.identity.clone() else {
            return;
        };
        let payload = IdentityPayload {
            identity,
            display_name: self.config.display_name.clone(),
            characters: self.state.characters_owned_by(&self.config.display_name),
        };
        self.send_to(peer, &Message::Identity(payload));
    }

    fn send_to(&self, peer: &PeerId, message: &Message) {
        let frame = match message.to_wire() {
            Ok(frame) => frame,
            Err(error) => {
                warn!(kind = message.kind(), %error, "unencodable message not sent");
                return;
            }
        };
        if let Some(connection) = self.registry.get(peer) {
            connection.send_frame(&frame);
        }
    }

    // ------------------------------------------------------------------
    // Outward visibility
    // ------------------------------------------------------------------

    fn set_phase(&mut self, phase: SessionPhase) {
        self.phase = phase;
        self.emit(AppEvent::PhaseChanged { phase });
    }

    fn publish_state(&mut self, kind: &str) {
        self.state_watch.send_replace(self.state.clone());
        self.emit(AppEvent::StateChanged {
            kind: kind.to_string(),
        });
    }

    fn publish_roster(&mut self) {
        self.roster_watch.send_replace(self.registry.open_peers());
    }

    fn emit(&self, event: AppEvent) {
        if self.app_events.send(event).is_err() {
            trace!("app event dropped, no listener");
        }
    }
}
