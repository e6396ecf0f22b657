//! Snapshot persistence seam
//!
//! Local persistence is an external collaborator: the session engine only
//! knows "load snapshot by account key" and "save snapshot". A loaded
//! snapshot is fed through the reconciler exactly like an inbound
//! SYNC_STATE payload.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use lorelink_core::ReplicatedState;

use crate::Result;

/// Collaborator storing replicated-state snapshots keyed by account
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn load(&self, account_key: &str) -> Result<Option<ReplicatedState>>;

    async fn save(&self, account_key: &str, state: &ReplicatedState) -> Result<()>;
}

// ----------------------------------------------------------------------------
// In-Memory Store
// ----------------------------------------------------------------------------

/// Map-backed store for tests and demos
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    snapshots: Arc<Mutex<HashMap<String, ReplicatedState>>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self, account_key: &str) -> Result<Option<ReplicatedState>> {
        Ok(self
            .snapshots
            .lock()
            .expect("snapshot lock poisoned")
            .get(account_key)
            .cloned())
    }

    async fn save(&self, account_key: &str, state: &ReplicatedState) -> Result<()> {
        self.snapshots
            .lock()
            .expect("snapshot lock poisoned")
            .insert(account_key.to_string(), state.clone());
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
