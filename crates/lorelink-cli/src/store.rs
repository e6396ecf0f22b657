//! File-backed snapshot store
//!
//! Persists one JSON snapshot file per account key under the configured
//! data directory. Implements the same collaborator seam the runtime's
//! in-memory store does, so a loaded file flows through the reconciler as a
//! synthetic SYNC_STATE.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use lorelink_core::ReplicatedState;
use lorelink_runtime::{RuntimeError, SnapshotStore};

/// Directory-of-JSON-files implementation of [`SnapshotStore`]
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    data_dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn snapshot_path(&self, account_key: &str) -> PathBuf {
        self.data_dir.join(format!("{account_key}.json"))
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load(&self, account_key: &str) -> lorelink_runtime::Result<Option<ReplicatedState>> {
        let path = self.snapshot_path(account_key);
        if !Path::new(&path).exists() {
            return Ok(None);
        }

        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| RuntimeError::Snapshot(e.to_string()))?;
        let state =
            serde_json::from_str(&contents).map_err(|e| RuntimeError::Snapshot(e.to_string()))?;
        debug!(account = account_key, path = %path.display(), "snapshot loaded");
        Ok(Some(state))
    }

    async fn save(
        &self,
        account_key: &str,
        state: &ReplicatedState,
    ) -> lorelink_runtime::Result<()> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| RuntimeError::Snapshot(e.to_string()))?;

        let contents = serde_json::to_string_pretty(state)
            .map_err(|e| RuntimeError::Snapshot(e.to_string()))?;
        let path = self.snapshot_path(account_key);
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| RuntimeError::Snapshot(e.to_string()))?;
        debug!(account = account_key, path = %path.display(), "snapshot saved");
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use lorelink_core::model::Character;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("lorelink-store-{}", uuid::Uuid::new_v4().simple()))
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_none() {
        let store = FileSnapshotStore::new(scratch_dir());
        assert!(store.load("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_roundtrip() {
        let dir = scratch_dir();
        let store = FileSnapshotStore::new(&dir);

        let mut state = ReplicatedState::new();
        state.characters.push(Character::new("Wren", "alice", "Bard"));
        state.party = vec![state.characters[0].id.clone()];

        store.save("alice", &state).await.unwrap();
        let loaded = store.load("alice").await.unwrap().unwrap();
        assert_eq!(loaded, state);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_surfaces_an_error() {
        let dir = scratch_dir();
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("alice.json"), "{ not json")
            .await
            .unwrap();

        let store = FileSnapshotStore::new(&dir);
        assert!(matches!(
            store.load("alice").await,
            Err(RuntimeError::Snapshot(_))
        ));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
