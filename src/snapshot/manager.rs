//! Single-slot chain snapshot store for repeatable test runs

use chrono::{DateTime, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use crate::{
    errors::{BotError, BotResult},
    network::ChainClient,
    types::Snapshot,
};

pub const DEFAULT_SNAPSHOT_FILE: &str = "./snapshots/snapshot_id.txt";

/// Owns the snapshot file. Only one snapshot is tracked; capturing overwrites it.
#[derive(Debug, Clone)]
pub struct SnapshotManager {
    path: PathBuf,
}

impl SnapshotManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshots the node and persists the id. Any failure is fatal to test setup.
    pub async fn capture<C: ChainClient>(&self, client: &C) -> BotResult<Snapshot> {
        let id = client.snapshot().await.map_err(|e| BotError::Snapshot {
            message: format!("node {} refused to snapshot", client.endpoint()),
            source: Some(e.into()),
        })?;

        let id = id.trim().to_string();
        if id.is_empty() {
            return Err(BotError::Snapshot {
                message: format!("node {} returned an empty snapshot id", client.endpoint()),
                source: None,
            });
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| BotError::Snapshot {
                message: format!("cannot create snapshot directory {}", parent.display()),
                source: Some(e.into()),
            })?;
        }
        fs::write(&self.path, &id).map_err(|e| BotError::Snapshot {
            message: format!("cannot write snapshot file {}", self.path.display()),
            source: Some(e.into()),
        })?;

        info!(snapshot_id = %id, file = %self.path.display(), "📸 Snapshot captured");
        Ok(Snapshot { id, created_at: Utc::now() })
    }

    /// Reverts the node to the stored snapshot.
    ///
    /// Returns `false` without touching the file when nothing is stored, the node is
    /// unreachable, or the node no longer recognises the id.
    pub async fn restore<C: ChainClient>(&self, client: &C) -> bool {
        let Some(snapshot) = self.stored() else {
            warn!(file = %self.path.display(), "No snapshot found to revert to");
            return false;
        };

        match client.revert(&snapshot.id).await {
            Ok(true) => {
                info!(snapshot_id = %snapshot.id, "⏪ Reverted to snapshot");
                true
            }
            Ok(false) => {
                warn!(
                    snapshot_id = %snapshot.id,
                    "Node rejected revert; snapshot may be consumed or the node restarted"
                );
                false
            }
            Err(e) => {
                warn!(snapshot_id = %snapshot.id, "Revert failed: {}", e);
                false
            }
        }
    }

    /// The persisted snapshot, if any. `created_at` is the file's modification time.
    pub fn stored(&self) -> Option<Snapshot> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(file = %self.path.display(), "Cannot read snapshot file: {}", e);
                return None;
            }
        };

        let id = raw.trim().to_string();
        if id.is_empty() {
            return None;
        }

        let created_at = fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Some(Snapshot { id, created_at })
    }
}
