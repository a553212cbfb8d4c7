//! Typed access to the persisted grimoire state.
//!
//! Four keys live in storage: the recipe collection, the pending-change
//! queue, the device identifier, and the last successful sync timestamp.
//! Each key is written independently; a crash between two writes can leave
//! them inconsistent, which is accepted.

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::device::generate_device_id;
use crate::models::{PendingChange, Recipe};
use crate::seed::seed_recipes;
use crate::storage::{StorageBackend, StorageError};

const RECIPES_KEY: &str = "recipes.json";
const PENDING_KEY: &str = "pending_changes.json";
const DEVICE_ID_KEY: &str = "device_id";
const LAST_SYNC_KEY: &str = "last_sync";

/// Errors from the typed store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("failed to encode {0}: {1}")]
    Encode(&'static str, #[source] serde_json::Error),
}

/// The single owner of the persisted representation.
///
/// Cheap to clone; all clones share one backend. Only the repository layer
/// mutates it; everything else receives snapshots.
#[derive(Clone)]
pub struct LocalStore {
    backend: Arc<dyn StorageBackend>,
}

impl LocalStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Loads the recipe collection.
    ///
    /// A missing key seeds the default collection; unparseable JSON is
    /// treated the same way (the corrupt value is overwritten), so this
    /// never fails for data reasons.
    pub fn load_recipes(&self) -> Result<Vec<Recipe>, StoreError> {
        match self.backend.read(RECIPES_KEY)? {
            Some(bytes) => match serde_json::from_slice(&bytes) {
                Ok(recipes) => Ok(recipes),
                Err(e) => {
                    warn!("stored recipes unreadable, reseeding: {}", e);
                    let seeds = seed_recipes();
                    self.save_recipes(&seeds)?;
                    Ok(seeds)
                }
            },
            None => {
                let seeds = seed_recipes();
                self.save_recipes(&seeds)?;
                Ok(seeds)
            }
        }
    }

    pub fn save_recipes(&self, recipes: &[Recipe]) -> Result<(), StoreError> {
        let bytes =
            serde_json::to_vec(recipes).map_err(|e| StoreError::Encode("recipes", e))?;
        self.backend.write(RECIPES_KEY, &bytes)?;
        Ok(())
    }

    /// Loads the pending-change queue. A missing or unreadable queue is
    /// empty.
    pub fn load_pending(&self) -> Result<Vec<PendingChange>, StoreError> {
        match self.backend.read(PENDING_KEY)? {
            Some(bytes) => match serde_json::from_slice(&bytes) {
                Ok(changes) => Ok(changes),
                Err(e) => {
                    warn!("stored pending queue unreadable, discarding: {}", e);
                    self.save_pending(&[])?;
                    Ok(Vec::new())
                }
            },
            None => Ok(Vec::new()),
        }
    }

    pub fn save_pending(&self, changes: &[PendingChange]) -> Result<(), StoreError> {
        let bytes =
            serde_json::to_vec(changes).map_err(|e| StoreError::Encode("pending queue", e))?;
        self.backend.write(PENDING_KEY, &bytes)?;
        Ok(())
    }

    /// Returns this device's identifier, generating and persisting one on
    /// first call. Never regenerated afterwards.
    pub fn device_id(&self) -> Result<String, StoreError> {
        if let Some(bytes) = self.backend.read(DEVICE_ID_KEY)? {
            if let Ok(id) = String::from_utf8(bytes) {
                let id = id.trim().to_string();
                if !id.is_empty() {
                    return Ok(id);
                }
            }
        }

        let id = generate_device_id();
        self.backend.write(DEVICE_ID_KEY, id.as_bytes())?;
        Ok(id)
    }

    /// The timestamp (epoch ms) of the last successful sync, if any.
    pub fn last_sync(&self) -> Result<Option<i64>, StoreError> {
        match self.backend.read(LAST_SYNC_KEY)? {
            Some(bytes) => Ok(String::from_utf8(bytes)
                .ok()
                .and_then(|s| s.trim().parse().ok())),
            None => Ok(None),
        }
    }

    pub fn set_last_sync(&self, timestamp: i64) -> Result<(), StoreError> {
        self.backend
            .write(LAST_SYNC_KEY, timestamp.to_string().as_bytes())?;
        Ok(())
    }
}
