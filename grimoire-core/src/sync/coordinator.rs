//! Orchestration of push and pull against the sync backend.
//!
//! The coordinator never surfaces a network failure to its callers: a
//! failed push leaves the pending queue intact for the next trigger, and a
//! failed pull is skipped until the next tick. An unconfigured backend is
//! treated like an unreachable one.

use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::client::SyncClient;
use crate::listeners::ListenerRegistry;
use crate::merge::merge_recipes;
use crate::models::{PendingChange, Recipe};
use crate::queue::ChangeQueue;
use crate::store::{LocalStore, StoreError};

/// Drives synchronization between the local store and the backend.
///
/// Cheap to clone; clones share the same store, queue and listener set.
#[derive(Clone)]
pub struct SyncCoordinator {
    store: LocalStore,
    queue: ChangeQueue,
    registry: ListenerRegistry,
    client: Option<SyncClient>,
}

impl SyncCoordinator {
    pub fn new(
        store: LocalStore,
        queue: ChangeQueue,
        registry: ListenerRegistry,
        client: Option<SyncClient>,
    ) -> Self {
        Self {
            store,
            queue,
            registry,
            client,
        }
    }

    /// Whether a backend is configured at all.
    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Pushes the full current snapshot plus the pending-change list.
    ///
    /// On success the queue is cleared and the last-sync timestamp
    /// advances. On any failure the queue is left intact and the failure is
    /// logged. Returns whether the push was confirmed.
    pub async fn push(&self) -> bool {
        let Some(client) = &self.client else {
            debug!("push skipped: sync not configured");
            return false;
        };

        let (device_id, recipes, changes) = match self.snapshot() {
            Ok(payload) => payload,
            Err(e) => {
                warn!("push skipped, local state unreadable: {}", e);
                return false;
            }
        };

        let now = Utc::now().timestamp_millis();
        match client
            .push_snapshot(&device_id, &recipes, &changes, now)
            .await
        {
            Ok(()) => {
                if let Err(e) = self.queue.clear() {
                    warn!("push confirmed but queue not cleared: {}", e);
                }
                if let Err(e) = self.store.set_last_sync(now) {
                    warn!("push confirmed but last-sync not recorded: {}", e);
                }
                true
            }
            Err(e) => {
                warn!(
                    "push failed, keeping {} pending change(s): {}",
                    changes.len(),
                    e
                );
                false
            }
        }
    }

    /// Startup sequence: ensure a device identity, pull the remote
    /// collection (failure tolerated as empty), merge it into local state,
    /// persist the result, then flush any pending changes. Returns the
    /// merged collection.
    pub async fn initialize(&self) -> Result<Vec<Recipe>, StoreError> {
        let device_id = self.store.device_id()?;

        let remote = match &self.client {
            Some(client) => match client.fetch_recipes(&device_id).await {
                Ok(remote) => remote,
                Err(e) => {
                    warn!("initial pull failed, using local state: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let local = self.store.load_recipes()?;
        let merged = merge_recipes(&local, &remote);
        self.store.save_recipes(&merged)?;

        self.push().await;

        Ok(merged)
    }

    /// One polling tick: fetch records written since the last sync, merge
    /// them in, notify listeners and advance the timestamp. Failures are
    /// skipped silently until the next tick.
    pub async fn pull_once(&self) -> Option<Vec<Recipe>> {
        let client = self.client.as_ref()?;

        let device_id = match self.store.device_id() {
            Ok(id) => id,
            Err(e) => {
                debug!("pull skipped: {}", e);
                return None;
            }
        };
        let since = self.store.last_sync().ok().flatten().unwrap_or(0);

        let remote = match client.fetch_changes(&device_id, since).await {
            Ok(remote) => remote,
            Err(e) => {
                debug!("pull skipped: {}", e);
                return None;
            }
        };

        match self.apply_remote(&remote) {
            Ok(merged) => {
                self.registry.notify(&merged);
                Some(merged)
            }
            Err(e) => {
                warn!("pull result not persisted: {}", e);
                None
            }
        }
    }

    /// Device id, full snapshot and pending queue for a push payload.
    fn snapshot(&self) -> Result<(String, Vec<Recipe>, Vec<PendingChange>), StoreError> {
        Ok((
            self.store.device_id()?,
            self.store.load_recipes()?,
            self.queue.drain()?,
        ))
    }

    /// Merges pulled records into local state and advances the last-sync
    /// timestamp.
    fn apply_remote(&self, remote: &[Recipe]) -> Result<Vec<Recipe>, StoreError> {
        let local = self.store.load_recipes()?;
        let merged = merge_recipes(&local, remote);
        self.store.save_recipes(&merged)?;
        self.store.set_last_sync(Utc::now().timestamp_millis())?;
        Ok(merged)
    }

    /// Starts the continuous polling pull on a fixed interval.
    ///
    /// The first tick fires one interval after the call. The returned
    /// handle is the disposer; once stopped (or dropped) no further tick
    /// fires.
    pub fn start_polling(&self, interval: Duration) -> PollHandle {
        let coordinator = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // interval's first tick completes immediately; swallow it so
            // the first pull happens a full interval from now.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                coordinator.pull_once().await;
            }
        });
        PollHandle { handle }
    }
}

/// Cancellation handle for the polling pull.
pub struct PollHandle {
    handle: JoinHandle<()>,
}

impl PollHandle {
    /// Stops the polling task. No tick fires after this returns.
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
