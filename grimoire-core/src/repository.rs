//! The public surface of the grimoire.
//!
//! Local state is synchronous from the caller's perspective: `save` and
//! `delete` mutate storage, enqueue the pending change and notify
//! listeners before the background push is even spawned, so callers always
//! observe their own writes regardless of network outcome.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use crate::listeners::{ListenerRegistry, Subscription};
use crate::models::{PendingChange, Recipe};
use crate::queue::ChangeQueue;
use crate::storage::StorageBackend;
use crate::store::{LocalStore, StoreError};
use crate::sync::{PollHandle, SyncClient, SyncCoordinator};

/// Façade combining the local store, pending queue, listener registry and
/// sync coordinator.
pub struct RecipeRepository {
    store: LocalStore,
    queue: ChangeQueue,
    registry: ListenerRegistry,
    coordinator: SyncCoordinator,
    pushes: Mutex<Vec<JoinHandle<()>>>,
}

impl RecipeRepository {
    /// Creates a repository over the given storage backend. Passing no
    /// sync client yields a fully offline grimoire.
    pub fn new(backend: Arc<dyn StorageBackend>, client: Option<SyncClient>) -> Self {
        let store = LocalStore::new(backend);
        let queue = ChangeQueue::new(store.clone());
        let registry = ListenerRegistry::new();
        let coordinator = SyncCoordinator::new(
            store.clone(),
            queue.clone(),
            registry.clone(),
            client,
        );

        Self {
            store,
            queue,
            registry,
            coordinator,
            pushes: Mutex::new(Vec::new()),
        }
    }

    /// Returns the current local collection, newest first. The first-ever
    /// call seeds the default collection.
    pub fn list(&self) -> Result<Vec<Recipe>, StoreError> {
        let mut recipes = self.store.load_recipes()?;
        recipes.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(recipes)
    }

    /// Upserts a recipe and triggers a best-effort push.
    ///
    /// A recipe with an empty id is treated as new: it gets a fresh id and
    /// the save time as its creation time. Saving an existing id replaces
    /// every field except `id` and `created_at`. Returns the recipe as
    /// stored.
    pub fn save(&self, mut recipe: Recipe) -> Result<Recipe, StoreError> {
        let now = Utc::now().timestamp_millis();

        if recipe.id.is_empty() {
            recipe.id = Uuid::new_v4().to_string();
            recipe.created_at = now;
        } else if recipe.created_at <= 0 {
            recipe.created_at = now;
        }

        let mut recipes = self.store.load_recipes()?;
        let change = match recipes.iter_mut().find(|r| r.id == recipe.id) {
            Some(existing) => {
                recipe.created_at = existing.created_at;
                *existing = recipe.clone();
                PendingChange::update(recipe.clone(), now)
            }
            None => {
                recipes.push(recipe.clone());
                PendingChange::add(recipe.clone(), now)
            }
        };

        self.store.save_recipes(&recipes)?;
        self.queue.append(change)?;
        self.registry.notify(&recipes);
        self.spawn_push();

        Ok(recipe)
    }

    /// Removes a recipe and triggers a best-effort push.
    ///
    /// An absent id leaves the collection untouched; the delete change is
    /// recorded either way so the backend drops the record from its
    /// canonical collection.
    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut recipes = self.store.load_recipes()?;
        recipes.retain(|r| r.id != id);

        self.store.save_recipes(&recipes)?;
        self.queue
            .append(PendingChange::delete(id, Utc::now().timestamp_millis()))?;
        self.registry.notify(&recipes);
        self.spawn_push();

        Ok(())
    }

    /// Registers a collection-changed observer.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&[Recipe]) + Send + Sync + 'static,
    {
        self.registry.subscribe(callback)
    }

    /// Startup sequence: merge the remote collection into local state,
    /// flush pending changes, notify listeners and return the merged
    /// collection. Call once at application startup.
    pub async fn initialize(&self) -> Result<Vec<Recipe>, StoreError> {
        let merged = self.coordinator.initialize().await?;
        self.registry.notify(&merged);
        Ok(merged)
    }

    /// Snapshot of the not-yet-delivered changes.
    pub fn pending_changes(&self) -> Result<Vec<PendingChange>, StoreError> {
        self.queue.drain()
    }

    /// This device's persistent identifier.
    pub fn device_id(&self) -> Result<String, StoreError> {
        self.store.device_id()
    }

    /// Explicit push, awaited. Returns whether the backend confirmed it.
    pub async fn sync_now(&self) -> bool {
        self.coordinator.push().await
    }

    /// Whether a sync backend is configured.
    pub fn sync_configured(&self) -> bool {
        self.coordinator.is_configured()
    }

    /// Starts the continuous polling pull; the handle is the disposer.
    pub fn start_polling(&self, interval: Duration) -> PollHandle {
        self.coordinator.start_polling(interval)
    }

    /// Awaits every background push spawned so far. Lets tests (and
    /// auto-syncing CLI commands) observe sync outcomes deterministically.
    pub async fn flush(&self) {
        let handles: Vec<JoinHandle<()>> = match self.pushes.lock() {
            Ok(mut pushes) => pushes.drain(..).collect(),
            Err(_) => return,
        };
        for handle in handles {
            let _ = handle.await;
        }
    }

    fn spawn_push(&self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("no async runtime; push deferred to the next sync trigger");
            return;
        };

        let coordinator = self.coordinator.clone();
        let handle = runtime.spawn(async move {
            coordinator.push().await;
        });
        if let Ok(mut pushes) = self.pushes.lock() {
            pushes.push(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ingredient;
    use crate::storage::MemoryStorage;
    use axum::extract::State;
    use axum::routing::{get, post};
    use axum::{Json, Router};

    fn offline_repo() -> RecipeRepository {
        RecipeRepository::new(Arc::new(MemoryStorage::new()), None)
    }

    fn draft(name: &str, category: &str) -> Recipe {
        Recipe {
            id: String::new(),
            created_at: 0,
            ..Recipe::new(name, category)
        }
    }

    #[derive(Clone, Default)]
    struct MockBackend {
        pushes: Arc<Mutex<Vec<serde_json::Value>>>,
    }

    async fn accept_push(
        State(backend): State<MockBackend>,
        Json(body): Json<serde_json::Value>,
    ) -> Json<serde_json::Value> {
        backend.pushes.lock().unwrap().push(body);
        Json(serde_json::json!({ "success": true }))
    }

    async fn empty_ok(State(_): State<MockBackend>) -> Json<serde_json::Value> {
        Json(serde_json::json!({ "success": true, "data": [] }))
    }

    async fn spawn_backend(backend: MockBackend) -> String {
        let app = Router::new()
            .route("/api/recipes", get(empty_ok))
            .route("/api/recipes/sync", post(accept_push))
            .route("/api/recipes/changes", get(empty_ok))
            .with_state(backend);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api", addr)
    }

    #[test]
    fn test_list_seeds_on_first_access() {
        let repo = offline_repo();
        let recipes = repo.list().unwrap();
        assert_eq!(recipes.len(), 2);
        assert_eq!(recipes[0].id, "1");
        assert_eq!(recipes[1].id, "2");
    }

    #[test]
    fn test_save_assigns_id_and_created_at() {
        let repo = offline_repo();
        let before = Utc::now().timestamp_millis();
        let saved = repo.save(draft("Mythic Soda", "Fizz")).unwrap();
        let after = Utc::now().timestamp_millis();

        assert!(!saved.id.is_empty());
        assert!(saved.created_at >= before && saved.created_at <= after);

        let other = repo.save(draft("Second", "Fizz")).unwrap();
        assert_ne!(saved.id, other.id);
    }

    #[test]
    fn test_save_existing_preserves_created_at() {
        let repo = offline_repo();
        let saved = repo.save(draft("Mythic Soda", "Fizz")).unwrap();

        let mut edited = saved.clone();
        edited.name = "Mythic Soda Reserve".to_string();
        edited.created_at = 1; // must be ignored
        let resaved = repo.save(edited).unwrap();

        assert_eq!(resaved.id, saved.id);
        assert_eq!(resaved.created_at, saved.created_at);
        assert_eq!(resaved.name, "Mythic Soda Reserve");

        let listed = repo.list().unwrap();
        let found = listed.iter().find(|r| r.id == saved.id).unwrap();
        assert_eq!(found.name, "Mythic Soda Reserve");
    }

    #[test]
    fn test_save_enqueues_add_then_update() {
        let repo = offline_repo();
        let saved = repo.save(draft("Mythic Soda", "Fizz")).unwrap();
        repo.save(saved).unwrap();

        let pending = repo.pending_changes().unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].action(), "add");
        assert_eq!(pending[1].action(), "update");
    }

    #[test]
    fn test_delete_missing_id_is_noop_on_collection() {
        let repo = offline_repo();
        let before = repo.list().unwrap();
        repo.delete("no-such-id").unwrap();
        assert_eq!(repo.list().unwrap(), before);
    }

    #[test]
    fn test_notify_carries_post_mutation_collection() {
        let repo = offline_repo();
        repo.list().unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let _sub = repo.subscribe(move |recipes| {
            s.lock()
                .unwrap()
                .push(recipes.iter().map(|r| r.id.clone()).collect::<Vec<_>>());
        });

        let saved = repo
            .save(
                draft("Mythic Soda", "Fizz")
                    .with_ingredients(vec![Ingredient::new("Stardust", "1 pinch")]),
            )
            .unwrap();
        repo.delete("1").unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].contains(&saved.id));
        assert!(!seen[1].contains(&"1".to_string()));
    }

    #[test]
    fn test_grimoire_scenario_offline() {
        // Two seed recipes; add one, delete one; the queue holds both
        // mutations because nothing ever confirmed a push.
        let repo = offline_repo();

        let saved = repo.save(draft("Mythic Soda", "Fizz of Legends")).unwrap();
        let listed = repo.list().unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].id, saved.id);

        repo.delete("1").unwrap();
        let listed = repo.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|r| r.id != "1"));

        let pending = repo.pending_changes().unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].action(), "add");
        assert_eq!(pending[1].action(), "delete");
    }

    #[tokio::test]
    async fn test_successful_push_clears_pending() {
        let backend = MockBackend::default();
        let url = spawn_backend(backend.clone()).await;
        let repo =
            RecipeRepository::new(Arc::new(MemoryStorage::new()), Some(SyncClient::new(url)));

        repo.save(draft("Mythic Soda", "Fizz")).unwrap();
        repo.delete("1").unwrap();
        repo.flush().await;

        assert!(repo.pending_changes().unwrap().is_empty());
        assert!(!backend.pushes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mutation_visible_before_push_resolves() {
        let backend = MockBackend::default();
        let url = spawn_backend(backend.clone()).await;
        let repo =
            RecipeRepository::new(Arc::new(MemoryStorage::new()), Some(SyncClient::new(url)));

        let notified = Arc::new(Mutex::new(0usize));
        let n = notified.clone();
        let _sub = repo.subscribe(move |_| *n.lock().unwrap() += 1);

        repo.save(draft("Mythic Soda", "Fizz")).unwrap();

        // save() has returned: the local write and the notification already
        // happened, while the push may still be in flight.
        assert_eq!(*notified.lock().unwrap(), 1);
        assert_eq!(repo.list().unwrap().len(), 3);

        repo.flush().await;
        assert!(repo.pending_changes().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_initialize_returns_merged_and_notifies() {
        let backend = MockBackend::default();
        let url = spawn_backend(backend).await;
        let repo =
            RecipeRepository::new(Arc::new(MemoryStorage::new()), Some(SyncClient::new(url)));

        let notified = Arc::new(Mutex::new(0usize));
        let n = notified.clone();
        let _sub = repo.subscribe(move |_| *n.lock().unwrap() += 1);

        let merged = repo.initialize().await.unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(*notified.lock().unwrap(), 1);
    }
}
