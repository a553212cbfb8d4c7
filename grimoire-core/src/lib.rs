//! Grimoire Core Library
//!
//! Local-first storage, merge and sync logic for the alchemist's grimoire.
//! Mutations land in durable local storage and notify in-process listeners
//! immediately; delivery to the cloud backend is a best-effort background
//! concern buffered through a pending-change queue.

pub mod device;
pub mod listeners;
pub mod merge;
pub mod models;
pub mod queue;
pub mod repository;
pub mod seed;
pub mod storage;
pub mod store;
pub mod sync;

pub use listeners::{ListenerRegistry, Subscription};
pub use merge::merge_recipes;
pub use models::{Ingredient, PendingChange, Recipe};
pub use queue::ChangeQueue;
pub use repository::RecipeRepository;
pub use seed::seed_recipes;
pub use storage::{FileStorage, MemoryStorage, StorageBackend, StorageError};
pub use store::{LocalStore, StoreError};
pub use sync::{PollHandle, SyncClient, SyncCoordinator, SyncError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
