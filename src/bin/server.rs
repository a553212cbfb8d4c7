//! Grimoire Sync Server
//!
//! A reference backend for the grimoire sync contract. Stores the canonical
//! recipe collection and lets devices push snapshots and poll for changes.
//!
//! # Configuration
//!
//! Environment variables:
//! - `GRIMOIRE_SERVER_PORT`: Port to listen on (default: 3001)
//! - `GRIMOIRE_SERVER_DATA_DIR`: Directory to store the collection
//!   (default: ~/.local/share/grimoire-server)
//!
//! # Endpoints
//!
//! - `GET /health`: Health check endpoint
//! - `GET /api/recipes?deviceId=ID`: Full collection
//! - `POST /api/recipes/sync`: Snapshot push `{deviceId, recipes, timestamp, changes}`
//! - `GET /api/recipes/changes?deviceId=ID&since=MS`: Records written after
//!   `since` by other devices

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use grimoire_core::{PendingChange, Recipe};

// ============================================================================
// Configuration
// ============================================================================

/// Server configuration
#[derive(Debug, Clone)]
struct Config {
    /// Port to listen on
    port: u16,
    /// Directory holding the persisted collection
    data_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        let port = std::env::var("GRIMOIRE_SERVER_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3001);

        let data_dir = std::env::var("GRIMOIRE_SERVER_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("grimoire-server")
            });

        Self { port, data_dir }
    }
}

// ============================================================================
// Storage
// ============================================================================

/// A recipe plus the sync metadata the `/changes` endpoint needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRecord {
    recipe: Recipe,
    /// Server receipt time of the last write, epoch ms
    synced_at: i64,
    /// Device that last wrote this record
    device_id: String,
}

/// Canonical server-side collection, keyed by recipe id.
struct RecipeStore {
    records: RwLock<HashMap<String, StoredRecord>>,
    data_path: Option<PathBuf>,
}

impl RecipeStore {
    /// Opens the store, loading any previously persisted collection.
    /// An unreadable file starts the server empty rather than failing.
    fn open(data_path: Option<PathBuf>) -> Self {
        let records = match &data_path {
            Some(path) => match std::fs::read(path) {
                Ok(bytes) => match serde_json::from_slice::<Vec<StoredRecord>>(&bytes) {
                    Ok(stored) => stored
                        .into_iter()
                        .map(|r| (r.recipe.id.clone(), r))
                        .collect(),
                    Err(e) => {
                        tracing::warn!("persisted collection unreadable, starting empty: {}", e);
                        HashMap::new()
                    }
                },
                Err(_) => HashMap::new(),
            },
            None => HashMap::new(),
        };

        Self {
            records: RwLock::new(records),
            data_path,
        }
    }

    /// Full collection, newest first.
    async fn all(&self) -> Vec<Recipe> {
        let records = self.records.read().await;
        let mut recipes: Vec<Recipe> =
            records.values().map(|r| r.recipe.clone()).collect();
        recipes.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        recipes
    }

    /// Applies one pushed snapshot.
    ///
    /// Incoming recipes merge last-write-wins by `created_at`; delete
    /// changes then remove their targets. Only records a push actually
    /// altered get fresh sync metadata, so `/changes` stays quiet about
    /// untouched rows.
    async fn apply_sync(
        &self,
        device_id: &str,
        recipes: Vec<Recipe>,
        changes: &[PendingChange],
    ) -> Result<(), std::io::Error> {
        let now = Utc::now().timestamp_millis();
        let mut records = self.records.write().await;

        for recipe in recipes {
            match records.get(&recipe.id) {
                Some(existing) if recipe.created_at <= existing.recipe.created_at => {}
                _ => {
                    records.insert(
                        recipe.id.clone(),
                        StoredRecord {
                            recipe,
                            synced_at: now,
                            device_id: device_id.to_string(),
                        },
                    );
                }
            }
        }

        for change in changes {
            if let PendingChange::Delete { recipe_id, .. } = change {
                records.remove(recipe_id);
            }
        }

        self.persist(&records)
    }

    /// Records written after `since` by a device other than the requester.
    async fn changes_since(&self, device_id: &str, since: i64) -> Vec<Recipe> {
        let records = self.records.read().await;
        let mut recipes: Vec<Recipe> = records
            .values()
            .filter(|r| r.synced_at > since && r.device_id != device_id)
            .map(|r| r.recipe.clone())
            .collect();
        recipes.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        recipes
    }

    fn persist(&self, records: &HashMap<String, StoredRecord>) -> Result<(), std::io::Error> {
        let Some(path) = &self.data_path else {
            return Ok(());
        };

        let stored: Vec<&StoredRecord> = records.values().collect();
        let bytes = serde_json::to_vec(&stored)?;
        std::fs::write(path, bytes)
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Response envelope shared by all sync endpoints
#[derive(Serialize)]
struct SyncEnvelope {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Vec<Recipe>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl SyncEnvelope {
    fn ok(data: Option<Vec<Recipe>>) -> Json<Self> {
        Json(Self {
            success: true,
            data,
            error: None,
        })
    }

    fn fail(error: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: false,
            data: None,
            error: Some(error.into()),
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceQuery {
    #[allow(dead_code)]
    device_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangesQuery {
    #[serde(default)]
    device_id: String,
    #[serde(default)]
    since: i64,
}

/// Push request body
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyncBody {
    device_id: String,
    recipes: Vec<Recipe>,
    #[allow(dead_code)]
    timestamp: i64,
    #[serde(default)]
    changes: Vec<PendingChange>,
}

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    store: Arc<RecipeStore>,
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /api/recipes
async fn get_recipes(
    State(state): State<AppState>,
    Query(_query): Query<DeviceQuery>,
) -> Json<SyncEnvelope> {
    SyncEnvelope::ok(Some(state.store.all().await))
}

/// POST /api/recipes/sync
async fn post_sync(
    State(state): State<AppState>,
    Json(body): Json<SyncBody>,
) -> Json<SyncEnvelope> {
    let count = body.recipes.len();
    match state
        .store
        .apply_sync(&body.device_id, body.recipes, &body.changes)
        .await
    {
        Ok(()) => {
            tracing::info!(
                "accepted snapshot from {}: {} recipe(s), {} change(s)",
                body.device_id,
                count,
                body.changes.len()
            );
            SyncEnvelope::ok(None)
        }
        Err(e) => {
            tracing::error!("failed to persist snapshot: {}", e);
            SyncEnvelope::fail("failed to persist snapshot")
        }
    }
}

/// GET /api/recipes/changes
async fn get_changes(
    State(state): State<AppState>,
    Query(query): Query<ChangesQuery>,
) -> Json<SyncEnvelope> {
    let changed = state
        .store
        .changes_since(&query.device_id, query.since)
        .await;
    SyncEnvelope::ok(Some(changed))
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/recipes", get(get_recipes))
        .route("/api/recipes/sync", post(post_sync))
        .route("/api/recipes/changes", get(get_changes))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grimoire_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();

    // Ensure data directory exists
    if let Err(e) = std::fs::create_dir_all(&config.data_dir) {
        tracing::error!("Failed to create data directory: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Data directory: {}", config.data_dir.display());

    let store = Arc::new(RecipeStore::open(Some(
        config.data_dir.join("recipes.json"),
    )));
    let app = router(AppState { store });

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
