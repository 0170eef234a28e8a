//! HTTP handlers for REST API endpoints

use axum::{extract::State, Json, Router};
use leregistre::Storage;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::error;

use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};
use crate::responses::HealthResponse;

/// Aptitude test endpoints
pub mod assessments;
/// Dashboard analytics endpoints
pub mod analytics;
/// Course catalog endpoints
pub mod courses;
/// Recommendation endpoints, including generation
pub mod recommendations;
/// Learner endpoints
pub mod users;

/// State shared across all handlers
///
/// Uses `Arc<Mutex<Storage>>` because `rusqlite::Connection` is not `Sync`.
/// Handlers lock for the duration of one store call and never hold the
/// guard across an `.await`.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe storage access requiring mutex lock
    pub storage: Arc<Mutex<Storage>>,

    /// Immutable server configuration
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create a new AppState instance with storage and configuration
    pub fn new(storage: Storage, config: ServerConfig) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
            config: Arc::new(config),
        }
    }

    /// Create AppState from an existing Arc<Mutex<Storage>>
    pub fn new_from_arc(storage: Arc<Mutex<Storage>>, config: ServerConfig) -> Self {
        Self {
            storage,
            config: Arc::new(config),
        }
    }

    /// Lock the storage
    pub fn storage(&self) -> ApiResult<MutexGuard<'_, Storage>> {
        self.storage.lock().map_err(|_| {
            error!("Storage mutex poisoned");
            ApiError::internal("Storage is unavailable")
        })
    }
}

/// GET /api/health - Liveness and database check
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let database = {
        let storage = state.storage()?;
        match storage.conn().query_row("SELECT 1", [], |row| row.get::<_, i64>(0)) {
            Ok(_) => "connected",
            Err(e) => {
                error!("Health check query failed: {}", e);
                "unavailable"
            }
        }
    };

    Ok(Json(HealthResponse {
        status: if database == "connected" { "ok" } else { "degraded" }.to_string(),
        service: "leserve".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
    }))
}

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/api/health", axum::routing::get(health_check))
        .merge(users::routes())
        .merge(courses::routes())
        .merge(assessments::routes())
        .merge(recommendations::routes())
        .merge(analytics::routes())
}
