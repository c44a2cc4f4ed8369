//! System Routes
//!
//! Cross-document endpoints:
//! - GET /api/health   - Liveness plus a database round-trip
//! - GET /api/search?q - Filename substring search
//! - GET /api/stats    - Aggregate storage statistics
//! - GET /api/activity - Recent activity log entries

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::{ActivityEntry, ActivityRepository, Document, DocumentRepository, StorageStats};
use crate::error::{AppError, Result};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/search", get(search))
        .route("/stats", get(stats))
        .route("/activity", get(activity))
}

/// Round-trip the pool to report connectivity
async fn database_status(pool: &sqlx::SqlitePool) -> &'static str {
    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::error!("Database probe failed: {}", e);
            "disconnected"
        }
    }
}

#[derive(Serialize)]
pub(crate) struct RootResponse {
    service: &'static str,
    version: &'static str,
    status: &'static str,
    database: &'static str,
}

/// GET /
pub async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        service: "Redline Server",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
        database: database_status(state.db()).await,
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    version: &'static str,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        database: database_status(state.db()).await,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

#[derive(Serialize)]
struct SearchResponse {
    query: String,
    total: usize,
    results: Vec<Document>,
}

/// GET /api/search?q=
async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>> {
    let query = params.q.trim();
    if query.chars().count() < 2 {
        return Err(AppError::BadRequest(
            "search query must be at least 2 characters".to_string(),
        ));
    }

    let results = DocumentRepository::new(state.db()).search(query).await?;

    Ok(Json(SearchResponse {
        query: query.to_string(),
        total: results.len(),
        results,
    }))
}

/// GET /api/stats
async fn stats(State(state): State<AppState>) -> Result<Json<StorageStats>> {
    let stats = DocumentRepository::new(state.db()).stats().await?;
    Ok(Json(stats))
}

#[derive(Deserialize)]
struct ActivityParams {
    pdf_id: Option<String>,
    #[serde(default = "default_activity_limit")]
    limit: i64,
}

fn default_activity_limit() -> i64 {
    50
}

#[derive(Serialize)]
struct ActivityListResponse {
    total: usize,
    logs: Vec<ActivityEntry>,
}

/// GET /api/activity?pdf_id=&limit=
async fn activity(
    State(state): State<AppState>,
    Query(params): Query<ActivityParams>,
) -> Result<Json<ActivityListResponse>> {
    let logs = ActivityRepository::new(state.db())
        .recent(params.pdf_id.as_deref(), params.limit.clamp(1, 500))
        .await?;

    Ok(Json(ActivityListResponse {
        total: logs.len(),
        logs,
    }))
}
