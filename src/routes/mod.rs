//! HTTP route handlers

pub mod documents;
pub mod download;
pub mod system;

use axum::Router;

use crate::state::AppState;

/// Everything mounted under /api
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(documents::router())
        .merge(download::router())
        .merge(system::router())
}
