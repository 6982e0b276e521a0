//! HTTP surface of the service

pub mod handlers;

use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

/// Build the service router.
///
/// The body limit mirrors the upload cap so an oversized request is
/// rejected by the server before it is ever buffered.
pub fn routes(state: AppState) -> Router {
    let max_body = state.config.limits.max_upload_bytes as usize;

    Router::new()
        .route("/", get(handlers::landing))
        .route("/api/predict", post(handlers::predict))
        .layer(DefaultBodyLimit::max(max_body))
        .with_state(state)
}
