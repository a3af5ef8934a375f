//! Router construction.

use axum::Router;
use axum::routing::{get, post};

use crate::handlers::{
    Operation, unroll_content, unroll_content_preview, unroll_internal_content,
    unroll_internal_content_preview,
};
use crate::health::{build_info, good_to_go, health, ping};
use crate::state::AppState;

/// Build the service router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Unroll operations
        .route(Operation::Content.path(), post(unroll_content))
        .route(Operation::ContentPreview.path(), post(unroll_content_preview))
        .route(Operation::InternalContent.path(), post(unroll_internal_content))
        .route(
            Operation::InternalContentPreview.path(),
            post(unroll_internal_content_preview),
        )
        // Operational endpoints
        .route("/__health", get(health))
        .route("/__gtg", get(good_to_go))
        .route("/__ping", get(ping))
        .route("/__build-info", get(build_info))
        .with_state(state)
}
