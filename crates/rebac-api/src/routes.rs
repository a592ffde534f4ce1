use std::sync::Arc;

use axum::{routing::get, routing::post, Router};
use tower_http::trace::TraceLayer;

use crate::handlers::{health, webhook};
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health::health_check))
        .route("/authorize", post(webhook::authorize))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
