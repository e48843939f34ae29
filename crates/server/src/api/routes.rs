use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

use super::{convert, download, handlers, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Page assets next to index.html
    let assets = ServeDir::new(state.static_dir());

    Router::new()
        // Page shell
        .route("/", get(handlers::index))
        // Conversion
        .route("/convert", post(convert::convert))
        .route("/progress/{task_id}", get(handlers::progress))
        .route("/download/{filename}", get(download::download))
        // Operations
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .nest_service("/static", assets)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
