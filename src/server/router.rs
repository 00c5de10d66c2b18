//! Axum router construction.

use std::path::Path;

use axum::routing::get;
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::data::SnapshotStore;
use crate::server::handlers;

/// Build the router.
///
/// - `GET|POST /rpc` -- `{"Cmd": "scale" | "sample"}` in the `rpc` form field
/// - anything else -- files under `static_dir`
pub fn build_router(store: SnapshotStore, static_dir: &Path) -> Router {
    Router::new()
        .route("/rpc", get(handlers::rpc).post(handlers::rpc))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}
