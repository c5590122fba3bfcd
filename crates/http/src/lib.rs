//! HTTP API server for simtrack.

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(unreachable_pub, reason = "pub items are re-exported")]
#![allow(clippy::absolute_paths, reason = "Explicit paths for clarity")]
#![allow(unused_results, reason = "Some results are intentionally ignored")]
#![allow(clippy::arithmetic_side_effects, reason = "Arithmetic is safe in context")]
#![allow(missing_copy_implementations, reason = "Types may grow")]
#![allow(clippy::ref_patterns, reason = "Ref patterns are clearer")]
#![allow(missing_debug_implementations, reason = "Internal types")]
#![allow(clippy::missing_docs_in_private_items, reason = "Internal crate")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]
#![allow(clippy::min_ident_chars, reason = "Short closure params are idiomatic")]
#![allow(clippy::exhaustive_structs, reason = "HTTP types are stable")]
#![allow(clippy::single_call_fn, reason = "Helper functions improve readability")]

pub mod api_error;
mod api_types;
mod auth;
mod handlers;
mod poller;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use tower_http::cors::CorsLayer;

use simtrack_service::{HistoryService, ProvisionService, ReconcileService, RegistryService};

pub use api_types::VersionResponse;
pub use poller::start_reconcile_poller;

/// Shared application state for all HTTP handlers.
///
/// Wrapped in `Arc` for thread-safe sharing across handlers.
pub struct AppState {
    /// Reconciliation engine (cycles and retired-number cleanup)
    pub reconcile: Arc<ReconcileService>,
    /// Device provisioning pipeline
    pub provision: Arc<ProvisionService>,
    /// Service-history CRUD
    pub history: Arc<HistoryService>,
    /// Device-number registry CRUD
    pub registry: Arc<RegistryService>,
    /// Bearer token for the `/api` surface; `None` disables auth
    pub api_token: Option<String>,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/api/version", get(version))
        .route("/api/history", get(handlers::history::list_history))
        .route("/api/history", post(handlers::history::create_history))
        .route(
            "/api/history/{id}",
            get(handlers::history::get_history)
                .put(handlers::history::update_history)
                .delete(handlers::history::delete_history),
        )
        .route("/api/numbers", get(handlers::registry::list_devices))
        .route("/api/numbers/retire-all", post(handlers::registry::retire_all))
        .route(
            "/api/numbers/{id}",
            get(handlers::registry::get_device).delete(handlers::registry::delete_device),
        )
        .route("/api/provision", post(handlers::reconcile::provision))
        .route("/api/reconcile", post(handlers::reconcile::run_cycle))
        .route("/api/cleanup", post(handlers::reconcile::cleanup))
        .route_layer(middleware::from_fn_with_state(Arc::clone(&state), auth::require_bearer));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse { version: env!("CARGO_PKG_VERSION") })
}

#[cfg(test)]
mod router_tests;
