//! # boxstore-api — Axum HTTP Surface for the Boxstore Artifact Registry
//!
//! Serves the resumable upload and range-addressable download engine from
//! `boxstore-storage` over HTTP. Authorization and relational CRUD for the
//! coordinate hierarchy happen upstream; requests reaching these handlers
//! carry already-authorized coordinate segments.
//!
//! ## API Surface
//!
//! | Route                                  | Module                  |
//! |----------------------------------------|-------------------------|
//! | `POST|PUT .../file/upload`             | [`routes::artifacts`]   |
//! | `GET .../file/download`                | [`routes::artifacts`]   |
//! | `DELETE .../file`                      | [`routes::artifacts`]   |
//! | `GET /openapi.json`                    | [`openapi`]             |
//! | `GET /health/*`                        | [`app`]                 |
//!
//! ## Middleware Stack
//!
//! ```text
//! TraceLayer → TimeoutLayer (hours-scale, from config) → Handler
//! ```
//!
//! The timeout is deliberately long: artifacts are multi-gigabyte and a
//! transfer is one request. There is no per-chunk timeout.

pub mod error;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) are mounted outside the API middleware so
/// they answer instantly regardless of transfer load.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::artifacts::router())
        .merge(openapi::router())
        .layer(TimeoutLayer::new(state.config.storage.upload_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}
