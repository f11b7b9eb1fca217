//! # depot-api: HTTP Surface for Depot
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Request Flow                                   │
//! │                                                                         │
//! │  Authorization: Bearer <jwt>                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Identity extractor ──► 401 if missing / invalid                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  identity.db(&state) ──► ConnectionRouter::handle(role)                 │
//! │       │                  None → 403                                     │
//! │       ▼                                                                 │
//! │  repository call on the role's pool ──► store enforces privileges       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError ──► {code, message} with 400 / 403 / 404 / 500                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod wire;

use std::sync::Arc;

use axum::Router;
use depot_db::ConnectionRouter;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::JwtManager;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub router: ConnectionRouter,
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    pub fn new(router: ConnectionRouter, jwt: JwtManager) -> Self {
        AppState {
            router,
            jwt: Arc::new(jwt),
        }
    }
}

/// Build the application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    routes::build_router()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
