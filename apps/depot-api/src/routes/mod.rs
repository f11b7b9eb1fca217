//! HTTP routes, one module per resource.
//!
//! Every protected handler takes an [`Identity`](crate::auth::Identity) and
//! runs its statements on `identity.db(&state)?`, the pool logged in as the
//! caller's role. Only the login and employee routes touch the provisioning
//! pool, and only through fixed code paths.

use axum::Router;
use serde::Serialize;

use crate::AppState;

pub mod auth;
pub mod employee;
pub mod health;
pub mod invoice;
pub mod invoice_line;
pub mod order;
pub mod receipt;
pub mod receipt_line;
pub mod stock;

/// Build a router with all routes registered (no middleware)
pub fn build_router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(invoice::router())
        .merge(invoice_line::router())
        .merge(receipt::router())
        .merge(receipt_line::router())
        .merge(order::router())
        .merge(stock::router())
        .merge(employee::router())
        .merge(health::router())
}

/// Plain acknowledgement body.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Message {
            message: message.into(),
        }
    }
}
