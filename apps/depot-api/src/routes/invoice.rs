//! Invoice routes: list, create, complete, delete.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use depot_core::search::InvoiceFilter;
use depot_core::{Invoice, InvoiceStatus, InvoiceSummary, InvoiceType};
use serde::Deserialize;

use super::Message;
use crate::auth::Identity;
use crate::error::ApiResult;
use crate::extract::{IdPath, JsonBody, QueryParams};
use crate::wire::lenient_opt_i64;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/invoice", get(list).post(create))
        .route("/api/invoice/{id}", put(complete).delete(delete))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "type")]
    pub key: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateInvoice {
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub provider_id: Option<i64>,
    pub invoice_type: String,
}

#[derive(Debug, Deserialize)]
pub struct CompleteInvoice {
    /// Defaults to now.
    pub completed_at: Option<DateTime<Utc>>,
    pub status: String,
}

async fn list(
    identity: Identity,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<Json<Vec<InvoiceSummary>>> {
    let db = identity.db(&state)?;
    let filter = InvoiceFilter::parse(query.key.as_deref(), query.search.as_deref())?;
    Ok(Json(db.invoices().list(&filter).await?))
}

/// The invoice belongs to the caller.
async fn create(
    identity: Identity,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateInvoice>,
) -> ApiResult<(StatusCode, Json<Invoice>)> {
    let db = identity.db(&state)?;
    let invoice_type: InvoiceType = req.invoice_type.parse()?;

    let invoice = db
        .invoices()
        .create(identity.employee_id, invoice_type, req.provider_id)
        .await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

async fn complete(
    identity: Identity,
    State(state): State<AppState>,
    IdPath(invoice_id): IdPath,
    JsonBody(req): JsonBody<CompleteInvoice>,
) -> ApiResult<Json<Invoice>> {
    let db = identity.db(&state)?;
    let status: InvoiceStatus = req.status.parse()?;
    let completed_at = req.completed_at.unwrap_or_else(Utc::now);

    let invoice = db
        .invoices()
        .complete(invoice_id, status, completed_at)
        .await?;
    Ok(Json(invoice))
}

async fn delete(
    identity: Identity,
    State(state): State<AppState>,
    IdPath(invoice_id): IdPath,
) -> ApiResult<Json<Message>> {
    let db = identity.db(&state)?;
    db.invoices().delete(invoice_id).await?;
    Ok(Json(Message::new(format!("Invoice {} deleted", invoice_id))))
}
