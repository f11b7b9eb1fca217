//! Invoice line routes (`/api/pfi`).
//!
//! `POST` with a `needMinus` flag goes through the order-to-invoice bridge:
//! the line and the reorder-queue decrement commit together.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use depot_core::search::InvoiceLineFilter;
use depot_core::{InvoiceLine, InvoiceLineDetail, InvoiceLineUpdate, Money, NewInvoiceLine};
use serde::Deserialize;

use crate::auth::Identity;
use crate::error::ApiResult;
use crate::extract::{IdPath, JsonBody, QueryParams};
use crate::wire::lenient_i64;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/pfi", get(list).post(create))
        .route("/api/pfi/{id}", put(update).delete(delete))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub invoice_type: Option<String>,
    pub search_type: Option<String>,
    pub search_value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateLine {
    #[serde(deserialize_with = "lenient_i64")]
    pub invoice_id: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub product_id: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub quantity: i64,
    pub product_price: Money,
    pub date_of_manufacture: Option<NaiveDate>,
    pub use_by_date: Option<NaiveDate>,
    #[serde(rename = "needMinus", alias = "need_minus")]
    pub need_minus: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLine {
    pub product_price: Money,
    pub date_of_manufacture: NaiveDate,
    pub use_by_date: NaiveDate,
}

async fn list(
    identity: Identity,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<Json<Vec<InvoiceLineDetail>>> {
    let db = identity.db(&state)?;
    let filter = InvoiceLineFilter::parse(
        query.invoice_type.as_deref(),
        query.search_type.as_deref(),
        query.search_value.as_deref(),
    )?;
    Ok(Json(db.invoice_lines().list(&filter).await?))
}

async fn create(
    identity: Identity,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateLine>,
) -> ApiResult<(StatusCode, Json<InvoiceLine>)> {
    let db = identity.db(&state)?;
    let line = NewInvoiceLine {
        invoice_id: req.invoice_id,
        product_id: req.product_id,
        quantity: req.quantity,
        product_price: req.product_price,
        date_of_manufacture: req.date_of_manufacture,
        use_by_date: req.use_by_date,
    };

    let inserted = match req.need_minus {
        Some(need_minus) => db.orders().convert_to_invoice_line(&line, need_minus).await?,
        None => db.invoice_lines().add_line(&line).await?,
    };
    Ok((StatusCode::CREATED, Json(inserted)))
}

async fn update(
    identity: Identity,
    State(state): State<AppState>,
    IdPath(line_id): IdPath,
    JsonBody(req): JsonBody<UpdateLine>,
) -> ApiResult<Json<InvoiceLine>> {
    let db = identity.db(&state)?;
    let update = InvoiceLineUpdate {
        product_price: req.product_price,
        date_of_manufacture: req.date_of_manufacture,
        use_by_date: req.use_by_date,
    };
    Ok(Json(db.invoice_lines().update_line(line_id, &update).await?))
}

/// Returns the removed line; its stock contribution has been reversed.
async fn delete(
    identity: Identity,
    State(state): State<AppState>,
    IdPath(line_id): IdPath,
) -> ApiResult<Json<InvoiceLine>> {
    let db = identity.db(&state)?;
    Ok(Json(db.invoice_lines().delete_line(line_id).await?))
}
