//! Reorder queue routes (`/api/productsOrder`).

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use depot_core::ProductToOrder;
use serde::Deserialize;

use super::Message;
use crate::auth::Identity;
use crate::error::ApiResult;
use crate::extract::{IdPath, JsonBody, QueryParams};
use crate::wire::lenient_i64;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/productsOrder", get(list).post(create))
        .route("/api/productsOrder/{id}", delete(remove))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrder {
    #[serde(deserialize_with = "lenient_i64")]
    pub product_id: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub quantity: i64,
}

async fn list(
    identity: Identity,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<Json<Vec<ProductToOrder>>> {
    let db = identity.db(&state)?;
    Ok(Json(db.orders().list(query.search.as_deref()).await?))
}

async fn create(
    identity: Identity,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateOrder>,
) -> ApiResult<(StatusCode, Json<ProductToOrder>)> {
    let db = identity.db(&state)?;
    let order = db.orders().create(req.product_id, req.quantity).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn remove(
    identity: Identity,
    State(state): State<AppState>,
    IdPath(order_id): IdPath,
) -> ApiResult<Json<Message>> {
    let db = identity.db(&state)?;
    db.orders().delete(order_id).await?;
    Ok(Json(Message::new(format!("Reorder request {} removed", order_id))))
}
