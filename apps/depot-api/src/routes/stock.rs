//! Stock lookups. Read-only; stock moves only through invoice and receipt
//! lines.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use depot_core::StockLevel;

use crate::auth::Identity;
use crate::error::ApiResult;
use crate::extract::IdPath;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/stock", get(list))
        .route("/api/stock/{id}", get(show))
}

async fn list(identity: Identity, State(state): State<AppState>) -> ApiResult<Json<Vec<StockLevel>>> {
    let db = identity.db(&state)?;
    Ok(Json(db.stock().list_in_stock().await?))
}

async fn show(
    identity: Identity,
    State(state): State<AppState>,
    IdPath(product_id): IdPath,
) -> ApiResult<Json<StockLevel>> {
    let db = identity.db(&state)?;
    Ok(Json(db.stock().get(product_id).await?))
}
