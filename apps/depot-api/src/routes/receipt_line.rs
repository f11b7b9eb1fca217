//! Receipt line routes (`/api/pfr`).
//!
//! The list takes the `searchType`/`searchValue` pair (`receipt_id` or
//! `product_name`) plus optional `employeeId`, `receipt_type`, `dateFrom` and
//! `dateTo`. `receiptId=N` is shorthand for `searchType=receipt_id`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use depot_core::search::ReceiptLineFilter;
use depot_core::{Money, NewReceiptLine, ReceiptLine, ReceiptLineDetail};
use serde::Deserialize;

use crate::auth::Identity;
use crate::error::ApiResult;
use crate::extract::{IdPath, JsonBody, QueryParams};
use crate::wire::{lenient_i64, lenient_opt_i64, lenient_opt_money};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/pfr", get(list).post(create))
        .route("/api/pfr/{id}", delete(remove))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub receipt_id: Option<String>,
    pub search_type: Option<String>,
    pub search_value: Option<String>,
    pub employee_id: Option<String>,
    #[serde(rename = "receipt_type")]
    pub receipt_type: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

impl ListQuery {
    fn filter(&self) -> ApiResult<ReceiptLineFilter> {
        let (key, value) = match (&self.search_type, &self.receipt_id) {
            (None, Some(id)) => (Some("receipt_id"), Some(id.as_str())),
            _ => (self.search_type.as_deref(), self.search_value.as_deref()),
        };
        let filter = ReceiptLineFilter::parse(key, value)?
            .with_employee(self.employee_id.as_deref())?
            .with_receipt_type(self.receipt_type.as_deref())?
            .with_dates(self.date_from.as_deref(), self.date_to.as_deref())?;
        Ok(filter)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateLine {
    #[serde(deserialize_with = "lenient_i64")]
    pub receipt_id: i64,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub employee_id: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub product_id: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub quantity: i64,
    /// Omitted: the current stock price is snapshotted.
    #[serde(default, deserialize_with = "lenient_opt_money")]
    pub price: Option<Money>,
}

async fn list(
    identity: Identity,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<Json<Vec<ReceiptLineDetail>>> {
    let db = identity.db(&state)?;
    let filter = query.filter()?;
    Ok(Json(db.receipt_lines().list(&filter).await?))
}

async fn create(
    identity: Identity,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateLine>,
) -> ApiResult<(StatusCode, Json<ReceiptLine>)> {
    let db = identity.db(&state)?;
    let line = NewReceiptLine {
        receipt_id: req.receipt_id,
        employee_id: identity.acting_for(req.employee_id)?,
        product_id: req.product_id,
        quantity: req.quantity,
        price: req.price,
    };
    let inserted = db.receipt_lines().add_line(&line).await?;
    Ok((StatusCode::CREATED, Json(inserted)))
}

/// Removes a line from a draft; the stock it held is released.
async fn remove(
    identity: Identity,
    State(state): State<AppState>,
    IdPath(line_id): IdPath,
) -> ApiResult<Json<ReceiptLine>> {
    let db = identity.db(&state)?;
    Ok(Json(db.receipt_lines().delete_line(line_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_core::search::ReceiptLineSearch;
    use depot_core::ReceiptType;

    fn query(pairs: &str) -> ListQuery {
        serde_json::from_str(pairs).unwrap()
    }

    #[test]
    fn test_receipt_id_shorthand() {
        let filter = query(r#"{"receiptId": "12"}"#).filter().unwrap();
        assert_eq!(filter, ReceiptLineFilter::receipt(12));
    }

    #[test]
    fn test_search_pair_and_narrowing() {
        let filter = query(
            r#"{"searchType": "receipt_id", "searchValue": "12",
                "employeeId": "3", "receipt_type": "sale"}"#,
        )
        .filter()
        .unwrap();
        assert_eq!(filter.search, ReceiptLineSearch::ReceiptId(12));
        assert_eq!(filter.employee_id, Some(3));
        assert_eq!(filter.receipt_type, Some(ReceiptType::Sale));
    }

    #[test]
    fn test_no_parameters_lists_everything() {
        let filter = query("{}").filter().unwrap();
        assert_eq!(filter.search, ReceiptLineSearch::All);
    }
}
