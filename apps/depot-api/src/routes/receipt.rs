//! Receipt routes: list, draft, finalize, return.
//!
//! ```text
//! POST /api/receipt        returnAll / selectedProducts → return receipt
//!                          otherwise                   → get-or-create draft
//! POST /api/receipt/draft  get-or-create draft
//! PUT  /api/receipt/sales  draft → sale
//! ```

use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use depot_core::lifecycle::{ReturnSelection, SelectedLine};
use depot_core::search::ReceiptFilter;
use depot_core::validation::parse_id;
use depot_core::{Receipt, ReceiptLine, ReceiptSummary, ValidationError};
use serde::{Deserialize, Serialize};

use crate::auth::Identity;
use crate::error::ApiResult;
use crate::extract::{IdPath, JsonBody, QueryParams};
use crate::wire::{lenient_i64, lenient_opt_i64};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/receipt", get(list).post(open_or_return))
        .route("/api/receipt/draft", post(draft))
        .route("/api/receipt/sales", put(finalize))
        .route("/api/receipt/{id}", get(show))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub search_type: Option<String>,
    pub search_value: Option<String>,
}

/// Per-line choice of a partial return, keyed by line id.
#[derive(Debug, Deserialize)]
pub struct SelectedProduct {
    #[serde(default, alias = "isChecked")]
    pub checked: bool,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub quantity: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRequest {
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub employee_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub receipt_id: Option<i64>,
    #[serde(default)]
    pub return_all: bool,
    #[serde(default)]
    pub selected_products: BTreeMap<String, SelectedProduct>,
}

impl ReceiptRequest {
    fn wants_return(&self) -> bool {
        self.return_all || !self.selected_products.is_empty()
    }

    /// Turns the request into a return selection. Unchecked entries are
    /// dropped; if nothing is left the selection is empty and the return is
    /// rejected downstream.
    fn selection(&self) -> Result<ReturnSelection, ValidationError> {
        if self.return_all {
            return Ok(ReturnSelection::All);
        }

        let mut lines = Vec::with_capacity(self.selected_products.len());
        for (line_id, choice) in &self.selected_products {
            if !choice.checked {
                continue;
            }
            let line_id = parse_id("selectedProducts", line_id)?;
            let quantity = choice
                .quantity
                .ok_or_else(|| ValidationError::required("quantity"))?;
            lines.push(SelectedLine { line_id, quantity });
        }
        Ok(ReturnSelection::Lines(lines))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeRequest {
    #[serde(deserialize_with = "lenient_i64")]
    pub receipt_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptOutcome {
    pub receipt_id: i64,
    pub message: &'static str,
    pub receipt: Receipt,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<ReceiptLine>,
}

#[derive(Debug, Serialize)]
pub struct ReceiptWithLines {
    pub receipt: Receipt,
    pub lines: Vec<ReceiptLine>,
}

async fn list(
    identity: Identity,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<Json<Vec<ReceiptSummary>>> {
    let db = identity.db(&state)?;
    let filter = ReceiptFilter::parse(query.search_type.as_deref(), query.search_value.as_deref())?;
    Ok(Json(db.receipts().list(&filter).await?))
}

async fn show(
    identity: Identity,
    State(state): State<AppState>,
    IdPath(receipt_id): IdPath,
) -> ApiResult<Json<ReceiptWithLines>> {
    let db = identity.db(&state)?;
    let receipt = db.receipts().get(receipt_id).await?;
    let lines = db.receipt_lines().list_for_receipt(receipt_id).await?;
    Ok(Json(ReceiptWithLines { receipt, lines }))
}

async fn open_or_return(
    identity: Identity,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ReceiptRequest>,
) -> ApiResult<(StatusCode, Json<ReceiptOutcome>)> {
    let db = identity.db(&state)?;
    let employee_id = identity.acting_for(req.employee_id)?;

    if !req.wants_return() {
        let receipt = db.receipts().get_or_create_draft(employee_id).await?;
        return Ok((StatusCode::OK, Json(draft_outcome(receipt))));
    }

    let source_id = req
        .receipt_id
        .ok_or_else(|| ValidationError::required("receiptId"))?;
    let selection = req.selection()?;

    let (receipt, lines) = db
        .receipts()
        .initiate_return(source_id, employee_id, &selection)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReceiptOutcome {
            receipt_id: receipt.receipt_id,
            message: "Return created",
            receipt,
            lines,
        }),
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRequest {
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub employee_id: Option<i64>,
}

async fn draft(
    identity: Identity,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<DraftRequest>,
) -> ApiResult<Json<ReceiptOutcome>> {
    let db = identity.db(&state)?;
    let employee_id = identity.acting_for(req.employee_id)?;
    let receipt = db.receipts().get_or_create_draft(employee_id).await?;
    Ok(Json(draft_outcome(receipt)))
}

async fn finalize(
    identity: Identity,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<FinalizeRequest>,
) -> ApiResult<Json<ReceiptOutcome>> {
    let db = identity.db(&state)?;
    let receipt = db.receipts().finalize(req.receipt_id).await?;
    Ok(Json(ReceiptOutcome {
        receipt_id: receipt.receipt_id,
        message: "Sale completed",
        receipt,
        lines: Vec::new(),
    }))
}

fn draft_outcome(receipt: Receipt) -> ReceiptOutcome {
    ReceiptOutcome {
        receipt_id: receipt.receipt_id,
        message: "Draft ready",
        receipt,
        lines: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> ReceiptRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_plain_request_is_a_draft() {
        assert!(!request(r#"{"employeeId": 5}"#).wants_return());
        assert!(!request(r#"{"employeeId": 5, "returnAll": false}"#).wants_return());
    }

    #[test]
    fn test_return_all() {
        let req = request(r#"{"receiptId": 9, "returnAll": true}"#);
        assert!(req.wants_return());
        assert_eq!(req.selection().unwrap(), ReturnSelection::All);
    }

    #[test]
    fn test_selected_products_keep_checked_only() {
        let req = request(
            r#"{"receiptId": "9", "selectedProducts": {
                "11": {"isChecked": true, "quantity": "4"},
                "12": {"isChecked": false, "quantity": 1}
            }}"#,
        );
        assert!(req.wants_return());
        assert_eq!(
            req.selection().unwrap(),
            ReturnSelection::Lines(vec![SelectedLine { line_id: 11, quantity: 4 }])
        );
    }

    #[test]
    fn test_nothing_checked_is_an_empty_selection() {
        let req = request(r#"{"receiptId": 9, "selectedProducts": {"11": {"checked": false}}}"#);
        assert!(req.wants_return());
        assert_eq!(req.selection().unwrap(), ReturnSelection::Lines(vec![]));
    }

    #[test]
    fn test_bad_line_key_rejected() {
        let req = request(r#"{"receiptId": 9, "selectedProducts": {"x": {"checked": true, "quantity": 1}}}"#);
        assert!(req.selection().is_err());

        let req = request(r#"{"receiptId": 9, "selectedProducts": {"3": {"checked": true}}}"#);
        assert!(req.selection().is_err());
    }
}
