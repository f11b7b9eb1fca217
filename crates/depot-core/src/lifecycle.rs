//! # Lifecycle Module
//!
//! Every invoice and receipt state transition is decided here. Repositories
//! load the current row under a lock, call one of these checks, and only
//! then write.
//!
//! ## Invoice
//! ```text
//! ┌──────────────┐   complete(completed_at ≥ created_at)   ┌─────────────┐
//! │  InProgress  │ ───────────────────────────────────────► │  Completed  │
//! └──────────────┘                                          └─────────────┘
//!   lines editable                                            terminal,
//!                                                             lines frozen
//! ```
//!
//! ## Receipt
//! ```text
//! ┌─────────┐  finalize (≥1 line)  ┌────────┐  initiate_return  ┌──────────┐
//! │  Draft  │ ───────────────────► │  Sale  │ ────────────────► │  Return  │
//! └─────────┘                      └────────┘   (new receipt)   └──────────┘
//!   lines editable                  unchanged by returns          not returnable
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Invoice, InvoiceStatus, InvoiceType, Receipt, ReceiptLine, ReceiptType};
use crate::validation::{validate_quantity, ValidationResult};

// =============================================================================
// Invoice Rules
// =============================================================================

/// Checks supplier presence against the invoice type.
///
/// Receiving and return invoices must name a supplier; a write-off must not.
pub fn check_invoice_provider(
    invoice_type: InvoiceType,
    provider_id: Option<i64>,
) -> ValidationResult<()> {
    match (invoice_type.requires_provider(), provider_id) {
        (true, None) => Err(ValidationError::required("provider_id")),
        (false, Some(_)) => Err(ValidationError::Forbidden {
            field: "provider_id".to_string(),
            reason: "write-off invoices have no supplier".to_string(),
        }),
        (true, Some(id)) => crate::validation::validate_id("provider_id", id),
        (false, None) => Ok(()),
    }
}

/// Decides whether `invoice` may be completed with the requested values.
///
/// The only legal transition is `InProgress → Completed`. Asking for
/// `InProgress`, or completing twice, is rejected.
pub fn check_invoice_completion(
    invoice: &Invoice,
    requested: InvoiceStatus,
    completed_at: DateTime<Utc>,
) -> CoreResult<()> {
    if requested != InvoiceStatus::Completed {
        return Err(ValidationError::NotAllowed {
            field: "status".to_string(),
            allowed: vec![InvoiceStatus::Completed.as_str().to_string()],
        }
        .into());
    }

    check_invoice_editable(invoice)?;

    if completed_at < invoice.created_at {
        return Err(ValidationError::DateOrder {
            earlier: "created_at".to_string(),
            later: "completed_at".to_string(),
        }
        .into());
    }

    Ok(())
}

/// Lines of a completed invoice are frozen.
pub fn check_invoice_editable(invoice: &Invoice) -> CoreResult<()> {
    if invoice.status != InvoiceStatus::InProgress {
        return Err(CoreError::InvalidInvoiceStatus {
            invoice_id: invoice.invoice_id,
            status: invoice.status.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Receipt Rules
// =============================================================================

fn expect_receipt_type(receipt: &Receipt, expected: ReceiptType) -> CoreResult<()> {
    if receipt.receipt_type != expected {
        return Err(CoreError::InvalidReceiptType {
            receipt_id: receipt.receipt_id,
            receipt_type: receipt.receipt_type.to_string(),
            expected: expected.to_string(),
        });
    }
    Ok(())
}

/// Lines can only be added to or removed from a draft.
pub fn check_receipt_editable(receipt: &Receipt) -> CoreResult<()> {
    expect_receipt_type(receipt, ReceiptType::Draft)
}

/// `Draft → Sale` requires at least one line.
pub fn check_finalize(receipt: &Receipt, line_count: i64) -> CoreResult<()> {
    expect_receipt_type(receipt, ReceiptType::Draft)?;
    if line_count == 0 {
        return Err(CoreError::EmptyReceipt(receipt.receipt_id));
    }
    Ok(())
}

/// Only sales can be returned.
pub fn check_returnable(receipt: &Receipt) -> CoreResult<()> {
    expect_receipt_type(receipt, ReceiptType::Sale)
}

// =============================================================================
// Return Planning
// =============================================================================

/// One requested line of a partial return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedLine {
    pub line_id: i64,
    pub quantity: i64,
}

/// Which part of a sale to return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnSelection {
    /// Every line at its sold quantity.
    All,
    /// Only the listed lines, each at the given quantity.
    Lines(Vec<SelectedLine>),
}

/// A compensating line to be written on the new return receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedReturnLine {
    pub source_line_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    /// Copied from the sale, never re-priced.
    pub price: Money,
}

/// Computes the lines of a return receipt.
///
/// The source receipt and its lines are read-only inputs; the sale is never
/// mutated by a return.
///
/// `returned` maps a sale line id to the quantity already taken back by
/// earlier returns of the same sale.
///
/// ## Rules
/// - The source must be a sale
/// - `All` copies every line that still has something left, at the
///   remaining quantity
/// - `Lines` must be non-empty, reference only lines of the source, list
///   each line once, and ask for `0 < q ≤ sold - returned`
pub fn plan_return(
    source: &Receipt,
    source_lines: &[ReceiptLine],
    returned: &HashMap<i64, i64>,
    selection: &ReturnSelection,
) -> CoreResult<Vec<PlannedReturnLine>> {
    check_returnable(source)?;

    let already = |line: &ReceiptLine| returned.get(&line.id).copied().unwrap_or(0);

    let copy = |line: &ReceiptLine, quantity: i64| PlannedReturnLine {
        source_line_id: line.id,
        product_id: line.product_id,
        quantity,
        price: line.price,
    };

    match selection {
        ReturnSelection::All => {
            if source_lines.is_empty() {
                return Err(CoreError::EmptyReceipt(source.receipt_id));
            }
            let planned: Vec<_> = source_lines
                .iter()
                .filter_map(|l| {
                    let left = l.quantity - already(l);
                    (left > 0).then(|| copy(l, left))
                })
                .collect();
            if planned.is_empty() {
                return Err(CoreError::NothingToReturn(source.receipt_id));
            }
            Ok(planned)
        }
        ReturnSelection::Lines(selected) => {
            if selected.is_empty() {
                return Err(ValidationError::required("selectedProducts").into());
            }

            let by_id: HashMap<i64, &ReceiptLine> =
                source_lines.iter().map(|l| (l.id, l)).collect();
            let mut seen = HashSet::with_capacity(selected.len());
            let mut planned = Vec::with_capacity(selected.len());

            for pick in selected {
                let line = by_id.get(&pick.line_id).ok_or(CoreError::UnknownReturnLine {
                    receipt_id: source.receipt_id,
                    line_id: pick.line_id,
                })?;
                if !seen.insert(pick.line_id) {
                    return Err(ValidationError::invalid(
                        "selectedProducts",
                        format!("line {} listed twice", pick.line_id),
                    )
                    .into());
                }
                validate_quantity(pick.quantity)?;
                let returned = already(line);
                if pick.quantity > line.quantity - returned {
                    return Err(CoreError::ReturnExceedsSold {
                        line_id: line.id,
                        sold: line.quantity,
                        returned,
                        requested: pick.quantity,
                    });
                }
                planned.push(copy(line, pick.quantity));
            }

            Ok(planned)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn invoice(status: InvoiceStatus) -> Invoice {
        Invoice {
            invoice_id: 1,
            employee_id: 1,
            provider_id: Some(5),
            invoice_type: InvoiceType::Receiving,
            status,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    fn receipt(receipt_type: ReceiptType) -> Receipt {
        Receipt {
            receipt_id: 10,
            employee_id: 2,
            receipt_type,
            created_at: Utc::now(),
            source_receipt_id: None,
        }
    }

    fn sold_lines() -> Vec<ReceiptLine> {
        vec![
            ReceiptLine {
                id: 100,
                receipt_id: 10,
                product_id: 7,
                employee_id: 2,
                quantity: 10,
                price: Money::from_cents(1250),
            },
            ReceiptLine {
                id: 101,
                receipt_id: 10,
                product_id: 8,
                employee_id: 2,
                quantity: 1,
                price: Money::from_cents(499),
            },
        ]
    }

    fn none() -> HashMap<i64, i64> {
        HashMap::new()
    }

    #[test]
    fn test_provider_rules() {
        assert!(check_invoice_provider(InvoiceType::Receiving, Some(1)).is_ok());
        assert!(check_invoice_provider(InvoiceType::Return, Some(1)).is_ok());
        assert!(check_invoice_provider(InvoiceType::WriteOff, None).is_ok());

        assert!(matches!(
            check_invoice_provider(InvoiceType::Receiving, None),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            check_invoice_provider(InvoiceType::WriteOff, Some(1)),
            Err(ValidationError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_complete_in_progress_invoice() {
        let inv = invoice(InvoiceStatus::InProgress);
        let later = inv.created_at + Duration::hours(1);
        assert!(check_invoice_completion(&inv, InvoiceStatus::Completed, later).is_ok());
        assert!(check_invoice_completion(&inv, InvoiceStatus::Completed, inv.created_at).is_ok());
    }

    #[test]
    fn test_completion_before_creation_rejected() {
        let inv = invoice(InvoiceStatus::InProgress);
        let earlier = inv.created_at - Duration::days(1);
        let err = check_invoice_completion(&inv, InvoiceStatus::Completed, earlier).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::DateOrder { .. })
        ));
    }

    #[test]
    fn test_completed_is_terminal() {
        let inv = invoice(InvoiceStatus::Completed);
        let later = inv.created_at + Duration::hours(1);
        assert!(matches!(
            check_invoice_completion(&inv, InvoiceStatus::Completed, later),
            Err(CoreError::InvalidInvoiceStatus { .. })
        ));

        let open = invoice(InvoiceStatus::InProgress);
        assert!(matches!(
            check_invoice_completion(&open, InvoiceStatus::InProgress, later),
            Err(CoreError::Validation(ValidationError::NotAllowed { .. }))
        ));
    }

    #[test]
    fn test_finalize_rules() {
        assert!(check_finalize(&receipt(ReceiptType::Draft), 2).is_ok());
        assert!(matches!(
            check_finalize(&receipt(ReceiptType::Draft), 0),
            Err(CoreError::EmptyReceipt(10))
        ));
        assert!(matches!(
            check_finalize(&receipt(ReceiptType::Sale), 2),
            Err(CoreError::InvalidReceiptType { .. })
        ));
    }

    #[test]
    fn test_only_sales_are_returnable() {
        assert!(check_returnable(&receipt(ReceiptType::Sale)).is_ok());
        assert!(check_returnable(&receipt(ReceiptType::Draft)).is_err());
        assert!(check_returnable(&receipt(ReceiptType::Return)).is_err());
    }

    #[test]
    fn test_full_return_copies_every_line() {
        let lines = sold_lines();
        let plan = plan_return(&receipt(ReceiptType::Sale), &lines, &none(), &ReturnSelection::All).unwrap();

        assert_eq!(plan.len(), lines.len());
        for (planned, sold) in plan.iter().zip(&lines) {
            assert_eq!(planned.product_id, sold.product_id);
            assert_eq!(planned.quantity, sold.quantity);
            assert_eq!(planned.price, sold.price);
        }
    }

    #[test]
    fn test_partial_return() {
        let selection = ReturnSelection::Lines(vec![SelectedLine {
            line_id: 100,
            quantity: 4,
        }]);
        let plan = plan_return(&receipt(ReceiptType::Sale), &sold_lines(), &none(), &selection).unwrap();

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].product_id, 7);
        assert_eq!(plan[0].quantity, 4);
        assert_eq!(plan[0].price, Money::from_cents(1250));
    }

    #[test]
    fn test_return_quantity_bounds() {
        let sale = receipt(ReceiptType::Sale);
        let lines = sold_lines();

        let too_many = ReturnSelection::Lines(vec![SelectedLine { line_id: 101, quantity: 2 }]);
        assert!(matches!(
            plan_return(&sale, &lines, &none(), &too_many),
            Err(CoreError::ReturnExceedsSold { sold: 1, returned: 0, requested: 2, .. })
        ));

        let zero = ReturnSelection::Lines(vec![SelectedLine { line_id: 101, quantity: 0 }]);
        assert!(matches!(
            plan_return(&sale, &lines, &none(), &zero),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_return_selection_must_match_sale() {
        let sale = receipt(ReceiptType::Sale);
        let lines = sold_lines();

        let empty = ReturnSelection::Lines(vec![]);
        assert!(matches!(
            plan_return(&sale, &lines, &none(), &empty),
            Err(CoreError::Validation(ValidationError::Required { .. }))
        ));

        let foreign = ReturnSelection::Lines(vec![SelectedLine { line_id: 999, quantity: 1 }]);
        assert!(matches!(
            plan_return(&sale, &lines, &none(), &foreign),
            Err(CoreError::UnknownReturnLine { line_id: 999, .. })
        ));

        let twice = ReturnSelection::Lines(vec![
            SelectedLine { line_id: 100, quantity: 1 },
            SelectedLine { line_id: 100, quantity: 1 },
        ]);
        assert!(plan_return(&sale, &lines, &none(), &twice).is_err());
    }

    #[test]
    fn test_earlier_returns_are_netted() {
        let sale = receipt(ReceiptType::Sale);
        let lines = sold_lines();
        let returned = HashMap::from([(100, 6)]);

        let plan = plan_return(&sale, &lines, &returned, &ReturnSelection::All).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!((plan[0].source_line_id, plan[0].quantity), (100, 4));
        assert_eq!((plan[1].source_line_id, plan[1].quantity), (101, 1));

        let too_many = ReturnSelection::Lines(vec![SelectedLine { line_id: 100, quantity: 5 }]);
        assert!(matches!(
            plan_return(&sale, &lines, &returned, &too_many),
            Err(CoreError::ReturnExceedsSold { sold: 10, returned: 6, requested: 5, .. })
        ));

        let rest = ReturnSelection::Lines(vec![SelectedLine { line_id: 100, quantity: 4 }]);
        assert!(plan_return(&sale, &lines, &returned, &rest).is_ok());
    }

    #[test]
    fn test_fully_returned_sale_has_nothing_left() {
        let returned = HashMap::from([(100, 10), (101, 1)]);
        assert!(matches!(
            plan_return(&receipt(ReceiptType::Sale), &sold_lines(), &returned, &ReturnSelection::All),
            Err(CoreError::NothingToReturn(10))
        ));
    }

    #[test]
    fn test_return_of_draft_rejected() {
        let draft = receipt(ReceiptType::Draft);
        assert!(matches!(
            plan_return(&draft, &sold_lines(), &none(), &ReturnSelection::All),
            Err(CoreError::InvalidReceiptType { .. })
        ));
    }
}
