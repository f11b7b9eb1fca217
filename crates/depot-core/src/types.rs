//! # Domain Types
//!
//! Core domain types used throughout Depot.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Invoice      │   │  InvoiceLine    │   │  ProductToOrder │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  invoice_type   │──►│  quantity       │◄──│  quantity       │       │
//! │  │  status         │   │  product_price  │   │  order_date     │       │
//! │  │  provider_id?   │   │  batch dates    │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Receipt      │   │  ReceiptLine    │   │     DbRole      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Draft          │──►│  quantity       │   │  Admin          │       │
//! │  │  Sale           │   │  price snapshot │   │  Seller         │       │
//! │  │  Return         │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Labels
//! Every enum parses its canonical snake_case name, the upper-case filter
//! code used by list endpoints, and the Ukrainian label that older clients
//! send. Serialization always uses the snake_case name.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::Money;
use crate::{ADMIN_ROLE, SELLER_ROLE};

// =============================================================================
// Database Role
// =============================================================================

/// The least-privilege database role a request runs under.
///
/// Closed on purpose: the connection router is keyed by this enum, so an
/// unrecognized role string can never select a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DbRole {
    #[serde(rename = "admin_role")]
    Admin,
    #[serde(rename = "seller_role")]
    Seller,
}

impl DbRole {
    /// Maps a stored role name to a role. Anything else is `None`.
    pub fn from_role_name(name: &str) -> Option<Self> {
        match name {
            ADMIN_ROLE => Some(DbRole::Admin),
            SELLER_ROLE => Some(DbRole::Seller),
            _ => None,
        }
    }

    /// The PostgreSQL role name.
    pub const fn role_name(&self) -> &'static str {
        match self {
            DbRole::Admin => ADMIN_ROLE,
            DbRole::Seller => SELLER_ROLE,
        }
    }
}

impl fmt::Display for DbRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.role_name())
    }
}

// =============================================================================
// Invoice Type
// =============================================================================

/// What an invoice does to stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "invoice_type", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum InvoiceType {
    /// Goods received from a supplier. Credits stock.
    Receiving,
    /// Goods written off (expired, damaged). Debits stock, no supplier.
    WriteOff,
    /// Goods sent back to a supplier. Debits stock.
    Return,
}

impl InvoiceType {
    pub const ALL: [InvoiceType; 3] = [
        InvoiceType::Receiving,
        InvoiceType::WriteOff,
        InvoiceType::Return,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            InvoiceType::Receiving => "receiving",
            InvoiceType::WriteOff => "write_off",
            InvoiceType::Return => "return",
        }
    }

    /// Display label used by existing clients.
    pub const fn label(&self) -> &'static str {
        match self {
            InvoiceType::Receiving => "Отримання",
            InvoiceType::WriteOff => "Списання",
            InvoiceType::Return => "Повернення",
        }
    }

    /// Whether an invoice of this type must name a supplier.
    pub const fn requires_provider(&self) -> bool {
        !matches!(self, InvoiceType::WriteOff)
    }

    /// Parses the upper-case filter codes accepted by list endpoints
    /// (`RECEIVING`, `RETURNING`, `WRITEOFF`).
    pub fn from_filter_code(code: &str) -> Result<Self, ValidationError> {
        match code {
            "RECEIVING" => Ok(InvoiceType::Receiving),
            "RETURNING" => Ok(InvoiceType::Return),
            "WRITEOFF" => Ok(InvoiceType::WriteOff),
            _ => Err(ValidationError::NotAllowed {
                field: "invoiceType".to_string(),
                allowed: vec![
                    "RECEIVING".to_string(),
                    "RETURNING".to_string(),
                    "WRITEOFF".to_string(),
                ],
            }),
        }
    }
}

impl FromStr for InvoiceType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        for ty in InvoiceType::ALL {
            if s.eq_ignore_ascii_case(ty.as_str()) || s == ty.label() {
                return Ok(ty);
            }
        }
        InvoiceType::from_filter_code(&s.to_ascii_uppercase()).map_err(|_| {
            ValidationError::NotAllowed {
                field: "invoice_type".to_string(),
                allowed: InvoiceType::ALL.iter().map(|t| t.as_str().to_string()).collect(),
            }
        })
    }
}

impl fmt::Display for InvoiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Invoice Status
// =============================================================================

/// Invoice status. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "invoice_status", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    InProgress,
    Completed,
}

impl InvoiceStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::InProgress => "in_progress",
            InvoiceStatus::Completed => "completed",
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            InvoiceStatus::InProgress => "Виконується",
            InvoiceStatus::Completed => "Завершено",
        }
    }
}

impl FromStr for InvoiceStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        for status in [InvoiceStatus::InProgress, InvoiceStatus::Completed] {
            if s.eq_ignore_ascii_case(status.as_str()) || s == status.label() {
                return Ok(status);
            }
        }
        Err(ValidationError::NotAllowed {
            field: "status".to_string(),
            allowed: vec!["in_progress".to_string(), "completed".to_string()],
        })
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Receipt Type
// =============================================================================

/// Receipt lifecycle stage.
///
/// ```text
///   Draft ──finalize──► Sale ──initiate_return──► (new) Return
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "receipt_type", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ReceiptType {
    #[default]
    Draft,
    Sale,
    Return,
}

impl ReceiptType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ReceiptType::Draft => "draft",
            ReceiptType::Sale => "sale",
            ReceiptType::Return => "return",
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            ReceiptType::Draft => "Чернетка",
            ReceiptType::Sale => "Продаж",
            ReceiptType::Return => "Повернення",
        }
    }
}

impl FromStr for ReceiptType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        for ty in [ReceiptType::Draft, ReceiptType::Sale, ReceiptType::Return] {
            if s.eq_ignore_ascii_case(ty.as_str()) || s == ty.label() {
                return Ok(ty);
            }
        }
        Err(ValidationError::NotAllowed {
            field: "receipt_type".to_string(),
            allowed: vec!["draft".to_string(), "sale".to_string(), "return".to_string()],
        })
    }
}

impl fmt::Display for ReceiptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Employee
// =============================================================================

/// A staff member. `db_role` is stored as text so an unknown value survives
/// into the identity and yields Forbidden instead of a decode failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Employee {
    pub employee_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub phone_number: Option<String>,
    /// Doubles as the employee's database login name.
    pub email: String,
    pub hire_date: NaiveDate,
    pub dismissal_date: Option<NaiveDate>,
    pub position_id: Option<i64>,
    pub position_name: Option<String>,
    pub db_role: String,
}

/// Input for the admin-only provisioning flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEmployee {
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub phone_number: Option<String>,
    pub email: String,
    /// Defaults to today.
    pub hire_date: Option<NaiveDate>,
    pub position_id: Option<i64>,
    pub role: DbRole,
}

/// Replacement values for an employee's personal data.
///
/// The email (login name) and role group are fixed at provisioning time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeUpdate {
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub phone_number: Option<String>,
    pub hire_date: NaiveDate,
    pub dismissal_date: Option<NaiveDate>,
    pub position_id: Option<i64>,
}

/// What login needs: never serialized.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Credentials {
    pub employee_id: i64,
    pub password_hash: String,
    pub db_role: String,
}

// =============================================================================
// Invoice
// =============================================================================

/// A supplier-facing document: receiving, write-off or return.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Invoice {
    pub invoice_id: i64,
    pub employee_id: i64,
    /// Required for receiving and return, always null for write-off.
    pub provider_id: Option<i64>,
    pub invoice_type: InvoiceType,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
    /// Null while in progress.
    pub completed_at: Option<DateTime<Utc>>,
}

/// One row of the invoice list (joined with provider and employee names).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InvoiceSummary {
    pub invoice_id: i64,
    pub invoice_type: InvoiceType,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub provider_id: Option<i64>,
    pub provider_name: Option<String>,
    pub employee_id: i64,
    pub employee_name: String,
}

// =============================================================================
// Invoice Line
// =============================================================================

/// A product batch on an invoice (`products_for_invoice`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InvoiceLine {
    pub id: i64,
    pub invoice_id: i64,
    pub product_id: i64,
    /// Immutable once written.
    pub quantity: i64,
    pub product_price: Money,
    pub date_of_manufacture: Option<NaiveDate>,
    pub use_by_date: Option<NaiveDate>,
}

/// An invoice line joined with its product and invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InvoiceLineDetail {
    pub id: i64,
    pub invoice_id: i64,
    pub invoice_type: InvoiceType,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub product_price: Money,
    pub date_of_manufacture: Option<NaiveDate>,
    pub use_by_date: Option<NaiveDate>,
}

/// Input for adding a line to an invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInvoiceLine {
    pub invoice_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub product_price: Money,
    pub date_of_manufacture: Option<NaiveDate>,
    pub use_by_date: Option<NaiveDate>,
}

/// The mutable part of an invoice line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLineUpdate {
    pub product_price: Money,
    pub date_of_manufacture: NaiveDate,
    pub use_by_date: NaiveDate,
}

// =============================================================================
// Receipt
// =============================================================================

/// A sales receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Receipt {
    pub receipt_id: i64,
    pub employee_id: i64,
    pub receipt_type: ReceiptType,
    pub created_at: DateTime<Utc>,
    /// For return receipts: the sale being returned.
    pub source_receipt_id: Option<i64>,
}

/// One row of `receipt_with_total`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ReceiptSummary {
    pub receipt_id: i64,
    pub employee_id: i64,
    pub last_name: String,
    pub receipt_type: ReceiptType,
    pub created_at: DateTime<Utc>,
    pub source_receipt_id: Option<i64>,
    pub line_count: i64,
    pub total: Money,
}

/// A product on a receipt (`products_for_receipt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ReceiptLine {
    pub id: i64,
    pub receipt_id: i64,
    pub product_id: i64,
    pub employee_id: i64,
    pub quantity: i64,
    /// Snapshot taken at insertion; never recomputed.
    pub price: Money,
}

impl ReceiptLine {
    #[inline]
    pub fn line_total(&self) -> Money {
        self.price.multiply_quantity(self.quantity)
    }
}

/// A receipt line joined with its receipt, cashier and product, as listed
/// by `/api/pfr`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ReceiptLineDetail {
    pub id: i64,
    pub receipt_id: i64,
    pub receipt_type: ReceiptType,
    pub created_at: DateTime<Utc>,
    pub product_id: i64,
    pub product_name: String,
    pub employee_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub quantity: i64,
    pub price: Money,
    /// `price × quantity` at the snapshot price.
    pub total: Money,
}

/// Input for adding a line to a draft receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReceiptLine {
    pub receipt_id: i64,
    pub employee_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    /// `None` snapshots the product's current stock price.
    pub price: Option<Money>,
}

// =============================================================================
// Reorder Queue & Stock
// =============================================================================

/// A standing request to reorder a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductToOrder {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub order_date: NaiveDate,
}

/// Current stock of a product, maintained by store triggers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockLevel {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    /// Price of the most recently received batch.
    pub price: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_role_mapping() {
        assert_eq!(DbRole::from_role_name("admin_role"), Some(DbRole::Admin));
        assert_eq!(DbRole::from_role_name("seller_role"), Some(DbRole::Seller));
        assert_eq!(DbRole::from_role_name("unknown"), None);
        assert_eq!(DbRole::from_role_name(""), None);
        assert_eq!(DbRole::from_role_name("ADMIN_ROLE"), None);
        assert_eq!(DbRole::Seller.to_string(), "seller_role");
    }

    #[test]
    fn test_invoice_type_parsing() {
        assert_eq!("receiving".parse::<InvoiceType>().unwrap(), InvoiceType::Receiving);
        assert_eq!("WRITEOFF".parse::<InvoiceType>().unwrap(), InvoiceType::WriteOff);
        assert_eq!("RETURNING".parse::<InvoiceType>().unwrap(), InvoiceType::Return);
        assert_eq!("Списання".parse::<InvoiceType>().unwrap(), InvoiceType::WriteOff);
        assert_eq!("Повернення".parse::<InvoiceType>().unwrap(), InvoiceType::Return);
        assert!("refund".parse::<InvoiceType>().is_err());
    }

    #[test]
    fn test_filter_codes_are_strict() {
        assert!(InvoiceType::from_filter_code("RECEIVING").is_ok());
        assert!(InvoiceType::from_filter_code("receiving").is_err());
        assert!(InvoiceType::from_filter_code("RETURN").is_err());
    }

    #[test]
    fn test_provider_requirement() {
        assert!(InvoiceType::Receiving.requires_provider());
        assert!(InvoiceType::Return.requires_provider());
        assert!(!InvoiceType::WriteOff.requires_provider());
    }

    #[test]
    fn test_invoice_status_parsing() {
        assert_eq!("completed".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::Completed);
        assert_eq!("Завершено".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::Completed);
        assert_eq!("Виконується".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::InProgress);
        assert!("done".parse::<InvoiceStatus>().is_err());
    }

    #[test]
    fn test_receipt_type_parsing() {
        assert_eq!("sale".parse::<ReceiptType>().unwrap(), ReceiptType::Sale);
        assert_eq!("RETURN".parse::<ReceiptType>().unwrap(), ReceiptType::Return);
        assert_eq!("Продаж".parse::<ReceiptType>().unwrap(), ReceiptType::Sale);
        assert!("refund".parse::<ReceiptType>().is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(InvoiceStatus::default(), InvoiceStatus::InProgress);
        assert_eq!(ReceiptType::default(), ReceiptType::Draft);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&InvoiceType::WriteOff).unwrap(), "\"write_off\"");
        assert_eq!(serde_json::to_string(&DbRole::Admin).unwrap(), "\"admin_role\"");
    }
}
