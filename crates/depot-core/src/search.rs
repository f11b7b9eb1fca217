//! # Search Filters
//!
//! List endpoints take a `(searchType, searchValue)` pair. This module turns
//! that pair into a typed filter, so repositories never build SQL from raw
//! client strings and malformed input is rejected before the database is
//! touched.
//!
//! An absent or blank key/value pair means "no filter".

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::types::{InvoiceType, ReceiptType};
use crate::validation::{parse_date, parse_id, validate_search_value, ValidationResult};

fn not_allowed(field: &str, allowed: &[&str]) -> ValidationError {
    ValidationError::NotAllowed {
        field: field.to_string(),
        allowed: allowed.iter().map(|s| s.to_string()).collect(),
    }
}

/// Returns `None` when either half of the pair is missing or blank.
fn pair<'a>(key: Option<&'a str>, value: Option<&'a str>) -> Option<(&'a str, &'a str)> {
    match (key.map(str::trim), value.map(str::trim)) {
        (Some(k), Some(v)) if !k.is_empty() && !v.is_empty() => Some((k, v)),
        _ => None,
    }
}

// =============================================================================
// Invoices
// =============================================================================

/// Filter for the invoice list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoiceFilter {
    All,
    /// Exact id.
    Id(i64),
    /// Case-insensitive substring of the supplier name.
    ProviderName(String),
    /// Case-insensitive substring of "first last".
    EmployeeName(String),
    /// Substring of the creation date rendered as `YYYY-MM-DD`.
    CreatedAt(String),
    /// Case-insensitive substring of the invoice type name or label.
    InvoiceType(String),
}

impl InvoiceFilter {
    pub const KEYS: [&'static str; 5] = [
        "invoice_id",
        "provider_name",
        "employee_name",
        "created_at",
        "invoice_type",
    ];

    /// Parses the `type` / `search` query pair.
    pub fn parse(key: Option<&str>, value: Option<&str>) -> ValidationResult<Self> {
        let Some((key, value)) = pair(key, value) else {
            return Ok(InvoiceFilter::All);
        };
        let value = validate_search_value(value)?;

        Ok(match key {
            "invoice_id" => InvoiceFilter::Id(parse_id("invoice_id", &value)?),
            "provider_name" => InvoiceFilter::ProviderName(value),
            "employee_name" => InvoiceFilter::EmployeeName(value),
            "created_at" => InvoiceFilter::CreatedAt(value),
            "invoice_type" => InvoiceFilter::InvoiceType(value),
            _ => return Err(not_allowed("type", &Self::KEYS)),
        })
    }
}

// =============================================================================
// Invoice Lines
// =============================================================================

/// Search part of the invoice-line filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineSearch {
    All,
    InvoiceId(i64),
    ProductName(String),
    DateOfManufacture(NaiveDate),
    UseByDate(NaiveDate),
}

/// Filter for the invoice-line list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceLineFilter {
    pub invoice_type: Option<InvoiceType>,
    pub search: LineSearch,
}

impl InvoiceLineFilter {
    pub const KEYS: [&'static str; 4] = [
        "invoice_id",
        "product_name",
        "date_of_manufacture",
        "use_by_date",
    ];

    /// Parses `invoiceType`, `searchType` and `searchValue`.
    pub fn parse(
        invoice_type: Option<&str>,
        key: Option<&str>,
        value: Option<&str>,
    ) -> ValidationResult<Self> {
        let invoice_type = match invoice_type.map(str::trim) {
            Some(code) if !code.is_empty() => Some(InvoiceType::from_filter_code(code)?),
            _ => None,
        };

        let search = match pair(key, value) {
            None => LineSearch::All,
            Some((key, value)) => {
                let value = validate_search_value(value)?;
                match key {
                    "invoice_id" => LineSearch::InvoiceId(parse_id("invoice_id", &value)?),
                    "product_name" => LineSearch::ProductName(value),
                    "date_of_manufacture" => LineSearch::DateOfManufacture(parse_date(
                        "date_of_manufacture",
                        &value,
                    )?),
                    "use_by_date" => LineSearch::UseByDate(parse_date("use_by_date", &value)?),
                    _ => return Err(not_allowed("searchType", &Self::KEYS)),
                }
            }
        };

        Ok(InvoiceLineFilter {
            invoice_type,
            search,
        })
    }
}

// =============================================================================
// Receipts
// =============================================================================

/// Filter for the receipt list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptFilter {
    All,
    Id(i64),
    /// Case-insensitive substring of the cashier's last name.
    LastName(String),
    /// Receipts created on this calendar day.
    CreatedOn(NaiveDate),
}

impl ReceiptFilter {
    pub const KEYS: [&'static str; 3] = ["receipt_id", "last_name", "receipt_create_date"];

    pub fn parse(key: Option<&str>, value: Option<&str>) -> ValidationResult<Self> {
        let Some((key, value)) = pair(key, value) else {
            return Ok(ReceiptFilter::All);
        };
        let value = validate_search_value(value)?;

        Ok(match key {
            "receipt_id" => ReceiptFilter::Id(parse_id("receipt_id", &value)?),
            "last_name" => ReceiptFilter::LastName(value),
            "receipt_create_date" => {
                ReceiptFilter::CreatedOn(parse_date("receipt_create_date", &value)?)
            }
            _ => return Err(not_allowed("searchType", &Self::KEYS)),
        })
    }
}

// =============================================================================
// Receipt Lines
// =============================================================================

/// Search part of the receipt-line filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptLineSearch {
    All,
    ReceiptId(i64),
    ProductName(String),
}

/// Filter for the receipt-line list. Every present part narrows the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptLineFilter {
    pub search: ReceiptLineSearch,
    pub employee_id: Option<i64>,
    pub receipt_type: Option<ReceiptType>,
    /// Inclusive calendar-day bounds on the receipt's creation date.
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|v| !v.is_empty())
}

impl ReceiptLineFilter {
    pub const KEYS: [&'static str; 2] = ["receipt_id", "product_name"];

    /// Lines of exactly one receipt.
    pub fn receipt(receipt_id: i64) -> Self {
        ReceiptLineFilter {
            search: ReceiptLineSearch::ReceiptId(receipt_id),
            employee_id: None,
            receipt_type: None,
            date_from: None,
            date_to: None,
        }
    }

    /// Parses the `searchType` / `searchValue` pair.
    pub fn parse(key: Option<&str>, value: Option<&str>) -> ValidationResult<Self> {
        let search = match pair(key, value) {
            None => ReceiptLineSearch::All,
            Some((key, value)) => {
                let value = validate_search_value(value)?;
                match key {
                    "receipt_id" => ReceiptLineSearch::ReceiptId(parse_id("receipt_id", &value)?),
                    "product_name" => ReceiptLineSearch::ProductName(value),
                    _ => return Err(not_allowed("searchType", &Self::KEYS)),
                }
            }
        };

        Ok(ReceiptLineFilter {
            search,
            employee_id: None,
            receipt_type: None,
            date_from: None,
            date_to: None,
        })
    }

    pub fn with_employee(mut self, raw: Option<&str>) -> ValidationResult<Self> {
        if let Some(raw) = non_blank(raw) {
            self.employee_id = Some(parse_id("employeeId", raw)?);
        }
        Ok(self)
    }

    pub fn with_receipt_type(mut self, raw: Option<&str>) -> ValidationResult<Self> {
        if let Some(raw) = non_blank(raw) {
            self.receipt_type = Some(raw.parse()?);
        }
        Ok(self)
    }

    pub fn with_dates(mut self, from: Option<&str>, to: Option<&str>) -> ValidationResult<Self> {
        let from = non_blank(from).map(|d| parse_date("dateFrom", d)).transpose()?;
        let to = non_blank(to).map(|d| parse_date("dateTo", d)).transpose()?;
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(ValidationError::DateOrder {
                    earlier: "dateFrom".to_string(),
                    later: "dateTo".to_string(),
                });
            }
        }
        self.date_from = from;
        self.date_to = to;
        Ok(self)
    }
}

// =============================================================================
// Employees
// =============================================================================

/// Field searched by the employee list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmployeeField {
    LastName,
    FirstName,
    PhoneNumber,
    Email,
    PositionName,
}

impl EmployeeField {
    /// Fully-qualified column in the employee list query.
    pub const fn column(&self) -> &'static str {
        match self {
            EmployeeField::LastName => "e.last_name",
            EmployeeField::FirstName => "e.first_name",
            EmployeeField::PhoneNumber => "e.phone_number",
            EmployeeField::Email => "e.email",
            EmployeeField::PositionName => "p.position_name",
        }
    }
}

/// Filter for the employee list. Matching is a case-insensitive substring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmployeeFilter {
    All,
    Field(EmployeeField, String),
}

impl EmployeeFilter {
    pub const KEYS: [&'static str; 5] = [
        "last_name",
        "first_name",
        "phone_number",
        "email",
        "position_name",
    ];

    pub fn parse(key: Option<&str>, value: Option<&str>) -> ValidationResult<Self> {
        let Some((key, value)) = pair(key, value) else {
            return Ok(EmployeeFilter::All);
        };
        let value = validate_search_value(value)?;

        let field = match key {
            "last_name" => EmployeeField::LastName,
            "first_name" => EmployeeField::FirstName,
            "phone_number" => EmployeeField::PhoneNumber,
            "email" => EmployeeField::Email,
            "position_name" => EmployeeField::PositionName,
            _ => return Err(not_allowed("type", &Self::KEYS)),
        };
        Ok(EmployeeFilter::Field(field, value))
    }
}

/// Escapes `%`, `_` and `\` so a user value matches literally inside LIKE.
///
/// ```rust
/// use depot_core::search::like_pattern;
///
/// assert_eq!(like_pattern("50%"), "%50\\%%");
/// ```
pub fn like_pattern(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

// =============================================================================
// Unit Tests
// =============================================================================
