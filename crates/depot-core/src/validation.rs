//! # Validation Module
//!
//! Input validation run before any database call.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: depot-api extractors                                          │
//! │  ├── JSON shape, lenient number parsing                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── ids, quantities, prices, date order                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: PostgreSQL                                                    │
//! │  ├── CHECK constraints (provider nullability, date order)              │
//! │  ├── stock triggers (insufficient quantity)                            │
//! │  └── role privileges (42501)                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{EmployeeUpdate, NewEmployee};
use crate::MAX_LINE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Identifiers
// =============================================================================

/// Validates a numeric identifier (must be positive).
pub fn validate_id(field: &str, id: i64) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Parses a numeric identifier from text (query strings, path segments).
///
/// ```rust
/// use depot_core::validation::parse_id;
///
/// assert_eq!(parse_id("invoice_id", " 42 ").unwrap(), 42);
/// assert!(parse_id("invoice_id", "4x2").is_err());
/// ```
pub fn parse_id(field: &str, raw: &str) -> ValidationResult<i64> {
    let id: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::invalid(field, "expected a whole number"))?;
    validate_id(field, id)?;
    Ok(id)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`MAX_LINE_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price. Zero is allowed (promotional goods).
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

// =============================================================================
// Dates
// =============================================================================

/// Parses a calendar date in `YYYY-MM-DD` form.
pub fn parse_date(field: &str, raw: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::invalid(field, "expected YYYY-MM-DD"))
}

/// Rejects a batch whose manufacture date is after its use-by date.
///
/// Either date may be absent, in which case there is nothing to compare.
pub fn validate_batch_dates(
    date_of_manufacture: Option<NaiveDate>,
    use_by_date: Option<NaiveDate>,
) -> ValidationResult<()> {
    if let (Some(made), Some(use_by)) = (date_of_manufacture, use_by_date) {
        if made > use_by {
            return Err(ValidationError::DateOrder {
                earlier: "date_of_manufacture".to_string(),
                later: "use_by_date".to_string(),
            });
        }
    }
    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a free-text search value.
///
/// ## Returns
/// The trimmed value.
pub fn validate_search_value(value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "searchValue".to_string(),
            max: 100,
        });
    }

    Ok(value.to_string())
}

/// Validates a personal name field.
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::required(field));
    }
    if name.chars().count() > 50 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 50,
        });
    }
    Ok(())
}

/// Validates an employee email. The email doubles as the database login
/// name, so it is kept to a conservative character set.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }
    // PostgreSQL truncates identifiers at 63 bytes
    if email.len() > 63 {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: 63,
        });
    }

    let valid_chars = email
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '_' | '-' | '+'));
    let shape = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
        .unwrap_or(false);

    if !valid_chars || !shape {
        return Err(ValidationError::invalid("email", "not a valid address"));
    }
    Ok(())
}

/// Validates a new password.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }
    if password.chars().count() < 8 {
        return Err(ValidationError::invalid("password", "at least 8 characters"));
    }
    Ok(())
}

/// Validates an optional phone number: digits with an optional leading `+`.
pub fn validate_phone(phone: Option<&str>) -> ValidationResult<()> {
    let Some(phone) = phone.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(());
    };
    if phone.len() > 13 {
        return Err(ValidationError::TooLong {
            field: "phone_number".to_string(),
            max: 13,
        });
    }
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::invalid("phone_number", "digits only"));
    }
    Ok(())
}

// =============================================================================
// Employees
// =============================================================================

fn validate_optional_name(field: &str, name: Option<&str>) -> ValidationResult<()> {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => validate_name(field, n),
        _ => Ok(()),
    }
}

/// Validates the provisioning input together with the initial password.
pub fn validate_new_employee(employee: &NewEmployee, password: &str) -> ValidationResult<()> {
    validate_name("first_name", &employee.first_name)?;
    validate_name("last_name", &employee.last_name)?;
    validate_optional_name("middle_name", employee.middle_name.as_deref())?;
    validate_phone(employee.phone_number.as_deref())?;
    validate_email(&employee.email)?;
    validate_password(password)?;
    if let Some(position_id) = employee.position_id {
        validate_id("position_id", position_id)?;
    }
    Ok(())
}

/// Validates replacement personal data.
pub fn validate_employee_update(update: &EmployeeUpdate) -> ValidationResult<()> {
    validate_name("first_name", &update.first_name)?;
    validate_name("last_name", &update.last_name)?;
    validate_optional_name("middle_name", update.middle_name.as_deref())?;
    validate_phone(update.phone_number.as_deref())?;
    if let Some(position_id) = update.position_id {
        validate_id("position_id", position_id)?;
    }
    if let Some(dismissed) = update.dismissal_date {
        if dismissed < update.hire_date {
            return Err(ValidationError::DateOrder {
                earlier: "hire_date".to_string(),
                later: "dismissal_date".to_string(),
            });
        }
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("id", "7").unwrap(), 7);
        assert!(parse_id("id", "").is_err());
        assert!(parse_id("id", "-3").is_err());
        assert!(parse_id("id", "0").is_err());
        assert!(parse_id("id", "abc").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(matches!(
            validate_quantity(0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            validate_quantity(MAX_LINE_QUANTITY + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price("price", Money::from_cents(1250)).is_ok());
        assert!(validate_price("price", Money::zero()).is_ok());
        assert!(validate_price("price", Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_batch_dates() {
        let jan = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let feb = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();

        assert!(validate_batch_dates(Some(jan), Some(feb)).is_ok());
        assert!(validate_batch_dates(Some(jan), Some(jan)).is_ok());
        assert!(validate_batch_dates(None, Some(jan)).is_ok());
        assert!(matches!(
            validate_batch_dates(Some(feb), Some(jan)),
            Err(ValidationError::DateOrder { .. })
        ));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("d", "2026-03-14").unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
        );
        assert!(parse_date("d", "14.03.2026").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("seller@shop.ua").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("x\"; DROP ROLE admin_role; --@a.b").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("correct horse").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone(None).is_ok());
        assert!(validate_phone(Some("")).is_ok());
        assert!(validate_phone(Some("+380501234567")).is_ok());
        assert!(validate_phone(Some("050-123")).is_err());
        assert!(validate_phone(Some("+")).is_err());
        assert!(validate_phone(Some("+3805012345678")).is_err());
    }

    #[test]
    fn test_employee_update_dates() {
        let update = EmployeeUpdate {
            first_name: "Olena".to_string(),
            last_name: "Kovalenko".to_string(),
            middle_name: None,
            phone_number: None,
            hire_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            dismissal_date: NaiveDate::from_ymd_opt(2026, 2, 1),
            position_id: None,
        };
        assert!(matches!(
            validate_employee_update(&update),
            Err(ValidationError::DateOrder { .. })
        ));
    }

    #[test]
    fn test_new_employee() {
        let employee = NewEmployee {
            first_name: "Taras".to_string(),
            last_name: "Bondar".to_string(),
            middle_name: Some("".to_string()),
            phone_number: Some("+380671112233".to_string()),
            email: "taras@shop.ua".to_string(),
            hire_date: None,
            position_id: Some(2),
            role: crate::types::DbRole::Seller,
        };
        assert!(validate_new_employee(&employee, "long enough").is_ok());
        assert!(validate_new_employee(&employee, "short").is_err());
    }
}
