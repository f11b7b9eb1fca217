//! # Money Module
//!
//! Provides the `Money` type for prices on invoice lines and receipt lines.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (kopiykas / cents)                  │
//! │    Database column:  BIGINT  *_price_cents                              │
//! │    JSON field:       "12.50" out; 12.5, 12 or "12.50" in (major units)  │
//! │    Arithmetic:       i64 / i128, never f64                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use depot_core::money::Money;
//!
//! let price = Money::from_cents(1250); // 12.50
//! let line_total = price.multiply_quantity(4);
//! assert_eq!(line_total.cents(), 5000);
//! ```

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  InvoiceLine.product_price ──► product_stock.price (trigger)           │
/// │                                        │                                │
/// │                                        ▼ snapshot at insertion          │
/// │                              ReceiptLine.price ──► receipt_with_total   │
/// │                                                                         │
/// │  A receipt line price is never recomputed after it is written.          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ```rust
    /// use depot_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a line quantity.
    ///
    /// Saturates instead of wrapping; a line that large fails validation
    /// long before it reaches here.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Parses a decimal amount in major units ("12.5", "12.50", "12").
    ///
    /// At most two fractional digits are accepted. This is how prices arrive
    /// from clients and from the seed data.
    ///
    /// ```rust
    /// use depot_core::money::Money;
    ///
    /// assert_eq!(Money::parse_major("12.5").unwrap().cents(), 1250);
    /// assert!(Money::parse_major("1.234").is_err());
    /// ```
    pub fn parse_major(input: &str) -> Result<Self, ValidationError> {
        let input = input.trim();
        let invalid = |reason: &str| ValidationError::invalid("price", reason);

        let (negative, digits) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input),
        };
        let (whole, fraction) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("expected a decimal number"));
        }
        if fraction.len() > 2 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("at most two decimal places"));
        }

        let whole: i64 = whole.parse().map_err(|_| invalid("amount too large"))?;
        let mut minor: i64 = if fraction.is_empty() {
            0
        } else {
            fraction.parse().map_err(|_| invalid("bad fraction"))?
        };
        if fraction.len() == 1 {
            minor *= 10;
        }

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(|| invalid("amount too large"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

/// Written as a two-decimal string in major units.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a price in major units, as a number or a decimal string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        v.checked_mul(100)
            .map(Money)
            .ok_or_else(|| E::custom("price too large"))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        i64::try_from(v)
            .map_err(|_| E::custom("price too large"))
            .and_then(|v| self.visit_i64(v))
    }

    // `{}` on f64 prints the shortest text that reads back as the same
    // value, so 12.5 becomes "12.5" and 1.005 is rejected as three places.
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        if !v.is_finite() {
            return Err(E::custom("price must be finite"));
        }
        self.visit_str(&v.to_string())
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        Money::parse_major(v).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.to_string(), "10.99");
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
    }

    #[test]
    fn test_sum_of_line_totals() {
        let lines = [(Money::from_cents(299), 3), (Money::from_cents(1000), 2)];
        let total: Money = lines.iter().map(|(p, q)| p.multiply_quantity(*q)).sum();
        assert_eq!(total.cents(), 2897);
    }

    #[test]
    fn test_parse_major() {
        assert_eq!(Money::parse_major("12").unwrap().cents(), 1200);
        assert_eq!(Money::parse_major("12.5").unwrap().cents(), 1250);
        assert_eq!(Money::parse_major(" 0.07 ").unwrap().cents(), 7);
        assert_eq!(Money::parse_major("-3.10").unwrap().cents(), -310);
    }

    #[test]
    fn test_parse_major_rejects_garbage() {
        assert!(Money::parse_major("").is_err());
        assert!(Money::parse_major(".50").is_err());
        assert!(Money::parse_major("1.234").is_err());
        assert!(Money::parse_major("12,50").is_err());
        assert!(Money::parse_major("abc").is_err());
    }

    #[test]
    fn test_serializes_as_major_units() {
        assert_eq!(serde_json::to_string(&Money::from_cents(1250)).unwrap(), "\"12.50\"");
        assert_eq!(serde_json::to_string(&Money::from_cents(7)).unwrap(), "\"0.07\"");
    }

    #[test]
    fn test_deserializes_numbers_and_strings() {
        let read = |json: &str| serde_json::from_str::<Money>(json).map(|m| m.cents());
        assert_eq!(read("12.50").unwrap(), 1250);
        assert_eq!(read("12.5").unwrap(), 1250);
        assert_eq!(read("12").unwrap(), 1200);
        assert_eq!(read("\"12.50\"").unwrap(), 1250);
        assert_eq!(read("19.99").unwrap(), 1999);
        assert_eq!(read("\"38.9\"").unwrap(), 3890);
    }

    #[test]
    fn test_deserialize_rejects_sub_cent_and_garbage() {
        let read = |json: &str| serde_json::from_str::<Money>(json);
        assert!(read("1.005").is_err());
        assert!(read("\"12,50\"").is_err());
        assert!(read("true").is_err());
        assert!(read("null").is_err());
    }

    #[test]
    fn test_serialized_price_reads_back() {
        let price = Money::from_cents(3890);
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(serde_json::from_str::<Money>(&json).unwrap(), price);
    }
}
