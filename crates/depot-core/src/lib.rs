//! # depot-core: Pure Domain Logic for Depot
//!
//! Everything Depot knows about invoices, receipts and money, expressed as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Depot Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    depot-api (axum)                             │   │
//! │  │   identity ──► role ──► handler ──► repository call            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ depot-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ lifecycle │  │  search   │  │ validation│  │   │
//! │  │   │  Invoice  │  │ complete  │  │  filters  │  │   rules   │  │   │
//! │  │   │  Receipt  │  │ finalize  │  │  parsing  │  │  checks   │  │   │
//! │  │   │  DbRole   │  │ returns   │  │           │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    depot-db (Database Layer)                    │   │
//! │  │        role pools, repositories, migrations, stock triggers     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Invoice, Receipt, lines, DbRole)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`lifecycle`] - Invoice and receipt state transitions, return planning
//! - [`search`] - List filter parsing for invoices, lines and receipts
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use depot_core::lifecycle::check_invoice_provider;
//! use depot_core::InvoiceType;
//!
//! // A write-off never names a supplier.
//! assert!(check_invoice_provider(InvoiceType::WriteOff, None).is_ok());
//! assert!(check_invoice_provider(InvoiceType::WriteOff, Some(3)).is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod lifecycle;
pub mod money;
pub mod search;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Largest quantity accepted on a single invoice or receipt line.
///
/// Guards against typing 10000 instead of 100 at the counter.
pub const MAX_LINE_QUANTITY: i64 = 99_999;

/// Database role name granted to administrators.
pub const ADMIN_ROLE: &str = "admin_role";

/// Database role name granted to sellers.
pub const SELLER_ROLE: &str = "seller_role";
