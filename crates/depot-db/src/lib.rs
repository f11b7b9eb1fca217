//! # depot-db: Database Layer for Depot
//!
//! PostgreSQL access for Depot. Authorization is enforced by the database:
//! every request runs on a pool that is logged in as a least-privilege role,
//! and the store rejects what that role may not do.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Depot Data Flow                                │
//! │                                                                         │
//! │  HTTP handler (Identity { employee_id, db_role })                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     depot-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ConnectionRouter│   │  Repositories │    │  Migrations  │  │   │
//! │  │   │  (router.rs)  │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ InvoiceRepo   │    │ schema       │  │   │
//! │  │   │ admin_role  ──┼───►│ ReceiptRepo   │    │ triggers     │  │   │
//! │  │   │ seller_role ──┼───►│ OrderRepo ... │    │ role grants  │  │   │
//! │  │   │ provisioning  │    │               │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PostgreSQL: stock triggers, CHECK constraints, GRANTs                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - `Database` handle and pool configuration
//! - [`router`] - Role-scoped connection router
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types and SQLSTATE classification
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use depot_db::{ConnectionRouter, DbConfig};
//! use depot_core::DbRole;
//!
//! let router = ConnectionRouter::connect(admin, seller, provisioning).await?;
//! let db = router.handle(Some(DbRole::Seller)).ok_or(Forbidden)?;
//! let draft = db.receipts().get_or_create_draft(employee_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod router;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use router::{ConnectionRouter, PoolHealth};

pub use repository::employee::{hash_password, verify_password, EmployeeRepository};
pub use repository::invoice::InvoiceRepository;
pub use repository::invoice_line::InvoiceLineRepository;
pub use repository::order::OrderRepository;
pub use repository::receipt::ReceiptRepository;
pub use repository::receipt_line::ReceiptLineRepository;
pub use repository::stock::StockRepository;
