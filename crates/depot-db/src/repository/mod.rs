//! # Repository Module
//!
//! Database repository implementations for Depot.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  HTTP handler                                                           │
//! │       │  router.handle(role)?.invoices().complete(id, status, at)      │
//! │       ▼                                                                 │
//! │  InvoiceRepository                                                     │
//! │  ├── BEGIN                                                             │
//! │  ├── SELECT ... FOR UPDATE        (current state)                     │
//! │  ├── depot_core::lifecycle check  (pure decision)                     │
//! │  ├── UPDATE / INSERT              (triggers adjust stock)             │
//! │  └── COMMIT                                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PostgreSQL (as the pool's role)                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`InvoiceRepository`](invoice::InvoiceRepository) - Invoice lifecycle
//! - [`InvoiceLineRepository`](invoice_line::InvoiceLineRepository) - Invoice lines
//! - [`ReceiptRepository`](receipt::ReceiptRepository) - Drafts, sales, returns
//! - [`ReceiptLineRepository`](receipt_line::ReceiptLineRepository) - Receipt lines
//! - [`OrderRepository`](order::OrderRepository) - Reorder queue and conversion
//! - [`StockRepository`](stock::StockRepository) - Trigger-maintained stock
//! - [`EmployeeRepository`](employee::EmployeeRepository) - Credentials, provisioning

pub mod employee;
pub mod invoice;
pub mod invoice_line;
pub mod order;
pub mod receipt;
pub mod receipt_line;
pub mod stock;
