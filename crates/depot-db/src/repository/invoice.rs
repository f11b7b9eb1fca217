//! # Invoice Repository
//!
//! ## Invoice Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. CREATE                                                              │
//! │     └── create() → Invoice { status: InProgress, completed_at: null }  │
//! │                                                                         │
//! │  2. ADD / EDIT LINES  (InvoiceLineRepository, OrderRepository)          │
//! │                                                                         │
//! │  3. COMPLETE                                                            │
//! │     └── complete() → Invoice { status: Completed, completed_at }        │
//! │         lines frozen from here on                                      │
//! │                                                                         │
//! │  (OPTIONAL) DELETE while in progress                                    │
//! │     └── delete() → lines removed first, stock reversed by trigger      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use depot_core::lifecycle::{check_invoice_completion, check_invoice_editable, check_invoice_provider};
use depot_core::search::{like_pattern, InvoiceFilter};
use depot_core::validation::validate_id;
use depot_core::{Invoice, InvoiceStatus, InvoiceSummary, InvoiceType};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

const INVOICE_COLUMNS: &str =
    "invoice_id, employee_id, provider_id, invoice_type, status, created_at, completed_at";

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        InvoiceRepository { pool }
    }

    /// Gets an invoice by ID.
    pub async fn get(&self, invoice_id: i64) -> DbResult<Invoice> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoice WHERE invoice_id = $1");
        sqlx::query_as::<_, Invoice>(&sql)
            .bind(invoice_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", invoice_id))
    }

    /// Creates an in-progress invoice.
    ///
    /// Receiving and return invoices require `provider_id`; a write-off
    /// rejects one.
    pub async fn create(
        &self,
        employee_id: i64,
        invoice_type: InvoiceType,
        provider_id: Option<i64>,
    ) -> DbResult<Invoice> {
        validate_id("employee_id", employee_id)?;
        check_invoice_provider(invoice_type, provider_id)?;

        debug!(employee_id, %invoice_type, ?provider_id, "Creating invoice");

        let sql = format!(
            "INSERT INTO invoice (employee_id, provider_id, invoice_type, status) \
             VALUES ($1, $2, $3, $4) RETURNING {INVOICE_COLUMNS}"
        );
        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(employee_id)
            .bind(provider_id)
            .bind(invoice_type)
            .bind(InvoiceStatus::InProgress)
            .fetch_one(&self.pool)
            .await?;

        info!(invoice_id = invoice.invoice_id, %invoice_type, "Invoice created");
        Ok(invoice)
    }

    /// Moves an invoice from `InProgress` to `Completed`.
    ///
    /// The row is locked for the duration of the check so two concurrent
    /// completions cannot both succeed.
    pub async fn complete(
        &self,
        invoice_id: i64,
        status: InvoiceStatus,
        completed_at: DateTime<Utc>,
    ) -> DbResult<Invoice> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoice WHERE invoice_id = $1 FOR UPDATE");
        let current = sqlx::query_as::<_, Invoice>(&sql)
            .bind(invoice_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", invoice_id))?;

        check_invoice_completion(&current, status, completed_at)?;

        let sql = format!(
            "UPDATE invoice SET status = $2, completed_at = $3 \
             WHERE invoice_id = $1 RETURNING {INVOICE_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Invoice>(&sql)
            .bind(invoice_id)
            .bind(InvoiceStatus::Completed)
            .bind(completed_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(invoice_id, "Invoice completed");
        Ok(updated)
    }

    /// Deletes an in-progress invoice. Its lines go first (store trigger),
    /// reversing their stock contribution.
    pub async fn delete(&self, invoice_id: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoice WHERE invoice_id = $1 FOR UPDATE");
        let current = sqlx::query_as::<_, Invoice>(&sql)
            .bind(invoice_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", invoice_id))?;

        check_invoice_editable(&current)?;

        sqlx::query("DELETE FROM invoice WHERE invoice_id = $1")
            .bind(invoice_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(invoice_id, "Invoice deleted");
        Ok(())
    }

    /// Lists invoices matching `filter`, ascending by id.
    pub async fn list(&self, filter: &InvoiceFilter) -> DbResult<Vec<InvoiceSummary>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT i.invoice_id, i.invoice_type, i.status, i.created_at, i.completed_at, \
                    i.provider_id, p.provider_name, i.employee_id, \
                    (e.first_name || ' ' || e.last_name) AS employee_name \
             FROM invoice i \
             JOIN employee e ON e.employee_id = i.employee_id \
             LEFT JOIN provider p ON p.provider_id = i.provider_id",
        );

        match filter {
            InvoiceFilter::All => {}
            InvoiceFilter::Id(id) => {
                qb.push(" WHERE i.invoice_id = ").push_bind(*id);
            }
            InvoiceFilter::ProviderName(name) => {
                qb.push(" WHERE p.provider_name ILIKE ")
                    .push_bind(like_pattern(name));
            }
            InvoiceFilter::EmployeeName(name) => {
                qb.push(" WHERE (e.first_name || ' ' || e.last_name) ILIKE ")
                    .push_bind(like_pattern(name));
            }
            InvoiceFilter::CreatedAt(fragment) => {
                qb.push(" WHERE TO_CHAR(i.created_at, 'YYYY-MM-DD') LIKE ")
                    .push_bind(like_pattern(fragment));
            }
            InvoiceFilter::InvoiceType(fragment) => {
                let pattern = like_pattern(fragment);
                qb.push(" WHERE (i.invoice_type::text ILIKE ")
                    .push_bind(pattern.clone())
                    .push(
                        " OR CASE i.invoice_type \
                             WHEN 'receiving' THEN 'Отримання' \
                             WHEN 'write_off' THEN 'Списання' \
                             ELSE 'Повернення' END ILIKE ",
                    )
                    .push_bind(pattern)
                    .push(")");
            }
        }

        qb.push(" ORDER BY i.invoice_id ASC");

        let rows = qb
            .build_query_as::<InvoiceSummary>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), ?filter, "Listed invoices");
        Ok(rows)
    }
}
