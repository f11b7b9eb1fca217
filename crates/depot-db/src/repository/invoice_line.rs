//! # Invoice Line Repository
//!
//! Line items of an invoice (`products_for_invoice`). Stock arithmetic is not
//! done here: the `pfi_stock` trigger credits or debits `product_stock` on
//! insert and reverses it on delete.
//!
//! ```text
//! add_line ─────► INSERT  ──trigger──► stock ± quantity (may raise shortage)
//! update_line ──► UPDATE  price/dates only; quantity is immutable
//! delete_line ──► DELETE  ──trigger──► stock ∓ quantity, exactly once
//! ```

use depot_core::lifecycle::check_invoice_editable;
use depot_core::search::{like_pattern, InvoiceLineFilter, LineSearch};
use depot_core::validation::{validate_batch_dates, validate_id, validate_price, validate_quantity};
use depot_core::{Invoice, InvoiceLine, InvoiceLineDetail, InvoiceLineUpdate, NewInvoiceLine};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

pub(crate) const LINE_COLUMNS: &str = "id, invoice_id, product_id, quantity, \
     product_price_cents AS product_price, date_of_manufacture, use_by_date";

/// Repository for invoice line operations.
#[derive(Debug, Clone)]
pub struct InvoiceLineRepository {
    pool: PgPool,
}

/// Validates a new line before any statement runs.
pub(crate) fn validate_new_line(line: &NewInvoiceLine) -> DbResult<()> {
    validate_id("invoice_id", line.invoice_id)?;
    validate_id("product_id", line.product_id)?;
    validate_quantity(line.quantity)?;
    validate_price("product_price", line.product_price)?;
    validate_batch_dates(line.date_of_manufacture, line.use_by_date)?;
    Ok(())
}

/// Locks the parent invoice and fails unless it is still in progress.
async fn lock_open_invoice(conn: &mut PgConnection, invoice_id: i64) -> DbResult<Invoice> {
    let invoice = sqlx::query_as::<_, Invoice>(
        "SELECT invoice_id, employee_id, provider_id, invoice_type, status, created_at, completed_at \
         FROM invoice WHERE invoice_id = $1 FOR UPDATE",
    )
    .bind(invoice_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("Invoice", invoice_id))?;

    check_invoice_editable(&invoice)?;
    Ok(invoice)
}

/// Inserts a validated line inside the caller's transaction.
///
/// Shared with the order-to-invoice bridge so both paths lock and check the
/// parent the same way.
pub(crate) async fn insert_line(
    conn: &mut PgConnection,
    line: &NewInvoiceLine,
) -> DbResult<InvoiceLine> {
    let invoice = lock_open_invoice(conn, line.invoice_id).await?;

    let sql = format!(
        "INSERT INTO products_for_invoice \
             (invoice_id, product_id, quantity, product_price_cents, date_of_manufacture, use_by_date) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {LINE_COLUMNS}"
    );
    let inserted = sqlx::query_as::<_, InvoiceLine>(&sql)
        .bind(line.invoice_id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.product_price)
        .bind(line.date_of_manufacture)
        .bind(line.use_by_date)
        .fetch_one(&mut *conn)
        .await?;

    debug!(
        line_id = inserted.id,
        invoice_id = invoice.invoice_id,
        invoice_type = %invoice.invoice_type,
        quantity = inserted.quantity,
        "Invoice line inserted"
    );
    Ok(inserted)
}

impl InvoiceLineRepository {
    pub fn new(pool: PgPool) -> Self {
        InvoiceLineRepository { pool }
    }

    /// Gets a line by ID.
    pub async fn get(&self, line_id: i64) -> DbResult<InvoiceLine> {
        let sql = format!("SELECT {LINE_COLUMNS} FROM products_for_invoice WHERE id = $1");
        sqlx::query_as::<_, InvoiceLine>(&sql)
            .bind(line_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice line", line_id))
    }

    /// Adds a line to an in-progress invoice.
    ///
    /// ## Errors
    /// - Validation: bad numbers, manufacture date after use-by date
    /// - `InsufficientStock`: a write-off or return debit exceeds stock
    /// - `InvalidInvoiceStatus`: the invoice is completed
    pub async fn add_line(&self, line: &NewInvoiceLine) -> DbResult<InvoiceLine> {
        validate_new_line(line)?;

        let mut tx = self.pool.begin().await?;
        let inserted = insert_line(&mut tx, line).await?;
        tx.commit().await?;

        info!(line_id = inserted.id, invoice_id = line.invoice_id, "Invoice line added");
        Ok(inserted)
    }

    /// Corrects the price and batch dates of a line. Quantity never changes.
    pub async fn update_line(
        &self,
        line_id: i64,
        update: &InvoiceLineUpdate,
    ) -> DbResult<InvoiceLine> {
        validate_id("id", line_id)?;
        validate_price("product_price", update.product_price)?;
        validate_batch_dates(Some(update.date_of_manufacture), Some(update.use_by_date))?;

        let mut tx = self.pool.begin().await?;

        self.lock_line(&mut tx, line_id).await?;

        let sql = format!(
            "UPDATE products_for_invoice \
             SET product_price_cents = $2, date_of_manufacture = $3, use_by_date = $4 \
             WHERE id = $1 RETURNING {LINE_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, InvoiceLine>(&sql)
            .bind(line_id)
            .bind(update.product_price)
            .bind(update.date_of_manufacture)
            .bind(update.use_by_date)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(line_id, "Invoice line updated");
        Ok(updated)
    }

    /// Deletes a line; the trigger reverses its stock effect.
    ///
    /// A second delete of the same id finds no row and returns `NotFound`,
    /// so stock is never reversed twice.
    pub async fn delete_line(&self, line_id: i64) -> DbResult<InvoiceLine> {
        validate_id("id", line_id)?;

        let mut tx = self.pool.begin().await?;

        self.lock_line(&mut tx, line_id).await?;

        let sql = format!("DELETE FROM products_for_invoice WHERE id = $1 RETURNING {LINE_COLUMNS}");
        let deleted = sqlx::query_as::<_, InvoiceLine>(&sql)
            .bind(line_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice line", line_id))?;

        tx.commit().await?;

        info!(line_id, invoice_id = deleted.invoice_id, "Invoice line deleted");
        Ok(deleted)
    }

    /// Lists lines with product and invoice context, newest batches first.
    pub async fn list(&self, filter: &InvoiceLineFilter) -> DbResult<Vec<InvoiceLineDetail>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT l.id, l.invoice_id, i.invoice_type, l.product_id, p.product_name, \
                    l.quantity, l.product_price_cents AS product_price, \
                    l.date_of_manufacture, l.use_by_date \
             FROM products_for_invoice l \
             JOIN products p ON p.product_id = l.product_id \
             JOIN invoice i ON i.invoice_id = l.invoice_id \
             WHERE TRUE",
        );

        if let Some(invoice_type) = filter.invoice_type {
            qb.push(" AND i.invoice_type = ").push_bind(invoice_type);
        }

        match &filter.search {
            LineSearch::All => {}
            LineSearch::InvoiceId(id) => {
                qb.push(" AND l.invoice_id = ").push_bind(*id);
            }
            LineSearch::ProductName(name) => {
                qb.push(" AND p.product_name ILIKE ").push_bind(like_pattern(name));
            }
            LineSearch::DateOfManufacture(date) => {
                qb.push(" AND l.date_of_manufacture = ").push_bind(*date);
            }
            LineSearch::UseByDate(date) => {
                qb.push(" AND l.use_by_date = ").push_bind(*date);
            }
        }

        qb.push(" ORDER BY l.date_of_manufacture DESC NULLS LAST, l.id DESC");

        let rows = qb
            .build_query_as::<InvoiceLineDetail>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Listed invoice lines");
        Ok(rows)
    }

    /// Locks a line for mutation, parent invoice first.
    ///
    /// Invoice deletion locks the invoice and then removes its lines, so every
    /// path that touches a line takes the locks in that same order.
    async fn lock_line(&self, conn: &mut PgConnection, line_id: i64) -> DbResult<InvoiceLine> {
        let invoice_id: i64 =
            sqlx::query_scalar("SELECT invoice_id FROM products_for_invoice WHERE id = $1")
                .bind(line_id)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or_else(|| DbError::not_found("Invoice line", line_id))?;

        // The invoice may vanish between the two reads, taking the line with it.
        lock_open_invoice(conn, invoice_id).await.map_err(|err| match err {
            DbError::NotFound { .. } => DbError::not_found("Invoice line", line_id),
            other => other,
        })?;

        let sql = format!(
            "SELECT {LINE_COLUMNS} FROM products_for_invoice \
             WHERE id = $1 AND invoice_id = $2 FOR UPDATE"
        );
        sqlx::query_as::<_, InvoiceLine>(&sql)
            .bind(line_id)
            .bind(invoice_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice line", line_id))
    }
}
