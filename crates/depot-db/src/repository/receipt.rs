//! # Receipt Repository
//!
//! ## Receipt Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. DRAFT (lazy, one per employee)                                     │
//! │     └── get_or_create_draft() → Receipt { Draft }                      │
//! │         INSERT .. ON CONFLICT DO NOTHING against                       │
//! │         receipt_one_draft_per_employee, then re-read                   │
//! │                                                                         │
//! │  2. LINES  (ReceiptLineRepository, stock debited by trigger)           │
//! │                                                                         │
//! │  3. SALE                                                                │
//! │     └── finalize() → Receipt { Sale }   requires ≥ 1 line              │
//! │                                                                         │
//! │  4. RETURN (optional, repeatable up to the sold quantity)              │
//! │     └── initiate_return() → NEW Receipt { Return, source = sale }      │
//! │         one transaction: header + copied lines, stock credited         │
//! │         the sale itself is never modified                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use depot_core::lifecycle::{check_finalize, plan_return, ReturnSelection};
use depot_core::search::{like_pattern, ReceiptFilter};
use depot_core::validation::validate_id;
use depot_core::{Receipt, ReceiptLine, ReceiptSummary, ReceiptType};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::receipt_line::RECEIPT_LINE_COLUMNS;

pub(crate) const RECEIPT_COLUMNS: &str =
    "receipt_id, employee_id, receipt_type, created_at, source_receipt_id";

/// Locks a receipt row for the rest of the transaction.
pub(crate) async fn lock_receipt(conn: &mut PgConnection, receipt_id: i64) -> DbResult<Receipt> {
    let sql = format!("SELECT {RECEIPT_COLUMNS} FROM receipt WHERE receipt_id = $1 FOR UPDATE");
    sqlx::query_as::<_, Receipt>(&sql)
        .bind(receipt_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Receipt", receipt_id))
}

/// Repository for receipt operations.
#[derive(Debug, Clone)]
pub struct ReceiptRepository {
    pool: PgPool,
}

impl ReceiptRepository {
    pub fn new(pool: PgPool) -> Self {
        ReceiptRepository { pool }
    }

    /// Gets a receipt by ID.
    pub async fn get(&self, receipt_id: i64) -> DbResult<Receipt> {
        let sql = format!("SELECT {RECEIPT_COLUMNS} FROM receipt WHERE receipt_id = $1");
        sqlx::query_as::<_, Receipt>(&sql)
            .bind(receipt_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Receipt", receipt_id))
    }

    /// Returns the employee's open draft, creating it if there is none.
    ///
    /// Idempotent and race-safe: two concurrent callers both end up with
    /// the same draft. A lost insert race shows up as an empty `RETURNING`
    /// and is answered by reading the winner's row.
    pub async fn get_or_create_draft(&self, employee_id: i64) -> DbResult<Receipt> {
        validate_id("employee_id", employee_id)?;

        let insert = format!(
            "INSERT INTO receipt (employee_id, receipt_type) VALUES ($1, 'draft') \
             ON CONFLICT (employee_id) WHERE receipt_type = 'draft' DO NOTHING \
             RETURNING {RECEIPT_COLUMNS}"
        );
        let select = format!(
            "SELECT {RECEIPT_COLUMNS} FROM receipt \
             WHERE employee_id = $1 AND receipt_type = 'draft'"
        );

        // The existing draft can be finalized between our insert and our
        // read; one more round always settles it.
        for attempt in 0..3 {
            if let Some(created) = sqlx::query_as::<_, Receipt>(&insert)
                .bind(employee_id)
                .fetch_optional(&self.pool)
                .await?
            {
                info!(employee_id, receipt_id = created.receipt_id, "Draft receipt created");
                return Ok(created);
            }

            if let Some(existing) = sqlx::query_as::<_, Receipt>(&select)
                .bind(employee_id)
                .fetch_optional(&self.pool)
                .await?
            {
                debug!(employee_id, receipt_id = existing.receipt_id, "Reusing draft receipt");
                return Ok(existing);
            }

            warn!(employee_id, attempt, "Draft vanished between insert and read, retrying");
        }

        Err(DbError::Internal(format!(
            "could not settle draft receipt for employee {employee_id}"
        )))
    }

    /// `Draft → Sale`. Rejected unless the receipt is a draft with lines.
    pub async fn finalize(&self, receipt_id: i64) -> DbResult<Receipt> {
        validate_id("receiptId", receipt_id)?;

        let mut tx = self.pool.begin().await?;

        let current = lock_receipt(&mut tx, receipt_id).await?;
        let line_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products_for_receipt WHERE receipt_id = $1")
                .bind(receipt_id)
                .fetch_one(&mut *tx)
                .await?;

        check_finalize(&current, line_count)?;

        let sql = format!(
            "UPDATE receipt SET receipt_type = $2 WHERE receipt_id = $1 RETURNING {RECEIPT_COLUMNS}"
        );
        let sold = sqlx::query_as::<_, Receipt>(&sql)
            .bind(receipt_id)
            .bind(ReceiptType::Sale)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(receipt_id, line_count, "Receipt finalized as sale");
        Ok(sold)
    }

    /// Creates a return receipt for (part of) a sale.
    ///
    /// The new header and all of its lines are written in one transaction;
    /// on any failure nothing is written. Prices are copied from the sale.
    /// Quantities already taken back by earlier returns are not returnable
    /// again.
    pub async fn initiate_return(
        &self,
        source_receipt_id: i64,
        employee_id: i64,
        selection: &ReturnSelection,
    ) -> DbResult<(Receipt, Vec<ReceiptLine>)> {
        validate_id("receiptId", source_receipt_id)?;
        validate_id("employeeId", employee_id)?;

        let mut tx = self.pool.begin().await?;

        let source = lock_receipt(&mut tx, source_receipt_id).await?;
        let sql = format!(
            "SELECT {RECEIPT_LINE_COLUMNS} FROM products_for_receipt \
             WHERE receipt_id = $1 ORDER BY id"
        );
        let sold_lines = sqlx::query_as::<_, ReceiptLine>(&sql)
            .bind(source_receipt_id)
            .fetch_all(&mut *tx)
            .await?;

        // Earlier returns of this sale; stable while the sale row is locked.
        let returned: HashMap<i64, i64> = sqlx::query_as::<_, (i64, i64)>(
            "SELECT l.source_line_id, SUM(l.quantity)::BIGINT \
             FROM products_for_receipt l \
             JOIN receipt r ON r.receipt_id = l.receipt_id \
             WHERE r.source_receipt_id = $1 AND l.source_line_id IS NOT NULL \
             GROUP BY l.source_line_id",
        )
        .bind(source_receipt_id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .collect();

        let plan = plan_return(&source, &sold_lines, &returned, selection)?;

        let sql = format!(
            "INSERT INTO receipt (employee_id, receipt_type, source_receipt_id) \
             VALUES ($1, $2, $3) RETURNING {RECEIPT_COLUMNS}"
        );
        let header = sqlx::query_as::<_, Receipt>(&sql)
            .bind(employee_id)
            .bind(ReceiptType::Return)
            .bind(source_receipt_id)
            .fetch_one(&mut *tx)
            .await?;

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO products_for_receipt \
                 (receipt_id, product_id, employee_id, quantity, price_cents, source_line_id) ",
        );
        qb.push_values(&plan, |mut row, line| {
            row.push_bind(header.receipt_id)
                .push_bind(line.product_id)
                .push_bind(employee_id)
                .push_bind(line.quantity)
                .push_bind(line.price)
                .push_bind(line.source_line_id);
        });
        qb.push(format!(" RETURNING {RECEIPT_LINE_COLUMNS}"));

        let lines = qb
            .build_query_as::<ReceiptLine>()
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            source_receipt_id,
            return_receipt_id = header.receipt_id,
            lines = lines.len(),
            "Return receipt created"
        );
        Ok((header, lines))
    }

    /// Lists receipts with totals, newest first.
    pub async fn list(&self, filter: &ReceiptFilter) -> DbResult<Vec<ReceiptSummary>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT receipt_id, employee_id, last_name, receipt_type, created_at, \
                    source_receipt_id, line_count, total \
             FROM receipt_with_total",
        );

        match filter {
            ReceiptFilter::All => {}
            ReceiptFilter::Id(id) => {
                qb.push(" WHERE receipt_id = ").push_bind(*id);
            }
            ReceiptFilter::LastName(name) => {
                qb.push(" WHERE last_name ILIKE ").push_bind(like_pattern(name));
            }
            ReceiptFilter::CreatedOn(day) => {
                qb.push(" WHERE created_at >= ")
                    .push_bind(*day)
                    .push("::date AND created_at < ")
                    .push_bind(*day)
                    .push("::date + 1");
            }
        }

        qb.push(" ORDER BY created_at DESC, receipt_id DESC");

        let rows = qb
            .build_query_as::<ReceiptSummary>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), ?filter, "Listed receipts");
        Ok(rows)
    }
}
