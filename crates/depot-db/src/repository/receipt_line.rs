//! # Receipt Line Repository
//!
//! Lines of a draft receipt. Prices are snapshots: taken from the request or,
//! when omitted, from `product_stock` at insertion time, and never
//! recomputed. The `pfr_stock` trigger debits stock on insert and restores
//! it when a draft line is removed.

use depot_core::lifecycle::check_receipt_editable;
use depot_core::search::{like_pattern, ReceiptLineFilter, ReceiptLineSearch};
use depot_core::validation::{validate_id, validate_price, validate_quantity};
use depot_core::{NewReceiptLine, ReceiptLine, ReceiptLineDetail};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::receipt::lock_receipt;

pub(crate) const RECEIPT_LINE_COLUMNS: &str =
    "id, receipt_id, product_id, employee_id, quantity, price_cents AS price";

/// Repository for receipt line operations.
#[derive(Debug, Clone)]
pub struct ReceiptLineRepository {
    pool: PgPool,
}

impl ReceiptLineRepository {
    pub fn new(pool: PgPool) -> Self {
        ReceiptLineRepository { pool }
    }

    /// Adds a line to a draft receipt.
    ///
    /// ## Errors
    /// - Validation: missing or non-positive fields
    /// - `InvalidReceiptType`: the receipt is no longer a draft
    /// - `InsufficientStock`: raised by the stock trigger
    pub async fn add_line(&self, line: &NewReceiptLine) -> DbResult<ReceiptLine> {
        validate_id("receipt_id", line.receipt_id)?;
        validate_id("employee_id", line.employee_id)?;
        validate_id("product_id", line.product_id)?;
        validate_quantity(line.quantity)?;
        if let Some(price) = line.price {
            validate_price("price", price)?;
        }

        let mut tx = self.pool.begin().await?;

        let receipt = lock_receipt(&mut tx, line.receipt_id).await?;
        check_receipt_editable(&receipt)?;

        let sql = format!(
            "INSERT INTO products_for_receipt (receipt_id, product_id, employee_id, quantity, price_cents) \
             VALUES ($1, $2, $3, $4, COALESCE($5, \
                 (SELECT price_cents FROM product_stock WHERE product_id = $2), 0)) \
             RETURNING {RECEIPT_LINE_COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, ReceiptLine>(&sql)
            .bind(line.receipt_id)
            .bind(line.product_id)
            .bind(line.employee_id)
            .bind(line.quantity)
            .bind(line.price)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            line_id = inserted.id,
            receipt_id = line.receipt_id,
            product_id = line.product_id,
            quantity = line.quantity,
            price = %inserted.price,
            "Receipt line added"
        );
        Ok(inserted)
    }

    /// Lines of one receipt in insertion order.
    pub async fn list_for_receipt(&self, receipt_id: i64) -> DbResult<Vec<ReceiptLine>> {
        validate_id("receiptId", receipt_id)?;

        let sql = format!(
            "SELECT {RECEIPT_LINE_COLUMNS} FROM products_for_receipt WHERE receipt_id = $1 ORDER BY id"
        );
        let lines = sqlx::query_as::<_, ReceiptLine>(&sql)
            .bind(receipt_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(receipt_id, count = lines.len(), "Listed receipt lines");
        Ok(lines)
    }

    /// Lists lines with receipt, cashier and product context, newest first.
    pub async fn list(&self, filter: &ReceiptLineFilter) -> DbResult<Vec<ReceiptLineDetail>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT l.id, l.receipt_id, r.receipt_type, r.created_at, \
                    l.product_id, p.product_name, \
                    l.employee_id, e.first_name, e.last_name, \
                    l.quantity, l.price_cents AS price, \
                    l.price_cents * l.quantity AS total \
             FROM products_for_receipt l \
             JOIN receipt r ON r.receipt_id = l.receipt_id \
             JOIN employee e ON e.employee_id = l.employee_id \
             JOIN products p ON p.product_id = l.product_id \
             WHERE TRUE",
        );

        match &filter.search {
            ReceiptLineSearch::All => {}
            ReceiptLineSearch::ReceiptId(id) => {
                qb.push(" AND l.receipt_id = ").push_bind(*id);
            }
            ReceiptLineSearch::ProductName(name) => {
                qb.push(" AND p.product_name ILIKE ").push_bind(like_pattern(name));
            }
        }
        if let Some(employee_id) = filter.employee_id {
            qb.push(" AND l.employee_id = ").push_bind(employee_id);
        }
        if let Some(receipt_type) = filter.receipt_type {
            qb.push(" AND r.receipt_type = ").push_bind(receipt_type);
        }
        if let Some(from) = filter.date_from {
            qb.push(" AND r.created_at >= ").push_bind(from).push("::date");
        }
        if let Some(to) = filter.date_to {
            qb.push(" AND r.created_at < ").push_bind(to).push("::date + 1");
        }

        qb.push(" ORDER BY l.id DESC");

        let rows = qb
            .build_query_as::<ReceiptLineDetail>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), ?filter, "Listed receipt lines");
        Ok(rows)
    }

    /// Removes a line from a draft; the trigger restores the stock.
    pub async fn delete_line(&self, line_id: i64) -> DbResult<ReceiptLine> {
        validate_id("id", line_id)?;

        let mut tx = self.pool.begin().await?;

        lock_line(&mut tx, line_id).await?;

        let sql = format!("DELETE FROM products_for_receipt WHERE id = $1 RETURNING {RECEIPT_LINE_COLUMNS}");
        let deleted = sqlx::query_as::<_, ReceiptLine>(&sql)
            .bind(line_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Receipt line", line_id))?;

        tx.commit().await?;

        info!(line_id, receipt_id = deleted.receipt_id, "Receipt line removed");
        Ok(deleted)
    }
}

/// Locks the parent draft, then the line, in the same order as `add_line`.
async fn lock_line(conn: &mut PgConnection, line_id: i64) -> DbResult<ReceiptLine> {
    let receipt_id: i64 =
        sqlx::query_scalar("SELECT receipt_id FROM products_for_receipt WHERE id = $1")
            .bind(line_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::not_found("Receipt line", line_id))?;

    let receipt = lock_receipt(conn, receipt_id).await?;
    check_receipt_editable(&receipt)?;

    let sql = format!(
        "SELECT {RECEIPT_LINE_COLUMNS} FROM products_for_receipt \
         WHERE id = $1 AND receipt_id = $2 FOR UPDATE"
    );
    sqlx::query_as::<_, ReceiptLine>(&sql)
        .bind(line_id)
        .bind(receipt_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Receipt line", line_id))
}
