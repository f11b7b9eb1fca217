//! # Order Repository
//!
//! The reorder queue (`products_to_order`) and the order-to-invoice bridge.
//!
//! ## Bridge
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  convert_to_invoice_line(line, need_minus)                              │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │   ├── need_minus?                                                       │
//! │   │     └── oldest open request for product (FOR UPDATE)               │
//! │   │           quantity := max(quantity - line.quantity, 0)              │
//! │   │           none open → NotFound, nothing written                    │
//! │   ├── insert invoice line (same path as InvoiceLineRepository)         │
//! │  COMMIT   ← both effects or neither                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use depot_core::search::like_pattern;
use depot_core::validation::{validate_id, validate_quantity, validate_search_value};
use depot_core::{InvoiceLine, NewInvoiceLine, ProductToOrder};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::invoice_line::{insert_line, validate_new_line};

/// Repository for the reorder queue.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        OrderRepository { pool }
    }

    /// Lists reorder requests, oldest first, optionally by product name.
    pub async fn list(&self, product_name: Option<&str>) -> DbResult<Vec<ProductToOrder>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT o.id, o.product_id, p.product_name, o.quantity, o.order_date \
             FROM products_to_order o \
             JOIN products p ON p.product_id = o.product_id",
        );

        if let Some(name) = product_name.map(str::trim).filter(|n| !n.is_empty()) {
            let name = validate_search_value(name)?;
            qb.push(" WHERE p.product_name ILIKE ").push_bind(like_pattern(&name));
        }

        qb.push(" ORDER BY o.order_date ASC, o.id ASC");

        let rows = qb
            .build_query_as::<ProductToOrder>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Listed reorder requests");
        Ok(rows)
    }

    /// Queues a reorder request dated today.
    pub async fn create(&self, product_id: i64, quantity: i64) -> DbResult<ProductToOrder> {
        validate_id("productId", product_id)?;
        validate_quantity(quantity)?;

        let created = sqlx::query_as::<_, ProductToOrder>(
            "WITH inserted AS ( \
                 INSERT INTO products_to_order (product_id, quantity) \
                 VALUES ($1, $2) \
                 RETURNING id, product_id, quantity, order_date \
             ) \
             SELECT i.id, i.product_id, p.product_name, i.quantity, i.order_date \
             FROM inserted i JOIN products p ON p.product_id = i.product_id",
        )
        .bind(product_id)
        .bind(quantity)
        .fetch_one(&self.pool)
        .await?;

        info!(order_id = created.id, product_id, quantity, "Reorder request queued");
        Ok(created)
    }

    /// Removes a reorder request.
    pub async fn delete(&self, order_id: i64) -> DbResult<()> {
        validate_id("id", order_id)?;

        let result = sqlx::query("DELETE FROM products_to_order WHERE id = $1")
            .bind(order_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Reorder request", order_id));
        }

        info!(order_id, "Reorder request removed");
        Ok(())
    }

    /// Adds an invoice line, optionally consuming the matching reorder
    /// request in the same transaction.
    ///
    /// With `need_minus` the oldest open request for the product is reduced
    /// by the line quantity, clamped at zero. If no open request exists the
    /// whole operation fails with `NotFound` and no line is added.
    pub async fn convert_to_invoice_line(
        &self,
        line: &NewInvoiceLine,
        need_minus: bool,
    ) -> DbResult<InvoiceLine> {
        validate_new_line(line)?;

        let mut tx = self.pool.begin().await?;

        if need_minus {
            let request: Option<(i64, i64)> = sqlx::query_as(
                "SELECT id, quantity FROM products_to_order \
                 WHERE product_id = $1 AND quantity > 0 \
                 ORDER BY order_date ASC, id ASC \
                 LIMIT 1 FOR UPDATE",
            )
            .bind(line.product_id)
            .fetch_optional(&mut *tx)
            .await?;

            let (order_id, open) = request
                .ok_or_else(|| DbError::not_found("Reorder request for product", line.product_id))?;

            sqlx::query(
                "UPDATE products_to_order SET quantity = GREATEST(quantity - $2, 0) WHERE id = $1",
            )
            .bind(order_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;

            debug!(
                order_id,
                open,
                consumed = line.quantity.min(open),
                "Reorder request consumed"
            );
        }

        let inserted = insert_line(&mut tx, line).await?;

        tx.commit().await?;

        info!(
            line_id = inserted.id,
            invoice_id = line.invoice_id,
            product_id = line.product_id,
            need_minus,
            "Invoice line added from reorder queue"
        );
        Ok(inserted)
    }
}
