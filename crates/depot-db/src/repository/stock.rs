//! # Stock Repository
//!
//! Read-only view of `product_stock`. Rows are written exclusively by the
//! invoice-line and receipt-line triggers.

use depot_core::validation::validate_id;
use depot_core::StockLevel;
use sqlx::PgPool;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Repository for stock lookups.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: PgPool,
}

impl StockRepository {
    pub fn new(pool: PgPool) -> Self {
        StockRepository { pool }
    }

    /// Current stock of one product. A product that was never received
    /// reports zero rather than `NotFound`.
    pub async fn get(&self, product_id: i64) -> DbResult<StockLevel> {
        validate_id("productId", product_id)?;

        sqlx::query_as::<_, StockLevel>(
            "SELECT p.product_id, p.product_name, \
                    COALESCE(s.quantity, 0) AS quantity, \
                    COALESCE(s.price_cents, 0) AS price \
             FROM products p \
             LEFT JOIN product_stock s ON s.product_id = p.product_id \
             WHERE p.product_id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Product", product_id))
    }

    /// Products with a positive quantity on hand.
    pub async fn list_in_stock(&self) -> DbResult<Vec<StockLevel>> {
        let rows = sqlx::query_as::<_, StockLevel>(
            "SELECT product_id, product_name, quantity, price \
             FROM products_in_stock ORDER BY product_name, product_id",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed products in stock");
        Ok(rows)
    }
}
