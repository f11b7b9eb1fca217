//! # Database Migrations
//!
//! Embedded SQL migrations for Depot.
//!
//! ## What Lives in Migrations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  0001_schema.sql     tables, enums, CHECK constraints, draft index      │
//! │  0002_stock.sql      product_stock + line triggers (debit / reversal)   │
//! │  0003_views.sql      receipt_with_total, products_in_stock              │
//! │  0004_roles.sql      admin_role / seller_role grants, login functions   │
//! │  0005_return_lines   return line → sale line link, for netting returns  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Migrations run on the provisioning pool only; role pools lack DDL rights.
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/postgres/` with the next sequence number
//! 2. **NEVER** modify existing migrations - always add new ones

use sqlx::PgPool;
use tracing::info;

use crate::error::DbResult;

/// Embedded migrations from the `migrations/postgres` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/postgres");

/// Runs all pending database migrations.
pub async fn run_migrations(pool: &PgPool) -> DbResult<()> {
    info!(
        embedded = MIGRATOR.migrations.len(),
        "Checking for pending migrations"
    );

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns `(total, applied)` migration counts for diagnostics.
pub async fn migration_status(pool: &PgPool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await?;

    Ok((total, applied as usize))
}
