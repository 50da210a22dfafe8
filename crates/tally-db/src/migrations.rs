//! # Database Migrations
//!
//! Embedded SQL migrations for Tally.
//!
//! ```text
//! App startup
//!     │
//!     ▼
//! _sqlx_migrations table (created if missing)
//!     │
//!     ▼
//! embedded vs applied ──► run pending in filename order
//!     │
//!     └── 001_initial_schema.sql   clients, products, sales, sale_items, payments
//! ```
//!
//! New migrations go in `migrations/sqlite/` as `NNN_description.sql`.
//! Never edit an applied migration; the checksum check rejects it.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Embedded at compile time from the workspace `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations. Idempotent.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!(
        embedded = MIGRATOR.migrations.len(),
        "Checking for pending migrations"
    );

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns `(embedded, applied)` migration counts, for health checks.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}
