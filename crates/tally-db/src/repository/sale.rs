//! # Sale Repository
//!
//! Database operations for sales and sale items.
//!
//! ## Who Writes What
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SaleRepository (pool)        reads only: list, get_by_id              │
//! │                                                                         │
//! │  free functions (connection)  every write, called by the ledger inside │
//! │                               its transaction:                         │
//! │    insert_sale / update_sale_row / insert_item / delete_items          │
//! │    set_balance               ← FIFO allocation                         │
//! │    open_sales_for_client     ← FIFO order: created_at, then rowid      │
//! │    outstanding_for_client    ← client debt, recomputed from source     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tally_core::{Money, Sale, SaleItem, SaleStatus, SaleWithItems};

const SALE_COLUMNS: &str = "id, client_id, sale_type, subtotal_cents, adjustment_cents, \
                            final_total_cents, remaining_balance_cents, status, \
                            created_at, updated_at";

const ITEM_COLUMNS: &str = "id, sale_id, product_id, name_snapshot, quantity, \
                            unit_price_cents, line_total_cents";

/// Repository for sale reads.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Lists every sale with its items, newest first.
    pub async fn list(&self) -> DbResult<Vec<SaleWithItems>> {
        let mut conn = self.pool.acquire().await?;

        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&mut *conn)
        .await?;

        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM sale_items ORDER BY rowid"
        ))
        .fetch_all(&mut *conn)
        .await?;

        let mut by_sale: HashMap<String, Vec<SaleItem>> = HashMap::new();
        for item in items {
            by_sale.entry(item.sale_id.clone()).or_default().push(item);
        }

        Ok(sales
            .into_iter()
            .map(|sale| {
                let items = by_sale.remove(&sale.id).unwrap_or_default();
                SaleWithItems { sale, items }
            })
            .collect())
    }

    /// Gets a sale with its items.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SaleWithItems>> {
        let mut conn = self.pool.acquire().await?;

        let Some(sale) = fetch_sale(&mut conn, id).await? else {
            return Ok(None);
        };
        let items = fetch_items(&mut conn, id).await?;

        Ok(Some(SaleWithItems { sale, items }))
    }
}

// =============================================================================
// Transaction-scoped operations
// =============================================================================

pub(crate) async fn fetch_sale(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
    let sale = sqlx::query_as::<_, Sale>(&format!(
        "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(sale)
}

/// Items of a sale in the order they were entered.
pub(crate) async fn fetch_items(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleItem>> {
    let items = sqlx::query_as::<_, SaleItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY rowid"
    ))
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

pub(crate) async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(
        id = %sale.id,
        sale_type = ?sale.sale_type,
        final_total_cents = sale.final_total_cents,
        "Inserting sale"
    );

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, client_id, sale_type,
            subtotal_cents, adjustment_cents, final_total_cents,
            remaining_balance_cents, status,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.client_id)
    .bind(sale.sale_type)
    .bind(sale.subtotal_cents)
    .bind(sale.adjustment_cents)
    .bind(sale.final_total_cents)
    .bind(sale.remaining_balance_cents)
    .bind(sale.status)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Rewrites the totals, balance and status of an existing sale.
pub(crate) async fn update_sale_row(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(
        id = %sale.id,
        final_total_cents = sale.final_total_cents,
        remaining_balance_cents = sale.remaining_balance_cents,
        "Updating sale"
    );

    sqlx::query(
        r#"
        UPDATE sales SET
            subtotal_cents = ?2,
            adjustment_cents = ?3,
            final_total_cents = ?4,
            remaining_balance_cents = ?5,
            status = ?6,
            updated_at = ?7
        WHERE id = ?1
        "#,
    )
    .bind(&sale.id)
    .bind(sale.subtotal_cents)
    .bind(sale.adjustment_cents)
    .bind(sale.final_total_cents)
    .bind(sale.remaining_balance_cents)
    .bind(sale.status)
    .bind(sale.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Inserts a line item. Product name, price and total are already frozen.
pub(crate) async fn insert_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, product_id, name_snapshot,
            quantity, unit_price_cents, line_total_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.product_id)
    .bind(&item.name_snapshot)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.line_total_cents)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn delete_items(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<u64> {
    let result = sqlx::query("DELETE FROM sale_items WHERE sale_id = ?1")
        .bind(sale_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

/// A client's unpaid sales, oldest first.
pub(crate) async fn open_sales_for_client(
    conn: &mut SqliteConnection,
    client_id: &str,
) -> DbResult<Vec<Sale>> {
    let sales = sqlx::query_as::<_, Sale>(&format!(
        "SELECT {SALE_COLUMNS} FROM sales \
         WHERE client_id = ?1 AND status != 'paid' \
         ORDER BY created_at ASC, rowid ASC"
    ))
    .bind(client_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(sales)
}

/// Persists one step of a FIFO allocation.
pub(crate) async fn set_balance(
    conn: &mut SqliteConnection,
    sale_id: &str,
    remaining: Money,
    status: SaleStatus,
    now: DateTime<Utc>,
) -> DbResult<()> {
    debug!(
        id = %sale_id,
        remaining_cents = remaining.cents(),
        status = status.as_str(),
        "Settling sale balance"
    );

    sqlx::query(
        r#"
        UPDATE sales SET
            remaining_balance_cents = ?2,
            status = ?3,
            updated_at = ?4
        WHERE id = ?1
        "#,
    )
    .bind(sale_id)
    .bind(remaining.cents())
    .bind(status)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// What a client still owes: remaining balances over unpaid sales.
pub(crate) async fn outstanding_for_client(
    conn: &mut SqliteConnection,
    client_id: &str,
) -> DbResult<Money> {
    let cents: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(remaining_balance_cents), 0)
        FROM sales
        WHERE client_id = ?1 AND status != 'paid'
        "#,
    )
    .bind(client_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(Money::from_cents(cents))
}
