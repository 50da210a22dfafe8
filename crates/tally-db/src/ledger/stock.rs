//! # Stock Adjustment
//!
//! Applies and reverses the inventory effect of a sale's items.
//!
//! ```text
//! per item:
//!   product missing          → skip
//!   product.track_stock off  → skip
//!   otherwise                → stock ∓= quantity   (may go negative)
//! ```
//!
//! Store failures are returned, never swallowed, so the enclosing ledger
//! transaction aborts.

use sqlx::SqliteConnection;
use tally_core::SaleItem;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::product;

/// Takes the sold quantities out of stock.
pub async fn decrement_for_sale(conn: &mut SqliteConnection, items: &[SaleItem]) -> DbResult<()> {
    adjust(conn, items, -1).await
}

/// Puts the quantities back (used when a sale is edited).
pub async fn increment_for_sale(conn: &mut SqliteConnection, items: &[SaleItem]) -> DbResult<()> {
    adjust(conn, items, 1).await
}

async fn adjust(conn: &mut SqliteConnection, items: &[SaleItem], sign: i64) -> DbResult<()> {
    for item in items {
        match product::fetch_product(conn, &item.product_id).await? {
            Some(p) if p.track_stock => {
                product::adjust_stock(conn, &p.id, sign * item.quantity).await?;
            }
            Some(_) => {}
            None => {
                debug!(product_id = %item.product_id, "Stock skipped, product missing");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::test_support::{product, setup, stock_of};
    use tally_core::LedgerPolicy;

    fn item(product_id: &str, quantity: i64) -> SaleItem {
        SaleItem {
            id: format!("item-{product_id}"),
            sale_id: "s1".to_string(),
            product_id: product_id.to_string(),
            name_snapshot: "x".to_string(),
            quantity,
            unit_price_cents: 100,
            line_total_cents: 100 * quantity,
        }
    }

    #[tokio::test]
    async fn test_tracked_untracked_and_missing() {
        let (db, _) = setup(LedgerPolicy::default()).await;
        let tracked = product(&db, 100, 10, true).await;
        let untracked = product(&db, 200, 10, false).await;

        let items = vec![
            item(&tracked.id, 3),
            item(&untracked.id, 3),
            item("no-such-product", 3),
        ];

        let mut conn = db.pool().acquire().await.unwrap();
        decrement_for_sale(&mut conn, &items).await.unwrap();
        drop(conn);

        assert_eq!(stock_of(&db, &tracked.id).await, 7);
        assert_eq!(stock_of(&db, &untracked.id).await, 10);

        let mut conn = db.pool().acquire().await.unwrap();
        increment_for_sale(&mut conn, &items).await.unwrap();
        drop(conn);

        assert_eq!(stock_of(&db, &tracked.id).await, 10);
    }

    #[tokio::test]
    async fn test_oversell_goes_negative() {
        let (db, _) = setup(LedgerPolicy::default()).await;
        let tracked = product(&db, 100, 1, true).await;

        let mut conn = db.pool().acquire().await.unwrap();
        decrement_for_sale(&mut conn, &[item(&tracked.id, 4)]).await.unwrap();
        drop(conn);

        assert_eq!(stock_of(&db, &tracked.id).await, -3);
    }
}
