//! # Sale Mutation
//!
//! ## Edit as Revert-then-Reapply
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  update_sale(id, new items)                         one transaction    │
//! │                                                                         │
//! │  1. load sale + old items                    (NotFound if absent)      │
//! │  2. stock += old quantities                  revert                    │
//! │  3. DELETE old items                                                   │
//! │  4. price new items, recompute totals                                  │
//! │  5. balance: CREDIT → per EditBalancePolicy, CASH → 0                  │
//! │  6. UPDATE sale, INSERT new items                                      │
//! │  7. stock -= new quantities                  reapply                   │
//! │  8. CREDIT → client debt (old total out, new total in), interaction    │
//! │  COMMIT                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqliteConnection;
use tally_core::allocation::SaleTotals;
use tally_core::validation::{validate_adjustment_cents, validate_new_sale, validate_sale_items};
use tally_core::{
    CoreError, Money, NewSale, NewSaleItem, Sale, SaleItem, SaleStatus, SaleType, SaleUpdate,
    SaleWithItems,
};
use tracing::info;
use uuid::Uuid;

use super::{debt, stock, Ledger};
use crate::error::{LedgerError, LedgerResult};
use crate::repository::{product, sale};

impl Ledger {
    /// Records a sale, its stock movement and, for credit sales, the
    /// client's new debt.
    ///
    /// ## Errors
    /// - `Validation` - no items, bad quantity, credit sale without client,
    ///   adjustment larger than the subtotal
    /// - `NotFound` - client or product doesn't exist
    /// - `TransactionFailed` - store failure; no sale, item or stock change
    ///   persists
    pub async fn create_sale(&self, request: &NewSale) -> LedgerResult<SaleWithItems> {
        validate_new_sale(request)?;
        if request.sale_type == SaleType::Credit && request.client_id.is_none() {
            return Err(CoreError::CreditSaleWithoutClient.into());
        }

        let now = Utc::now();
        let sale_id = Uuid::new_v4().to_string();

        let mut tx = self.begin_write().await?;

        if let Some(client_id) = &request.client_id {
            debt::load_client(&mut tx, client_id).await?;
        }

        let items = price_items(&mut tx, &sale_id, &request.items).await?;
        let totals = SaleTotals::compute(
            items.iter().map(SaleItem::line_total),
            Money::from_cents(request.adjustment_cents),
        )?;
        let remaining = totals.opening_balance(request.sale_type);

        let record = Sale {
            id: sale_id,
            client_id: request.client_id.clone(),
            sale_type: request.sale_type,
            subtotal_cents: totals.subtotal.cents(),
            adjustment_cents: totals.adjustment.cents(),
            final_total_cents: totals.final_total.cents(),
            remaining_balance_cents: remaining.cents(),
            status: self.status_for(remaining, totals.final_total),
            created_at: request.sold_at.unwrap_or(now),
            updated_at: now,
        };

        sale::insert_sale(&mut tx, &record).await?;
        for item in &items {
            sale::insert_item(&mut tx, item).await?;
        }

        stock::decrement_for_sale(&mut tx, &items).await?;

        if let (SaleType::Credit, Some(client_id)) = (record.sale_type, &record.client_id) {
            debt::after_credit_sale(
                &mut tx,
                client_id,
                self.policy.debt_tracking,
                totals.final_total,
                now,
            )
            .await?;
        }

        tx.commit().await?;

        info!(
            sale_id = %record.id,
            sale_type = ?record.sale_type,
            items = items.len(),
            final_total = %totals.final_total,
            "Sale created"
        );

        Ok(SaleWithItems {
            sale: record,
            items,
        })
    }

    /// Replaces a sale's items and recomputes everything that depends on
    /// them. The adjustment is kept unless the request carries a new one.
    ///
    /// ## Errors
    /// Same as [`create_sale`](Self::create_sale); `NotFound` also when the
    /// sale doesn't exist.
    pub async fn update_sale(&self, sale_id: &str, request: &SaleUpdate) -> LedgerResult<SaleWithItems> {
        validate_sale_items(&request.items)?;
        if let Some(adjustment) = request.adjustment_cents {
            validate_adjustment_cents(adjustment)?;
        }

        let now = Utc::now();

        let mut tx = self.begin_write().await?;

        let old = sale::fetch_sale(&mut tx, sale_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Sale", sale_id))?;
        let old_items = sale::fetch_items(&mut tx, sale_id).await?;

        stock::increment_for_sale(&mut tx, &old_items).await?;
        sale::delete_items(&mut tx, sale_id).await?;

        let items = price_items(&mut tx, sale_id, &request.items).await?;
        let adjustment = request.adjustment_cents.unwrap_or(old.adjustment_cents);
        let totals = SaleTotals::compute(
            items.iter().map(SaleItem::line_total),
            Money::from_cents(adjustment),
        )?;

        let remaining = match old.sale_type {
            SaleType::Credit => self
                .policy
                .edit_balance
                .edited_balance(totals.final_total, old.paid()),
            SaleType::Cash => Money::zero(),
        };

        let record = Sale {
            subtotal_cents: totals.subtotal.cents(),
            adjustment_cents: totals.adjustment.cents(),
            final_total_cents: totals.final_total.cents(),
            remaining_balance_cents: remaining.cents(),
            status: self.status_for(remaining, totals.final_total),
            updated_at: now,
            ..old.clone()
        };

        sale::update_sale_row(&mut tx, &record).await?;
        for item in &items {
            sale::insert_item(&mut tx, item).await?;
        }

        stock::decrement_for_sale(&mut tx, &items).await?;

        if let (SaleType::Credit, Some(client_id)) = (record.sale_type, &record.client_id) {
            let delta = totals
                .final_total
                .checked_sub(old.final_total())
                .ok_or_else(|| CoreError::AmountOverflow {
                    field: "debt change".to_string(),
                })?;
            debt::after_credit_sale(&mut tx, client_id, self.policy.debt_tracking, delta, now)
                .await?;
        }

        tx.commit().await?;

        info!(
            sale_id = %record.id,
            old_total = %old.final_total(),
            new_total = %totals.final_total,
            remaining = %remaining,
            "Sale updated"
        );

        Ok(SaleWithItems {
            sale: record,
            items,
        })
    }

    fn status_for(&self, remaining: Money, final_total: Money) -> SaleStatus {
        SaleStatus::for_balance(remaining, final_total, self.policy.settlement_tolerance)
    }
}

/// Turns request lines into sale items: product name frozen, price taken
/// from the request or the product's current price.
async fn price_items(
    conn: &mut SqliteConnection,
    sale_id: &str,
    lines: &[NewSaleItem],
) -> LedgerResult<Vec<SaleItem>> {
    let mut items = Vec::with_capacity(lines.len());

    for line in lines {
        let product = product::fetch_product(conn, &line.product_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Product", &line.product_id))?;

        let unit_price = Money::from_cents(line.unit_price_cents.unwrap_or(product.price_cents));
        let line_total = unit_price
            .checked_multiply_quantity(line.quantity)
            .ok_or_else(|| CoreError::AmountOverflow {
                field: "line total".to_string(),
            })?;

        items.push(SaleItem {
            id: Uuid::new_v4().to_string(),
            sale_id: sale_id.to_string(),
            product_id: product.id,
            name_snapshot: product.name,
            quantity: line.quantity,
            unit_price_cents: unit_price.cents(),
            line_total_cents: line_total.cents(),
        });
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use tally_core::{
        CoreError, DebtTracking, EditBalancePolicy, LedgerPolicy, NewPayment, NewSale, SaleStatus,
        SaleType, SaleUpdate,
    };

    use crate::ledger::test_support::*;
    use crate::LedgerError;

    fn cash_sale(items: Vec<tally_core::NewSaleItem>) -> NewSale {
        NewSale {
            client_id: None,
            sale_type: SaleType::Cash,
            items,
            adjustment_cents: 0,
            sold_at: None,
        }
    }

    async fn count(db: &crate::Database, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_cash_sale_is_paid_and_moves_stock() {
        let (db, ledger) = setup(LedgerPolicy::default()).await;
        let p = product(&db, 250, 10, true).await;

        let sale = ledger.create_sale(&cash_sale(vec![line(&p, 2)])).await.unwrap();

        assert_eq!(sale.sale.status, SaleStatus::Paid);
        assert_eq!(sale.sale.remaining_balance_cents, 0);
        assert_eq!(sale.sale.final_total_cents, 500);
        assert_eq!(sale.items[0].name_snapshot, p.name);
        assert_eq!(stock_of(&db, &p.id).await, 8);
    }

    #[tokio::test]
    async fn test_untracked_product_keeps_stock() {
        let (db, ledger) = setup(LedgerPolicy::default()).await;
        let p = product(&db, 250, 10, false).await;

        ledger.create_sale(&cash_sale(vec![line(&p, 4)])).await.unwrap();

        assert_eq!(stock_of(&db, &p.id).await, 10);
    }

    #[tokio::test]
    async fn test_credit_sale_opens_debt() {
        let (db, ledger) = setup(LedgerPolicy::default()).await;
        let c = client(&db, "Ana").await;
        let p = product(&db, 20000, 0, false).await;

        let sale = credit_sale(&ledger, &c, &p, 1).await;

        assert_eq!(sale.sale.status, SaleStatus::Open);
        assert_eq!(sale.sale.remaining_balance_cents, 20000);

        let c = reload_client(&db, &c.id).await;
        assert_eq!(c.total_debt_cents, 20000);
        assert!(c.last_interaction.is_some());
    }

    #[tokio::test]
    async fn test_discount_and_price_override() {
        let (db, ledger) = setup(LedgerPolicy::default()).await;
        let c = client(&db, "Bia").await;
        let p = product(&db, 1000, 0, false).await;

        let mut item = line(&p, 3);
        item.unit_price_cents = Some(900);

        let sale = ledger
            .create_sale(&NewSale {
                client_id: Some(c.id.clone()),
                sale_type: SaleType::Credit,
                items: vec![item],
                adjustment_cents: 200,
                sold_at: None,
            })
            .await
            .unwrap();

        assert_eq!(sale.items[0].unit_price_cents, 900);
        assert_eq!(sale.sale.subtotal_cents, 2700);
        assert_eq!(sale.sale.final_total_cents, 2500);
        assert_eq!(reload_client(&db, &c.id).await.total_debt_cents, 2500);
    }

    #[tokio::test]
    async fn test_rejected_sales_persist_nothing() {
        let (db, ledger) = setup(LedgerPolicy::default()).await;
        let c = client(&db, "Caio").await;
        let p = product(&db, 500, 5, true).await;

        let mut no_client = cash_sale(vec![line(&p, 1)]);
        no_client.sale_type = SaleType::Credit;
        assert!(matches!(
            ledger.create_sale(&no_client).await,
            Err(LedgerError::Validation(_))
        ));

        assert!(matches!(
            ledger.create_sale(&cash_sale(vec![])).await,
            Err(LedgerError::Validation(_))
        ));

        let mut too_much_discount = cash_sale(vec![line(&p, 1)]);
        too_much_discount.adjustment_cents = 501;
        assert!(matches!(
            ledger.create_sale(&too_much_discount).await,
            Err(LedgerError::Validation(_))
        ));

        let mut missing_client = cash_sale(vec![line(&p, 1)]);
        missing_client.client_id = Some("ghost".to_string());
        assert!(matches!(
            ledger.create_sale(&missing_client).await,
            Err(LedgerError::NotFound { .. })
        ));

        let mut ghost = line(&p, 1);
        ghost.product_id = "ghost".to_string();
        let with_missing_product = NewSale {
            client_id: Some(c.id.clone()),
            sale_type: SaleType::Credit,
            items: vec![line(&p, 2), ghost],
            adjustment_cents: 0,
            sold_at: None,
        };
        assert!(matches!(
            ledger.create_sale(&with_missing_product).await,
            Err(LedgerError::NotFound { .. })
        ));

        assert_eq!(count(&db, "sales").await, 0);
        assert_eq!(count(&db, "sale_items").await, 0);
        assert_eq!(stock_of(&db, &p.id).await, 5);
        assert_eq!(reload_client(&db, &c.id).await.total_debt_cents, 0);
    }

    #[tokio::test]
    async fn test_store_failure_mid_stock_rolls_back_sale() {
        let (db, ledger) = setup(LedgerPolicy::default()).await;
        let c = client(&db, "Davi").await;
        let first = product(&db, 100, 10, true).await;
        let second = product(&db, 200, 10, true).await;

        sqlx::query(&format!(
            "CREATE TRIGGER fail_stock BEFORE UPDATE OF stock ON products \
             WHEN NEW.id = '{}' \
             BEGIN SELECT RAISE(ABORT, 'stock write failed'); END",
            second.id
        ))
        .execute(db.pool())
        .await
        .unwrap();

        let err = ledger
            .create_sale(&NewSale {
                client_id: Some(c.id.clone()),
                sale_type: SaleType::Credit,
                items: vec![line(&first, 1), line(&second, 1)],
                adjustment_cents: 0,
                sold_at: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::TransactionFailed(_)));
        assert_eq!(count(&db, "sales").await, 0);
        assert_eq!(count(&db, "sale_items").await, 0);
        assert_eq!(stock_of(&db, &first.id).await, 10);
        assert_eq!(reload_client(&db, &c.id).await.total_debt_cents, 0);
    }

    #[tokio::test]
    async fn test_edit_reverts_then_reapplies_stock() {
        let (db, ledger) = setup(LedgerPolicy::default()).await;
        let c = client(&db, "Eva").await;
        let p = product(&db, 1000, 20, true).await;

        let sale = credit_sale(&ledger, &c, &p, 2).await;
        assert_eq!(stock_of(&db, &p.id).await, 18);

        let edited = ledger
            .update_sale(
                &sale.sale.id,
                &SaleUpdate {
                    items: vec![line(&p, 5)],
                    adjustment_cents: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(stock_of(&db, &p.id).await, 15);
        assert_eq!(edited.items.len(), 1);
        assert_eq!(edited.sale.final_total_cents, 5000);
        let stored = db.sales().get_by_id(&sale.sale.id).await.unwrap().unwrap();
        assert_eq!(stored.sale.created_at, edited.sale.created_at);
        assert_eq!(stored.items[0].quantity, 5);
        assert_eq!(count(&db, "sale_items").await, 1);
        assert_eq!(reload_client(&db, &c.id).await.total_debt_cents, 5000);
        assert_debt_consistent(&db, &c.id).await;
    }

    #[tokio::test]
    async fn test_edit_keeps_adjustment_unless_overridden() {
        let (db, ledger) = setup(LedgerPolicy::default()).await;
        let p = product(&db, 1000, 0, false).await;

        let mut request = cash_sale(vec![line(&p, 2)]);
        request.adjustment_cents = 300;
        let sale = ledger.create_sale(&request).await.unwrap();

        let kept = ledger
            .update_sale(
                &sale.sale.id,
                &SaleUpdate {
                    items: vec![line(&p, 3)],
                    adjustment_cents: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(kept.sale.final_total_cents, 2700);
        assert_eq!(kept.sale.status, SaleStatus::Paid);

        let surcharged = ledger
            .update_sale(
                &sale.sale.id,
                &SaleUpdate {
                    items: vec![line(&p, 3)],
                    adjustment_cents: Some(-100),
                },
            )
            .await
            .unwrap();
        assert_eq!(surcharged.sale.final_total_cents, 3100);
    }

    #[tokio::test]
    async fn test_edit_resets_balance_by_default() {
        let (db, ledger) = setup(LedgerPolicy::default()).await;
        let c = client(&db, "Fabio").await;
        let p = product(&db, 1000, 0, false).await;

        let sale = credit_sale(&ledger, &c, &p, 3).await;
        ledger
            .apply_payment(&NewPayment {
                client_id: c.id.clone(),
                amount_cents: 1000,
            })
            .await
            .unwrap();

        let edited = ledger
            .update_sale(
                &sale.sale.id,
                &SaleUpdate {
                    items: vec![line(&p, 5)],
                    adjustment_cents: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(edited.sale.remaining_balance_cents, 5000);
        assert_eq!(edited.sale.status, SaleStatus::Open);
        assert_eq!(reload_client(&db, &c.id).await.total_debt_cents, 5000);
    }

    #[tokio::test]
    async fn test_edit_can_preserve_payments() {
        let policy = LedgerPolicy::default().edit_balance(EditBalancePolicy::PreservePayments);
        let (db, ledger) = setup(policy).await;
        let c = client(&db, "Gil").await;
        let p = product(&db, 1000, 0, false).await;

        let sale = credit_sale(&ledger, &c, &p, 3).await;
        ledger
            .apply_payment(&NewPayment {
                client_id: c.id.clone(),
                amount_cents: 1000,
            })
            .await
            .unwrap();

        let edited = ledger
            .update_sale(
                &sale.sale.id,
                &SaleUpdate {
                    items: vec![line(&p, 5)],
                    adjustment_cents: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(edited.sale.remaining_balance_cents, 4000);
        assert_eq!(edited.sale.status, SaleStatus::Partial);
        assert_debt_consistent(&db, &c.id).await;
    }

    #[tokio::test]
    async fn test_incremental_tracking_adds_total_delta() {
        let policy = LedgerPolicy::default().debt_tracking(DebtTracking::Incremental);
        let (db, ledger) = setup(policy).await;
        let c = client(&db, "Hana").await;
        let p = product(&db, 1000, 0, false).await;

        let sale = credit_sale(&ledger, &c, &p, 3).await;
        assert_eq!(reload_client(&db, &c.id).await.total_debt_cents, 3000);

        ledger
            .apply_payment(&NewPayment {
                client_id: c.id.clone(),
                amount_cents: 1000,
            })
            .await
            .unwrap();
        assert_eq!(reload_client(&db, &c.id).await.total_debt_cents, 2000);

        ledger
            .update_sale(
                &sale.sale.id,
                &SaleUpdate {
                    items: vec![line(&p, 5)],
                    adjustment_cents: None,
                },
            )
            .await
            .unwrap();

        // 2000 - 3000 + 5000, although the reset balance is 5000.
        assert_eq!(reload_client(&db, &c.id).await.total_debt_cents, 4000);
    }

    #[tokio::test]
    async fn test_edit_missing_sale() {
        let (db, ledger) = setup(LedgerPolicy::default()).await;
        let p = product(&db, 1000, 0, false).await;

        let err = ledger
            .update_sale(
                "missing",
                &SaleUpdate {
                    items: vec![line(&p, 1)],
                    adjustment_cents: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::NotFound { ref entity, .. } if entity == "Sale"));
    }

    #[tokio::test]
    async fn test_failed_edit_restores_sale_and_stock() {
        let (db, ledger) = setup(LedgerPolicy::default()).await;
        let c = client(&db, "Lia").await;
        let p = product(&db, 1000, 20, true).await;
        let sale = credit_sale(&ledger, &c, &p, 2).await;
        assert_eq!(stock_of(&db, &p.id).await, 18);

        // Fails after the old stock was reverted and the old items deleted.
        let mut ghost = line(&p, 1);
        ghost.product_id = "ghost".to_string();
        let err = ledger
            .update_sale(
                &sale.sale.id,
                &SaleUpdate {
                    items: vec![line(&p, 1), ghost],
                    adjustment_cents: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { ref entity, .. } if entity == "Product"));

        // Fails on the client debt write, the edit's last step.
        sqlx::query(&format!(
            "CREATE TRIGGER fail_client_write BEFORE UPDATE ON clients \
             WHEN NEW.id = '{}' BEGIN SELECT RAISE(ABORT, 'client write failed'); END",
            c.id
        ))
        .execute(db.pool())
        .await
        .unwrap();
        let err = ledger
            .update_sale(
                &sale.sale.id,
                &SaleUpdate {
                    items: vec![line(&p, 7)],
                    adjustment_cents: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::TransactionFailed(_)));

        assert_eq!(stock_of(&db, &p.id).await, 18);
        let stored = db.sales().get_by_id(&sale.sale.id).await.unwrap().unwrap();
        assert_eq!(stored.items.len(), 1);
        assert_eq!(stored.items[0].quantity, 2);
        assert_eq!(stored.sale.final_total_cents, 2000);
        assert_eq!(stored.sale.remaining_balance_cents, 2000);
        assert_eq!(count(&db, "sale_items").await, 1);
        assert_eq!(reload_client(&db, &c.id).await.total_debt_cents, 2000);
    }

    #[tokio::test]
    async fn test_out_of_range_amounts_are_rejected() {
        let (db, ledger) = setup(LedgerPolicy::default()).await;
        let c = client(&db, "Mara").await;
        let cheap = product(&db, 100, 0, false).await;
        let huge = product(&db, i64::MAX / 2, 0, false).await;

        let err = ledger
            .create_sale(&cash_sale(vec![line(&huge, 3)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Validation(CoreError::AmountOverflow { .. })
        ));

        let mut surcharge = cash_sale(vec![line(&cheap, 1)]);
        surcharge.adjustment_cents = i64::MIN;
        assert!(matches!(
            ledger.create_sale(&surcharge).await,
            Err(LedgerError::Validation(_))
        ));

        let sale = credit_sale(&ledger, &c, &cheap, 1).await;
        let err = ledger
            .update_sale(
                &sale.sale.id,
                &SaleUpdate {
                    items: vec![line(&cheap, 1)],
                    adjustment_cents: Some(i64::MIN),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        assert_eq!(count(&db, "sales").await, 1);
        let stored = db.sales().get_by_id(&sale.sale.id).await.unwrap().unwrap();
        assert_eq!(stored.sale.final_total_cents, 100);
        assert_eq!(reload_client(&db, &c.id).await.total_debt_cents, 100);
    }
}
