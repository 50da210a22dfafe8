//! # Debt Allocation
//!
//! ## Payment Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apply_payment(client, 60.00)                       one transaction    │
//! │                                                                         │
//! │  1. INSERT payment (used_credit = false)                               │
//! │  2. SELECT unpaid sales ORDER BY created_at, rowid                     │
//! │  3. plan_allocation → UPDATE each touched sale (balance, status)       │
//! │  4. credit += surplus                                                  │
//! │  5. total_debt = SUM(remaining) over unpaid sales                      │
//! │     last_interaction = now                                             │
//! │  COMMIT                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The payment path always recomputes debt from the sales table, whatever
//! the configured [`DebtTracking`](tally_core::DebtTracking).

use chrono::Utc;
use tally_core::validation::{validate_payment_amount, validate_required};
use tally_core::{CoreError, Money, NewPayment, PaymentRecord};
use tracing::info;
use uuid::Uuid;

use super::{debt, Ledger};
use crate::error::LedgerResult;
use crate::repository::{client, payment, sale};

impl Ledger {
    /// Records a payment and settles the client's open sales, oldest first.
    ///
    /// ## Errors
    /// - `Validation` - amount not positive or above `MAX_AMOUNT_CENTS`,
    ///   or the client's credit would overflow
    /// - `NotFound` - client doesn't exist
    /// - `TransactionFailed` - store failure; nothing was applied
    pub async fn apply_payment(&self, request: &NewPayment) -> LedgerResult<PaymentRecord> {
        validate_payment_amount(request.amount_cents)?;
        validate_required("client_id", &request.client_id)?;

        let amount = Money::from_cents(request.amount_cents);
        let now = Utc::now();

        let mut tx = self.begin_write().await?;

        let mut client = debt::load_client(&mut tx, &request.client_id).await?;

        let record = PaymentRecord {
            id: Uuid::new_v4().to_string(),
            client_id: client.id.clone(),
            amount_cents: amount.cents(),
            used_credit: false,
            created_at: now,
        };
        payment::insert_payment(&mut tx, &record).await?;

        let plan = debt::allocate(
            &mut tx,
            &client.id,
            amount,
            self.policy.settlement_tolerance,
            now,
        )
        .await?;

        client.credit_cents = client
            .credit()
            .checked_add(plan.surplus)
            .ok_or_else(|| CoreError::AmountOverflow {
                field: "client credit".to_string(),
            })?
            .cents();
        debt::recompute(&mut tx, &mut client).await?;
        client.last_interaction = Some(now);
        client.updated_at = now;
        client::update_balances(&mut tx, &client).await?;

        tx.commit().await?;

        info!(
            payment_id = %record.id,
            client_id = %client.id,
            amount = %amount,
            sales_touched = plan.allocations.len(),
            surplus = %plan.surplus,
            total_debt = %client.total_debt(),
            "Payment applied"
        );

        Ok(record)
    }

    /// Spends the client's prepaid credit on their open sales.
    ///
    /// Applies `min(credit, outstanding)` and records it as a payment with
    /// `used_credit = true`. Returns `None`, writing nothing, when the client
    /// has no credit or owes nothing.
    pub async fn apply_client_credit(&self, client_id: &str) -> LedgerResult<Option<PaymentRecord>> {
        let now = Utc::now();

        let mut tx = self.begin_write().await?;

        let mut client = debt::load_client(&mut tx, client_id).await?;
        let outstanding = sale::outstanding_for_client(&mut tx, client_id).await?;
        let amount = client.credit().min(outstanding);

        if !amount.is_positive() {
            return Ok(None);
        }

        let record = PaymentRecord {
            id: Uuid::new_v4().to_string(),
            client_id: client.id.clone(),
            amount_cents: amount.cents(),
            used_credit: true,
            created_at: now,
        };
        payment::insert_payment(&mut tx, &record).await?;

        let plan = debt::allocate(
            &mut tx,
            &client.id,
            amount,
            self.policy.settlement_tolerance,
            now,
        )
        .await?;

        client.credit_cents = (client.credit() - amount + plan.surplus).cents();
        debt::recompute(&mut tx, &mut client).await?;
        client.last_interaction = Some(now);
        client.updated_at = now;
        client::update_balances(&mut tx, &client).await?;

        tx.commit().await?;

        info!(
            payment_id = %record.id,
            client_id = %client.id,
            amount = %amount,
            credit_left = %client.credit(),
            "Client credit applied"
        );

        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use tally_core::{CoreError, LedgerPolicy, NewPayment, NewSale, SaleStatus, SaleType};
    use uuid::Uuid;

    use crate::ledger::test_support::*;
    use crate::{Database, DbConfig, LedgerError};

    fn pay(client_id: &str, amount_cents: i64) -> NewPayment {
        NewPayment {
            client_id: client_id.to_string(),
            amount_cents,
        }
    }

    #[tokio::test]
    async fn test_fifo_settles_older_sale_first() {
        let (db, ledger) = setup(LedgerPolicy::default()).await;
        let client = client(&db, "Ana").await;
        let p = product(&db, 1000, 0, false).await;

        // S1 is backdated so it is unambiguously older.
        let s1 = ledger
            .create_sale(&NewSale {
                client_id: Some(client.id.clone()),
                sale_type: SaleType::Credit,
                items: vec![line(&p, 5)],
                adjustment_cents: 0,
                sold_at: Some(Utc::now() - Duration::days(2)),
            })
            .await
            .unwrap();
        let s2 = credit_sale(&ledger, &client, &p, 3).await;

        ledger.apply_payment(&pay(&client.id, 6000)).await.unwrap();

        let s1 = db.sales().get_by_id(&s1.sale.id).await.unwrap().unwrap().sale;
        let s2 = db.sales().get_by_id(&s2.sale.id).await.unwrap().unwrap().sale;
        assert_eq!(s1.status, SaleStatus::Paid);
        assert_eq!(s1.remaining_balance_cents, 0);
        assert_eq!(s2.status, SaleStatus::Partial);
        assert_eq!(s2.remaining_balance_cents, 2000);

        let client = reload_client(&db, &client.id).await;
        assert_eq!(client.credit_cents, 0);
        assert_eq!(client.total_debt_cents, 2000);
        assert!(client.last_interaction.is_some());
        assert_debt_consistent(&db, &client.id).await;
    }

    #[tokio::test]
    async fn test_overpayment_becomes_credit() {
        let (db, ledger) = setup(LedgerPolicy::default()).await;
        let client = client(&db, "Bruno").await;
        let p = product(&db, 4000, 0, false).await;
        let sale = credit_sale(&ledger, &client, &p, 1).await;

        let record = ledger.apply_payment(&pay(&client.id, 10000)).await.unwrap();
        assert_eq!(record.amount_cents, 10000);
        assert!(!record.used_credit);

        let sale = db.sales().get_by_id(&sale.sale.id).await.unwrap().unwrap().sale;
        assert_eq!(sale.status, SaleStatus::Paid);

        let client = reload_client(&db, &client.id).await;
        assert_eq!(client.credit_cents, 6000);
        assert_eq!(client.total_debt_cents, 0);
    }

    #[tokio::test]
    async fn test_payment_without_open_sales_is_all_credit() {
        let (db, ledger) = setup(LedgerPolicy::default()).await;
        let client = client(&db, "Caio").await;

        ledger.apply_payment(&pay(&client.id, 2500)).await.unwrap();

        let client = reload_client(&db, &client.id).await;
        assert_eq!(client.credit_cents, 2500);
        assert_eq!(db.payments().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_credit_sale_then_full_payment() {
        let (db, ledger) = setup(LedgerPolicy::default()).await;
        let client = client(&db, "Dora").await;
        let p = product(&db, 20000, 0, false).await;

        let sale = credit_sale(&ledger, &client, &p, 1).await;
        assert_eq!(sale.sale.status, SaleStatus::Open);
        assert_eq!(reload_client(&db, &client.id).await.total_debt_cents, 20000);

        ledger.apply_payment(&pay(&client.id, 20000)).await.unwrap();

        let sale = db.sales().get_by_id(&sale.sale.id).await.unwrap().unwrap().sale;
        assert_eq!(sale.status, SaleStatus::Paid);
        assert_eq!(reload_client(&db, &client.id).await.total_debt_cents, 0);
    }

    #[tokio::test]
    async fn test_rejects_bad_payments_without_writing() {
        let (db, ledger) = setup(LedgerPolicy::default()).await;
        let client = client(&db, "Eva").await;

        let err = ledger.apply_payment(&pay(&client.id, 0)).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        let err = ledger
            .apply_payment(&pay("00000000-0000-4000-8000-000000000000", 100))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));

        assert!(db.payments().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_apply_client_credit() {
        let (db, ledger) = setup(LedgerPolicy::default()).await;
        let client = client(&db, "Fabio").await;
        let p = product(&db, 3000, 0, false).await;

        // Nothing to apply yet.
        assert!(ledger.apply_client_credit(&client.id).await.unwrap().is_none());

        ledger.apply_payment(&pay(&client.id, 5000)).await.unwrap();
        let sale = credit_sale(&ledger, &client, &p, 1).await;

        let record = ledger
            .apply_client_credit(&client.id)
            .await
            .unwrap()
            .unwrap();
        assert!(record.used_credit);
        assert_eq!(record.amount_cents, 3000);

        let sale = db.sales().get_by_id(&sale.sale.id).await.unwrap().unwrap().sale;
        assert_eq!(sale.status, SaleStatus::Paid);

        let client = reload_client(&db, &client.id).await;
        assert_eq!(client.credit_cents, 2000);
        assert_eq!(client.total_debt_cents, 0);

        // Owes nothing now.
        assert!(ledger.apply_client_credit(&client.id).await.unwrap().is_none());

        let summary = db.reports().ledger_summary().await.unwrap();
        assert_eq!(summary.payments_received_cents, 5000);
        assert_eq!(summary.client_credit_cents, 2000);
    }

    #[tokio::test]
    async fn test_statement_lists_open_sales_in_payment_order() {
        let (db, ledger) = setup(LedgerPolicy::default()).await;
        let client = client(&db, "Gil").await;
        let p = product(&db, 1000, 0, false).await;

        let newer = credit_sale(&ledger, &client, &p, 1).await;
        let older = ledger
            .create_sale(&NewSale {
                client_id: Some(client.id.clone()),
                sale_type: SaleType::Credit,
                items: vec![line(&p, 2)],
                adjustment_cents: 0,
                sold_at: Some(Utc::now() - Duration::days(7)),
            })
            .await
            .unwrap();
        ledger.apply_payment(&pay(&client.id, 500)).await.unwrap();

        let statement = db.clients().statement(&client.id).await.unwrap();
        let ids: Vec<_> = statement.open_sales.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, [older.sale.id.as_str(), newer.sale.id.as_str()]);
        assert_eq!(statement.open_sales[0].remaining_balance_cents, 1500);
        assert_eq!(statement.payments.len(), 1);
        assert_eq!(statement.client.total_debt_cents, 2500);
    }

    #[tokio::test]
    async fn test_settled_sale_keeps_stranded_cent_out_of_debt() {
        let (db, ledger) = setup(LedgerPolicy::default()).await;
        let client = client(&db, "Hana").await;
        let p = product(&db, 1000, 0, false).await;
        let sale = credit_sale(&ledger, &client, &p, 1).await;

        ledger.apply_payment(&pay(&client.id, 999)).await.unwrap();

        let sale = db.sales().get_by_id(&sale.sale.id).await.unwrap().unwrap().sale;
        assert_eq!(sale.status, SaleStatus::Paid);
        assert_eq!(sale.remaining_balance_cents, 1);

        let client = reload_client(&db, &client.id).await;
        assert_eq!(client.total_debt_cents, 0);
        assert_eq!(client.credit_cents, 0);
        assert_debt_consistent(&db, &client.id).await;

        let summary = db.reports().ledger_summary().await.unwrap();
        assert_eq!(summary.outstanding_cents, 0);
    }

    #[tokio::test]
    async fn test_failed_client_write_rolls_back_payment() {
        let (db, ledger) = setup(LedgerPolicy::default()).await;
        let client = client(&db, "Ines").await;
        let p = product(&db, 5000, 0, false).await;
        let sale = credit_sale(&ledger, &client, &p, 1).await;

        // Fails the last write of the payment, after the sale balance moved.
        sqlx::query(&format!(
            "CREATE TRIGGER fail_client_write BEFORE UPDATE ON clients \
             WHEN NEW.id = '{}' BEGIN SELECT RAISE(ABORT, 'client write failed'); END",
            client.id
        ))
        .execute(db.pool())
        .await
        .unwrap();

        let err = ledger.apply_payment(&pay(&client.id, 2000)).await.unwrap_err();
        assert!(matches!(err, LedgerError::TransactionFailed(_)));

        let sale = db.sales().get_by_id(&sale.sale.id).await.unwrap().unwrap().sale;
        assert_eq!(sale.remaining_balance_cents, 5000);
        assert_eq!(sale.status, SaleStatus::Open);
        assert!(db.payments().list().await.unwrap().is_empty());

        let client = reload_client(&db, &client.id).await;
        assert_eq!(client.total_debt_cents, 5000);
        assert_eq!(client.credit_cents, 0);
    }

    #[tokio::test]
    async fn test_amounts_out_of_range_are_rejected() {
        let (db, ledger) = setup(LedgerPolicy::default()).await;
        let client = client(&db, "Joao").await;

        let err = ledger.apply_payment(&pay(&client.id, i64::MAX)).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        sqlx::query("UPDATE clients SET credit_cents = ?1 WHERE id = ?2")
            .bind(i64::MAX - 10)
            .bind(&client.id)
            .execute(db.pool())
            .await
            .unwrap();

        let err = ledger.apply_payment(&pay(&client.id, 100)).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Validation(CoreError::AmountOverflow { .. })
        ));
        assert!(db.payments().list().await.unwrap().is_empty());
        assert_eq!(reload_client(&db, &client.id).await.credit_cents, i64::MAX - 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_payments_on_file_database() {
        let path = std::env::temp_dir().join(format!("tally-concurrency-{}.db", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(5))
            .await
            .unwrap();
        let ledger = db.ledger(LedgerPolicy::default());

        let mut clients = Vec::new();
        for n in 0..8 {
            clients.push(client(&db, &format!("Client {n}")).await);
        }

        let handles: Vec<_> = clients
            .iter()
            .map(|c| {
                let ledger = ledger.clone();
                let request = pay(&c.id, 100);
                tokio::spawn(async move { ledger.apply_payment(&request).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(db.payments().list().await.unwrap().len(), 8);
        for c in &clients {
            assert_eq!(reload_client(&db, &c.id).await.credit_cents, 100);
        }

        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
