//! # Report Repository
//!
//! Aggregates for the analysis screen. Read-only.

use sqlx::SqlitePool;

use crate::error::DbResult;
use tally_core::LedgerSummary;

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Sales by type, receivables, prepaid credit and money received.
    ///
    /// Payments funded from credit are not counted as received: that money
    /// was already counted when the overpayment came in.
    pub async fn ledger_summary(&self) -> DbResult<LedgerSummary> {
        let (sale_count, cash_sales_cents, credit_sales_cents, outstanding_cents): (
            i64,
            i64,
            i64,
            i64,
        ) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN sale_type = 'cash' THEN final_total_cents END), 0),
                COALESCE(SUM(CASE WHEN sale_type = 'credit' THEN final_total_cents END), 0),
                COALESCE(SUM(CASE WHEN status != 'paid' THEN remaining_balance_cents END), 0)
            FROM sales
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let client_credit_cents: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(credit_cents), 0) FROM clients")
                .fetch_one(&self.pool)
                .await?;

        let payments_received_cents: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM payments WHERE used_credit = 0",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(LedgerSummary {
            sale_count,
            cash_sales_cents,
            credit_sales_cents,
            outstanding_cents,
            client_credit_cents,
            payments_received_cents,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_empty_summary_is_zero() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let summary = db.reports().ledger_summary().await.unwrap();
        assert_eq!(summary, Default::default());
    }
}
