//! # Payment Repository
//!
//! Payment records are append-only. The only writer is the ledger, through
//! [`insert_payment`]; this repository reads them back.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tally_core::PaymentRecord;

const PAYMENT_COLUMNS: &str = "id, client_id, amount_cents, used_credit, created_at";

#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// Every payment, newest first.
    pub async fn list(&self) -> DbResult<Vec<PaymentRecord>> {
        let payments = sqlx::query_as::<_, PaymentRecord>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    pub async fn list_for_client(&self, client_id: &str) -> DbResult<Vec<PaymentRecord>> {
        let mut conn = self.pool.acquire().await?;
        payments_for_client(&mut conn, client_id).await
    }
}

pub(crate) async fn payments_for_client(
    conn: &mut SqliteConnection,
    client_id: &str,
) -> DbResult<Vec<PaymentRecord>> {
    let payments = sqlx::query_as::<_, PaymentRecord>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments \
         WHERE client_id = ?1 \
         ORDER BY created_at DESC, rowid DESC"
    ))
    .bind(client_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(payments)
}

pub(crate) async fn insert_payment(conn: &mut SqliteConnection, payment: &PaymentRecord) -> DbResult<()> {
    debug!(
        id = %payment.id,
        client_id = %payment.client_id,
        amount_cents = payment.amount_cents,
        used_credit = payment.used_credit,
        "Recording payment"
    );

    sqlx::query(
        r#"
        INSERT INTO payments (id, client_id, amount_cents, used_credit, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.client_id)
    .bind(payment.amount_cents)
    .bind(payment.used_credit)
    .bind(payment.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
