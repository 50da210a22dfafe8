//! # Ledger
//!
//! Every operation that moves money or stock runs here, inside exactly one
//! database transaction.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apply_payment        record payment → FIFO over open sales            │
//! │                       → surplus to credit → recompute client debt      │
//! │                                                                         │
//! │  apply_client_credit  same FIFO, funded from the client's credit       │
//! │                                                                         │
//! │  create_sale          insert sale + items → decrement stock            │
//! │                       → CREDIT: client debt, last_interaction          │
//! │                                                                         │
//! │  update_sale          revert old stock + debt → replace items          │
//! │                       → recompute totals → reapply stock + debt        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Atomicity
//! Each operation opens its transaction with `BEGIN IMMEDIATE` and commits
//! as its last step. Taking the write lock up front means concurrent
//! writers queue on the busy timeout instead of failing when a read lock
//! can't be upgraded. Any `?` before the commit drops the transaction,
//! which rolls it back: a failed sale leaves no sale row, no items and no
//! stock change behind. Nothing here retries.

mod debt;
mod payment;
mod sale;
pub mod stock;

use sqlx::{Sqlite, SqlitePool, Transaction};
use tally_core::LedgerPolicy;

use crate::error::LedgerResult;

/// The debt/credit ledger.
///
/// ## Usage
/// ```rust,ignore
/// let ledger = db.ledger(LedgerPolicy::default());
///
/// let sale = ledger.create_sale(&new_sale).await?;
/// let record = ledger.apply_payment(&NewPayment {
///     client_id: sale.sale.client_id.clone().unwrap(),
///     amount_cents: 5000,
/// }).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Ledger {
    pool: SqlitePool,
    policy: LedgerPolicy,
}

impl Ledger {
    pub fn new(pool: SqlitePool, policy: LedgerPolicy) -> Self {
        Ledger { pool, policy }
    }

    pub fn policy(&self) -> &LedgerPolicy {
        &self.policy
    }

    /// Opens a transaction that already holds the database write lock.
    async fn begin_write(&self) -> LedgerResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }
}
