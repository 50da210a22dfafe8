//! # Ledger Policy
//!
//! Switches for the two ledger behaviours that need a product decision.
//!
//! ## Debt Tracking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Payment path:   debt = SUM(remaining) over unpaid sales   (always)     │
//! │                                                                         │
//! │  Sale create/edit:                                                      │
//! │    Recompute    debt = SUM(remaining) over unpaid sales    (default)    │
//! │    Incremental  debt += new final total, -= old final total             │
//! │                                                                         │
//! │  Incremental drifts once an edited sale had partial payments: the      │
//! │  revert subtracts the full old total, not what was still owed.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Edit Balance
//! Editing a credit sale either resets its balance to the new total (the
//! historical behaviour, which forgets payments already applied to it) or
//! keeps the already-paid amount applied to the new total.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::Money;
use crate::SETTLEMENT_TOLERANCE_CENTS;

/// How sale create/edit keep `Client.total_debt_cents` up to date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtTracking {
    /// Re-sum open balances after every write.
    #[default]
    Recompute,
    /// Add/subtract final totals.
    Incremental,
}

impl FromStr for DebtTracking {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "recompute" => Ok(DebtTracking::Recompute),
            "incremental" => Ok(DebtTracking::Incremental),
            _ => Err(ValidationError::NotAllowed {
                field: "debt_tracking".to_string(),
                allowed: vec!["recompute".to_string(), "incremental".to_string()],
            }),
        }
    }
}

/// What happens to a credit sale's balance when its items are edited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditBalancePolicy {
    /// Balance becomes the new final total.
    #[default]
    Reset,
    /// Balance becomes `new_total - already_paid`, floored at zero.
    PreservePayments,
}

impl EditBalancePolicy {
    /// Balance of an edited credit sale.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::{EditBalancePolicy, Money};
    ///
    /// let paid = Money::from_cents(3000);
    /// let new_total = Money::from_cents(8000);
    ///
    /// assert_eq!(EditBalancePolicy::Reset.edited_balance(new_total, paid).cents(), 8000);
    /// assert_eq!(EditBalancePolicy::PreservePayments.edited_balance(new_total, paid).cents(), 5000);
    /// ```
    pub fn edited_balance(&self, new_total: Money, already_paid: Money) -> Money {
        match self {
            EditBalancePolicy::Reset => new_total,
            EditBalancePolicy::PreservePayments => (new_total - already_paid).non_negative(),
        }
    }
}

impl FromStr for EditBalancePolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reset" => Ok(EditBalancePolicy::Reset),
            "preserve_payments" | "preserve-payments" => Ok(EditBalancePolicy::PreservePayments),
            _ => Err(ValidationError::NotAllowed {
                field: "edit_balance_policy".to_string(),
                allowed: vec!["reset".to_string(), "preserve_payments".to_string()],
            }),
        }
    }
}

/// Ledger behaviour, passed to the ledger engines at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerPolicy {
    /// Balances at or below this count as paid.
    pub settlement_tolerance: Money,
    pub debt_tracking: DebtTracking,
    pub edit_balance: EditBalancePolicy,
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        LedgerPolicy {
            settlement_tolerance: Money::from_cents(SETTLEMENT_TOLERANCE_CENTS),
            debt_tracking: DebtTracking::default(),
            edit_balance: EditBalancePolicy::default(),
        }
    }
}

impl LedgerPolicy {
    pub fn debt_tracking(mut self, tracking: DebtTracking) -> Self {
        self.debt_tracking = tracking;
        self
    }

    pub fn edit_balance(mut self, policy: EditBalancePolicy) -> Self {
        self.edit_balance = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = LedgerPolicy::default();
        assert_eq!(policy.settlement_tolerance.cents(), 1);
        assert_eq!(policy.debt_tracking, DebtTracking::Recompute);
        assert_eq!(policy.edit_balance, EditBalancePolicy::Reset);
    }

    #[test]
    fn test_parse() {
        assert_eq!("Incremental".parse::<DebtTracking>().unwrap(), DebtTracking::Incremental);
        assert_eq!(
            " preserve-payments ".parse::<EditBalancePolicy>().unwrap(),
            EditBalancePolicy::PreservePayments
        );
        assert!("sometimes".parse::<DebtTracking>().is_err());
        assert!("".parse::<EditBalancePolicy>().is_err());
    }

    #[test]
    fn test_preserve_payments_floors_at_zero() {
        let balance = EditBalancePolicy::PreservePayments
            .edited_balance(Money::from_cents(1000), Money::from_cents(2500));
        assert!(balance.is_zero());
    }
}
