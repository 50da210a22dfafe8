//! # Allocation
//!
//! The pure half of the debt ledger: how a payment spreads over open sales,
//! and how a sale's totals and opening balance are computed.
//!
//! ## FIFO Allocation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Payment: $60                                                           │
//! │                                                                         │
//! │  Open sales, oldest first:                                              │
//! │    S1  remaining $50  ──► pay $50 ──► remaining $0   PAID               │
//! │    S2  remaining $30  ──► pay $10 ──► remaining $20  PARTIAL            │
//! │    S3  remaining $15  ──► (payment exhausted, untouched)                │
//! │                                                                         │
//! │  Surplus: $0  (anything left after the last sale becomes client credit) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store executes the plan; nothing here knows about transactions.

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Sale, SaleStatus, SaleType};

// =============================================================================
// FIFO Plan
// =============================================================================

/// An unpaid sale as seen by the allocator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenBalance {
    pub sale_id: String,
    pub remaining: Money,
    pub final_total: Money,
}

impl OpenBalance {
    pub fn new(sale_id: impl Into<String>, remaining: Money, final_total: Money) -> Self {
        OpenBalance {
            sale_id: sale_id.into(),
            remaining,
            final_total,
        }
    }
}

impl From<&Sale> for OpenBalance {
    fn from(sale: &Sale) -> Self {
        OpenBalance::new(sale.id.clone(), sale.remaining_balance(), sale.final_total())
    }
}

/// What the payment does to one sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub sale_id: String,
    pub applied: Money,
    pub new_balance: Money,
    pub new_status: SaleStatus,
}

/// The full effect of a payment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AllocationPlan {
    /// One entry per sale touched, in payment order.
    pub allocations: Vec<Allocation>,
    /// Part of the payment left after every open sale was settled.
    pub surplus: Money,
}

impl AllocationPlan {
    /// Total applied to sales.
    pub fn applied(&self) -> Money {
        self.allocations.iter().map(|a| a.applied).sum()
    }
}

/// Spreads `amount` over `open` in the given order (callers pass oldest
/// first).
///
/// Stops as soon as the payment is used up; a payment exactly equal to a
/// sale's balance settles that sale and touches nothing after it.
///
/// ## Example
/// ```rust
/// use tally_core::allocation::{plan_allocation, OpenBalance};
/// use tally_core::{Money, SaleStatus};
///
/// let open = vec![OpenBalance::new("s1", Money::from_cents(4000), Money::from_cents(4000))];
/// let plan = plan_allocation(&open, Money::from_cents(10000), Money::from_cents(1));
///
/// assert_eq!(plan.allocations[0].new_status, SaleStatus::Paid);
/// assert_eq!(plan.surplus.cents(), 6000);
/// ```
pub fn plan_allocation(open: &[OpenBalance], amount: Money, tolerance: Money) -> AllocationPlan {
    let mut left = amount;
    let mut allocations = Vec::new();

    for sale in open {
        if left <= Money::zero() {
            break;
        }

        let pay = sale.remaining.min(left).non_negative();
        let new_balance = sale.remaining - pay;
        let new_status = if new_balance <= tolerance {
            SaleStatus::Paid
        } else {
            SaleStatus::Partial
        };

        allocations.push(Allocation {
            sale_id: sale.sale_id.clone(),
            applied: pay,
            new_balance,
            new_status,
        });

        left -= pay;
    }

    AllocationPlan {
        allocations,
        surplus: left.non_negative(),
    }
}

// =============================================================================
// Sale Totals
// =============================================================================

/// Totals of a sale computed from its lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub adjustment: Money,
    pub final_total: Money,
}

impl SaleTotals {
    /// `final = subtotal - adjustment`. A positive adjustment is a discount,
    /// a negative one a surcharge.
    ///
    /// ## Errors
    /// - `CoreError::NegativeTotal` when the discount exceeds the subtotal
    /// - `CoreError::AmountOverflow` when a total leaves the `i64` range
    pub fn compute<I>(line_totals: I, adjustment: Money) -> CoreResult<Self>
    where
        I: IntoIterator<Item = Money>,
    {
        let subtotal = line_totals
            .into_iter()
            .try_fold(Money::zero(), |acc, line| acc.checked_add(line))
            .ok_or_else(|| CoreError::AmountOverflow {
                field: "subtotal".to_string(),
            })?;
        let final_total = subtotal
            .checked_sub(adjustment)
            .ok_or_else(|| CoreError::AmountOverflow {
                field: "final total".to_string(),
            })?;

        if final_total.is_negative() {
            return Err(CoreError::NegativeTotal {
                subtotal_cents: subtotal.cents(),
                adjustment_cents: adjustment.cents(),
            });
        }

        Ok(SaleTotals {
            subtotal,
            adjustment,
            final_total,
        })
    }

    /// Balance a freshly recorded sale starts with.
    pub fn opening_balance(&self, sale_type: SaleType) -> Money {
        match sale_type {
            SaleType::Credit => self.final_total,
            SaleType::Cash => Money::zero(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
