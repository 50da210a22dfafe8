//! # tally-core: Pure Business Logic for Tally
//!
//! Domain types and the pure half of the debt ledger. Everything here is
//! deterministic and free of I/O; `tally-db` runs these rules inside
//! database transactions.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/api (REST, axum)                        │   │
//! │  │   /api/sales, /api/payments, /api/clients, /api/products       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db (Store + Ledger)                    │   │
//! │  │      repositories, transactions, stock/debt/sale engines        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ allocation │  │ validation│  │   │
//! │  │   │  Client   │  │   Money   │  │ FIFO plan  │  │   rules   │  │   │
//! │  │   │   Sale    │  │           │  │ SaleTotals │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Client, Product, Sale, PaymentRecord)
//! - [`money`] - Integer-cent money type
//! - [`allocation`] - FIFO payment planning and sale totals
//! - [`policy`] - Ledger behaviour switches
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::allocation::{plan_allocation, OpenBalance};
//! use tally_core::money::Money;
//!
//! let open = vec![
//!     OpenBalance::new("older", Money::from_cents(5000), Money::from_cents(5000)),
//!     OpenBalance::new("newer", Money::from_cents(3000), Money::from_cents(3000)),
//! ];
//! let plan = plan_allocation(&open, Money::from_cents(6000), Money::from_cents(1));
//!
//! assert_eq!(plan.allocations[0].new_balance.cents(), 0);
//! assert_eq!(plan.allocations[1].new_balance.cents(), 2000);
//! assert!(plan.surplus.is_zero());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocation;
pub mod error;
pub mod money;
pub mod policy;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use policy::{DebtTracking, EditBalancePolicy, LedgerPolicy};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Remaining balance (in cents) at or below which a sale counts as paid.
///
/// Absorbs the odd cent lost when a discount or split payment rounds.
/// A settled sale keeps that cent as `remaining_balance_cents` on record;
/// it is no longer counted in client debt or outstanding receivables.
pub const SETTLEMENT_TOLERANCE_CENTS: i64 = 1;

/// Largest price, adjustment or payment accepted, in cents ($10 billion).
///
/// With [`MAX_ITEM_QUANTITY`] and [`MAX_SALE_ITEMS`] this keeps every sale
/// total well inside `i64`.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_000;

/// Maximum line items allowed in a single sale.
pub const MAX_SALE_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;
