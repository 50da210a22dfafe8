//! # Domain Types
//!
//! Core domain types used throughout Tally.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Client      │   │      Sale       │   │  PaymentRecord  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  credit_cents   │◄──│  client_id?     │   │  client_id (FK) │       │
//! │  │  total_debt     │   │  sale_type      │   │  amount_cents   │       │
//! │  │  (derived)      │   │  remaining      │   │  used_credit    │       │
//! │  └─────────────────┘   │  status         │   └─────────────────┘       │
//! │                        └────────┬────────┘                              │
//! │  ┌─────────────────┐            │ owns                                  │
//! │  │    Product      │   ┌────────▼────────┐                              │
//! │  │  stock          │◄──│    SaleItem     │                              │
//! │  │  track_stock    │   │  name_snapshot  │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A payment never points at the sales it settled. Allocation is recomputed
//! from open balances every time a payment arrives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Client
// =============================================================================

/// A customer who can buy on credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,

    /// Prepaid surplus left over from overpayments. Never negative.
    pub credit_cents: i64,

    /// Sum of remaining balances over this client's unpaid sales.
    /// Always recomputed from sales, never edited directly.
    pub total_debt_cents: i64,

    #[ts(as = "Option<String>")]
    pub last_interaction: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Client {
    #[inline]
    pub fn credit(&self) -> Money {
        Money::from_cents(self.credit_cents)
    }

    #[inline]
    pub fn total_debt(&self) -> Money {
        Money::from_cents(self.total_debt_cents)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,

    /// Default selling price in cents.
    pub price_cents: i64,

    /// Cost in cents (for margin reporting).
    pub cost_cents: i64,

    /// Units on hand. Only meaningful when `track_stock` is set, and allowed
    /// to go negative (overselling is not blocked).
    pub stock: i64,

    /// Whether sales adjust `stock`.
    pub track_stock: bool,

    pub category: Option<String>,

    /// False once deleted. Old sale items keep pointing at the row.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Sale Type / Status
// =============================================================================

/// How a sale is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleType {
    /// Paid on the spot; never carries a balance.
    Cash,
    /// Owed by the client until payments settle it.
    Credit,
}

/// Settlement status of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Nothing paid yet.
    Open,
    /// Some, but not all, of the balance paid.
    Partial,
    /// Balance within tolerance of zero.
    Paid,
}

impl SaleStatus {
    /// Derives the status of a balance.
    ///
    /// ```text
    /// remaining <= tolerance          → Paid
    /// remaining >= final_total        → Open
    /// otherwise                       → Partial
    /// ```
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::{Money, SaleStatus};
    ///
    /// let tol = Money::from_cents(1);
    /// let total = Money::from_cents(2000);
    /// assert_eq!(SaleStatus::for_balance(Money::from_cents(2000), total, tol), SaleStatus::Open);
    /// assert_eq!(SaleStatus::for_balance(Money::from_cents(500), total, tol), SaleStatus::Partial);
    /// assert_eq!(SaleStatus::for_balance(Money::from_cents(1), total, tol), SaleStatus::Paid);
    /// ```
    pub fn for_balance(remaining: Money, final_total: Money, tolerance: Money) -> Self {
        if remaining <= tolerance {
            SaleStatus::Paid
        } else if remaining >= final_total {
            SaleStatus::Open
        } else {
            SaleStatus::Partial
        }
    }

    /// Lowercase name as stored in the database.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Open => "open",
            SaleStatus::Partial => "partial",
            SaleStatus::Paid => "paid",
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub client_id: Option<String>,
    pub sale_type: SaleType,

    /// Sum of line totals.
    pub subtotal_cents: i64,

    /// Subtracted from the subtotal: positive is a discount, negative a
    /// surcharge.
    pub adjustment_cents: i64,

    /// `subtotal_cents - adjustment_cents`, never negative.
    pub final_total_cents: i64,

    /// Still owed. Zero for cash sales, within `[0, final_total_cents]`.
    pub remaining_balance_cents: i64,

    pub status: SaleStatus,

    /// When the sale happened. Oldest sales are paid first.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn final_total(&self) -> Money {
        Money::from_cents(self.final_total_cents)
    }

    #[inline]
    pub fn remaining_balance(&self) -> Money {
        Money::from_cents(self.remaining_balance_cents)
    }

    #[inline]
    pub fn is_credit(&self) -> bool {
        self.sale_type == SaleType::Credit
    }

    /// Amount already paid against this sale.
    #[inline]
    pub fn paid(&self) -> Money {
        self.final_total() - self.remaining_balance()
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line of a sale. Product name is frozen at the time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub name_snapshot: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// `unit_price_cents × quantity`.
    pub line_total_cents: i64,
}

impl SaleItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

/// A sale with its items, the shape returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

// =============================================================================
// Payment Record
// =============================================================================

/// Money received from a client. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PaymentRecord {
    pub id: String,
    pub client_id: String,
    pub amount_cents: i64,
    /// True when the payment was funded from the client's prepaid credit.
    pub used_credit: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl PaymentRecord {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Input for creating a client.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewClient {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Editable client fields. Balances are owned by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClientUpdate {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Input for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub price_cents: i64,
    #[serde(default)]
    pub cost_cents: i64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub track_stock: bool,
    #[serde(default)]
    pub category: Option<String>,
}

/// Full replacement of a product's editable fields.
pub type ProductUpdate = NewProduct;

/// One line of a sale request.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSaleItem {
    pub product_id: String,
    pub quantity: i64,
    /// Price charged per unit. Defaults to the product's current price.
    #[serde(default)]
    pub unit_price_cents: Option<i64>,
}

/// Input for recording a sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSale {
    #[serde(default)]
    pub client_id: Option<String>,
    pub sale_type: SaleType,
    pub items: Vec<NewSaleItem>,
    #[serde(default)]
    pub adjustment_cents: i64,
    /// Backdates the sale. Defaults to now.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub sold_at: Option<DateTime<Utc>>,
}

/// Input for editing a sale: its items are replaced wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleUpdate {
    pub items: Vec<NewSaleItem>,
    /// New adjustment; keeps the old one when absent.
    #[serde(default)]
    pub adjustment_cents: Option<i64>,
}

/// Input for recording a payment.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewPayment {
    pub client_id: String,
    pub amount_cents: i64,
}

// =============================================================================
// Read Models
// =============================================================================

/// Everything the client detail screen shows.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClientStatement {
    pub client: Client,
    /// Unpaid sales, oldest first (the order payments settle them).
    pub open_sales: Vec<Sale>,
    /// Payments, newest first.
    pub payments: Vec<PaymentRecord>,
}

/// Totals for the analysis screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LedgerSummary {
    pub sale_count: i64,
    pub cash_sales_cents: i64,
    pub credit_sales_cents: i64,
    /// Sum of remaining balances over unpaid sales.
    pub outstanding_cents: i64,
    /// Prepaid credit held for clients.
    pub client_credit_cents: i64,
    /// Payments received in money (excludes credit applications).
    pub payments_received_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
