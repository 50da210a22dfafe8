//! # tally-db: Store and Ledger for Tally
//!
//! SQLite storage through sqlx, and the ledger engines that keep sales,
//! payments, stock and client balances consistent with each other.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally Data Flow                                │
//! │                                                                         │
//! │  REST handler (POST /api/payments)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │    Ledger     │    │ Repositories │   │   │
//! │  │   │   (pool.rs)   │───►│  payments     │───►│ client, sale │   │   │
//! │  │   │               │    │  sales, stock │    │ product, ... │   │   │
//! │  │   │  SqlitePool   │    │  one tx each  │    │  SQL only    │   │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL, foreign keys on, embedded migrations)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - `DbError` and `LedgerError`
//! - [`repository`] - Reads and plain CRUD
//! - [`ledger`] - Transactional payment, sale and stock operations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_core::{LedgerPolicy, NewPayment};
//! use tally_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./tally.db")).await?;
//!
//! let clients = db.clients().list().await?;
//! let record = db
//!     .ledger(LedgerPolicy::default())
//!     .apply_payment(&NewPayment { client_id: clients[0].id.clone(), amount_cents: 6000 })
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, LedgerError, LedgerResult};
pub use ledger::Ledger;
pub use pool::{Database, DbConfig};

pub use repository::client::ClientRepository;
pub use repository::payment::PaymentRepository;
pub use repository::product::ProductRepository;
pub use repository::report::ReportRepository;
pub use repository::sale::SaleRepository;
