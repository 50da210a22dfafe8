//! # Repository Module
//!
//! Database repository implementations for Tally.
//!
//! ## Two Kinds of Access
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  API handler                                                           │
//! │       │                                                                 │
//! │       ├── db.clients().list()            Repository method             │
//! │       │       └── acquires a pooled connection, one statement group    │
//! │       │                                                                 │
//! │       └── db.ledger(policy).apply_payment(..)                          │
//! │               └── pool.begin()                                         │
//! │                     ├── client::fetch_client(&mut *tx, ..)   ┐         │
//! │                     ├── payment::insert_payment(&mut *tx, ..)│ free    │
//! │                     ├── sale::set_balance(&mut *tx, ..)      │ fns     │
//! │                     └── client::update_balances(&mut *tx, ..)┘         │
//! │                   commit                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Free functions take `&mut SqliteConnection` so the same SQL runs on a
//! pooled connection or inside a transaction.
//!
//! ## Available Repositories
//!
//! - [`ClientRepository`](client::ClientRepository) - Clients and statements
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD, soft delete
//! - [`SaleRepository`](sale::SaleRepository) - Sales with items
//! - [`PaymentRepository`](payment::PaymentRepository) - Payment history
//! - [`ReportRepository`](report::ReportRepository) - Ledger summary

pub mod client;
pub mod payment;
pub mod product;
pub mod report;
pub mod sale;
