//! # Tally API
//!
//! REST server for the sales manager.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           API Server                                    │
//! │                                                                         │
//! │  HTTP ──► TraceLayer ──► CorsLayer ──► /api router                     │
//! │                                            │                            │
//! │                    ┌───────────────────────┼──────────────────┐        │
//! │                    ▼                       ▼                  ▼        │
//! │            Repositories (reads,     Ledger (sales,      ReportRepository│
//! │            client/product CRUD)     payments, credit)   (summary)      │
//! │                    │                       │                  │        │
//! │                    └───────────────────────┴──────────────────┘        │
//! │                                            │                            │
//! │                                          SQLite                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables (or `.env`):
//! - `TALLY_HOST` - Bind address (default: 0.0.0.0)
//! - `TALLY_PORT` - HTTP port (default: 8080)
//! - `TALLY_DATABASE_PATH` - SQLite file (default: ./tally.db)
//! - `TALLY_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `TALLY_DEBT_TRACKING` - `recompute` (default) or `incremental`
//! - `TALLY_EDIT_BALANCE_POLICY` - `reset` (default) or `preserve_payments`

pub mod config;
pub mod error;
pub mod routes;

#[cfg(test)]
mod tests;

use axum::Router;
use tally_core::LedgerPolicy;
use tally_db::{Database, Ledger};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub ledger: Ledger,
}

impl AppState {
    pub fn new(db: Database, policy: LedgerPolicy) -> Self {
        let ledger = db.ledger(policy);
        AppState { db, ledger }
    }
}

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
