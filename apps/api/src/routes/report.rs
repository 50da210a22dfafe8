//! # Summary and Health Routes

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tally_core::LedgerSummary;

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

/// `GET /api/summary`
pub async fn summary(State(state): State<AppState>) -> ApiResult<Json<LedgerSummary>> {
    Ok(Json(state.db.reports().ledger_summary().await?))
}

/// `GET /api/health`: 200 while the database answers.
pub async fn health(State(state): State<AppState>) -> ApiResult<Json<HealthStatus>> {
    if !state.db.health_check().await {
        return Err(ApiError::new(
            ErrorCode::DatabaseError,
            "Database is not responding",
        ));
    }

    Ok(Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    }))
}
