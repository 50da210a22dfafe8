//! # Payment Routes

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tally_core::{NewPayment, PaymentRecord};

use crate::error::ApiResult;
use crate::AppState;

/// `GET /api/payments`, newest first.
pub async fn list_payments(State(state): State<AppState>) -> ApiResult<Json<Vec<PaymentRecord>>> {
    Ok(Json(state.db.payments().list().await?))
}

/// `POST /api/payments`
///
/// Settles the client's unpaid sales oldest first; any surplus becomes
/// client credit.
pub async fn create_payment(
    State(state): State<AppState>,
    Json(payload): Json<NewPayment>,
) -> ApiResult<(StatusCode, Json<PaymentRecord>)> {
    let record = state.ledger.apply_payment(&payload).await?;
    Ok((StatusCode::CREATED, Json(record)))
}
