//! # Sale Routes
//!
//! Create and edit go through the ledger, so each is one transaction:
//! stock, balances and client debt change together or not at all.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tally_core::{NewSale, SaleUpdate, SaleWithItems};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// `GET /api/sales`, newest first, items nested.
pub async fn list_sales(State(state): State<AppState>) -> ApiResult<Json<Vec<SaleWithItems>>> {
    let sales = state.db.sales().list().await?;
    debug!(count = sales.len(), "Listed sales");
    Ok(Json(sales))
}

/// `GET /api/sales/{id}`
pub async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleWithItems>> {
    state
        .db
        .sales()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Sale", &id))
}

/// `POST /api/sales`
pub async fn create_sale(
    State(state): State<AppState>,
    Json(payload): Json<NewSale>,
) -> ApiResult<(StatusCode, Json<SaleWithItems>)> {
    let sale = state.ledger.create_sale(&payload).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

/// `PUT /api/sales/{id}`: replaces the items, keeps the sale's identity.
pub async fn update_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<SaleUpdate>,
) -> ApiResult<Json<SaleWithItems>> {
    let sale = state.ledger.update_sale(&id, &payload).await?;
    Ok(Json(sale))
}
