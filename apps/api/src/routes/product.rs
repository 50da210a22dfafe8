//! # Product Routes

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tally_core::validation::{validate_price_cents, validate_product_name};
use tally_core::{NewProduct, Product, ProductUpdate};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

fn validate_product(product: &NewProduct) -> ApiResult<()> {
    validate_product_name(&product.name)?;
    validate_price_cents(product.price_cents)?;
    validate_price_cents(product.cost_cents)?;
    if product.stock < 0 {
        return Err(ApiError::validation("stock cannot be negative"));
    }
    Ok(())
}

/// `GET /api/products`: active products only.
pub async fn list_products(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.db.products().list_active().await?))
}

/// `POST /api/products`
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<NewProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    validate_product(&payload)?;

    let product = state.db.products().create(&payload).await?;
    info!(product_id = %product.id, name = %product.name, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /api/products/{id}`
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ProductUpdate>,
) -> ApiResult<Json<Product>> {
    validate_product(&payload)?;

    Ok(Json(state.db.products().update(&id, &payload).await?))
}

/// `DELETE /api/products/{id}`: soft delete. Past sale items keep
/// pointing at the product.
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.products().soft_delete(&id).await?;
    info!(product_id = %id, "Product deactivated");
    Ok(StatusCode::NO_CONTENT)
}
