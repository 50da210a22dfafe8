//! # Client Routes
//!
//! Name and phone are validated here; balances are never written through
//! these routes, only by the ledger.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tally_core::validation::{validate_client_name, validate_phone};
use tally_core::{Client, ClientStatement, ClientUpdate, NewClient};
use tracing::info;

use crate::error::ApiResult;
use crate::AppState;

/// `GET /api/clients`, by name.
pub async fn list_clients(State(state): State<AppState>) -> ApiResult<Json<Vec<Client>>> {
    Ok(Json(state.db.clients().list().await?))
}

/// `POST /api/clients`
pub async fn create_client(
    State(state): State<AppState>,
    Json(payload): Json<NewClient>,
) -> ApiResult<(StatusCode, Json<Client>)> {
    validate_client_name(&payload.name)?;
    validate_phone(payload.phone.as_deref())?;

    let client = state.db.clients().create(&payload).await?;
    info!(client_id = %client.id, "Client created");
    Ok((StatusCode::CREATED, Json(client)))
}

/// `PUT /api/clients/{id}`
pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ClientUpdate>,
) -> ApiResult<Json<Client>> {
    validate_client_name(&payload.name)?;
    validate_phone(payload.phone.as_deref())?;

    Ok(Json(state.db.clients().update(&id, &payload).await?))
}

/// `GET /api/clients/{id}/statement`
pub async fn client_statement(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ClientStatement>> {
    Ok(Json(state.db.clients().statement(&id).await?))
}

/// `POST /api/clients/{id}/apply-credit`
///
/// 201 with the credit payment, or 204 when there was nothing to apply.
pub async fn apply_client_credit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let response = match state.ledger.apply_client_credit(&id).await? {
        Some(record) => (StatusCode::CREATED, Json(record)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    };
    Ok(response)
}
