//! # Route Handlers
//!
//! ## Organization
//! ```text
//! routes/
//! ├── mod.rs       ◄─── You are here (router assembly)
//! ├── sale.rs      ◄─── Sale list, create, edit (ledger)
//! ├── payment.rs   ◄─── Payment list, create (ledger)
//! ├── client.rs    ◄─── Client CRUD, statement, apply credit
//! ├── product.rs   ◄─── Product CRUD, soft delete
//! └── report.rs    ◄─── Ledger summary, health
//! ```
//!
//! ## Handler Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  async fn create_payment(                                              │
//! │      State(state): State<AppState>,  ◄── Database + Ledger             │
//! │      Json(payload): Json<NewPayment>, ◄── Body (serde)                 │
//! │  ) -> ApiResult<(StatusCode, Json<PaymentRecord>)>                     │
//! │         │                                                               │
//! │         │ ApiError → { code, message } + status                        │
//! │         ▼                                                               │
//! │  201 Created, JSON body                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod client;
pub mod payment;
pub mod product;
pub mod report;
pub mod sale;

use axum::routing::{get, post, put};
use axum::Router;

use crate::AppState;

/// All `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(report::health))
        .route("/summary", get(report::summary))
        .route("/sales", get(sale::list_sales).post(sale::create_sale))
        .route("/sales/{id}", get(sale::get_sale).put(sale::update_sale))
        .route(
            "/payments",
            get(payment::list_payments).post(payment::create_payment),
        )
        .route("/clients", get(client::list_clients).post(client::create_client))
        .route("/clients/{id}", put(client::update_client))
        .route("/clients/{id}/statement", get(client::client_statement))
        .route("/clients/{id}/apply-credit", post(client::apply_client_credit))
        .route(
            "/products",
            get(product::list_products).post(product::create_product),
        )
        .route(
            "/products/{id}",
            put(product::update_product).delete(product::delete_product),
        )
}
