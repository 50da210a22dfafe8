use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tally_core::LedgerPolicy;
use tally_db::{Database, DbConfig};
use tower::ServiceExt;

use crate::{app, AppState};

async fn test_app() -> Router {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    app(AppState::new(db, LedgerPolicy::default()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_client(app: &Router, name: &str) -> String {
    let (status, body) = send(app, Method::POST, "/api/clients", Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

async fn create_product(app: &Router, price_cents: i64, stock: i64) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/products",
        Some(json!({
            "name": "Coffee 500g",
            "price_cents": price_cents,
            "stock": stock,
            "track_stock": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let app = test_app().await;
    let (status, body) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_credit_sale_and_payment_flow() {
    let app = test_app().await;
    let client_id = create_client(&app, "Ana Souza").await;
    let product_id = create_product(&app, 10000, 10).await;

    let (status, sale) = send(
        &app,
        Method::POST,
        "/api/sales",
        Some(json!({
            "client_id": client_id,
            "sale_type": "credit",
            "items": [{ "product_id": product_id, "quantity": 2 }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sale["final_total_cents"], 20000);
    assert_eq!(sale["status"], "open");
    assert_eq!(sale["items"].as_array().unwrap().len(), 1);

    let (status, payment) = send(
        &app,
        Method::POST,
        "/api/payments",
        Some(json!({ "client_id": client_id, "amount_cents": 20000 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(payment["used_credit"], false);

    let sale_uri = format!("/api/sales/{}", sale["id"].as_str().unwrap());
    let (_, sale) = send(&app, Method::GET, &sale_uri, None).await;
    assert_eq!(sale["status"], "paid");
    assert_eq!(sale["remaining_balance_cents"], 0);

    let statement_uri = format!("/api/clients/{client_id}/statement");
    let (status, statement) = send(&app, Method::GET, &statement_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(statement["client"]["total_debt_cents"], 0);
    assert!(statement["open_sales"].as_array().unwrap().is_empty());

    let (_, products) = send(&app, Method::GET, "/api/products", None).await;
    assert_eq!(products[0]["stock"], 8);

    let (_, summary) = send(&app, Method::GET, "/api/summary", None).await;
    assert_eq!(summary["credit_sales_cents"], 20000);
    assert_eq!(summary["payments_received_cents"], 20000);
}

#[tokio::test]
async fn test_edit_sale_moves_stock() {
    let app = test_app().await;
    let product_id = create_product(&app, 500, 20).await;

    let (_, sale) = send(
        &app,
        Method::POST,
        "/api/sales",
        Some(json!({
            "sale_type": "cash",
            "items": [{ "product_id": product_id, "quantity": 2 }],
        })),
    )
    .await;

    let uri = format!("/api/sales/{}", sale["id"].as_str().unwrap());
    let (status, edited) = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({ "items": [{ "product_id": product_id, "quantity": 5 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["final_total_cents"], 2500);
    assert_eq!(edited["id"], sale["id"]);

    let (_, products) = send(&app, Method::GET, "/api/products", None).await;
    assert_eq!(products[0]["stock"], 15);
}

#[tokio::test]
async fn test_apply_credit_route() {
    let app = test_app().await;
    let client_id = create_client(&app, "Bruno Lima").await;
    let uri = format!("/api/clients/{client_id}/apply-credit");

    let (status, _) = send(&app, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    send(
        &app,
        Method::POST,
        "/api/payments",
        Some(json!({ "client_id": client_id, "amount_cents": 5000 })),
    )
    .await;
    let product_id = create_product(&app, 3000, 5).await;
    send(
        &app,
        Method::POST,
        "/api/sales",
        Some(json!({
            "client_id": client_id,
            "sale_type": "credit",
            "items": [{ "product_id": product_id, "quantity": 1 }],
        })),
    )
    .await;

    let (status, record) = send(&app, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["used_credit"], true);
    assert_eq!(record["amount_cents"], 3000);
}

#[tokio::test]
async fn test_error_responses() {
    let app = test_app().await;
    let client_id = create_client(&app, "Carla Costa").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/payments",
        Some(json!({ "client_id": client_id, "amount_cents": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/payments",
        Some(json!({ "client_id": client_id, "amount_cents": i64::MAX })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = send(&app, Method::GET, "/api/sales/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/sales",
        Some(json!({ "sale_type": "credit", "items": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = send(&app, Method::POST, "/api/clients", Some(json!({ "name": " " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::DELETE, "/api/products/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleted_product_leaves_listing() {
    let app = test_app().await;
    let product_id = create_product(&app, 100, 1).await;

    let uri = format!("/api/products/{product_id}");
    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, products) = send(&app, Method::GET, "/api/products", None).await;
    assert!(products.as_array().unwrap().is_empty());
}
