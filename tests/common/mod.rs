//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use wallet_engine::api::{build_router, AppState};
use wallet_engine::guard::PinHashing;
use wallet_engine::query::QuerySettings;
use wallet_engine::store::{MemoryStore, PgStore, WalletStore};

/// Cheapest argon2 parameters the engine accepts
pub const FAST_HASHING: PinHashing = PinHashing {
    memory_kib: 8,
    iterations: 1,
};

pub const USER_ID_HEADER: &str = "X-Request-User-Id";

/// Router over the given store
pub fn app_over(store: Arc<dyn WalletStore>) -> Router {
    build_router(AppState::new(store, FAST_HASHING, QuerySettings::default()))
}

/// Router over a fresh in-memory store
pub fn memory_app() -> Router {
    app_over(Arc::new(MemoryStore::new()))
}

/// Connection pool for the schema-checked test database, or None when
/// DATABASE_URL is not set.
pub async fn test_pool() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").ok()?;

    let pool = wallet_engine::db::connect(&database_url, 10, std::time::Duration::from_secs(5))
        .await
        .expect("Failed to connect to DB");
    assert!(
        wallet_engine::db::check_schema(&pool).await.unwrap(),
        "run migrations/001_wallet_schema.sql first"
    );
    Some(pool)
}

/// Postgres store, or None when DATABASE_URL is not set.
///
/// Tests share the database and run in parallel, so each one works on
/// accounts with unique emails instead of truncating tables.
pub async fn setup_test_db() -> Option<Arc<dyn WalletStore>> {
    Some(Arc::new(PgStore::new(test_pool().await?)))
}

/// Email that no other test run will use
pub fn unique_email(tag: &str) -> String {
    format!("{tag}-{}@example.com", Uuid::new_v4().simple())
}

/// Send one request and decode the JSON body (Null for an empty body)
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<Uuid>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user.to_string());
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, json)
}

/// Sign up and return (account id, account number)
pub async fn signup(app: &Router, email: &str) -> (Uuid, String) {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/wallet/signup",
        None,
        Some(serde_json::json!({
            "firstname": "Ada",
            "surname": "Obi",
            "email": email,
            "phonenumber": "08031234567"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");

    let id = body["data"]["id"].as_str().unwrap().parse().unwrap();
    let number = body["data"]["accountNumber"].as_str().unwrap().to_string();
    (id, number)
}

pub async fn create_pin(app: &Router, user: Uuid, pin: &str) {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/wallet/create-pin",
        Some(user),
        Some(serde_json::json!({ "pin": pin })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create-pin failed: {body}");
}

pub async fn deposit(app: &Router, user: Uuid, wallet: &str, amount: &str) -> (StatusCode, Value) {
    send(
        app,
        "PATCH",
        "/api/v1/wallet/deposit-funds",
        Some(user),
        Some(serde_json::json!({ "amount": amount, "wallet": wallet })),
    )
    .await
}

pub async fn transfer(
    app: &Router,
    user: Uuid,
    receiver: &str,
    wallet: &str,
    amount: &str,
    pin: &str,
) -> (StatusCode, Value) {
    send(
        app,
        "PATCH",
        "/api/v1/wallet/transfer-funds",
        Some(user),
        Some(serde_json::json!({
            "receiverAccountNumber": receiver,
            "amount": amount,
            "wallet": wallet,
            "pin": pin
        })),
    )
    .await
}
