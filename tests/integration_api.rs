//! API Integration Tests
//!
//! End-to-end flows through the router over the in-memory store.

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

mod common;

use common::{create_pin, deposit, memory_app, send, signup, transfer};

#[tokio::test]
async fn test_health_check() {
    let app = memory_app();
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("OK"));
}

#[tokio::test]
async fn test_transfer_e2e() {
    let app = memory_app();

    // 1. Two accounts, both start at zero
    let (alice, _) = signup(&app, "alice@example.com").await;
    let (bob, bob_number) = signup(&app, "bob@example.com").await;

    let (status, body) = send(&app, "GET", "/api/v1/wallet/account-balance", Some(alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["NairaWallet"], "0.00");
    assert_eq!(body["data"]["DollarWallet"], "0.00");

    // 2. Fund Alice and set her PIN
    let (status, body) = deposit(&app, alice, "NairaWallet", "1000").await;
    assert_eq!(status, StatusCode::CREATED, "deposit failed: {body}");
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["balance"], "1000.00");
    assert_eq!(body["data"]["transaction"]["type"], "Deposit");
    create_pin(&app, alice, "1234").await;

    // 3. Transfer to Bob
    let (status, body) = transfer(&app, alice, &bob_number, "NairaWallet", "250.50", "1234").await;
    assert_eq!(status, StatusCode::CREATED, "transfer failed: {body}");
    assert_eq!(body["data"]["balance"], "749.50");
    assert_eq!(body["data"]["receiverAccountNumber"], bob_number.as_str());
    assert_eq!(body["data"]["transaction"]["type"], "TransferOut");

    // 4. Bob sees the credit
    let (_, body) = send(&app, "GET", "/api/v1/wallet/account-balance", Some(bob), None).await;
    assert_eq!(body["data"]["NairaWallet"], "250.50");
    assert_eq!(body["data"]["DollarWallet"], "0.00");

    let (_, body) = send(&app, "GET", "/api/v1/wallet/transactions-history", Some(bob), None).await;
    let entries = body["data"]["transactions"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["type"], "TransferIn");
    assert_eq!(entries[0]["amount"], "250.50");
    assert_eq!(entries[0]["status"], "Success");
}

#[tokio::test]
async fn test_transfer_insufficient_funds_changes_nothing() {
    let app = memory_app();
    let (alice, _) = signup(&app, "alice@example.com").await;
    let (bob, bob_number) = signup(&app, "bob@example.com").await;
    deposit(&app, alice, "DollarWallet", "50").await;
    create_pin(&app, alice, "1234").await;

    let (status, body) = transfer(&app, alice, &bob_number, "DollarWallet", "50.01", "1234").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "failed");
    assert_eq!(body["errorCode"], "insufficient_funds");

    let (_, body) = send(&app, "GET", "/api/v1/wallet/account-balance", Some(alice), None).await;
    assert_eq!(body["data"]["DollarWallet"], "50.00");

    let (_, body) = send(&app, "GET", "/api/v1/wallet/transactions-history", Some(bob), None).await;
    assert_eq!(body["data"]["transactions"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_transfer_wrong_pin_is_unauthorized() {
    let app = memory_app();
    let (alice, _) = signup(&app, "alice@example.com").await;
    let (_, bob_number) = signup(&app, "bob@example.com").await;
    deposit(&app, alice, "NairaWallet", "100").await;
    create_pin(&app, alice, "1234").await;

    let (status, body) = transfer(&app, alice, &bob_number, "NairaWallet", "10", "9999").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["errorCode"], "authorization_failed");

    let (_, body) = send(&app, "GET", "/api/v1/wallet/account-balance", Some(alice), None).await;
    assert_eq!(body["data"]["NairaWallet"], "100.00");
}

#[tokio::test]
async fn test_transfer_without_pin_is_rejected() {
    let app = memory_app();
    let (alice, _) = signup(&app, "alice@example.com").await;
    let (_, bob_number) = signup(&app, "bob@example.com").await;
    deposit(&app, alice, "NairaWallet", "100").await;

    let (status, body) = transfer(&app, alice, &bob_number, "NairaWallet", "10", "1234").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "pin_not_set");
}

#[tokio::test]
async fn test_transfer_to_self_and_unknown_receiver() {
    let app = memory_app();
    let (alice, alice_number) = signup(&app, "alice@example.com").await;
    deposit(&app, alice, "NairaWallet", "100").await;
    create_pin(&app, alice, "1234").await;

    let (status, body) = transfer(&app, alice, &alice_number, "NairaWallet", "10", "1234").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "self_transfer_not_allowed");

    let (status, body) = transfer(&app, alice, "0000000000", "NairaWallet", "10", "1234").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "receiver_not_found");
}

#[tokio::test]
async fn test_deposit_validation() {
    let app = memory_app();
    let (alice, _) = signup(&app, "alice@example.com").await;

    for bad in ["0", "-5", "abc", "1.005"] {
        let (status, body) = deposit(&app, alice, "NairaWallet", bad).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "amount {bad} was accepted");
        assert_eq!(body["errorCode"], "invalid_amount");
    }

    let (status, body) = deposit(&app, alice, "EuroWallet", "10").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "invalid_request");

    // Numeric JSON amounts are accepted too
    let (status, body) = send(
        &app,
        "PATCH",
        "/api/v1/wallet/deposit-funds",
        Some(alice),
        Some(json!({ "amount": 12.5, "wallet": "DollarWallet" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "numeric deposit failed: {body}");
    assert_eq!(body["data"]["balance"], "12.50");
}

#[tokio::test]
async fn test_create_pin_validation() {
    let app = memory_app();
    let (alice, _) = signup(&app, "alice@example.com").await;

    for bad in ["123", "12345", "12a4", ""] {
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/wallet/create-pin",
            Some(alice),
            Some(json!({ "pin": bad })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "pin {bad:?} was accepted");
        assert_eq!(body["errorCode"], "invalid_pin_format");
    }

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/wallet/create-pin",
        Some(alice),
        Some(json!({ "pin": "0042" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Transaction pin created successfully");
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn test_signup_duplicate_email_conflicts() {
    let app = memory_app();
    signup(&app, "dup@example.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/wallet/signup",
        None,
        Some(json!({
            "firstname": "Other",
            "surname": "Person",
            "email": "DUP@example.com",
            "phonenumber": "08000000000"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["errorCode"], "duplicate_account");
}

#[tokio::test]
async fn test_signup_requires_fields() {
    let app = memory_app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/wallet/signup",
        None,
        Some(json!({
            "firstname": "",
            "surname": "Obi",
            "email": "a@example.com",
            "phonenumber": "0803"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "invalid_request");

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/wallet/signup",
        None,
        Some(json!({ "firstname": "Ada" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_history_pagination() {
    let app = memory_app();
    let (alice, _) = signup(&app, "alice@example.com").await;
    for i in 1..=8 {
        deposit(&app, alice, "NairaWallet", &format!("{i}")).await;
    }

    // Default page: newest six
    let (status, body) = send(&app, "GET", "/api/v1/wallet/transactions-history", Some(alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["data"]["transactions"].as_array().unwrap();
    assert_eq!(entries.len(), 6);
    assert_eq!(entries[0]["amount"], "8.00");
    assert_eq!(body["data"]["metadata"]["totalCount"], 8);
    assert_eq!(body["data"]["metadata"]["totalPages"], 2);

    let (_, body) = send(
        &app,
        "GET",
        "/api/v1/wallet/transactions-history?page=2&limit=6",
        Some(alice),
        None,
    )
    .await;
    let entries = body["data"]["transactions"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1]["amount"], "1.00");
    assert_eq!(body["data"]["metadata"]["page"], 2);

    // Past the end is an empty page, not an error
    let (status, body) = send(
        &app,
        "GET",
        "/api/v1/wallet/transactions-history?page=9",
        Some(alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["transactions"].as_array().unwrap().len(), 0);

    // Garbage parameters fall back to defaults
    let (status, body) = send(
        &app,
        "GET",
        "/api/v1/wallet/transactions-history?page=x&limit=-1",
        Some(alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["metadata"]["limit"], 6);
}

#[tokio::test]
async fn test_account_summary() {
    let app = memory_app();
    let (alice, alice_number) = signup(&app, "alice@example.com").await;
    let (_, bob_number) = signup(&app, "bob@example.com").await;
    deposit(&app, alice, "NairaWallet", "500").await;
    deposit(&app, alice, "DollarWallet", "20").await;
    create_pin(&app, alice, "1234").await;
    transfer(&app, alice, &bob_number, "NairaWallet", "100", "1234").await;

    let (status, body) = send(&app, "GET", "/api/v1/wallet/account-summary", Some(alice), None).await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["account"]["accountNumber"], alice_number.as_str());
    assert_eq!(data["account"]["hasPin"], true);
    assert!(data["account"].get("pinHash").is_none());
    assert_eq!(data["balances"]["NairaWallet"], "400.00");
    assert_eq!(data["balances"]["DollarWallet"], "20.00");

    let recent = data["recentTransactions"].as_array().unwrap();
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0]["type"], "TransferOut");
}

#[tokio::test]
async fn test_identity_header_required() {
    let app = memory_app();

    let (status, body) = send(&app, "GET", "/api/v1/wallet/account-balance", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["errorCode"], "missing_header");

    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/api/v1/wallet/account-balance")
        .header(common::USER_ID_HEADER, "not-a-uuid")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.clone(), request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_caller_is_not_found() {
    let app = memory_app();
    let (status, body) = send(
        &app,
        "GET",
        "/api/v1/wallet/account-balance",
        Some(Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errorCode"], "account_not_found");
}

#[tokio::test]
async fn test_concurrent_transfers_cannot_overdraw() {
    let app = memory_app();
    let (alice, _) = signup(&app, "alice@example.com").await;
    let (_, bob_number) = signup(&app, "bob@example.com").await;
    deposit(&app, alice, "NairaWallet", "100").await;
    create_pin(&app, alice, "1234").await;

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let app = app.clone();
        let bob_number = bob_number.clone();
        tasks.push(tokio::spawn(async move {
            transfer(&app, alice, &bob_number, "NairaWallet", "100", "1234").await.0
        }));
    }

    let mut created = 0;
    for task in tasks {
        if task.await.unwrap() == StatusCode::CREATED {
            created += 1;
        }
    }
    assert_eq!(created, 1);

    let (_, body) = send(&app, "GET", "/api/v1/wallet/account-balance", Some(alice), None).await;
    assert_eq!(body["data"]["NairaWallet"], "0.00");
}
