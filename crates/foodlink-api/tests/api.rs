//! End-to-end tests over the full router, backed by the in-memory store.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::Duration;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use foodlink_api::auth::AppStateInner;
use foodlink_api::middleware::TokenService;
use foodlink_db::MemoryStore;

const EXPIRY: &str = "2030-01-01T12:00:00Z";

fn app() -> Router {
    foodlink_api::router(Arc::new(AppStateInner {
        store: Arc::new(MemoryStore::new()),
        tokens: TokenService::new("test_secret", Duration::hours(24)),
    }))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Registers an account and returns (id, token).
async fn register(app: &Router, email: &str, role: &str) -> (i64, String) {
    let (status, body) = send(
        app,
        Method::POST,
        "/register",
        None,
        Some(json!({ "email": email, "password": "password1", "name": "Test", "role": role })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    (
        body["user"]["id"].as_i64().unwrap(),
        body["token"].as_str().unwrap().to_string(),
    )
}

async fn create_rice(app: &Router, token: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/donations",
        Some(token),
        Some(json!({
            "foodType": "Rice",
            "quantity": "10kg",
            "pickupAddress": "X",
            "expiryTime": EXPIRY,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

#[tokio::test]
async fn donation_lifecycle_scenario() {
    let app = app();

    let (donor_id, donor) = register(&app, "d@test.com", "Donor").await;
    let donation = create_rice(&app, &donor).await;
    assert_eq!(donation["status"], "Pending");
    assert_eq!(donation["donorId"], donor_id);
    let id = donation["id"].as_i64().unwrap();

    let (_, ngo) = register(&app, "n@test.com", "NGO").await;
    let uri = format!("/donations/{}/status", id);

    let (status, body) =
        send(&app, Method::PUT, &uri, Some(&ngo), Some(json!({ "status": "Verified" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Verified");

    let (status, body) =
        send(&app, Method::PUT, &uri, Some(&donor), Some(json!({ "status": "Verified" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Only NGOs can update status");
}

#[tokio::test]
async fn created_donation_round_trips_through_donor_listing() {
    let app = app();
    let (donor_id, donor) = register(&app, "d@test.com", "Donor").await;
    let created = create_rice(&app, &donor).await;

    let (status, body) =
        send(&app, Method::GET, &format!("/donations/{}", donor_id), Some(&donor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([created]));
    assert_eq!(body[0]["foodType"], "Rice");
    assert_eq!(body[0]["expiryTime"], created["expiryTime"]);
}

#[tokio::test]
async fn registration_rules() {
    let app = app();
    register(&app, "d@test.com", "Donor").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/register",
        None,
        Some(json!({ "email": "d@test.com", "password": "password1", "name": "Dup", "role": "Donor" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User already exists");

    let (status, _) = send(
        &app,
        Method::POST,
        "/register",
        None,
        Some(json!({ "email": "new@test.com", "password": "12345", "name": "Short", "role": "Donor" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unparseable body is still a 400 with an error field
    let (status, body) = send(&app, Method::POST, "/register", None, Some(json!([1, 2]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn login_requires_matching_role() {
    let app = app();
    let (id, _) = register(&app, "d@test.com", "Donor").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": "d@test.com", "password": "password1", "role": "Donor" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], id);
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body["user"]["lastLogin"].is_string());

    let (status, body) = send(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": "d@test.com", "password": "password1", "role": "Receiver" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials or role");
}

#[tokio::test]
async fn token_checks() {
    let app = app();

    let (status, _) = send(&app, Method::GET, "/donations", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, Method::GET, "/donations", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Invalid token");

    let other = TokenService::new("other_secret", Duration::hours(1));
    let forged = other.issue(1, foodlink_types::models::Role::Ngo).unwrap();
    let (status, _) = send(&app, Method::GET, "/stats", Some(&forged), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn profile_is_owner_only() {
    let app = app();
    let (a_id, a) = register(&app, "a@test.com", "Donor").await;
    let (b_id, _) = register(&app, "b@test.com", "Receiver").await;

    let (status, body) = send(&app, Method::GET, &format!("/profile/{}", a_id), Some(&a), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "a@test.com");

    let (status, _) = send(&app, Method::GET, &format!("/profile/{}", b_id), Some(&a), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn ngo_update_on_missing_donation_is_not_found() {
    let app = app();
    let (_, ngo) = register(&app, "n@test.com", "NGO").await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/donations/42/status",
        Some(&ngo),
        Some(json!({ "status": "Verified" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Donation not found");
}

#[tokio::test]
async fn request_workflow_and_notifications() {
    let app = app();
    let (receiver_id, receiver) = register(&app, "r@test.com", "Receiver").await;
    let (_, ngo) = register(&app, "n@test.com", "NGO").await;

    let (status, request) = send(
        &app,
        Method::POST,
        "/requests",
        Some(&receiver),
        Some(json!({ "foodType": "Milk", "quantity": "2L", "address": "Y" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", request);
    assert_eq!(request["status"], "Requested");
    assert_eq!(request["deliveryAddress"], "Y");

    let (status, _) = send(
        &app,
        Method::POST,
        "/requests",
        Some(&ngo),
        Some(json!({ "foodType": "Milk", "quantity": "2L", "deliveryAddress": "Y" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let uri = format!("/requests/{}/status", request["id"]);
    let (status, body) =
        send(&app, Method::PUT, &uri, Some(&ngo), Some(json!({ "status": "Allocated" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Allocated");

    let (_, listed) =
        send(&app, Method::GET, &format!("/requests/{}", receiver_id), Some(&receiver), None).await;
    assert_eq!(listed[0]["status"], "Allocated");

    let (status, inbox) = send(&app, Method::GET, "/notifications", Some(&receiver), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inbox.as_array().unwrap().len(), 1);
    assert_eq!(inbox[0]["kind"], "REQUEST_UPDATE");
    assert_eq!(inbox[0]["read"], false);

    let read_uri = format!("/notifications/{}/read", inbox[0]["id"]);
    let (status, _) = send(&app, Method::PUT, &read_uri, Some(&ngo), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = send(&app, Method::PUT, &read_uri, Some(&receiver), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Notification marked as read");
}

#[tokio::test]
async fn unknown_status_is_rejected() {
    let app = app();
    let (_, donor) = register(&app, "d@test.com", "Donor").await;
    let (_, ngo) = register(&app, "n@test.com", "NGO").await;
    let donation = create_rice(&app, &donor).await;

    let uri = format!("/donations/{}/status", donation["id"]);
    let (status, _) =
        send(&app, Method::PUT, &uri, Some(&ngo), Some(json!({ "status": "Teleported" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_is_newest_first_and_paginated() {
    let app = app();
    let (_, donor) = register(&app, "d@test.com", "Donor").await;
    let first = create_rice(&app, &donor).await;
    let second = create_rice(&app, &donor).await;

    let (status, all) = send(&app, Method::GET, "/donations", Some(&donor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all[0]["id"], second["id"]);
    assert_eq!(all[1]["id"], first["id"]);

    let (_, page) = send(&app, Method::GET, "/donations?page=2&limit=1", Some(&donor), None).await;
    assert_eq!(page.as_array().unwrap().len(), 1);
    assert_eq!(page[0]["id"], first["id"]);
}

#[tokio::test]
async fn stats_health_and_api_prefix() {
    let app = app();
    let (_, donor) = register(&app, "d@test.com", "Donor").await;
    register(&app, "n@test.com", "NGO").await;
    create_rice(&app, &donor).await;

    let (status, stats) = send(&app, Method::GET, "/api/stats", Some(&donor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalDonations"], 1);
    assert_eq!(stats["totalDonors"], 1);
    assert_eq!(stats["totalNGOs"], 1);

    let (status, health) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");
    assert_eq!(health["database"], "memory");
    assert_eq!(health["stats"]["users"], 2);

    let (status, body) = send(&app, Method::GET, "/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Endpoint not found");
}

#[tokio::test]
async fn malformed_path_and_query_get_json_errors() {
    let app = app();
    let (_, donor) = register(&app, "d@test.com", "Donor").await;

    for uri in [
        "/donations/abc",
        "/api/requests/abc",
        "/profile/1.5",
        "/donations?page=first",
        "/donations?limit=-1",
    ] {
        let (status, body) = send(&app, Method::GET, uri, Some(&donor), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(body["error"].is_string(), "{} -> {}", uri, body);
    }

    let (status, body) =
        send(&app, Method::PUT, "/notifications/x/read", Some(&donor), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn stale_token_cannot_create_records() {
    let app = app();
    let tokens = TokenService::new("test_secret", Duration::hours(24));
    // Signed with the server's secret but for an account that does not exist
    let ghost = tokens.issue(77, foodlink_types::models::Role::Donor).unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        "/donations",
        Some(&ghost),
        Some(json!({
            "foodType": "Rice",
            "quantity": "10kg",
            "pickupAddress": "X",
            "expiryTime": EXPIRY,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn feedback_for_an_ngo() {
    let app = app();
    let (_, donor) = register(&app, "d@test.com", "Donor").await;
    let (ngo_id, _) = register(&app, "n@test.com", "NGO").await;

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/feedback",
        Some(&donor),
        Some(json!({ "ngo_id": ngo_id, "rating": 5, "comments": "Great" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["ngoId"], ngo_id);

    let (status, body) = send(
        &app,
        Method::POST,
        "/feedback",
        Some(&donor),
        Some(json!({ "ngoId": ngo_id, "rating": 6 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Rating must be between 1 and 5");

    // Listing is public
    let (status, listed) =
        send(&app, Method::GET, &format!("/feedback/ngo/{}", ngo_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([created]));
}

#[tokio::test]
async fn ngo_records_transactions() {
    let app = app();
    let (_, donor) = register(&app, "d@test.com", "Donor").await;
    let (_, receiver) = register(&app, "r@test.com", "Receiver").await;
    let (ngo_id, ngo) = register(&app, "n@test.com", "NGO").await;

    let donation = create_rice(&app, &donor).await;
    let (_, request) = send(
        &app,
        Method::POST,
        "/requests",
        Some(&receiver),
        Some(json!({ "foodType": "Rice", "quantity": "5kg", "deliveryAddress": "Y" })),
    )
    .await;

    let link = json!({
        "donationId": donation["id"],
        "requestId": request["id"],
        "status": "Matched",
    });

    let (status, body) =
        send(&app, Method::POST, "/transactions", Some(&donor), Some(link.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Only NGOs can create transactions");

    let (status, created) =
        send(&app, Method::POST, "/transactions", Some(&ngo), Some(link)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["ngoId"], ngo_id);
    assert_eq!(created["status"], "Matched");

    let (status, listed) = send(&app, Method::GET, "/transactions", Some(&receiver), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([created]));

    let (status, _) = send(&app, Method::GET, "/transactions", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
