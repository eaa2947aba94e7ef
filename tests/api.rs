mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use nest_funds::backend::{router, AppState};

async fn app() -> Router {
    let (pool, cfg) = common::setup().await;
    common::admin(&pool, &cfg).await;
    common::member(&pool, &cfg).await;
    router(AppState {
        db: pool,
        config: cfg,
    })
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(b) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string())),
        None => req.body(Body::empty()),
    }
    .unwrap();

    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn login(app: &Router, email: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": common::PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_check_responds() {
    let app = app().await;
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn bad_credentials_are_401() {
    let app = app().await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "member@example.com", "password": "nope-nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid email or password.");
}

#[tokio::test]
async fn requests_without_a_token_are_401() {
    let app = app().await;
    let (status, body) = call(&app, Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = call(&app, Method::GET, "/api/auth/me", Some("made-up"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_returns_the_signed_in_user() {
    let app = app().await;
    let token = login(&app, "member@example.com").await;

    let (status, body) = call(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["email"], "member@example.com");
    assert_eq!(body["data"]["role"], "MEMBER");

    let (status, _) = call(&app, Method::POST, "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn members_are_kept_out_of_admin_routes() {
    let app = app().await;
    let token = login(&app, "member@example.com").await;

    for uri in [
        "/api/admin/services",
        "/api/admin/members",
        "/api/admin/death-committee/financial-health",
        "/api/dashboard/admin",
    ] {
        let (status, body) = call(&app, Method::GET, uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn donation_flow_over_http() {
    let app = app().await;
    let admin = login(&app, "admin@example.com").await;
    let member = login(&app, "member@example.com").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/admin/services",
        Some(&admin),
        Some(json!({ "name": "Roof repair", "type": "MASJID_FUND", "target_amount": 1000 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "Service created successfully.");
    let service_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = call(&app, Method::GET, "/api/services", Some(&member), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/transactions",
        Some(&member),
        Some(json!({ "amount": 250, "service_id": service_id, "notes": "For the roof" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["status"], "PENDING");
    let tx_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/admin/transactions/{tx_id}/status"),
        Some(&admin),
        Some(json!({ "status": "APPROVED" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Transaction approved successfully.");

    let (_, body) = call(&app, Method::GET, "/api/admin/services", Some(&admin), None).await;
    assert_eq!(body["data"][0]["current_amount"], "250");

    let (_, body) = call(&app, Method::GET, "/api/dashboard/member", Some(&member), None).await;
    assert_eq!(body["data"]["total_donated"], "250");

    let (status, body) = call(
        &app,
        Method::DELETE,
        &format!("/api/admin/services/{service_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn malformed_status_is_rejected() {
    let app = app().await;
    let admin = login(&app, "admin@example.com").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/admin/transactions/1/status",
        Some(&admin),
        Some(json!({ "status": "MAYBE" })),
    )
    .await;
    assert!(status.is_client_error());
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string(), "{body}");
}

#[tokio::test]
async fn undecodable_requests_use_the_error_envelope() {
    let app = app().await;
    let admin = login(&app, "admin@example.com").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/admin/services",
        Some(&admin),
        Some(json!({ "name": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string(), "{body}");

    let (status, body) = call(
        &app,
        Method::PATCH,
        "/api/admin/services/abc",
        Some(&admin),
        Some(json!({ "is_active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = call(
        &app,
        Method::GET,
        "/api/admin/death-committee?status=SOMETIMES",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = call(&app, Method::GET, "/api/nowhere", Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found.");
}

#[tokio::test]
async fn oversized_bodies_are_413_with_the_envelope() {
    let app = app().await;
    let padding = "x".repeat(128 * 1024);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "member@example.com", "password": padding })),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string(), "{body}");
}

#[tokio::test]
async fn committee_payment_round_trip() {
    let app = app().await;
    let admin = login(&app, "admin@example.com").await;
    let member = login(&app, "member@example.com").await;

    let (status, body) = call(&app, Method::GET, "/api/death-committee/me", Some(&member), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let month = body["data"]["current_month"]["month"].as_u64().unwrap();
    let year = body["data"]["current_month"]["year"].as_i64().unwrap();

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/death-committee/payments",
        Some(&member),
        Some(json!({
            "month": month,
            "year": year,
            "payment_proof": "https://receipts.example.org/1.jpg"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Payment proof uploaded. Waiting for approval.");
    let sub_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/admin/death-committee/subscriptions/{sub_id}/approve"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["is_paid"], true);

    let (_, body) = call(
        &app,
        Method::GET,
        "/api/admin/death-committee?status=PAID",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}
