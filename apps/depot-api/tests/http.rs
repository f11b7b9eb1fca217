//! Router-level tests.
//!
//! Pools are lazily connected to an unreachable address, so only paths that
//! are decided before any statement runs can be exercised here: identity,
//! role mapping and input validation. Store behavior is covered by
//! `depot-db/tests/workflows.rs`.

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use depot_api::auth::JwtManager;
use depot_api::{build_app, AppState};
use depot_db::{ConnectionRouter, Database, DbConfig};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

const SECRET: &str = "http-test-secret";

fn app() -> Router {
    let db = |user: &str| {
        Database::connect_lazy(
            &DbConfig::new(format!("postgres://{user}@127.0.0.1:1/depot"))
                .connect_timeout(Duration::from_millis(250)),
        )
        .unwrap()
    };
    let router = ConnectionRouter::new(db("admin_app"), db("seller_app"), db("depot_owner"));
    build_app(AppState::new(router, JwtManager::new(SECRET, 3600)))
}

fn token(employee_id: i64, role: &str) -> String {
    JwtManager::new(SECRET, 3600)
        .generate_access_token(employee_id, role)
        .unwrap()
}

async fn send(
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

// =============================================================================
// Identity
// =============================================================================

#[tokio::test]
async fn test_missing_token_is_unauthenticated() {
    for (method, uri) in [
        (Method::GET, "/api/invoice"),
        (Method::GET, "/api/pfi"),
        (Method::GET, "/api/receipt"),
        (Method::PUT, "/api/receipt/sales"),
        (Method::GET, "/api/productsOrder"),
        (Method::GET, "/api/stock/1"),
        (Method::DELETE, "/api/employee/1"),
    ] {
        let (status, body) = send(method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["code"], "unauthenticated");
    }
}

#[tokio::test]
async fn test_forged_token_is_unauthenticated() {
    let forged = JwtManager::new("someone-else", 3600)
        .generate_access_token(1, "admin_role")
        .unwrap();
    let (status, _) = send(Method::GET, "/api/invoice", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(Method::GET, "/api/invoice", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_role_is_forbidden() {
    let token = token(3, "cashier_role");
    for uri in ["/api/invoice", "/api/pfi", "/api/receipt", "/api/productsOrder", "/api/stock"] {
        let (status, body) = send(Method::GET, uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(body["code"], "forbidden");
    }
}

#[tokio::test]
async fn test_session_reports_identity() {
    let (status, body) = send(Method::GET, "/api/auth/me", Some(&token(5, "seller_role")), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["employee_id"], 5);
    assert_eq!(body["role"], "seller_role");

    let (status, body) = send(Method::GET, "/api/auth/me", Some(&token(6, "ghost")), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], Value::Null);
}

#[tokio::test]
async fn test_employee_admin_requires_admin_role() {
    let seller = token(5, "seller_role");
    let (status, _) = send(Method::GET, "/api/employee", Some(&seller), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(Method::DELETE, "/api/employee/9", Some(&seller), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_acting_for_another_employee_is_forbidden() {
    let seller = token(5, "seller_role");
    let (status, _) = send(
        Method::POST,
        "/api/receipt/draft",
        Some(&seller),
        Some(r#"{"employeeId": 6}"#),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// =============================================================================
// Validation (decided before the store is reached)
// =============================================================================

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let seller = token(5, "seller_role");
    let (status, body) = send(Method::POST, "/api/pfr", Some(&seller), Some("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");

    let (status, _) = send(
        Method::POST,
        "/api/pfr",
        Some(&seller),
        Some(r#"{"receipt_id": "abc", "product_id": 1, "quantity": 1}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bad_path_id_is_bad_request() {
    let admin = token(1, "admin_role");
    for uri in ["/api/invoice/abc", "/api/invoice/0", "/api/invoice/-3"] {
        let (status, _) = send(Method::DELETE, uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn test_invoice_type_and_provider_rules() {
    let admin = token(1, "admin_role");

    let (status, _) = send(
        Method::POST,
        "/api/invoice",
        Some(&admin),
        Some(r#"{"invoice_type": "refund", "provider_id": 2}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        Method::POST,
        "/api/invoice",
        Some(&admin),
        Some(r#"{"invoice_type": "write_off", "provider_id": 2}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("provider_id"));

    let (status, _) = send(
        Method::POST,
        "/api/invoice",
        Some(&admin),
        Some(r#"{"invoice_type": "Отримання"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invoice_line_dates_validated() {
    let admin = token(1, "admin_role");
    let (status, body) = send(
        Method::POST,
        "/api/pfi",
        Some(&admin),
        Some(
            r#"{"invoice_id": 1, "product_id": 1, "quantity": 5, "product_price": 12.50,
                "date_of_manufacture": "2025-03-10", "use_by_date": "2025-03-01"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("date_of_manufacture"));
}

#[tokio::test]
async fn test_unknown_search_key_rejected() {
    let admin = token(1, "admin_role");
    let (status, _) = send(
        Method::GET,
        "/api/invoice?type=password&search=x",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        Method::GET,
        "/api/pfi?invoiceType=SALE",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_return_without_source_rejected() {
    let seller = token(5, "seller_role");
    let (status, body) = send(
        Method::POST,
        "/api/receipt",
        Some(&seller),
        Some(r#"{"employeeId": 5, "returnAll": true}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("receiptId"));
}

#[tokio::test]
async fn test_receipt_line_filters_validated() {
    let seller = token(5, "seller_role");
    for uri in [
        "/api/pfr?searchType=price&searchValue=10",
        "/api/pfr?searchType=receipt_id&searchValue=abc",
        "/api/pfr?receiptId=0",
        "/api/pfr?employeeId=x",
        "/api/pfr?receipt_type=refund",
        "/api/pfr?dateFrom=2026-10-31&dateTo=2026-10-01",
    ] {
        let (status, body) = send(Method::GET, uri, Some(&seller), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["code"], "invalid_request");
    }
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_reports_unreachable_pools() {
    let (status, body) = send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["pools"]["seller"], false);
}
