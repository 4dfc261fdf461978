// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use nestegg::api::{AppState, create_router};
use nestegg::db;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    let conn = db::open_in_memory().unwrap();
    create_router(AppState::new(conn), "http://localhost:3000")
}

fn decimal(v: &Value) -> Decimal {
    v.as_str().unwrap().parse().unwrap()
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn health_check() {
    let app = app();
    let (status, body) = call(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn account_lifecycle() {
    let app = app();
    let (status, created) = call(
        &app,
        "POST",
        "/api/accounts",
        Some(json!({"name": "Checking", "balance": "1200.50"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["balance"], "1200.50");
    let id = created["id"].as_i64().unwrap();

    let (status, updated) = call(
        &app,
        "PUT",
        &format!("/api/accounts/{id}"),
        Some(json!({"balance": 99})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Checking");
    assert_eq!(decimal(&updated["balance"]), dec!(99));

    let (status, body) = call(&app, "DELETE", &format!("/api/accounts/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Account deleted");

    let (status, body) = call(&app, "DELETE", &format!("/api/accounts/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Account not found");
}

#[tokio::test]
async fn malformed_body_is_a_validation_error() {
    let app = app();
    let missing_name = json!({"amount": "5"});
    let (status, body) = call(&app, "POST", "/api/expenses", Some(missing_name)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = call(
        &app,
        "PUT",
        "/api/settings",
        Some(json!({"tax_percentage": 120})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "tax_percentage must be between 0 and 100");
}

#[tokio::test]
async fn budget_seed_and_totals() {
    let app = app();
    let (status, body) = call(&app, "POST", "/api/seed", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["counts"]["expenses"], 6);

    let (_, budget) = call(&app, "GET", "/api/budget/current", None).await;
    assert_eq!(decimal(&budget["totals"]["net_income"]), dec!(3975));
    assert_eq!(budget["settings"]["tax_percentage"], "25");

    let (_, prefill) = call(&app, "GET", "/api/budget/snapshot-prefill", None).await;
    assert_eq!(prefill.as_array().unwrap().len(), 3);

    let (status, _) = call(&app, "POST", "/api/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, accounts) = call(&app, "GET", "/api/accounts", None).await;
    assert_eq!(accounts, json!([]));
}

#[tokio::test]
async fn networth_flow() {
    let app = app();
    let (status, body) = call(&app, "POST", "/api/networth/defaults", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["categories_created"], 11);

    let (status, _) = call(&app, "POST", "/api/networth/defaults", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, cats) = call(&app, "GET", "/api/networth/categories", None).await;
    let checking = cats
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "Checking")
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    let snapshot = json!({
        "month": 3,
        "year": 2024,
        "entries": [{"category_id": checking, "amount": "2500"}]
    });
    let (status, created) =
        call(&app, "POST", "/api/networth/snapshots", Some(snapshot.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(decimal(&created["net_worth"]), dec!(2500));

    let (status, body) = call(&app, "POST", "/api/networth/snapshots", Some(snapshot)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Snapshot for 2024-03 already exists");

    let (status, found) = call(&app, "GET", "/api/networth/months/2024/3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["id"], created["id"]);

    let (status, _) = call(&app, "GET", "/api/networth/months/2024/13", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/api/networth/categories/{checking}");
    let (status, body) = call(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().starts_with("Cannot delete category"));

    let (status, _) = call(&app, "POST", "/api/networth/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, list) = call(&app, "GET", "/api/networth/snapshots", None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn forecast_and_goals() {
    let app = app();
    call(&app, "POST", "/api/networth/defaults", None).await;
    let (status, body) = call(&app, "POST", "/api/networth/seed", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["count"], 12);

    let (status, forecast) = call(
        &app,
        "GET",
        "/api/networth/forecast?period=month&months_ahead=6&target=100000",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(forecast["period"], "month");
    assert_eq!(forecast["projections"].as_array().unwrap().len(), 6);
    assert_eq!(forecast["months_until_target"], 2);

    let (status, _) = call(&app, "GET", "/api/networth/forecast?months_ahead=99", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, goal) = call(
        &app,
        "POST",
        "/api/goals",
        Some(json!({
            "name": "Six figures",
            "goal_type": "net_worth",
            "target_value": "100000",
            "target_date": "2099-12-31"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = goal["id"].as_i64().unwrap();

    let (status, progress) = call(&app, "GET", "/api/goals/progress", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress[0]["goal"]["id"], id);
    assert_eq!(decimal(&progress[0]["current_value"]), dec!(92000));
    assert_eq!(progress[0]["status"], "on_track");

    let uri = format!("/api/goals/{id}/trajectory");
    let (status, trajectory) = call(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!trajectory["current_trajectory"].as_array().unwrap().is_empty());

    let (status, updated) = call(
        &app,
        "PUT",
        &format!("/api/goals/{id}"),
        Some(json!({"target_date": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["target_date"], Value::Null);

    let (status, _) = call(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, "DELETE", &format!("/api/goals/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, "GET", &format!("/api/goals/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn export_import_over_http() {
    let app = app();
    call(&app, "POST", "/api/seed", None).await;
    let (status, doc) = call(&app, "GET", "/api/export", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["version"], 2);

    let fresh = self::app();
    let (status, body) = call(&fresh, "POST", "/api/import", Some(doc)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Data imported successfully");
    assert_eq!(body["counts"]["accounts"], 3);

    let bad = json!({"version": 9});
    let (status, body) = call(&fresh, "POST", "/api/import", Some(bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unsupported export version: 9");
}

#[tokio::test]
async fn forecast_target_is_bounded() {
    let app = app();
    call(&app, "POST", "/api/networth/defaults", None).await;
    let (_, cats) = call(&app, "GET", "/api/networth/categories", None).await;
    let checking = cats
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "Checking")
        .unwrap()["id"]
        .as_i64()
        .unwrap();
    for (month, amount) in [(1, "0"), (2, "0.01")] {
        let snapshot = json!({
            "month": month,
            "year": 2024,
            "entries": [{"category_id": checking, "amount": amount}]
        });
        let (status, _) = call(&app, "POST", "/api/networth/snapshots", Some(snapshot)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let uri = "/api/networth/forecast?target=10000000000000000000000000000";
    let (status, body) = call(&app, "GET", uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "target exceeds maximum allowed value");

    let uri = "/api/networth/forecast?period=month&target=1000000000";
    let (status, body) = call(&app, "GET", uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["months_until_target"], 99_999_999_999i64);

    let (status, _) = call(&app, "GET", "/api/accounts", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn savings_rate_goal_with_vanishing_income() {
    let app = app();
    let income = json!({
        "name": "Interest",
        "gross_amount": "0.0000000000000000000001",
        "is_taxed": false
    });
    let expense = json!({"name": "Invest", "amount": "1000000000", "is_savings_goal": true});
    let goal = json!({"name": "Save a fifth", "goal_type": "savings_rate", "target_value": "20"});
    for (uri, body) in [("/api/income", income), ("/api/expenses", expense), ("/api/goals", goal)] {
        let (status, _) = call(&app, "POST", uri, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, progress) = call(&app, "GET", "/api/goals/progress", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&progress[0]["progress_percentage"]), dec!(100));
    assert_eq!(progress[0]["is_achieved"], true);

    let (status, goals) = call(&app, "GET", "/api/goals", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(goals.as_array().unwrap().len(), 1);
}
