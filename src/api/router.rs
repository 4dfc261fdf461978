// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post, put},
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::{AppState, handlers, panic_response};

/// All API routes. `cors_origin` is the single web client allowed to call
/// the API from a browser; an unparsable origin allows none.
pub fn create_router(state: AppState, cors_origin: &str) -> Router {
    let mut cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors = cors.allow_origin(origin),
        Err(_) => tracing::warn!(origin = cors_origin, "ignoring invalid CORS origin"),
    }

    Router::new()
        .route("/api/health", get(handlers::health))
        // Budget
        .route(
            "/api/settings",
            get(handlers::get_settings).put(handlers::update_settings),
        )
        .route(
            "/api/accounts",
            get(handlers::list_accounts).post(handlers::create_account),
        )
        .route(
            "/api/accounts/:id",
            put(handlers::update_account).delete(handlers::delete_account),
        )
        .route(
            "/api/income",
            get(handlers::list_income).post(handlers::create_income),
        )
        .route(
            "/api/income/:id",
            put(handlers::update_income).delete(handlers::delete_income),
        )
        .route(
            "/api/expenses",
            get(handlers::list_expenses).post(handlers::create_expense),
        )
        .route(
            "/api/expenses/:id",
            put(handlers::update_expense).delete(handlers::delete_expense),
        )
        .route("/api/budget/current", get(handlers::current_budget))
        .route("/api/budget/snapshot-prefill", get(handlers::snapshot_prefill))
        // Data management
        .route("/api/seed", post(handlers::seed_budget))
        .route("/api/reset", post(handlers::reset_budget))
        .route("/api/export", get(handlers::export_data))
        .route("/api/import", post(handlers::import_data))
        // Net worth
        .route(
            "/api/networth/groups",
            get(handlers::list_groups).post(handlers::create_group),
        )
        .route(
            "/api/networth/groups/:id",
            put(handlers::update_group).delete(handlers::delete_group),
        )
        .route(
            "/api/networth/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/api/networth/categories/:id",
            put(handlers::update_category).delete(handlers::delete_category),
        )
        .route("/api/networth/defaults", post(handlers::seed_taxonomy))
        .route(
            "/api/networth/snapshots",
            get(handlers::list_snapshots).post(handlers::create_snapshot),
        )
        .route(
            "/api/networth/snapshots/:id",
            put(handlers::update_snapshot).delete(handlers::delete_snapshot),
        )
        .route(
            "/api/networth/months/:year/:month",
            get(handlers::snapshot_by_month),
        )
        .route("/api/networth/forecast", get(handlers::forecast))
        .route("/api/networth/seed", post(handlers::seed_networth))
        .route("/api/networth/reset", post(handlers::reset_networth))
        // Goals
        .route(
            "/api/goals",
            get(handlers::list_goals).post(handlers::create_goal),
        )
        .route("/api/goals/progress", get(handlers::goal_progress))
        .route(
            "/api/goals/:id",
            get(handlers::get_goal)
                .put(handlers::update_goal)
                .delete(handlers::delete_goal),
        )
        .route("/api/goals/:id/trajectory", get(handlers::goal_trajectory))
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
