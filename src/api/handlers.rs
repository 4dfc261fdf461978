// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Value, json};

use super::AppState;
use crate::commands::{
    accounts, budget, categories, expenses, exporter, goals, groups, importer, income, networth,
    seed, settings, snapshots,
};
use crate::error::{Error, Result};
use crate::models::{
    AccountUpdate, CategoryUpdate, ExpenseUpdate, GoalUpdate, GroupUpdate, IncomeUpdate,
    NewAccount, NewCategory, NewExpense, NewGoal, NewGroup, NewIncome, NewSnapshot,
    SettingsUpdate, SnapshotUpdate,
};

/// Unwraps a JSON body, turning axum's rejection into a 400 with our
/// error shape.
fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| Error::validation(e.body_text()))
}

fn message(text: &str) -> Json<Value> {
    Json(json!({ "message": text }))
}

/// GET /api/health
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// Budget
// ---------------------------------------------------------------------------

/// GET /api/settings
pub async fn get_settings(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.with_conn(settings::get)?))
}

/// PUT /api/settings
pub async fn update_settings(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SettingsUpdate>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let input = body(payload)?;
    Ok(Json(state.with_conn(|c| settings::update(c, input))?))
}

pub async fn list_accounts(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.with_conn(accounts::list)?))
}

pub async fn create_account(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewAccount>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let input = body(payload)?;
    let account = state.with_conn(|c| accounts::create(c, input))?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn update_account(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: std::result::Result<Json<AccountUpdate>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let input = body(payload)?;
    Ok(Json(state.with_conn(|c| accounts::update(c, id, input))?))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.with_conn(|c| accounts::delete(c, id))?;
    Ok(message("Account deleted"))
}

pub async fn list_income(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.with_conn(income::list)?))
}

pub async fn create_income(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewIncome>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let input = body(payload)?;
    let item = state.with_conn(|c| income::create(c, input))?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_income(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: std::result::Result<Json<IncomeUpdate>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let input = body(payload)?;
    Ok(Json(state.with_conn(|c| income::update(c, id, input))?))
}

pub async fn delete_income(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.with_conn(|c| income::delete(c, id))?;
    Ok(message("Income item deleted"))
}

pub async fn list_expenses(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.with_conn(expenses::list)?))
}

pub async fn create_expense(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewExpense>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let input = body(payload)?;
    let item = state.with_conn(|c| expenses::create(c, input))?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_expense(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: std::result::Result<Json<ExpenseUpdate>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let input = body(payload)?;
    Ok(Json(state.with_conn(|c| expenses::update(c, id, input))?))
}

pub async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.with_conn(|c| expenses::delete(c, id))?;
    Ok(message("Expense item deleted"))
}

/// GET /api/budget/current
/// Settings, every budget list and the derived totals in one response.
pub async fn current_budget(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.with_conn(budget::current)?))
}

/// GET /api/budget/snapshot-prefill
pub async fn snapshot_prefill(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.with_conn(budget::snapshot_prefill)?))
}

// ---------------------------------------------------------------------------
// Data management
// ---------------------------------------------------------------------------

/// POST /api/seed
pub async fn seed_budget(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let counts = state.with_conn(seed::seed_budget)?;
    Ok(Json(json!({
        "message": "Example data seeded successfully",
        "counts": counts,
    })))
}

/// POST /api/reset
pub async fn reset_budget(State(state): State<AppState>) -> Result<impl IntoResponse> {
    state.with_conn(seed::reset_budget)?;
    Ok(message("Budget data reset successfully"))
}

/// GET /api/export
pub async fn export_data(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.with_conn(exporter::export)?))
}

/// POST /api/import
/// Accepts version 1 (budget only) and version 2 documents.
pub async fn import_data(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let raw = body(payload)?;
    if raw.is_null() {
        return Err(Error::validation("No data provided"));
    }
    let counts = state.with_conn(|c| importer::import(c, raw))?;
    Ok(Json(json!({
        "message": "Data imported successfully",
        "counts": counts,
    })))
}

// ---------------------------------------------------------------------------
// Net worth
// ---------------------------------------------------------------------------

pub async fn list_groups(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.with_conn(groups::list)?))
}

pub async fn create_group(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewGroup>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let input = body(payload)?;
    let group = state.with_conn(|c| groups::create(c, input))?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn update_group(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: std::result::Result<Json<GroupUpdate>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let input = body(payload)?;
    Ok(Json(state.with_conn(|c| groups::update(c, id, input))?))
}

pub async fn delete_group(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.with_conn(|c| groups::delete(c, id))?;
    Ok(message("Group deleted"))
}

pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.with_conn(categories::list)?))
}

pub async fn create_category(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewCategory>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let input = body(payload)?;
    let category = state.with_conn(|c| categories::create(c, input))?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: std::result::Result<Json<CategoryUpdate>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let input = body(payload)?;
    Ok(Json(state.with_conn(|c| categories::update(c, id, input))?))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.with_conn(|c| categories::delete(c, id))?;
    Ok(message("Category deleted"))
}

/// POST /api/networth/defaults
pub async fn seed_taxonomy(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let counts = state.with_conn(networth::seed_defaults)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Default groups and categories created",
            "groups_created": counts.groups,
            "categories_created": counts.categories,
        })),
    ))
}

/// GET /api/networth/snapshots
/// Newest month first, each with its entries and group breakdown.
pub async fn list_snapshots(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.with_conn(snapshots::list)?))
}

pub async fn create_snapshot(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewSnapshot>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let input = body(payload)?;
    let snapshot = state.with_conn(|c| snapshots::create(c, input))?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

pub async fn update_snapshot(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: std::result::Result<Json<SnapshotUpdate>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let input = body(payload)?;
    Ok(Json(state.with_conn(|c| snapshots::update(c, id, input))?))
}

pub async fn delete_snapshot(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.with_conn(|c| snapshots::delete(c, id))?;
    Ok(message("Snapshot deleted"))
}

/// GET /api/networth/months/:year/:month
pub async fn snapshot_by_month(
    State(state): State<AppState>,
    Path((year, month)): Path<(i64, i64)>,
) -> Result<impl IntoResponse> {
    Ok(Json(
        state.with_conn(|c| snapshots::get_by_month(c, year, month))?,
    ))
}

/// GET /api/networth/forecast?period=quarter&months_ahead=12&target=100000
pub async fn forecast(
    State(state): State<AppState>,
    query: std::result::Result<Query<networth::ForecastQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Query(q) = query.map_err(|e| Error::validation(e.body_text()))?;
    Ok(Json(state.with_conn(|c| networth::forecast(c, &q))?))
}

/// POST /api/networth/seed
pub async fn seed_networth(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let count = state.with_conn(networth::seed_demo)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("Seeded {} months of net worth data", count),
            "count": count,
        })),
    ))
}

/// POST /api/networth/reset
pub async fn reset_networth(State(state): State<AppState>) -> Result<impl IntoResponse> {
    state.with_conn(networth::reset)?;
    Ok(message("Net worth data reset successfully"))
}

// ---------------------------------------------------------------------------
// Goals
// ---------------------------------------------------------------------------

pub async fn list_goals(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.with_conn(goals::list)?))
}

pub async fn create_goal(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewGoal>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let input = body(payload)?;
    let goal = state.with_conn(|c| goals::create(c, input))?;
    Ok((StatusCode::CREATED, Json(goal)))
}

pub async fn get_goal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.with_conn(|c| goals::get(c, id))?))
}

pub async fn update_goal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: std::result::Result<Json<GoalUpdate>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let input = body(payload)?;
    Ok(Json(state.with_conn(|c| goals::update(c, id, input))?))
}

pub async fn delete_goal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.with_conn(|c| goals::delete(c, id))?;
    Ok(message("Goal deleted"))
}

/// GET /api/goals/progress
pub async fn goal_progress(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.with_conn(goals::progress)?))
}

/// GET /api/goals/:id/trajectory
pub async fn goal_trajectory(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.with_conn(|c| goals::trajectory(c, id))?))
}
