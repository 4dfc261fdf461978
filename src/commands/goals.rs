// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Savings goals and their progress.
//!
//! Progress is never stored: every read derives it from the latest snapshot,
//! the category history or the budget, depending on the goal type.

use crate::cli::{id_arg, opt_arg, required_arg};
use crate::commands::{budget, categories, snapshots};
use crate::error::{Error, Result};
use crate::forecasting::{self, GoalForecast, Period, Trajectory};
use crate::models::{Goal, GoalType, GoalUpdate, NewGoal, YearMonth};
use crate::utils::{
    check_amount, clean_name, decimal_col, fmt_money, maybe_print_json, parse_bool,
    parse_decimal, parse_target_date, pretty_table,
};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

/// Fewer snapshots than this give no meaningful pace, so no status.
pub const MIN_STATUS_MONTHS: usize = 3;

const SELECT: &str = "SELECT id, name, goal_type, target_value, category_id, tracking_period,
    target_date, is_active, created_at FROM goals";

fn conversion<E>(idx: usize) -> impl FnOnce(E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    move |e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn from_row(r: &Row<'_>) -> rusqlite::Result<Goal> {
    let goal_type: String = r.get(2)?;
    let tracking_period: Option<String> = r.get(5)?;
    let target_date: Option<String> = r.get(6)?;
    Ok(Goal {
        id: r.get(0)?,
        name: r.get(1)?,
        goal_type: goal_type.parse().map_err(conversion(2))?,
        target_value: decimal_col(r, 3)?,
        category_id: r.get(4)?,
        tracking_period: tracking_period
            .map(|p| p.parse::<Period>())
            .transpose()
            .map_err(conversion(5))?,
        target_date: target_date
            .map(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d"))
            .transpose()
            .map_err(conversion(6))?,
        is_active: r.get(7)?,
        created_at: r.get(8)?,
    })
}

pub fn list(conn: &Connection) -> Result<Vec<Goal>> {
    let mut stmt = conn.prepare(&format!("{SELECT} ORDER BY created_at DESC, id DESC"))?;
    let rows = stmt.query_map([], from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn get(conn: &Connection, id: i64) -> Result<Goal> {
    conn.query_row(&format!("{SELECT} WHERE id=?1"), params![id], from_row)
        .optional()?
        .ok_or_else(|| Error::not_found("Goal"))
}

/// Cross-field rules applied after every create or update.
fn check_goal(conn: &Connection, goal: &Goal) -> Result<()> {
    check_amount("target_value", goal.target_value)?;
    if goal.goal_type == GoalType::SavingsRate
        && (goal.target_value < Decimal::ZERO || goal.target_value > Decimal::ONE_HUNDRED)
    {
        return Err(Error::validation(
            "savings_rate target_value must be between 0 and 100",
        ));
    }
    match goal.category_id {
        Some(cat) => {
            categories::get(conn, cat)?;
        }
        None if goal.goal_type == GoalType::CategoryTarget => {
            return Err(Error::validation(
                "category_id is required for category_target goals",
            ));
        }
        None => {}
    }
    Ok(())
}

fn write(conn: &Connection, goal: &Goal) -> Result<()> {
    conn.execute(
        "UPDATE goals SET name=?1, goal_type=?2, target_value=?3, category_id=?4,
         tracking_period=?5, target_date=?6, is_active=?7 WHERE id=?8",
        params![
            goal.name,
            goal.goal_type.as_str(),
            goal.target_value.to_string(),
            goal.category_id,
            goal.tracking_period.map(|p| p.as_str()),
            goal.target_date.map(|d| d.format("%Y-%m-%d").to_string()),
            goal.is_active,
            goal.id
        ],
    )?;
    Ok(())
}

pub fn create(conn: &Connection, input: NewGoal) -> Result<Goal> {
    let goal = Goal {
        id: 0,
        name: clean_name(&input.name)?,
        goal_type: input.goal_type.parse()?,
        target_value: input.target_value,
        category_id: input.category_id,
        tracking_period: input
            .tracking_period
            .as_deref()
            .map(str::parse)
            .transpose()?,
        target_date: input
            .target_date
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(parse_target_date)
            .transpose()?,
        is_active: input.is_active,
        created_at: String::new(),
    };
    check_goal(conn, &goal)?;
    conn.execute(
        "INSERT INTO goals(name, goal_type, target_value, category_id, tracking_period,
         target_date, is_active) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            goal.name,
            goal.goal_type.as_str(),
            goal.target_value.to_string(),
            goal.category_id,
            goal.tracking_period.map(|p| p.as_str()),
            goal.target_date.map(|d| d.format("%Y-%m-%d").to_string()),
            goal.is_active,
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!(id, kind = goal.goal_type.as_str(), "created goal");
    get(conn, id)
}

pub fn update(conn: &Connection, id: i64, input: GoalUpdate) -> Result<Goal> {
    let mut goal = get(conn, id)?;
    if let Some(name) = input.name {
        goal.name = clean_name(&name)?;
    }
    if let Some(kind) = input.goal_type {
        goal.goal_type = kind.parse()?;
    }
    if let Some(target) = input.target_value {
        goal.target_value = target;
    }
    if let Some(cat) = input.category_id {
        goal.category_id = cat;
    }
    if let Some(period) = input.tracking_period {
        goal.tracking_period = period.as_deref().map(str::parse).transpose()?;
    }
    if let Some(date) = input.target_date {
        goal.target_date = date
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(parse_target_date)
            .transpose()?;
    }
    if let Some(active) = input.is_active {
        goal.is_active = active;
    }
    check_goal(conn, &goal)?;
    write(conn, &goal)?;
    info!(id, "updated goal");
    get(conn, id)
}

pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    let n = conn.execute("DELETE FROM goals WHERE id=?1", params![id])?;
    if n == 0 {
        return Err(Error::not_found("Goal"));
    }
    info!(id, "deleted goal");
    Ok(())
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    OnTrack,
    Behind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_income: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub savings_amount: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    pub goal: Goal,
    pub current_value: Decimal,
    pub target_value: Decimal,
    pub progress_percentage: Decimal,
    pub is_achieved: bool,
    pub category_name: Option<String>,
    pub details: ProgressDetails,
    pub data_months: usize,
    pub forecast: Option<GoalForecast>,
    pub status: Option<GoalStatus>,
}

/// Everything progress needs, read once for all goals.
struct Inputs {
    net_worth: Vec<(YearMonth, Decimal)>,
    net_income: Decimal,
    savings: Decimal,
}

impl Inputs {
    fn load(conn: &Connection) -> Result<Self> {
        let budget = budget::current(conn)?;
        Ok(Inputs {
            net_worth: snapshots::net_worth_history(conn)?,
            net_income: budget.totals.net_income,
            savings: budget.totals.savings_allocation,
        })
    }

    fn latest(&self) -> Option<YearMonth> {
        self.net_worth.first().map(|(at, _)| *at)
    }
}

/// Share of the target reached, 0..=100 with 2 dp.
pub fn progress_percentage(current: Decimal, target: Decimal) -> Decimal {
    if target > Decimal::ZERO {
        match current
            .checked_div(target)
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
        {
            Some(pct) => pct.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED).round_dp(2),
            None if current > Decimal::ZERO => Decimal::ONE_HUNDRED,
            None => Decimal::ZERO,
        }
    } else if target.is_zero() && current >= Decimal::ZERO {
        Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    }
}

fn values(series: &[(YearMonth, Decimal)]) -> Vec<Decimal> {
    series.iter().map(|(_, v)| *v).collect()
}

/// History of the tracked value, newest first; `None` for rate goals.
fn value_series(
    conn: &Connection,
    goal: &Goal,
    inputs: &Inputs,
) -> Result<Option<Vec<Decimal>>> {
    Ok(match goal.goal_type {
        GoalType::NetWorth => Some(values(&inputs.net_worth)),
        GoalType::CategoryTarget => match goal.category_id {
            Some(cat) => Some(values(&snapshots::category_history(conn, cat)?)),
            None => Some(Vec::new()),
        },
        GoalType::MonthlySavings | GoalType::SavingsRate => None,
    })
}

fn progress_of(conn: &Connection, goal: Goal, inputs: &Inputs) -> Result<GoalProgress> {
    let data_months = inputs.net_worth.len();
    let latest = inputs.latest();
    let mut details = ProgressDetails::default();
    let category_name = match goal.category_id {
        Some(cat) => Some(categories::get(conn, cat)?.name),
        None => None,
    };

    let series = value_series(conn, &goal, inputs)?;
    let current = match goal.goal_type {
        GoalType::NetWorth | GoalType::CategoryTarget => {
            details.latest_month = latest.map(|at| at.to_string());
            series
                .as_ref()
                .and_then(|s| s.first().copied())
                .unwrap_or(Decimal::ZERO)
        }
        GoalType::MonthlySavings => {
            details.net_income = Some(inputs.net_income);
            inputs.savings
        }
        GoalType::SavingsRate => {
            details.net_income = Some(inputs.net_income.max(Decimal::ZERO));
            details.savings_amount = Some(inputs.savings);
            forecasting::savings_rate(inputs.savings, inputs.net_income).round_dp(2)
        }
    };

    let target = goal.target_value;
    let is_achieved = current >= target;
    let forecast = series.map(|s| {
        let period = goal.tracking_period.unwrap_or_default();
        let (rate, _) = forecasting::monthly_change_rate(&s, period);
        forecasting::goal_forecast(target, current, rate, latest, goal.target_date)
    });

    let status = match (goal.target_date, &forecast) {
        (Some(_), _) if data_months < MIN_STATUS_MONTHS => None,
        (None, _) => None,
        (Some(_), Some(f)) => Some(f.on_track),
        (Some(_), None) => Some(is_achieved),
    }
    .map(|ok| if ok { GoalStatus::OnTrack } else { GoalStatus::Behind });

    debug!(goal = goal.id, %current, ?status, "computed goal progress");
    Ok(GoalProgress {
        current_value: current,
        target_value: target,
        progress_percentage: progress_percentage(current, target),
        is_achieved,
        category_name,
        details,
        data_months,
        forecast,
        status,
        goal,
    })
}

/// Progress of every active goal, newest goal first.
pub fn progress(conn: &Connection) -> Result<Vec<GoalProgress>> {
    let goals: Vec<Goal> = list(conn)?.into_iter().filter(|g| g.is_active).collect();
    if goals.is_empty() {
        return Ok(Vec::new());
    }
    let inputs = Inputs::load(conn)?;
    goals
        .into_iter()
        .map(|g| progress_of(conn, g, &inputs))
        .collect()
}

pub fn progress_for(conn: &Connection, id: i64) -> Result<GoalProgress> {
    let goal = get(conn, id)?;
    let inputs = Inputs::load(conn)?;
    progress_of(conn, goal, &inputs)
}

/// Current pace against the pace the deadline needs. Empty when there is
/// no history yet or the deadline is not after the latest snapshot.
pub fn trajectory(conn: &Connection, id: i64) -> Result<Trajectory> {
    let goal = get(conn, id)?;
    let target_date = goal
        .target_date
        .ok_or_else(|| Error::validation("Goal has no target_date"))?;
    if goal.goal_type.is_rate() {
        return Err(Error::validation(format!(
            "trajectory is not available for {} goals",
            goal.goal_type.as_str()
        )));
    }
    let inputs = Inputs::load(conn)?;
    let empty = Trajectory {
        current_trajectory: Vec::new(),
        required_trajectory: Vec::new(),
        current_rate: Decimal::ZERO,
        required_rate: Decimal::ZERO,
    };
    let (Some(latest), Some(series)) = (inputs.latest(), value_series(conn, &goal, &inputs)?)
    else {
        return Ok(empty);
    };
    let current = series.first().copied().unwrap_or(Decimal::ZERO);
    let period = goal.tracking_period.unwrap_or_default();
    let (rate, _) = forecasting::monthly_change_rate(&series, period);
    Ok(
        forecasting::trajectory(latest, current, goal.target_value, target_date, rate)
            .unwrap_or(empty),
    )
}

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

fn status_label(p: &GoalProgress) -> &'static str {
    match p.status {
        Some(GoalStatus::OnTrack) => "on track",
        Some(GoalStatus::Behind) => "behind",
        None => "-",
    }
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> anyhow::Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let goal = create(
                conn,
                NewGoal {
                    name: required_arg(sub, "name")?.to_string(),
                    goal_type: required_arg(sub, "type")?.to_string(),
                    target_value: parse_decimal(required_arg(sub, "target")?)?,
                    category_id: sub.get_one::<i64>("category").copied(),
                    tracking_period: opt_arg(sub, "period").map(str::to_string),
                    target_date: opt_arg(sub, "by").map(str::to_string),
                    is_active: !sub.get_flag("inactive"),
                },
            )?;
            println!("Added goal '{}' (id {})", goal.name, goal.id);
        }
        Some(("list", sub)) => {
            let goals = list(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &goals)? {
                let data = goals
                    .iter()
                    .map(|g| {
                        vec![
                            g.id.to_string(),
                            g.name.clone(),
                            g.goal_type.as_str().to_string(),
                            fmt_money(&g.target_value),
                            g.target_date.map(|d| d.to_string()).unwrap_or_default(),
                            if g.is_active { "yes" } else { "no" }.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Id", "Name", "Type", "Target", "By", "Active"], data)
                );
            }
        }
        Some(("show", sub)) => {
            let p = progress_for(conn, id_arg(sub)?)?;
            if !maybe_print_json(sub.get_flag("json"), false, &p)? {
                println!(
                    "{} ({}): {} of {} ({}%), {}",
                    p.goal.name,
                    p.goal.goal_type.as_str(),
                    fmt_money(&p.current_value),
                    fmt_money(&p.target_value),
                    p.progress_percentage,
                    status_label(&p)
                );
                if let Some(f) = &p.forecast {
                    match f.forecast_date {
                        Some(d) => println!("Projected to reach target around {}", d),
                        None => println!("Target not reached at the current pace"),
                    }
                }
            }
        }
        Some(("update", sub)) => {
            let id = id_arg(sub)?;
            let target_date = if sub.get_flag("clear-date") {
                Some(None)
            } else {
                opt_arg(sub, "by").map(|s| Some(s.to_string()))
            };
            let goal = update(
                conn,
                id,
                GoalUpdate {
                    name: opt_arg(sub, "name").map(str::to_string),
                    goal_type: opt_arg(sub, "type").map(str::to_string),
                    target_value: opt_arg(sub, "target").map(parse_decimal).transpose()?,
                    category_id: sub.get_one::<i64>("category").map(|c| Some(*c)),
                    tracking_period: opt_arg(sub, "period").map(|p| Some(p.to_string())),
                    target_date,
                    is_active: opt_arg(sub, "active").map(parse_bool).transpose()?,
                },
            )?;
            println!("Updated goal '{}'", goal.name);
        }
        Some(("rm", sub)) => {
            let id = id_arg(sub)?;
            delete(conn, id)?;
            println!("Removed goal {}", id);
        }
        Some(("progress", sub)) => {
            let all = progress(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &all)? {
                let data = all
                    .iter()
                    .map(|p| {
                        vec![
                            p.goal.id.to_string(),
                            p.goal.name.clone(),
                            fmt_money(&p.current_value),
                            fmt_money(&p.target_value),
                            format!("{}%", p.progress_percentage),
                            status_label(p).to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Id", "Goal", "Current", "Target", "Progress", "Status"], data)
                );
            }
        }
        Some(("trajectory", sub)) => {
            let t = trajectory(conn, id_arg(sub)?)?;
            if !maybe_print_json(sub.get_flag("json"), false, &t)? {
                let data = t
                    .current_trajectory
                    .iter()
                    .zip(&t.required_trajectory)
                    .map(|(c, r)| vec![c.label.clone(), fmt_money(&c.value), fmt_money(&r.value)])
                    .collect();
                println!(
                    "Pace {} per month, {} needed\n{}",
                    fmt_money(&t.current_rate),
                    fmt_money(&t.required_rate),
                    pretty_table(&["Month", "Current pace", "Required pace"], data)
                );
            }
        }
        _ => {}
    }
    Ok(())
}
