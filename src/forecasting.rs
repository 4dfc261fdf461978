// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Trend arithmetic over monthly net-worth history.
//!
//! Every series handed to this module is ordered newest first, one value per
//! recorded month. Projections are linear: the average month-over-month
//! change inside a trailing window is assumed to continue.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Error;
use crate::models::YearMonth;

/// Trailing window used to measure the monthly pace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Month,
    #[default]
    Quarter,
    HalfYear,
    Year,
}

impl Period {
    pub const ALL: [Period; 4] = [Period::Month, Period::Quarter, Period::HalfYear, Period::Year];

    pub fn months(&self) -> usize {
        match self {
            Period::Month => 1,
            Period::Quarter => 3,
            Period::HalfYear => 6,
            Period::Year => 12,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Month => "month",
            Period::Quarter => "quarter",
            Period::HalfYear => "half_year",
            Period::Year => "year",
        }
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| {
                Error::validation("period must be one of: month, quarter, half_year, year")
            })
    }
}

pub const MAX_MONTHS_AHEAD: u32 = 36;

/// Average month-over-month change over the window, and how many changes
/// went into it. Fewer than two values yield `(0, 0)`.
pub fn monthly_change_rate(values: &[Decimal], period: Period) -> (Decimal, usize) {
    if values.len() < 2 {
        return (Decimal::ZERO, 0);
    }
    let n = period.months().min(values.len() - 1);
    let total: Decimal = values.windows(2).take(n).map(|w| w[0] - w[1]).sum();
    (total / Decimal::from(n as u64), n)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub month: u32,
    pub year: i32,
    pub projected_net_worth: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetWorthForecast {
    pub period: Period,
    pub months_ahead: u32,
    pub monthly_change_rate: Decimal,
    pub data_points_used: usize,
    pub projections: Vec<ForecastPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub months_until_target: Option<i64>,
}

/// `latest + k × rate` for each of the next `months_ahead` months.
pub fn project(
    latest: YearMonth,
    latest_value: Decimal,
    rate: Decimal,
    months_ahead: u32,
) -> Vec<ForecastPoint> {
    (1..=months_ahead)
        .map(|k| {
            let at = latest.plus(k as i64);
            ForecastPoint {
                month: at.month,
                year: at.year,
                projected_net_worth: (latest_value + rate * Decimal::from(k)).round_dp(2),
            }
        })
        .collect()
}

/// Projection of the net-worth history (newest first).
pub fn net_worth_forecast(
    history: &[(YearMonth, Decimal)],
    period: Period,
    months_ahead: u32,
) -> NetWorthForecast {
    let values: Vec<Decimal> = history.iter().map(|(_, v)| *v).collect();
    let (rate, used) = monthly_change_rate(&values, period);
    let projections = match history.first() {
        Some((latest, value)) => project(*latest, *value, rate, months_ahead),
        None => Vec::new(),
    };
    NetWorthForecast {
        period,
        months_ahead,
        monthly_change_rate: rate.round_dp(2),
        data_points_used: used,
        projections,
        target: None,
        months_until_target: None,
    }
}

/// Whole months until `target` is reached at `rate` per month.
///
/// `Some(0)` when already reached, `None` when the pace never gets there,
/// including a count too large for a `Decimal` or an `i64`.
pub fn months_until_target(current: Decimal, target: Decimal, rate: Decimal) -> Option<i64> {
    let remaining = target.checked_sub(current)?;
    if remaining <= Decimal::ZERO {
        return Some(0);
    }
    if rate <= Decimal::ZERO {
        return None;
    }
    remaining.checked_div(rate)?.ceil().to_i64()
}

/// Months until the newest value of `values` reaches `target` at the pace
/// measured over `period`.
pub fn time_to_target(values: &[Decimal], target: Decimal, period: Period) -> Option<i64> {
    let current = *values.first()?;
    let (rate, _) = monthly_change_rate(values, period);
    months_until_target(current, target, rate)
}

/// Share of net income set aside, in percent. Zero without positive income;
/// saturates at the `Decimal` range when the income is vanishingly small.
pub fn savings_rate(savings: Decimal, net_income: Decimal) -> Decimal {
    if net_income <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    savings
        .checked_div(net_income)
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(if savings.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalForecast {
    pub forecast_date: Option<NaiveDate>,
    pub months_until_target: Option<i64>,
    pub on_track: bool,
    pub required_monthly_change: Decimal,
    pub current_monthly_change: Decimal,
}

/// Pace check of a value goal against its deadline.
///
/// `latest` is the month of the newest snapshot; without it there is no
/// anchor for dates, so only the "already reached" case can be on track.
pub fn goal_forecast(
    target: Decimal,
    current: Decimal,
    rate: Decimal,
    latest: Option<YearMonth>,
    target_date: Option<NaiveDate>,
) -> GoalForecast {
    let remaining = target - current;
    let reached = remaining <= Decimal::ZERO;
    // A month count past the calendar range counts as never reached.
    let (months, forecast_date) = match (latest, months_until_target(current, target, rate)) {
        (Some(at), Some(m)) => match at.checked_plus(m).and_then(|ym| ym.first_day()) {
            Some(date) => (Some(m), Some(date)),
            None => (None, None),
        },
        (_, m) => (m, None),
    };

    let (on_track, required) = match (target_date, latest) {
        _ if reached => (true, Decimal::ZERO),
        (Some(deadline), Some(at)) => {
            let months_remaining = at.months_until(YearMonth::of(deadline));
            if months_remaining > 0 {
                let required = remaining / Decimal::from(months_remaining);
                (rate >= required, required)
            } else {
                (false, remaining)
            }
        }
        (Some(_), None) => (false, Decimal::ZERO),
        (None, _) => (rate > Decimal::ZERO, Decimal::ZERO),
    };

    GoalForecast {
        forecast_date,
        months_until_target: months,
        on_track,
        required_monthly_change: required.round_dp(2),
        current_monthly_change: rate.round_dp(2),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    pub label: String,
    pub value: Decimal,
}

/// "Where I am heading" against "where I need to be", month by month up to
/// the deadline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    pub current_trajectory: Vec<TrajectoryPoint>,
    pub required_trajectory: Vec<TrajectoryPoint>,
    pub current_rate: Decimal,
    pub required_rate: Decimal,
}

pub fn trajectory(
    latest: YearMonth,
    current: Decimal,
    target: Decimal,
    target_date: NaiveDate,
    rate: Decimal,
) -> Option<Trajectory> {
    let months_remaining = latest.months_until(YearMonth::of(target_date));
    if months_remaining <= 0 {
        return None;
    }
    let required_rate = (target - current) / Decimal::from(months_remaining);
    let mut current_trajectory = Vec::with_capacity(months_remaining as usize + 1);
    let mut required_trajectory = Vec::with_capacity(months_remaining as usize + 1);
    for i in 0..=months_remaining {
        let label = latest.plus(i).to_string();
        let k = Decimal::from(i);
        current_trajectory.push(TrajectoryPoint {
            label: label.clone(),
            value: (current + rate * k).round_dp(2),
        });
        required_trajectory.push(TrajectoryPoint {
            label,
            value: (current + required_rate * k).round_dp(2),
        });
    }
    Some(Trajectory {
        current_trajectory,
        required_trajectory,
        current_rate: rate.round_dp(2),
        required_rate: required_rate.round_dp(2),
    })
}
