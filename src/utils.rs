// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Row;
use rusqlite::types::Type;
use rust_decimal::Decimal;

use crate::error::{self, Error};
use crate::models::YearMonth;

pub const MAX_NAME_LENGTH: usize = 100;

pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").unwrap());

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn parse_month(s: &str) -> Result<YearMonth> {
    let d = NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
    Ok(YearMonth::of(d))
}

pub fn parse_bool(s: &str) -> Result<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        other => Err(anyhow::anyhow!("Invalid boolean '{}'", other)),
    }
}

/// Accepts a bare `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_target_date(s: &str) -> error::Result<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(&s.replace('Z', "+00:00")) {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt.date());
    }
    Err(Error::validation("target_date must be a valid ISO date string"))
}

pub fn clean_name(raw: &str) -> error::Result<String> {
    let name = raw.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
        return Err(Error::validation(format!(
            "name must be 1-{} characters",
            MAX_NAME_LENGTH
        )));
    }
    Ok(name.to_string())
}

pub fn check_amount(field: &str, value: Decimal) -> error::Result<Decimal> {
    if value.abs() > MAX_AMOUNT {
        return Err(Error::validation(format!(
            "{} exceeds maximum allowed value",
            field
        )));
    }
    Ok(value)
}

pub fn check_color(color: &str) -> error::Result<String> {
    if !HEX_COLOR.is_match(color) {
        return Err(Error::validation(
            "color must be a valid hex color (e.g., #6b7280)",
        ));
    }
    Ok(color.to_string())
}

pub fn check_percentage(field: &str, value: Decimal) -> error::Result<Decimal> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(Error::validation(format!(
            "{} must be between 0 and 100",
            field
        )));
    }
    Ok(value)
}

/// Reads a TEXT column holding a decimal amount.
pub fn decimal_col(r: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = r.get(idx)?;
    s.parse::<Decimal>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub fn opt_decimal_col(r: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let s: Option<String> = r.get(idx)?;
    s.map(|s| {
        s.parse::<Decimal>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

/// Percentage of `part` in `whole`, 2 dp, zero when `whole` is zero.
/// Saturates at the `Decimal` range instead of overflowing.
pub fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() || part.is_zero() {
        return Decimal::ZERO;
    }
    match part
        .checked_div(whole)
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
    {
        Some(pct) => pct.round_dp(2),
        None if part.is_sign_negative() == whole.is_sign_negative() => Decimal::MAX,
        None => Decimal::MIN,
    }
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
