// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use crate::commands::{categories, groups, snapshots};
use crate::error::{Error, Result};
use crate::forecasting::{self, MAX_MONTHS_AHEAD, NetWorthForecast, Period};
use crate::models::{EntryInput, YearMonth};
use crate::utils::{check_amount, fmt_money, maybe_print_json, parse_decimal, pretty_table};
use chrono::Datelike;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const DEFAULT_MONTHS_AHEAD: i64 = 12;

/// (name, group_type, color, display_order)
const DEFAULT_GROUPS: &[(&str, &str, &str, i64)] = &[
    ("Cash", "asset", "#22c55e", 1),
    ("Investments", "asset", "#3b82f6", 2),
    ("Crypto", "asset", "#f59e0b", 3),
    ("Property", "asset", "#8b5cf6", 4),
    ("Loans", "liability", "#ef4444", 10),
    ("Credit Card", "liability", "#f97316", 11),
];

/// (name, group, is_personal, display_order)
const DEFAULT_CATEGORIES: &[(&str, &str, bool, i64)] = &[
    ("Checking", "Cash", true, 1),
    ("Savings", "Cash", true, 2),
    ("Rent Account", "Cash", true, 3),
    ("Company Checkings", "Cash", false, 4),
    ("Personal Investments", "Investments", true, 10),
    ("Personal Bonds", "Investments", true, 11),
    ("Company Investments", "Investments", false, 12),
    ("Crypto", "Crypto", true, 20),
    ("House/Apartment", "Property", true, 30),
    ("Student Loan", "Loans", true, 50),
    ("Credit Card", "Credit Card", true, 60),
];

/// Category order of the rows in `DEMO_HISTORY`.
const DEMO_CATEGORIES: [&str; 10] = [
    "Checking",
    "Savings",
    "Rent Account",
    "Crypto",
    "Personal Investments",
    "Personal Bonds",
    "Company Investments",
    "Company Checkings",
    "Student Loan",
    "Credit Card",
];

/// One row per month, January to December.
const DEMO_HISTORY: [[i64; 10]; 12] = [
    [3500, 8000, 1200, 2500, 25000, 5000, 8000, 2000, -5000, -500],
    [3200, 8500, 1300, 2800, 26000, 5000, 8500, 2200, -4800, -300],
    [4000, 9000, 1400, 3200, 27500, 5000, 9000, 2500, -4600, -400],
    [3800, 9500, 1500, 2900, 28500, 5200, 9500, 2800, -4400, -200],
    [4200, 10000, 1600, 3500, 30000, 5200, 10000, 3000, -4200, -300],
    [4500, 10500, 1700, 4000, 31500, 5500, 10500, 3200, -4000, -250],
    [4800, 11000, 1800, 4500, 33000, 5500, 11000, 3500, -3800, -200],
    [5000, 11500, 1900, 5000, 34500, 5800, 11500, 3800, -3600, -150],
    [5200, 12000, 2000, 4800, 36000, 5800, 12000, 4000, -3400, -100],
    [5500, 12500, 2100, 5500, 38000, 6000, 12500, 4200, -3200, -80],
    [5800, 13000, 2200, 6000, 40000, 6000, 13000, 4500, -3000, -50],
    [6000, 13500, 2300, 6500, 42000, 6200, 13500, 4800, -2800, 0],
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonomyCounts {
    pub groups: usize,
    pub categories: usize,
}

/// Installs the default groups and categories into an empty taxonomy.
pub fn seed_defaults(conn: &Connection) -> Result<TaxonomyCounts> {
    let existing: i64 = conn.query_row(
        "SELECT (SELECT COUNT(*) FROM networth_groups) + (SELECT COUNT(*) FROM networth_categories)",
        [],
        |r| r.get(0),
    )?;
    if existing > 0 {
        return Err(Error::conflict(
            "Groups or categories already exist. Delete first to reseed.",
        ));
    }
    let tx = conn.unchecked_transaction()?;
    let mut group_ids = HashMap::new();
    for (name, kind, color, order) in DEFAULT_GROUPS {
        tx.execute(
            "INSERT INTO networth_groups(name, group_type, color, display_order)
             VALUES (?1, ?2, ?3, ?4)",
            params![name, kind, color, order],
        )?;
        group_ids.insert(*name, tx.last_insert_rowid());
    }
    for (name, group, personal, order) in DEFAULT_CATEGORIES {
        let group_id = group_ids
            .get(group)
            .ok_or_else(|| Error::Internal(format!("default group {} missing", group)))?;
        tx.execute(
            "INSERT INTO networth_categories(name, group_id, is_personal, display_order)
             VALUES (?1, ?2, ?3, ?4)",
            params![name, group_id, personal, order],
        )?;
    }
    tx.commit()?;
    info!(
        groups = DEFAULT_GROUPS.len(),
        categories = DEFAULT_CATEGORIES.len(),
        "seeded default taxonomy"
    );
    Ok(TaxonomyCounts {
        groups: DEFAULT_GROUPS.len(),
        categories: DEFAULT_CATEGORIES.len(),
    })
}

/// Twelve months of demo snapshots for `year`. Needs the default
/// categories and an empty snapshot history.
pub fn seed_demo_history(conn: &Connection, year: i32) -> Result<usize> {
    snapshots::check_period(year as i64, 1)?;
    if snapshots::count(conn)? > 0 {
        return Err(Error::conflict(
            "Net worth data already exists. Delete first to reseed.",
        ));
    }
    let by_name: HashMap<String, i64> = categories::list(conn)?
        .into_iter()
        .map(|c| (c.name, c.id))
        .collect();
    if by_name.is_empty() {
        return Err(Error::validation(
            "No categories found. Seed categories first.",
        ));
    }
    let missing: Vec<&str> = DEMO_CATEGORIES
        .iter()
        .copied()
        .filter(|n| !by_name.contains_key(*n))
        .collect();
    if !missing.is_empty() {
        return Err(Error::validation(format!(
            "Missing required categories: {}",
            missing.join(", ")
        )));
    }

    let tx = conn.unchecked_transaction()?;
    for (idx, row) in DEMO_HISTORY.iter().enumerate() {
        let entries: Vec<EntryInput> = DEMO_CATEGORIES
            .iter()
            .zip(row)
            .map(|(name, amount)| EntryInput {
                category_id: by_name[*name],
                amount: Decimal::from(*amount),
            })
            .collect();
        let at = snapshots::check_period(year as i64, idx as i64 + 1)?;
        snapshots::insert(&tx, at, &entries)?;
    }
    tx.commit()?;
    info!(year, months = DEMO_HISTORY.len(), "seeded demo net-worth history");
    Ok(DEMO_HISTORY.len())
}

/// Demo history for the previous calendar year.
pub fn seed_demo(conn: &Connection) -> Result<usize> {
    seed_demo_history(conn, chrono::Local::now().year() - 1)
}

/// Removes every snapshot, category and group. Goals keep existing but
/// lose their category link.
pub fn reset(conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "DELETE FROM networth_entries;
         DELETE FROM networth_snapshots;
         UPDATE goals SET category_id = NULL WHERE category_id IS NOT NULL;
         DELETE FROM networth_categories;
         DELETE FROM networth_groups;",
    )?;
    tx.commit()?;
    info!("net-worth data reset");
    Ok(())
}

/// Query of the forecast endpoint; everything optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastQuery {
    pub period: Option<String>,
    pub months_ahead: Option<i64>,
    pub target: Option<Decimal>,
}

pub fn forecast(conn: &Connection, q: &ForecastQuery) -> Result<NetWorthForecast> {
    let period: Period = match q.period.as_deref() {
        Some(p) => p.parse()?,
        None => Period::default(),
    };
    let months_ahead = q.months_ahead.unwrap_or(DEFAULT_MONTHS_AHEAD);
    if !(1..=MAX_MONTHS_AHEAD as i64).contains(&months_ahead) {
        return Err(Error::validation(format!(
            "months_ahead must be between 1 and {}",
            MAX_MONTHS_AHEAD
        )));
    }
    let history = snapshots::net_worth_history(conn)?;
    let mut out = forecasting::net_worth_forecast(&history, period, months_ahead as u32);
    if let Some(target) = q.target {
        let target = check_amount("target", target)?;
        let values: Vec<Decimal> = history.iter().map(|(_, v)| *v).collect();
        out.target = Some(target);
        out.months_until_target = forecasting::time_to_target(&values, target, period);
    }
    Ok(out)
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> anyhow::Result<()> {
    match m.subcommand() {
        Some(("group", sub)) => groups::handle(conn, sub)?,
        Some(("category", sub)) => categories::handle(conn, sub)?,
        Some(("snapshot", sub)) => snapshots::handle(conn, sub)?,
        Some(("defaults", _)) => {
            let c = seed_defaults(conn)?;
            println!(
                "Seeded {} groups and {} categories",
                c.groups, c.categories
            );
        }
        Some(("forecast", sub)) => {
            let q = ForecastQuery {
                period: sub.get_one::<String>("period").cloned(),
                months_ahead: sub.get_one::<i64>("months").copied(),
                target: sub
                    .get_one::<String>("target")
                    .map(|s| parse_decimal(s))
                    .transpose()?,
            };
            let f = forecast(conn, &q)?;
            if !maybe_print_json(sub.get_flag("json"), false, &f)? {
                println!(
                    "Monthly change {} over {} data points ({})",
                    fmt_money(&f.monthly_change_rate),
                    f.data_points_used,
                    f.period.as_str()
                );
                if let Some(target) = f.target {
                    match f.months_until_target {
                        Some(n) => println!("{} reached in {} months", fmt_money(&target), n),
                        None => println!("{} not reached at the current pace", fmt_money(&target)),
                    }
                }
                let data = f
                    .projections
                    .iter()
                    .map(|p| {
                        vec![
                            YearMonth::new(p.year, p.month).to_string(),
                            fmt_money(&p.projected_net_worth),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Month", "Projected"], data));
            }
        }
        Some(("seed", sub)) => {
            let n = match sub.get_one::<i32>("year") {
                Some(y) => seed_demo_history(conn, *y)?,
                None => seed_demo(conn)?,
            };
            println!("Seeded {} months of net worth data", n);
        }
        Some(("reset", _)) => {
            reset(conn)?;
            println!("Net worth data reset");
        }
        _ => {}
    }
    Ok(())
}
