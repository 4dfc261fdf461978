// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::cli::required_arg;
use crate::error::Result;
use crate::models::{BudgetSettings, SettingsUpdate};
use crate::utils::{check_percentage, decimal_col, parse_decimal, pretty_table};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use tracing::info;

pub const DEFAULT_TAX_PERCENTAGE: Decimal = Decimal::from_parts(25, 0, 0, false, 0);

const TAX_KEY: &str = "tax_percentage";

fn read(conn: &Connection) -> Result<Option<BudgetSettings>> {
    Ok(conn
        .query_row(
            "SELECT value, updated_at FROM settings WHERE key=?1",
            params![TAX_KEY],
            |r| {
                Ok(BudgetSettings {
                    tax_percentage: decimal_col(r, 0)?,
                    updated_at: r.get(1)?,
                })
            },
        )
        .optional()?)
}

fn write(conn: &Connection, tax: Decimal) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value, updated_at=datetime('now')",
        params![TAX_KEY, tax.to_string()],
    )?;
    Ok(())
}

/// Current settings; the default row is created on first read.
pub fn get(conn: &Connection) -> Result<BudgetSettings> {
    if let Some(s) = read(conn)? {
        return Ok(s);
    }
    write(conn, DEFAULT_TAX_PERCENTAGE)?;
    Ok(read(conn)?.unwrap_or(BudgetSettings {
        tax_percentage: DEFAULT_TAX_PERCENTAGE,
        updated_at: String::new(),
    }))
}

pub fn update(conn: &Connection, input: SettingsUpdate) -> Result<BudgetSettings> {
    if let Some(tax) = input.tax_percentage {
        let tax = check_percentage("tax_percentage", tax)?;
        write(conn, tax)?;
        info!(%tax, "updated default tax percentage");
    }
    get(conn)
}

/// Drops stored settings and writes the defaults back.
pub fn reset(conn: &Connection) -> Result<BudgetSettings> {
    conn.execute("DELETE FROM settings WHERE key=?1", params![TAX_KEY])?;
    get(conn)
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> anyhow::Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let tax = parse_decimal(required_arg(sub, "tax-pct")?)?;
            let s = update(
                conn,
                SettingsUpdate {
                    tax_percentage: Some(tax),
                },
            )?;
            println!("Default tax percentage set to {}%", s.tax_percentage);
        }
        _ => {
            let s = get(conn)?;
            println!(
                "{}",
                pretty_table(
                    &["Setting", "Value", "Updated"],
                    vec![vec![
                        "tax_percentage".into(),
                        s.tax_percentage.to_string(),
                        s.updated_at
                    ]]
                )
            );
        }
    }
    Ok(())
}
