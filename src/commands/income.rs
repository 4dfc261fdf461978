// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::cli::{id_arg, opt_arg, required_arg};
use crate::commands::settings;
use crate::error::{Error, Result};
use crate::models::{IncomeItem, IncomeUpdate, NewIncome};
use crate::utils::{
    check_amount, check_percentage, clean_name, decimal_col, fmt_money, maybe_print_json,
    opt_decimal_col, parse_bool, parse_decimal, pretty_table,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use tracing::info;

const SELECT: &str =
    "SELECT id, name, gross_amount, is_taxed, tax_percentage, is_deduction FROM income_items";

fn from_row(r: &Row<'_>) -> rusqlite::Result<IncomeItem> {
    Ok(IncomeItem {
        id: r.get(0)?,
        name: r.get(1)?,
        gross_amount: decimal_col(r, 2)?,
        is_taxed: r.get(3)?,
        tax_percentage: opt_decimal_col(r, 4)?,
        is_deduction: r.get(5)?,
    })
}

pub fn list(conn: &Connection) -> Result<Vec<IncomeItem>> {
    let mut stmt = conn.prepare(&format!("{SELECT} ORDER BY name, id"))?;
    let rows = stmt.query_map([], from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn get(conn: &Connection, id: i64) -> Result<IncomeItem> {
    conn.query_row(&format!("{SELECT} WHERE id=?1"), params![id], from_row)
        .optional()?
        .ok_or_else(|| Error::not_found("Income item"))
}

fn check_tax(tax: Option<Decimal>) -> Result<Option<Decimal>> {
    tax.map(|t| check_percentage("tax_percentage", t)).transpose()
}

pub fn create(conn: &Connection, input: NewIncome) -> Result<IncomeItem> {
    let name = clean_name(&input.name)?;
    let gross = check_amount("gross_amount", input.gross_amount)?;
    let tax = check_tax(input.tax_percentage)?;
    conn.execute(
        "INSERT INTO income_items(name, gross_amount, is_taxed, tax_percentage, is_deduction)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            name,
            gross.to_string(),
            input.is_taxed,
            tax.map(|t| t.to_string()),
            input.is_deduction
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!(id, name = %name, "created income item");
    get(conn, id)
}

pub fn update(conn: &Connection, id: i64, input: IncomeUpdate) -> Result<IncomeItem> {
    let mut item = get(conn, id)?;
    if let Some(name) = input.name {
        item.name = clean_name(&name)?;
    }
    if let Some(gross) = input.gross_amount {
        item.gross_amount = check_amount("gross_amount", gross)?;
    }
    if let Some(is_taxed) = input.is_taxed {
        item.is_taxed = is_taxed;
    }
    if let Some(tax) = input.tax_percentage {
        item.tax_percentage = check_tax(tax)?;
    }
    if let Some(is_deduction) = input.is_deduction {
        item.is_deduction = is_deduction;
    }
    conn.execute(
        "UPDATE income_items SET name=?1, gross_amount=?2, is_taxed=?3, tax_percentage=?4,
         is_deduction=?5 WHERE id=?6",
        params![
            item.name,
            item.gross_amount.to_string(),
            item.is_taxed,
            item.tax_percentage.map(|t| t.to_string()),
            item.is_deduction,
            id
        ],
    )?;
    info!(id, "updated income item");
    get(conn, id)
}

pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    let n = conn.execute("DELETE FROM income_items WHERE id=?1", params![id])?;
    if n == 0 {
        return Err(Error::not_found("Income item"));
    }
    info!(id, "deleted income item");
    Ok(())
}

/// Monthly take-home pay across all income items.
pub fn net_income(items: &[IncomeItem], default_tax_percentage: Decimal) -> Decimal {
    items
        .iter()
        .map(|i| i.net_amount(default_tax_percentage))
        .sum()
}

/// Gross pay; deductions are not income.
pub fn gross_income(items: &[IncomeItem]) -> Decimal {
    items
        .iter()
        .filter(|i| !i.is_deduction)
        .map(|i| i.gross_amount)
        .sum()
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> anyhow::Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let item = create(
                conn,
                NewIncome {
                    name: required_arg(sub, "name")?.to_string(),
                    gross_amount: parse_decimal(required_arg(sub, "gross")?)?,
                    is_taxed: !sub.get_flag("untaxed"),
                    tax_percentage: opt_arg(sub, "tax-pct").map(parse_decimal).transpose()?,
                    is_deduction: sub.get_flag("deduction"),
                },
            )?;
            println!("Added income '{}' (id {})", item.name, item.id);
        }
        Some(("list", sub)) => {
            let items = list(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &items)? {
                let default_tax = settings::get(conn)?.tax_percentage;
                let data = items
                    .iter()
                    .map(|i| {
                        vec![
                            i.id.to_string(),
                            i.name.clone(),
                            fmt_money(&i.gross_amount),
                            if i.is_deduction {
                                "deduction".to_string()
                            } else if i.is_taxed {
                                "taxed".to_string()
                            } else {
                                "untaxed".to_string()
                            },
                            i.tax_percentage.map(|t| t.to_string()).unwrap_or_default(),
                            fmt_money(&i.net_amount(default_tax)),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Id", "Name", "Gross", "Kind", "Tax %", "Net"], data)
                );
            }
        }
        Some(("update", sub)) => {
            let id = id_arg(sub)?;
            let tax_percentage = if sub.get_flag("clear-tax") {
                Some(None)
            } else {
                opt_arg(sub, "tax-pct")
                    .map(parse_decimal)
                    .transpose()?
                    .map(Some)
            };
            let item = update(
                conn,
                id,
                IncomeUpdate {
                    name: opt_arg(sub, "name").map(str::to_string),
                    gross_amount: opt_arg(sub, "gross").map(parse_decimal).transpose()?,
                    is_taxed: opt_arg(sub, "taxed").map(parse_bool).transpose()?,
                    tax_percentage,
                    is_deduction: opt_arg(sub, "deduction").map(parse_bool).transpose()?,
                },
            )?;
            println!("Updated income '{}'", item.name);
        }
        Some(("rm", sub)) => {
            let id = id_arg(sub)?;
            delete(conn, id)?;
            println!("Removed income item {}", id);
        }
        _ => {}
    }
    Ok(())
}
