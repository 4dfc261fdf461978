// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::cli::{id_arg, opt_arg, required_arg};
use crate::error::{Error, Result};
use crate::models::{ExpenseItem, ExpenseUpdate, NewExpense};
use crate::utils::{
    check_amount, clean_name, decimal_col, fmt_money, maybe_print_json, parse_bool,
    parse_decimal, pretty_table,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use tracing::info;

const SELECT: &str = "SELECT id, name, amount, is_savings_goal FROM expense_items";

fn from_row(r: &Row<'_>) -> rusqlite::Result<ExpenseItem> {
    Ok(ExpenseItem {
        id: r.get(0)?,
        name: r.get(1)?,
        amount: decimal_col(r, 2)?,
        is_savings_goal: r.get(3)?,
    })
}

pub fn list(conn: &Connection) -> Result<Vec<ExpenseItem>> {
    let mut stmt = conn.prepare(&format!("{SELECT} ORDER BY name, id"))?;
    let rows = stmt.query_map([], from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn get(conn: &Connection, id: i64) -> Result<ExpenseItem> {
    conn.query_row(&format!("{SELECT} WHERE id=?1"), params![id], from_row)
        .optional()?
        .ok_or_else(|| Error::not_found("Expense item"))
}

pub fn create(conn: &Connection, input: NewExpense) -> Result<ExpenseItem> {
    let name = clean_name(&input.name)?;
    let amount = check_amount("amount", input.amount)?;
    conn.execute(
        "INSERT INTO expense_items(name, amount, is_savings_goal) VALUES (?1, ?2, ?3)",
        params![name, amount.to_string(), input.is_savings_goal],
    )?;
    let id = conn.last_insert_rowid();
    info!(id, name = %name, "created expense item");
    get(conn, id)
}

pub fn update(conn: &Connection, id: i64, input: ExpenseUpdate) -> Result<ExpenseItem> {
    let mut item = get(conn, id)?;
    if let Some(name) = input.name {
        item.name = clean_name(&name)?;
    }
    if let Some(amount) = input.amount {
        item.amount = check_amount("amount", amount)?;
    }
    if let Some(flag) = input.is_savings_goal {
        item.is_savings_goal = flag;
    }
    conn.execute(
        "UPDATE expense_items SET name=?1, amount=?2, is_savings_goal=?3 WHERE id=?4",
        params![item.name, item.amount.to_string(), item.is_savings_goal, id],
    )?;
    info!(id, "updated expense item");
    get(conn, id)
}

pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    let n = conn.execute("DELETE FROM expense_items WHERE id=?1", params![id])?;
    if n == 0 {
        return Err(Error::not_found("Expense item"));
    }
    info!(id, "deleted expense item");
    Ok(())
}

/// Sum of the items flagged as monthly savings allocations.
pub fn savings_total(items: &[ExpenseItem]) -> Decimal {
    items
        .iter()
        .filter(|e| e.is_savings_goal)
        .map(|e| e.amount)
        .sum()
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> anyhow::Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let item = create(
                conn,
                NewExpense {
                    name: required_arg(sub, "name")?.to_string(),
                    amount: parse_decimal(required_arg(sub, "amount")?)?,
                    is_savings_goal: sub.get_flag("savings"),
                },
            )?;
            println!("Added expense '{}' (id {})", item.name, item.id);
        }
        Some(("list", sub)) => {
            let items = list(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &items)? {
                let data = items
                    .iter()
                    .map(|e| {
                        vec![
                            e.id.to_string(),
                            e.name.clone(),
                            fmt_money(&e.amount),
                            if e.is_savings_goal { "savings" } else { "expense" }.to_string(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Id", "Name", "Amount", "Kind"], data));
            }
        }
        Some(("update", sub)) => {
            let id = id_arg(sub)?;
            let item = update(
                conn,
                id,
                ExpenseUpdate {
                    name: opt_arg(sub, "name").map(str::to_string),
                    amount: opt_arg(sub, "amount").map(parse_decimal).transpose()?,
                    is_savings_goal: opt_arg(sub, "savings").map(parse_bool).transpose()?,
                },
            )?;
            println!("Updated expense '{}'", item.name);
        }
        Some(("rm", sub)) => {
            let id = id_arg(sub)?;
            delete(conn, id)?;
            println!("Removed expense item {}", id);
        }
        _ => {}
    }
    Ok(())
}
