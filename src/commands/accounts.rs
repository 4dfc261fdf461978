// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::cli::{id_arg, opt_arg, required_arg};
use crate::error::{Error, Result};
use crate::models::{Account, AccountUpdate, NewAccount};
use crate::utils::{
    check_amount, clean_name, decimal_col, fmt_money, maybe_print_json, parse_bool,
    parse_decimal, pretty_table,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::info;

const SELECT: &str = "SELECT id, name, balance, is_credit, updated_at FROM accounts";

fn from_row(r: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: r.get(0)?,
        name: r.get(1)?,
        balance: decimal_col(r, 2)?,
        is_credit: r.get(3)?,
        updated_at: r.get(4)?,
    })
}

pub fn list(conn: &Connection) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare(&format!("{SELECT} ORDER BY name, id"))?;
    let rows = stmt.query_map([], from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn get(conn: &Connection, id: i64) -> Result<Account> {
    conn.query_row(&format!("{SELECT} WHERE id=?1"), params![id], from_row)
        .optional()?
        .ok_or_else(|| Error::not_found("Account"))
}

pub fn create(conn: &Connection, input: NewAccount) -> Result<Account> {
    let name = clean_name(&input.name)?;
    let balance = check_amount("balance", input.balance)?;
    conn.execute(
        "INSERT INTO accounts(name, balance, is_credit) VALUES (?1, ?2, ?3)",
        params![name, balance.to_string(), input.is_credit],
    )?;
    let id = conn.last_insert_rowid();
    info!(id, name = %name, "created account");
    get(conn, id)
}

pub fn update(conn: &Connection, id: i64, input: AccountUpdate) -> Result<Account> {
    let mut acct = get(conn, id)?;
    if let Some(name) = input.name {
        acct.name = clean_name(&name)?;
    }
    if let Some(balance) = input.balance {
        acct.balance = check_amount("balance", balance)?;
    }
    if let Some(is_credit) = input.is_credit {
        acct.is_credit = is_credit;
    }
    conn.execute(
        "UPDATE accounts SET name=?1, balance=?2, is_credit=?3, updated_at=datetime('now')
         WHERE id=?4",
        params![acct.name, acct.balance.to_string(), acct.is_credit, id],
    )?;
    info!(id, "updated account");
    get(conn, id)
}

pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    let n = conn.execute("DELETE FROM accounts WHERE id=?1", params![id])?;
    if n == 0 {
        return Err(Error::not_found("Account"));
    }
    info!(id, "deleted account");
    Ok(())
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> anyhow::Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let balance = match opt_arg(sub, "balance") {
                Some(s) => parse_decimal(s)?,
                None => Default::default(),
            };
            let acct = create(
                conn,
                NewAccount {
                    name: required_arg(sub, "name")?.to_string(),
                    balance,
                    is_credit: sub.get_flag("credit"),
                },
            )?;
            println!("Added account '{}' (id {})", acct.name, acct.id);
        }
        Some(("list", sub)) => {
            let accounts = list(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &accounts)? {
                let data = accounts
                    .iter()
                    .map(|a| {
                        vec![
                            a.id.to_string(),
                            a.name.clone(),
                            fmt_money(&a.balance),
                            if a.is_credit { "credit" } else { "debit" }.to_string(),
                            a.updated_at.clone(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Id", "Name", "Balance", "Kind", "Updated"], data)
                );
            }
        }
        Some(("update", sub)) => {
            let id = id_arg(sub)?;
            let acct = update(
                conn,
                id,
                AccountUpdate {
                    name: opt_arg(sub, "name").map(str::to_string),
                    balance: opt_arg(sub, "balance").map(parse_decimal).transpose()?,
                    is_credit: opt_arg(sub, "credit").map(parse_bool).transpose()?,
                },
            )?;
            println!("Updated account '{}'", acct.name);
        }
        Some(("rm", sub)) => {
            let id = id_arg(sub)?;
            delete(conn, id)?;
            println!("Removed account {}", id);
        }
        _ => {}
    }
    Ok(())
}
