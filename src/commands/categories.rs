// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::cli::{id_arg, opt_arg, required_arg};
use crate::commands::groups;
use crate::error::{Error, Result};
use crate::models::{CategoryUpdate, NetWorthCategory, NewCategory};
use crate::utils::{clean_name, maybe_print_json, parse_bool, pretty_table};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{info, warn};

const SELECT: &str =
    "SELECT id, name, group_id, is_personal, display_order, created_at FROM networth_categories";

fn from_row(r: &Row<'_>) -> rusqlite::Result<NetWorthCategory> {
    Ok(NetWorthCategory {
        id: r.get(0)?,
        name: r.get(1)?,
        group_id: r.get(2)?,
        is_personal: r.get(3)?,
        display_order: r.get(4)?,
        created_at: r.get(5)?,
    })
}

pub fn list(conn: &Connection) -> Result<Vec<NetWorthCategory>> {
    let mut stmt = conn.prepare(&format!("{SELECT} ORDER BY display_order, name"))?;
    let rows = stmt.query_map([], from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn get(conn: &Connection, id: i64) -> Result<NetWorthCategory> {
    conn.query_row(&format!("{SELECT} WHERE id=?1"), params![id], from_row)
        .optional()?
        .ok_or_else(|| Error::not_found("Category"))
}

/// A group named in a request body; a missing one is bad input rather than
/// a missing resource.
fn require_group(conn: &Connection, group_id: i64) -> Result<()> {
    match groups::get(conn, group_id) {
        Ok(_) => Ok(()),
        Err(Error::NotFound(_)) => Err(Error::validation(format!(
            "Group {} not found",
            group_id
        ))),
        Err(e) => Err(e),
    }
}

pub fn create(conn: &Connection, input: NewCategory) -> Result<NetWorthCategory> {
    let name = clean_name(&input.name)?;
    require_group(conn, input.group_id)?;
    conn.execute(
        "INSERT INTO networth_categories(name, group_id, is_personal, display_order)
         VALUES (?1, ?2, ?3, ?4)",
        params![name, input.group_id, input.is_personal, input.display_order],
    )?;
    let id = conn.last_insert_rowid();
    info!(id, name = %name, group_id = input.group_id, "created category");
    get(conn, id)
}

pub fn update(conn: &Connection, id: i64, input: CategoryUpdate) -> Result<NetWorthCategory> {
    let mut cat = get(conn, id)?;
    if let Some(name) = input.name {
        cat.name = clean_name(&name)?;
    }
    if let Some(group_id) = input.group_id {
        require_group(conn, group_id)?;
        cat.group_id = group_id;
    }
    if let Some(is_personal) = input.is_personal {
        cat.is_personal = is_personal;
    }
    if let Some(order) = input.display_order {
        cat.display_order = order;
    }
    conn.execute(
        "UPDATE networth_categories SET name=?1, group_id=?2, is_personal=?3, display_order=?4
         WHERE id=?5",
        params![cat.name, cat.group_id, cat.is_personal, cat.display_order, id],
    )?;
    info!(id, "updated category");
    get(conn, id)
}

/// Categories recorded in a snapshot or tracked by a goal cannot be removed.
pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    get(conn, id)?;
    let entries: i64 = conn.query_row(
        "SELECT COUNT(*) FROM networth_entries WHERE category_id=?1",
        params![id],
        |r| r.get(0),
    )?;
    if entries > 0 {
        warn!(id, entries, "refusing to delete category with entries");
        return Err(Error::conflict(format!(
            "Cannot delete category: used in {} snapshot entries",
            entries
        )));
    }
    let goals: i64 = conn.query_row(
        "SELECT COUNT(*) FROM goals WHERE category_id=?1",
        params![id],
        |r| r.get(0),
    )?;
    if goals > 0 {
        warn!(id, goals, "refusing to delete category tracked by goals");
        return Err(Error::conflict(format!(
            "Cannot delete category: used by {} goals",
            goals
        )));
    }
    conn.execute("DELETE FROM networth_categories WHERE id=?1", params![id])?;
    info!(id, "deleted category");
    Ok(())
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> anyhow::Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let group_id = *sub
                .get_one::<i64>("group")
                .ok_or_else(|| anyhow::anyhow!("--group is required"))?;
            let cat = create(
                conn,
                NewCategory {
                    name: required_arg(sub, "name")?.to_string(),
                    group_id,
                    is_personal: !sub.get_flag("company"),
                    display_order: sub.get_one::<i64>("order").copied().unwrap_or_default(),
                },
            )?;
            println!("Added category '{}' (id {})", cat.name, cat.id);
        }
        Some(("list", sub)) => {
            let cats = list(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &cats)? {
                let group_names: std::collections::HashMap<i64, String> = groups::list(conn)?
                    .into_iter()
                    .map(|g| (g.id, g.name))
                    .collect();
                let data = cats
                    .iter()
                    .map(|c| {
                        vec![
                            c.id.to_string(),
                            c.name.clone(),
                            group_names.get(&c.group_id).cloned().unwrap_or_default(),
                            if c.is_personal { "personal" } else { "company" }.to_string(),
                            c.display_order.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Id", "Name", "Group", "Owner", "Order"], data)
                );
            }
        }
        Some(("update", sub)) => {
            let id = id_arg(sub)?;
            let cat = update(
                conn,
                id,
                CategoryUpdate {
                    name: opt_arg(sub, "name").map(str::to_string),
                    group_id: sub.get_one::<i64>("group").copied(),
                    is_personal: opt_arg(sub, "personal").map(parse_bool).transpose()?,
                    display_order: sub.get_one::<i64>("order").copied(),
                },
            )?;
            println!("Updated category '{}'", cat.name);
        }
        Some(("rm", sub)) => {
            let id = id_arg(sub)?;
            delete(conn, id)?;
            println!("Removed category {}", id);
        }
        _ => {}
    }
    Ok(())
}
