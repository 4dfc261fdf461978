// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::cli::{id_arg, opt_arg, required_arg};
use crate::error::{Error, Result};
use crate::models::{GroupType, GroupUpdate, NetWorthGroup, NewGroup};
use crate::utils::{check_color, clean_name, maybe_print_json, pretty_table};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{info, warn};

pub const DEFAULT_COLOR: &str = "#6b7280";

const SELECT: &str = "SELECT id, name, group_type, color, display_order FROM networth_groups";

fn from_row(r: &Row<'_>) -> rusqlite::Result<NetWorthGroup> {
    let kind: String = r.get(2)?;
    let group_type = kind
        .parse::<GroupType>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
    Ok(NetWorthGroup {
        id: r.get(0)?,
        name: r.get(1)?,
        group_type,
        color: r.get(3)?,
        display_order: r.get(4)?,
    })
}

pub fn list(conn: &Connection) -> Result<Vec<NetWorthGroup>> {
    let mut stmt = conn.prepare(&format!("{SELECT} ORDER BY display_order, name"))?;
    let rows = stmt.query_map([], from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn get(conn: &Connection, id: i64) -> Result<NetWorthGroup> {
    conn.query_row(&format!("{SELECT} WHERE id=?1"), params![id], from_row)
        .optional()?
        .ok_or_else(|| Error::not_found("Group"))
}

pub fn create(conn: &Connection, input: NewGroup) -> Result<NetWorthGroup> {
    let name = clean_name(&input.name)?;
    let group_type: GroupType = input.group_type.parse()?;
    let color = check_color(input.color.as_deref().unwrap_or(DEFAULT_COLOR))?;
    conn.execute(
        "INSERT INTO networth_groups(name, group_type, color, display_order)
         VALUES (?1, ?2, ?3, ?4)",
        params![name, group_type.as_str(), color, input.display_order],
    )?;
    let id = conn.last_insert_rowid();
    info!(id, name = %name, kind = group_type.as_str(), "created group");
    get(conn, id)
}

pub fn update(conn: &Connection, id: i64, input: GroupUpdate) -> Result<NetWorthGroup> {
    let mut group = get(conn, id)?;
    if let Some(name) = input.name {
        group.name = clean_name(&name)?;
    }
    if let Some(kind) = input.group_type {
        group.group_type = kind.parse()?;
    }
    if let Some(color) = input.color {
        group.color = check_color(&color)?;
    }
    if let Some(order) = input.display_order {
        group.display_order = order;
    }
    conn.execute(
        "UPDATE networth_groups SET name=?1, group_type=?2, color=?3, display_order=?4
         WHERE id=?5",
        params![
            group.name,
            group.group_type.as_str(),
            group.color,
            group.display_order,
            id
        ],
    )?;
    info!(id, "updated group");
    get(conn, id)
}

/// Groups that still own categories cannot be removed.
pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    get(conn, id)?;
    let used: i64 = conn.query_row(
        "SELECT COUNT(*) FROM networth_categories WHERE group_id=?1",
        params![id],
        |r| r.get(0),
    )?;
    if used > 0 {
        warn!(id, categories = used, "refusing to delete group in use");
        return Err(Error::conflict(format!(
            "Cannot delete group: has {} categories",
            used
        )));
    }
    conn.execute("DELETE FROM networth_groups WHERE id=?1", params![id])?;
    info!(id, "deleted group");
    Ok(())
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> anyhow::Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let order = sub.get_one::<i64>("order").copied().unwrap_or_default();
            let group = create(
                conn,
                NewGroup {
                    name: required_arg(sub, "name")?.to_string(),
                    group_type: required_arg(sub, "type")?.to_string(),
                    color: opt_arg(sub, "color").map(str::to_string),
                    display_order: order,
                },
            )?;
            println!("Added group '{}' (id {})", group.name, group.id);
        }
        Some(("list", sub)) => {
            let groups = list(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &groups)? {
                let data = groups
                    .iter()
                    .map(|g| {
                        vec![
                            g.id.to_string(),
                            g.name.clone(),
                            g.group_type.as_str().to_string(),
                            g.color.clone(),
                            g.display_order.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Id", "Name", "Type", "Color", "Order"], data)
                );
            }
        }
        Some(("update", sub)) => {
            let id = id_arg(sub)?;
            let group = update(
                conn,
                id,
                GroupUpdate {
                    name: opt_arg(sub, "name").map(str::to_string),
                    group_type: opt_arg(sub, "type").map(str::to_string),
                    color: opt_arg(sub, "color").map(str::to_string),
                    display_order: sub.get_one::<i64>("order").copied(),
                },
            )?;
            println!("Updated group '{}'", group.name);
        }
        Some(("rm", sub)) => {
            let id = id_arg(sub)?;
            delete(conn, id)?;
            println!("Removed group {}", id);
        }
        _ => {}
    }
    Ok(())
}
