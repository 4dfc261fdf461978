// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Monthly net-worth snapshots and their derived totals.
//!
//! Totals are stored on the snapshot row and re-derived whenever the
//! snapshot or its calendar neighbour changes, so reads never recompute the
//! history.

use std::collections::{HashMap, HashSet};

use crate::cli::{id_arg, opt_arg, required_arg};
use crate::commands::groups;
use crate::error::{Error, Result};
use crate::models::{
    EntryInput, GroupBreakdown, GroupType, NetWorthGroup, NetWorthSnapshot, NewSnapshot,
    SnapshotEntry, SnapshotUpdate, YearMonth,
};
use crate::utils::{
    MAX_AMOUNT, decimal_col, fmt_money, maybe_print_json, parse_decimal, parse_month,
    percent_of, pretty_table,
};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use tracing::{debug, info};

pub const MIN_YEAR: i64 = 1900;
pub const MAX_YEAR: i64 = 2100;

/// Totals derived from a snapshot's entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub total_assets: Decimal,
    pub total_liabilities: Decimal,
    pub net_worth: Decimal,
    pub personal_wealth: Decimal,
    pub company_wealth: Decimal,
}

/// Liabilities always count as owed, whatever sign was entered. Company
/// liabilities reduce net worth but not company wealth.
pub fn derive_totals(entries: &[SnapshotEntry]) -> Totals {
    let mut t = Totals::default();
    for e in entries {
        match e.group_type {
            GroupType::Asset => {
                t.total_assets += e.amount;
                if e.is_personal {
                    t.personal_wealth += e.amount;
                } else {
                    t.company_wealth += e.amount;
                }
            }
            GroupType::Liability => {
                let owed = -e.amount.abs();
                t.total_liabilities += owed;
                if e.is_personal {
                    t.personal_wealth += owed;
                }
            }
        }
    }
    t.net_worth = t.total_assets + t.total_liabilities;
    t
}

/// Per-group totals in group display order. Only groups with entries are
/// listed.
pub fn group_breakdown(
    entries: &[SnapshotEntry],
    groups: &[NetWorthGroup],
    totals: &Totals,
) -> Vec<GroupBreakdown> {
    let mut sums: HashMap<i64, Decimal> = HashMap::new();
    for e in entries {
        *sums.entry(e.group_id).or_default() += match e.group_type {
            GroupType::Asset => e.amount,
            GroupType::Liability => -e.amount.abs(),
        };
    }
    groups
        .iter()
        .filter_map(|g| {
            let total = *sums.get(&g.id)?;
            let percentage = match g.group_type {
                GroupType::Asset => percent_of(total, totals.total_assets),
                GroupType::Liability => {
                    percent_of(total.abs(), totals.total_liabilities.abs())
                }
            };
            Some(GroupBreakdown {
                group_id: g.id,
                name: g.name.clone(),
                group_type: g.group_type,
                color: g.color.clone(),
                total,
                percentage,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

const SELECT: &str = "SELECT id, month, year, timestamp, total_assets, total_liabilities,
    net_worth, change_from_previous, personal_wealth, company_wealth FROM networth_snapshots";

const ENTRY_SELECT: &str = "SELECT e.id, e.category_id, c.name, c.group_id, g.group_type,
    c.is_personal, e.amount
    FROM networth_entries e
    JOIN networth_categories c ON c.id = e.category_id
    JOIN networth_groups g ON g.id = c.group_id
    WHERE e.snapshot_id = ?1
    ORDER BY g.display_order, c.display_order, c.name";

fn from_row(r: &Row<'_>) -> rusqlite::Result<NetWorthSnapshot> {
    Ok(NetWorthSnapshot {
        id: r.get(0)?,
        month: r.get(1)?,
        year: r.get(2)?,
        timestamp: r.get(3)?,
        total_assets: decimal_col(r, 4)?,
        total_liabilities: decimal_col(r, 5)?,
        net_worth: decimal_col(r, 6)?,
        change_from_previous: decimal_col(r, 7)?,
        personal_wealth: decimal_col(r, 8)?,
        company_wealth: decimal_col(r, 9)?,
        entries: Vec::new(),
        groups: Vec::new(),
    })
}

fn entry_from_row(r: &Row<'_>) -> rusqlite::Result<SnapshotEntry> {
    let kind: String = r.get(4)?;
    let group_type = kind
        .parse::<GroupType>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
    Ok(SnapshotEntry {
        id: r.get(0)?,
        category_id: r.get(1)?,
        category_name: r.get(2)?,
        group_id: r.get(3)?,
        group_type,
        is_personal: r.get(5)?,
        amount: decimal_col(r, 6)?,
    })
}

fn load_entries(conn: &Connection, snapshot_id: i64) -> Result<Vec<SnapshotEntry>> {
    let mut stmt = conn.prepare(ENTRY_SELECT)?;
    let rows = stmt.query_map(params![snapshot_id], entry_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn hydrate(
    conn: &Connection,
    mut snap: NetWorthSnapshot,
    groups: &[NetWorthGroup],
) -> Result<NetWorthSnapshot> {
    snap.entries = load_entries(conn, snap.id)?;
    let totals = Totals {
        total_assets: snap.total_assets,
        total_liabilities: snap.total_liabilities,
        net_worth: snap.net_worth,
        personal_wealth: snap.personal_wealth,
        company_wealth: snap.company_wealth,
    };
    snap.groups = group_breakdown(&snap.entries, groups, &totals);
    Ok(snap)
}

/// All snapshots, newest month first.
pub fn list(conn: &Connection) -> Result<Vec<NetWorthSnapshot>> {
    let groups = groups::list(conn)?;
    let mut stmt = conn.prepare(&format!("{SELECT} ORDER BY year DESC, month DESC"))?;
    let rows = stmt.query_map([], from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(hydrate(conn, row?, &groups)?);
    }
    Ok(out)
}

/// Net worth per month, newest first, without loading entries.
pub fn net_worth_history(conn: &Connection) -> Result<Vec<(YearMonth, Decimal)>> {
    let mut stmt = conn.prepare(
        "SELECT year, month, net_worth FROM networth_snapshots ORDER BY year DESC, month DESC",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((YearMonth::new(r.get(0)?, r.get(1)?), decimal_col(r, 2)?))
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Amounts recorded for one category, newest first. Months without an entry
/// for the category count as zero.
pub fn category_history(
    conn: &Connection,
    category_id: i64,
) -> Result<Vec<(YearMonth, Decimal)>> {
    let mut stmt = conn.prepare(
        "SELECT s.year, s.month, e.amount
         FROM networth_snapshots s
         LEFT JOIN networth_entries e ON e.snapshot_id = s.id AND e.category_id = ?1
         ORDER BY s.year DESC, s.month DESC",
    )?;
    let rows = stmt.query_map(params![category_id], |r| {
        let amount: Option<String> = r.get(2)?;
        let amount = match amount {
            Some(s) => s.parse::<Decimal>().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e))
            })?,
            None => Decimal::ZERO,
        };
        Ok((YearMonth::new(r.get(0)?, r.get(1)?), amount))
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn count(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM networth_snapshots", [], |r| r.get(0))?)
}

pub fn get(conn: &Connection, id: i64) -> Result<NetWorthSnapshot> {
    let snap = conn
        .query_row(&format!("{SELECT} WHERE id=?1"), params![id], from_row)
        .optional()?
        .ok_or_else(|| Error::not_found("Snapshot"))?;
    hydrate(conn, snap, &groups::list(conn)?)
}

pub fn get_by_month(conn: &Connection, year: i64, month: i64) -> Result<NetWorthSnapshot> {
    check_month(month)?;
    let snap = conn
        .query_row(
            &format!("{SELECT} WHERE year=?1 AND month=?2"),
            params![year, month],
            from_row,
        )
        .optional()?
        .ok_or_else(|| Error::not_found("Snapshot"))?;
    hydrate(conn, snap, &groups::list(conn)?)
}

fn id_for(conn: &Connection, at: YearMonth) -> Result<Option<i64>> {
    Ok(conn
        .query_row(
            "SELECT id FROM networth_snapshots WHERE year=?1 AND month=?2",
            params![at.year, at.month],
            |r| r.get(0),
        )
        .optional()?)
}

fn stored_net_worth(conn: &Connection, at: YearMonth) -> Result<Option<Decimal>> {
    Ok(conn
        .query_row(
            "SELECT net_worth FROM networth_snapshots WHERE year=?1 AND month=?2",
            params![at.year, at.month],
            |r| decimal_col(r, 0),
        )
        .optional()?)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn check_month(month: i64) -> Result<u32> {
    if !(1..=12).contains(&month) {
        return Err(Error::validation("month must be between 1 and 12"));
    }
    Ok(month as u32)
}

fn check_year(year: i64) -> Result<i32> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(Error::validation(format!(
            "year must be between {} and {}",
            MIN_YEAR, MAX_YEAR
        )));
    }
    Ok(year as i32)
}

pub(crate) fn check_period(year: i64, month: i64) -> Result<YearMonth> {
    let month = check_month(month)?;
    let year = check_year(year)?;
    Ok(YearMonth::new(year, month))
}

fn check_entries(conn: &Connection, entries: &[EntryInput]) -> Result<()> {
    let mut seen = HashSet::new();
    for (i, e) in entries.iter().enumerate() {
        if e.amount.abs() > MAX_AMOUNT {
            return Err(Error::validation(format!(
                "entries[{}].amount exceeds maximum allowed value",
                i
            )));
        }
        if !seen.insert(e.category_id) {
            return Err(Error::validation(format!(
                "entries[{}].category_id {} appears more than once",
                i, e.category_id
            )));
        }
        let exists: Option<i64> = conn
            .query_row(
                "SELECT id FROM networth_categories WHERE id=?1",
                params![e.category_id],
                |r| r.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(Error::validation(format!(
                "Category {} not found",
                e.category_id
            )));
        }
    }
    Ok(())
}

fn check_free(conn: &Connection, at: YearMonth, except: Option<i64>) -> Result<()> {
    match id_for(conn, at)? {
        Some(id) if Some(id) != except => Err(Error::conflict(format!(
            "Snapshot for {} already exists",
            at
        ))),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

fn write_entries(conn: &Connection, snapshot_id: i64, entries: &[EntryInput]) -> Result<()> {
    conn.execute(
        "DELETE FROM networth_entries WHERE snapshot_id=?1",
        params![snapshot_id],
    )?;
    let mut stmt = conn.prepare(
        "INSERT INTO networth_entries(snapshot_id, category_id, amount) VALUES (?1, ?2, ?3)",
    )?;
    for e in entries {
        stmt.execute(params![snapshot_id, e.category_id, e.amount.to_string()])?;
    }
    Ok(())
}

/// Re-derives the stored totals of one snapshot from its entries and the
/// previous calendar month.
pub(crate) fn recalculate(conn: &Connection, snapshot_id: i64) -> Result<Totals> {
    let (year, month): (i32, u32) = conn.query_row(
        "SELECT year, month FROM networth_snapshots WHERE id=?1",
        params![snapshot_id],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?;
    let at = YearMonth::new(year, month);
    let totals = derive_totals(&load_entries(conn, snapshot_id)?);
    let change = stored_net_worth(conn, at.prev())?
        .map(|prev| totals.net_worth - prev)
        .unwrap_or(Decimal::ZERO);
    conn.execute(
        "UPDATE networth_snapshots SET total_assets=?1, total_liabilities=?2, net_worth=?3,
         change_from_previous=?4, personal_wealth=?5, company_wealth=?6 WHERE id=?7",
        params![
            totals.total_assets.to_string(),
            totals.total_liabilities.to_string(),
            totals.net_worth.to_string(),
            change.to_string(),
            totals.personal_wealth.to_string(),
            totals.company_wealth.to_string(),
            snapshot_id
        ],
    )?;
    debug!(snapshot_id, period = %at, net_worth = %totals.net_worth, "derived totals");
    Ok(totals)
}

fn recalculate_month(conn: &Connection, at: YearMonth) -> Result<()> {
    if let Some(id) = id_for(conn, at)? {
        recalculate(conn, id)?;
    }
    Ok(())
}

/// Inserts a snapshot without opening a transaction of its own; callers
/// that batch several writes hold one.
pub(crate) fn insert(conn: &Connection, at: YearMonth, entries: &[EntryInput]) -> Result<i64> {
    check_free(conn, at, None)?;
    check_entries(conn, entries)?;
    conn.execute(
        "INSERT INTO networth_snapshots(year, month) VALUES (?1, ?2)",
        params![at.year, at.month],
    )?;
    let id = conn.last_insert_rowid();
    write_entries(conn, id, entries)?;
    recalculate(conn, id)?;
    recalculate_month(conn, at.next())?;
    Ok(id)
}

pub fn create(conn: &Connection, input: NewSnapshot) -> Result<NetWorthSnapshot> {
    let at = check_period(input.year, input.month)?;
    let tx = conn.unchecked_transaction()?;
    let id = insert(&tx, at, &input.entries)?;
    tx.commit()?;
    info!(id, period = %at, entries = input.entries.len(), "created snapshot");
    get(conn, id)
}

/// Moves and/or replaces the entries of a snapshot. Entries, when given,
/// replace the existing set entirely.
pub fn update(conn: &Connection, id: i64, input: SnapshotUpdate) -> Result<NetWorthSnapshot> {
    let current = get(conn, id)?;
    let old = current.period();
    let at = check_period(
        input.year.unwrap_or(old.year as i64),
        input.month.unwrap_or(old.month as i64),
    )?;
    if at != old {
        check_free(conn, at, Some(id))?;
    }
    if let Some(entries) = &input.entries {
        check_entries(conn, entries)?;
    }

    let tx = conn.unchecked_transaction()?;
    if at != old {
        tx.execute(
            "UPDATE networth_snapshots SET year=?1, month=?2 WHERE id=?3",
            params![at.year, at.month, id],
        )?;
    }
    if let Some(entries) = &input.entries {
        write_entries(&tx, id, entries)?;
    }
    recalculate(&tx, id)?;
    recalculate_month(&tx, at.next())?;
    if at != old {
        recalculate_month(&tx, old.next())?;
    }
    tx.commit()?;
    info!(id, period = %at, moved = at != old, "updated snapshot");
    get(conn, id)
}

pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    let at = get(conn, id)?.period();
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM networth_snapshots WHERE id=?1", params![id])?;
    recalculate_month(&tx, at.next())?;
    tx.commit()?;
    info!(id, period = %at, "deleted snapshot");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// `CATEGORY_ID=AMOUNT` pairs from repeated `--entry` flags.
fn entry_args(m: &clap::ArgMatches) -> anyhow::Result<Option<Vec<EntryInput>>> {
    let Some(values) = m.get_many::<String>("entry") else {
        return Ok(None);
    };
    let mut out = Vec::new();
    for v in values {
        let (cat, amount) = v
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Invalid entry '{}', expected CATEGORY_ID=AMOUNT", v))?;
        out.push(EntryInput {
            category_id: cat
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid category id '{}'", cat))?,
            amount: parse_decimal(amount)?,
        });
    }
    Ok(Some(out))
}

fn print_snapshot(s: &NetWorthSnapshot) {
    println!(
        "{}  net worth {}  (assets {}, liabilities {}, change {})",
        s.period(),
        fmt_money(&s.net_worth),
        fmt_money(&s.total_assets),
        fmt_money(&s.total_liabilities),
        fmt_money(&s.change_from_previous)
    );
    let data = s
        .entries
        .iter()
        .map(|e| {
            vec![
                e.category_name.clone(),
                e.group_type.as_str().to_string(),
                if e.is_personal { "personal" } else { "company" }.to_string(),
                fmt_money(&e.amount),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Category", "Type", "Owner", "Amount"], data)
    );
    let data = s
        .groups
        .iter()
        .map(|g| {
            vec![
                g.name.clone(),
                fmt_money(&g.total),
                format!("{}%", g.percentage),
            ]
        })
        .collect();
    println!("{}", pretty_table(&["Group", "Total", "Share"], data));
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> anyhow::Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let at = parse_month(required_arg(sub, "month")?)?;
            let snap = create(
                conn,
                NewSnapshot {
                    month: at.month as i64,
                    year: at.year as i64,
                    entries: entry_args(sub)?.unwrap_or_default(),
                },
            )?;
            println!("Recorded snapshot {} (id {})", snap.period(), snap.id);
        }
        Some(("list", sub)) => {
            let snaps = list(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &snaps)? {
                let data = snaps
                    .iter()
                    .map(|s| {
                        vec![
                            s.id.to_string(),
                            s.period().to_string(),
                            fmt_money(&s.total_assets),
                            fmt_money(&s.total_liabilities),
                            fmt_money(&s.net_worth),
                            fmt_money(&s.change_from_previous),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["Id", "Month", "Assets", "Liabilities", "Net worth", "Change"],
                        data
                    )
                );
            }
        }
        Some(("show", sub)) => {
            let at = parse_month(required_arg(sub, "month")?)?;
            let snap = get_by_month(conn, at.year as i64, at.month as i64)?;
            if !maybe_print_json(sub.get_flag("json"), false, &snap)? {
                print_snapshot(&snap);
            }
        }
        Some(("update", sub)) => {
            let id = id_arg(sub)?;
            let at = opt_arg(sub, "month").map(parse_month).transpose()?;
            let snap = update(
                conn,
                id,
                SnapshotUpdate {
                    month: at.map(|a| a.month as i64),
                    year: at.map(|a| a.year as i64),
                    entries: entry_args(sub)?,
                },
            )?;
            println!("Updated snapshot {}", snap.period());
        }
        Some(("rm", sub)) => {
            let id = id_arg(sub)?;
            delete(conn, id)?;
            println!("Removed snapshot {}", id);
        }
        _ => {}
    }
    Ok(())
}
