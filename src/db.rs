// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{Connection, OptionalExtension, params};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("com.alphavelocity", "Nestegg", "nestegg"));

pub fn default_db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("nestegg.sqlite"))
}

pub fn open_or_init(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Create data dir {}", parent.display()))?;
    }
    let mut conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    debug!(path = %path.display(), "database ready");
    Ok(conn)
}

/// Fresh database living only as long as the connection, for tests and
/// throwaway runs.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory()?;
    init_schema(&mut conn)?;
    Ok(conn)
}

fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        balance TEXT NOT NULL DEFAULT '0',
        is_credit INTEGER NOT NULL DEFAULT 0,
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS income_items(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        gross_amount TEXT NOT NULL DEFAULT '0',
        is_taxed INTEGER NOT NULL DEFAULT 1,
        tax_percentage TEXT,
        is_deduction INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS expense_items(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        amount TEXT NOT NULL DEFAULT '0',
        is_savings_goal INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS networth_groups(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        group_type TEXT NOT NULL CHECK(group_type IN ('asset','liability')),
        color TEXT NOT NULL DEFAULT '#6b7280',
        display_order INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS networth_categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        group_id INTEGER NOT NULL,
        is_personal INTEGER NOT NULL DEFAULT 1,
        display_order INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(group_id) REFERENCES networth_groups(id) ON DELETE RESTRICT
    );

    CREATE TABLE IF NOT EXISTS networth_snapshots(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        month INTEGER NOT NULL CHECK(month BETWEEN 1 AND 12),
        year INTEGER NOT NULL,
        timestamp TEXT NOT NULL DEFAULT (datetime('now')),
        total_assets TEXT NOT NULL DEFAULT '0',
        total_liabilities TEXT NOT NULL DEFAULT '0',
        net_worth TEXT NOT NULL DEFAULT '0',
        change_from_previous TEXT NOT NULL DEFAULT '0',
        personal_wealth TEXT NOT NULL DEFAULT '0',
        company_wealth TEXT NOT NULL DEFAULT '0',
        UNIQUE(year, month)
    );
    CREATE INDEX IF NOT EXISTS idx_snapshots_year_month ON networth_snapshots(year, month);

    CREATE TABLE IF NOT EXISTS networth_entries(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        snapshot_id INTEGER NOT NULL,
        category_id INTEGER NOT NULL,
        amount TEXT NOT NULL DEFAULT '0',
        UNIQUE(snapshot_id, category_id),
        FOREIGN KEY(snapshot_id) REFERENCES networth_snapshots(id) ON DELETE CASCADE,
        FOREIGN KEY(category_id) REFERENCES networth_categories(id) ON DELETE RESTRICT
    );

    CREATE TABLE IF NOT EXISTS goals(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        goal_type TEXT NOT NULL,
        target_value TEXT NOT NULL,
        category_id INTEGER,
        tracking_period TEXT,
        target_date TEXT,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(category_id) REFERENCES networth_categories(id) ON DELETE RESTRICT
    );

    CREATE TABLE IF NOT EXISTS _migrations(
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        applied_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    "#,
    )?;
    run_migrations(conn)?;
    Ok(())
}

/// One-shot data migration. `id` is never reused once shipped.
pub struct Migration {
    pub id: &'static str,
    pub name: &'static str,
    pub sql: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[Migration {
    id: "001_goal_type_names",
    name: "Rename legacy goal types",
    sql: r#"
        UPDATE goals SET goal_type = 'net_worth' WHERE goal_type = 'net_worth_target';
        UPDATE goals SET goal_type = 'category_target' WHERE goal_type = 'savings_goal';
        UPDATE goals SET goal_type = 'savings_rate' WHERE goal_type = 'category_rate';
    "#,
}];

pub fn applied_migrations(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT id FROM _migrations ORDER BY id")?;
    let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Applies pending migrations, each together with its ledger row in a single
/// transaction. Returns how many were applied.
pub fn run_migrations(conn: &mut Connection) -> Result<usize> {
    run_migration_list(conn, MIGRATIONS)
}

pub fn run_migration_list(conn: &mut Connection, migrations: &[Migration]) -> Result<usize> {
    let mut count = 0;
    for m in migrations {
        let done: Option<i64> = conn
            .query_row("SELECT 1 FROM _migrations WHERE id=?1", params![m.id], |r| {
                r.get(0)
            })
            .optional()?;
        if done.is_some() {
            continue;
        }
        let tx = conn.transaction()?;
        tx.execute_batch(m.sql)
            .with_context(|| format!("Migration {} failed", m.id))?;
        tx.execute(
            "INSERT INTO _migrations(id, name) VALUES (?1, ?2)",
            params![m.id, m.name],
        )?;
        tx.commit()?;
        info!(id = m.id, name = m.name, "applied migration");
        count += 1;
    }
    if count == 0 {
        debug!("no pending migrations");
    }
    Ok(count)
}
