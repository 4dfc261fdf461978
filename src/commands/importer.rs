// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use crate::cli::required_arg;
use crate::commands::exporter::ExportDocument;
use crate::commands::{accounts, categories, expenses, goals, groups, income, seed, snapshots};
use crate::commands::settings::DEFAULT_TAX_PERCENTAGE;
use crate::error::{Error, Result};
use crate::models::{
    EntryInput, GoalType, NewAccount, NewCategory, NewExpense, NewGoal, NewGroup, NewIncome,
};
use crate::utils::check_percentage;
use anyhow::Context;
use rusqlite::{Connection, params};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

/// Versions of the backup document this build understands.
pub const SUPPORTED_VERSIONS: [i64; 2] = [1, 2];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportCounts {
    pub settings: usize,
    pub accounts: usize,
    pub income: usize,
    pub expenses: usize,
    pub networth_groups: usize,
    pub networth_categories: usize,
    pub networth_snapshots: usize,
    pub goals: usize,
}

fn document_version(raw: &Value) -> Result<i64> {
    match raw.get("version") {
        None | Some(Value::Null) => Ok(1),
        Some(v) => v
            .as_i64()
            .ok_or_else(|| Error::validation(format!("Unsupported export version: {}", v))),
    }
}

/// Replaces stored data with the document's. Version 1 documents carry
/// budget data only and leave net-worth data and goals untouched.
pub fn import(conn: &Connection, raw: Value) -> Result<ImportCounts> {
    let version = document_version(&raw)?;
    if !SUPPORTED_VERSIONS.contains(&version) {
        warn!(version, "rejected import");
        return Err(Error::validation(format!(
            "Unsupported export version: {}",
            version
        )));
    }
    let mut doc: ExportDocument = serde_json::from_value(raw)
        .map_err(|e| Error::validation(format!("Invalid import document: {}", e)))?;
    doc.version = version;

    let tx = conn.unchecked_transaction()?;
    let mut counts = import_budget(&tx, &doc)?;
    if version >= 2 {
        import_networth(&tx, &doc, &mut counts)?;
    }
    tx.commit()?;
    info!(version, ?counts, "imported data");
    Ok(counts)
}

fn import_budget(conn: &Connection, doc: &ExportDocument) -> Result<ImportCounts> {
    seed::clear_budget(conn)?;
    let tax = match &doc.settings {
        Some(s) => check_percentage("tax_percentage", s.tax_percentage)?,
        None => DEFAULT_TAX_PERCENTAGE,
    };
    conn.execute(
        "INSERT INTO settings(key, value) VALUES ('tax_percentage', ?1)",
        params![tax.to_string()],
    )?;
    for a in &doc.accounts {
        accounts::create(
            conn,
            NewAccount {
                name: a.name.clone(),
                balance: a.balance,
                is_credit: a.is_credit,
            },
        )?;
    }
    for i in &doc.income {
        income::create(
            conn,
            NewIncome {
                name: i.name.clone(),
                gross_amount: i.gross_amount,
                is_taxed: i.is_taxed,
                tax_percentage: i.tax_percentage,
                is_deduction: i.is_deduction,
            },
        )?;
    }
    for e in &doc.expenses {
        expenses::create(
            conn,
            NewExpense {
                name: e.name.clone(),
                amount: e.amount,
                is_savings_goal: e.is_savings_goal,
            },
        )?;
    }
    Ok(ImportCounts {
        settings: 1,
        accounts: doc.accounts.len(),
        income: doc.income.len(),
        expenses: doc.expenses.len(),
        ..Default::default()
    })
}

fn import_networth(
    conn: &Connection,
    doc: &ExportDocument,
    counts: &mut ImportCounts,
) -> Result<()> {
    conn.execute_batch(
        "DELETE FROM goals;
         DELETE FROM networth_entries;
         DELETE FROM networth_snapshots;
         DELETE FROM networth_categories;
         DELETE FROM networth_groups;",
    )?;

    let mut group_ids: HashMap<&str, i64> = HashMap::new();
    for g in &doc.networth_groups {
        let created = groups::create(
            conn,
            NewGroup {
                name: g.name.clone(),
                group_type: g.group_type.as_str().to_string(),
                color: g.color.clone(),
                display_order: g.display_order,
            },
        )?;
        group_ids.insert(g.name.as_str(), created.id);
    }
    counts.networth_groups = group_ids.len();

    let mut category_ids: HashMap<&str, i64> = HashMap::new();
    for c in &doc.networth_categories {
        let Some(group_id) = group_ids.get(c.group_name.as_str()) else {
            warn!(category = %c.name, group = %c.group_name, "skipping category of unknown group");
            continue;
        };
        let created = categories::create(
            conn,
            NewCategory {
                name: c.name.clone(),
                group_id: *group_id,
                is_personal: c.is_personal,
                display_order: c.display_order,
            },
        )?;
        category_ids.insert(c.name.as_str(), created.id);
        counts.networth_categories += 1;
    }

    let mut history: Vec<_> = doc.networth_snapshots.iter().collect();
    history.sort_by_key(|s| (s.year, s.month));
    for s in history {
        let entries: Vec<EntryInput> = s
            .entries
            .iter()
            .filter_map(|e| {
                let id = category_ids.get(e.category_name.as_str());
                if id.is_none() {
                    warn!(category = %e.category_name, "skipping entry of unknown category");
                }
                id.map(|id| EntryInput {
                    category_id: *id,
                    amount: e.amount,
                })
            })
            .collect();
        let at = snapshots::check_period(s.year, s.month)?;
        snapshots::insert(conn, at, &entries)?;
        counts.networth_snapshots += 1;
    }

    for g in &doc.goals {
        let category_id = g
            .category_name
            .as_deref()
            .and_then(|n| category_ids.get(n).copied());
        if category_id.is_none() && g.goal_type.parse::<GoalType>()? == GoalType::CategoryTarget {
            warn!(goal = %g.name, "skipping category goal without a known category");
            continue;
        }
        goals::create(
            conn,
            NewGoal {
                name: g.name.clone(),
                goal_type: g.goal_type.clone(),
                target_value: g.target_value,
                category_id,
                tracking_period: g.tracking_period.clone(),
                target_date: g.target_date.clone(),
                is_active: g.is_active,
            },
        )?;
        counts.goals += 1;
    }
    Ok(())
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> anyhow::Result<()> {
    let path = required_arg(m, "path")?;
    let text = std::fs::read_to_string(path).with_context(|| format!("Read {}", path))?;
    let raw: Value = serde_json::from_str(&text).with_context(|| format!("Parse {}", path))?;
    let c = import(conn, raw)?;
    println!(
        "Imported {} accounts, {} income, {} expenses, {} groups, {} categories, {} snapshots, {} goals",
        c.accounts,
        c.income,
        c.expenses,
        c.networth_groups,
        c.networth_categories,
        c.networth_snapshots,
        c.goals
    );
    Ok(())
}
