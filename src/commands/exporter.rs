// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Backup document and CSV history export.

use std::collections::HashMap;
use std::io::Write;

use crate::cli::required_arg;
use crate::commands::{accounts, categories, expenses, goals, groups, income, settings, snapshots};
use crate::error::Result;
use crate::models::GroupType;
use anyhow::Context;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const EXPORT_VERSION: i64 = 2;

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    pub tax_percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportAccount {
    pub name: String,
    #[serde(default)]
    pub balance: Decimal,
    #[serde(default)]
    pub is_credit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportIncome {
    pub name: String,
    #[serde(default)]
    pub gross_amount: Decimal,
    #[serde(default = "yes")]
    pub is_taxed: bool,
    #[serde(default)]
    pub tax_percentage: Option<Decimal>,
    #[serde(default)]
    pub is_deduction: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportExpense {
    pub name: String,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub is_savings_goal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportGroup {
    pub name: String,
    pub group_type: GroupType,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub display_order: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportCategory {
    pub name: String,
    pub group_name: String,
    #[serde(default = "yes")]
    pub is_personal: bool,
    #[serde(default)]
    pub display_order: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportEntry {
    pub category_name: String,
    #[serde(default)]
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSnapshot {
    pub month: i64,
    pub year: i64,
    #[serde(default)]
    pub entries: Vec<ExportEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportGoal {
    pub name: String,
    pub goal_type: String,
    pub target_value: Decimal,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub tracking_period: Option<String>,
    #[serde(default)]
    pub target_date: Option<String>,
    #[serde(default = "yes")]
    pub is_active: bool,
}

/// Everything needed to rebuild the database elsewhere. Items reference each
/// other by name, never by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub settings: Option<ExportSettings>,
    #[serde(default)]
    pub accounts: Vec<ExportAccount>,
    #[serde(default)]
    pub income: Vec<ExportIncome>,
    #[serde(default)]
    pub expenses: Vec<ExportExpense>,
    #[serde(default)]
    pub networth_groups: Vec<ExportGroup>,
    #[serde(default)]
    pub networth_categories: Vec<ExportCategory>,
    #[serde(default)]
    pub networth_snapshots: Vec<ExportSnapshot>,
    #[serde(default)]
    pub goals: Vec<ExportGoal>,
}

pub fn export(conn: &Connection) -> Result<ExportDocument> {
    let groups = groups::list(conn)?;
    let categories = categories::list(conn)?;
    let group_names: HashMap<i64, &str> = groups.iter().map(|g| (g.id, g.name.as_str())).collect();
    let category_names: HashMap<i64, &str> =
        categories.iter().map(|c| (c.id, c.name.as_str())).collect();

    let mut history = snapshots::list(conn)?;
    history.reverse();

    let doc = ExportDocument {
        version: EXPORT_VERSION,
        settings: Some(ExportSettings {
            tax_percentage: settings::get(conn)?.tax_percentage,
        }),
        accounts: accounts::list(conn)?
            .into_iter()
            .map(|a| ExportAccount {
                name: a.name,
                balance: a.balance,
                is_credit: a.is_credit,
            })
            .collect(),
        income: income::list(conn)?
            .into_iter()
            .map(|i| ExportIncome {
                name: i.name,
                gross_amount: i.gross_amount,
                is_taxed: i.is_taxed,
                tax_percentage: i.tax_percentage,
                is_deduction: i.is_deduction,
            })
            .collect(),
        expenses: expenses::list(conn)?
            .into_iter()
            .map(|e| ExportExpense {
                name: e.name,
                amount: e.amount,
                is_savings_goal: e.is_savings_goal,
            })
            .collect(),
        networth_groups: groups
            .iter()
            .map(|g| ExportGroup {
                name: g.name.clone(),
                group_type: g.group_type,
                color: Some(g.color.clone()),
                display_order: g.display_order,
            })
            .collect(),
        networth_categories: categories
            .iter()
            .map(|c| ExportCategory {
                name: c.name.clone(),
                group_name: group_names.get(&c.group_id).unwrap_or(&"").to_string(),
                is_personal: c.is_personal,
                display_order: c.display_order,
            })
            .collect(),
        networth_snapshots: history
            .iter()
            .map(|s| ExportSnapshot {
                month: s.month as i64,
                year: s.year as i64,
                entries: s
                    .entries
                    .iter()
                    .map(|e| ExportEntry {
                        category_name: e.category_name.clone(),
                        amount: e.amount,
                    })
                    .collect(),
            })
            .collect(),
        goals: goals::list(conn)?
            .into_iter()
            .rev()
            .map(|g| ExportGoal {
                category_name: g
                    .category_id
                    .and_then(|id| category_names.get(&id))
                    .map(|n| n.to_string()),
                name: g.name,
                goal_type: g.goal_type.as_str().to_string(),
                target_value: g.target_value,
                tracking_period: g.tracking_period.map(|p| p.as_str().to_string()),
                target_date: g.target_date.map(|d| d.to_string()),
                is_active: g.is_active,
            })
            .collect(),
    };
    info!(
        snapshots = doc.networth_snapshots.len(),
        goals = doc.goals.len(),
        "exported data"
    );
    Ok(doc)
}

/// Net-worth history, oldest month first, one row per snapshot.
pub fn write_history_csv<W: Write>(conn: &Connection, out: W) -> anyhow::Result<usize> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record([
        "year",
        "month",
        "total_assets",
        "total_liabilities",
        "net_worth",
        "change_from_previous",
        "personal_wealth",
        "company_wealth",
    ])?;
    let mut history = snapshots::list(conn)?;
    history.reverse();
    for s in &history {
        wtr.write_record([
            s.year.to_string(),
            s.month.to_string(),
            s.total_assets.to_string(),
            s.total_liabilities.to_string(),
            s.net_worth.to_string(),
            s.change_from_previous.to_string(),
            s.personal_wealth.to_string(),
            s.company_wealth.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(history.len())
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> anyhow::Result<()> {
    let out = required_arg(m, "out")?;
    let fmt = m
        .get_one::<String>("format")
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| "json".to_string());
    match fmt.as_str() {
        "json" => {
            let doc = export(conn)?;
            std::fs::write(out, serde_json::to_string_pretty(&doc)?)
                .with_context(|| format!("Write {}", out))?;
            println!("Exported data to {}", out);
        }
        "csv" => {
            let file = std::fs::File::create(out).with_context(|| format!("Create {}", out))?;
            let n = write_history_csv(conn, file)?;
            println!("Exported {} snapshots to {}", n, out);
        }
        other => anyhow::bail!("Unknown format: {} (use json|csv)", other),
    }
    Ok(())
}
