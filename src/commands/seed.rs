// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Demo budget data and the budget reset.

use crate::commands::settings::DEFAULT_TAX_PERCENTAGE;
use crate::error::Result;
use rusqlite::{Connection, params};
use serde::Serialize;
use tracing::info;

/// (name, gross, tax override, is_deduction)
const DEMO_INCOME: &[(&str, &str, Option<&str>, bool)] = &[
    ("Salary", "5000.00", None, false),
    ("Side income", "500.00", None, false),
    ("Lunch benefit", "200.00", Some("75.0"), true),
];

/// (name, balance, is_credit)
const DEMO_ACCOUNTS: &[(&str, &str, bool)] = &[
    ("Checking", "3500.00", false),
    ("Savings", "2000.00", false),
    ("Credit Card", "-500.00", true),
];

/// (name, amount, is_savings_goal)
const DEMO_EXPENSES: &[(&str, &str, bool)] = &[
    ("Rent", "1200.00", false),
    ("Groceries", "400.00", false),
    ("Utilities", "150.00", false),
    ("Transport", "100.00", false),
    ("Subscriptions", "50.00", false),
    ("Savings", "500.00", true),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedCounts {
    pub settings: usize,
    pub income_items: usize,
    pub accounts: usize,
    pub expenses: usize,
}

pub(crate) fn clear_budget(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "DELETE FROM accounts;
         DELETE FROM income_items;
         DELETE FROM expense_items;
         DELETE FROM settings;",
    )?;
    Ok(())
}

fn write_default_settings(conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES ('tax_percentage', ?1)",
        params![DEFAULT_TAX_PERCENTAGE.to_string()],
    )?;
    Ok(())
}

/// Replaces all budget data with the demo set.
pub fn seed_budget(conn: &Connection) -> Result<SeedCounts> {
    let tx = conn.unchecked_transaction()?;
    clear_budget(&tx)?;
    write_default_settings(&tx)?;
    for (name, gross, tax, deduction) in DEMO_INCOME {
        tx.execute(
            "INSERT INTO income_items(name, gross_amount, is_taxed, tax_percentage, is_deduction)
             VALUES (?1, ?2, 1, ?3, ?4)",
            params![name, gross, tax, deduction],
        )?;
    }
    for (name, balance, credit) in DEMO_ACCOUNTS {
        tx.execute(
            "INSERT INTO accounts(name, balance, is_credit) VALUES (?1, ?2, ?3)",
            params![name, balance, credit],
        )?;
    }
    for (name, amount, savings) in DEMO_EXPENSES {
        tx.execute(
            "INSERT INTO expense_items(name, amount, is_savings_goal) VALUES (?1, ?2, ?3)",
            params![name, amount, savings],
        )?;
    }
    tx.commit()?;
    let counts = SeedCounts {
        settings: 1,
        income_items: DEMO_INCOME.len(),
        accounts: DEMO_ACCOUNTS.len(),
        expenses: DEMO_EXPENSES.len(),
    };
    info!(?counts, "seeded demo budget");
    Ok(counts)
}

/// Clears accounts, income and expenses and restores default settings.
pub fn reset_budget(conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    clear_budget(&tx)?;
    write_default_settings(&tx)?;
    tx.commit()?;
    info!("budget data reset");
    Ok(())
}
