// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::{accounts, expenses, income, settings};
use crate::error::Result;
use crate::models::{Account, BudgetSettings, ExpenseItem, IncomeItem};
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetTotals {
    pub gross_income: Decimal,
    pub net_income: Decimal,
    pub current_balance: Decimal,
    pub total_expenses: Decimal,
    pub savings_allocation: Decimal,
    pub monthly_expenses: Decimal,
    pub net_position: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentBudget {
    pub settings: BudgetSettings,
    pub accounts: Vec<Account>,
    pub income: Vec<IncomeItem>,
    pub expenses: Vec<ExpenseItem>,
    pub totals: BudgetTotals,
}

pub fn totals(
    settings: &BudgetSettings,
    accounts: &[Account],
    income_items: &[IncomeItem],
    expense_items: &[ExpenseItem],
) -> BudgetTotals {
    let current_balance: Decimal = accounts.iter().map(|a| a.balance).sum();
    let total_expenses: Decimal = expense_items.iter().map(|e| e.amount).sum();
    let savings_allocation = expenses::savings_total(expense_items);
    BudgetTotals {
        gross_income: income::gross_income(income_items),
        net_income: income::net_income(income_items, settings.tax_percentage),
        current_balance,
        total_expenses,
        savings_allocation,
        monthly_expenses: total_expenses - savings_allocation,
        net_position: current_balance - total_expenses,
    }
}

pub fn current(conn: &Connection) -> Result<CurrentBudget> {
    let settings = settings::get(conn)?;
    let accounts = accounts::list(conn)?;
    let income = income::list(conn)?;
    let expenses = expenses::list(conn)?;
    let totals = totals(&settings, &accounts, &income, &expenses);
    Ok(CurrentBudget {
        settings,
        accounts,
        income,
        expenses,
        totals,
    })
}

/// Account balances shaped for pre-filling a net-worth snapshot form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrefillItem {
    pub name: String,
    pub amount: Decimal,
    pub is_liability: bool,
}

pub fn snapshot_prefill(conn: &Connection) -> Result<Vec<PrefillItem>> {
    Ok(accounts::list(conn)?
        .into_iter()
        .map(|a| PrefillItem {
            name: a.name,
            amount: a.balance.abs(),
            is_liability: a.is_credit,
        })
        .collect())
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> anyhow::Result<()> {
    match m.subcommand() {
        Some(("prefill", sub)) => {
            let items = snapshot_prefill(conn)?;
            if !maybe_print_json(sub.get_flag("json"), false, &items)? {
                let data = items
                    .iter()
                    .map(|p| {
                        vec![
                            p.name.clone(),
                            fmt_money(&p.amount),
                            if p.is_liability { "liability" } else { "asset" }.to_string(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Account", "Amount", "Kind"], data));
            }
        }
        Some(("show", sub)) => show(conn, sub.get_flag("json"))?,
        _ => show(conn, false)?,
    }
    Ok(())
}

fn show(conn: &Connection, json: bool) -> anyhow::Result<()> {
    let budget = current(conn)?;
    if maybe_print_json(json, false, &budget)? {
        return Ok(());
    }
    let t = &budget.totals;
    let rows = vec![
        ("Gross income", t.gross_income),
        ("Net income", t.net_income),
        ("Current balance", t.current_balance),
        ("Monthly expenses", t.monthly_expenses),
        ("Savings allocation", t.savings_allocation),
        ("Total expenses", t.total_expenses),
        ("Net position", t.net_position),
    ]
    .into_iter()
    .map(|(k, v)| vec![k.to_string(), fmt_money(&v)])
    .collect();
    println!(
        "Default tax: {}%\n{}",
        budget.settings.tax_percentage,
        pretty_table(&["Total", "Amount"], rows)
    );
    Ok(())
}
