// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::forecasting::Period;

fn yes() -> bool {
    true
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in partial updates.
fn nullable<'de, D, T>(d: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}

// ---------------------------------------------------------------------------
// Budget
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub balance: Decimal,
    pub is_credit: bool,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub name: String,
    #[serde(default)]
    pub balance: Decimal,
    #[serde(default)]
    pub is_credit: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub balance: Option<Decimal>,
    pub is_credit: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeItem {
    pub id: i64,
    pub name: String,
    pub gross_amount: Decimal,
    pub is_taxed: bool,
    pub tax_percentage: Option<Decimal>,
    pub is_deduction: bool,
}

impl IncomeItem {
    /// Monthly amount that actually reaches the accounts.
    ///
    /// Deductions use their own percentage as the deducted share and come out
    /// negative; taxed income prefers the item's own rate over the default.
    pub fn net_amount(&self, default_tax_percentage: Decimal) -> Decimal {
        let hundred = Decimal::ONE_HUNDRED;
        if self.is_deduction {
            let rate = self.tax_percentage.unwrap_or(Decimal::ZERO);
            return -self.gross_amount * rate / hundred;
        }
        if !self.is_taxed {
            return self.gross_amount;
        }
        let rate = self.tax_percentage.unwrap_or(default_tax_percentage);
        self.gross_amount * (Decimal::ONE - rate / hundred)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewIncome {
    pub name: String,
    pub gross_amount: Decimal,
    #[serde(default = "yes")]
    pub is_taxed: bool,
    #[serde(default)]
    pub tax_percentage: Option<Decimal>,
    #[serde(default)]
    pub is_deduction: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncomeUpdate {
    pub name: Option<String>,
    pub gross_amount: Option<Decimal>,
    pub is_taxed: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub tax_percentage: Option<Option<Decimal>>,
    pub is_deduction: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseItem {
    pub id: i64,
    pub name: String,
    pub amount: Decimal,
    pub is_savings_goal: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewExpense {
    pub name: String,
    pub amount: Decimal,
    #[serde(default)]
    pub is_savings_goal: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseUpdate {
    pub name: Option<String>,
    pub amount: Option<Decimal>,
    pub is_savings_goal: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSettings {
    pub tax_percentage: Decimal,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub tax_percentage: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Net worth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupType {
    Asset,
    Liability,
}

impl GroupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupType::Asset => "asset",
            GroupType::Liability => "liability",
        }
    }
}

impl FromStr for GroupType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asset" => Ok(GroupType::Asset),
            "liability" => Ok(GroupType::Liability),
            _ => Err(Error::validation(
                "group_type must be one of: asset, liability",
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetWorthGroup {
    pub id: i64,
    pub name: String,
    pub group_type: GroupType,
    pub color: String,
    pub display_order: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewGroup {
    pub name: String,
    pub group_type: String,
    pub color: Option<String>,
    #[serde(default)]
    pub display_order: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupUpdate {
    pub name: Option<String>,
    pub group_type: Option<String>,
    pub color: Option<String>,
    pub display_order: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetWorthCategory {
    pub id: i64,
    pub name: String,
    pub group_id: i64,
    pub is_personal: bool,
    pub display_order: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub group_id: i64,
    #[serde(default = "yes")]
    pub is_personal: bool,
    #[serde(default)]
    pub display_order: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub group_id: Option<i64>,
    pub is_personal: Option<bool>,
    pub display_order: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub id: i64,
    pub category_id: i64,
    pub category_name: String,
    pub group_id: i64,
    pub group_type: GroupType,
    pub is_personal: bool,
    pub amount: Decimal,
}

/// Total of one group inside a snapshot, with its share of the assets (or
/// of the liabilities for liability groups).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupBreakdown {
    pub group_id: i64,
    pub name: String,
    pub group_type: GroupType,
    pub color: String,
    pub total: Decimal,
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetWorthSnapshot {
    pub id: i64,
    pub month: u32,
    pub year: i32,
    pub timestamp: String,
    pub total_assets: Decimal,
    pub total_liabilities: Decimal,
    pub net_worth: Decimal,
    pub change_from_previous: Decimal,
    pub personal_wealth: Decimal,
    pub company_wealth: Decimal,
    pub entries: Vec<SnapshotEntry>,
    pub groups: Vec<GroupBreakdown>,
}

impl NetWorthSnapshot {
    pub fn period(&self) -> YearMonth {
        YearMonth::new(self.year, self.month)
    }

    pub fn amount_for(&self, category_id: i64) -> Decimal {
        self.entries
            .iter()
            .find(|e| e.category_id == category_id)
            .map(|e| e.amount)
            .unwrap_or(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntryInput {
    pub category_id: i64,
    #[serde(default)]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSnapshot {
    pub month: i64,
    pub year: i64,
    #[serde(default)]
    pub entries: Vec<EntryInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotUpdate {
    pub month: Option<i64>,
    pub year: Option<i64>,
    pub entries: Option<Vec<EntryInput>>,
}

// ---------------------------------------------------------------------------
// Goals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    NetWorth,
    CategoryTarget,
    MonthlySavings,
    SavingsRate,
}

impl GoalType {
    pub const ALL: [GoalType; 4] = [
        GoalType::NetWorth,
        GoalType::CategoryTarget,
        GoalType::MonthlySavings,
        GoalType::SavingsRate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::NetWorth => "net_worth",
            GoalType::CategoryTarget => "category_target",
            GoalType::MonthlySavings => "monthly_savings",
            GoalType::SavingsRate => "savings_rate",
        }
    }

    /// Goals whose current value is itself a monthly pace rather than a
    /// balance that grows towards the target.
    pub fn is_rate(&self) -> bool {
        matches!(self, GoalType::MonthlySavings | GoalType::SavingsRate)
    }
}

impl FromStr for GoalType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "net_worth" | "net_worth_target" => Ok(GoalType::NetWorth),
            "category_target" | "savings_goal" => Ok(GoalType::CategoryTarget),
            "monthly_savings" => Ok(GoalType::MonthlySavings),
            "savings_rate" | "category_rate" => Ok(GoalType::SavingsRate),
            _ => {
                let names: Vec<&str> = GoalType::ALL.iter().map(|t| t.as_str()).collect();
                Err(Error::validation(format!(
                    "goal_type must be one of: {}",
                    names.join(", ")
                )))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub name: String,
    pub goal_type: GoalType,
    pub target_value: Decimal,
    pub category_id: Option<i64>,
    pub tracking_period: Option<Period>,
    pub target_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewGoal {
    pub name: String,
    pub goal_type: String,
    pub target_value: Decimal,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub tracking_period: Option<String>,
    #[serde(default)]
    pub target_date: Option<String>,
    #[serde(default = "yes")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoalUpdate {
    pub name: Option<String>,
    pub goal_type: Option<String>,
    pub target_value: Option<Decimal>,
    #[serde(default, deserialize_with = "nullable")]
    pub category_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub tracking_period: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub target_date: Option<Option<String>>,
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Calendar months
// ---------------------------------------------------------------------------

/// A calendar month, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        YearMonth { year, month }
    }

    pub fn of(date: NaiveDate) -> Self {
        YearMonth::new(date.year(), date.month())
    }

    fn index(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    fn from_index(idx: i64) -> Option<Self> {
        let year = i32::try_from(idx.div_euclid(12)).ok()?;
        Some(YearMonth::new(year, idx.rem_euclid(12) as u32 + 1))
    }

    /// `None` once the year no longer fits an `i32`.
    pub fn checked_plus(&self, months: i64) -> Option<Self> {
        YearMonth::from_index(self.index().checked_add(months)?)
    }

    /// Like [`YearMonth::checked_plus`], pinned to the first or last
    /// representable month on overflow.
    pub fn plus(&self, months: i64) -> Self {
        self.checked_plus(months).unwrap_or(if months < 0 {
            YearMonth::new(i32::MIN, 1)
        } else {
            YearMonth::new(i32::MAX, 12)
        })
    }

    pub fn next(&self) -> Self {
        self.plus(1)
    }

    pub fn prev(&self) -> Self {
        self.plus(-1)
    }

    /// Signed number of calendar months from `self` to `other`.
    pub fn months_until(&self, other: YearMonth) -> i64 {
        other.index() - self.index()
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}
