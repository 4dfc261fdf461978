// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use crate::commands::{goals, snapshots};
use crate::error::Result;
use crate::models::GoalType;
use crate::utils::pretty_table;
use rusqlite::Connection;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub kind: &'static str,
    pub detail: String,
}

/// Integrity problems the services would never produce on their own, such
/// as hand-edited totals.
pub fn check(conn: &Connection) -> Result<Vec<Issue>> {
    let mut issues = Vec::new();

    // 1) Stored snapshot totals that no longer match the entries
    let history = snapshots::list(conn)?;
    let by_month: HashMap<_, Decimal> =
        history.iter().map(|s| (s.period(), s.net_worth)).collect();
    for s in &history {
        let fresh = snapshots::derive_totals(&s.entries);
        let stored = snapshots::Totals {
            total_assets: s.total_assets,
            total_liabilities: s.total_liabilities,
            net_worth: s.net_worth,
            personal_wealth: s.personal_wealth,
            company_wealth: s.company_wealth,
        };
        if fresh != stored {
            issues.push(Issue {
                kind: "stale_totals",
                detail: format!(
                    "{}: stored net worth {}, entries give {}",
                    s.period(),
                    s.net_worth,
                    fresh.net_worth
                ),
            });
        }
        let change = by_month
            .get(&s.period().prev())
            .map(|prev| s.net_worth - prev)
            .unwrap_or(Decimal::ZERO);
        if change != s.change_from_previous {
            issues.push(Issue {
                kind: "stale_change",
                detail: format!(
                    "{}: stored change {}, expected {}",
                    s.period(),
                    s.change_from_previous,
                    change
                ),
            });
        }
    }

    // 2) Category goals that lost their category
    for g in goals::list(conn)? {
        if g.goal_type == GoalType::CategoryTarget && g.category_id.is_none() {
            issues.push(Issue {
                kind: "goal_without_category",
                detail: format!("goal {} '{}'", g.id, g.name),
            });
        }
    }
    Ok(issues)
}

pub fn handle(conn: &Connection) -> anyhow::Result<()> {
    let issues = check(conn)?;
    if issues.is_empty() {
        println!("doctor: no issues found");
    } else {
        let rows = issues
            .into_iter()
            .map(|i| vec![i.kind.to_string(), i.detail])
            .collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
