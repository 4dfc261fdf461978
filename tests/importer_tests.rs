// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use nestegg::commands::{
    accounts, categories, goals, groups, importer, networth, settings, snapshots,
};
use nestegg::error::Error;
use nestegg::{cli, db};
use rusqlite::Connection;
use rust_decimal_macros::dec;
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;

fn with_history() -> Connection {
    let conn = db::open_in_memory().unwrap();
    networth::seed_defaults(&conn).unwrap();
    networth::seed_demo_history(&conn, 2024).unwrap();
    conn
}

#[test]
fn version_one_replaces_budget_only() {
    let conn = with_history();
    let counts = importer::import(
        &conn,
        json!({
            "settings": {"tax_percentage": "30"},
            "accounts": [{"name": "Main", "balance": "100.50"}],
            "income": [{"name": "Salary", "gross_amount": 3000}],
            "expenses": [{"name": "Rent", "amount": "900", "is_savings_goal": false}]
        }),
    )
    .unwrap();
    assert_eq!(counts.accounts, 1);
    assert_eq!(counts.networth_snapshots, 0);

    assert_eq!(settings::get(&conn).unwrap().tax_percentage, dec!(30));
    let accts = accounts::list(&conn).unwrap();
    assert_eq!(accts[0].balance, dec!(100.50));
    assert!(!accts[0].is_credit);
    // net-worth data untouched
    assert_eq!(snapshots::count(&conn).unwrap(), 12);
    assert_eq!(categories::list(&conn).unwrap().len(), 11);
}

#[test]
fn version_two_replaces_networth_and_skips_unknown_references() {
    let conn = with_history();
    let counts = importer::import(
        &conn,
        json!({
            "version": 2,
            "networth_groups": [
                {"name": "Cash", "group_type": "asset", "color": "#00ff00", "display_order": 1}
            ],
            "networth_categories": [
                {"name": "Wallet", "group_name": "Cash"},
                {"name": "Ghost", "group_name": "Nowhere"}
            ],
            "networth_snapshots": [
                {"month": 2, "year": 2025, "entries": [
                    {"category_name": "Wallet", "amount": "150"}
                ]},
                {"month": 1, "year": 2025, "entries": [
                    {"category_name": "Wallet", "amount": "100"},
                    {"category_name": "Ghost", "amount": "999"}
                ]}
            ],
            "goals": [
                {"name": "Fat wallet", "goal_type": "category_target", "target_value": "500",
                 "category_name": "Wallet"},
                {"name": "Lost", "goal_type": "category_target", "target_value": "1",
                 "category_name": "Ghost"},
                {"name": "Rich", "goal_type": "net_worth_target", "target_value": "1000000",
                 "target_date": "2030-01-01"}
            ]
        }),
    )
    .unwrap();
    assert_eq!(counts.networth_groups, 1);
    assert_eq!(counts.networth_categories, 1);
    assert_eq!(counts.networth_snapshots, 2);
    assert_eq!(counts.goals, 2);

    assert_eq!(groups::list(&conn).unwrap().len(), 1);
    let feb = snapshots::get_by_month(&conn, 2025, 2).unwrap();
    assert_eq!(feb.net_worth, dec!(150));
    // inserted out of order, still compared with January
    assert_eq!(feb.change_from_previous, dec!(50));
    let jan = snapshots::get_by_month(&conn, 2025, 1).unwrap();
    assert_eq!(jan.entries.len(), 1);
    assert_eq!(snapshots::count(&conn).unwrap(), 2);

    let names: Vec<String> = goals::list(&conn).unwrap().into_iter().map(|g| g.name).collect();
    assert!(names.contains(&"Fat wallet".to_string()));
    assert!(!names.contains(&"Lost".to_string()));
}

#[test]
fn unsupported_version_is_rejected() {
    let conn = with_history();
    let err = importer::import(&conn, json!({"version": 3, "accounts": []})).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(err.to_string(), "Unsupported export version: 3");
    assert_eq!(snapshots::count(&conn).unwrap(), 12);
}

#[test]
fn malformed_document_is_rejected() {
    let conn = db::open_in_memory().unwrap();
    let err = importer::import(&conn, json!({"version": 2, "accounts": "nope"})).unwrap_err();
    assert!(err.to_string().starts_with("Invalid import document"));
}

#[test]
fn failed_import_changes_nothing() {
    let conn = with_history();
    accounts::create(
        &conn,
        nestegg::models::NewAccount {
            name: "Keep me".into(),
            balance: dec!(1),
            is_credit: false,
        },
    )
    .unwrap();

    let err = importer::import(
        &conn,
        json!({
            "version": 2,
            "accounts": [{"name": "New"}],
            "networth_snapshots": [{"month": 13, "year": 2025, "entries": []}]
        }),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let accts = accounts::list(&conn).unwrap();
    assert_eq!(accts.len(), 1);
    assert_eq!(accts[0].name, "Keep me");
    assert_eq!(snapshots::count(&conn).unwrap(), 12);
}

#[test]
fn importer_reads_cli_path() {
    let conn = db::open_in_memory().unwrap();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{"version": 1, "accounts": [{{"name": "Checking", "balance": "42"}}]}}"#
    )
    .unwrap();
    file.flush().unwrap();

    let path = file.path().to_str().unwrap().to_string();
    let matches = cli::build_cli().get_matches_from(["nestegg", "import", "--path", &path]);
    if let Some(("import", import_m)) = matches.subcommand() {
        importer::handle(&conn, import_m).unwrap();
    } else {
        panic!("no import subcommand");
    }
    assert_eq!(accounts::list(&conn).unwrap()[0].balance, dec!(42));
}
