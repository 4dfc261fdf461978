// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use nestegg::commands::{categories, goals, groups, networth, snapshots};
use nestegg::db;
use nestegg::error::Error;
use nestegg::models::{
    EntryInput, GroupUpdate, NewCategory, NewGoal, NewGroup, NewSnapshot, SnapshotUpdate,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

struct Taxonomy {
    cash: i64,
    company_cash: i64,
    loan: i64,
    loans_group: i64,
}

fn setup() -> (Connection, Taxonomy) {
    let conn = db::open_in_memory().unwrap();
    let assets = groups::create(
        &conn,
        NewGroup {
            name: "Cash".into(),
            group_type: "asset".into(),
            color: None,
            display_order: 1,
        },
    )
    .unwrap();
    let loans = groups::create(
        &conn,
        NewGroup {
            name: "Loans".into(),
            group_type: "liability".into(),
            color: Some("#ef4444".into()),
            display_order: 2,
        },
    )
    .unwrap();
    let cat = |name: &str, group_id: i64, is_personal: bool| {
        categories::create(
            &conn,
            NewCategory {
                name: name.into(),
                group_id,
                is_personal,
                display_order: 0,
            },
        )
        .unwrap()
        .id
    };
    let t = Taxonomy {
        cash: cat("Checking", assets.id, true),
        company_cash: cat("Company Checkings", assets.id, false),
        loan: cat("Student Loan", loans.id, true),
        loans_group: loans.id,
    };
    (conn, t)
}

fn entries(pairs: &[(i64, Decimal)]) -> Vec<EntryInput> {
    pairs
        .iter()
        .map(|(category_id, amount)| EntryInput {
            category_id: *category_id,
            amount: *amount,
        })
        .collect()
}

fn snapshot(conn: &Connection, year: i64, month: i64, pairs: &[(i64, Decimal)]) -> i64 {
    snapshots::create(
        conn,
        NewSnapshot {
            month,
            year,
            entries: entries(pairs),
        },
    )
    .unwrap()
    .id
}

#[test]
fn totals_are_derived_from_entries() {
    let (conn, t) = setup();
    let id = snapshot(
        &conn,
        2024,
        3,
        &[(t.cash, dec!(3000)), (t.company_cash, dec!(1000)), (t.loan, dec!(1500))],
    );
    let s = snapshots::get(&conn, id).unwrap();
    assert_eq!(s.total_assets, dec!(4000));
    // entered positive, stored as owed
    assert_eq!(s.total_liabilities, dec!(-1500));
    assert_eq!(s.net_worth, dec!(2500));
    assert_eq!(s.personal_wealth, dec!(1500));
    assert_eq!(s.company_wealth, dec!(1000));
    assert_eq!(s.change_from_previous, dec!(0));

    assert_eq!(s.groups.len(), 2);
    assert_eq!(s.groups[0].name, "Cash");
    assert_eq!(s.groups[0].percentage, dec!(100));
    assert_eq!(s.groups[1].total, dec!(-1500));
    assert_eq!(s.groups[1].percentage, dec!(100));
    assert_eq!(s.groups[0].color, groups::DEFAULT_COLOR);
}

#[test]
fn group_breakdown_skips_empty_groups() {
    let (conn, t) = setup();
    let id = snapshot(&conn, 2024, 1, &[(t.cash, dec!(750)), (t.company_cash, dec!(250))]);
    let s = snapshots::get(&conn, id).unwrap();
    assert_eq!(s.groups.len(), 1);
    assert_eq!(s.groups[0].total, dec!(1000));
    assert_eq!(s.amount_for(t.cash), dec!(750));
    assert_eq!(s.amount_for(t.loan), dec!(0));
}

#[test]
fn change_follows_the_previous_calendar_month() {
    let (conn, t) = setup();
    snapshot(&conn, 2024, 1, &[(t.cash, dec!(1000))]);
    let feb = snapshot(&conn, 2024, 2, &[(t.cash, dec!(1300))]);
    // gap: April has no March to compare with
    let apr = snapshot(&conn, 2024, 4, &[(t.cash, dec!(2000))]);

    assert_eq!(snapshots::get(&conn, feb).unwrap().change_from_previous, dec!(300));
    assert_eq!(snapshots::get(&conn, apr).unwrap().change_from_previous, dec!(0));

    // filling the gap re-derives April
    snapshot(&conn, 2024, 3, &[(t.cash, dec!(1800))]);
    assert_eq!(snapshots::get(&conn, apr).unwrap().change_from_previous, dec!(200));
}

#[test]
fn editing_entries_updates_the_following_month() {
    let (conn, t) = setup();
    let jan = snapshot(&conn, 2024, 1, &[(t.cash, dec!(1000))]);
    let feb = snapshot(&conn, 2024, 2, &[(t.cash, dec!(1500))]);

    let updated = snapshots::update(
        &conn,
        jan,
        SnapshotUpdate {
            entries: Some(entries(&[(t.cash, dec!(1200)), (t.loan, dec!(-100))])),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(updated.net_worth, dec!(1100));
    assert_eq!(updated.entries.len(), 2);
    assert_eq!(snapshots::get(&conn, feb).unwrap().change_from_previous, dec!(400));
}

#[test]
fn moving_and_deleting_recalculate_neighbours() {
    let (conn, t) = setup();
    let jan = snapshot(&conn, 2024, 1, &[(t.cash, dec!(1000))]);
    let feb = snapshot(&conn, 2024, 2, &[(t.cash, dec!(1500))]);
    let jun = snapshot(&conn, 2024, 6, &[(t.cash, dec!(900))]);

    // January moves to May: February loses its predecessor, June gains one
    let moved = snapshots::update(
        &conn,
        jan,
        SnapshotUpdate {
            month: Some(5),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!((moved.year, moved.month), (2024, 5));
    assert_eq!(snapshots::get(&conn, feb).unwrap().change_from_previous, dec!(0));
    assert_eq!(snapshots::get(&conn, jun).unwrap().change_from_previous, dec!(-100));

    snapshots::delete(&conn, jan).unwrap();
    assert_eq!(snapshots::get(&conn, jun).unwrap().change_from_previous, dec!(0));
    assert!(matches!(snapshots::get(&conn, jan), Err(Error::NotFound(_))));
}

#[test]
fn one_snapshot_per_month() {
    let (conn, t) = setup();
    snapshot(&conn, 2024, 7, &[(t.cash, dec!(1))]);
    let err = snapshots::create(
        &conn,
        NewSnapshot {
            month: 7,
            year: 2024,
            entries: vec![],
        },
    )
    .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
    assert_eq!(err.to_string(), "Snapshot for 2024-07 already exists");

    let aug = snapshot(&conn, 2024, 8, &[]);
    let err = snapshots::update(
        &conn,
        aug,
        SnapshotUpdate {
            month: Some(7),
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

#[test]
fn snapshot_input_validation() {
    let (conn, t) = setup();
    let bad = |month: i64, year: i64, pairs: &[(i64, Decimal)]| {
        snapshots::create(
            &conn,
            NewSnapshot {
                month,
                year,
                entries: entries(pairs),
            },
        )
        .unwrap_err()
    };
    assert_eq!(bad(13, 2024, &[]).to_string(), "month must be between 1 and 12");
    assert!(matches!(bad(1, 1800, &[]), Error::Validation(_)));
    assert_eq!(bad(1, 2024, &[(999, dec!(1))]).to_string(), "Category 999 not found");
    assert!(matches!(
        bad(1, 2024, &[(t.cash, dec!(1)), (t.cash, dec!(2))]),
        Error::Validation(_)
    ));
    assert_eq!(
        bad(1, 2024, &[(t.cash, dec!(1000000001))]).to_string(),
        "entries[0].amount exceeds maximum allowed value"
    );
    assert_eq!(snapshots::count(&conn).unwrap(), 0);
}

#[test]
fn get_by_month_finds_the_snapshot() {
    let (conn, t) = setup();
    let id = snapshot(&conn, 2023, 12, &[(t.cash, dec!(5))]);
    assert_eq!(snapshots::get_by_month(&conn, 2023, 12).unwrap().id, id);
    assert!(matches!(
        snapshots::get_by_month(&conn, 2023, 11),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        snapshots::get_by_month(&conn, 2023, 0),
        Err(Error::Validation(_))
    ));
}

#[test]
fn deletion_is_blocked_while_referenced() {
    let (conn, t) = setup();
    let err = groups::delete(&conn, t.loans_group).unwrap_err();
    assert_eq!(err.to_string(), "Cannot delete group: has 1 categories");

    snapshot(&conn, 2024, 1, &[(t.loan, dec!(10))]);
    let err = categories::delete(&conn, t.loan).unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
    assert!(err.to_string().contains("snapshot entries"));

    goals::create(
        &conn,
        NewGoal {
            name: "Cash pile".into(),
            goal_type: "category_target".into(),
            target_value: dec!(10000),
            category_id: Some(t.company_cash),
            tracking_period: None,
            target_date: None,
            is_active: true,
        },
    )
    .unwrap();
    let err = categories::delete(&conn, t.company_cash).unwrap_err();
    assert_eq!(err.to_string(), "Cannot delete category: used by 1 goals");
}

#[test]
fn group_update_validates_type_and_color() {
    let (conn, t) = setup();
    let err = groups::update(
        &conn,
        t.loans_group,
        GroupUpdate {
            color: Some("red".into()),
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    let err = groups::update(
        &conn,
        t.loans_group,
        GroupUpdate {
            group_type: Some("equity".into()),
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn category_needs_an_existing_group() {
    let (conn, _) = setup();
    let err = categories::create(
        &conn,
        NewCategory {
            name: "Orphan".into(),
            group_id: 99,
            is_personal: true,
            display_order: 0,
        },
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Group 99 not found");
}

#[test]
fn default_taxonomy_and_demo_history() {
    let conn = db::open_in_memory().unwrap();
    assert!(matches!(
        networth::seed_demo_history(&conn, 2024),
        Err(Error::Validation(_))
    ));

    let counts = networth::seed_defaults(&conn).unwrap();
    assert_eq!(counts.groups, 6);
    assert_eq!(counts.categories, 11);
    assert!(matches!(networth::seed_defaults(&conn), Err(Error::Conflict(_))));

    assert_eq!(networth::seed_demo_history(&conn, 2024).unwrap(), 12);
    let jan = snapshots::get_by_month(&conn, 2024, 1).unwrap();
    assert_eq!(jan.total_assets, dec!(55200));
    assert_eq!(jan.total_liabilities, dec!(-5500));
    assert_eq!(jan.net_worth, dec!(49700));
    assert_eq!(jan.personal_wealth, dec!(39700));
    assert_eq!(jan.company_wealth, dec!(10000));

    let dec_ = snapshots::get_by_month(&conn, 2024, 12).unwrap();
    assert_eq!(dec_.net_worth, dec!(92000));
    assert_eq!(dec_.change_from_previous, dec!(4550));

    let err = networth::seed_demo_history(&conn, 2024).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Net worth data already exists. Delete first to reseed."
    );
}

#[test]
fn demo_history_rejects_out_of_range_years() {
    let conn = db::open_in_memory().unwrap();
    networth::seed_defaults(&conn).unwrap();
    for year in [1200, 2101] {
        let err = networth::seed_demo_history(&conn, year).unwrap_err();
        assert_eq!(err.to_string(), "year must be between 1900 and 2100");
    }
    assert!(snapshots::list(&conn).unwrap().is_empty());
    assert_eq!(networth::seed_demo_history(&conn, 2100).unwrap(), 12);
}

#[test]
fn reset_removes_everything_but_keeps_goals() {
    let (conn, t) = setup();
    snapshot(&conn, 2024, 1, &[(t.cash, dec!(10))]);
    let goal = goals::create(
        &conn,
        NewGoal {
            name: "Emergency fund".into(),
            goal_type: "category_target".into(),
            target_value: dec!(5000),
            category_id: Some(t.cash),
            tracking_period: None,
            target_date: None,
            is_active: true,
        },
    )
    .unwrap();

    networth::reset(&conn).unwrap();
    assert_eq!(snapshots::count(&conn).unwrap(), 0);
    assert!(categories::list(&conn).unwrap().is_empty());
    assert!(groups::list(&conn).unwrap().is_empty());
    assert_eq!(goals::get(&conn, goal.id).unwrap().category_id, None);
}
