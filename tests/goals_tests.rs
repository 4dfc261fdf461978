// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use nestegg::commands::goals::{self, GoalStatus};
use nestegg::commands::{categories, networth, seed};
use nestegg::db;
use nestegg::error::Error;
use nestegg::models::{GoalType, GoalUpdate, NewGoal};
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Default taxonomy, twelve months of 2024 history and the demo budget.
fn demo() -> Connection {
    let conn = db::open_in_memory().unwrap();
    networth::seed_defaults(&conn).unwrap();
    networth::seed_demo_history(&conn, 2024).unwrap();
    seed::seed_budget(&conn).unwrap();
    conn
}

fn goal(kind: &str, target: Decimal) -> NewGoal {
    NewGoal {
        name: format!("{kind} goal"),
        goal_type: kind.into(),
        target_value: target,
        category_id: None,
        tracking_period: None,
        target_date: None,
        is_active: true,
    }
}

fn category_id(conn: &Connection, name: &str) -> i64 {
    categories::list(conn)
        .unwrap()
        .into_iter()
        .find(|c| c.name == name)
        .unwrap()
        .id
}

#[test]
fn net_worth_goal_on_track() {
    let conn = demo();
    let g = goals::create(
        &conn,
        NewGoal {
            target_date: Some("2025-06-30".into()),
            ..goal("net_worth", dec!(100000))
        },
    )
    .unwrap();

    let p = goals::progress_for(&conn, g.id).unwrap();
    assert_eq!(p.current_value, dec!(92000));
    assert_eq!(p.progress_percentage, dec!(92));
    assert!(!p.is_achieved);
    assert_eq!(p.data_months, 12);
    assert_eq!(p.details.latest_month.as_deref(), Some("2024-12"));

    let f = p.forecast.unwrap();
    // last quarter: (4550 + 4430 + 4720) / 3
    assert_eq!(f.current_monthly_change, dec!(4566.67));
    assert_eq!(f.months_until_target, Some(2));
    assert_eq!(f.forecast_date.unwrap().to_string(), "2025-02-01");
    assert_eq!(f.required_monthly_change, dec!(1333.33));
    assert!(f.on_track);
    assert_eq!(p.status, Some(GoalStatus::OnTrack));
}

#[test]
fn net_worth_goal_behind() {
    let conn = demo();
    let g = goals::create(
        &conn,
        NewGoal {
            target_date: Some("2025-06-30".into()),
            ..goal("net_worth", dec!(1000000))
        },
    )
    .unwrap();
    let p = goals::progress_for(&conn, g.id).unwrap();
    assert_eq!(p.status, Some(GoalStatus::Behind));
    assert!(!p.forecast.unwrap().on_track);
}

#[test]
fn status_needs_a_deadline() {
    let conn = demo();
    let g = goals::create(&conn, goal("net_worth", dec!(100000))).unwrap();
    let p = goals::progress_for(&conn, g.id).unwrap();
    assert!(p.forecast.is_some());
    assert_eq!(p.status, None);
}

#[test]
fn status_needs_three_months_of_history() {
    let conn = db::open_in_memory().unwrap();
    let g = goals::create(
        &conn,
        NewGoal {
            target_date: Some("2030-01-01".into()),
            ..goal("net_worth", dec!(1000))
        },
    )
    .unwrap();
    let p = goals::progress_for(&conn, g.id).unwrap();
    assert_eq!(p.current_value, dec!(0));
    assert_eq!(p.data_months, 0);
    assert_eq!(p.status, None);
}

#[test]
fn category_target_tracks_latest_entry() {
    let conn = demo();
    let savings = category_id(&conn, "Savings");
    let g = goals::create(
        &conn,
        NewGoal {
            category_id: Some(savings),
            ..goal("category_target", dec!(20000))
        },
    )
    .unwrap();
    let p = goals::progress_for(&conn, g.id).unwrap();
    assert_eq!(p.current_value, dec!(13500));
    assert_eq!(p.progress_percentage, dec!(67.5));
    assert_eq!(p.category_name.as_deref(), Some("Savings"));
}

#[test]
fn rate_goals_read_the_budget() {
    let conn = demo();
    let monthly = goals::create(&conn, goal("monthly_savings", dec!(400))).unwrap();
    let rate = goals::create(&conn, goal("savings_rate", dec!(20))).unwrap();

    let p = goals::progress_for(&conn, monthly.id).unwrap();
    assert_eq!(p.current_value, dec!(500));
    assert!(p.is_achieved);
    assert_eq!(p.progress_percentage, dec!(100));
    assert!(p.forecast.is_none());

    let p = goals::progress_for(&conn, rate.id).unwrap();
    // 500 / 3975
    assert_eq!(p.current_value, dec!(12.58));
    assert_eq!(p.progress_percentage, dec!(62.9));
    assert_eq!(p.details.net_income, Some(dec!(3975)));
    assert_eq!(p.details.savings_amount, Some(dec!(500)));
    assert!(!p.is_achieved);
}

#[test]
fn progress_lists_active_goals_only() {
    let conn = demo();
    goals::create(&conn, goal("net_worth", dec!(1))).unwrap();
    goals::create(
        &conn,
        NewGoal {
            is_active: false,
            ..goal("monthly_savings", dec!(1))
        },
    )
    .unwrap();
    let all = goals::progress(&conn).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].goal.goal_type, GoalType::NetWorth);
}

#[test]
fn goal_validation() {
    let conn = demo();
    let err = goals::create(&conn, goal("savings_rate", dec!(150))).unwrap_err();
    assert_eq!(
        err.to_string(),
        "savings_rate target_value must be between 0 and 100"
    );

    let err = goals::create(&conn, goal("category_target", dec!(1))).unwrap_err();
    assert_eq!(
        err.to_string(),
        "category_id is required for category_target goals"
    );

    let err = goals::create(
        &conn,
        NewGoal {
            category_id: Some(9999),
            ..goal("category_target", dec!(1))
        },
    )
    .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    assert!(matches!(
        goals::create(&conn, goal("lottery", dec!(1))),
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        goals::create(
            &conn,
            NewGoal {
                target_date: Some("next tuesday".into()),
                ..goal("net_worth", dec!(1))
            }
        ),
        Err(Error::Validation(_))
    ));
    assert!(goals::list(&conn).unwrap().is_empty());
}

#[test]
fn legacy_type_names_are_accepted() {
    let conn = demo();
    let g = goals::create(&conn, goal("net_worth_target", dec!(5))).unwrap();
    assert_eq!(g.goal_type, GoalType::NetWorth);
}

#[test]
fn update_can_clear_the_deadline() {
    let conn = demo();
    let g = goals::create(
        &conn,
        NewGoal {
            target_date: Some("2026-01-01T00:00:00Z".into()),
            tracking_period: Some("year".into()),
            ..goal("net_worth", dec!(5))
        },
    )
    .unwrap();
    assert_eq!(g.target_date.unwrap().to_string(), "2026-01-01");

    let g = goals::update(
        &conn,
        g.id,
        GoalUpdate {
            target_date: Some(None),
            target_value: Some(dec!(7)),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(g.target_date, None);
    assert_eq!(g.target_value, dec!(7));
    assert!(g.tracking_period.is_some());

    goals::delete(&conn, g.id).unwrap();
    assert!(matches!(goals::get(&conn, g.id), Err(Error::NotFound(_))));
    assert!(matches!(goals::delete(&conn, g.id), Err(Error::NotFound(_))));
}

#[test]
fn trajectory_to_the_deadline() {
    let conn = demo();
    let g = goals::create(
        &conn,
        NewGoal {
            target_date: Some("2025-06-30".into()),
            ..goal("net_worth", dec!(100000))
        },
    )
    .unwrap();
    let t = goals::trajectory(&conn, g.id).unwrap();
    assert_eq!(t.current_trajectory.len(), 7);
    assert_eq!(t.required_trajectory.len(), 7);
    assert_eq!(t.current_trajectory[0].label, "2024-12");
    assert_eq!(t.current_trajectory[0].value, dec!(92000));
    let last = t.required_trajectory.last().unwrap();
    assert_eq!(last.label, "2025-06");
    assert_eq!(last.value, dec!(100000));
    assert_eq!(t.required_rate, dec!(1333.33));
    assert_eq!(t.current_rate, dec!(4566.67));
}

#[test]
fn trajectory_preconditions() {
    let conn = demo();
    let no_date = goals::create(&conn, goal("net_worth", dec!(1))).unwrap();
    assert_eq!(
        goals::trajectory(&conn, no_date.id).unwrap_err().to_string(),
        "Goal has no target_date"
    );

    let rate = goals::create(
        &conn,
        NewGoal {
            target_date: Some("2026-01-01".into()),
            ..goal("savings_rate", dec!(10))
        },
    )
    .unwrap();
    assert!(matches!(
        goals::trajectory(&conn, rate.id),
        Err(Error::Validation(_))
    ));

    let past = goals::create(
        &conn,
        NewGoal {
            target_date: Some("2024-06-01".into()),
            ..goal("net_worth", dec!(1000000))
        },
    )
    .unwrap();
    let t = goals::trajectory(&conn, past.id).unwrap();
    assert!(t.current_trajectory.is_empty());
    assert!(t.required_trajectory.is_empty());
}

#[test]
fn progress_percentage_bounds() {
    assert_eq!(goals::progress_percentage(dec!(0), dec!(0)), dec!(100));
    assert_eq!(goals::progress_percentage(dec!(-5), dec!(0)), dec!(0));
    assert_eq!(goals::progress_percentage(dec!(150), dec!(100)), dec!(100));
    assert_eq!(goals::progress_percentage(dec!(-10), dec!(100)), dec!(0));
    assert_eq!(goals::progress_percentage(dec!(1), dec!(3)), dec!(33.33));

    let sliver = dec!(0.000000000000000000000000001);
    assert_eq!(goals::progress_percentage(dec!(1000000000), sliver), dec!(100));
    assert_eq!(goals::progress_percentage(dec!(-1000000000), sliver), dec!(0));
    assert_eq!(goals::progress_percentage(Decimal::MAX, dec!(20)), dec!(100));
}

#[test]
fn create_stores_every_field_in_one_statement() {
    let conn = demo();
    conn.execute_batch(
        "CREATE TRIGGER goals_frozen BEFORE UPDATE ON goals
         BEGIN SELECT RAISE(ABORT, 'goals are read-only'); END;",
    )
    .unwrap();
    let cash = category_id(&conn, "Checking");
    let g = goals::create(
        &conn,
        NewGoal {
            category_id: Some(cash),
            tracking_period: Some("half_year".into()),
            target_date: Some("2026-03-31".into()),
            is_active: false,
            ..goal("category_target", dec!(20000))
        },
    )
    .unwrap();

    let stored = goals::get(&conn, g.id).unwrap();
    assert_eq!(stored.category_id, Some(cash));
    assert_eq!(stored.tracking_period.map(|p| p.as_str()), Some("half_year"));
    assert_eq!(stored.target_date.map(|d| d.to_string()).as_deref(), Some("2026-03-31"));
    assert!(!stored.is_active);
}
