// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};

pub const DEFAULT_LISTEN: &str = "127.0.0.1:5000";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

pub fn required_arg<'a>(m: &'a ArgMatches, id: &str) -> Result<&'a str> {
    m.get_one::<String>(id)
        .map(|s| s.as_str())
        .ok_or_else(|| anyhow::anyhow!("--{} is required", id))
}

pub fn opt_arg<'a>(m: &'a ArgMatches, id: &str) -> Option<&'a str> {
    m.get_one::<String>(id).map(|s| s.as_str())
}

pub fn id_arg(m: &ArgMatches) -> Result<i64> {
    m.get_one::<i64>("id")
        .copied()
        .ok_or_else(|| anyhow::anyhow!("--id is required"))
}

fn text(id: &'static str) -> Arg {
    Arg::new(id).long(id)
}

fn required(id: &'static str) -> Arg {
    text(id).required(true)
}

fn flag(id: &'static str) -> Arg {
    Arg::new(id).long(id).action(ArgAction::SetTrue)
}

fn int(id: &'static str) -> Arg {
    Arg::new(id).long(id).value_parser(value_parser!(i64))
}

fn id() -> Arg {
    int("id").required(true)
}

fn json_flags() -> [Arg; 2] {
    [
        flag("json").help("Print as pretty JSON"),
        flag("jsonl").help("Print one JSON object per line"),
    ]
}

fn list_cmd() -> Command {
    Command::new("list").args(json_flags())
}

fn rm_cmd() -> Command {
    Command::new("rm").arg(id())
}

fn account_cmd() -> Command {
    Command::new("account")
        .about("Manage accounts")
        .subcommand(
            Command::new("add")
                .arg(required("name"))
                .arg(text("balance").allow_hyphen_values(true))
                .arg(flag("credit").help("Credit account (balance owed)")),
        )
        .subcommand(list_cmd())
        .subcommand(
            Command::new("update")
                .arg(id())
                .arg(text("name"))
                .arg(text("balance").allow_hyphen_values(true))
                .arg(text("credit").help("true|false")),
        )
        .subcommand(rm_cmd())
}

fn income_cmd() -> Command {
    Command::new("income")
        .about("Manage income items")
        .subcommand(
            Command::new("add")
                .arg(required("name"))
                .arg(required("gross"))
                .arg(text("tax-pct").help("Override the default tax percentage"))
                .arg(flag("untaxed"))
                .arg(flag("deduction").help("Deducted from pay; --tax-pct is the deducted share")),
        )
        .subcommand(list_cmd())
        .subcommand(
            Command::new("update")
                .arg(id())
                .arg(text("name"))
                .arg(text("gross"))
                .arg(text("taxed").help("true|false"))
                .arg(text("tax-pct"))
                .arg(flag("clear-tax").conflicts_with("tax-pct"))
                .arg(text("deduction").help("true|false")),
        )
        .subcommand(rm_cmd())
}

fn expense_cmd() -> Command {
    Command::new("expense")
        .about("Manage monthly expenses")
        .subcommand(
            Command::new("add")
                .arg(required("name"))
                .arg(required("amount"))
                .arg(flag("savings").help("Monthly savings allocation")),
        )
        .subcommand(list_cmd())
        .subcommand(
            Command::new("update")
                .arg(id())
                .arg(text("name"))
                .arg(text("amount"))
                .arg(text("savings").help("true|false")),
        )
        .subcommand(rm_cmd())
}

fn settings_cmd() -> Command {
    Command::new("settings")
        .about("Show or change budget settings")
        .subcommand(Command::new("show"))
        .subcommand(Command::new("set").arg(required("tax-pct")))
}

fn budget_cmd() -> Command {
    Command::new("budget")
        .about("Current budget totals")
        .subcommand(Command::new("show").arg(flag("json")))
        .subcommand(Command::new("prefill").arg(flag("json")))
}

fn networth_cmd() -> Command {
    let group = Command::new("group")
        .about("Net-worth groups")
        .subcommand(
            Command::new("add")
                .arg(required("name"))
                .arg(required("type").help("asset|liability"))
                .arg(text("color").help("#rrggbb"))
                .arg(int("order")),
        )
        .subcommand(list_cmd())
        .subcommand(
            Command::new("update")
                .arg(id())
                .arg(text("name"))
                .arg(text("type"))
                .arg(text("color"))
                .arg(int("order")),
        )
        .subcommand(rm_cmd());

    let category = Command::new("category")
        .about("Net-worth categories")
        .subcommand(
            Command::new("add")
                .arg(required("name"))
                .arg(int("group").required(true))
                .arg(flag("company").help("Owned by a company rather than personally"))
                .arg(int("order")),
        )
        .subcommand(list_cmd())
        .subcommand(
            Command::new("update")
                .arg(id())
                .arg(text("name"))
                .arg(int("group"))
                .arg(text("personal").help("true|false"))
                .arg(int("order")),
        )
        .subcommand(rm_cmd());

    let entry = || {
        text("entry")
            .action(ArgAction::Append)
            .allow_hyphen_values(true)
            .help("CATEGORY_ID=AMOUNT, repeatable")
    };
    let snapshot = Command::new("snapshot")
        .about("Monthly snapshots")
        .subcommand(
            Command::new("add")
                .arg(required("month").help("YYYY-MM"))
                .arg(entry()),
        )
        .subcommand(list_cmd())
        .subcommand(
            Command::new("show")
                .arg(required("month").help("YYYY-MM"))
                .arg(flag("json")),
        )
        .subcommand(
            Command::new("update")
                .arg(id())
                .arg(text("month").help("YYYY-MM"))
                .arg(entry()),
        )
        .subcommand(rm_cmd());

    Command::new("networth")
        .about("Net-worth tracking")
        .subcommand(group)
        .subcommand(category)
        .subcommand(snapshot)
        .subcommand(Command::new("defaults").about("Install the default groups and categories"))
        .subcommand(
            Command::new("forecast")
                .arg(text("period").help("month|quarter|half_year|year"))
                .arg(int("months").help("Months ahead, 1-36"))
                .arg(text("target"))
                .arg(flag("json")),
        )
        .subcommand(
            Command::new("seed")
                .about("Twelve months of demo history")
                .arg(
                    Arg::new("year")
                        .long("year")
                        .value_parser(value_parser!(i32)),
                ),
        )
        .subcommand(Command::new("reset").about("Delete all net-worth data"))
}

fn goal_cmd() -> Command {
    Command::new("goal")
        .about("Savings goals")
        .subcommand(
            Command::new("add")
                .arg(required("name"))
                .arg(required("type").help("net_worth|category_target|monthly_savings|savings_rate"))
                .arg(required("target"))
                .arg(int("category"))
                .arg(text("period").help("month|quarter|half_year|year"))
                .arg(text("by").help("Target date, YYYY-MM-DD"))
                .arg(flag("inactive")),
        )
        .subcommand(list_cmd())
        .subcommand(Command::new("show").arg(id()).arg(flag("json")))
        .subcommand(
            Command::new("update")
                .arg(id())
                .arg(text("name"))
                .arg(text("type"))
                .arg(text("target"))
                .arg(int("category"))
                .arg(text("period"))
                .arg(text("by"))
                .arg(flag("clear-date").conflicts_with("by"))
                .arg(text("active").help("true|false")),
        )
        .subcommand(rm_cmd())
        .subcommand(Command::new("progress").args(json_flags()))
        .subcommand(Command::new("trajectory").arg(id()).arg(flag("json")))
}

pub fn build_cli() -> Command {
    Command::new("nestegg")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Personal budget, net-worth and goal tracker")
        .arg(
            Arg::new("db")
                .long("db")
                .env("NESTEGG_DB")
                .global(true)
                .help("SQLite database file"),
        )
        .arg(
            Arg::new("listen")
                .long("listen")
                .env("NESTEGG_LISTEN")
                .default_value(DEFAULT_LISTEN)
                .global(true),
        )
        .arg(
            Arg::new("cors-origin")
                .long("cors-origin")
                .env("NESTEGG_CORS_ORIGIN")
                .default_value(DEFAULT_CORS_ORIGIN)
                .global(true),
        )
        .arg(
            Arg::new("log")
                .long("log")
                .env("NESTEGG_LOG")
                .global(true)
                .help("Log filter, e.g. info or nestegg=debug"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(Command::new("serve").about("Run the HTTP API"))
        .subcommand(account_cmd())
        .subcommand(income_cmd())
        .subcommand(expense_cmd())
        .subcommand(settings_cmd())
        .subcommand(budget_cmd())
        .subcommand(networth_cmd())
        .subcommand(goal_cmd())
        .subcommand(
            Command::new("export")
                .about("Write a backup document or the net-worth history")
                .arg(required("out"))
                .arg(
                    text("format")
                        .value_parser(["json", "csv"])
                        .default_value("json"),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("Replace data from a backup document")
                .arg(required("path")),
        )
        .subcommand(Command::new("seed").about("Replace budget data with demo data"))
        .subcommand(Command::new("reset").about("Clear budget data"))
        .subcommand(Command::new("doctor").about("Check stored data for inconsistencies"))
}
