// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use nestegg::{api, cli, commands, config::Config, db, logging};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let config = Config::from_matches(&matches)?;
    logging::init(config.log_filter.as_deref());

    let conn = db::open_or_init(&config.db_path)?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", config.db_path.display());
        }
        Some(("serve", _)) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(api::run_server(conn, &config))?;
        }
        Some(("account", sub)) => commands::accounts::handle(&conn, sub)?,
        Some(("income", sub)) => commands::income::handle(&conn, sub)?,
        Some(("expense", sub)) => commands::expenses::handle(&conn, sub)?,
        Some(("settings", sub)) => commands::settings::handle(&conn, sub)?,
        Some(("budget", sub)) => commands::budget::handle(&conn, sub)?,
        Some(("networth", sub)) => commands::networth::handle(&conn, sub)?,
        Some(("goal", sub)) => commands::goals::handle(&conn, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        Some(("import", sub)) => commands::importer::handle(&conn, sub)?,
        Some(("seed", _)) => {
            let c = commands::seed::seed_budget(&conn)?;
            println!(
                "Seeded {} income items, {} accounts, {} expenses",
                c.income_items, c.accounts, c.expenses
            );
        }
        Some(("reset", _)) => {
            commands::seed::reset_budget(&conn)?;
            println!("Budget data reset");
        }
        Some(("doctor", _)) => commands::doctor::handle(&conn)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
