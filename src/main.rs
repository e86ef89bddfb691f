// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use fuelstation::{cli, commands, config::Config, db, server};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let mut config = Config::load().context("Load configuration")?;
    if let Some(path) = matches.get_one::<String>("db") {
        config.db_path = Some(PathBuf::from(path));
    }

    // The remote client never touches the local database.
    if let Some(("client", sub)) = matches.subcommand() {
        return commands::remote::handle(&config, sub);
    }

    let path = db::db_path(&config)?;
    let conn = db::open_or_init(&path)?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", path.display());
        }
        Some(("serve", sub)) => {
            if let Some(host) = sub.get_one::<String>("host") {
                config.host = host.clone();
            }
            if let Some(port) = sub.get_one::<u16>("port") {
                config.port = *port;
            }
            tokio::runtime::Runtime::new()
                .context("Start async runtime")?
                .block_on(server::serve(&config, conn))?;
        }
        Some(("entity", sub)) => commands::entity::handle(&conn, sub)?,
        Some(("api", sub)) => commands::api::handle(&conn, sub)?,
        Some(("dashboard", sub)) => commands::dashboard::handle(&conn, sub)?,
        Some(("prefs", sub)) => commands::prefs::handle(&conn, sub)?,
        Some(("todo", sub)) => commands::todos::handle(&conn, sub)?,
        Some(("import", sub)) => commands::importer::handle(&conn, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
