// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::required;
use crate::preferences;
use crate::utils::{cell_text, maybe_print_json, pretty_table};
use anyhow::Result;
use clap::ArgMatches;
use rusqlite::Connection;
use serde_json::Value;

/// Bare words on the command line are strings; anything that parses as JSON is kept typed.
fn cli_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

pub fn handle(conn: &Connection, m: &ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => {
            let all = preferences::get_all(conn)?;
            if !maybe_print_json(sub.get_flag("json"), false, &all)? {
                let rows = preferences::KEYS
                    .iter()
                    .map(|k| vec![k.to_string(), cell_text(&all[*k])])
                    .collect();
                println!("{}", pretty_table(&["Key", "Value"], rows));
            }
        }
        Some(("get", sub)) => {
            let key = required(sub, "key")?;
            println!("{}", cell_text(&preferences::get(conn, key)?));
        }
        Some(("set", sub)) => {
            let key = required(sub, "key")?;
            let value = cli_value(required(sub, "value")?);
            preferences::set(conn, key, &value)?;
            println!("Set {} = {}", key, cell_text(&value));
        }
        _ => {}
    }
    Ok(())
}
