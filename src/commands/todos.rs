// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::required;
use crate::todos::{Filter, Priority, SortBy, TodoAction, TodoState, reduce};
use crate::utils::{get_setting, maybe_print_json, pretty_table, put_setting};
use anyhow::{Context, Result};
use clap::ArgMatches;
use rusqlite::Connection;
use serde_json::Value;

const SETTINGS_KEY: &str = "todos";

pub fn load(conn: &Connection) -> Result<TodoState> {
    match get_setting(conn, SETTINGS_KEY)? {
        Some(raw) => serde_json::from_str(&raw).context("Stored todo list is corrupt"),
        None => Ok(TodoState::default()),
    }
}

pub fn save(conn: &Connection, state: &TodoState) -> Result<()> {
    put_setting(conn, SETTINGS_KEY, &serde_json::to_string(state)?)?;
    Ok(())
}

/// Clap `possible_values` are lowercase variant names, same as the serde form.
fn parse_choice<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T> {
    serde_json::from_value(Value::String(raw.to_string()))
        .with_context(|| format!("Unknown option '{}'", raw))
}

fn id(sub: &ArgMatches) -> Result<u64> {
    sub.get_one::<u64>("id").copied().context("Missing id")
}

pub fn handle(conn: &Connection, m: &ArgMatches) -> Result<()> {
    let state = load(conn)?;
    let state = match m.subcommand() {
        Some(("add", sub)) => {
            let priority: Priority = match sub.get_one::<String>("priority") {
                Some(p) => parse_choice(p)?,
                None => Priority::default(),
            };
            let action = TodoAction::Add {
                title: required(sub, "title")?.to_string(),
                priority,
            };
            reduce(state, action)
        }
        Some(("toggle", sub)) => reduce(state, TodoAction::Toggle(id(sub)?)),
        Some(("rm", sub)) => reduce(state, TodoAction::Remove(id(sub)?)),
        Some(("edit", sub)) => {
            let title = required(sub, "title")?.to_string();
            reduce(state, TodoAction::Edit(id(sub)?, title))
        }
        Some(("clear", _)) => reduce(state, TodoAction::ClearCompleted),
        Some(("list", sub)) => {
            let mut state = state;
            if let Some(f) = sub.get_one::<String>("filter") {
                state = reduce(state, TodoAction::SetFilter(parse_choice::<Filter>(f)?));
            }
            if let Some(s) = sub.get_one::<String>("sort") {
                state = reduce(state, TodoAction::SetSort(parse_choice::<SortBy>(s)?));
            }
            let visible = state.visible();
            if !maybe_print_json(sub.get_flag("json"), false, &visible)? {
                let rows = visible
                    .iter()
                    .map(|t| {
                        vec![
                            t.id.to_string(),
                            if t.completed { "x".into() } else { String::new() },
                            t.title.clone(),
                            t.priority.as_str().to_string(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Id", "Done", "Title", "Priority"], rows));
                println!("{} remaining", state.remaining());
            }
            state
        }
        _ => return Ok(()),
    };
    save(conn, &state)
}
