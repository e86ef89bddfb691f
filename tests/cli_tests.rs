// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::ArgMatches;
use fuelstation::{cli, commands, crud::Crud, db, preferences};
use serde_json::json;

fn matches(args: &[&str]) -> ArgMatches {
    let mut argv = vec!["fuelstation"];
    argv.extend_from_slice(args);
    cli::build_cli().get_matches_from(argv)
}

fn sub<'a>(m: &'a ArgMatches, name: &str) -> &'a ArgMatches {
    match m.subcommand() {
        Some((n, s)) if n == name => s,
        other => panic!("expected {name}, got {:?}", other.map(|(n, _)| n)),
    }
}

#[test]
fn global_db_flag_is_visible_after_subcommand() {
    let m = matches(&["entity", "list", "tanks", "--db", "/tmp/x.sqlite"]);
    assert_eq!(m.get_one::<String>("db").map(String::as_str), Some("/tmp/x.sqlite"));
}

#[test]
fn unknown_entity_is_rejected_by_the_parser() {
    let res = cli::build_cli().try_get_matches_from(["fuelstation", "entity", "list", "spaceships"]);
    assert!(res.is_err());
}

#[test]
fn entity_commands_write_through_crud_with_actor() {
    let conn = db::open_in_memory().unwrap();
    let m = matches(&[
        "--actor",
        "cli-user",
        "entity",
        "create",
        "providers",
        "--data",
        r#"{"name": "Gulf Supply"}"#,
    ]);
    commands::entity::handle(&conn, sub(&m, "entity")).unwrap();

    let m = matches(&["entity", "archive", "providers", "1"]);
    commands::entity::handle(&conn, sub(&m, "entity")).unwrap();
    assert_eq!(Crud::new(&conn).get("providers", 1).unwrap_err().status(), 404);

    let log = Crud::new(&conn).audit_log(&Default::default()).unwrap();
    assert_eq!(log.last().unwrap().actor.as_deref(), Some("cli-user"));

    let m = matches(&["entity", "update", "providers", "1", "--data", "{not json"]);
    assert!(commands::entity::handle(&conn, sub(&m, "entity")).is_err());
}

#[test]
fn entity_list_rejects_malformed_filter() {
    let conn = db::open_in_memory().unwrap();
    let m = matches(&["entity", "list", "tanks", "--filter", "status"]);
    assert!(commands::entity::handle(&conn, sub(&m, "entity")).is_err());
}

#[test]
fn api_command_dispatches_in_process() {
    let conn = db::open_in_memory().unwrap();
    let m = matches(&[
        "api",
        "post",
        "/expenses",
        "--body",
        r#"{"date": "2025-03-01", "category": "rent", "amount": "1200"}"#,
    ]);
    let resp = commands::api::run(&conn, sub(&m, "api")).unwrap();
    assert_eq!(resp.status, 201);
    assert_eq!(resp.body["amount"], "1200");

    let m = matches(&["api", "GET", "/expenses?category=rent"]);
    let resp = commands::api::run(&conn, sub(&m, "api")).unwrap();
    assert_eq!(resp.body.as_array().unwrap().len(), 1);

    let m = matches(&["api", "TRACE", "/expenses"]);
    assert!(commands::api::run(&conn, sub(&m, "api")).is_err());
}

#[test]
fn prefs_set_parses_json_or_falls_back_to_string() {
    let conn = db::open_in_memory().unwrap();
    let m = matches(&["prefs", "set", "sidebar_collapsed", "true"]);
    commands::prefs::handle(&conn, sub(&m, "prefs")).unwrap();
    let m = matches(&["prefs", "set", "theme", "dark"]);
    commands::prefs::handle(&conn, sub(&m, "prefs")).unwrap();

    assert_eq!(preferences::get(&conn, "sidebar_collapsed").unwrap(), json!(true));
    assert_eq!(preferences::get(&conn, "theme").unwrap(), json!("dark"));

    let m = matches(&["prefs", "set", "page_size", "0"]);
    assert!(commands::prefs::handle(&conn, sub(&m, "prefs")).is_err());
}

#[test]
fn todo_state_persists_between_invocations() {
    let conn = db::open_in_memory().unwrap();
    for args in [
        &["todo", "add", "order diesel", "--priority", "high"][..],
        &["todo", "add", "wipe pumps"][..],
        &["todo", "toggle", "2"][..],
    ] {
        let m = matches(args);
        commands::todos::handle(&conn, sub(&m, "todo")).unwrap();
    }

    let state = commands::todos::load(&conn).unwrap();
    assert_eq!(state.items.len(), 2);
    assert!(state.items[1].completed);
    assert_eq!(state.remaining(), 1);

    let m = matches(&["todo", "clear"]);
    commands::todos::handle(&conn, sub(&m, "todo")).unwrap();
    let state = commands::todos::load(&conn).unwrap();
    assert_eq!(state.items.len(), 1);
    assert_eq!(state.next_id, 3);
}

#[test]
fn dashboard_command_fetches_views() {
    let conn = db::open_in_memory().unwrap();
    Crud::new(&conn)
        .create("expenses", &json!({"date": "2025-03-01", "category": "rent", "amount": "300"}))
        .unwrap();
    let m = matches(&["dashboard", "expenses", "--from", "2025-03-01"]);
    let dash = sub(&m, "dashboard");
    let (view, view_m) = dash.subcommand().unwrap();
    let data = commands::dashboard::fetch(&conn, view, view_m).unwrap();
    assert_eq!(data["total"], "300");

    let m = matches(&["dashboard", "tanks"]);
    commands::dashboard::handle(&conn, sub(&m, "dashboard")).unwrap();
}
