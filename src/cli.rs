// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

use crate::entities;

fn entity_arg() -> Arg {
    Arg::new("entity")
        .required(true)
        .value_parser(entities::names().collect::<Vec<_>>())
        .help("Entity collection, e.g. tanks or fuel_supplies")
}

fn id_arg() -> Arg {
    Arg::new("id")
        .required(true)
        .value_parser(value_parser!(i64))
}

fn json_flag() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print JSON instead of a table")
}

fn jsonl_flag() -> Arg {
    Arg::new("jsonl")
        .long("jsonl")
        .action(ArgAction::SetTrue)
        .help("Print one JSON object per line")
}

fn period_args() -> [Arg; 2] {
    [
        Arg::new("from").long("from").help("Start date, YYYY-MM-DD"),
        Arg::new("to").long("to").help("End date, YYYY-MM-DD"),
    ]
}

fn method_arg() -> Arg {
    Arg::new("method")
        .required(true)
        .help("HTTP method: GET, POST, PUT, PATCH or DELETE")
}

fn body_arg() -> Arg {
    Arg::new("body").long("body").help("JSON request body")
}

fn dashboard_view(name: &'static str, about: &'static str, periodic: bool) -> Command {
    let cmd = Command::new(name).about(about).arg(json_flag());
    if periodic {
        cmd.args(period_args())
    } else {
        cmd
    }
}

pub fn build_cli() -> Command {
    Command::new("fuelstation")
        .about("Fuel station back office: entities, dashboards and a REST API")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .help("Database file (overrides FUELSTATION_DB)"),
        )
        .arg(
            Arg::new("actor")
                .long("actor")
                .global(true)
                .help("Name recorded in the audit log for writes"),
        )
        .subcommand(Command::new("init").about("Create or migrate the database"))
        .subcommand(
            Command::new("serve")
                .about("Run the HTTP API")
                .arg(Arg::new("host").long("host"))
                .arg(
                    Arg::new("port")
                        .long("port")
                        .value_parser(value_parser!(u16)),
                ),
        )
        .subcommand(
            Command::new("entity")
                .about("Generic CRUD over any entity")
                .subcommand_required(true)
                .subcommand(
                    Command::new("list")
                        .arg(entity_arg())
                        .arg(
                            Arg::new("filter")
                                .long("filter")
                                .action(ArgAction::Append)
                                .help("Exact match, field=value (repeatable)"),
                        )
                        .args(period_args())
                        .arg(Arg::new("order-by").long("order-by"))
                        .arg(Arg::new("desc").long("desc").action(ArgAction::SetTrue))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        )
                        .arg(
                            Arg::new("offset")
                                .long("offset")
                                .value_parser(value_parser!(usize)),
                        )
                        .arg(
                            Arg::new("include-deleted")
                                .long("include-deleted")
                                .action(ArgAction::SetTrue),
                        )
                        .arg(json_flag())
                        .arg(jsonl_flag()),
                )
                .subcommand(Command::new("get").arg(entity_arg()).arg(id_arg()).arg(json_flag()))
                .subcommand(
                    Command::new("create")
                        .arg(entity_arg())
                        .arg(Arg::new("data").long("data").required(true).help("JSON object"))
                        .arg(json_flag()),
                )
                .subcommand(
                    Command::new("update")
                        .arg(entity_arg())
                        .arg(id_arg())
                        .arg(Arg::new("data").long("data").required(true).help("JSON object"))
                        .arg(json_flag()),
                )
                .subcommand(Command::new("delete").about("Delete permanently").arg(entity_arg()).arg(id_arg()))
                .subcommand(Command::new("archive").about("Soft delete").arg(entity_arg()).arg(id_arg()))
                .subcommand(Command::new("restore").about("Undo a soft delete").arg(entity_arg()).arg(id_arg()))
                .subcommand(
                    Command::new("search")
                        .arg(entity_arg())
                        .arg(Arg::new("term").required(true))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        )
                        .arg(json_flag()),
                )
                .subcommand(Command::new("stats").arg(entity_arg()).arg(json_flag()))
                .subcommand(
                    Command::new("audit")
                        .about("Show the audit log")
                        .arg(Arg::new("entity").long("entity"))
                        .arg(
                            Arg::new("record")
                                .long("record")
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        )
                        .arg(json_flag()),
                ),
        )
        .subcommand(
            Command::new("api")
                .about("Dispatch one request in-process, without a server")
                .arg(method_arg())
                .arg(Arg::new("path").required(true))
                .arg(body_arg()),
        )
        .subcommand(
            Command::new("client")
                .about("Send one request to a running server")
                .arg(method_arg())
                .arg(Arg::new("path").required(true))
                .arg(body_arg())
                .arg(
                    Arg::new("url")
                        .long("url")
                        .help("Server base URL (overrides FUELSTATION_URL)"),
                ),
        )
        .subcommand(
            Command::new("dashboard")
                .about("Derived figures")
                .subcommand_required(true)
                .subcommand(dashboard_view("overview", "Revenue, expenses and low tanks", true))
                .subcommand(dashboard_view("expenses", "Expenses by category", true))
                .subcommand(dashboard_view("tanks", "Tank fill levels", false))
                .subcommand(dashboard_view("sales", "Sales by fuel type and payment", true))
                .subcommand(dashboard_view("supplies", "Deliveries per provider", true))
                .subcommand(dashboard_view("shifts", "Shifts and cash per employee", true)),
        )
        .subcommand(
            Command::new("prefs")
                .about("UI preferences")
                .subcommand_required(true)
                .subcommand(Command::new("list").arg(json_flag()))
                .subcommand(Command::new("get").arg(Arg::new("key").required(true)))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true).help("JSON value, bare words are strings")),
                ),
        )
        .subcommand(
            Command::new("todo")
                .about("Operator checklist")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add").arg(Arg::new("title").required(true)).arg(
                        Arg::new("priority")
                            .long("priority")
                            .value_parser(["low", "normal", "high"])
                            .default_value("normal"),
                    ),
                )
                .subcommand(Command::new("toggle").arg(Arg::new("id").required(true).value_parser(value_parser!(u64))))
                .subcommand(Command::new("rm").arg(Arg::new("id").required(true).value_parser(value_parser!(u64))))
                .subcommand(
                    Command::new("edit")
                        .arg(Arg::new("id").required(true).value_parser(value_parser!(u64)))
                        .arg(Arg::new("title").required(true)),
                )
                .subcommand(
                    Command::new("list")
                        .arg(
                            Arg::new("filter")
                                .long("filter")
                                .value_parser(["all", "active", "completed"]),
                        )
                        .arg(
                            Arg::new("sort")
                                .long("sort")
                                .value_parser(["created", "title", "priority"]),
                        )
                        .arg(json_flag()),
                )
                .subcommand(Command::new("clear").about("Remove completed items")),
        )
        .subcommand(
            Command::new("import")
                .about("Bulk create records from a CSV whose header names the fields")
                .arg(entity_arg())
                .arg(Arg::new("path").long("path").required(true)),
        )
        .subcommand(
            Command::new("export")
                .about("Export an entity to CSV or JSON")
                .arg(entity_arg())
                .arg(Arg::new("format").long("format").default_value("csv"))
                .arg(Arg::new("out").long("out").required(true)),
        )
        .subcommand(Command::new("doctor").about("Check data integrity"))
}
