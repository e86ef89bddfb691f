// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use fuelstation::{cli, commands::importer, crud::Crud, db};
use rusqlite::Connection;
use std::io::Write;
use tempfile::NamedTempFile;

fn csv_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file.flush().unwrap();
    file
}

fn run_import(conn: &Connection, entity: &str, path: &str) -> anyhow::Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches_from(["fuelstation", "import", entity, "--path", path]);
    if let Some(("import", import_m)) = matches.subcommand() {
        importer::handle(conn, import_m)
    } else {
        panic!("no import subcommand");
    }
}

#[test]
fn importer_trims_cli_path_argument() {
    let conn = db::open_in_memory().unwrap();
    let file = csv_file("name,email,phone\nGulf Supply,gulf@example.com,555-0100 22\n");

    let path = file.path().to_str().unwrap().to_string();
    let padded = format!("  {}  ", path);
    run_import(&conn, "providers", &padded).unwrap();

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM providers", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn importer_skips_empty_cells_and_coerces_fields() {
    let conn = db::open_in_memory().unwrap();
    let file = csv_file(
        "date,category,amount,description,status\n\
         2025-02-03, utilities ,120.50,,paid\n\
         2025-02-04,maintenance,80,pump seal,\n",
    );
    run_import(&conn, "expenses", file.path().to_str().unwrap()).unwrap();

    let rows = Crud::new(&conn).all("expenses").unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["category"], "utilities");
    assert_eq!(rows[0]["amount"], "120.50");
    assert!(rows[0]["description"].is_null());
    assert!(rows[1]["status"].is_null());
}

#[test]
fn importer_rejects_whole_file_on_any_invalid_row() {
    let conn = db::open_in_memory().unwrap();
    let file = csv_file("name,fuel_type,capacity_liters\nT1,diesel,20000\nT2,kerosene,5000\n");
    let err = run_import(&conn, "tanks", file.path().to_str().unwrap()).unwrap_err();
    assert!(format!("{:#}", err).contains("[1].fuel_type"));

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM tanks", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn importer_rejects_unknown_columns() {
    let conn = db::open_in_memory().unwrap();
    let file = csv_file("name,colour\nT1,red\n");
    let err = run_import(&conn, "tanks", file.path().to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("colour"));
}
