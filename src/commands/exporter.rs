// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::required;
use crate::crud::{self, Crud};
use crate::entities::SYSTEM_COLUMNS;
use crate::utils::cell_text;
use anyhow::{Context, Result, bail};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let entity = required(m, "entity")?;
    let fmt = required(m, "format")?.to_lowercase();
    let out = required(m, "out")?;
    if !matches!(fmt.as_str(), "csv" | "json") {
        bail!("Unknown format: {} (use csv|json)", fmt);
    }

    let def = crud::resolve(entity)?;
    let records = Crud::new(conn).all(entity)?;

    match fmt.as_str() {
        "csv" => {
            let columns: Vec<&str> = std::iter::once("id")
                .chain(def.fields.iter().map(|f| f.name))
                .chain(SYSTEM_COLUMNS.iter().copied().filter(|c| *c != "id"))
                .collect();
            let mut wtr = csv::Writer::from_path(out).with_context(|| format!("Create {}", out))?;
            wtr.write_record(&columns)?;
            for r in &records {
                wtr.write_record(columns.iter().map(|c| cell_text(&r[*c])))?;
            }
            wtr.flush()?;
        }
        _ => {
            std::fs::write(out, serde_json::to_string_pretty(&records)?)
                .with_context(|| format!("Write {}", out))?;
        }
    }
    println!("Exported {} {} to {}", records.len(), entity, out);
    Ok(())
}
