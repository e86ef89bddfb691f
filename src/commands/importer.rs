// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{actor, required};
use crate::crud::{self, Crud};
use anyhow::{Context, Result, anyhow};
use csv::ReaderBuilder;
use rusqlite::Connection;
use serde_json::{Map, Value};
use tracing::info;

/// Import every row of a CSV whose header names entity fields. Empty cells
/// are left out; the batch is all-or-nothing.
pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let entity = required(m, "entity")?;
    let path = required(m, "path")?.trim();
    let def = crud::resolve(entity)?;

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path))?;
    let headers = rdr.headers()?.clone();
    for h in headers.iter() {
        if def.field(h).is_none() {
            return Err(anyhow!("Column '{}' is not a field of {}", h, def.name));
        }
    }

    let mut payloads = Vec::new();
    for result in rdr.records() {
        let rec = result?;
        let mut obj = Map::new();
        for (h, cell) in headers.iter().zip(rec.iter()) {
            if cell.is_empty() {
                continue;
            }
            // Typed coercion happens in validation, which accepts text for every kind.
            obj.insert(h.to_string(), Value::String(cell.to_string()));
        }
        payloads.push(Value::Object(obj));
    }

    let created = Crud::new(conn)
        .with_actor(actor(m))
        .bulk_create(entity, &payloads)
        .with_context(|| format!("Import {} from {}", entity, path))?;
    info!(entity, rows = created.len(), "csv import");
    println!("Imported {} {} from {}", created.len(), entity, path);
    Ok(())
}
