// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::crud::Crud;
use crate::entities::ENTITIES;
use crate::models::Tank;
use crate::utils::pretty_table;
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rusqlite::Connection;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub kind: &'static str,
    pub detail: String,
}

fn issue(kind: &'static str, detail: String) -> Issue {
    Issue { kind, detail }
}

pub fn check(conn: &Connection) -> Result<Vec<Issue>> {
    let mut issues = Vec::new();

    // 1) Tank levels outside [0, capacity]
    let tanks: Vec<Tank> = Crud::new(conn)
        .all("tanks")?
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<Tank>, _>>()
        .context("Decode tanks")?;
    for t in &tanks {
        let level = t.current_level_liters.unwrap_or_default();
        if level < Decimal::ZERO {
            issues.push(issue("tank_level_negative", format!("{} (#{}) at {} L", t.name, t.id, level)));
        } else if level > t.capacity_liters {
            issues.push(issue(
                "tank_over_capacity",
                format!("{} (#{}) at {} L of {} L", t.name, t.id, level, t.capacity_liters),
            ));
        }
    }

    // 2) Live rows pointing at missing or archived parents
    for def in ENTITIES {
        for f in def.fields {
            let Some(parent) = f.references else { continue };
            let sql = format!(
                "SELECT c.id, c.{col}, p.id IS NULL FROM {child} c \
                 LEFT JOIN {parent} p ON p.id = c.{col} \
                 WHERE c.deleted_at IS NULL AND c.{col} IS NOT NULL \
                 AND (p.id IS NULL OR p.deleted_at IS NOT NULL) ORDER BY c.id",
                col = f.name,
                child = def.table,
                parent = parent,
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query([])?;
            while let Some(r) = rows.next()? {
                let id: i64 = r.get(0)?;
                let parent_id: i64 = r.get(1)?;
                let missing: bool = r.get(2)?;
                let kind = if missing { "dangling_reference" } else { "archived_reference" };
                issues.push(issue(
                    kind,
                    format!("{} #{} {} -> {} #{}", def.name, id, f.name, parent, parent_id),
                ));
            }
        }
    }

    // 3) Active prices already superseded by a newer active price
    let mut stmt = conn.prepare(
        "SELECT a.id, a.fuel_type, a.effective_date FROM fuel_prices a \
         WHERE a.deleted_at IS NULL AND a.status = 'active' AND EXISTS ( \
             SELECT 1 FROM fuel_prices b \
             WHERE b.fuel_type = a.fuel_type AND b.deleted_at IS NULL AND b.status = 'active' \
             AND b.effective_date > a.effective_date AND b.effective_date <= date('now')) \
         ORDER BY a.fuel_type, a.effective_date",
    )?;
    let mut rows = stmt.query([])?;
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let fuel: String = r.get(1)?;
        let date: String = r.get(2)?;
        issues.push(issue(
            "outdated_active_price",
            format!("fuel_prices #{} ({} from {})", id, fuel, date),
        ));
    }

    if !issues.is_empty() {
        warn!(count = issues.len(), "doctor found issues");
    }
    Ok(issues)
}

pub fn handle(conn: &Connection) -> Result<()> {
    let issues = check(conn)?;
    if issues.is_empty() {
        println!("doctor: no issues found");
    } else {
        let rows = issues
            .into_iter()
            .map(|i| vec![i.kind.to_string(), i.detail])
            .collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
