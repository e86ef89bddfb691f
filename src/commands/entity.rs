// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{actor, required};
use crate::crud::{self, AuditQuery, Crud, ListQuery};
use crate::entities::EntityDef;
use crate::utils::{cell_text, maybe_print_json, parse_date, parse_json_arg, pretty_table, records_table};
use anyhow::{Context, Result};
use clap::ArgMatches;
use rusqlite::Connection;
use serde_json::Value;

pub fn handle(conn: &Connection, m: &ArgMatches) -> Result<()> {
    let crud = Crud::new(conn).with_actor(actor(m));
    match m.subcommand() {
        Some(("list", sub)) => {
            let entity = required(sub, "entity")?;
            let q = list_query(sub)?;
            let rows = crud.list(entity, &q)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
                println!("{}", records_table(&headers(crud::resolve(entity)?), &rows));
            }
        }
        Some(("get", sub)) => {
            let entity = required(sub, "entity")?;
            let record = crud.get(entity, id(sub)?)?;
            print_record(sub, &record)?;
        }
        Some(("create", sub)) => {
            let entity = required(sub, "entity")?;
            let data = parse_json_arg(required(sub, "data")?)?;
            let record = crud.create(entity, &data)?;
            println!("Created {} #{}", entity, record["id"]);
            print_record(sub, &record)?;
        }
        Some(("update", sub)) => {
            let entity = required(sub, "entity")?;
            let data = parse_json_arg(required(sub, "data")?)?;
            let record = crud.update(entity, id(sub)?, &data)?;
            println!("Updated {} #{}", entity, record["id"]);
            print_record(sub, &record)?;
        }
        Some(("delete", sub)) => {
            let entity = required(sub, "entity")?;
            let id = id(sub)?;
            crud.delete(entity, id)?;
            println!("Deleted {} #{}", entity, id);
        }
        Some(("archive", sub)) => {
            let entity = required(sub, "entity")?;
            let id = id(sub)?;
            crud.soft_delete(entity, id)?;
            println!("Archived {} #{}", entity, id);
        }
        Some(("restore", sub)) => {
            let entity = required(sub, "entity")?;
            let id = id(sub)?;
            crud.restore(entity, id)?;
            println!("Restored {} #{}", entity, id);
        }
        Some(("search", sub)) => {
            let entity = required(sub, "entity")?;
            let term = required(sub, "term")?;
            let rows = crud.search(entity, term, sub.get_one::<usize>("limit").copied())?;
            if !maybe_print_json(sub.get_flag("json"), false, &rows)? {
                println!("{}", records_table(&headers(crud::resolve(entity)?), &rows));
            }
        }
        Some(("stats", sub)) => {
            let stats = crud.stats(required(sub, "entity")?)?;
            if !maybe_print_json(sub.get_flag("json"), false, &stats)? {
                let mut rows = vec![
                    vec!["total".to_string(), stats.total.to_string()],
                    vec!["active".to_string(), stats.active.to_string()],
                    vec!["deleted".to_string(), stats.deleted.to_string()],
                ];
                for (status, n) in &stats.by_status {
                    rows.push(vec![format!("status: {}", status), n.to_string()]);
                }
                if let (Some(field), Some(total)) = (&stats.amount_field, stats.amount_total) {
                    rows.push(vec![format!("sum of {}", field), total.to_string()]);
                }
                println!("{}", pretty_table(&["Metric", "Value"], rows));
            }
        }
        Some(("audit", sub)) => {
            let q = AuditQuery {
                entity: sub.get_one::<String>("entity").cloned(),
                record_id: sub.get_one::<i64>("record").copied(),
                action: None,
                limit: sub.get_one::<usize>("limit").copied(),
            };
            let entries = crud.audit_log(&q)?;
            if !maybe_print_json(sub.get_flag("json"), false, &entries)? {
                let rows = entries
                    .iter()
                    .map(|e| {
                        vec![
                            e.created_at.clone(),
                            e.entity.clone(),
                            e.record_id.map(|i| i.to_string()).unwrap_or_default(),
                            e.action.clone(),
                            e.actor.clone().unwrap_or_default(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["When", "Entity", "Record", "Action", "Actor"], rows)
                );
            }
        }
        _ => {}
    }
    Ok(())
}

fn id(sub: &ArgMatches) -> Result<i64> {
    sub.get_one::<i64>("id").copied().context("Missing id")
}

fn headers(def: &EntityDef) -> Vec<&str> {
    std::iter::once("id")
        .chain(def.fields.iter().map(|f| f.name))
        .collect()
}

fn list_query(sub: &ArgMatches) -> Result<ListQuery> {
    let mut q = ListQuery {
        order_by: sub.get_one::<String>("order-by").cloned(),
        descending: sub.get_flag("desc"),
        limit: sub.get_one::<usize>("limit").copied(),
        offset: sub.get_one::<usize>("offset").copied(),
        include_deleted: sub.get_flag("include-deleted"),
        ..ListQuery::default()
    };
    if let Some(from) = sub.get_one::<String>("from") {
        q.from = Some(parse_date(from)?);
    }
    if let Some(to) = sub.get_one::<String>("to") {
        q.to = Some(parse_date(to)?);
    }
    for raw in sub.get_many::<String>("filter").into_iter().flatten() {
        let (field, value) = raw
            .split_once('=')
            .with_context(|| format!("Filter '{}' must look like field=value", raw))?;
        q = q.with_filter(field.trim(), value.trim());
    }
    Ok(q)
}

fn print_record(sub: &ArgMatches, record: &Value) -> Result<()> {
    if maybe_print_json(sub.get_flag("json"), false, record)? {
        return Ok(());
    }
    let rows = record
        .as_object()
        .map(|o| {
            o.iter()
                .map(|(k, v)| vec![k.clone(), cell_text(v)])
                .collect()
        })
        .unwrap_or_default();
    println!("{}", pretty_table(&["Field", "Value"], rows));
    Ok(())
}
