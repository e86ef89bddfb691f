// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::api::{Api, ApiRequest};
use crate::router::Method;
use crate::utils::{cell_text, maybe_print_json, pretty_table, records_table};
use anyhow::{Result, anyhow};
use clap::ArgMatches;
use rusqlite::Connection;
use serde_json::Value;
use std::collections::BTreeMap;

/// Fetch one dashboard view through the API dispatcher.
pub fn fetch(conn: &Connection, view: &str, sub: &ArgMatches) -> Result<Value> {
    let mut query = BTreeMap::new();
    for key in ["from", "to"] {
        if let Ok(Some(v)) = sub.try_get_one::<String>(key) {
            query.insert(key.to_string(), v.clone());
        }
    }
    let req = ApiRequest::new(Method::Get, &format!("/dashboard/{}", view)).with_query(query);
    let resp = Api::new().handle(conn, &req);
    if !resp.is_success() {
        return Err(anyhow!("{}", cell_text(&resp.body["error"])));
    }
    Ok(resp.body)
}

pub fn handle(conn: &Connection, m: &ArgMatches) -> Result<()> {
    let Some((view, sub)) = m.subcommand() else {
        return Ok(());
    };
    let data = fetch(conn, view, sub)?;
    if maybe_print_json(sub.get_flag("json"), false, &data)? {
        return Ok(());
    }
    match view {
        "overview" => {
            let f = &data["finance"];
            let low: Vec<String> = data["low_tanks"]
                .as_array()
                .map(|a| a.iter().map(cell_text).collect())
                .unwrap_or_default();
            let rows = vec![
                vec!["Revenue".into(), cell_text(&f["revenue"])],
                vec!["Expenses".into(), cell_text(&f["expenses"])],
                vec!["Net".into(), cell_text(&f["net"])],
                vec!["Margin %".into(), cell_text(&f["margin_percent"])],
                vec!["Low tanks".into(), low.join(", ")],
            ];
            println!("{}", pretty_table(&["Metric", "Value"], rows));
        }
        "expenses" => {
            let cats = data["categories"].as_array().cloned().unwrap_or_default();
            println!("{}", records_table(&["category", "amount", "count", "percentage"], &cats));
            println!("Total: {} across {} expenses", cell_text(&data["total"]), data["count"]);
        }
        "tanks" => {
            let tanks = data.as_array().cloned().unwrap_or_default();
            println!(
                "{}",
                records_table(
                    &["name", "fuel_type", "capacity_liters", "current_liters", "fill_percent", "low"],
                    &tanks
                )
            );
        }
        "sales" => {
            let mut rows = Vec::new();
            for (group, label) in [("by_fuel_type", "fuel"), ("by_payment_method", "payment")] {
                if let Some(obj) = data[group].as_object() {
                    for (k, v) in obj {
                        rows.push(vec![
                            format!("{}: {}", label, k),
                            cell_text(&v["count"]),
                            cell_text(&v["liters"]),
                            cell_text(&v["amount"]),
                        ]);
                    }
                }
            }
            let t = &data["total"];
            rows.push(vec![
                "total".into(),
                cell_text(&t["count"]),
                cell_text(&t["liters"]),
                cell_text(&t["amount"]),
            ]);
            println!("{}", pretty_table(&["Group", "Count", "Liters", "Amount"], rows));
        }
        "supplies" => {
            let providers = data["providers"].as_array().cloned().unwrap_or_default();
            println!(
                "{}",
                records_table(
                    &["provider_id", "deliveries", "liters", "cost", "average_price_per_liter"],
                    &providers
                )
            );
            println!("Pending deliveries: {}", data["pending"]);
        }
        "shifts" => {
            let rows = data.as_array().cloned().unwrap_or_default();
            println!(
                "{}",
                records_table(&["employee_id", "shifts", "open", "cash_collected"], &rows)
            );
        }
        _ => {}
    }
    Ok(())
}
