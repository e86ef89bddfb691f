// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use fuelstation::{commands::doctor, crud::Crud, db};
use serde_json::json;

#[test]
fn clean_database_has_no_issues() {
    let conn = db::open_in_memory().unwrap();
    assert!(doctor::check(&conn).unwrap().is_empty());
}

#[test]
fn doctor_flags_levels_references_and_stale_prices() {
    let conn = db::open_in_memory().unwrap();
    let crud = Crud::new(&conn);
    let tank = crud
        .create(
            "tanks",
            &json!({"name": "T1", "fuel_type": "diesel", "capacity_liters": "20000", "current_level_liters": "25000"}),
        )
        .unwrap()["id"]
        .as_i64()
        .unwrap();
    crud.create("filling_systems", &json!({"name": "P1", "tank_id": tank}))
        .unwrap();
    crud.soft_delete("tanks", tank).unwrap();

    for date in ["2024-01-01", "2024-06-01"] {
        crud.create(
            "fuel_prices",
            &json!({"fuel_type": "diesel", "price_per_liter": "1.5", "effective_date": date, "status": "active"}),
        )
        .unwrap();
    }

    // Rows written behind the foreign keys' back.
    conn.execute_batch(
        "PRAGMA foreign_keys = OFF;
         INSERT INTO transactions(date, filling_system_id, fuel_type, quantity_liters, amount)
         VALUES ('2025-01-01', 77, 'diesel', '10', '15');
         INSERT INTO tanks(name, fuel_type, capacity_liters, current_level_liters)
         VALUES ('T9', 'lpg', '1000', '-5');
         PRAGMA foreign_keys = ON;",
    )
    .unwrap();

    let issues = doctor::check(&conn).unwrap();
    let kinds: Vec<&str> = issues.iter().map(|i| i.kind).collect();
    assert!(kinds.contains(&"tank_level_negative"), "{kinds:?}");
    assert!(kinds.contains(&"archived_reference"), "{kinds:?}");
    assert!(kinds.contains(&"dangling_reference"), "{kinds:?}");
    assert!(kinds.contains(&"outdated_active_price"), "{kinds:?}");
    // T1 is archived, so its overfill is not reported.
    assert!(!kinds.contains(&"tank_over_capacity"), "{kinds:?}");

    let stale: Vec<_> = issues
        .iter()
        .filter(|i| i.kind == "outdated_active_price")
        .collect();
    assert_eq!(stale.len(), 1);
    assert!(stale[0].detail.contains("2024-01-01"));
}

#[test]
fn doctor_reports_overfilled_live_tank() {
    let conn = db::open_in_memory().unwrap();
    Crud::new(&conn)
        .create(
            "tanks",
            &json!({"name": "T1", "fuel_type": "diesel", "capacity_liters": "100", "current_level_liters": "100.01"}),
        )
        .unwrap();
    let issues = doctor::check(&conn).unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, "tank_over_capacity");
}
