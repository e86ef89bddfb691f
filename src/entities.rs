// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Static registry of the business entities served by the CRUD layer.
//!
//! Every entity maps to one table. Besides its declared fields each table
//! carries `id`, `created_at`, `updated_at` and `deleted_at`.

use crate::validation::{MAX_DECIMAL, Rule};
use serde::Serialize;

pub const SYSTEM_COLUMNS: &[&str] = &["id", "created_at", "updated_at", "deleted_at"];

pub const FUEL_TYPES: &[&str] = &["diesel", "gasoline_91", "gasoline_95", "gasoline_98", "lpg"];
pub const PAYMENT_METHODS: &[&str] = &["cash", "card", "transfer"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Integer,
    Decimal,
    Date,
    Timestamp,
    Bool,
}

#[derive(Debug)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub rules: &'static [Rule],
    /// Table whose `id` this field points at.
    pub references: Option<&'static str>,
}

impl FieldDef {
    pub fn has_rule(&self, wanted: &Rule) -> bool {
        self.rules.iter().any(|r| r == wanted)
    }

    pub fn is_required(&self) -> bool {
        self.has_rule(&Rule::Required)
    }

    pub fn is_unique(&self) -> bool {
        self.has_rule(&Rule::Unique)
    }
}

#[derive(Debug)]
pub struct EntityDef {
    pub name: &'static str,
    pub table: &'static str,
    pub fields: &'static [FieldDef],
    pub search: &'static [&'static str],
    pub status_field: Option<&'static str>,
    pub amount_field: Option<&'static str>,
    pub date_field: Option<&'static str>,
}

impl EntityDef {
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        // fields is 'static, so the reference outlives &self
        let fields: &'static [FieldDef] = self.fields;
        fields.iter().find(|f| f.name == name)
    }

    /// Field names plus system columns; the only identifiers ever spliced into SQL.
    pub fn is_column(&self, name: &str) -> bool {
        SYSTEM_COLUMNS.contains(&name) || self.field(name).is_some()
    }

    pub fn select_columns(&self) -> String {
        let mut cols = vec!["id"];
        cols.extend(self.fields.iter().map(|f| f.name));
        cols.extend(["created_at", "updated_at", "deleted_at"]);
        cols.join(", ")
    }
}

const fn field(name: &'static str, kind: FieldKind, rules: &'static [Rule]) -> FieldDef {
    FieldDef {
        name,
        kind,
        rules,
        references: None,
    }
}

const fn fk(name: &'static str, table: &'static str, rules: &'static [Rule]) -> FieldDef {
    FieldDef {
        name,
        kind: FieldKind::Integer,
        rules,
        references: Some(table),
    }
}

use FieldKind::*;
use Rule::*;

const ZERO: rust_decimal::Decimal = rust_decimal::Decimal::ZERO;
const TANK_STATUS: &[&str] = &["active", "maintenance", "inactive"];

pub static ENTITIES: &[EntityDef] = &[
    EntityDef {
        name: "providers",
        table: "providers",
        fields: &[
            field("name", Text, &[Required, Unique, MinLength(2), MaxLength(100)]),
            field("contact_name", Text, &[MaxLength(100)]),
            field("email", Text, &[Email, Unique]),
            field("phone", Text, &[Phone]),
            field("address", Text, &[MaxLength(255)]),
            field("status", Text, &[OneOf(&["active", "inactive"])]),
        ],
        search: &["name", "contact_name", "email", "phone"],
        status_field: Some("status"),
        amount_field: None,
        date_field: None,
    },
    EntityDef {
        name: "fuel_prices",
        table: "fuel_prices",
        fields: &[
            field("fuel_type", Text, &[Required, OneOf(FUEL_TYPES)]),
            field("price_per_liter", Decimal, &[Required, Numeric, Min(ZERO), Max(MAX_DECIMAL)]),
            field("effective_date", Date, &[Required]),
            field("status", Text, &[OneOf(&["active", "scheduled", "expired"])]),
        ],
        search: &["fuel_type"],
        status_field: Some("status"),
        amount_field: None,
        date_field: Some("effective_date"),
    },
    EntityDef {
        name: "tanks",
        table: "tanks",
        fields: &[
            field("name", Text, &[Required, Unique, MinLength(1), MaxLength(50)]),
            field("fuel_type", Text, &[Required, OneOf(FUEL_TYPES)]),
            field("capacity_liters", Decimal, &[Required, Numeric, Min(ZERO), Max(MAX_DECIMAL)]),
            field("current_level_liters", Decimal, &[Numeric, Min(ZERO), Max(MAX_DECIMAL)]),
            field("min_level_liters", Decimal, &[Numeric, Min(ZERO), Max(MAX_DECIMAL)]),
            field("status", Text, &[OneOf(TANK_STATUS)]),
        ],
        search: &["name", "fuel_type"],
        status_field: Some("status"),
        amount_field: Some("current_level_liters"),
        date_field: None,
    },
    EntityDef {
        name: "filling_systems",
        table: "filling_systems",
        fields: &[
            field("name", Text, &[Required, Unique, MaxLength(50)]),
            fk("tank_id", "tanks", &[Required]),
            field("location", Text, &[MaxLength(100)]),
            field("status", Text, &[OneOf(TANK_STATUS)]),
        ],
        search: &["name", "location"],
        status_field: Some("status"),
        amount_field: None,
        date_field: None,
    },
    EntityDef {
        name: "fuel_supplies",
        table: "fuel_supplies",
        fields: &[
            fk("provider_id", "providers", &[Required]),
            fk("tank_id", "tanks", &[Required]),
            field("fuel_type", Text, &[Required, OneOf(FUEL_TYPES)]),
            field("quantity_liters", Decimal, &[Required, Numeric, Min(ZERO), Max(MAX_DECIMAL)]),
            field("price_per_liter", Decimal, &[Required, Numeric, Min(ZERO), Max(MAX_DECIMAL)]),
            field("total_cost", Decimal, &[Numeric, Min(ZERO), Max(MAX_DECIMAL)]),
            field("delivery_date", Date, &[Required]),
            field("invoice_number", Text, &[Unique, MaxLength(50)]),
            field("status", Text, &[OneOf(&["pending", "delivered", "cancelled"])]),
        ],
        search: &["invoice_number", "fuel_type"],
        status_field: Some("status"),
        amount_field: Some("total_cost"),
        date_field: Some("delivery_date"),
    },
    EntityDef {
        name: "expenses",
        table: "expenses",
        fields: &[
            field("date", Date, &[Required]),
            field("category", Text, &[Required, MaxLength(50)]),
            field("amount", Decimal, &[Required, Numeric, Min(ZERO), Max(MAX_DECIMAL)]),
            field("description", Text, &[MaxLength(255)]),
            field("payment_method", Text, &[OneOf(PAYMENT_METHODS)]),
            field("status", Text, &[OneOf(&["pending", "paid", "cancelled"])]),
        ],
        search: &["category", "description"],
        status_field: Some("status"),
        amount_field: Some("amount"),
        date_field: Some("date"),
    },
    EntityDef {
        name: "transactions",
        table: "transactions",
        fields: &[
            field("date", Date, &[Required]),
            fk("filling_system_id", "filling_systems", &[]),
            fk("employee_id", "employees", &[]),
            field("fuel_type", Text, &[Required, OneOf(FUEL_TYPES)]),
            field("quantity_liters", Decimal, &[Required, Numeric, Min(ZERO), Max(MAX_DECIMAL)]),
            field("amount", Decimal, &[Required, Numeric, Min(ZERO), Max(MAX_DECIMAL)]),
            field("payment_method", Text, &[OneOf(PAYMENT_METHODS)]),
            field("status", Text, &[OneOf(&["completed", "pending", "refunded"])]),
        ],
        search: &["fuel_type", "payment_method"],
        status_field: Some("status"),
        amount_field: Some("amount"),
        date_field: Some("date"),
    },
    EntityDef {
        name: "employees",
        table: "employees",
        fields: &[
            field("first_name", Text, &[Required, MinLength(1), MaxLength(50)]),
            field("last_name", Text, &[Required, MinLength(1), MaxLength(50)]),
            field("email", Text, &[Required, Email, Unique]),
            field("phone", Text, &[Phone]),
            field("position", Text, &[Required, MaxLength(50)]),
            field("hire_date", Date, &[]),
            field("salary", Decimal, &[Numeric, Min(ZERO), Max(MAX_DECIMAL)]),
            field("status", Text, &[OneOf(&["active", "on_leave", "terminated"])]),
        ],
        search: &["first_name", "last_name", "email", "position"],
        status_field: Some("status"),
        amount_field: Some("salary"),
        date_field: Some("hire_date"),
    },
    EntityDef {
        name: "shifts",
        table: "shifts",
        fields: &[
            fk("employee_id", "employees", &[Required]),
            field("start_time", Timestamp, &[Required]),
            field("end_time", Timestamp, &[]),
            field("opening_cash", Decimal, &[Numeric, Min(ZERO), Max(MAX_DECIMAL)]),
            field("closing_cash", Decimal, &[Numeric, Min(ZERO), Max(MAX_DECIMAL)]),
            field("notes", Text, &[MaxLength(500)]),
            field("status", Text, &[OneOf(&["open", "closed"])]),
        ],
        search: &["notes"],
        status_field: Some("status"),
        amount_field: Some("closing_cash"),
        date_field: Some("start_time"),
    },
];

pub fn lookup(name: &str) -> Option<&'static EntityDef> {
    ENTITIES.iter().find(|e| e.name == name)
}

pub fn names() -> impl Iterator<Item = &'static str> {
    ENTITIES.iter().map(|e| e.name)
}
