// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Declarative field rules and JSON -> SQL value coercion.
//!
//! `Unique` and foreign-key existence need the database and are checked by
//! the CRUD layer; everything else is decided here.

use crate::entities::{EntityDef, FieldDef, FieldKind, SYSTEM_COLUMNS};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value as SqlValue;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Upper bound for money and volume fields: one trillion. Sums and
/// `quantity x price` products stay far inside `Decimal`'s range.
pub const MAX_DECIMAL: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Required,
    Unique,
    Email,
    Phone,
    Numeric,
    Min(Decimal),
    Max(Decimal),
    MinLength(usize),
    MaxLength(usize),
    OneOf(&'static [&'static str]),
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Required => write!(f, "required"),
            Rule::Unique => write!(f, "unique"),
            Rule::Email => write!(f, "email"),
            Rule::Phone => write!(f, "phone"),
            Rule::Numeric => write!(f, "numeric"),
            Rule::Min(n) => write!(f, "min:{}", n),
            Rule::Max(n) => write!(f, "max:{}", n),
            Rule::MinLength(n) => write!(f, "min_length:{}", n),
            Rule::MaxLength(n) => write!(f, "max_length:{}", n),
            Rule::OneOf(values) => write!(f, "one_of:{}", values.join("|")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("validation failed: {}", summarize(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Prefix every field with `[index].`, used for bulk payloads.
    pub fn indexed(self, index: usize) -> Self {
        ValidationErrors(
            self.0
                .into_iter()
                .map(|e| FieldError {
                    field: format!("[{}].{}", index, e.field),
                    message: e.message,
                })
                .collect(),
        )
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }

    pub fn into_result<T>(self, ok: T) -> Result<T, ValidationErrors> {
        if self.is_empty() { Ok(ok) } else { Err(self) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Update,
}

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email pattern"));
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9\s().-]+$").expect("static phone pattern"));

pub fn is_email(s: &str) -> bool {
    EMAIL_RE.is_match(s)
}

pub fn is_phone(s: &str) -> bool {
    let digits = s.chars().filter(|c| c.is_ascii_digit()).count();
    PHONE_RE.is_match(s) && (7..=15).contains(&digits)
}

pub fn parse_decimal_value(v: &Value) -> Option<Decimal> {
    match v {
        Value::Number(n) => {
            let s = n.to_string();
            Decimal::from_str(&s)
                .or_else(|_| Decimal::from_scientific(&s))
                .ok()
        }
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .ok()
}

/// Convert a JSON value into the storage representation of `field`.
pub fn coerce(field: &FieldDef, v: &Value) -> Result<SqlValue, String> {
    if v.is_null() {
        return Ok(SqlValue::Null);
    }
    match field.kind {
        FieldKind::Text => match v {
            Value::String(s) => Ok(SqlValue::Text(s.trim().to_string())),
            Value::Number(n) => Ok(SqlValue::Text(n.to_string())),
            _ => Err("must be a string".into()),
        },
        FieldKind::Integer => match v {
            Value::Number(n) => n
                .as_i64()
                .map(SqlValue::Integer)
                .ok_or_else(|| "must be an integer".to_string()),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(SqlValue::Integer)
                .map_err(|_| "must be an integer".to_string()),
            _ => Err("must be an integer".into()),
        },
        FieldKind::Decimal => parse_decimal_value(v)
            .map(|d| SqlValue::Text(d.to_string()))
            .ok_or_else(|| "must be numeric".to_string()),
        FieldKind::Date => match v {
            Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(|d| SqlValue::Text(d.to_string()))
                .map_err(|_| "must be a date (YYYY-MM-DD)".to_string()),
            _ => Err("must be a date (YYYY-MM-DD)".into()),
        },
        FieldKind::Timestamp => match v {
            Value::String(s) => parse_timestamp(s)
                .map(|t| SqlValue::Text(t.format(TIMESTAMP_FORMAT).to_string()))
                .ok_or_else(|| "must be a timestamp".to_string()),
            _ => Err("must be a timestamp".into()),
        },
        FieldKind::Bool => match v {
            Value::Bool(b) => Ok(SqlValue::Integer(*b as i64)),
            Value::Number(n) if n.as_i64() == Some(0) || n.as_i64() == Some(1) => {
                Ok(SqlValue::Integer(n.as_i64().unwrap_or_default()))
            }
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(SqlValue::Integer(1)),
                "false" | "0" | "no" => Ok(SqlValue::Integer(0)),
                _ => Err("must be a boolean".into()),
            },
            _ => Err("must be a boolean".into()),
        },
    }
}

fn numeric(value: &SqlValue) -> Option<Decimal> {
    match value {
        SqlValue::Integer(i) => Some(Decimal::from(*i)),
        SqlValue::Text(s) => Decimal::from_str(s).ok(),
        _ => None,
    }
}

/// Apply the stateless rules of `field` to an already coerced value.
fn check_rules(field: &FieldDef, value: &SqlValue, errors: &mut ValidationErrors) {
    let text = match value {
        SqlValue::Text(s) => Some(s.as_str()),
        _ => None,
    };
    for rule in field.rules {
        match rule {
            Rule::Required => {
                if matches!(value, SqlValue::Null) || text.is_some_and(|s| s.is_empty()) {
                    errors.push(field.name, "is required");
                }
            }
            Rule::Email => {
                if let Some(s) = text.filter(|s| !s.is_empty()) {
                    if !is_email(s) {
                        errors.push(field.name, "must be a valid email address");
                    }
                }
            }
            Rule::Phone => {
                if let Some(s) = text.filter(|s| !s.is_empty()) {
                    if !is_phone(s) {
                        errors.push(field.name, "must be a valid phone number");
                    }
                }
            }
            Rule::Numeric => {
                if let Some(s) = text.filter(|s| !s.is_empty()) {
                    if Decimal::from_str(s).is_err() {
                        errors.push(field.name, "must be numeric");
                    }
                }
            }
            Rule::Min(bound) => {
                if numeric(value).is_some_and(|n| n < *bound) {
                    errors.push(field.name, format!("must be at least {}", bound));
                }
            }
            Rule::Max(bound) => {
                if numeric(value).is_some_and(|n| n > *bound) {
                    errors.push(field.name, format!("must be at most {}", bound));
                }
            }
            Rule::MinLength(n) => {
                if let Some(s) = text {
                    if s.chars().count() < *n {
                        errors.push(field.name, format!("must be at least {} characters", n));
                    }
                }
            }
            Rule::MaxLength(n) => {
                if let Some(s) = text {
                    if s.chars().count() > *n {
                        errors.push(field.name, format!("must be at most {} characters", n));
                    }
                }
            }
            Rule::OneOf(values) => {
                if let Some(s) = text.filter(|s| !s.is_empty()) {
                    if !values.contains(&s) {
                        errors.push(field.name, format!("must be one of {}", values.join(", ")));
                    }
                }
            }
            Rule::Unique => {}
        }
    }
}

/// Validate a JSON payload for `def` and return the coerced column values.
///
/// Errors are collected for every field rather than stopping at the first.
pub fn prepare(
    def: &'static EntityDef,
    payload: &Value,
    mode: Mode,
) -> Result<Vec<(&'static FieldDef, SqlValue)>, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let Some(map) = payload.as_object() else {
        errors.push("body", "must be a JSON object");
        return Err(errors);
    };

    for key in map.keys() {
        if def.field(key).is_none() && !SYSTEM_COLUMNS.contains(&key.as_str()) {
            errors.push(key.as_str(), "is not a known field");
        }
    }

    let mut values = Vec::new();
    for field in def.fields {
        let Some(raw) = map.get(field.name) else {
            if mode == Mode::Create && field.is_required() {
                errors.push(field.name, "is required");
            }
            continue;
        };
        match coerce(field, raw) {
            Ok(v) => {
                check_rules(field, &v, &mut errors);
                values.push((field, v));
            }
            Err(msg) => errors.push(field.name, msg),
        }
    }

    if mode == Mode::Update && values.is_empty() && errors.is_empty() {
        errors.push("body", "contains no updatable fields");
    }
    errors.into_result(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::lookup;
    use serde_json::json;

    fn fields_of(errs: &ValidationErrors) -> Vec<&str> {
        errs.errors().iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn email_and_phone_formats() {
        assert!(is_email("ops@station.example"));
        assert!(!is_email("ops@station"));
        assert!(!is_email("ops station@x.io"));
        assert!(is_phone("+1 (555) 010-2030"));
        assert!(!is_phone("12345"));
        assert!(!is_phone("555-CALL-NOW"));
    }

    #[test]
    fn create_collects_every_missing_and_malformed_field() {
        let def = lookup("employees").unwrap();
        let errs = prepare(
            def,
            &json!({"first_name": "Ana", "email": "nope", "salary": -3, "bogus": 1}),
            Mode::Create,
        )
        .unwrap_err();
        let fields = fields_of(&errs);
        assert!(fields.contains(&"bogus"));
        assert!(fields.contains(&"last_name"));
        assert!(fields.contains(&"position"));
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"salary"));
        assert!(!fields.contains(&"first_name"));
    }

    #[test]
    fn update_only_checks_present_fields() {
        let def = lookup("employees").unwrap();
        let values = prepare(def, &json!({"phone": "+44 20 7946 0958"}), Mode::Update).unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].0.name, "phone");

        let errs = prepare(def, &json!({"first_name": "   "}), Mode::Update).unwrap_err();
        assert_eq!(errs.errors()[0].message, "is required");

        let errs = prepare(def, &json!({"id": 4}), Mode::Update).unwrap_err();
        assert_eq!(fields_of(&errs), vec!["body"]);
    }

    #[test]
    fn coercion_follows_field_kind() {
        let def = lookup("fuel_supplies").unwrap();
        let values = prepare(
            def,
            &json!({
                "provider_id": "2",
                "tank_id": 1,
                "fuel_type": "diesel",
                "quantity_liters": 1200.5,
                "price_per_liter": "1.459",
                "delivery_date": "2025-03-01",
            }),
            Mode::Create,
        )
        .unwrap();
        let get = |name: &str| values.iter().find(|(f, _)| f.name == name).unwrap().1.clone();
        assert_eq!(get("provider_id"), SqlValue::Integer(2));
        assert_eq!(get("quantity_liters"), SqlValue::Text("1200.5".into()));
        assert_eq!(get("price_per_liter"), SqlValue::Text("1.459".into()));

        let errs = prepare(
            def,
            &json!({"provider_id": 1, "tank_id": 1, "fuel_type": "kerosene",
                    "quantity_liters": "lots", "price_per_liter": 1, "delivery_date": "03/01/2025"}),
            Mode::Create,
        )
        .unwrap_err();
        assert_eq!(fields_of(&errs), vec!["fuel_type", "quantity_liters", "delivery_date"]);
    }

    #[test]
    fn decimals_are_bounded_on_both_sides() {
        assert_eq!(MAX_DECIMAL.to_string(), "1000000000000");
        let def = lookup("expenses").unwrap();
        let payload = |amount: Value| json!({"date": "2025-01-01", "category": "rent", "amount": amount});

        assert!(prepare(def, &payload(json!("1000000000000")), Mode::Create).is_ok());
        let errs = prepare(def, &payload(json!("79228162514264337593543950335")), Mode::Create).unwrap_err();
        assert_eq!(errs.errors()[0].message, "must be at most 1000000000000");
        let errs = prepare(def, &payload(json!("-0.01")), Mode::Create).unwrap_err();
        assert_eq!(errs.errors()[0].message, "must be at least 0");
    }

    #[test]
    fn timestamps_normalize_to_utc() {
        let def = lookup("shifts").unwrap();
        let field = def.field("start_time").unwrap();
        assert_eq!(
            coerce(field, &json!("2025-05-01T08:00:00+02:00")).unwrap(),
            SqlValue::Text("2025-05-01 06:00:00".into())
        );
        assert!(coerce(field, &json!("tomorrow")).is_err());
    }

    #[test]
    fn indexed_errors_carry_row_position() {
        let mut errs = ValidationErrors::default();
        errs.push("email", "is required");
        let errs = errs.indexed(3);
        assert_eq!(errs.errors()[0].field, "[3].email");
        assert!(errs.to_string().contains("[3].email is required"));
    }
}
