// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! UI preferences kept in the `settings` key/value table.
//!
//! Values are stored as JSON text so booleans and numbers survive a round
//! trip through the TEXT column.

use crate::error::ApiError;
use crate::utils::{get_setting, put_setting};
use rusqlite::Connection;
use serde_json::{Map, Value, json};

pub const KEYS: &[&str] = &["theme", "sidebar_collapsed", "language", "page_size"];

pub fn default_for(key: &str) -> Option<Value> {
    match key {
        "theme" => Some(json!("light")),
        "sidebar_collapsed" => Some(json!(false)),
        "language" => Some(json!("en")),
        "page_size" => Some(json!(25)),
        _ => None,
    }
}

fn check(key: &str, value: &Value) -> Result<(), String> {
    match key {
        "theme" => match value.as_str() {
            Some("light" | "dark" | "system") => Ok(()),
            _ => Err("theme must be one of light, dark, system".into()),
        },
        "sidebar_collapsed" => value
            .as_bool()
            .map(|_| ())
            .ok_or_else(|| "sidebar_collapsed must be a boolean".into()),
        "language" => match value.as_str() {
            Some(s) if s.len() == 2 && s.chars().all(|c| c.is_ascii_lowercase()) => Ok(()),
            _ => Err("language must be a two-letter lowercase code".into()),
        },
        "page_size" => match value.as_u64() {
            Some(1..=1000) => Ok(()),
            _ => Err("page_size must be an integer between 1 and 1000".into()),
        },
        _ => Err(format!("unknown preference '{}'", key)),
    }
}

pub fn get(conn: &Connection, key: &str) -> Result<Value, ApiError> {
    let default = default_for(key)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown preference '{}'", key)))?;
    match get_setting(conn, &format!("pref.{}", key))? {
        Some(raw) => Ok(serde_json::from_str(&raw).unwrap_or(default)),
        None => Ok(default),
    }
}

pub fn get_all(conn: &Connection) -> Result<Value, ApiError> {
    let mut out = Map::new();
    for key in KEYS {
        out.insert((*key).to_string(), get(conn, key)?);
    }
    Ok(Value::Object(out))
}

pub fn set(conn: &Connection, key: &str, value: &Value) -> Result<Value, ApiError> {
    check(key, value).map_err(ApiError::BadRequest)?;
    put_setting(conn, &format!("pref.{}", key), &value.to_string())?;
    Ok(value.clone())
}
