// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Generic entity CRUD over the tables described in [`crate::entities`].
//!
//! Records travel as JSON objects. Every write leaves an `audit_logs` row;
//! audit failures are logged and never fail the write itself.

use crate::entities::{self, EntityDef, FieldDef, FieldKind};
use crate::error::ApiError;
use crate::validation::{self, Mode, TIMESTAMP_FORMAT, ValidationErrors};
use chrono::NaiveDate;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;
use tracing::{debug, warn};

pub const DEFAULT_LIMIT: usize = 100;
pub const MAX_LIMIT: usize = 1000;
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

pub fn resolve(entity: &str) -> Result<&'static EntityDef, ApiError> {
    entities::lookup(entity).ok_or_else(|| ApiError::UnknownEntity(entity.to_string()))
}

fn now() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    SoftDelete,
    Restore,
    BulkCreate,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::SoftDelete => "soft_delete",
            AuditAction::Restore => "restore",
            AuditAction::BulkCreate => "bulk_create",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    pub id: i64,
    pub entity: String,
    pub record_id: Option<i64>,
    pub action: String,
    pub old_data: Option<Value>,
    pub new_data: Option<Value>,
    pub actor: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub entity: Option<String>,
    pub record_id: Option<i64>,
    pub action: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub filters: Vec<(String, Value)>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub order_by: Option<String>,
    pub descending: bool,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub include_deleted: bool,
}

impl ListQuery {
    /// Build from query-string pairs; keys that are not paging/ordering
    /// options become equality filters.
    pub fn from_params(params: &BTreeMap<String, String>) -> Result<Self, ApiError> {
        let mut q = ListQuery::default();
        for (k, v) in params {
            match k.as_str() {
                "order_by" => q.order_by = Some(v.clone()),
                "order" => {
                    q.descending = match v.to_ascii_lowercase().as_str() {
                        "asc" => false,
                        "desc" => true,
                        _ => return Err(ApiError::BadRequest(format!("invalid order '{}'", v))),
                    }
                }
                "limit" => q.limit = Some(parse_usize(k, v)?),
                "offset" => q.offset = Some(parse_usize(k, v)?),
                "include_deleted" => q.include_deleted = matches!(v.as_str(), "true" | "1"),
                "from" => q.from = Some(parse_day(k, v)?),
                "to" => q.to = Some(parse_day(k, v)?),
                _ => q.filters.push((k.clone(), Value::String(v.clone()))),
            }
        }
        Ok(q)
    }

    pub fn with_filter(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push((field.to_string(), value.into()));
        self
    }
}

/// Decimals live in TEXT columns; compare and order them as numbers.
fn compare_expr(field: &FieldDef, expr: &str) -> String {
    match field.kind {
        FieldKind::Decimal => format!("CAST({} AS REAL)", expr),
        _ => expr.to_string(),
    }
}

pub fn parse_usize(key: &str, v: &str) -> Result<usize, ApiError> {
    v.trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("{} must be a non-negative integer", key)))
}

pub fn parse_day(key: &str, v: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("{} must be a date (YYYY-MM-DD)", key)))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityStats {
    pub entity: String,
    pub total: i64,
    pub active: i64,
    pub deleted: i64,
    pub by_status: BTreeMap<String, i64>,
    pub amount_field: Option<String>,
    pub amount_total: Option<Decimal>,
}

pub struct Crud<'c> {
    conn: &'c Connection,
    actor: Option<String>,
}

impl<'c> Crud<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn, actor: None }
    }

    pub fn with_actor(mut self, actor: Option<&str>) -> Self {
        self.actor = actor.map(str::to_string);
        self
    }

    pub fn get(&self, entity: &str, id: i64) -> Result<Value, ApiError> {
        let def = resolve(entity)?;
        self.fetch(def, id, false)?.ok_or_else(|| not_found(def, id))
    }

    fn fetch(&self, def: &EntityDef, id: i64, include_deleted: bool) -> Result<Option<Value>, ApiError> {
        let mut sql = format!("SELECT {} FROM {} WHERE id=?1", def.select_columns(), def.table);
        if !include_deleted {
            sql.push_str(" AND deleted_at IS NULL");
        }
        let record = self
            .conn
            .query_row(&sql, params![id], |r| row_to_record(def, r))
            .optional()?;
        Ok(record)
    }

    pub fn list(&self, entity: &str, q: &ListQuery) -> Result<Vec<Value>, ApiError> {
        let def = resolve(entity)?;
        let mut sql = format!("SELECT {} FROM {} WHERE 1=1", def.select_columns(), def.table);
        let mut args: Vec<SqlValue> = Vec::new();

        if !q.include_deleted {
            sql.push_str(" AND deleted_at IS NULL");
        }
        for (name, raw) in &q.filters {
            let field = def.field(name).ok_or_else(|| {
                ApiError::BadRequest(format!("unknown filter '{}' for {}", name, def.name))
            })?;
            let value = validation::coerce(field, raw)
                .map_err(|m| ApiError::BadRequest(format!("filter {} {}", name, m)))?;
            if matches!(value, SqlValue::Null) {
                sql.push_str(&format!(" AND {} IS NULL", field.name));
            } else {
                args.push(value);
                let param = format!("?{}", args.len());
                sql.push_str(&format!(" AND {}={}", compare_expr(field, field.name), compare_expr(field, &param)));
            }
        }
        if q.from.is_some() || q.to.is_some() {
            let col = def.date_field.ok_or_else(|| {
                ApiError::BadRequest(format!("{} has no date column to filter on", def.name))
            })?;
            if let Some(from) = q.from {
                args.push(SqlValue::Text(from.to_string()));
                sql.push_str(&format!(" AND substr({},1,10)>=?{}", col, args.len()));
            }
            if let Some(to) = q.to {
                args.push(SqlValue::Text(to.to_string()));
                sql.push_str(&format!(" AND substr({},1,10)<=?{}", col, args.len()));
            }
        }

        match &q.order_by {
            Some(col) if def.is_column(col) => {
                let dir = if q.descending { "DESC" } else { "ASC" };
                let key = match def.field(col) {
                    Some(field) => compare_expr(field, col),
                    None => col.clone(),
                };
                sql.push_str(&format!(" ORDER BY {} {}, id {}", key, dir, dir));
            }
            Some(col) => {
                return Err(ApiError::BadRequest(format!("cannot order {} by '{}'", def.name, col)));
            }
            None => sql.push_str(" ORDER BY id DESC"),
        }
        let limit = q.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, q.offset.unwrap_or(0)));

        debug!(entity = def.name, %sql, "list");
        self.query_records(def, &sql, args)
    }

    /// Every live row of an entity, oldest first; used by dashboards and export.
    pub fn all(&self, entity: &str) -> Result<Vec<Value>, ApiError> {
        let def = resolve(entity)?;
        let sql = format!(
            "SELECT {} FROM {} WHERE deleted_at IS NULL ORDER BY id",
            def.select_columns(),
            def.table
        );
        self.query_records(def, &sql, Vec::new())
    }

    fn query_records(&self, def: &EntityDef, sql: &str, args: Vec<SqlValue>) -> Result<Vec<Value>, ApiError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(args), |r| row_to_record(def, r))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn create(&self, entity: &str, payload: &Value) -> Result<Value, ApiError> {
        let def = resolve(entity)?;
        let values = validation::prepare(def, payload, Mode::Create)?;
        let mut errors = ValidationErrors::default();
        self.check_unique(def, &values, None, &mut errors)?;
        self.check_references(&values, &mut errors)?;
        if !errors.is_empty() {
            return Err(errors.into());
        }
        let id = self.insert(def, &values)?;
        let record = self.fetch(def, id, false)?.ok_or_else(|| not_found(def, id))?;
        self.audit(def, Some(id), AuditAction::Create, None, Some(&record));
        Ok(record)
    }

    pub fn bulk_create(&self, entity: &str, payloads: &[Value]) -> Result<Vec<Value>, ApiError> {
        let def = resolve(entity)?;
        if payloads.is_empty() {
            return Err(ApiError::BadRequest("bulk payload is empty".into()));
        }

        let mut errors = ValidationErrors::default();
        let mut prepared = Vec::with_capacity(payloads.len());
        let mut seen: HashMap<&str, HashSet<String>> = HashMap::new();
        for (i, payload) in payloads.iter().enumerate() {
            match validation::prepare(def, payload, Mode::Create) {
                Ok(values) => {
                    let mut row_errors = ValidationErrors::default();
                    self.check_unique(def, &values, None, &mut row_errors)?;
                    self.check_references(&values, &mut row_errors)?;
                    for (field, value) in values.iter().filter(|(f, _)| f.is_unique()) {
                        if let Some(key) = unique_key(field, value) {
                            if !seen.entry(field.name).or_default().insert(key) {
                                row_errors.push(field.name, "is duplicated within the request");
                            }
                        }
                    }
                    errors.extend(row_errors.indexed(i));
                    prepared.push(values);
                }
                Err(e) => errors.extend(e.indexed(i)),
            }
        }
        if !errors.is_empty() {
            return Err(errors.into());
        }

        let tx = self.conn.unchecked_transaction()?;
        let mut records = Vec::with_capacity(prepared.len());
        for values in &prepared {
            let id = self.insert(def, values)?;
            let record = self.fetch(def, id, false)?.ok_or_else(|| not_found(def, id))?;
            self.audit(def, Some(id), AuditAction::BulkCreate, None, Some(&record));
            records.push(record);
        }
        tx.commit()?;
        debug!(entity = def.name, count = records.len(), "bulk create");
        Ok(records)
    }

    pub fn update(&self, entity: &str, id: i64, payload: &Value) -> Result<Value, ApiError> {
        let def = resolve(entity)?;
        let before = self.fetch(def, id, false)?.ok_or_else(|| not_found(def, id))?;
        let values = validation::prepare(def, payload, Mode::Update)?;
        let mut errors = ValidationErrors::default();
        self.check_unique(def, &values, Some(id), &mut errors)?;
        self.check_references(&values, &mut errors)?;
        if !errors.is_empty() {
            return Err(errors.into());
        }

        let mut sets = Vec::with_capacity(values.len() + 1);
        let mut args: Vec<SqlValue> = Vec::with_capacity(values.len() + 2);
        for (field, value) in &values {
            args.push(value.clone());
            sets.push(format!("{}=?{}", field.name, args.len()));
        }
        args.push(SqlValue::Text(now()));
        sets.push(format!("updated_at=?{}", args.len()));
        args.push(SqlValue::Integer(id));
        let sql = format!(
            "UPDATE {} SET {} WHERE id=?{} AND deleted_at IS NULL",
            def.table,
            sets.join(", "),
            args.len()
        );
        self.conn.execute(&sql, params_from_iter(args))?;

        let after = self.fetch(def, id, false)?.ok_or_else(|| not_found(def, id))?;
        self.audit(def, Some(id), AuditAction::Update, Some(&before), Some(&after));
        Ok(after)
    }

    /// Hard delete; returns the removed record.
    pub fn delete(&self, entity: &str, id: i64) -> Result<Value, ApiError> {
        let def = resolve(entity)?;
        let before = self.fetch(def, id, true)?.ok_or_else(|| not_found(def, id))?;
        self.conn
            .execute(&format!("DELETE FROM {} WHERE id=?1", def.table), params![id])?;
        self.audit(def, Some(id), AuditAction::Delete, Some(&before), None);
        Ok(before)
    }

    pub fn soft_delete(&self, entity: &str, id: i64) -> Result<Value, ApiError> {
        let def = resolve(entity)?;
        let before = self.fetch(def, id, false)?.ok_or_else(|| not_found(def, id))?;
        let ts = now();
        self.conn.execute(
            &format!("UPDATE {} SET deleted_at=?1, updated_at=?1 WHERE id=?2", def.table),
            params![ts, id],
        )?;
        let after = self.fetch(def, id, true)?.ok_or_else(|| not_found(def, id))?;
        self.audit(def, Some(id), AuditAction::SoftDelete, Some(&before), Some(&after));
        Ok(after)
    }

    pub fn restore(&self, entity: &str, id: i64) -> Result<Value, ApiError> {
        let def = resolve(entity)?;
        let before = self
            .fetch(def, id, true)?
            .filter(|r| !r["deleted_at"].is_null())
            .ok_or_else(|| not_found(def, id))?;

        // Restoring must not resurrect a duplicate of a live unique value.
        let mut values = Vec::new();
        for field in def.fields.iter().filter(|f| f.is_unique()) {
            if let Ok(v) = validation::coerce(field, &before[field.name]) {
                values.push((field, v));
            }
        }
        let mut errors = ValidationErrors::default();
        self.check_unique(def, &values, Some(id), &mut errors)?;
        if !errors.is_empty() {
            return Err(errors.into());
        }

        self.conn.execute(
            &format!("UPDATE {} SET deleted_at=NULL, updated_at=?1 WHERE id=?2", def.table),
            params![now(), id],
        )?;
        let after = self.fetch(def, id, false)?.ok_or_else(|| not_found(def, id))?;
        self.audit(def, Some(id), AuditAction::Restore, Some(&before), Some(&after));
        Ok(after)
    }

    pub fn search(&self, entity: &str, term: &str, limit: Option<usize>) -> Result<Vec<Value>, ApiError> {
        let def = resolve(entity)?;
        let term = term.trim();
        if term.is_empty() {
            return Err(ApiError::BadRequest("search term must not be empty".into()));
        }
        let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
        let clauses: Vec<String> = def
            .search
            .iter()
            .map(|c| format!("lower({}) LIKE ?1 ESCAPE '\\'", c))
            .collect();
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT).min(MAX_LIMIT);
        let sql = format!(
            "SELECT {} FROM {} WHERE deleted_at IS NULL AND ({}) ORDER BY id DESC LIMIT {}",
            def.select_columns(),
            def.table,
            clauses.join(" OR "),
            limit
        );
        self.query_records(def, &sql, vec![SqlValue::Text(pattern)])
    }

    pub fn stats(&self, entity: &str) -> Result<EntityStats, ApiError> {
        let def = resolve(entity)?;
        let (total, deleted): (i64, i64) = self.conn.query_row(
            &format!(
                "SELECT COUNT(*), COUNT(deleted_at) FROM {}",
                def.table
            ),
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;

        let mut by_status = BTreeMap::new();
        if let Some(col) = def.status_field {
            let mut stmt = self.conn.prepare(&format!(
                "SELECT COALESCE({col}, '(none)'), COUNT(*) FROM {} WHERE deleted_at IS NULL GROUP BY 1",
                def.table
            ))?;
            let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?;
            for row in rows {
                let (status, n) = row?;
                by_status.insert(status, n);
            }
        }

        let amount_total = match def.amount_field {
            Some(col) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {col} FROM {} WHERE deleted_at IS NULL AND {col} IS NOT NULL",
                    def.table
                ))?;
                let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
                let mut sum = Decimal::ZERO;
                for row in rows {
                    let s = row?;
                    match Decimal::from_str(&s) {
                        Ok(d) => {
                            sum = sum.checked_add(d).ok_or_else(|| {
                                ApiError::Internal(format!("{} total of {} overflows", col, def.name))
                            })?;
                        }
                        Err(_) => warn!(entity = def.name, column = col, value = %s, "skipping non-numeric amount"),
                    }
                }
                Some(sum)
            }
            None => None,
        };

        Ok(EntityStats {
            entity: def.name.to_string(),
            total,
            active: total - deleted,
            deleted,
            by_status,
            amount_field: def.amount_field.map(str::to_string),
            amount_total,
        })
    }

    pub fn audit_log(&self, q: &AuditQuery) -> Result<Vec<AuditEntry>, ApiError> {
        let mut sql = String::from(
            "SELECT id, entity, record_id, action, old_data, new_data, actor, created_at FROM audit_logs WHERE 1=1",
        );
        let mut args: Vec<SqlValue> = Vec::new();
        if let Some(entity) = &q.entity {
            resolve(entity)?;
            args.push(SqlValue::Text(entity.clone()));
            sql.push_str(&format!(" AND entity=?{}", args.len()));
        }
        if let Some(id) = q.record_id {
            args.push(SqlValue::Integer(id));
            sql.push_str(&format!(" AND record_id=?{}", args.len()));
        }
        if let Some(action) = &q.action {
            args.push(SqlValue::Text(action.clone()));
            sql.push_str(&format!(" AND action=?{}", args.len()));
        }
        let limit = q.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        sql.push_str(&format!(" ORDER BY id DESC LIMIT {}", limit));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args), |r| {
            Ok(AuditEntry {
                id: r.get(0)?,
                entity: r.get(1)?,
                record_id: r.get(2)?,
                action: r.get(3)?,
                old_data: parse_json_column(r.get(4)?),
                new_data: parse_json_column(r.get(5)?),
                actor: r.get(6)?,
                created_at: r.get(7)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn insert(&self, def: &EntityDef, values: &[(&'static FieldDef, SqlValue)]) -> Result<i64, ApiError> {
        let ts = now();
        let mut cols: Vec<&str> = values.iter().map(|(f, _)| f.name).collect();
        let mut args: Vec<SqlValue> = values.iter().map(|(_, v)| v.clone()).collect();
        cols.extend(["created_at", "updated_at"]);
        args.push(SqlValue::Text(ts.clone()));
        args.push(SqlValue::Text(ts));
        let placeholders: Vec<String> = (1..=args.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {}({}) VALUES ({})",
            def.table,
            cols.join(", "),
            placeholders.join(", ")
        );
        self.conn.execute(&sql, params_from_iter(args))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn check_unique(
        &self,
        def: &EntityDef,
        values: &[(&'static FieldDef, SqlValue)],
        exclude_id: Option<i64>,
        errors: &mut ValidationErrors,
    ) -> Result<(), ApiError> {
        for (field, value) in values.iter().filter(|(f, _)| f.is_unique()) {
            if matches!(value, SqlValue::Null) {
                continue;
            }
            if matches!(value, SqlValue::Text(s) if s.is_empty()) {
                continue;
            }
            let cmp = if field.kind == FieldKind::Text {
                format!("lower({})=lower(?1)", field.name)
            } else {
                format!("{}=?1", field.name)
            };
            let sql = format!(
                "SELECT 1 FROM {} WHERE {} AND deleted_at IS NULL AND id != ?2 LIMIT 1",
                def.table, cmp
            );
            let taken: Option<i64> = self
                .conn
                .query_row(&sql, params![value, exclude_id.unwrap_or(-1)], |r| r.get(0))
                .optional()?;
            if taken.is_some() {
                errors.push(field.name, "is already taken");
            }
        }
        Ok(())
    }

    fn check_references(
        &self,
        values: &[(&'static FieldDef, SqlValue)],
        errors: &mut ValidationErrors,
    ) -> Result<(), ApiError> {
        for (field, value) in values {
            let (Some(table), SqlValue::Integer(id)) = (field.references, value) else {
                continue;
            };
            let exists: Option<i64> = self
                .conn
                .query_row(
                    &format!("SELECT 1 FROM {} WHERE id=?1 AND deleted_at IS NULL", table),
                    params![id],
                    |r| r.get(0),
                )
                .optional()?;
            if exists.is_none() {
                errors.push(field.name, format!("references missing {} {}", table, id));
            }
        }
        Ok(())
    }

    fn audit(
        &self,
        def: &EntityDef,
        record_id: Option<i64>,
        action: AuditAction,
        old: Option<&Value>,
        new: Option<&Value>,
    ) {
        let result = self.conn.execute(
            "INSERT INTO audit_logs(entity, record_id, action, old_data, new_data, actor, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                def.name,
                record_id,
                action.as_str(),
                old.map(Value::to_string),
                new.map(Value::to_string),
                self.actor,
                now()
            ],
        );
        if let Err(e) = result {
            warn!(entity = def.name, ?record_id, action = action.as_str(), error = %e, "audit log insert failed");
        }
    }
}

fn not_found(def: &EntityDef, id: i64) -> ApiError {
    ApiError::NotFound {
        entity: def.name.to_string(),
        id,
    }
}

fn unique_key(field: &FieldDef, value: &SqlValue) -> Option<String> {
    match value {
        SqlValue::Text(s) if s.is_empty() => None,
        SqlValue::Text(s) if field.kind == FieldKind::Text => Some(s.to_lowercase()),
        SqlValue::Text(s) => Some(s.clone()),
        SqlValue::Integer(i) => Some(i.to_string()),
        SqlValue::Real(f) => Some(f.to_string()),
        _ => None,
    }
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn parse_json_column(raw: Option<String>) -> Option<Value> {
    raw.and_then(|s| serde_json::from_str(&s).ok())
}

fn row_to_record(def: &EntityDef, r: &Row<'_>) -> rusqlite::Result<Value> {
    let mut map = Map::new();
    map.insert("id".into(), Value::from(r.get::<_, i64>(0)?));
    for (i, field) in def.fields.iter().enumerate() {
        map.insert(field.name.into(), cell_to_json(field.kind, r.get_ref(i + 1)?));
    }
    let base = def.fields.len() + 1;
    for (offset, name) in ["created_at", "updated_at", "deleted_at"].iter().enumerate() {
        map.insert((*name).into(), cell_to_json(FieldKind::Timestamp, r.get_ref(base + offset)?));
    }
    Ok(Value::Object(map))
}

fn cell_to_json(kind: FieldKind, cell: ValueRef<'_>) -> Value {
    match cell {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) if kind == FieldKind::Bool => Value::Bool(i != 0),
        ValueRef::Integer(i) if kind == FieldKind::Decimal => Value::String(i.to_string()),
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(_) => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[test]
    fn list_params_split_into_options_and_filters() {
        let params: BTreeMap<String, String> = [
            ("order_by", "name"),
            ("order", "desc"),
            ("limit", "5"),
            ("status", "active"),
            ("from", "2025-01-01"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let q = ListQuery::from_params(&params).unwrap();
        assert_eq!(q.order_by.as_deref(), Some("name"));
        assert!(q.descending);
        assert_eq!(q.limit, Some(5));
        assert_eq!(q.filters, vec![("status".to_string(), Value::from("active"))]);
        assert_eq!(q.from, NaiveDate::from_ymd_opt(2025, 1, 1));

        let bad: BTreeMap<String, String> =
            [("limit".to_string(), "-1".to_string())].into_iter().collect();
        assert!(ListQuery::from_params(&bad).is_err());
    }
}
