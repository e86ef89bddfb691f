// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Request dispatch shared by the HTTP server and the `api` command.
//!
//! Handlers return data or an [`ApiError`]; [`Api::handle`] turns either
//! into an [`ApiResponse`], errors as the `{error, status}` envelope.

use crate::crud::{self, AuditQuery, Crud, ListQuery};
use crate::dashboard;
use crate::entities::{self, ENTITIES};
use crate::error::ApiError;
use crate::models::{Expense, FuelSupply, Shift, Tank, Transaction};
use crate::preferences;
use crate::router::{Method, Params, Router};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use tracing::{debug, error};
use url::form_urlencoded;

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: BTreeMap<String, String>,
    pub body: Option<Value>,
    pub actor: Option<String>,
}

impl ApiRequest {
    /// `path` may carry a query string; it is split off into `query`.
    pub fn new(method: Method, path: &str) -> Self {
        let (path, query) = match path.split_once('?') {
            Some((p, q)) => (p, parse_query(q)),
            None => (path, BTreeMap::new()),
        };
        Self {
            method,
            path: path.to_string(),
            query,
            body: None,
            actor: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_actor(mut self, actor: Option<&str>) -> Self {
        self.actor = actor.map(str::to_string);
        self
    }

    pub fn with_query(mut self, query: BTreeMap<String, String>) -> Self {
        self.query.extend(query);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn created(body: Value) -> Self {
        Self { status: 201, body }
    }

    pub fn from_error(e: &ApiError) -> Self {
        Self {
            status: e.status(),
            body: e.envelope(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub fn parse_query(q: &str) -> BTreeMap<String, String> {
    form_urlencoded::parse(q.as_bytes()).into_owned().collect()
}

struct Ctx<'a> {
    conn: &'a Connection,
    req: &'a ApiRequest,
    params: &'a Params,
}

impl<'a> Ctx<'a> {
    fn crud(&self) -> Crud<'a> {
        Crud::new(self.conn).with_actor(self.req.actor.as_deref())
    }

    fn param(&self, name: &str) -> Result<&'a str, ApiError> {
        self.params
            .get(name)
            .ok_or_else(|| ApiError::Internal(format!("route is missing :{}", name)))
    }

    fn id(&self) -> Result<i64, ApiError> {
        let raw = self.param("id")?;
        raw.parse()
            .map_err(|_| ApiError::BadRequest(format!("invalid id '{}'", raw)))
    }

    fn body(&self) -> Result<&'a Value, ApiError> {
        self.req
            .body
            .as_ref()
            .ok_or_else(|| ApiError::BadRequest("request body is required".into()))
    }

    fn query(&self, key: &str) -> Option<&'a str> {
        self.req.query.get(key).map(String::as_str)
    }

    fn period(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>), ApiError> {
        let from = self.query("from").map(|v| crud::parse_day("from", v)).transpose()?;
        let to = self.query("to").map(|v| crud::parse_day("to", v)).transpose()?;
        Ok((from, to))
    }

    /// Every live record of `entity` as typed models.
    fn records<T: DeserializeOwned>(&self, entity: &str) -> Result<Vec<T>, ApiError> {
        self.crud()
            .all(entity)?
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(|e| ApiError::Internal(e.to_string())))
            .collect()
    }
}

type Handler = fn(&Ctx<'_>) -> Result<ApiResponse, ApiError>;

pub struct Api {
    router: Router<Handler>,
}

impl Default for Api {
    fn default() -> Self {
        Self::new()
    }
}

impl Api {
    pub fn new() -> Self {
        let router = Router::new()
            .route(Method::Get, "/health", health as Handler)
            .route(Method::Get, "/entities", list_entities)
            .route(Method::Get, "/dashboard/overview", dashboard_overview)
            .route(Method::Get, "/dashboard/expenses", dashboard_expenses)
            .route(Method::Get, "/dashboard/tanks", dashboard_tanks)
            .route(Method::Get, "/dashboard/sales", dashboard_sales)
            .route(Method::Get, "/dashboard/supplies", dashboard_supplies)
            .route(Method::Get, "/dashboard/shifts", dashboard_shifts)
            .route(Method::Get, "/preferences", prefs_all)
            .route(Method::Get, "/preferences/:key", prefs_get)
            .route(Method::Put, "/preferences/:key", prefs_set)
            .route(Method::Get, "/audit_logs", audit_logs)
            .route(Method::Get, "/:entity/search", search)
            .route(Method::Get, "/:entity/stats", stats)
            .route(Method::Post, "/:entity/bulk", bulk_create)
            .route(Method::Get, "/:entity", list)
            .route(Method::Post, "/:entity", create)
            .route(Method::Get, "/:entity/:id", get)
            .route(Method::Put, "/:entity/:id", update)
            .route(Method::Patch, "/:entity/:id", update)
            .route(Method::Delete, "/:entity/:id", delete)
            .route(Method::Delete, "/:entity/:id/soft", soft_delete)
            .route(Method::Post, "/:entity/:id/restore", restore);
        Self { router }
    }

    pub fn handle(&self, conn: &Connection, req: &ApiRequest) -> ApiResponse {
        match self.dispatch(conn, req) {
            Ok(resp) => resp,
            Err(e) => {
                if e.status() >= 500 {
                    error!(method = %req.method, path = %req.path, error = %e, "request failed");
                } else {
                    debug!(method = %req.method, path = %req.path, error = %e, "request rejected");
                }
                ApiResponse::from_error(&e)
            }
        }
    }

    fn dispatch(&self, conn: &Connection, req: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let m = self.router.resolve(req.method, &req.path)?;
        debug!(pattern = m.pattern, "route matched");
        let ctx = Ctx {
            conn,
            req,
            params: &m.params,
        };
        (m.handler)(&ctx)
    }
}

fn health(_: &Ctx<'_>) -> Result<ApiResponse, ApiError> {
    Ok(ApiResponse::ok(json!({"status": "ok"})))
}

fn list_entities(_: &Ctx<'_>) -> Result<ApiResponse, ApiError> {
    let out: Vec<Value> = ENTITIES
        .iter()
        .map(|e| {
            let fields: Vec<Value> = e
                .fields
                .iter()
                .map(|f| {
                    json!({
                        "name": f.name,
                        "kind": f.kind,
                        "rules": f.rules.iter().map(|r| r.to_string()).collect::<Vec<_>>(),
                        "references": f.references,
                    })
                })
                .collect();
            json!({"name": e.name, "fields": fields, "search": e.search})
        })
        .collect();
    Ok(ApiResponse::ok(Value::Array(out)))
}

fn list(ctx: &Ctx<'_>) -> Result<ApiResponse, ApiError> {
    let q = ListQuery::from_params(&ctx.req.query)?;
    let rows = ctx.crud().list(ctx.param("entity")?, &q)?;
    Ok(ApiResponse::ok(Value::Array(rows)))
}

fn get(ctx: &Ctx<'_>) -> Result<ApiResponse, ApiError> {
    let record = ctx.crud().get(ctx.param("entity")?, ctx.id()?)?;
    Ok(ApiResponse::ok(record))
}

fn create(ctx: &Ctx<'_>) -> Result<ApiResponse, ApiError> {
    let record = ctx.crud().create(ctx.param("entity")?, ctx.body()?)?;
    Ok(ApiResponse::created(record))
}

fn update(ctx: &Ctx<'_>) -> Result<ApiResponse, ApiError> {
    let record = ctx.crud().update(ctx.param("entity")?, ctx.id()?, ctx.body()?)?;
    Ok(ApiResponse::ok(record))
}

fn delete(ctx: &Ctx<'_>) -> Result<ApiResponse, ApiError> {
    let record = ctx.crud().delete(ctx.param("entity")?, ctx.id()?)?;
    Ok(ApiResponse::ok(json!({"deleted": true, "record": record})))
}

fn soft_delete(ctx: &Ctx<'_>) -> Result<ApiResponse, ApiError> {
    let record = ctx.crud().soft_delete(ctx.param("entity")?, ctx.id()?)?;
    Ok(ApiResponse::ok(record))
}

fn restore(ctx: &Ctx<'_>) -> Result<ApiResponse, ApiError> {
    let record = ctx.crud().restore(ctx.param("entity")?, ctx.id()?)?;
    Ok(ApiResponse::ok(record))
}

fn bulk_create(ctx: &Ctx<'_>) -> Result<ApiResponse, ApiError> {
    let rows = ctx
        .body()?
        .as_array()
        .ok_or_else(|| ApiError::BadRequest("bulk body must be a JSON array".into()))?;
    let records = ctx.crud().bulk_create(ctx.param("entity")?, rows)?;
    Ok(ApiResponse::created(Value::Array(records)))
}

fn search(ctx: &Ctx<'_>) -> Result<ApiResponse, ApiError> {
    let term = ctx.query("q").unwrap_or_default();
    let limit = ctx.query("limit").map(|v| crud::parse_usize("limit", v)).transpose()?;
    let rows = ctx.crud().search(ctx.param("entity")?, term, limit)?;
    Ok(ApiResponse::ok(Value::Array(rows)))
}

fn stats(ctx: &Ctx<'_>) -> Result<ApiResponse, ApiError> {
    let stats = ctx.crud().stats(ctx.param("entity")?)?;
    Ok(ApiResponse::ok(serde_json::to_value(stats)?))
}

fn audit_logs(ctx: &Ctx<'_>) -> Result<ApiResponse, ApiError> {
    let record_id = ctx
        .query("record_id")
        .map(|v| {
            v.parse::<i64>()
                .map_err(|_| ApiError::BadRequest(format!("invalid record_id '{}'", v)))
        })
        .transpose()?;
    let q = AuditQuery {
        entity: ctx.query("entity").map(str::to_string),
        record_id,
        action: ctx.query("action").map(str::to_string),
        limit: ctx.query("limit").map(|v| crud::parse_usize("limit", v)).transpose()?,
    };
    let entries = ctx.crud().audit_log(&q)?;
    Ok(ApiResponse::ok(serde_json::to_value(entries)?))
}

fn prefs_all(ctx: &Ctx<'_>) -> Result<ApiResponse, ApiError> {
    Ok(ApiResponse::ok(preferences::get_all(ctx.conn)?))
}

fn prefs_get(ctx: &Ctx<'_>) -> Result<ApiResponse, ApiError> {
    let key = ctx.param("key")?;
    let value = preferences::get(ctx.conn, key)?;
    Ok(ApiResponse::ok(json!({ key: value })))
}

fn prefs_set(ctx: &Ctx<'_>) -> Result<ApiResponse, ApiError> {
    let key = ctx.param("key")?;
    let value = preferences::set(ctx.conn, key, ctx.body()?)?;
    Ok(ApiResponse::ok(json!({ key: value })))
}

fn dashboard_expenses(ctx: &Ctx<'_>) -> Result<ApiResponse, ApiError> {
    let (from, to) = ctx.period()?;
    let expenses: Vec<Expense> = ctx.records("expenses")?;
    let expenses: Vec<Expense> = expenses
        .into_iter()
        .filter(|e| dashboard::within_period(e.date, from, to))
        .collect();
    Ok(ApiResponse::ok(serde_json::to_value(dashboard::expense_breakdown(&expenses))?))
}

fn dashboard_tanks(ctx: &Ctx<'_>) -> Result<ApiResponse, ApiError> {
    let tanks: Vec<Tank> = ctx.records("tanks")?;
    Ok(ApiResponse::ok(serde_json::to_value(dashboard::tank_levels(&tanks))?))
}

fn dashboard_sales(ctx: &Ctx<'_>) -> Result<ApiResponse, ApiError> {
    let (from, to) = ctx.period()?;
    let txs: Vec<Transaction> = ctx.records("transactions")?;
    let txs: Vec<Transaction> = txs
        .into_iter()
        .filter(|t| dashboard::within_period(t.date, from, to))
        .collect();
    Ok(ApiResponse::ok(serde_json::to_value(dashboard::sales_summary(&txs))?))
}

fn dashboard_supplies(ctx: &Ctx<'_>) -> Result<ApiResponse, ApiError> {
    let (from, to) = ctx.period()?;
    let supplies: Vec<FuelSupply> = ctx.records("fuel_supplies")?;
    let supplies: Vec<FuelSupply> = supplies
        .into_iter()
        .filter(|s| dashboard::within_period(s.delivery_date, from, to))
        .collect();
    Ok(ApiResponse::ok(serde_json::to_value(dashboard::supply_summary(&supplies))?))
}

fn dashboard_shifts(ctx: &Ctx<'_>) -> Result<ApiResponse, ApiError> {
    let (from, to) = ctx.period()?;
    let shifts: Vec<Shift> = ctx.records("shifts")?;
    let shifts: Vec<Shift> = shifts
        .into_iter()
        .filter(|s| {
            NaiveDate::parse_from_str(s.start_time.get(..10).unwrap_or_default(), "%Y-%m-%d")
                .is_ok_and(|d| dashboard::within_period(d, from, to))
        })
        .collect();
    Ok(ApiResponse::ok(serde_json::to_value(dashboard::shift_summary(&shifts))?))
}

fn dashboard_overview(ctx: &Ctx<'_>) -> Result<ApiResponse, ApiError> {
    let (from, to) = ctx.period()?;
    let txs: Vec<Transaction> = ctx.records("transactions")?;
    let expenses: Vec<Expense> = ctx.records("expenses")?;
    let txs: Vec<Transaction> = txs
        .into_iter()
        .filter(|t| dashboard::within_period(t.date, from, to))
        .collect();
    let expenses: Vec<Expense> = expenses
        .into_iter()
        .filter(|e| dashboard::within_period(e.date, from, to))
        .collect();
    let tanks: Vec<Tank> = ctx.records("tanks")?;
    let low_tanks: Vec<String> = dashboard::tank_levels(&tanks)
        .into_iter()
        .filter(|t| t.low)
        .map(|t| t.name)
        .collect();
    Ok(ApiResponse::ok(json!({
        "finance": dashboard::finance_overview(&txs, &expenses),
        "low_tanks": low_tanks,
        "entities": entities::names().collect::<Vec<_>>(),
    })))
}
