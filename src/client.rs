// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::cache::{QueryCache, QueryKey};
use crate::router::Method;
use crate::server::ACTOR_HEADER;
use crate::utils::http_client;

pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{status}: {error}")]
    Api { status: u16, error: String },

    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Turn a raw HTTP response into data or the server's error envelope.
///
/// Error statuses win over the body: a non-JSON error page still yields
/// `ClientError::Api` with the HTTP status.
pub fn decode_response(status: u16, text: &str) -> Result<Value, ClientError> {
    if !(200..300).contains(&status) {
        let error = serde_json::from_str::<Value>(text)
            .ok()
            .and_then(|body| body.get("error").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| format!("HTTP {}", status));
        return Err(ClientError::Api { status, error });
    }
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(text)?)
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    actor: Option<String>,
    cache: QueryCache<Value>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            http: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            actor: None,
            cache: QueryCache::new(DEFAULT_STALE_AFTER),
        })
    }

    pub fn with_actor(mut self, actor: Option<&str>) -> Self {
        self.actor = actor.map(str::to_string);
        self
    }

    pub fn cache(&self) -> &QueryCache<Value> {
        &self.cache
    }

    /// Uncached request; `path` may include a query string.
    pub fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, ClientError> {
        send(&self.http, &self.base_url, self.actor.as_deref(), method, path, body)
    }

    pub fn list(&mut self, entity: &str) -> Result<Value, ClientError> {
        let key = QueryKey::new([entity]);
        let path = format!("/{}", entity);
        let http = &self.http;
        let (base, actor) = (&self.base_url, self.actor.as_deref());
        self.cache
            .fetch(&key, || send(http, base, actor, Method::Get, &path, None))
    }

    pub fn get(&mut self, entity: &str, id: i64) -> Result<Value, ClientError> {
        let key = QueryKey::new([entity.to_string(), id.to_string()]);
        let path = format!("/{}/{}", entity, id);
        let http = &self.http;
        let (base, actor) = (&self.base_url, self.actor.as_deref());
        self.cache
            .fetch(&key, || send(http, base, actor, Method::Get, &path, None))
    }

    pub fn create(&mut self, entity: &str, body: &Value) -> Result<Value, ClientError> {
        self.mutation(entity, Method::Post, format!("/{}", entity), Some(body))
    }

    pub fn update(&mut self, entity: &str, id: i64, body: &Value) -> Result<Value, ClientError> {
        self.mutation(entity, Method::Put, format!("/{}/{}", entity, id), Some(body))
    }

    pub fn delete(&mut self, entity: &str, id: i64) -> Result<Value, ClientError> {
        self.mutation(entity, Method::Delete, format!("/{}/{}", entity, id), None)
    }

    pub fn soft_delete(&mut self, entity: &str, id: i64) -> Result<Value, ClientError> {
        self.mutation(entity, Method::Delete, format!("/{}/{}/soft", entity, id), None)
    }

    fn mutation(
        &mut self,
        entity: &str,
        method: Method,
        path: String,
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        let prefixes = mutation_keys(entity);
        let http = &self.http;
        let (base, actor) = (&self.base_url, self.actor.as_deref());
        self.cache
            .mutate(&prefixes, || send(http, base, actor, method, &path, body))
    }
}

/// Keys a write to `entity` makes stale: its own queries and every dashboard.
pub fn mutation_keys(entity: &str) -> Vec<QueryKey> {
    vec![QueryKey::new([entity]), QueryKey::new(["dashboard"])]
}

fn send(
    http: &Client,
    base: &str,
    actor: Option<&str>,
    method: Method,
    path: &str,
    body: Option<&Value>,
) -> Result<Value, ClientError> {
    let url = format!("{}/{}", base, path.trim_start_matches('/'));
    debug!(%method, %url, "api request");
    let mut req = match method {
        Method::Get => http.get(&url),
        Method::Post => http.post(&url),
        Method::Put => http.put(&url),
        Method::Patch => http.patch(&url),
        Method::Delete => http.delete(&url),
    };
    if let Some(actor) = actor {
        req = req.header(ACTOR_HEADER, actor);
    }
    if let Some(b) = body {
        req = req.json(b);
    }
    let resp = req.send()?;
    let status = resp.status().as_u16();
    let text = resp.text()?;
    decode_response(status, &text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_becomes_api_error() {
        let err = decode_response(422, r#"{"error":"validation failed: email is required","status":422}"#)
            .unwrap_err();
        match err {
            ClientError::Api { status, error } => {
                assert_eq!(status, 422);
                assert!(error.contains("email"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn success_bodies_pass_through_unchanged() {
        let v = decode_response(200, r#"[{"id":1}]"#).unwrap();
        assert_eq!(v, serde_json::json!([{"id": 1}]));
        assert_eq!(decode_response(200, "").unwrap(), Value::Null);
        assert!(matches!(decode_response(200, "<html>"), Err(ClientError::Decode(_))));
    }

    #[test]
    fn html_error_pages_keep_their_status() {
        match decode_response(502, "<html>bad gateway</html>") {
            Err(ClientError::Api { status, error }) => {
                assert_eq!(status, 502);
                assert_eq!(error, "HTTP 502");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            decode_response(404, ""),
            Err(ClientError::Api { status: 404, .. })
        ));
    }

    #[test]
    fn writes_invalidate_entity_and_dashboard_keys() {
        let keys = mutation_keys("expenses");
        assert!(QueryKey::new(["expenses", "4"]).starts_with(&keys[0]));
        assert!(QueryKey::new(["dashboard", "expenses"]).starts_with(&keys[1]));
        assert!(!QueryKey::new(["tanks"]).starts_with(&keys[0]));
    }
}
