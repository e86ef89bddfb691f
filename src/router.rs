// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Minimal `METHOD + /literal/:param` router.
//!
//! Routes are tried in registration order and the first full match wins, so
//! literal routes must be registered before parameterised ones that would
//! also match them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            other => Err(RouteError::UnsupportedMethod(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("no route for {method} {path}")]
    NotFound { method: Method, path: String },

    #[error("method {method} not allowed for {path}; allowed: {}", join_methods(.allowed))]
    MethodNotAllowed {
        method: Method,
        path: String,
        allowed: Vec<Method>,
    },

    #[error("unsupported method '{0}'")]
    UnsupportedMethod(String),
}

fn join_methods(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl RouteError {
    pub fn status(&self) -> u16 {
        match self {
            RouteError::NotFound { .. } => 404,
            RouteError::MethodNotAllowed { .. } | RouteError::UnsupportedMethod(_) => 405,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

struct Route<H> {
    method: Method,
    pattern: String,
    segments: Vec<Segment>,
    handler: H,
}

impl<H> Route<H> {
    fn capture(&self, path: &[&str]) -> Option<Params> {
        if path.len() != self.segments.len() {
            return None;
        }
        let mut params = BTreeMap::new();
        for (seg, part) in self.segments.iter().zip(path) {
            match seg {
                Segment::Literal(lit) if lit == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(Params(params))
    }
}

pub struct Match<'r, H> {
    pub handler: &'r H,
    pub params: Params,
    pub pattern: &'r str,
}

pub struct Router<H> {
    routes: Vec<Route<H>>,
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

/// Path segments with the query string stripped and empty segments dropped.
pub fn split_path(path: &str) -> Vec<&str> {
    let path = path.split_once('?').map_or(path, |(p, _)| p);
    path.split('/').filter(|s| !s.is_empty()).collect()
}

impl<H> Router<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, method: Method, pattern: &str, handler: H) -> Self {
        let segments = split_path(pattern)
            .into_iter()
            .map(|s| match s.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(s.to_string()),
            })
            .collect();
        self.routes.push(Route {
            method,
            pattern: pattern.to_string(),
            segments,
            handler,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn resolve(&self, method: Method, path: &str) -> Result<Match<'_, H>, RouteError> {
        let parts = split_path(path);
        let mut allowed = Vec::new();
        for route in &self.routes {
            let Some(params) = route.capture(&parts) else {
                continue;
            };
            if route.method == method {
                return Ok(Match {
                    handler: &route.handler,
                    params,
                    pattern: &route.pattern,
                });
            }
            if !allowed.contains(&route.method) {
                allowed.push(route.method);
            }
        }
        let path = format!("/{}", parts.join("/"));
        if allowed.is_empty() {
            Err(RouteError::NotFound { method, path })
        } else {
            allowed.sort();
            Err(RouteError::MethodNotAllowed {
                method,
                path,
                allowed,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> Router<&'static str> {
        Router::new()
            .route(Method::Get, "/health", "health")
            .route(Method::Get, "/:entity/stats", "stats")
            .route(Method::Get, "/:entity", "list")
            .route(Method::Post, "/:entity", "create")
            .route(Method::Get, "/:entity/:id", "get")
            .route(Method::Delete, "/:entity/:id", "delete")
    }

    #[test]
    fn literal_route_registered_first_wins() {
        let r = router();
        let m = r.resolve(Method::Get, "/tanks/stats").unwrap();
        assert_eq!(*m.handler, "stats");
        assert_eq!(m.params.get("entity"), Some("tanks"));
        assert_eq!(m.params.get("id"), None);
    }

    #[test]
    fn params_are_captured_and_slashes_normalized() {
        let r = router();
        let m = r.resolve(Method::Get, "//tanks/7/?verbose=1").unwrap();
        assert_eq!(*m.handler, "get");
        assert_eq!(m.pattern, "/:entity/:id");
        assert_eq!(m.params.get("id"), Some("7"));
        assert_eq!(m.params.len(), 2);
    }

    #[test]
    fn wrong_method_is_distinguished_from_unknown_path() {
        let r = router();
        match r.resolve(Method::Put, "/tanks").err().unwrap() {
            RouteError::MethodNotAllowed { allowed, .. } => {
                assert_eq!(allowed, vec![Method::Get, Method::Post]);
            }
            other => panic!("unexpected {other:?}"),
        }
        let err = r.resolve(Method::Get, "/a/b/c/d").err().unwrap();
        assert_eq!(err.status(), 404);
        assert_eq!(err.to_string(), "no route for GET /a/b/c/d");
    }

    #[test]
    fn method_parsing_is_case_insensitive() {
        assert_eq!("patch".parse::<Method>().unwrap(), Method::Patch);
        assert!("TRACE".parse::<Method>().is_err());
    }
}
