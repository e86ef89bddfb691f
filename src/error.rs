// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::router::RouteError;
use crate::validation::ValidationErrors;
use rusqlite::ErrorCode;
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unknown entity '{0}'")]
    UnknownEntity(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: i64 },

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("constraint violated: {0}")]
    Conflict(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(rusqlite::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for ApiError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::SqliteFailure(ref err, ref msg)
                if err.code == ErrorCode::ConstraintViolation =>
            {
                ApiError::Conflict(msg.clone().unwrap_or_else(|| err.to_string()))
            }
            other => ApiError::Database(other),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            ApiError::UnknownEntity(_) | ApiError::NotFound { .. } => 404,
            ApiError::BadRequest(_) | ApiError::Json(_) => 400,
            ApiError::Validation(_) => 422,
            ApiError::Route(e) => e.status(),
            ApiError::Conflict(_) => 409,
            ApiError::Database(_) | ApiError::Internal(_) => 500,
        }
    }

    /// The `{error, status}` body sent to HTTP clients.
    pub fn envelope(&self) -> Value {
        let mut body = json!({
            "error": self.to_string(),
            "status": self.status(),
        });
        if let ApiError::Validation(errs) = self {
            body["details"] = json!(errs.errors());
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_envelope_lists_field_errors() {
        let mut errs = ValidationErrors::default();
        errs.push("email", "is required");
        let body = ApiError::from(errs).envelope();
        assert_eq!(body["status"], 422);
        assert_eq!(body["details"][0]["field"], "email");
        assert!(body["error"].as_str().unwrap().starts_with("validation failed"));
    }

    #[test]
    fn constraint_failures_become_conflicts() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t(x TEXT NOT NULL);").unwrap();
        let err: ApiError = conn
            .execute("INSERT INTO t(x) VALUES (NULL)", [])
            .unwrap_err()
            .into();
        assert_eq!(err.status(), 409);
    }
}
