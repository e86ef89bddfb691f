// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! HTTP front end. axum only handles transport; every request falls through
//! to [`Api`], which owns routing.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{
        HeaderMap, Method as HttpMethod, StatusCode, Uri,
        header::{CONTENT_TYPE, HeaderName},
    },
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use tokio::{net::TcpListener, signal::ctrl_c};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::api::{Api, ApiRequest, ApiResponse, parse_query};
use crate::config::Config;
use crate::error::ApiError;
use crate::router::Method;

pub const ACTOR_HEADER: &str = "x-actor";

pub struct AppState {
    api: Api,
    conn: Mutex<Connection>,
}

impl AppState {
    pub fn new(conn: Connection) -> Arc<Self> {
        Arc::new(Self {
            api: Api::new(),
            conn: Mutex::new(conn),
        })
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.body)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        ApiResponse::from_error(&self).into_response()
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            HttpMethod::GET,
            HttpMethod::POST,
            HttpMethod::PUT,
            HttpMethod::PATCH,
            HttpMethod::DELETE,
            HttpMethod::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(ACTOR_HEADER)])
        .max_age(Duration::from_secs(60 * 60));

    Router::new().fallback(dispatch).layer(cors).with_state(state)
}

pub async fn serve(config: &Config, conn: Connection) -> Result<()> {
    let state = AppState::new(conn);
    let app = app(state);

    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server shut down");
    Ok(())
}

async fn dispatch(
    State(state): State<Arc<AppState>>,
    method: HttpMethod,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let started = Instant::now();
    let path = uri.path().to_string();

    let method: Method = match method.as_str().parse() {
        Ok(m) => m,
        Err(e) => return ApiError::from(e).into_response(),
    };
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        match serde_json::from_slice(&body) {
            Ok(v) => Some(v),
            Err(e) => return ApiError::from(e).into_response(),
        }
    };
    let actor = headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let query = uri.query().map(parse_query).unwrap_or_default();
    let mut request = ApiRequest::new(method, &path).with_query(query);
    request.body = body;
    request.actor = actor;

    let worker = state.clone();
    let response = tokio::task::spawn_blocking(move || {
        let conn = worker.conn.lock().unwrap_or_else(PoisonError::into_inner);
        worker.api.handle(&conn, &request)
    })
    .await;

    let response = match response {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "request worker panicked");
            ApiResponse::from_error(&ApiError::Internal("request worker failed".into()))
        }
    };
    info!(
        %method,
        %path,
        status = response.status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response.into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
