// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use fuelstation::cache::{QueryKey, QueryState};
use fuelstation::client::{ApiClient, ClientError};
use fuelstation::router::Method;
use fuelstation::{db, server};
use serde_json::json;
use std::sync::mpsc;
use std::thread;

/// Serve a fresh in-memory database on an ephemeral port; returns the base URL.
fn spawn_server() -> String {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            let state = server::AppState::new(db::open_in_memory().unwrap());
            axum::serve(listener, server::app(state)).await.unwrap();
        });
    });
    format!("http://{}", rx.recv().unwrap())
}

#[test]
fn client_reads_are_cached_until_a_write_invalidates_them() {
    let base = spawn_server();
    let mut client = ApiClient::new(&base).unwrap().with_actor(Some("remote"));

    client.create("providers", &json!({"name": "Alpha"})).unwrap();
    let first = client.list("providers").unwrap();
    assert_eq!(first.as_array().unwrap().len(), 1);

    // A write that bypasses the client leaves the cached list in place.
    client
        .request(Method::Post, "/providers", Some(&json!({"name": "Beta"})))
        .unwrap();
    assert_eq!(client.list("providers").unwrap(), first);

    client.create("providers", &json!({"name": "Gamma"})).unwrap();
    let key = QueryKey::new(["providers"]);
    assert!(client.cache().is_stale(&key));
    let refreshed = client.list("providers").unwrap();
    assert_eq!(refreshed.as_array().unwrap().len(), 3);
    assert!(matches!(client.cache().state(&key), QueryState::Success(_)));
}

#[test]
fn server_errors_surface_as_api_errors() {
    let base = spawn_server();
    let mut client = ApiClient::new(&base).unwrap();

    match client.create("tanks", &json!({"name": "T1"})) {
        Err(ClientError::Api { status, error }) => {
            assert_eq!(status, 422);
            assert!(error.contains("fuel_type"));
        }
        other => panic!("unexpected {other:?}"),
    }
    match client.get("tanks", 41) {
        Err(ClientError::Api { status, .. }) => assert_eq!(status, 404),
        other => panic!("unexpected {other:?}"),
    }
    let key = QueryKey::new(["tanks", "41"]);
    assert!(matches!(client.cache().state(&key), QueryState::Error(_)));

    match client.request(Method::Delete, "/health", None) {
        Err(ClientError::Api { status, .. }) => assert_eq!(status, 405),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn actor_header_reaches_the_audit_log() {
    let base = spawn_server();
    let mut client = ApiClient::new(&base).unwrap().with_actor(Some("pump-3"));
    let tank = client
        .create(
            "tanks",
            &json!({"name": "T1", "fuel_type": "lpg", "capacity_liters": 5000}),
        )
        .unwrap();
    let id = tank["id"].as_i64().unwrap();
    client.soft_delete("tanks", id).unwrap();

    let log = client
        .request(Method::Get, &format!("/audit_logs?entity=tanks&record_id={}", id), None)
        .unwrap();
    let actions: Vec<&str> = log
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["soft_delete", "create"]);
    assert_eq!(log[0]["actor"], "pump-3");
}

#[test]
fn query_strings_are_decoded_and_errors_keep_the_envelope() {
    let base = spawn_server();
    let client = ApiClient::new(&base).unwrap();
    client
        .request(Method::Post, "/providers", Some(&json!({"name": "Alpha & Co"})))
        .unwrap();
    let found = client
        .request(Method::Get, "/providers/search?q=alpha+%26+co", None)
        .unwrap();
    assert_eq!(found.as_array().unwrap().len(), 1);

    let resp = reqwest::blocking::get(format!("{}/providers?limit=abc&note=%zz", base)).unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: serde_json::Value = resp.json().unwrap();
    assert_eq!(body["status"], 400);
    assert!(body["error"].as_str().unwrap().contains("limit"));
}
