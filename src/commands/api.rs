// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{actor, required};
use crate::api::{Api, ApiRequest, ApiResponse};
use crate::router::Method;
use crate::utils::parse_json_arg;
use anyhow::{Result, bail};
use clap::ArgMatches;
use rusqlite::Connection;

/// Run one request through the same dispatcher the server uses.
pub fn run(conn: &Connection, m: &ArgMatches) -> Result<ApiResponse> {
    let method: Method = required(m, "method")?.parse()?;
    let mut req = ApiRequest::new(method, required(m, "path")?).with_actor(actor(m));
    if let Some(body) = m.get_one::<String>("body") {
        req = req.with_body(parse_json_arg(body)?);
    }
    Ok(Api::new().handle(conn, &req))
}

pub fn handle(conn: &Connection, m: &ArgMatches) -> Result<()> {
    let resp = run(conn, m)?;
    println!("{}", serde_json::to_string_pretty(&resp.body)?);
    if !resp.is_success() {
        bail!("Request failed with status {}", resp.status);
    }
    Ok(())
}
