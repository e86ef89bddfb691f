// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{actor, required};
use crate::client::ApiClient;
use crate::config::Config;
use crate::router::Method;
use crate::utils::parse_json_arg;
use anyhow::{Context, Result};
use clap::ArgMatches;

pub fn handle(config: &Config, m: &ArgMatches) -> Result<()> {
    let method: Method = required(m, "method")?.parse()?;
    let path = required(m, "path")?;
    let url = m
        .get_one::<String>("url")
        .map(String::as_str)
        .unwrap_or(&config.server_url);
    let body = m
        .get_one::<String>("body")
        .map(|b| parse_json_arg(b))
        .transpose()?;

    let client = ApiClient::new(url)?.with_actor(actor(m));
    let value = client
        .request(method, path, body.as_ref())
        .with_context(|| format!("{} {}{}", method, url, path))?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
