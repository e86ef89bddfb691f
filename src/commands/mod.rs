// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod entity;
pub mod api;
pub mod remote;
pub mod dashboard;
pub mod prefs;
pub mod todos;
pub mod importer;
pub mod exporter;
pub mod doctor;

use anyhow::{Context, Result};
use clap::ArgMatches;

pub(crate) fn required<'a>(m: &'a ArgMatches, name: &str) -> Result<&'a str> {
    m.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("Missing argument '{}'", name))
}

pub(crate) fn actor(m: &ArgMatches) -> Option<&str> {
    m.get_one::<String>("actor").map(String::as_str)
}
