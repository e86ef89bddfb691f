// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod api;
pub mod cache;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod crud;
pub mod dashboard;
pub mod db;
pub mod entities;
pub mod error;
pub mod models;
pub mod preferences;
pub mod router;
pub mod server;
pub mod todos;
pub mod utils;
pub mod validation;
