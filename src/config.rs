// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ArgMatches;

use crate::cli::{DEFAULT_CORS_ORIGIN, DEFAULT_LISTEN, opt_arg};
use crate::db;

/// Runtime settings gathered from the global CLI arguments and their
/// `NESTEGG_*` environment fallbacks.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub listen: SocketAddr,
    pub cors_origin: String,
    pub log_filter: Option<String>,
}

impl Config {
    pub fn from_matches(m: &ArgMatches) -> Result<Self> {
        let db_path = match opt_arg(m, "db") {
            Some(p) => PathBuf::from(p),
            None => db::default_db_path()?,
        };
        let listen_raw = opt_arg(m, "listen").unwrap_or(DEFAULT_LISTEN);
        let listen: SocketAddr = listen_raw
            .parse()
            .with_context(|| format!("Invalid listen address: {}", listen_raw))?;
        let cors_origin = opt_arg(m, "cors-origin")
            .unwrap_or(DEFAULT_CORS_ORIGIN)
            .trim_end_matches('/')
            .to_string();
        Ok(Config {
            db_path,
            listen,
            cors_origin,
            log_filter: opt_arg(m, "log").map(str::to_string),
        })
    }
}
