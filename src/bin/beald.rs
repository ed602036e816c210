// Copyright 2023 The beal authors.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Coordinator daemon for a Beal counterexample search.
//!
//! Owns the shard queue and the append-only candidate log, and serves the
//! two-method work protocol to any number of workers. Exits 0 once every
//! shard of the a-axis is complete.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use beal::queue::Coordinator;
use beal::{server, SearchConfig};

const DEFAULT_PRIMES: &str = "4294967291,4294967279";

fn usage() {
    eprintln!("Usage: beald --out FILE [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --help               show this help");
    eprintln!("  --out FILE           append-only candidate log (required)");
    eprintln!("  --maxb N             largest base searched (default 300)");
    eprintln!("  --maxp N             largest exponent searched (default 300)");
    eprintln!("  --primes p1,p2,...   filter primes (default {DEFAULT_PRIMES})");
    eprintln!("  --listen ADDR        bind address (default 127.0.0.1:8000)");
    eprintln!("  --start A            first shard of the a-axis (default 1)");
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let arg = arguments::parse(std::env::args()).unwrap();
    if arg.get::<bool>("help").is_some() {
        usage();
        return ExitCode::SUCCESS;
    }
    let Some(out) = arg.get::<String>("out") else {
        usage();
        return ExitCode::FAILURE;
    };
    let maxb = arg.get::<u32>("maxb").unwrap_or(300);
    let maxp = arg.get::<u32>("maxp").unwrap_or(300);
    let start = arg.get::<u32>("start").unwrap_or(1);
    let listen = arg
        .get::<String>("listen")
        .unwrap_or_else(|| "127.0.0.1:8000".into());
    let primes_arg = arg
        .get::<String>("primes")
        .unwrap_or_else(|| DEFAULT_PRIMES.into());
    let parsed: Result<Vec<u32>, _> = primes_arg.split(',').map(|s| s.trim().parse()).collect();
    let primes = match parsed {
        Ok(ps) => ps,
        Err(e) => {
            tracing::error!("cannot parse --primes: {e}");
            return ExitCode::FAILURE;
        }
    };

    let config = SearchConfig {
        max_base: maxb,
        max_pow: maxp,
        primes,
    };
    let coord = match Coordinator::new(config, start, Path::new(&out)) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(maxb, maxp, start, %out, "search starting");
    match server::run(coord, &listen).await {
        Ok(()) => {
            tracing::info!("search complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
