// Copyright 2023 The beal authors.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Search worker.
//!
//! Binds to the first work-spec the coordinator hands out, builds one
//! residue table per filter prime (the expensive step: 512 MiB and a full
//! pass of modular exponentiations per prime), then folds shards until the
//! coordinator runs dry. The tables are immutable after construction, so
//! several shard loops can share them (`--threads`).
//!
//! Exit codes: 0 when the work runs out, 2 when the coordinator sends a
//! work-spec that does not match the bound configuration, 1 otherwise.

use std::process::ExitCode;
use std::time::{Duration, Instant};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use beal::client::CoordClient;
use beal::proto::{FinishRequest, WorkSpec};
use beal::search::Searcher;
use beal::Error;

// Consecutive empty polls before a worker concludes the search is over.
const MAX_IDLE_POLLS: u32 = 3;
// Transport failures tolerated while waiting for the first work-spec.
const STARTUP_RETRIES: u32 = 30;

fn usage() {
    eprintln!("Usage: bealw [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --help               show this help");
    eprintln!("  --coordinator URL    coordinator base URL (default http://127.0.0.1:8000)");
    eprintln!("  --threads N          concurrent shard loops over one table set (default 1)");
    eprintln!("  --poll SECS          pause between empty polls (default 10)");
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let arg = arguments::parse(std::env::args()).unwrap();
    if arg.get::<bool>("help").is_some() {
        usage();
        return ExitCode::SUCCESS;
    }
    let url = arg
        .get::<String>("coordinator")
        .unwrap_or_else(|| "http://127.0.0.1:8000".into());
    let threads = arg.get::<usize>("threads").unwrap_or(1).max(1);
    let poll = arg.get::<u64>("poll").unwrap_or(10);

    let client = match CoordClient::new(&url) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // Bind to the first work-spec that arrives.
    let first = match wait_for_work(&client, poll) {
        Ok(Some(ws)) => ws,
        Ok(None) => {
            tracing::info!("coordinator has no work, exiting");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let config = first.config();
    tracing::info!(
        maxb = config.max_base,
        maxp = config.max_pow,
        primes = ?config.primes,
        "binding to configuration"
    );
    let searcher = match Searcher::new(&config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("cannot build residue tables: {e}");
            return ExitCode::FAILURE;
        }
    };

    let searcher = &searcher;
    let mut results = Vec::with_capacity(threads);
    std::thread::scope(|s| {
        let mut handles = Vec::with_capacity(threads);
        for id in 0..threads {
            let client = client.clone();
            let pending = if id == 0 { Some(first.clone()) } else { None };
            handles.push(s.spawn(move || shard_loop(id, &client, searcher, poll, pending)));
        }
        for h in handles {
            results.push(h.join().unwrap());
        }
    });

    let mut code = ExitCode::SUCCESS;
    for r in results {
        match r {
            Ok(()) => {}
            Err(e @ Error::Config(_)) => {
                tracing::error!("{e}");
                return ExitCode::from(2);
            }
            Err(e) => {
                tracing::error!("{e}");
                code = ExitCode::FAILURE;
            }
        }
    }
    code
}

fn wait_for_work(client: &CoordClient, poll: u64) -> beal::Result<Option<WorkSpec>> {
    let mut idle = 0;
    let mut failures = 0;
    loop {
        match client.get_work() {
            Ok(Some(ws)) => return Ok(Some(ws)),
            Ok(None) => {
                idle += 1;
                if idle >= MAX_IDLE_POLLS {
                    return Ok(None);
                }
            }
            Err(e) => {
                failures += 1;
                if failures >= STARTUP_RETRIES {
                    return Err(e);
                }
                tracing::warn!("coordinator not reachable: {e}");
            }
        }
        std::thread::sleep(Duration::from_secs(poll));
    }
}

fn shard_loop(
    id: usize,
    client: &CoordClient,
    searcher: &Searcher,
    poll: u64,
    mut pending: Option<WorkSpec>,
) -> beal::Result<()> {
    let mut idle = 0u32;
    loop {
        let ws = match pending.take() {
            Some(ws) => Some(ws),
            None => match client.get_work() {
                Ok(ws) => ws,
                Err(e) => {
                    tracing::warn!(id, "get_work failed: {e}");
                    None
                }
            },
        };
        let Some(ws) = ws else {
            idle += 1;
            if idle >= MAX_IDLE_POLLS {
                tracing::info!(id, "no work left");
                return Ok(());
            }
            std::thread::sleep(Duration::from_secs(poll));
            continue;
        };
        idle = 0;
        if ws.config() != *searcher.config() {
            return Err(Error::Config(format!(
                "work spec for shard {} does not match the bound configuration",
                ws.shard.a
            )));
        }
        run_shard(id, client, searcher, &ws)?;
    }
}

fn run_shard(
    id: usize,
    client: &CoordClient,
    searcher: &Searcher,
    ws: &WorkSpec,
) -> beal::Result<()> {
    let a = ws.shard.a;
    let t0 = Instant::now();
    let candidates = searcher.search(a);
    for p in &candidates {
        // One witness scan per survivor, never per probe.
        let witnesses = searcher.witnesses(p);
        tracing::info!(
            a = p.a,
            x = p.x,
            b = p.b,
            y = p.y,
            witnesses = ?witnesses.iter().map(|w| w.len()).collect::<Vec<_>>(),
            "candidate"
        );
    }
    tracing::info!(
        id,
        a,
        candidates = candidates.len(),
        elapsed = ?t0.elapsed(),
        "shard searched"
    );
    client.finish_work(&FinishRequest::new(ws.shard, &candidates))
}
