// Copyright 2023 The beal authors.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! The worker-side search engine.
//!
//! A `Searcher` owns one residue table per filter prime and runs shards
//! through them: a point survives iff, under every prime m, the residue
//! a^x + b^y mod m coincides with some c^z mod m. A true counterexample
//! satisfies the congruence for every modulus, so nothing real is lost;
//! a random non-solution survives k independent 32-bit filters with
//! probability around 2^-32k. Survivors still require exact verification.
//!
//! Construction is the expensive part (512 MiB and max_base * (max_pow - 2)
//! modular exponentiations per prime), so a `Searcher` is built once per
//! worker process and serves shards until the axis is exhausted. Searches
//! take `&self`; one set of tables can feed several shard loops.

use std::time::Instant;

use rayon::prelude::*;

use crate::cztable::CzTable;
use crate::points::{Point, PointCursor};
use crate::{Result, SearchConfig};

pub struct Searcher {
    config: SearchConfig,
    tables: Vec<CzTable>,
}

impl Searcher {
    /// Validates the configuration and builds the filter chain, one table
    /// per prime, in parallel.
    pub fn new(config: &SearchConfig) -> Result<Searcher> {
        config.validate()?;
        let t0 = Instant::now();
        let tables = config
            .primes
            .par_iter()
            .map(|&m| CzTable::build(config.max_base, config.max_pow, m))
            .collect::<Result<Vec<_>>>()?;
        for t in &tables {
            tracing::debug!(
                m = t.modulus(),
                distinct = t.distinct(),
                "residue table ready"
            );
        }
        tracing::info!(
            primes = config.primes.len(),
            elapsed = ?t0.elapsed(),
            "filter chain built"
        );
        Ok(Searcher {
            config: config.clone(),
            tables,
        })
    }

    /// The configuration the tables were built for. A worker compares this
    /// against incoming work-specs and refuses mismatches.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Runs one shard to exhaustion and returns the surviving candidates in
    /// enumeration order.
    pub fn search(&self, a: u32) -> Vec<Point> {
        debug_assert!(1 <= a && a <= self.config.max_base);
        let mut found = Vec::new();
        let cursor = PointCursor::new(self.config.max_base, self.config.max_pow, a);
        'points: for p in cursor {
            for t in &self.tables {
                if !t.contains(self.probe(t, &p)) {
                    continue 'points;
                }
            }
            found.push(p);
        }
        found
    }

    /// The (c, z) pairs matching a candidate's residue under each filter
    /// prime, in prime order. Linear scans; call once per candidate, not
    /// per probe.
    pub fn witnesses(&self, p: &Point) -> Vec<Vec<(u32, u32)>> {
        self.tables
            .iter()
            .map(|t| t.witnesses(self.probe(t, p)))
            .collect()
    }

    // a^x + b^y mod m from two table lookups. Both terms are below m, so a
    // single conditional subtraction reduces the sum.
    #[inline]
    fn probe(&self, t: &CzTable, p: &Point) -> u32 {
        let m = t.modulus() as u64;
        let mut r = t.value(p.a, p.x) as u64 + t.value(p.b, p.y) as u64;
        if r >= m {
            r -= m;
        }
        r as u32
    }
}
