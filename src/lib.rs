// Copyright 2023 The beal authors.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Distributed brute-force search for counterexamples to Beal's conjecture.
//!
//! A counterexample is a tuple (a, x, b, y, c, z) of positive integers with
//! x, y, z >= 3 such that a^x + b^y = c^z and a, b, c share no prime factor.
//! Testing that equality with big integers over the whole search domain is
//! intractable, so the search is probabilistic: a point (a, x, b, y) is kept
//! only if a^x + b^y matches some c^z modulo every prime of a configured
//! filter chain. A true counterexample passes every modular filter, so the
//! filter is one-sided; survivors are rare and are verified offline with
//! exact arithmetic.
//!
//! The a-axis is the unit of distribution: a coordinator hands single
//! a-values to stateless workers over a small HTTP/JSON protocol and appends
//! surviving candidates to a result log.

pub mod arith;
pub mod client;
pub mod cztable;
pub mod points;
pub mod proto;
pub mod queue;
pub mod search;
pub mod server;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use points::Point;

/// Immutable parameters of one search run.
///
/// All workers attached to a coordinator share the same configuration; a
/// worker binds to the first configuration it receives and refuses any other
/// (rebuilding the residue tables costs minutes and gigabytes).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Upper bound (inclusive) for the bases a, b and c.
    pub max_base: u32,
    /// Upper bound (inclusive) for the exponents x, y and z.
    pub max_pow: u32,
    /// Filter primes, applied in order. Each one costs a 512 MiB residue
    /// table per worker; each one divides the false positive rate by ~2^32.
    pub primes: Vec<u32>,
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_base < 1 {
            return Err(Error::Config("max_base must be at least 1".into()));
        }
        if self.max_pow < 3 {
            return Err(Error::Config("max_pow must be at least 3".into()));
        }
        if self.primes.is_empty() {
            return Err(Error::Config("at least one filter prime is required".into()));
        }
        let mut seen = std::collections::HashSet::new();
        for &p in &self.primes {
            if !arith::is_prime(p) {
                return Err(Error::Config(format!("{p} is not prime")));
            }
            if !seen.insert(p) {
                return Err(Error::Config(format!("duplicate filter prime {p}")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("cannot allocate residue table ({0} bytes)")]
    OutOfMemory(usize),
    #[error("result log: {0}")]
    Io(#[from] std::io::Error),
    #[error("rpc: {0}")]
    Rpc(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validate() {
        let ok = SearchConfig {
            max_base: 300,
            max_pow: 300,
            primes: vec![4294967291, 4294967279],
        };
        assert!(ok.validate().is_ok());

        let mut bad = ok.clone();
        bad.max_pow = 2;
        assert!(bad.validate().is_err());

        let mut bad = ok.clone();
        bad.max_base = 0;
        assert!(bad.validate().is_err());

        let mut bad = ok.clone();
        bad.primes.clear();
        assert!(bad.validate().is_err());

        let mut bad = ok.clone();
        bad.primes = vec![4294967291, 4294967291];
        assert!(bad.validate().is_err());

        let mut bad = ok.clone();
        bad.primes = vec![4294967295]; // 3 * 5 * 17 * 257 * 65537
        assert!(bad.validate().is_err());
    }
}
