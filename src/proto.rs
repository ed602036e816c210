// Copyright 2023 The beal authors.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Wire types of the coordinator protocol.
//!
//! Two methods: `get_work` hands out a shard wrapped with the full search
//! configuration, `finish_work` reports a shard's surviving candidates.
//! Delivery is at-least-once; the coordinator's duplicate check makes
//! `finish_work` idempotent, so clients are free to retry.

use serde::{Deserialize, Serialize};

use crate::points::Point;
use crate::SearchConfig;

/// One shard: a single value on the a-axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shard {
    pub a: u32,
}

/// A shard plus the configuration it belongs to, carried by value so a
/// worker can check compatibility with its already-built tables.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkSpec {
    pub max_base: u32,
    pub max_pow: u32,
    pub primes: Vec<u32>,
    pub shard: Shard,
}

impl WorkSpec {
    pub fn config(&self) -> SearchConfig {
        SearchConfig {
            max_base: self.max_base,
            max_pow: self.max_pow,
            primes: self.primes.clone(),
        }
    }
}

/// Completion report. Candidates cross the wire as [a, x, b, y] arrays.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishRequest {
    pub shard: Shard,
    pub candidates: Vec<[u32; 4]>,
}

impl FinishRequest {
    pub fn new(shard: Shard, candidates: &[Point]) -> FinishRequest {
        FinishRequest {
            shard,
            candidates: candidates.iter().map(|&p| p.into()).collect(),
        }
    }

    pub fn points(&self) -> Vec<Point> {
        self.candidates.iter().map(|&c| c.into()).collect()
    }
}

/// Progress counters served by `GET /stats`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub completed: u32,
    pub remaining: u32,
    pub total: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_work_spec_wire_shape() {
        let ws = WorkSpec {
            max_base: 300,
            max_pow: 300,
            primes: vec![4294967291, 4294967279],
            shard: Shard { a: 17 },
        };
        assert_eq!(
            serde_json::to_value(&ws).unwrap(),
            json!({
                "max_base": 300,
                "max_pow": 300,
                "primes": [4294967291u32, 4294967279u32],
                "shard": {"a": 17},
            })
        );
        let back: WorkSpec = serde_json::from_value(serde_json::to_value(&ws).unwrap()).unwrap();
        assert_eq!(back, ws);
        assert_eq!(back.config().primes, ws.primes);
    }

    #[test]
    fn test_finish_request_wire_shape() {
        let req = FinishRequest::new(
            Shard { a: 7 },
            &[Point {
                a: 7,
                x: 3,
                b: 5,
                y: 4,
            }],
        );
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"shard": {"a": 7}, "candidates": [[7, 3, 5, 4]]})
        );
        assert_eq!(
            req.points(),
            vec![Point {
                a: 7,
                x: 3,
                b: 5,
                y: 4
            }]
        );
    }

    #[test]
    fn test_absent_work_is_null() {
        let none: Option<WorkSpec> = None;
        assert_eq!(serde_json::to_value(none).unwrap(), json!(null));
        let parsed: Option<WorkSpec> = serde_json::from_str("null").unwrap();
        assert!(parsed.is_none());
    }
}
