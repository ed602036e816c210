// Copyright 2023 The beal authors.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Coordinator-side shard accounting and the append-only result log.
//!
//! The a-axis is the unit of distribution. Fresh shards go out in
//! increasing order; once the axis is exhausted the queue re-dispenses the
//! oldest incomplete shard, so a shard held by a dead worker eventually
//! reaches a live one. Handing the same shard to two workers is harmless:
//! completions are idempotent and the enumeration is deterministic, so the
//! second report is dropped as a duplicate.
//!
//! One mutex covers the duplicate check, the log append, the flush and the
//! completion mark. A shard is marked complete only after its candidates
//! are durably in the log; if the log cannot be written the shard stays
//! incomplete and the error propagates (the coordinator aborts rather than
//! silently dropping candidates).

use std::collections::{HashSet, VecDeque};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use crate::points::Point;
use crate::proto::{Shard, Stats, WorkSpec};
use crate::{Result, SearchConfig};

/// Shard bookkeeping: a cursor over the fresh axis, the dispensed-but-
/// incomplete shards in dispense order, and the completed set.
pub struct ShardQueue {
    start: u32,
    max_base: u32,
    next: u32,
    dispensed: VecDeque<u32>,
    completed: HashSet<u32>,
}

impl ShardQueue {
    pub fn new(start: u32, max_base: u32) -> ShardQueue {
        debug_assert!(1 <= start && start <= max_base);
        ShardQueue {
            start,
            max_base,
            next: start,
            dispensed: VecDeque::new(),
            completed: HashSet::new(),
        }
    }

    /// Next shard to hand out: a fresh a-value while any remain, then the
    /// oldest incomplete one. None once every shard is complete.
    pub fn dispense(&mut self) -> Option<u32> {
        if self.next <= self.max_base {
            let a = self.next;
            self.next += 1;
            self.dispensed.push_back(a);
            return Some(a);
        }
        while let Some(a) = self.dispensed.pop_front() {
            if self.completed.contains(&a) {
                continue;
            }
            self.dispensed.push_back(a);
            return Some(a);
        }
        None
    }

    pub fn is_completed(&self, a: u32) -> bool {
        self.completed.contains(&a)
    }

    pub fn in_range(&self, a: u32) -> bool {
        self.start <= a && a <= self.max_base
    }

    /// Marks a shard complete. Returns false if it already was.
    pub fn complete(&mut self, a: u32) -> bool {
        debug_assert!(self.start <= a && a <= self.max_base);
        self.completed.insert(a)
    }

    pub fn total(&self) -> u32 {
        self.max_base - self.start + 1
    }

    pub fn is_finished(&self) -> bool {
        self.completed.len() as u32 == self.total()
    }

    pub fn stats(&self) -> Stats {
        let completed = self.completed.len() as u32;
        Stats {
            completed,
            remaining: self.total() - completed,
            total: self.total(),
        }
    }
}

/// Outcome of a completion report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    /// Candidates recorded; `finished` is set when this was the last shard.
    Recorded { finished: bool },
    /// Duplicate or unknown shard; nothing was written.
    Ignored,
}

struct CoordState {
    queue: ShardQueue,
    log: BufWriter<File>,
}

/// The shared state of a search run: configuration, shard queue and result
/// log behind a single lock.
pub struct Coordinator {
    config: SearchConfig,
    state: Mutex<CoordState>,
}

impl Coordinator {
    /// Opens (or creates) the result log in append mode, so a restarted
    /// coordinator keeps accumulating into the same file.
    pub fn new(config: SearchConfig, start: u32, out: &Path) -> Result<Coordinator> {
        config.validate()?;
        if start < 1 || start > config.max_base {
            return Err(crate::Error::Config(format!(
                "start shard {start} outside 1..={}",
                config.max_base
            )));
        }
        let log = OpenOptions::new().create(true).append(true).open(out)?;
        Ok(Coordinator {
            state: Mutex::new(CoordState {
                queue: ShardQueue::new(start, config.max_base),
                log: BufWriter::new(log),
            }),
            config,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn get_work(&self) -> Option<WorkSpec> {
        let mut st = self.state.lock().unwrap();
        let a = st.queue.dispense()?;
        tracing::debug!(a, "dispensing shard");
        Some(WorkSpec {
            max_base: self.config.max_base,
            max_pow: self.config.max_pow,
            primes: self.config.primes.clone(),
            shard: Shard { a },
        })
    }

    /// Records a shard completion: duplicate check, candidate append,
    /// flush, completion mark, all in one critical section.
    pub fn finish_work(&self, a: u32, candidates: &[Point]) -> Result<Completion> {
        let mut st = self.state.lock().unwrap();
        if !st.queue.in_range(a) {
            tracing::warn!(a, "completion for unknown shard ignored");
            return Ok(Completion::Ignored);
        }
        if st.queue.is_completed(a) {
            tracing::debug!(a, "duplicate completion ignored");
            return Ok(Completion::Ignored);
        }
        for p in candidates {
            writeln!(st.log, "{} {} {} {}", p.a, p.x, p.b, p.y)?;
        }
        st.log.flush()?;
        st.queue.complete(a);
        let stats = st.queue.stats();
        tracing::info!(
            a,
            candidates = candidates.len(),
            completed = stats.completed,
            remaining = stats.remaining,
            "shard complete"
        );
        Ok(Completion::Recorded {
            finished: st.queue.is_finished(),
        })
    }

    pub fn stats(&self) -> Stats {
        self.state.lock().unwrap().queue.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn temp_log(tag: &str) -> std::path::PathBuf {
        static SEQ: AtomicU32 = AtomicU32::new(0);
        std::env::temp_dir().join(format!(
            "beal-test-{}-{}-{}.log",
            tag,
            std::process::id(),
            SEQ.fetch_add(1, Ordering::Relaxed)
        ))
    }

    #[test]
    fn test_dispense_order_and_redispense() {
        let mut q = ShardQueue::new(1, 3);
        assert_eq!(q.dispense(), Some(1));
        assert_eq!(q.dispense(), Some(2));
        assert_eq!(q.dispense(), Some(3));
        // Axis exhausted: the oldest incomplete shard comes around again.
        assert!(q.complete(2));
        assert_eq!(q.dispense(), Some(1));
        assert_eq!(q.dispense(), Some(3));
        assert_eq!(q.dispense(), Some(1));
        assert!(q.complete(1));
        assert!(q.complete(3));
        assert!(!q.complete(3));
        assert_eq!(q.dispense(), None);
        assert!(q.is_finished());
    }

    #[test]
    fn test_start_offset() {
        let mut q = ShardQueue::new(280, 283);
        assert_eq!(q.total(), 4);
        assert_eq!(q.dispense(), Some(280));
        assert_eq!(q.dispense(), Some(281));
        assert_eq!(q.stats().remaining, 4);
    }

    fn config() -> SearchConfig {
        SearchConfig {
            max_base: 5,
            max_pow: 5,
            primes: vec![4294967291],
        }
    }

    #[test]
    fn test_duplicate_finish_is_noop() {
        let path = temp_log("dup");
        let coord = Coordinator::new(config(), 1, &path).unwrap();
        let pts = vec![
            Point {
                a: 3,
                x: 3,
                b: 1,
                y: 4,
            },
            Point {
                a: 3,
                x: 4,
                b: 2,
                y: 3,
            },
        ];
        assert_eq!(
            coord.finish_work(3, &pts).unwrap(),
            Completion::Recorded { finished: false }
        );
        // Second delivery of the same shard writes nothing.
        let other = vec![Point {
            a: 3,
            x: 5,
            b: 1,
            y: 5,
        }];
        assert_eq!(coord.finish_work(3, &other).unwrap(), Completion::Ignored);

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "3 3 1 4\n3 4 2 3\n");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_unknown_shard_ignored() {
        let path = temp_log("unknown");
        let coord = Coordinator::new(config(), 1, &path).unwrap();
        assert_eq!(coord.finish_work(99, &[]).unwrap(), Completion::Ignored);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_finished_signal() {
        let path = temp_log("finish");
        let coord = Coordinator::new(config(), 1, &path).unwrap();
        for a in 1..=4 {
            assert_eq!(
                coord.finish_work(a, &[]).unwrap(),
                Completion::Recorded { finished: false }
            );
        }
        assert_eq!(
            coord.finish_work(5, &[]).unwrap(),
            Completion::Recorded { finished: true }
        );
        assert!(coord.get_work().is_none());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_concurrent_finish_interleaves_whole_lines() {
        let path = temp_log("concurrent");
        let coord = Arc::new(Coordinator::new(config(), 1, &path).unwrap());
        let mk = |a: u32, n: u32| -> Vec<Point> {
            (0..n)
                .map(|i| Point {
                    a,
                    x: 3 + i % 3,
                    b: 1,
                    y: 3 + i % 3,
                })
                .collect()
        };
        let c1 = coord.clone();
        let t1 = std::thread::spawn(move || c1.finish_work(1, &mk(1, 50)).unwrap());
        let c2 = coord.clone();
        let t2 = std::thread::spawn(move || c2.finish_work(2, &mk(2, 50)).unwrap());
        t1.join().unwrap();
        t2.join().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut got: Vec<String> = text.lines().map(str::to_owned).collect();
        got.sort();
        let mut want: Vec<String> = mk(1, 50)
            .iter()
            .chain(mk(2, 50).iter())
            .map(|p| format!("{} {} {} {}", p.a, p.x, p.b, p.y))
            .collect();
        want.sort();
        assert_eq!(got, want);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_get_work_carries_config() {
        let path = temp_log("spec");
        let coord = Coordinator::new(config(), 1, &path).unwrap();
        let ws = coord.get_work().unwrap();
        assert_eq!(ws.shard.a, 1);
        assert_eq!(ws.config(), config());
        std::fs::remove_file(&path).ok();
    }
}
