// Copyright 2023 The beal authors.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Worker-side client for the coordinator protocol.
//!
//! Blocking on purpose: a worker thread has nothing useful to do while it
//! waits for its next shard. Completion reports are retried a few times so
//! a transient network failure does not lose a finished shard; the
//! coordinator drops any duplicate the retries produce.

use std::time::Duration;

use crate::proto::{FinishRequest, WorkSpec};
use crate::{Error, Result};

const FINISH_RETRIES: u32 = 5;
const RETRY_PAUSE: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct CoordClient {
    base: String,
    http: reqwest::blocking::Client,
}

impl CoordClient {
    pub fn new(base: &str) -> Result<CoordClient> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Rpc(e.to_string()))?;
        Ok(CoordClient {
            base: base.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Asks for the next shard. None means the search is finished.
    pub fn get_work(&self) -> Result<Option<WorkSpec>> {
        self.http
            .post(format!("{}/get_work", self.base))
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json::<Option<WorkSpec>>())
            .map_err(|e| Error::Rpc(e.to_string()))
    }

    /// Reports a completed shard, retrying transient failures.
    pub fn finish_work(&self, req: &FinishRequest) -> Result<()> {
        let mut last = String::new();
        for attempt in 1..=FINISH_RETRIES {
            match self
                .http
                .post(format!("{}/finish_work", self.base))
                .json(req)
                .send()
                .and_then(|r| r.error_for_status())
            {
                Ok(_) => return Ok(()),
                Err(e) => {
                    tracing::warn!(attempt, a = req.shard.a, "finish_work failed: {e}");
                    last = e.to_string();
                    std::thread::sleep(RETRY_PAUSE);
                }
            }
        }
        Err(Error::Rpc(last))
    }
}
