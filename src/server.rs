// Copyright 2023 The beal authors.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Coordinator HTTP surface.
//!
//! Three JSON endpoints over the shared [`Coordinator`]:
//! `POST /get_work` (null once the search is finished),
//! `POST /finish_work` (idempotent), and `GET /stats`.
//! The server shuts down gracefully after the last shard completes so the
//! coordinator process can exit 0 on exhaustion.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::sync::Notify;
use tower_http::trace::TraceLayer;

use crate::proto::{FinishRequest, Stats, WorkSpec};
use crate::queue::{Completion, Coordinator};
use crate::Result;

#[derive(Clone)]
struct AppState {
    coord: Arc<Coordinator>,
    done: Arc<Notify>,
}

pub fn router(coord: Arc<Coordinator>, done: Arc<Notify>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/get_work", post(get_work))
        .route("/finish_work", post(finish_work))
        .route("/stats", get(stats))
        .with_state(AppState { coord, done })
        .layer(TraceLayer::new_for_http())
}

/// Serves until every shard is complete, then returns so the caller can
/// exit 0.
pub async fn run(coord: Arc<Coordinator>, addr: &str) -> Result<()> {
    let done = Arc::new(Notify::new());
    let app = router(coord, done.clone());
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("coordinator listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { done.notified().await })
        .await?;
    Ok(())
}

async fn health() -> &'static str {
    "beal coordinator"
}

async fn get_work(State(st): State<AppState>) -> Json<Option<WorkSpec>> {
    Json(st.coord.get_work())
}

async fn finish_work(State(st): State<AppState>, Json(req): Json<FinishRequest>) -> StatusCode {
    match st.coord.finish_work(req.shard.a, &req.points()) {
        Ok(Completion::Recorded { finished }) => {
            if finished {
                tracing::info!("a-axis exhausted, shutting down");
                st.done.notify_one();
            }
            StatusCode::OK
        }
        Ok(Completion::Ignored) => StatusCode::OK,
        Err(e) => {
            // A result log that cannot be written would silently drop
            // candidates; abort instead. The shard was not marked complete,
            // so a restarted coordinator re-dispenses it.
            tracing::error!("result log failure: {e}");
            std::process::exit(2);
        }
    }
}

async fn stats(State(st): State<AppState>) -> Json<Stats> {
    Json(st.coord.stats())
}
