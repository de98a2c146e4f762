//! HTTP server for sysfont - a front desk for installed fonts (made by FontLab https://www.fontlab.com/)
//!
//! The server scans once at startup and answers every lookup from that index
//! snapshot. `POST /rescan` builds a fresh snapshot in the background and
//! swaps it in; requests already running keep the snapshot they started with.

use std::sync::{Arc, PoisonError, RwLock};

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::info;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::task;

use sysfont_core::index::FontIndex;
use sysfont_core::query::{SearchQuery, SearchResult};

use crate::ScanConfig;

/// What `POST /rescan` reports back.
#[derive(Debug, Serialize, Deserialize)]
pub struct RescanResponse {
    pub families: usize,
}

#[derive(Clone)]
struct AppState {
    index: Arc<RwLock<Arc<FontIndex>>>,
    scan: Option<ScanConfig>,
}

impl AppState {
    fn snapshot(&self) -> Arc<FontIndex> {
        let guard = self.index.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    fn replace(&self, index: FontIndex) {
        let mut guard = self.index.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(index);
    }
}

/// Scan fonts, then serve lookups on `bind` until the process stops.
pub async fn serve(bind: &str, scan: ScanConfig) -> Result<()> {
    let index = build_index(scan.clone()).await?;
    info!("indexed {} font families", index.len());

    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding HTTP server to {bind}"))?;
    info!("listening on {bind}");

    axum::serve(listener, router(index, Some(scan)))
        .await
        .context("serving HTTP")?;
    Ok(())
}

/// Routes over an existing index; without a `scan`, `/rescan` is refused.
pub fn router(index: FontIndex, scan: Option<ScanConfig>) -> Router {
    let state = AppState {
        index: Arc::new(RwLock::new(Arc::new(index))),
        scan,
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/families", get(families_handler))
        .route("/find", post(find_handler))
        .route("/rescan", post(rescan_handler))
        .with_state(state)
}

// Discovery and parsing block on the filesystem, so they stay off the async workers.
async fn build_index(scan: ScanConfig) -> Result<FontIndex> {
    task::spawn_blocking(move || scan.open()?.build_index())
        .await
        .context("index build task failed")?
}

async fn families_handler(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.snapshot().family_names())
}

async fn find_handler(
    State(state): State<AppState>,
    Json(queries): Json<Vec<SearchQuery>>,
) -> Json<SearchResult> {
    Json(state.snapshot().search(&queries))
}

async fn rescan_handler(
    State(state): State<AppState>,
) -> Result<Json<RescanResponse>, (StatusCode, String)> {
    let Some(scan) = state.scan.clone() else {
        return Err((
            StatusCode::BAD_REQUEST,
            "this server was started without a font scan to repeat".to_string(),
        ));
    };

    let index = build_index(scan)
        .await
        .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}")))?;
    let families = index.len();
    state.replace(index);
    info!("rescan finished with {families} font families");

    Ok(Json(RescanResponse { families }))
}
