// Copyright 2025 The Xref Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The HTTP surface: search API, symbol pages, static source tree.
//!
//! Routes are wildcards over `{tag}` and `{tagset}`; the registry resolves
//! them per request, so tags appearing or being swapped by the reloader
//! need no router changes. Handlers take the cell's read lock for the whole
//! scan and result build, inside `block_in_place` so a long scan occupies a
//! blocking slot instead of an async worker.

use axum::extract::{Path, State};
use axum::handler::HandlerWithoutStateExt;
use axum::http::{header, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;

use xref_index::JsonRequest;

use crate::registry::{PageContext, Registry};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
}

static QUERY_ID: AtomicU64 = AtomicU64::new(0);

/// Build the full application router. `web_root` adds the static source
/// tree at `/`; `index_files` are served for directory URLs that have no
/// `index.html`, first existing candidate wins.
pub fn router(
    registry: Arc<Registry>,
    web_root: Option<PathBuf>,
    index_files: Vec<String>,
) -> Router {
    let state = AppState { registry };
    let mut app = Router::new()
        .route("/api/:tag/:tagset", post(api_search))
        .route("/:tag/sources/:tagset/:page", get(source_page))
        .with_state(state);

    if let Some(root) = web_root {
        let candidates = index_files.clone();
        let fallback_root = root.clone();
        let dir_index = move |uri: Uri| dir_index_page(fallback_root.clone(), candidates.clone(), uri);
        let static_files = ServeDir::new(&root)
            .append_index_html_on_directories(true)
            .not_found_service(dir_index.into_service());
        app = app.fallback_service(static_files);
    }

    app.layer(CompressionLayer::new())
}

/// `POST /api/<tag>/<tagset>` with body `{"q": …, "s": …, "p": …}`.
async fn api_search(
    State(state): State<AppState>,
    Path((tag, tagset)): Path<(String, String)>,
    body: String,
) -> Response {
    let query: JsonRequest = match serde_json::from_str(&body) {
        Ok(q) => q,
        Err(e) => {
            tracing::warn!("invalid request body: {}", e);
            return (StatusCode::BAD_REQUEST, "INVALID REQUEST BODY").into_response();
        }
    };

    let id = QUERY_ID.fetch_add(1, Ordering::Relaxed) + 1;
    tracing::info!("< {:08x} query {:?} on /api/{}/{}", id, query, tag, tagset);

    // Pings answer before any registry or lock traffic.
    if query.p {
        tracing::info!("> {:08x} ping processed", id);
        return ().into_response();
    }

    let Some(cell) = state.registry.find(&tagset, &tag) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let search_start = Instant::now();
    let outcome = tokio::task::block_in_place(|| {
        let guard = cell.handler.read();
        guard.as_ref().map(|handler| handler.search(&query))
    });
    let search_time = search_start.elapsed();

    match outcome {
        None => StatusCode::NOT_FOUND.into_response(),
        Some((value, stats)) => {
            tracing::info!(
                "> {:08x} query {:?} opt {{{}}} returned {} matched {} scanned {} build {:?} search {:?}",
                id,
                query,
                stats.optimized,
                stats.returned,
                stats.matched,
                stats.scanned,
                stats.build_time,
                search_time
            );
            Json(value).into_response()
        }
    }
}

/// `GET /<tag>/sources/<tagset>/<hex-hash>`.
async fn source_page(
    State(state): State<AppState>,
    Path((tag, tagset, page)): Path<(String, String, String)>,
) -> Response {
    let Some(cell) = state.registry.find(&tagset, &tag) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let Ok(hash) = u64::from_str_radix(&page, 16) else {
        return Html("INVALID PAGE REQUEST - COULD NOT PARSE HASH").into_response();
    };

    let ctx = PageContext {
        project: state.registry.project.clone(),
        tag: tag.clone(),
    };
    let rendered = tokio::task::block_in_place(|| {
        let guard = cell.handler.read();
        match guard.as_ref() {
            Some(handler) if handler.has_pages() => Some(handler.page(hash, &ctx)),
            _ => None,
        }
    });

    match rendered {
        None => StatusCode::NOT_FOUND.into_response(),
        Some(None) => format!("UNKNOWN SYMBOL {}", page).into_response(),
        Some(Some(html)) => Html(html).into_response(),
    }
}

/// Fallback behind the static file service: a directory URL with none of
/// the usual `index.html` gets the first present directory-index candidate
/// (NEWS, README, …) served as plain text.
async fn dir_index_page(root: PathBuf, candidates: Vec<String>, uri: Uri) -> Response {
    let rel = uri.path().trim_start_matches('/');
    if rel.split('/').any(|part| part == "..") {
        return StatusCode::NOT_FOUND.into_response();
    }

    let dir = root.join(rel);
    if dir.is_dir() {
        for candidate in &candidates {
            if let Ok(body) = tokio::fs::read_to_string(dir.join(candidate)).await {
                return (
                    [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                    body,
                )
                    .into_response();
            }
        }
    }
    StatusCode::NOT_FOUND.into_response()
}
