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

//! The index registry: tagsets of tagged index generations, discovered on
//! disk and hot-swapped by a periodic reloader.
//!
//! Every `(tagset, tag)` cell owns its handler behind a reader/writer lock.
//! Queries hold the read side across the whole scan and result build; the
//! reloader builds a replacement handler entirely outside the lock and only
//! takes the write side for the swap, so the old generation unmaps when the
//! last in-flight reader lets go.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use xref_index::{JsonRequest, SearchStats};

/// How often the reloader rescans the configured index directories.
pub const RELOAD_INTERVAL: Duration = Duration::from_secs(10);

/// Template data handed to page renderers.
pub struct PageContext {
    pub project: String,
    pub tag: String,
}

/// A loaded index generation able to answer searches, and optionally to
/// render per-symbol pages.
pub trait ApiHandler: Send + Sync {
    fn search(&self, query: &JsonRequest) -> (serde_json::Value, SearchStats);

    /// Whether this handler serves detail pages at all.
    fn has_pages(&self) -> bool {
        false
    }

    /// Render the page for `hash`; `None` when the hash is unknown.
    fn page(&self, _hash: u64, _ctx: &PageContext) -> Option<String> {
        None
    }
}

pub type Loader = Box<dyn Fn(&Path) -> anyhow::Result<Box<dyn ApiHandler>> + Send + Sync>;

/// One `(tagset, tag)` cell.
#[derive(Default)]
pub struct Tag {
    pub handler: RwLock<Option<Box<dyn ApiHandler>>>,
    /// Manifest mtime the current handler was loaded from.
    changed: Mutex<Option<SystemTime>>,
    /// Routes are wildcards registered up front, so this flag only gates
    /// the one-time announce log when a tag first gets a handler.
    registered: AtomicBool,
}

/// How a tagset finds its manifests on disk.
pub enum Discovery {
    /// Files named `index.<tag><suffix>` directly inside each path.
    SingleDir { suffix: String },
    /// One subdirectory per tag, each holding a manifest with this name.
    Spread { manifest: String },
}

pub struct TagSet {
    pub name: String,
    paths: Vec<PathBuf>,
    discovery: Discovery,
    loader: Loader,
    tags: RwLock<HashMap<String, Arc<Tag>>>,
}

impl TagSet {
    pub fn new(name: &str, paths: Vec<PathBuf>, discovery: Discovery, loader: Loader) -> TagSet {
        TagSet {
            name: name.to_string(),
            paths,
            discovery,
            loader,
            tags: RwLock::new(HashMap::new()),
        }
    }

    pub fn find(&self, tag: &str) -> Option<Arc<Tag>> {
        self.tags.read().get(tag).cloned()
    }

    pub fn tag_names(&self) -> Vec<String> {
        self.tags.read().keys().cloned().collect()
    }

    /// One discovery pass: load new or changed manifests and swap them in.
    /// A failing load leaves the existing handler untouched.
    pub fn update(&self) {
        for (tag_name, manifest) in self.discover() {
            let mtime = match std::fs::metadata(&manifest).and_then(|m| m.modified()) {
                Ok(t) => t,
                Err(_) => continue,
            };

            let existing = self.find(&tag_name);
            let stale = match &existing {
                None => true,
                Some(tag) => tag.changed.lock().map_or(true, |loaded| mtime > loaded),
            };
            if !stale {
                continue;
            }

            // The load (open, mmap, scan-start build) happens outside any
            // lock; readers keep answering on the old generation meanwhile.
            let handler = match (self.loader)(&manifest) {
                Ok(h) => h,
                Err(e) => {
                    tracing::warn!("skipping {}: {}", manifest.display(), e);
                    continue;
                }
            };

            let has_pages = handler.has_pages();
            let tag = match existing {
                Some(tag) => tag,
                None => self
                    .tags
                    .write()
                    .entry(tag_name.clone())
                    .or_default()
                    .clone(),
            };
            {
                let mut guard = tag.handler.write();
                // The old handler drops here, under the write lock, after
                // every in-flight reader has released its guard.
                *guard = Some(handler);
            }
            *tag.changed.lock() = Some(mtime);

            if !tag.registered.swap(true, Ordering::SeqCst) {
                tracing::info!(
                    "waiting for queries on {}",
                    search_url(&tag_name, &self.name)
                );
                if has_pages {
                    tracing::info!(
                        "waiting for queries on {}",
                        page_url(&tag_name, &self.name)
                    );
                }
            }
            tracing::info!("loaded {} for tag {}/{}", manifest.display(), self.name, tag_name);
        }
    }

    fn discover(&self) -> Vec<(String, PathBuf)> {
        let mut found = Vec::new();
        for start in &self.paths {
            let entries = match std::fs::read_dir(start) {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("skipping {}: {}", start.display(), e);
                    continue;
                }
            };
            for entry in entries.flatten() {
                match &self.discovery {
                    Discovery::SingleDir { suffix } => {
                        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                            continue;
                        }
                        let name = entry.file_name();
                        let Some(name) = name.to_str() else { continue };
                        let Some(rest) = name.strip_prefix("index.") else {
                            continue;
                        };
                        let Some(tag) = rest.strip_suffix(suffix.as_str()) else {
                            continue;
                        };
                        if tag.is_empty() {
                            continue;
                        }
                        found.push((tag.to_string(), entry.path()));
                    }
                    Discovery::Spread { manifest } => {
                        if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                            continue;
                        }
                        let candidate = entry.path().join(manifest);
                        if !candidate.is_file() {
                            continue;
                        }
                        let Some(tag) = entry.file_name().to_str().map(str::to_string) else {
                            continue;
                        };
                        found.push((tag, candidate));
                    }
                }
            }
        }
        found
    }
}

pub struct Registry {
    pub project: String,
    tagsets: Vec<TagSet>,
}

impl Registry {
    pub fn new(project: &str, tagsets: Vec<TagSet>) -> Registry {
        Registry {
            project: project.to_string(),
            tagsets,
        }
    }

    pub fn tagset(&self, name: &str) -> Option<&TagSet> {
        self.tagsets.iter().find(|ts| ts.name == name)
    }

    pub fn find(&self, tagset: &str, tag: &str) -> Option<Arc<Tag>> {
        self.tagset(tagset)?.find(tag)
    }

    /// One reload cycle over every tagset.
    pub fn update(&self) {
        for tagset in &self.tagsets {
            tagset.update();
        }
    }
}

pub fn search_url(tag: &str, tagset: &str) -> String {
    format!("/api/{}/{}", tag, tagset)
}

pub fn page_url(tag: &str, tagset: &str) -> String {
    format!("/{}/sources/{}/", tag, tagset)
}

/// Background reload loop; the first pass runs immediately.
pub async fn run_reloader(registry: Arc<Registry>) {
    let mut interval = tokio::time::interval(RELOAD_INTERVAL);
    loop {
        interval.tick().await;
        let registry = Arc::clone(&registry);
        if let Err(e) = tokio::task::spawn_blocking(move || registry.update()).await {
            tracing::error!("reload cycle failed: {}", e);
        }
    }
}
