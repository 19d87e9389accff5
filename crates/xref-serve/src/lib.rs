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

//! Query-serving layer for compact binary symbol indexes: a registry of
//! tagged index generations with a hot-swapping reloader, the JSON tree
//! searcher, and the axum HTTP surface.

pub mod config;
pub mod http;
pub mod page;
pub mod registry;
pub mod symbol;
pub mod tree;

pub use crate::config::Opts;
pub use crate::http::router;
pub use crate::registry::{
    run_reloader, ApiHandler, Discovery, PageContext, Registry, Tag, TagSet, RELOAD_INTERVAL,
};
pub use crate::symbol::load_symbols;
pub use crate::tree::load_tree;

use std::path::PathBuf;

/// The standard registry of this server: a `tree` tagset over
/// `index.<tag>.files.json` manifests and a `symbol` tagset over
/// `index.<tag>.symbols.json` manifests, both discovered in the configured
/// index directories.
pub fn standard_registry(project: &str, index_dirs: Vec<PathBuf>) -> Registry {
    Registry::new(
        project,
        vec![
            TagSet::new(
                "tree",
                index_dirs.clone(),
                Discovery::SingleDir {
                    suffix: ".files.json".to_string(),
                },
                Box::new(|manifest| tree::load_tree(manifest)),
            ),
            TagSet::new(
                "symbol",
                index_dirs,
                Discovery::SingleDir {
                    suffix: ".symbols.json".to_string(),
                },
                Box::new(|manifest| symbol::load_symbols(manifest)),
            ),
        ],
    )
}
