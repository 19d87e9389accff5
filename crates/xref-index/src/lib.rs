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

//! Compact binary symbol index for source cross-reference browsers.
//!
//! An index is six memory-mapped, append-only pools of packed records
//! describing every symbol in a codebase snapshot. This crate maps the
//! pools, decodes records with bounds checks, and answers case-insensitive
//! regex queries by scanning the sorted names pool with a length-indexed
//! start shortcut. Loaded indexes are immutable; the serving layer swaps
//! whole generations under a reader/writer lock.

pub mod case;
pub mod decode;
pub mod error;
pub mod layout;
pub mod pool;
pub mod search;
pub mod symbols;
pub mod types;

pub use crate::case::case_contains;
pub use crate::error::{Error, Result};
pub use crate::pool::PoolSet;
pub use crate::search::{literal_prefix, MAX_RESULTS};
pub use crate::symbols::{html_path_from_hash, provider_href, SymbolIndex};
pub use crate::types::{
    JsonRequest, SearchStats, SymbolData, SymbolKindLinkage, SymbolObject, SymbolProvider,
};

#[doc(hidden)]
pub mod test_helpers;
