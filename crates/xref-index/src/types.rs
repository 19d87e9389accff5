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

//! Wire types shared between the search engine and the HTTP layer.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A search request body: `{"q": <regex>, "s": <skip>, "p": <ping>}`.
/// Missing fields default to their zero values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JsonRequest {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub s: u64,
    #[serde(default)]
    pub p: bool,
}

/// One definition or declaration site, fully linked for the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymbolProvider {
    pub href: String,
    pub location: String,
    pub snippet: String,
}

/// A (linkage, access, kind name) grouping of a symbol's providers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymbolKindLinkage {
    pub linkage: u8,
    pub access: u8,
    pub kind: String,
    pub defs: Vec<SymbolProvider>,
    pub decls: Vec<SymbolProvider>,
}

/// A fully materialised search or page result for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymbolObject {
    pub name: String,
    pub hash: String,
    pub kinds: Vec<SymbolKindLinkage>,
}

/// The response body of a symbol search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolData {
    pub data: Vec<SymbolObject>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// Per-query counters, reported in the access log rather than the response.
#[derive(Debug, Clone, Default)]
pub struct SearchStats {
    /// Records visited.
    pub scanned: u64,
    /// Records passing both filter stages.
    pub matched: u64,
    /// Results materialised into the response.
    pub returned: u64,
    /// Human-readable summary of the scan-start optimization.
    pub optimized: String,
    /// Time spent building result objects.
    pub build_time: Duration,
}
