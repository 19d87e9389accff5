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

//! The online symbol search: regex compile, literal-prefix scan start,
//! two-stage filtering, pagination.

use regex::bytes::RegexBuilder;
use regex_syntax::hir::{Hir, HirKind};
use std::time::Instant;

use crate::case::case_contains;
use crate::decode;
use crate::symbols::SymbolIndex;
use crate::types::{JsonRequest, SearchStats, SymbolData};

/// Result page size; pagination skips `s` matches then returns up to this many.
pub const MAX_RESULTS: u64 = 30;

/// Scanned-record interval between cooperative yields. Scans run on
/// blocking worker threads; the yield keeps a pile of long scans from
/// starving each other.
const YIELD_INTERVAL: u64 = 8192;

impl SymbolIndex {
    /// Answer one query against this index generation.
    ///
    /// The scan visits every name record from the length-indexed start
    /// offset, filters with [`case_contains`] first and the compiled regex
    /// second, and materialises matches past the pagination offset. A
    /// corrupt name record ends the scan with whatever was found; a corrupt
    /// detail record skips just that result.
    pub fn search(&self, query: &JsonRequest) -> (SymbolData, SearchStats) {
        let mut stats = SearchStats::default();
        let mut result = SymbolData::default();
        if query.p {
            return (result, stats);
        }

        let setup_start = Instant::now();
        let regex = match RegexBuilder::new(&query.q).case_insensitive(true).build() {
            Ok(r) => r,
            Err(e) => {
                result.error = e.to_string();
                return (result, stats);
            }
        };

        let (mut prefix, full) = literal_prefix(&query.q);
        prefix.make_ascii_lowercase();
        let start = self.min_offset_for(prefix.len());
        stats.optimized = format!(
            "prefix='{}', minoffset='{}', setup='{:?}', full={}",
            String::from_utf8_lossy(&prefix),
            start,
            setup_start.elapsed(),
            full
        );

        let symbols: &[u8] = &self.pools().symbols;
        let mut offset = start;
        while (offset as usize) < symbols.len() {
            stats.scanned += 1;
            if stats.scanned % YIELD_INTERVAL == 0 {
                std::thread::yield_now();
            }

            let record = match decode::symbol_name(symbols, offset) {
                Ok(r) => r,
                Err(e) => {
                    log::error!("invalid symbols pool, aborting scan: {}", e);
                    break;
                }
            };
            let name = record.name;
            let detail_offset = record.detail_offset;
            offset = record.next_offset;

            // Stage A: cheap case-folded substring check on the literal
            // prefix. Stage B: the real regex, unless the literal already
            // was the whole pattern.
            if !(case_contains(name, &prefix) && (full || regex.is_match(name))) {
                continue;
            }
            stats.matched += 1;

            if stats.matched > query.s {
                let build_start = Instant::now();
                match self.symbol_object(Some(name), detail_offset) {
                    Ok(object) => {
                        stats.returned += 1;
                        result.data.push(object);
                        stats.build_time += build_start.elapsed();
                    }
                    Err(e) => {
                        log::error!(
                            "invalid details entry for symbol {}: {}",
                            String::from_utf8_lossy(name),
                            e
                        );
                        continue;
                    }
                }
                if stats.matched >= MAX_RESULTS + query.s {
                    break;
                }
            }
        }

        (result, stats)
    }
}

/// Longest leading literal of `pattern`, and whether that literal is the
/// whole pattern (in which case the substring filter alone is conclusive).
///
/// When the pattern opens with a non-literal construct the extraction is
/// retried with the pattern anchored on both ends, which recovers a prefix
/// for queries that are a bare literal once anchored; a prefix recovered
/// that way is never conclusive.
pub fn literal_prefix(pattern: &str) -> (Vec<u8>, bool) {
    match prefix_of(pattern) {
        Some((prefix, full)) if !prefix.is_empty() => (prefix, full),
        _ => match prefix_of(&format!("^{}$", pattern)) {
            Some((prefix, _)) => (prefix, false),
            None => (Vec::new(), false),
        },
    }
}

fn prefix_of(pattern: &str) -> Option<(Vec<u8>, bool)> {
    let hir = regex_syntax::Parser::new().parse(pattern).ok()?;
    let mut prefix = Vec::new();
    let full = match collect(&hir, &mut prefix) {
        Walk::Continue { pure } => pure,
        Walk::Stop => false,
    };
    Some((prefix, full))
}

enum Walk {
    /// Literal collection may continue past this node; `pure` is false once
    /// anything other than literal bytes (an anchor, say) was seen.
    Continue { pure: bool },
    /// A construct that ends the literal run.
    Stop,
}

fn collect(hir: &Hir, prefix: &mut Vec<u8>) -> Walk {
    match hir.kind() {
        HirKind::Empty => Walk::Continue { pure: true },
        HirKind::Literal(lit) => {
            prefix.extend_from_slice(&lit.0);
            Walk::Continue { pure: true }
        }
        // Anchors and other look-arounds consume no bytes; skip them but
        // remember the pattern is more than a literal.
        HirKind::Look(_) => Walk::Continue { pure: false },
        HirKind::Capture(cap) => collect(&cap.sub, prefix),
        HirKind::Concat(parts) => {
            let mut pure = true;
            for part in parts {
                match collect(part, prefix) {
                    Walk::Continue { pure: p } => pure &= p,
                    Walk::Stop => return Walk::Stop,
                }
            }
            Walk::Continue { pure }
        }
        _ => Walk::Stop,
    }
}
