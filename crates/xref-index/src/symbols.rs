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

//! One loaded index generation: the six mapped pools plus the
//! length-indexed scan-start table built at load time.

use std::path::Path;

use crate::decode;
use crate::error::{Error, Result};
use crate::layout;
use crate::pool::PoolSet;
use crate::types::{SymbolKindLinkage, SymbolObject, SymbolProvider};

#[derive(Debug)]
pub struct SymbolIndex {
    pools: PoolSet,
    /// `min_offsets[k]` is the offset of the first record seen whose name
    /// has at least `k` bytes. Names are sorted by lowercased bytes, not by
    /// length, so this is a lower bound on where a match of a k-byte
    /// literal prefix can start, nothing stronger.
    min_offsets: Vec<u32>,
}

impl SymbolIndex {
    /// Map the pools next to `manifest` and build the scan-start table with
    /// a single pass over the names pool.
    pub fn load(manifest: &Path) -> Result<SymbolIndex> {
        let pools = PoolSet::load(manifest)?;

        let mut min_offsets: Vec<u32> = Vec::with_capacity(1024);
        let mut next_len = 0usize;
        for_each_symbol(&pools.symbols, 0, |record, offset| {
            while next_len <= record.name.len() {
                min_offsets.push(offset);
                next_len += 1;
            }
        })?;

        Ok(SymbolIndex { pools, min_offsets })
    }

    pub fn pools(&self) -> &PoolSet {
        &self.pools
    }

    /// Scan-start offset for a literal prefix of `prefix_len` bytes. The
    /// table index clamps to the longest name seen; an empty index scans
    /// from the top.
    pub fn min_offset_for(&self, prefix_len: usize) -> u32 {
        match self.min_offsets.last() {
            None => 0,
            Some(_) => self.min_offsets[prefix_len.min(self.min_offsets.len() - 1)],
        }
    }

    /// Walk name records from `start`, calling `process` for each. Stops at
    /// the end of the pool; a decode failure aborts the walk and is
    /// returned to the caller.
    pub fn for_each_symbol<F>(&self, start: u32, process: F) -> Result<()>
    where
        F: FnMut(&decode::SymbolName<'_>, u32),
    {
        for_each_symbol(&self.pools.symbols, start, process)
    }

    /// Binary-search the hash table; returns the detail offset.
    pub fn hash_lookup(&self, hash: u64) -> Result<u32> {
        let pool: &[u8] = &self.pools.hashes;
        let mut lo = 0usize;
        let mut hi = pool.len() / layout::HASH_ENTRY_SIZE;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let (entry_hash, detail_offset) = decode::hash_entry(pool, mid)?;
            if entry_hash == hash {
                return Ok(detail_offset);
            }
            if hash > entry_hash {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Err(Error::NotFound { hash })
    }

    /// Materialise the symbol stored behind `hash`.
    pub fn symbol_by_hash(&self, hash: u64) -> Result<SymbolObject> {
        let detail_offset = self.hash_lookup(hash)?;
        self.symbol_object(None, detail_offset)
    }

    /// Build a fully linked result object from a detail record. When the
    /// caller already holds the name bytes (the search scan does), passing
    /// them skips the round-trip through the names pool.
    pub fn symbol_object(&self, name: Option<&[u8]>, detail_offset: u32) -> Result<SymbolObject> {
        let detail = decode::details(&self.pools.details, detail_offset)?;

        let name = match name {
            Some(bytes) => bytes.to_vec(),
            None => decode::symbol_name(&self.pools.symbols, detail.name_offset)?
                .name
                .to_vec(),
        };

        let mut kinds = Vec::with_capacity(detail.kinds.len());
        for kind in &detail.kinds {
            let kind_name = decode::string(
                &self.pools.strings,
                decode::STRINGS_POOL,
                kind.kind_name_offset,
            )?;
            kinds.push(SymbolKindLinkage {
                linkage: kind.linkage,
                access: kind.access,
                kind: String::from_utf8_lossy(kind_name).into_owned(),
                defs: self.link_providers(kind.defs(&self.pools.details)?)?,
                decls: self.link_providers(kind.decls(&self.pools.details)?)?,
            });
        }

        Ok(SymbolObject {
            name: String::from_utf8_lossy(&name).into_owned(),
            hash: format!("{:x}", detail.hash),
            kinds,
        })
    }

    fn link_providers(&self, providers: Vec<decode::Provider>) -> Result<Vec<SymbolProvider>> {
        let mut out = Vec::with_capacity(providers.len());
        for p in providers {
            let snippet = decode::string(
                &self.pools.snippets,
                decode::SNIPPETS_POOL,
                p.snippet_offset,
            )?;
            out.push(SymbolProvider {
                href: provider_href(p.file_hash, p.sid, p.eid),
                location: decode::file_location(&self.pools.files, p.file_path_offset, p.eid)?,
                snippet: String::from_utf8_lossy(snippet).into_owned(),
            });
        }
        Ok(out)
    }
}

fn for_each_symbol<F>(symbols: &[u8], start: u32, mut process: F) -> Result<()>
where
    F: FnMut(&decode::SymbolName<'_>, u32),
{
    let mut offset = start;
    while (offset as usize) < symbols.len() {
        let record = decode::symbol_name(symbols, offset)?;
        process(&record, offset);
        offset = record.next_offset;
    }
    Ok(())
}

/// Path stem of the rendered source page for a file hash: the low byte
/// selects a shard directory, the next 56 bits name the page.
pub fn html_path_from_hash(hash: u64) -> String {
    format!(
        "../{:02x}/{:014x}.html",
        hash & 0xff,
        (hash >> 8) & 0x00ff_ffff_ffff_ffff
    )
}

/// Canonical anchor for a provider site. Ranges with a distinct, nonzero
/// start id carry both ids in the fragment.
pub fn provider_href(file_hash: u64, sid: u64, eid: u64) -> String {
    if eid != sid && sid != 0 {
        format!("{}#{:016x}{:016x}", html_path_from_hash(file_hash), sid, eid)
    } else {
        format!("{}#{:016x}", html_path_from_hash(file_hash), eid)
    }
}
