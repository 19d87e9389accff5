//! The symbol tagset: wraps a loaded [`SymbolIndex`] as an [`ApiHandler`]
//! that also renders per-symbol detail pages.

use anyhow::{bail, Result};
use std::path::Path;

use xref_index::{JsonRequest, SearchStats, SymbolIndex};

use crate::page;
use crate::registry::{ApiHandler, PageContext};

pub struct SymbolHandler {
    index: SymbolIndex,
}

/// Loader for symbol manifests; wired into the `symbol` tagset.
pub fn load_symbols(manifest: &Path) -> Result<Box<dyn ApiHandler>> {
    if manifest.extension().and_then(|e| e.to_str()) != Some("json") {
        bail!("symbol manifest {} must end in .json", manifest.display());
    }
    let index = SymbolIndex::load(manifest)?;
    Ok(Box::new(SymbolHandler { index }))
}

impl ApiHandler for SymbolHandler {
    fn search(&self, query: &JsonRequest) -> (serde_json::Value, SearchStats) {
        let (result, stats) = self.index.search(query);
        let value = serde_json::to_value(&result).unwrap_or_else(|e| {
            tracing::error!("could not serialise search result: {}", e);
            serde_json::json!({ "data": [], "error": "internal error" })
        });
        (value, stats)
    }

    fn has_pages(&self) -> bool {
        true
    }

    fn page(&self, hash: u64, ctx: &PageContext) -> Option<String> {
        match self.index.symbol_by_hash(hash) {
            Ok(symbol) => Some(page::render(ctx, &symbol)),
            Err(e) => {
                tracing::debug!("no page for hash {:x}: {}", hash, e);
                None
            }
        }
    }
}
