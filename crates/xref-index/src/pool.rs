//! Read-only memory maps of the six pool files backing one index.

use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::layout;

/// The six mapped pools of one index generation.
///
/// A `PoolSet` is immutable for its lifetime; dropping it unmaps every pool.
/// Index replacement builds a fresh `PoolSet` and swaps it in behind the
/// registry's lock, so in-flight readers keep the old maps alive until they
/// release their guards.
#[derive(Debug)]
pub struct PoolSet {
    pub details: Mmap,
    pub symbols: Mmap,
    pub snippets: Mmap,
    pub strings: Mmap,
    pub files: Mmap,
    pub hashes: Mmap,
}

impl PoolSet {
    /// Map the six siblings of `manifest` (its path with `.json` stripped
    /// plus the fixed pool suffix). Pools already mapped when a later open
    /// fails are unmapped on the error return. Empty pools are fine; the
    /// decoders reject any access into them.
    pub fn load(manifest: &Path) -> Result<PoolSet> {
        let details = map_pool(&sibling(manifest, layout::DETAILS_SUFFIX))?;
        let symbols = map_pool(&sibling(manifest, layout::SYMBOLS_SUFFIX))?;
        let snippets = map_pool(&sibling(manifest, layout::SNIPPETS_SUFFIX))?;
        let strings = map_pool(&sibling(manifest, layout::STRINGS_SUFFIX))?;
        let files = map_pool(&sibling(manifest, layout::FILES_SUFFIX))?;
        let hashes = map_pool(&sibling(manifest, layout::HASHES_SUFFIX))?;
        Ok(PoolSet {
            details,
            symbols,
            snippets,
            strings,
            files,
            hashes,
        })
    }
}

/// `<dir>/index.v1.symbols.json` + `.details` -> `<dir>/index.v1.symbols.details`.
pub fn sibling(manifest: &Path, suffix: &str) -> PathBuf {
    let mut base = manifest.to_path_buf();
    if let Some(name) = manifest.file_name().and_then(|n| n.to_str()) {
        if let Some(stem) = name.strip_suffix(".json") {
            base.set_file_name(format!("{}{}", stem, suffix));
            return base;
        }
    }
    base.set_file_name(format!(
        "{}{}",
        manifest.file_name().and_then(|n| n.to_str()).unwrap_or(""),
        suffix
    ));
    base
}

fn map_pool(path: &Path) -> Result<Mmap> {
    let file = File::open(path).map_err(|source| Error::MissingFile {
        path: path.to_path_buf(),
        source,
    })?;
    let mmap = unsafe { Mmap::map(&file) }.map_err(|source| Error::MapFailed {
        path: path.to_path_buf(),
        source,
    })?;

    // Pinning is best-effort: a failure degrades latency, not correctness.
    #[cfg(unix)]
    match mmap.lock() {
        Ok(()) => log::debug!("mlock of {} ({} bytes) succeeded", path.display(), mmap.len()),
        Err(e) => log::warn!(
            "mlock of {} ({} bytes) failed: {}",
            path.display(),
            mmap.len(),
            e
        ),
    }

    Ok(mmap)
}
