//! Test-only producer for the six pool files.
//!
//! Lives in `src/` so integration tests under `tests/` (compiled as
//! separate crates) and the serving crate's tests can build fixture
//! indexes without widening the public API. The emitted bytes follow the
//! producer layout exactly, padding included, and maintain the two sort
//! invariants the engine relies on: names ordered by lowercased bytes,
//! hash entries ordered by hash.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::layout;

#[derive(Clone)]
pub struct ProviderSpec {
    pub file_path: String,
    pub file_hash: u64,
    pub sid: u64,
    pub eid: u64,
    pub snippet: String,
}

impl ProviderSpec {
    pub fn new(file_path: &str, file_hash: u64, sid: u64, eid: u64, snippet: &str) -> Self {
        ProviderSpec {
            file_path: file_path.to_string(),
            file_hash,
            sid,
            eid,
            snippet: snippet.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct KindSpec {
    pub kind: String,
    pub linkage: u8,
    pub access: u8,
    pub defs: Vec<ProviderSpec>,
    pub decls: Vec<ProviderSpec>,
}

impl KindSpec {
    pub fn new(kind: &str, linkage: u8, access: u8) -> Self {
        KindSpec {
            kind: kind.to_string(),
            linkage,
            access,
            defs: Vec::new(),
            decls: Vec::new(),
        }
    }

    pub fn def(mut self, p: ProviderSpec) -> Self {
        self.defs.push(p);
        self
    }

    pub fn decl(mut self, p: ProviderSpec) -> Self {
        self.decls.push(p);
        self
    }
}

#[derive(Clone)]
pub struct SymbolSpec {
    pub name: String,
    pub hash: u64,
    pub kinds: Vec<KindSpec>,
}

impl SymbolSpec {
    pub fn new(name: &str, hash: u64) -> Self {
        SymbolSpec {
            name: name.to_string(),
            hash,
            kinds: Vec::new(),
        }
    }

    pub fn kind(mut self, k: KindSpec) -> Self {
        self.kinds.push(k);
        self
    }
}

#[derive(Default)]
pub struct IndexBuilder {
    symbols: Vec<SymbolSpec>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        IndexBuilder::default()
    }

    /// Add a symbol with no kinds; enough for scan and pagination tests.
    pub fn symbol(mut self, name: &str, hash: u64) -> Self {
        self.symbols.push(SymbolSpec::new(name, hash));
        self
    }

    pub fn symbol_spec(mut self, spec: SymbolSpec) -> Self {
        self.symbols.push(spec);
        self
    }

    /// Write `<stem>.json` plus the six pools under `dir` and return the
    /// manifest path.
    pub fn write(&self, dir: &Path, stem: &str) -> PathBuf {
        let pools = self.build();
        let write = |suffix: &str, bytes: &[u8]| {
            fs::write(dir.join(format!("{}{}", stem, suffix)), bytes).expect("write pool file");
        };
        write(layout::DETAILS_SUFFIX, &pools.details);
        write(layout::SYMBOLS_SUFFIX, &pools.symbols);
        write(layout::SNIPPETS_SUFFIX, &pools.snippets);
        write(layout::STRINGS_SUFFIX, &pools.strings);
        write(layout::FILES_SUFFIX, &pools.files);
        write(layout::HASHES_SUFFIX, &pools.hashes);

        let manifest = dir.join(format!("{}.json", stem));
        fs::write(&manifest, b"{}\n").expect("write manifest");
        manifest
    }

    fn build(&self) -> Pools {
        let mut ordered: Vec<&SymbolSpec> = self.symbols.iter().collect();
        ordered.sort_by(|a, b| {
            a.name
                .as_bytes()
                .to_ascii_lowercase()
                .cmp(&b.name.as_bytes().to_ascii_lowercase())
        });

        let mut pools = Pools::default();
        let mut files = Interner::default();
        let mut strings = Interner::default();
        let mut snippets = Interner::default();

        // First the details pool, remembering where each symbol landed.
        let mut detail_offsets = Vec::with_capacity(ordered.len());
        for spec in &ordered {
            let detail_offset = pools.details.len() as u32;
            detail_offsets.push(detail_offset);

            push_u32(&mut pools.details, 0); // name_offset, patched below
            pad(&mut pools.details, 4);
            push_u64(&mut pools.details, spec.hash);
            push_u16(&mut pools.details, spec.kinds.len() as u16);
            pad(&mut pools.details, 6);

            for kind in &spec.kinds {
                let kind_name = strings.intern(&mut pools.strings, kind.kind.as_bytes());
                push_u32(&mut pools.details, kind_name);
                pools.details.push(kind.linkage);
                pools.details.push(kind.access);
                push_u16(&mut pools.details, kind.defs.len() as u16);
                push_u16(&mut pools.details, kind.decls.len() as u16);
                pad(&mut pools.details, 6);

                for provider in kind.defs.iter().chain(kind.decls.iter()) {
                    let path_offset =
                        files.intern_file(&mut pools.files, &provider.file_path, provider.file_hash);
                    let snippet = snippets.intern(&mut pools.snippets, provider.snippet.as_bytes());
                    push_u64(&mut pools.details, provider.sid);
                    push_u64(&mut pools.details, provider.eid);
                    push_u64(&mut pools.details, provider.file_hash);
                    push_u32(&mut pools.details, path_offset);
                    pad(&mut pools.details, 4);
                    push_u32(&mut pools.details, snippet);
                    pad(&mut pools.details, 4);
                }
            }
        }

        // Then the names pool, in sorted order, patching each detail's
        // back-pointer once the name offset is known.
        for (spec, &detail_offset) in ordered.iter().zip(&detail_offsets) {
            let name_offset = pools.symbols.len() as u32;
            push_u32(&mut pools.symbols, detail_offset);
            push_u16(&mut pools.symbols, spec.name.len() as u16);
            pad(&mut pools.symbols, 2);
            pools.symbols.extend_from_slice(spec.name.as_bytes());

            let patch = detail_offset as usize + layout::DETAIL_NAME_OFFSET;
            pools.details[patch..patch + 4].copy_from_slice(&name_offset.to_ne_bytes());
        }

        // Hash table, ascending.
        let mut entries: Vec<(u64, u32)> = ordered
            .iter()
            .zip(&detail_offsets)
            .map(|(spec, &off)| (spec.hash, off))
            .collect();
        entries.sort_by_key(|&(hash, _)| hash);
        for (hash, detail_offset) in entries {
            push_u64(&mut pools.hashes, hash);
            push_u32(&mut pools.hashes, detail_offset);
            pad(&mut pools.hashes, 4);
        }

        pools
    }
}

#[derive(Default)]
struct Pools {
    details: Vec<u8>,
    symbols: Vec<u8>,
    snippets: Vec<u8>,
    strings: Vec<u8>,
    files: Vec<u8>,
    hashes: Vec<u8>,
}

#[derive(Default)]
struct Interner {
    offsets: HashMap<String, u32>,
}

impl Interner {
    /// Length-prefixed string pool entry, reused per distinct value.
    fn intern(&mut self, pool: &mut Vec<u8>, bytes: &[u8]) -> u32 {
        let key = String::from_utf8_lossy(bytes).into_owned();
        if let Some(&off) = self.offsets.get(&key) {
            return off;
        }
        let off = pool.len() as u32;
        push_u32(pool, bytes.len() as u32);
        pool.extend_from_slice(bytes);
        self.offsets.insert(key, off);
        off
    }

    /// File record, reused per distinct path.
    fn intern_file(&mut self, pool: &mut Vec<u8>, path: &str, hash: u64) -> u32 {
        if let Some(&off) = self.offsets.get(path) {
            return off;
        }
        let off = pool.len() as u32;
        push_u64(pool, hash);
        push_u16(pool, path.len() as u16);
        pad(pool, 6);
        pool.extend_from_slice(path.as_bytes());
        self.offsets.insert(path.to_string(), off);
        off
    }
}

fn push_u16(pool: &mut Vec<u8>, v: u16) {
    pool.extend_from_slice(&v.to_ne_bytes());
}
fn push_u32(pool: &mut Vec<u8>, v: u32) {
    pool.extend_from_slice(&v.to_ne_bytes());
}
fn push_u64(pool: &mut Vec<u8>, v: u64) {
    pool.extend_from_slice(&v.to_ne_bytes());
}
fn pad(pool: &mut Vec<u8>, n: usize) {
    pool.extend(std::iter::repeat(0u8).take(n));
}
