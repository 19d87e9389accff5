//! Bounds-checked readers over `(pool bytes, offset)` pairs.
//!
//! Every accessor validates the full extent of what it is about to read
//! before touching it and fails with [`Error::Corrupt`] otherwise. A record
//! ending exactly at the end of its pool is valid; one byte further is not.
//! Decoders return borrowed slices and never copy trailer bytes.

use crate::error::{Error, Result};
use crate::layout;

/// Pool names used in corruption reports.
pub const SYMBOLS_POOL: &str = "symbols";
pub const DETAILS_POOL: &str = "details";
pub const STRINGS_POOL: &str = "strings";
pub const SNIPPETS_POOL: &str = "snippets";
pub const FILES_POOL: &str = "files";
pub const HASHES_POOL: &str = "hashes";

/// One decoded symbol name record.
#[derive(Debug)]
pub struct SymbolName<'a> {
    pub detail_offset: u32,
    pub name: &'a [u8],
    /// Offset of the record that follows this one (header + name bytes).
    pub next_offset: u32,
}

/// Decoded symbol detail header with its kind records.
#[derive(Debug)]
pub struct Detail {
    pub name_offset: u32,
    pub hash: u64,
    pub kinds: Vec<Kind>,
}

/// One kind record under a symbol detail. The provider trailers stay in the
/// pool; [`Kind::defs`] and [`Kind::decls`] decode them on demand.
#[derive(Debug)]
pub struct Kind {
    pub kind_name_offset: u32,
    pub linkage: u8,
    pub access: u8,
    pub def_count: u16,
    pub decl_count: u16,
    /// Start of this kind's header within the details pool.
    offset: u32,
}

/// One definition or declaration site of a symbol.
pub struct Provider {
    pub sid: u64,
    pub eid: u64,
    pub file_hash: u64,
    pub file_path_offset: u32,
    pub snippet_offset: u32,
}

fn span<'a>(
    pool: &'a [u8],
    name: &'static str,
    offset: u64,
    len: usize,
    reason: &'static str,
) -> Result<&'a [u8]> {
    let start = offset as usize;
    let end = match start.checked_add(len) {
        Some(e) if e <= pool.len() => e,
        _ => {
            return Err(Error::Corrupt {
                pool: name,
                offset,
                len: pool.len(),
                reason,
            })
        }
    };
    Ok(&pool[start..end])
}

// Field readers over an already bounds-checked record slice.
fn u16_at(b: &[u8], off: usize) -> u16 {
    let mut buf = [0u8; 2];
    buf.copy_from_slice(&b[off..off + 2]);
    u16::from_ne_bytes(buf)
}
fn u32_at(b: &[u8], off: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&b[off..off + 4]);
    u32::from_ne_bytes(buf)
}
fn u64_at(b: &[u8], off: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&b[off..off + 8]);
    u64::from_ne_bytes(buf)
}

/// Decode the symbol name record at `offset` in the symbols pool.
pub fn symbol_name(pool: &[u8], offset: u32) -> Result<SymbolName<'_>> {
    let header = span(
        pool,
        SYMBOLS_POOL,
        offset as u64,
        layout::NAME_HEADER_SIZE,
        "symbol name header overflows pool",
    )?;
    let detail_offset = u32_at(header, layout::NAME_DETAIL_OFFSET);
    let name_size = u16_at(header, layout::NAME_SIZE) as usize;

    let name_start = offset as u64 + layout::NAME_HEADER_SIZE as u64;
    let name = span(
        pool,
        SYMBOLS_POOL,
        name_start,
        name_size,
        "symbol name bytes overflow pool",
    )?;
    Ok(SymbolName {
        detail_offset,
        name,
        next_offset: (name_start + name_size as u64) as u32,
    })
}

/// Decode the detail record at `offset` in the details pool, walking its
/// kind records. Each kind's extent (header plus def and decl providers) is
/// validated here; the providers themselves decode lazily.
pub fn details(pool: &[u8], offset: u32) -> Result<Detail> {
    let header = span(
        pool,
        DETAILS_POOL,
        offset as u64,
        layout::DETAIL_HEADER_SIZE,
        "detail header overflows pool",
    )?;
    let name_offset = u32_at(header, layout::DETAIL_NAME_OFFSET);
    let hash = u64_at(header, layout::DETAIL_HASH);
    let kind_count = u16_at(header, layout::DETAIL_KIND_COUNT) as usize;

    let mut kinds = Vec::with_capacity(kind_count);
    let mut kind_start = offset as u64 + layout::DETAIL_HEADER_SIZE as u64;
    for _ in 0..kind_count {
        let kh = span(
            pool,
            DETAILS_POOL,
            kind_start,
            layout::KIND_HEADER_SIZE,
            "kind header overflows pool",
        )?;
        let def_count = u16_at(kh, layout::KIND_DEF_COUNT);
        let decl_count = u16_at(kh, layout::KIND_DECL_COUNT);
        let trailer = (def_count as usize + decl_count as usize) * layout::PROVIDER_SIZE;
        span(
            pool,
            DETAILS_POOL,
            kind_start + layout::KIND_HEADER_SIZE as u64,
            trailer,
            "kind providers overflow pool",
        )?;

        kinds.push(Kind {
            kind_name_offset: u32_at(kh, layout::KIND_NAME_OFFSET),
            linkage: kh[layout::KIND_LINKAGE],
            access: kh[layout::KIND_ACCESS],
            def_count,
            decl_count,
            offset: kind_start as u32,
        });
        kind_start += layout::KIND_HEADER_SIZE as u64 + trailer as u64;
    }

    Ok(Detail {
        name_offset,
        hash,
        kinds,
    })
}

impl Kind {
    /// Definition providers, laid out immediately after the kind header.
    pub fn defs(&self, pool: &[u8]) -> Result<Vec<Provider>> {
        providers(
            pool,
            self.offset as u64 + layout::KIND_HEADER_SIZE as u64,
            self.def_count,
        )
    }

    /// Declaration providers, following the definition providers.
    pub fn decls(&self, pool: &[u8]) -> Result<Vec<Provider>> {
        let start = self.offset as u64
            + layout::KIND_HEADER_SIZE as u64
            + self.def_count as u64 * layout::PROVIDER_SIZE as u64;
        providers(pool, start, self.decl_count)
    }
}

fn providers(pool: &[u8], start: u64, count: u16) -> Result<Vec<Provider>> {
    let mut out = Vec::with_capacity(count as usize);
    let mut offset = start;
    for _ in 0..count {
        let rec = span(
            pool,
            DETAILS_POOL,
            offset,
            layout::PROVIDER_SIZE,
            "provider record overflows pool",
        )?;
        out.push(Provider {
            sid: u64_at(rec, layout::PROVIDER_SID),
            eid: u64_at(rec, layout::PROVIDER_EID),
            file_hash: u64_at(rec, layout::PROVIDER_FILE_HASH),
            file_path_offset: u32_at(rec, layout::PROVIDER_PATH_OFFSET),
            snippet_offset: u32_at(rec, layout::PROVIDER_SNIPPET_OFFSET),
        });
        offset += layout::PROVIDER_SIZE as u64;
    }
    Ok(out)
}

/// The `(hash, detail_offset)` entry at array index `index` in the hash
/// lookup table.
pub fn hash_entry(pool: &[u8], index: usize) -> Result<(u64, u32)> {
    let rec = span(
        pool,
        HASHES_POOL,
        (index * layout::HASH_ENTRY_SIZE) as u64,
        layout::HASH_ENTRY_SIZE,
        "hash entry overflows pool",
    )?;
    Ok((
        u64_at(rec, layout::HASH_HASH),
        u32_at(rec, layout::HASH_DETAIL_OFFSET),
    ))
}

/// Inner bytes of the length-prefixed record at `offset`.
pub fn string<'a>(pool: &'a [u8], name: &'static str, offset: u32) -> Result<&'a [u8]> {
    let prefix = span(
        pool,
        name,
        offset as u64,
        layout::STRING_PREFIX_SIZE,
        "string length prefix overflows pool",
    )?;
    let size = u32_at(prefix, 0) as usize;
    span(
        pool,
        name,
        offset as u64 + layout::STRING_PREFIX_SIZE as u64,
        size,
        "string bytes overflow pool",
    )
}

/// Path bytes of the file record at `offset` in the files pool.
pub fn file_path(pool: &[u8], offset: u32) -> Result<&[u8]> {
    let header = span(
        pool,
        FILES_POOL,
        offset as u64,
        layout::FILE_HEADER_SIZE,
        "file header overflows pool",
    )?;
    let path_size = u16_at(header, layout::FILE_PATH_SIZE) as usize;
    span(
        pool,
        FILES_POOL,
        offset as u64 + layout::FILE_HEADER_SIZE as u64,
        path_size,
        "file path bytes overflow pool",
    )
}

/// `"<path>:<begin_line>:<begin_col>-<end_line>:<end_col>"` for a provider's
/// file and packed source range.
pub fn file_location(pool: &[u8], offset: u32, eid: u64) -> Result<String> {
    let path = file_path(pool, offset)?;
    let (begin_line, begin_column, end_line, end_column) = layout::unpack_range(eid);
    Ok(format!(
        "{}:{}:{}-{}:{}",
        String::from_utf8_lossy(path),
        begin_line,
        begin_column,
        end_line,
        end_column
    ))
}
