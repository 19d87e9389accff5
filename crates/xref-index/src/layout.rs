//! On-disk layout of the compact binary symbol index.
//!
//! An index is six sibling files next to its `index.<tag>…json` manifest,
//! each a raw image of natively-aligned packed records:
//!
//!  - `.symbol-details` — symbol name records, sorted by lowercased name
//!  - `.details`        — per-symbol detail records with inline kind/provider trailers
//!  - `.snippets`       — length-prefixed source excerpts
//!  - `.strings`        — length-prefixed strings (kind names)
//!  - `.files`          — file records with inline path bytes
//!  - `.hash-details`   — fixed-size hash→detail entries, sorted by hash
//!
//! Every size and field offset the decoders rely on is declared here, once.
//! Record headers carry the producer's struct padding, so trailers do not
//! start at the last field's end: name bytes begin at +8, file paths at +16.
//! All integers are native-endian; producer and consumer must agree.

/// Pool file suffixes, appended to the manifest path with `.json` stripped.
pub const DETAILS_SUFFIX: &str = ".details";
pub const SYMBOLS_SUFFIX: &str = ".symbol-details";
pub const SNIPPETS_SUFFIX: &str = ".snippets";
pub const STRINGS_SUFFIX: &str = ".strings";
pub const FILES_SUFFIX: &str = ".files";
pub const HASHES_SUFFIX: &str = ".hash-details";

/// Symbol name record: `{ detail_offset: u32, name_size: u16 }` + name bytes.
pub const NAME_HEADER_SIZE: usize = 8;
pub const NAME_DETAIL_OFFSET: usize = 0;
pub const NAME_SIZE: usize = 4;

/// Symbol detail record: `{ name_offset: u32, hash: u64, kind_count: u16 }`
/// followed by `kind_count` kind records.
pub const DETAIL_HEADER_SIZE: usize = 24;
pub const DETAIL_NAME_OFFSET: usize = 0;
pub const DETAIL_HASH: usize = 8;
pub const DETAIL_KIND_COUNT: usize = 16;

/// Kind record: `{ kind_name_offset: u32, linkage: u8, access: u8,
/// def_count: u16, decl_count: u16 }` followed by `def_count` then
/// `decl_count` provider records.
pub const KIND_HEADER_SIZE: usize = 16;
pub const KIND_NAME_OFFSET: usize = 0;
pub const KIND_LINKAGE: usize = 4;
pub const KIND_ACCESS: usize = 5;
pub const KIND_DEF_COUNT: usize = 6;
pub const KIND_DECL_COUNT: usize = 8;

/// Provider record: `{ sid: u64, eid: u64, file_hash: u64,
/// file_path_offset: u32, snippet_offset: u32 }`.
pub const PROVIDER_SIZE: usize = 40;
pub const PROVIDER_SID: usize = 0;
pub const PROVIDER_EID: usize = 8;
pub const PROVIDER_FILE_HASH: usize = 16;
pub const PROVIDER_PATH_OFFSET: usize = 24;
pub const PROVIDER_SNIPPET_OFFSET: usize = 32;

/// File record: `{ file_hash: u64, path_size: u16 }` + path bytes.
pub const FILE_HEADER_SIZE: usize = 16;
pub const FILE_HASH: usize = 0;
pub const FILE_PATH_SIZE: usize = 8;

/// Hash table entry: `{ hash: u64, detail_offset: u32 }`, fixed size.
pub const HASH_ENTRY_SIZE: usize = 16;
pub const HASH_HASH: usize = 0;
pub const HASH_DETAIL_OFFSET: usize = 8;

/// Length-prefixed string in `.strings` / `.snippets`: `u32` size + bytes.
pub const STRING_PREFIX_SIZE: usize = 4;

// A provider's `eid` packs the source range into one 64-bit word:
// begin line/column in the high half, end line/column in the low half.
pub const LINE_MASK: u64 = 0xf_ffff;
pub const COLUMN_MASK: u64 = 0xfff;
pub const END_COLUMN_SHIFT: u32 = 0;
pub const END_LINE_SHIFT: u32 = 12;
pub const BEGIN_COLUMN_SHIFT: u32 = 32;
pub const BEGIN_LINE_SHIFT: u32 = 44;

/// Pack a source range the way the producer does.
pub fn pack_range(begin_line: u32, begin_column: u32, end_line: u32, end_column: u32) -> u64 {
    ((begin_line as u64 & LINE_MASK) << BEGIN_LINE_SHIFT)
        | ((begin_column as u64 & COLUMN_MASK) << BEGIN_COLUMN_SHIFT)
        | ((end_line as u64 & LINE_MASK) << END_LINE_SHIFT)
        | ((end_column as u64 & COLUMN_MASK) << END_COLUMN_SHIFT)
}

/// Unpack an `eid` into (begin_line, begin_column, end_line, end_column).
pub fn unpack_range(eid: u64) -> (u64, u64, u64, u64) {
    (
        (eid >> BEGIN_LINE_SHIFT) & LINE_MASK,
        (eid >> BEGIN_COLUMN_SHIFT) & COLUMN_MASK,
        (eid >> END_LINE_SHIFT) & LINE_MASK,
        (eid >> END_COLUMN_SHIFT) & COLUMN_MASK,
    )
}
