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

//! End-to-end search behavior over fixture indexes.

use tempfile::tempdir;

use xref_index::test_helpers::{IndexBuilder, KindSpec, ProviderSpec, SymbolSpec};
use xref_index::{layout, JsonRequest, SymbolIndex};

fn query(q: &str, s: u64) -> JsonRequest {
    JsonRequest {
        q: q.to_string(),
        s,
        p: false,
    }
}

/// The five-name fixture: stored in lowercased-sorted order, four of the
/// names contain "foo" case-insensitively.
fn five_names(dir: &std::path::Path) -> SymbolIndex {
    let manifest = IndexBuilder::new()
        .symbol("foo", 0x1)
        .symbol("Foobar", 0x2)
        .symbol("FooBar", 0x3)
        .symbol("other", 0x4)
        .symbol("xfoox", 0x5)
        .write(dir, "index.v1.symbols");
    SymbolIndex::load(&manifest).expect("load")
}

#[test]
fn substring_query_matches_case_insensitively() {
    let dir = tempdir().expect("tmpdir");
    let index = five_names(dir.path());

    let (result, stats) = index.search(&query("foo", 0));
    assert!(result.error.is_empty());
    assert_eq!(stats.scanned, 5);
    assert_eq!(stats.matched, 4);
    assert_eq!(stats.returned, 4);

    let names: Vec<&str> = result.data.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["foo", "Foobar", "FooBar", "xfoox"]);
    assert!(stats.optimized.starts_with("prefix='foo'"));
}

#[test]
fn anchored_query_matches_exactly() {
    let dir = tempdir().expect("tmpdir");
    let index = five_names(dir.path());

    let (result, stats) = index.search(&query("^foo$", 0));
    assert_eq!(stats.matched, 1);
    assert_eq!(result.data.len(), 1);
    assert_eq!(result.data[0].name, "foo");
}

#[test]
fn invalid_regex_reports_error_with_empty_data() {
    let dir = tempdir().expect("tmpdir");
    let index = five_names(dir.path());

    let (result, stats) = index.search(&query("[", 0));
    assert!(!result.error.is_empty());
    assert!(result.data.is_empty());
    assert_eq!(stats.scanned, 0);
    assert_eq!(stats.matched, 0);
    assert_eq!(stats.returned, 0);
}

#[test]
fn pagination_skips_and_caps() {
    let dir = tempdir().expect("tmpdir");
    let index = five_names(dir.path());

    // Skip past every match: nothing comes back.
    let (result, stats) = index.search(&query("foo", 30));
    assert_eq!(stats.returned, 0);
    assert!(result.data.is_empty());

    // Skip two of the four matches.
    let (result, stats) = index.search(&query("foo", 2));
    assert_eq!(stats.matched, 4);
    assert_eq!(stats.returned, 2);
    let names: Vec<&str> = result.data.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["FooBar", "xfoox"]);
}

#[test]
fn result_page_is_capped_at_max_results() {
    let dir = tempdir().expect("tmpdir");
    let mut builder = IndexBuilder::new();
    for i in 0..40 {
        builder = builder.symbol(&format!("match_{:02}", i), 0x100 + i);
    }
    let manifest = builder.write(dir.path(), "index.v1.symbols");
    let index = SymbolIndex::load(&manifest).expect("load");

    let (result, stats) = index.search(&query("match", 0));
    assert_eq!(stats.matched, 30);
    assert_eq!(stats.returned, 30);
    assert_eq!(result.data.len(), 30);

    // The second page holds the remaining ten.
    let (result, stats) = index.search(&query("match", 30));
    assert_eq!(stats.returned, 10);
    assert_eq!(result.data.len(), 10);
    assert_eq!(stats.matched, 40);
}

#[test]
fn ping_returns_immediately() {
    let dir = tempdir().expect("tmpdir");
    let index = five_names(dir.path());

    let (result, stats) = index.search(&JsonRequest {
        q: "foo".to_string(),
        s: 0,
        p: true,
    });
    assert!(result.data.is_empty());
    assert!(result.error.is_empty());
    assert_eq!(stats.scanned, 0);
}

#[test]
fn empty_query_matches_everything() {
    let dir = tempdir().expect("tmpdir");
    let index = five_names(dir.path());

    let (result, stats) = index.search(&query("", 0));
    assert_eq!(stats.scanned, 5);
    assert_eq!(stats.matched, 5);
    assert_eq!(result.data.len(), 5);
}

#[test]
fn empty_index_yields_no_matches() {
    let dir = tempdir().expect("tmpdir");
    let manifest = IndexBuilder::new().write(dir.path(), "index.v1.symbols");
    let index = SymbolIndex::load(&manifest).expect("load empty");

    let (result, stats) = index.search(&query("foo", 0));
    assert!(result.error.is_empty());
    assert!(result.data.is_empty());
    assert_eq!(stats.scanned, 0);

    assert!(index.hash_lookup(0x1).is_err());
}

#[test]
fn min_offsets_are_lower_bounds() {
    let dir = tempdir().expect("tmpdir");
    let manifest = IndexBuilder::new()
        .symbol("a", 0x1)
        .symbol("bb", 0x2)
        .symbol("cc", 0x3)
        .symbol("longest_name_here", 0x4)
        .symbol("zz", 0x5)
        .write(dir.path(), "index.v1.symbols");
    let index = SymbolIndex::load(&manifest).expect("load");

    let mut records: Vec<(u32, usize)> = Vec::new();
    index
        .for_each_symbol(0, |record, offset| {
            records.push((offset, record.name.len()));
        })
        .expect("iterate");

    let max_len = records.iter().map(|&(_, len)| len).max().unwrap();
    for k in 0..=max_len {
        let bound = index.min_offset_for(k);
        for &(offset, len) in &records {
            if len >= k {
                assert!(
                    bound <= offset,
                    "min_offset_for({}) = {} exceeds offset {} of a {}-byte name",
                    k,
                    bound,
                    offset,
                    len
                );
            }
        }
    }

    // Oversized prefixes clamp to the last entry instead of indexing past it.
    assert_eq!(index.min_offset_for(max_len + 10), index.min_offset_for(max_len));
}

#[test]
fn scan_starts_past_short_names() {
    // Names sorted: "aa" (2), "bbbb" (4), "cc" (2)... lowercased order is
    // aa, bbbb, cc — a 4-byte prefix may still have to scan from "bbbb",
    // the first record long enough.
    let dir = tempdir().expect("tmpdir");
    let manifest = IndexBuilder::new()
        .symbol("aa", 0x1)
        .symbol("bbbb", 0x2)
        .symbol("cc", 0x3)
        .write(dir.path(), "index.v1.symbols");
    let index = SymbolIndex::load(&manifest).expect("load");

    let mut offsets = Vec::new();
    index
        .for_each_symbol(0, |_, offset| offsets.push(offset))
        .expect("iterate");

    assert_eq!(index.min_offset_for(0), offsets[0]);
    assert_eq!(index.min_offset_for(3), offsets[1]);
    assert_eq!(index.min_offset_for(4), offsets[1]);

    let (_, stats) = index.search(&query("bbbb", 0));
    // The scan skipped the two-byte name ahead of the start offset.
    assert_eq!(stats.scanned, 2);
    assert_eq!(stats.matched, 1);
}

#[test]
fn materialisation_error_is_skipped_not_aborted() {
    let dir = tempdir().expect("tmpdir");
    let manifest = IndexBuilder::new()
        .symbol("foo_a", 0x1)
        .symbol("foo_b", 0x2)
        .symbol("foo_c", 0x3)
        .write(dir.path(), "index.v1.symbols");

    // Wreck the middle symbol's detail record on disk: a kind count that
    // large walks straight past the end of the pool.
    let detail_offset = {
        let index = SymbolIndex::load(&manifest).expect("load");
        index.hash_lookup(0x2).expect("detail offset")
    };
    let details_file = dir.path().join("index.v1.symbols.details");
    let mut bytes = std::fs::read(&details_file).expect("read details");
    let field = detail_offset as usize + layout::DETAIL_KIND_COUNT;
    bytes[field..field + 2].copy_from_slice(&u16::MAX.to_ne_bytes());
    std::fs::write(&details_file, &bytes).expect("rewrite details");

    let index = SymbolIndex::load(&manifest).expect("reload");
    let (result, stats) = index.search(&query("foo", 0));

    // The bad record still counts as matched, yields no result, and the
    // scan carries on to the record behind it.
    assert_eq!(stats.scanned, 3);
    assert_eq!(stats.matched, 3);
    assert_eq!(stats.returned, 2);
    assert!(result.error.is_empty());
    let names: Vec<&str> = result.data.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["foo_a", "foo_c"]);
}

#[test]
fn failed_materialisation_accrues_no_build_time() {
    let dir = tempdir().expect("tmpdir");
    let manifest = IndexBuilder::new()
        .symbol("foo_a", 0x1)
        .symbol("foo_b", 0x2)
        .symbol("foo_c", 0x3)
        .write(dir.path(), "index.v1.symbols");

    // An empty details pool fails every materialisation attempt.
    std::fs::write(dir.path().join("index.v1.symbols.details"), b"").expect("empty details");

    let index = SymbolIndex::load(&manifest).expect("load");
    let (result, stats) = index.search(&query("foo", 0));

    assert_eq!(stats.scanned, 3);
    assert_eq!(stats.matched, 3);
    assert_eq!(stats.returned, 0);
    assert!(result.data.is_empty());
    assert!(result.error.is_empty());
    assert_eq!(stats.build_time, std::time::Duration::ZERO);
}

#[test]
fn materialised_results_are_fully_linked() {
    let dir = tempdir().expect("tmpdir");
    let manifest = IndexBuilder::new()
        .symbol_spec(
            SymbolSpec::new("connect", 0xcafe).kind(
                KindSpec::new("function", 2, 0)
                    .def(ProviderSpec::new(
                        "net/connect.cc",
                        0x1122,
                        0,
                        layout::pack_range(100, 1, 120, 2),
                        "int connect(int fd) {",
                    ))
                    .decl(ProviderSpec::new(
                        "net/connect.h",
                        0x3344,
                        0x10,
                        layout::pack_range(12, 1, 12, 30),
                        "int connect(int fd);",
                    )),
            ),
        )
        .write(dir.path(), "index.v1.symbols");
    let index = SymbolIndex::load(&manifest).expect("load");

    let (result, _) = index.search(&query("connect", 0));
    assert_eq!(result.data.len(), 1);

    let object = &result.data[0];
    assert_eq!(object.name, "connect");
    assert_eq!(object.hash, "cafe");
    assert_eq!(object.kinds.len(), 1);

    let kind = &object.kinds[0];
    assert_eq!(kind.kind, "function");
    assert_eq!(kind.linkage, 2);
    assert_eq!(kind.access, 0);

    let def_eid = layout::pack_range(100, 1, 120, 2);
    assert_eq!(kind.defs.len(), 1);
    assert_eq!(kind.defs[0].location, "net/connect.cc:100:1-120:2");
    assert_eq!(kind.defs[0].snippet, "int connect(int fd) {");
    // Zero start id: the fragment carries the end id alone.
    assert_eq!(
        kind.defs[0].href,
        format!("../22/00000000000011.html#{:016x}", def_eid)
    );

    let decl_eid = layout::pack_range(12, 1, 12, 30);
    assert_eq!(kind.decls.len(), 1);
    assert_eq!(kind.decls[0].location, "net/connect.h:12:1-12:30");
    // Distinct nonzero start id: both ids in the fragment.
    assert_eq!(
        kind.decls[0].href,
        format!("../44/00000000000033.html#{:016x}{:016x}", 0x10, decl_eid)
    );

    // The same object comes back through the hash lookup path, where the
    // name is recovered from the names pool.
    let by_hash = index.symbol_by_hash(0xcafe).expect("by hash");
    assert_eq!(&by_hash, object);
}
