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

//! Discovery, reload, and hot-swap behavior of the index registry.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

use xref_index::test_helpers::IndexBuilder;
use xref_index::JsonRequest;
use xref_serve::{load_symbols, Discovery, TagSet};

fn symbol_tagset(dir: &Path) -> TagSet {
    TagSet::new(
        "symbol",
        vec![dir.to_path_buf()],
        Discovery::SingleDir {
            suffix: ".symbols.json".to_string(),
        },
        Box::new(|manifest| load_symbols(manifest)),
    )
}

fn query(q: &str) -> JsonRequest {
    JsonRequest {
        q: q.to_string(),
        s: 0,
        p: false,
    }
}

fn result_names(value: &serde_json::Value) -> Vec<String> {
    value["data"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|o| o["name"].as_str().unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Write an index whose only symbol is `name`, then push the manifest mtime
/// forward so a rewrite always looks newer than the previous generation.
fn write_index(dir: &Path, name: &str, bump_secs: u64) {
    let manifest = IndexBuilder::new()
        .symbol(name, 0x1)
        .write(dir, "index.v1.symbols");
    let file = OpenOptions::new()
        .append(true)
        .open(&manifest)
        .expect("open manifest");
    file.set_modified(SystemTime::now() + Duration::from_secs(bump_secs))
        .expect("set mtime");
}

#[test]
fn discovers_and_loads_single_dir_tags() {
    let dir = tempdir().expect("tmpdir");
    write_index(dir.path(), "alpha", 0);

    let tagset = symbol_tagset(dir.path());
    assert!(tagset.find("v1").is_none());

    tagset.update();
    let cell = tagset.find("v1").expect("tag discovered");

    let guard = cell.handler.read();
    let (value, stats) = guard.as_ref().expect("handler installed").search(&query("alpha"));
    assert_eq!(stats.matched, 1);
    assert_eq!(result_names(&value), vec!["alpha"]);
}

#[test]
fn unchanged_manifest_is_not_reloaded() {
    let dir = tempdir().expect("tmpdir");
    write_index(dir.path(), "alpha", 0);

    let tagset = symbol_tagset(dir.path());
    tagset.update();
    let cell = tagset.find("v1").expect("tag");

    // Replace the pools on disk without touching the manifest mtime: the
    // next cycle must keep serving the loaded generation.
    let manifest = dir.path().join("index.v1.symbols.json");
    let mtime = std::fs::metadata(&manifest).unwrap().modified().unwrap();
    IndexBuilder::new()
        .symbol("replaced", 0x2)
        .write(dir.path(), "index.v1.symbols");
    OpenOptions::new()
        .append(true)
        .open(&manifest)
        .unwrap()
        .set_modified(mtime)
        .unwrap();

    tagset.update();
    let guard = cell.handler.read();
    let (value, _) = guard.as_ref().unwrap().search(&query(""));
    assert_eq!(result_names(&value), vec!["alpha"]);
}

#[test]
fn newer_manifest_swaps_the_handler() {
    let dir = tempdir().expect("tmpdir");
    write_index(dir.path(), "alpha", 0);

    let tagset = symbol_tagset(dir.path());
    tagset.update();
    let cell = tagset.find("v1").expect("tag");

    write_index(dir.path(), "beta", 60);
    tagset.update();

    // Same cell, new generation.
    assert!(Arc::ptr_eq(&cell, &tagset.find("v1").expect("tag")));
    let guard = cell.handler.read();
    let (value, _) = guard.as_ref().unwrap().search(&query(""));
    assert_eq!(result_names(&value), vec!["beta"]);
}

#[test]
fn failing_load_keeps_previous_handler() {
    let dir = tempdir().expect("tmpdir");
    write_index(dir.path(), "alpha", 0);

    let tagset = symbol_tagset(dir.path());
    tagset.update();
    let cell = tagset.find("v1").expect("tag");

    // Corrupt the names pool and advance the manifest: the reload attempt
    // must fail and leave the old generation in place.
    let symbols = dir.path().join("index.v1.symbols.symbol-details");
    let bytes = std::fs::read(&symbols).unwrap();
    std::fs::write(&symbols, &bytes[..bytes.len() - 3]).unwrap();
    let manifest = dir.path().join("index.v1.symbols.json");
    OpenOptions::new()
        .append(true)
        .open(&manifest)
        .unwrap()
        .set_modified(SystemTime::now() + Duration::from_secs(120))
        .unwrap();

    tagset.update();
    let guard = cell.handler.read();
    let (value, _) = guard.as_ref().expect("old handler still there").search(&query(""));
    assert_eq!(result_names(&value), vec!["alpha"]);
}

#[test]
fn inflight_reader_finishes_on_old_generation() {
    let dir = tempdir().expect("tmpdir");
    write_index(dir.path(), "alpha", 0);

    let tagset = Arc::new(symbol_tagset(dir.path()));
    tagset.update();
    let cell = tagset.find("v1").expect("tag");

    // An in-flight query: the read guard is held across its whole scan.
    let guard = cell.handler.read();

    write_index(dir.path(), "beta", 60);
    let reloader = {
        let tagset = Arc::clone(&tagset);
        std::thread::spawn(move || tagset.update())
    };

    // The reloader is parked on the write lock by now (or about to be);
    // the in-flight reader still sees the old generation.
    std::thread::sleep(Duration::from_millis(50));
    let (value, _) = guard.as_ref().expect("old generation").search(&query(""));
    assert_eq!(result_names(&value), vec!["alpha"]);

    drop(guard);
    reloader.join().expect("reloader thread");

    let guard = cell.handler.read();
    let (value, _) = guard.as_ref().expect("new generation").search(&query(""));
    assert_eq!(result_names(&value), vec!["beta"]);
}

#[test]
fn spread_discovery_uses_subdirectories_as_tags() {
    let dir = tempdir().expect("tmpdir");
    let v1 = dir.path().join("v1.0");
    let v2 = dir.path().join("v2.0");
    std::fs::create_dir(&v1).unwrap();
    std::fs::create_dir(&v2).unwrap();
    IndexBuilder::new().symbol("one", 0x1).write(&v1, "index.symbols");
    IndexBuilder::new().symbol("two", 0x2).write(&v2, "index.symbols");

    let tagset = TagSet::new(
        "symbol",
        vec![dir.path().to_path_buf()],
        Discovery::Spread {
            manifest: "index.symbols.json".to_string(),
        },
        Box::new(|manifest| load_symbols(manifest)),
    );
    tagset.update();

    let mut tags = tagset.tag_names();
    tags.sort();
    assert_eq!(tags, vec!["v1.0", "v2.0"]);

    let cell = tagset.find("v2.0").expect("tag");
    let guard = cell.handler.read();
    let (value, _) = guard.as_ref().unwrap().search(&query("two"));
    assert_eq!(result_names(&value), vec!["two"]);
}
