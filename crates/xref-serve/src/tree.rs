//! The tree tagset: a filesystem-name searcher over the JSON tree manifest.
//! Unlike the symbol engine this is a plain lowercased substring scan over
//! an in-memory vector; queries are not treated as regexes.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use xref_index::{JsonRequest, SearchStats, MAX_RESULTS};

use crate::registry::ApiHandler;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeData {
    pub data: Vec<TreeObject>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeObject {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dir: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file: String,
    pub href: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent: String,
}

/// Loader for tree manifests; wired into the `tree` tagset.
pub fn load_tree(manifest: &Path) -> Result<Box<dyn ApiHandler>> {
    let file = File::open(manifest)
        .with_context(|| format!("open tree manifest {}", manifest.display()))?;
    let data: TreeData = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parse tree manifest {}", manifest.display()))?;
    Ok(Box::new(data))
}

impl ApiHandler for TreeData {
    fn search(&self, query: &JsonRequest) -> (serde_json::Value, SearchStats) {
        let mut stats = SearchStats::default();
        let mut result = TreeData::default();
        if query.p {
            return (tree_value(&result), stats);
        }

        let q = query.q.to_lowercase();
        for object in &self.data {
            stats.scanned += 1;

            if !object.dir.to_lowercase().contains(&q) && !object.file.to_lowercase().contains(&q)
            {
                continue;
            }
            stats.matched += 1;

            if stats.matched > query.s {
                stats.returned += 1;
                result.data.push(object.clone());

                if stats.matched >= MAX_RESULTS + query.s {
                    break;
                }
            }
        }

        (tree_value(&result), stats)
    }
}

fn tree_value(result: &TreeData) -> serde_json::Value {
    serde_json::to_value(result).unwrap_or_else(|e| {
        tracing::error!("could not serialise tree result: {}", e);
        serde_json::json!({ "data": [] })
    })
}
