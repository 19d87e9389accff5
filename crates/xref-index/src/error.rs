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

use std::fmt::{self, Display};
use std::path::PathBuf;

/// Typed errors for loading and reading a compact binary symbol index.
///
/// Corruption during a load aborts the load; corruption mid-scan terminates
/// that scan only. No variant is ever turned into a panic.
#[derive(Debug)]
pub enum Error {
    /// A pool file could not be opened or stat'd.
    MissingFile { path: PathBuf, source: std::io::Error },
    /// A pool file opened but could not be mapped.
    MapFailed { path: PathBuf, source: std::io::Error },
    /// A record or trailer would read past the end of its pool.
    Corrupt {
        pool: &'static str,
        offset: u64,
        len: usize,
        reason: &'static str,
    },
    /// A symbol hash is not present in the hash table.
    NotFound { hash: u64 },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MissingFile { path, source } => {
                write!(f, "missing pool file {}: {}", path.display(), source)
            }
            Error::MapFailed { path, source } => {
                write!(f, "mmap failed for {}: {}", path.display(), source)
            }
            Error::Corrupt {
                pool,
                offset,
                len,
                reason,
            } => write!(
                f,
                "corrupt {} pool: {} at offset {}, pool length {}",
                pool, reason, offset, len
            ),
            Error::NotFound { hash } => write!(f, "no symbol with hash {:x}", hash),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MissingFile { source, .. } | Error::MapFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
