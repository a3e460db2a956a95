//! Archive and host-file helpers shared by the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

#[path = "../../src/zip/testutil.rs"]
mod testutil;

pub use testutil::{TestEntry, build_zip};

/// A comment-free archive of `entries`
pub fn zip(entries: &[TestEntry<'_>]) -> Vec<u8> {
    build_zip(entries, b"")
}

/// Write `prefix` followed by `archive` to `dir/name`.
pub fn write_host(dir: &Path, name: &str, prefix: &[u8], archive: &[u8]) -> PathBuf {
    let path = dir.join(name);
    let mut data = prefix.to_vec();
    data.extend_from_slice(archive);
    std::fs::write(&path, data).unwrap();
    path
}
