//! Persisted test coverage index.
//!
//! The index is a cache of facts rebuildable by re-running tests, so load
//! problems degrade to an empty index; only failed writes are fatal to the
//! operation that triggered them.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::core::errors::{Result, VordrError};
use crate::coverage::types::{CoverageIndexEntry, MethodIdentity};

/// Fixed basename of the persisted index, colocated with the coverage data.
pub const INDEX_FILE_NAME: &str = "testcoverage.json";

/// Persisted mapping from covered method to the tests exercising it.
///
/// All mutation goes through [`merge`](Self::merge), which replaces every
/// entry for one test atomically: the new full sequence is built in memory,
/// written to a temp file, and renamed over the store. A mutex serializes
/// concurrent merges so readers observe either the pre- or post-merge
/// state, never a torn one.
pub struct TestCoverageIndex {
    path: PathBuf,
    entries: Mutex<Vec<CoverageIndexEntry>>,
}

impl TestCoverageIndex {
    /// Open the index at `path`, loading any persisted entries.
    ///
    /// An absent file is an empty index. Malformed content is discarded with
    /// a warning; the next merge rewrites the store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path);
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Derive the index path colocated with a coverage data file.
    pub fn path_for_coverage_file(coverage_file: &Path) -> PathBuf {
        match coverage_file.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.join(INDEX_FILE_NAME),
            _ => PathBuf::from(INDEX_FILE_NAME),
        }
    }

    /// Where this index persists.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace every entry attributed to `test_method` with `new_entries`
    /// and persist the full sequence.
    ///
    /// Entries for all other tests are untouched. Duplicate
    /// (covered, test) pairs in `new_entries` collapse to one.
    pub fn merge(
        &self,
        test_method: &MethodIdentity,
        new_entries: Vec<CoverageIndexEntry>,
    ) -> Result<()> {
        let mut entries = self.entries.lock();

        let mut next: Vec<CoverageIndexEntry> = entries
            .iter()
            .filter(|e| e.test_method != *test_method)
            .cloned()
            .collect();
        for entry in new_entries {
            if !next.contains(&entry) {
                next.push(entry);
            }
        }

        persist_entries(&self.path, &next)?;
        debug!(
            "Merged coverage for {} ({} entries total)",
            test_method,
            next.len()
        );
        *entries = next;
        Ok(())
    }

    /// Distinct test methods covering `method`, in index order.
    pub fn query_by_covered_method(&self, method: &MethodIdentity) -> Vec<MethodIdentity> {
        let entries = self.entries.lock();
        let distinct: IndexSet<MethodIdentity> = entries
            .iter()
            .filter(|e| e.covered_method == *method)
            .map(|e| e.test_method.clone())
            .collect();
        distinct.into_iter().collect()
    }

    /// Snapshot of the full entry sequence.
    pub fn entries(&self) -> Vec<CoverageIndexEntry> {
        self.entries.lock().clone()
    }

    /// Number of persisted entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Load the persisted sequence; absence or malformed content yields empty.
fn load_entries(path: &Path) -> Vec<CoverageIndexEntry> {
    if !path.exists() {
        return Vec::new();
    }
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            warn!(
                "Failed to read test coverage index {}: {}; starting empty",
                path.display(),
                err
            );
            return Vec::new();
        }
    };
    match serde_json::from_str(&content) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(
                "Malformed test coverage index {}: {}; starting empty",
                path.display(),
                err
            );
            Vec::new()
        }
    }
}

/// Write the full sequence with a temp-file-then-rename replace.
fn persist_entries(path: &Path, entries: &[CoverageIndexEntry]) -> Result<()> {
    let json = serde_json::to_string_pretty(entries)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                VordrError::persistence_io(
                    "failed to create index directory",
                    parent.display().to_string(),
                    e,
                )
            })?;
        }
    }

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|e| {
        VordrError::persistence_io(
            "failed to write test coverage index",
            tmp.display().to_string(),
            e,
        )
    })?;
    fs::rename(&tmp, path).map_err(|e| {
        VordrError::persistence_io(
            "failed to replace test coverage index",
            path.display().to_string(),
            e,
        )
    })
}
