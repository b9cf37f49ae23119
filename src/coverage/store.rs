//! Loading and discovery of raw coverage data.
//!
//! Coverage data is ephemeral: every query reloads the most recent run's
//! records. Absence of the data file means "no coverage", never an error.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, info};

use crate::core::config::CoverageConfig;
use crate::core::errors::{Result, VordrError};
use crate::coverage::types::CoverageRecord;

/// The flat record list from one test run.
#[derive(Debug, Clone, Default)]
pub struct CoverageRecordStore {
    records: Vec<CoverageRecord>,
}

impl CoverageRecordStore {
    /// Wrap an already-materialized record list, normalizing its order.
    pub fn from_records(records: Vec<CoverageRecord>) -> Self {
        Self {
            records: normalize_records(records),
        }
    }

    /// Load records from a coverage data file.
    ///
    /// A missing file yields an empty store; unreadable or malformed content
    /// is an error because it means a run produced data we cannot trust.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No coverage data at {}, treating as empty", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            VordrError::io(
                format!("Failed to read coverage data at {}", path.display()),
                e,
            )
        })?;
        let records: Vec<CoverageRecord> = serde_json::from_str(&content)?;
        info!(
            "Loaded {} coverage records from {}",
            records.len(),
            path.display()
        );
        Ok(Self::from_records(records))
    }

    /// Discover the data file under `root` and load it, or empty when none.
    pub fn load_latest(root: &Path, config: &CoverageConfig) -> Result<Self> {
        match find_coverage_file(root, config) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// The normalized record sequence.
    pub fn records(&self) -> &[CoverageRecord] {
        &self.records
    }

    /// Whether the run produced any records at all.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Enforce the ordering the resolver depends on: records grouped per object
/// and sorted by line number within each group. The sort is stable so equal
/// lines keep their run order.
fn normalize_records(mut records: Vec<CoverageRecord>) -> Vec<CoverageRecord> {
    records.sort_by(|a, b| {
        let a_kind = a.object_kind.to_ascii_lowercase();
        let b_kind = b.object_kind.to_ascii_lowercase();
        (a_kind, a.object_id, a.line_number).cmp(&(b_kind, b.object_id, b.line_number))
    });
    records
}

/// Locate the coverage data file for a workspace.
///
/// An explicit `coverage_file` in the configuration wins (relative paths are
/// anchored at `root`); otherwise the configured search paths and patterns
/// are globbed and the most recently modified match is taken.
pub fn find_coverage_file(root: &Path, config: &CoverageConfig) -> Option<PathBuf> {
    if let Some(ref explicit) = config.coverage_file {
        let path = if explicit.is_absolute() {
            explicit.clone()
        } else {
            root.join(explicit)
        };
        debug!("Using explicit coverage file: {}", path.display());
        return path.exists().then_some(path);
    }

    let mut candidates: Vec<(PathBuf, SystemTime)> = Vec::new();
    for search_path in &config.search_paths {
        // Keep glob results on clean paths: "./" entries anchor at the root.
        let trimmed = search_path.trim_start_matches("./").trim_end_matches('/');
        let base = if trimmed.is_empty() {
            root.to_path_buf()
        } else {
            root.join(trimmed)
        };
        if !base.exists() {
            continue;
        }
        for pattern in &config.file_patterns {
            let glob_pattern = format!("{}/{}", base.display(), pattern);
            let Ok(paths) = glob::glob(&glob_pattern) else {
                debug!("Glob pattern failed: {}", glob_pattern);
                continue;
            };
            for entry in paths.flatten() {
                if let Some(modified) = file_mtime(&entry) {
                    candidates.push((entry, modified));
                }
            }
        }
    }

    candidates.sort_by(|a, b| b.1.cmp(&a.1));
    candidates.dedup_by(|a, b| a.0 == b.0);
    let found = candidates.into_iter().next().map(|(path, _)| path);
    if let Some(ref path) = found {
        debug!("Discovered coverage file: {}", path.display());
    }
    found
}

fn file_mtime(path: &Path) -> Option<SystemTime> {
    let metadata = fs::metadata(path).ok()?;
    if !metadata.is_file() {
        return None;
    }
    metadata.modified().ok()
}
