//! Directory-backed source enumeration.
//!
//! This is the file-enumeration collaborator for standalone use: it walks a
//! workspace once, records which object each `.al` file declares, and serves
//! source text per object. Embedders with their own file model implement
//! [`SourceProvider`] directly instead.

use std::fs;
use std::path::{Path, PathBuf};

use globset::GlobSet;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::core::config::CoverageConfig;
use crate::core::errors::Result;
use crate::coverage::sources::SourceProvider;
use crate::coverage::types::SourceObject;
use crate::lang::al;

/// AL source file extension.
const AL_EXTENSION: &str = "al";

/// One enumerated workspace object.
#[derive(Debug, Clone)]
struct WorkspaceObject {
    object: SourceObject,
    path: PathBuf,
    excluded: bool,
}

/// [`SourceProvider`] over a directory of `.al` files.
pub struct WorkspaceSources {
    objects: Vec<WorkspaceObject>,
}

impl WorkspaceSources {
    /// Walk `root` and enumerate every AL object beneath it.
    ///
    /// Files whose workspace-relative path matches one of the configured
    /// exclude patterns keep their identity but are flagged excluded from
    /// coverage attribution. Files without a recognizable object header are
    /// skipped.
    pub fn scan(root: &Path, config: &CoverageConfig) -> Result<Self> {
        let exclusions = config.exclusion_set()?;
        let mut objects = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file()
                || path
                    .extension()
                    .map_or(true, |ext| !ext.eq_ignore_ascii_case(AL_EXTENSION))
            {
                continue;
            }

            let content = match fs::read_to_string(path) {
                Ok(content) => content,
                Err(err) => {
                    warn!("Skipping unreadable source {}: {}", path.display(), err);
                    continue;
                }
            };
            let Some(object) = al::parse_object_header(&content) else {
                debug!("No object header in {}", path.display());
                continue;
            };

            let excluded = is_excluded_path(&exclusions, root, path);
            objects.push(WorkspaceObject {
                object,
                path: path.to_path_buf(),
                excluded,
            });
        }

        debug!("Enumerated {} AL objects under {}", objects.len(), root.display());
        Ok(Self { objects })
    }

    /// Number of enumerated objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the workspace holds no AL objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Look up an object by its declared name (exact match).
    pub fn object_by_name(&self, name: &str) -> Option<SourceObject> {
        self.objects
            .iter()
            .find(|o| o.object.name == name)
            .map(|o| o.object.clone())
    }
}

fn is_excluded_path(exclusions: &GlobSet, root: &Path, path: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    exclusions.is_match(relative)
}

impl SourceProvider for WorkspaceSources {
    fn find_object(&self, kind: &str, id: u32) -> Option<SourceObject> {
        self.objects
            .iter()
            .find(|o| o.object.matches(kind, id))
            .map(|o| o.object.clone())
    }

    fn source_text(&self, object: &SourceObject) -> Option<String> {
        let found = self.objects.iter().find(|o| o.object == *object)?;
        match fs::read_to_string(&found.path) {
            Ok(content) => Some(content),
            Err(err) => {
                warn!(
                    "Source for {} vanished at {}: {}",
                    object,
                    found.path.display(),
                    err
                );
                None
            }
        }
    }

    fn is_excluded(&self, object: &SourceObject) -> bool {
        self.objects
            .iter()
            .find(|o| o.object == *object)
            .is_some_and(|o| o.excluded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_object(root: &Path, rel: &str, header: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, format!("{header}\n{{\n}}\n")).unwrap();
    }

    #[test]
    fn test_scan_enumerates_objects() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_object(root, "src/Posting.al", "codeunit 10 \"Posting\"");
        write_object(root, "src/SalesTests.al", "codeunit 50100 \"Sales Tests\"");
        fs::write(root.join("notes.txt"), "not a source file").unwrap();

        let sources = WorkspaceSources::scan(root, &CoverageConfig::default()).unwrap();
        assert_eq!(sources.len(), 2);

        let posting = sources.find_object("Codeunit", 10).unwrap();
        assert_eq!(posting.name, "Posting");
        assert!(sources.source_text(&posting).unwrap().contains("codeunit 10"));
        assert!(sources.find_object("codeunit", 9999).is_none());
    }

    #[test]
    fn test_exclude_patterns_flag_objects() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_object(root, "src/Posting.al", "codeunit 10 \"Posting\"");
        write_object(root, "legacy/Old.al", "codeunit 11 \"Old\"");

        let config = CoverageConfig {
            exclude_patterns: vec!["legacy/**".to_string()],
            ..CoverageConfig::default()
        };
        let sources = WorkspaceSources::scan(root, &config).unwrap();

        let posting = sources.find_object("codeunit", 10).unwrap();
        let old = sources.find_object("codeunit", 11).unwrap();
        assert!(!sources.is_excluded(&posting));
        assert!(sources.is_excluded(&old));
    }

    #[test]
    fn test_object_by_name() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_object(root, "SalesTests.al", "codeunit 50100 \"Sales Tests\"");

        let sources = WorkspaceSources::scan(root, &CoverageConfig::default()).unwrap();
        assert_eq!(sources.object_by_name("Sales Tests").unwrap().id, 50100);
        assert!(sources.object_by_name("Missing").is_none());
    }

    #[test]
    fn test_files_without_header_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("Broken.al"), "just some text ( )").unwrap();

        let sources = WorkspaceSources::scan(root, &CoverageConfig::default()).unwrap();
        assert!(sources.is_empty());
    }
}
