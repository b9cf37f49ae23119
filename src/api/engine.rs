//! High-level engine tying scanning, resolution, and the index together.

use std::path::Path;

use tracing::{debug, info};

use crate::core::config::CoverageConfig;
use crate::core::errors::Result;
use crate::coverage::filters;
use crate::coverage::resolver::CoverageResolver;
use crate::coverage::sources::SourceProvider;
use crate::coverage::store::{self, CoverageRecordStore};
use crate::coverage::types::{CoverageRecord, MethodIdentity, SourceObject};
use crate::io::persistence::TestCoverageIndex;
use crate::lang::al::{self, MethodMarker};

/// External collaborator that actually executes tests.
///
/// The engine resolves which tests to run; execution (compilation, container
/// sessions, output capture) stays outside this crate.
pub trait TestRunner {
    /// Run the given test methods.
    fn run_tests(&self, tests: &[MethodIdentity]) -> Result<()>;
}

/// Coverage-to-test correlation engine.
///
/// Owns the configuration, a source provider, and the persisted index.
/// Operations are synchronous and bounded by file size.
pub struct CoverageEngine<S: SourceProvider> {
    config: CoverageConfig,
    sources: S,
    index: TestCoverageIndex,
    root: std::path::PathBuf,
}

impl<S: SourceProvider> CoverageEngine<S> {
    /// Open an engine for the workspace at `root`.
    ///
    /// The index is colocated with the discovered coverage data file, or
    /// kept at the workspace root when no data exists yet.
    pub fn open(root: &Path, config: CoverageConfig, sources: S) -> Result<Self> {
        config.validate()?;
        let index_path = match store::find_coverage_file(root, &config) {
            Some(coverage_file) => TestCoverageIndex::path_for_coverage_file(&coverage_file),
            None => root.join(crate::io::persistence::INDEX_FILE_NAME),
        };
        debug!("Test coverage index at {}", index_path.display());
        Ok(Self {
            config,
            sources,
            index: TestCoverageIndex::open(index_path),
            root: root.to_path_buf(),
        })
    }

    /// The persisted index backing this engine.
    pub fn index(&self) -> &TestCoverageIndex {
        &self.index
    }

    /// The engine's source provider.
    pub fn sources(&self) -> &S {
        &self.sources
    }

    /// Load the most recent run's coverage records.
    pub fn load_coverage_records(&self) -> Result<CoverageRecordStore> {
        CoverageRecordStore::load_latest(&self.root, &self.config)
    }

    /// Attribute the latest run's coverage to `test` and merge it into the
    /// index, replacing that test's previous attributions.
    ///
    /// Returns the number of covered methods recorded. A run without
    /// coverage data records nothing, clearing the test's stale entries.
    pub fn build_test_coverage_from_test_item(&self, test: &MethodIdentity) -> Result<usize> {
        let records = self.load_coverage_records()?;
        let entries = CoverageResolver::new(&self.sources).resolve(records.records(), test);
        let recorded = entries.len();
        self.index.merge(test, entries)?;
        info!("Recorded {} covered methods for test {}", recorded, test);
        Ok(recorded)
    }

    /// Test methods declared by `object`, per the configured attribute.
    ///
    /// Empty when the provider has no source for the object or nothing is
    /// marked.
    pub fn test_methods(&self, object: &SourceObject) -> Vec<MethodIdentity> {
        let Some(text) = self.sources.source_text(object) else {
            return Vec::new();
        };
        let marker = MethodMarker::attribute(self.config.test_attribute.as_str());
        al::method_ranges(&text, &marker)
            .map(|range| MethodIdentity::with_object(object.name.clone(), range.name, object.clone()))
            .collect()
    }

    /// Tests known to exercise `method`, in index order.
    pub fn related_tests(&self, method: &MethodIdentity) -> Vec<MethodIdentity> {
        self.index.query_by_covered_method(method)
    }

    /// Resolve the tests related to `method` and hand them to `runner`.
    ///
    /// Returns the resolved tests; when nothing is related the runner is not
    /// invoked at all.
    pub fn run_related_tests(
        &self,
        runner: &dyn TestRunner,
        method: &MethodIdentity,
    ) -> Result<Vec<MethodIdentity>> {
        let tests = self.related_tests(method);
        if tests.is_empty() {
            debug!("No tests related to {}", method);
            return Ok(tests);
        }
        runner.run_tests(&tests)?;
        Ok(tests)
    }

    /// Coverage percentage for `object` within `start..=end`.
    ///
    /// The denominator counts every code line in the range, the numerator
    /// only the hit ones; both exclude line 0 and non-code records.
    pub fn coverage_percentage_for_range(
        &self,
        records: &[CoverageRecord],
        object: &SourceObject,
        start: u32,
        end: u32,
    ) -> u32 {
        let object_lines = filters::filter_by_object(records, object, true);
        let total = filters::filter_by_line_range(&object_lines, start, end, true);
        let hit = filters::filter_by_line_range(&object_lines, start, end, false);
        filters::percentage(hit.len(), total.len())
    }
}
