//! Attribution of hit coverage lines to their enclosing methods.
//!
//! Correctness here depends on the record sequence being grouped per object
//! and line-sorted within each group; the store enforces that at the
//! ingestion boundary.

use std::collections::HashMap;

use tracing::debug;

use crate::coverage::sources::SourceProvider;
use crate::coverage::types::{CoverageIndexEntry, CoverageRecord, LineKind, MethodIdentity};
use crate::lang::al::{self, MethodMarker, MethodRange};

/// Walks one run's records and emits (covered method, test method) pairs.
///
/// Method-range scans are cached per object for the lifetime of the
/// resolver, so resolving several tests against the same workspace reuses
/// the lexical work.
pub struct CoverageResolver<'a> {
    sources: &'a dyn SourceProvider,
    range_cache: HashMap<(String, u32), Option<Vec<MethodRange>>>,
}

impl<'a> CoverageResolver<'a> {
    /// Create a resolver over the given source provider.
    pub fn new(sources: &'a dyn SourceProvider) -> Self {
        Self {
            sources,
            range_cache: HashMap::new(),
        }
    }

    /// Attribute every hit line in `records` to its enclosing method.
    ///
    /// Emits at most one entry per method body entered: a `FunctionBoundary`
    /// record resets the credit flag, and the first hit `Code` line after it
    /// scans backward to that boundary and resolves the method name from the
    /// object's source. Records for objects the provider does not know, or
    /// flags as excluded from coverage, are skipped silently.
    pub fn resolve(
        &mut self,
        records: &[CoverageRecord],
        test_method: &MethodIdentity,
    ) -> Vec<CoverageIndexEntry> {
        let mut entries: Vec<CoverageIndexEntry> = Vec::new();
        let mut credited = false;

        for (idx, record) in records.iter().enumerate() {
            if idx > 0 && !record.same_object(&records[idx - 1]) {
                credited = false;
            }
            if record.line_kind == LineKind::FunctionBoundary {
                credited = false;
                continue;
            }
            if credited || !record.is_countable() || record.hit_count == 0 {
                continue;
            }

            let Some(covered) = self.attribute_hit(records, idx) else {
                continue;
            };
            credited = true;

            let entry = CoverageIndexEntry {
                covered_method: covered,
                test_method: test_method.clone(),
            };
            if !entries.contains(&entry) {
                entries.push(entry);
            }
        }

        debug!(
            "Resolved {} covered methods for test {}",
            entries.len(),
            test_method
        );
        entries
    }

    /// Resolve the method enclosing the hit record at `idx`, if possible.
    fn attribute_hit(
        &mut self,
        records: &[CoverageRecord],
        idx: usize,
    ) -> Option<MethodIdentity> {
        let record = &records[idx];
        let object = self
            .sources
            .find_object(&record.object_kind, record.object_id)?;
        if self.sources.is_excluded(&object) {
            return None;
        }

        let boundary_line = nearest_boundary_before(records, idx)?;

        let key = (record.object_kind.to_ascii_lowercase(), record.object_id);
        let ranges = self
            .range_cache
            .entry(key)
            .or_insert_with(|| {
                self.sources
                    .source_text(&object)
                    .map(|text| al::method_ranges(&text, &MethodMarker::AnyMethod).collect())
            })
            .as_deref()?;

        let range = al::enclosing_method(ranges, boundary_line)?;
        Some(MethodIdentity::with_object(
            object.name.clone(),
            range.name.clone(),
            object,
        ))
    }
}

/// Line number of the nearest preceding `FunctionBoundary` for the same
/// object, scanning backward from `idx`.
fn nearest_boundary_before(records: &[CoverageRecord], idx: usize) -> Option<u32> {
    let record = &records[idx];
    records[..idx]
        .iter()
        .rev()
        .take_while(|r| r.same_object(record))
        .find(|r| r.line_kind == LineKind::FunctionBoundary)
        .map(|r| r.line_number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::sources::InMemorySources;
    use crate::coverage::types::SourceObject;

    const SOURCE: &str = "\
codeunit 10 \"Posting\"
{
}
procedure MethodA()
begin
    DoWork();
    DoMore();
end;
procedure MethodB()
begin
    Finish();
end;
";

    fn workspace() -> InMemorySources {
        let mut sources = InMemorySources::new();
        sources.add(SourceObject::new("Codeunit", 10, "Posting"), SOURCE);
        sources
    }

    fn record(line: u32, kind: LineKind, hits: u32) -> CoverageRecord {
        CoverageRecord::new("Codeunit", 10, line, kind, hits)
    }

    #[test]
    fn test_one_entry_per_exercised_method() {
        // MethodA declared on line 4, MethodB on line 9.
        let records = vec![
            record(4, LineKind::FunctionBoundary, 1),
            record(6, LineKind::Code, 1),
            record(7, LineKind::Code, 0),
            record(9, LineKind::FunctionBoundary, 1),
            record(11, LineKind::Code, 2),
        ];
        let sources = workspace();
        let test = MethodIdentity::new("Sales Tests", "T1");

        let entries = CoverageResolver::new(&sources).resolve(&records, &test);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].covered_method.method_name, "MethodA");
        assert_eq!(entries[0].covered_method.object_name, "Posting");
        assert_eq!(entries[1].covered_method.method_name, "MethodB");
        assert!(entries.iter().all(|e| e.test_method == test));
    }

    #[test]
    fn test_repeated_hits_do_not_double_emit() {
        let records = vec![
            record(4, LineKind::FunctionBoundary, 1),
            record(6, LineKind::Code, 3),
            record(7, LineKind::Code, 3),
        ];
        let sources = workspace();
        let test = MethodIdentity::new("Sales Tests", "T1");

        let entries = CoverageResolver::new(&sources).resolve(&records, &test);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].covered_method.method_name, "MethodA");
    }

    #[test]
    fn test_unknown_object_is_skipped() {
        let records = vec![
            CoverageRecord::new("Codeunit", 999, 4, LineKind::FunctionBoundary, 1),
            CoverageRecord::new("Codeunit", 999, 6, LineKind::Code, 1),
        ];
        let sources = workspace();
        let test = MethodIdentity::new("Sales Tests", "T1");

        let entries = CoverageResolver::new(&sources).resolve(&records, &test);
        assert!(entries.is_empty());
    }

    #[test]
    fn test_excluded_object_never_contributes() {
        let object = SourceObject::new("Codeunit", 10, "Posting");
        let mut sources = workspace();
        sources.exclude(object);

        let records = vec![
            record(4, LineKind::FunctionBoundary, 1),
            record(6, LineKind::Code, 5),
        ];
        let test = MethodIdentity::new("Sales Tests", "T1");

        let entries = CoverageResolver::new(&sources).resolve(&records, &test);
        assert!(entries.is_empty());
    }

    #[test]
    fn test_hit_without_preceding_boundary_is_skipped() {
        let records = vec![record(6, LineKind::Code, 1)];
        let sources = workspace();
        let test = MethodIdentity::new("Sales Tests", "T1");

        let entries = CoverageResolver::new(&sources).resolve(&records, &test);
        assert!(entries.is_empty());
    }

    #[test]
    fn test_zero_line_records_never_credit() {
        let records = vec![
            record(4, LineKind::FunctionBoundary, 1),
            record(0, LineKind::Code, 7),
        ];
        let sources = workspace();
        let test = MethodIdentity::new("Sales Tests", "T1");

        let entries = CoverageResolver::new(&sources).resolve(&records, &test);
        assert!(entries.is_empty());
    }
}
