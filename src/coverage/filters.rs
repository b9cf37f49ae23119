//! Pure filters and percentage rollups over coverage records.
//!
//! Nothing here performs I/O or fails; degenerate inputs produce degenerate
//! results (empty lists, 0%).

use crate::coverage::types::{CoverageRecord, SourceObject};

/// Records belonging to `object` that can count toward coverage.
///
/// Keeps records with matching identity (case-insensitive kind, exact id),
/// `Code` line kind, a nonzero line number, and a nonzero hit count unless
/// `include_zero_hits` is set.
pub fn filter_by_object(
    records: &[CoverageRecord],
    object: &SourceObject,
    include_zero_hits: bool,
) -> Vec<CoverageRecord> {
    records
        .iter()
        .filter(|r| object.matches(&r.object_kind, r.object_id))
        .filter(|r| r.is_countable())
        .filter(|r| include_zero_hits || r.hit_count != 0)
        .cloned()
        .collect()
}

/// Countable records whose line number falls inside `start..=end`.
pub fn filter_by_line_range(
    records: &[CoverageRecord],
    start: u32,
    end: u32,
    include_zero_hits: bool,
) -> Vec<CoverageRecord> {
    records
        .iter()
        .filter(|r| r.is_countable())
        .filter(|r| include_zero_hits || r.hit_count != 0)
        .filter(|r| start <= r.line_number && r.line_number <= end)
        .cloned()
        .collect()
}

/// Coverage percentage, rounded half-up to a whole number.
///
/// Returns 0 when `total_lines` is 0. Uses integer arithmetic so the
/// user-visible metric rounds the same way on every platform: 62.5% reports
/// as 63.
pub fn percentage(hit_lines: usize, total_lines: usize) -> u32 {
    if total_lines == 0 {
        return 0;
    }
    let hit = hit_lines as u64;
    let total = total_lines as u64;
    ((hit * 200 + total) / (total * 2)) as u32
}
