//! Lexical scanning of AL source text.
//!
//! The scanner never builds a syntax tree; method boundaries are recovered
//! from marker tokens (`[Test]` attributes or the declaration keywords
//! themselves) the same way the surrounding tooling's editors jump between
//! procedures. Line numbers are 1-based throughout.

use crate::coverage::types::SourceObject;

/// Line-comment token.
const LINE_COMMENT: &str = "//";
/// Block-comment open token.
const BLOCK_OPEN: &str = "/*";
/// Block-comment close token.
const BLOCK_CLOSE: &str = "*/";

/// Declaration keywords that open a method body.
const DECLARATION_KEYWORDS: &[&str] = &["procedure", "trigger"];

/// How far past a marker the scanner looks for the declaration keyword.
const DECLARATION_LOOKAHEAD: usize = 512;

/// What the scanner is looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodMarker {
    /// Methods preceded by an attribute token, e.g. `[Test]`
    Attribute(String),
    /// Any declared procedure or trigger
    AnyMethod,
}

impl MethodMarker {
    /// Convenience constructor for attribute markers.
    pub fn attribute(token: impl Into<String>) -> Self {
        Self::Attribute(token.into())
    }
}

/// One scanned method boundary.
///
/// `start_line` is the line of the declared name; `end_line` is the line of
/// the parameter list's closing parenthesis, not the body's end. A body
/// extends to the next range's start, or to end-of-file for the last range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRange {
    /// Declared method name, quotes stripped
    pub name: String,
    /// 1-based line of the name token
    pub start_line: u32,
    /// 1-based line of the parameter list's closing parenthesis
    pub end_line: u32,
}

/// Scan `source` for method boundaries matching `marker`.
///
/// The returned iterator is lazy and finite; calling this again restarts the
/// scan from the top of the file.
pub fn method_ranges<'a>(source: &'a str, marker: &MethodMarker) -> MethodRanges<'a> {
    MethodRanges {
        source,
        marker: marker.clone(),
        pos: 0,
    }
}

/// Lazy iterator over [`MethodRange`]s in source order.
pub struct MethodRanges<'a> {
    source: &'a str,
    marker: MethodMarker,
    pos: usize,
}

impl<'a> Iterator for MethodRanges<'a> {
    type Item = MethodRange;

    fn next(&mut self) -> Option<MethodRange> {
        loop {
            let (marker_at, resume_at) = self.next_marker()?;
            self.pos = resume_at;

            if in_comment(self.source, marker_at) {
                continue;
            }

            let declaration_at = match self.marker {
                // The marker itself is the declaration keyword.
                MethodMarker::AnyMethod => Some(resume_at),
                MethodMarker::Attribute(_) => {
                    find_declaration_keyword(self.source, resume_at, DECLARATION_LOOKAHEAD)
                }
            };

            // No declaration within the window: skip the occurrence silently.
            let Some(after_keyword) = declaration_at else {
                continue;
            };

            if let Some(range) = extract_range(self.source, after_keyword) {
                return Some(range);
            }
        }
    }
}

impl<'a> MethodRanges<'a> {
    /// Find the next marker occurrence at or after `self.pos`.
    ///
    /// Returns the occurrence offset and the offset scanning resumes from.
    fn next_marker(&self) -> Option<(usize, usize)> {
        match &self.marker {
            MethodMarker::Attribute(token) => {
                let rel = self.source[self.pos..].find(token.as_str())?;
                let at = self.pos + rel;
                Some((at, at + token.len()))
            }
            MethodMarker::AnyMethod => {
                next_keyword_occurrence(self.source, self.pos, DECLARATION_KEYWORDS)
            }
        }
    }
}

/// Find the nearest whole-word occurrence of any keyword at or after `from`.
fn next_keyword_occurrence(
    source: &str,
    from: usize,
    keywords: &[&str],
) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    for keyword in keywords {
        let mut search = from;
        while let Some(rel) = source[search..].find(keyword) {
            let at = search + rel;
            let end = at + keyword.len();
            if is_word_boundary(source, at, end) {
                if best.map_or(true, |(b, _)| at < b) {
                    best = Some((at, end));
                }
                break;
            }
            search = at + 1;
        }
    }
    best
}

/// Find the declaration keyword within `window` chars after a marker.
///
/// Returns the offset just past the keyword.
fn find_declaration_keyword(source: &str, from: usize, window: usize) -> Option<usize> {
    let limit = source.len().min(from.saturating_add(window));
    let (at, end) = next_keyword_occurrence(source, from, DECLARATION_KEYWORDS)?;
    if at < limit {
        Some(end)
    } else {
        None
    }
}

/// Whole-word check: the keyword must not continue an identifier on either side.
fn is_word_boundary(source: &str, start: usize, end: usize) -> bool {
    let before_ok = start == 0
        || source[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric() && c != '_');
    let after_ok = source[end..]
        .chars()
        .next()
        .map_or(false, |c| c.is_whitespace() || c == '"');
    before_ok && after_ok
}

/// Extract the declared name and parameter-list extent after a keyword.
fn extract_range(source: &str, after_keyword: usize) -> Option<MethodRange> {
    let rest = &source[after_keyword..];
    let name_rel = rest.find(|c: char| !c.is_whitespace())?;
    let name_start = after_keyword + name_rel;

    let (name, after_name) = if source[name_start..].starts_with('"') {
        let close_rel = source[name_start + 1..].find('"')?;
        let name = &source[name_start + 1..name_start + 1 + close_rel];
        (name.to_string(), name_start + close_rel + 2)
    } else {
        let open_rel = source[name_start..].find('(')?;
        let raw = &source[name_start..name_start + open_rel];
        // A name cannot straddle lines; that means the next `(` belongs to
        // some later declaration.
        if raw.contains('\n') {
            return None;
        }
        (raw.trim().to_string(), name_start + open_rel)
    };

    if name.is_empty() {
        return None;
    }

    // Only same-line whitespace may separate the name from its parameter
    // list; anything else means the `(` belongs elsewhere.
    let open_rel = source[after_name..].find('(')?;
    let open_at = after_name + open_rel;
    if source[after_name..open_at]
        .chars()
        .any(|c| c == '\n' || !c.is_whitespace())
    {
        return None;
    }
    let close_at = matching_paren(source, open_at)?;

    Some(MethodRange {
        name,
        start_line: line_of(source, name_start),
        end_line: line_of(source, close_at),
    })
}

/// 1-based line number of the character at `offset`.
fn line_of(source: &str, offset: usize) -> u32 {
    source[..offset].bytes().filter(|&b| b == b'\n').count() as u32 + 1
}

/// Offset of the parenthesis closing the one at `open_at`.
fn matching_paren(source: &str, open_at: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (rel, c) in source[open_at..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open_at + rel);
                }
            }
            _ => {}
        }
    }
    None
}

/// Whether the token at `offset` sits inside a comment.
///
/// A token is suppressed when its line starts (ignoring leading whitespace)
/// with `//`, or when the nearest `/*` before it has no matching `*/` in
/// between. Only the nearest opener counts, so a closed-and-reopened region
/// never suppresses later real markers.
pub fn in_comment(source: &str, offset: usize) -> bool {
    if line_commented(source, offset) {
        return true;
    }

    // An opener sitting on a line-commented line is text, not comment
    // structure; keep scanning backward past it.
    let mut search_end = offset;
    while let Some(open_at) = source[..search_end].rfind(BLOCK_OPEN) {
        if line_commented(source, open_at) {
            search_end = open_at;
            continue;
        }
        return !source[open_at..offset].contains(BLOCK_CLOSE);
    }
    false
}

/// Whether the line holding `offset` starts (ignoring leading whitespace)
/// with the line-comment token before `offset`.
fn line_commented(source: &str, offset: usize) -> bool {
    let line_start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
    source[line_start..offset]
        .trim_start()
        .starts_with(LINE_COMMENT)
}

/// Find the range whose body contains `line`.
///
/// Ranges are in file order and a body runs to the next range's start, so
/// this is the last range starting at or before the line. The final range is
/// unbounded.
pub fn enclosing_method(ranges: &[MethodRange], line: u32) -> Option<&MethodRange> {
    let idx = ranges.partition_point(|r| r.start_line <= line);
    idx.checked_sub(1).map(|i| &ranges[i])
}

/// Parse the object declaration line, e.g. `codeunit 50100 "Sales Tests"`.
///
/// Returns `None` when the text has no recognizable header; callers treat
/// that as "not an AL object file".
pub fn parse_object_header(source: &str) -> Option<SourceObject> {
    for line in source.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(LINE_COMMENT) {
            continue;
        }

        let mut parts = trimmed.splitn(3, char::is_whitespace);
        let kind = parts.next()?;
        if !kind.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        let id = parts.next()?.parse::<u32>().ok()?;
        let name = parts
            .next()
            .map(|rest| rest.trim().trim_matches('"').to_string())
            .unwrap_or_default();
        return Some(SourceObject::new(kind.to_ascii_lowercase(), id, name));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_ATTRIBUTE: &str = "[Test]";

    fn test_marker() -> MethodMarker {
        MethodMarker::attribute(TEST_ATTRIBUTE)
    }

    #[test]
    fn test_two_marked_methods_in_order() {
        let source =
            "codeunit 1 \"X\"\n[Test]\nprocedure Foo()\nbegin\nend;\n[Test]\nprocedure Bar()\nbegin\nend;\n";
        let ranges: Vec<MethodRange> = method_ranges(source, &test_marker()).collect();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].name, "Foo");
        assert_eq!(ranges[1].name, "Bar");
        assert_eq!(ranges[0].start_line, 3);
        assert_eq!(ranges[0].end_line, 3);
        assert_eq!(ranges[1].start_line, 7);
    }

    #[test]
    fn test_line_commented_duplicate_is_dropped() {
        let source = "[Test]\nprocedure Foo()\nbegin\nend;\n// [Test]\n// procedure Foo()\n";
        let ranges: Vec<MethodRange> = method_ranges(source, &test_marker()).collect();
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].name, "Foo");
    }

    #[test]
    fn test_block_commented_marker_is_dropped() {
        let source = "/*\n[Test]\nprocedure Hidden()\n*/\n[Test]\nprocedure Visible()\nbegin\nend;\n";
        let ranges: Vec<MethodRange> = method_ranges(source, &test_marker()).collect();
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].name, "Visible");
    }

    #[test]
    fn test_closed_block_comment_does_not_suppress_later_markers() {
        // The nearest opener before the marker is closed; an earlier region
        // must not bleed forward.
        let source = "/* notes */ var\n[Test]\nprocedure Real()\nbegin\nend;\n";
        let ranges: Vec<MethodRange> = method_ranges(source, &test_marker()).collect();
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].name, "Real");
    }

    #[test]
    fn test_block_opener_on_commented_line_is_text() {
        // The /* inside a line comment opens nothing; later markers are real.
        let source = "// see /* note\n[Test]\nprocedure Foo()\nbegin\nend;\n";
        let ranges: Vec<MethodRange> = method_ranges(source, &test_marker()).collect();
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].name, "Foo");
    }

    #[test]
    fn test_marker_without_declaration_is_skipped() {
        let filler = "x\n".repeat(400);
        let source = format!("[Test]\n{filler}[Test]\nprocedure Found()\nbegin\nend;\n");
        let ranges: Vec<MethodRange> = method_ranges(&source, &test_marker()).collect();
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].name, "Found");
    }

    #[test]
    fn test_any_method_scan_includes_triggers() {
        let source = "codeunit 2 \"Y\"\ntrigger OnRun()\nbegin\nend;\nlocal procedure Helper(A: Integer)\nbegin\nend;\n";
        let ranges: Vec<MethodRange> = method_ranges(source, &MethodMarker::AnyMethod).collect();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].name, "OnRun");
        assert_eq!(ranges[0].start_line, 2);
        assert_eq!(ranges[1].name, "Helper");
        assert_eq!(ranges[1].start_line, 5);
    }

    #[test]
    fn test_quoted_method_name() {
        let source = "[Test]\nprocedure \"Post Invoice\"()\nbegin\nend;\n";
        let ranges: Vec<MethodRange> = method_ranges(source, &test_marker()).collect();
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].name, "Post Invoice");
    }

    #[test]
    fn test_multi_line_parameter_list() {
        let source = "[Test]\nprocedure Wide(\n    A: Integer;\n    B: Integer)\nbegin\nend;\n";
        let ranges: Vec<MethodRange> = method_ranges(source, &test_marker()).collect();
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].start_line, 2);
        assert_eq!(ranges[0].end_line, 4);
    }

    #[test]
    fn test_scan_is_restartable() {
        let source = "[Test]\nprocedure Foo()\nbegin\nend;\n";
        let first: Vec<MethodRange> = method_ranges(source, &test_marker()).collect();
        let second: Vec<MethodRange> = method_ranges(source, &test_marker()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_enclosing_method_lookup() {
        let ranges = vec![
            MethodRange {
                name: "MethodA".to_string(),
                start_line: 5,
                end_line: 5,
            },
            MethodRange {
                name: "MethodB".to_string(),
                start_line: 10,
                end_line: 10,
            },
        ];
        assert!(enclosing_method(&ranges, 4).is_none());
        assert_eq!(enclosing_method(&ranges, 5).unwrap().name, "MethodA");
        assert_eq!(enclosing_method(&ranges, 9).unwrap().name, "MethodA");
        assert_eq!(enclosing_method(&ranges, 10).unwrap().name, "MethodB");
        assert_eq!(enclosing_method(&ranges, 999).unwrap().name, "MethodB");
    }

    #[test]
    fn test_parse_object_header() {
        let object = parse_object_header("// header comment\ncodeunit 50100 \"Sales Tests\"\n{\n}")
            .unwrap();
        assert_eq!(object.kind, "codeunit");
        assert_eq!(object.id, 50100);
        assert_eq!(object.name, "Sales Tests");

        assert!(parse_object_header("not al at all").is_none());
        assert!(parse_object_header("").is_none());
    }
}
