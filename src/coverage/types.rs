//! Data model shared across coverage ingestion, resolution, and persistence.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Identity of one compilable AL unit (codeunit, table, page, ...).
///
/// Two objects are equal iff their kind matches case-insensitively and their
/// id matches exactly. The name is display-only and never compared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceObject {
    /// Object kind, e.g. `codeunit` or `table`
    pub kind: String,
    /// Numeric object id
    pub id: u32,
    /// Declared object name
    pub name: String,
}

impl SourceObject {
    /// Create a new object identity.
    pub fn new(kind: impl Into<String>, id: u32, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id,
            name: name.into(),
        }
    }

    /// Identity check against a raw (kind, id) pair from coverage data.
    pub fn matches(&self, kind: &str, id: u32) -> bool {
        self.id == id && self.kind.eq_ignore_ascii_case(kind)
    }
}

impl PartialEq for SourceObject {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.kind, other.id)
    }
}

impl Eq for SourceObject {}

impl Hash for SourceObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.kind.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
        self.id.hash(state);
    }
}

impl fmt::Display for SourceObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} \"{}\"", self.kind, self.id, self.name)
    }
}

/// Classification of one line-level coverage record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// An executable code line
    Code,
    /// A record marking entry into a trigger/procedure body
    FunctionBoundary,
    /// Any other record kind (object headers, empty lines)
    Other,
}

impl LineKind {
    /// Wire name used when serializing.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Code => "Code",
            Self::FunctionBoundary => "Function",
            Self::Other => "Other",
        }
    }

    /// Map a coverage-tool line type onto the closed kind set.
    ///
    /// Unknown kinds collapse to [`LineKind::Other`] so they never count
    /// toward coverage totals.
    pub fn from_wire(value: &str) -> Self {
        if value.eq_ignore_ascii_case("code") {
            Self::Code
        } else if value.eq_ignore_ascii_case("function")
            || value.eq_ignore_ascii_case("trigger/function")
            || value.eq_ignore_ascii_case("triggerfunction")
        {
            Self::FunctionBoundary
        } else {
            Self::Other
        }
    }
}

impl Serialize for LineKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LineKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&value))
    }
}

/// One line-level coverage sample from a test run.
///
/// Field names follow the coverage tool's output so a run's raw data file
/// deserializes directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageRecord {
    /// Kind of the object the line belongs to
    #[serde(rename = "ObjectType")]
    pub object_kind: String,
    /// Id of the object the line belongs to
    #[serde(rename = "ObjectID")]
    pub object_id: u32,
    /// 1-based source line number; 0 means "no line" and never counts
    #[serde(rename = "LineNo")]
    pub line_number: u32,
    /// Record classification
    #[serde(rename = "LineType")]
    pub line_kind: LineKind,
    /// Number of times the line executed
    #[serde(rename = "NoOfHits", default)]
    pub hit_count: u32,
}

impl CoverageRecord {
    /// Create a record; mainly useful in tests and embedders.
    pub fn new(
        object_kind: impl Into<String>,
        object_id: u32,
        line_number: u32,
        line_kind: LineKind,
        hit_count: u32,
    ) -> Self {
        Self {
            object_kind: object_kind.into(),
            object_id,
            line_number,
            line_kind,
            hit_count,
        }
    }

    /// Whether this record can count toward coverage totals at all.
    pub fn is_countable(&self) -> bool {
        self.line_kind == LineKind::Code && self.line_number != 0
    }

    /// Whether this record belongs to the same object as `other`.
    pub fn same_object(&self, other: &CoverageRecord) -> bool {
        self.object_id == other.object_id
            && self.object_kind.eq_ignore_ascii_case(&other.object_kind)
    }
}

/// Identifies one method for index entries and queries.
///
/// Equality ignores the optional `object` field, which exists only so
/// presentation collaborators can show richer labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodIdentity {
    /// Name of the object declaring the method
    #[serde(rename = "objectName")]
    pub object_name: String,
    /// Declared method name
    #[serde(rename = "methodName")]
    pub method_name: String,
    /// Optional resolved object, display-only
    #[serde(rename = "object", default, skip_serializing_if = "Option::is_none")]
    pub object: Option<SourceObject>,
}

impl MethodIdentity {
    /// Create an identity without a resolved object.
    pub fn new(object_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            object_name: object_name.into(),
            method_name: method_name.into(),
            object: None,
        }
    }

    /// Create an identity carrying the resolved object for display.
    pub fn with_object(
        object_name: impl Into<String>,
        method_name: impl Into<String>,
        object: SourceObject,
    ) -> Self {
        Self {
            object_name: object_name.into(),
            method_name: method_name.into(),
            object: Some(object),
        }
    }
}

impl PartialEq for MethodIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.object_name == other.object_name && self.method_name == other.method_name
    }
}

impl Eq for MethodIdentity {}

impl Hash for MethodIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.object_name.hash(state);
        self.method_name.hash(state);
    }
}

impl fmt::Display for MethodIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.object_name, self.method_name)
    }
}

/// One persisted fact: `test_method` exercised `covered_method`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageIndexEntry {
    /// The method the test exercised
    #[serde(rename = "coveredMethod")]
    pub covered_method: MethodIdentity,
    /// The test method that ran
    #[serde(rename = "testMethod")]
    pub test_method: MethodIdentity,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_object_identity_is_case_insensitive_on_kind() {
        let a = SourceObject::new("Codeunit", 50100, "Sales Tests");
        let b = SourceObject::new("codeunit", 50100, "renamed");
        let c = SourceObject::new("table", 50100, "Sales Tests");

        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_line_kind_wire_aliases() {
        assert_eq!(LineKind::from_wire("Code"), LineKind::Code);
        assert_eq!(LineKind::from_wire("Trigger/Function"), LineKind::FunctionBoundary);
        assert_eq!(LineKind::from_wire("TriggerFunction"), LineKind::FunctionBoundary);
        assert_eq!(LineKind::from_wire("Object"), LineKind::Other);
        assert_eq!(LineKind::from_wire("Empty"), LineKind::Other);
    }

    #[test]
    fn test_record_deserializes_from_tool_output() {
        let raw = r#"{"ObjectType":"Codeunit","ObjectID":50100,"LineNo":12,"LineType":"Code","NoOfHits":3}"#;
        let record: CoverageRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.object_id, 50100);
        assert_eq!(record.line_kind, LineKind::Code);
        assert_eq!(record.hit_count, 3);
        assert!(record.is_countable());
    }

    #[test]
    fn test_missing_hits_defaults_to_zero() {
        let raw = r#"{"ObjectType":"Codeunit","ObjectID":1,"LineNo":0,"LineType":"Object"}"#;
        let record: CoverageRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.hit_count, 0);
        assert!(!record.is_countable());
    }

    #[test]
    fn test_method_identity_ignores_object_field() {
        let plain = MethodIdentity::new("Sales Tests", "TestPost");
        let display = MethodIdentity::with_object(
            "Sales Tests",
            "TestPost",
            SourceObject::new("codeunit", 50100, "Sales Tests"),
        );
        assert_eq!(plain, display);
    }
}
