//! Configuration for coverage data discovery and attribution.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, VordrError};

/// Configuration consumed by the correlation engine.
///
/// Only the fields the engine reads are modeled; everything else about a
/// workspace stays with the surrounding tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageConfig {
    /// Specific coverage data file (overrides discovery)
    pub coverage_file: Option<PathBuf>,

    /// Search paths for coverage data, relative to the workspace root
    #[serde(default = "default_search_paths")]
    pub search_paths: Vec<String>,

    /// File patterns to search for
    #[serde(default = "default_file_patterns")]
    pub file_patterns: Vec<String>,

    /// Globs naming source files excluded from coverage attribution
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Attribute token marking test methods
    #[serde(default = "default_test_attribute")]
    pub test_attribute: String,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            coverage_file: None,
            search_paths: default_search_paths(),
            file_patterns: default_file_patterns(),
            exclude_patterns: Vec::new(),
            test_attribute: default_test_attribute(),
        }
    }
}

impl CoverageConfig {
    /// Load configuration from a YAML file.
    ///
    /// An absent file yields the defaults; the engine treats configuration
    /// the same way it treats coverage data, where absence is not an error.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| VordrError::io(format!("Failed to read config {}", path.display()), e))?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field contents.
    pub fn validate(&self) -> Result<()> {
        if self.coverage_file.is_none() && self.file_patterns.is_empty() {
            return Err(VordrError::config_field(
                "no coverage file and no file patterns to discover one",
                "file_patterns",
            ));
        }
        if self.test_attribute.trim().is_empty() {
            return Err(VordrError::config_field(
                "test attribute token must be non-empty",
                "test_attribute",
            ));
        }
        // Compile exclusion globs up front so bad patterns fail loudly here
        // instead of silently matching nothing during resolution.
        self.exclusion_set()?;
        Ok(())
    }

    /// Compile the exclusion globs into a matcher.
    pub fn exclusion_set(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude_patterns {
            let glob = Glob::new(pattern).map_err(|e| {
                VordrError::config_field(
                    format!("invalid exclude pattern '{pattern}': {e}"),
                    "exclude_patterns",
                )
            })?;
            builder.add(glob);
        }
        builder.build().map_err(|e| {
            VordrError::config_field(format!("failed to build exclusion set: {e}"), "exclude_patterns")
        })
    }
}

fn default_search_paths() -> Vec<String> {
    vec![
        "./".to_string(),
        "./.vordr/".to_string(),
        "./test-results/".to_string(),
        "./.altestrunner/".to_string(),
    ]
}

fn default_file_patterns() -> Vec<String> {
    vec![
        "codeCoverage.json".to_string(),
        "**/codeCoverage.json".to_string(),
    ]
}

fn default_test_attribute() -> String {
    "[Test]".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = CoverageConfig::default();
        config.validate().unwrap();
        assert_eq!(config.test_attribute, "[Test]");
        assert!(config.file_patterns.iter().any(|p| p.contains("codeCoverage")));
    }

    #[test]
    fn test_missing_config_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config =
            CoverageConfig::from_yaml_file(&temp_dir.path().join("vordr.yml")).unwrap();
        assert!(config.coverage_file.is_none());
    }

    #[test]
    fn test_yaml_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("vordr.yml");
        fs::write(
            &path,
            "coverage_file: .altestrunner/codeCoverage.json\nexclude_patterns:\n  - \"**/Legacy*.al\"\n",
        )
        .unwrap();

        let config = CoverageConfig::from_yaml_file(&path).unwrap();
        assert_eq!(
            config.coverage_file.as_deref(),
            Some(Path::new(".altestrunner/codeCoverage.json"))
        );
        let set = config.exclusion_set().unwrap();
        assert!(set.is_match("src/LegacyHelpers.al"));
        assert!(!set.is_match("src/Customer.al"));
    }

    #[test]
    fn test_invalid_exclude_pattern_rejected() {
        let config = CoverageConfig {
            exclude_patterns: vec!["[".to_string()],
            ..CoverageConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(VordrError::Config { .. })
        ));
    }

    #[test]
    fn test_empty_discovery_inputs_rejected() {
        let config = CoverageConfig {
            file_patterns: Vec::new(),
            ..CoverageConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
