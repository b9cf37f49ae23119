//! # Vordr-RS: Coverage-to-Test Correlation Engine
//!
//! Vordr correlates line-level code-coverage data from AL unit-test runs with
//! the source methods those lines belong to, and maintains a persisted reverse
//! index from covered method to the tests that exercise it. This library
//! provides:
//!
//! - **Method Range Scanning**: lexical extraction of `[Test]`-marked and
//!   plain method boundaries from AL source text
//! - **Coverage Filtering**: pure filters and percentage rollups over raw
//!   line-level coverage records
//! - **Coverage-to-Method Resolution**: attribution of hit lines to their
//!   enclosing methods via function-boundary records
//! - **Test Coverage Index**: atomic merge-on-rerun persistence answering
//!   "which tests cover method M?"
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vordr_rs::{CoverageConfig, CoverageEngine, MethodIdentity};
//! use vordr_rs::io::workspace::WorkspaceSources;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CoverageConfig::default();
//!     let sources = WorkspaceSources::scan(std::path::Path::new("."), &config)?;
//!     let engine = CoverageEngine::open(std::path::Path::new("."), config, sources)?;
//!
//!     let test = MethodIdentity::new("MyTests", "TestPostInvoice");
//!     let recorded = engine.build_test_coverage_from_test_item(&test)?;
//!     println!("recorded {recorded} covered methods");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// Core configuration and error types
pub mod core {
    //! Core configuration and error handling.

    pub mod config;
    pub mod errors;
}

// AL source-text scanning
pub mod lang {
    //! Language-level source scanning for AL.

    pub mod al;
}

// Coverage records, filters, and resolution
pub mod coverage {
    //! Coverage record ingestion, filtering, and method attribution.

    pub mod filters;
    pub mod resolver;
    pub mod sources;
    pub mod store;
    pub mod types;
}

// Persistence and workspace adapters
pub mod io {
    //! Index persistence and workspace source enumeration.

    pub mod persistence;
    pub mod workspace;
}

// Public engine interface
pub mod api {
    //! High-level engine and query operations.

    pub mod engine;
}

// Re-export primary types for convenience
pub use api::engine::{CoverageEngine, TestRunner};
pub use core::config::CoverageConfig;
pub use core::errors::{Result, VordrError};
pub use coverage::sources::{InMemorySources, SourceProvider};
pub use coverage::types::{
    CoverageIndexEntry, CoverageRecord, LineKind, MethodIdentity, SourceObject,
};
pub use io::persistence::TestCoverageIndex;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
