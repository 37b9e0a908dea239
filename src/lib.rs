//! testsync
//!
//! Keeps generated JavaScript/TypeScript test suites in step with their
//! sources: find callable units, remember which ones already have tests,
//! and fold newly generated suites into existing ones without duplicates.

pub mod config;
pub mod detectors;
pub mod error;
pub mod keyed;
pub mod llm;
pub mod logger;
pub mod testgen;

pub use config::Config;
pub use detectors::ast::catalog::{extract_units, extract_units_as, CallableUnit, UnitKind};
pub use detectors::ast::unitdelta::{diff_units, diff_units_as, MatchPolicy, UnitDelta};
pub use detectors::language::Dialect;
pub use error::{ParseError, Result, SyncError};
pub use testgen::cache::{FileFingerprint, FingerprintStore};
pub use testgen::merge::{merge, merge_with};
pub use testgen::suite::MergeOptions;
