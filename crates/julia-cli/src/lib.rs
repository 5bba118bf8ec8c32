//! Shared utilities for julia-cli
//!
//! Argument parsers, builders from CLI arguments to core values, and the
//! timing report and benchmark loop used by the `bench` command.

pub mod builders;
pub mod parsers;
pub mod report;
pub mod suite;

// Re-export commonly used items at the crate root for convenience
pub use builders::{apply_overrides, build_backend, BackendKind, ConfigOverrides};
pub use parsers::{parse_backend_kinds, parse_complex, parse_rgb_list, parse_runs, Run};
pub use report::{Column, ReportWriter, Row};
pub use suite::{run_suite, Failure, SuiteSummary};
