//! Parsing functions for CLI arguments.

mod grid;
mod values;

pub use grid::{parse_runs, Run};
pub use values::{parse_backend_kinds, parse_complex, parse_rgb_list};
