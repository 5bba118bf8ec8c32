//! Builders turning CLI arguments and config into core values.

mod backend;
mod config;

pub use backend::{build_backend, BackendKind};
pub use config::{apply_overrides, ConfigOverrides};
