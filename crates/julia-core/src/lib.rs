//! Julia Core Library
//!
//! Escape-time rendering of Julia sets with interchangeable backends:
//! a sequential reference, a blocked parallel CPU backend and (with the
//! `gpu` feature) a wgpu compute backend. All of them implement
//! [`JuliaBackend`] and produce the same image.

pub mod backend;
pub mod config;
pub mod driver;
pub mod error;
pub mod exporters;
pub mod kernel;
pub mod models;
pub mod palette;

// GPU backend (optional, enabled with "gpu" feature)
#[cfg(feature = "gpu")]
pub mod gpu;

// Re-export commonly used types
pub use backend::{JuliaBackend, ParallelBackend, SequentialBackend};
pub use config::{load_config, ConfigHandle, JuliaConfig};
pub use driver::{default_tag, GenerationDriver, GenerationOutcome, ImageSink, Progress};
pub use error::{ConfigError, GpuError, JuliaError};
pub use exporters::PngSink;
pub use models::{Color, ExecutionStats, GenerationParameters, PixelBuffer};
pub use palette::ColorPalette;

#[cfg(feature = "gpu")]
pub use gpu::{is_gpu_available, list_adapters, GpuBackend, GpuConfig};
