//! Error types shared by every backend.
//!
//! Configuration problems are caught before any backend work begins,
//! device problems are split into acquisition failures (fatal to a GPU
//! backend instance) and per-call failures (local to one `compute`).

use std::fmt;

/// Invalid generation parameters or configuration files.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Grid side length must be at least one pixel
    InvalidSize(u32),
    /// Palette must hold at least one color
    EmptyPalette,
    /// Escape radius must be finite and strictly positive
    InvalidLimit(f32),
    /// The complex constant has a NaN or infinite component
    NonFiniteConstant { re: f32, im: f32 },
    /// Parallel block size must be at least one pixel
    InvalidBlockSize(u32),
    /// Worker thread count must be at least one when given
    InvalidThreadCount(usize),
    /// A config file could not be read or parsed
    Load(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidSize(size) => {
                write!(f, "Grid size must be positive, got {}", size)
            }
            ConfigError::EmptyPalette => write!(f, "Palette must contain at least one color"),
            ConfigError::InvalidLimit(limit) => {
                write!(f, "Escape limit must be finite and positive, got {}", limit)
            }
            ConfigError::NonFiniteConstant { re, im } => {
                write!(f, "Constant C must be finite, got ({}, {})", re, im)
            }
            ConfigError::InvalidBlockSize(size) => {
                write!(f, "Parallel block size must be positive, got {}", size)
            }
            ConfigError::InvalidThreadCount(n) => {
                write!(f, "Thread count must be positive, got {}", n)
            }
            ConfigError::Load(e) => write!(f, "Failed to load config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors raised by the compute device, either while building the
/// backend or during a single invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum GpuError {
    /// No adapter matched the platform selector
    NoAdapter(Option<String>),
    /// Failed to request the logical device and queue
    DeviceRequest(String),
    /// Kernel source could not be read
    KernelSource(String),
    /// Kernel source failed to compile
    ShaderCompilation(String),
    /// Kernel entry point / pipeline could not be created
    PipelineError(String),
    /// Device buffer allocation failed
    BufferError(String),
    /// Kernel arguments could not be bound
    Binding(String),
    /// Enqueueing or running the kernel failed
    Dispatch(String),
    /// Copying results back to the host failed
    Readback(String),
    /// The device context is gone and cannot be used again
    DeviceLost(String),
}

impl GpuError {
    /// True when the failure invalidates the whole device context rather
    /// than a single invocation.
    pub fn is_context_level(&self) -> bool {
        matches!(self, GpuError::DeviceLost(_))
    }
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::NoAdapter(None) => write!(f, "No suitable GPU adapter found"),
            GpuError::NoAdapter(Some(selector)) => {
                write!(f, "No GPU adapter matches platform '{}'", selector)
            }
            GpuError::DeviceRequest(e) => write!(f, "Failed to request GPU device: {}", e),
            GpuError::KernelSource(e) => write!(f, "Failed to read kernel source: {}", e),
            GpuError::ShaderCompilation(e) => write!(f, "Shader compilation failed: {}", e),
            GpuError::PipelineError(e) => write!(f, "Pipeline creation failed: {}", e),
            GpuError::BufferError(e) => write!(f, "Buffer operation failed: {}", e),
            GpuError::Binding(e) => write!(f, "Kernel argument binding failed: {}", e),
            GpuError::Dispatch(e) => write!(f, "Kernel dispatch failed: {}", e),
            GpuError::Readback(e) => write!(f, "Result readback failed: {}", e),
            GpuError::DeviceLost(e) => write!(f, "GPU device lost: {}", e),
        }
    }
}

impl std::error::Error for GpuError {}

/// Error returned by [`JuliaBackend::compute`](crate::backend::JuliaBackend::compute)
/// and the generation driver.
#[derive(Debug, Clone, PartialEq)]
pub enum JuliaError {
    /// Parameters were rejected before any work started
    Config(ConfigError),
    /// The output buffer cannot hold `size * size` cells
    CapacityMismatch { required: usize, available: usize },
    /// The backend failed to initialise and rejects every call
    BackendUnavailable(GpuError),
    /// A device call failed during one invocation
    Device(GpuError),
    /// The worker pool could not be built
    ThreadPool(String),
    /// The persistence collaborator refused the image
    Persistence(String),
}

impl fmt::Display for JuliaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JuliaError::Config(e) => write!(f, "Invalid configuration: {}", e),
            JuliaError::CapacityMismatch {
                required,
                available,
            } => write!(
                f,
                "Output buffer too small: need {} cells, have {}",
                required, available
            ),
            JuliaError::BackendUnavailable(e) => {
                write!(f, "Backend unusable: {}", e)
            }
            JuliaError::Device(e) => write!(f, "Device call failed: {}", e),
            JuliaError::ThreadPool(e) => write!(f, "Failed to build thread pool: {}", e),
            JuliaError::Persistence(e) => write!(f, "Failed to persist image: {}", e),
        }
    }
}

impl std::error::Error for JuliaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            JuliaError::Config(e) => Some(e),
            JuliaError::BackendUnavailable(e) | JuliaError::Device(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for JuliaError {
    fn from(e: ConfigError) -> Self {
        JuliaError::Config(e)
    }
}

impl From<GpuError> for JuliaError {
    fn from(e: GpuError) -> Self {
        JuliaError::Device(e)
    }
}
