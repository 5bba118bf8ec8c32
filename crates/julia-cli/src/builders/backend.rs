//! Backend construction from a [`BackendKind`] and the loaded config.

use std::fmt;
use std::str::FromStr;

use julia_core::backend::{JuliaBackend, ParallelBackend, SequentialBackend};
use julia_core::config::JuliaConfig;

/// Backends selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Sequential,
    Parallel,
    Gpu,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "sequential" | "seq" => Ok(BackendKind::Sequential),
            "parallel" | "par" | "cpu" => Ok(BackendKind::Parallel),
            "gpu" => Ok(BackendKind::Gpu),
            other => Err(format!(
                "Unknown backend '{}' (expected sequential, parallel or gpu)",
                other
            )),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Sequential => write!(f, "sequential"),
            BackendKind::Parallel => write!(f, "parallel"),
            BackendKind::Gpu => write!(f, "gpu"),
        }
    }
}

/// Build a ready-to-use backend.
///
/// A GPU backend that failed to initialise is reported here rather than on
/// its first `compute`.
pub fn build_backend(
    kind: BackendKind,
    config: &JuliaConfig,
) -> Result<Box<dyn JuliaBackend>, String> {
    match kind {
        BackendKind::Sequential => Ok(Box::new(SequentialBackend::new())),
        BackendKind::Parallel => {
            let settings = &config.parallel;
            let backend = match settings.threads {
                Some(threads) => ParallelBackend::with_threads(settings.block_size, threads),
                None => ParallelBackend::new(settings.block_size),
            }
            .map_err(|e| e.to_string())?;
            Ok(Box::new(backend))
        }
        BackendKind::Gpu => build_gpu_backend(config),
    }
}

#[cfg(feature = "gpu")]
fn build_gpu_backend(config: &JuliaConfig) -> Result<Box<dyn JuliaBackend>, String> {
    use julia_core::gpu::{GpuBackend, GpuConfig, KernelSource};

    let kernel = config
        .gpu
        .kernel
        .clone()
        .map_or(KernelSource::Embedded, KernelSource::File);
    let gpu_config = GpuConfig::new(config.gpu.platform.clone()).with_kernel(kernel);
    let backend = GpuBackend::new(&gpu_config);
    if let Some(cause) = backend.failure() {
        return Err(format!("GPU backend unavailable: {}", cause));
    }
    if let Some(device) = backend.device_description() {
        log::info!("Using GPU {}", device);
    }
    Ok(Box::new(backend))
}

#[cfg(not(feature = "gpu"))]
fn build_gpu_backend(_config: &JuliaConfig) -> Result<Box<dyn JuliaBackend>, String> {
    Err("This build has no GPU support (rebuild with the `gpu` feature)".to_string())
}
