//! The seam between [`GpuBackend`](super::GpuBackend) and a concrete device.
//!
//! [`ComputeDevice`] names the handful of device calls one escape-time
//! invocation needs. Resources are plain owned values whose `Drop` releases
//! them, so a `?` anywhere in the backend still frees everything acquired
//! before it.

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use super::shaders::Shaders;
use crate::error::GpuError;

/// How a transient input buffer will be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferRole {
    /// Read-only storage array (the palette)
    Storage,
    /// Small uniform block (the parameters)
    Uniform,
}

/// Buffers bound to one kernel dispatch.
pub struct KernelBindings<'a, B> {
    pub output: &'a B,
    pub palette: &'a B,
    pub params: &'a B,
}

/// A device able to run the escape-time kernel.
///
/// Implementations own their context and queue; dropping the device
/// releases them. Kernels are dropped by the caller before the device.
pub trait ComputeDevice: Send + 'static {
    type Buffer: Send;
    type Kernel: Send;

    /// Adapter description for logs and the `devices` listing.
    fn describe(&self) -> String;

    /// Compile `source` and resolve the kernel entry point.
    fn compile_kernel(&self, source: &str) -> Result<Self::Kernel, GpuError>;

    /// Zero-filled, device-writable buffer of `cells` 32-bit words.
    fn create_output_buffer(&self, cells: usize) -> Result<Self::Buffer, GpuError>;

    /// Read-only buffer initialized from `contents`.
    fn create_input_buffer(
        &self,
        label: &'static str,
        contents: &[u8],
        role: BufferRole,
    ) -> Result<Self::Buffer, GpuError>;

    /// Run the kernel over a `grid[0] x grid[1]` index space and block until
    /// it completes. Returns the device-measured kernel duration when the
    /// device supports timestamps.
    fn dispatch(
        &self,
        kernel: &Self::Kernel,
        bindings: KernelBindings<'_, Self::Buffer>,
        grid: [u32; 2],
    ) -> Result<Option<Duration>, GpuError>;

    /// Blocking copy of `out.len()` words from `buffer` into host memory.
    fn read_output(&self, buffer: &Self::Buffer, out: &mut [u32]) -> Result<(), GpuError>;

    /// True once the device has reported itself lost.
    fn is_lost(&self) -> bool;
}

/// Where the kernel source comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KernelSource {
    /// The WGSL compiled into the crate
    #[default]
    Embedded,
    /// A WGSL file read at backend construction
    File(PathBuf),
}

impl KernelSource {
    pub fn load(&self) -> Result<Cow<'static, str>, GpuError> {
        match self {
            KernelSource::Embedded => Ok(Cow::Borrowed(Shaders::JULIA)),
            KernelSource::File(path) => std::fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|e| GpuError::KernelSource(format!("{}: {}", path.display(), e))),
        }
    }
}

impl fmt::Display for KernelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelSource::Embedded => write!(f, "embedded"),
            KernelSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}
