//! GPU backend on wgpu (WebGPU): Vulkan, Metal, DX12 or GL.
//!
//! Enabled by the `gpu` feature (on by default):
//!
//! ```toml
//! [dependencies]
//! julia-core = { version = "0.1", features = ["gpu"] }
//! ```
//!
//! [`GpuBackend`] is generic over [`ComputeDevice`] so the resource
//! lifecycle can be exercised without hardware.

mod backend;
mod buffers;
mod context;
mod device;
mod shaders;

pub use backend::{GpuBackend, GpuConfig};
pub use buffers::JuliaParams;
pub use context::{vendor_name, AdapterSummary, DeviceSelector, WgpuDevice, WgpuKernel};
pub use device::{BufferRole, ComputeDevice, KernelBindings, KernelSource};
pub use shaders::{Shaders, ESCAPED_FLAG, KERNEL_ENTRY_POINT, WORKGROUP_SIZE};

/// Check if any GPU adapter is present on this system.
pub fn is_gpu_available() -> bool {
    context::is_available()
}

/// Describe every adapter visible on this host.
pub fn list_adapters() -> Vec<AdapterSummary> {
    context::list_adapters()
}

#[cfg(test)]
mod mock;
