//! WGSL shader sources embedded at compile time.

/// Container for all shader source code.
pub struct Shaders;

impl Shaders {
    /// Escape-time Julia kernel, entry point [`KERNEL_ENTRY_POINT`].
    pub const JULIA: &'static str = include_str!("julia.wgsl");
}

/// Name of the compute entry point every kernel source must define.
pub const KERNEL_ENTRY_POINT: &str = "julia_kernel";

/// Workgroup edge length; must match `@workgroup_size` in `julia.wgsl`.
pub const WORKGROUP_SIZE: u32 = 8;

/// Bit set by the kernel on every escaped pixel.
pub const ESCAPED_FLAG: u32 = 0x0100_0000;
