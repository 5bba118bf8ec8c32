//! Command implementations for the julia CLI.

mod bench;
mod devices;
mod render;

// Re-export all command functions
pub use bench::cmd_bench;
pub use devices::cmd_devices;
pub use render::cmd_render;
