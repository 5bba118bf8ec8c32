//! Execution backends behind a single capability trait.
//!
//! Three independent implementations produce the same image:
//!
//! - [`SequentialBackend`]: one thread, the correctness oracle
//! - [`ParallelBackend`]: blocked 2-D decomposition over a rayon pool
//! - `GpuBackend` (feature `gpu`): wgpu compute kernel
//!
//! Callers hold `&dyn JuliaBackend` and never depend on a concrete type.

mod parallel;
mod sequential;

pub use parallel::{Block, BlockGrid, ParallelBackend, DEFAULT_BLOCK_SIZE, PARALLEL_THRESHOLD};
pub use sequential::SequentialBackend;

use crate::error::JuliaError;
use crate::models::{ExecutionStats, GenerationParameters, PixelBuffer};

/// A strategy that renders [`GenerationParameters`] into a [`PixelBuffer`].
pub trait JuliaBackend: Send + Sync {
    /// Human-readable name used in image tags and timing reports.
    fn name(&self) -> String;

    /// Render into `buffer`, writing only pixels whose orbit escapes.
    ///
    /// Synchronous: returns once every pixel is final. The buffer must hold
    /// at least `size * size` cells.
    fn compute(
        &self,
        buffer: &mut PixelBuffer,
        params: &GenerationParameters,
    ) -> Result<ExecutionStats, JuliaError>;
}

/// Reject buffers that cannot hold the full grid.
pub(crate) fn check_capacity(
    buffer: &PixelBuffer,
    params: &GenerationParameters,
) -> Result<(), JuliaError> {
    let required = params.cell_count();
    if buffer.len() < required {
        return Err(JuliaError::CapacityMismatch {
            required,
            available: buffer.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests;
