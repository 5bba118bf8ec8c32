//! Single-threaded reference backend.

use std::time::Instant;

use super::{check_capacity, JuliaBackend};
use crate::error::JuliaError;
use crate::kernel::shade_row;
use crate::models::{ExecutionStats, GenerationParameters, PixelBuffer};

/// Row-by-row, column-by-column evaluation on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialBackend;

impl SequentialBackend {
    pub fn new() -> Self {
        Self
    }
}

impl JuliaBackend for SequentialBackend {
    fn name(&self) -> String {
        "sequential".to_string()
    }

    fn compute(
        &self,
        buffer: &mut PixelBuffer,
        params: &GenerationParameters,
    ) -> Result<ExecutionStats, JuliaError> {
        check_capacity(buffer, params)?;
        let start = Instant::now();

        let size = params.size() as usize;
        let grid = &mut buffer.pixels_mut()[..params.cell_count()];
        for (y, row) in grid.chunks_mut(size).enumerate() {
            shade_row(row, 0, y as u32, params);
        }

        Ok(ExecutionStats::cpu(start.elapsed()))
    }
}
