//! Fork-join CPU backend using a blocked 2-D decomposition.
//!
//! The grid is cut into square blocks of `block_size` pixels per side (the
//! last row and column of blocks may be smaller). Each block becomes a
//! [`Tile`] holding the `&mut` row segments it owns, so the borrow checker
//! guarantees that no two workers ever write the same cell and no locking
//! is needed.

use std::ops::Range;
use std::time::Instant;

use rayon::prelude::*;

use super::{check_capacity, JuliaBackend};
use crate::error::{ConfigError, JuliaError};
use crate::kernel::shade_row;
use crate::models::{Color, ExecutionStats, GenerationParameters, PixelBuffer};

/// Grids with fewer cells than this are shaded inline; forking would cost
/// more than it saves.
pub const PARALLEL_THRESHOLD: usize = 4_096;

/// Default block side length in pixels.
pub const DEFAULT_BLOCK_SIZE: u32 = 64;

/// Half-open rectangle of grid indices assigned to one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub rows: Range<u32>,
    pub cols: Range<u32>,
}

impl Block {
    pub fn cell_count(&self) -> usize {
        self.rows.len() * self.cols.len()
    }
}

/// Partition of a `size x size` index space into `block_size`-sided blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGrid {
    size: u32,
    block_size: u32,
}

impl BlockGrid {
    /// `block_size` of zero is treated as one.
    pub fn new(size: u32, block_size: u32) -> Self {
        Self {
            size,
            block_size: block_size.max(1),
        }
    }

    /// Number of blocks along each axis.
    pub fn blocks_per_side(&self) -> u32 {
        self.size.div_ceil(self.block_size)
    }

    /// All blocks in band-major order (row band, then column).
    pub fn blocks(&self) -> Vec<Block> {
        let per_side = self.blocks_per_side();
        let mut blocks = Vec::with_capacity((per_side * per_side) as usize);
        for band in 0..per_side {
            let rows = self.span(band);
            for column in 0..per_side {
                blocks.push(Block {
                    rows: rows.clone(),
                    cols: self.span(column),
                });
            }
        }
        blocks
    }

    fn span(&self, index: u32) -> Range<u32> {
        let start = index * self.block_size;
        start..(start + self.block_size).min(self.size)
    }

    /// Split the first `size * size` cells into one tile per block, in the
    /// same order as [`BlockGrid::blocks`].
    ///
    /// `cells` must hold at least `size * size` elements.
    pub(crate) fn tiles<'a>(&self, cells: &'a mut [Color]) -> Vec<Tile<'a>> {
        let size = self.size as usize;
        let block_size = self.block_size as usize;
        let per_side = self.blocks_per_side() as usize;

        let mut tiles: Vec<Tile<'a>> = self
            .blocks()
            .into_iter()
            .map(|block| Tile {
                rows: Vec::with_capacity(block.rows.len()),
                block,
            })
            .collect();

        let (grid, _) = cells.split_at_mut(size * size);
        for (y, row) in grid.chunks_mut(size).enumerate() {
            let band = y / block_size;
            for (column, segment) in row.chunks_mut(block_size).enumerate() {
                tiles[band * per_side + column].rows.push(segment);
            }
        }
        tiles
    }
}

/// Exclusive view of the cells covered by one [`Block`].
pub(crate) struct Tile<'a> {
    pub(crate) block: Block,
    pub(crate) rows: Vec<&'a mut [Color]>,
}

impl Tile<'_> {
    fn shade(self, params: &GenerationParameters) {
        let x0 = self.block.cols.start;
        let y0 = self.block.rows.start;
        for (dy, row) in self.rows.into_iter().enumerate() {
            shade_row(row, x0, y0 + dy as u32, params);
        }
    }
}

/// Multi-threaded backend. Output is identical to
/// [`SequentialBackend`](super::SequentialBackend) for every block size.
pub struct ParallelBackend {
    block_size: u32,
    pool: Option<rayon::ThreadPool>,
}

impl ParallelBackend {
    /// Backend on rayon's global pool.
    pub fn new(block_size: u32) -> Result<Self, JuliaError> {
        if block_size == 0 {
            return Err(ConfigError::InvalidBlockSize(block_size).into());
        }
        Ok(Self {
            block_size,
            pool: None,
        })
    }

    /// Backend on a dedicated pool of `threads` workers.
    pub fn with_threads(block_size: u32, threads: usize) -> Result<Self, JuliaError> {
        if threads == 0 {
            return Err(ConfigError::InvalidThreadCount(threads).into());
        }
        let mut backend = Self::new(block_size)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("julia-worker-{}", i))
            .build()
            .map_err(|e| JuliaError::ThreadPool(e.to_string()))?;
        log::debug!("Built dedicated pool with {} workers", threads);
        backend.pool = Some(pool);
        Ok(backend)
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Worker count of the pool this backend runs on.
    pub fn threads(&self) -> usize {
        self.pool
            .as_ref()
            .map_or_else(rayon::current_num_threads, |p| p.current_num_threads())
    }
}

impl JuliaBackend for ParallelBackend {
    fn name(&self) -> String {
        match &self.pool {
            Some(pool) => format!("parallel (threads={})", pool.current_num_threads()),
            None => "parallel".to_string(),
        }
    }

    fn compute(
        &self,
        buffer: &mut PixelBuffer,
        params: &GenerationParameters,
    ) -> Result<ExecutionStats, JuliaError> {
        check_capacity(buffer, params)?;
        let start = Instant::now();

        let grid = BlockGrid::new(params.size(), self.block_size);
        let tiles = grid.tiles(buffer.pixels_mut());

        if params.cell_count() < PARALLEL_THRESHOLD {
            tiles.into_iter().for_each(|tile| tile.shade(params));
        } else {
            let run = move || tiles.into_par_iter().for_each(|tile| tile.shade(params));
            match &self.pool {
                Some(pool) => pool.install(run),
                None => run(),
            }
        }

        Ok(ExecutionStats::cpu(start.elapsed()))
    }
}
