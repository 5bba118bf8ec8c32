//! Equivalence and partitioning tests for the CPU backends.

use num_complex::Complex32;

use super::*;
use crate::error::ConfigError;
use crate::models::Color;
use crate::palette::ColorPalette;

fn palette() -> ColorPalette {
    ColorPalette::from_rgb(&[
        [0, 0, 100],
        [0, 0, 130],
        [0, 0, 160],
        [0, 0, 190],
        [0, 0, 230],
    ])
    .unwrap()
}

fn params(size: u32, max_iterations: u32) -> GenerationParameters {
    GenerationParameters::new(
        Complex32::new(-0.805, 0.156),
        1.7,
        max_iterations,
        size,
        palette(),
    )
    .unwrap()
}

fn render(backend: &dyn JuliaBackend, params: &GenerationParameters) -> PixelBuffer {
    let mut buffer = PixelBuffer::new(params.size());
    backend
        .compute(&mut buffer, params)
        .expect("compute should succeed");
    buffer
}

#[test]
fn test_sequential_single_pixel_scenario() {
    let buffer = render(&SequentialBackend::new(), &params(1, 50));
    assert_eq!(buffer.pixels(), &[Color::new(0, 0, 100)]);
}

#[test]
fn test_sequential_zero_iterations_is_black() {
    let buffer = render(&SequentialBackend::new(), &params(1, 0));
    assert_eq!(buffer.pixels(), &[Color::BLACK]);

    let buffer = render(&SequentialBackend::new(), &params(33, 0));
    assert!(buffer.pixels().iter().all(|&p| p == Color::BLACK));
}

#[test]
fn test_parallel_zero_iterations_is_black() {
    let backend = ParallelBackend::new(16).unwrap();
    let buffer = render(&backend, &params(100, 0));
    assert!(buffer.pixels().iter().all(|&p| p == Color::BLACK));
}

#[test]
fn test_parallel_matches_sequential() {
    let sequential = SequentialBackend::new();
    // 150x150 crosses PARALLEL_THRESHOLD, 7x7 stays inline.
    for &size in &[1u32, 7, 64, 150] {
        let p = params(size, 200);
        let expected = render(&sequential, &p);
        for &block in &[1u32, 3, 16, 64, 1000] {
            let backend = ParallelBackend::new(block).unwrap();
            let actual = render(&backend, &p);
            assert_eq!(
                actual.pixels(),
                expected.pixels(),
                "size {} block {} differs",
                size,
                block
            );
        }
    }
}

#[test]
fn test_dedicated_pool_matches_sequential() {
    let p = params(128, 300);
    let expected = render(&SequentialBackend::new(), &p);
    let backend = ParallelBackend::with_threads(32, 3).unwrap();
    assert_eq!(backend.threads(), 3);
    assert_eq!(backend.name(), "parallel (threads=3)");
    assert_eq!(render(&backend, &p).pixels(), expected.pixels());
}

#[test]
fn test_repeated_calls_are_identical() {
    let backend = ParallelBackend::new(8).unwrap();
    let p = params(96, 150);
    let first = render(&backend, &p);
    let second = render(&backend, &p);
    assert_eq!(first, second);
}

#[test]
fn test_image_is_not_uniform() {
    // Guard against a kernel that trivially writes nothing.
    let buffer = render(&SequentialBackend::new(), &params(64, 100));
    let escaped = buffer
        .pixels()
        .iter()
        .filter(|&&p| p != Color::BLACK)
        .count();
    assert!(escaped > 0);
    assert!(escaped < buffer.len());
}

#[test]
fn test_capacity_mismatch_rejected() {
    let p = params(10, 20);
    let mut small = PixelBuffer::new(9);
    let backends: [&dyn JuliaBackend; 2] =
        [&SequentialBackend::new(), &ParallelBackend::new(4).unwrap()];
    for backend in backends {
        let err = backend.compute(&mut small, &p).unwrap_err();
        assert_eq!(
            err,
            JuliaError::CapacityMismatch {
                required: 100,
                available: 81
            }
        );
    }
}

#[test]
fn test_larger_buffer_only_prefix_written() {
    let p = params(4, 50);
    let marker = Color::new(1, 2, 3);
    let mut buffer = PixelBuffer::from_pixels(4, vec![marker; 20]);
    ParallelBackend::new(2)
        .unwrap()
        .compute(&mut buffer, &p)
        .unwrap();
    assert!(buffer.pixels()[16..].iter().all(|&c| c == marker));
}

#[test]
fn test_invalid_parallel_settings() {
    assert!(matches!(
        ParallelBackend::new(0),
        Err(JuliaError::Config(ConfigError::InvalidBlockSize(0)))
    ));
    assert!(matches!(
        ParallelBackend::with_threads(16, 0),
        Err(JuliaError::Config(ConfigError::InvalidThreadCount(0)))
    ));
}

#[test]
fn test_blocks_cover_grid_exactly_once() {
    for &(size, block) in &[(1u32, 1u32), (10, 3), (64, 64), (65, 8), (100, 7), (5, 100)] {
        let grid = BlockGrid::new(size, block);
        let mut hits = vec![0u8; (size * size) as usize];
        for b in grid.blocks() {
            assert!(!b.rows.is_empty() && !b.cols.is_empty());
            for y in b.rows.clone() {
                for x in b.cols.clone() {
                    hits[(y * size + x) as usize] += 1;
                }
            }
        }
        assert!(
            hits.iter().all(|&h| h == 1),
            "size {} block {} not an exact cover",
            size,
            block
        );
        let total: usize = grid.blocks().iter().map(Block::cell_count).sum();
        assert_eq!(total, (size * size) as usize);
    }
}

#[test]
fn test_block_count_and_edges() {
    let grid = BlockGrid::new(10, 4);
    assert_eq!(grid.blocks_per_side(), 3);
    let blocks = grid.blocks();
    assert_eq!(blocks.len(), 9);
    assert_eq!(blocks[0], Block { rows: 0..4, cols: 0..4 });
    assert_eq!(blocks[8], Block { rows: 8..10, cols: 8..10 });
}

#[test]
fn test_tiles_follow_blocks() {
    let grid = BlockGrid::new(7, 3);
    let mut cells = vec![Color::BLACK; 49];
    let tiles = grid.tiles(&mut cells);
    let blocks = grid.blocks();
    assert_eq!(tiles.len(), blocks.len());
    for (tile, block) in tiles.iter().zip(blocks.iter()) {
        assert_eq!(&tile.block, block);
        assert_eq!(tile.rows.len(), block.rows.len());
        assert!(tile.rows.iter().all(|r| r.len() == block.cols.len()));
    }
}

#[test]
fn test_zero_block_size_grid_clamps_to_one() {
    let grid = BlockGrid::new(3, 0);
    assert_eq!(grid.blocks().len(), 9);
}
