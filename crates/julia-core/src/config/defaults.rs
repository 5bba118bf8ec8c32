//! Built-in configuration values and their validation.

use std::path::PathBuf;

use num_complex::Complex32;
use serde::Deserialize;

use crate::backend::DEFAULT_BLOCK_SIZE;
use crate::error::ConfigError;
use crate::models::GenerationParameters;
use crate::palette::ColorPalette;

/// Blue ramp used when no palette is configured.
pub const DEFAULT_PALETTE: [[u8; 3]; 5] = [
    [0, 0, 100],
    [0, 0, 130],
    [0, 0, 160],
    [0, 0, 190],
    [0, 0, 230],
];

/// Complete configuration file structure.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct JuliaConfig {
    /// Julia constant as `[re, im]`
    pub constant: [f32; 2],
    /// Half-width of the square region of the complex plane
    pub limit: f32,
    pub max_iterations: u32,
    /// Image side length in pixels
    pub size: u32,
    /// RGB triples; escape index `i` uses entry `i % len`
    pub palette: Vec<[u8; 3]>,
    /// Directory images are written to
    pub output_dir: PathBuf,
    pub gpu: GpuSettings,
    pub parallel: ParallelSettings,
}

impl Default for JuliaConfig {
    fn default() -> Self {
        Self {
            constant: [-0.805, 0.156],
            limit: 1.7,
            max_iterations: 300,
            size: 1000,
            palette: DEFAULT_PALETTE.to_vec(),
            output_dir: PathBuf::from("images"),
            gpu: GpuSettings::default(),
            parallel: ParallelSettings::default(),
        }
    }
}

impl JuliaConfig {
    pub fn constant(&self) -> Complex32 {
        Complex32::new(self.constant[0], self.constant[1])
    }

    /// Validate into the parameters a backend consumes.
    pub fn generation_parameters(&self) -> Result<GenerationParameters, ConfigError> {
        let palette = ColorPalette::from_rgb(&self.palette)?;
        GenerationParameters::new(
            self.constant(),
            self.limit,
            self.max_iterations,
            self.size,
            palette,
        )
    }
}

/// GPU backend settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GpuSettings {
    /// Adapter selector (name, vendor or graphics API substring)
    pub platform: Option<String>,
    /// WGSL file replacing the embedded kernel
    pub kernel: Option<PathBuf>,
}

/// Parallel CPU backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParallelSettings {
    pub block_size: u32,
    /// Dedicated pool size; the global rayon pool when unset
    pub threads: Option<usize>,
}

impl Default for ParallelSettings {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            threads: None,
        }
    }
}
