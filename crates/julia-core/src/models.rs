//! Value types passed between the caller, the backends and the driver.

use std::fmt;
use std::time::Duration;

use num_complex::Complex32;

use crate::error::ConfigError;
use crate::palette::ColorPalette;

/// 24-bit color, no alpha. The default value is black, which is also the
/// color of pixels whose orbit never escapes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pack as `0x00BBGGRR`.
    #[inline]
    pub fn pack(self) -> u32 {
        self.r as u32 | (self.g as u32) << 8 | (self.b as u32) << 16
    }

    /// Inverse of [`Color::pack`]; the top byte is ignored.
    #[inline]
    pub fn unpack(word: u32) -> Self {
        Self {
            r: (word & 0xFF) as u8,
            g: ((word >> 8) & 0xFF) as u8,
            b: ((word >> 16) & 0xFF) as u8,
        }
    }
}

impl From<[u8; 3]> for Color {
    fn from(rgb: [u8; 3]) -> Self {
        Color::new(rgb[0], rgb[1], rgb[2])
    }
}

/// Immutable inputs of one generation.
///
/// Construct through [`GenerationParameters::new`], which enforces
/// `size > 0`, a non-empty palette, a finite positive `limit` and a finite
/// constant. Backends may therefore rely on those invariants.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParameters {
    c: Complex32,
    limit: f32,
    max_iterations: u32,
    size: u32,
    palette: ColorPalette,
}

impl GenerationParameters {
    pub fn new(
        c: Complex32,
        limit: f32,
        max_iterations: u32,
        size: u32,
        palette: ColorPalette,
    ) -> Result<Self, ConfigError> {
        if size == 0 {
            return Err(ConfigError::InvalidSize(size));
        }
        if !limit.is_finite() || limit <= 0.0 {
            return Err(ConfigError::InvalidLimit(limit));
        }
        if !c.re.is_finite() || !c.im.is_finite() {
            return Err(ConfigError::NonFiniteConstant { re: c.re, im: c.im });
        }
        if palette.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        Ok(Self {
            c,
            limit,
            max_iterations,
            size,
            palette,
        })
    }

    pub fn c(&self) -> Complex32 {
        self.c
    }

    pub fn limit(&self) -> f32 {
        self.limit
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn palette(&self) -> &ColorPalette {
        &self.palette
    }

    /// Number of cells a buffer must hold for these parameters.
    pub fn cell_count(&self) -> usize {
        self.size as usize * self.size as usize
    }

    /// Same parameters with a different grid size and iteration cap.
    pub fn with_grid(&self, size: u32, max_iterations: u32) -> Result<Self, ConfigError> {
        Self::new(self.c, self.limit, max_iterations, size, self.palette.clone())
    }
}

/// Row-major square grid of colors.
///
/// Created black; backends only write pixels whose orbit escapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    size: u32,
    pixels: Vec<Color>,
}

impl PixelBuffer {
    /// Allocate a black `size x size` buffer.
    pub fn new(size: u32) -> Self {
        let cells = size as usize * size as usize;
        Self {
            size,
            pixels: vec![Color::BLACK; cells],
        }
    }

    /// Wrap existing pixels. `size` is not checked against `pixels.len()`;
    /// backends only require `len() >= params.size()^2` and leave any
    /// trailing cells untouched.
    pub fn from_pixels(size: u32, pixels: Vec<Color>) -> Self {
        Self { size, pixels }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Color] {
        &mut self.pixels
    }

    /// Pixel at column `x`, row `y`.
    pub fn get(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.size || y >= self.size {
            return None;
        }
        self.pixels
            .get(y as usize * self.size as usize + x as usize)
            .copied()
    }

    /// Interleaved RGB bytes, three per pixel.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 3);
        for p in &self.pixels {
            bytes.extend_from_slice(&[p.r, p.g, p.b]);
        }
        bytes
    }

    /// Reset every pixel to black.
    pub fn clear(&mut self) {
        self.pixels.fill(Color::BLACK);
    }
}

/// Timing collected for one backend invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionStats {
    /// Host wall-clock time around the invocation.
    pub wall_time: Duration,
    /// Device-reported kernel time. `None` for CPU backends and for devices
    /// without timestamp support.
    pub kernel_time: Option<Duration>,
}

impl ExecutionStats {
    pub fn cpu(wall_time: Duration) -> Self {
        Self {
            wall_time,
            kernel_time: None,
        }
    }

    pub fn wall_seconds(&self) -> f64 {
        self.wall_time.as_secs_f64()
    }

    /// Kernel time in seconds, or `-1.0` when the device gave none.
    pub fn kernel_seconds_or_sentinel(&self) -> f64 {
        self.kernel_time.map_or(-1.0, |d| d.as_secs_f64())
    }
}

impl fmt::Display for ExecutionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wall {:.6}s", self.wall_seconds())?;
        match self.kernel_time {
            Some(k) => write!(f, ", kernel {:.6}s", k.as_secs_f64()),
            None => write!(f, ", kernel n/a"),
        }
    }
}
