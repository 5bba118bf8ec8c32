//! Escape-time kernel shared by the CPU backends.
//!
//! `shaders/julia.wgsl` is the device translation of this file. Both evaluate
//! the same f32 expressions in the same order so that results agree bit for
//! bit on devices that do not contract them into fused multiply-adds.

use num_complex::Complex32;

use crate::models::{Color, GenerationParameters};

/// Squared escape radius. `|Z|^2 > 4` is the same test as `|Z| > 2`
/// without the square root.
pub const ESCAPE_RADIUS_SQ: f32 = 4.0;

/// Map pixel `(x, y)` of a `size x size` grid onto `[-limit, limit)` in both axes.
#[inline]
pub fn plane_coordinate(x: u32, y: u32, size: u32, limit: f32) -> Complex32 {
    let step = 2.0 * limit / size as f32;
    Complex32::new(-limit + step * x as f32, -limit + step * y as f32)
}

/// One iteration of `Z := Z^2 + C`.
#[inline]
pub fn step(z: Complex32, c: Complex32) -> Complex32 {
    Complex32::new(z.re * z.re - z.im * z.im + c.re, 2.0 * z.re * z.im + c.im)
}

/// Iteration index at which the orbit of `(x, y)` escapes, or `None` when it
/// stays bounded for all `max_iterations` steps.
#[inline]
pub fn escape_index(x: u32, y: u32, params: &GenerationParameters) -> Option<u32> {
    let c = params.c();
    let mut z = plane_coordinate(x, y, params.size(), params.limit());
    for i in 0..params.max_iterations() {
        z = step(z, c);
        if z.norm_sqr() > ESCAPE_RADIUS_SQ {
            return Some(i);
        }
    }
    None
}

/// Color of pixel `(x, y)`, or `None` when the pixel keeps its default color.
#[inline]
pub fn shade_pixel(x: u32, y: u32, params: &GenerationParameters) -> Option<Color> {
    escape_index(x, y, params).map(|i| params.palette().color_for(i))
}

/// Shade one row segment `[x0, x0 + row.len())` of row `y`, writing only
/// escaped pixels.
#[inline]
pub(crate) fn shade_row(row: &mut [Color], x0: u32, y: u32, params: &GenerationParameters) {
    for (dx, cell) in row.iter_mut().enumerate() {
        if let Some(color) = shade_pixel(x0 + dx as u32, y, params) {
            *cell = color;
        }
    }
}
