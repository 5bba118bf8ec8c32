//! Ordered color palette mapping escape counts to visible colors.

use crate::error::ConfigError;
use crate::models::Color;

/// Non-empty ordered sequence of output colors.
///
/// Escape index `i` maps to `colors[i % len]`, so the palette cycles for
/// orbits that escape late.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorPalette {
    colors: Vec<Color>,
}

impl ColorPalette {
    /// Build a palette, rejecting an empty color list.
    pub fn new(colors: Vec<Color>) -> Result<Self, ConfigError> {
        if colors.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        Ok(Self { colors })
    }

    /// Build a palette from `[r, g, b]` triples.
    pub fn from_rgb(triples: &[[u8; 3]]) -> Result<Self, ConfigError> {
        Self::new(triples.iter().map(|&rgb| Color::from(rgb)).collect())
    }

    /// Color for an escape index.
    #[inline]
    pub fn color_for(&self, escape_index: u32) -> Color {
        self.colors[escape_index as usize % self.colors.len()]
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false for a constructed palette.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Colors packed as `0x00BBGGRR` words, the layout the device kernel reads.
    pub fn packed(&self) -> Vec<u32> {
        self.colors.iter().map(|c| c.pack()).collect()
    }
}
