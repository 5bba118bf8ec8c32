//! Image exporters used as the driver's persistence collaborator.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::driver::ImageSink;
use crate::models::PixelBuffer;

/// Write a `size x size` buffer as an 8-bit RGB PNG.
pub fn export_png<P: AsRef<Path>>(buffer: &PixelBuffer, size: u32, path: P) -> Result<(), String> {
    let cells = size as usize * size as usize;
    if buffer.len() < cells {
        return Err(format!(
            "Buffer holds {} pixels, {}x{} image needs {}",
            buffer.len(),
            size,
            size,
            cells
        ));
    }

    let file =
        File::create(path.as_ref()).map_err(|e| format!("Failed to create PNG file: {}", e))?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), size, size);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder
        .write_header()
        .map_err(|e| format!("Failed to write PNG header: {}", e))?;

    let bytes: Vec<u8> = buffer.pixels()[..cells]
        .iter()
        .flat_map(|c| [c.r, c.g, c.b])
        .collect();
    writer
        .write_image_data(&bytes)
        .map_err(|e| format!("Failed to write PNG data: {}", e))?;
    writer
        .finish()
        .map_err(|e| format!("Failed to finish PNG: {}", e))
}

/// Saves every image as `<dir>/<tag>.png`.
#[derive(Debug, Clone)]
pub struct PngSink {
    dir: PathBuf,
}

impl PngSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, tag: &str) -> PathBuf {
        let file_name: String = tag
            .chars()
            .map(|ch| match ch {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                other => other,
            })
            .collect();
        self.dir.join(format!("{}.png", file_name))
    }
}

impl ImageSink for PngSink {
    fn persist(&self, buffer: &PixelBuffer, size: u32, tag: &str) -> Result<(), String> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            format!(
                "Failed to create output directory {}: {}",
                self.dir.display(),
                e
            )
        })?;
        let path = self.path_for(tag);
        log::info!("Saving image to {}", path.display());
        export_png(buffer, size, &path)
    }
}
