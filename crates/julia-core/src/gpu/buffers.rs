//! Uniform layout and host/device transfer helpers.

use bytemuck::{Pod, Zeroable};

use crate::error::GpuError;
use crate::models::GenerationParameters;

/// Kernel parameters for the uniform buffer. Layout matches `JuliaParams`
/// in `julia.wgsl` (32 bytes, no implicit padding).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct JuliaParams {
    pub c: [f32; 2],
    pub limit: f32,
    pub max_iterations: u32,
    pub size: u32,
    pub palette_len: u32,
    pub _padding: [u32; 2],
}

impl From<&GenerationParameters> for JuliaParams {
    fn from(params: &GenerationParameters) -> Self {
        let c = params.c();
        Self {
            c: [c.re, c.im],
            limit: params.limit(),
            max_iterations: params.max_iterations(),
            size: params.size(),
            palette_len: params.palette().len() as u32,
            _padding: [0; 2],
        }
    }
}

/// Size in bytes of `count` 32-bit words.
pub(crate) fn word_bytes(count: usize) -> u64 {
    (count * std::mem::size_of::<u32>()) as u64
}

/// Map a `MAP_READ` buffer, hand its bytes to `read`, then unmap.
///
/// Blocks on the device until the mapping resolves.
pub(crate) fn read_mapped<T>(
    device: &wgpu::Device,
    buffer: &wgpu::Buffer,
    read: impl FnOnce(&[u8]) -> T,
) -> Result<T, GpuError> {
    let slice = buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();

    slice.map_async(wgpu::MapMode::Read, move |result| {
        // Receiver gone means the caller already returned an error.
        let _ = tx.send(result);
    });

    device.poll(wgpu::Maintain::Wait);

    rx.recv()
        .map_err(|e| GpuError::Readback(e.to_string()))?
        .map_err(|e| GpuError::Readback(e.to_string()))?;

    let value = {
        let data = slice.get_mapped_range();
        read(&data)
    };
    buffer.unmap();

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::ColorPalette;
    use num_complex::Complex32;

    #[test]
    fn test_params_layout_is_32_bytes() {
        assert_eq!(std::mem::size_of::<JuliaParams>(), 32);
        assert_eq!(std::mem::align_of::<JuliaParams>(), 4);
    }

    #[test]
    fn test_params_from_generation_parameters() {
        let palette = ColorPalette::from_rgb(&[[1, 2, 3], [4, 5, 6], [7, 8, 9]]).unwrap();
        let p = GenerationParameters::new(Complex32::new(-0.8, 0.156), 1.7, 300, 640, palette)
            .unwrap();
        let uniforms = JuliaParams::from(&p);
        assert_eq!(uniforms.c, [-0.8, 0.156]);
        assert_eq!(uniforms.limit, 1.7);
        assert_eq!(uniforms.max_iterations, 300);
        assert_eq!(uniforms.size, 640);
        assert_eq!(uniforms.palette_len, 3);

        let bytes = bytemuck::bytes_of(&uniforms);
        assert_eq!(&bytes[12..16], &300u32.to_le_bytes());
        assert_eq!(&bytes[16..20], &640u32.to_le_bytes());
    }

    #[test]
    fn test_word_bytes() {
        assert_eq!(word_bytes(0), 0);
        assert_eq!(word_bytes(100), 400);
    }
}
