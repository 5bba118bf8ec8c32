//! Shader module, bind group layout and compute pipeline for the kernel.

use super::capture;
use crate::error::GpuError;
use crate::gpu::shaders::KERNEL_ENTRY_POINT;

/// A compiled escape-time kernel.
///
/// Fields drop in declaration order: the pipeline (kernel) goes before the
/// shader module (program).
pub struct WgpuKernel {
    pub(crate) pipeline: wgpu::ComputePipeline,
    pub(crate) layout: wgpu::BindGroupLayout,
    _module: wgpu::ShaderModule,
}

/// Compile `source` and build the pipeline around [`KERNEL_ENTRY_POINT`].
pub(crate) fn create_kernel(device: &wgpu::Device, source: &str) -> Result<WgpuKernel, GpuError> {
    let module = capture(device, GpuError::ShaderCompilation, |device| {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("julia"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        })
    })?;

    let (layout, pipeline) = capture(device, GpuError::PipelineError, |device| {
        let layout = create_julia_layout(device);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("julia_pipeline_layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("julia_pipeline"),
            layout: Some(&pipeline_layout),
            module: &module,
            entry_point: Some(KERNEL_ENTRY_POINT),
            compilation_options: Default::default(),
            cache: None,
        });
        (layout, pipeline)
    })?;

    Ok(WgpuKernel {
        pipeline,
        layout,
        _module: module,
    })
}

/// Output storage (read-write), palette storage (read-only), parameters
/// (uniform).
fn create_julia_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("julia_layout"),
        entries: &[
            storage_entry(0, false),
            storage_entry(1, true),
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    })
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}
