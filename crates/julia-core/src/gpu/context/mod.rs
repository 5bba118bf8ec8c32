//! wgpu implementation of [`ComputeDevice`].

mod init;
mod pipelines;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use wgpu::util::DeviceExt;

pub use init::{is_available, list_adapters, vendor_name, AdapterSummary, DeviceSelector};
pub use pipelines::WgpuKernel;

use super::buffers::{read_mapped, word_bytes};
use super::device::{BufferRole, ComputeDevice, KernelBindings};
use super::shaders::WORKGROUP_SIZE;
use crate::error::GpuError;

const TIMESTAMP_BYTES: u64 = 2 * std::mem::size_of::<u64>() as u64;

/// Run `op` under validation and out-of-memory error scopes, turning a
/// captured error into `wrap(message)`.
///
/// On error the value built by `op` is dropped, releasing whatever it holds.
pub(crate) fn capture<T>(
    device: &wgpu::Device,
    wrap: fn(String) -> GpuError,
    op: impl FnOnce(&wgpu::Device) -> T,
) -> Result<T, GpuError> {
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = op(device);
    let validation = pollster::block_on(device.pop_error_scope());
    let out_of_memory = pollster::block_on(device.pop_error_scope());
    match validation.or(out_of_memory) {
        Some(err) => Err(wrap(err.to_string())),
        None => Ok(value),
    }
}

/// Query set and buffers used to time one compute pass on the device.
struct TimestampQueries {
    query_set: wgpu::QuerySet,
    resolve: wgpu::Buffer,
    readback: wgpu::Buffer,
    period_ns: f32,
}

impl TimestampQueries {
    fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let query_set = device.create_query_set(&wgpu::QuerySetDescriptor {
            label: Some("julia_timestamps"),
            ty: wgpu::QueryType::Timestamp,
            count: 2,
        });
        let resolve = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("julia_timestamps_resolve"),
            size: TIMESTAMP_BYTES,
            usage: wgpu::BufferUsages::QUERY_RESOLVE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("julia_timestamps_readback"),
            size: TIMESTAMP_BYTES,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            query_set,
            resolve,
            readback,
            period_ns: queue.get_timestamp_period(),
        }
    }

    fn elapsed(&self, device: &wgpu::Device) -> Result<Option<Duration>, GpuError> {
        let [start, end] = read_mapped(device, &self.readback, |bytes| {
            bytemuck::pod_read_unaligned::<[u64; 2]>(bytes)
        })?;
        if end <= start {
            log::debug!("Discarding timestamp pair {}..{}", start, end);
            return Ok(None);
        }
        let nanos = (end - start) as f64 * self.period_ns as f64;
        Ok(Some(Duration::from_nanos(nanos as u64)))
    }
}

/// A wgpu adapter, its device and queue.
///
/// Fields drop in declaration order, so the queue is released before the
/// device and the instance goes last.
pub struct WgpuDevice {
    timestamps: Option<TimestampQueries>,
    queue: wgpu::Queue,
    device: wgpu::Device,
    adapter_info: wgpu::AdapterInfo,
    lost: Arc<AtomicBool>,
    _instance: wgpu::Instance,
}

impl WgpuDevice {
    /// Select an adapter and create its device and queue.
    pub fn acquire(selector: &DeviceSelector) -> Result<Self, GpuError> {
        let init = pollster::block_on(init::initialize_device(selector))?;

        let timestamps = if init
            .device
            .features()
            .contains(wgpu::Features::TIMESTAMP_QUERY)
        {
            match capture(&init.device, GpuError::BufferError, |device| {
                TimestampQueries::new(device, &init.queue)
            }) {
                Ok(queries) => Some(queries),
                Err(e) => {
                    log::warn!("Timestamp queries unavailable, kernel time disabled: {}", e);
                    None
                }
            }
        } else {
            log::info!("Adapter has no timestamp queries; kernel time unavailable");
            None
        };

        Ok(Self {
            timestamps,
            queue: init.queue,
            device: init.device,
            adapter_info: init.adapter_info,
            lost: init.lost,
            _instance: init.instance,
        })
    }

    fn check_lost(&self) -> Result<(), GpuError> {
        if self.is_lost() {
            return Err(GpuError::DeviceLost(self.adapter_info.name.clone()));
        }
        Ok(())
    }

    fn check_buffer_size(&self, bytes: u64) -> Result<(), GpuError> {
        let limits = self.device.limits();
        let max = (limits.max_storage_buffer_binding_size as u64).min(limits.max_buffer_size);
        if bytes > max {
            return Err(GpuError::BufferError(format!(
                "{} bytes exceeds device limit of {} bytes",
                bytes, max
            )));
        }
        Ok(())
    }

    fn submit(
        &self,
        wrap: fn(String) -> GpuError,
        encoder: wgpu::CommandEncoder,
    ) -> Result<(), GpuError> {
        let index = capture(&self.device, wrap, |_| {
            self.queue.submit(std::iter::once(encoder.finish()))
        })?;
        self.device.poll(wgpu::Maintain::wait_for(index));
        self.check_lost()
    }
}

impl ComputeDevice for WgpuDevice {
    type Buffer = wgpu::Buffer;
    type Kernel = WgpuKernel;

    fn describe(&self) -> String {
        AdapterSummary::from(&self.adapter_info).to_string()
    }

    fn compile_kernel(&self, source: &str) -> Result<WgpuKernel, GpuError> {
        pipelines::create_kernel(&self.device, source)
    }

    fn create_output_buffer(&self, cells: usize) -> Result<wgpu::Buffer, GpuError> {
        let size = word_bytes(cells);
        self.check_buffer_size(size)?;
        capture(&self.device, GpuError::BufferError, |device| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("julia_output"),
                size,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            })
        })
    }

    fn create_input_buffer(
        &self,
        label: &'static str,
        contents: &[u8],
        role: BufferRole,
    ) -> Result<wgpu::Buffer, GpuError> {
        self.check_buffer_size(contents.len() as u64)?;
        let usage = match role {
            BufferRole::Storage => wgpu::BufferUsages::STORAGE,
            BufferRole::Uniform => wgpu::BufferUsages::UNIFORM,
        };
        capture(&self.device, GpuError::BufferError, |device| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            })
        })
    }

    fn dispatch(
        &self,
        kernel: &WgpuKernel,
        bindings: KernelBindings<'_, wgpu::Buffer>,
        grid: [u32; 2],
    ) -> Result<Option<Duration>, GpuError> {
        self.check_lost()?;

        let [width, height] = grid;
        let groups_x = width.div_ceil(WORKGROUP_SIZE);
        let groups_y = height.div_ceil(WORKGROUP_SIZE);
        let max_groups = self.device.limits().max_compute_workgroups_per_dimension;
        if groups_x > max_groups || groups_y > max_groups {
            return Err(GpuError::Dispatch(format!(
                "{}x{} workgroups exceeds device limit of {}",
                groups_x, groups_y, max_groups
            )));
        }

        let bind_group = capture(&self.device, GpuError::Binding, |device| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("julia_bind_group"),
                layout: &kernel.layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: bindings.output.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: bindings.palette.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: bindings.params.as_entire_binding(),
                    },
                ],
            })
        })?;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("julia_encoder"),
            });

        {
            let timestamp_writes =
                self.timestamps
                    .as_ref()
                    .map(|t| wgpu::ComputePassTimestampWrites {
                        query_set: &t.query_set,
                        beginning_of_pass_write_index: Some(0),
                        end_of_pass_write_index: Some(1),
                    });
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("julia_pass"),
                timestamp_writes,
            });
            pass.set_pipeline(&kernel.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(groups_x, groups_y, 1);
        }

        if let Some(t) = &self.timestamps {
            encoder.resolve_query_set(&t.query_set, 0..2, &t.resolve, 0);
            encoder.copy_buffer_to_buffer(&t.resolve, 0, &t.readback, 0, TIMESTAMP_BYTES);
        }

        self.submit(GpuError::Dispatch, encoder)?;

        match &self.timestamps {
            Some(t) => t.elapsed(&self.device),
            None => Ok(None),
        }
    }

    fn read_output(&self, buffer: &wgpu::Buffer, out: &mut [u32]) -> Result<(), GpuError> {
        let size = word_bytes(out.len());
        let staging = capture(&self.device, GpuError::Readback, |device| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("julia_staging"),
                size,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        })?;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("julia_readback_encoder"),
            });
        encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
        self.submit(GpuError::Readback, encoder)?;

        read_mapped(&self.device, &staging, |bytes| {
            out.copy_from_slice(bytemuck::cast_slice(bytes));
        })
    }

    fn is_lost(&self) -> bool {
        self.lost.load(Ordering::SeqCst)
    }
}
