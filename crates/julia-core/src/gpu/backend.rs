//! GPU backend state machine.
//!
//! Construction walks context, queue, program and kernel in that order.
//! Any failure drops what was already acquired (in reverse) and leaves the
//! backend `Failed`, where every `compute` is rejected with the stored
//! cause. Per-call buffers are owned locals, so they are released on every
//! return path. A lost device moves a `Ready` backend to `Failed`.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::buffers::JuliaParams;
use super::context::{DeviceSelector, WgpuDevice};
use super::device::{BufferRole, ComputeDevice, KernelBindings, KernelSource};
use super::shaders::ESCAPED_FLAG;
use crate::backend::{check_capacity, JuliaBackend};
use crate::error::{GpuError, JuliaError};
use crate::models::{Color, ExecutionStats, GenerationParameters, PixelBuffer};

/// Which adapter to use and which kernel to build on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GpuConfig {
    pub selector: DeviceSelector,
    pub kernel: KernelSource,
}

impl GpuConfig {
    pub fn new(platform: Option<String>) -> Self {
        Self {
            selector: DeviceSelector::new(platform),
            kernel: KernelSource::Embedded,
        }
    }

    pub fn with_kernel(mut self, kernel: KernelSource) -> Self {
        self.kernel = kernel;
        self
    }
}

/// Long-lived device resources. The kernel is declared first so it is
/// released before the device that owns its context and queue.
struct DeviceResources<D: ComputeDevice> {
    kernel: D::Kernel,
    device: D,
}

enum Lifecycle<D: ComputeDevice> {
    Ready(DeviceResources<D>),
    Failed(GpuError),
}

struct Guarded<D: ComputeDevice> {
    lifecycle: Lifecycle<D>,
    last_kernel_time: Option<Duration>,
}

/// Renders on a compute device. Calls are serialized by an internal lock;
/// concurrent callers block until the device is free.
pub struct GpuBackend<D: ComputeDevice = WgpuDevice> {
    label: String,
    state: Mutex<Guarded<D>>,
}

impl GpuBackend<WgpuDevice> {
    /// Acquire a wgpu device per `config` and build the kernel.
    ///
    /// Never fails: an unusable device yields a backend in the failed state,
    /// see [`GpuBackend::failure`].
    pub fn new(config: &GpuConfig) -> Self {
        let label = format!("gpu (platform={})", config.selector);
        Self::from_device(label, WgpuDevice::acquire(&config.selector), &config.kernel)
    }
}

impl<D: ComputeDevice> GpuBackend<D> {
    /// Build the kernel on an already acquired (or failed) device.
    pub fn from_device(
        label: impl Into<String>,
        acquired: Result<D, GpuError>,
        source: &KernelSource,
    ) -> Self {
        let label = label.into();
        let lifecycle = match acquired.and_then(|device| build_kernel(device, source)) {
            Ok(resources) => {
                log::info!(
                    "{} ready on {} (kernel: {})",
                    label,
                    resources.device.describe(),
                    source
                );
                Lifecycle::Ready(resources)
            }
            Err(cause) => {
                log::warn!("{} unavailable (kernel: {}): {}", label, source, cause);
                Lifecycle::Failed(cause)
            }
        };
        Self {
            label,
            state: Mutex::new(Guarded {
                lifecycle,
                last_kernel_time: None,
            }),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.lock().lifecycle, Lifecycle::Ready(_))
    }

    /// The error that put the backend in the failed state, if any.
    pub fn failure(&self) -> Option<GpuError> {
        match &self.lock().lifecycle {
            Lifecycle::Failed(cause) => Some(cause.clone()),
            Lifecycle::Ready(_) => None,
        }
    }

    /// Device-measured kernel time of the most recent successful call.
    pub fn last_kernel_time(&self) -> Option<Duration> {
        self.lock().last_kernel_time
    }

    pub fn device_description(&self) -> Option<String> {
        match &self.lock().lifecycle {
            Lifecycle::Ready(resources) => Some(resources.device.describe()),
            Lifecycle::Failed(_) => None,
        }
    }

    // A panic while holding the lock can only come from a device callback;
    // the state itself is still consistent, so keep using it.
    fn lock(&self) -> MutexGuard<'_, Guarded<D>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn build_kernel<D: ComputeDevice>(
    device: D,
    source: &KernelSource,
) -> Result<DeviceResources<D>, GpuError> {
    let code = source.load()?;
    let kernel = device.compile_kernel(&code)?;
    Ok(DeviceResources { kernel, device })
}

impl<D: ComputeDevice> DeviceResources<D> {
    /// One full invocation: allocate, bind, dispatch, read back. Transient
    /// buffers are locals and drop on every exit.
    fn invoke(
        &self,
        buffer: &mut PixelBuffer,
        params: &GenerationParameters,
    ) -> Result<Option<Duration>, GpuError> {
        let cells = params.cell_count();

        let output = self.device.create_output_buffer(cells)?;
        let palette = params.palette().packed();
        let palette = self.device.create_input_buffer(
            "julia_palette",
            bytemuck::cast_slice(&palette),
            BufferRole::Storage,
        )?;
        let uniforms = JuliaParams::from(params);
        let uniforms = self.device.create_input_buffer(
            "julia_params",
            bytemuck::bytes_of(&uniforms),
            BufferRole::Uniform,
        )?;

        let kernel_time = self.device.dispatch(
            &self.kernel,
            KernelBindings {
                output: &output,
                palette: &palette,
                params: &uniforms,
            },
            [params.size(), params.size()],
        )?;

        let mut words = vec![0u32; cells];
        self.device.read_output(&output, &mut words)?;

        for (cell, word) in buffer.pixels_mut()[..cells].iter_mut().zip(words) {
            if word & ESCAPED_FLAG != 0 {
                *cell = Color::unpack(word);
            }
        }

        Ok(kernel_time)
    }
}

impl<D: ComputeDevice> JuliaBackend for GpuBackend<D> {
    fn name(&self) -> String {
        self.label.clone()
    }

    fn compute(
        &self,
        buffer: &mut PixelBuffer,
        params: &GenerationParameters,
    ) -> Result<ExecutionStats, JuliaError> {
        let mut state = self.lock();

        let resources = match &state.lifecycle {
            Lifecycle::Failed(cause) => return Err(JuliaError::BackendUnavailable(cause.clone())),
            Lifecycle::Ready(resources) => resources,
        };
        check_capacity(buffer, params)?;

        let start = Instant::now();
        let outcome = resources.invoke(buffer, params).map_err(|err| {
            let fatal = err.is_context_level() || resources.device.is_lost();
            (err, fatal)
        });

        match outcome {
            Ok(kernel_time) => {
                state.last_kernel_time = kernel_time;
                Ok(ExecutionStats {
                    wall_time: start.elapsed(),
                    kernel_time,
                })
            }
            Err((err, fatal)) => {
                state.last_kernel_time = None;
                if fatal {
                    log::error!("{} failed permanently: {}", self.label, err);
                    let cause = match &err {
                        GpuError::DeviceLost(_) => err.clone(),
                        other => GpuError::DeviceLost(other.to_string()),
                    };
                    state.lifecycle = Lifecycle::Failed(cause);
                } else {
                    log::warn!("{} call failed: {}", self.label, err);
                }
                Err(JuliaError::Device(err))
            }
        }
    }
}
