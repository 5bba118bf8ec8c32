//! Host-side [`ComputeDevice`] that executes the kernel on the CPU and
//! keeps a ledger of every acquisition and release.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use num_complex::Complex32;

use super::buffers::JuliaParams;
use super::device::{BufferRole, ComputeDevice, KernelBindings};
use super::shaders::{ESCAPED_FLAG, KERNEL_ENTRY_POINT};
use crate::error::GpuError;
use crate::kernel::escape_index;
use crate::models::{Color, GenerationParameters};
use crate::palette::ColorPalette;

pub const MOCK_KERNEL_TIME: Duration = Duration::from_micros(42);

/// Device call that should fail next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Compile,
    OutputBuffer,
    PaletteBuffer,
    ParamsBuffer,
    Dispatch,
    Readback,
    DeviceLoss,
}

#[derive(Default)]
pub struct Ledger {
    allocated: AtomicUsize,
    released: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    events: Mutex<Vec<String>>,
    pending: Mutex<Option<FailAt>>,
}

impl Ledger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next matching device call fail.
    pub fn fail_next(&self, at: FailAt) {
        *self.pending.lock().unwrap() = Some(at);
    }

    /// Transient buffers allocated so far.
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::SeqCst)
    }

    /// Transient buffers currently alive.
    pub fn live_buffers(&self) -> usize {
        self.allocated() - self.released.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Acquire/release events of long-lived handles, oldest first.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Release events only, oldest first.
    pub fn releases(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| e.strip_prefix("release ").map(str::to_string))
            .collect()
    }

    fn should_fail(&self, at: FailAt) -> bool {
        let mut pending = self.pending.lock().unwrap();
        if *pending == Some(at) {
            *pending = None;
            return true;
        }
        false
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

/// A named long-lived resource (context, queue, program, kernel).
struct Handle {
    name: &'static str,
    ledger: Arc<Ledger>,
}

impl Handle {
    fn acquire(name: &'static str, ledger: &Arc<Ledger>) -> Self {
        ledger.record(format!("acquire {}", name));
        Self {
            name,
            ledger: Arc::clone(ledger),
        }
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        self.ledger.record(format!("release {}", self.name));
    }
}

pub struct MockKernel {
    _kernel: Handle,
    _program: Handle,
}

pub struct MockBuffer {
    data: Mutex<Vec<u8>>,
    ledger: Arc<Ledger>,
}

impl MockBuffer {
    fn new(data: Vec<u8>, ledger: &Arc<Ledger>) -> Self {
        ledger.allocated.fetch_add(1, Ordering::SeqCst);
        Self {
            data: Mutex::new(data),
            ledger: Arc::clone(ledger),
        }
    }

    fn bytes(&self) -> Vec<u8> {
        self.data.lock().unwrap().clone()
    }
}

impl Drop for MockBuffer {
    fn drop(&mut self) {
        self.ledger.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Queue is declared before context so it is released first.
pub struct MockDevice {
    ledger: Arc<Ledger>,
    lost: AtomicBool,
    _queue: Handle,
    _context: Handle,
}

impl MockDevice {
    pub fn new(ledger: &Arc<Ledger>) -> Self {
        let context = Handle::acquire("context", ledger);
        let queue = Handle::acquire("queue", ledger);
        Self {
            ledger: Arc::clone(ledger),
            lost: AtomicBool::new(false),
            _queue: queue,
            _context: context,
        }
    }

    fn fail(&self, at: FailAt, error: fn(String) -> GpuError) -> Result<(), GpuError> {
        if self.ledger.should_fail(at) {
            return Err(error(format!("injected {:?} failure", at)));
        }
        Ok(())
    }

    fn run_kernel(&self, bindings: &KernelBindings<'_, MockBuffer>, size: u32) -> Result<(), GpuError> {
        let uniforms: JuliaParams = bytemuck::pod_read_unaligned(&bindings.params.bytes());
        let words = words_of(&bindings.palette.bytes());
        let palette = ColorPalette::new(words.iter().map(|&w| Color::unpack(w)).collect())
            .map_err(|e| GpuError::Dispatch(e.to_string()))?;
        let params = GenerationParameters::new(
            Complex32::new(uniforms.c[0], uniforms.c[1]),
            uniforms.limit,
            uniforms.max_iterations,
            uniforms.size,
            palette,
        )
        .map_err(|e| GpuError::Dispatch(e.to_string()))?;

        let mut output = bindings.output.data.lock().unwrap();
        for y in 0..size {
            for x in 0..size {
                if let Some(i) = escape_index(x, y, &params) {
                    let word = words[i as usize % words.len()] | ESCAPED_FLAG;
                    let at = (y * size + x) as usize * 4;
                    output[at..at + 4].copy_from_slice(&word.to_le_bytes());
                }
            }
        }
        Ok(())
    }
}

fn words_of(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

impl ComputeDevice for MockDevice {
    type Buffer = MockBuffer;
    type Kernel = MockKernel;

    fn describe(&self) -> String {
        "mock device".to_string()
    }

    fn compile_kernel(&self, source: &str) -> Result<MockKernel, GpuError> {
        let program = Handle::acquire("program", &self.ledger);
        self.fail(FailAt::Compile, GpuError::ShaderCompilation)?;
        if !source.contains(KERNEL_ENTRY_POINT) {
            return Err(GpuError::PipelineError(format!(
                "entry point '{}' not found",
                KERNEL_ENTRY_POINT
            )));
        }
        let kernel = Handle::acquire("kernel", &self.ledger);
        Ok(MockKernel {
            _kernel: kernel,
            _program: program,
        })
    }

    fn create_output_buffer(&self, cells: usize) -> Result<MockBuffer, GpuError> {
        self.fail(FailAt::OutputBuffer, GpuError::BufferError)?;
        Ok(MockBuffer::new(vec![0; cells * 4], &self.ledger))
    }

    fn create_input_buffer(
        &self,
        _label: &'static str,
        contents: &[u8],
        role: BufferRole,
    ) -> Result<MockBuffer, GpuError> {
        let at = match role {
            BufferRole::Storage => FailAt::PaletteBuffer,
            BufferRole::Uniform => FailAt::ParamsBuffer,
        };
        self.fail(at, GpuError::BufferError)?;
        Ok(MockBuffer::new(contents.to_vec(), &self.ledger))
    }

    fn dispatch(
        &self,
        _kernel: &MockKernel,
        bindings: KernelBindings<'_, MockBuffer>,
        grid: [u32; 2],
    ) -> Result<Option<Duration>, GpuError> {
        if self.ledger.should_fail(FailAt::DeviceLoss) {
            self.lost.store(true, Ordering::SeqCst);
            return Err(GpuError::DeviceLost("injected device loss".to_string()));
        }
        self.fail(FailAt::Dispatch, GpuError::Dispatch)?;

        let running = self.ledger.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.ledger.max_in_flight.fetch_max(running, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(2));
        let result = self.run_kernel(&bindings, grid[0]);
        self.ledger.in_flight.fetch_sub(1, Ordering::SeqCst);

        result.map(|()| Some(MOCK_KERNEL_TIME))
    }

    fn read_output(&self, buffer: &MockBuffer, out: &mut [u32]) -> Result<(), GpuError> {
        self.fail(FailAt::Readback, GpuError::Readback)?;
        let words = words_of(&buffer.bytes());
        out.copy_from_slice(&words[..out.len()]);
        Ok(())
    }

    fn is_lost(&self) -> bool {
        self.lost.load(Ordering::SeqCst)
    }
}
