//! Adapter selection and device initialization.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::GpuError;

/// Picks an adapter by a free-form platform string.
///
/// The string is matched case-insensitively as a substring of the adapter
/// name, the vendor name (`nvidia`, `amd`, `intel`, ...) or the graphics API
/// (`vulkan`, `metal`, `dx12`, `gl`). `None` takes the default
/// high-performance adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSelector {
    platform: Option<String>,
}

impl DeviceSelector {
    pub fn new(platform: Option<String>) -> Self {
        let platform = platform
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty());
        Self { platform }
    }

    pub fn any() -> Self {
        Self::default()
    }

    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    pub fn matches(&self, adapter: &AdapterSummary) -> bool {
        let Some(wanted) = &self.platform else {
            return true;
        };
        [&adapter.name, &adapter.vendor, &adapter.backend]
            .iter()
            .any(|field| field.to_lowercase().contains(wanted.as_str()))
    }
}

impl fmt::Display for DeviceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.platform.as_deref().unwrap_or("default"))
    }
}

/// Host-side description of an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterSummary {
    pub name: String,
    pub vendor: String,
    pub device_type: String,
    pub backend: String,
}

impl From<&wgpu::AdapterInfo> for AdapterSummary {
    fn from(info: &wgpu::AdapterInfo) -> Self {
        Self {
            name: info.name.clone(),
            vendor: vendor_name(info.vendor).to_string(),
            device_type: format!("{:?}", info.device_type),
            backend: info.backend.to_str().to_string(),
        }
    }
}

impl fmt::Display for AdapterSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] ({}, {})",
            self.name, self.vendor, self.device_type, self.backend
        )
    }
}

/// Vendor name for a PCI vendor id.
pub fn vendor_name(id: u32) -> &'static str {
    match id {
        0x10DE => "nvidia",
        0x1002 | 0x1022 => "amd",
        0x8086 => "intel",
        0x106B => "apple",
        0x13B5 => "arm",
        0x5143 => "qualcomm",
        0x1010 => "imagination",
        0x10005 => "mesa",
        _ => "unknown",
    }
}

pub(crate) fn create_instance() -> wgpu::Instance {
    wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    })
}

/// Check if any adapter is present without creating a device.
pub fn is_available() -> bool {
    let instance = create_instance();
    pollster::block_on(async {
        instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .is_some()
    })
}

/// Every adapter visible on this host.
pub fn list_adapters() -> Vec<AdapterSummary> {
    create_instance()
        .enumerate_adapters(wgpu::Backends::all())
        .iter()
        .map(|adapter| AdapterSummary::from(&adapter.get_info()))
        .collect()
}

fn select_adapter(
    instance: &wgpu::Instance,
    selector: &DeviceSelector,
) -> Result<wgpu::Adapter, GpuError> {
    match selector.platform() {
        None => pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or(GpuError::NoAdapter(None)),
        Some(platform) => instance
            .enumerate_adapters(wgpu::Backends::all())
            .into_iter()
            .find(|adapter| selector.matches(&AdapterSummary::from(&adapter.get_info())))
            .ok_or_else(|| GpuError::NoAdapter(Some(platform.to_string()))),
    }
}

/// Everything produced by a successful initialization.
pub(crate) struct Initialized {
    pub instance: wgpu::Instance,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_info: wgpu::AdapterInfo,
    pub lost: Arc<AtomicBool>,
}

/// Select an adapter and request its device and queue.
///
/// Timestamp queries are requested when the adapter offers them so that
/// kernel time can be measured on the device.
pub(crate) async fn initialize_device(selector: &DeviceSelector) -> Result<Initialized, GpuError> {
    let instance = create_instance();
    let adapter = select_adapter(&instance, selector)?;
    let adapter_info = adapter.get_info();
    let adapter_limits = adapter.limits();

    // Large grids need more than the default 128 MiB storage binding.
    let limits = wgpu::Limits {
        max_storage_buffer_binding_size: adapter_limits.max_storage_buffer_binding_size,
        max_buffer_size: adapter_limits.max_buffer_size,
        max_compute_workgroups_per_dimension: adapter_limits.max_compute_workgroups_per_dimension,
        ..Default::default()
    };

    let required_features = adapter.features() & wgpu::Features::TIMESTAMP_QUERY;

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("julia-gpu"),
                required_features,
                required_limits: limits,
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        )
        .await
        .map_err(|e| GpuError::DeviceRequest(e.to_string()))?;

    let lost = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&lost);
    device.set_device_lost_callback(move |reason, message| {
        // Our own teardown reports these; only real losses matter.
        if !matches!(
            reason,
            wgpu::DeviceLostReason::Destroyed | wgpu::DeviceLostReason::Dropped
        ) {
            log::error!("GPU device lost ({:?}): {}", reason, message);
            flag.store(true, Ordering::SeqCst);
        }
    });
    device.on_uncaptured_error(Box::new(|err| {
        log::error!("Uncaptured GPU error: {}", err);
    }));

    Ok(Initialized {
        instance,
        device,
        queue,
        adapter_info,
        lost,
    })
}
