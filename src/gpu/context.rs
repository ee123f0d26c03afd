//! GPU context initialization and management.

use std::sync::Arc;
use wgpu::{Adapter, Backends, Device, Instance, PowerPreference, Queue};

/// Errors that can occur during GPU operations.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("No suitable GPU adapter found")]
    NoAdapter,
    #[error("Failed to request device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
    #[error("Failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("Surface has zero size")]
    ZeroSizedSurface,
    #[error("Surface {width}x{height} exceeds the device limit of {max} pixels per side")]
    SurfaceTooLarge { width: u32, height: u32, max: u32 },
    #[error("Surface supports no formats on this adapter")]
    NoSurfaceFormat,
    #[error("Failed to map readback buffer: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),
    #[error("Device poll failed: {0}")]
    Poll(#[from] wgpu::PollError),
    #[error("Readback callback was dropped before completing")]
    ReadbackCancelled,
}

/// Adapter selection options.
#[derive(Debug, Clone)]
pub struct GpuOptions {
    pub backends: Backends,
    pub power_preference: PowerPreference,
    /// Request a software adapter (e.g. llvmpipe, WARP).
    pub force_fallback_adapter: bool,
}

impl Default for GpuOptions {
    fn default() -> Self {
        Self {
            backends: Backends::all(),
            power_preference: PowerPreference::HighPerformance,
            force_fallback_adapter: false,
        }
    }
}

impl GpuOptions {
    /// Read `SPHERE_FRAME_BACKEND` and `SPHERE_FRAME_FALLBACK` on top of the defaults.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Ok(name) = std::env::var("SPHERE_FRAME_BACKEND") {
            match parse_backends(&name) {
                Some(backends) => options.backends = backends,
                None => log::warn!("Ignoring unknown SPHERE_FRAME_BACKEND '{}'", name),
            }
        }
        if let Ok(flag) = std::env::var("SPHERE_FRAME_FALLBACK") {
            options.force_fallback_adapter = matches!(flag.as_str(), "1" | "true" | "yes");
        }
        options
    }

    pub(crate) fn create_instance(&self) -> Instance {
        Instance::new(&wgpu::InstanceDescriptor {
            backends: self.backends,
            ..Default::default()
        })
    }
}

/// Parse a comma-separated backend list such as `"vulkan,gl"`.
pub fn parse_backends(names: &str) -> Option<Backends> {
    let mut backends = Backends::empty();
    for name in names.split(',').map(|s| s.trim().to_lowercase()) {
        backends |= match name.as_str() {
            "vulkan" | "vk" => Backends::VULKAN,
            "metal" | "mtl" => Backends::METAL,
            "dx12" | "d3d12" => Backends::DX12,
            "gl" | "gles" | "opengl" => Backends::GL,
            "all" => Backends::all(),
            _ => return None,
        };
    }
    (!backends.is_empty()).then_some(backends)
}

/// GPU context holding device and queue for rendering.
pub struct GpuContext {
    pub instance: Instance,
    pub adapter: Arc<Adapter>,
    pub device: Arc<Device>,
    pub queue: Arc<Queue>,
}

impl GpuContext {
    /// Create a new GPU context for headless rendering with default options.
    pub async fn new() -> Result<Self, GpuError> {
        Self::with_options(GpuOptions::default()).await
    }

    /// Create a headless GPU context with explicit adapter options.
    pub async fn with_options(options: GpuOptions) -> Result<Self, GpuError> {
        let instance = options.create_instance();
        Self::from_instance(instance, &options, None).await
    }

    /// Create a context from an existing instance.
    ///
    /// Pass the window surface when there is one so the adapter can present to it.
    pub async fn from_instance(
        instance: Instance,
        options: &GpuOptions,
        compatible_surface: Option<&wgpu::Surface<'_>>,
    ) -> Result<Self, GpuError> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: options.power_preference,
                force_fallback_adapter: options.force_fallback_adapter,
                compatible_surface,
            })
            .await
            .map_err(|_| GpuError::NoAdapter)?;

        let info = adapter.get_info();
        log::info!("Using GPU adapter '{}' ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("sphere-frame"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;

        Ok(Self {
            instance,
            adapter: Arc::new(adapter),
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }

    /// Check that a `width` x `height` color target can be created on this device.
    pub fn check_surface_size(&self, width: u32, height: u32) -> Result<(), GpuError> {
        if width == 0 || height == 0 {
            return Err(GpuError::ZeroSizedSurface);
        }
        let max = self.device.limits().max_texture_dimension_2d;
        if width > max || height > max {
            return Err(GpuError::SurfaceTooLarge { width, height, max });
        }
        Ok(())
    }

    /// Get info about the GPU adapter.
    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }
}
