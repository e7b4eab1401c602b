//! Device and surface setup for the transform pipeline.
//!
//! One [`GpuContext`] is opened per winit [`Window`] and lent to
//! [`TransformPipeline`](crate::TransformPipeline), [`ObjectBinding`](crate::ObjectBinding)
//! allocation, and [`Mesh`](crate::Mesh) uploads.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vertform::GpuContext;
//! # fn demo(window: Arc<winit::window::Window>) -> Result<(), vertform::GpuError> {
//! let mut gpu = GpuContext::new(window)?;
//! gpu.resize(1280, 720);
//! println!("{}x{} (aspect: {})", gpu.width(), gpu.height(), gpu.aspect());
//! # Ok(())
//! # }
//! ```
//!
//! [`Window`]: winit::window::Window

use std::sync::Arc;
use winit::window::Window;

/// Errors that can occur while acquiring GPU resources.
#[derive(Debug)]
pub enum GpuError {
    /// The window could not be turned into a rendering surface.
    NoSurface(String),
    /// No adapter is compatible with the surface.
    NoCompatibleAdapter(String),
    /// The adapter refused to hand out a device.
    NoCompatibleDevice(String),
    /// The surface reports no texture formats for the chosen adapter.
    NoSurfaceFormat,
}

impl std::fmt::Display for GpuError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuError::NoSurface(msg) => write!(f, "Failed to create surface: {}", msg),
            GpuError::NoCompatibleAdapter(msg) => {
                write!(f, "No compatible graphics adapter found: {}", msg)
            }
            GpuError::NoCompatibleDevice(msg) => {
                write!(f, "No compatible graphics device found: {}", msg)
            }
            GpuError::NoSurfaceFormat => write!(f, "Surface supports no texture formats"),
        }
    }
}

impl std::error::Error for GpuError {}

/// The device, queue, and window surface that every pipeline and mesh allocates from.
///
/// Fields are public so callers can record their own passes around [`TransformPipeline`]
/// draws.
///
/// [`TransformPipeline`]: crate::TransformPipeline
pub struct GpuContext {
    /// Presentation target; its format is the default pipeline color target.
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    /// Receives uniform uploads and the frame's command buffers.
    pub queue: wgpu::Queue,
    /// Surface format and size. Depth buffers follow `width` and `height`.
    pub config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    /// Opens the default adapter for `window` and configures its surface.
    ///
    /// Prefers an sRGB surface format and presents with Fifo. Every failure along the way is
    /// reported as a [`GpuError`] instead of a panic.
    pub fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| GpuError::NoSurface(e.to_string()))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|e| GpuError::NoCompatibleAdapter(e.to_string()))?;

        let info = adapter.get_info();
        log::info!("Using adapter '{}' ({:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Vertform Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
            experimental_features: Default::default(),
        }))
        .map_err(|e| GpuError::NoCompatibleDevice(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::NoSurfaceFormat)?;
        log::debug!("Surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
        })
    }

    /// Reconfigures the surface. Zero sizes (a minimized window) are skipped.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Surface width in pixels.
    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    /// Width over height, for building a host-side projection.
    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }
}
