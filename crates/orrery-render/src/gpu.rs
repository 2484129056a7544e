//! Adapter, device and swapchain setup for the orrery window.

use std::sync::Arc;
use winit::window::Window;

/// Why the GPU could not be brought up for the window.
#[derive(Debug, thiserror::Error)]
pub enum RenderContextError {
    #[error("no GPU adapter can present to this window")]
    NoAdapter,

    #[error("GPU device request rejected: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    #[error("window surface unavailable: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
}

/// Frame acquisition outcome the frame loop has to react to.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    /// Still unusable after one reconfigure; the caller resizes and retries next frame.
    #[error("swapchain lost")]
    Lost,

    #[error("GPU out of memory")]
    OutOfMemory,

    /// Skip this frame.
    #[error("swapchain acquire timed out")]
    Timeout,
}

/// GPU handles shared by the renderer, plus the window's swapchain.
pub struct RenderContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: wgpu::Surface<'static>,
    pub surface_config: wgpu::SurfaceConfiguration,
    pub surface_format: wgpu::TextureFormat,
}

impl RenderContext {
    pub async fn new(window: Arc<Window>, vsync: bool) -> Result<Self, RenderContextError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let initial = window.inner_size();
        let surface = instance.create_surface(window)?;
        let adapter = pick_adapter(&instance, &surface).await?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("orrery-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_config = swapchain_config(
            &surface.get_capabilities(&adapter),
            initial.width,
            initial.height,
            vsync,
        );
        surface.configure(&device, &surface_config);
        log::info!(
            "Swapchain {}x{} format={:?} present={:?}",
            surface_config.width,
            surface_config.height,
            surface_config.format,
            surface_config.present_mode
        );

        Ok(Self {
            surface_format: surface_config.format,
            instance,
            adapter,
            device,
            queue,
            surface,
            surface_config,
        })
    }

    /// Reconfigure the swapchain for a new physical size; zero extents become 1.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface_config.width = width.max(1);
        self.surface_config.height = height.max(1);
        self.surface.configure(&self.device, &self.surface_config);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    /// Acquire the next swapchain image. A lost or outdated swapchain gets one reconfigure.
    pub fn get_current_texture(&self) -> Result<wgpu::SurfaceTexture, SurfaceError> {
        let first = match self.surface.get_current_texture() {
            Ok(frame) => return Ok(frame),
            Err(err) => err,
        };
        match first {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                log::warn!("Swapchain {first:?}, reconfiguring");
                self.surface.configure(&self.device, &self.surface_config);
                self.surface.get_current_texture().map_err(|retry| {
                    log::warn!("Swapchain still unusable after reconfigure: {retry:?}");
                    SurfaceError::Lost
                })
            }
            wgpu::SurfaceError::OutOfMemory => Err(SurfaceError::OutOfMemory),
            wgpu::SurfaceError::Timeout => Err(SurfaceError::Timeout),
            wgpu::SurfaceError::Other => {
                log::error!("Swapchain acquire failed for an unspecified reason");
                Err(SurfaceError::Lost)
            }
        }
    }
}

/// Blocking wrapper around [`RenderContext::new`] for the winit event loop.
pub fn init_render_context_blocking(
    window: Arc<Window>,
    vsync: bool,
) -> Result<RenderContext, RenderContextError> {
    pollster::block_on(RenderContext::new(window, vsync))
}

async fn pick_adapter(
    instance: &wgpu::Instance,
    surface: &wgpu::Surface<'static>,
) -> Result<wgpu::Adapter, RenderContextError> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(surface),
            force_fallback_adapter: false,
        })
        .await
        .map_err(|_| RenderContextError::NoAdapter)?;
    let info = adapter.get_info();
    log::info!("Adapter: {} {:?}/{:?}", info.name, info.backend, info.device_type);
    Ok(adapter)
}

fn swapchain_config(
    caps: &wgpu::SurfaceCapabilities,
    width: u32,
    height: u32,
    vsync: bool,
) -> wgpu::SurfaceConfiguration {
    wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: surface_format(&caps.formats),
        width: width.max(1),
        height: height.max(1),
        present_mode: present_mode(&caps.present_modes, vsync),
        alpha_mode: caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto),
        view_formats: Vec::new(),
        desired_maximum_frame_latency: 2,
    }
}

/// sRGB output, BGRA before RGBA. Falls back to whatever the surface lists first.
fn surface_format(available: &[wgpu::TextureFormat]) -> wgpu::TextureFormat {
    use wgpu::TextureFormat as F;
    [F::Bgra8UnormSrgb, F::Rgba8UnormSrgb]
        .into_iter()
        .find(|f| available.contains(f))
        .or_else(|| available.iter().copied().find(F::is_srgb))
        .or_else(|| available.first().copied())
        .unwrap_or(F::Bgra8UnormSrgb)
}

fn present_mode(available: &[wgpu::PresentMode], vsync: bool) -> wgpu::PresentMode {
    use wgpu::PresentMode as P;
    if vsync {
        return P::Fifo;
    }
    [P::Mailbox, P::Immediate]
        .into_iter()
        .find(|m| available.contains(m))
        .unwrap_or(P::Fifo)
}
