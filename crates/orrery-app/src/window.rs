//! Window creation and event handling via winit.
//!
//! [`OrreryApp`] implements winit's [`ApplicationHandler`]: it opens the
//! window, sets up the GPU and asset loader on `resumed`, and runs one
//! [`SceneSession`] frame per `RedrawRequested`.

use std::sync::Arc;
use std::time::Duration;

use orrery_assets::{AssetLoader, DecodedImage, EnvironmentImage, LoaderConfig};
use orrery_config::Config;
use orrery_render::{
    RenderContext, SceneRenderer, SurfaceError, TextureError, init_render_context_blocking,
    supported_sample_count,
};
use orrery_scene::MeshSlot;
use tracing::{debug, error, info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use crate::frame_loop::FrameLoop;
use crate::session::{AssetSink, SceneSession};

/// Frames between periodic frame-rate log lines.
const STATS_INTERVAL_FRAMES: u64 = 600;

/// Returns [`WindowAttributes`] based on the given configuration.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    let attributes = WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ));
    if config.window.fullscreen {
        attributes.with_fullscreen(Some(Fullscreen::Borderless(None)))
    } else {
        attributes
    }
}

/// Device, surface and scene renderer, created together once the window exists.
struct GpuState {
    ctx: RenderContext,
    renderer: SceneRenderer,
}

impl GpuState {
    fn resize(&mut self, width: u32, height: u32) {
        self.ctx.resize(width, height);
        self.renderer.resize(&self.ctx.device, width, height);
    }
}

impl AssetSink for GpuState {
    fn apply_map(&mut self, slot: MeshSlot, image: &DecodedImage) -> Result<(), TextureError> {
        self.renderer
            .apply_map(&self.ctx.device, &self.ctx.queue, slot, image)
    }

    fn apply_environment(&mut self, environment: &EnvironmentImage) -> Result<(), TextureError> {
        self.renderer
            .apply_environment(&self.ctx.device, &self.ctx.queue, environment)
    }
}

pub struct OrreryApp {
    config: Config,
    frame_loop: FrameLoop,
    window: Option<Arc<Window>>,
    session: Option<SceneSession>,
    gpu: Option<GpuState>,
    loader: Option<AssetLoader>,
}

impl OrreryApp {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            frame_loop: FrameLoop::new(),
            window: None,
            session: None,
            gpu: None,
            loader: None,
        }
    }

    pub fn frame_loop(&self) -> &FrameLoop {
        &self.frame_loop
    }

    fn start_loading(&mut self, session: &mut SceneSession, max_dimension: u32) {
        let assets = &self.config.assets;
        let loader = AssetLoader::new(LoaderConfig {
            worker_threads: assets.worker_threads,
            http_timeout: Duration::from_secs(assets.http_timeout_secs),
            max_dimension,
            ..Default::default()
        });

        let requests = session.asset_requests(&self.config);
        let loader = match loader {
            Ok(loader) => loader,
            Err(e) => {
                warn!("Asset loader unavailable: {e}");
                for request in requests {
                    session.abandon(request.target);
                }
                return;
            }
        };

        for request in requests {
            if let Err(request) = loader.submit(request) {
                session.abandon(request.target);
            }
        }
        info!("Loading {} assets", loader.in_flight_count());
        self.loader = Some(loader);
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(session), Some(gpu)) = (&mut self.session, &mut self.gpu) else {
            return;
        };

        if !self.frame_loop.tick(|elapsed| session.advance_frame(elapsed)) {
            return;
        }

        if let Some(loader) = &self.loader {
            for outcome in loader.drain_outcomes() {
                session.apply_outcome(outcome, gpu);
            }
        }

        match gpu.renderer.render(&gpu.ctx, &session.scene, &session.camera) {
            Ok(()) => {}
            Err(SurfaceError::Lost) => {
                let size = session.surface().physical_size();
                gpu.ctx.resize(size.width, size.height);
            }
            Err(SurfaceError::OutOfMemory) => {
                error!("GPU out of memory");
                self.frame_loop.stop();
                event_loop.exit();
                return;
            }
            Err(SurfaceError::Timeout) => {
                warn!("Surface timeout, skipping frame");
            }
        }

        let frames = self.frame_loop.frame_count();
        if frames % STATS_INTERVAL_FRAMES == 0 {
            let seconds = self.frame_loop.elapsed().as_secs_f64();
            debug!(
                "{frames} frames in {seconds:.1}s ({:.1} fps)",
                frames as f64 / seconds.max(f64::EPSILON)
            );
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for OrreryApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(window_attributes_from_config(&self.config)) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        let mut session =
            SceneSession::new(&self.config, size.width, size.height, window.scale_factor());
        info!(
            "Window created: {}x{} (scale: {:.2})",
            size.width,
            size.height,
            window.scale_factor()
        );

        let ctx = match init_render_context_blocking(window.clone(), self.config.window.vsync) {
            Ok(ctx) => ctx,
            Err(e) => {
                error!("GPU initialization failed: {e}");
                event_loop.exit();
                return;
            }
        };

        let sample_count = supported_sample_count(
            &ctx.adapter,
            ctx.surface_format,
            self.config.render.msaa_samples,
        );
        let (width, height) = ctx.size();
        let renderer = SceneRenderer::new(
            &ctx.device,
            &ctx.queue,
            ctx.surface_format,
            width,
            height,
            sample_count,
            &session.scene,
            &session.camera,
            &self.config.render,
        );

        self.start_loading(&mut session, renderer.max_texture_dimension());

        window.request_redraw();
        self.gpu = Some(GpuState { ctx, renderer });
        self.session = Some(session);
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!(
                    "Close requested after {} frames, shutting down",
                    self.frame_loop.frame_count()
                );
                self.frame_loop.stop();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                let Some(session) = &mut self.session else {
                    return;
                };
                if let Some(resize) = session.resize(new_size.width, new_size.height) {
                    let (w, h) = (resize.physical.width, resize.physical.height);
                    if let Some(gpu) = &mut self.gpu {
                        gpu.resize(w, h);
                    }
                    info!(
                        "Window resized to {}x{} (scale: {:.2})",
                        w, h, resize.scale_factor
                    );
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                let (Some(session), Some(window)) = (&mut self.session, &self.window) else {
                    return;
                };
                let size = window.inner_size();
                if let Some(resize) = session.rescale(scale_factor, size.width, size.height) {
                    let (w, h) = (resize.physical.width, resize.physical.height);
                    if let Some(gpu) = &mut self.gpu {
                        gpu.resize(w, h);
                    }
                    info!("Scale factor changed to {:.2} ({}x{})", scale_factor, w, h);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(session) = &self.session {
            let tracker = session.tracker();
            debug!(
                "Exiting with {} assets applied, {} failed, {} pending",
                tracker.applied_count(),
                tracker.failed_count(),
                tracker.pending_count()
            );
        }
        // Close the request channel so idle workers exit.
        if let Some(loader) = self.loader.take() {
            debug!(
                "Stopping {} asset workers, {} requests in flight",
                loader.live_workers(),
                loader.in_flight_count()
            );
        }
    }
}

/// Creates an event loop and runs the application with the given config.
///
/// This function blocks until the window is closed.
#[instrument(skip(config))]
pub fn run(config: Config) -> Result<(), winit::error::EventLoopError> {
    let event_loop = EventLoop::new()?;
    let mut app = OrreryApp::new(config);
    event_loop.run_app(&mut app)
}
