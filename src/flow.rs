//! Application event loop.
//!
//! [`run`] owns the winit event loop, the GPU [`Context`] and the RHI. The
//! application plugs in through [`GraphicsFlow`]:
//!
//! 1. `on_init` is called once the window, the device and the RHI exist
//! 2. `on_event` receives every window event that has an [`Event`] counterpart
//! 3. `on_update` is called once per frame to record clears and draws
//!
//! After `on_update` the recorded commands are submitted against the frame's
//! surface texture and the frame is presented.

use std::sync::Arc;

use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    config::RhiConfig,
    context::Context,
    error::RhiError,
    rhi::{RenderApiType, Rhi, create_rhi},
    window::{Event, translate},
};

/// Callbacks of an application driven by [`run`].
pub trait GraphicsFlow {
    /// Called once after the RHI was created. Load textures and render arrays
    /// here. An error aborts startup.
    fn on_init(&mut self, rhi: &mut dyn Rhi) -> anyhow::Result<()>;

    fn on_event(&mut self, event: &Event);

    /// Called every frame with the time elapsed since the previous one.
    /// An error stops the event loop and is returned from [`run`].
    fn on_update(&mut self, rhi: &mut dyn Rhi, dt: Duration) -> anyhow::Result<()>;
}

struct AppState {
    ctx: Context,
    rhi: Box<dyn Rhi>,
}

impl AppState {
    fn window(&self) -> Option<&Arc<Window>> {
        self.ctx.window()
    }

    fn render<F: GraphicsFlow>(&mut self, flow: &mut F, dt: Duration) -> anyhow::Result<()> {
        let frame = match self.ctx.surface_texture() {
            None => return Ok(()),
            Some(Ok(frame)) => frame,
            Some(Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                if let Some(size) = self.window().map(|w| w.inner_size()) {
                    self.ctx.resize(size.width, size.height);
                }
                return Ok(());
            }
            Some(Err(wgpu::SurfaceError::OutOfMemory)) => {
                anyhow::bail!("the surface ran out of memory")
            }
            Some(Err(e)) => {
                log::warn!("Skipping frame: {}", e);
                return Ok(());
            }
        };

        flow.on_update(self.rhi.as_mut(), dt)?;
        self.rhi.submit(&frame.texture);
        frame.present();
        Ok(())
    }
}

struct App<F: GraphicsFlow> {
    config: RhiConfig,
    async_runtime: tokio::runtime::Runtime,
    flow: F,
    state: Option<AppState>,
    last_time: Instant,
    /// First fatal error; the loop exits as soon as it is set.
    error: Option<anyhow::Error>,
}

impl<F: GraphicsFlow> App<F> {
    fn new(config: RhiConfig, flow: F) -> anyhow::Result<Self> {
        Ok(Self {
            config,
            async_runtime: tokio::runtime::Runtime::new()?,
            flow,
            state: None,
            last_time: Instant::now(),
            error: None,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.error.get_or_insert(error);
        event_loop.exit();
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<AppState> {
        let props = &self.config.window;
        let attributes = Window::default_attributes()
            .with_title(props.title.clone())
            .with_inner_size(PhysicalSize::new(props.width, props.height));
        let window = Arc::new(event_loop.create_window(attributes)?);

        let ctx = self
            .async_runtime
            .block_on(Context::new(&self.config, Some(window.clone())))?;
        let mut rhi = create_rhi(&self.config, &ctx.gpu)?;
        self.flow.on_init(rhi.as_mut())?;
        window.request_redraw();
        Ok(AppState { ctx, rhi })
    }
}

impl<F: GraphicsFlow> ApplicationHandler for App<F> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        match self.init(event_loop) {
            Ok(state) => {
                self.state = Some(state);
                self.last_time = Instant::now();
            }
            Err(e) => self.fail(event_loop, e.context("startup failed")),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };

        if let Some(translated) = translate(&event) {
            self.flow.on_event(&translated);
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.ctx.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();
                let result = state.render(&mut self.flow, dt);
                if let Some(window) = state.window() {
                    window.request_redraw();
                }
                if let Err(e) = result {
                    self.fail(event_loop, e);
                }
            }
            _ => {}
        }
    }
}

/// Opens a window for `config` and drives `flow` until the window is closed.
///
/// Backend selection errors abort startup and are returned, as is the first
/// error returned by one of the callbacks.
pub fn run<F: GraphicsFlow + 'static>(config: RhiConfig, flow: F) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    if config.api == RenderApiType::None {
        return Err(RhiError::UnsupportedBackend(config.api.to_string()).into());
    }

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, flow)?;
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
