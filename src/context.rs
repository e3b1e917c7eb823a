//! GPU context for the selected backend.
//!
//! [`Context`] owns the wgpu instance, adapter, device and queue and, when it
//! is created for a window, the surface frames are presented to. [`Gpu`] is the
//! cheap, cloneable part of it that resources are created from.

use std::sync::Arc;

use winit::window::Window;

use crate::{config::RhiConfig, error::RhiError, rhi::RenderApiType};

/// Device and queue of one backend.
///
/// wgpu handles are reference counted internally, so cloning a `Gpu` only
/// clones the references.
#[derive(Clone, Debug)]
pub struct Gpu {
    pub api: RenderApiType,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

/// A configured window surface.
#[derive(Debug)]
pub struct WindowSurface {
    pub surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,
}

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Option<Arc<Window>>,
    pub adapter: wgpu::Adapter,
    pub gpu: Gpu,
    pub surface: Option<WindowSurface>,
}

impl Context {
    /// Creates the device for `config.api`, presenting to `window` if given.
    ///
    /// Without a window the context is headless; that is also the only way the
    /// `Noop` backend can be used.
    ///
    /// # Arguments
    ///
    /// * `config` selects the backend and the adapter power preference, plus the vsync mode of the surface
    /// * `window` is the window to present to, `None` for a headless context
    pub async fn new(config: &RhiConfig, window: Option<Arc<Window>>) -> Result<Self, RhiError> {
        let api = config.api;
        let backends = api
            .backends()
            .ok_or_else(|| RhiError::UnsupportedBackend(api.to_string()))?;

        log::info!("Creating {} instance", api);
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            backend_options: wgpu::BackendOptions {
                noop: wgpu::NoopBackendOptions {
                    enable: api == RenderApiType::Noop,
                },
                ..Default::default()
            },
            ..Default::default()
        });

        let surface = match &window {
            Some(window) => Some(instance.create_surface(window.clone())?),
            None => None,
        };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: if config.high_performance {
                    wgpu::PowerPreference::HighPerformance
                } else {
                    wgpu::PowerPreference::default()
                },
                compatible_surface: surface.as_ref(),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| RhiError::AdapterUnavailable {
                api,
                reason: e.to_string(),
            })?;
        let info = adapter.get_info();
        log::info!("Using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("gameworld device"),
                required_features: wgpu::Features::empty(),
                required_limits: match api {
                    // GL drivers often only reach the downlevel limits.
                    RenderApiType::OpenGl => wgpu::Limits::downlevel_webgl2_defaults(),
                    _ => wgpu::Limits::default(),
                },
                ..Default::default()
            })
            .await?;

        let surface = surface.map(|surface| {
            let size = window
                .as_ref()
                .map(|window| window.inner_size())
                .unwrap_or_default();
            let surface_caps = surface.get_capabilities(&adapter);
            // Shaders are written against an sRGB target; fall back to whatever
            // the surface offers first.
            let surface_format = surface_caps
                .formats
                .iter()
                .copied()
                .find(|f| f.is_srgb())
                .unwrap_or(surface_caps.formats[0]);
            let surface_config = wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format: surface_format,
                width: size.width.max(1),
                height: size.height.max(1),
                present_mode: present_mode(config.window.vsync),
                alpha_mode: surface_caps.alpha_modes[0],
                view_formats: vec![],
                desired_maximum_frame_latency: 2,
            };
            surface.configure(&device, &surface_config);
            WindowSurface {
                surface,
                config: surface_config,
            }
        });

        Ok(Self {
            window,
            adapter,
            gpu: Gpu { api, device, queue },
            surface,
        })
    }

    pub fn window(&self) -> Option<&Arc<Window>> {
        self.window.as_ref()
    }

    /// Reconfigures the surface for a new window size. Zero sized windows
    /// (minimised) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if let Some(ws) = &mut self.surface {
            ws.config.width = width;
            ws.config.height = height;
            ws.surface.configure(&self.gpu.device, &ws.config);
        }
    }

    pub fn set_vsync(&mut self, enabled: bool) {
        if let Some(ws) = &mut self.surface {
            ws.config.present_mode = present_mode(enabled);
            ws.surface.configure(&self.gpu.device, &ws.config);
        }
    }

    pub fn is_vsync(&self) -> bool {
        self.surface
            .as_ref()
            .is_some_and(|ws| ws.config.present_mode == wgpu::PresentMode::AutoVsync)
    }

    pub fn surface_format(&self) -> Option<wgpu::TextureFormat> {
        self.surface.as_ref().map(|ws| ws.config.format)
    }

    /// The texture the next frame is rendered to.
    pub fn surface_texture(&self) -> Option<Result<wgpu::SurfaceTexture, wgpu::SurfaceError>> {
        self.surface
            .as_ref()
            .map(|ws| ws.surface.get_current_texture())
    }
}

fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::AutoVsync
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}
