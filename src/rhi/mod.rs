//! Render hardware interface.
//!
//! [`Rhi`] is the one command surface clears and draws flow through. The
//! backend is chosen once from [`RenderApiType`] by [`create_rhi`] and stays
//! fixed for the lifetime of the returned instance; nothing re-checks it per
//! call.
//!
//! Commands are recorded, not executed immediately: [`Rhi::submit`] groups them
//! into render passes against the frame's target texture and hands one command
//! buffer to the queue.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    config::RhiConfig, context::Gpu, data_structures::render_array::RenderArray,
    error::RhiError,
};

pub mod backend;

pub use backend::WgpuRhi;

/// Which graphics API the RHI is realised with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderApiType {
    /// No backend. Selecting it is a startup error.
    None,
    OpenGl,
    Vulkan,
    Metal,
    Dx12,
    /// Whatever wgpu considers primary on this platform (Vulkan, Metal, DX12 or
    /// browser WebGPU).
    #[default]
    Primary,
    /// wgpu's no-op backend: every call is accepted, nothing is executed.
    Noop,
}

impl RenderApiType {
    /// The wgpu backends this selection maps to, `None` for [`RenderApiType::None`].
    pub fn backends(self) -> Option<wgpu::Backends> {
        match self {
            RenderApiType::None => None,
            RenderApiType::OpenGl => Some(wgpu::Backends::GL),
            RenderApiType::Vulkan => Some(wgpu::Backends::VULKAN),
            RenderApiType::Metal => Some(wgpu::Backends::METAL),
            RenderApiType::Dx12 => Some(wgpu::Backends::DX12),
            RenderApiType::Primary => Some(wgpu::Backends::PRIMARY),
            RenderApiType::Noop => Some(wgpu::Backends::NOOP),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RenderApiType::None => "none",
            RenderApiType::OpenGl => "opengl",
            RenderApiType::Vulkan => "vulkan",
            RenderApiType::Metal => "metal",
            RenderApiType::Dx12 => "dx12",
            RenderApiType::Primary => "primary",
            RenderApiType::Noop => "noop",
        }
    }
}

impl fmt::Display for RenderApiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RenderApiType {
    type Err = RhiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(RenderApiType::None),
            "opengl" | "gl" => Ok(RenderApiType::OpenGl),
            "vulkan" | "vk" => Ok(RenderApiType::Vulkan),
            "metal" => Ok(RenderApiType::Metal),
            "dx12" | "d3d12" => Ok(RenderApiType::Dx12),
            "primary" | "auto" => Ok(RenderApiType::Primary),
            "noop" => Ok(RenderApiType::Noop),
            _ => Err(RhiError::UnsupportedBackend(s.to_string())),
        }
    }
}

/// Passing this as the index count of [`Rhi::draw_elements`] draws every index
/// stored in the render array.
pub const USE_ARRAY_INDEX_COUNT: u32 = 0;

/// Upper bound on the texture-unit table, whatever the device reports for
/// `max_bind_groups`.
pub const MAX_TEXTURE_UNITS: u32 = 16;

/// The backend-independent command surface.
///
/// Texture units, the bound pipeline and the clear color are persistent state:
/// they stay in effect until they are changed again, no matter who changed them.
pub trait Rhi {
    /// The backend selection this instance was created for.
    fn api_type(&self) -> RenderApiType;

    /// Device and queue resources for this backend are created from.
    fn gpu(&self) -> &Gpu;

    /// Sets the color used by the next [`Rhi::clear_buffer`].
    fn set_clear_color(&mut self, color: wgpu::Color);

    fn clear_color(&self) -> wgpu::Color;

    /// Clears the color target (and the depth buffer, if any) to the current
    /// clear color.
    fn clear_buffer(&mut self);

    /// Binds the pipeline subsequent draws are recorded with.
    fn set_pipeline(&mut self, pipeline: &wgpu::RenderPipeline);

    /// Binds `bind_group` to texture unit `slot`; `None` unbinds the unit.
    fn bind_texture_unit(
        &mut self,
        slot: u32,
        bind_group: Option<&wgpu::BindGroup>,
    ) -> Result<(), RhiError>;

    /// Records an indexed draw of `array`.
    ///
    /// An `index_count` of [`USE_ARRAY_INDEX_COUNT`] (zero) draws the array's
    /// own index count, any other value draws exactly that many indices.
    fn draw_elements(&mut self, array: &RenderArray, index_count: u32) -> Result<(), RhiError>;

    /// Encodes everything recorded since the last submit against `target` and
    /// submits it. Returns `None` if nothing was recorded.
    fn submit(&mut self, target: &wgpu::Texture) -> Option<wgpu::SubmissionIndex>;
}

/// Builds the RHI for `config.api` on top of `gpu`.
///
/// Fails with [`RhiError::UnsupportedBackend`] when no backend is selected and
/// with [`RhiError::BackendMismatch`] when `gpu` was created for a different
/// backend. Both are startup errors; there is nothing to fall back to.
pub fn create_rhi(config: &RhiConfig, gpu: &Gpu) -> Result<Box<dyn Rhi>, RhiError> {
    match config.api {
        RenderApiType::None => Err(RhiError::UnsupportedBackend(config.api.to_string())),
        api if api != gpu.api => Err(RhiError::BackendMismatch {
            requested: api,
            available: gpu.api,
        }),
        api => {
            log::info!("Creating {} render hardware interface", api);
            Ok(Box::new(WgpuRhi::new(gpu.clone(), config)))
        }
    }
}

/// Resolves the index count a draw call actually uses.
pub fn resolve_index_count(requested: u32, available: u32) -> Result<u32, RhiError> {
    let count = match requested {
        USE_ARRAY_INDEX_COUNT => available,
        n => n,
    };
    if count == 0 {
        return Err(RhiError::EmptyDrawCall);
    }
    if count > available {
        return Err(RhiError::IndexCountOutOfRange {
            requested: count,
            available,
        });
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_uses_the_stored_index_count() {
        assert_eq!(resolve_index_count(USE_ARRAY_INDEX_COUNT, 36).unwrap(), 36);
    }

    #[test]
    fn explicit_count_is_used_verbatim() {
        assert_eq!(resolve_index_count(6, 36).unwrap(), 6);
        assert_eq!(resolve_index_count(36, 36).unwrap(), 36);
    }

    #[test]
    fn empty_and_oversized_draws_are_rejected() {
        assert!(matches!(resolve_index_count(0, 0), Err(RhiError::EmptyDrawCall)));
        assert!(matches!(
            resolve_index_count(37, 36),
            Err(RhiError::IndexCountOutOfRange {
                requested: 37,
                available: 36
            })
        ));
    }

    #[test]
    fn parses_backend_names() {
        assert_eq!("OpenGL".parse::<RenderApiType>().unwrap(), RenderApiType::OpenGl);
        assert_eq!("gl".parse::<RenderApiType>().unwrap(), RenderApiType::OpenGl);
        assert_eq!(" vulkan ".parse::<RenderApiType>().unwrap(), RenderApiType::Vulkan);
        assert_eq!("none".parse::<RenderApiType>().unwrap(), RenderApiType::None);
        assert!(matches!(
            "glide".parse::<RenderApiType>(),
            Err(RhiError::UnsupportedBackend(name)) if name == "glide"
        ));
    }

    #[test]
    fn only_none_has_no_backends() {
        assert_eq!(RenderApiType::None.backends(), None);
        assert_eq!(RenderApiType::OpenGl.backends(), Some(wgpu::Backends::GL));
        assert_eq!(RenderApiType::Noop.backends(), Some(wgpu::Backends::NOOP));
        assert_eq!(RenderApiType::default(), RenderApiType::Primary);
    }
}
