//! Error type shared by the RHI, the texture resources and the GPU context.
//!
//! Decode failures are *recovered*: texture constructors log them and hand back
//! an unloaded texture (or a cube with a failed face) instead of returning the
//! error. Backend selection failures are fatal at startup; everything else is
//! reported to the caller and can be handled.

use std::path::PathBuf;

use thiserror::Error;

use crate::{data_structures::texture::CubeFace, rhi::RenderApiType};

#[derive(Debug, Error)]
pub enum RhiError {
    #[error("failed to decode image [path: {}]: {source}", path.display())]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("unsupported channel count {0} (expected 1, 3 or 4)")]
    UnsupportedChannelCount(u8),

    #[error("unsupported render backend '{0}'")]
    UnsupportedBackend(String),

    #[error("render backend mismatch: requested {requested}, but the device was created for {available}")]
    BackendMismatch {
        requested: RenderApiType,
        available: RenderApiType,
    },

    #[error("no adapter available for {api}: {reason}")]
    AdapterUnavailable { api: RenderApiType, reason: String },

    #[error("failed to request a device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("failed to create a window surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("{width}x{height} texture exceeds the device limit of {max} pixels per side")]
    TextureTooLarge { width: u32, height: u32, max: u32 },

    #[error("cube face {face:?} is {}x{}, expected {}x{}", found.0, found.1, expected.0, expected.1)]
    InvalidCubeFaceDimensions {
        face: CubeFace,
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error("cube face {face:?} resolves to {found:?}, but the cube is {expected:?}")]
    MismatchedCubeFaceFormat {
        face: CubeFace,
        expected: wgpu::TextureFormat,
        found: wgpu::TextureFormat,
    },

    #[error("texture unit {slot} is out of range ({available} units available)")]
    InvalidBindingTarget { slot: u32, available: u32 },

    #[error("draw call resolves to zero indices")]
    EmptyDrawCall,

    #[error("draw call requests {requested} indices but the render array holds {available}")]
    IndexCountOutOfRange { requested: u32, available: u32 },

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to read configuration [path: {}]: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
