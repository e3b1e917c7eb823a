//! gameworld-rhi
//!
//! The render hardware interface of the GameWorld engine. Rendering code talks
//! to the backend-independent [`Rhi`] trait, loads textures through the
//! [`Texture`] family and groups geometry into render arrays; the backend is
//! chosen once at startup from [`RenderApiType`] and realised with wgpu.
//!
//! High-level modules
//! - `config`: startup configuration (backend, window, clear color)
//! - `context`: device, queue and window surface for the selected backend
//! - `data_structures`: pixel formats, textures and render arrays
//! - `error`: the shared error type
//! - `flow`: event loop and application callbacks
//! - `render`: recorded commands and their grouping into render passes
//! - `resources`: image decoding and bind group layouts
//! - `rhi`: the command surface and its wgpu realisation
//! - `window`: window properties and engine events
//!

pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod render;
pub mod resources;
pub mod rhi;
pub mod window;

// Re-exports commonly used types for convenience in downstream code.
pub use config::RhiConfig;
pub use context::{Context, Gpu};
pub use data_structures::render_array::RenderArray;
pub use data_structures::texture::{
    CubeFace, FaceStatus, Texture, Texture2D, TextureCube, WgpuTexture2D, WgpuTextureCube,
    create_texture_2d, create_texture_cube,
};
pub use error::RhiError;
pub use rhi::{RenderApiType, Rhi, USE_ARRAY_INDEX_COUNT, WgpuRhi, create_rhi};
pub use window::{Event, WindowProps};
pub use wgpu;
