//! RHI data structures: pixel formats, textures and render arrays.
//!
//! - `format` resolves a decoded image's channel count to storage and transfer formats
//! - `texture` contains the 2D and cube texture resources and the depth buffer
//! - `render_array` groups the vertex and index buffers of one draw call

pub mod format;
pub mod render_array;
pub mod texture;
