//! GPU textures and texture creation utilities.
//!
//! This module provides the texture resources of the RHI: [`WgpuTexture2D`]
//! and [`WgpuTextureCube`], both owning a single [`GpuTexture`], and the
//! [`DepthBuffer`] the RHI renders with. Textures are created eagerly from
//! image files; decoding and upload block the calling thread.
//!
//! A texture whose image could not be decoded is still constructed, but holds
//! no GPU storage: check [`Texture::is_loaded`] before relying on it. Attaching
//! such a texture unbinds the texture unit.

use std::path::{Path, PathBuf};

use crate::{
    context::Gpu,
    data_structures::format::{self, StorageFormat, TransferFormat},
    error::RhiError,
    resources::texture::{
        DecodedImage, ImageInfo, decode_memory, decode_pixels, read_image_info,
        texture_unit_layout,
    },
    rhi::{RenderApiType, Rhi},
};

/// Operations shared by every texture resource.
pub trait Texture {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn channels(&self) -> u8;

    /// Whether GPU storage was allocated for this texture.
    fn is_loaded(&self) -> bool;

    /// Binds the texture to texture unit `slot` of `rhi`.
    fn attach(&self, rhi: &mut dyn Rhi, slot: u32) -> Result<(), RhiError>;
}

pub trait Texture2D: Texture {
    fn path(&self) -> &Path;
}

pub trait TextureCube: Texture {
    fn face_status(&self, face: CubeFace) -> &FaceStatus;
}

/// Everything the GPU side of one texture consists of.
///
/// Dropping it releases the texture.
#[derive(Clone, Debug)]
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    /// View and sampler laid out as a texture unit, see [`texture_unit_layout`].
    pub bind_group: wgpu::BindGroup,
}

impl GpuTexture {
    fn new(
        device: &wgpu::Device,
        texture: wgpu::Texture,
        view_dimension: wgpu::TextureViewDimension,
        sampler_desc: &wgpu::SamplerDescriptor,
    ) -> Self {
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(view_dimension),
            ..Default::default()
        });
        let sampler = device.create_sampler(sampler_desc);
        let layout = texture_unit_layout(device, view_dimension);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
            label: sampler_desc.label,
        });
        Self {
            texture,
            view,
            sampler,
            bind_group,
        }
    }
}

/// Sampler of 2D textures: repeating, linear minification and nearest
/// magnification.
fn texture_2d_sampler(label: Option<&str>) -> wgpu::SamplerDescriptor<'_> {
    wgpu::SamplerDescriptor {
        label,
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    }
}

/// Sampler of cube maps. Clamping keeps the seams between faces from
/// sampling the opposite edge.
fn cube_sampler() -> wgpu::SamplerDescriptor<'static> {
    wgpu::SamplerDescriptor {
        label: Some("cubemap"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    }
}

/// Fails for images the device cannot hold, `max` being its
/// `max_texture_dimension_2d`.
fn check_texture_size(width: u32, height: u32, max: u32) -> Result<(), RhiError> {
    if width > max || height > max {
        return Err(RhiError::TextureTooLarge { width, height, max });
    }
    Ok(())
}

/// Writes the pixels of `image` into array layer `layer` of `texture` at mip level 0.
fn upload(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    layer: u32,
    transfer: TransferFormat,
    image: &DecodedImage,
) {
    let data = transfer.to_upload_layout(&image.pixels);
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d {
                x: 0,
                y: 0,
                z: layer,
            },
        },
        &data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(transfer.upload_bytes_per_pixel() * image.width),
            rows_per_image: Some(image.height),
        },
        wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        },
    );
}

/// A 2D texture loaded from an image file.
#[derive(Debug)]
pub struct WgpuTexture2D {
    path: PathBuf,
    width: u32,
    height: u32,
    channels: u8,
    storage: Option<GpuTexture>,
}

impl WgpuTexture2D {
    /// Loads the image at `path` into a new texture.
    ///
    /// The image is flipped vertically so that row 0 is its bottom row. A file
    /// that cannot be decoded is logged and yields an unloaded texture; an image
    /// with an unsupported channel count, or larger than the device allows, is
    /// an error.
    ///
    /// # Arguments
    ///
    /// * `gpu` is the device the texture is created on
    /// * `path` is the image file to load
    pub fn new(gpu: &Gpu, path: impl AsRef<Path>) -> Result<Self, RhiError> {
        let path = path.as_ref();
        match decode_pixels(path, true) {
            Ok(image) => Self::from_image(gpu, path, &image),
            Err(e) => {
                log::error!("Failed to load texture! [path: {}]: {}", path.display(), e);
                Ok(Self::unloaded(path))
            }
        }
    }

    /// Loads a texture from encoded image data (PNG, JPEG, etc.) held in memory.
    ///
    /// # Arguments
    ///
    /// * `gpu` is the device the texture is created on
    /// * `label` names the texture in logs and stands in for its path
    /// * `bytes` is the encoded image
    pub fn from_bytes(gpu: &Gpu, label: &str, bytes: &[u8]) -> Result<Self, RhiError> {
        match decode_memory(bytes, label, true) {
            Ok(image) => Self::from_image(gpu, Path::new(label), &image),
            Err(e) => {
                log::error!("Failed to load texture! [label: {}]: {}", label, e);
                Ok(Self::unloaded(Path::new(label)))
            }
        }
    }

    fn unloaded(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            width: 0,
            height: 0,
            channels: 0,
            storage: None,
        }
    }

    fn from_image(gpu: &Gpu, path: &Path, image: &DecodedImage) -> Result<Self, RhiError> {
        let (storage_format, transfer) = format::resolve(image.channels)?;
        check_texture_size(
            image.width,
            image.height,
            gpu.device.limits().max_texture_dimension_2d,
        )?;
        let label = path.to_string_lossy();

        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&*label),
            size: wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: storage_format.texture_format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        upload(&gpu.queue, &texture, 0, transfer, image);

        let storage = GpuTexture::new(
            &gpu.device,
            texture,
            wgpu::TextureViewDimension::D2,
            &texture_2d_sampler(Some(&*label)),
        );
        log::debug!(
            "Loaded texture {} ({}x{}, {} channels)",
            path.display(),
            image.width,
            image.height,
            image.channels
        );

        Ok(Self {
            path: path.to_path_buf(),
            width: image.width,
            height: image.height,
            channels: image.channels,
            storage: Some(storage),
        })
    }

    pub fn gpu_texture(&self) -> Option<&GpuTexture> {
        self.storage.as_ref()
    }
}

impl Texture for WgpuTexture2D {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn channels(&self) -> u8 {
        self.channels
    }

    fn is_loaded(&self) -> bool {
        self.storage.is_some()
    }

    fn attach(&self, rhi: &mut dyn Rhi, slot: u32) -> Result<(), RhiError> {
        rhi.bind_texture_unit(slot, self.storage.as_ref().map(|s| &s.bind_group))
    }
}

impl Texture2D for WgpuTexture2D {
    fn path(&self) -> &Path {
        &self.path
    }
}

/// The six faces of a cube map, in array layer order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    pub fn layer(self) -> u32 {
        self as u32
    }
}

/// Outcome of loading one cube face.
#[derive(Debug)]
pub enum FaceStatus {
    Loaded,
    Failed(RhiError),
}

impl FaceStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, FaceStatus::Loaded)
    }
}

/// A cube map built from six face images.
///
/// Faces are loaded independently: a face that fails keeps its layer
/// zero-initialised and the cube stays usable with the remaining faces.
#[derive(Debug)]
pub struct WgpuTextureCube {
    faces: [FaceStatus; 6],
    width: u32,
    height: u32,
    channels: u8,
    storage: Option<GpuTexture>,
}

/// Reads the header of a face and resolves its format, without decoding it.
fn inspect_face(path: &Path, max_dimension: u32) -> Result<(ImageInfo, StorageFormat), RhiError> {
    let info = read_image_info(path)?;
    let (storage_format, _) = format::resolve(info.channels)?;
    check_texture_size(info.width, info.height, max_dimension)?;
    Ok((info, storage_format))
}

/// Checks a face of `size` against the cube's edge length and texture format.
///
/// Without a reference face every face is judged on its own, which only ever
/// fails it for not being square.
fn validate_face(
    face: CubeFace,
    (width, height): (u32, u32),
    storage_format: StorageFormat,
    reference: Option<(u32, wgpu::TextureFormat)>,
) -> Result<(), RhiError> {
    let edge = reference.map_or(width, |(edge, _)| edge);
    if width != edge || height != edge {
        return Err(RhiError::InvalidCubeFaceDimensions {
            face,
            expected: (edge, edge),
            found: (width, height),
        });
    }
    if let Some((_, expected)) = reference {
        let found = storage_format.texture_format();
        if found != expected {
            return Err(RhiError::MismatchedCubeFaceFormat {
                face,
                expected,
                found,
            });
        }
    }
    Ok(())
}

impl WgpuTextureCube {
    /// Loads the faces in [`CubeFace::ALL`] order: +X, -X, +Y, -Y, +Z, -Z.
    ///
    /// Faces are not flipped. The first face whose header describes a
    /// supported square image the device can hold fixes the edge length and
    /// the format of the cube; faces that disagree with it are rejected.
    /// Headers are read up front, then the faces are decoded and uploaded one
    /// at a time.
    ///
    /// # Arguments
    ///
    /// * `gpu` is the device the cube is created on
    /// * `faces` are the image files of the six faces
    pub fn new<P: AsRef<Path>>(gpu: &Gpu, faces: [P; 6]) -> Self {
        let paths = faces.each_ref().map(|p| p.as_ref());
        let max_dimension = gpu.device.limits().max_texture_dimension_2d;
        let headers = paths.map(|path| inspect_face(path, max_dimension));

        let reference = headers.iter().find_map(|header| match header {
            Ok((info, storage_format)) if info.width == info.height => {
                Some((info.width, storage_format.texture_format()))
            }
            _ => None,
        });

        let texture = reference.map(|(edge, texture_format)| {
            gpu.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("cubemap"),
                size: wgpu::Extent3d {
                    width: edge,
                    height: edge,
                    depth_or_array_layers: 6,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: texture_format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_DST
                    | wgpu::TextureUsages::COPY_SRC,
                view_formats: &[],
            })
        });

        let mut statuses: [FaceStatus; 6] = std::array::from_fn(|_| FaceStatus::Loaded);
        let (mut width, mut height, mut channels) = (0, 0, 0);

        for ((face, path), header) in CubeFace::ALL.into_iter().zip(paths).zip(headers) {
            let result = header.and_then(|(info, storage_format)| {
                validate_face(face, (info.width, info.height), storage_format, reference)?;
                let image = decode_pixels(path, false)?;
                // the file may have changed since its header was read
                let (storage_format, transfer) = format::resolve(image.channels)?;
                validate_face(face, (image.width, image.height), storage_format, reference)?;
                if let Some(texture) = &texture {
                    upload(&gpu.queue, texture, face.layer(), transfer, &image);
                }
                Ok((image.width, image.height, image.channels))
            });
            match result {
                Ok(loaded) => (width, height, channels) = loaded,
                Err(e) => {
                    log::error!(
                        "Failed to load cubemap face {:?} [path: {}]: {}",
                        face,
                        path.display(),
                        e
                    );
                    statuses[face.layer() as usize] = FaceStatus::Failed(e);
                }
            }
        }

        let storage = texture.map(|texture| {
            GpuTexture::new(
                &gpu.device,
                texture,
                wgpu::TextureViewDimension::Cube,
                &cube_sampler(),
            )
        });

        let cube = Self {
            faces: statuses,
            width,
            height,
            channels,
            storage,
        };
        log::debug!(
            "Loaded cubemap with {}/6 faces ({}x{})",
            cube.loaded_faces(),
            cube.width,
            cube.height
        );
        cube
    }

    pub fn loaded_faces(&self) -> usize {
        self.faces.iter().filter(|f| f.is_loaded()).count()
    }

    /// Whether all six faces were uploaded.
    pub fn is_complete(&self) -> bool {
        self.loaded_faces() == CubeFace::ALL.len()
    }

    pub fn gpu_texture(&self) -> Option<&GpuTexture> {
        self.storage.as_ref()
    }
}

impl Texture for WgpuTextureCube {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn channels(&self) -> u8 {
        self.channels
    }

    fn is_loaded(&self) -> bool {
        self.storage.is_some()
    }

    fn attach(&self, rhi: &mut dyn Rhi, slot: u32) -> Result<(), RhiError> {
        rhi.bind_texture_unit(slot, self.storage.as_ref().map(|s| &s.bind_group))
    }
}

impl TextureCube for WgpuTextureCube {
    fn face_status(&self, face: CubeFace) -> &FaceStatus {
        &self.faces[face.layer() as usize]
    }
}

/// Depth attachment the RHI renders with.
#[derive(Debug)]
pub struct DepthBuffer {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl DepthBuffer {
    /// Standard depth buffer texture format (32-bit float).
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Creates a depth buffer of at least 1x1 pixels.
    ///
    /// # Arguments
    ///
    /// * `device` is the device the buffer is created on
    /// * `width` and `height` are the size of the render target it is attached with
    /// * `label` names the texture in debugging tools
    pub fn new(device: &wgpu::Device, width: u32, height: u32, label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    /// Whether this buffer can be attached alongside a `width` x `height` target.
    pub fn matches(&self, width: u32, height: u32) -> bool {
        self.texture.width() == width && self.texture.height() == height
    }
}

/// Creates a 2D texture for the backend `rhi` runs on.
pub fn create_texture_2d(
    rhi: &dyn Rhi,
    path: impl AsRef<Path>,
) -> Result<Box<dyn Texture2D>, RhiError> {
    match rhi.api_type() {
        RenderApiType::None => Err(RhiError::UnsupportedBackend(RenderApiType::None.to_string())),
        _ => Ok(Box::new(WgpuTexture2D::new(rhi.gpu(), path)?)),
    }
}

/// Creates a cube texture for the backend `rhi` runs on.
pub fn create_texture_cube<P: AsRef<Path>>(
    rhi: &dyn Rhi,
    faces: [P; 6],
) -> Result<Box<dyn TextureCube>, RhiError> {
    match rhi.api_type() {
        RenderApiType::None => Err(RhiError::UnsupportedBackend(RenderApiType::None.to_string())),
        _ => Ok(Box::new(WgpuTextureCube::new(rhi.gpu(), faces))),
    }
}
