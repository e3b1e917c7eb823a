use std::path::Path;

use image::{DynamicImage, GenericImageView, ImageDecoder, ImageError, ImageReader};

use crate::error::RhiError;

/// Layout of a single texture unit: the texture at binding 0 and its sampler at
/// binding 1.
///
/// Every texture resource builds its bind group against this layout, so a
/// pipeline whose layout uses `texture_unit_layout` at group `n` can sample
/// whatever is attached to texture unit `n`.
pub fn texture_unit_layout(
    device: &wgpu::Device,
    view_dimension: wgpu::TextureViewDimension,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some(match view_dimension {
            wgpu::TextureViewDimension::Cube => "texture unit layout (cube)",
            _ => "texture unit layout (2d)",
        }),
    })
}

/// Pixels of a decoded image, 8 bits per channel, rows tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Channel count of the source image (1 to 4).
    pub channels: u8,
}

/// Size and channel count of an image file, read from its header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

/// Reads the dimensions and channel count of the image at `path` without
/// decoding its pixels.
pub fn read_image_info(path: &Path) -> Result<ImageInfo, RhiError> {
    let decode_error = |source: ImageError| RhiError::ImageDecode {
        path: path.to_path_buf(),
        source,
    };
    let decoder = ImageReader::open(path)
        .map_err(|e| decode_error(ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| decode_error(ImageError::IoError(e)))?
        .into_decoder()
        .map_err(decode_error)?;
    let (width, height) = decoder.dimensions();
    Ok(ImageInfo {
        width,
        height,
        channels: decoder.color_type().channel_count(),
    })
}

/// Decodes the image file at `path`.
///
/// With `flip_vertically` the first row of the result is the bottom row of the
/// image, which is what the 2D texture upload expects.
pub fn decode_pixels(path: &Path, flip_vertically: bool) -> Result<DecodedImage, RhiError> {
    let img = image::open(path).map_err(|source| RhiError::ImageDecode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(to_decoded(img, flip_vertically))
}

/// Decodes an encoded image held in memory. `label` stands in for the path in
/// diagnostics.
pub fn decode_memory(
    bytes: &[u8],
    label: &str,
    flip_vertically: bool,
) -> Result<DecodedImage, RhiError> {
    let img = image::load_from_memory(bytes).map_err(|source| RhiError::ImageDecode {
        path: label.into(),
        source,
    })?;
    Ok(to_decoded(img, flip_vertically))
}

fn to_decoded(img: DynamicImage, flip_vertically: bool) -> DecodedImage {
    let img = if flip_vertically { img.flipv() } else { img };
    let (width, height) = img.dimensions();
    // Keep the source channel count, but always hand out 8 bit channels.
    let (pixels, channels) = match img.color().channel_count() {
        1 => (img.into_luma8().into_raw(), 1),
        2 => (img.into_luma_alpha8().into_raw(), 2),
        3 => (img.into_rgb8().into_raw(), 3),
        _ => (img.into_rgba8().into_raw(), 4),
    };
    DecodedImage {
        pixels,
        width,
        height,
        channels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> image::RgbaImage {
        image::RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([x as u8, y as u8, 0, 255])
        })
    }

    #[test]
    fn decodes_png_with_native_channel_count() {
        let dir = tempfile::tempdir().unwrap();
        let rgb_path = dir.path().join("rgb.png");
        let grey_path = dir.path().join("grey.png");
        image::RgbImage::new(3, 2).save(&rgb_path).unwrap();
        image::GrayImage::new(5, 4).save(&grey_path).unwrap();

        let rgb = decode_pixels(&rgb_path, false).unwrap();
        assert_eq!((rgb.width, rgb.height, rgb.channels), (3, 2, 3));
        assert_eq!(rgb.pixels.len(), 3 * 2 * 3);

        let grey = decode_pixels(&grey_path, false).unwrap();
        assert_eq!((grey.width, grey.height, grey.channels), (5, 4, 1));
        assert_eq!(grey.pixels.len(), 5 * 4);
    }

    #[test]
    fn flip_puts_the_bottom_row_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gradient.png");
        gradient(2, 4).save(&path).unwrap();

        let upright = decode_pixels(&path, false).unwrap();
        let flipped = decode_pixels(&path, true).unwrap();
        let row = 2 * 4;

        // first row of the upright image has y = 0, the flipped one y = 3
        assert_eq!(upright.pixels[1], 0);
        assert_eq!(flipped.pixels[1], 3);
        assert_eq!(&flipped.pixels[..row], &upright.pixels[3 * row..]);
    }

    #[test]
    fn missing_file_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.png");
        match decode_pixels(&path, true) {
            Err(RhiError::ImageDecode { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("expected ImageDecode, got {other:?}"),
        }
    }

    #[test]
    fn header_matches_the_decoded_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        image::RgbImage::new(7, 3).save(&path).unwrap();

        let info = read_image_info(&path).unwrap();
        let decoded = decode_pixels(&path, false).unwrap();
        assert_eq!(
            info,
            ImageInfo {
                width: 7,
                height: 3,
                channels: 3
            }
        );
        assert_eq!((decoded.width, decoded.height, decoded.channels), (7, 3, 3));
    }

    #[test]
    fn header_of_missing_or_garbage_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.png");
        let garbage = dir.path().join("garbage.png");
        std::fs::write(&garbage, b"not an image").unwrap();

        for path in [missing, garbage] {
            match read_image_info(&path) {
                Err(RhiError::ImageDecode { path: failed, .. }) => assert_eq!(failed, path),
                other => panic!("expected ImageDecode, got {other:?}"),
            }
        }
    }

    #[test]
    fn decodes_from_memory() {
        let mut bytes = Vec::new();
        gradient(4, 4)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let decoded = decode_memory(&bytes, "in-memory", false).unwrap();
        assert_eq!((decoded.width, decoded.height, decoded.channels), (4, 4, 4));

        assert!(matches!(
            decode_memory(b"not an image", "garbage", false),
            Err(RhiError::ImageDecode { .. })
        ));
    }
}
