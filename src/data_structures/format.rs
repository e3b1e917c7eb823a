//! Mapping from a decoded image's channel count to GPU storage.
//!
//! The storage format is what the texture is allocated with, the transfer
//! format describes the CPU-side pixel rows handed to the upload. wgpu has no
//! 3-channel texture format, so RGB sources are stored as RGBA8 and widened on
//! upload.

use std::borrow::Cow;

use crate::error::RhiError;

/// GPU-side layout a texture is allocated with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StorageFormat {
    Rgba8,
    Rgb8,
    R8,
}

impl StorageFormat {
    pub fn texture_format(self) -> wgpu::TextureFormat {
        match self {
            StorageFormat::Rgba8 | StorageFormat::Rgb8 => wgpu::TextureFormat::Rgba8Unorm,
            StorageFormat::R8 => wgpu::TextureFormat::R8Unorm,
        }
    }
}

/// CPU-side layout of the decoded pixel rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransferFormat {
    Rgba,
    Rgb,
    Red,
}

impl TransferFormat {
    pub fn channels(self) -> u8 {
        match self {
            TransferFormat::Rgba => 4,
            TransferFormat::Rgb => 3,
            TransferFormat::Red => 1,
        }
    }

    /// Bytes per texel of the data actually written to the GPU.
    pub fn upload_bytes_per_pixel(self) -> u32 {
        match self {
            TransferFormat::Rgba | TransferFormat::Rgb => 4,
            TransferFormat::Red => 1,
        }
    }

    /// Returns `pixels` in the layout the storage format expects.
    ///
    /// RGB rows are widened to RGBA with an opaque alpha channel; every other
    /// layout is passed through untouched.
    pub fn to_upload_layout(self, pixels: &[u8]) -> Cow<'_, [u8]> {
        match self {
            TransferFormat::Rgb => Cow::Owned(
                pixels
                    .chunks_exact(3)
                    .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], u8::MAX])
                    .collect(),
            ),
            TransferFormat::Rgba | TransferFormat::Red => Cow::Borrowed(pixels),
        }
    }
}

/// Resolves the storage and transfer format for `channels`.
///
/// Only 1, 3 and 4 channel images can be uploaded; anything else (grey+alpha
/// for instance) is rejected instead of being uploaded with a bogus format.
pub fn resolve(channels: u8) -> Result<(StorageFormat, TransferFormat), RhiError> {
    match channels {
        4 => Ok((StorageFormat::Rgba8, TransferFormat::Rgba)),
        3 => Ok((StorageFormat::Rgb8, TransferFormat::Rgb)),
        1 => Ok((StorageFormat::R8, TransferFormat::Red)),
        other => Err(RhiError::UnsupportedChannelCount(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_supported_channel_counts() {
        assert_eq!(resolve(4).unwrap(), (StorageFormat::Rgba8, TransferFormat::Rgba));
        assert_eq!(resolve(3).unwrap(), (StorageFormat::Rgb8, TransferFormat::Rgb));
        assert_eq!(resolve(1).unwrap(), (StorageFormat::R8, TransferFormat::Red));
    }

    #[test]
    fn rejects_other_channel_counts() {
        for channels in [0u8, 2, 5, u8::MAX] {
            match resolve(channels) {
                Err(RhiError::UnsupportedChannelCount(n)) => assert_eq!(n, channels),
                other => panic!("expected UnsupportedChannelCount, got {other:?}"),
            }
        }
    }

    #[test]
    fn rgb_and_rgba_share_a_texture_format() {
        assert_eq!(
            StorageFormat::Rgb8.texture_format(),
            StorageFormat::Rgba8.texture_format()
        );
        assert_eq!(StorageFormat::R8.texture_format(), wgpu::TextureFormat::R8Unorm);
    }

    #[test]
    fn rgb_rows_are_widened_with_opaque_alpha() {
        let rgb = [10, 20, 30, 40, 50, 60];
        let upload = TransferFormat::Rgb.to_upload_layout(&rgb);
        assert_eq!(&*upload, &[10, 20, 30, 255, 40, 50, 60, 255]);
        assert_eq!(upload.len() as u32, 2 * TransferFormat::Rgb.upload_bytes_per_pixel());
    }

    #[test]
    fn rgba_and_red_rows_are_borrowed() {
        let pixels = [1, 2, 3, 4];
        assert!(matches!(TransferFormat::Rgba.to_upload_layout(&pixels), Cow::Borrowed(_)));
        assert!(matches!(TransferFormat::Red.to_upload_layout(&pixels), Cow::Borrowed(_)));
    }
}
