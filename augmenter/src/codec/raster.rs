use std::path::Path;

use burn::tensor::TensorData;
use image::{DynamicImage, ImageBuffer, ImageFormat, Luma};

use super::{has_extension, DecodedVolume, VolumeCodec};
use crate::{
    error::{AugmentError, AugmentResult},
    volume::SpatialMetadata,
};

const EXTENSIONS: [&str; 5] = ["png", "tif", "tiff", "jpg", "jpeg"];

/// Planar raster codec (PNG, TIFF, JPEG) built on the `image` crate.
///
/// Images are read as single-channel luma in `[0, 1]` with shape
/// `[height, width]`. Raster formats carry no spatial referencing, so reads
/// report identity metadata with depth 0 and writes ignore metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec;

impl ImageCodec {
    fn planar_extent(data: &TensorData, path: &Path) -> AugmentResult<(u32, u32)> {
        let dims: Vec<usize> = match data.shape.as_slice() {
            [1, rest @ ..] if rest.len() == 2 => rest.to_vec(),
            dims if dims.len() == 2 => dims.to_vec(),
            dims => {
                return Err(AugmentError::WriteFailed {
                    path: path.to_path_buf(),
                    reason: format!("raster formats need a 2D array, got shape {dims:?}"),
                })
            }
        };

        let to_u32 = |extent: usize| {
            u32::try_from(extent).map_err(|_| AugmentError::WriteFailed {
                path: path.to_path_buf(),
                reason: format!("extent {extent} exceeds the raster size limit"),
            })
        };
        Ok((to_u32(dims[0])?, to_u32(dims[1])?))
    }
}

impl VolumeCodec for ImageCodec {
    fn supports_extension(&self, extension: &str) -> bool {
        EXTENSIONS.iter().any(|known| extension.eq_ignore_ascii_case(known))
    }

    fn handles(&self, path: &Path) -> bool {
        EXTENSIONS.iter().any(|known| has_extension(path, known))
    }

    fn read(&self, path: &Path) -> AugmentResult<DecodedVolume> {
        let image = image::open(path).map_err(|e| AugmentError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let luma = image.to_luma32f();
        let (width, height) = luma.dimensions();
        let data = TensorData::new(luma.into_raw(), [height as usize, width as usize]);

        Ok(DecodedVolume {
            data,
            metadata: SpatialMetadata::identity(vec![width as usize, height as usize]),
        })
    }

    fn write(
        &self,
        data: &TensorData,
        _metadata: Option<&SpatialMetadata>,
        path: &Path,
    ) -> AugmentResult<()> {
        let write_failed = |reason: String| AugmentError::WriteFailed {
            path: path.to_path_buf(),
            reason,
        };

        let (height, width) = Self::planar_extent(data, path)?;
        let values = data
            .clone()
            .convert::<f32>()
            .into_vec::<f32>()
            .map_err(|e| write_failed(format!("{e:?}")))?;

        let pixels = values
            .into_iter()
            .map(|v| (v.clamp(0.0, 1.0) * f32::from(u16::MAX)).round() as u16)
            .collect();
        let buffer = ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(width, height, pixels)
            .ok_or_else(|| write_failed("pixel buffer does not match the image size".into()))?;

        let image = DynamicImage::ImageLuma16(buffer);
        let image = match ImageFormat::from_path(path) {
            // JPEG has no 16-bit luma encoder.
            Ok(ImageFormat::Jpeg) => DynamicImage::ImageLuma8(image.to_luma8()),
            _ => image,
        };

        image.save(path).map_err(|e| write_failed(e.to_string()))
    }
}
