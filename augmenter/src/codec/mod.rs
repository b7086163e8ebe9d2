//! Decoding and encoding of case files.
//!
//! The engine does not know any file format. It goes through [`VolumeCodec`],
//! which a host implements for its own formats. [`ImageCodec`] covers planar
//! raster formats through the `image` crate, [`NiftiCodec`] covers NIfTI-1
//! volumes and [`FormatCodec`] picks between the two by file extension.

mod nifti;
mod raster;

use std::path::Path;

use burn::tensor::TensorData;

pub use nifti::NiftiCodec;
pub use raster::ImageCodec;

use crate::{error::AugmentResult, volume::SpatialMetadata};

/// A decoded file: voxel data plus its spatial referencing.
#[derive(Debug, Clone)]
pub struct DecodedVolume {
    /// Voxel data in the codec's natural axis order.
    pub data: TensorData,
    /// Spatial referencing read from the file.
    pub metadata: SpatialMetadata,
}

/// Reads and writes case files.
///
/// Implementations are shared between the dataset engine and the writer pool
/// threads, hence the `Send + Sync` bound.
pub trait VolumeCodec: Send + Sync {
    /// Whether files with `extension` (without the leading dot, e.g. `png` or
    /// `nii.gz`) can be written.
    fn supports_extension(&self, _extension: &str) -> bool {
        true
    }

    /// Whether this codec reads and writes the file at `path`.
    fn handles(&self, _path: &Path) -> bool {
        true
    }

    /// Decode the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ReadFailed`](crate::AugmentError::ReadFailed) when the file
    /// is missing or cannot be decoded.
    fn read(&self, path: &Path) -> AugmentResult<DecodedVolume>;

    /// Read only the spatial referencing of the file at `path`.
    ///
    /// # Errors
    ///
    /// Same as [`VolumeCodec::read`].
    fn read_metadata(&self, path: &Path) -> AugmentResult<SpatialMetadata> {
        self.read(path).map(|decoded| decoded.metadata)
    }

    /// Encode `data` to `path`, stamping `metadata` on the output when given.
    ///
    /// # Errors
    ///
    /// Returns [`WriteFailed`](crate::AugmentError::WriteFailed) when encoding
    /// or writing fails.
    fn write(
        &self,
        data: &TensorData,
        metadata: Option<&SpatialMetadata>,
        path: &Path,
    ) -> AugmentResult<()>;
}

/// Dispatches on file extension: NIfTI files go to [`NiftiCodec`], everything
/// else to [`ImageCodec`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatCodec;

impl FormatCodec {
    fn pick(path: &Path) -> &'static dyn VolumeCodec {
        if NiftiCodec.handles(path) {
            &NiftiCodec as &'static dyn VolumeCodec
        } else {
            &ImageCodec as &'static dyn VolumeCodec
        }
    }
}

impl VolumeCodec for FormatCodec {
    fn supports_extension(&self, extension: &str) -> bool {
        NiftiCodec.supports_extension(extension) || ImageCodec.supports_extension(extension)
    }

    fn read(&self, path: &Path) -> AugmentResult<DecodedVolume> {
        Self::pick(path).read(path)
    }

    fn read_metadata(&self, path: &Path) -> AugmentResult<SpatialMetadata> {
        Self::pick(path).read_metadata(path)
    }

    fn write(
        &self,
        data: &TensorData,
        metadata: Option<&SpatialMetadata>,
        path: &Path,
    ) -> AugmentResult<()> {
        Self::pick(path).write(data, metadata, path)
    }
}

/// Case-insensitive check of the file name ending in `.{extension}`.
fn has_extension(path: &Path, extension: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| {
            let name = name.to_ascii_lowercase();
            name.len() > extension.len() + 1
                && name.ends_with(&extension.to_ascii_lowercase())
                && name[..name.len() - extension.len()].ends_with('.')
        })
}
