//! Numeric arrays handled by the engine.
//!
//! A [`Volume`] is an opaque N-dimensional f32 array (typically depth × height
//! × width for volumetric scans) backed by burn's [`TensorData`]. The engine
//! never looks inside beyond shape bookkeeping; transforms own the numerics.

use burn::tensor::TensorData;

use crate::{
    device::Device,
    error::{AugmentError, AugmentResult},
};

/// A loaded image or mask array placed on a device.
#[derive(Debug, Clone)]
pub struct Volume {
    data: TensorData,
    device: Device,
}

impl Volume {
    /// Wrap decoded data, converting the element type to f32.
    #[must_use]
    pub fn new(data: TensorData) -> Self {
        Self {
            data: data.convert::<f32>(),
            device: Device::Cpu,
        }
    }

    /// Build a volume from raw values in row-major order.
    ///
    /// # Errors
    ///
    /// Returns [`AugmentError::InvalidVolume`] when the number of values does
    /// not match the product of `shape`.
    pub fn from_values(values: Vec<f32>, shape: impl Into<Vec<usize>>) -> AugmentResult<Self> {
        let shape = shape.into();
        let expected: usize = shape.iter().product();
        if values.len() != expected {
            return Err(AugmentError::InvalidVolume {
                reason: format!(
                    "{} values cannot fill shape {shape:?} ({expected} elements)",
                    values.len()
                ),
            });
        }
        Ok(Self::new(TensorData::new(values, shape)))
    }

    /// Extent of each axis.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.data.shape
    }

    /// Number of axes.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.data.shape.len()
    }

    /// Total number of voxels.
    #[must_use]
    pub fn num_elements(&self) -> usize {
        self.data.num_elements()
    }

    /// Device the volume was last placed on.
    #[must_use]
    pub const fn device(&self) -> Device {
        self.device
    }

    /// Place the volume on `device`.
    #[must_use]
    pub fn to_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Borrow the voxel values.
    ///
    /// # Errors
    ///
    /// Returns [`AugmentError::InvalidVolume`] if the backing data is not f32.
    pub fn values(&self) -> AugmentResult<&[f32]> {
        self.data
            .as_slice::<f32>()
            .map_err(|e| AugmentError::InvalidVolume {
                reason: format!("cannot read voxel values: {e:?}"),
            })
    }

    /// Take ownership of the voxel values.
    ///
    /// # Errors
    ///
    /// Returns [`AugmentError::InvalidVolume`] if the backing data is not f32.
    pub fn into_values(self) -> AugmentResult<Vec<f32>> {
        self.data
            .into_vec::<f32>()
            .map_err(|e| AugmentError::InvalidVolume {
                reason: format!("cannot read voxel values: {e:?}"),
            })
    }

    /// Borrow the backing tensor data.
    #[must_use]
    pub const fn data(&self) -> &TensorData {
        &self.data
    }

    /// Release the backing tensor data.
    #[must_use]
    pub fn into_data(self) -> TensorData {
        self.data
    }

    /// Prepend a channel axis of size 1.
    #[must_use]
    pub fn insert_channel_axis(mut self) -> Self {
        self.data.shape.insert(0, 1);
        self
    }

    /// Strip a leading channel axis of size 1.
    ///
    /// # Errors
    ///
    /// Returns [`AugmentError::InvalidVolume`] when the leading axis is missing
    /// or has more than one entry.
    pub fn remove_channel_axis(mut self) -> AugmentResult<Self> {
        match self.data.shape.first() {
            Some(1) if self.data.shape.len() > 1 => {
                self.data.shape.remove(0);
                Ok(self)
            }
            _ => Err(AugmentError::InvalidVolume {
                reason: format!(
                    "expected a leading channel axis of size 1, got shape {:?}",
                    self.data.shape
                ),
            }),
        }
    }

    /// Whether any voxel is non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`AugmentError::InvalidVolume`] if the backing data is not f32.
    pub fn any_nonzero(&self) -> AugmentResult<bool> {
        Ok(self.values()?.iter().any(|&v| v != 0.0))
    }
}

/// The joint `{image, mask}` mapping handed to randomizable transforms so one
/// parameter draw applies to both arrays.
#[derive(Debug, Clone)]
pub struct JointSample {
    /// The image array.
    pub image: Volume,
    /// The paired mask, when one was loaded.
    pub mask: Option<Volume>,
}

impl JointSample {
    /// Apply `f` to every array of the sample.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `f`.
    pub fn try_map<F>(self, mut f: F) -> AugmentResult<Self>
    where
        F: FnMut(Volume) -> AugmentResult<Volume>,
    {
        Ok(Self {
            image: f(self.image)?,
            mask: self.mask.map(f).transpose()?,
        })
    }
}

/// Spatial referencing of an original case: extent, origin, voxel spacing and
/// orientation (row-major direction cosines).
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialMetadata {
    /// Extent per spatial axis, fastest axis first (x, y[, z]).
    pub size: Vec<usize>,
    /// Physical coordinate of the first voxel.
    pub origin: Vec<f64>,
    /// Physical distance between voxel centres along each axis.
    pub spacing: Vec<f64>,
    /// Direction cosine matrix, row-major.
    pub direction: Vec<f64>,
}

impl SpatialMetadata {
    /// Identity referencing for an array of the given spatial extent.
    #[must_use]
    pub fn identity(size: Vec<usize>) -> Self {
        let dims = size.len();
        let direction = (0..dims * dims)
            .map(|i| if i / dims == i % dims { 1.0 } else { 0.0 })
            .collect();
        Self {
            origin: vec![0.0; dims],
            spacing: vec![1.0; dims],
            direction,
            size,
        }
    }

    /// Number of slices along the third axis, 0 for 2D data.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.size.get(2).copied().unwrap_or(0)
    }
}
