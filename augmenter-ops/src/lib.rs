//! # Augmenter Ops
//!
//! A reference [`TransformLibrary`] for `image-augmenter`. Flips, pads and
//! crops re-index voxels of any rank; intensity transforms are voxel-wise.
//! Rotation, resizing, zoom and smoothing resample 2D images through
//! `image`/`imageproc` and fail with
//! [`AugmentError::TransformFailed`] on volumes with more than two spatial
//! axes.
//!
//! Randomizable transforms draw from ChaCha8 generators. With a seed, each kind
//! gets its own reproducible stream.

pub mod grid;
pub mod intensity;
pub mod random;
pub mod raster;
pub mod smooth;
pub mod spatial;

use image_augmenter::{AugmentError, Transform, TransformKind, TransformLibrary, TransformOp};

pub use intensity::{
    AdjustContrast, IntensityDraw, NormalizeIntensity, RandomGaussianNoise, RandomIntensity,
    ScaleIntensity, ShiftIntensity, ThresholdIntensity,
};
pub use random::SharedRng;
pub use raster::{RandomRotate, RandomZoom, Resize, Rotate, Zoom};
pub use smooth::{GaussianSmooth, MedianSmooth, RandomGaussianSmooth};
pub use spatial::{BorderPad, CenterSpatialCrop, Flip, RandomFlip, SpatialCrop, SpatialPad};

pub(crate) fn failed(kind: TransformKind, reason: impl Into<String>) -> AugmentError {
    AugmentError::TransformFailed {
        transform: kind.canonical_name().into(),
        reason: reason.into(),
    }
}

/// Builds the transforms this crate implements.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceLibrary {
    /// Base seed for random transforms; entropy when `None`.
    pub seed: Option<u64>,
}

impl ReferenceLibrary {
    #[must_use]
    pub const fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }

    fn rng_for(&self, kind: TransformKind) -> SharedRng {
        SharedRng::new(self.seed.map(|seed| seed.wrapping_add(kind as u64)))
    }
}

impl TransformLibrary for ReferenceLibrary {
    fn build(&self, op: &TransformOp) -> image_augmenter::AugmentResult<Box<dyn Transform>> {
        let kind = op.kind();
        let transform: Box<dyn Transform> = match op {
            TransformOp::Flip { axis } => Box::new(Flip { axis: *axis }),
            TransformOp::RandomFlip => Box::new(RandomFlip::new(self.rng_for(kind))),
            TransformOp::ScaleIntensity { factor } => Box::new(ScaleIntensity { factor: *factor }),
            TransformOp::RandomScaleIntensity { factors } => Box::new(RandomIntensity::new(
                IntensityDraw::Scale,
                *factors,
                self.rng_for(kind),
            )),
            TransformOp::AdjustContrast { gamma, invert_image } => Box::new(AdjustContrast {
                gamma: *gamma,
                invert_image: *invert_image,
            }),
            TransformOp::RandomAdjustContrast { gamma, invert_image } => Box::new(RandomIntensity::new(
                IntensityDraw::Contrast {
                    invert_image: *invert_image,
                },
                *gamma,
                self.rng_for(kind),
            )),
            TransformOp::RandomGaussianNoise { mean, std } => {
                Box::new(RandomGaussianNoise::new(*mean, *std, self.rng_for(kind)))
            }
            TransformOp::ShiftIntensity { offset } => Box::new(ShiftIntensity { offset: *offset }),
            TransformOp::RandomShiftIntensity { offsets } => Box::new(RandomIntensity::new(
                IntensityDraw::Shift,
                *offsets,
                self.rng_for(kind),
            )),
            TransformOp::NormalizeIntensity {
                subtrahend,
                divisor,
                nonzero,
            } => Box::new(NormalizeIntensity {
                subtrahend: *subtrahend,
                divisor: *divisor,
                nonzero: *nonzero,
            }),
            TransformOp::ThresholdIntensity {
                threshold,
                cval,
                above,
            } => Box::new(ThresholdIntensity {
                threshold: *threshold,
                cval: *cval,
                above: *above,
            }),
            TransformOp::SpatialPad {
                spatial_size,
                method,
                mode,
                fill_value,
            } => Box::new(SpatialPad {
                spatial_size: spatial_size.clone(),
                method: *method,
                mode: *mode,
                fill_value: *fill_value as f32,
            }),
            TransformOp::BorderPad {
                spatial_border,
                mode,
                fill_value,
            } => Box::new(BorderPad {
                spatial_border: *spatial_border,
                mode: *mode,
                fill_value: *fill_value as f32,
            }),
            TransformOp::SpatialCrop { roi_center, roi_size } => Box::new(SpatialCrop {
                roi_center: roi_center.clone(),
                roi_size: roi_size.clone(),
            }),
            TransformOp::CenterSpatialCrop { roi_size } => Box::new(CenterSpatialCrop {
                roi_size: roi_size.clone(),
            }),
            TransformOp::Rotate { angle, mode } => Box::new(Rotate {
                angle: *angle,
                mode: *mode,
            }),
            TransformOp::RandomRotate {
                range_x,
                padding_mode,
                mode,
                ..
            } => Box::new(RandomRotate::new(
                *range_x,
                *mode,
                *padding_mode,
                self.rng_for(kind),
            )),
            TransformOp::Resize { spatial_size, mode } => Box::new(Resize {
                spatial_size: spatial_size.clone(),
                mode: *mode,
            }),
            TransformOp::Zoom {
                factor,
                mode,
                padding_mode,
                ..
            } => Box::new(Zoom {
                factor: *factor,
                mode: *mode,
                padding_mode: *padding_mode,
            }),
            TransformOp::RandomZoom {
                min_zoom,
                max_zoom,
                mode,
                padding_mode,
                ..
            } => Box::new(RandomZoom::new(
                *min_zoom,
                *max_zoom,
                *mode,
                *padding_mode,
                self.rng_for(kind),
            )),
            TransformOp::MedianSmooth { radius } => Box::new(MedianSmooth { radius: *radius }),
            TransformOp::GaussianSmooth { sigma, kernel } => Box::new(GaussianSmooth {
                sigma: *sigma,
                kernel: *kernel,
            }),
            TransformOp::RandomGaussianSmooth {
                sigma_x,
                sigma_y,
                kernel,
                ..
            } => Box::new(RandomGaussianSmooth::new(
                *sigma_x,
                *sigma_y,
                *kernel,
                self.rng_for(kind),
            )),
        };
        tracing::debug!(transform = kind.canonical_name(), "reference transform built");
        Ok(transform)
    }
}
