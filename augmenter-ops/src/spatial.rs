//! Geometric transforms expressed as pure re-indexing: flips, pads and crops.
//!
//! Kinds that receive a leading channel axis (spatial pad and center crop)
//! leave axis 0 untouched; the others treat every axis as spatial.

use image_augmenter::{
    AugmentResult, JointSample, PadMethod, PadMode, Transform, TransformKind, Volume,
};

use crate::{
    failed,
    grid::{cropped, identity, padded, remap, reversed, AxisMap},
    random::SharedRng,
};

fn flip_axis(volume: &Volume, axis: usize, kind: TransformKind) -> AugmentResult<Volume> {
    let shape = volume.shape();
    if axis >= shape.len() {
        return Err(failed(
            kind,
            format!("axis {axis} is out of range for shape {shape:?}"),
        ));
    }
    let maps: Vec<AxisMap> = shape
        .iter()
        .enumerate()
        .map(|(a, &len)| if a == axis { reversed(len) } else { identity(len) })
        .collect();
    remap(volume, &maps, 0.0)
}

/// Reverse one axis.
#[derive(Debug, Clone, Copy)]
pub struct Flip {
    pub axis: usize,
}

impl Transform for Flip {
    fn apply(&self, volume: Volume) -> AugmentResult<Volume> {
        flip_axis(&volume, self.axis, TransformKind::Flip)
    }
}

/// Reverse one randomly chosen axis; image and mask share the draw.
#[derive(Debug)]
pub struct RandomFlip {
    rng: SharedRng,
}

impl RandomFlip {
    pub const fn new(rng: SharedRng) -> Self {
        Self { rng }
    }

    fn draw(&self, volume: &Volume) -> AugmentResult<usize> {
        if volume.rank() == 0 {
            return Err(failed(TransformKind::RandomFlip, "volume has no axes"));
        }
        Ok(self.rng.index(volume.rank()))
    }
}

impl Transform for RandomFlip {
    fn apply(&self, volume: Volume) -> AugmentResult<Volume> {
        let axis = self.draw(&volume)?;
        flip_axis(&volume, axis, TransformKind::RandomFlip)
    }

    fn apply_joint(&self, sample: JointSample) -> AugmentResult<JointSample> {
        let axis = self.draw(&sample.image)?;
        tracing::debug!(axis, "random flip axis drawn");
        sample.try_map(|volume| flip_axis(&volume, axis, TransformKind::RandomFlip))
    }
}

/// Spatial axes of a channel-first volume.
fn spatial_shape(volume: &Volume, kind: TransformKind, components: usize) -> AugmentResult<Vec<usize>> {
    let shape = volume.shape();
    match shape.split_first() {
        Some((_, spatial)) if spatial.len() == components => Ok(spatial.to_vec()),
        _ => Err(failed(
            kind,
            format!(
                "{components} size components do not match the spatial axes of shape {shape:?}"
            ),
        )),
    }
}

/// Pad each spatial axis up to a minimum size.
#[derive(Debug, Clone)]
pub struct SpatialPad {
    pub spatial_size: Vec<usize>,
    pub method: PadMethod,
    pub mode: PadMode,
    pub fill_value: f32,
}

impl Transform for SpatialPad {
    fn apply(&self, volume: Volume) -> AugmentResult<Volume> {
        let spatial = spatial_shape(&volume, TransformKind::SpatialPad, self.spatial_size.len())?;

        let mut maps = vec![identity(volume.shape()[0])];
        for (&len, &target) in spatial.iter().zip(&self.spatial_size) {
            let extra = target.saturating_sub(len);
            let (before, after) = match self.method {
                PadMethod::Symmetric => (extra / 2, extra - extra / 2),
                PadMethod::End => (0, extra),
            };
            let map = padded(len, before, after, self.mode)
                .map_err(|e| failed(TransformKind::SpatialPad, e.to_string()))?;
            maps.push(map);
        }
        remap(&volume, &maps, self.fill_value)
    }
}

/// Pad every axis by the same border on both sides.
#[derive(Debug, Clone, Copy)]
pub struct BorderPad {
    pub spatial_border: usize,
    pub mode: PadMode,
    pub fill_value: f32,
}

impl Transform for BorderPad {
    fn apply(&self, volume: Volume) -> AugmentResult<Volume> {
        let maps = volume
            .shape()
            .iter()
            .map(|&len| padded(len, self.spatial_border, self.spatial_border, self.mode))
            .collect::<AugmentResult<Vec<AxisMap>>>()
            .map_err(|e| failed(TransformKind::BorderPad, e.to_string()))?;
        remap(&volume, &maps, self.fill_value)
    }
}

/// Crop a region given by its center and size, clipped to the volume.
#[derive(Debug, Clone)]
pub struct SpatialCrop {
    pub roi_center: Vec<usize>,
    pub roi_size: Vec<usize>,
}

impl Transform for SpatialCrop {
    fn apply(&self, volume: Volume) -> AugmentResult<Volume> {
        let shape = volume.shape();
        if self.roi_center.len() != shape.len() || self.roi_size.len() != shape.len() {
            return Err(failed(
                TransformKind::SpatialCrop,
                format!(
                    "ROI with {} center and {} size components cannot crop shape {shape:?}",
                    self.roi_center.len(),
                    self.roi_size.len()
                ),
            ));
        }

        let maps: Vec<AxisMap> = shape
            .iter()
            .zip(self.roi_center.iter().zip(&self.roi_size))
            .map(|(&len, (&center, &size))| {
                let start = center.saturating_sub(size / 2).min(len);
                let end = start.saturating_add(size).min(len);
                cropped(start, end - start)
            })
            .collect();
        remap(&volume, &maps, 0.0)
    }
}

/// Crop the central region of each spatial axis. A zero size keeps the axis.
#[derive(Debug, Clone)]
pub struct CenterSpatialCrop {
    pub roi_size: Vec<usize>,
}

impl Transform for CenterSpatialCrop {
    fn apply(&self, volume: Volume) -> AugmentResult<Volume> {
        let spatial = spatial_shape(&volume, TransformKind::CenterSpatialCrop, self.roi_size.len())?;

        let mut maps = vec![identity(volume.shape()[0])];
        for (&len, &roi) in spatial.iter().zip(&self.roi_size) {
            let size = if roi == 0 { len } else { roi.min(len) };
            maps.push(cropped(len / 2 - size / 2, size));
        }
        remap(&volume, &maps, 0.0)
    }
}
