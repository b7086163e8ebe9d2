//! Voxel-wise intensity transforms.

use image_augmenter::{AugmentResult, JointSample, Transform, TransformKind, Volume};
use rand::Rng;
use rand_distr::Normal;

use crate::{failed, random::SharedRng};

const CONTRAST_EPSILON: f64 = 1e-7;
const STD_EPSILON: f64 = 1e-8;

/// Rebuild `volume` with every value passed through `f`.
fn map_values(volume: Volume, f: impl Fn(f32) -> f32) -> AugmentResult<Volume> {
    let shape = volume.shape().to_vec();
    let device = volume.device();
    let values = volume.into_values()?.into_iter().map(f).collect();
    Ok(Volume::from_values(values, shape)?.to_device(device))
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, 0.0);
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, variance.sqrt())
}

/// Multiply by `1 + factor`.
#[derive(Debug, Clone, Copy)]
pub struct ScaleIntensity {
    pub factor: f64,
}

impl Transform for ScaleIntensity {
    fn apply(&self, volume: Volume) -> AugmentResult<Volume> {
        let scale = (1.0 + self.factor) as f32;
        map_values(volume, |v| v * scale)
    }
}

/// Add `offset`.
#[derive(Debug, Clone, Copy)]
pub struct ShiftIntensity {
    pub offset: f64,
}

impl Transform for ShiftIntensity {
    fn apply(&self, volume: Volume) -> AugmentResult<Volume> {
        let offset = self.offset as f32;
        map_values(volume, |v| v + offset)
    }
}

/// Gamma correction over the min-max normalized range, keeping the original
/// mean and standard deviation.
#[derive(Debug, Clone, Copy)]
pub struct AdjustContrast {
    pub gamma: f64,
    /// Apply the correction to the negated image.
    pub invert_image: bool,
}

impl Transform for AdjustContrast {
    fn apply(&self, volume: Volume) -> AugmentResult<Volume> {
        let shape = volume.shape().to_vec();
        let device = volume.device();
        let sign = if self.invert_image { -1.0 } else { 1.0 };
        let values: Vec<f64> = volume
            .into_values()?
            .into_iter()
            .map(|v| sign * f64::from(v))
            .collect();
        if values.is_empty() {
            return Ok(Volume::from_values(Vec::new(), shape)?.to_device(device));
        }

        let (mean, std) = mean_std(&values);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;

        let corrected: Vec<f64> = values
            .iter()
            .map(|v| ((v - min) / (range + CONTRAST_EPSILON)).powf(self.gamma) * range + min)
            .collect();
        let (corrected_mean, corrected_std) = mean_std(&corrected);
        let out = corrected
            .into_iter()
            .map(|v| (sign * ((v - corrected_mean) / (corrected_std + STD_EPSILON) * std + mean)) as f32)
            .collect();
        Ok(Volume::from_values(out, shape)?.to_device(device))
    }
}

/// `(v - subtrahend) / divisor`, optionally only on non-zero voxels.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeIntensity {
    pub subtrahend: f64,
    pub divisor: f64,
    pub nonzero: bool,
}

impl Transform for NormalizeIntensity {
    fn apply(&self, volume: Volume) -> AugmentResult<Volume> {
        if self.divisor == 0.0 {
            return Err(failed(TransformKind::NormalizeIntensity, "divisor is zero"));
        }
        let (subtrahend, divisor) = (self.subtrahend as f32, self.divisor as f32);
        let nonzero = self.nonzero;
        map_values(volume, |v| {
            if nonzero && v == 0.0 {
                v
            } else {
                (v - subtrahend) / divisor
            }
        })
    }
}

/// Keep voxels on one side of a threshold, replace the rest with `cval`.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdIntensity {
    pub threshold: f64,
    pub cval: f64,
    /// Keep values above the threshold instead of below it.
    pub above: bool,
}

impl Transform for ThresholdIntensity {
    fn apply(&self, volume: Volume) -> AugmentResult<Volume> {
        let (threshold, cval, above) = (self.threshold as f32, self.cval as f32, self.above);
        map_values(volume, |v| {
            let keep = if above { v > threshold } else { v < threshold };
            if keep {
                v
            } else {
                cval
            }
        })
    }
}

/// Which deterministic transform a [`RandomIntensity`] feeds its draw into.
#[derive(Debug, Clone, Copy)]
pub enum IntensityDraw {
    Scale,
    Shift,
    Contrast { invert_image: bool },
}

/// A scalar intensity transform whose parameter is drawn uniformly from a
/// range once per sample.
#[derive(Debug)]
pub struct RandomIntensity {
    draw: IntensityDraw,
    range: [f64; 2],
    rng: SharedRng,
}

impl RandomIntensity {
    pub const fn new(draw: IntensityDraw, range: [f64; 2], rng: SharedRng) -> Self {
        Self { draw, range, rng }
    }

    fn fixed(&self) -> Box<dyn Transform> {
        let value = self.rng.uniform(self.range);
        tracing::debug!(value, draw = ?self.draw, "intensity parameter drawn");
        match self.draw {
            IntensityDraw::Scale => Box::new(ScaleIntensity { factor: value }),
            IntensityDraw::Shift => Box::new(ShiftIntensity { offset: value }),
            IntensityDraw::Contrast { invert_image } => Box::new(AdjustContrast {
                gamma: value,
                invert_image,
            }),
        }
    }
}

impl Transform for RandomIntensity {
    fn apply(&self, volume: Volume) -> AugmentResult<Volume> {
        self.fixed().apply(volume)
    }

    fn apply_joint(&self, sample: JointSample) -> AugmentResult<JointSample> {
        let transform = self.fixed();
        sample.try_map(|volume| transform.apply(volume))
    }
}

/// Additive gaussian noise. The standard deviation is drawn from `[0, std]`
/// per sample and one noise field is shared by the image and its mask.
#[derive(Debug)]
pub struct RandomGaussianNoise {
    mean: f64,
    std: f64,
    rng: SharedRng,
}

impl RandomGaussianNoise {
    pub const fn new(mean: f64, std: f64, rng: SharedRng) -> Self {
        Self { mean, std, rng }
    }

    fn noise(&self, len: usize) -> AugmentResult<Vec<f32>> {
        let std = self.rng.uniform([0.0, self.std]);
        let normal = Normal::new(self.mean as f32, std as f32)
            .map_err(|e| failed(TransformKind::RandomGaussianNoise, e.to_string()))?;
        Ok(self.rng.with(|rng| (0..len).map(|_| rng.sample(normal)).collect()))
    }
}

fn add_noise(volume: Volume, noise: &[f32]) -> AugmentResult<Volume> {
    if volume.num_elements() != noise.len() {
        return Err(failed(
            TransformKind::RandomGaussianNoise,
            format!(
                "noise field of {} voxels does not fit shape {:?}",
                noise.len(),
                volume.shape()
            ),
        ));
    }
    let shape = volume.shape().to_vec();
    let device = volume.device();
    let values = volume
        .into_values()?
        .into_iter()
        .zip(noise)
        .map(|(v, n)| v + n)
        .collect();
    Ok(Volume::from_values(values, shape)?.to_device(device))
}

impl Transform for RandomGaussianNoise {
    fn apply(&self, volume: Volume) -> AugmentResult<Volume> {
        let noise = self.noise(volume.num_elements())?;
        add_noise(volume, &noise)
    }

    fn apply_joint(&self, sample: JointSample) -> AugmentResult<JointSample> {
        let noise = self.noise(sample.image.num_elements())?;
        sample.try_map(|volume| add_noise(volume, &noise))
    }
}
