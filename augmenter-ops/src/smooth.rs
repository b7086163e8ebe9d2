//! Median and Gaussian smoothing of 2D images.
//!
//! Both pad by repeating the edge pixel. Gaussian kernels are truncated at
//! four standard deviations and applied separably with
//! `imageproc::filter::separable_filter`; the first spatial axis (rows) takes
//! the first sigma.

use image_augmenter::{
    AugmentResult, JointSample, KernelType, Transform, TransformKind, Volume,
};
use imageproc::filter::separable_filter;

use crate::{
    failed,
    grid::MAX_AXIS_LEN,
    random::SharedRng,
    raster::{GrayF32, Plane},
};

const TRUNCATE: f64 = 4.0;

/// Above this sigma the scale-space kernel is replaced by the sampled one,
/// which it matches to within float precision.
const SCALESPACE_LIMIT: f64 = 32.0;

/// Normalized 1D Gaussian kernel for `sigma`.
///
/// A zero sigma gives the identity kernel.
///
/// # Errors
///
/// Returns a reason when sigma is negative, not finite, or needs a kernel
/// longer than any axis can be.
pub fn gaussian_kernel(sigma: f64, kernel: KernelType) -> Result<Vec<f32>, String> {
    if !(sigma.is_finite() && sigma >= 0.0) {
        return Err(format!("sigma {sigma} must be a non-negative number"));
    }
    if sigma == 0.0 {
        return Ok(vec![1.0]);
    }
    let radius = (TRUNCATE * sigma).ceil() as usize;
    if radius > MAX_AXIS_LEN {
        return Err(format!("sigma {sigma} needs a kernel wider than {MAX_AXIS_LEN}"));
    }
    let taps = (0..=2 * radius).map(|i| i as f64 - radius as f64);
    let weights: Vec<f64> = match kernel {
        KernelType::Sampled => taps.map(|x| (-0.5 * (x / sigma).powi(2)).exp()).collect(),
        KernelType::Erf => {
            let s = sigma * std::f64::consts::SQRT_2;
            taps.map(|x| 0.5 * (libm::erf((x + 0.5) / s) - libm::erf((x - 0.5) / s)))
                .collect()
        }
        KernelType::Scalespace if sigma > SCALESPACE_LIMIT => {
            return gaussian_kernel(sigma, KernelType::Sampled);
        }
        KernelType::Scalespace => {
            let t = sigma * sigma;
            taps.map(|x| scale_space_weight(x.abs() as u32, t)).collect()
        }
    };
    let sum: f64 = weights.iter().sum();
    Ok(weights.into_iter().map(|w| (w / sum) as f32).collect())
}

/// `exp(-t) * I_n(t)`, the discrete analogue of the Gaussian, summed in log
/// space from the series of the modified Bessel function.
fn scale_space_weight(n: u32, t: f64) -> f64 {
    let log_half = (t / 2.0).ln();
    let terms = t as usize + 64;
    let logs: Vec<f64> = (0..terms)
        .map(|k| {
            let k = k as f64;
            let n = f64::from(n);
            (2.0 * k + n) * log_half - libm::lgamma(k + 1.0) - libm::lgamma(k + n + 1.0)
        })
        .collect();
    let peak = logs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let sum: f64 = logs.iter().map(|l| (l - peak).exp()).sum();
    (peak + sum.ln() - t).exp()
}

fn smooth_volume(
    volume: &Volume,
    sigmas: [f64; 2],
    kernel: KernelType,
    kind: TransformKind,
) -> AugmentResult<Volume> {
    let plane = Plane::from_volume(volume, kind)?;
    let rows = gaussian_kernel(sigmas[0], kernel).map_err(|reason| failed(kind, reason))?;
    let cols = gaussian_kernel(sigmas[1], kernel).map_err(|reason| failed(kind, reason))?;
    let smoothed: GrayF32 = separable_filter(&plane.image, &cols, &rows);
    plane.with_image(smoothed).into_volume()
}

/// Gaussian smoothing with one sigma for both axes.
#[derive(Debug, Clone, Copy)]
pub struct GaussianSmooth {
    pub sigma: f64,
    pub kernel: KernelType,
}

impl Transform for GaussianSmooth {
    fn apply(&self, volume: Volume) -> AugmentResult<Volume> {
        smooth_volume(
            &volume,
            [self.sigma; 2],
            self.kernel,
            TransformKind::GaussianSmooth,
        )
    }
}

/// Gaussian smoothing with per-axis sigmas drawn from `sigma_x` (rows) and
/// `sigma_y` (columns); image and mask share the draw.
#[derive(Debug)]
pub struct RandomGaussianSmooth {
    pub sigma_x: [f64; 2],
    pub sigma_y: [f64; 2],
    pub kernel: KernelType,
    rng: SharedRng,
}

impl RandomGaussianSmooth {
    pub const fn new(sigma_x: [f64; 2], sigma_y: [f64; 2], kernel: KernelType, rng: SharedRng) -> Self {
        Self {
            sigma_x,
            sigma_y,
            kernel,
            rng,
        }
    }

    fn draw(&self) -> [f64; 2] {
        [self.rng.uniform(self.sigma_x), self.rng.uniform(self.sigma_y)]
    }

    fn smooth(&self, volume: &Volume, sigmas: [f64; 2]) -> AugmentResult<Volume> {
        smooth_volume(
            volume,
            sigmas,
            self.kernel,
            TransformKind::RandomGaussianSmooth,
        )
    }
}

impl Transform for RandomGaussianSmooth {
    fn apply(&self, volume: Volume) -> AugmentResult<Volume> {
        let sigmas = self.draw();
        self.smooth(&volume, sigmas)
    }

    fn apply_joint(&self, sample: JointSample) -> AugmentResult<JointSample> {
        let sigmas = self.draw();
        tracing::debug!(?sigmas, "random smoothing sigmas drawn");
        sample.try_map(|volume| self.smooth(&volume, sigmas))
    }
}

/// Median over a `(2 * radius + 1)` square window.
#[derive(Debug, Clone, Copy)]
pub struct MedianSmooth {
    pub radius: usize,
}

impl Transform for MedianSmooth {
    fn apply(&self, volume: Volume) -> AugmentResult<Volume> {
        let kind = TransformKind::MedianSmooth;
        let plane = Plane::from_volume(&volume, kind)?;
        if self.radius == 0 {
            return Ok(volume);
        }
        if self.radius > MAX_AXIS_LEN {
            return Err(failed(
                kind,
                format!("radius {} exceeds the limit of {MAX_AXIS_LEN}", self.radius),
            ));
        }
        let filtered = median_filter(&plane.image, self.radius as i64);
        plane.with_image(filtered).into_volume()
    }
}

// `imageproc::filter::median_filter` only takes 8-bit pixels.
fn median_filter(image: &GrayF32, radius: i64) -> GrayF32 {
    let (width, height) = image.dimensions();
    let clamp = |v: i64, len: u32| v.clamp(0, i64::from(len) - 1) as u32;
    let mut window = Vec::with_capacity(((2 * radius + 1) * (2 * radius + 1)) as usize);
    GrayF32::from_fn(width, height, |x, y| {
        window.clear();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let sx = clamp(i64::from(x) + dx, width);
                let sy = clamp(i64::from(y) + dy, height);
                window.push(image.get_pixel(sx, sy).0[0]);
            }
        }
        let mid = window.len() / 2;
        let (_, median, _) = window.select_nth_unstable_by(mid, f32::total_cmp);
        image::Luma([*median])
    })
}
