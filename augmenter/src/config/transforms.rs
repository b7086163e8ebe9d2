//! Per-kind transform records.
//!
//! Numeric parameters are kept as the raw text typed into the form; parsing and
//! validation happen once, in [`crate::compiler::plan`].

use serde::{Deserialize, Serialize};

use super::enums::{GridPaddingMode, InterpolationMode, KernelType, PadMethod, PadMode};

/// A `{from, to}` pair of raw bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeField {
    /// Lower bound.
    pub from: String,
    /// Upper bound.
    pub to: String,
}

impl RangeField {
    /// A range with both bounds filled in.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

fn three_blank() -> Vec<String> {
    vec![String::new(); 3]
}

/// Fixed-angle rotation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotateConfig {
    pub enabled: bool,
    /// Rotation angle in radians.
    pub angle: String,
    pub interpolation_mode: InterpolationMode,
}

/// Rotation by a random angle per axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomRotateConfig {
    pub enabled: bool,
    pub range_x: RangeField,
    pub range_y: RangeField,
    pub range_z: RangeField,
    pub padding_mode: GridPaddingMode,
    pub interpolation_mode: InterpolationMode,
    pub align_corners: bool,
}

/// Resampling to a fixed spatial size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    pub enabled: bool,
    /// One extent per spatial axis.
    pub spatial_size: Vec<String>,
    pub interpolation_mode: InterpolationMode,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            spatial_size: three_blank(),
            interpolation_mode: InterpolationMode::default(),
        }
    }
}

/// Mirror along one spatial axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlipConfig {
    pub enabled: bool,
    pub axis: String,
}

/// Mirror along a randomly chosen spatial axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomFlipConfig {
    pub enabled: bool,
}

/// Fixed zoom.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub enabled: bool,
    pub factor: String,
    pub interpolation_mode: InterpolationMode,
    pub padding_mode: PadMode,
    pub align_corners: bool,
}

/// Zoom by a random factor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomZoomConfig {
    pub enabled: bool,
    pub factor_min: String,
    pub factor_max: String,
    pub interpolation_mode: InterpolationMode,
    pub padding_mode: PadMode,
    pub align_corners: bool,
}

/// Multiply intensities by `1 + factor`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleIntensityConfig {
    pub enabled: bool,
    pub factor: String,
}

/// Scale intensities by a random factor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomScaleIntensityConfig {
    pub enabled: bool,
    pub factors: RangeField,
}

/// Gamma contrast adjustment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustContrastConfig {
    pub enabled: bool,
    pub gamma: String,
    pub invert_image: bool,
}

/// Gamma contrast adjustment with a random gamma.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomAdjustContrastConfig {
    pub enabled: bool,
    pub gamma: RangeField,
    pub invert_image: bool,
}

/// Additive gaussian noise. Blank mean means 0.0, blank std means 0.1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomGaussianNoiseConfig {
    pub enabled: bool,
    pub mean: String,
    pub std: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftIntensityConfig {
    pub enabled: bool,
    pub offset: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomShiftIntensityConfig {
    pub enabled: bool,
    pub offsets: RangeField,
}

/// `(v - subtrahend) / divisor`, optionally on non-zero voxels only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeIntensityConfig {
    pub enabled: bool,
    pub subtrahend: String,
    pub divisor: String,
    pub nonzero: bool,
}

/// Keep voxels on one side of a threshold, replace the rest with `cval`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdIntensityConfig {
    pub enabled: bool,
    pub threshold: String,
    pub cval: String,
    pub above: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedianSmoothConfig {
    pub enabled: bool,
    pub radius: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaussianSmoothConfig {
    pub enabled: bool,
    pub sigma: String,
    pub kernel: KernelType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomGaussianSmoothConfig {
    pub enabled: bool,
    pub sigma_x: RangeField,
    pub sigma_y: RangeField,
    pub sigma_z: RangeField,
    pub kernel: KernelType,
}

/// Pad up to a minimum spatial size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialPadConfig {
    pub enabled: bool,
    pub spatial_size: Vec<String>,
    pub method: PadMethod,
    pub mode: PadMode,
    pub fill_value: String,
}

impl Default for SpatialPadConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            spatial_size: three_blank(),
            method: PadMethod::default(),
            mode: PadMode::default(),
            fill_value: String::new(),
        }
    }
}

/// Pad every border by a fixed amount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BorderPadConfig {
    pub enabled: bool,
    pub spatial_border: String,
    pub mode: PadMode,
    pub fill_value: String,
}

/// Crop a region of interest given by centre and size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialCropConfig {
    pub enabled: bool,
    pub roi_center: Vec<String>,
    pub roi_size: Vec<String>,
}

impl Default for SpatialCropConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            roi_center: three_blank(),
            roi_size: three_blank(),
        }
    }
}

/// Crop a centred region of interest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CenterSpatialCropConfig {
    pub enabled: bool,
    pub roi_size: Vec<String>,
}

impl Default for CenterSpatialCropConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            roi_size: three_blank(),
        }
    }
}

/// The whole transform form: one record per transform kind.
///
/// Every kind is disabled by default, so a JSON document only needs to list the
/// kinds it enables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformsConfig {
    pub rotate: RotateConfig,
    pub random_rotate: RandomRotateConfig,
    pub resize: ResizeConfig,
    pub flip: FlipConfig,
    pub random_flip: RandomFlipConfig,
    pub zoom: ZoomConfig,
    pub random_zoom: RandomZoomConfig,
    pub scale_intensity: ScaleIntensityConfig,
    pub random_scale_intensity: RandomScaleIntensityConfig,
    pub adjust_contrast: AdjustContrastConfig,
    pub random_adjust_contrast: RandomAdjustContrastConfig,
    pub random_gaussian_noise: RandomGaussianNoiseConfig,
    pub shift_intensity: ShiftIntensityConfig,
    pub random_shift_intensity: RandomShiftIntensityConfig,
    pub normalize_intensity: NormalizeIntensityConfig,
    pub threshold_intensity: ThresholdIntensityConfig,
    pub median_smooth: MedianSmoothConfig,
    pub gaussian_smooth: GaussianSmoothConfig,
    pub random_gaussian_smooth: RandomGaussianSmoothConfig,
    pub spatial_pad: SpatialPadConfig,
    pub border_pad: BorderPadConfig,
    pub spatial_crop: SpatialCropConfig,
    pub center_spatial_crop: CenterSpatialCropConfig,
}
