//! Transform pipeline compiler.
//!
//! Compilation runs in two stages:
//!
//! 1. [`plan`] validates every enabled record of a [`TransformsConfig`] and
//!    produces typed [`TransformOp`]s in [`TransformKind::ALL`] order. It is a
//!    pure function of the configuration.
//! 2. [`compile`] hands each op to a [`TransformLibrary`] and wraps the result
//!    as an [`ExecutableTransform`] tagged with the kind's capabilities.

use std::fmt;

use crate::{
    config::{
        GridPaddingMode, InterpolationMode, KernelType, PadMethod, PadMode, RangeField,
        TransformsConfig,
    },
    error::{AugmentError, AugmentResult},
    kinds::{Capabilities, TransformKind},
    transform::{Transform, TransformLibrary},
    volume::{JointSample, Volume},
};

/// A validated transform with typed parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformOp {
    Rotate {
        /// Angle in radians.
        angle: f64,
        mode: InterpolationMode,
    },
    RandomRotate {
        range_x: [f64; 2],
        range_y: [f64; 2],
        range_z: [f64; 2],
        padding_mode: GridPaddingMode,
        mode: InterpolationMode,
        /// `None` when the interpolation mode ignores corner alignment.
        align_corners: Option<bool>,
    },
    Resize {
        spatial_size: Vec<usize>,
        mode: InterpolationMode,
    },
    Flip {
        /// Spatial axis, 0 being the first axis of the array.
        axis: usize,
    },
    RandomFlip,
    Zoom {
        factor: f64,
        mode: InterpolationMode,
        padding_mode: PadMode,
        align_corners: Option<bool>,
    },
    RandomZoom {
        min_zoom: f64,
        max_zoom: f64,
        mode: InterpolationMode,
        padding_mode: PadMode,
        align_corners: Option<bool>,
    },
    ScaleIntensity {
        factor: f64,
    },
    RandomScaleIntensity {
        factors: [f64; 2],
    },
    AdjustContrast {
        gamma: f64,
        invert_image: bool,
    },
    RandomAdjustContrast {
        gamma: [f64; 2],
        invert_image: bool,
    },
    RandomGaussianNoise {
        mean: f64,
        std: f64,
    },
    ShiftIntensity {
        offset: f64,
    },
    RandomShiftIntensity {
        offsets: [f64; 2],
    },
    NormalizeIntensity {
        subtrahend: f64,
        divisor: f64,
        nonzero: bool,
    },
    ThresholdIntensity {
        threshold: f64,
        cval: f64,
        above: bool,
    },
    MedianSmooth {
        radius: usize,
    },
    GaussianSmooth {
        sigma: f64,
        kernel: KernelType,
    },
    RandomGaussianSmooth {
        sigma_x: [f64; 2],
        sigma_y: [f64; 2],
        sigma_z: [f64; 2],
        kernel: KernelType,
    },
    SpatialPad {
        spatial_size: Vec<usize>,
        method: PadMethod,
        mode: PadMode,
        fill_value: f64,
    },
    BorderPad {
        spatial_border: usize,
        mode: PadMode,
        fill_value: f64,
    },
    SpatialCrop {
        roi_center: Vec<usize>,
        roi_size: Vec<usize>,
    },
    CenterSpatialCrop {
        roi_size: Vec<usize>,
    },
}

impl TransformOp {
    /// The kind this op was compiled from.
    #[must_use]
    pub const fn kind(&self) -> TransformKind {
        match self {
            Self::Rotate { .. } => TransformKind::Rotate,
            Self::RandomRotate { .. } => TransformKind::RandomRotate,
            Self::Resize { .. } => TransformKind::Resize,
            Self::Flip { .. } => TransformKind::Flip,
            Self::RandomFlip => TransformKind::RandomFlip,
            Self::Zoom { .. } => TransformKind::Zoom,
            Self::RandomZoom { .. } => TransformKind::RandomZoom,
            Self::ScaleIntensity { .. } => TransformKind::ScaleIntensity,
            Self::RandomScaleIntensity { .. } => TransformKind::RandomScaleIntensity,
            Self::AdjustContrast { .. } => TransformKind::AdjustContrast,
            Self::RandomAdjustContrast { .. } => TransformKind::RandomAdjustContrast,
            Self::RandomGaussianNoise { .. } => TransformKind::RandomGaussianNoise,
            Self::ShiftIntensity { .. } => TransformKind::ShiftIntensity,
            Self::RandomShiftIntensity { .. } => TransformKind::RandomShiftIntensity,
            Self::NormalizeIntensity { .. } => TransformKind::NormalizeIntensity,
            Self::ThresholdIntensity { .. } => TransformKind::ThresholdIntensity,
            Self::MedianSmooth { .. } => TransformKind::MedianSmooth,
            Self::GaussianSmooth { .. } => TransformKind::GaussianSmooth,
            Self::RandomGaussianSmooth { .. } => TransformKind::RandomGaussianSmooth,
            Self::SpatialPad { .. } => TransformKind::SpatialPad,
            Self::BorderPad { .. } => TransformKind::BorderPad,
            Self::SpatialCrop { .. } => TransformKind::SpatialCrop,
            Self::CenterSpatialCrop { .. } => TransformKind::CenterSpatialCrop,
        }
    }
}

/// A compiled transform ready to run, tagged with its static capabilities.
pub struct ExecutableTransform {
    op: TransformOp,
    capabilities: Capabilities,
    transform: Box<dyn Transform>,
}

impl ExecutableTransform {
    /// Wrap a built transform.
    #[must_use]
    pub fn new(op: TransformOp, transform: Box<dyn Transform>) -> Self {
        Self {
            capabilities: op.kind().capabilities(),
            op,
            transform,
        }
    }

    /// The kind this transform was compiled from.
    #[must_use]
    pub const fn kind(&self) -> TransformKind {
        self.op.kind()
    }

    /// The validated parameters.
    #[must_use]
    pub const fn op(&self) -> &TransformOp {
        &self.op
    }

    #[must_use]
    pub const fn canonical_name(&self) -> &'static str {
        self.capabilities.canonical_name
    }

    #[must_use]
    pub const fn is_randomizable(&self) -> bool {
        self.capabilities.randomizable
    }

    #[must_use]
    pub const fn requires_channel_dim(&self) -> bool {
        self.capabilities.requires_channel_dim
    }

    #[must_use]
    pub const fn preserves_geometry(&self) -> bool {
        self.capabilities.preserves_geometry
    }

    /// Run the transform on one array.
    ///
    /// # Errors
    ///
    /// Propagates the transform's error.
    pub fn apply(&self, volume: Volume) -> AugmentResult<Volume> {
        self.transform.apply(volume)
    }

    /// Run the transform on a joint sample.
    ///
    /// # Errors
    ///
    /// Propagates the transform's error.
    pub fn apply_joint(&self, sample: JointSample) -> AugmentResult<JointSample> {
        self.transform.apply_joint(sample)
    }
}

impl fmt::Debug for ExecutableTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutableTransform")
            .field("op", &self.op)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// An ordered list of executable transforms.
#[derive(Debug, Default)]
pub struct TransformPipeline {
    transforms: Vec<ExecutableTransform>,
}

impl TransformPipeline {
    /// A pipeline running `transforms` in the given order.
    #[must_use]
    pub fn new(transforms: Vec<ExecutableTransform>) -> Self {
        Self { transforms }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExecutableTransform> {
        self.transforms.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Canonical names in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.transforms.iter().map(ExecutableTransform::canonical_name).collect()
    }
}

impl<'a> IntoIterator for &'a TransformPipeline {
    type Item = &'a ExecutableTransform;
    type IntoIter = std::slice::Iter<'a, ExecutableTransform>;

    fn into_iter(self) -> Self::IntoIter {
        self.transforms.iter()
    }
}

/// Validate the configuration and produce typed ops in compile order.
///
/// # Errors
///
/// Returns [`AugmentError::InvalidTransform`] for the first enabled record with
/// missing or unparsable parameters and [`AugmentError::NoTransformEnabled`]
/// when nothing is enabled.
pub fn plan(config: &TransformsConfig) -> AugmentResult<Vec<TransformOp>> {
    let mut ops = Vec::new();
    for kind in TransformKind::ALL {
        if let Some(op) = plan_kind(kind, config)? {
            ops.push(op);
        }
    }

    if ops.is_empty() {
        return Err(AugmentError::NoTransformEnabled);
    }
    Ok(ops)
}

/// Validate the configuration and build every enabled transform through
/// `library`.
///
/// # Errors
///
/// Everything [`plan`] reports, plus whatever the library returns for a kind
/// it cannot build (usually [`AugmentError::UnsupportedTransform`]).
pub fn compile(
    config: &TransformsConfig,
    library: &dyn TransformLibrary,
) -> AugmentResult<TransformPipeline> {
    let transforms = plan(config)?
        .into_iter()
        .map(|op| {
            let transform = library.build(&op)?;
            Ok(ExecutableTransform::new(op, transform))
        })
        .collect::<AugmentResult<Vec<_>>>()?;

    let pipeline = TransformPipeline::new(transforms);
    tracing::info!(transforms = ?pipeline.names(), "compiled transform pipeline");
    Ok(pipeline)
}

fn plan_kind(kind: TransformKind, config: &TransformsConfig) -> AugmentResult<Option<TransformOp>> {
    let name = kind.display_name();
    let op = match kind {
        TransformKind::Rotate => {
            let c = &config.rotate;
            if !c.enabled {
                return Ok(None);
            }
            TransformOp::Rotate {
                angle: required_f64(name, "angle", &c.angle)?,
                mode: c.interpolation_mode,
            }
        }
        TransformKind::RandomRotate => {
            let c = &config.random_rotate;
            if !c.enabled {
                return Ok(None);
            }
            TransformOp::RandomRotate {
                range_x: axis_range(name, "range x", &c.range_x)?,
                range_y: axis_range(name, "range y", &c.range_y)?,
                range_z: axis_range(name, "range z", &c.range_z)?,
                padding_mode: c.padding_mode,
                mode: c.interpolation_mode,
                align_corners: align_corners(c.interpolation_mode, c.align_corners),
            }
        }
        TransformKind::Resize => {
            let c = &config.resize;
            if !c.enabled {
                return Ok(None);
            }
            TransformOp::Resize {
                spatial_size: size_tuple(name, "spatial size is not specified", &c.spatial_size)?,
                mode: c.interpolation_mode,
            }
        }
        TransformKind::Flip => {
            let c = &config.flip;
            if !c.enabled {
                return Ok(None);
            }
            TransformOp::Flip {
                axis: required_usize(name, "axis", &c.axis)?,
            }
        }
        TransformKind::RandomFlip => {
            if !config.random_flip.enabled {
                return Ok(None);
            }
            TransformOp::RandomFlip
        }
        TransformKind::Zoom => {
            let c = &config.zoom;
            if !c.enabled {
                return Ok(None);
            }
            TransformOp::Zoom {
                factor: required_f64(name, "factor", &c.factor)?,
                mode: c.interpolation_mode,
                padding_mode: c.padding_mode,
                align_corners: align_corners(c.interpolation_mode, c.align_corners),
            }
        }
        TransformKind::RandomZoom => {
            let c = &config.random_zoom;
            if !c.enabled {
                return Ok(None);
            }
            if is_blank(&c.factor_min) || is_blank(&c.factor_max) {
                return Err(AugmentError::invalid_transform(name, "factors are not specified"));
            }
            TransformOp::RandomZoom {
                min_zoom: required_f64(name, "minimum factor", &c.factor_min)?,
                max_zoom: required_f64(name, "maximum factor", &c.factor_max)?,
                mode: c.interpolation_mode,
                padding_mode: c.padding_mode,
                align_corners: align_corners(c.interpolation_mode, c.align_corners),
            }
        }
        TransformKind::ScaleIntensity => {
            let c = &config.scale_intensity;
            if !c.enabled {
                return Ok(None);
            }
            TransformOp::ScaleIntensity {
                factor: required_f64(name, "factor", &c.factor)?,
            }
        }
        TransformKind::RandomScaleIntensity => {
            let c = &config.random_scale_intensity;
            if !c.enabled {
                return Ok(None);
            }
            TransformOp::RandomScaleIntensity {
                factors: required_range(name, "factors", &c.factors)?,
            }
        }
        TransformKind::AdjustContrast => {
            let c = &config.adjust_contrast;
            if !c.enabled {
                return Ok(None);
            }
            TransformOp::AdjustContrast {
                gamma: required_f64(name, "gamma value", &c.gamma)?,
                invert_image: c.invert_image,
            }
        }
        TransformKind::RandomAdjustContrast => {
            let c = &config.random_adjust_contrast;
            if !c.enabled {
                return Ok(None);
            }
            TransformOp::RandomAdjustContrast {
                gamma: required_range(name, "gamma values", &c.gamma)?,
                invert_image: c.invert_image,
            }
        }
        TransformKind::RandomGaussianNoise => {
            let c = &config.random_gaussian_noise;
            if !c.enabled {
                return Ok(None);
            }
            TransformOp::RandomGaussianNoise {
                mean: optional_f64(name, "mean", &c.mean, 0.0)?,
                std: optional_f64(name, "std", &c.std, 0.1)?,
            }
        }
        TransformKind::ShiftIntensity => {
            let c = &config.shift_intensity;
            if !c.enabled {
                return Ok(None);
            }
            TransformOp::ShiftIntensity {
                offset: required_f64(name, "offset value", &c.offset)?,
            }
        }
        TransformKind::RandomShiftIntensity => {
            let c = &config.random_shift_intensity;
            if !c.enabled {
                return Ok(None);
            }
            TransformOp::RandomShiftIntensity {
                offsets: required_range(name, "offset values", &c.offsets)?,
            }
        }
        TransformKind::NormalizeIntensity => {
            let c = &config.normalize_intensity;
            if !c.enabled {
                return Ok(None);
            }
            if is_blank(&c.subtrahend) || is_blank(&c.divisor) {
                return Err(AugmentError::invalid_transform(name, "values are not specified"));
            }
            let divisor = required_f64(name, "divisor", &c.divisor)?;
            if divisor == 0.0 {
                return Err(AugmentError::invalid_transform(name, "divisor must not be zero"));
            }
            TransformOp::NormalizeIntensity {
                subtrahend: required_f64(name, "subtrahend", &c.subtrahend)?,
                divisor,
                nonzero: c.nonzero,
            }
        }
        TransformKind::ThresholdIntensity => {
            let c = &config.threshold_intensity;
            if !c.enabled {
                return Ok(None);
            }
            TransformOp::ThresholdIntensity {
                threshold: required_f64(name, "threshold value", &c.threshold)?,
                cval: optional_f64(name, "cval", &c.cval, 0.0)?,
                above: c.above,
            }
        }
        TransformKind::MedianSmooth => {
            let c = &config.median_smooth;
            if !c.enabled {
                return Ok(None);
            }
            let radius = if is_blank(&c.radius) {
                1
            } else {
                required_usize(name, "radius", &c.radius)?
            };
            TransformOp::MedianSmooth { radius }
        }
        TransformKind::GaussianSmooth => {
            let c = &config.gaussian_smooth;
            if !c.enabled {
                return Ok(None);
            }
            TransformOp::GaussianSmooth {
                sigma: optional_f64(name, "sigma", &c.sigma, 1.0)?,
                kernel: c.kernel,
            }
        }
        TransformKind::RandomGaussianSmooth => {
            let c = &config.random_gaussian_smooth;
            if !c.enabled {
                return Ok(None);
            }
            TransformOp::RandomGaussianSmooth {
                sigma_x: axis_range(name, "sigma x", &c.sigma_x)?,
                sigma_y: axis_range(name, "sigma y", &c.sigma_y)?,
                sigma_z: axis_range(name, "sigma z", &c.sigma_z)?,
                kernel: c.kernel,
            }
        }
        TransformKind::SpatialPad => {
            let c = &config.spatial_pad;
            if !c.enabled {
                return Ok(None);
            }
            const INVALID: &str = "parameters are not valid. Please check all the parameters.";
            if is_blank(&c.fill_value) {
                return Err(AugmentError::invalid_transform(name, INVALID));
            }
            TransformOp::SpatialPad {
                spatial_size: size_tuple(name, INVALID, &c.spatial_size)?,
                method: c.method,
                mode: c.mode,
                fill_value: required_f64(name, "fill value", &c.fill_value)?,
            }
        }
        TransformKind::BorderPad => {
            let c = &config.border_pad;
            if !c.enabled {
                return Ok(None);
            }
            if is_blank(&c.spatial_border) || is_blank(&c.fill_value) {
                return Err(AugmentError::invalid_transform(
                    name,
                    "parameters are not valid. Please check all the parameters.",
                ));
            }
            TransformOp::BorderPad {
                spatial_border: required_usize(name, "spatial border", &c.spatial_border)?,
                mode: c.mode,
                fill_value: required_f64(name, "fill value", &c.fill_value)?,
            }
        }
        TransformKind::SpatialCrop => {
            let c = &config.spatial_crop;
            if !c.enabled {
                return Ok(None);
            }
            const INVALID: &str = "ROI size or ROI center is not valid";
            let roi_center = size_tuple(name, INVALID, &c.roi_center)?;
            let roi_size = size_tuple(name, INVALID, &c.roi_size)?;
            if roi_center.len() != roi_size.len() {
                return Err(AugmentError::invalid_transform(name, INVALID));
            }
            TransformOp::SpatialCrop {
                roi_center,
                roi_size,
            }
        }
        TransformKind::CenterSpatialCrop => {
            let c = &config.center_spatial_crop;
            if !c.enabled {
                return Ok(None);
            }
            TransformOp::CenterSpatialCrop {
                roi_size: size_tuple(name, "ROI size is not valid", &c.roi_size)?,
            }
        }
    };
    Ok(Some(op))
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Corner alignment only applies to the linear interpolation family.
const fn align_corners(mode: InterpolationMode, requested: bool) -> Option<bool> {
    if mode.supports_align_corners() {
        Some(requested)
    } else {
        None
    }
}

fn parse_f64(transform: &'static str, field: &str, text: &str) -> AugmentResult<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AugmentError::invalid_transform(transform, format!("{field} '{text}' is not a number")))
}

fn required_f64(transform: &'static str, field: &str, text: &str) -> AugmentResult<f64> {
    if is_blank(text) {
        return Err(AugmentError::invalid_transform(transform, format!("{field} is not specified")));
    }
    parse_f64(transform, field, text)
}

fn optional_f64(transform: &'static str, field: &str, text: &str, default: f64) -> AugmentResult<f64> {
    if is_blank(text) {
        Ok(default)
    } else {
        parse_f64(transform, field, text)
    }
}

fn required_usize(transform: &'static str, field: &str, text: &str) -> AugmentResult<usize> {
    if is_blank(text) {
        return Err(AugmentError::invalid_transform(transform, format!("{field} is not specified")));
    }
    text.trim().parse::<usize>().map_err(|_| {
        AugmentError::invalid_transform(transform, format!("{field} '{text}' is not a non-negative integer"))
    })
}

/// Both bounds are required.
fn required_range(transform: &'static str, field: &str, range: &RangeField) -> AugmentResult<[f64; 2]> {
    if is_blank(&range.from) || is_blank(&range.to) {
        return Err(AugmentError::invalid_transform(transform, format!("{field} are not specified")));
    }
    Ok([
        parse_f64(transform, field, &range.from)?,
        parse_f64(transform, field, &range.to)?,
    ])
}

/// Per-axis range: used only when both bounds are given, `[0, 0]` otherwise.
/// Any bound that is given must still be a number.
fn axis_range(transform: &'static str, field: &str, range: &RangeField) -> AugmentResult<[f64; 2]> {
    let from = optional_f64(transform, field, &range.from, 0.0)?;
    let to = optional_f64(transform, field, &range.to, 0.0)?;
    if is_blank(&range.from) || is_blank(&range.to) {
        if is_blank(&range.from) != is_blank(&range.to) {
            tracing::debug!(transform, field, "half-specified range, using [0, 0]");
        }
        return Ok([0.0, 0.0]);
    }
    Ok([from, to])
}

/// Every component must be present; otherwise one combined error is raised.
fn size_tuple(transform: &'static str, reason: &'static str, components: &[String]) -> AugmentResult<Vec<usize>> {
    if components.is_empty() || components.iter().any(|c| is_blank(c)) {
        return Err(AugmentError::invalid_transform(transform, reason));
    }
    components
        .iter()
        .map(|c| c.trim().parse::<usize>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| AugmentError::invalid_transform(transform, reason))
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use rstest::rstest;

    use super::*;
    use crate::config::{FlipConfig, RotateConfig};

    fn identity_library() -> impl TransformLibrary {
        |_: &TransformOp| -> AugmentResult<Box<dyn Transform>> {
            Ok(Box::new(|volume: Volume| -> AugmentResult<Volume> { Ok(volume) }))
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn disabled_configuration_is_rejected() {
        let err = plan(&TransformsConfig::default()).unwrap_err();
        assert!(matches!(err, AugmentError::NoTransformEnabled));
        assert_eq!(err.to_string(), "Choose at least one transformation to apply");
    }

    #[test]
    fn rotate_without_angle_names_rotate() {
        let mut config = TransformsConfig::default();
        config.rotate = RotateConfig {
            enabled: true,
            ..RotateConfig::default()
        };

        let err = plan(&config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The 'Rotate' transformation is enabled but angle is not specified"
        );
    }

    #[test]
    fn resize_with_one_blank_component_names_resize() {
        let mut config = TransformsConfig::default();
        config.resize.enabled = true;
        config.resize.spatial_size = strings(&["64", "", "32"]);

        let err = plan(&config).unwrap_err();
        assert!(matches!(err, AugmentError::InvalidTransform { transform: "Resize", .. }));
    }

    #[rstest]
    #[case("")]
    #[case("-1")]
    #[case("x")]
    fn flip_axis_must_be_a_non_negative_integer(#[case] axis: &str) {
        let mut config = TransformsConfig::default();
        config.flip = FlipConfig {
            enabled: true,
            axis: axis.into(),
        };
        let err = plan(&config).unwrap_err();
        assert!(matches!(err, AugmentError::InvalidTransform { transform: "Flip", .. }));
    }

    #[test]
    fn plan_follows_the_fixed_kind_order() {
        let mut config = TransformsConfig::default();
        config.center_spatial_crop.enabled = true;
        config.center_spatial_crop.roi_size = strings(&["8", "8", "8"]);
        config.shift_intensity.enabled = true;
        config.shift_intensity.offset = "0.5".into();
        config.flip = FlipConfig {
            enabled: true,
            axis: "1".into(),
        };

        let kinds: Vec<_> = plan(&config).unwrap().iter().map(TransformOp::kind).collect();
        assert_eq!(
            kinds,
            vec![TransformKind::Flip, TransformKind::ShiftIntensity, TransformKind::CenterSpatialCrop]
        );
    }

    #[test]
    fn compiling_twice_gives_identical_names() {
        let mut config = TransformsConfig::default();
        config.random_flip.enabled = true;
        config.scale_intensity.enabled = true;
        config.scale_intensity.factor = "0.1".into();
        config.spatial_pad.enabled = true;
        config.spatial_pad.spatial_size = strings(&["4", "4", "4"]);
        config.spatial_pad.fill_value = "0".into();

        let library = identity_library();
        let first = compile(&config, &library).unwrap();
        let second = compile(&config, &library).unwrap();
        assert_eq!(first.names(), second.names());
        assert_eq!(first.names(), vec!["RandAxisFlip", "ScaleIntensity", "SpatialPad"]);
    }

    #[test]
    fn executable_transforms_carry_capabilities() {
        let mut config = TransformsConfig::default();
        config.resize.enabled = true;
        config.resize.spatial_size = strings(&["16", "16", "16"]);
        config.random_rotate.enabled = true;

        let pipeline = compile(&config, &identity_library()).unwrap();
        let rotate = pipeline.iter().next().unwrap();
        assert!(rotate.is_randomizable());
        assert!(!rotate.requires_channel_dim());
        let resize = pipeline.iter().nth(1).unwrap();
        assert!(!resize.is_randomizable());
        assert!(resize.requires_channel_dim());
        assert!(!resize.preserves_geometry());
    }

    #[test]
    fn blank_random_ranges_default_to_zero() {
        let mut config = TransformsConfig::default();
        config.random_rotate.enabled = true;
        config.random_rotate.range_x = RangeField::new("-0.3", "0.3");
        config.random_rotate.range_y = RangeField::new("0.2", "");

        let ops = plan(&config).unwrap();
        let TransformOp::RandomRotate {
            range_x,
            range_y,
            range_z,
            ..
        } = &ops[0]
        else {
            panic!("expected a random rotate op");
        };
        assert_eq!(*range_x, [-0.3, 0.3]);
        assert_eq!(*range_y, [0.0, 0.0]);
        assert_eq!(*range_z, [0.0, 0.0]);
    }

    #[test]
    fn present_range_bounds_must_be_numbers() {
        let mut config = TransformsConfig::default();
        config.random_gaussian_smooth.enabled = true;
        config.random_gaussian_smooth.sigma_x = RangeField::new("a", "1");

        let err = plan(&config).unwrap_err();
        assert!(matches!(
            err,
            AugmentError::InvalidTransform {
                transform: "Random Gaussian Smooth",
                ..
            }
        ));
    }

    #[rstest]
    #[case(InterpolationMode::Nearest, true, None)]
    #[case(InterpolationMode::Area, true, None)]
    #[case(InterpolationMode::Bilinear, true, Some(true))]
    #[case(InterpolationMode::Trilinear, false, Some(false))]
    fn align_corners_is_dropped_for_non_linear_modes(
        #[case] mode: InterpolationMode,
        #[case] requested: bool,
        #[case] expected: Option<bool>,
    ) {
        let mut config = TransformsConfig::default();
        config.zoom.enabled = true;
        config.zoom.factor = "1.2".into();
        config.zoom.interpolation_mode = mode;
        config.zoom.align_corners = requested;

        let ops = plan(&config).unwrap();
        assert!(matches!(&ops[0], TransformOp::Zoom { align_corners, .. } if *align_corners == expected));
    }

    #[test]
    fn optional_fields_fall_back_to_defaults() {
        let mut config = TransformsConfig::default();
        config.random_gaussian_noise.enabled = true;
        config.threshold_intensity.enabled = true;
        config.threshold_intensity.threshold = "0.5".into();
        config.median_smooth.enabled = true;
        config.gaussian_smooth.enabled = true;

        let ops = plan(&config).unwrap();
        assert_eq!(ops[0], TransformOp::RandomGaussianNoise { mean: 0.0, std: 0.1 });
        assert_eq!(
            ops[1],
            TransformOp::ThresholdIntensity {
                threshold: 0.5,
                cval: 0.0,
                above: false
            }
        );
        assert_eq!(ops[2], TransformOp::MedianSmooth { radius: 1 });
        assert_eq!(
            ops[3],
            TransformOp::GaussianSmooth {
                sigma: 1.0,
                kernel: KernelType::Erf
            }
        );
    }

    #[rstest]
    #[case("", "0")]
    #[case("4", "")]
    fn border_pad_requires_border_and_fill(#[case] border: &str, #[case] fill: &str) {
        let mut config = TransformsConfig::default();
        config.border_pad.enabled = true;
        config.border_pad.spatial_border = border.into();
        config.border_pad.fill_value = fill.into();

        let err = plan(&config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The 'Border Pad' transformation is enabled but parameters are not valid. \
             Please check all the parameters."
        );
    }

    #[test]
    fn normalize_rejects_a_zero_divisor() {
        let mut config = TransformsConfig::default();
        config.normalize_intensity.enabled = true;
        config.normalize_intensity.subtrahend = "1".into();
        config.normalize_intensity.divisor = "0".into();

        let err = plan(&config).unwrap_err();
        assert!(err.to_string().contains("divisor must not be zero"));
    }

    #[test]
    fn spatial_crop_requires_complete_tuples() {
        let mut config = TransformsConfig::default();
        config.spatial_crop.enabled = true;
        config.spatial_crop.roi_center = strings(&["4", "4", "4"]);
        config.spatial_crop.roi_size = strings(&["2", "", "2"]);

        let err = plan(&config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The 'Spatial Crop' transformation is enabled but ROI size or ROI center is not valid"
        );
    }

    #[test]
    fn library_refusals_abort_compilation() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let library = move |op: &TransformOp| -> AugmentResult<Box<dyn Transform>> {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(AugmentError::UnsupportedTransform {
                transform: op.kind().display_name(),
            })
        };

        let mut config = TransformsConfig::default();
        config.rotate.enabled = true;
        config.rotate.angle = "0.5".into();
        config.flip.enabled = true;
        config.flip.axis = "0".into();

        let err = compile(&config, &library).unwrap_err();
        assert!(matches!(err, AugmentError::UnsupportedTransform { transform: "Rotate" }));
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }
}
