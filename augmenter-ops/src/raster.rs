//! Resampling of 2D images: rotation, resizing and zoom.
//!
//! A volume is viewed as one `[H, W]` plane after its leading unit axes (such
//! as a channel axis) are set aside; anything else is refused at apply time.
//! Warps go through `imageproc` on `f32` pixels, so nearest-neighbour
//! sampling keeps voxel values exact. The filtered resize modes use
//! `image::imageops::resize`, which only keeps values inside `[0, 1]`, so
//! planes are rescaled into that range around the call.

use image::{
    imageops::{self, FilterType},
    ImageBuffer, Luma,
};
use image_augmenter::{
    AugmentResult, Device, GridPaddingMode, InterpolationMode, JointSample, PadMode, Transform,
    TransformKind, Volume,
};
use imageproc::geometric_transformations::{warp_into_with, Interpolation};

use crate::{
    failed,
    grid::{cropped, identity, padded, remap, AxisMap, MAX_AXIS_LEN, MAX_VOXELS},
    random::SharedRng,
};

/// Single-channel float raster.
pub type GrayF32 = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Source pixels added around a plane before warping; bicubic needs two
/// neighbours past the last in-range coordinate.
const MARGIN: u32 = 3;

/// A volume seen as a single 2D plane.
#[derive(Debug, Clone)]
pub struct Plane {
    lead: Vec<usize>,
    device: Device,
    pub image: GrayF32,
}

impl Plane {
    /// View `volume` as a plane.
    ///
    /// # Errors
    ///
    /// Returns [`image_augmenter::AugmentError::TransformFailed`] unless every
    /// axis but the last two has length one.
    pub fn from_volume(volume: &Volume, kind: TransformKind) -> AugmentResult<Self> {
        let shape = volume.shape();
        let (lead, spatial) = shape.split_at(shape.len().saturating_sub(2));
        if spatial.len() != 2 || lead.iter().any(|&len| len != 1) {
            return Err(failed(kind, format!("expects a 2D image, got shape {shape:?}")));
        }
        if spatial.iter().any(|&len| len > MAX_AXIS_LEN) {
            return Err(failed(
                kind,
                format!("shape {shape:?} exceeds the axis limit of {MAX_AXIS_LEN}"),
            ));
        }
        let image = GrayF32::from_raw(spatial[1] as u32, spatial[0] as u32, volume.values()?.to_vec())
            .ok_or_else(|| failed(kind, format!("values do not fill shape {shape:?}")))?;
        Ok(Self {
            lead: lead.to_vec(),
            device: volume.device(),
            image,
        })
    }

    /// Same leading axes and device, new pixels.
    #[must_use]
    pub fn with_image(&self, image: GrayF32) -> Self {
        Self {
            lead: self.lead.clone(),
            device: self.device,
            image,
        }
    }

    /// Back to a volume with the original leading axes.
    ///
    /// # Errors
    ///
    /// Propagates [`Volume::from_values`] failures.
    pub fn into_volume(self) -> AugmentResult<Volume> {
        let (width, height) = self.image.dimensions();
        let mut shape = self.lead;
        shape.extend([height as usize, width as usize]);
        Ok(Volume::from_values(self.image.into_raw(), shape)?.to_device(self.device))
    }
}

const fn interpolation(mode: InterpolationMode) -> Interpolation {
    match mode {
        InterpolationMode::Nearest | InterpolationMode::NearestExact => Interpolation::Nearest,
        InterpolationMode::Bicubic => Interpolation::Bicubic,
        InterpolationMode::Linear
        | InterpolationMode::Bilinear
        | InterpolationMode::Trilinear
        | InterpolationMode::Area => Interpolation::Bilinear,
    }
}

/// `imageops` filter for a resize; `None` samples the nearest pixel instead.
const fn resize_filter(mode: InterpolationMode) -> Option<FilterType> {
    match mode {
        InterpolationMode::Nearest | InterpolationMode::NearestExact => None,
        InterpolationMode::Bicubic => Some(FilterType::CatmullRom),
        InterpolationMode::Linear
        | InterpolationMode::Bilinear
        | InterpolationMode::Trilinear
        | InterpolationMode::Area => Some(FilterType::Triangle),
    }
}

/// Fold an out-of-range source coordinate back into `[0, len - 1]`.
fn fold(coord: f32, len: u32, mode: GridPaddingMode) -> f32 {
    let last = len.saturating_sub(1) as f32;
    match mode {
        GridPaddingMode::Zeros => coord,
        GridPaddingMode::Border => coord.clamp(0.0, last),
        GridPaddingMode::Reflection => {
            if last == 0.0 {
                return 0.0;
            }
            let period = 2.0 * last;
            let m = coord.rem_euclid(period);
            if m > last {
                period - m
            } else {
                m
            }
        }
    }
}

/// `image` surrounded by [`MARGIN`] pixels, zero or copied from the edge.
fn framed(image: &GrayF32, replicate: bool) -> GrayF32 {
    let (width, height) = image.dimensions();
    ImageBuffer::from_fn(width + 2 * MARGIN, height + 2 * MARGIN, |x, y| {
        let inside = (MARGIN..width + MARGIN).contains(&x) && (MARGIN..height + MARGIN).contains(&y);
        if inside || replicate {
            let sx = x.saturating_sub(MARGIN).min(width - 1);
            let sy = y.saturating_sub(MARGIN).min(height - 1);
            *image.get_pixel(sx, sy)
        } else {
            Luma([0.0])
        }
    })
}

/// Resample `source` onto a `width` x `height` grid. `mapping` gives the
/// source coordinate of each output pixel centre.
fn warp_plane<F>(
    source: &GrayF32,
    (width, height): (u32, u32),
    mapping: F,
    interpolation: Interpolation,
    padding: GridPaddingMode,
) -> GrayF32
where
    F: Fn(f32, f32) -> (f32, f32) + Send + Sync,
{
    let mut out = GrayF32::new(width, height);
    let (src_width, src_height) = source.dimensions();
    if src_width == 0 || src_height == 0 {
        return out;
    }
    let frame = framed(source, padding != GridPaddingMode::Zeros);
    let margin = MARGIN as f32;
    warp_into_with(
        &frame,
        |x, y| {
            let (sx, sy) = mapping(x, y);
            (
                fold(sx, src_width, padding) + margin,
                fold(sy, src_height, padding) + margin,
            )
        },
        interpolation,
        Luma([0.0]),
        &mut out,
    );
    out
}

/// Rotate about the plane centre; positive angles turn clockwise as
/// displayed with rows running down.
fn rotate_plane(
    image: &GrayF32,
    angle: f64,
    mode: InterpolationMode,
    padding: GridPaddingMode,
) -> GrayF32 {
    let (width, height) = image.dimensions();
    let cx = width.saturating_sub(1) as f32 / 2.0;
    let cy = height.saturating_sub(1) as f32 / 2.0;
    let (sin, cos) = (angle as f32).sin_cos();
    warp_plane(
        image,
        (width, height),
        move |x, y| {
            let (dx, dy) = (x - cx, y - cy);
            (cos * dx + sin * dy + cx, cos * dy - sin * dx + cy)
        },
        interpolation(mode),
        padding,
    )
}

/// Affine map of plane values into `[0, 1]` and back.
#[derive(Debug, Clone, Copy)]
struct UnitRange {
    offset: f64,
    scale: f64,
}

impl UnitRange {
    fn of(image: &GrayF32) -> Self {
        let (lo, hi) = image
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let (lo, hi) = (f64::from(lo), f64::from(hi));
        if lo >= 0.0 && hi <= 1.0 {
            Self { offset: 0.0, scale: 1.0 }
        } else if hi > lo {
            Self { offset: lo, scale: hi - lo }
        } else {
            Self { offset: lo, scale: 1.0 }
        }
    }

    fn apply(self, image: &mut GrayF32, f: impl Fn(f64) -> f64) {
        if self.offset == 0.0 && self.scale == 1.0 {
            return;
        }
        for v in image.iter_mut() {
            *v = f(f64::from(*v)) as f32;
        }
    }

    fn normalized(self, image: &GrayF32) -> GrayF32 {
        let mut out = image.clone();
        self.apply(&mut out, |v| (v - self.offset) / self.scale);
        out
    }

    fn restored(self, mut image: GrayF32) -> GrayF32 {
        self.apply(&mut image, |v| v * self.scale + self.offset);
        image
    }
}

fn resize_plane(image: &GrayF32, (width, height): (u32, u32), mode: InterpolationMode) -> GrayF32 {
    let (src_width, src_height) = image.dimensions();
    match resize_filter(mode) {
        None => {
            let rx = src_width as f32 / width.max(1) as f32;
            let ry = src_height as f32 / height.max(1) as f32;
            warp_plane(
                image,
                (width, height),
                move |x, y| ((x + 0.5) * rx - 0.5, (y + 0.5) * ry - 0.5),
                Interpolation::Nearest,
                GridPaddingMode::Border,
            )
        }
        Some(filter) => {
            let range = UnitRange::of(image);
            range.restored(imageops::resize(&range.normalized(image), width, height, filter))
        }
    }
}

/// Checked `(width, height)` for a `[rows, cols]` target.
fn target_dimensions(rows: usize, cols: usize, kind: TransformKind) -> AugmentResult<(u32, u32)> {
    let fits = (1..=MAX_AXIS_LEN).contains(&rows)
        && (1..=MAX_AXIS_LEN).contains(&cols)
        && rows.checked_mul(cols).is_some_and(|n| n <= MAX_VOXELS);
    if !fits {
        return Err(failed(
            kind,
            format!("output size [{rows}, {cols}] is empty or exceeds the size limits"),
        ));
    }
    Ok((cols as u32, rows as u32))
}

fn rotate_volume(
    volume: &Volume,
    angle: f64,
    mode: InterpolationMode,
    padding: GridPaddingMode,
    kind: TransformKind,
) -> AugmentResult<Volume> {
    let plane = Plane::from_volume(volume, kind)?;
    let rotated = rotate_plane(&plane.image, angle, mode, padding);
    plane.with_image(rotated).into_volume()
}

/// Rotate by a fixed angle in radians, filling uncovered pixels with zero.
#[derive(Debug, Clone, Copy)]
pub struct Rotate {
    pub angle: f64,
    pub mode: InterpolationMode,
}

impl Transform for Rotate {
    fn apply(&self, volume: Volume) -> AugmentResult<Volume> {
        rotate_volume(
            &volume,
            self.angle,
            self.mode,
            GridPaddingMode::Zeros,
            TransformKind::Rotate,
        )
    }
}

/// Rotate by an angle drawn from `range`; image and mask share the draw.
#[derive(Debug)]
pub struct RandomRotate {
    pub range: [f64; 2],
    pub mode: InterpolationMode,
    pub padding_mode: GridPaddingMode,
    rng: SharedRng,
}

impl RandomRotate {
    pub const fn new(
        range: [f64; 2],
        mode: InterpolationMode,
        padding_mode: GridPaddingMode,
        rng: SharedRng,
    ) -> Self {
        Self {
            range,
            mode,
            padding_mode,
            rng,
        }
    }

    fn rotate(&self, volume: &Volume, angle: f64) -> AugmentResult<Volume> {
        rotate_volume(
            volume,
            angle,
            self.mode,
            self.padding_mode,
            TransformKind::RandomRotate,
        )
    }
}

impl Transform for RandomRotate {
    fn apply(&self, volume: Volume) -> AugmentResult<Volume> {
        let angle = self.rng.uniform(self.range);
        self.rotate(&volume, angle)
    }

    fn apply_joint(&self, sample: JointSample) -> AugmentResult<JointSample> {
        let angle = self.rng.uniform(self.range);
        tracing::debug!(angle, "random rotation drawn");
        sample.try_map(|volume| self.rotate(&volume, angle))
    }
}

/// Resample the spatial axes of a channel-first image to a fixed size.
#[derive(Debug, Clone)]
pub struct Resize {
    pub spatial_size: Vec<usize>,
    pub mode: InterpolationMode,
}

impl Transform for Resize {
    fn apply(&self, volume: Volume) -> AugmentResult<Volume> {
        let kind = TransformKind::Resize;
        let [rows, cols] = self.spatial_size[..] else {
            return Err(failed(
                kind,
                format!(
                    "{} size components do not match a 2D image",
                    self.spatial_size.len()
                ),
            ));
        };
        let target = target_dimensions(rows, cols, kind)?;
        let plane = Plane::from_volume(&volume, kind)?;
        let resized = resize_plane(&plane.image, target, self.mode);
        plane.with_image(resized).into_volume()
    }
}

/// Scale the content by `factor` about the centre, then pad or crop back to
/// the input size.
fn zoom_volume(
    volume: &Volume,
    factor: f64,
    mode: InterpolationMode,
    padding_mode: PadMode,
    kind: TransformKind,
) -> AugmentResult<Volume> {
    if !(factor.is_finite() && factor > 0.0) {
        return Err(failed(kind, format!("zoom factor {factor} must be positive")));
    }
    let plane = Plane::from_volume(volume, kind)?;
    let (width, height) = plane.image.dimensions();
    if width == 0 || height == 0 {
        return Ok(volume.clone());
    }
    let scaled = |len: u32| ((f64::from(len) * factor).floor() as usize).max(1);
    let target = target_dimensions(scaled(height), scaled(width), kind)?;
    let zoomed = plane
        .with_image(resize_plane(&plane.image, target, mode))
        .into_volume()?;

    let shape = zoomed.shape().to_vec();
    let spatial_start = shape.len() - 2;
    let original = [height as usize, width as usize];
    let mut maps: Vec<AxisMap> = shape[..spatial_start].iter().map(|&len| identity(len)).collect();
    for (&len, &want) in shape[spatial_start..].iter().zip(&original) {
        let map = if len >= want {
            cropped((len - want) / 2, want)
        } else {
            let extra = want - len;
            padded(len, extra / 2, extra - extra / 2, padding_mode)
                .map_err(|e| failed(kind, e.to_string()))?
        };
        maps.push(map);
    }
    remap(&zoomed, &maps, 0.0)
}

/// Fixed zoom; factors above one magnify.
#[derive(Debug, Clone, Copy)]
pub struct Zoom {
    pub factor: f64,
    pub mode: InterpolationMode,
    pub padding_mode: PadMode,
}

impl Transform for Zoom {
    fn apply(&self, volume: Volume) -> AugmentResult<Volume> {
        zoom_volume(
            &volume,
            self.factor,
            self.mode,
            self.padding_mode,
            TransformKind::Zoom,
        )
    }
}

/// Zoom by a factor drawn from `[min_zoom, max_zoom]`; image and mask share
/// the draw.
#[derive(Debug)]
pub struct RandomZoom {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub mode: InterpolationMode,
    pub padding_mode: PadMode,
    rng: SharedRng,
}

impl RandomZoom {
    pub const fn new(
        min_zoom: f64,
        max_zoom: f64,
        mode: InterpolationMode,
        padding_mode: PadMode,
        rng: SharedRng,
    ) -> Self {
        Self {
            min_zoom,
            max_zoom,
            mode,
            padding_mode,
            rng,
        }
    }

    fn zoom(&self, volume: &Volume, factor: f64) -> AugmentResult<Volume> {
        zoom_volume(
            volume,
            factor,
            self.mode,
            self.padding_mode,
            TransformKind::RandomZoom,
        )
    }
}

impl Transform for RandomZoom {
    fn apply(&self, volume: Volume) -> AugmentResult<Volume> {
        let factor = self.rng.uniform([self.min_zoom, self.max_zoom]);
        self.zoom(&volume, factor)
    }

    fn apply_joint(&self, sample: JointSample) -> AugmentResult<JointSample> {
        let factor = self.rng.uniform([self.min_zoom, self.max_zoom]);
        tracing::debug!(factor, "random zoom drawn");
        sample.try_map(|volume| self.zoom(&volume, factor))
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use approx::assert_relative_eq;
    use image_augmenter::AugmentError;
    use rstest::rstest;

    use super::*;

    fn square() -> Volume {
        Volume::from_values((1..=9).map(|v| v as f32).collect(), [3, 3]).unwrap()
    }

    fn values(volume: &Volume) -> Vec<f32> {
        volume.values().unwrap().to_vec()
    }

    #[test]
    fn quarter_turns_move_pixels_exactly() {
        let rotate = Rotate {
            angle: FRAC_PI_2,
            mode: InterpolationMode::Nearest,
        };
        let out = rotate.apply(square()).unwrap();
        assert_eq!(out.shape(), &[3, 3]);
        assert_eq!(values(&out), vec![7.0, 4.0, 1.0, 8.0, 5.0, 2.0, 9.0, 6.0, 3.0]);
    }

    #[test]
    fn bilinear_half_turns_keep_the_content() {
        let rotate = Rotate {
            angle: PI,
            mode: InterpolationMode::Bilinear,
        };
        let out = values(&rotate.apply(square()).unwrap());
        for (got, want) in out.iter().zip([9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0]) {
            assert_relative_eq!(*got, want, epsilon = 1e-4);
        }
    }

    #[rstest]
    #[case(GridPaddingMode::Zeros, 0.0)]
    #[case(GridPaddingMode::Border, 1.0)]
    #[case(GridPaddingMode::Reflection, 1.0)]
    fn uncovered_corners_follow_the_padding_mode(
        #[case] padding: GridPaddingMode,
        #[case] corner: f32,
    ) {
        let ones = GrayF32::from_pixel(4, 4, Luma([1.0]));
        let out = rotate_plane(&ones, PI / 4.0, InterpolationMode::Nearest, padding);
        assert_eq!(out.get_pixel(0, 0).0[0], corner);
        assert_eq!(out.get_pixel(1, 1).0[0], 1.0);
    }

    #[test]
    fn channel_axes_are_kept() {
        let rotate = Rotate {
            angle: FRAC_PI_2,
            mode: InterpolationMode::Nearest,
        };
        let volume = Volume::from_values(vec![1.0, 2.0, 3.0, 4.0], [1, 2, 2]).unwrap();
        let out = rotate.apply(volume).unwrap();
        assert_eq!(out.shape(), &[1, 2, 2]);
        assert_eq!(values(&out), vec![3.0, 1.0, 4.0, 2.0]);
    }

    #[test]
    fn volumetric_inputs_are_refused() {
        let rotate = Rotate {
            angle: 0.3,
            mode: InterpolationMode::Bilinear,
        };
        let volume = Volume::from_values(vec![0.0; 8], [2, 2, 2]).unwrap();
        let err = rotate.apply(volume).unwrap_err();
        assert!(matches!(err, AugmentError::TransformFailed { ref transform, .. } if transform == "Rotate"));
    }

    #[test]
    fn random_rotation_shares_the_angle_with_the_mask() {
        let rotate = RandomRotate::new(
            [0.2, 1.2],
            InterpolationMode::Nearest,
            GridPaddingMode::Border,
            SharedRng::new(Some(3)),
        );
        let image = Volume::from_values((0..25).map(|v| v as f32).collect(), [5, 5]).unwrap();
        let sample = JointSample {
            image: image.clone(),
            mask: Some(image),
        };
        let out = rotate.apply_joint(sample).unwrap();
        assert_eq!(values(&out.image), values(&out.mask.unwrap()));
    }

    #[test]
    fn nearest_resize_keeps_label_values() {
        let resize = Resize {
            spatial_size: vec![4, 4],
            mode: InterpolationMode::Nearest,
        };
        let labels = Volume::from_values(vec![0.0, 3.0, 7.0, 250.0], [1, 2, 2]).unwrap();
        let out = resize.apply(labels).unwrap();
        assert_eq!(out.shape(), &[1, 4, 4]);
        assert_eq!(
            values(&out),
            vec![
                0.0, 0.0, 3.0, 3.0, //
                0.0, 0.0, 3.0, 3.0, //
                7.0, 7.0, 250.0, 250.0, //
                7.0, 7.0, 250.0, 250.0,
            ]
        );
    }

    #[test]
    fn filtered_resize_handles_values_outside_the_unit_range() {
        let resize = Resize {
            spatial_size: vec![1, 1],
            mode: InterpolationMode::Bilinear,
        };
        let image = Volume::from_values(vec![-100.0, 300.0, -100.0, 300.0], [1, 2, 2]).unwrap();
        let out = values(&resize.apply(image).unwrap());
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0], 100.0, epsilon = 1e-2);
    }

    #[rstest]
    #[case(vec![0, 4])]
    #[case(vec![4])]
    #[case(vec![MAX_AXIS_LEN + 1, 1])]
    fn unusable_resize_targets_fail(#[case] spatial_size: Vec<usize>) {
        let resize = Resize {
            spatial_size,
            mode: InterpolationMode::Nearest,
        };
        let volume = Volume::from_values(vec![0.0; 4], [1, 2, 2]).unwrap();
        assert!(matches!(
            resize.apply(volume),
            Err(AugmentError::TransformFailed { .. })
        ));
    }

    #[test]
    fn zooming_in_keeps_the_size_and_magnifies_the_centre() {
        let zoom = Zoom {
            factor: 2.0,
            mode: InterpolationMode::Nearest,
            padding_mode: PadMode::Constant,
        };
        let volume = Volume::from_values((0..16).map(|v| v as f32).collect(), [4, 4]).unwrap();
        let out = zoom.apply(volume).unwrap();
        assert_eq!(out.shape(), &[4, 4]);
        assert_eq!(
            values(&out),
            vec![
                5.0, 5.0, 6.0, 6.0, //
                5.0, 5.0, 6.0, 6.0, //
                9.0, 9.0, 10.0, 10.0, //
                9.0, 9.0, 10.0, 10.0,
            ]
        );
    }

    #[rstest]
    #[case(PadMode::Constant, 0.0)]
    #[case(PadMode::Edge, 1.0)]
    fn zooming_out_pads_with_the_padding_mode(#[case] padding_mode: PadMode, #[case] border: f32) {
        let zoom = Zoom {
            factor: 0.5,
            mode: InterpolationMode::Nearest,
            padding_mode,
        };
        let volume = Volume::from_values(vec![1.0; 16], [4, 4]).unwrap();
        let out = values(&zoom.apply(volume).unwrap());
        assert_eq!(out.len(), 16);
        assert_eq!(out[0], border);
        assert_eq!(out[5], 1.0);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.5)]
    fn non_positive_zoom_factors_fail(#[case] factor: f64) {
        let zoom = Zoom {
            factor,
            mode: InterpolationMode::Bilinear,
            padding_mode: PadMode::Edge,
        };
        let volume = Volume::from_values(vec![0.0; 4], [2, 2]).unwrap();
        assert!(zoom.apply(volume).is_err());
    }

    #[test]
    fn random_zoom_shares_the_factor_with_the_mask() {
        let zoom = RandomZoom::new(
            0.5,
            1.5,
            InterpolationMode::Nearest,
            PadMode::Edge,
            SharedRng::new(Some(11)),
        );
        let image = Volume::from_values((0..36).map(|v| v as f32).collect(), [6, 6]).unwrap();
        let sample = JointSample {
            image: image.clone(),
            mask: Some(image),
        };
        let out = zoom.apply_joint(sample).unwrap();
        assert_eq!(out.image.shape(), &[6, 6]);
        assert_eq!(values(&out.image), values(&out.mask.unwrap()));
    }
}
