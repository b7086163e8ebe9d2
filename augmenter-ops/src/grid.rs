//! N-dimensional re-indexing.
//!
//! Every geometric op in this crate (flip, pad, crop) is a per-axis mapping from
//! output coordinates to input coordinates. An [`AxisMap`] stores that mapping
//! for one axis; [`remap`] applies one map per axis.

use image_augmenter::{AugmentError, AugmentResult, PadMode, Volume};

/// Output coordinate → input coordinate for one axis; `None` means fill.
pub type AxisMap = Vec<Option<usize>>;

/// Upper bound on the length of any output axis.
pub const MAX_AXIS_LEN: usize = 1 << 20;
/// Upper bound on the voxel count of a remapped volume.
pub const MAX_VOXELS: usize = 1 << 31;

/// Leave the axis as it is.
pub fn identity(len: usize) -> AxisMap {
    (0..len).map(Some).collect()
}

/// Reverse the axis.
pub fn reversed(len: usize) -> AxisMap {
    (0..len).rev().map(Some).collect()
}

/// Keep `len` entries starting at `start`.
pub fn cropped(start: usize, len: usize) -> AxisMap {
    (start..start + len).map(Some).collect()
}

/// Add `before` and `after` entries around the axis, sourced according to
/// `mode`.
///
/// # Errors
///
/// Returns [`AugmentError::InvalidVolume`] when the padded axis would exceed
/// [`MAX_AXIS_LEN`].
pub fn padded(len: usize, before: usize, after: usize, mode: PadMode) -> AugmentResult<AxisMap> {
    let total = len
        .checked_add(before)
        .and_then(|n| n.checked_add(after))
        .filter(|&n| n <= MAX_AXIS_LEN);
    let (Some(total), Ok(offset)) = (total, i64::try_from(before)) else {
        return Err(AugmentError::InvalidVolume {
            reason: format!(
                "padding an axis of {len} by {before} and {after} exceeds the limit of {MAX_AXIS_LEN}"
            ),
        });
    };
    Ok((0..total)
        .map(|out| pad_source(out as i64 - offset, len, mode))
        .collect())
}

/// Input coordinate feeding a possibly out-of-range coordinate `coord`.
fn pad_source(coord: i64, len: usize, mode: PadMode) -> Option<usize> {
    let n = len as i64;
    if n == 0 {
        return None;
    }
    if (0..n).contains(&coord) {
        return Some(coord as usize);
    }
    let source = match mode {
        PadMode::Constant => return None,
        PadMode::Edge => coord.clamp(0, n - 1),
        PadMode::Wrap => coord.rem_euclid(n),
        PadMode::Symmetric => {
            let m = coord.rem_euclid(2 * n);
            if m < n {
                m
            } else {
                2 * n - 1 - m
            }
        }
        PadMode::Reflect => {
            if n == 1 {
                0
            } else {
                let period = 2 * (n - 1);
                let m = coord.rem_euclid(period);
                if m < n {
                    m
                } else {
                    period - m
                }
            }
        }
    };
    Some(source as usize)
}

fn strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for axis in (0..shape.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1];
    }
    strides
}

/// Build a new volume whose axis `a` is `maps[a]` applied to `volume`.
///
/// # Errors
///
/// Returns [`AugmentError::InvalidVolume`] when the number of maps differs from
/// the rank of `volume`, a map points outside its axis, or the output would
/// exceed [`MAX_VOXELS`].
pub fn remap(volume: &Volume, maps: &[AxisMap], fill: f32) -> AugmentResult<Volume> {
    let shape = volume.shape();
    if maps.len() != shape.len() {
        return Err(AugmentError::InvalidVolume {
            reason: format!("{} axis maps for a volume of shape {shape:?}", maps.len()),
        });
    }
    let out_of_bounds = maps
        .iter()
        .zip(shape)
        .any(|(map, &len)| map.iter().flatten().any(|&src| src >= len));
    if out_of_bounds {
        return Err(AugmentError::InvalidVolume {
            reason: format!("axis map exceeds shape {shape:?}"),
        });
    }

    let values = volume.values()?;
    let strides = strides(shape);
    let out_shape: Vec<usize> = maps.iter().map(Vec::len).collect();
    let total = out_shape
        .iter()
        .try_fold(1_usize, |acc, &len| acc.checked_mul(len))
        .filter(|&n| n <= MAX_VOXELS)
        .ok_or_else(|| AugmentError::InvalidVolume {
            reason: format!("output shape {out_shape:?} exceeds the limit of {MAX_VOXELS} voxels"),
        })?;

    let mut out = Vec::with_capacity(total);
    let mut coord = vec![0_usize; out_shape.len()];
    for _ in 0..total {
        let offset = coord
            .iter()
            .zip(maps)
            .zip(&strides)
            .try_fold(0, |acc, ((&c, map), &stride)| map[c].map(|src| acc + src * stride));
        out.push(offset.map_or(fill, |o| values[o]));

        for axis in (0..coord.len()).rev() {
            coord[axis] += 1;
            if coord[axis] < out_shape[axis] {
                break;
            }
            coord[axis] = 0;
        }
    }

    Ok(Volume::from_values(out, out_shape)?.to_device(volume.device()))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(PadMode::Constant, vec![None, None, Some(0), Some(1), Some(2), None])]
    #[case(PadMode::Edge, vec![Some(0), Some(0), Some(0), Some(1), Some(2), Some(2)])]
    #[case(PadMode::Wrap, vec![Some(1), Some(2), Some(0), Some(1), Some(2), Some(0)])]
    #[case(PadMode::Symmetric, vec![Some(1), Some(0), Some(0), Some(1), Some(2), Some(2)])]
    #[case(PadMode::Reflect, vec![Some(2), Some(1), Some(0), Some(1), Some(2), Some(1)])]
    fn pad_modes_follow_numpy(#[case] mode: PadMode, #[case] expected: AxisMap) {
        assert_eq!(padded(3, 2, 1, mode).unwrap(), expected);
    }

    #[test]
    fn remap_reverses_and_crops() {
        let volume = Volume::from_values((0..6).map(|v| v as f32).collect(), [2, 3]).unwrap();
        let out = remap(&volume, &[reversed(2), cropped(1, 2)], 0.0).unwrap();

        assert_eq!(out.shape(), &[2, 2]);
        assert_eq!(out.values().unwrap(), &[4.0, 5.0, 1.0, 2.0]);
    }

    #[test]
    fn remap_fills_unmapped_voxels() {
        let volume = Volume::from_values(vec![1.0, 2.0], [2]).unwrap();
        let out = remap(&volume, &[padded(2, 1, 1, PadMode::Constant).unwrap()], -1.0).unwrap();
        assert_eq!(out.values().unwrap(), &[-1.0, 1.0, 2.0, -1.0]);
    }

    #[test]
    fn remap_checks_rank() {
        let volume = Volume::from_values(vec![0.0; 4], [2, 2]).unwrap();
        assert!(remap(&volume, &[identity(2)], 0.0).is_err());
    }

    #[rstest]
    #[case(usize::MAX, 0)]
    #[case(usize::MAX, usize::MAX)]
    #[case(MAX_AXIS_LEN, 1)]
    fn oversized_padding_is_rejected(#[case] before: usize, #[case] after: usize) {
        let err = padded(2, before, after, PadMode::Edge).unwrap_err();
        assert!(matches!(err, AugmentError::InvalidVolume { .. }));
    }

    #[test]
    fn remap_refuses_oversized_outputs() {
        let volume = Volume::from_values(vec![1.0], [1, 1, 1]).unwrap();
        let map = padded(1, 1023, 1023, PadMode::Constant).unwrap();
        let err = remap(&volume, &[map.clone(), map.clone(), map], 0.0).unwrap_err();
        assert!(err.to_string().contains("exceeds the limit"));
    }
}
