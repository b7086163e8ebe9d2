//! Enumeration types for transform configuration.
//!
//! These mirror the combo-box choices offered for each transform kind and are
//! passed through to the transform library untouched.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Interpolation used by resampling transforms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterpolationMode {
    /// Nearest neighbour.
    Nearest,
    /// Nearest neighbour with exact pixel centre mapping.
    NearestExact,
    /// Linear (1D).
    Linear,
    /// Bilinear (2D).
    #[default]
    Bilinear,
    /// Bicubic (2D).
    Bicubic,
    /// Trilinear (3D).
    Trilinear,
    /// Area averaging.
    Area,
}

impl InterpolationMode {
    /// Whether the mode honours an `align_corners` flag.
    #[must_use]
    pub const fn supports_align_corners(self) -> bool {
        matches!(
            self,
            Self::Linear | Self::Bilinear | Self::Bicubic | Self::Trilinear
        )
    }

    /// Lowercase name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::NearestExact => "nearest-exact",
            Self::Linear => "linear",
            Self::Bilinear => "bilinear",
            Self::Bicubic => "bicubic",
            Self::Trilinear => "trilinear",
            Self::Area => "area",
        }
    }
}

/// Out-of-bounds handling for grid sampling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridPaddingMode {
    /// Fill with zeros.
    #[default]
    Zeros,
    /// Repeat the border value.
    Border,
    /// Mirror at the border.
    Reflection,
}

impl GridPaddingMode {
    /// Lowercase name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zeros => "zeros",
            Self::Border => "border",
            Self::Reflection => "reflection",
        }
    }
}

/// Value source for padded voxels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PadMode {
    /// A fixed fill value.
    #[default]
    Constant,
    /// The nearest edge voxel.
    Edge,
    /// Mirror without repeating the edge voxel.
    Reflect,
    /// Mirror repeating the edge voxel.
    Symmetric,
    /// Wrap around to the opposite side.
    Wrap,
}

impl PadMode {
    /// Lowercase name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Edge => "edge",
            Self::Reflect => "reflect",
            Self::Symmetric => "symmetric",
            Self::Wrap => "wrap",
        }
    }
}

/// Where spatial padding is placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PadMethod {
    /// Split evenly between both sides, extra voxel at the end.
    #[default]
    Symmetric,
    /// Everything after the existing data.
    End,
}

/// Kernel approximation for gaussian smoothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelType {
    /// Error function based kernel.
    #[default]
    Erf,
    /// Sampled gaussian.
    Sampled,
    /// Discrete scale-space kernel.
    Scalespace,
}

macro_rules! display_as_str {
    ($($ty:ty),+) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })+
    };
}

impl PadMethod {
    /// Lowercase name of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Symmetric => "symmetric",
            Self::End => "end",
        }
    }
}

impl KernelType {
    /// Lowercase name of the kernel.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Erf => "erf",
            Self::Sampled => "sampled",
            Self::Scalespace => "scalespace",
        }
    }
}

display_as_str!(InterpolationMode, GridPaddingMode, PadMode, PadMethod, KernelType);

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(InterpolationMode::Nearest, false)]
    #[case(InterpolationMode::NearestExact, false)]
    #[case(InterpolationMode::Area, false)]
    #[case(InterpolationMode::Linear, true)]
    #[case(InterpolationMode::Bilinear, true)]
    #[case(InterpolationMode::Bicubic, true)]
    #[case(InterpolationMode::Trilinear, true)]
    fn align_corners_support(#[case] mode: InterpolationMode, #[case] expected: bool) {
        assert_eq!(mode.supports_align_corners(), expected);
    }

    #[test]
    fn serialized_names_match_display() {
        let json = serde_json::to_string(&InterpolationMode::NearestExact).unwrap();
        assert_eq!(json, "\"nearest-exact\"");
        assert_eq!(InterpolationMode::NearestExact.to_string(), "nearest-exact");

        let mode: PadMode = serde_json::from_str("\"reflect\"").unwrap();
        assert_eq!(mode, PadMode::Reflect);
        assert_eq!(KernelType::Scalespace.to_string(), "scalespace");
    }
}
