//! Static capability table of the supported transform kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Static facts about a transform kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Stable name used for output directories and metadata gating.
    pub canonical_name: &'static str,
    /// Consumes and returns a joint `{image, mask}` sample.
    pub randomizable: bool,
    /// Needs a leading channel axis of size 1.
    pub requires_channel_dim: bool,
    /// Output has the input's geometry, so original metadata may be copied.
    pub preserves_geometry: bool,
}

/// Every supported transform kind, in compile order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransformKind {
    Rotate,
    RandomRotate,
    Resize,
    Flip,
    RandomFlip,
    Zoom,
    RandomZoom,
    ScaleIntensity,
    RandomScaleIntensity,
    AdjustContrast,
    RandomAdjustContrast,
    RandomGaussianNoise,
    ShiftIntensity,
    RandomShiftIntensity,
    NormalizeIntensity,
    ThresholdIntensity,
    MedianSmooth,
    GaussianSmooth,
    RandomGaussianSmooth,
    SpatialPad,
    BorderPad,
    SpatialCrop,
    CenterSpatialCrop,
}

impl TransformKind {
    /// All kinds: spatial group, intensity group, crop/pad group.
    pub const ALL: [Self; 23] = [
        Self::Rotate,
        Self::RandomRotate,
        Self::Resize,
        Self::Flip,
        Self::RandomFlip,
        Self::Zoom,
        Self::RandomZoom,
        Self::ScaleIntensity,
        Self::RandomScaleIntensity,
        Self::AdjustContrast,
        Self::RandomAdjustContrast,
        Self::RandomGaussianNoise,
        Self::ShiftIntensity,
        Self::RandomShiftIntensity,
        Self::NormalizeIntensity,
        Self::ThresholdIntensity,
        Self::MedianSmooth,
        Self::GaussianSmooth,
        Self::RandomGaussianSmooth,
        Self::SpatialPad,
        Self::BorderPad,
        Self::SpatialCrop,
        Self::CenterSpatialCrop,
    ];

    /// Look up the capability record of this kind.
    #[must_use]
    pub const fn capabilities(self) -> Capabilities {
        const fn caps(
            canonical_name: &'static str,
            randomizable: bool,
            requires_channel_dim: bool,
            preserves_geometry: bool,
        ) -> Capabilities {
            Capabilities {
                canonical_name,
                randomizable,
                requires_channel_dim,
                preserves_geometry,
            }
        }

        match self {
            Self::Rotate => caps("Rotate", false, false, true),
            Self::RandomRotate => caps("RandRotate", true, false, true),
            Self::Resize => caps("Resize", false, true, false),
            Self::Flip => caps("Flip", false, false, true),
            Self::RandomFlip => caps("RandAxisFlip", true, false, true),
            Self::Zoom => caps("Zoom", false, false, true),
            Self::RandomZoom => caps("RandZoom", true, false, true),
            Self::ScaleIntensity => caps("ScaleIntensity", false, false, true),
            Self::RandomScaleIntensity => caps("RandScaleIntensity", true, false, true),
            Self::AdjustContrast => caps("AdjustContrast", false, false, true),
            Self::RandomAdjustContrast => caps("RandAdjustContrast", true, false, true),
            Self::RandomGaussianNoise => caps("RandGaussianNoise", true, false, true),
            Self::ShiftIntensity => caps("ShiftIntensity", false, false, true),
            Self::RandomShiftIntensity => caps("RandShiftIntensity", true, false, true),
            Self::NormalizeIntensity => caps("NormalizeIntensity", false, false, true),
            Self::ThresholdIntensity => caps("ThresholdIntensity", false, false, true),
            Self::MedianSmooth => caps("MedianSmooth", false, false, true),
            Self::GaussianSmooth => caps("GaussianSmooth", false, false, true),
            Self::RandomGaussianSmooth => caps("RandGaussianSmooth", true, false, true),
            Self::SpatialPad => caps("SpatialPad", false, true, true),
            Self::BorderPad => caps("BorderPad", false, false, false),
            Self::SpatialCrop => caps("SpatialCrop", false, false, false),
            Self::CenterSpatialCrop => caps("CenterSpatialCrop", false, true, false),
        }
    }

    /// Name used in user-facing error messages, e.g. `"Random Rotate"`.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Rotate => "Rotate",
            Self::RandomRotate => "Random Rotate",
            Self::Resize => "Resize",
            Self::Flip => "Flip",
            Self::RandomFlip => "Random Flip",
            Self::Zoom => "Zoom",
            Self::RandomZoom => "Random Zoom",
            Self::ScaleIntensity => "Scale Intensity",
            Self::RandomScaleIntensity => "Random Scale Intensity",
            Self::AdjustContrast => "Adjust Contrast",
            Self::RandomAdjustContrast => "Random Adjust Contrast",
            Self::RandomGaussianNoise => "Random Gaussian Noise",
            Self::ShiftIntensity => "Shift Intensity",
            Self::RandomShiftIntensity => "Random Shift Intensity",
            Self::NormalizeIntensity => "Normalize Intensity",
            Self::ThresholdIntensity => "Threshold Intensity",
            Self::MedianSmooth => "Median Smooth",
            Self::GaussianSmooth => "Gaussian Smooth",
            Self::RandomGaussianSmooth => "Random Gaussian Smooth",
            Self::SpatialPad => "Spatial Pad",
            Self::BorderPad => "Border Pad",
            Self::SpatialCrop => "Spatial Crop",
            Self::CenterSpatialCrop => "Center Spatial Crop",
        }
    }

    /// Kebab-case name, as used in configuration documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rotate => "rotate",
            Self::RandomRotate => "random-rotate",
            Self::Resize => "resize",
            Self::Flip => "flip",
            Self::RandomFlip => "random-flip",
            Self::Zoom => "zoom",
            Self::RandomZoom => "random-zoom",
            Self::ScaleIntensity => "scale-intensity",
            Self::RandomScaleIntensity => "random-scale-intensity",
            Self::AdjustContrast => "adjust-contrast",
            Self::RandomAdjustContrast => "random-adjust-contrast",
            Self::RandomGaussianNoise => "random-gaussian-noise",
            Self::ShiftIntensity => "shift-intensity",
            Self::RandomShiftIntensity => "random-shift-intensity",
            Self::NormalizeIntensity => "normalize-intensity",
            Self::ThresholdIntensity => "threshold-intensity",
            Self::MedianSmooth => "median-smooth",
            Self::GaussianSmooth => "gaussian-smooth",
            Self::RandomGaussianSmooth => "random-gaussian-smooth",
            Self::SpatialPad => "spatial-pad",
            Self::BorderPad => "border-pad",
            Self::SpatialCrop => "spatial-crop",
            Self::CenterSpatialCrop => "center-spatial-crop",
        }
    }

    /// Stable name used for output directories.
    #[must_use]
    pub const fn canonical_name(self) -> &'static str {
        self.capabilities().canonical_name
    }

    /// Find the kind carrying `name` as its canonical name.
    #[must_use]
    pub fn from_canonical_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.canonical_name() == name)
    }
}

/// Whether original spatial metadata may be copied onto an output produced by
/// the transform named `name`. Unknown names are treated as geometry
/// preserving, so only the known geometry-changing kinds are denied.
#[must_use]
pub fn copies_metadata(name: &str) -> bool {
    TransformKind::from_canonical_name(name).is_none_or(|kind| kind.capabilities().preserves_geometry)
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
