//! Typed transform configuration.
//!
//! - `transforms`: one record per transform kind plus the [`TransformsConfig`]
//!   aggregate handed to the compiler
//! - `enums`: combo-box choices shared by several kinds

mod enums;
mod transforms;

pub use enums::{GridPaddingMode, InterpolationMode, KernelType, PadMethod, PadMode};
pub use transforms::{
    AdjustContrastConfig, BorderPadConfig, CenterSpatialCropConfig, FlipConfig,
    GaussianSmoothConfig, MedianSmoothConfig, NormalizeIntensityConfig, RandomAdjustContrastConfig,
    RandomFlipConfig, RandomGaussianNoiseConfig, RandomGaussianSmoothConfig,
    RandomRotateConfig, RandomScaleIntensityConfig, RandomShiftIntensityConfig, RandomZoomConfig,
    RangeField, ResizeConfig, RotateConfig, ScaleIntensityConfig, ShiftIntensityConfig,
    SpatialCropConfig, SpatialPadConfig, ThresholdIntensityConfig, TransformsConfig, ZoomConfig,
};
