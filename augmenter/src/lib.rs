//! # Image Augmenter
//!
//! Dataset augmentation for medical images: discovers image/mask cases below a
//! directory, compiles a declarative transform configuration into an ordered
//! pipeline, applies every transform to every case (jointly for randomizable
//! transforms, so images and masks stay in geometric agreement) and writes the
//! results to `{output}/{case}_{transform}/` or pushes them to a preview
//! surface.
//!
//! Decoding, encoding and the transform numerics are provided by the host
//! through [`VolumeCodec`] and [`TransformLibrary`].

pub mod codec;
pub mod compiler;
pub mod config;
pub mod dataset;
pub mod device;
pub mod discovery;
pub mod error;
pub mod kinds;
pub mod sink;
pub mod transform;
pub mod validation;
pub mod volume;

pub use codec::{DecodedVolume, FormatCodec, ImageCodec, NiftiCodec, VolumeCodec};
pub use compiler::{compile, plan, ExecutableTransform, TransformOp, TransformPipeline};
pub use config::{GridPaddingMode, InterpolationMode, KernelType, PadMethod, PadMode, TransformsConfig};
pub use dataset::{AugmentationDataset, CaseResult, NamedVolume};
pub use device::Device;
pub use discovery::{case_name, discover, Case, DiscoveredFiles, DiscoveryOptions, FileStructure, NameMatcher};
pub use error::{AugmentError, AugmentResult};
pub use kinds::{copies_metadata, Capabilities, TransformKind};
pub use sink::{
    AugmentationSink, FileName, LayerRole, LogReporter, OutputNaming, PreviewLayer, PreviewSurface,
    ProgressReporter, RunSummary, WriterPool, WriterPoolConfig,
};
pub use transform::{Transform, TransformLibrary};
pub use validation::{validate_collected, validate_paths, validate_prefixes};
pub use volume::{JointSample, SpatialMetadata, Volume};
