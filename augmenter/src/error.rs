//! Error types for the augmentation engine.
//!
//! Errors fall into four groups: configuration errors raised before any case is
//! processed, traversal errors raised while discovering cases, transform errors
//! raised while a case is being augmented, and output errors raised by the sink
//! and its writer pool.

use std::path::PathBuf;

use thiserror::Error;

/// The error type for augmentation operations.
#[derive(Error, Debug)]
pub enum AugmentError {
    /// A required path is empty or does not point to a usable location.
    #[error("{field} is invalid: {reason}")]
    InvalidPath {
        /// Human readable name of the offending field.
        field: &'static str,
        /// Why the path was rejected.
        reason: String,
    },

    /// The image name prefix was left blank.
    #[error("Indicate the image prefix")]
    MissingPrefix,

    /// The file structure mode is neither `flat` nor `hierarchical`.
    #[error("File structure not recognized: {value}")]
    UnknownStructure {
        /// The rejected structure value.
        value: String,
    },

    /// The device selector does not follow the `GPU <n> - <name>` pattern.
    #[error("Device text format is invalid: {value}")]
    InvalidDevice {
        /// The rejected selector.
        value: String,
    },

    /// A name prefix could not be compiled as a regular expression.
    #[error("Invalid name pattern '{pattern}'")]
    InvalidPattern {
        /// The pattern as typed by the user.
        pattern: String,
        /// The underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// An enabled transform has missing or unparsable parameters.
    #[error("The '{transform}' transformation is enabled but {reason}")]
    InvalidTransform {
        /// Display name of the transform.
        transform: &'static str,
        /// Which field is missing or invalid.
        reason: String,
    },

    /// Every transform kind is disabled.
    #[error("Choose at least one transformation to apply")]
    NoTransformEnabled,

    /// Discovery found no image matching the configured prefix.
    #[error("No images found with the criteria set in {root}, please double check the input data")]
    NoImagesFound {
        /// Root directory that was searched.
        root: PathBuf,
    },

    /// Images and masks were both found but their counts differ.
    #[error(
        "Images and masks must have same length. Found {images} images and {masks} masks. \
         Make sure you have specified the correct prefixes to avoid inconsistencies"
    )]
    CountMismatch {
        /// Number of discovered images.
        images: usize,
        /// Number of discovered masks.
        masks: usize,
    },

    /// The transform library has no implementation for an enabled transform.
    #[error("The '{transform}' transformation is not available in this transform library")]
    UnsupportedTransform {
        /// Display name of the transform.
        transform: &'static str,
    },

    /// The codec cannot encode an output file name.
    #[error("Cannot write '{file}' for case '{case}': the file extension is not supported by the codec")]
    UnsupportedExtension {
        /// Output file name.
        file: String,
        /// Case the output belongs to.
        case: String,
    },

    /// Walking the input tree failed.
    #[error("Failed to read directory: {path}")]
    DirectoryReadFailed {
        /// The root being walked.
        path: PathBuf,
        /// The underlying traversal error.
        #[source]
        source: walkdir::Error,
    },

    /// A transform raised while being applied to a case.
    #[error("Transform '{transform}' failed: {reason}")]
    TransformFailed {
        /// Canonical name of the transform.
        transform: String,
        /// Failure description.
        reason: String,
    },

    /// A volume has a shape or element type the operation cannot handle.
    #[error("Invalid volume: {reason}")]
    InvalidVolume {
        /// Failure description.
        reason: String,
    },

    /// Reading an original case (for its spatial metadata) failed.
    #[error("Failed to read {path}: {reason}")]
    ReadFailed {
        /// File that could not be read.
        path: PathBuf,
        /// Failure description.
        reason: String,
    },

    /// Encoding or writing one output file failed.
    #[error("Failed to write {path}: {reason}")]
    WriteFailed {
        /// File that could not be written.
        path: PathBuf,
        /// Failure description.
        reason: String,
    },

    /// One or more background writes failed during a run.
    #[error("{count} output write(s) failed, first failure: {first}")]
    WriteFailures {
        /// Number of failed writes.
        count: usize,
        /// Message of the first failure received.
        first: String,
    },

    /// A filesystem operation on the output tree failed.
    #[error("I/O error at {path}")]
    Io {
        /// Path involved in the operation.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl AugmentError {
    /// Whether this error belongs to the fail-fast configuration class, i.e. it
    /// is raised before any case is processed and retrying cannot help.
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidPath { .. }
                | Self::MissingPrefix
                | Self::UnknownStructure { .. }
                | Self::InvalidDevice { .. }
                | Self::InvalidPattern { .. }
                | Self::InvalidTransform { .. }
                | Self::NoTransformEnabled
                | Self::NoImagesFound { .. }
                | Self::CountMismatch { .. }
                | Self::UnsupportedTransform { .. }
                | Self::UnsupportedExtension { .. }
        )
    }

    pub(crate) fn invalid_transform(transform: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidTransform {
            transform,
            reason: reason.into(),
        }
    }
}

/// A specialized `Result` type for augmentation operations.
pub type AugmentResult<T> = Result<T, AugmentError>;
