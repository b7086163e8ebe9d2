//! The seam between the engine and concrete transform implementations.

use crate::{
    compiler::TransformOp,
    error::AugmentResult,
    volume::{JointSample, Volume},
};

/// An executable transform.
///
/// Deterministic transforms only implement [`Transform::apply`]. Randomizable
/// transforms override [`Transform::apply_joint`] so a single parameter draw is
/// applied to every array of the sample.
pub trait Transform: Send + Sync {
    /// Transform one array.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AugmentError::TransformFailed`] (or
    /// [`crate::AugmentError::InvalidVolume`]) when the array cannot be
    /// transformed.
    fn apply(&self, volume: Volume) -> AugmentResult<Volume>;

    /// Transform an image and its optional mask together.
    ///
    /// # Errors
    ///
    /// Same as [`Transform::apply`].
    fn apply_joint(&self, sample: JointSample) -> AugmentResult<JointSample> {
        sample.try_map(|volume| self.apply(volume))
    }
}

impl<F> Transform for F
where
    F: Fn(Volume) -> AugmentResult<Volume> + Send + Sync,
{
    fn apply(&self, volume: Volume) -> AugmentResult<Volume> {
        self(volume)
    }
}

/// Builds executable transforms from validated parameters.
pub trait TransformLibrary: Send + Sync {
    /// Build the transform described by `op`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AugmentError::UnsupportedTransform`] when the library
    /// has no implementation for the kind.
    fn build(&self, op: &TransformOp) -> AugmentResult<Box<dyn Transform>>;
}

impl<F> TransformLibrary for F
where
    F: Fn(&TransformOp) -> AugmentResult<Box<dyn Transform>> + Send + Sync,
{
    fn build(&self, op: &TransformOp) -> AugmentResult<Box<dyn Transform>> {
        self(op)
    }
}
