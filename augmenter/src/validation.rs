//! Form-level checks run before any case is processed.

use std::path::{Path, PathBuf};

use crate::error::{AugmentError, AugmentResult};

/// Check the input and output paths of a run.
///
/// The output directory does not have to exist yet; the sink creates it.
///
/// # Errors
///
/// Returns [`AugmentError::InvalidPath`] naming the offending field.
pub fn validate_paths(input: &Path, output: &Path) -> AugmentResult<()> {
    if input.as_os_str().is_empty() {
        return Err(AugmentError::InvalidPath {
            field: "Input path",
            reason: "no path given".into(),
        });
    }
    if output.as_os_str().is_empty() {
        return Err(AugmentError::InvalidPath {
            field: "Output path",
            reason: "no path given".into(),
        });
    }
    if !input.is_dir() {
        return Err(AugmentError::InvalidPath {
            field: "Images path",
            reason: format!("{} is not a directory", input.display()),
        });
    }
    if output.exists() && !output.is_dir() {
        return Err(AugmentError::InvalidPath {
            field: "Output path",
            reason: format!("{} exists and is not a directory", output.display()),
        });
    }
    Ok(())
}

/// Check that an image prefix was given.
///
/// # Errors
///
/// Returns [`AugmentError::MissingPrefix`] when `image_prefix` is blank.
pub fn validate_prefixes(image_prefix: &str) -> AugmentResult<()> {
    if image_prefix.trim().is_empty() {
        return Err(AugmentError::MissingPrefix);
    }
    Ok(())
}

/// Check the outcome of discovery.
///
/// # Errors
///
/// Returns [`AugmentError::NoImagesFound`] when no image was found and
/// [`AugmentError::CountMismatch`] when masks were found but do not pair one to
/// one with the images.
pub fn validate_collected(root: &Path, images: &[PathBuf], masks: &[PathBuf]) -> AugmentResult<()> {
    if images.is_empty() {
        return Err(AugmentError::NoImagesFound {
            root: root.to_path_buf(),
        });
    }
    if !masks.is_empty() && masks.len() != images.len() {
        return Err(AugmentError::CountMismatch {
            images: images.len(),
            masks: masks.len(),
        });
    }
    Ok(())
}
