//! Run configuration for the `augment` binary.
//!
//! A run is described by one JSON document holding the paths, discovery
//! settings and the transform configuration. Every field has a default, so a
//! file only needs what differs; command-line flags override the file.

use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use image_augmenter::{
    AugmentResult, DiscoveryOptions, FileStructure, NameMatcher, OutputNaming, TransformsConfig,
    WriterPoolConfig,
};
use serde::{Deserialize, Serialize};

/// Everything one augmentation run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Directory holding the cases.
    pub input_path: PathBuf,
    /// Directory receiving `{case}_{transform}` folders.
    pub output_path: PathBuf,
    /// Text (or regex) identifying image files.
    pub image_prefix: String,
    /// Text (or regex) identifying mask files. Empty for image-only datasets.
    pub mask_prefix: String,
    pub structure: FileStructure,
    /// Interpret the prefixes as regular expressions.
    pub use_regex: bool,
    /// Device selector, `CPU` or `GPU <n> - <name>`.
    pub device: String,
    /// Seed for random transforms. Runs are not reproducible without one.
    pub seed: Option<u64>,
    /// Show results instead of writing them.
    pub preview: bool,
    /// Case indices to preview; the first case when `None`.
    pub preview_cases: Option<Vec<usize>>,
    pub writer: WriterPoolConfig,
    pub transforms: TransformsConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::new(),
            output_path: PathBuf::new(),
            image_prefix: String::new(),
            mask_prefix: String::new(),
            structure: FileStructure::default(),
            use_regex: false,
            device: "CPU".into(),
            seed: None,
            preview: false,
            preview_cases: None,
            writer: WriterPoolConfig::default(),
            transforms: TransformsConfig::default(),
        }
    }
}

impl RunConfig {
    /// Read a JSON run configuration.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not a valid configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    #[must_use]
    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions::new(&self.image_prefix, &self.mask_prefix, self.structure)
            .with_regex(self.use_regex)
    }

    /// Output file naming. With regex discovery, outputs are named after the
    /// matched part of the original file names.
    ///
    /// # Errors
    ///
    /// Returns [`image_augmenter::AugmentError::InvalidPattern`] for a regex
    /// that does not compile.
    pub fn naming(&self) -> AugmentResult<OutputNaming> {
        if !self.use_regex {
            return Ok(OutputNaming::from_prefixes(&self.image_prefix, &self.mask_prefix));
        }
        let image = NameMatcher::new(&self.image_prefix, true)?;
        let mask = if self.mask_prefix.is_empty() {
            None
        } else {
            Some(NameMatcher::new(&self.mask_prefix, true)?)
        };
        Ok(OutputNaming::from_matchers(image, mask))
    }
}
