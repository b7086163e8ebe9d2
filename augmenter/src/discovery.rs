//! Case discovery.
//!
//! Turns an input directory plus naming conventions into two index-aligned path
//! lists (images and masks) and derives a stable case name for each image.
//!
//! Two layouts are supported:
//!
//! - **flat**: every file lives in the input directory, e.g.
//!   `data/case01_img.nrrd`, `data/case01_mask.nrrd`;
//! - **hierarchical**: one subdirectory per case, e.g.
//!   `data/case01/img.nrrd`, `data/case01/mask.nrrd`.

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use regex::Regex;
use serde::{Deserialize, Serialize};
use walkdir::{DirEntry, WalkDir};

use crate::error::{AugmentError, AugmentResult};

/// How case files are laid out below the input directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStructure {
    /// All files in one directory, distinguished by name.
    Flat,
    /// One subdirectory per case.
    #[default]
    Hierarchical,
}

impl FileStructure {
    /// Depth (relative to the input directory) at which case files live.
    const fn file_depth(self) -> usize {
        match self {
            Self::Flat => 1,
            Self::Hierarchical => 2,
        }
    }
}

impl FromStr for FileStructure {
    type Err = AugmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(Self::Flat),
            "hierarchical" => Ok(Self::Hierarchical),
            _ => Err(AugmentError::UnknownStructure {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for FileStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flat => write!(f, "flat"),
            Self::Hierarchical => write!(f, "hierarchical"),
        }
    }
}

/// Matches file names against a user supplied prefix.
#[derive(Debug, Clone)]
pub enum NameMatcher {
    /// The name contains the text.
    Substring(String),
    /// The name matches the regular expression.
    Pattern(Regex),
}

impl NameMatcher {
    /// Build a matcher, interpreting `prefix` as a regex when `use_regex` is set.
    ///
    /// # Errors
    ///
    /// Returns [`AugmentError::InvalidPattern`] when the regex does not compile.
    pub fn new(prefix: &str, use_regex: bool) -> AugmentResult<Self> {
        if use_regex {
            Regex::new(prefix)
                .map(Self::Pattern)
                .map_err(|source| AugmentError::InvalidPattern {
                    pattern: prefix.to_string(),
                    source,
                })
        } else {
            Ok(Self::Substring(prefix.to_string()))
        }
    }

    /// The region of `name` that matched, if any. Empty prefixes never match.
    #[must_use]
    pub fn matched_text<'a>(&self, name: &'a str) -> Option<&'a str> {
        match self {
            Self::Substring(prefix) if prefix.is_empty() => None,
            Self::Substring(prefix) => name.find(prefix.as_str()).map(|start| &name[start..start + prefix.len()]),
            Self::Pattern(regex) => regex
                .find(name)
                .filter(|m| !m.is_empty())
                .map(|m| m.as_str()),
        }
    }

    /// Whether `name` matches.
    #[must_use]
    pub fn is_match(&self, name: &str) -> bool {
        self.matched_text(name).is_some()
    }
}

/// Parameters of one discovery pass.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Text (or regex) identifying image files.
    pub image_prefix: String,
    /// Text (or regex) identifying mask files; empty when there are no masks.
    pub mask_prefix: String,
    /// Layout of the input directory.
    pub structure: FileStructure,
    /// Interpret the prefixes as regular expressions.
    pub use_regex: bool,
}

impl DiscoveryOptions {
    /// Substring matching with the given prefixes and layout.
    pub fn new(
        image_prefix: impl Into<String>,
        mask_prefix: impl Into<String>,
        structure: FileStructure,
    ) -> Self {
        Self {
            image_prefix: image_prefix.into(),
            mask_prefix: mask_prefix.into(),
            structure,
            use_regex: false,
        }
    }

    /// Switch regex interpretation of the prefixes on or off.
    #[must_use]
    pub const fn with_regex(mut self, use_regex: bool) -> Self {
        self.use_regex = use_regex;
        self
    }
}

/// Discovered image and mask paths, in traversal order.
///
/// The lists are index-aligned by convention only: masks are collected wherever
/// the mask matcher hits. Use [`crate::validation::validate_collected`] before
/// pairing them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredFiles {
    /// Image file paths.
    pub images: Vec<PathBuf>,
    /// Mask file paths.
    pub masks: Vec<PathBuf>,
}

impl DiscoveredFiles {
    /// Pair images with masks by index and name each case.
    ///
    /// Cases get no mask when no masks were discovered, or when the two lists
    /// differ in length and so cannot be paired.
    #[must_use]
    pub fn into_cases(self, structure: FileStructure) -> Vec<Case> {
        let paired = self.masks.len() == self.images.len();
        if !paired && !self.masks.is_empty() {
            tracing::warn!(
                images = self.images.len(),
                masks = self.masks.len(),
                "image and mask counts differ, cases get no mask"
            );
        }
        let mut masks = self.masks.into_iter().filter(|_| paired);
        self.images
            .into_iter()
            .map(|image_path| {
                let name = case_name(&image_path, structure);
                Case {
                    image_path,
                    mask_path: masks.next(),
                    name,
                }
            })
            .collect()
    }
}

/// One subject: an image, its optional mask and a display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Case {
    /// Path of the image file.
    pub image_path: PathBuf,
    /// Path of the paired mask file.
    pub mask_path: Option<PathBuf>,
    /// Name used for output directories and preview nodes.
    pub name: String,
}

impl Case {
    /// A case named after its image path.
    pub fn new(image_path: impl Into<PathBuf>, mask_path: Option<PathBuf>, structure: FileStructure) -> Self {
        let image_path = image_path.into();
        let name = case_name(&image_path, structure);
        Self {
            image_path,
            mask_path,
            name,
        }
    }
}

/// Collect image and mask paths below `root`.
///
/// File names are compared, never full paths, so directory names cannot cause
/// false matches. Hidden files and directories are skipped. A file that matches
/// the image matcher is an image even if it also matches the mask matcher.
///
/// # Errors
///
/// Returns [`AugmentError::InvalidPattern`] for a bad regex and
/// [`AugmentError::DirectoryReadFailed`] when the tree cannot be walked.
pub fn discover(root: impl AsRef<Path>, options: &DiscoveryOptions) -> AugmentResult<DiscoveredFiles> {
    let root = root.as_ref();
    let image_matcher = NameMatcher::new(&options.image_prefix, options.use_regex)?;
    let mask_matcher = if options.mask_prefix.is_empty() {
        None
    } else {
        Some(NameMatcher::new(&options.mask_prefix, options.use_regex)?)
    };

    let depth = options.structure.file_depth();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry));

    let mut found = DiscoveredFiles::default();
    for entry in walker {
        let entry = entry.map_err(|source| AugmentError::DirectoryReadFailed {
            path: root.to_path_buf(),
            source,
        })?;

        if entry.depth() != depth || !entry.file_type().is_file() {
            continue;
        }

        let Some(name) = entry.file_name().to_str() else {
            tracing::warn!(path = %entry.path().display(), "skipping file with a non UTF-8 name");
            continue;
        };

        if image_matcher.is_match(name) {
            found.images.push(entry.into_path());
        } else if mask_matcher.as_ref().is_some_and(|m| m.is_match(name)) {
            found.masks.push(entry.into_path());
        }
    }

    tracing::debug!(
        root = %root.display(),
        structure = %options.structure,
        images = found.images.len(),
        masks = found.masks.len(),
        "case discovery finished"
    );
    Ok(found)
}

/// Derive the case name of an image path: the parent directory name for the
/// hierarchical layout, the file name (extension included) for the flat one.
#[must_use]
pub fn case_name(path: &Path, structure: FileStructure) -> String {
    let component = match structure {
        FileStructure::Hierarchical => path.parent().and_then(Path::file_name),
        FileStructure::Flat => path.file_name(),
    };
    component
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_str().is_some_and(|name| name.starts_with('.'))
}
