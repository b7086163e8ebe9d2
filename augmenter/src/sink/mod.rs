//! Output and preview sink.
//!
//! Consumes the per-case results of an [`AugmentationDataset`] and either
//! writes them below an output directory, one `{case}_{transform}` directory per
//! result, or pushes them to a [`PreviewSurface`].

mod preview;
mod progress;
mod writer;

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use burn::data::dataset::Dataset;

pub use preview::{LayerRole, PreviewLayer, PreviewSurface};
pub use progress::{LogReporter, ProgressReporter};
pub use writer::{WriteJob, WriterPool, WriterPoolConfig};

use crate::{
    codec::VolumeCodec,
    dataset::{AugmentationDataset, CaseResult},
    discovery::{Case, NameMatcher},
    error::{AugmentError, AugmentResult},
    kinds::copies_metadata,
    volume::SpatialMetadata,
};

const DEFAULT_EXTENSION: &str = "nrrd";

/// Output file name split into stem and extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileName {
    pub stem: String,
    pub extension: String,
}

impl FileName {
    /// Split `prefix` at its first `.`; without one the extension is `nrrd`.
    ///
    /// `"img.nii.gz"` gives stem `img` and extension `nii`, the same split the
    /// host application performs.
    #[must_use]
    pub fn from_prefix(prefix: &str) -> Self {
        Self::from_prefix_or(prefix, None)
    }

    /// Like [`FileName::from_prefix`], but a prefix without extension takes
    /// the extension of `original` (`nii.gz` kept whole), and only falls back
    /// to `nrrd` when that has none either.
    #[must_use]
    pub fn from_prefix_or(prefix: &str, original: Option<&Path>) -> Self {
        let mut parts = prefix.split('.');
        let stem = parts.next().unwrap_or_default().to_string();
        let extension = parts
            .next()
            .filter(|ext| !ext.is_empty())
            .map(str::to_string)
            .or_else(|| original.and_then(source_extension))
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
        Self { stem, extension }
    }

    /// `{stem}.{extension}`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.stem, self.extension)
    }
}

fn source_extension(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    if name.to_ascii_lowercase().ends_with(".nii.gz") {
        return Some(name[name.len() - "nii.gz".len()..].to_string());
    }
    path.extension()?.to_str().map(str::to_string)
}

#[derive(Debug, Clone)]
enum NamingRule {
    /// Named after the prefix, e.g. `img.png`.
    Fixed(String),
    /// Named after the region of the original file name the matcher hits.
    Matched(NameMatcher),
}

impl NamingRule {
    fn resolve(&self, original: Option<&Path>) -> FileName {
        match self {
            Self::Fixed(prefix) => FileName::from_prefix_or(prefix, original),
            Self::Matched(matcher) => {
                let file_name = original
                    .and_then(Path::file_name)
                    .and_then(|name| name.to_str())
                    .unwrap_or_default();
                let text = matcher.matched_text(file_name).unwrap_or(file_name);
                FileName::from_prefix_or(text, original)
            }
        }
    }
}

/// How output files are named.
#[derive(Debug, Clone)]
pub struct OutputNaming {
    image: NamingRule,
    mask: NamingRule,
}

impl OutputNaming {
    /// Name outputs after the literal prefixes, e.g. image prefix `img.nrrd`
    /// writes `img.nrrd` into every output directory. A prefix without
    /// extension keeps the extension of the case's original file.
    #[must_use]
    pub fn from_prefixes(image_prefix: &str, mask_prefix: &str) -> Self {
        let mask_prefix = if mask_prefix.is_empty() { "mask" } else { mask_prefix };
        Self {
            image: NamingRule::Fixed(image_prefix.to_string()),
            mask: NamingRule::Fixed(mask_prefix.to_string()),
        }
    }

    /// Name outputs after the part of each original file name matched by the
    /// discovery regexes.
    #[must_use]
    pub fn from_matchers(image: NameMatcher, mask: Option<NameMatcher>) -> Self {
        Self {
            image: NamingRule::Matched(image),
            mask: mask.map_or_else(|| NamingRule::Fixed("mask".into()), NamingRule::Matched),
        }
    }

    /// File name for the augmented images of `case`.
    #[must_use]
    pub fn image_file(&self, case: &Case) -> FileName {
        self.image.resolve(Some(&case.image_path))
    }

    /// File name for the augmented masks of `case`.
    #[must_use]
    pub fn mask_file(&self, case: &Case) -> FileName {
        self.mask.resolve(case.mask_path.as_deref())
    }

    /// Check that `codec` can write every output file the cases will produce.
    ///
    /// # Errors
    ///
    /// Returns [`AugmentError::UnsupportedExtension`] for the first output name
    /// the codec cannot encode.
    pub fn check_writable(&self, cases: &[Case], codec: &dyn VolumeCodec) -> AugmentResult<()> {
        for case in cases {
            let mut names = vec![self.image_file(case)];
            if case.mask_path.is_some() {
                names.push(self.mask_file(case));
            }
            if let Some(name) = names.into_iter().find(|name| !codec.supports_extension(&name.extension)) {
                return Err(AugmentError::UnsupportedExtension {
                    file: name.file_name(),
                    case: case.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Cases processed.
    pub cases: usize,
    /// Volumes written or pushed to the preview surface.
    pub volumes_written: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    /// `"Processing completed in N.NN seconds"`.
    #[must_use]
    pub fn completion_message(&self) -> String {
        format!("Processing completed in {:.2} seconds", self.elapsed.as_secs_f64())
    }
}

/// Original spatial referencing of a case, read once per case.
struct OriginalCase {
    image: SpatialMetadata,
    mask: Option<SpatialMetadata>,
}

impl OriginalCase {
    /// Re-read the original image, so a case whose image does not decode
    /// fails here instead of silently producing no output.
    fn read(codec: &dyn VolumeCodec, result: &CaseResult) -> AugmentResult<Self> {
        let image = codec.read_metadata(&result.case.image_path)?;
        if result.images.is_empty() {
            return Err(AugmentError::ReadFailed {
                path: result.case.image_path.clone(),
                reason: "the image could not be loaded".into(),
            });
        }
        let mask = match (&result.case.mask_path, result.masks.is_empty()) {
            (Some(path), false) => Some(codec.read_metadata(path)?),
            _ => None,
        };
        Ok(Self { image, mask })
    }
}

/// Metadata is copied only for geometry-preserving transforms, and only from
/// volumetric originals.
fn copied_metadata(original: &SpatialMetadata, preserves_geometry: bool) -> Option<SpatialMetadata> {
    (preserves_geometry && original.depth() > 0).then(|| original.clone())
}

/// Drives a run from dataset to disk or preview surface.
#[derive(Debug, Clone, Default)]
pub struct AugmentationSink {
    pool: WriterPoolConfig,
}

impl AugmentationSink {
    #[must_use]
    pub const fn new(pool: WriterPoolConfig) -> Self {
        Self { pool }
    }

    /// Augment every case of `dataset` and write the results below
    /// `output_root`.
    ///
    /// Cases are processed in order. Writes run on the writer pool and are all
    /// drained before completion is reported. The first failing case aborts
    /// the run.
    ///
    /// # Errors
    ///
    /// Returns the first case failure, or [`AugmentError::WriteFailures`] when
    /// background writes failed.
    pub fn process(
        &self,
        dataset: &AugmentationDataset,
        output_root: &Path,
        naming: &OutputNaming,
        progress: &dyn ProgressReporter,
    ) -> AugmentResult<RunSummary> {
        naming.check_writable(dataset.cases(), &**dataset.codec())?;

        let started = Instant::now();
        let total = dataset.len();
        tracing::info!(cases = total, output = %output_root.display(), "processing started");
        progress.start(total);

        let pool = WriterPool::new(Arc::clone(dataset.codec()), self.pool);
        for index in 0..total {
            if let Err(e) = write_case(dataset, index, output_root, naming, &pool) {
                tracing::error!(case = index, error = %e, "case failed, aborting run");
                progress.reset();
                // Let already queued writes land before reporting the failure.
                if let Err(write_error) = pool.finish() {
                    tracing::warn!(error = %write_error, "writes failed while aborting");
                }
                return Err(e);
            }
            progress.advance(index + 1, total);
        }

        let volumes_written = pool.finish().inspect_err(|_| progress.reset())?;
        let summary = RunSummary {
            cases: total,
            volumes_written,
            elapsed: started.elapsed(),
        };
        let message = summary.completion_message();
        tracing::info!(volumes = volumes_written, "{message}");
        progress.message(&message);
        Ok(summary)
    }

    /// Augment the cases at `indices` (the first case when `None`) and push
    /// the results to `surface`.
    ///
    /// # Errors
    ///
    /// Returns the first case failure or surface error.
    pub fn preview(
        &self,
        dataset: &AugmentationDataset,
        indices: Option<&[usize]>,
        surface: &mut dyn PreviewSurface,
        progress: &dyn ProgressReporter,
    ) -> AugmentResult<RunSummary> {
        let started = Instant::now();
        let subset = dataset.select(indices.unwrap_or(&[0]));
        let total = subset.len();
        tracing::info!(cases = total, "preview started");

        surface.clear();
        progress.start(total);

        let mut shown = 0;
        for index in 0..total {
            match preview_case(&subset, index, surface) {
                Ok(count) => shown += count,
                Err(e) => {
                    tracing::error!(case = index, error = %e, "preview failed");
                    progress.reset();
                    return Err(e);
                }
            }
            surface.reset_views();
            progress.advance(index + 1, total);
        }

        let summary = RunSummary {
            cases: total,
            volumes_written: shown,
            elapsed: started.elapsed(),
        };
        progress.message(&summary.completion_message());
        Ok(summary)
    }
}

fn augment(dataset: &AugmentationDataset, index: usize) -> AugmentResult<CaseResult> {
    dataset.get(index).unwrap_or_else(|| {
        Err(AugmentError::InvalidVolume {
            reason: format!("case index {index} out of range"),
        })
    })
}

fn write_case(
    dataset: &AugmentationDataset,
    index: usize,
    output_root: &Path,
    naming: &OutputNaming,
    pool: &WriterPool,
) -> AugmentResult<()> {
    let result = augment(dataset, index)?;
    let original = OriginalCase::read(&**dataset.codec(), &result)?;
    let image_file = naming.image_file(&result.case).file_name();
    let mask_file = naming.mask_file(&result.case).file_name();

    for (i, image) in result.images.iter().enumerate() {
        let dir = output_dir(output_root, &result.case.name, image.name())?;
        let preserves_geometry = copies_metadata(image.name());

        pool.submit(WriteJob {
            data: image.volume.data().clone(),
            metadata: copied_metadata(&original.image, preserves_geometry),
            path: dir.join(&image_file),
        })?;

        let (Some(mask), Some(mask_original)) = (result.mask_for(i), &original.mask) else {
            continue;
        };
        if !mask.volume.any_nonzero()? {
            tracing::debug!(case = %result.case.name, transform = mask.name(), "skipping empty mask");
            continue;
        }
        pool.submit(WriteJob {
            data: mask.volume.data().clone(),
            metadata: copied_metadata(mask_original, preserves_geometry),
            path: dir.join(&mask_file),
        })?;
    }
    Ok(())
}

fn output_dir(root: &Path, case_name: &str, transform: &str) -> AugmentResult<PathBuf> {
    let dir = root.join(format!("{case_name}_{transform}"));
    fs::create_dir_all(&dir).map_err(|source| AugmentError::Io {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}

fn preview_case(
    dataset: &AugmentationDataset,
    index: usize,
    surface: &mut dyn PreviewSurface,
) -> AugmentResult<usize> {
    let result = augment(dataset, index)?;
    let original = OriginalCase::read(&**dataset.codec(), &result)?;

    let mut shown = 0;
    for (i, image) in result.images.iter().enumerate() {
        let preserves_geometry = copies_metadata(image.name());
        let prefix = format!("{}_{}", result.case.name, image.name());

        surface.show(PreviewLayer {
            name: format!("{prefix}_img"),
            role: LayerRole::Image,
            volume: image.volume.clone(),
            metadata: copied_metadata(&original.image, preserves_geometry),
        })?;
        shown += 1;

        if let (Some(mask), Some(mask_original)) = (result.mask_for(i), &original.mask) {
            surface.show(PreviewLayer {
                name: format!("{prefix}_mask"),
                role: LayerRole::Mask,
                volume: mask.volume.clone(),
                metadata: copied_metadata(mask_original, preserves_geometry),
            })?;
            shown += 1;
        }
    }
    Ok(shown)
}
