//! Augmentation dataset engine.
//!
//! The dataset is a lazy, index-addressed view over the discovered cases. Each
//! `get` loads one case, runs every compiled transform against the loaded
//! arrays and returns the tagged results; nothing is retained between calls, so
//! peak memory stays at roughly one case plus its augmented copies.

use std::{path::Path, sync::Arc};

use burn::data::dataset::Dataset;

use crate::{
    codec::VolumeCodec,
    compiler::{ExecutableTransform, TransformPipeline},
    device::Device,
    discovery::Case,
    error::{AugmentError, AugmentResult},
    kinds::TransformKind,
    volume::{JointSample, Volume},
};

/// One transformed array tagged with the transform that produced it.
#[derive(Debug, Clone)]
pub struct NamedVolume {
    /// Kind of the producing transform.
    pub kind: TransformKind,
    /// The transformed array.
    pub volume: Volume,
}

impl NamedVolume {
    /// Canonical name of the producing transform.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind.canonical_name()
    }
}

/// Everything produced for one case.
///
/// `images` and `masks` are in transform order. When a mask was loaded, entries
/// produced by randomizable transforms sit at matching positions in both lists
/// with the same name.
#[derive(Debug, Clone)]
pub struct CaseResult {
    /// The case the results belong to.
    pub case: Case,
    /// Transformed images.
    pub images: Vec<NamedVolume>,
    /// Transformed masks; empty when no mask was loaded.
    pub masks: Vec<NamedVolume>,
}

impl CaseResult {
    /// The mask produced alongside `images[index]`, if any.
    ///
    /// Masks are matched by position and confirmed by name, so image-only
    /// entries never pick up an unrelated mask.
    #[must_use]
    pub fn mask_for(&self, index: usize) -> Option<&NamedVolume> {
        let image = self.images.get(index)?;
        self.masks.get(index).filter(|mask| mask.kind == image.kind)
    }
}

/// Lazily augments the cases of a run.
#[derive(Clone)]
pub struct AugmentationDataset {
    cases: Vec<Case>,
    pipeline: Arc<TransformPipeline>,
    codec: Arc<dyn VolumeCodec>,
    device: Device,
}

impl AugmentationDataset {
    /// Create a dataset over `cases`.
    pub fn new(
        cases: Vec<Case>,
        pipeline: Arc<TransformPipeline>,
        codec: Arc<dyn VolumeCodec>,
        device: Device,
    ) -> Self {
        Self {
            cases,
            pipeline,
            codec,
            device,
        }
    }

    /// The cases, in index order.
    #[must_use]
    pub fn cases(&self) -> &[Case] {
        &self.cases
    }

    /// The compiled transforms.
    #[must_use]
    pub fn pipeline(&self) -> &TransformPipeline {
        &self.pipeline
    }

    /// The codec used to load cases.
    #[must_use]
    pub fn codec(&self) -> &Arc<dyn VolumeCodec> {
        &self.codec
    }

    #[must_use]
    pub const fn device(&self) -> Device {
        self.device
    }

    /// A dataset over the cases at `indices` (out-of-range indices are
    /// skipped), sharing this dataset's pipeline and codec.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        let cases = indices
            .iter()
            .filter_map(|&i| self.cases.get(i).cloned())
            .collect();
        Self {
            cases,
            pipeline: Arc::clone(&self.pipeline),
            codec: Arc::clone(&self.codec),
            device: self.device,
        }
    }

    /// Decode `path`, or `None` when the path is missing or unreadable.
    pub fn load(&self, path: Option<&Path>) -> Option<Volume> {
        let path = path.filter(|p| !p.as_os_str().is_empty())?;
        match self.codec.read(path) {
            Ok(decoded) => Some(Volume::new(decoded.data)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not load volume");
                None
            }
        }
    }

    /// Augment the case at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`AugmentError::InvalidVolume`] for an out-of-range index and
    /// propagates the first transform failure.
    pub fn try_get(&self, index: usize) -> AugmentResult<CaseResult> {
        let case = self.cases.get(index).ok_or_else(|| AugmentError::InvalidVolume {
            reason: format!("case index {index} out of range ({} cases)", self.cases.len()),
        })?;
        self.augment_case(case)
    }

    /// Load `case` and run every transform of the pipeline against it.
    ///
    /// # Errors
    ///
    /// Propagates the first transform failure.
    pub fn augment_case(&self, case: &Case) -> AugmentResult<CaseResult> {
        let image = self.load(Some(&case.image_path));
        let mask = self.load(case.mask_path.as_deref());
        if case.mask_path.is_some() && mask.is_none() {
            tracing::warn!(case = %case.name, "mask could not be loaded, mask results will be empty");
        }

        let mut images = Vec::new();
        let mut masks = Vec::new();

        for transform in self.pipeline.iter() {
            let kind = transform.kind();
            tracing::debug!(case = %case.name, transform = transform.canonical_name(), "applying transform");

            if transform.is_randomizable() {
                // A mask on its own never receives a randomizable transform.
                let Some(image) = &image else { continue };
                let sample = JointSample {
                    image: self.prepare(image.clone(), transform),
                    mask: mask.clone().map(|m| self.prepare(m, transform)),
                };
                let had_mask = sample.mask.is_some();
                let out = transform.apply_joint(sample)?;

                images.push(NamedVolume {
                    kind,
                    volume: finish(out.image, transform)?,
                });
                match out.mask {
                    Some(volume) => masks.push(NamedVolume {
                        kind,
                        volume: finish(volume, transform)?,
                    }),
                    None if had_mask => {
                        return Err(AugmentError::TransformFailed {
                            transform: transform.canonical_name().to_string(),
                            reason: "the mask was dropped from the joint sample".into(),
                        });
                    }
                    None => {}
                }
            } else {
                if let Some(image) = &image {
                    let volume = transform.apply(self.prepare(image.clone(), transform))?;
                    images.push(NamedVolume {
                        kind,
                        volume: finish(volume, transform)?,
                    });
                }
                if let Some(mask) = &mask {
                    let volume = transform.apply(self.prepare(mask.clone(), transform))?;
                    masks.push(NamedVolume {
                        kind,
                        volume: finish(volume, transform)?,
                    });
                }
            }
        }

        Ok(CaseResult {
            case: case.clone(),
            images,
            masks,
        })
    }

    fn prepare(&self, volume: Volume, transform: &ExecutableTransform) -> Volume {
        let volume = volume.to_device(self.device);
        if transform.requires_channel_dim() {
            volume.insert_channel_axis()
        } else {
            volume
        }
    }
}

fn finish(volume: Volume, transform: &ExecutableTransform) -> AugmentResult<Volume> {
    if transform.requires_channel_dim() {
        volume.remove_channel_axis().map_err(|e| AugmentError::TransformFailed {
            transform: transform.canonical_name().to_string(),
            reason: e.to_string(),
        })
    } else {
        Ok(volume)
    }
}

impl Dataset<AugmentResult<CaseResult>> for AugmentationDataset {
    fn get(&self, index: usize) -> Option<AugmentResult<CaseResult>> {
        let case = self.cases.get(index)?;
        Some(self.augment_case(case))
    }

    fn len(&self) -> usize {
        self.cases.len()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        path::PathBuf,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
    };

    use burn::tensor::TensorData;

    use super::*;
    use crate::{
        codec::DecodedVolume,
        compiler::{compile, TransformOp},
        config::TransformsConfig,
        discovery::FileStructure,
        transform::Transform,
        volume::SpatialMetadata,
    };

    /// Serves in-memory volumes keyed by path.
    #[derive(Default)]
    struct MemoryCodec {
        files: HashMap<PathBuf, (Vec<f32>, Vec<usize>)>,
    }

    impl MemoryCodec {
        fn with(mut self, path: &str, values: Vec<f32>, shape: &[usize]) -> Self {
            self.files.insert(PathBuf::from(path), (values, shape.to_vec()));
            self
        }
    }

    impl VolumeCodec for MemoryCodec {
        fn read(&self, path: &Path) -> AugmentResult<DecodedVolume> {
            let (values, shape) = self.files.get(path).ok_or_else(|| AugmentError::ReadFailed {
                path: path.to_path_buf(),
                reason: "not found".into(),
            })?;
            Ok(DecodedVolume {
                data: TensorData::new(values.clone(), shape.clone()),
                metadata: SpatialMetadata::identity(shape.iter().rev().copied().collect()),
            })
        }

        fn write(&self, _: &TensorData, _: Option<&SpatialMetadata>, _: &Path) -> AugmentResult<()> {
            Ok(())
        }
    }

    /// Adds a per-call draw to every array; the joint path draws once.
    struct RecordingShift {
        draws: Arc<AtomicUsize>,
        shapes: Arc<Mutex<Vec<Vec<usize>>>>,
        devices: Arc<Mutex<Vec<Device>>>,
    }

    impl RecordingShift {
        fn shift(&self, volume: Volume, draw: f32) -> AugmentResult<Volume> {
            self.shapes.lock().unwrap().push(volume.shape().to_vec());
            self.devices.lock().unwrap().push(volume.device());
            let device = volume.device();
            let shape = volume.shape().to_vec();
            let values = volume.into_values()?.into_iter().map(|v| v + draw).collect();
            Ok(Volume::from_values(values, shape)?.to_device(device))
        }

        fn next_draw(&self) -> f32 {
            (self.draws.fetch_add(1, Ordering::SeqCst) + 1) as f32 * 10.0
        }
    }

    impl Transform for RecordingShift {
        fn apply(&self, volume: Volume) -> AugmentResult<Volume> {
            let draw = self.next_draw();
            self.shift(volume, draw)
        }

        fn apply_joint(&self, sample: JointSample) -> AugmentResult<JointSample> {
            let draw = self.next_draw();
            Ok(JointSample {
                image: self.shift(sample.image, draw)?,
                mask: sample.mask.map(|m| self.shift(m, draw)).transpose()?,
            })
        }
    }

    struct Harness {
        draws: Arc<AtomicUsize>,
        shapes: Arc<Mutex<Vec<Vec<usize>>>>,
        devices: Arc<Mutex<Vec<Device>>>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                draws: Arc::default(),
                shapes: Arc::default(),
                devices: Arc::default(),
            }
        }

        fn pipeline(&self, config: &TransformsConfig) -> Arc<TransformPipeline> {
            let draws = Arc::clone(&self.draws);
            let shapes = Arc::clone(&self.shapes);
            let devices = Arc::clone(&self.devices);
            let library = move |_: &TransformOp| -> AugmentResult<Box<dyn Transform>> {
                Ok(Box::new(RecordingShift {
                    draws: Arc::clone(&draws),
                    shapes: Arc::clone(&shapes),
                    devices: Arc::clone(&devices),
                }))
            };
            Arc::new(compile(config, &library).unwrap())
        }
    }

    fn codec() -> Arc<dyn VolumeCodec> {
        Arc::new(
            MemoryCodec::default()
                .with("/data/caseA/img.nrrd", vec![1.0, 2.0, 3.0, 4.0], &[2, 2])
                .with("/data/caseA/mask.nrrd", vec![0.0, 1.0, 1.0, 0.0], &[2, 2]),
        )
    }

    fn case(mask: Option<&str>) -> Case {
        Case::new("/data/caseA/img.nrrd", mask.map(PathBuf::from), FileStructure::Hierarchical)
    }

    fn random_flip_config() -> TransformsConfig {
        let mut config = TransformsConfig::default();
        config.random_flip.enabled = true;
        config
    }

    #[test]
    fn joint_transforms_apply_one_draw_to_image_and_mask() {
        let harness = Harness::new();
        let dataset = AugmentationDataset::new(
            vec![case(Some("/data/caseA/mask.nrrd"))],
            harness.pipeline(&random_flip_config()),
            codec(),
            Device::Cpu,
        );

        let result = dataset.try_get(0).unwrap();
        assert_eq!(result.images.len(), 1);
        assert_eq!(result.masks.len(), 1);
        assert_eq!(result.images[0].name(), result.masks[0].name());
        assert_eq!(result.images[0].volume.values().unwrap(), &[11.0, 12.0, 13.0, 14.0]);
        assert_eq!(result.masks[0].volume.values().unwrap(), &[10.0, 11.0, 11.0, 10.0]);
        assert_eq!(harness.draws.load(Ordering::SeqCst), 1);
        assert!(result.mask_for(0).is_some());
    }

    #[test]
    fn image_only_cases_produce_no_mask_entries() {
        let harness = Harness::new();
        let mut config = random_flip_config();
        config.flip.enabled = true;
        config.flip.axis = "0".into();
        let dataset = AugmentationDataset::new(
            vec![case(None)],
            harness.pipeline(&config),
            codec(),
            Device::Cpu,
        );

        let result = dataset.try_get(0).unwrap();
        assert_eq!(result.images.len(), 2);
        assert!(result.masks.is_empty());
    }

    #[test]
    fn unreadable_masks_yield_an_empty_mask_side() {
        let harness = Harness::new();
        let dataset = AugmentationDataset::new(
            vec![case(Some("/data/caseA/missing.nrrd"))],
            harness.pipeline(&random_flip_config()),
            codec(),
            Device::Cpu,
        );

        let result = dataset.try_get(0).unwrap();
        assert_eq!(result.images.len(), 1);
        assert!(result.masks.is_empty());
        assert!(result.mask_for(0).is_none());
    }

    #[test]
    fn deterministic_transforms_run_independently_on_each_array() {
        let harness = Harness::new();
        let mut config = TransformsConfig::default();
        config.shift_intensity.enabled = true;
        config.shift_intensity.offset = "1".into();
        let dataset = AugmentationDataset::new(
            vec![case(Some("/data/caseA/mask.nrrd"))],
            harness.pipeline(&config),
            codec(),
            Device::Cpu,
        );

        let result = dataset.try_get(0).unwrap();
        assert_eq!(result.images[0].name(), "ShiftIntensity");
        assert_eq!(result.masks[0].name(), "ShiftIntensity");
        assert_eq!(harness.draws.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn missing_images_still_transform_the_mask_deterministically() {
        let harness = Harness::new();
        let mut config = random_flip_config();
        config.shift_intensity.enabled = true;
        config.shift_intensity.offset = "1".into();
        let missing_image = Case::new(
            "/data/caseA/absent.nrrd",
            Some(PathBuf::from("/data/caseA/mask.nrrd")),
            FileStructure::Hierarchical,
        );
        let dataset = AugmentationDataset::new(vec![missing_image], harness.pipeline(&config), codec(), Device::Cpu);

        let result = dataset.try_get(0).unwrap();
        assert!(result.images.is_empty());
        assert_eq!(result.masks.len(), 1);
        assert_eq!(result.masks[0].name(), "ShiftIntensity");
    }

    #[test]
    fn channel_axis_is_added_for_the_call_and_removed_after() {
        let harness = Harness::new();
        let mut config = TransformsConfig::default();
        config.center_spatial_crop.enabled = true;
        config.center_spatial_crop.roi_size = vec!["1".into(), "1".into()];
        let dataset = AugmentationDataset::new(
            vec![case(Some("/data/caseA/mask.nrrd"))],
            harness.pipeline(&config),
            codec(),
            Device::Cpu,
        );

        let result = dataset.try_get(0).unwrap();
        assert_eq!(result.images[0].volume.shape(), &[2, 2]);
        assert_eq!(result.masks[0].volume.shape(), &[2, 2]);
        assert!(harness.shapes.lock().unwrap().iter().all(|s| s == &[1, 2, 2]));
    }

    #[test]
    fn arrays_are_placed_on_the_configured_device() {
        let harness = Harness::new();
        let dataset = AugmentationDataset::new(
            vec![case(None)],
            harness.pipeline(&random_flip_config()),
            codec(),
            Device::Accelerator(1),
        );

        let result = dataset.try_get(0).unwrap();
        assert_eq!(result.images[0].volume.device(), Device::Accelerator(1));
        assert!(harness.devices.lock().unwrap().iter().all(|d| *d == Device::Accelerator(1)));
    }

    #[test]
    fn transform_failures_propagate() {
        let failing = |_: &TransformOp| -> AugmentResult<Box<dyn Transform>> {
            Ok(Box::new(|_: Volume| -> AugmentResult<Volume> {
                Err(AugmentError::TransformFailed {
                    transform: "Flip".into(),
                    reason: "boom".into(),
                })
            }))
        };
        let mut config = TransformsConfig::default();
        config.flip.enabled = true;
        config.flip.axis = "0".into();
        let pipeline = Arc::new(compile(&config, &failing).unwrap());
        let dataset = AugmentationDataset::new(vec![case(None)], pipeline, codec(), Device::Cpu);

        assert!(matches!(dataset.get(0), Some(Err(AugmentError::TransformFailed { .. }))));
        assert!(dataset.get(1).is_none());
    }

    #[test]
    fn select_restricts_the_cases() {
        let harness = Harness::new();
        let cases = vec![case(None), case(Some("/data/caseA/mask.nrrd"))];
        let dataset = AugmentationDataset::new(cases, harness.pipeline(&random_flip_config()), codec(), Device::Cpu);

        let subset = dataset.select(&[1, 7]);
        assert_eq!(subset.len(), 1);
        assert!(subset.cases()[0].mask_path.is_some());
        assert_eq!(dataset.iter().count(), 2);
    }
}
