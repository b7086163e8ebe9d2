use std::{path::Path, sync::Arc};

use approx::assert_relative_eq;
use augmenter_ops::ReferenceLibrary;
use burn::tensor::TensorData;
use image_augmenter::{
    compile, discover, AugmentError, AugmentationDataset, AugmentationSink, Device, DiscoveryOptions,
    FileStructure, ImageCodec, InterpolationMode, LogReporter, OutputNaming, TransformsConfig, Volume,
    VolumeCodec,
};

fn write_png(path: &Path, values: Vec<f32>, shape: [usize; 2]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    ImageCodec
        .write(&TensorData::new(values, shape), None, path)
        .unwrap();
}

fn read_png(path: &Path) -> (Vec<usize>, Vec<f32>) {
    let decoded = ImageCodec.read(path).unwrap();
    (decoded.data.shape.clone(), decoded.data.to_vec::<f32>().unwrap())
}

fn run(input: &Path, output: &Path, config: &TransformsConfig, seed: Option<u64>) -> usize {
    let options = DiscoveryOptions::new("img", "mask", FileStructure::Hierarchical);
    let cases = discover(input, &options)
        .unwrap()
        .into_cases(FileStructure::Hierarchical);
    let pipeline = compile(config, &ReferenceLibrary::new(seed)).unwrap();
    let dataset = AugmentationDataset::new(cases, Arc::new(pipeline), Arc::new(ImageCodec), Device::Cpu);

    AugmentationSink::default()
        .process(&dataset, output, &OutputNaming::from_prefixes("img.png", "mask.png"), &LogReporter)
        .unwrap()
        .volumes_written
}

#[test]
fn flip_and_pad_round_trip_through_png() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input");
    let output = dir.path().join("output");
    write_png(&input.join("case1").join("img.png"), vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0], [2, 3]);
    write_png(&input.join("case1").join("mask.png"), vec![0.0, 1.0, 1.0, 0.0, 0.0, 0.0], [2, 3]);

    let mut config = TransformsConfig::default();
    config.flip.enabled = true;
    config.flip.axis = "1".into();
    config.spatial_pad.enabled = true;
    config.spatial_pad.spatial_size = vec!["4".into(), "3".into()];
    config.spatial_pad.fill_value = "0".into();

    assert_eq!(run(&input, &output, &config, None), 4);

    let (shape, image) = read_png(&output.join("case1_Flip").join("img.png"));
    assert_eq!(shape, vec![2, 3]);
    for (actual, expected) in image.iter().zip([0.4, 0.2, 0.0, 1.0, 0.8, 0.6]) {
        assert_relative_eq!(*actual, expected, epsilon = 1e-3);
    }
    let (_, mask) = read_png(&output.join("case1_Flip").join("mask.png"));
    assert_eq!(mask, vec![1.0, 1.0, 0.0, 0.0, 0.0, 0.0]);

    let (shape, padded) = read_png(&output.join("case1_SpatialPad").join("img.png"));
    assert_eq!(shape, vec![4, 3]);
    assert_eq!(&padded[..3], &[0.0, 0.0, 0.0]);
    assert_eq!(&padded[9..], &[0.0, 0.0, 0.0]);
    assert_relative_eq!(padded[5], 0.4, epsilon = 1e-3);
}

#[test]
fn random_flip_keeps_masks_aligned() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input");
    let output = dir.path().join("output");
    let pattern = vec![1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
    for case in ["a", "b", "c"] {
        write_png(&input.join(case).join("img.png"), pattern.clone(), [3, 3]);
        write_png(&input.join(case).join("mask.png"), pattern.clone(), [3, 3]);
    }

    let mut config = TransformsConfig::default();
    config.random_flip.enabled = true;

    assert_eq!(run(&input, &output, &config, Some(9)), 6);
    for case in ["a", "b", "c"] {
        let dir = output.join(format!("{case}_RandAxisFlip"));
        let (_, image) = read_png(&dir.join("img.png"));
        let (_, mask) = read_png(&dir.join("mask.png"));
        assert_eq!(image, mask);
        assert_ne!(image, pattern);
    }
}

#[test]
fn resampling_kinds_run_on_png_images() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input");
    let output = dir.path().join("output");
    let pattern = vec![1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
    write_png(&input.join("case1").join("img.png"), pattern.clone(), [3, 3]);
    write_png(&input.join("case1").join("mask.png"), pattern, [3, 3]);

    let mut config = TransformsConfig::default();
    config.rotate.enabled = true;
    config.rotate.angle = std::f64::consts::FRAC_PI_2.to_string();
    config.rotate.interpolation_mode = InterpolationMode::Nearest;
    config.resize.enabled = true;
    config.resize.spatial_size = vec!["6".into(), "6".into()];
    config.resize.interpolation_mode = InterpolationMode::Nearest;
    config.gaussian_smooth.enabled = true;

    assert_eq!(run(&input, &output, &config, None), 6);

    let (shape, mask) = read_png(&output.join("case1_Rotate").join("mask.png"));
    assert_eq!(shape, vec![3, 3]);
    assert_eq!(mask, vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);

    let (shape, mask) = read_png(&output.join("case1_Resize").join("mask.png"));
    assert_eq!(shape, vec![6, 6]);
    assert_eq!(&mask[..6], &[1.0, 1.0, 1.0, 1.0, 0.0, 0.0]);

    let (shape, image) = read_png(&output.join("case1_GaussianSmooth").join("img.png"));
    assert_eq!(shape, vec![3, 3]);
    assert!(image[0] < 1.0 && image[8] > 0.0);
}

#[test]
fn volumetric_inputs_fail_the_resampling_kinds() {
    let mut config = TransformsConfig::default();
    config.zoom.enabled = true;
    config.zoom.factor = "1.5".into();

    let pipeline = compile(&config, &ReferenceLibrary::default()).unwrap();
    let volume = Volume::from_values(vec![0.0; 27], [3, 3, 3]).unwrap();
    let err = pipeline.iter().next().unwrap().apply(volume).unwrap_err();
    assert!(matches!(err, AugmentError::TransformFailed { ref transform, .. } if transform == "Zoom"));
}
