use std::fs;

use augmenter_tools::RunConfig;
use image_augmenter::{discover, Case, FileStructure, InterpolationMode, PadMode};

#[test]
fn loads_a_full_run_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");
    fs::write(
        &path,
        r#"{
            "input_path": "data",
            "output_path": "out",
            "image_prefix": "img.nii",
            "mask_prefix": "seg",
            "structure": "hierarchical",
            "device": "GPU 1 - Test Card",
            "seed": 17,
            "writer": { "workers": 2 },
            "transforms": {
                "random_rotate": {
                    "enabled": true,
                    "range_x": { "from": "-0.2", "to": "0.2" },
                    "interpolation_mode": "bilinear"
                },
                "border_pad": { "enabled": true, "spatial_border": "2", "mode": "reflect" }
            }
        }"#,
    )
    .unwrap();

    let config = RunConfig::load(&path).unwrap();
    assert_eq!(config.seed, Some(17));
    assert_eq!(config.writer.workers, 2);
    assert_eq!(config.writer.queue_capacity, 16);
    assert_eq!(config.transforms.random_rotate.range_x.from, "-0.2");
    assert_eq!(
        config.transforms.random_rotate.interpolation_mode,
        InterpolationMode::Bilinear
    );
    assert_eq!(config.transforms.border_pad.mode, PadMode::Reflect);

    let naming = config.naming().unwrap();
    let case = Case::new("data/c1/img.nii.gz", None, FileStructure::Hierarchical);
    assert_eq!(naming.image_file(&case).file_name(), "img.nii");
    assert_eq!(naming.mask_file(&case).file_name(), "seg.nrrd");
}

#[test]
fn missing_and_malformed_files_name_the_path() {
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("absent.json");
    let err = RunConfig::load(&missing).unwrap_err();
    assert!(format!("{err:#}").contains("absent.json"));

    let malformed = dir.path().join("broken.json");
    fs::write(&malformed, "{ \"structure\": \"sideways\" }").unwrap();
    let err = RunConfig::load(&malformed).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse config file"));
}

#[test]
fn regex_runs_discover_and_name_by_match() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["scan_001.png", "label_001.png", "notes.txt"] {
        fs::write(dir.path().join(name), b"").unwrap();
    }
    let config = RunConfig {
        input_path: dir.path().to_path_buf(),
        image_prefix: r"scan_\d+".into(),
        mask_prefix: r"label_\d+".into(),
        structure: FileStructure::Flat,
        use_regex: true,
        ..RunConfig::default()
    };

    let found = discover(&config.input_path, &config.discovery_options()).unwrap();
    assert_eq!(found.images.len(), 1);
    assert_eq!(found.masks.len(), 1);

    let cases = found.into_cases(FileStructure::Flat);
    let naming = config.naming().unwrap();
    assert_eq!(naming.image_file(&cases[0]).stem, "scan_001");
    assert_eq!(naming.mask_file(&cases[0]).stem, "label_001");
}
