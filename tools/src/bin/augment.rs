//! Augment a dataset of image/mask cases.
//!
//! ## Usage
//!
//! ```bash
//! # Run from a JSON configuration
//! cargo run --bin augment -- --config run.json
//!
//! # Flat layout, regex prefixes, reproducible random transforms
//! cargo run --bin augment -- --config run.json --structure flat --regex --seed 7
//!
//! # Preview the first case in the terminal
//! cargo run --bin augment -- --config run.json --preview
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use augmenter_ops::ReferenceLibrary;
use augmenter_tools::{init_logging, ProgressBarReporter, RunConfig, TerminalPreview};
use clap::Parser;
use image_augmenter::{
    compile, discover, validate_collected, validate_paths, validate_prefixes, AugmentationDataset,
    AugmentationSink, Device, FileStructure, FormatCodec,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON run configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the cases
    #[arg(long)]
    input: Option<PathBuf>,

    /// Directory receiving the augmented cases
    #[arg(long)]
    output: Option<PathBuf>,

    /// Text (or regex) identifying image files
    #[arg(long)]
    image_prefix: Option<String>,

    /// Text (or regex) identifying mask files
    #[arg(long)]
    mask_prefix: Option<String>,

    /// Input layout: flat or hierarchical
    #[arg(long)]
    structure: Option<FileStructure>,

    /// Interpret the prefixes as regular expressions
    #[arg(long)]
    regex: bool,

    /// Device selector, e.g. "CPU" or "GPU 0 - <name>"
    #[arg(long)]
    device: Option<String>,

    /// Seed for random transforms
    #[arg(long)]
    seed: Option<u64>,

    /// Show the results instead of writing them
    #[arg(long)]
    preview: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply(self, config: &mut RunConfig) {
        if let Some(input) = self.input {
            config.input_path = input;
        }
        if let Some(output) = self.output {
            config.output_path = output;
        }
        if let Some(prefix) = self.image_prefix {
            config.image_prefix = prefix;
        }
        if let Some(prefix) = self.mask_prefix {
            config.mask_prefix = prefix;
        }
        if let Some(structure) = self.structure {
            config.structure = structure;
        }
        if let Some(device) = self.device {
            config.device = device;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.use_regex |= self.regex;
        config.preview |= self.preview;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    args.apply(&mut config);

    run(&config)
}

fn run(config: &RunConfig) -> Result<()> {
    validate_paths(&config.input_path, &config.output_path)?;
    validate_prefixes(&config.image_prefix)?;
    let device = Device::from_selector(&config.device)?;

    let found = discover(&config.input_path, &config.discovery_options())
        .with_context(|| format!("Failed to scan {}", config.input_path.display()))?;
    validate_collected(&config.input_path, &found.images, &found.masks)?;

    let pipeline = compile(&config.transforms, &ReferenceLibrary::new(config.seed))
        .context("Failed to compile the transform pipeline")?;
    tracing::info!(transforms = ?pipeline.names(), %device, "pipeline ready");

    let dataset = AugmentationDataset::new(
        found.into_cases(config.structure),
        Arc::new(pipeline),
        Arc::new(FormatCodec),
        device,
    );
    let sink = AugmentationSink::new(config.writer);
    let progress = ProgressBarReporter::new();

    if config.preview {
        let mut surface = TerminalPreview::default();
        sink.preview(&dataset, config.preview_cases.as_deref(), &mut surface, &progress)?;
    } else {
        sink.process(&dataset, &config.output_path, &config.naming()?, &progress)?;
    }
    Ok(())
}
