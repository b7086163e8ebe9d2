//! Augmenter Tools
//!
//! Support code for the `augment` binary: JSON run configuration, logging
//! setup, a terminal progress bar and a terminal preview surface.
//!
//! ## Usage
//!
//! ```bash
//! # Write augmented cases next to the configured output path
//! cargo run --bin augment -- --config run.json
//!
//! # Override paths and preview the first case instead of writing
//! cargo run --bin augment -- --config run.json --input data/ --preview
//! ```

pub mod config;
pub mod logging;
pub mod preview;
pub mod progress;

pub use config::RunConfig;
pub use logging::init_logging;
pub use preview::{describe, LayerStats, TerminalPreview};
pub use progress::ProgressBarReporter;
