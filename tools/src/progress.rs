use image_augmenter::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} cases {msg}";

/// Terminal progress bar over the cases of a run.
#[derive(Clone)]
pub struct ProgressBarReporter {
    bar: ProgressBar,
}

impl ProgressBarReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::new(0))
    }

    /// Report into an existing bar, e.g. a hidden one.
    #[must_use]
    pub fn with_bar(bar: ProgressBar) -> Self {
        match ProgressStyle::default_bar().template(TEMPLATE) {
            Ok(style) => bar.set_style(style.progress_chars("=>-")),
            Err(e) => tracing::debug!(error = %e, "keeping the default progress style"),
        }
        Self { bar }
    }

    #[must_use]
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl Default for ProgressBarReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ProgressBarReporter {
    fn start(&self, total: usize) {
        self.bar.reset();
        self.bar.set_length(total as u64);
    }

    fn advance(&self, done: usize, _total: usize) {
        self.bar.set_position(done as u64);
    }

    fn message(&self, text: &str) {
        self.bar.finish_with_message(text.to_string());
    }

    fn reset(&self) {
        self.bar.abandon();
        self.bar.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_follows_the_run() {
        let reporter = ProgressBarReporter::with_bar(ProgressBar::hidden());
        reporter.start(3);
        reporter.advance(2, 3);
        assert_eq!(reporter.position(), 2);

        reporter.reset();
        assert_eq!(reporter.position(), 0);
    }
}
