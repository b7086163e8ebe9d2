//! Progress reporting callbacks.

/// Receives progress of a run. Calls arrive from the thread driving the run.
pub trait ProgressReporter {
    /// A run over `total` cases is starting.
    fn start(&self, total: usize);

    /// `done` of `total` cases are complete.
    fn advance(&self, done: usize, total: usize);

    /// A status line, e.g. the final timing message.
    fn message(&self, text: &str);

    /// The run aborted; return to the idle state.
    fn reset(&self);
}

/// Reports progress as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn start(&self, total: usize) {
        tracing::info!(total, "processing started");
    }

    fn advance(&self, done: usize, total: usize) {
        tracing::info!(done, total, "case completed");
    }

    fn message(&self, text: &str) {
        tracing::info!("{text}");
    }

    fn reset(&self) {
        tracing::debug!("progress reset");
    }
}
