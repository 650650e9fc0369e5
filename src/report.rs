//! Operator-visible progress reporting.
//!
//! Everything the operator should see (stage banners, streamed tool output,
//! tolerated failures) goes through a [`Reporter`]. The CLI renders it with
//! colors; [`LogReporter`] forwards it to the `log` facade.

/// Sink for operator-visible messages.
pub trait Reporter: Send + Sync {
    /// Start of a pipeline stage
    fn section(&self, title: &str);

    /// Progress message
    fn info(&self, message: &str);

    /// One line of output streamed from a child process
    fn line(&self, line: &str);

    /// Non-fatal problem; execution continues
    fn warn(&self, message: &str);
}

/// Reporter that forwards everything to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn section(&self, title: &str) {
        log::info!("{title}");
        log::info!("{}", "=".repeat(70));
    }

    fn info(&self, message: &str) {
        log::info!("{message}");
    }

    fn line(&self, line: &str) {
        log::info!(target: "yass_build::output", "{line}");
    }

    fn warn(&self, message: &str) {
        log::warn!("{message}");
    }
}
