//! Progress reporting for the generation flow.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Receives coarse progress updates (percent complete plus a short message).
pub trait Progress: Send + Sync {
    fn report(&self, percent: u8, message: &str);

    fn finish(&self) {}
}

/// Discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn report(&self, _percent: u8, _message: &str) {}
}

/// Progress bar on stderr.
///
/// Redraws only on updates, so an interactive key prompt is not painted over.
pub struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(Some(100), ProgressDrawTarget::stderr());
        let style = ProgressStyle::with_template("[{bar:20}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        Self { bar }
    }

    /// Handle to the underlying bar, for prompts that must hide it.
    pub fn bar(&self) -> ProgressBar {
        self.bar.clone()
    }
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress for TerminalProgress {
    fn report(&self, percent: u8, message: &str) {
        self.bar.set_position(u64::from(percent.min(100)));
        self.bar.set_message(message.to_string());
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for TerminalProgress {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
