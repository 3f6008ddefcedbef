//! Turning pending repository changes into an applied commit message.

pub mod format;
pub mod progress;
pub mod service;

pub use format::{TRUNCATION_NOTE, format_changes};
pub use progress::{NoProgress, Progress, TerminalProgress};
pub use service::{CommitService, GENERATION_LABEL};
