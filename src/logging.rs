//! Log sink: human-readable stderr output plus a persistent log file.
//!
//! Opened once at start-up with [`LogSink::open`] and closed with
//! [`LogSink::close`] before exit. The file keeps full detail of every run so a
//! failed generation can be inspected after the one-line error is printed.

use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

pub const LOG_FILE_ENV: &str = "UNICOMMIT_LOG_FILE";

/// `<data dir>/unicommit/unicommit.log`, or `UNICOMMIT_LOG_FILE` when set.
pub fn default_log_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(LOG_FILE_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::data_local_dir().map(|dir| dir.join("unicommit").join("unicommit.log"))
}

/// Default stderr filter for a `-v` count, used when `RUST_LOG` is unset.
pub fn stderr_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Stderr-only subscriber, for when the log file cannot be opened.
pub fn init_stderr_only(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(stderr_level(verbosity)));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .try_init()
        .ok();
}

/// The process-wide log destinations.
pub struct LogSink {
    path: PathBuf,
    file: Arc<File>,
}

impl LogSink {
    /// Create the log file (appending) and install the global subscriber.
    ///
    /// If a subscriber is already installed the file is still opened, but
    /// nothing new is routed to it.
    pub fn open(path: impl Into<PathBuf>, verbosity: u8) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = Arc::new(OpenOptions::new().create(true).append(true).open(&path)?);

        let stderr_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(stderr_level(verbosity)));
        let file_filter = EnvFilter::new("info,unicommit=debug");

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(io::stderr)
                    .with_filter(stderr_filter),
            )
            .with(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::clone(&file))
                    .with_filter(file_filter),
            )
            .try_init()
            .ok();

        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush the log file to disk.
    pub fn close(self) -> io::Result<()> {
        (&*self.file).flush()?;
        self.file.sync_all()
    }
}
