//! Diagnostics: the stderr subscriber and the persistent error log.

use std::{fs, io, io::Write, path};

use tracing_subscriber::{EnvFilter, filter::LevelFilter};

/// File the error reports are appended to, inside the configuration directory.
pub const ERROR_LOG_FILE_NAME: &str = "error.log";

/// Verbosity selected with `--log-level`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, clap::ValueEnum)]
pub enum LogLevel {
    /// Everything, including SDK wire details.
    Trace,
    /// SDK internals and per-batch progress.
    Debug,
    /// Informational events.
    Info,
    /// Warnings only.
    #[default]
    Warning,
    /// Errors only.
    Error,
    /// Same filter as `Error`.
    Critical,
}

impl LogLevel {
    /// Whether failures are printed in full instead of being written to the error log.
    pub fn is_verbose(self) -> bool {
        matches!(
            self,
            Self::Trace | Self::Debug | Self::Info | Self::Warning
        )
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error | LogLevel::Critical => LevelFilter::ERROR,
        }
    }
}

/// Install the stderr subscriber.
///
/// `level` is the default directive; `RUST_LOG` directives refine it.
pub fn init(level: LogLevel) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(level).into())
        .from_env_lossy();
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
    if installed.is_err() {
        tracing::debug!("a global subscriber is already installed");
    }
}

/// Append-only log of failures.
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorLog {
    path: path::PathBuf,
}

impl ErrorLog {
    /// Error log inside `dir`.
    pub fn new(dir: &path::Path) -> Self {
        Self {
            path: dir.join(ERROR_LOG_FILE_NAME),
        }
    }

    /// Location of the log file.
    pub fn path(&self) -> &path::Path {
        &self.path
    }

    /// Append a timestamp line followed by `trace`.
    pub fn append(&self, trace: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let timestamp = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.6f");
        writeln!(file, "{timestamp}")?;
        writeln!(file, "{trace}")?;
        Ok(())
    }
}
