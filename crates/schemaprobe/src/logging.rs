//! Subscriber setup for the binary
//!
//! Console output goes to stderr so `discover` can print the schema on
//! stdout. Long-running commands may also mirror everything into a
//! timestamped file under the configured log directory.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use schemaprobe_config::paths::log_file_name;

/// Install the global subscriber.
///
/// `RUST_LOG` wins unless `verbose` forces `debug`. A log file that cannot
/// be created only disables the file layer. The returned guard flushes the
/// file writer when dropped and must live until the command finishes.
pub fn init(verbose: bool, log_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let mut log_path = None;
    let mut guard = None;
    let mut failure = None;
    let file_layer = match log_dir.map(|dir| open_log_file(&dir)) {
        Some(Ok((path, appender))) => {
            let (writer, worker) = NonBlocking::new(appender);
            log_path = Some(path);
            guard = Some(worker);
            Some(fmt::layer().with_writer(writer).with_ansi(false))
        }
        Some(Err(e)) => {
            failure = Some(e);
            None
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    if let Some(path) = log_path {
        debug!("◆ logging to {}", path.display());
    }
    if let Some(e) = failure {
        warn!("◆ file logging disabled: {:#}", e);
    }

    guard
}

/// Appender for a single `discovery_<stamp>.log` file that never rotates
fn open_log_file(dir: &Path) -> Result<(PathBuf, RollingFileAppender)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let name = log_file_name(&stamp);
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name.as_str())
        .build(dir)
        .with_context(|| format!("Failed to open log file in {}", dir.display()))?;

    Ok((dir.join(name), appender))
}
