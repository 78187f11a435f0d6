use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::{NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::EnvFilter;

use crate::config::{LoggingConfig, ResolvedOutputs};

/// Flushes the telemetry writer when dropped.
pub struct LoggingGuard {
    _worker: WorkerGuard,
    pub telemetry_path: PathBuf,
}

/// Telemetry sits beside the game rows: `games.jsonl` logs to
/// `games.telemetry.jsonl`.
pub fn telemetry_path(outputs: &ResolvedOutputs) -> PathBuf {
    let stem = outputs
        .jsonl
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("games");
    outputs.jsonl.with_file_name(format!("{stem}.telemetry.jsonl"))
}

/// Installs a JSON subscriber writing to [`telemetry_path`]. `RUST_LOG`
/// wins over the configured levels. Returns `None` when structured logging
/// is off.
pub fn init_logging(
    logging: &LoggingConfig,
    outputs: &ResolvedOutputs,
) -> Result<Option<LoggingGuard>> {
    if !logging.enable_structured {
        return Ok(None);
    }

    let path = telemetry_path(outputs);
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating telemetry directory {}", dir.display()))?;
    }
    let file = create_log(&path)?;
    let (writer, worker) = NonBlockingBuilder::default().lossy(false).finish(file);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(logging.filter_directives()))
        .context("building tracing filter")?;

    // Several runs may share a process; only the first installs.
    let _ = tracing_subscriber::fmt()
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .with_env_filter(filter)
        .with_writer(writer)
        .try_init();

    Ok(Some(LoggingGuard {
        _worker: worker,
        telemetry_path: path,
    }))
}

fn create_log(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("creating telemetry file {}", path.display()))
}
