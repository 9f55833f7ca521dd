use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use chrono::Local;
use std::fs::{self, File};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber: console plus a per-run file in `log_dir`
/// named after the start time. `RUST_LOG` overrides the default `info` level.
pub fn init(config: &LoggingConfig, log_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("cannot create log directory {}", log_dir.display()))?;
    let pruned = if config.keep_only_latest {
        prune_logs(log_dir)
            .with_context(|| format!("cannot prune logs in {}", log_dir.display()))?
    } else {
        0
    };

    let path = log_dir.join(format!("{}.log", Local::now().format("%Y%m%d%H%M%S")));
    let file = File::create(&path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer()
        .with_target(false)
        .with_ansi(io::stdout().is_terminal());
    let file_layer = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file));
    Registry::default()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .context("tracing has already been initialised")?;

    if pruned > 0 {
        tracing::info!("Removed {pruned} old log file(s)");
    }
    Ok(path)
}

/// Deletes every `*.log` file directly inside `dir`.
pub fn prune_logs(dir: &Path) -> io::Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "log") {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}
