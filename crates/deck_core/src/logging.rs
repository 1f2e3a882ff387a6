use std::path::Path;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::DeckConfig;

const DEFAULT_FILTER: &str = "info,deck_app=debug,deck_admin=debug,deck_chain=debug,deck_core=debug";

/// Install file + console logging for the `dropdeck` binary.
///
/// The returned guard flushes the file writer on drop and must outlive the
/// program's work.
pub fn init_logging(level: Option<&str>) -> Result<WorkerGuard> {
    install(&DeckConfig::logs_dir()?, level.unwrap_or(DEFAULT_FILTER), true)
}

fn install(logs_dir: &Path, filter: &str, console: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)?;

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(logs_dir, "dropdeck"));

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .with(console.then(|| {
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact()
        }))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(guard)
}
