// Logging setup
//
// One file layer (daily rotation, written off-thread) plus an optional console
// layer. Both record thread names, which is how a hop from a `fetchpub-worker`
// thread to `fetchpub-main` shows up in the output.

use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn create_log_dir(log_dir: &Utf8Path) -> Result<()> {
    if log_dir.exists() {
        return Ok(());
    }
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir))
}

fn filter_for(debug_mode: bool) -> EnvFilter {
    EnvFilter::new(if debug_mode { "debug" } else { "info" })
}

/// File-only logging into `log_dir/<log_prefix>.<date>`.
///
/// Keep the returned guard alive until exit, or buffered lines are lost.
pub fn setup_logging(log_dir: &str, log_prefix: &str, debug_mode: bool) -> Result<WorkerGuard> {
    setup_logging_with_console(log_dir, log_prefix, debug_mode, false)
}

/// File logging plus, when `console_output` is set, colored output on stdout.
///
/// Fails if a global subscriber is already installed.
pub fn setup_logging_with_console(
    log_dir: &str,
    log_prefix: &str,
    debug_mode: bool,
    console_output: bool,
) -> Result<WorkerGuard> {
    create_log_dir(Utf8Path::new(log_dir))?;

    let (file_writer, guard) = tracing_appender::non_blocking(rolling::daily(log_dir, log_prefix));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true);

    let console_layer = console_output.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(true)
    });

    tracing_subscriber::registry()
        .with(filter_for(debug_mode))
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!(log_dir, log_prefix, console_output, "Logging ready");
    Ok(guard)
}
