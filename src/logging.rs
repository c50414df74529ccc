//! File logging.
//!
//! The terminal belongs to the editor while it runs, so nothing is ever
//! written to stdout or stderr. Logs go to `vx.log.<date>` in the per-user
//! data directory, rotated daily. Filter with `RUST_LOG`, e.g.
//! `RUST_LOG=vx::editor=debug`.

use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub fn log_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "vx", "vx").map(|dirs| dirs.data_dir().join("logs"))
}

/// Install the global subscriber. Without a writable log directory the
/// editor runs with logging disabled.
pub fn init() {
    let Some(dir) = log_dir() else {
        return;
    };
    if fs::create_dir_all(&dir).is_err() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_appender = tracing_appender::rolling::daily(dir, "vx.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .with_filter(filter);

    // Already initialized (tests, embedding): keep the existing subscriber
    let _ = tracing_subscriber::registry().with(file_layer).try_init();
}
