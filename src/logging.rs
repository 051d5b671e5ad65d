//! Logging setup on top of `tracing` and `tracing-subscriber`
//!
//! `RUST_LOG` always overrides the configured level, e.g.
//! `RUST_LOG=nex_fca_recon=debug`.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize console logging
///
/// # Example
/// ```no_run
/// nex_fca_recon::logging::init("info");
/// ```
pub fn init(default_level: &str) {
    fmt()
        .with_env_filter(env_filter(default_level))
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// Initialize console logging plus a warnings-only validation log file
///
/// Key validation issues end up in `dir/file_name`. Keep the returned guard
/// alive for the whole run; dropping it flushes the file.
pub fn init_with_validation_log(dir: &Path, file_name: &Path, default_level: &str) -> WorkerGuard {
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let console = fmt::layer().with_target(true).with_line_number(true);
    let validation_file = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .with_filter(LevelFilter::WARN);

    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(console)
        .with(validation_file)
        .init();

    guard
}

/// Initialize logging for tests; repeated calls are ignored
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
