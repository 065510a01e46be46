use std::env;
use std::path::PathBuf;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Console output stays terse; the rolling file under the log directory
/// keeps the full timestamped record. The returned guard flushes the file
/// writer on drop, so it must live as long as `main`.
pub fn init_logger() -> impl Drop {
    let filter = EnvFilter::new(env::var("TRACING_LEVEL").unwrap_or_else(|_| "info".to_string()));

    let log_dir: PathBuf = env::var("LOG_DIR")
        .unwrap_or_else(|_| "./logs".to_string())
        .into();
    let file_appender = tracing_appender::rolling::daily(log_dir, "rom-curator.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .compact()
                .with_target(false)
                .without_time()
                .with_ansi(true),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(filter)
        .init();

    guard
}
