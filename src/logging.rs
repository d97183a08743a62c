use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Console output follows `filter`; the daily log file under `log_dir`
/// always records info and above. Keep the returned guard alive for the
/// lifetime of the process or buffered file lines are lost.
pub fn init(filter: &str, log_dir: &Path) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "jarvis.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let console_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_filter(console_filter))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer)
                .with_filter(LevelFilter::INFO),
        )
        .try_init()?;

    Ok(guard)
}
