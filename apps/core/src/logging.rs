use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "vscrecent.log";

static PANIC_HOOK_INSTALLED: OnceLock<()> = OnceLock::new();

pub fn logs_dir() -> PathBuf {
    crate::config::stable_app_data_dir().join("logs")
}

/// Installs a daily-rolling file subscriber. `RUST_LOG` overrides the level;
/// `verbose` raises the default from `info` to `debug`. Keep the guard alive
/// for the life of the process so buffered lines are flushed.
pub fn init(verbose: bool) -> Result<WorkerGuard, std::io::Error> {
    let log_dir = logs_dir();
    std::fs::create_dir_all(&log_dir)?;

    let appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();

    install_panic_hook();
    Ok(guard)
}

fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let payload = info.payload();
            let message = match (payload.downcast_ref::<&str>(), payload.downcast_ref::<String>()) {
                (Some(text), _) => text.to_string(),
                (None, Some(text)) => text.clone(),
                (None, None) => String::from("<non-string panic payload>"),
            };
            match info.location() {
                Some(at) => tracing::error!(file = at.file(), line = at.line(), %message, "panicked"),
                None => tracing::error!(%message, "panicked"),
            }
            previous(info);
        }));
    });
}
