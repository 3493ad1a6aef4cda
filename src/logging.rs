use once_cell::sync::OnceCell;
use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

/// Overrides the log file location.
pub const LOG_FILE_ENV: &str = "PAJARITO_LOG_FILE";

static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Log file to use: `$PAJARITO_LOG_FILE`, else `pajarito.log` inside `default_dir`.
pub fn log_path(default_dir: &Path) -> PathBuf {
    env::var_os(LOG_FILE_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| default_dir.join("pajarito.log"))
}

/// Installs the global subscriber. Output goes to a file only: stdout and
/// stderr belong to the game screen.
pub fn init(log_file: &Path) {
    // Env filter: use RUST_LOG or default to info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let dir = log_file.parent().unwrap_or(Path::new("."));
    let name = log_file.file_name().unwrap_or(OsStr::new("pajarito.log"));
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, name));
    let _ = FILE_GUARD.set(guard);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .compact();

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init();

    // Panics happen with the terminal in raw mode; make sure they reach the log.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let bt = std::backtrace::Backtrace::force_capture();
        tracing::error!("{info}\nBacktrace:\n{bt}");
        default_hook(info);
    }));
}
