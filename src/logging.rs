use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use storechat::platform::AppPaths;

/// Installs the global subscriber. `RUST_LOG` wins over the defaults.
///
/// The terminal UI owns the screen, so it logs to a daily file under the
/// data directory; keep the returned guard alive until exit so buffered
/// lines are flushed.
pub fn init(paths: &AppPaths, debug: bool, to_file: bool) -> Option<WorkerGuard> {
    let default_directives = if debug {
        "storechat=debug,tower_http=debug"
    } else {
        "storechat=info,tower_http=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    if to_file {
        let appender = tracing_appender::rolling::daily(paths.logs_dir(), "storechat.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
        Some(guard)
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        None
    }
}
