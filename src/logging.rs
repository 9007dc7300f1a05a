use std::fs;
use std::path::Path;

use tracing::{Subscriber, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Environment variable holding the log filter, e.g. `MOD_TRIAGE_LOG=mod_triage=debug`
pub const LOG_ENV_VAR: &str = "MOD_TRIAGE_LOG";
const LOG_FILE_NAME: &str = "mod-triage.log";

/// Install the global subscriber.
///
/// Everything allowed by `MOD_TRIAGE_LOG` (default `info`) goes to a daily rolling file in
/// `log_dir`. The terminal only gets warnings unless `verbose` is set, so command output
/// stays readable. The returned guard flushes the file writer and must live until exit.
pub fn init_logging(log_dir: Option<&Path>, verbose: bool) -> Option<WorkerGuard> {
    let filter = env_filter();

    let file_writer = log_dir.and_then(|dir| match fs::create_dir_all(dir) {
        Ok(()) => Some(tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE_NAME))),
        Err(e) => {
            eprintln!("Warning: file logging disabled, cannot create {}: {}", dir.display(), e);
            None
        }
    });

    match file_writer {
        Some((writer, guard)) => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false).with_filter(filter))
                .with(stderr_layer(verbose))
                .init();
            if let Some(dir) = log_dir {
                info!("Logging to {}", dir.join(LOG_FILE_NAME).display());
            }
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(stderr_layer(verbose)).init();
            None
        }
    }
}

fn stderr_layer<S>(verbose: bool) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
    fmt::layer().with_writer(std::io::stderr).without_time().with_target(false).with_filter(level)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"))
}
