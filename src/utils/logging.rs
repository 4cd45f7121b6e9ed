//! Logging setup
//!
//! Console output always; a daily rolling file when a log directory is set.
//! `RUST_LOG` overrides the configured level.

use time::macros::format_description;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::domain::LogConfig;
use crate::error::{Error, Result};
use crate::helpers::expand_home;

const LOG_FILE_PREFIX: &str = "status-board.log";

/// Build the filter: `RUST_LOG` if set, otherwise the configured level
pub fn env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Install the global subscriber
///
/// Keep the returned guard alive for the life of the process, or buffered file
/// output is lost.
pub fn init(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let timer = LocalTime::new(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
    ));

    let console = fmt::layer().with_timer(timer.clone()).with_target(false);

    let (file, guard) = match &config.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(expand_home(dir), LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_timer(timer)
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| Error::Invalid {
            message: format!("Failed to install log subscriber: {e}"),
        })?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_uses_configured_level() {
        let config = LogConfig {
            level: "status_board=debug,warn".to_string(),
            directory: None,
        };
        // Display of the filter lists its directives
        let filter = env_filter(&config).to_string();
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(filter.contains("status_board=debug"));
        }
    }
}
