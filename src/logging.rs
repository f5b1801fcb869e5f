use std::io::IsTerminal;

use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("logger already initialized")]
    AlreadyInitialized,
}

pub fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(level).map_err(|err| LoggingError::InvalidFilter {
        filter: level.to_string(),
        reason: err.to_string(),
    })
}

/// Installs a text subscriber on stderr so stdout stays free for countdown output.
pub fn init_logging(level: &str) -> Result<(), LoggingError> {
    let filter = build_filter(level)?;
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_levels_and_directives() {
        assert!(build_filter("info").is_ok());
        assert!(build_filter("countdown=debug,warn").is_ok());
    }

    #[test]
    fn rejects_garbage_filter() {
        let err = build_filter("countdown=loud").expect_err("invalid level");
        assert!(err.to_string().contains("invalid log filter 'countdown=loud'"));
    }

    #[test]
    fn second_initialisation_fails() {
        let _ = init_logging("warn");
        assert!(matches!(
            init_logging("warn"),
            Err(LoggingError::AlreadyInitialized)
        ));
    }
}
