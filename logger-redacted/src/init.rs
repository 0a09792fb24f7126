use thiserror::Error;
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggerConfig;
use crate::redactor::set_redaction_enabled;

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Tracing subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `config.log_level`. Human-readable output carries
/// RFC 3339 timestamps; JSON output is meant for log shippers.
pub fn init_tracing(config: &LoggerConfig) -> Result<(), LoggerError> {
    set_redaction_enabled(config.redaction_enabled);

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directives(&config.log_level))
            .map_err(|e| LoggerError::Filter(e.to_string()))?,
    };

    let installed = if config.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .json(),
            )
            .try_init()
            .map_err(|e| LoggerError::AlreadyInstalled(e.to_string()))
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(std::io::stderr)
                    .with_level(true),
            )
            .try_init()
            .map_err(|e| LoggerError::AlreadyInstalled(e.to_string()))
    };
    installed?;

    tracing::debug!(
        level = %config.log_level,
        json = config.json,
        redaction = config.redaction_enabled,
        "tracing initialised"
    );
    Ok(())
}

fn default_directives(level: &str) -> String {
    format!(
        "intake_engine={level},symptom_intake={level},logger_redacted={level},reqwest=warn,hyper=warn"
    )
}
