pub mod config;
pub mod error;

pub use config::{AuthConfig, CalendarConfig, Config, SinkConfig, ValidationResult};
pub use error::{AuthError, ConfigError, DatabaseError, RusqliteErrorExt};

use anyhow::Result;

/// Initialize tracing for the process
///
/// Logs go to stderr; stdout carries only the printed table.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::debug!("calrows core initialized");
    Ok(())
}
