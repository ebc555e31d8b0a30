use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "CALROWS_CONFIG";

/// Largest page the Calendar API will return for `events.list`.
pub const MAX_PAGE_SIZE: u32 = 2500;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a summary of all errors joined by `; `
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Which calendars to read and how
    #[serde(default)]
    pub calendar: CalendarConfig,

    /// OAuth client secret and token cache locations
    #[serde(default)]
    pub auth: AuthConfig,

    /// Relational sink settings
    #[serde(default)]
    pub sink: SinkConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Calendar identifiers to walk, in order
    pub calendar_ids: Vec<String>,

    /// Lower bound for event end times (`timeMin`)
    #[serde(default = "default_time_min")]
    pub time_min: DateTime<Utc>,

    /// Events requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Base URL of the Calendar v3 API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

fn default_time_min() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

fn default_api_base_url() -> String {
    "https://www.googleapis.com/calendar/v3".to_string()
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            calendar_ids: vec!["primary".to_string()],
            time_min: default_time_min(),
            page_size: default_page_size(),
            api_base_url: default_api_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// OAuth client secret downloaded from the Google Cloud console
    #[serde(default = "default_client_secret_path")]
    pub client_secret_path: PathBuf,

    /// Where the access/refresh token pair is cached between runs
    #[serde(default = "default_token_cache_path")]
    pub token_cache_path: PathBuf,

    /// Loopback port for the consent redirect; 0 picks a free port
    #[serde(default)]
    pub callback_port: u16,
}

fn default_client_secret_path() -> PathBuf {
    PathBuf::from("credentials.json")
}

fn default_token_cache_path() -> PathBuf {
    PathBuf::from("token.json")
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_secret_path: default_client_secret_path(),
            token_cache_path: default_token_cache_path(),
            callback_port: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Write rows to the database after fetching
    #[serde(default = "default_sink_enabled")]
    pub enabled: bool,

    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Table inside the `main` schema
    #[serde(default = "default_table")]
    pub table: String,
}

fn default_sink_enabled() -> bool {
    true
}

fn default_database_path() -> PathBuf {
    PathBuf::from("calendar_events.db")
}

fn default_table() -> String {
    "calendar_events".to_string()
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            enabled: default_sink_enabled(),
            database_path: default_database_path(),
            table: default_table(),
        }
    }
}

/// Returns true for `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from `path`, writing defaults there if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Wrote default configuration to {}", path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::NotFound(format!("{}: {}", path.display(), e)))?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))
    }

    /// Load configuration and validate it
    ///
    /// Warnings are logged; any error fails the load.
    pub fn load_validated() -> Result<(Self, ValidationResult), ConfigError> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.calendar.calendar_ids.is_empty() {
            result.add_error("calendar.calendar_ids", "At least one calendar id is required");
        }

        let mut seen = HashSet::new();
        for id in &self.calendar.calendar_ids {
            if id.trim().is_empty() {
                result.add_error("calendar.calendar_ids", "Calendar ids must not be blank");
            } else if !seen.insert(id.as_str()) {
                result.add_warning(
                    "calendar.calendar_ids",
                    format!("Calendar {} is listed more than once", id),
                );
            }
        }

        if self.calendar.page_size == 0 || self.calendar.page_size > MAX_PAGE_SIZE {
            result.add_error(
                "calendar.page_size",
                format!("Page size must be between 1 and {}", MAX_PAGE_SIZE),
            );
        }

        self.validate_url(
            &self.calendar.api_base_url,
            "calendar.api_base_url",
            &mut result,
        );

        if !self.auth.client_secret_path.exists() {
            result.add_warning(
                "auth.client_secret_path",
                format!(
                    "Client secret file does not exist: {}",
                    self.auth.client_secret_path.display()
                ),
            );
        }

        if !is_valid_identifier(&self.sink.table) {
            result.add_error(
                "sink.table",
                format!("Not a valid SQL identifier: {:?}", self.sink.table),
            );
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteFailed(format!("{}: {}", parent.display(), e)))?;
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, contents)
            .map_err(|e| ConfigError::WriteFailed(format!("{}: {}", path.display(), e)))
    }

    /// `$CALROWS_CONFIG`, or `config.toml` under the user config directory
    fn config_path() -> Result<PathBuf, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::MissingSetting("user config directory".to_string()))?
            .join("calrows");

        Ok(config_dir.join("config.toml"))
    }
}
