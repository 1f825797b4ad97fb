//! # Configuration
//!
//! Runtime settings come from `MONMAN_*` environment variables with defaults
//! suitable for a single workshop server. Business rules that never change
//! per deployment live here as constants.

use chrono::NaiveTime;
use common::model::choices::Shift;
use std::path::PathBuf;

/// Analysis reports every foreman must file per calendar month.
pub const REQUIRED_ANALYSIS_REPORTS: i64 = 3;

/// Largest accepted documentation image upload.
pub const MAX_IMAGE_BYTES: usize = 1024 * 1024;

/// Largest accepted plain text field of a multipart form.
pub const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

/// Rows per page on the foreman report list.
pub const PAGE_SIZE: i64 = 10;

/// Daily activity report deadline of a shift. `Off` has none.
pub fn shift_deadline(shift: Shift) -> Option<NaiveTime> {
    match shift {
        Shift::First => NaiveTime::from_hms_opt(18, 0, 0),
        Shift::Second => NaiveTime::from_hms_opt(5, 0, 0),
        Shift::Off => None,
    }
}

/// Errors that can occur while reading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The port number could not be parsed as a valid number.
    #[error("Invalid port number: {value}")]
    InvalidPort {
        /// The invalid port value that was provided.
        value: String,
    },
    /// The session key is set but too short to sign cookies.
    #[error("MONMAN_SESSION_KEY must be at least 64 bytes, got {len}")]
    SessionKeyTooShort {
        /// Length of the provided key.
        len: usize,
    },
}

/// Settings of the web server and the scheduler processes.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub host: String,
    /// Port the HTTP server binds to
    pub port: u16,
    /// Path of the SQLite database file
    pub database_path: PathBuf,
    /// Directory holding the TTF font families used for PDFs
    pub fonts_dir: PathBuf,
    /// Cookie signing key; a random key is generated when absent
    pub session_key: Option<Vec<u8>>,
    /// Telegram bot token; delivery is disabled when absent
    pub telegram_bot_token: Option<String>,
    /// Company printed on the PDF forms
    pub company_name: String,
    /// Site printed on the PDF forms
    pub site_name: String,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Creates the configuration from environment variables.
    ///
    /// Returns `Err` if a variable is present but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port_str = env_or("MONMAN_PORT", "8000");
        let port = port_str
            .parse::<u16>()
            .map_err(|_e| ConfigError::InvalidPort {
                value: port_str.clone(),
            })?;

        let session_key = match env_opt("MONMAN_SESSION_KEY") {
            Some(key) if key.len() < 64 => {
                return Err(ConfigError::SessionKeyTooShort { len: key.len() })
            }
            Some(key) => Some(key.into_bytes()),
            None => None,
        };

        Ok(Self {
            host: env_or("MONMAN_HOST", "127.0.0.1"),
            port,
            database_path: PathBuf::from(env_or("MONMAN_DATABASE", "monman.sqlite")),
            fonts_dir: PathBuf::from(env_or("MONMAN_FONTS_DIR", "./fonts")),
            session_key,
            telegram_bot_token: env_opt("MONMAN_TELEGRAM_BOT_TOKEN"),
            company_name: env_or("MONMAN_COMPANY_NAME", "PT. RIUNG MITRA LESTARI"),
            site_name: env_or("MONMAN_SITE_NAME", "Laung Tuhup"),
        })
    }

    /// Configuration for tests and tools that never touch the environment.
    pub fn for_database(path: impl Into<PathBuf>) -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8000,
            database_path: path.into(),
            fonts_dir: PathBuf::from("./fonts"),
            session_key: None,
            telegram_bot_token: None,
            company_name: "PT. RIUNG MITRA LESTARI".to_owned(),
            site_name: "Laung Tuhup".to_owned(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Shift::First, NaiveTime::from_hms_opt(18, 0, 0))]
    #[case(Shift::Second, NaiveTime::from_hms_opt(5, 0, 0))]
    #[case(Shift::Off, None)]
    fn deadlines_follow_shift(#[case] shift: Shift, #[case] expected: Option<NaiveTime>) {
        assert_eq!(shift_deadline(shift), expected);
    }

    #[test]
    fn defaults_for_database_are_local() {
        let config = AppConfig::for_database(":memory:");
        assert_eq!(config.bind_address(), "127.0.0.1:8000");
        assert!(config.telegram_bot_token.is_none());
    }
}
