//! Configuration module
//!
//! Loads configuration from environment variables (a `.env` file is read by
//! the binaries first).

use std::env;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Prefix printed before every amount in reports
    pub currency_prefix: String,

    /// File name offered for the PDF report
    pub report_filename: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("expenses.db"),
            host: "127.0.0.1".to_string(),
            port: 3000,
            currency_prefix: "Rs.".to_string(),
            report_filename: "report.pdf".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let database_path = env::var("EXPENSES_DB")
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);

        let host = env::var("HOST").unwrap_or(defaults.host);

        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue("PORT"))?,
            Err(_) => defaults.port,
        };

        let currency_prefix = env::var("CURRENCY_PREFIX").unwrap_or(defaults.currency_prefix);

        let report_filename = env::var("REPORT_FILENAME").unwrap_or(defaults.report_filename);
        if report_filename.trim().is_empty() {
            return Err(ConfigError::InvalidValue("REPORT_FILENAME"));
        }

        Ok(Self {
            database_path,
            host,
            port,
            currency_prefix,
            report_filename,
        })
    }

    /// Socket address string for the web server
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
