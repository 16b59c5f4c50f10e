//! Runtime configuration read from `SHEETSYNC_*` environment variables.

use crate::clients::google::AccessToken;
use crate::sync::SyncOptions;
use regex::Regex;
use std::env;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SHEETS_URL: &str = "https://sheets.googleapis.com";
pub const DEFAULT_DRIVE_URL: &str = "https://www.googleapis.com";

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("identifier regex is valid")
});

/// `true` when `name` can be used as a table name without surprises.
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER_RE.is_match(name)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {message}")]
    InvalidValue {
        var: &'static str,
        value: String,
        message: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            var,
            value: value.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// Directory holding `sheet_id.json`, `sheets.json` and `sql.json`.
    pub state_dir: PathBuf,
    pub table_name: String,
    pub sheet_title: String,
    /// Address granted write access on every newly created spreadsheet.
    pub collaborator: Option<String>,
    pub poll_interval: Duration,
    pub access_token: AccessToken,
    pub sheets_url: String,
    pub drive_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Builds the configuration from any variable lookup, so tests can avoid
    /// touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str, default: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let port_raw = get("SHEETSYNC_PORT", "8080");
        let port = port_raw
            .parse::<u16>()
            .map_err(|e| ConfigError::invalid("SHEETSYNC_PORT", &port_raw, e.to_string()))?;

        let poll_raw = get("SHEETSYNC_POLL_SECONDS", "10");
        let poll_seconds = poll_raw
            .parse::<u64>()
            .map_err(|e| ConfigError::invalid("SHEETSYNC_POLL_SECONDS", &poll_raw, e.to_string()))?;
        if poll_seconds == 0 {
            return Err(ConfigError::invalid(
                "SHEETSYNC_POLL_SECONDS",
                &poll_raw,
                "must be at least 1",
            ));
        }

        let table_name = get("SHEETSYNC_TABLE", "new_table");
        if !is_valid_identifier(&table_name) {
            return Err(ConfigError::invalid(
                "SHEETSYNC_TABLE",
                &table_name,
                "must be a plain SQL identifier",
            ));
        }

        let sheet_title = get("SHEETSYNC_SHEET_TITLE", "New Sheet");
        let collaborator = lookup("SHEETSYNC_COLLABORATOR")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        if let Some(address) = &collaborator {
            if !address.contains('@') {
                return Err(ConfigError::invalid(
                    "SHEETSYNC_COLLABORATOR",
                    address,
                    "must be an e-mail address",
                ));
            }
        }

        let access_token = match lookup("SHEETSYNC_ACCESS_TOKEN").filter(|t| !t.trim().is_empty()) {
            Some(token) => AccessToken::Static(token.trim().to_string()),
            None => AccessToken::File(PathBuf::from(get("SHEETSYNC_TOKEN_FILE", "tokens.json"))),
        };

        Ok(Self {
            host: get("SHEETSYNC_HOST", "127.0.0.1"),
            port,
            db_path: PathBuf::from(get("SHEETSYNC_DB_PATH", "sheetsync.sqlite")),
            state_dir: PathBuf::from(get("SHEETSYNC_STATE_DIR", "uploads")),
            table_name,
            sheet_title,
            collaborator,
            poll_interval: Duration::from_secs(poll_seconds),
            access_token,
            sheets_url: get("SHEETSYNC_SHEETS_URL", DEFAULT_SHEETS_URL),
            drive_url: get("SHEETSYNC_DRIVE_URL", DEFAULT_DRIVE_URL),
        })
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            table_name: self.table_name.clone(),
            sheet_title: self.sheet_title.clone(),
            collaborator: self.collaborator.clone(),
        }
    }
}
