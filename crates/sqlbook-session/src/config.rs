//! Session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Tunables for one exercise session. Every field has a default, so an empty
/// TOML document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Session id sent on every engine request.
    pub session_id: String,
    pub request_timeout_ms: u64,
    /// Row cap for exercise queries.
    pub exec_row_limit: usize,
    /// Row cap for each `PRAGMA table_info` issued while building the catalog.
    pub catalog_row_limit: usize,
    /// Rows fetched when previewing a table or view in the schema browser.
    pub preview_row_limit: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: "shared".to_string(),
            request_timeout_ms: 5_000,
            exec_row_limit: 500,
            catalog_row_limit: 1_000,
            preview_row_limit: 100,
        }
    }
}

impl SessionConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, SessionError> {
        let config: Self =
            toml::from_str(source).map_err(|err| SessionError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    fn validate(&self) -> Result<(), SessionError> {
        if self.session_id.is_empty() {
            return Err(SessionError::Config("sessionId must not be empty".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(SessionError::Config(
                "requestTimeoutMs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
