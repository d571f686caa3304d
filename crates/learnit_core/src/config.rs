//! Core runtime configuration.
//!
//! Read from a JSON document supplied by the host. Every field is optional;
//! absent fields take the defaults below.

use crate::logging::default_log_level;
use serde::Deserialize;
use std::path::PathBuf;

/// Host-supplied settings for logging and storage.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct CoreConfig {
    pub log_level: String,
    /// Absolute directory for rotating log files. No file logging when unset.
    pub log_dir: Option<PathBuf>,
    /// SQLite file holding the local key-value store. In-memory when unset.
    pub local_db_path: Option<PathBuf>,
    /// SQLite file standing in for the remote document database.
    pub remote_db_path: Option<PathBuf>,
    /// Build-time switch for the remote backend.
    pub remote_backend_enabled: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_string(),
            log_dir: None,
            local_db_path: None,
            remote_db_path: None,
            remote_backend_enabled: false,
        }
    }
}

impl CoreConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::CoreConfig;
    use std::path::PathBuf;

    #[test]
    fn missing_fields_take_defaults() {
        let config = CoreConfig::from_json_str("{}").expect("empty object is valid");
        assert_eq!(config, CoreConfig::default());
        assert!(!config.remote_backend_enabled);
    }

    #[test]
    fn camel_case_fields_are_read() {
        let config = CoreConfig::from_json_str(
            r#"{"logLevel":"warn","localDbPath":"/tmp/learnit.db","remoteBackendEnabled":true}"#,
        )
        .expect("config should parse");
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.local_db_path, Some(PathBuf::from("/tmp/learnit.db")));
        assert!(config.remote_backend_enabled);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(CoreConfig::from_json_str(r#"{"logLvl":"warn"}"#).is_err());
    }
}
