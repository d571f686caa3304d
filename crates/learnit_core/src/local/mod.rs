//! Persistent local store.
//!
//! # Responsibility
//! - Map the three content collections and user settings onto a durable
//!   string key-value storage.
//! - Degrade to empty reads and dropped writes when storage misbehaves.
//!
//! # Invariants
//! - Each collection lives under its own fixed key as a JSON object id -> record.
//! - Malformed JSON is logged and treated as an empty collection, never surfaced.

pub mod kv;
pub mod store;

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type LocalResult<T> = Result<T, LocalError>;

/// Errors from the local key-value layer.
#[derive(Debug)]
pub enum LocalError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Storage is disabled, full, or otherwise refusing access.
    Unavailable(String),
    /// Required table is missing on the provided connection.
    MissingRequiredTable(&'static str),
    /// Record could not be serialized for persistence.
    Serialize(serde_json::Error),
}

impl Display for LocalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(reason) => write!(f, "local storage unavailable: {reason}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "local storage requires table `{table}`")
            }
            Self::Serialize(err) => write!(f, "failed to serialize local record: {err}"),
        }
    }
}

impl Error for LocalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::Unavailable(_) | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<DbError> for LocalError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for LocalError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for LocalError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}
