//! Remote collection client.
//!
//! # Responsibility
//! - Model the remote document database as an opaque CRUD seam
//!   ([`document::DocumentStore`]).
//! - Provide per-entity operations that keep `order` fields and parent order
//!   arrays consistent ([`client::RemoteClient`]).
//!
//! # Invariants
//! - Child create and parent order-array update are two separate writes; a
//!   failure between them rejects the operation and leaves the child in place.
//! - Every failure surfaces as [`RemoteError`]; nothing is retried.

pub mod client;
pub mod document;

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors from remote collection operations.
#[derive(Debug)]
pub enum RemoteError {
    /// Target document does not exist.
    NotFound { collection: String, id: String },
    /// Transport or backend failure.
    Backend(String),
    /// Underlying SQLite failure of the document table implementation.
    Db(DbError),
    /// Stored document cannot be converted into a record.
    InvalidDocument {
        collection: String,
        id: String,
        reason: String,
    },
}

impl RemoteError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Stable short code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "remote_not_found",
            Self::Backend(_) => "remote_backend",
            Self::Db(_) => "remote_db",
            Self::InvalidDocument { .. } => "remote_invalid_document",
        }
    }
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { collection, id } => {
                write!(f, "remote document not found: {collection}/{id}")
            }
            Self::Backend(message) => write!(f, "remote backend failure: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidDocument {
                collection,
                id,
                reason,
            } => write!(f, "invalid remote document {collection}/{id}: {reason}"),
        }
    }
}

impl Error for RemoteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RemoteError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RemoteError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
