//! Content tree store and startup mode arbitration.
//!
//! # Responsibility
//! - Own the authoritative in-memory tree and route every mutation through
//!   one storage strategy (local or remote).
//! - Decide at startup and on capability changes which strategy is active.
//!
//! # Invariants
//! - Mutations return an explicit [`Outcome`]; backing failures are logged at
//!   this boundary and never panic.
//! - Local write failures still update memory (`Outcome::Unsaved`); remote
//!   write failures leave memory untouched (`Err`).

pub mod backend;
pub mod initializer;
pub mod tree;

use crate::local::LocalError;
use crate::remote::RemoteError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from tree store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Title is blank after trim.
    BlankTitle,
    /// Remote mode is enabled but no remote backend was configured.
    RemoteNotConfigured,
    /// Local persistence failure.
    Local(LocalError),
    /// Remote collection failure.
    Remote(RemoteError),
}

impl StoreError {
    /// Stable short code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BlankTitle => "blank_title",
            Self::RemoteNotConfigured => "remote_not_configured",
            Self::Local(_) => "local_write_failed",
            Self::Remote(err) => err.code(),
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "title must not be blank"),
            Self::RemoteNotConfigured => write!(f, "remote mode enabled without a remote backend"),
            Self::Local(err) => write!(f, "{err}"),
            Self::Remote(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Local(err) => Some(err),
            Self::Remote(err) => Some(err),
            Self::BlankTitle | Self::RemoteNotConfigured => None,
        }
    }
}

impl From<LocalError> for StoreError {
    fn from(value: LocalError) -> Self {
        Self::Local(value)
    }
}

impl From<RemoteError> for StoreError {
    fn from(value: RemoteError) -> Self {
        Self::Remote(value)
    }
}

/// Result of one store mutation that did not hard-fail.
#[derive(Debug)]
pub enum Outcome<T> {
    /// Applied in memory and persisted by the active backend.
    Saved(T),
    /// Applied in memory; the local write failed and was dropped.
    Unsaved { value: T, error: StoreError },
    /// Target or parent id is unknown; nothing changed.
    Missing,
}

impl<T> Outcome<T> {
    pub(crate) fn settle(written: Result<(), StoreError>, value: T) -> Self {
        match written {
            Ok(()) => Self::Saved(value),
            Err(error) => Self::Unsaved { value, error },
        }
    }

    /// Value applied to memory, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Saved(value) | Self::Unsaved { value, .. } => Some(value),
            Self::Missing => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Saved(value) | Self::Unsaved { value, .. } => Some(value),
            Self::Missing => None,
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}
