//! Core domain logic for LearnIt.
//! Owns the content tree, its local and remote persistence, and the startup
//! mode arbitration between them.

pub mod config;
pub mod db;
pub mod export;
pub mod local;
pub mod logging;
pub mod model;
pub mod remote;
pub mod store;

pub use config::CoreConfig;
pub use export::{
    export_selection, export_subject, export_subtopic, export_topic, html_to_markdown, slugify,
    MarkdownExport,
};
pub use local::kv::{KvStorage, SqliteKvStorage};
pub use local::store::LocalStore;
pub use local::{LocalError, LocalResult};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::entity::{EntityKind, Subject, SubjectId, Subtopic, SubtopicId, SubtopicStatus, Topic, TopicId};
pub use model::settings::{FontFamily, FontSize, Settings, Theme};
pub use model::tree::{ContentTree, ReconcileReport, Removed, Selection, TreeSnapshot};
pub use remote::client::RemoteClient;
pub use remote::document::{Document, DocumentStore, SqliteDocumentStore};
pub use remote::{RemoteError, RemoteResult};
pub use store::backend::{BackendKind, LocalBackend, RemoteBackend, TreeBackend};
pub use store::initializer::{Capability, InitState, StoreInitializer};
pub use store::tree::TreeStore;
pub use store::{Outcome, StoreError, StoreResult};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
