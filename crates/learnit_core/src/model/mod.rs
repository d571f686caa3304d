//! Domain model for the subject/topic/subtopic content tree.
//!
//! # Responsibility
//! - Define canonical records shared by the local store, the remote client and
//!   the in-memory tree store.
//! - Keep the in-memory tree and selection cursor semantics in one place.
//!
//! # Invariants
//! - Every record is identified by an opaque, globally unique string id.
//! - `topic_order`/`subtopic_order` are the only source of display order.

pub mod defaults;
pub mod entity;
pub mod settings;
pub mod tree;
