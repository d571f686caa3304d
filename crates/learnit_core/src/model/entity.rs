//! Subject, topic and subtopic records.
//!
//! # Responsibility
//! - Define the persisted shape of every content-tree entity.
//! - Provide lifecycle helpers for timestamps and child ordering.
//!
//! # Invariants
//! - Serialized field names are camelCase to match the persisted layout.
//! - `updated_at` never moves backwards when touched.
//! - Order arrays never hold the same id twice.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

pub type SubjectId = String;
pub type TopicId = String;
pub type SubtopicId = String;

/// Entity discriminator used by cascading deletes and log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Subject,
    Topic,
    Subtopic,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::Topic => "topic",
            Self::Subtopic => "subtopic",
        }
    }
}

/// Study progress of one subtopic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubtopicStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

/// Root of one content tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub order: i64,
    /// Authoritative display order of child topics.
    #[serde(default)]
    pub topic_order: Vec<TopicId>,
    /// Unix epoch milliseconds.
    #[serde(default)]
    pub created_at: i64,
    /// Unix epoch milliseconds.
    #[serde(default)]
    pub updated_at: i64,
}

/// Second level node. Holds content directly only while it has no subtopics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: TopicId,
    pub subject_id: SubjectId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub order: i64,
    /// Authoritative display order of child subtopics.
    #[serde(default)]
    pub subtopic_order: Vec<SubtopicId>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

/// Content leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtopic {
    pub id: SubtopicId,
    pub topic_id: TopicId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Rich-text HTML produced by the editor.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub status: SubtopicStatus,
    /// Always within `0..=100`.
    #[serde(default)]
    pub completion_percentage: u8,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl Subject {
    /// Creates a subject with empty `topic_order` and equal timestamps.
    pub fn new(
        id: impl Into<SubjectId>,
        title: impl Into<String>,
        description: Option<String>,
        order: i64,
        now_ms: i64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description,
            order,
            topic_order: Vec::new(),
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    pub fn touch(&mut self, now_ms: i64) {
        self.updated_at = self.updated_at.max(now_ms);
    }

    /// Appends one topic id unless already present.
    pub fn push_topic(&mut self, topic_id: &str) {
        push_unique(&mut self.topic_order, topic_id);
    }

    /// Removes one topic id. Returns whether the array changed.
    pub fn remove_topic(&mut self, topic_id: &str) -> bool {
        remove_id(&mut self.topic_order, topic_id)
    }
}

impl Topic {
    /// Creates a topic with empty `subtopic_order` and no direct content.
    pub fn new(
        id: impl Into<TopicId>,
        subject_id: impl Into<SubjectId>,
        title: impl Into<String>,
        description: Option<String>,
        order: i64,
        now_ms: i64,
    ) -> Self {
        Self {
            id: id.into(),
            subject_id: subject_id.into(),
            title: title.into(),
            description,
            content: None,
            order,
            subtopic_order: Vec::new(),
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    pub fn touch(&mut self, now_ms: i64) {
        self.updated_at = self.updated_at.max(now_ms);
    }

    pub fn push_subtopic(&mut self, subtopic_id: &str) {
        push_unique(&mut self.subtopic_order, subtopic_id);
    }

    pub fn remove_subtopic(&mut self, subtopic_id: &str) -> bool {
        remove_id(&mut self.subtopic_order, subtopic_id)
    }
}

impl Subtopic {
    /// Creates an empty, not-started subtopic.
    pub fn new(
        id: impl Into<SubtopicId>,
        topic_id: impl Into<TopicId>,
        title: impl Into<String>,
        description: Option<String>,
        order: i64,
        now_ms: i64,
    ) -> Self {
        Self {
            id: id.into(),
            topic_id: topic_id.into(),
            title: title.into(),
            description,
            content: String::new(),
            status: SubtopicStatus::NotStarted,
            completion_percentage: 0,
            notes: String::new(),
            order,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    pub fn touch(&mut self, now_ms: i64) {
        self.updated_at = self.updated_at.max(now_ms);
    }

    /// Sets progress, clamping the percentage to `0..=100`.
    pub fn set_progress(&mut self, status: SubtopicStatus, completion_percentage: u8) {
        self.status = status;
        self.completion_percentage = completion_percentage.min(100);
    }
}

/// Generates a fresh client-side id for local writes.
pub fn new_local_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current wall clock in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Next sibling `order` value: one past the current maximum, `0` when empty.
pub fn next_order(orders: impl IntoIterator<Item = i64>) -> i64 {
    orders.into_iter().max().map_or(0, |max| max + 1)
}

fn push_unique(order: &mut Vec<String>, id: &str) {
    if !order.iter().any(|existing| existing == id) {
        order.push(id.to_string());
    }
}

fn remove_id(order: &mut Vec<String>, id: &str) -> bool {
    let before = order.len();
    order.retain(|existing| existing != id);
    order.len() != before
}
