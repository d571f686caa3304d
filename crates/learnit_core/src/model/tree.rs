//! In-memory content tree and selection cursor.
//!
//! # Responsibility
//! - Hold the flat subject/topic/subtopic maps plus the current selection.
//! - Apply cascading removals and ordering reads without touching storage.
//! - Reconcile order arrays against the children that actually exist.
//!
//! # Invariants
//! - Removing a parent removes every descendant and strips the removed id
//!   from its own parent's order array.
//! - Selection pointers never reference ids removed through this type.
//! - Ordered reads skip dangling order entries instead of failing.

use crate::model::entity::{Subject, SubjectId, Subtopic, SubtopicId, Topic, TopicId};
use std::collections::{BTreeMap, HashSet};

/// Flat collections as loaded from one backing store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeSnapshot {
    pub subjects: BTreeMap<SubjectId, Subject>,
    pub topics: BTreeMap<TopicId, Topic>,
    pub subtopics: BTreeMap<SubtopicId, Subtopic>,
}

/// Counts produced by [`TreeSnapshot::reconcile_orders`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Order entries pointing at missing, foreign or duplicated children.
    pub dropped: usize,
    /// Existing children that were absent from their parent's order array.
    pub appended: usize,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.dropped == 0 && self.appended == 0
    }
}

impl TreeSnapshot {
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty() && self.topics.is_empty() && self.subtopics.is_empty()
    }

    /// Recomputes every order array from the children that exist.
    ///
    /// Valid entries keep their relative position; children missing from the
    /// array are appended by `(order, id)`. Idempotent.
    pub fn reconcile_orders(&mut self) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        let mut topics_by_subject: BTreeMap<&str, Vec<(i64, &str)>> = BTreeMap::new();
        for topic in self.topics.values() {
            topics_by_subject
                .entry(topic.subject_id.as_str())
                .or_default()
                .push((topic.order, topic.id.as_str()));
        }
        for subject in self.subjects.values_mut() {
            let children = topics_by_subject
                .get(subject.id.as_str())
                .map(Vec::as_slice)
                .unwrap_or_default();
            reconcile_one(&mut subject.topic_order, children, &mut report);
        }

        let mut subtopics_by_topic: BTreeMap<&str, Vec<(i64, &str)>> = BTreeMap::new();
        for subtopic in self.subtopics.values() {
            subtopics_by_topic
                .entry(subtopic.topic_id.as_str())
                .or_default()
                .push((subtopic.order, subtopic.id.as_str()));
        }
        for topic in self.topics.values_mut() {
            let children = subtopics_by_topic
                .get(topic.id.as_str())
                .map(Vec::as_slice)
                .unwrap_or_default();
            reconcile_one(&mut topic.subtopic_order, children, &mut report);
        }

        report
    }
}

fn reconcile_one(order: &mut Vec<String>, children: &[(i64, &str)], report: &mut ReconcileReport) {
    let existing: HashSet<&str> = children.iter().map(|(_, id)| *id).collect();
    let mut seen: HashSet<String> = HashSet::new();
    let before = order.len();
    order.retain(|id| existing.contains(id.as_str()) && seen.insert(id.clone()));
    report.dropped += before - order.len();

    let mut missing: Vec<(i64, &str)> = children
        .iter()
        .filter(|(_, id)| !seen.contains(*id))
        .copied()
        .collect();
    missing.sort();
    report.appended += missing.len();
    order.extend(missing.into_iter().map(|(_, id)| id.to_string()));
}

/// Cursor into the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub current_subject_id: Option<SubjectId>,
    pub current_topic_id: Option<TopicId>,
    pub current_subtopic_id: Option<SubtopicId>,
}

impl Selection {
    /// Selects a subject and clears the lower levels.
    pub fn select_subject(&mut self, id: Option<SubjectId>) {
        self.current_subject_id = id;
        self.current_topic_id = None;
        self.current_subtopic_id = None;
    }

    /// Selects a topic and clears the subtopic level.
    pub fn select_topic(&mut self, id: Option<TopicId>) {
        self.current_topic_id = id;
        self.current_subtopic_id = None;
    }

    pub fn select_subtopic(&mut self, id: Option<SubtopicId>) {
        self.current_subtopic_id = id;
    }

    /// Points every level at one chain of ids.
    pub fn select_chain(
        &mut self,
        subject_id: Option<SubjectId>,
        topic_id: Option<TopicId>,
        subtopic_id: Option<SubtopicId>,
    ) {
        self.current_subject_id = subject_id;
        self.current_topic_id = topic_id;
        self.current_subtopic_id = subtopic_id;
    }

    fn forget(&mut self, removed: &Removed) {
        if matches!(&self.current_subject_id, Some(id) if removed.subjects.contains(id)) {
            self.current_subject_id = None;
        }
        if matches!(&self.current_topic_id, Some(id) if removed.topics.contains(id)) {
            self.current_topic_id = None;
        }
        if matches!(&self.current_subtopic_id, Some(id) if removed.subtopics.contains(id)) {
            self.current_subtopic_id = None;
        }
    }
}

/// Ids removed by one cascading delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Removed {
    pub subjects: Vec<SubjectId>,
    pub topics: Vec<TopicId>,
    pub subtopics: Vec<SubtopicId>,
}

impl Removed {
    pub fn total(&self) -> usize {
        self.subjects.len() + self.topics.len() + self.subtopics.len()
    }
}

/// Authoritative in-memory model: flat maps plus selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTree {
    pub subjects: BTreeMap<SubjectId, Subject>,
    pub topics: BTreeMap<TopicId, Topic>,
    pub subtopics: BTreeMap<SubtopicId, Subtopic>,
    pub selection: Selection,
}

impl ContentTree {
    /// Replaces all three collections wholesale.
    ///
    /// Selection pointers survive only when their id is still present.
    pub fn replace_collections(&mut self, snapshot: TreeSnapshot) {
        self.subjects = snapshot.subjects;
        self.topics = snapshot.topics;
        self.subtopics = snapshot.subtopics;

        let selection = &mut self.selection;
        if matches!(&selection.current_subject_id, Some(id) if !self.subjects.contains_key(id)) {
            selection.current_subject_id = None;
        }
        if matches!(&selection.current_topic_id, Some(id) if !self.topics.contains_key(id)) {
            selection.current_topic_id = None;
        }
        if matches!(&selection.current_subtopic_id, Some(id) if !self.subtopics.contains_key(id)) {
            selection.current_subtopic_id = None;
        }
    }

    /// Copies the three collections out.
    pub fn snapshot(&self) -> TreeSnapshot {
        TreeSnapshot {
            subjects: self.subjects.clone(),
            topics: self.topics.clone(),
            subtopics: self.subtopics.clone(),
        }
    }

    /// Subjects sorted by `(order, created_at, id)`.
    pub fn subjects_in_order(&self) -> Vec<&Subject> {
        let mut subjects: Vec<&Subject> = self.subjects.values().collect();
        subjects.sort_by(|a, b| {
            (a.order, a.created_at, a.id.as_str()).cmp(&(b.order, b.created_at, b.id.as_str()))
        });
        subjects
    }

    /// Topics of one subject following `topic_order`, dangling entries skipped.
    pub fn topics_of(&self, subject_id: &str) -> Vec<&Topic> {
        let Some(subject) = self.subjects.get(subject_id) else {
            return Vec::new();
        };
        subject
            .topic_order
            .iter()
            .filter_map(|id| self.topics.get(id))
            .filter(|topic| topic.subject_id == subject_id)
            .collect()
    }

    /// Subtopics of one topic following `subtopic_order`, dangling entries skipped.
    pub fn subtopics_of(&self, topic_id: &str) -> Vec<&Subtopic> {
        let Some(topic) = self.topics.get(topic_id) else {
            return Vec::new();
        };
        topic
            .subtopic_order
            .iter()
            .filter_map(|id| self.subtopics.get(id))
            .filter(|subtopic| subtopic.topic_id == topic_id)
            .collect()
    }

    /// Removes a subject, its topics and their subtopics.
    pub fn remove_subject(&mut self, subject_id: &str) -> Removed {
        let mut removed = Removed::default();
        if self.subjects.remove(subject_id).is_none() {
            return removed;
        }
        removed.subjects.push(subject_id.to_string());

        let topic_ids: Vec<TopicId> = self
            .topics
            .values()
            .filter(|topic| topic.subject_id == subject_id)
            .map(|topic| topic.id.clone())
            .collect();
        for topic_id in topic_ids {
            self.remove_topic_subtree(&topic_id, &mut removed);
        }

        self.selection.forget(&removed);
        removed
    }

    /// Removes a topic and its subtopics; strips it from the parent order.
    pub fn remove_topic(&mut self, topic_id: &str, now_ms: i64) -> Removed {
        let mut removed = Removed::default();
        let Some(subject_id) = self.topics.get(topic_id).map(|t| t.subject_id.clone()) else {
            return removed;
        };
        self.remove_topic_subtree(topic_id, &mut removed);
        if let Some(subject) = self.subjects.get_mut(&subject_id) {
            if subject.remove_topic(topic_id) {
                subject.touch(now_ms);
            }
        }
        self.selection.forget(&removed);
        removed
    }

    /// Removes a subtopic; strips it from the parent order.
    pub fn remove_subtopic(&mut self, subtopic_id: &str, now_ms: i64) -> Removed {
        let mut removed = Removed::default();
        let Some(subtopic) = self.subtopics.remove(subtopic_id) else {
            return removed;
        };
        removed.subtopics.push(subtopic.id);
        if let Some(topic) = self.topics.get_mut(&subtopic.topic_id) {
            if topic.remove_subtopic(subtopic_id) {
                topic.touch(now_ms);
            }
        }
        self.selection.forget(&removed);
        removed
    }

    fn remove_topic_subtree(&mut self, topic_id: &str, removed: &mut Removed) {
        if self.topics.remove(topic_id).is_none() {
            return;
        }
        removed.topics.push(topic_id.to_string());
        let subtopic_ids: Vec<SubtopicId> = self
            .subtopics
            .values()
            .filter(|subtopic| subtopic.topic_id == topic_id)
            .map(|subtopic| subtopic.id.clone())
            .collect();
        for subtopic_id in subtopic_ids {
            self.subtopics.remove(&subtopic_id);
            removed.subtopics.push(subtopic_id);
        }
    }
}
