//! Per-entity CRUD over the hierarchical remote collections.
//!
//! # Responsibility
//! - Convert records to and from remote documents.
//! - Append/strip child ids on the parent's order array around every add/delete.
//! - Walk `subjects -> topics -> subtopics` for a full remote load.
//!
//! # Invariants
//! - `add_*` reads the sibling maximum `order`, creates the child, then appends
//!   the child id to the parent order array, in that order.
//! - `delete_*` removes descendants first, then the record, then strips the id
//!   from the parent order array.
//! - Malformed documents are skipped on fetch and logged, never returned.

use crate::model::entity::{next_order, now_epoch_ms, Subject, SubjectId, Subtopic, Topic, TopicId};
use crate::model::settings::Settings;
use crate::model::tree::TreeSnapshot;
use crate::remote::document::{
    subtopics_collection, topics_collection, Document, DocumentStore, Fields,
    SUBJECTS_COLLECTION, USERS_COLLECTION,
};
use crate::remote::{RemoteError, RemoteResult};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

const TOPIC_ORDER_FIELD: &str = "topicOrder";
const SUBTOPIC_ORDER_FIELD: &str = "subtopicOrder";
const UPDATED_AT_FIELD: &str = "updatedAt";
const PREFERENCES_FIELD: &str = "preferences";

/// Remote collection client over any [`DocumentStore`].
pub struct RemoteClient<D: DocumentStore> {
    docs: D,
}

impl<D: DocumentStore> RemoteClient<D> {
    pub fn new(docs: D) -> Self {
        Self { docs }
    }

    /// Underlying document store.
    pub fn documents(&self) -> &D {
        &self.docs
    }

    /// Loads every subject, topic and subtopic.
    pub fn fetch_all(&self) -> RemoteResult<TreeSnapshot> {
        let mut snapshot = TreeSnapshot::default();
        snapshot.subjects = self.fetch_subjects()?;
        for subject_id in snapshot.subjects.keys() {
            let topics = self.fetch_topics(subject_id)?;
            for topic_id in topics.keys() {
                snapshot
                    .subtopics
                    .extend(self.fetch_subtopics(subject_id, topic_id)?);
            }
            snapshot.topics.extend(topics);
        }
        Ok(snapshot)
    }

    pub fn fetch_subjects(&self) -> RemoteResult<BTreeMap<SubjectId, Subject>> {
        self.fetch_records(SUBJECTS_COLLECTION, None)
    }

    pub fn fetch_topics(&self, subject_id: &str) -> RemoteResult<BTreeMap<TopicId, Topic>> {
        self.fetch_records(
            &topics_collection(subject_id),
            Some(("subjectId", subject_id)),
        )
    }

    pub fn fetch_subtopics(
        &self,
        subject_id: &str,
        topic_id: &str,
    ) -> RemoteResult<BTreeMap<String, Subtopic>> {
        self.fetch_records(
            &subtopics_collection(subject_id, topic_id),
            Some(("topicId", topic_id)),
        )
    }

    /// Creates a subject with a store-assigned id.
    pub fn add_subject(&self, title: &str, description: Option<&str>) -> RemoteResult<Subject> {
        let order = self.next_sibling_order(SUBJECTS_COLLECTION)?;
        let draft = Subject::new(
            String::new(),
            title,
            description.map(str::to_string),
            order,
            now_epoch_ms(),
        );
        let id = self
            .docs
            .add(SUBJECTS_COLLECTION, to_fields(&draft, &["id"])?)?;
        debug!("event=remote_add module=remote status=ok kind=subject id={id}");
        Ok(Subject { id, ..draft })
    }

    /// Writes title, description and `updatedAt`.
    pub fn update_subject(&self, subject: &Subject) -> RemoteResult<()> {
        self.docs.update(
            SUBJECTS_COLLECTION,
            &subject.id,
            fields([
                ("title", json!(subject.title)),
                ("description", json!(subject.description)),
                (UPDATED_AT_FIELD, json!(subject.updated_at)),
            ]),
        )
    }

    /// Replaces the subject's `topicOrder` verbatim.
    pub fn reorder_topics(&self, subject: &Subject) -> RemoteResult<()> {
        self.docs.update(
            SUBJECTS_COLLECTION,
            &subject.id,
            fields([
                (TOPIC_ORDER_FIELD, json!(subject.topic_order)),
                (UPDATED_AT_FIELD, json!(subject.updated_at)),
            ]),
        )
    }

    /// Deletes a subject together with its nested topics and subtopics.
    pub fn delete_subject(&self, subject_id: &str) -> RemoteResult<()> {
        let topics = self.docs.list(&topics_collection(subject_id))?;
        for topic in &topics {
            self.delete_topic_subtree(subject_id, &topic.id)?;
        }
        self.docs.delete(SUBJECTS_COLLECTION, subject_id)?;
        debug!(
            "event=remote_delete module=remote status=ok kind=subject id={subject_id} topics={}",
            topics.len()
        );
        Ok(())
    }

    /// Creates a topic and appends it to the subject's `topicOrder`.
    pub fn add_topic(
        &self,
        subject_id: &str,
        title: &str,
        description: Option<&str>,
    ) -> RemoteResult<Topic> {
        self.require(SUBJECTS_COLLECTION, subject_id)?;
        let collection = topics_collection(subject_id);
        let order = self.next_sibling_order(&collection)?;
        let mut draft = Topic::new(
            String::new(),
            subject_id,
            title,
            description.map(str::to_string),
            order,
            now_epoch_ms(),
        );
        draft.content = Some(String::new());
        let id = self
            .docs
            .add(&collection, to_fields(&draft, &["id", "subjectId"])?)?;
        self.append_to_parent(SUBJECTS_COLLECTION, subject_id, TOPIC_ORDER_FIELD, &id)?;
        debug!("event=remote_add module=remote status=ok kind=topic id={id} parent={subject_id}");
        Ok(Topic { id, ..draft })
    }

    pub fn update_topic(&self, topic: &Topic) -> RemoteResult<()> {
        self.docs.update(
            &topics_collection(&topic.subject_id),
            &topic.id,
            fields([
                ("title", json!(topic.title)),
                ("description", json!(topic.description)),
                (UPDATED_AT_FIELD, json!(topic.updated_at)),
            ]),
        )
    }

    pub fn update_topic_content(&self, topic: &Topic) -> RemoteResult<()> {
        self.docs.update(
            &topics_collection(&topic.subject_id),
            &topic.id,
            fields([
                ("content", json!(topic.content)),
                (UPDATED_AT_FIELD, json!(topic.updated_at)),
            ]),
        )
    }

    /// Replaces the topic's `subtopicOrder` verbatim.
    pub fn reorder_subtopics(&self, topic: &Topic) -> RemoteResult<()> {
        self.docs.update(
            &topics_collection(&topic.subject_id),
            &topic.id,
            fields([
                (SUBTOPIC_ORDER_FIELD, json!(topic.subtopic_order)),
                (UPDATED_AT_FIELD, json!(topic.updated_at)),
            ]),
        )
    }

    /// Deletes a topic and its subtopics, then strips it from `topicOrder`.
    pub fn delete_topic(&self, subject_id: &str, topic_id: &str) -> RemoteResult<()> {
        self.delete_topic_subtree(subject_id, topic_id)?;
        self.strip_from_parent(SUBJECTS_COLLECTION, subject_id, TOPIC_ORDER_FIELD, topic_id)?;
        debug!("event=remote_delete module=remote status=ok kind=topic id={topic_id}");
        Ok(())
    }

    /// Creates a subtopic and appends it to the topic's `subtopicOrder`.
    pub fn add_subtopic(
        &self,
        subject_id: &str,
        topic_id: &str,
        title: &str,
        description: Option<&str>,
    ) -> RemoteResult<Subtopic> {
        let parent_collection = topics_collection(subject_id);
        self.require(&parent_collection, topic_id)?;
        let collection = subtopics_collection(subject_id, topic_id);
        let order = self.next_sibling_order(&collection)?;
        let draft = Subtopic::new(
            String::new(),
            topic_id,
            title,
            description.map(str::to_string),
            order,
            now_epoch_ms(),
        );
        let id = self
            .docs
            .add(&collection, to_fields(&draft, &["id", "topicId"])?)?;
        self.append_to_parent(&parent_collection, topic_id, SUBTOPIC_ORDER_FIELD, &id)?;
        debug!("event=remote_add module=remote status=ok kind=subtopic id={id} parent={topic_id}");
        Ok(Subtopic { id, ..draft })
    }

    pub fn update_subtopic(&self, subject_id: &str, subtopic: &Subtopic) -> RemoteResult<()> {
        self.update_subtopic_fields(
            subject_id,
            subtopic,
            [
                ("title", json!(subtopic.title)),
                ("description", json!(subtopic.description)),
            ],
        )
    }

    pub fn update_subtopic_content(
        &self,
        subject_id: &str,
        subtopic: &Subtopic,
    ) -> RemoteResult<()> {
        self.update_subtopic_fields(subject_id, subtopic, [("content", json!(subtopic.content))])
    }

    pub fn update_subtopic_progress(
        &self,
        subject_id: &str,
        subtopic: &Subtopic,
    ) -> RemoteResult<()> {
        self.update_subtopic_fields(
            subject_id,
            subtopic,
            [
                ("status", json!(subtopic.status)),
                (
                    "completionPercentage",
                    json!(subtopic.completion_percentage),
                ),
            ],
        )
    }

    pub fn update_subtopic_notes(&self, subject_id: &str, subtopic: &Subtopic) -> RemoteResult<()> {
        self.update_subtopic_fields(subject_id, subtopic, [("notes", json!(subtopic.notes))])
    }

    /// Deletes a subtopic, then strips it from the topic's `subtopicOrder`.
    pub fn delete_subtopic(
        &self,
        subject_id: &str,
        topic_id: &str,
        subtopic_id: &str,
    ) -> RemoteResult<()> {
        self.docs
            .delete(&subtopics_collection(subject_id, topic_id), subtopic_id)?;
        self.strip_from_parent(
            &topics_collection(subject_id),
            topic_id,
            SUBTOPIC_ORDER_FIELD,
            subtopic_id,
        )?;
        debug!("event=remote_delete module=remote status=ok kind=subtopic id={subtopic_id}");
        Ok(())
    }

    /// Reads a user's stored preferences, defaulting when absent.
    pub fn fetch_preferences(&self, user_id: &str) -> RemoteResult<Settings> {
        let Some(document) = self.docs.get(USERS_COLLECTION, user_id)? else {
            return Ok(Settings::default());
        };
        match document.fields.get(PREFERENCES_FIELD) {
            Some(value) => serde_json::from_value(value.clone()).map_err(|err| {
                RemoteError::InvalidDocument {
                    collection: USERS_COLLECTION.to_string(),
                    id: user_id.to_string(),
                    reason: err.to_string(),
                }
            }),
            None => Ok(Settings::default()),
        }
    }

    /// Stores preferences on an existing user document.
    ///
    /// Returns `None` when the user document does not exist.
    pub fn update_preferences(
        &self,
        user_id: &str,
        settings: &Settings,
    ) -> RemoteResult<Option<Settings>> {
        if self.docs.get(USERS_COLLECTION, user_id)?.is_none() {
            return Ok(None);
        }
        self.docs.update(
            USERS_COLLECTION,
            user_id,
            fields([
                (PREFERENCES_FIELD, json!(settings)),
                ("lastActive", json!(now_epoch_ms())),
            ]),
        )?;
        Ok(Some(*settings))
    }

    fn update_subtopic_fields<const N: usize>(
        &self,
        subject_id: &str,
        subtopic: &Subtopic,
        changed: [(&str, Value); N],
    ) -> RemoteResult<()> {
        let mut patch = fields(changed);
        patch.insert(UPDATED_AT_FIELD.to_string(), json!(subtopic.updated_at));
        self.docs.update(
            &subtopics_collection(subject_id, &subtopic.topic_id),
            &subtopic.id,
            patch,
        )
    }

    fn delete_topic_subtree(&self, subject_id: &str, topic_id: &str) -> RemoteResult<()> {
        let collection = subtopics_collection(subject_id, topic_id);
        for subtopic in self.docs.list(&collection)? {
            self.docs.delete(&collection, &subtopic.id)?;
        }
        self.docs.delete(&topics_collection(subject_id), topic_id)
    }

    fn next_sibling_order(&self, collection: &str) -> RemoteResult<i64> {
        let siblings = self.docs.list(collection)?;
        Ok(next_order(siblings.iter().map(Document::order)))
    }

    fn require(&self, collection: &str, id: &str) -> RemoteResult<Document> {
        self.docs
            .get(collection, id)?
            .ok_or_else(|| RemoteError::not_found(collection, id))
    }

    fn append_to_parent(
        &self,
        collection: &str,
        parent_id: &str,
        field: &str,
        child_id: &str,
    ) -> RemoteResult<()> {
        let parent = self.require(collection, parent_id)?;
        let mut order = order_array(&parent, field);
        if !order.iter().any(|id| id == child_id) {
            order.push(child_id.to_string());
        }
        self.docs.update(
            collection,
            parent_id,
            fields([
                (field, json!(order)),
                (UPDATED_AT_FIELD, json!(now_epoch_ms())),
            ]),
        )
    }

    fn strip_from_parent(
        &self,
        collection: &str,
        parent_id: &str,
        field: &str,
        child_id: &str,
    ) -> RemoteResult<()> {
        let Some(parent) = self.docs.get(collection, parent_id)? else {
            return Ok(());
        };
        let mut order = order_array(&parent, field);
        order.retain(|id| id != child_id);
        self.docs.update(
            collection,
            parent_id,
            fields([
                (field, json!(order)),
                (UPDATED_AT_FIELD, json!(now_epoch_ms())),
            ]),
        )
    }

    fn fetch_records<T: DeserializeOwned>(
        &self,
        collection: &str,
        parent: Option<(&str, &str)>,
    ) -> RemoteResult<BTreeMap<String, T>> {
        let mut records = BTreeMap::new();
        for document in self.docs.list(collection)? {
            let id = document.id.clone();
            match from_document::<T>(document, parent) {
                Ok(record) => {
                    records.insert(id, record);
                }
                Err(err) => warn!(
                    "event=remote_fetch module=remote status=error collection={collection} id={id} error_code=invalid_document error={err}"
                ),
            }
        }
        Ok(records)
    }
}

fn fields<'a>(entries: impl IntoIterator<Item = (&'a str, Value)>) -> Fields {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// Serializes a record, dropping fields implied by the document path.
fn to_fields<T: Serialize>(record: &T, implied: &[&str]) -> RemoteResult<Fields> {
    match serde_json::to_value(record) {
        Ok(Value::Object(mut map)) => {
            for key in implied {
                map.remove(*key);
            }
            Ok(map)
        }
        Ok(_) => Err(RemoteError::Backend(
            "record did not serialize to an object".to_string(),
        )),
        Err(err) => Err(RemoteError::Backend(err.to_string())),
    }
}

fn from_document<T: DeserializeOwned>(
    document: Document,
    parent: Option<(&str, &str)>,
) -> serde_json::Result<T> {
    let mut map = document.fields;
    map.insert("id".to_string(), Value::String(document.id));
    if let Some((key, parent_id)) = parent {
        map.insert(key.to_string(), Value::String(parent_id.to_string()));
    }
    serde_json::from_value(Value::Object(map))
}

fn order_array(document: &Document, field: &str) -> Vec<String> {
    document
        .fields
        .get(field)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{from_document, order_array, to_fields};
    use crate::model::entity::{Subtopic, SubtopicStatus, Topic};
    use crate::remote::document::Document;
    use serde_json::json;

    #[test]
    fn topic_fields_omit_path_implied_keys() {
        let topic = Topic::new("t1", "s1", "Algebra", None, 3, 10);
        let fields = to_fields(&topic, &["id", "subjectId"]).expect("topic should serialize");
        assert!(fields.get("id").is_none());
        assert!(fields.get("subjectId").is_none());
        assert_eq!(fields["order"], 3);
    }

    #[test]
    fn sparse_document_fills_defaults() {
        let document = Document {
            id: "st1".to_string(),
            fields: json!({"title": "Linear"})
                .as_object()
                .cloned()
                .expect("object literal"),
        };
        let subtopic: Subtopic =
            from_document(document, Some(("topicId", "t1"))).expect("sparse doc should parse");
        assert_eq!(subtopic.id, "st1");
        assert_eq!(subtopic.topic_id, "t1");
        assert_eq!(subtopic.status, SubtopicStatus::NotStarted);
        assert!(subtopic.content.is_empty());
    }

    #[test]
    fn order_array_ignores_non_string_entries() {
        let document = Document {
            id: "s1".to_string(),
            fields: json!({"topicOrder": ["a", 3, "b"]})
                .as_object()
                .cloned()
                .expect("object literal"),
        };
        assert_eq!(order_array(&document, "topicOrder"), vec!["a", "b"]);
        assert!(order_array(&document, "missing").is_empty());
    }
}
