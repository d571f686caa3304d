//! Collection-level persistence over [`KvStorage`].
//!
//! # Responsibility
//! - Load the three content collections and settings with safe defaults.
//! - Upsert single records and perform cascading deletes across collections.
//!
//! # Invariants
//! - `load` never fails: unavailable storage or corrupt JSON yields empty maps.
//! - Deleting a subject removes its topics and their subtopics; deleting a
//!   topic removes its subtopics.

use crate::local::kv::KvStorage;
use crate::local::LocalResult;
use crate::model::entity::{EntityKind, Subject, Subtopic, Topic};
use crate::model::settings::Settings;
use crate::model::tree::TreeSnapshot;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

pub const SUBJECTS_KEY: &str = "learnit-subjects";
pub const TOPICS_KEY: &str = "learnit-topics";
pub const SUBTOPICS_KEY: &str = "learnit-subtopics";
pub const SETTINGS_KEY: &str = "learnit-settings";

/// Local persistence facade used by the local tree backend and initializer.
pub struct LocalStore {
    storage: Box<dyn KvStorage>,
}

impl LocalStore {
    pub fn new(storage: Box<dyn KvStorage>) -> Self {
        Self { storage }
    }

    /// Reads all three collections, defaulting each to empty.
    pub fn load(&self) -> TreeSnapshot {
        TreeSnapshot {
            subjects: self.read_or_empty(SUBJECTS_KEY),
            topics: self.read_or_empty(TOPICS_KEY),
            subtopics: self.read_or_empty(SUBTOPICS_KEY),
        }
    }

    /// Returns whether no collection key holds any record.
    ///
    /// Unreadable storage counts as empty.
    pub fn is_empty(&self) -> bool {
        [SUBJECTS_KEY, TOPICS_KEY, SUBTOPICS_KEY]
            .into_iter()
            .all(|key| match self.storage.get_item(key) {
                Ok(None) => true,
                Ok(Some(raw)) => raw_is_empty_collection(&raw),
                Err(err) => {
                    warn!(
                        "event=local_probe module=local status=error key={key} error_code=storage_unavailable error={err}"
                    );
                    true
                }
            })
    }

    /// Overwrites all three collections with `snapshot`.
    pub fn seed(&self, snapshot: &TreeSnapshot) -> LocalResult<()> {
        self.write_collection(SUBJECTS_KEY, &snapshot.subjects)?;
        self.write_collection(TOPICS_KEY, &snapshot.topics)?;
        self.write_collection(SUBTOPICS_KEY, &snapshot.subtopics)?;
        debug!(
            "event=local_seed module=local status=ok subjects={} topics={} subtopics={}",
            snapshot.subjects.len(),
            snapshot.topics.len(),
            snapshot.subtopics.len()
        );
        Ok(())
    }

    pub fn save_subject(&self, subject: &Subject) -> LocalResult<()> {
        self.upsert(SUBJECTS_KEY, &subject.id, subject)
    }

    pub fn save_topic(&self, topic: &Topic) -> LocalResult<()> {
        self.upsert(TOPICS_KEY, &topic.id, topic)
    }

    pub fn save_subtopic(&self, subtopic: &Subtopic) -> LocalResult<()> {
        self.upsert(SUBTOPICS_KEY, &subtopic.id, subtopic)
    }

    /// Removes one record and every dependent child record.
    pub fn delete_cascade(&self, kind: EntityKind, id: &str) -> LocalResult<()> {
        match kind {
            EntityKind::Subject => {
                let mut subjects: BTreeMap<String, Subject> = self.read_collection(SUBJECTS_KEY)?;
                let mut topics: BTreeMap<String, Topic> = self.read_collection(TOPICS_KEY)?;
                let mut subtopics: BTreeMap<String, Subtopic> =
                    self.read_collection(SUBTOPICS_KEY)?;

                subjects.remove(id);
                let doomed: HashSet<String> = topics
                    .values()
                    .filter(|topic| topic.subject_id == id)
                    .map(|topic| topic.id.clone())
                    .collect();
                topics.retain(|topic_id, _| !doomed.contains(topic_id));
                subtopics.retain(|_, subtopic| !doomed.contains(&subtopic.topic_id));

                self.write_collection(SUBJECTS_KEY, &subjects)?;
                self.write_collection(TOPICS_KEY, &topics)?;
                self.write_collection(SUBTOPICS_KEY, &subtopics)?;
            }
            EntityKind::Topic => {
                let mut topics: BTreeMap<String, Topic> = self.read_collection(TOPICS_KEY)?;
                let mut subtopics: BTreeMap<String, Subtopic> =
                    self.read_collection(SUBTOPICS_KEY)?;

                topics.remove(id);
                subtopics.retain(|_, subtopic| subtopic.topic_id != id);

                self.write_collection(TOPICS_KEY, &topics)?;
                self.write_collection(SUBTOPICS_KEY, &subtopics)?;
            }
            EntityKind::Subtopic => {
                let mut subtopics: BTreeMap<String, Subtopic> =
                    self.read_collection(SUBTOPICS_KEY)?;
                subtopics.remove(id);
                self.write_collection(SUBTOPICS_KEY, &subtopics)?;
            }
        }
        debug!(
            "event=local_delete module=local status=ok kind={} id={id}",
            kind.as_str()
        );
        Ok(())
    }

    /// Reads settings, falling back to defaults when absent or unreadable.
    pub fn load_settings(&self) -> Settings {
        match self.storage.get_item(SETTINGS_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!(
                    "event=local_read module=local status=error key={SETTINGS_KEY} error_code=corrupt_json error={err}"
                );
                Settings::default()
            }),
            Ok(None) => Settings::default(),
            Err(err) => {
                warn!(
                    "event=local_read module=local status=error key={SETTINGS_KEY} error_code=storage_unavailable error={err}"
                );
                Settings::default()
            }
        }
    }

    pub fn save_settings(&self, settings: &Settings) -> LocalResult<()> {
        let raw = serde_json::to_string(settings)?;
        self.storage.set_item(SETTINGS_KEY, &raw)
    }

    fn upsert<T>(&self, key: &str, id: &str, record: &T) -> LocalResult<()>
    where
        T: Serialize + DeserializeOwned + Clone,
    {
        let mut collection: BTreeMap<String, T> = self.read_collection(key)?;
        collection.insert(id.to_string(), record.clone());
        self.write_collection(key, &collection)
    }

    fn read_or_empty<T: DeserializeOwned>(&self, key: &str) -> BTreeMap<String, T> {
        self.read_collection(key).unwrap_or_else(|err| {
            warn!(
                "event=local_read module=local status=error key={key} error_code=storage_unavailable error={err}"
            );
            BTreeMap::new()
        })
    }

    /// Storage failures propagate; corrupt JSON is logged and read as empty.
    fn read_collection<T: DeserializeOwned>(&self, key: &str) -> LocalResult<BTreeMap<String, T>> {
        let Some(raw) = self.storage.get_item(key)? else {
            return Ok(BTreeMap::new());
        };
        match serde_json::from_str(&raw) {
            Ok(collection) => Ok(collection),
            Err(err) => {
                warn!(
                    "event=local_read module=local status=error key={key} error_code=corrupt_json error={err}"
                );
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_collection<T: Serialize>(
        &self,
        key: &str,
        collection: &BTreeMap<String, T>,
    ) -> LocalResult<()> {
        let raw = serde_json::to_string(collection)?;
        self.storage.set_item(key, &raw)
    }
}

fn raw_is_empty_collection(raw: &str) -> bool {
    match serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(raw) {
        Ok(map) => map.is_empty(),
        Err(_) => true,
    }
}
