//! Content tree store.
//!
//! # Responsibility
//! - Own the in-memory [`ContentTree`] and the selection cursor.
//! - Route each mutation to the active [`TreeBackend`] and apply the result
//!   to memory according to the backend kind.
//!
//! # Invariants
//! - Local mode: memory is updated even when the local write fails.
//! - Remote mode: memory is updated only after the remote call succeeds, with
//!   the record the remote returned.
//! - Adding a child appends its id to the parent's order array and selects
//!   the new node with its full ancestor chain.
//! - Deleting a node removes every descendant, strips the id from the parent
//!   order array and clears selection pointers to removed ids.

use crate::local::store::LocalStore;
use crate::model::entity::{
    new_local_id, next_order, now_epoch_ms, Subject, Subtopic, SubtopicStatus, Topic,
};
use crate::model::settings::Settings;
use crate::model::tree::{ContentTree, ReconcileReport, Removed, Selection, TreeSnapshot};
use crate::store::backend::{BackendKind, LocalBackend, TreeBackend};
use crate::store::{Outcome, StoreError, StoreResult};
use log::{debug, error, info, warn};
use std::time::Instant;

/// Authoritative content tree plus its persistence strategies.
pub struct TreeStore {
    tree: ContentTree,
    local: LocalBackend,
    remote: Option<Box<dyn TreeBackend>>,
    use_remote: bool,
}

impl TreeStore {
    /// Creates an empty, local-mode store. Call [`TreeStore::hydrate`] to load.
    pub fn new(local: LocalStore) -> Self {
        Self {
            tree: ContentTree::default(),
            local: LocalBackend::new(local),
            remote: None,
            use_remote: false,
        }
    }

    pub fn with_remote(mut self, remote: Box<dyn TreeBackend>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn set_remote(&mut self, remote: Option<Box<dyn TreeBackend>>) {
        self.remote = remote;
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Switches which backend later mutations and `hydrate` use.
    ///
    /// Memory is not reloaded here.
    pub fn set_use_remote(&mut self, use_remote: bool) {
        if self.use_remote != use_remote {
            info!("event=store_mode module=store status=ok use_remote={use_remote}");
        }
        self.use_remote = use_remote;
    }

    pub fn use_remote(&self) -> bool {
        self.use_remote
    }

    pub fn active_kind(&self) -> BackendKind {
        if self.use_remote {
            BackendKind::Remote
        } else {
            BackendKind::Local
        }
    }

    pub fn local_store(&self) -> &LocalStore {
        self.local.local_store()
    }

    /// Loads all collections from the active backend.
    pub fn hydrate(&mut self) -> StoreResult<ReconcileReport> {
        self.hydrate_from(self.active_kind())
    }

    /// Loads all collections from one backend and replaces memory wholesale.
    ///
    /// Order arrays are reconciled against existing children before they are
    /// installed. On failure the prior in-memory state is left untouched.
    pub fn hydrate_from(&mut self, kind: BackendKind) -> StoreResult<ReconcileReport> {
        let started_at = Instant::now();
        let loaded = self.backend(kind).and_then(|backend| backend.load());
        let mut snapshot = match loaded {
            Ok(snapshot) => snapshot,
            Err(err) => {
                error!(
                    "event=store_hydrate module=store status=error backend={} error_code={} error={err}",
                    kind.as_str(),
                    err.code()
                );
                return Err(err);
            }
        };

        let report = snapshot.reconcile_orders();
        if !report.is_clean() {
            warn!(
                "event=store_reconcile module=store status=repaired backend={} dropped={} appended={}",
                kind.as_str(),
                report.dropped,
                report.appended
            );
        }
        info!(
            "event=store_hydrate module=store status=ok backend={} subjects={} topics={} subtopics={} duration_ms={}",
            kind.as_str(),
            snapshot.subjects.len(),
            snapshot.topics.len(),
            snapshot.subtopics.len(),
            started_at.elapsed().as_millis()
        );
        self.tree.replace_collections(snapshot);
        Ok(report)
    }

    /// Installs collections into memory without touching any backend.
    pub fn install(&mut self, mut snapshot: TreeSnapshot) {
        snapshot.reconcile_orders();
        self.tree.replace_collections(snapshot);
    }

    /// Reads per-user preferences from the remote backend, if one is configured.
    pub fn remote_preferences(&self, user_id: &str) -> StoreResult<Option<Settings>> {
        match self.remote.as_deref() {
            Some(remote) => remote.load_preferences(user_id),
            None => Ok(None),
        }
    }

    pub fn tree(&self) -> &ContentTree {
        &self.tree
    }

    pub fn selection(&self) -> &Selection {
        &self.tree.selection
    }

    pub fn subject(&self, id: &str) -> Option<&Subject> {
        self.tree.subjects.get(id)
    }

    pub fn topic(&self, id: &str) -> Option<&Topic> {
        self.tree.topics.get(id)
    }

    pub fn subtopic(&self, id: &str) -> Option<&Subtopic> {
        self.tree.subtopics.get(id)
    }

    pub fn subjects_in_order(&self) -> Vec<&Subject> {
        self.tree.subjects_in_order()
    }

    pub fn topics_of(&self, subject_id: &str) -> Vec<&Topic> {
        self.tree.topics_of(subject_id)
    }

    pub fn subtopics_of(&self, topic_id: &str) -> Vec<&Subtopic> {
        self.tree.subtopics_of(topic_id)
    }

    /// Selects a subject and clears topic and subtopic selection.
    pub fn set_current_subject(&mut self, id: Option<&str>) {
        self.tree.selection.select_subject(id.map(str::to_string));
    }

    /// Selects a topic and clears subtopic selection.
    pub fn set_current_topic(&mut self, id: Option<&str>) {
        self.tree.selection.select_topic(id.map(str::to_string));
    }

    pub fn set_current_subtopic(&mut self, id: Option<&str>) {
        self.tree.selection.select_subtopic(id.map(str::to_string));
    }

    /// Points the whole selection at one chain of ids.
    pub fn select_chain(
        &mut self,
        subject_id: Option<&str>,
        topic_id: Option<&str>,
        subtopic_id: Option<&str>,
    ) {
        self.tree.selection.select_chain(
            subject_id.map(str::to_string),
            topic_id.map(str::to_string),
            subtopic_id.map(str::to_string),
        );
    }

    pub fn add_subject(
        &mut self,
        title: &str,
        description: Option<&str>,
    ) -> StoreResult<Outcome<Subject>> {
        let title = normalize_title(title)?;
        let order = next_order(self.tree.subjects.values().map(|subject| subject.order));
        let draft = Subject::new(
            new_local_id(),
            title,
            normalize_description(description),
            order,
            now_epoch_ms(),
        );

        let outcome = match self.write("add_subject", &draft.id, |backend| {
            backend.add_subject(&draft)
        })? {
            Ok(subject) => Outcome::Saved(subject),
            Err(error) => Outcome::Unsaved {
                value: draft,
                error,
            },
        };
        if let Some(subject) = outcome.value() {
            self.tree
                .subjects
                .insert(subject.id.clone(), subject.clone());
            self.tree.selection.select_subject(Some(subject.id.clone()));
        }
        Ok(outcome)
    }

    pub fn update_subject(
        &mut self,
        id: &str,
        title: &str,
        description: Option<&str>,
    ) -> StoreResult<Outcome<Subject>> {
        let title = normalize_title(title)?;
        let description = normalize_description(description);
        self.patch_subject(
            "update_subject",
            id,
            |subject| {
                subject.title = title;
                subject.description = description;
            },
            |backend, subject| backend.update_subject(subject),
        )
    }

    /// Replaces a subject's topic order verbatim.
    pub fn reorder_topics(
        &mut self,
        subject_id: &str,
        topic_order: Vec<String>,
    ) -> StoreResult<Outcome<Subject>> {
        self.patch_subject(
            "reorder_topics",
            subject_id,
            |subject| subject.topic_order = topic_order,
            |backend, subject| backend.reorder_topics(subject),
        )
    }

    /// Deletes a subject with all of its topics and subtopics.
    ///
    /// Deleting an unknown id is a no-op returning `Outcome::Missing`.
    pub fn delete_subject(&mut self, id: &str) -> StoreResult<Outcome<Removed>> {
        if !self.tree.subjects.contains_key(id) {
            return Ok(self.missing("delete_subject", id));
        }
        let written = self.write("delete_subject", id, |backend| backend.delete_subject(id))?;
        let removed = self.tree.remove_subject(id);
        Ok(Outcome::settle(written, removed))
    }

    pub fn add_topic(
        &mut self,
        subject_id: &str,
        title: &str,
        description: Option<&str>,
    ) -> StoreResult<Outcome<Topic>> {
        let title = normalize_title(title)?;
        let Some(parent) = self.tree.subjects.get(subject_id).cloned() else {
            return Ok(self.missing("add_topic", subject_id));
        };
        let now = now_epoch_ms();
        let order = next_order(
            self.tree
                .topics
                .values()
                .filter(|topic| topic.subject_id == subject_id)
                .map(|topic| topic.order),
        );
        let draft = Topic::new(
            new_local_id(),
            subject_id,
            title,
            normalize_description(description),
            order,
            now,
        );
        let mut parent_after = parent;
        parent_after.push_topic(&draft.id);
        parent_after.touch(now);

        let outcome = match self.write("add_topic", &draft.id, |backend| {
            backend.add_topic(&parent_after, &draft)
        })? {
            Ok(topic) => Outcome::Saved(topic),
            Err(error) => Outcome::Unsaved {
                value: draft,
                error,
            },
        };
        if let Some(topic) = outcome.value() {
            if let Some(parent) = self.tree.subjects.get_mut(subject_id) {
                parent.push_topic(&topic.id);
                parent.touch(now);
            }
            self.tree.topics.insert(topic.id.clone(), topic.clone());
            self.tree.selection.select_chain(
                Some(subject_id.to_string()),
                Some(topic.id.clone()),
                None,
            );
        }
        Ok(outcome)
    }

    pub fn update_topic(
        &mut self,
        id: &str,
        title: &str,
        description: Option<&str>,
    ) -> StoreResult<Outcome<Topic>> {
        let title = normalize_title(title)?;
        let description = normalize_description(description);
        self.patch_topic(
            "update_topic",
            id,
            |topic| {
                topic.title = title;
                topic.description = description;
            },
            |backend, topic| backend.update_topic(topic),
        )
    }

    /// Replaces a topic's rich-text body.
    pub fn update_topic_content(&mut self, id: &str, content: &str) -> StoreResult<Outcome<Topic>> {
        self.patch_topic(
            "update_topic_content",
            id,
            |topic| topic.content = Some(content.to_string()),
            |backend, topic| backend.update_topic_content(topic),
        )
    }

    /// Replaces a topic's subtopic order verbatim.
    pub fn reorder_subtopics(
        &mut self,
        topic_id: &str,
        subtopic_order: Vec<String>,
    ) -> StoreResult<Outcome<Topic>> {
        self.patch_topic(
            "reorder_subtopics",
            topic_id,
            |topic| topic.subtopic_order = subtopic_order,
            |backend, topic| backend.reorder_subtopics(topic),
        )
    }

    pub fn delete_topic(&mut self, id: &str) -> StoreResult<Outcome<Removed>> {
        let Some(topic) = self.tree.topics.get(id).cloned() else {
            return Ok(self.missing("delete_topic", id));
        };
        let now = now_epoch_ms();
        let parent_after = self
            .tree
            .subjects
            .get(&topic.subject_id)
            .cloned()
            .map(|mut subject| {
                subject.remove_topic(id);
                subject.touch(now);
                subject
            });

        let written = self.write("delete_topic", id, |backend| {
            backend.delete_topic(&topic, parent_after.as_ref())
        })?;
        let removed = self.tree.remove_topic(id, now);
        Ok(Outcome::settle(written, removed))
    }

    pub fn add_subtopic(
        &mut self,
        topic_id: &str,
        title: &str,
        description: Option<&str>,
    ) -> StoreResult<Outcome<Subtopic>> {
        let title = normalize_title(title)?;
        let Some(parent) = self.tree.topics.get(topic_id).cloned() else {
            return Ok(self.missing("add_subtopic", topic_id));
        };
        let subject_id = parent.subject_id.clone();
        let now = now_epoch_ms();
        let order = next_order(
            self.tree
                .subtopics
                .values()
                .filter(|subtopic| subtopic.topic_id == topic_id)
                .map(|subtopic| subtopic.order),
        );
        let draft = Subtopic::new(
            new_local_id(),
            topic_id,
            title,
            normalize_description(description),
            order,
            now,
        );
        let mut parent_after = parent;
        parent_after.push_subtopic(&draft.id);
        parent_after.touch(now);

        let outcome = match self.write("add_subtopic", &draft.id, |backend| {
            backend.add_subtopic(&subject_id, &parent_after, &draft)
        })? {
            Ok(subtopic) => Outcome::Saved(subtopic),
            Err(error) => Outcome::Unsaved {
                value: draft,
                error,
            },
        };
        if let Some(subtopic) = outcome.value() {
            if let Some(parent) = self.tree.topics.get_mut(topic_id) {
                parent.push_subtopic(&subtopic.id);
                parent.touch(now);
            }
            self.tree
                .subtopics
                .insert(subtopic.id.clone(), subtopic.clone());
            self.tree.selection.select_chain(
                Some(subject_id),
                Some(topic_id.to_string()),
                Some(subtopic.id.clone()),
            );
        }
        Ok(outcome)
    }

    pub fn update_subtopic(
        &mut self,
        id: &str,
        title: &str,
        description: Option<&str>,
    ) -> StoreResult<Outcome<Subtopic>> {
        let title = normalize_title(title)?;
        let description = normalize_description(description);
        self.patch_subtopic(
            "update_subtopic",
            id,
            |subtopic| {
                subtopic.title = title;
                subtopic.description = description;
            },
            |backend, subject_id, subtopic| backend.update_subtopic(subject_id, subtopic),
        )
    }

    pub fn update_subtopic_content(
        &mut self,
        id: &str,
        content: &str,
    ) -> StoreResult<Outcome<Subtopic>> {
        self.patch_subtopic(
            "update_subtopic_content",
            id,
            |subtopic| subtopic.content = content.to_string(),
            |backend, subject_id, subtopic| backend.update_subtopic_content(subject_id, subtopic),
        )
    }

    /// Sets learning status and completion; the percentage is clamped to 100.
    pub fn update_subtopic_progress(
        &mut self,
        id: &str,
        status: SubtopicStatus,
        completion_percentage: u8,
    ) -> StoreResult<Outcome<Subtopic>> {
        self.patch_subtopic(
            "update_subtopic_progress",
            id,
            |subtopic| subtopic.set_progress(status, completion_percentage),
            |backend, subject_id, subtopic| backend.update_subtopic_progress(subject_id, subtopic),
        )
    }

    pub fn update_subtopic_notes(&mut self, id: &str, notes: &str) -> StoreResult<Outcome<Subtopic>> {
        self.patch_subtopic(
            "update_subtopic_notes",
            id,
            |subtopic| subtopic.notes = notes.to_string(),
            |backend, subject_id, subtopic| backend.update_subtopic_notes(subject_id, subtopic),
        )
    }

    pub fn delete_subtopic(&mut self, id: &str) -> StoreResult<Outcome<Removed>> {
        let Some(subtopic) = self.tree.subtopics.get(id).cloned() else {
            return Ok(self.missing("delete_subtopic", id));
        };
        let Some(parent) = self.tree.topics.get(&subtopic.topic_id).cloned() else {
            return Ok(self.missing("delete_subtopic", &subtopic.topic_id));
        };
        let now = now_epoch_ms();
        let subject_id = parent.subject_id.clone();
        let mut parent_after = parent;
        parent_after.remove_subtopic(id);
        parent_after.touch(now);

        let written = self.write("delete_subtopic", id, |backend| {
            backend.delete_subtopic(&subject_id, &subtopic, Some(&parent_after))
        })?;
        let removed = self.tree.remove_subtopic(id, now);
        Ok(Outcome::settle(written, removed))
    }

    fn patch_subject(
        &mut self,
        op: &'static str,
        id: &str,
        patch: impl FnOnce(&mut Subject),
        persist: impl FnOnce(&dyn TreeBackend, &Subject) -> StoreResult<()>,
    ) -> StoreResult<Outcome<Subject>> {
        let Some(mut next) = self.tree.subjects.get(id).cloned() else {
            return Ok(self.missing(op, id));
        };
        patch(&mut next);
        next.touch(now_epoch_ms());

        let written = self.write(op, id, |backend| persist(backend, &next))?;
        self.tree.subjects.insert(next.id.clone(), next.clone());
        Ok(Outcome::settle(written, next))
    }

    fn patch_topic(
        &mut self,
        op: &'static str,
        id: &str,
        patch: impl FnOnce(&mut Topic),
        persist: impl FnOnce(&dyn TreeBackend, &Topic) -> StoreResult<()>,
    ) -> StoreResult<Outcome<Topic>> {
        let Some(mut next) = self.tree.topics.get(id).cloned() else {
            return Ok(self.missing(op, id));
        };
        patch(&mut next);
        next.touch(now_epoch_ms());

        let written = self.write(op, id, |backend| persist(backend, &next))?;
        self.tree.topics.insert(next.id.clone(), next.clone());
        Ok(Outcome::settle(written, next))
    }

    /// Subtopic writes need the owning subject id for remote paths, so a
    /// subtopic whose topic is not in memory is treated as missing.
    fn patch_subtopic(
        &mut self,
        op: &'static str,
        id: &str,
        patch: impl FnOnce(&mut Subtopic),
        persist: impl FnOnce(&dyn TreeBackend, &str, &Subtopic) -> StoreResult<()>,
    ) -> StoreResult<Outcome<Subtopic>> {
        let Some(mut next) = self.tree.subtopics.get(id).cloned() else {
            return Ok(self.missing(op, id));
        };
        let Some(subject_id) = self
            .tree
            .topics
            .get(&next.topic_id)
            .map(|topic| topic.subject_id.clone())
        else {
            return Ok(self.missing(op, &next.topic_id));
        };
        patch(&mut next);
        next.touch(now_epoch_ms());

        let written = self.write(op, id, |backend| persist(backend, &subject_id, &next))?;
        self.tree.subtopics.insert(next.id.clone(), next.clone());
        Ok(Outcome::settle(written, next))
    }

    fn backend(&self, kind: BackendKind) -> StoreResult<&dyn TreeBackend> {
        match kind {
            BackendKind::Local => Ok(&self.local),
            BackendKind::Remote => self
                .remote
                .as_deref()
                .ok_or(StoreError::RemoteNotConfigured),
        }
    }

    /// Runs one write against the active backend.
    ///
    /// The outer result fails when the operation must not touch memory
    /// (remote failure or missing remote). The inner result carries a local
    /// write failure that memory still absorbs.
    fn write<T>(
        &self,
        op: &'static str,
        id: &str,
        run: impl FnOnce(&dyn TreeBackend) -> StoreResult<T>,
    ) -> StoreResult<Result<T, StoreError>> {
        let kind = self.active_kind();
        let backend = match self.backend(kind) {
            Ok(backend) => backend,
            Err(err) => {
                error!(
                    "event=store_write module=store status=error op={op} id={id} backend={} error_code={}",
                    kind.as_str(),
                    err.code()
                );
                return Err(err);
            }
        };

        match run(backend) {
            Ok(value) => {
                debug!(
                    "event=store_write module=store status=ok op={op} id={id} backend={}",
                    kind.as_str()
                );
                Ok(Ok(value))
            }
            Err(err) if kind == BackendKind::Local => {
                warn!(
                    "event=store_write module=store status=unsaved op={op} id={id} backend=local error_code={} error={err}",
                    err.code()
                );
                Ok(Err(err))
            }
            Err(err) => {
                error!(
                    "event=store_write module=store status=error op={op} id={id} backend=remote error_code={} error={err}",
                    err.code()
                );
                Err(err)
            }
        }
    }

    fn missing<T>(&self, op: &'static str, id: &str) -> Outcome<T> {
        debug!("event=store_write module=store status=skipped op={op} id={id} reason=missing");
        Outcome::Missing
    }
}

fn normalize_title(title: &str) -> StoreResult<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(StoreError::BlankTitle);
    }
    Ok(trimmed.to_string())
}

fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::{normalize_description, normalize_title, TreeStore};
    use crate::local::kv::SqliteKvStorage;
    use crate::local::store::LocalStore;
    use crate::store::backend::BackendKind;
    use crate::store::StoreError;

    fn store() -> TreeStore {
        TreeStore::new(LocalStore::new(Box::new(
            SqliteKvStorage::open_in_memory().expect("in-memory storage should open"),
        )))
    }

    #[test]
    fn titles_are_trimmed_and_blank_titles_rejected() {
        assert_eq!(normalize_title("  Math ").expect("title is valid"), "Math");
        assert!(matches!(normalize_title(" \n"), Err(StoreError::BlankTitle)));
        assert_eq!(normalize_description(Some("  ")), None);
        assert_eq!(normalize_description(Some(" x ")), Some("x".to_string()));
    }

    #[test]
    fn remote_mode_without_backend_fails_without_touching_memory() {
        let mut store = store();
        store.set_use_remote(true);
        assert_eq!(store.active_kind(), BackendKind::Remote);

        let result = store.add_subject("Math", None);
        assert!(matches!(result, Err(StoreError::RemoteNotConfigured)));
        assert!(store.tree().subjects.is_empty());
        assert!(matches!(
            store.hydrate(),
            Err(StoreError::RemoteNotConfigured)
        ));
    }

    #[test]
    fn add_subject_selects_it_and_clears_lower_levels() {
        let mut store = store();
        store.select_chain(Some("old"), Some("t"), Some("st"));
        let subject = store
            .add_subject("Math", Some(""))
            .expect("local add should not hard-fail")
            .into_value()
            .expect("subject should be added");
        assert_eq!(subject.description, None);
        assert_eq!(
            store.selection().current_subject_id.as_deref(),
            Some(subject.id.as_str())
        );
        assert_eq!(store.selection().current_topic_id, None);
        assert_eq!(store.selection().current_subtopic_id, None);
    }
}
