//! Storage strategies behind the tree store.
//!
//! Both strategies receive records already shaped by the tree store: adds get
//! a draft plus the parent as it looks after the append, deletes get the
//! parent as it looks after the strip. The local strategy persists those
//! shapes as given. The remote strategy re-derives order data on the server
//! side and returns the canonical record for adds.

use crate::local::store::LocalStore;
use crate::model::entity::{EntityKind, Subject, Subtopic, Topic};
use crate::model::settings::Settings;
use crate::model::tree::TreeSnapshot;
use crate::remote::client::RemoteClient;
use crate::remote::document::DocumentStore;
use crate::store::StoreResult;

/// Which persistence path a backend writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Remote,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

/// One persistence strategy for the content tree.
pub trait TreeBackend {
    fn kind(&self) -> BackendKind;

    /// Loads the three collections.
    fn load(&self) -> StoreResult<TreeSnapshot>;

    /// Persists a new subject and returns the canonical record.
    fn add_subject(&self, draft: &Subject) -> StoreResult<Subject>;
    fn update_subject(&self, subject: &Subject) -> StoreResult<()>;
    fn reorder_topics(&self, subject: &Subject) -> StoreResult<()>;
    /// Removes a subject and everything under it.
    fn delete_subject(&self, subject_id: &str) -> StoreResult<()>;

    fn add_topic(&self, parent: &Subject, draft: &Topic) -> StoreResult<Topic>;
    fn update_topic(&self, topic: &Topic) -> StoreResult<()>;
    fn update_topic_content(&self, topic: &Topic) -> StoreResult<()>;
    fn reorder_subtopics(&self, topic: &Topic) -> StoreResult<()>;
    fn delete_topic(&self, topic: &Topic, parent: Option<&Subject>) -> StoreResult<()>;

    fn add_subtopic(&self, subject_id: &str, parent: &Topic, draft: &Subtopic)
        -> StoreResult<Subtopic>;
    fn update_subtopic(&self, subject_id: &str, subtopic: &Subtopic) -> StoreResult<()>;
    fn update_subtopic_content(&self, subject_id: &str, subtopic: &Subtopic) -> StoreResult<()>;
    fn update_subtopic_progress(&self, subject_id: &str, subtopic: &Subtopic) -> StoreResult<()>;
    fn update_subtopic_notes(&self, subject_id: &str, subtopic: &Subtopic) -> StoreResult<()>;
    fn delete_subtopic(
        &self,
        subject_id: &str,
        subtopic: &Subtopic,
        parent: Option<&Topic>,
    ) -> StoreResult<()>;

    /// Per-user preferences held by this backend, if it keeps any.
    fn load_preferences(&self, _user_id: &str) -> StoreResult<Option<Settings>> {
        Ok(None)
    }
}

/// Strategy writing through [`LocalStore`].
pub struct LocalBackend {
    store: LocalStore,
}

impl LocalBackend {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    pub fn local_store(&self) -> &LocalStore {
        &self.store
    }
}

impl TreeBackend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn load(&self) -> StoreResult<TreeSnapshot> {
        Ok(self.store.load())
    }

    fn add_subject(&self, draft: &Subject) -> StoreResult<Subject> {
        self.store.save_subject(draft)?;
        Ok(draft.clone())
    }

    fn update_subject(&self, subject: &Subject) -> StoreResult<()> {
        Ok(self.store.save_subject(subject)?)
    }

    fn reorder_topics(&self, subject: &Subject) -> StoreResult<()> {
        Ok(self.store.save_subject(subject)?)
    }

    fn delete_subject(&self, subject_id: &str) -> StoreResult<()> {
        Ok(self.store.delete_cascade(EntityKind::Subject, subject_id)?)
    }

    fn add_topic(&self, parent: &Subject, draft: &Topic) -> StoreResult<Topic> {
        self.store.save_topic(draft)?;
        self.store.save_subject(parent)?;
        Ok(draft.clone())
    }

    fn update_topic(&self, topic: &Topic) -> StoreResult<()> {
        Ok(self.store.save_topic(topic)?)
    }

    fn update_topic_content(&self, topic: &Topic) -> StoreResult<()> {
        Ok(self.store.save_topic(topic)?)
    }

    fn reorder_subtopics(&self, topic: &Topic) -> StoreResult<()> {
        Ok(self.store.save_topic(topic)?)
    }

    fn delete_topic(&self, topic: &Topic, parent: Option<&Subject>) -> StoreResult<()> {
        self.store.delete_cascade(EntityKind::Topic, &topic.id)?;
        if let Some(parent) = parent {
            self.store.save_subject(parent)?;
        }
        Ok(())
    }

    fn add_subtopic(
        &self,
        _subject_id: &str,
        parent: &Topic,
        draft: &Subtopic,
    ) -> StoreResult<Subtopic> {
        self.store.save_subtopic(draft)?;
        self.store.save_topic(parent)?;
        Ok(draft.clone())
    }

    fn update_subtopic(&self, _subject_id: &str, subtopic: &Subtopic) -> StoreResult<()> {
        Ok(self.store.save_subtopic(subtopic)?)
    }

    fn update_subtopic_content(&self, _subject_id: &str, subtopic: &Subtopic) -> StoreResult<()> {
        Ok(self.store.save_subtopic(subtopic)?)
    }

    fn update_subtopic_progress(&self, _subject_id: &str, subtopic: &Subtopic) -> StoreResult<()> {
        Ok(self.store.save_subtopic(subtopic)?)
    }

    fn update_subtopic_notes(&self, _subject_id: &str, subtopic: &Subtopic) -> StoreResult<()> {
        Ok(self.store.save_subtopic(subtopic)?)
    }

    fn delete_subtopic(
        &self,
        _subject_id: &str,
        subtopic: &Subtopic,
        parent: Option<&Topic>,
    ) -> StoreResult<()> {
        self.store
            .delete_cascade(EntityKind::Subtopic, &subtopic.id)?;
        if let Some(parent) = parent {
            self.store.save_topic(parent)?;
        }
        Ok(())
    }
}

/// Strategy writing through [`RemoteClient`].
///
/// Parent records passed in are ignored; the client maintains order arrays
/// on the remote parent documents itself.
pub struct RemoteBackend<D: DocumentStore> {
    client: RemoteClient<D>,
}

impl<D: DocumentStore> RemoteBackend<D> {
    pub fn new(client: RemoteClient<D>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RemoteClient<D> {
        &self.client
    }
}

impl<D: DocumentStore> TreeBackend for RemoteBackend<D> {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    fn load(&self) -> StoreResult<TreeSnapshot> {
        Ok(self.client.fetch_all()?)
    }

    fn add_subject(&self, draft: &Subject) -> StoreResult<Subject> {
        Ok(self
            .client
            .add_subject(&draft.title, draft.description.as_deref())?)
    }

    fn update_subject(&self, subject: &Subject) -> StoreResult<()> {
        Ok(self.client.update_subject(subject)?)
    }

    fn reorder_topics(&self, subject: &Subject) -> StoreResult<()> {
        Ok(self.client.reorder_topics(subject)?)
    }

    fn delete_subject(&self, subject_id: &str) -> StoreResult<()> {
        Ok(self.client.delete_subject(subject_id)?)
    }

    fn add_topic(&self, parent: &Subject, draft: &Topic) -> StoreResult<Topic> {
        Ok(self
            .client
            .add_topic(&parent.id, &draft.title, draft.description.as_deref())?)
    }

    fn update_topic(&self, topic: &Topic) -> StoreResult<()> {
        Ok(self.client.update_topic(topic)?)
    }

    fn update_topic_content(&self, topic: &Topic) -> StoreResult<()> {
        Ok(self.client.update_topic_content(topic)?)
    }

    fn reorder_subtopics(&self, topic: &Topic) -> StoreResult<()> {
        Ok(self.client.reorder_subtopics(topic)?)
    }

    fn delete_topic(&self, topic: &Topic, _parent: Option<&Subject>) -> StoreResult<()> {
        Ok(self.client.delete_topic(&topic.subject_id, &topic.id)?)
    }

    fn add_subtopic(
        &self,
        subject_id: &str,
        parent: &Topic,
        draft: &Subtopic,
    ) -> StoreResult<Subtopic> {
        Ok(self.client.add_subtopic(
            subject_id,
            &parent.id,
            &draft.title,
            draft.description.as_deref(),
        )?)
    }

    fn update_subtopic(&self, subject_id: &str, subtopic: &Subtopic) -> StoreResult<()> {
        Ok(self.client.update_subtopic(subject_id, subtopic)?)
    }

    fn update_subtopic_content(&self, subject_id: &str, subtopic: &Subtopic) -> StoreResult<()> {
        Ok(self.client.update_subtopic_content(subject_id, subtopic)?)
    }

    fn update_subtopic_progress(&self, subject_id: &str, subtopic: &Subtopic) -> StoreResult<()> {
        Ok(self.client.update_subtopic_progress(subject_id, subtopic)?)
    }

    fn update_subtopic_notes(&self, subject_id: &str, subtopic: &Subtopic) -> StoreResult<()> {
        Ok(self.client.update_subtopic_notes(subject_id, subtopic)?)
    }

    fn delete_subtopic(
        &self,
        subject_id: &str,
        subtopic: &Subtopic,
        _parent: Option<&Topic>,
    ) -> StoreResult<()> {
        Ok(self
            .client
            .delete_subtopic(subject_id, &subtopic.topic_id, &subtopic.id)?)
    }

    fn load_preferences(&self, user_id: &str) -> StoreResult<Option<Settings>> {
        Ok(Some(self.client.fetch_preferences(user_id)?))
    }
}
