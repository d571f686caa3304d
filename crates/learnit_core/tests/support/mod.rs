//! Test doubles shared by the store integration tests.

#![allow(dead_code)]

use learnit_core::remote::document::{Document, DocumentStore, Fields};
use learnit_core::{
    KvStorage, LocalError, LocalResult, LocalStore, RemoteBackend, RemoteClient, RemoteError,
    RemoteResult, SqliteDocumentStore, SqliteKvStorage, TreeStore,
};
use std::cell::Cell;
use std::rc::Rc;

/// Document store that counts calls and can be switched offline.
#[derive(Clone)]
pub struct SharedDocs {
    inner: Rc<SqliteDocumentStore>,
    calls: Rc<Cell<usize>>,
    offline: Rc<Cell<bool>>,
}

impl SharedDocs {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SqliteDocumentStore::open_in_memory().unwrap()),
            calls: Rc::new(Cell::new(0)),
            offline: Rc::new(Cell::new(false)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    pub fn client(&self) -> RemoteClient<SharedDocs> {
        RemoteClient::new(self.clone())
    }

    fn enter(&self) -> RemoteResult<()> {
        self.calls.set(self.calls.get() + 1);
        if self.offline.get() {
            return Err(RemoteError::Backend("offline".to_string()));
        }
        Ok(())
    }
}

impl DocumentStore for SharedDocs {
    fn list(&self, collection: &str) -> RemoteResult<Vec<Document>> {
        self.enter()?;
        self.inner.list(collection)
    }

    fn get(&self, collection: &str, id: &str) -> RemoteResult<Option<Document>> {
        self.enter()?;
        self.inner.get(collection, id)
    }

    fn add(&self, collection: &str, fields: Fields) -> RemoteResult<String> {
        self.enter()?;
        self.inner.add(collection, fields)
    }

    fn update(&self, collection: &str, id: &str, fields: Fields) -> RemoteResult<()> {
        self.enter()?;
        self.inner.update(collection, id, fields)
    }

    fn delete(&self, collection: &str, id: &str) -> RemoteResult<()> {
        self.enter()?;
        self.inner.delete(collection, id)
    }
}

/// Key-value storage that refuses every access.
pub struct UnavailableStorage;

impl KvStorage for UnavailableStorage {
    fn get_item(&self, _key: &str) -> LocalResult<Option<String>> {
        Err(LocalError::Unavailable("storage disabled".to_string()))
    }

    fn set_item(&self, _key: &str, _value: &str) -> LocalResult<()> {
        Err(LocalError::Unavailable("storage disabled".to_string()))
    }

    fn remove_item(&self, _key: &str) -> LocalResult<()> {
        Err(LocalError::Unavailable("storage disabled".to_string()))
    }
}

pub fn memory_local_store() -> LocalStore {
    LocalStore::new(Box::new(SqliteKvStorage::open_in_memory().unwrap()))
}

/// Local-mode store with a remote backend attached but not active.
pub fn store_with_remote() -> (TreeStore, SharedDocs) {
    let docs = SharedDocs::new();
    let store = TreeStore::new(memory_local_store())
        .with_remote(Box::new(RemoteBackend::new(docs.client())));
    (store, docs)
}
