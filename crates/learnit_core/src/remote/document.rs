//! Document database seam and SQLite implementation.
//!
//! Collections are addressed by slash-separated paths; nested collections
//! live under their parent document (`subjects/{sid}/topics`).

use crate::db::{open_db, open_db_in_memory};
use crate::remote::{RemoteError, RemoteResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::path::Path;
use uuid::Uuid;

/// JSON field map of one document.
pub type Fields = Map<String, Value>;

pub const SUBJECTS_COLLECTION: &str = "subjects";
pub const USERS_COLLECTION: &str = "users";

/// Field carrying the sibling sort key on child documents.
pub const ORDER_FIELD: &str = "order";

pub fn topics_collection(subject_id: &str) -> String {
    format!("{SUBJECTS_COLLECTION}/{subject_id}/topics")
}

pub fn subtopics_collection(subject_id: &str, topic_id: &str) -> String {
    format!("{SUBJECTS_COLLECTION}/{subject_id}/topics/{topic_id}/subtopics")
}

/// One stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    /// Numeric `order` field, `0` when absent or not numeric.
    pub fn order(&self) -> i64 {
        self.fields
            .get(ORDER_FIELD)
            .and_then(|value| value.as_i64().or_else(|| value.as_f64().map(|f| f as i64)))
            .unwrap_or(0)
    }
}

/// Opaque CRUD API of the remote document database.
pub trait DocumentStore {
    /// Lists a collection ordered by `order` ascending, then id.
    fn list(&self, collection: &str) -> RemoteResult<Vec<Document>>;
    /// Loads one document.
    fn get(&self, collection: &str, id: &str) -> RemoteResult<Option<Document>>;
    /// Creates a document and returns its store-assigned id.
    fn add(&self, collection: &str, fields: Fields) -> RemoteResult<String>;
    /// Merges `fields` into an existing document.
    ///
    /// # Errors
    /// - `RemoteError::NotFound` when the document does not exist.
    fn update(&self, collection: &str, id: &str, fields: Fields) -> RemoteResult<()>;
    /// Deletes one document. Deleting an absent document succeeds.
    fn delete(&self, collection: &str, id: &str) -> RemoteResult<()>;
}

/// Document store over the `documents` table.
pub struct SqliteDocumentStore {
    conn: Connection,
}

impl SqliteDocumentStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open(path: impl AsRef<Path>) -> RemoteResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> RemoteResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    fn write_body(&self, collection: &str, id: &str, fields: &Fields) -> RemoteResult<()> {
        let body = serde_json::to_string(fields).map_err(|err| RemoteError::InvalidDocument {
            collection: collection.to_string(),
            id: id.to_string(),
            reason: err.to_string(),
        })?;
        self.conn.execute(
            "INSERT INTO documents (collection, doc_id, body) VALUES (?1, ?2, ?3)
             ON CONFLICT(collection, doc_id) DO UPDATE SET body = excluded.body;",
            params![collection, id, body],
        )?;
        Ok(())
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn list(&self, collection: &str) -> RemoteResult<Vec<Document>> {
        let mut stmt = self
            .conn
            .prepare("SELECT doc_id, body FROM documents WHERE collection = ?1;")?;
        let mut rows = stmt.query([collection])?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            let body: String = row.get(1)?;
            documents.push(parse_document(collection, id, &body)?);
        }
        documents.sort_by(|a, b| (a.order(), a.id.as_str()).cmp(&(b.order(), b.id.as_str())));
        Ok(documents)
    }

    fn get(&self, collection: &str, id: &str) -> RemoteResult<Option<Document>> {
        let body = self
            .conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND doc_id = ?2;",
                params![collection, id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        body.map(|body| parse_document(collection, id.to_string(), &body))
            .transpose()
    }

    fn add(&self, collection: &str, fields: Fields) -> RemoteResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        self.write_body(collection, &id, &fields)?;
        Ok(id)
    }

    fn update(&self, collection: &str, id: &str, fields: Fields) -> RemoteResult<()> {
        let mut document = self
            .get(collection, id)?
            .ok_or_else(|| RemoteError::not_found(collection, id))?;
        document.fields.extend(fields);
        self.write_body(collection, id, &document.fields)
    }

    fn delete(&self, collection: &str, id: &str) -> RemoteResult<()> {
        self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2;",
            params![collection, id],
        )?;
        Ok(())
    }
}

fn parse_document(collection: &str, id: String, body: &str) -> RemoteResult<Document> {
    match serde_json::from_str::<Fields>(body) {
        Ok(fields) => Ok(Document { id, fields }),
        Err(err) => Err(RemoteError::InvalidDocument {
            collection: collection.to_string(),
            id,
            reason: err.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{subtopics_collection, topics_collection, DocumentStore, Fields, SqliteDocumentStore};
    use crate::remote::RemoteError;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().expect("test fields must be an object")
    }

    #[test]
    fn nested_collection_paths() {
        assert_eq!(topics_collection("s1"), "subjects/s1/topics");
        assert_eq!(
            subtopics_collection("s1", "t1"),
            "subjects/s1/topics/t1/subtopics"
        );
    }

    #[test]
    fn list_orders_by_order_field() {
        let store = SqliteDocumentStore::open_in_memory().expect("document store should open");
        let late = store
            .add("things", fields(json!({"title": "late", "order": 5})))
            .expect("add late");
        let early = store
            .add("things", fields(json!({"title": "early", "order": 1})))
            .expect("add early");

        let listed = store.list("things").expect("list should work");
        let ids: Vec<&str> = listed.iter().map(|doc| doc.id.as_str()).collect();
        assert_eq!(ids, vec![early.as_str(), late.as_str()]);
        assert!(store.list("other").expect("empty list").is_empty());
    }

    #[test]
    fn update_merges_and_rejects_missing() {
        let store = SqliteDocumentStore::open_in_memory().expect("document store should open");
        let id = store
            .add("things", fields(json!({"title": "a", "order": 0})))
            .expect("add");
        store
            .update("things", &id, fields(json!({"title": "b"})))
            .expect("update should merge");
        let doc = store.get("things", &id).expect("get").expect("doc exists");
        assert_eq!(doc.fields["title"], "b");
        assert_eq!(doc.order(), 0);

        let err = store
            .update("things", "missing", fields(json!({"title": "c"})))
            .expect_err("missing document must fail");
        assert!(matches!(err, RemoteError::NotFound { .. }));

        store.delete("things", &id).expect("delete");
        store.delete("things", &id).expect("second delete succeeds");
        assert!(store.get("things", &id).expect("get").is_none());
    }
}
