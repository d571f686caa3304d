use learnit_core::remote::document::{
    subtopics_collection, topics_collection, SUBJECTS_COLLECTION, USERS_COLLECTION,
};
use learnit_core::{
    DocumentStore, FontSize, RemoteClient, RemoteError, Settings, SqliteDocumentStore, Theme,
};
use serde_json::json;

fn client() -> RemoteClient<SqliteDocumentStore> {
    RemoteClient::new(SqliteDocumentStore::open_in_memory().unwrap())
}

#[test]
fn adds_append_children_to_parent_order_arrays() {
    let client = client();
    let math = client.add_subject("Math", None).unwrap();
    let algebra = client.add_topic(&math.id, "Algebra", None).unwrap();
    let geometry = client.add_topic(&math.id, "Geometry", Some("shapes")).unwrap();
    let linear = client
        .add_subtopic(&math.id, &algebra.id, "Linear Equations", None)
        .unwrap();

    assert_eq!(algebra.order, 0);
    assert_eq!(geometry.order, 1);
    assert_eq!(geometry.content.as_deref(), Some(""));

    let snapshot = client.fetch_all().unwrap();
    assert_eq!(
        snapshot.subjects[&math.id].topic_order,
        vec![algebra.id.clone(), geometry.id.clone()]
    );
    assert_eq!(
        snapshot.topics[&algebra.id].subtopic_order,
        vec![linear.id.clone()]
    );
    assert_eq!(snapshot.topics[&geometry.id].subject_id, math.id);
    assert_eq!(snapshot.subtopics[&linear.id].topic_id, algebra.id);
}

#[test]
fn adding_under_a_missing_parent_is_rejected() {
    let client = client();
    let err = client.add_topic("ghost", "Algebra", None).unwrap_err();
    assert!(err.is_not_found());

    let math = client.add_subject("Math", None).unwrap();
    let err = client
        .add_subtopic(&math.id, "ghost", "Linear", None)
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(client
        .documents()
        .list(&subtopics_collection(&math.id, "ghost"))
        .unwrap()
        .is_empty());
}

#[test]
fn deleting_a_topic_strips_parent_order_and_removes_subtopics() {
    let client = client();
    let math = client.add_subject("Math", None).unwrap();
    let a = client.add_topic(&math.id, "A", None).unwrap();
    let b = client.add_topic(&math.id, "B", None).unwrap();
    client.add_subtopic(&math.id, &a.id, "A1", None).unwrap();
    client.add_subtopic(&math.id, &a.id, "A2", None).unwrap();

    client.delete_topic(&math.id, &a.id).unwrap();

    let snapshot = client.fetch_all().unwrap();
    assert_eq!(snapshot.subjects[&math.id].topic_order, vec![b.id.clone()]);
    assert!(snapshot.subtopics.is_empty());
    assert!(client
        .documents()
        .list(&subtopics_collection(&math.id, &a.id))
        .unwrap()
        .is_empty());
}

#[test]
fn deleting_a_subject_removes_nested_collections() {
    let client = client();
    let math = client.add_subject("Math", None).unwrap();
    let algebra = client.add_topic(&math.id, "Algebra", None).unwrap();
    client
        .add_subtopic(&math.id, &algebra.id, "Linear", None)
        .unwrap();
    let art = client.add_subject("Art", None).unwrap();

    client.delete_subject(&math.id).unwrap();
    client.delete_subject(&math.id).unwrap();

    let docs = client.documents();
    assert!(docs.list(&topics_collection(&math.id)).unwrap().is_empty());
    assert!(docs
        .list(&subtopics_collection(&math.id, &algebra.id))
        .unwrap()
        .is_empty());
    let subjects = docs.list(SUBJECTS_COLLECTION).unwrap();
    assert_eq!(subjects.len(), 1);
    assert_eq!(subjects[0].id, art.id);
}

#[test]
fn updating_a_missing_document_fails() {
    let client = client();
    let mut topic = learnit_core::Topic::new("ghost", "nowhere", "Ghost", None, 0, 1);
    topic.content = Some("<p>x</p>".to_string());
    let err = client.update_topic_content(&topic).unwrap_err();
    assert!(matches!(err, RemoteError::NotFound { .. }));
}

#[test]
fn malformed_documents_are_skipped_on_fetch() {
    let client = client();
    let math = client.add_subject("Math", None).unwrap();
    client
        .documents()
        .add(
            SUBJECTS_COLLECTION,
            json!({"title": 42}).as_object().cloned().unwrap(),
        )
        .unwrap();

    let subjects = client.fetch_subjects().unwrap();
    assert_eq!(subjects.keys().collect::<Vec<_>>(), vec![&math.id]);
}

#[test]
fn preferences_default_until_the_user_document_holds_them() {
    let client = client();
    assert_eq!(client.fetch_preferences("u1").unwrap(), Settings::default());

    let settings = Settings {
        theme: Theme::Dark,
        font_size: FontSize::Small,
        ..Settings::default()
    };
    assert_eq!(client.update_preferences("u1", &settings).unwrap(), None);

    client
        .documents()
        .add(USERS_COLLECTION, json!({}).as_object().cloned().unwrap())
        .unwrap();
    let user_id = client.documents().list(USERS_COLLECTION).unwrap()[0]
        .id
        .clone();
    assert_eq!(
        client.update_preferences(&user_id, &settings).unwrap(),
        Some(settings)
    );
    assert_eq!(client.fetch_preferences(&user_id).unwrap(), settings);
}
