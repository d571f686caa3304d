mod support;

use learnit_core::model::defaults::{WELCOME_SUBJECT_ID, WELCOME_SUBTOPIC_ID, WELCOME_TOPIC_ID};
use learnit_core::remote::document::{DocumentStore, USERS_COLLECTION};
use learnit_core::{
    Capability, InitState, LocalStore, Settings, StoreInitializer, Theme, TreeStore,
};
use serde_json::json;
use support::{store_with_remote, UnavailableStorage};

#[test]
fn first_run_seeds_default_content_and_selects_it() {
    let (mut store, _docs) = store_with_remote();
    let mut init = StoreInitializer::new();

    let state = init.apply(&mut store, Capability::local_only());
    assert_eq!(state, InitState::LocalHydrated);

    let persisted = store.local_store().load();
    assert_eq!(
        persisted.subjects.keys().collect::<Vec<_>>(),
        vec![WELCOME_SUBJECT_ID]
    );
    assert_eq!(
        persisted.topics.keys().collect::<Vec<_>>(),
        vec![WELCOME_TOPIC_ID]
    );
    assert_eq!(
        persisted.subtopics.keys().collect::<Vec<_>>(),
        vec![WELCOME_SUBTOPIC_ID]
    );

    let selection = store.selection();
    assert_eq!(selection.current_subject_id.as_deref(), Some(WELCOME_SUBJECT_ID));
    assert_eq!(selection.current_topic_id.as_deref(), Some(WELCOME_TOPIC_ID));
    assert_eq!(
        selection.current_subtopic_id.as_deref(),
        Some(WELCOME_SUBTOPIC_ID)
    );
    assert!(!store
        .subtopic(WELCOME_SUBTOPIC_ID)
        .unwrap()
        .content
        .is_empty());
}

#[test]
fn existing_local_data_is_not_reseeded() {
    let (mut store, _docs) = store_with_remote();
    store.hydrate().unwrap();
    let math = store
        .add_subject("Math", None)
        .unwrap()
        .into_value()
        .unwrap();
    store.set_current_subject(None);

    let mut init = StoreInitializer::new();
    init.apply(&mut store, Capability::local_only());

    let persisted = store.local_store().load();
    assert_eq!(persisted.subjects.keys().collect::<Vec<_>>(), vec![&math.id]);
    assert_eq!(store.selection().current_subject_id, None);
}

#[test]
fn unavailable_local_storage_still_renders_default_content() {
    let mut store = TreeStore::new(LocalStore::new(Box::new(UnavailableStorage)));
    let mut init = StoreInitializer::new();

    init.apply(&mut store, Capability::local_only());

    assert!(store.subtopic(WELCOME_SUBTOPIC_ID).is_some());
    assert_eq!(
        store.selection().current_subtopic_id.as_deref(),
        Some(WELCOME_SUBTOPIC_ID)
    );
}

#[test]
fn remote_capability_switches_mode_and_loads_once() {
    let (mut store, docs) = store_with_remote();
    let math = docs.client().add_subject("Math", None).unwrap();
    let mut init = StoreInitializer::new();
    let calls_before = docs.calls();

    init.apply(&mut store, Capability::local_only());
    assert!(!store.use_remote());
    assert_eq!(docs.calls(), calls_before);

    let state = init.apply(&mut store, Capability::remote("u1"));
    assert_eq!(state, InitState::RemoteHydrated);
    assert!(store.use_remote());
    assert!(init.remote_loaded());
    assert_eq!(
        store.subjects_in_order().iter().map(|s| s.id.as_str()).collect::<Vec<_>>(),
        vec![math.id.as_str()]
    );
    assert_eq!(store.selection().current_subtopic_id, None);

    let calls_after_load = docs.calls();
    let state = init.apply(&mut store, Capability::remote("u1"));
    assert_eq!(state, InitState::RemoteHydrated);
    assert_eq!(docs.calls(), calls_after_load);
}

#[test]
fn failed_remote_load_stays_local_hydrated_and_retries() {
    let (mut store, docs) = store_with_remote();
    let mut init = StoreInitializer::new();
    init.apply(&mut store, Capability::local_only());

    docs.set_offline(true);
    let state = init.apply(&mut store, Capability::remote("u1"));
    assert_eq!(state, InitState::LocalHydrated);
    assert!(store.use_remote());
    assert!(!init.remote_loaded());
    assert!(store.subtopic(WELCOME_SUBTOPIC_ID).is_some());

    docs.set_offline(false);
    let state = init.apply(&mut store, Capability::remote("u1"));
    assert_eq!(state, InitState::RemoteHydrated);
    assert!(init.remote_loaded());
    assert!(store.subtopic(WELCOME_SUBTOPIC_ID).is_none());
}

#[test]
fn losing_the_capability_returns_to_local_data() {
    let (mut store, docs) = store_with_remote();
    docs.client().add_subject("Remote Only", None).unwrap();
    let mut init = StoreInitializer::new();

    init.apply(&mut store, Capability::remote("u1"));
    assert!(store.use_remote());
    assert!(store.subject(WELCOME_SUBJECT_ID).is_none());

    let mut signed_out = Capability::remote("u1");
    signed_out.is_authenticated = false;
    let state = init.apply(&mut store, signed_out);
    assert_eq!(state, InitState::LocalHydrated);
    assert!(!store.use_remote());
    assert!(!init.remote_loaded());
    assert!(store.subject(WELCOME_SUBJECT_ID).is_some());

    let state = init.apply(&mut store, Capability::remote("u1"));
    assert_eq!(state, InitState::RemoteHydrated);
    assert!(store.subject(WELCOME_SUBJECT_ID).is_none());
}

#[test]
fn unauthorized_role_keeps_local_mode() {
    let (mut store, docs) = store_with_remote();
    let mut init = StoreInitializer::new();
    let mut signal = Capability::remote("u1");
    signal.is_authorized_role = false;

    let state = init.apply(&mut store, signal);
    assert_eq!(state, InitState::LocalHydrated);
    assert!(!store.use_remote());
    assert_eq!(docs.calls(), 0);
}

#[test]
fn remote_preferences_are_mirrored_into_local_settings() {
    let (mut store, docs) = store_with_remote();
    let user_id = docs
        .add(
            USERS_COLLECTION,
            json!({"preferences": {"theme": "warm"}})
                .as_object()
                .cloned()
                .unwrap(),
        )
        .unwrap();
    let mut init = StoreInitializer::new();

    init.apply(&mut store, Capability::remote(user_id));

    let settings = store.local_store().load_settings();
    assert_eq!(settings.theme, Theme::Warm);
    assert_eq!(settings.font_size, Settings::default().font_size);
}
