mod support;

use learnit_core::{export_selection, export_subject, export_subtopic, export_topic, TreeStore};
use support::memory_local_store;

fn sample_store() -> (TreeStore, String, String, String) {
    let mut store = TreeStore::new(memory_local_store());
    store.hydrate().unwrap();
    let math = store.add_subject("Math", None).unwrap().into_value().unwrap();
    let algebra = store
        .add_topic(&math.id, "Algebra", None)
        .unwrap()
        .into_value()
        .unwrap();
    let linear = store
        .add_subtopic(&algebra.id, "Linear Equations", None)
        .unwrap()
        .into_value()
        .unwrap();
    let quadratic = store
        .add_subtopic(&algebra.id, "Quadratics", None)
        .unwrap()
        .into_value()
        .unwrap();
    store
        .update_subtopic_content(&linear.id, "<p>Solve <strong>x</strong>.</p>")
        .unwrap();
    store
        .update_subtopic_content(&quadratic.id, "<ul><li>roots</li></ul>")
        .unwrap();
    store
        .reorder_subtopics(&algebra.id, vec![quadratic.id.clone(), linear.id.clone()])
        .unwrap();
    (store, math.id, algebra.id, linear.id)
}

#[test]
fn subtopic_export_is_named_after_its_path() {
    let (store, _, _, linear_id) = sample_store();
    let export = export_subtopic(store.tree(), &linear_id).unwrap();
    assert_eq!(export.file_name, "math-algebra-linear-equations.md");
    assert_eq!(export.body, "Solve **x**.");
}

#[test]
fn subject_export_follows_display_order() {
    let (store, math_id, _, _) = sample_store();
    let export = export_subject(store.tree(), &math_id).unwrap();
    assert_eq!(export.file_name, "math.md");
    assert_eq!(
        export.body,
        "# Math\n\n## Algebra\n\n### Quadratics\n\n- roots\n\n### Linear Equations\n\nSolve **x**."
    );
}

#[test]
fn topic_export_includes_topic_content_first() {
    let (mut store, _, algebra_id, _) = sample_store();
    store
        .update_topic_content(&algebra_id, "<h2>Overview</h2>")
        .unwrap();
    let export = export_topic(store.tree(), &algebra_id).unwrap();
    assert_eq!(export.file_name, "math-algebra.md");
    assert!(export.body.starts_with("# Algebra\n\n## Overview\n\n## Quadratics"));
}

#[test]
fn selection_export_prefers_subtopic_then_subject() {
    let (mut store, math_id, _, linear_id) = sample_store();
    store.set_current_subtopic(Some(&linear_id));
    assert_eq!(
        export_selection(store.tree()).unwrap().file_name,
        "math-algebra-linear-equations.md"
    );

    store.set_current_subject(Some(&math_id));
    assert_eq!(export_selection(store.tree()).unwrap().file_name, "math.md");

    store.set_current_subject(None);
    assert!(export_selection(store.tree()).is_none());
    assert!(export_subtopic(store.tree(), "ghost").is_none());
}
