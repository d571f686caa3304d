//! First-run onboarding content.
//!
//! Seeded into an empty local store so a fresh install always has something
//! to render.

use crate::model::entity::{Subject, Subtopic, Topic};
use crate::model::tree::TreeSnapshot;

pub const WELCOME_SUBJECT_ID: &str = "welcome";
pub const WELCOME_TOPIC_ID: &str = "getting_started";
pub const WELCOME_SUBTOPIC_ID: &str = "welcome_guide";

const WELCOME_GUIDE_HTML: &str = r#"<h1>Welcome to LearnIt!</h1>
<p>Your personal learning space for organizing and mastering development concepts.</p>
<h2>Quick Guide</h2>
<ul>
<li><strong>Organize</strong>: Create subjects, topics, and subtopics using the sidebar</li>
<li><strong>Write</strong>: Use the rich text editor to write your notes with formatting</li>
<li><strong>Navigate</strong>: Click items in the sidebar to move between your content</li>
<li><strong>Customize</strong>: Change themes and fonts in the settings menu</li>
<li><strong>Backup</strong>: Export your notes regularly from the settings menu</li>
</ul>
<h2>Structure</h2>
<ul>
<li><strong>Subjects</strong>: Main categories (e.g., "JavaScript", "React")</li>
<li><strong>Topics</strong>: Major areas within a subject</li>
<li><strong>Subtopics</strong>: Specific lessons or concepts</li>
</ul>
<p>Ready to start learning? Create your first subject using the "+" button in the sidebar!</p>"#;

/// Builds the onboarding tree: one subject, one topic, one subtopic.
pub fn default_content(now_ms: i64) -> TreeSnapshot {
    let mut subject = Subject::new(WELCOME_SUBJECT_ID, "Welcome", None, 0, now_ms);
    subject.push_topic(WELCOME_TOPIC_ID);

    let mut topic = Topic::new(
        WELCOME_TOPIC_ID,
        WELCOME_SUBJECT_ID,
        "Getting Started",
        None,
        0,
        now_ms,
    );
    topic.push_subtopic(WELCOME_SUBTOPIC_ID);

    let mut subtopic = Subtopic::new(
        WELCOME_SUBTOPIC_ID,
        WELCOME_TOPIC_ID,
        "Welcome to LearnIt",
        None,
        0,
        now_ms,
    );
    subtopic.content = WELCOME_GUIDE_HTML.to_string();

    let mut snapshot = TreeSnapshot::default();
    snapshot.subjects.insert(subject.id.clone(), subject);
    snapshot.topics.insert(topic.id.clone(), topic);
    snapshot.subtopics.insert(subtopic.id.clone(), subtopic);
    snapshot
}

#[cfg(test)]
mod tests {
    use super::{default_content, WELCOME_SUBJECT_ID, WELCOME_SUBTOPIC_ID, WELCOME_TOPIC_ID};

    #[test]
    fn default_content_is_one_linked_chain() {
        let snapshot = default_content(42);
        assert_eq!(snapshot.subjects.len(), 1);
        assert_eq!(snapshot.topics.len(), 1);
        assert_eq!(snapshot.subtopics.len(), 1);
        assert_eq!(
            snapshot.subjects[WELCOME_SUBJECT_ID].topic_order,
            vec![WELCOME_TOPIC_ID]
        );
        assert_eq!(
            snapshot.topics[WELCOME_TOPIC_ID].subtopic_order,
            vec![WELCOME_SUBTOPIC_ID]
        );
        assert!(snapshot.subtopics[WELCOME_SUBTOPIC_ID]
            .content
            .contains("<h1>"));
    }
}
