//! Markdown export of tree content.
//!
//! # Responsibility
//! - Downgrade editor HTML to Markdown with a fixed set of regex rules.
//! - Build export documents for one subtopic, one topic or a whole subject.
//!
//! # Invariants
//! - Conversion is lossy: unknown tags are stripped, their text is kept.
//! - File names are `slugify`-derived and always end in `.md`.

use crate::model::tree::ContentTree;
use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static OL_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<ol(?:\s[^>]*)?>(.*?)</ol>").expect("valid ol regex"));
static LI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<li(?:\s[^>]*)?>(.*?)</li>").expect("valid li regex"));
static PRE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<pre(?:\s[^>]*)?>(.*?)</pre>").expect("valid pre regex"));
static ANCHOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<a\s[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#).expect("valid anchor regex")
});
static BR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<br\s*/?>").expect("valid br regex"));
static ANY_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static BLANK_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("valid blank regex"));
static SLUG_STRIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\s-]").expect("valid slug strip regex"));
static SLUG_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s_-]+").expect("valid slug separator regex"));

/// Inline and block rules applied in order after lists, code and links.
static SIMPLE_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"<h1(?:\s[^>]*)?>(.*?)</h1>", "# $1\n\n"),
        (r"<h2(?:\s[^>]*)?>(.*?)</h2>", "## $1\n\n"),
        (r"<h3(?:\s[^>]*)?>(.*?)</h3>", "### $1\n\n"),
        (r"<strong(?:\s[^>]*)?>(.*?)</strong>", "**$1**"),
        (r"<b>(.*?)</b>", "**$1**"),
        (r"<em(?:\s[^>]*)?>(.*?)</em>", "*$1*"),
        (r"<i>(.*?)</i>", "*$1*"),
        (r"<code(?:\s[^>]*)?>(.*?)</code>", "`$1`"),
        (r"(?s)<blockquote(?:\s[^>]*)?>(.*?)</blockquote>", "> $1\n\n"),
        (r"(?s)<p(?:\s[^>]*)?>(.*?)</p>", "$1\n\n"),
        (r"(?s)<ul(?:\s[^>]*)?>(.*?)</ul>", "$1\n"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        (
            Regex::new(pattern).expect("valid markdown rule regex"),
            replacement,
        )
    })
    .collect()
});

/// One exportable Markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownExport {
    pub file_name: String,
    pub body: String,
}

/// Converts editor HTML to Markdown.
pub fn html_to_markdown(html: &str) -> String {
    let mut text = PRE_RE
        .replace_all(html, |caps: &Captures| {
            let code = ANY_TAG_RE.replace_all(&caps[1], "");
            format!("```\n{code}\n```\n\n")
        })
        .into_owned();

    text = OL_BLOCK_RE
        .replace_all(&text, |caps: &Captures| {
            let mut index = 0;
            let items = LI_RE.replace_all(&caps[1], |item: &Captures| {
                index += 1;
                format!("{index}. {}\n", item[1].trim())
            });
            format!("{items}\n")
        })
        .into_owned();
    text = LI_RE
        .replace_all(&text, |caps: &Captures| format!("- {}\n", caps[1].trim()))
        .into_owned();
    text = ANCHOR_RE.replace_all(&text, "[$2]($1)").into_owned();

    for (rule, replacement) in SIMPLE_RULES.iter() {
        text = rule.replace_all(&text, *replacement).into_owned();
    }

    text = BR_RE.replace_all(&text, "\n").into_owned();
    text = ANY_TAG_RE.replace_all(&text, "").into_owned();
    text = decode_entities(&text);
    text = BLANK_RUN_RE.replace_all(&text, "\n\n").into_owned();
    text.trim().to_string()
}

/// Lowercase, ASCII-word, dash-separated form of `text`.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = SLUG_STRIP_RE.replace_all(lowered.trim(), "");
    let dashed = SLUG_SEPARATOR_RE.replace_all(&stripped, "-");
    dashed.trim_matches('-').to_string()
}

/// Exports one subtopic, named after its full ancestor path.
pub fn export_subtopic(tree: &ContentTree, subtopic_id: &str) -> Option<MarkdownExport> {
    let subtopic = tree.subtopics.get(subtopic_id)?;
    let topic = tree.topics.get(&subtopic.topic_id)?;
    let subject = tree.subjects.get(&topic.subject_id)?;

    let export = MarkdownExport {
        file_name: file_name(&format!(
            "{} - {} - {}",
            subject.title, topic.title, subtopic.title
        )),
        body: html_to_markdown(&subtopic.content),
    };
    debug!("event=export module=export status=ok kind=subtopic id={subtopic_id}");
    Some(export)
}

/// Exports a topic's own content followed by its subtopics in display order.
pub fn export_topic(tree: &ContentTree, topic_id: &str) -> Option<MarkdownExport> {
    let topic = tree.topics.get(topic_id)?;
    let subject = tree.subjects.get(&topic.subject_id)?;

    let mut body = format!("# {}\n\n", topic.title);
    if let Some(content) = topic.content.as_deref().filter(|c| !c.trim().is_empty()) {
        push_section(&mut body, &html_to_markdown(content));
    }
    for subtopic in tree.subtopics_of(topic_id) {
        body.push_str(&format!("## {}\n\n", subtopic.title));
        push_section(&mut body, &html_to_markdown(&subtopic.content));
    }

    debug!("event=export module=export status=ok kind=topic id={topic_id}");
    Some(MarkdownExport {
        file_name: file_name(&format!("{} - {}", subject.title, topic.title)),
        body: body.trim_end().to_string(),
    })
}

/// Exports every topic and subtopic of a subject in display order.
pub fn export_subject(tree: &ContentTree, subject_id: &str) -> Option<MarkdownExport> {
    let subject = tree.subjects.get(subject_id)?;

    let mut body = format!("# {}\n\n", subject.title);
    for topic in tree.topics_of(subject_id) {
        body.push_str(&format!("## {}\n\n", topic.title));
        for subtopic in tree.subtopics_of(&topic.id) {
            body.push_str(&format!("### {}\n\n", subtopic.title));
            push_section(&mut body, &html_to_markdown(&subtopic.content));
        }
    }

    debug!("event=export module=export status=ok kind=subject id={subject_id}");
    Some(MarkdownExport {
        file_name: file_name(&subject.title),
        body: body.trim_end().to_string(),
    })
}

/// Exports the selected subtopic, or the selected subject when no subtopic is selected.
pub fn export_selection(tree: &ContentTree) -> Option<MarkdownExport> {
    if let Some(subtopic_id) = tree.selection.current_subtopic_id.as_deref() {
        return export_subtopic(tree, subtopic_id);
    }
    let subject_id = tree.selection.current_subject_id.as_deref()?;
    export_subject(tree, subject_id)
}

fn push_section(body: &mut String, markdown: &str) {
    if markdown.is_empty() {
        return;
    }
    body.push_str(markdown);
    body.push_str("\n\n");
}

fn file_name(title: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        return "export.md".to_string();
    }
    format!("{slug}.md")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
