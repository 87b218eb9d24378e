//! Post-processing of rendered output.
//!
//! Rendered text goes through two steps:
//!
//! 1. A leading front matter block is parsed into `meta` and removed.
//! 2. The remaining body is split into named sections on delimiter lines:
//!
//! ```text
//! === SYSTEM ===
//!
//! You are a helpful assistant.
//!
//! === USER ===
//!
//! Hello!
//! ```
//!
//! A delimiter must start a line and be followed by a blank line. Text
//! before the first delimiter belongs to no section and is dropped. A body
//! without delimiters becomes a single untitled section.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::RenderError;

static DELIMITER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^=== ([A-Za-z0-9_]+) ===\n\n").expect("section delimiter pattern is valid")
});

/// A named region of the rendered body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    /// Delimiter name. Absent for the single section of an undelimited body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Trimmed section text.
    pub content: String,
}

impl Section {
    pub fn titled(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: content.into(),
        }
    }

    pub fn untitled(content: impl Into<String>) -> Self {
        Self {
            title: None,
            content: content.into(),
        }
    }
}

/// Output of a render call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderResult {
    /// Rendered text without its front matter, trimmed.
    pub body: String,
    /// Front matter attributes; empty when there is none.
    pub meta: Map<String, JsonValue>,
    /// Sections of `body`, in order of appearance.
    pub sections: Vec<Section>,
}

impl RenderResult {
    /// Content of the first section titled `title`.
    pub fn section(&self, title: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.title.as_deref() == Some(title))
            .map(|s| s.content.as_str())
    }
}

/// Splits rendered output into metadata, body and sections.
///
/// # Errors
///
/// Returns [`RenderError::Metadata`] if the front matter is not a valid YAML
/// mapping.
pub fn extract(raw: &str) -> Result<RenderResult, RenderError> {
    let front = stanza_frontmatter::split(raw)?;
    let body = front.body.trim().to_string();
    let sections = split_sections(&body);

    Ok(RenderResult {
        body,
        meta: front.attributes,
        sections,
    })
}

/// Splits a body on `=== NAME ===` delimiter lines.
pub fn split_sections(body: &str) -> Vec<Section> {
    let body = body.trim();

    let delimiters: Vec<(&str, usize, usize)> = DELIMITER
        .captures_iter(body)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some((caps.get(1)?.as_str(), whole.start(), whole.end()))
        })
        .collect();

    if delimiters.is_empty() {
        return vec![Section::untitled(body)];
    }

    delimiters
        .iter()
        .enumerate()
        .map(|(i, &(title, _, content_start))| {
            let content_end = delimiters
                .get(i + 1)
                .map_or(body.len(), |&(_, next_start, _)| next_start);
            Section::titled(title, body[content_start..content_end].trim())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn no_delimiters() {
        let sections = split_sections("  Hello Carl!  \n");
        assert_eq!(sections, vec![Section::untitled("Hello Carl!")]);
    }

    #[test]
    fn two_sections() {
        let sections = split_sections("=== SYSTEM ===\n\ntext1\n\n=== USER ===\n\ntext2");
        assert_eq!(
            sections,
            vec![Section::titled("SYSTEM", "text1"), Section::titled("USER", "text2")]
        );
    }

    #[test]
    fn preamble_is_dropped() {
        let sections = split_sections("intro\n=== A ===\n\nbody");
        assert_eq!(sections, vec![Section::titled("A", "body")]);
    }

    #[test]
    fn delimiter_must_start_a_line() {
        let body = "see === A ===\n\nnot a section";
        assert_eq!(split_sections(body), vec![Section::untitled(body)]);
    }

    #[test]
    fn delimiter_needs_blank_line() {
        let body = "=== A ===\nno blank line";
        assert_eq!(split_sections(body), vec![Section::untitled(body)]);
    }

    #[test]
    fn empty_section() {
        let sections = split_sections("=== A ===\n\n=== B ===\n\nb");
        assert_eq!(
            sections,
            vec![Section::titled("A", ""), Section::titled("B", "b")]
        );
    }

    #[test]
    fn repeated_titles_are_kept() {
        let sections = split_sections("=== A ===\n\n1\n=== A ===\n\n2");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].content, "2");
    }

    #[test]
    fn extract_meta_and_sections() {
        let raw = "---\ntitle: Welcome\ntags: [a, b]\n---\n=== SYSTEM ===\n\ntext1\n\n=== USER ===\n\ntext2\n";
        let result = extract(raw).unwrap();

        assert_eq!(result.meta["title"], json!("Welcome"));
        assert_eq!(result.meta["tags"], json!(["a", "b"]));
        assert_eq!(result.body, "=== SYSTEM ===\n\ntext1\n\n=== USER ===\n\ntext2");
        assert_eq!(result.section("USER"), Some("text2"));
        assert_eq!(result.section("MISSING"), None);
    }

    #[test]
    fn extract_plain() {
        let result = extract("Hello Carl!").unwrap();
        assert!(result.meta.is_empty());
        assert_eq!(result.sections, vec![Section::untitled("Hello Carl!")]);
    }

    #[test]
    fn extract_bad_front_matter() {
        let err = extract("---\n- a list\n---\nbody").unwrap_err();
        assert_eq!(err.stage(), "extraction");
    }

    #[test]
    fn untitled_section_serializes_without_title() {
        let value = serde_json::to_value(Section::untitled("x")).unwrap();
        assert_eq!(value, json!({"content": "x"}));
    }

    fn section_text() -> impl Strategy<Value = String> {
        // no '=' so content can never form a delimiter
        "[a-z][a-z ]{0,9}(\n[a-z ]{0,10}){0,3}"
    }

    proptest! {
        #[test]
        fn undelimited_body_is_one_section(body in "[^=]{0,80}") {
            let sections = split_sections(&body);
            prop_assert_eq!(sections, vec![Section::untitled(body.trim())]);
        }

        #[test]
        fn n_delimiters_give_n_sections(
            parts in prop::collection::vec(("[A-Z][A-Z0-9_]{0,7}", section_text()), 1..6)
        ) {
            let body: String = parts
                .iter()
                .map(|(title, content)| format!("=== {title} ===\n\n{content}\n"))
                .collect();

            let sections = split_sections(&body);
            prop_assert_eq!(sections.len(), parts.len());
            for (section, (title, content)) in sections.iter().zip(&parts) {
                prop_assert_eq!(section.title.as_deref(), Some(title.as_str()));
                prop_assert_eq!(section.content.as_str(), content.trim());
            }
        }
    }
}
