//! Front matter splitter for rendered text documents.
//!
//! This crate separates a leading YAML header block from the rest of a
//! document. It is the metadata stage of the `stanza` rendering pipeline, but
//! has no dependency on it and can be used on any text.
//!
//! # Example
//!
//! ```rust
//! use stanza_frontmatter::split;
//!
//! let doc = "---\ntitle: Hello!\n---\nBody text";
//! let parsed = split(doc).unwrap();
//!
//! assert_eq!(parsed.attributes["title"], "Hello!");
//! assert_eq!(parsed.body, "Body text");
//! assert_eq!(parsed.body_begin, 4);
//! ```
//!
//! # Header Syntax
//!
//! - The first line must be exactly `---` or `= yaml =` (an optional UTF-8
//!   byte order mark is ignored).
//! - The block ends at the first line that starts with the opening marker or
//!   with `...`, followed only by whitespace.
//! - Without a closing line the document has no header and is returned whole.
//!
//! The block content is parsed as YAML and must be a mapping (or empty).

use serde_json::{Map, Value};
use thiserror::Error;

/// Opening markers recognized on the first line.
pub const OPENERS: &[&str] = &["---", "= yaml ="];

/// Alternative closing marker, accepted for any opener.
pub const ALT_CLOSER: &str = "...";

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Errors raised while parsing a header block.
#[derive(Debug, Error)]
pub enum FrontMatterError {
    /// The header block is not valid YAML.
    #[error("invalid front matter: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The header block parsed, but to something other than a mapping.
    #[error("front matter must be a mapping, found {found}")]
    NotAMapping {
        /// Kind of value that was found instead.
        found: &'static str,
    },
}

/// A document split into header attributes and body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrontMatter {
    /// Parsed header attributes. Empty when the document has no header.
    pub attributes: Map<String, Value>,
    /// Everything after the header block, unmodified.
    pub body: String,
    /// 1-based line number on which the body starts.
    pub body_begin: usize,
    /// Raw header text (trimmed), if a header block was present.
    pub raw: Option<String>,
}

impl FrontMatter {
    /// Returns true if the document carried a header block.
    pub fn has_header(&self) -> bool {
        self.raw.is_some()
    }
}

/// Location of a header block inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block<'a> {
    raw: &'a str,
    body_offset: usize,
    body_begin: usize,
}

/// Splits a document into header attributes and body.
///
/// Documents without a well-formed header block are returned unchanged with
/// empty attributes; that is not an error. Only a header whose content is not
/// a YAML mapping fails.
pub fn split(input: &str) -> Result<FrontMatter, FrontMatterError> {
    let text = input.strip_prefix(BYTE_ORDER_MARK).unwrap_or(input);

    let Some(block) = locate(text) else {
        return Ok(FrontMatter {
            attributes: Map::new(),
            body: input.to_string(),
            body_begin: 1,
            raw: None,
        });
    };

    let raw = block.raw.trim();
    Ok(FrontMatter {
        attributes: parse_attributes(raw)?,
        body: text[block.body_offset..].to_string(),
        body_begin: block.body_begin,
        raw: Some(raw.to_string()),
    })
}

/// Returns true if the document starts with a complete header block.
pub fn has_front_matter(input: &str) -> bool {
    let text = input.strip_prefix(BYTE_ORDER_MARK).unwrap_or(input);
    locate(text).is_some()
}

/// Finds the header block, returning its raw content and where the body starts.
fn locate(text: &str) -> Option<Block<'_>> {
    let mut lines = Lines::new(text);

    let (_, first) = lines.next()?;
    let opener = OPENERS.iter().copied().find(|o| first == *o)?;
    let content_start = lines.offset;

    while let Some((start, line)) = lines.next() {
        if is_closer(line, opener) {
            return Some(Block {
                raw: &text[content_start..start],
                body_offset: lines.offset,
                body_begin: lines.number + 1,
            });
        }
    }

    None
}

fn is_closer(line: &str, opener: &str) -> bool {
    line.strip_prefix(opener)
        .or_else(|| line.strip_prefix(ALT_CLOSER))
        .is_some_and(|rest| rest.chars().all(char::is_whitespace))
}

fn parse_attributes(raw: &str) -> Result<Map<String, Value>, FrontMatterError> {
    if raw.is_empty() {
        return Ok(Map::new());
    }

    match serde_yaml::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(FrontMatterError::NotAMapping {
            found: kind_of(&other),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

/// Line iterator that tracks byte offsets and line numbers.
///
/// Yielded lines exclude their terminator (`\n` or `\r\n`).
struct Lines<'a> {
    text: &'a str,
    offset: usize,
    number: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            offset: 0,
            number: 0,
        }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = (usize, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.text.len() {
            return None;
        }

        let start = self.offset;
        let rest = &self.text[start..];
        let (line, consumed) = match rest.find('\n') {
            Some(pos) => (&rest[..pos], pos + 1),
            None => (rest, rest.len()),
        };

        self.offset += consumed;
        self.number += 1;
        Some((start, line.strip_suffix('\r').unwrap_or(line)))
    }
}
