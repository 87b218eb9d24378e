//! Helper return values and inline markup rendering.
//!
//! Helpers return a [`HelperOutput`]. Before the value reaches the template
//! engine it goes through [`transform`]:
//!
//! | Variant | Emitted as |
//! |---------|------------|
//! | `Value` | ordinary value, auto-escaped by the engine |
//! | `Safe` | verbatim, never re-escaped |
//! | `Element` | rendered markup, never re-escaped |
//!
//! Elements nest to any depth:
//!
//! ```rust
//! use stanza_render::markup::Element;
//!
//! let el = Element::new("p")
//!     .attr("title", "Title")
//!     .child(Element::new("img").attr("src", "https://example.com"));
//!
//! assert_eq!(el.render(), r#"<p title="Title"><img src="https://example.com" /></p>"#);
//! ```

use std::fmt::{self, Write};

use minijinja::Value;

/// Attribute name routed to the element's content instead of its attributes.
pub const TEXT_ATTRIBUTE: &str = "text";

/// What a helper hands back to the template.
#[derive(Debug, Clone)]
pub enum HelperOutput {
    /// A plain value, subject to auto-escaping.
    Value(Value),
    /// Pre-escaped text inserted as-is.
    Safe(String),
    /// An inline markup element.
    Element(Element),
}

impl HelperOutput {
    /// Pre-escaped text.
    pub fn safe(text: impl Into<String>) -> Self {
        HelperOutput::Safe(text.into())
    }

    /// The empty string.
    pub fn empty() -> Self {
        HelperOutput::Value(Value::from(""))
    }
}

impl From<Value> for HelperOutput {
    fn from(value: Value) -> Self {
        HelperOutput::Value(value)
    }
}

impl From<String> for HelperOutput {
    fn from(text: String) -> Self {
        HelperOutput::Value(Value::from(text))
    }
}

impl From<&str> for HelperOutput {
    fn from(text: &str) -> Self {
        HelperOutput::Value(Value::from(text))
    }
}

impl From<Element> for HelperOutput {
    fn from(element: Element) -> Self {
        HelperOutput::Element(element)
    }
}

/// Converts a helper's output into an engine value.
pub fn transform(output: HelperOutput) -> Value {
    match output {
        HelperOutput::Value(value) => value,
        HelperOutput::Safe(text) => Value::from_safe_string(text),
        HelperOutput::Element(element) => Value::from_safe_string(element.render()),
    }
}

/// Inner content of an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Text, escaped on output.
    Text(String),
    /// A nested element.
    Element(Box<Element>),
}

/// An inline markup element with ordered attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    content: Option<Content>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            content: None,
        }
    }

    /// Sets an attribute, keeping its first position if already present.
    ///
    /// The name `text` sets the element's text content instead.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();

        if name == TEXT_ATTRIBUTE {
            self.content = Some(Content::Text(value));
            return self;
        }

        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
        self
    }

    /// Sets text content.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.content = Some(Content::Text(text.into()));
        self
    }

    /// Sets a nested element as content.
    pub fn child(mut self, child: Element) -> Self {
        self.content = Some(Content::Element(Box::new(child)));
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn content(&self) -> Option<&Content> {
        self.content.as_ref()
    }

    /// Renders the element as markup.
    ///
    /// Empty attributes are skipped. Elements without content (or with empty
    /// text) are self-closing.
    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) -> fmt::Result {
        write!(out, "<{}", self.tag)?;
        for (name, value) in &self.attributes {
            if value.is_empty() {
                continue;
            }
            write!(out, " {}=\"{}\"", name, escape_attribute(value))?;
        }

        match &self.content {
            None => out.push_str(" />"),
            Some(Content::Text(text)) if text.is_empty() => out.push_str(" />"),
            Some(Content::Text(text)) => {
                write!(out, ">{}</{}>", escape_text(text), self.tag)?;
            }
            Some(Content::Element(child)) => {
                out.push('>');
                child.write_to(out)?;
                write!(out, "</{}>", self.tag)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Escapes `&`, `<` and `>`.
pub(crate) fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attribute(value: &str) -> String {
    escape_text(value)
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_element() {
        let el = Element::new("p")
            .attr("title", "Title")
            .attr("text", "ignored")
            .child(Element::new("img").attr("src", "https://example.com"));
        assert_eq!(
            el.render(),
            r#"<p title="Title"><img src="https://example.com" /></p>"#
        );
    }

    #[test]
    fn deep_nesting() {
        let el = Element::new("div").child(
            Element::new("p").child(Element::new("a").attr("href", "/x").text("go")),
        );
        assert_eq!(el.render(), r#"<div><p><a href="/x">go</a></p></div>"#);
    }

    #[test]
    fn text_attribute_becomes_content() {
        let el = Element::new("a")
            .attr("href", "http://example.com")
            .attr("text", "Hello")
            .attr("class", "button");
        assert_eq!(
            el.render(),
            r#"<a href="http://example.com" class="button">Hello</a>"#
        );
    }

    #[test]
    fn empty_attributes_are_omitted() {
        let el = Element::new("a").attr("href", "/x").attr("title", "").text("x");
        assert_eq!(el.render(), r#"<a href="/x">x</a>"#);
    }

    #[test]
    fn empty_text_is_self_closing() {
        assert_eq!(Element::new("br").text("").render(), "<br />");
        assert_eq!(Element::new("hr").render(), "<hr />");
    }

    #[test]
    fn repeated_attribute_keeps_position() {
        let el = Element::new("a").attr("href", "/a").attr("class", "c").attr("href", "/b");
        assert_eq!(
            el.attributes(),
            &[
                ("href".to_string(), "/b".to_string()),
                ("class".to_string(), "c".to_string())
            ]
        );
    }

    #[test]
    fn values_are_escaped() {
        let el = Element::new("a")
            .attr("title", "say \"hi\" & <bye>, it's")
            .text("1 < 2, \"quoted\"");
        assert_eq!(
            el.render(),
            r#"<a title="say &quot;hi&quot; &amp; &lt;bye&gt;, it&#x27;s">1 &lt; 2, "quoted"</a>"#
        );
    }

    #[test]
    fn transform_marks_markup_safe() {
        let value = transform(HelperOutput::Element(Element::new("b").text("x")));
        assert!(value.is_safe());
        assert_eq!(value.to_string(), "<b>x</b>");

        let safe = transform(HelperOutput::safe("[a](b)"));
        assert!(safe.is_safe());

        let plain = transform(HelperOutput::from("<b>"));
        assert!(!plain.is_safe());
        assert_eq!(plain.as_str(), Some("<b>"));
    }
}
