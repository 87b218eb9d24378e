//! MiniJinja-backed template compilation.
//!
//! Each template is compiled into its own [`Environment`], so a compiled
//! template can be cached and shared across threads without holding on to
//! the engine that produced it. Helpers are not registered on the
//! environment; they are passed in with every render call.
//!
//! Auto-escaping replaces `&`, `<` and `>` only. Quotes, `=` and `/` pass
//! through so URLs and quoted prose read naturally in text output. `none`
//! renders as nothing, like undefined values, and a helper named without
//! parentheses (`{{ dateLong }}`) is called with no arguments.

use std::collections::BTreeMap;
use std::fmt;

use minijinja::{AutoEscape, Environment, Error, ErrorKind, Output, State, Value};
use serde_json::{Map, Value as JsonValue};

use crate::error::RenderError;
use crate::helpers::AdaptedHelper;
use crate::markup::escape_text;

const TEMPLATE_NAME: &str = "template";

/// Compiles template source with a fixed escaping policy.
///
/// # Example
///
/// ```rust
/// use stanza_render::template::MiniJinjaEngine;
///
/// let engine = MiniJinjaEngine::new();
/// let compiled = engine.compile("Hello {{ name }}!").unwrap();
///
/// let mut params = serde_json::Map::new();
/// params.insert("name".into(), "<World>".into());
///
/// let output = compiled.render(&params, Default::default()).unwrap();
/// assert_eq!(output, "Hello &lt;World&gt;!");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MiniJinjaEngine {
    auto_escape: bool,
}

impl MiniJinjaEngine {
    /// Creates an engine with auto-escaping on.
    pub fn new() -> Self {
        Self { auto_escape: true }
    }

    /// Creates an engine with escaping switched on or off.
    pub fn with_auto_escape(auto_escape: bool) -> Self {
        Self { auto_escape }
    }

    pub fn auto_escape(&self) -> bool {
        self.auto_escape
    }

    /// Compiles `source`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Compilation`] on a syntax error.
    pub fn compile(&self, source: &str) -> Result<CompiledTemplate, RenderError> {
        let mut env = Environment::new();
        let escape = if self.auto_escape {
            AutoEscape::Html
        } else {
            AutoEscape::None
        };
        env.set_auto_escape_callback(move |_| escape);
        env.set_formatter(format_value);
        env.add_template_owned(TEMPLATE_NAME, source.to_string())
            .map_err(RenderError::compilation)?;
        Ok(CompiledTemplate { env })
    }
}

impl Default for MiniJinjaEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn format_value(out: &mut Output<'_>, state: &State<'_, '_>, value: &Value) -> Result<(), Error> {
    match value.downcast_object_ref::<AdaptedHelper>() {
        Some(helper) => write_value(out, state, &helper.evaluate(Some(state), &[])?),
        None => write_value(out, state, value),
    }
}

fn write_value(out: &mut Output<'_>, state: &State<'_, '_>, value: &Value) -> Result<(), Error> {
    if value.is_none() {
        return Ok(());
    }
    if value.is_safe() || matches!(state.auto_escape(), AutoEscape::None) {
        return minijinja::escape_formatter(out, state, value);
    }
    out.write_str(&escape_text(&value.to_string()))
        .map_err(|_| Error::new(ErrorKind::WriteFailure, "failed to write template output"))
}

/// A compiled template, ready to be evaluated any number of times.
pub struct CompiledTemplate {
    env: Environment<'static>,
}

impl CompiledTemplate {
    /// Evaluates the template.
    ///
    /// `helpers` are merged over `parameters`, so a helper shadows a parameter
    /// of the same name.
    pub fn render(
        &self,
        parameters: &Map<String, JsonValue>,
        helpers: BTreeMap<String, Value>,
    ) -> Result<String, RenderError> {
        let mut context: BTreeMap<String, Value> = parameters
            .iter()
            .map(|(key, value)| (key.clone(), Value::from_serialize(value)))
            .collect();
        context.extend(helpers);

        let template = self.env.get_template(TEMPLATE_NAME)?;
        Ok(template.render(Value::from(context))?)
    }
}

impl fmt::Debug for CompiledTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledTemplate").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: JsonValue) -> Map<String, JsonValue> {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn renders_parameters() {
        let compiled = MiniJinjaEngine::new()
            .compile("{% for p in people %}{{ p.name }};{% endfor %}")
            .unwrap();
        let out = compiled
            .render(
                &params(json!({"people": [{"name": "Ann"}, {"name": "Bo"}]})),
                BTreeMap::new(),
            )
            .unwrap();
        assert_eq!(out, "Ann;Bo;");
    }

    #[test]
    fn escapes_by_default() {
        let compiled = MiniJinjaEngine::new().compile("{{ x }}|{{ x | safe }}").unwrap();
        let out = compiled
            .render(&params(json!({"x": "<b>"})), BTreeMap::new())
            .unwrap();
        assert_eq!(out, "&lt;b&gt;|<b>");
    }

    #[test]
    fn quotes_and_slashes_are_not_escaped() {
        let compiled = MiniJinjaEngine::new().compile("{{ text }} {{ url }}").unwrap();
        let out = compiled
            .render(
                &params(json!({"text": "\"Hello\" = 'goodbye'", "url": "https://example.com?a=1&b=2"})),
                BTreeMap::new(),
            )
            .unwrap();
        assert_eq!(out, "\"Hello\" = 'goodbye' https://example.com?a=1&amp;b=2");
    }

    #[test]
    fn escaping_can_be_disabled() {
        let compiled = MiniJinjaEngine::with_auto_escape(false)
            .compile("{{ x }}")
            .unwrap();
        let out = compiled
            .render(&params(json!({"x": "<b>"})), BTreeMap::new())
            .unwrap();
        assert_eq!(out, "<b>");
    }

    #[test]
    fn undefined_renders_empty() {
        let compiled = MiniJinjaEngine::new().compile("[{{ missing }}]").unwrap();
        let out = compiled.render(&Map::new(), BTreeMap::new()).unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn none_renders_empty() {
        for escape in [true, false] {
            let compiled = MiniJinjaEngine::with_auto_escape(escape)
                .compile("[{{ x }}]")
                .unwrap();
            let out = compiled
                .render(&params(json!({ "x": null })), BTreeMap::new())
                .unwrap();
            assert_eq!(out, "[]");
        }
    }

    #[test]
    fn syntax_error_is_compilation() {
        let err = MiniJinjaEngine::new().compile("{{ unclosed").unwrap_err();
        assert_eq!(err.stage(), "compilation");
    }

    #[test]
    fn helpers_shadow_parameters() {
        let compiled = MiniJinjaEngine::new().compile("{{ greeting }}").unwrap();
        let helpers = BTreeMap::from([("greeting".to_string(), Value::from("from helper"))]);
        let out = compiled
            .render(&params(json!({"greeting": "from params"})), helpers)
            .unwrap();
        assert_eq!(out, "from helper");
    }

    #[test]
    fn compiled_templates_are_reusable() {
        let compiled = MiniJinjaEngine::new().compile("{{ n }}").unwrap();
        for n in 0..3 {
            let out = compiled
                .render(&params(json!({ "n": n })), BTreeMap::new())
                .unwrap();
            assert_eq!(out, n.to_string());
        }
    }
}
