//! Renderer configuration and per-call requests.
//!
//! Settings come from two layers:
//!
//! 1. [`RenderOptions`]: defaults owned by a [`Renderer`](crate::Renderer),
//!    usually loaded from a config file.
//! 2. [`RenderRequest`]: one render call. Any field it sets wins over the
//!    renderer default, except `parameters`, which are merged key by key.
//!
//! ```yaml
//! dir: ./templates
//! base_url: https://example.com
//! auto_escape: true
//! parameters:
//!   product: Stanza
//! time_zone:
//!   utc_offset_minutes: -300
//!   short: EST
//!   long: Eastern Standard Time
//!   short_generic: ET
//!   long_generic: Eastern Time
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::datetime::TimeZoneSpec;
use crate::error::RenderError;
use crate::helpers::{HelperDescriptor, HelperSet};

/// Renderer-wide defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Directory template identifiers are resolved against.
    pub dir: Option<PathBuf>,

    /// Prefix for root-relative `url`/`href` helper arguments.
    pub base_url: Option<String>,

    /// Parameters available to every template.
    pub parameters: Map<String, JsonValue>,

    /// HTML-escape interpolated values.
    pub auto_escape: bool,

    /// Zone used by the date helpers. UTC when unset.
    pub time_zone: Option<TimeZoneSpec>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            dir: None,
            base_url: None,
            parameters: Map::new(),
            auto_escape: true,
            time_zone: None,
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Config`] for invalid YAML or unknown value types.
    pub fn from_yaml(yaml: &str) -> Result<Self, RenderError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parses options from JSON.
    pub fn from_json(json: &str) -> Result<Self, RenderError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Adds one default parameter.
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn auto_escape(mut self, auto_escape: bool) -> Self {
        self.auto_escape = auto_escape;
        self
    }

    pub fn time_zone(mut self, zone: TimeZoneSpec) -> Self {
        self.time_zone = Some(zone);
        self
    }

    /// Layers `request` over these defaults.
    pub(crate) fn merge(&self, request: RenderRequest) -> MergedRequest {
        let RenderRequest {
            template,
            body,
            parameters: overrides,
            helpers,
            dir,
            base_url,
            auto_escape,
        } = request;

        let mut parameters = self.parameters.clone();
        parameters.extend(overrides);

        MergedRequest {
            template: template.or(body).unwrap_or_default(),
            parameters,
            helpers,
            dir: dir.or_else(|| self.dir.clone()),
            base_url: base_url.or_else(|| self.base_url.clone()),
            auto_escape: auto_escape.unwrap_or(self.auto_escape),
        }
    }
}

/// One render call.
///
/// ```rust
/// use stanza_render::RenderRequest;
///
/// let request = RenderRequest::template("welcome")
///     .parameter("name", "Carl")
///     .base_url("https://example.com");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RenderRequest {
    /// Template identifier: a file name under `dir`, or inline source.
    pub template: Option<String>,

    /// Alias for `template`, used when `template` is unset.
    pub body: Option<String>,

    /// Parameters merged over the renderer defaults.
    pub parameters: Map<String, JsonValue>,

    /// Helpers layered over the renderer's helpers for this call only.
    pub helpers: HelperSet,

    pub dir: Option<PathBuf>,
    pub base_url: Option<String>,
    pub auto_escape: Option<bool>,
}

impl RenderRequest {
    /// A request with neither template nor body. Renders to empty output.
    pub fn new() -> Self {
        Self::default()
    }

    /// A request for `template`.
    pub fn template(template: impl Into<String>) -> Self {
        Self {
            template: Some(template.into()),
            ..Self::default()
        }
    }

    /// A request using the `body` alias.
    pub fn body(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            ..Self::default()
        }
    }

    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn parameters(mut self, parameters: Map<String, JsonValue>) -> Self {
        self.parameters.extend(parameters);
        self
    }

    /// Adds every field of a serializable value as a parameter.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Config`] if `data` does not serialize to a map.
    pub fn parameters_from<T: Serialize + ?Sized>(mut self, data: &T) -> Result<Self, RenderError> {
        match serde_json::to_value(data)? {
            JsonValue::Object(map) => {
                self.parameters.extend(map);
                Ok(self)
            }
            other => Err(RenderError::Config(format!(
                "parameters must serialize to a map, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Adds a helper for this call only.
    pub fn helper(mut self, name: impl Into<String>, descriptor: HelperDescriptor) -> Self {
        self.helpers.insert(name, descriptor);
        self
    }

    pub fn dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn auto_escape(mut self, auto_escape: bool) -> Self {
        self.auto_escape = Some(auto_escape);
        self
    }
}

/// A request with every default applied.
#[derive(Debug, Clone)]
pub(crate) struct MergedRequest {
    pub(crate) template: String,
    pub(crate) parameters: Map<String, JsonValue>,
    /// Per-call helpers only; the renderer adds its own underneath.
    pub(crate) helpers: HelperSet,
    pub(crate) dir: Option<PathBuf>,
    pub(crate) base_url: Option<String>,
    pub(crate) auto_escape: bool,
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "a map",
    }
}
