//! Template helpers.
//!
//! A helper is a named function callable from template expressions:
//!
//! ```jinja
//! {{ link("/users/:id", "Profile", id=user.id) }}
//! {% for person in people %}{{ number() }}. {{ person.name }}{% endfor %}
//! ```
//!
//! Helpers are registered with an explicit, ordered list of parameter names.
//! At each call the [`resolve`] layer binds positional and keyword arguments
//! to those names (keyword arguments win) and normalizes `url`/`href` values;
//! the [`adapter`] layer plugs the result into the template engine.
//!
//! # Registering a Helper
//!
//! ```rust
//! use stanza_render::helpers::HelperSet;
//!
//! let mut helpers = HelperSet::new();
//! helpers.register("shout", ["text"], |args, _ctx| {
//!     Ok(args[0].to_string().to_uppercase().into())
//! }).unwrap();
//!
//! assert!(helpers.contains("shout"));
//! ```
//!
//! The built-in helpers ([`builtin::default_helpers`]) are always available
//! and can be replaced by registering a helper under the same name.

pub mod adapter;
pub mod builtin;
pub mod resolve;

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use minijinja::Value;
use thiserror::Error;

use crate::context::HelperContext;
use crate::markup::HelperOutput;

pub use adapter::{adapt_helpers, AdaptedHelper};
pub use builtin::default_helpers;
pub use resolve::{resolve_arguments, Invocation, ResolvedArguments};

/// Signature of a helper handler.
///
/// Receives one value per declared parameter (in declaration order, missing
/// ones as undefined) followed by the trailing context.
pub type HelperFn =
    dyn Fn(&[Value], &HelperContext<'_>) -> Result<HelperOutput, HelperError> + Send + Sync;

/// Errors raised by helpers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HelperError {
    /// An argument had the wrong type or an unparseable value.
    #[error("invalid argument `{name}`: {message}")]
    InvalidArgument { name: String, message: String },

    /// A descriptor declared the same parameter name twice.
    #[error("duplicate parameter name `{0}`")]
    DuplicateParameter(String),

    /// The helper failed for its own reasons.
    #[error("{0}")]
    Failed(String),
}

impl HelperError {
    pub fn invalid_argument(name: impl Into<String>, message: impl Into<String>) -> Self {
        HelperError::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// A helper error tagged with the helper's name, carried through the engine
/// as an error source.
#[derive(Debug, Error)]
#[error("helper `{name}` failed: {error}")]
pub(crate) struct HelperFailure {
    pub(crate) name: String,
    #[source]
    pub(crate) error: HelperError,
}

/// A helper handler together with its ordered parameter names.
#[derive(Clone)]
pub struct HelperDescriptor {
    params: Vec<String>,
    handler: Arc<HelperFn>,
}

impl HelperDescriptor {
    /// Creates a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`HelperError::DuplicateParameter`] if a name repeats.
    pub fn new<I, S, F>(params: I, handler: F) -> Result<Self, HelperError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&[Value], &HelperContext<'_>) -> Result<HelperOutput, HelperError>
            + Send
            + Sync
            + 'static,
    {
        let params: Vec<String> = params.into_iter().map(Into::into).collect();

        let mut seen = HashSet::new();
        if let Some(dup) = params.iter().find(|p| !seen.insert(p.as_str())) {
            return Err(HelperError::DuplicateParameter(dup.clone()));
        }

        Ok(Self {
            params,
            handler: Arc::new(handler),
        })
    }

    /// Descriptor for built-ins, whose parameter lists are known to be unique.
    pub(crate) fn builtin<F>(params: &[&str], handler: F) -> Self
    where
        F: Fn(&[Value], &HelperContext<'_>) -> Result<HelperOutput, HelperError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            params: params.iter().map(|p| p.to_string()).collect(),
            handler: Arc::new(handler),
        }
    }

    /// Declared parameter names, in order.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Calls the handler with already-resolved arguments.
    pub fn invoke(
        &self,
        args: &[Value],
        ctx: &HelperContext<'_>,
    ) -> Result<HelperOutput, HelperError> {
        (self.handler)(args, ctx)
    }
}

impl fmt::Debug for HelperDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelperDescriptor")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Named collection of helpers.
///
/// Cheap to clone; handlers are shared.
#[derive(Clone, Default)]
pub struct HelperSet {
    helpers: BTreeMap<String, HelperDescriptor>,
}

impl HelperSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a helper, returning the one it replaced.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        descriptor: HelperDescriptor,
    ) -> Option<HelperDescriptor> {
        self.helpers.insert(name.into(), descriptor)
    }

    /// Builds a descriptor and adds it.
    pub fn register<I, S, F>(
        &mut self,
        name: impl Into<String>,
        params: I,
        handler: F,
    ) -> Result<&mut Self, HelperError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&[Value], &HelperContext<'_>) -> Result<HelperOutput, HelperError>
            + Send
            + Sync
            + 'static,
    {
        self.insert(name, HelperDescriptor::new(params, handler)?);
        Ok(self)
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, descriptor: HelperDescriptor) -> Self {
        self.insert(name, descriptor);
        self
    }

    pub fn get(&self, name: &str) -> Option<&HelperDescriptor> {
        self.helpers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.helpers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.helpers.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.helpers.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HelperDescriptor)> {
        self.helpers.iter().map(|(name, d)| (name.as_str(), d))
    }

    /// Returns a copy of this set with `overrides` layered on top, by name.
    pub fn overlay(&self, overrides: &HelperSet) -> HelperSet {
        let mut merged = self.clone();
        for (name, descriptor) in &overrides.helpers {
            merged.helpers.insert(name.clone(), descriptor.clone());
        }
        merged
    }
}

impl fmt::Debug for HelperSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelperSet")
            .field("helpers", &self.helpers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AmbientOptions;

    fn echo() -> HelperDescriptor {
        HelperDescriptor::new(["a", "b"], |args, _| Ok(Value::from(args.len()).into())).unwrap()
    }

    #[test]
    fn descriptor_keeps_order() {
        let d = echo();
        assert_eq!(d.params(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn descriptor_rejects_duplicates() {
        let err = HelperDescriptor::new(["url", "text", "url"], |_, _| Ok(HelperOutput::empty()))
            .unwrap_err();
        assert_eq!(err, HelperError::DuplicateParameter("url".to_string()));
    }

    #[test]
    fn descriptor_invokes_handler() {
        let options = AmbientOptions::new();
        let ctx = HelperContext::new(&options);
        let out = echo()
            .invoke(&[Value::from(1), Value::from(2)], &ctx)
            .unwrap();
        match out {
            HelperOutput::Value(v) => assert_eq!(v, Value::from(2)),
            other => panic!("unexpected output {other:?}"),
        }
    }

    #[test]
    fn overlay_replaces_by_name() {
        let base = HelperSet::new().with("a", echo()).with("b", echo());
        let overrides = HelperSet::new().with(
            "b",
            HelperDescriptor::new(Vec::<String>::new(), |_, _| Ok(HelperOutput::empty())).unwrap(),
        );

        let merged = base.overlay(&overrides);
        assert_eq!(merged.len(), 2);
        assert!(merged.get("b").unwrap().params().is_empty());
        assert_eq!(merged.get("a").unwrap().params().len(), 2);
        // the base set is untouched
        assert_eq!(base.get("b").unwrap().params().len(), 2);
    }

    #[test]
    fn register_validates() {
        let mut set = HelperSet::new();
        assert!(set.register("x", ["a", "a"], |_, _| Ok(HelperOutput::empty())).is_err());
        assert!(set.is_empty());
        set.register("x", ["a"], |_, _| Ok(HelperOutput::empty()))
            .unwrap();
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["x"]);
    }
}
