//! Plugs helpers into the template engine.
//!
//! Each helper is wrapped in an [`AdaptedHelper`], a callable minijinja object
//! placed in the render context under the helper's name. When a template
//! calls it, the adapter:
//!
//! 1. splits the engine's arguments into positional values and keyword
//!    arguments,
//! 2. resolves them against the helper's declared parameters,
//! 3. reads the enclosing loop index from the engine state,
//! 4. invokes the handler and converts its output into an engine value.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use minijinja::value::{Object, ObjectRepr};
use minijinja::{Error, ErrorKind, State, Value};
use tracing::{trace, warn};

use super::resolve::{resolve_arguments, Invocation};
use super::{HelperDescriptor, HelperError, HelperFailure, HelperSet};
use crate::context::{AmbientOptions, HelperContext, HelperData};
use crate::markup::{self, HelperOutput};

/// A helper bound to the ambient options of one render call.
pub struct AdaptedHelper {
    name: String,
    descriptor: HelperDescriptor,
    options: Arc<AmbientOptions>,
}

impl AdaptedHelper {
    pub fn new(
        name: impl Into<String>,
        descriptor: HelperDescriptor,
        options: Arc<AmbientOptions>,
    ) -> Self {
        Self {
            name: name.into(),
            descriptor,
            options,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolves an invocation and calls the handler.
    ///
    /// The handler's output is returned as-is; conversion to an engine value
    /// happens when the engine receives it.
    pub fn invoke(
        &self,
        invocation: &Invocation<'_>,
        data: HelperData,
    ) -> Result<HelperOutput, HelperError> {
        let resolved = resolve_arguments(
            self.descriptor.params(),
            invocation,
            self.options.base_url.as_deref(),
        );

        let ctx = HelperContext {
            options: &self.options,
            data,
            positional: invocation.positional,
            extra: resolved.extra,
        };

        trace!(helper = %self.name, index = ?data.index, "invoking helper");
        self.descriptor.invoke(&resolved.values, &ctx)
    }

    /// Runs a template call and converts the output into an engine value.
    ///
    /// Without `state` there is no loop data.
    pub(crate) fn evaluate(
        &self,
        state: Option<&State<'_, '_>>,
        args: &[Value],
    ) -> Result<Value, Error> {
        let invocation = Invocation::from_call(args)?;
        let data = HelperData {
            index: state.and_then(loop_index),
        };

        self.invoke(&invocation, data)
            .map(markup::transform)
            .map_err(|error| {
                Error::new(
                    ErrorKind::InvalidOperation,
                    format!("helper `{}` failed", self.name),
                )
                .with_source(HelperFailure {
                    name: self.name.clone(),
                    error,
                })
            })
    }
}

impl fmt::Debug for AdaptedHelper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptedHelper")
            .field("name", &self.name)
            .field("params", &self.descriptor.params())
            .finish()
    }
}

impl Object for AdaptedHelper {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Plain
    }

    fn call(self: &Arc<Self>, state: &State<'_, '_>, args: &[Value]) -> Result<Value, Error> {
        self.evaluate(Some(state), args)
    }

    /// A helper used without parentheses renders its no-argument output.
    ///
    /// Template output goes through the engine formatter, which calls the
    /// helper with loop data and reports its errors; this path covers
    /// stringification elsewhere (filters, concatenation), where neither is
    /// available and a failing helper renders nothing.
    fn render(self: &Arc<Self>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.evaluate(None, &[]) {
            Ok(value) => write!(f, "{value}"),
            Err(err) => {
                warn!(helper = %self.name, error = %err, "bare helper reference failed");
                Ok(())
            }
        }
    }
}

/// Zero-based index of the innermost `{% for %}` loop, if any.
///
/// `loop` is a reserved name: a value only counts as loop state when it has
/// both the `index0` and `depth0` attributes of the engine's loop object, so a
/// plain parameter called `loop` does not number anything.
fn loop_index(state: &State<'_, '_>) -> Option<usize> {
    let current = state.lookup("loop")?;
    current.get_attr("depth0").ok()?.as_usize()?;
    current.get_attr("index0").ok()?.as_usize()
}

/// Wraps every helper in `helpers` for one render call.
///
/// The result is meant to be merged into the template context.
pub fn adapt_helpers(helpers: &HelperSet, options: Arc<AmbientOptions>) -> BTreeMap<String, Value> {
    helpers
        .iter()
        .map(|(name, descriptor)| {
            let adapted = AdaptedHelper::new(name, descriptor.clone(), Arc::clone(&options));
            (name.to_string(), Value::from_object(adapted))
        })
        .collect()
}
