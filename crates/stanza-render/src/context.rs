//! Ambient context handed to helpers.
//!
//! Every helper invocation receives a [`HelperContext`] after its resolved
//! arguments. It carries two things:
//!
//! 1. [`AmbientOptions`]: render-wide settings (base URL, template directory)
//!    and injected services (clock, date/time formatter).
//! 2. [`HelperData`]: per-invocation data supplied by the evaluator, such as
//!    the index of the enclosing loop iteration.
//!
//! It also exposes the raw positional values of the call and any named values
//! that did not bind to a declared parameter, for helpers that take a
//! variable number of arguments or forward extra attributes.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use minijinja::Value;

use crate::datetime::{ChronoFormatter, Clock, DateTimeFormatter, SystemClock};

/// Render-wide options visible to every helper.
///
/// Built once per render call from the merged renderer and request options.
/// Cheap to clone: services are shared behind `Arc`.
#[derive(Clone)]
pub struct AmbientOptions {
    /// Base URL prefixed to root-relative `url`/`href` arguments.
    pub base_url: Option<String>,

    /// Directory templates were resolved from, if any.
    pub dir: Option<PathBuf>,

    /// Source of "now" for date helpers called without a value.
    pub clock: Arc<dyn Clock>,

    /// Date/time formatter used by the date helper family.
    pub formatter: Arc<dyn DateTimeFormatter>,
}

impl AmbientOptions {
    /// Creates options with the system clock and a UTC formatter.
    pub fn new() -> Self {
        Self {
            base_url: None,
            dir: None,
            clock: Arc::new(SystemClock),
            formatter: Arc::new(ChronoFormatter::default()),
        }
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Replaces the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the date/time formatter.
    pub fn with_formatter(mut self, formatter: Arc<dyn DateTimeFormatter>) -> Self {
        self.formatter = formatter;
        self
    }
}

impl Default for AmbientOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AmbientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AmbientOptions")
            .field("base_url", &self.base_url)
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

/// Per-invocation data supplied by the evaluator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HelperData {
    /// Zero-based index of the innermost enclosing loop iteration.
    pub index: Option<usize>,
}

/// Trailing context object passed to every helper.
#[derive(Debug, Clone)]
pub struct HelperContext<'a> {
    /// Render-wide options.
    pub options: &'a AmbientOptions,

    /// Evaluator-supplied data for this call.
    pub data: HelperData,

    /// Positional values exactly as written at the call site.
    pub positional: &'a [Value],

    /// Named values that bound no declared parameter and were not consumed
    /// by URL templating.
    pub extra: BTreeMap<String, Value>,
}

impl<'a> HelperContext<'a> {
    /// Creates a context with no loop data and no call-site values.
    pub fn new(options: &'a AmbientOptions) -> Self {
        Self {
            options,
            data: HelperData::default(),
            positional: &[],
            extra: BTreeMap::new(),
        }
    }

    /// Sets the loop index.
    pub fn with_index(mut self, index: usize) -> Self {
        self.data.index = Some(index);
        self
    }
}
