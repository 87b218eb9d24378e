//! Compiled-template cache.
//!
//! Templates are compiled once per distinct [`CacheKey`] and shared for the
//! lifetime of the owning renderer. Entries never expire and are never
//! re-validated against the filesystem.
//!
//! # Concurrency
//!
//! The map lock is held only while fetching or inserting a key's slot.
//! Compilation runs inside the slot's [`OnceCell`], so when several threads
//! miss on the same key one of them compiles and the rest wait for and reuse
//! its result. A failed compilation leaves the slot empty; the next request
//! for that key tries again.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use once_cell::sync::OnceCell;
use tracing::{debug, trace};

use super::engine::CompiledTemplate;
use crate::error::RenderError;

/// Identity of a cached template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Identifier as passed by the caller (file name or inline source).
    pub identifier: String,
    /// Directory the identifier was resolved against.
    pub dir: Option<PathBuf>,
    /// Escaping is fixed at compile time.
    pub auto_escape: bool,
}

impl CacheKey {
    pub fn new(identifier: impl Into<String>, dir: Option<PathBuf>, auto_escape: bool) -> Self {
        Self {
            identifier: identifier.into(),
            dir,
            auto_escape,
        }
    }
}

type Slot = Arc<OnceCell<Arc<CompiledTemplate>>>;

/// Thread-safe map from [`CacheKey`] to compiled template.
#[derive(Debug, Default)]
pub struct TemplateCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the template for `key`, calling `compile` on a miss.
    ///
    /// `compile` runs at most once per key unless it fails.
    pub fn get_or_compile<F>(
        &self,
        key: CacheKey,
        compile: F,
    ) -> Result<Arc<CompiledTemplate>, RenderError>
    where
        F: FnOnce() -> Result<CompiledTemplate, RenderError>,
    {
        let slot = {
            let mut slots = self.lock();
            match slots.get(&key) {
                Some(slot) => Arc::clone(slot),
                None => Arc::clone(slots.entry(key.clone()).or_default()),
            }
        };

        if let Some(compiled) = slot.get() {
            trace!(template = %short(&key.identifier), "template cache hit");
            return Ok(Arc::clone(compiled));
        }

        let compiled = slot.get_or_try_init(|| {
            debug!(
                template = %short(&key.identifier),
                dir = ?key.dir,
                auto_escape = key.auto_escape,
                "compiling template"
            );
            compile().map(Arc::new)
        })?;
        Ok(Arc::clone(compiled))
    }

    /// Number of successfully compiled templates.
    pub fn len(&self) -> usize {
        self.lock().values().filter(|slot| slot.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a compiled template is cached for `key`.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.lock()
            .get(key)
            .is_some_and(|slot| slot.get().is_some())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Slot>> {
        // The map holds no invariant a panicking thread could break.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// First line of an identifier, for log fields. Inline sources can be long.
fn short(identifier: &str) -> &str {
    let line = identifier.lines().next().unwrap_or_default();
    match line.char_indices().nth(40) {
        Some((end, _)) => &line[..end],
        None => line,
    }
}
