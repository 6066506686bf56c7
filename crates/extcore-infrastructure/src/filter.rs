//! Module selectors.

use std::fmt;
use std::sync::Arc;

use crate::module::Module;

type Predicate = Arc<dyn Fn(&Module) -> bool + Send + Sync>;

/// Selects which modules a lookup scans.
///
/// The `key` is the filter's cache identity: two filters with the same key
/// share cached lookup results. A custom filter must therefore be pure and
/// its key must change whenever its behavior does, or cached results from
/// one predicate will be served for another.
#[derive(Clone)]
pub struct ModuleFilter {
    key: Arc<str>,
    predicate: Option<Predicate>,
}

impl ModuleFilter {
    /// Accepts every module.
    pub fn all() -> Self {
        Self {
            key: Arc::from("*"),
            predicate: None,
        }
    }

    /// Accepts modules whose name contains `fragment`, ignoring case.
    pub fn name_contains(fragment: impl Into<String>) -> Self {
        let fragment = fragment.into().to_lowercase();
        Self {
            key: Arc::from(format!("contains:{fragment}")),
            predicate: Some(Arc::new(move |module: &Module| {
                module.name().to_lowercase().contains(&fragment)
            })),
        }
    }

    /// Accepts modules whose name starts with `prefix`, ignoring case.
    pub fn name_starts_with(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into().to_lowercase();
        Self {
            key: Arc::from(format!("prefix:{prefix}")),
            predicate: Some(Arc::new(move |module: &Module| {
                module.name().to_lowercase().starts_with(&prefix)
            })),
        }
    }

    /// An arbitrary predicate identified by `key`.
    ///
    /// Cached lookups are keyed by `key` alone: two different predicates
    /// sharing a key share cache entries.
    pub fn custom<F>(key: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Module) -> bool + Send + Sync + 'static,
    {
        Self {
            key: Arc::from(format!("custom:{}", key.into())),
            predicate: Some(Arc::new(predicate)),
        }
    }

    /// The cache identity of this filter.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn shared_key(&self) -> Arc<str> {
        Arc::clone(&self.key)
    }

    /// Whether `module` passes the filter.
    pub fn matches(&self, module: &Module) -> bool {
        self.predicate.as_ref().is_none_or(|predicate| predicate(module))
    }
}

impl Default for ModuleFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Debug for ModuleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ModuleFilter").field(&self.key).finish()
    }
}
