//! Capability lookup across the active module set.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error};

use extcore_core::error::AppError;
use extcore_core::result::AppResult;

use crate::capability::CapabilityId;
use crate::filter::ModuleFilter;
use crate::manager::{ExtensionManager, Generation};
use crate::module::{Anchor, ExportedType, Module};

/// An exported type found to implement a capability.
#[derive(Clone)]
pub struct Implementation {
    module: Arc<str>,
    exported: Arc<ExportedType>,
    anchor: Option<Anchor>,
}

impl Implementation {
    pub(crate) fn new(module: &Module, exported: Arc<ExportedType>) -> Self {
        Self {
            module: module.shared_name(),
            exported,
            anchor: module.anchor().cloned(),
        }
    }

    /// Name of the owning module.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Fully-qualified name of the implementing type.
    pub fn type_name(&self) -> &str {
        self.exported.name()
    }

    /// Whether the type is abstract.
    pub fn is_abstract(&self) -> bool {
        self.exported.is_abstract()
    }

    /// The exported type's registration.
    pub fn exported_type(&self) -> &ExportedType {
        &self.exported
    }

    /// Assigns a type-level property by name.
    pub fn set_property(&self, name: &str, value: &str) -> AppResult<()> {
        if self.exported.set_property(name, value) {
            debug!(
                type_name = %self.type_name(),
                property = %name,
                "Property assigned"
            );
            Ok(())
        } else {
            Err(AppError::not_found(format!(
                "'{}' declares no property '{}'",
                self.type_name(),
                name
            )))
        }
    }
}

impl PartialEq for Implementation {
    fn eq(&self, other: &Self) -> bool {
        self.module == other.module && Arc::ptr_eq(&self.exported, &other.exported)
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Implementation")
            .field("module", &self.module)
            .field("type_name", &self.type_name())
            .field("is_abstract", &self.is_abstract())
            .finish()
    }
}

/// Options of a capability lookup.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    filter: ModuleFilter,
    use_caching: bool,
}

impl ResolveOptions {
    /// Scan every module, uncached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the scan to modules accepted by `filter`.
    pub fn filter(mut self, filter: ModuleFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Memoizes the result per capability and filter key for the lifetime of
    /// the current module set.
    pub fn cached(self) -> Self {
        self.use_caching(true)
    }

    /// Sets whether the result is memoized.
    pub fn use_caching(mut self, use_caching: bool) -> Self {
        self.use_caching = use_caching;
        self
    }

    /// The module filter.
    pub fn module_filter(&self) -> &ModuleFilter {
        &self.filter
    }

    /// Whether the result is memoized.
    pub fn is_cached(&self) -> bool {
        self.use_caching
    }
}

impl Generation {
    pub(crate) fn implementations(
        &self,
        capability: CapabilityId,
        options: &ResolveOptions,
    ) -> Arc<[Implementation]> {
        if !options.use_caching {
            return self.scan(capability, &options.filter);
        }

        let key = (capability, options.filter.shared_key());
        if let Some(cached) = self.types.get(&key) {
            return Arc::clone(cached.value());
        }

        let found = self.scan(capability, &options.filter);
        Arc::clone(self.types.entry(key).or_insert(found).value())
    }

    fn scan(&self, capability: CapabilityId, filter: &ModuleFilter) -> Arc<[Implementation]> {
        let found: Arc<[Implementation]> = self
            .modules
            .iter()
            .filter(|module| filter.matches(module))
            .flat_map(|module| {
                module
                    .types()
                    .iter()
                    .filter(move |exported| exported.implements(capability))
                    .map(move |exported| Implementation::new(module, Arc::clone(exported)))
            })
            .collect();

        debug!(
            capability = %capability,
            filter = %filter.key(),
            generation = self.id,
            found = found.len(),
            "Capability scanned"
        );

        found
    }
}

impl ExtensionManager {
    /// Every exported type implementing `C`, abstract ones included.
    ///
    /// Modules are scanned in registration order and types in declaration
    /// order. Before any module set is established the result is empty.
    pub fn find_implementations<C: ?Sized + 'static>(
        &self,
        options: &ResolveOptions,
    ) -> Arc<[Implementation]> {
        self.implementations_of(CapabilityId::of::<C>(), options)
    }

    /// Untyped variant of [`find_implementations`](Self::find_implementations).
    pub fn implementations_of(
        &self,
        capability: CapabilityId,
        options: &ResolveOptions,
    ) -> Arc<[Implementation]> {
        match self.snapshot() {
            Some(generation) => generation.implementations(capability, options),
            None => Arc::from(Vec::new()),
        }
    }

    /// The first exported type implementing `C`, if any.
    pub fn find_implementation<C: ?Sized + 'static>(
        &self,
        options: &ResolveOptions,
    ) -> Option<Implementation> {
        self.find_implementations::<C>(options).first().cloned()
    }

    /// The first exported type implementing `C`.
    ///
    /// Fails with `ImplementationNotFound` when no module exports one.
    pub fn require_implementation<C: ?Sized + 'static>(
        &self,
        options: &ResolveOptions,
    ) -> AppResult<Implementation> {
        self.find_implementation::<C>(options).ok_or_else(|| {
            let capability = CapabilityId::of::<C>();
            error!(
                capability = %capability,
                filter = %options.filter.key(),
                "Required implementation not found"
            );
            AppError::implementation_not_found(format!(
                "No implementation of '{}' found in modules matching '{}'",
                capability,
                options.filter.key()
            ))
        })
    }
}
