//! Module catalog.
//!
//! [`ExtensionManager`] owns the active module set. Every module set lives in
//! a generation together with the caches derived from it; replacing the
//! module set swaps in a fresh generation in one atomic store, so a reader
//! sees either the old modules with the old caches or the new modules with
//! empty caches, never a mix of both.

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use tracing::{debug, info, warn};

use extcore_core::error::AppError;
use extcore_core::result::AppResult;

use crate::capability::CapabilityId;
use crate::extension::{Extension, ExtensionInfo};
use crate::factory::Instance;
use crate::module::Module;

/// Cache key: capability plus module-filter identity.
pub(crate) type TypeCacheKey = (CapabilityId, Arc<str>);

/// One module set and everything computed from it.
pub(crate) struct Generation {
    pub(crate) id: u64,
    pub(crate) modules: Arc<[Module]>,
    pub(crate) types: DashMap<TypeCacheKey, Arc<[crate::resolver::Implementation]>>,
    descriptors: OnceLock<Arc<[ExtensionDescriptor]>>,
}

impl Generation {
    fn new(id: u64, modules: Arc<[Module]>) -> Self {
        Self {
            id,
            modules,
            types: DashMap::new(),
            descriptors: OnceLock::new(),
        }
    }

    fn descriptors(&self) -> Arc<[ExtensionDescriptor]> {
        let descriptors = self.descriptors.get_or_init(|| {
            let mut descriptors = Vec::new();

            for module in self.modules.iter() {
                let Some(exported) = module.descriptor_type() else {
                    continue;
                };

                let implementation =
                    crate::resolver::Implementation::new(module, Arc::clone(exported));
                match implementation.instantiate::<dyn Extension>() {
                    Ok(instance) => descriptors.push(ExtensionDescriptor {
                        module: module.shared_name(),
                        instance,
                    }),
                    Err(e) => warn!(
                        module = %module.name(),
                        type_name = %exported.name(),
                        error = %e,
                        "Extension descriptor could not be instantiated"
                    ),
                }
            }

            debug!(
                generation = self.id,
                descriptors = descriptors.len(),
                "Extension descriptors computed"
            );

            descriptors.into()
        });

        Arc::clone(descriptors)
    }
}

/// A module's root descriptor, instantiated.
pub struct ExtensionDescriptor {
    module: Arc<str>,
    instance: Instance<dyn Extension>,
}

impl ExtensionDescriptor {
    /// Name of the module that exported the descriptor.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Owned snapshot of the descriptor's values.
    pub fn info(&self) -> ExtensionInfo {
        ExtensionInfo::from_extension(&**self)
    }
}

impl Deref for ExtensionDescriptor {
    type Target = dyn Extension;

    fn deref(&self) -> &Self::Target {
        &*self.instance
    }
}

impl fmt::Debug for ExtensionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionDescriptor")
            .field("module", &self.module)
            .field("name", &self.instance.name())
            .finish()
    }
}

/// The module catalog.
///
/// One manager is created by the host's bootstrap routine and passed to
/// every phase that needs it; tests create their own.
pub struct ExtensionManager {
    current: ArcSwapOption<Generation>,
    generations: AtomicU64,
}

impl ExtensionManager {
    /// Creates a manager with no module set.
    pub fn new() -> Self {
        Self {
            current: ArcSwapOption::empty(),
            generations: AtomicU64::new(0),
        }
    }

    /// Creates a manager already holding `modules`.
    pub fn with_modules(modules: impl IntoIterator<Item = Module>) -> Self {
        let manager = Self::new();
        manager.set_modules(modules);
        manager
    }

    /// Replaces the module set.
    ///
    /// Lookup and descriptor caches belong to the replaced set and are
    /// discarded with it.
    pub fn set_modules(&self, modules: impl IntoIterator<Item = Module>) {
        let modules: Arc<[Module]> = modules.into_iter().collect();
        let id = self.generations.fetch_add(1, Ordering::AcqRel) + 1;

        for module in modules.iter() {
            debug!(
                module = %module.name(),
                origin = %module.origin(),
                types = module.types().len(),
                "Module registered"
            );
        }

        info!(generation = id, modules = modules.len(), "Module set replaced");

        self.current.store(Some(Arc::new(Generation::new(id, modules))));
    }

    /// Whether a module set has been established.
    pub fn is_initialized(&self) -> bool {
        self.current.load().is_some()
    }

    /// Sequence number of the active module set, starting at 1.
    pub fn generation(&self) -> Option<u64> {
        self.current.load_full().map(|generation| generation.id)
    }

    /// The active module set, in registration order.
    pub fn modules(&self) -> AppResult<Arc<[Module]>> {
        self.snapshot()
            .map(|generation| Arc::clone(&generation.modules))
            .ok_or_else(Self::not_initialized)
    }

    /// Instantiated root descriptors of the active modules.
    ///
    /// Computed on first use and reused until the module set is replaced.
    /// A descriptor that fails to instantiate is logged and left out.
    pub fn extension_descriptors(&self) -> AppResult<Arc<[ExtensionDescriptor]>> {
        self.snapshot()
            .map(|generation| generation.descriptors())
            .ok_or_else(Self::not_initialized)
    }

    pub(crate) fn snapshot(&self) -> Option<Arc<Generation>> {
        self.current.load_full()
    }

    fn not_initialized() -> AppError {
        AppError::not_initialized("No module set has been established")
    }
}

impl Default for ExtensionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExtensionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let current = self.current.load_full();
        f.debug_struct("ExtensionManager")
            .field("generation", &current.as_ref().map(|g| g.id))
            .field("modules", &current.as_ref().map(|g| g.modules.len()))
            .finish()
    }
}
