//! Shared library module loader (feature-gated).
//!
//! A module library exports two symbols, both generated by
//! [`export_module!`](crate::export_module):
//!
//! - `extcore_abi_version`: `extern "C" fn() -> u32`, returning [`ABI_VERSION`].
//! - `extcore_module_entry`: `extern "C" fn() -> *mut Module`, returning a
//!   boxed [`Module`].
//!
//! Module and host exchange Rust trait objects, so both must be built with
//! the same toolchain and the same version of this crate.

use std::path::Path;

use extcore_core::result::AppResult;

use super::ModuleLoader;
use crate::module::Module;

/// Version of the module entry contract.
pub const ABI_VERSION: u32 = 1;

/// Symbol returning the module's ABI version.
pub const ABI_VERSION_SYMBOL: &[u8] = b"extcore_abi_version";

/// Symbol returning the module registration.
pub const MODULE_ENTRY_SYMBOL: &[u8] = b"extcore_module_entry";

/// Signature of [`ABI_VERSION_SYMBOL`].
pub type AbiVersionFn = unsafe extern "C" fn() -> u32;

/// Signature of [`MODULE_ENTRY_SYMBOL`].
pub type ModuleEntryFn = unsafe extern "C" fn() -> *mut Module;

/// Opens module shared libraries (.so / .dll / .dylib).
///
/// A loaded library stays mapped for as long as its module, or anything
/// resolved from it, is alive.
#[derive(Debug, Default)]
pub struct DynamicLoader;

impl DynamicLoader {
    /// Creates a loader.
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "dynamic")]
impl ModuleLoader for DynamicLoader {
    fn load(&self, path: &Path) -> AppResult<Module> {
        use std::sync::Arc;

        use extcore_core::error::{AppError, ErrorKind};
        use tracing::info;

        let load_error = |what: &str, e: libloading::Error| {
            AppError::with_source(
                ErrorKind::ModuleLoad,
                format!("{} '{}': {}", what, path.display(), e),
                e,
            )
        };

        // SAFETY: opening a library runs its initializers. Only trusted
        // extension directories may be configured.
        let library = unsafe { libloading::Library::new(path) }
            .map_err(|e| load_error("Failed to load module library", e))?;

        // SAFETY: the symbol type matches the contract documented above.
        let version = unsafe {
            let symbol: libloading::Symbol<AbiVersionFn> = library
                .get(ABI_VERSION_SYMBOL)
                .map_err(|e| load_error("Missing ABI version symbol in", e))?;
            symbol()
        };

        if version != ABI_VERSION {
            return Err(AppError::module_load(format!(
                "Module library '{}' targets ABI version {}, host supports {}",
                path.display(),
                version,
                ABI_VERSION
            )));
        }

        // SAFETY: as above; the pointer is produced by `Box::into_raw` in
        // `export_module!` and ownership passes to the host exactly once.
        let module = unsafe {
            let entry: libloading::Symbol<ModuleEntryFn> = library
                .get(MODULE_ENTRY_SYMBOL)
                .map_err(|e| load_error("Missing module entry symbol in", e))?;
            let raw = entry();
            if raw.is_null() {
                return Err(AppError::module_load(format!(
                    "Module entry of '{}' returned no module",
                    path.display()
                )));
            }
            *Box::from_raw(raw)
        };

        info!(
            path = %path.display(),
            module = %module.name(),
            "Dynamic module loaded"
        );

        Ok(module.with_anchor(Arc::new(library)))
    }
}

#[cfg(not(feature = "dynamic"))]
impl ModuleLoader for DynamicLoader {
    fn load(&self, path: &Path) -> AppResult<Module> {
        Err(extcore_core::error::AppError::module_load(format!(
            "Cannot load '{}': dynamic module loading is disabled",
            path.display()
        )))
    }
}
