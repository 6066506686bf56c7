//! Module discovery and loading.
//!
//! Modules reach the host two ways: crates linked into the host binary
//! submit a [`LinkedModule`], and shared libraries found under the
//! extensions path are opened by a [`ModuleLoader`]. The
//! [`DefaultModuleProvider`] combines both.

use std::path::Path;

use extcore_core::result::AppResult;

use crate::module::Module;

pub mod dynamic;
pub mod linked;
pub mod provider;

pub use dynamic::DynamicLoader;
pub use linked::LinkedModule;
pub use provider::{DefaultModuleProvider, DiscoveryReport, ModuleLoadFailure};

/// Opens module files.
pub trait ModuleLoader: Send + Sync {
    /// Whether `path` looks like a module file this loader can open.
    ///
    /// Defaults to the platform's shared library extension.
    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| {
                extension.eq_ignore_ascii_case(std::env::consts::DLL_EXTENSION)
            })
    }

    /// Loads the module stored at `path`.
    fn load(&self, path: &Path) -> AppResult<Module>;
}
