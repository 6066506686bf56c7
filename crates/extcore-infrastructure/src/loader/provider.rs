//! Default module discovery.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use extcore_core::error::AppError;

use super::{DynamicLoader, LinkedModule, ModuleLoader};
use crate::module::{Module, ModuleOrigin};

type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Names of toolchain and runtime crates that never carry extensions.
const RUNTIME_NAMES: &[&str] = &["std", "core", "alloc", "proc_macro", "test"];

/// A module file that could not be loaded.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleLoadFailure {
    /// The file.
    pub path: PathBuf,
    /// Why loading failed.
    pub error: String,
}

/// Outcome of a discovery run.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Discovered modules: linked ones first (sorted by name), then files in
    /// path order.
    pub modules: Vec<Module>,
    /// Files that failed to load.
    pub failures: Vec<ModuleLoadFailure>,
}

impl DiscoveryReport {
    fn contains(&self, name: &str) -> bool {
        self.modules
            .iter()
            .any(|module| module.name().eq_ignore_ascii_case(name))
    }
}

/// Discovers modules linked into the host and stored under a path.
///
/// A module file that fails to load is logged and recorded in the report;
/// discovery always continues with the remaining files.
pub struct DefaultModuleProvider<L = DynamicLoader> {
    loader: L,
    linked: Option<Vec<&'static LinkedModule>>,
    is_candidate_module: Predicate<Module>,
    is_candidate_library: Predicate<LinkedModule>,
}

impl DefaultModuleProvider<DynamicLoader> {
    /// A provider opening shared libraries with [`DynamicLoader`].
    pub fn new() -> Self {
        Self::with_loader(DynamicLoader::new())
    }
}

impl Default for DefaultModuleProvider<DynamicLoader> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ModuleLoader> DefaultModuleProvider<L> {
    /// A provider opening module files with `loader`.
    pub fn with_loader(loader: L) -> Self {
        Self {
            loader,
            linked: None,
            is_candidate_module: Box::new(|module: &Module| !is_runtime_name(module.name())),
            is_candidate_library: Box::new(|library: &LinkedModule| {
                !is_runtime_name(library.name())
            }),
        }
    }

    /// Uses `linked` instead of the modules submitted to the host binary.
    pub fn with_linked(mut self, linked: Vec<&'static LinkedModule>) -> Self {
        self.linked = Some(linked);
        self
    }

    /// Replaces the predicate applied to loaded module files.
    pub fn is_candidate_module<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Module) -> bool + Send + Sync + 'static,
    {
        self.is_candidate_module = Box::new(predicate);
        self
    }

    /// Replaces the predicate applied to linked modules before they are
    /// built.
    pub fn is_candidate_library<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&LinkedModule) -> bool + Send + Sync + 'static,
    {
        self.is_candidate_library = Box::new(predicate);
        self
    }

    /// Discovers linked modules, then the module files under `path`.
    ///
    /// Files are visited in name order, so repeated runs over the same
    /// directory yield the same module order.
    pub fn discover(&self, path: Option<&Path>, including_subpaths: bool) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();

        self.discover_linked(&mut report);

        match path {
            Some(path) if path.as_os_str().is_empty() => {
                warn!("Discovering modules from path skipped: path not provided");
            }
            Some(path) if !path.is_dir() => {
                warn!(
                    path = %path.display(),
                    "Discovering modules from path skipped: path not found"
                );
            }
            Some(path) => self.discover_path(&mut report, path, including_subpaths),
            None => {
                warn!("Discovering modules from path skipped: path not provided");
            }
        }

        info!(
            modules = report.modules.len(),
            failures = report.failures.len(),
            "Module discovery finished"
        );

        report
    }

    fn discover_linked(&self, report: &mut DiscoveryReport) {
        info!("Discovering modules linked into the host");

        let linked = match &self.linked {
            Some(linked) => linked.clone(),
            None => LinkedModule::all(),
        };

        for library in linked {
            if !(self.is_candidate_library)(library) {
                debug!(module = %library.name(), "Module skipped: not a candidate");
                continue;
            }
            if report.contains(library.name()) {
                debug!(module = %library.name(), "Module skipped: already discovered");
                continue;
            }

            let module = library.register();
            info!(module = %module.name(), origin = "linked", "Module discovered");
            report.modules.push(module);
        }
    }

    fn discover_path(&self, report: &mut DiscoveryReport, path: &Path, including_subpaths: bool) {
        info!(path = %path.display(), "Discovering modules from path");

        let (files, directories) = match list_directory(path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Path could not be read");
                return;
            }
        };

        for file in files.into_iter().filter(|file| self.loader.accepts(file)) {
            match self.loader.load(&file) {
                Ok(module) => {
                    let module = module.with_origin(ModuleOrigin::File(file.clone()));
                    if !(self.is_candidate_module)(&module) {
                        debug!(
                            module = %module.name(),
                            path = %file.display(),
                            "Module skipped: not a candidate"
                        );
                        continue;
                    }
                    if report.contains(module.name()) {
                        debug!(
                            module = %module.name(),
                            path = %file.display(),
                            "Module skipped: already discovered"
                        );
                        continue;
                    }

                    info!(
                        module = %module.name(),
                        path = %file.display(),
                        "Module discovered"
                    );
                    report.modules.push(module);
                }
                Err(e) => {
                    warn!(path = %file.display(), error = %e, "Error loading module");
                    report.failures.push(ModuleLoadFailure {
                        path: file,
                        error: e.to_string(),
                    });
                }
            }
        }

        if including_subpaths {
            for directory in directories {
                self.discover_path(report, &directory, including_subpaths);
            }
        }
    }
}

impl<L> fmt::Debug for DefaultModuleProvider<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultModuleProvider")
            .field("loader", &std::any::type_name::<L>())
            .field("linked", &self.linked.as_ref().map(Vec::len))
            .finish()
    }
}

/// Whole-name match, ignoring case and `-`/`_` spelling.
fn is_runtime_name(name: &str) -> bool {
    let name = name.to_ascii_lowercase().replace('-', "_");
    RUNTIME_NAMES.contains(&name.as_str())
}

/// Files and subdirectories of `path`, each sorted by name.
fn list_directory(path: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>), AppError> {
    let mut files = Vec::new();
    let mut directories = Vec::new();

    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            directories.push(entry.path());
        } else if file_type.is_file() {
            files.push(entry.path());
        }
    }

    files.sort();
    directories.sort();
    Ok((files, directories))
}
