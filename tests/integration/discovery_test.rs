//! Integration tests for module discovery feeding the manager.

use std::path::Path;

use extcore_core::config::AppConfig;
use extcore_core::error::AppError;
use extcore_infrastructure::prelude::*;
use extcore_infrastructure::{
    DefaultModuleProvider, ExtCoreOptions, LinkedModule, ModuleLoader, ModuleOrigin,
};

/// Opens `.ext` files whose content is `ok`.
struct TextLoader;

impl ModuleLoader for TextLoader {
    fn accepts(&self, path: &Path) -> bool {
        path.extension().is_some_and(|extension| extension == "ext")
    }

    fn load(&self, path: &Path) -> AppResult<Module> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::module_load(format!("{}: {}", path.display(), e)))?;
        if content.trim() != "ok" {
            return Err(AppError::module_load(format!(
                "{} is not a module",
                path.display()
            )));
        }

        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();
        Ok(Module::builder(name).build())
    }
}

fn write(dir: &Path, file: &str, content: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(file), content).unwrap();
}

fn linked() -> Vec<&'static LinkedModule> {
    LinkedModule::retaining(&[extcore_events::register, extcore_data::register])
}

#[test]
fn test_discovery_from_configured_path() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "alpha.ext", "ok");
    write(dir.path(), "broken.ext", "garbage");
    write(&dir.path().join("nested"), "beta.ext", "ok");

    let config_path = dir.path().join("extcore.toml");
    std::fs::write(
        &config_path,
        format!(
            "[extensions]\npath = {:?}\nincluding_subpaths = true\n",
            dir.path().display().to_string()
        ),
    )
    .unwrap();
    let config = AppConfig::load(config_path.to_str().unwrap()).unwrap();

    let manager = ExtensionManager::new();
    let provider = DefaultModuleProvider::with_loader(TextLoader).with_linked(Vec::new());
    let report = extcore_infrastructure::discover_modules(
        &manager,
        &provider,
        &ExtCoreOptions::from_config(&config.extensions),
    );

    let names: Vec<String> = manager
        .modules()
        .unwrap()
        .iter()
        .map(|module| module.name().to_string())
        .collect();
    assert_eq!(names, ["alpha", "beta"]);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].path.ends_with("broken.ext"));
    assert!(matches!(
        manager.modules().unwrap()[0].origin(),
        ModuleOrigin::File(_)
    ));
}

#[test]
fn test_linked_crates_are_discovered_without_path() {
    let manager = ExtensionManager::new();
    let provider = DefaultModuleProvider::with_loader(TextLoader).with_linked(linked());

    extcore_infrastructure::discover_modules(&manager, &provider, &ExtCoreOptions::default());

    let modules = manager.modules().unwrap();
    let names: Vec<&str> = modules.iter().map(|module| module.name()).collect();
    assert!(names.contains(&"extcore-events"));
    assert!(names.contains(&"extcore-data"));
    assert!(modules
        .iter()
        .all(|module| *module.origin() == ModuleOrigin::Linked));
}

#[test]
fn test_file_module_shadowed_by_linked_module() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "EXTCORE-DATA.ext", "ok");
    write(dir.path(), "gamma.ext", "ok");

    let manager = ExtensionManager::new();
    let provider = DefaultModuleProvider::with_loader(TextLoader).with_linked(linked());
    let options = ExtCoreOptions {
        path: Some(dir.path().to_path_buf()),
        including_subpaths: false,
    };

    let report = extcore_infrastructure::discover_modules(&manager, &provider, &options);

    let data_modules = report
        .modules
        .iter()
        .filter(|module| module.name().eq_ignore_ascii_case("extcore-data"))
        .count();
    assert_eq!(data_modules, 1);
    assert!(report.modules.iter().any(|module| module.name() == "gamma"));
}

#[test]
fn test_rediscovery_replaces_module_set() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "alpha.ext", "ok");

    let manager = ExtensionManager::new();
    let provider = DefaultModuleProvider::with_loader(TextLoader).with_linked(Vec::new());
    let options = ExtCoreOptions {
        path: Some(dir.path().to_path_buf()),
        including_subpaths: false,
    };

    extcore_infrastructure::discover_modules(&manager, &provider, &options);
    let first = manager.generation();

    write(dir.path(), "beta.ext", "ok");
    extcore_infrastructure::discover_modules(&manager, &provider, &options);

    assert_ne!(manager.generation(), first);
    assert_eq!(manager.modules().unwrap().len(), 2);
}
