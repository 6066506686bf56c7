//! Host lifecycle entry points.
//!
//! A host calls these in order:
//!
//! 1. [`discover_modules`]: load modules and establish the module set.
//! 2. [`use_extcore_host`]: run configure-host actions (strict).
//! 3. [`add_extcore`]: register the manager and run configure-services
//!    actions (strict).
//! 4. [`use_extcore`]: run configure actions against the application
//!    (lenient).
//!
//! Strict phases stop at the first failing action. The pipeline phase logs
//! failures and keeps going.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use extcore_core::config::ExtensionsConfig;
use extcore_core::result::AppResult;

use crate::actions::{ConfigureAction, ConfigureHostAction, ConfigureServicesAction};
use crate::factory::InstantiationPolicy;
use crate::loader::{DefaultModuleProvider, DiscoveryReport, ModuleLoader};
use crate::manager::ExtensionManager;
use crate::resolver::ResolveOptions;
use crate::services::{ServiceCollection, ServiceProvider};

/// Where modules are discovered.
#[derive(Debug, Clone, Default)]
pub struct ExtCoreOptions {
    /// Extensions directory.
    pub path: Option<PathBuf>,
    /// Whether subdirectories are scanned too.
    pub including_subpaths: bool,
}

impl ExtCoreOptions {
    /// Options taken from the `extensions` configuration section.
    pub fn from_config(config: &ExtensionsConfig) -> Self {
        Self {
            path: config.path_buf(),
            including_subpaths: config.including_subpaths,
        }
    }
}

/// Discovers modules and makes them the manager's module set.
pub fn discover_modules<L: ModuleLoader>(
    manager: &ExtensionManager,
    provider: &DefaultModuleProvider<L>,
    options: &ExtCoreOptions,
) -> DiscoveryReport {
    let report = provider.discover(options.path.as_deref(), options.including_subpaths);
    manager.set_modules(report.modules.iter().cloned());
    report
}

/// Registers `manager` as a service, then runs every
/// [`ConfigureServicesAction`].
///
/// Returns the provider snapshot taken after the last action.
pub fn add_extcore(
    services: &mut ServiceCollection,
    manager: Arc<ExtensionManager>,
) -> AppResult<ServiceProvider> {
    services.add_singleton::<ExtensionManager>(Arc::clone(&manager));
    configure_services(&manager, services)
}

/// Runs every [`ConfigureServicesAction`] in priority order.
///
/// Each action receives a provider rebuilt after the previous action, so it
/// sees everything registered so far. Actions are resolved once; types that
/// become available while the phase runs are not picked up.
pub fn configure_services(
    manager: &ExtensionManager,
    services: &mut ServiceCollection,
) -> AppResult<ServiceProvider> {
    let mut provider = services.build_provider();

    let executed = manager.broadcast_with::<dyn ConfigureServicesAction, _>(
        &ResolveOptions::new(),
        InstantiationPolicy::Strict,
        |action| {
            action.execute(services, &provider)?;
            provider = services.build_provider();
            Ok(())
        },
    )?;

    info!(actions = executed.len(), services = provider.len(), "Services configured");
    Ok(provider)
}

/// Runs every [`ConfigureAction`] for application type `App`.
pub fn use_extcore<App: 'static>(
    manager: &ExtensionManager,
    app: &mut App,
    provider: &ServiceProvider,
) -> AppResult<()> {
    let executed = manager.broadcast_with::<dyn ConfigureAction<App>, _>(
        &ResolveOptions::new(),
        InstantiationPolicy::Lenient,
        |action| action.execute(app, provider),
    )?;

    info!(actions = executed.len(), "Application configured");
    Ok(())
}

/// Runs every [`ConfigureHostAction`] for host type `Host`.
pub fn use_extcore_host<Host: 'static>(
    manager: &ExtensionManager,
    host: &mut Host,
    services: &mut ServiceCollection,
) -> AppResult<()> {
    let executed = manager.broadcast_with::<dyn ConfigureHostAction<Host>, _>(
        &ResolveOptions::new(),
        InstantiationPolicy::Strict,
        |action| action.execute(host, services),
    )?;

    info!(actions = executed.len(), "Host configured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::dispatch::Prioritized;
    use crate::host::ConsoleHost;
    use crate::module::{Module, TypeExport};
    use extcore_core::error::AppError;
    use extcore_core::ErrorKind;

    /// Records the number of services visible when it ran, then registers
    /// its own marker.
    struct Register {
        priority: i32,
        seen: Arc<Mutex<Vec<(i32, usize)>>>,
    }

    impl Prioritized for Register {
        fn priority(&self) -> i32 {
            self.priority
        }
    }

    impl ConfigureServicesAction for Register {
        fn execute(
            &self,
            services: &mut ServiceCollection,
            provider: &ServiceProvider,
        ) -> AppResult<()> {
            self.seen.lock().unwrap().push((self.priority, provider.len()));
            services.add_singleton::<i32>(Arc::new(self.priority));
            Ok(())
        }
    }

    struct Failing;

    impl Prioritized for Failing {
        fn priority(&self) -> i32 {
            15
        }
    }

    impl ConfigureServicesAction for Failing {
        fn execute(&self, _: &mut ServiceCollection, _: &ServiceProvider) -> AppResult<()> {
            Err(AppError::configuration("missing connection string"))
        }
    }

    impl<Host: 'static> ConfigureAction<Host> for Failing {
        fn execute(&self, _: &mut Host, _: &ServiceProvider) -> AppResult<()> {
            Err(AppError::internal("pipeline step failed"))
        }
    }

    struct AddTask(&'static str, i32);

    impl Prioritized for AddTask {
        fn priority(&self) -> i32 {
            self.1
        }
    }

    impl ConfigureAction<ConsoleHost> for AddTask {
        fn execute(&self, host: &mut ConsoleHost, _: &ServiceProvider) -> AppResult<()> {
            host.add_task(self.0, |_| Ok(()));
            Ok(())
        }
    }

    impl ConfigureHostAction<ConsoleHost> for AddTask {
        fn execute(&self, host: &mut ConsoleHost, _: &mut ServiceCollection) -> AppResult<()> {
            host.add_task(format!("host:{}", self.0), |_| Ok(()));
            Ok(())
        }
    }

    fn register(priority: i32, seen: &Arc<Mutex<Vec<(i32, usize)>>>) -> TypeExport<Register> {
        let seen = Arc::clone(seen);
        TypeExport::<Register>::new(format!("tests::Register{priority}"))
            .implements::<dyn ConfigureServicesAction>(|t| Box::new(t))
            .constructor(move || Register {
                priority,
                seen: Arc::clone(&seen),
            })
    }

    fn add_task(label: &'static str, priority: i32) -> TypeExport<AddTask> {
        TypeExport::<AddTask>::new(format!("tests::{label}"))
            .implements::<dyn ConfigureAction<ConsoleHost>>(|t| Box::new(t))
            .implements::<dyn ConfigureHostAction<ConsoleHost>>(|t| Box::new(t))
            .constructor(move || AddTask(label, priority))
    }

    #[test]
    fn test_each_action_sees_previous_registrations() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let manager = Arc::new(ExtensionManager::with_modules([Module::builder("actions")
            .export(register(30, &seen))
            .export(register(10, &seen))
            .export(register(20, &seen))
            .build()]));

        let mut services = ServiceCollection::new();
        let provider = add_extcore(&mut services, Arc::clone(&manager)).unwrap();

        // The manager itself is registered first.
        assert_eq!(*seen.lock().unwrap(), [(10, 1), (20, 2), (30, 3)]);
        assert_eq!(provider.len(), 4);
        assert!(provider.contains::<ExtensionManager>());
        assert_eq!(*provider.require::<i32>().unwrap(), 30);
    }

    #[test]
    fn test_configure_services_is_strict() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let manager = ExtensionManager::with_modules([Module::builder("actions")
            .export(register(10, &seen))
            .export(
                TypeExport::<Failing>::new("tests::Failing")
                    .implements::<dyn ConfigureServicesAction>(|t| Box::new(t))
                    .constructor(|| Failing),
            )
            .export(register(20, &seen))
            .build()]);

        let mut services = ServiceCollection::new();
        let err = configure_services(&manager, &mut services).unwrap_err();

        assert!(err.is(ErrorKind::Configuration));
        assert_eq!(*seen.lock().unwrap(), [(10, 0)]);
    }

    #[test]
    fn test_configure_is_lenient_and_host_actions_run_first() {
        let manager = ExtensionManager::with_modules([Module::builder("pipeline")
            .export(add_task("second", 2))
            .export(
                TypeExport::<Failing>::new("tests::Failing")
                    .implements::<dyn ConfigureAction<ConsoleHost>>(|t| Box::new(t))
                    .constructor(|| Failing),
            )
            .export(add_task("first", 1))
            .build()]);

        let mut host = ConsoleHost::new("test");
        let mut services = ServiceCollection::new();

        use_extcore_host(&manager, &mut host, &mut services).unwrap();
        let provider = configure_services(&manager, &mut services).unwrap();
        use_extcore(&manager, &mut host, &provider).unwrap();

        assert_eq!(
            host.task_names().collect::<Vec<_>>(),
            ["host:first", "host:second", "first", "second"]
        );
    }

    #[test]
    fn test_phases_without_modules_do_nothing() {
        let manager = Arc::new(ExtensionManager::new());
        let mut services = ServiceCollection::new();
        let provider = add_extcore(&mut services, manager).unwrap();
        assert_eq!(provider.len(), 1);
    }
}
