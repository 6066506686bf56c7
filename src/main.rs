//! ExtCore console host.
//!
//! Discovers extension modules, runs their lifecycle actions and then runs
//! the tasks they queued on the host.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use extcore_core::config::AppConfig;
use extcore_core::error::AppError;
use extcore_infrastructure::{
    ConsoleHost, DefaultModuleProvider, ExtCoreOptions, ExtensionManager, LinkedModule,
    ServiceCollection,
};

fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config) {
        tracing::error!("Host error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("EXTCORE_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

    AppConfig::load(&config_path)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Extension crates compiled into this binary.
fn linked_modules() -> Vec<&'static LinkedModule> {
    LinkedModule::retaining(&[extcore_events::register, extcore_data::register])
}

/// Main host run function
fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting ExtCore host v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Discover modules ─────────────────────────────────
    let options = ExtCoreOptions::from_config(&config.extensions);
    let manager = Arc::new(ExtensionManager::new());
    let provider = DefaultModuleProvider::new().with_linked(linked_modules());
    let report = extcore_infrastructure::discover_modules(&manager, &provider, &options);

    for failure in &report.failures {
        tracing::warn!(path = %failure.path.display(), "Module skipped: {}", failure.error);
    }

    for descriptor in manager.extension_descriptors()?.iter() {
        let info = descriptor.info();
        tracing::info!(
            module = %descriptor.module(),
            name = %info.name,
            version = info.version.as_deref().unwrap_or("-"),
            "Extension loaded"
        );
    }

    // ── Step 2: Configure host and services ──────────────────────
    let mut host = ConsoleHost::new("extcore-host");
    let mut services = ServiceCollection::new();
    services.add_singleton::<AppConfig>(Arc::new(config));

    extcore_infrastructure::use_extcore_host(&manager, &mut host, &mut services)?;
    let service_provider = extcore_infrastructure::add_extcore(&mut services, Arc::clone(&manager))?;

    // ── Step 3: Configure application ────────────────────────────
    extcore_infrastructure::use_extcore(&manager, &mut host, &service_provider)?;

    // ── Step 4: Run ──────────────────────────────────────────────
    let tasks = host.run(&service_provider)?;
    tracing::info!(tasks = tasks, "ExtCore host stopped");

    Ok(())
}
