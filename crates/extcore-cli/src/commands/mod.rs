//! CLI command definitions and dispatch.

pub mod config;
pub mod modules;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use extcore_core::config::AppConfig;
use extcore_core::error::AppError;
use extcore_infrastructure::{
    DefaultModuleProvider, DiscoveryReport, ExtCoreOptions, ExtensionManager, LinkedModule,
};

use crate::output::OutputFormat;

/// ExtCore: inspect extension modules and host configuration
#[derive(Debug, Parser)]
#[command(name = "extcore", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "EXTCORE_CONFIG", default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List discovered modules and load failures
    Modules(DiscoverArgs),
    /// List extension descriptors
    Extensions(DiscoverArgs),
    /// List exported types and the capabilities they implement
    Capabilities(DiscoverArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

/// Where to discover modules; overrides the `extensions` section.
#[derive(Debug, Clone, Args)]
pub struct DiscoverArgs {
    /// Extensions directory
    #[arg(short, long)]
    pub path: Option<PathBuf>,

    /// Scan subdirectories too
    #[arg(short, long)]
    pub recursive: bool,
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Modules(args) => modules::list_modules(args, &self.config, self.format),
            Commands::Extensions(args) => {
                modules::list_extensions(args, &self.config, self.format)
            }
            Commands::Capabilities(args) => {
                modules::list_capabilities(args, &self.config, self.format)
            }
            Commands::Config(args) => config::execute(args, &self.config, self.format),
        }
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(config_path)
}

/// Helper: discover modules into a fresh manager
pub fn discover(
    args: &DiscoverArgs,
    config_path: &str,
) -> Result<(ExtensionManager, DiscoveryReport), AppError> {
    let config = load_config(config_path)?;

    let mut options = ExtCoreOptions::from_config(&config.extensions);
    if let Some(path) = &args.path {
        options.path = Some(path.clone());
    }
    options.including_subpaths |= args.recursive;

    let manager = ExtensionManager::new();
    let provider = DefaultModuleProvider::new().with_linked(linked_modules());
    let report = extcore_infrastructure::discover_modules(&manager, &provider, &options);

    Ok((manager, report))
}

/// Extension crates compiled into this binary.
fn linked_modules() -> Vec<&'static LinkedModule> {
    LinkedModule::retaining(&[extcore_events::register, extcore_data::register])
}
