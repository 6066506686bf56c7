//! Module inspection commands.

use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat, or_dash};
use extcore_core::error::AppError;
use extcore_infrastructure::{ExtensionDescriptor, Module};

use super::DiscoverArgs;

/// Module display row
#[derive(Debug, Serialize, Tabled)]
pub struct ModuleRow {
    /// Module name
    #[tabled(rename = "Name")]
    pub name: String,
    /// Where the module came from
    #[tabled(rename = "Origin")]
    pub origin: String,
    /// Number of exported types
    #[tabled(rename = "Types")]
    pub types: usize,
    /// Whether a descriptor is exported
    #[tabled(rename = "Descriptor")]
    pub descriptor: bool,
    /// Load time
    #[tabled(rename = "Loaded")]
    pub loaded_at: String,
}

impl From<&Module> for ModuleRow {
    fn from(module: &Module) -> Self {
        Self {
            name: module.name().to_string(),
            origin: module.origin().to_string(),
            types: module.types().len(),
            descriptor: module.descriptor_type().is_some(),
            loaded_at: module.loaded_at().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Load failure display row
#[derive(Debug, Serialize, Tabled)]
pub struct FailureRow {
    /// Module file
    #[tabled(rename = "Path")]
    pub path: String,
    /// Error
    #[tabled(rename = "Error")]
    pub error: String,
}

/// Extension descriptor display row
#[derive(Debug, Serialize, Tabled)]
pub struct ExtensionRow {
    /// Owning module
    #[tabled(rename = "Module")]
    pub module: String,
    /// Extension name
    #[tabled(rename = "Name")]
    pub name: String,
    /// Version
    #[tabled(rename = "Version")]
    pub version: String,
    /// Authors
    #[tabled(rename = "Authors")]
    pub authors: String,
    /// Home page
    #[tabled(rename = "Url")]
    pub url: String,
}

impl From<&ExtensionDescriptor> for ExtensionRow {
    fn from(descriptor: &ExtensionDescriptor) -> Self {
        Self {
            module: descriptor.module().to_string(),
            name: descriptor.name().to_string(),
            version: or_dash(descriptor.version()),
            authors: or_dash(descriptor.authors()),
            url: or_dash(descriptor.url()),
        }
    }
}

/// Exported type display row
#[derive(Debug, Serialize, Tabled)]
pub struct CapabilityRow {
    /// Owning module
    #[tabled(rename = "Module")]
    pub module: String,
    /// Exported type
    #[tabled(rename = "Type")]
    pub type_name: String,
    /// Whether the type is abstract
    #[tabled(rename = "Abstract")]
    pub is_abstract: bool,
    /// Implemented capabilities
    #[tabled(rename = "Capabilities")]
    pub capabilities: String,
    /// Constructor argument signatures
    #[tabled(rename = "Constructors")]
    pub constructors: String,
}

/// One row per exported type, in discovery order.
pub fn capability_rows(modules: &[Module]) -> Vec<CapabilityRow> {
    modules
        .iter()
        .flat_map(|module| {
            module.types().iter().map(move |exported| CapabilityRow {
                module: module.name().to_string(),
                type_name: exported.name().to_string(),
                is_abstract: exported.is_abstract(),
                capabilities: exported
                    .capabilities()
                    .map(|capability| capability.name())
                    .collect::<Vec<_>>()
                    .join(", "),
                constructors: exported.constructor_signatures().collect::<Vec<_>>().join(", "),
            })
        })
        .collect()
}

/// `modules` command
pub fn list_modules(args: &DiscoverArgs, config_path: &str, format: OutputFormat) -> Result<(), AppError> {
    let (_, report) = super::discover(args, config_path)?;

    let rows: Vec<ModuleRow> = report.modules.iter().map(ModuleRow::from).collect();
    output::print_list(&rows, format);

    if !report.failures.is_empty() {
        let failures: Vec<FailureRow> = report
            .failures
            .iter()
            .map(|failure| FailureRow {
                path: failure.path.display().to_string(),
                error: failure.error.clone(),
            })
            .collect();

        if format == OutputFormat::Table {
            output::print_warning(&format!("{} module(s) failed to load", failures.len()));
        }
        output::print_list(&failures, format);
    }

    Ok(())
}

/// `extensions` command
pub fn list_extensions(
    args: &DiscoverArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let (manager, _) = super::discover(args, config_path)?;

    let descriptors = manager.extension_descriptors()?;
    let rows: Vec<ExtensionRow> = descriptors.iter().map(ExtensionRow::from).collect();
    output::print_list(&rows, format);

    Ok(())
}

/// `capabilities` command
pub fn list_capabilities(
    args: &DiscoverArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let (manager, _) = super::discover(args, config_path)?;

    let modules = manager.modules()?;
    output::print_list(&capability_rows(&modules), format);

    Ok(())
}
