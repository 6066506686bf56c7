//! # extcore-infrastructure
//!
//! Extension runtime for ExtCore hosts. Provides:
//!
//! - Module registration with typed factories instead of reflection
//! - The module catalog with per-generation lookup caches
//! - Capability lookup, instance construction and prioritized broadcast
//! - Lifecycle actions, a small service registry and a console host
//! - Discovery of linked modules and (feature `dynamic`) shared libraries

pub mod actions;
pub mod bootstrap;
pub mod capability;
pub mod dispatch;
pub mod extension;
pub mod factory;
pub mod filter;
pub mod host;
pub mod loader;
pub mod macros;
pub mod manager;
pub mod module;
pub mod prelude;
pub mod resolver;
pub mod services;

#[doc(hidden)]
pub use inventory;

pub use bootstrap::{
    ExtCoreOptions, add_extcore, configure_services, discover_modules, use_extcore,
    use_extcore_host,
};
pub use capability::CapabilityId;
pub use dispatch::Prioritized;
pub use extension::{Extension, ExtensionInfo};
pub use factory::{Instance, InstantiationPolicy};
pub use filter::ModuleFilter;
pub use host::ConsoleHost;
pub use loader::{DefaultModuleProvider, DiscoveryReport, DynamicLoader, LinkedModule, ModuleLoader};
pub use manager::{ExtensionDescriptor, ExtensionManager};
pub use module::{AbstractExport, ExportedType, Module, ModuleBuilder, ModuleOrigin, TypeExport};
pub use resolver::{Implementation, ResolveOptions};
pub use services::{Lifetime, ServiceCollection, ServiceProvider};
