//! Prelude for extension crates.

pub use crate::actions::{ConfigureAction, ConfigureHostAction, ConfigureServicesAction};
pub use crate::dispatch::Prioritized;
pub use crate::extension::Extension;
pub use crate::factory::{Instance, InstantiationPolicy};
pub use crate::filter::ModuleFilter;
pub use crate::host::ConsoleHost;
pub use crate::manager::ExtensionManager;
pub use crate::module::{AbstractExport, Module, TypeExport};
pub use crate::resolver::{Implementation, ResolveOptions};
pub use crate::services::{Lifetime, ServiceCollection, ServiceProvider};

pub use extcore_core::error::AppError;
pub use extcore_core::result::AppResult;

pub use crate::{export_module, link_module};
