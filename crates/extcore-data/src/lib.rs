//! # extcore-data
//!
//! Storage capability for ExtCore extensions. Provides:
//!
//! - The [`Storage`] capability implemented by storage backend modules
//! - [`AddStorageAction`], which wires the configured connection string
//!   into the first discovered backend and registers it as a service

pub mod action;
pub mod storage;

pub use action::{AddStorageAction, CONNECTION_STRING_PROPERTY, STORAGE_MODULE_FRAGMENT};
pub use storage::{Repository, Storage};

use extcore_infrastructure::prelude::*;

/// Descriptor of this crate's module.
pub struct DataExtension;

impl Extension for DataExtension {
    fn name(&self) -> &str {
        "ExtCore.Data"
    }

    fn description(&self) -> Option<&str> {
        Some(env!("CARGO_PKG_DESCRIPTION"))
    }

    fn url(&self) -> Option<&str> {
        Some(env!("CARGO_PKG_HOMEPAGE"))
    }

    fn version(&self) -> Option<&str> {
        Some(env!("CARGO_PKG_VERSION"))
    }

    fn authors(&self) -> Option<&str> {
        Some(env!("CARGO_PKG_AUTHORS"))
    }
}

/// Builds this crate's module.
pub fn register() -> Module {
    Module::builder(env!("CARGO_PKG_NAME"))
        .descriptor("extcore_data::DataExtension", || DataExtension)
        .export(
            TypeExport::<AddStorageAction>::new("extcore_data::AddStorageAction")
                .implements::<dyn ConfigureServicesAction>(|t| Box::new(t))
                .constructor(AddStorageAction::default),
        )
        .build()
}

link_module!(env!("CARGO_PKG_NAME"), register);
