//! Storage registration.

use tracing::{info, warn};

use extcore_core::config::AppConfig;
use extcore_infrastructure::prelude::*;

use crate::storage::Storage;

/// Only modules whose name contains this fragment are searched for storage
/// backends.
pub const STORAGE_MODULE_FRAGMENT: &str = "data";

/// Property receiving the configured connection string.
pub const CONNECTION_STRING_PROPERTY: &str = "connection_string";

/// Registers the first discovered [`Storage`] implementation.
///
/// The connection string is read from the [`AppConfig`] service
/// (`data.default_connection.connection_string`). When one is configured,
/// a storage backend is required and its absence fails the phase; without
/// one, a missing backend is only logged. A backend declaring the
/// `connection_string` property receives the value before registration.
#[derive(Debug, Default)]
pub struct AddStorageAction;

impl Prioritized for AddStorageAction {
    fn priority(&self) -> i32 {
        1000
    }
}

impl ConfigureServicesAction for AddStorageAction {
    fn execute(&self, services: &mut ServiceCollection, provider: &ServiceProvider) -> AppResult<()> {
        let manager = provider.require::<ExtensionManager>()?;
        let config = provider.get::<AppConfig>()?;
        let connection_string = config
            .as_deref()
            .and_then(|config| config.data.connection_string());

        let options = ResolveOptions::new()
            .filter(ModuleFilter::name_contains(STORAGE_MODULE_FRAGMENT))
            .cached();

        let implementation = match connection_string {
            Some(_) => manager.require_implementation::<dyn Storage>(&options)?,
            None => match manager.find_implementation::<dyn Storage>(&options) {
                Some(implementation) => implementation,
                None => {
                    info!("No storage implementation found, storage not registered");
                    return Ok(());
                }
            },
        };

        let declares_connection_string = implementation
            .exported_type()
            .property_names()
            .any(|name| name == CONNECTION_STRING_PROPERTY);

        match connection_string {
            Some(value) if declares_connection_string => {
                implementation.set_property(CONNECTION_STRING_PROPERTY, value)?;
            }
            Some(_) => warn!(
                storage = %implementation.type_name(),
                "Storage declares no connection string property, configured value ignored"
            ),
            None => {}
        }

        info!(
            storage = %implementation.type_name(),
            module = %implementation.module(),
            "Storage registered"
        );

        services.add_implementation::<dyn Storage>(implementation, Lifetime::Transient);
        Ok(())
    }
}
