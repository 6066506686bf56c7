//! Data extension configuration.

use serde::{Deserialize, Serialize};

/// Settings handed opaquely to storage backend modules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    /// The default connection used by the discovered storage backend.
    #[serde(default)]
    pub default_connection: ConnectionConfig,
}

/// A single named connection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Backend-specific connection string.
    #[serde(default)]
    pub connection_string: Option<String>,
}

impl DataConfig {
    /// Returns the default connection string, if one is configured.
    pub fn connection_string(&self) -> Option<&str> {
        self.default_connection.connection_string.as_deref()
    }
}
