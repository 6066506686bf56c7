//! Application configuration schemas.
//!
//! All configuration structs are deserialized from an optional TOML file
//! and `EXTCORE__*` environment variables via the `config` crate. Each
//! sub-module represents a logical configuration section.

pub mod data;
pub mod extensions;
pub mod logging;

use serde::{Deserialize, Serialize};

pub use self::data::{ConnectionConfig, DataConfig};
pub use self::extensions::ExtensionsConfig;
pub use self::logging::LoggingConfig;

use crate::error::AppError;

/// Prefix of environment variables that override file settings.
pub const ENV_PREFIX: &str = "EXTCORE";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Extension discovery settings.
    #[serde(default)]
    pub extensions: ExtensionsConfig,
    /// Storage backend settings.
    #[serde(default)]
    pub data: DataConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file (optional) and the environment.
    ///
    /// Environment variables use the `EXTCORE__` prefix and `__` as the
    /// section separator, e.g. `EXTCORE__EXTENSIONS__PATH=./extensions`.
    pub fn load(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = AppConfig::load(path.to_str().unwrap()).unwrap();

        assert!(config.extensions.path.is_none());
        assert!(!config.extensions.including_subpaths);
        assert!(config.data.connection_string().is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extcore.toml");
        std::fs::write(
            &path,
            r#"
[extensions]
path = "./extensions"
including_subpaths = true

[data.default_connection]
connection_string = "Data Source=app.db"

[logging]
level = "debug"
format = "json"
"#,
        )
        .unwrap();

        let config = AppConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(
            config.extensions.path_buf(),
            Some(std::path::PathBuf::from("./extensions"))
        );
        assert!(config.extensions.including_subpaths);
        assert_eq!(config.data.connection_string(), Some("Data Source=app.db"));
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_blank_path_is_ignored() {
        let config = ExtensionsConfig {
            path: Some("   ".to_string()),
            including_subpaths: false,
        };
        assert!(config.path_buf().is_none());
    }
}
