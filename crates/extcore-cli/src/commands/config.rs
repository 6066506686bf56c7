//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use extcore_core::config::AppConfig;
use extcore_core::error::AppError;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Validate the configuration
    Validate,
}

/// Execute config commands
pub fn execute(args: &ConfigArgs, config_path: &str, format: OutputFormat) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let mut config = super::load_config(config_path)?;
            mask_connection_string(&mut config);
            output::print_item(&config, format);
        }
        ConfigCommand::Validate => match super::load_config(config_path) {
            Ok(config) => {
                output::print_success(&format!("Configuration '{}' is valid", config_path));

                match config.extensions.path_buf() {
                    Some(path) if path.is_dir() => {
                        output::print_kv("Extensions path", &path.display().to_string())
                    }
                    Some(path) => output::print_warning(&format!(
                        "Extensions path '{}' does not exist",
                        path.display()
                    )),
                    None => output::print_kv("Extensions path", "(linked modules only)"),
                }
                output::print_kv(
                    "Including subpaths",
                    &config.extensions.including_subpaths.to_string(),
                );
                output::print_kv(
                    "Connection string",
                    if config.data.connection_string().is_some() {
                        "configured"
                    } else {
                        "not configured"
                    },
                );
                output::print_kv(
                    "Logging",
                    &format!("{} ({})", config.logging.level, config.logging.format),
                );
            }
            Err(e) => {
                output::print_error(&format!("Configuration invalid: {}", e));
                return Err(e);
            }
        },
    }

    Ok(())
}

/// Hide the connection string, which may carry credentials.
fn mask_connection_string(config: &mut AppConfig) {
    if let Some(value) = config.data.default_connection.connection_string.as_mut() {
        *value = "****".to_string();
    }
}
