//! Extension discovery configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the host looks for extension modules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtensionsConfig {
    /// Directory containing extension shared libraries. Unset means only
    /// modules linked into the host are discovered.
    #[serde(default)]
    pub path: Option<String>,
    /// Whether subdirectories of `path` are scanned recursively.
    #[serde(default)]
    pub including_subpaths: bool,
}

impl ExtensionsConfig {
    /// Returns the configured path, ignoring blank values.
    pub fn path_buf(&self) -> Option<PathBuf> {
        self.path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }
}
