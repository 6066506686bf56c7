//! Extension descriptors.
//!
//! Every module may export one root type implementing [`Extension`]. The
//! descriptor carries identity metadata only and is consumed by logging and
//! diagnostics.

use serde::{Deserialize, Serialize};

/// Descriptive metadata of an extension module.
pub trait Extension: Send + Sync {
    /// Name of the extension. Defaults to the implementing type's name.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Short description.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Home page of the extension.
    fn url(&self) -> Option<&str> {
        None
    }

    /// Version string.
    fn version(&self) -> Option<&str> {
        None
    }

    /// Authors, separated by commas.
    fn authors(&self) -> Option<&str> {
        None
    }
}

/// Owned snapshot of an [`Extension`] descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionInfo {
    /// Extension name.
    pub name: String,
    /// Short description.
    pub description: Option<String>,
    /// Home page.
    pub url: Option<String>,
    /// Version string.
    pub version: Option<String>,
    /// Authors.
    pub authors: Option<String>,
}

impl ExtensionInfo {
    /// Copies the values reported by `extension`.
    pub fn from_extension(extension: &dyn Extension) -> Self {
        Self {
            name: extension.name().to_string(),
            description: extension.description().map(str::to_string),
            url: extension.url().map(str::to_string),
            version: extension.version().map(str::to_string),
            authors: extension.authors().map(str::to_string),
        }
    }
}
