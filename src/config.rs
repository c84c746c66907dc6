//! Content repository settings
//!
//! Settings are read from TOML or JSON, chosen by the file extension:
//!
//! ```toml
//! catch_up = "synchronous"
//!
//! [dimensions.language.values.en.specializations.en_GB]
//! [dimensions.language.values.de]
//!
//! [node_types."Acme:Document"]
//! constraints = { nodeTypes = { "*" = true } }
//! properties = { title = { type = "string" } }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::content_repository::{ContentRepositoryError, ContentRepositoryResult};
use crate::dimension::{ContentDimensionConfiguration, ContentDimensionSource, InterDimensionalVariationGraph};
use crate::node_types::{NodeTypeConfiguration, NodeTypeManager};

/// How the read models follow the event store
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CatchUpMode {
    /// Projections are updated before `handle` returns
    #[default]
    Synchronous,
    /// A background task updates the projections; `CommandResult::block` waits for it
    Asynchronous,
}

/// Settings of one content repository
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ContentRepositorySettings {
    #[serde(default)]
    pub dimensions: IndexMap<String, ContentDimensionConfiguration>,
    #[serde(default)]
    pub node_types: IndexMap<String, NodeTypeConfiguration>,
    #[serde(default)]
    pub catch_up: CatchUpMode,
}

impl ContentRepositorySettings {
    /// Load settings from a `.toml` or `.json` file
    pub fn from_file(path: &Path) -> ContentRepositoryResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ContentRepositoryError::Configuration(format!("Failed to read settings file {}: {}", path.display(), e))
        })?;

        match path.extension().and_then(|extension| extension.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            _ => Err(ContentRepositoryError::Configuration(format!(
                "Unsupported settings file {}, expected .toml or .json",
                path.display()
            ))),
        }
    }

    pub fn from_toml_str(content: &str) -> ContentRepositoryResult<Self> {
        let settings: Self = toml::from_str(content)
            .map_err(|e| ContentRepositoryError::Configuration(format!("Failed to parse settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_str(content: &str) -> ContentRepositoryResult<Self> {
        let settings: Self = serde_json::from_str(content)
            .map_err(|e| ContentRepositoryError::Configuration(format!("Failed to parse settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate dimension values and node type declarations
    pub fn validate(&self) -> ContentRepositoryResult<()> {
        self.variation_graph()?;
        self.node_type_manager()?;
        Ok(())
    }

    pub(crate) fn variation_graph(&self) -> ContentRepositoryResult<InterDimensionalVariationGraph> {
        let source = ContentDimensionSource::from_configuration(&self.dimensions)
            .map_err(|e| ContentRepositoryError::Configuration(e.to_string()))?;
        Ok(InterDimensionalVariationGraph::new(source))
    }

    pub(crate) fn node_type_manager(&self) -> ContentRepositoryResult<NodeTypeManager> {
        NodeTypeManager::from_configuration(&self.node_types)
            .map_err(|e| ContentRepositoryError::Configuration(e.to_string()))
    }
}
