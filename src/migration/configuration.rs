//! Migration configuration and loading
//!
//! A migration is a list of steps; each step names filters that select
//! graph elements and transformations applied to them:
//!
//! ```toml
//! comments = "Rename headline to title"
//!
//! [[migration]]
//! filters = [{ type = "NodeType", settings = { nodeType = "Acme:Page" } }]
//! transformations = [{ type = "RenameProperty", settings = { from = "headline", to = "title" } }]
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use super::error::{MigrationError, MigrationResult};
use crate::value_objects::DimensionSpacePoint;

/// Untyped settings of a filter or transformation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings(Map<String, Value>);

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|value| !value.is_null())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn optional_string(&self, component: &str, key: &str) -> MigrationResult<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(other) => Err(MigrationError::invalid_setting(
                component,
                key,
                format!("expected a string, got {other}"),
            )),
        }
    }

    pub fn require_string(&self, component: &str, key: &str) -> MigrationResult<String> {
        self.optional_string(component, key)?
            .ok_or_else(|| MigrationError::missing_setting(component, key))
    }

    pub fn bool_or(&self, component: &str, key: &str, default: bool) -> MigrationResult<bool> {
        match self.get(key) {
            None => Ok(default),
            Some(Value::Bool(value)) => Ok(*value),
            Some(other) => Err(MigrationError::invalid_setting(
                component,
                key,
                format!("expected a boolean, got {other}"),
            )),
        }
    }

    pub fn optional_dimension_space_point(
        &self,
        component: &str,
        key: &str,
    ) -> MigrationResult<Option<DimensionSpacePoint>> {
        self.get(key)
            .map(|value| {
                DimensionSpacePoint::from_json_value(value)
                    .map_err(|e| MigrationError::invalid_setting(component, key, e))
            })
            .transpose()
    }

    pub fn require_dimension_space_point(&self, component: &str, key: &str) -> MigrationResult<DimensionSpacePoint> {
        self.optional_dimension_space_point(component, key)?
            .ok_or_else(|| MigrationError::missing_setting(component, key))
    }
}

impl From<Map<String, Value>> for Settings {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A configured transformation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationConfiguration {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub settings: Settings,
}

impl TransformationConfiguration {
    pub fn new(type_name: impl Into<String>, settings: Settings) -> Self {
        Self {
            type_name: type_name.into(),
            settings,
        }
    }
}

/// A configured filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfiguration {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub settings: Settings,
}

impl FilterConfiguration {
    pub fn new(type_name: impl Into<String>, settings: Settings) -> Self {
        Self {
            type_name: type_name.into(),
            settings,
        }
    }
}

/// One step of a migration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MigrationStep {
    #[serde(default)]
    pub filters: Vec<FilterConfiguration>,
    #[serde(default)]
    pub transformations: Vec<TransformationConfiguration>,
}

/// A whole migration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MigrationConfiguration {
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub warnings: Option<String>,
    #[serde(default)]
    pub migration: Vec<MigrationStep>,
}

impl MigrationConfiguration {
    /// Load a migration from a `.toml` or `.json` file
    pub fn from_file(path: &Path) -> MigrationResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let file = path.display().to_string();
        match path.extension().and_then(|extension| extension.to_str()) {
            Some("toml") => toml::from_str(&content).map_err(|e| MigrationError::Parse {
                file,
                message: e.to_string(),
            }),
            Some("json") => serde_json::from_str(&content).map_err(|e| MigrationError::Parse {
                file,
                message: e.to_string(),
            }),
            _ => Err(MigrationError::Migration(format!(
                "Unsupported migration file {file}, expected .toml or .json"
            ))),
        }
    }
}

const VERSION_PREFIX: &str = "Version";

/// Finds migrations named `Version<digits>.toml` or `Version<digits>.json` in a directory
#[derive(Debug, Clone)]
pub struct MigrationFactory {
    directory: PathBuf,
}

impl MigrationFactory {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn version_of(path: &Path) -> Option<String> {
        let extension = path.extension()?.to_str()?;
        if extension != "toml" && extension != "json" {
            return None;
        }
        let version = path.file_stem()?.to_str()?.strip_prefix(VERSION_PREFIX)?;
        if version.is_empty() || !version.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(version.to_string())
    }

    fn migration_files(&self) -> MigrationResult<Vec<(String, PathBuf)>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.directory)? {
            let path = entry?.path();
            if let Some(version) = Self::version_of(&path) {
                files.push((version, path));
            }
        }
        // digit strings compare numerically once their lengths are equal
        files.sort_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        Ok(files)
    }

    /// Available versions in ascending order
    pub fn available_versions(&self) -> MigrationResult<Vec<String>> {
        Ok(self.migration_files()?.into_iter().map(|(version, _)| version).collect())
    }

    /// Load the migration of a version, given with or without the `Version` prefix
    pub fn migration_for_version(&self, version: &str) -> MigrationResult<MigrationConfiguration> {
        let version = version.strip_prefix(VERSION_PREFIX).unwrap_or(version);
        let (_, path) = self
            .migration_files()?
            .into_iter()
            .find(|(candidate, _)| candidate == version)
            .ok_or_else(|| {
                MigrationError::Migration(format!(
                    "No migration found for version \"{version}\" in {}",
                    self.directory.display()
                ))
            })?;
        MigrationConfiguration::from_file(&path)
    }
}
