//! Content dimensions
//!
//! A content dimension (e.g. `language`) has a tree of values; a value's
//! specializations (e.g. `de` → `de_CH`) fall back to it. The dimensions
//! together span the dimension space the variation graph works on.

mod variation_graph;

pub use variation_graph::InterDimensionalVariationGraph;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value_objects::DimensionSpacePoint;

/// Errors of the dimension space model
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DimensionSpaceError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Dimension space point {0} is not within the allowed dimension subspace")]
    DimensionSpacePointNotFound(DimensionSpacePoint),

    #[error("Invalid content dimension configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for dimension space operations
pub type DimensionSpaceResult<T> = Result<T, DimensionSpaceError>;

/// Configuration of one content dimension
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentDimensionConfiguration {
    /// Top level values with their nested specializations
    #[serde(default)]
    pub values: IndexMap<String, ContentDimensionValueConfiguration>,
}

/// Configuration of one dimension value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentDimensionValueConfiguration {
    #[serde(default)]
    pub specializations: IndexMap<String, ContentDimensionValueConfiguration>,
}

/// One value of a content dimension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDimensionValue {
    pub value: String,
    pub parent: Option<String>,
    pub depth: usize,
}

/// A content dimension with its value tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDimension {
    id: String,
    values: IndexMap<String, ContentDimensionValue>,
}

impl ContentDimension {
    /// Build a dimension from its configuration, flattening the value tree
    pub fn from_configuration(
        id: impl Into<String>,
        configuration: &ContentDimensionConfiguration,
    ) -> DimensionSpaceResult<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DimensionSpaceError::InvalidConfiguration(
                "content dimension ids must not be empty".to_string(),
            ));
        }
        let mut values = IndexMap::new();
        Self::collect_values(&id, &configuration.values, None, 0, &mut values)?;
        if values.is_empty() {
            return Err(DimensionSpaceError::InvalidConfiguration(format!(
                "content dimension \"{id}\" declares no values"
            )));
        }
        Ok(Self { id, values })
    }

    fn collect_values(
        id: &str,
        configured: &IndexMap<String, ContentDimensionValueConfiguration>,
        parent: Option<&str>,
        depth: usize,
        values: &mut IndexMap<String, ContentDimensionValue>,
    ) -> DimensionSpaceResult<()> {
        for (value, configuration) in configured {
            if value.trim().is_empty() {
                return Err(DimensionSpaceError::InvalidConfiguration(format!(
                    "content dimension \"{id}\" declares an empty value"
                )));
            }
            if values.contains_key(value) {
                return Err(DimensionSpaceError::InvalidConfiguration(format!(
                    "content dimension \"{id}\" declares value \"{value}\" more than once"
                )));
            }
            values.insert(
                value.clone(),
                ContentDimensionValue {
                    value: value.clone(),
                    parent: parent.map(str::to_string),
                    depth,
                },
            );
            Self::collect_values(id, &configuration.specializations, Some(value), depth + 1, values)?;
        }
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn values(&self) -> impl Iterator<Item = &ContentDimensionValue> {
        self.values.values()
    }

    pub fn value(&self, value: &str) -> Option<&ContentDimensionValue> {
        self.values.get(value)
    }

    /// Direct specializations of `value`
    pub fn specializations(&self, value: &str) -> Vec<&ContentDimensionValue> {
        self.values
            .values()
            .filter(|candidate| candidate.parent.as_deref() == Some(value))
            .collect()
    }

    /// True if `general` equals `special` or is one of its ancestors
    pub fn is_generalization_or_self(&self, general: &str, special: &str) -> bool {
        let mut current = Some(special);
        while let Some(value) = current {
            if value == general {
                return true;
            }
            current = self.values.get(value).and_then(|v| v.parent.as_deref());
        }
        false
    }
}

/// The ordered set of configured content dimensions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentDimensionSource {
    dimensions: IndexMap<String, ContentDimension>,
}

impl ContentDimensionSource {
    pub fn from_configuration(
        configuration: &IndexMap<String, ContentDimensionConfiguration>,
    ) -> DimensionSpaceResult<Self> {
        let mut dimensions = IndexMap::new();
        for (id, dimension_configuration) in configuration {
            dimensions.insert(
                id.clone(),
                ContentDimension::from_configuration(id.clone(), dimension_configuration)?,
            );
        }
        Ok(Self { dimensions })
    }

    pub fn dimension(&self, id: &str) -> Option<&ContentDimension> {
        self.dimensions.get(id)
    }

    pub fn dimensions(&self) -> impl Iterator<Item = &ContentDimension> {
        self.dimensions.values()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }
}
