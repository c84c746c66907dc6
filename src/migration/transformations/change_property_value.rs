use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::{set_properties, NodeBasedTransformation};
use crate::aggregate::Node;
use crate::content_repository::{CommandResult, ContentRepository};
use crate::migration::error::{MigrationError, MigrationResult};
use crate::value_objects::{ContentStreamId, DimensionSpacePointSet, PropertyValuesToWrite, SerializedPropertyValue};

pub(crate) const DEFAULT_CURRENT_VALUE_PLACEHOLDER: &str = "{current}";

/// Rewrite a property value from a template, then search and replace in it
///
/// The placeholder in `new_serialized_value` is substituted with the current
/// value first; `search` is replaced with `replace` in the result. Array
/// values are rewritten element by element, non-string elements are kept.
#[derive(Debug)]
pub struct ChangePropertyValueTransformation {
    property_name: String,
    new_serialized_value: String,
    search: String,
    replace: String,
    current_value_placeholder: String,
    repository: Arc<ContentRepository>,
}

impl ChangePropertyValueTransformation {
    pub fn new(
        property_name: String,
        new_serialized_value: Option<String>,
        search: String,
        replace: String,
        current_value_placeholder: Option<String>,
        repository: Arc<ContentRepository>,
    ) -> Self {
        let current_value_placeholder =
            current_value_placeholder.unwrap_or_else(|| DEFAULT_CURRENT_VALUE_PLACEHOLDER.to_string());
        Self {
            property_name,
            new_serialized_value: new_serialized_value.unwrap_or_else(|| current_value_placeholder.clone()),
            search,
            replace,
            current_value_placeholder,
            repository,
        }
    }

    pub(crate) fn change(&self, current: &str) -> String {
        let value = self
            .new_serialized_value
            .replace(&self.current_value_placeholder, current);
        if self.search.is_empty() {
            value
        } else {
            value.replace(&self.search, &self.replace)
        }
    }
}

#[async_trait]
impl NodeBasedTransformation for ChangePropertyValueTransformation {
    async fn execute(
        &self,
        node: &Node,
        _covered_dimension_space_points: &DimensionSpacePointSet,
        content_stream_for_writing: &ContentStreamId,
    ) -> MigrationResult<Option<CommandResult>> {
        let Some(property) = node.property(&self.property_name) else {
            return Ok(None);
        };
        let new_value = match &property.value {
            Value::String(current) => Value::String(self.change(current)),
            Value::Array(values) => Value::Array(
                values
                    .iter()
                    .map(|value| match value {
                        Value::String(current) => Value::String(self.change(current)),
                        other => other.clone(),
                    })
                    .collect(),
            ),
            other => {
                return Err(MigrationError::TransformationFailed(format!(
                    "ChangePropertyValue can only be applied to string or array properties, \"{}\" of node aggregate \"{}\" is {}",
                    self.property_name, node.node_aggregate_id, other
                )))
            }
        };

        set_properties(
            &self.repository,
            node,
            content_stream_for_writing,
            PropertyValuesToWrite::new().set(
                self.property_name.clone(),
                SerializedPropertyValue::new(new_value, property.type_name.clone()),
            ),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContentRepositorySettings;

    fn transformation(template: Option<&str>, search: &str, replace: &str) -> ChangePropertyValueTransformation {
        let repository = Arc::new(ContentRepository::new(ContentRepositorySettings::default()).unwrap());
        ChangePropertyValueTransformation::new(
            "count".to_string(),
            template.map(str::to_string),
            search.to_string(),
            replace.to_string(),
            None,
            repository,
        )
    }

    #[test]
    fn test_placeholder_is_substituted_before_search_and_replace() {
        assert_eq!(transformation(Some("was {current}"), "5", "five").change("5"), "was five");
    }

    #[test]
    fn test_defaults_keep_the_current_value() {
        assert_eq!(transformation(None, "", "").change("Hello"), "Hello");
        assert_eq!(transformation(None, "l", "L").change("Hello"), "HeLLo");
    }
}
