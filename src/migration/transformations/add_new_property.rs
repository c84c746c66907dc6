use async_trait::async_trait;
use std::sync::Arc;

use super::{set_properties, NodeBasedTransformation};
use crate::aggregate::Node;
use crate::content_repository::{CommandResult, ContentRepository};
use crate::migration::error::MigrationResult;
use crate::value_objects::{ContentStreamId, DimensionSpacePointSet, PropertyValuesToWrite, SerializedPropertyValue};

/// Add a property to variants that do not have it yet; existing values are kept
#[derive(Debug)]
pub struct AddNewPropertyTransformation {
    new_property_name: String,
    value: SerializedPropertyValue,
    repository: Arc<ContentRepository>,
}

impl AddNewPropertyTransformation {
    pub fn new(new_property_name: String, value: SerializedPropertyValue, repository: Arc<ContentRepository>) -> Self {
        Self {
            new_property_name,
            value,
            repository,
        }
    }
}

#[async_trait]
impl NodeBasedTransformation for AddNewPropertyTransformation {
    async fn execute(
        &self,
        node: &Node,
        _covered_dimension_space_points: &DimensionSpacePointSet,
        content_stream_for_writing: &ContentStreamId,
    ) -> MigrationResult<Option<CommandResult>> {
        if node.has_property(&self.new_property_name) {
            return Ok(None);
        }
        set_properties(
            &self.repository,
            node,
            content_stream_for_writing,
            PropertyValuesToWrite::new().set(self.new_property_name.clone(), self.value.clone()),
        )
        .await
    }
}
