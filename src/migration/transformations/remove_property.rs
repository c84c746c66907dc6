use async_trait::async_trait;
use std::sync::Arc;

use super::{set_properties, NodeBasedTransformation};
use crate::aggregate::Node;
use crate::content_repository::{CommandResult, ContentRepository};
use crate::migration::error::MigrationResult;
use crate::value_objects::{ContentStreamId, DimensionSpacePointSet, PropertyValuesToWrite};

#[derive(Debug)]
pub struct RemovePropertyTransformation {
    property: String,
    repository: Arc<ContentRepository>,
}

impl RemovePropertyTransformation {
    pub fn new(property: String, repository: Arc<ContentRepository>) -> Self {
        Self { property, repository }
    }
}

#[async_trait]
impl NodeBasedTransformation for RemovePropertyTransformation {
    async fn execute(
        &self,
        node: &Node,
        _covered_dimension_space_points: &DimensionSpacePointSet,
        content_stream_for_writing: &ContentStreamId,
    ) -> MigrationResult<Option<CommandResult>> {
        if !node.has_property(&self.property) {
            return Ok(None);
        }
        set_properties(
            &self.repository,
            node,
            content_stream_for_writing,
            PropertyValuesToWrite::new().unset(self.property.clone()),
        )
        .await
    }
}
