use async_trait::async_trait;
use std::sync::Arc;

use super::{set_properties, NodeBasedTransformation};
use crate::aggregate::Node;
use crate::content_repository::{CommandResult, ContentRepository};
use crate::migration::error::MigrationResult;
use crate::value_objects::{ContentStreamId, DimensionSpacePointSet, PropertyValuesToWrite};

/// Move a property value from `from` to `to` in a single write
#[derive(Debug)]
pub struct RenamePropertyTransformation {
    from: String,
    to: String,
    repository: Arc<ContentRepository>,
}

impl RenamePropertyTransformation {
    pub fn new(from: String, to: String, repository: Arc<ContentRepository>) -> Self {
        Self { from, to, repository }
    }
}

#[async_trait]
impl NodeBasedTransformation for RenamePropertyTransformation {
    async fn execute(
        &self,
        node: &Node,
        _covered_dimension_space_points: &DimensionSpacePointSet,
        content_stream_for_writing: &ContentStreamId,
    ) -> MigrationResult<Option<CommandResult>> {
        if self.from == self.to {
            return Ok(None);
        }
        let Some(value) = node.property(&self.from) else {
            return Ok(None);
        };
        set_properties(
            &self.repository,
            node,
            content_stream_for_writing,
            PropertyValuesToWrite::new()
                .set(self.to.clone(), value.clone())
                .unset(self.from.clone()),
        )
        .await
    }
}
