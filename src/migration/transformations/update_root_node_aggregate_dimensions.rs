use async_trait::async_trait;
use std::sync::Arc;

use super::GlobalTransformation;
use crate::commands::UpdateRootNodeAggregateDimensions;
use crate::content_repository::{CommandResult, ContentRepository};
use crate::migration::error::{MigrationError, MigrationResult};
use crate::value_objects::{ContentStreamId, NodeTypeName};

/// Let the root aggregate of a type cover the configured dimension space
#[derive(Debug)]
pub struct UpdateRootNodeAggregateDimensionsTransformation {
    node_type_name: NodeTypeName,
    repository: Arc<ContentRepository>,
}

impl UpdateRootNodeAggregateDimensionsTransformation {
    pub fn new(node_type_name: NodeTypeName, repository: Arc<ContentRepository>) -> Self {
        Self {
            node_type_name,
            repository,
        }
    }
}

#[async_trait]
impl GlobalTransformation for UpdateRootNodeAggregateDimensionsTransformation {
    async fn execute(
        &self,
        _content_stream_for_reading: &ContentStreamId,
        content_stream_for_writing: &ContentStreamId,
    ) -> MigrationResult<Option<CommandResult>> {
        let root = self
            .repository
            .content_graph_for_content_stream(content_stream_for_writing)?
            .find_root_node_aggregate_by_type(&self.node_type_name)
            .ok_or_else(|| {
                MigrationError::Migration(format!(
                    "Root node aggregate of type \"{}\" not found in content stream \"{}\"",
                    self.node_type_name, content_stream_for_writing
                ))
            })?;

        let result = self
            .repository
            .handle(UpdateRootNodeAggregateDimensions {
                content_stream_id: content_stream_for_writing.clone(),
                node_aggregate_id: root.node_aggregate_id,
            })
            .await?;
        Ok(Some(result))
    }
}
