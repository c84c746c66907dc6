use async_trait::async_trait;
use std::sync::Arc;

use super::NodeAggregateBasedTransformation;
use crate::aggregate::NodeAggregate;
use crate::commands::ChangeNodeAggregateName;
use crate::content_repository::{CommandResult, ContentRepository};
use crate::migration::error::MigrationResult;
use crate::value_objects::{ContentStreamId, NodeName};

#[derive(Debug)]
pub struct RenameNodeAggregateTransformation {
    new_node_name: NodeName,
    repository: Arc<ContentRepository>,
}

impl RenameNodeAggregateTransformation {
    pub fn new(new_node_name: NodeName, repository: Arc<ContentRepository>) -> Self {
        Self {
            new_node_name,
            repository,
        }
    }
}

#[async_trait]
impl NodeAggregateBasedTransformation for RenameNodeAggregateTransformation {
    async fn execute(
        &self,
        node_aggregate: &NodeAggregate,
        content_stream_for_writing: &ContentStreamId,
    ) -> MigrationResult<Option<CommandResult>> {
        if node_aggregate.node_name.as_ref() == Some(&self.new_node_name) {
            return Ok(None);
        }
        let result = self
            .repository
            .handle(ChangeNodeAggregateName {
                content_stream_id: content_stream_for_writing.clone(),
                node_aggregate_id: node_aggregate.node_aggregate_id.clone(),
                new_node_name: self.new_node_name.clone(),
            })
            .await?;
        Ok(Some(result))
    }
}
