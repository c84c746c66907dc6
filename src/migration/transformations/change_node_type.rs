use async_trait::async_trait;
use std::sync::Arc;

use super::NodeAggregateBasedTransformation;
use crate::aggregate::NodeAggregate;
use crate::commands::ChangeNodeAggregateType;
use crate::content_repository::{CommandResult, ContentRepository};
use crate::migration::error::MigrationResult;
use crate::value_objects::{
    ContentStreamId, NodeAggregateTypeChangeChildConstraintConflictResolutionStrategy, NodeTypeName,
};

/// Change the node type of matching aggregates
#[derive(Debug)]
pub struct ChangeNodeTypeTransformation {
    new_type: NodeTypeName,
    strategy: NodeAggregateTypeChangeChildConstraintConflictResolutionStrategy,
    repository: Arc<ContentRepository>,
}

impl ChangeNodeTypeTransformation {
    pub fn new(
        new_type: NodeTypeName,
        strategy: NodeAggregateTypeChangeChildConstraintConflictResolutionStrategy,
        repository: Arc<ContentRepository>,
    ) -> Self {
        Self {
            new_type,
            strategy,
            repository,
        }
    }
}

#[async_trait]
impl NodeAggregateBasedTransformation for ChangeNodeTypeTransformation {
    async fn execute(
        &self,
        node_aggregate: &NodeAggregate,
        content_stream_for_writing: &ContentStreamId,
    ) -> MigrationResult<Option<CommandResult>> {
        let result = self
            .repository
            .handle(ChangeNodeAggregateType {
                content_stream_id: content_stream_for_writing.clone(),
                node_aggregate_id: node_aggregate.node_aggregate_id.clone(),
                new_node_type_name: self.new_type.clone(),
                strategy: self.strategy,
            })
            .await?;
        Ok(Some(result))
    }
}
