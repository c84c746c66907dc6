use async_trait::async_trait;
use std::sync::Arc;

use super::NodeBasedTransformation;
use crate::aggregate::Node;
use crate::commands::RemoveNodeAggregate;
use crate::content_repository::{CommandResult, ContentRepository};
use crate::migration::error::{MigrationError, MigrationResult};
use crate::value_objects::{ContentStreamId, DimensionSpacePoint, DimensionSpacePointSet, NodeVariantSelectionStrategy};

/// Remove matching variants together with their specializations
#[derive(Debug)]
pub struct RemoveNodeTransformation {
    overridden_dimension_space_point: Option<DimensionSpacePoint>,
    strategy: NodeVariantSelectionStrategy,
    repository: Arc<ContentRepository>,
}

impl RemoveNodeTransformation {
    /// Fails for `allVariants`, which could remove variants the filters never matched
    pub fn new(
        overridden_dimension_space_point: Option<DimensionSpacePoint>,
        strategy: NodeVariantSelectionStrategy,
        repository: Arc<ContentRepository>,
    ) -> MigrationResult<Self> {
        if strategy == NodeVariantSelectionStrategy::AllVariants {
            return Err(MigrationError::InvalidMigrationConfiguration(
                "RemoveNode does not support the strategy \"allVariants\", it may remove unrelated variants"
                    .to_string(),
            ));
        }
        Ok(Self {
            overridden_dimension_space_point,
            strategy,
            repository,
        })
    }
}

#[async_trait]
impl NodeBasedTransformation for RemoveNodeTransformation {
    async fn execute(
        &self,
        node: &Node,
        covered_dimension_space_points: &DimensionSpacePointSet,
        content_stream_for_writing: &ContentStreamId,
    ) -> MigrationResult<Option<CommandResult>> {
        let covered_dimension_space_point = self
            .overridden_dimension_space_point
            .clone()
            .unwrap_or_else(|| node.origin_dimension_space_point.to_dimension_space_point());
        if !covered_dimension_space_points.contains(&covered_dimension_space_point) {
            return Ok(None);
        }

        let result = self
            .repository
            .handle(RemoveNodeAggregate {
                content_stream_id: content_stream_for_writing.clone(),
                node_aggregate_id: node.node_aggregate_id.clone(),
                covered_dimension_space_point,
                node_variant_selection_strategy: self.strategy,
            })
            .await?;
        Ok(Some(result))
    }
}
