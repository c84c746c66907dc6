//! Transformations applied by migration steps
//!
//! A transformation works on one of three granularities: once per step
//! (global), once per node aggregate, or once per node variant. The kind
//! is fixed when the transformation is built, so the migration service can
//! drive each kind with its own iteration.

mod add_dimension_shine_through;
mod add_new_property;
mod change_node_type;
mod change_property_value;
mod factory;
mod move_dimension_space_point;
mod remove_node;
mod remove_property;
mod rename_node_aggregate;
mod rename_property;
mod strip_tags_on_property;
mod update_root_node_aggregate_dimensions;

pub use add_dimension_shine_through::AddDimensionShineThroughTransformation;
pub use add_new_property::AddNewPropertyTransformation;
pub use change_node_type::ChangeNodeTypeTransformation;
pub use change_property_value::ChangePropertyValueTransformation;
pub use factory::TransformationsFactory;
pub use move_dimension_space_point::MoveDimensionSpacePointTransformation;
pub use remove_node::RemoveNodeTransformation;
pub use remove_property::RemovePropertyTransformation;
pub use rename_node_aggregate::RenameNodeAggregateTransformation;
pub use rename_property::RenamePropertyTransformation;
pub use strip_tags_on_property::StripTagsOnPropertyTransformation;
pub use update_root_node_aggregate_dimensions::UpdateRootNodeAggregateDimensionsTransformation;

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

use super::error::MigrationResult;
use crate::aggregate::{Node, NodeAggregate};
use crate::commands::SetSerializedNodeProperties;
use crate::content_repository::{CommandResult, ContentRepository};
use crate::value_objects::{ContentStreamId, DimensionSpacePointSet, PropertyValuesToWrite};

/// Runs once per migration step
#[async_trait]
pub trait GlobalTransformation: fmt::Debug + Send + Sync {
    async fn execute(
        &self,
        content_stream_for_reading: &ContentStreamId,
        content_stream_for_writing: &ContentStreamId,
    ) -> MigrationResult<Option<CommandResult>>;
}

/// Runs once per matching node aggregate
#[async_trait]
pub trait NodeAggregateBasedTransformation: fmt::Debug + Send + Sync {
    async fn execute(
        &self,
        node_aggregate: &NodeAggregate,
        content_stream_for_writing: &ContentStreamId,
    ) -> MigrationResult<Option<CommandResult>>;
}

/// Runs once per matching node variant; `None` means nothing to do for it
#[async_trait]
pub trait NodeBasedTransformation: fmt::Debug + Send + Sync {
    async fn execute(
        &self,
        node: &Node,
        covered_dimension_space_points: &DimensionSpacePointSet,
        content_stream_for_writing: &ContentStreamId,
    ) -> MigrationResult<Option<CommandResult>>;
}

/// Granularity of a transformation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformationKind {
    Global,
    NodeAggregateBased,
    NodeBased,
}

/// A transformation resolved into its kind
#[derive(Debug)]
pub enum Transformation {
    Global(Box<dyn GlobalTransformation>),
    NodeAggregateBased(Box<dyn NodeAggregateBasedTransformation>),
    NodeBased(Box<dyn NodeBasedTransformation>),
}

impl Transformation {
    pub fn kind(&self) -> TransformationKind {
        match self {
            Self::Global(_) => TransformationKind::Global,
            Self::NodeAggregateBased(_) => TransformationKind::NodeAggregateBased,
            Self::NodeBased(_) => TransformationKind::NodeBased,
        }
    }
}

/// The transformations of one migration step, partitioned by kind
#[derive(Debug, Default)]
pub struct Transformations {
    global: Vec<Box<dyn GlobalTransformation>>,
    node_aggregate_based: Vec<Box<dyn NodeAggregateBasedTransformation>>,
    node_based: Vec<Box<dyn NodeBasedTransformation>>,
}

impl Transformations {
    /// Partition transformations, keeping configuration order within each kind
    pub fn new(transformations: impl IntoIterator<Item = Transformation>) -> Self {
        let mut result = Self::default();
        for transformation in transformations {
            match transformation {
                Transformation::Global(t) => result.global.push(t),
                Transformation::NodeAggregateBased(t) => result.node_aggregate_based.push(t),
                Transformation::NodeBased(t) => result.node_based.push(t),
            }
        }
        result
    }

    pub fn has_global_transformations(&self) -> bool {
        !self.global.is_empty()
    }

    pub fn has_node_aggregate_based_transformations(&self) -> bool {
        !self.node_aggregate_based.is_empty()
    }

    pub fn has_node_based_transformations(&self) -> bool {
        !self.node_based.is_empty()
    }

    /// Whether transformations of different kinds are mixed
    pub fn contains_more_than_one_transformation_type(&self) -> bool {
        [
            self.has_global_transformations(),
            self.has_node_aggregate_based_transformations(),
            self.has_node_based_transformations(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
            > 1
    }

    pub fn global(&self) -> &[Box<dyn GlobalTransformation>] {
        &self.global
    }

    pub fn node_aggregate_based(&self) -> &[Box<dyn NodeAggregateBasedTransformation>] {
        &self.node_aggregate_based
    }

    pub fn node_based(&self) -> &[Box<dyn NodeBasedTransformation>] {
        &self.node_based
    }

    /// Run all global transformations, blocking on each result; returns the number of commands
    pub async fn execute_global(
        &self,
        content_stream_for_reading: &ContentStreamId,
        content_stream_for_writing: &ContentStreamId,
    ) -> MigrationResult<usize> {
        let mut commands = 0;
        for transformation in &self.global {
            let result = transformation
                .execute(content_stream_for_reading, content_stream_for_writing)
                .await?;
            commands += block_on_result(result).await?;
        }
        Ok(commands)
    }
}

/// Wait for a command's effects; 1 if a command was issued, else 0
pub(crate) async fn block_on_result(result: Option<CommandResult>) -> MigrationResult<usize> {
    match result {
        Some(result) => {
            result.block().await?;
            Ok(1)
        }
        None => {
            trace!("Transformation had nothing to do");
            Ok(0)
        }
    }
}

/// Write property changes to exactly the given variant
pub(crate) async fn set_properties(
    repository: &Arc<ContentRepository>,
    node: &Node,
    content_stream_for_writing: &ContentStreamId,
    property_values: PropertyValuesToWrite,
) -> MigrationResult<Option<CommandResult>> {
    let result = repository
        .handle(SetSerializedNodeProperties {
            content_stream_id: content_stream_for_writing.clone(),
            node_aggregate_id: node.node_aggregate_id.clone(),
            origin_dimension_space_point: node.origin_dimension_space_point.clone(),
            property_values,
        })
        .await?;
    Ok(Some(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContentRepositorySettings;

    #[derive(Debug)]
    struct NoopGlobal;

    #[async_trait]
    impl GlobalTransformation for NoopGlobal {
        async fn execute(&self, _: &ContentStreamId, _: &ContentStreamId) -> MigrationResult<Option<CommandResult>> {
            Ok(None)
        }
    }

    #[test]
    fn test_mixed_kinds_are_detected() {
        let repository = Arc::new(ContentRepository::new(ContentRepositorySettings::default()).unwrap());
        let node_based = RemovePropertyTransformation::new("title".to_string(), Arc::clone(&repository));

        let single = Transformations::new(vec![Transformation::Global(Box::new(NoopGlobal))]);
        assert!(!single.contains_more_than_one_transformation_type());
        assert!(single.has_global_transformations());

        let mixed = Transformations::new(vec![
            Transformation::Global(Box::new(NoopGlobal)),
            Transformation::NodeBased(Box::new(node_based)),
        ]);
        assert!(mixed.contains_more_than_one_transformation_type());
        assert_eq!(mixed.node_based().len(), 1);
    }

    #[tokio::test]
    async fn test_no_op_results_issue_no_commands() {
        let transformations = Transformations::new(vec![Transformation::Global(Box::new(NoopGlobal))]);
        let content_stream_id = ContentStreamId::create();
        let commands = transformations
            .execute_global(&content_stream_id, &content_stream_id)
            .await
            .unwrap();
        assert_eq!(commands, 0);
    }
}
