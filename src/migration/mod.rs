//! Node migrations
//!
//! A migration walks the content graph of a workspace step by step. Each
//! step selects graph elements with its filters and hands them to its
//! transformations, which issue commands against the target workspace's
//! content stream. Every command is awaited until the read models have
//! caught up, so later transformations always observe earlier writes.

pub mod configuration;
pub mod error;
pub mod filters;
pub mod transformations;

pub use configuration::{
    FilterConfiguration, MigrationConfiguration, MigrationFactory, MigrationStep, Settings,
    TransformationConfiguration,
};
pub use error::{MigrationError, MigrationResult};
pub use filters::{Filter, Filters, FiltersFactory};
pub use transformations::{Transformation, TransformationKind, Transformations, TransformationsFactory};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::aggregate::{Node, NodeAggregate};
use crate::commands::CreateWorkspace;
use crate::content_repository::{ContentRepository, ContentRepositoryError};
use crate::queries::ContentGraph;
use crate::value_objects::{
    ContentStreamId, DimensionSpacePointSet, NodeAggregateId, OriginDimensionSpacePoint, WorkspaceName,
};
use transformations::block_on_result;

/// Run a migration from one workspace into another; equal names transform in place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteMigration {
    pub source_workspace_name: WorkspaceName,
    pub target_workspace_name: WorkspaceName,
}

impl ExecuteMigration {
    pub fn in_place(workspace_name: WorkspaceName) -> Self {
        Self {
            source_workspace_name: workspace_name.clone(),
            target_workspace_name: workspace_name,
        }
    }
}

/// Counts of one executed step; a global step counts as one visit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub visited: usize,
    pub commands: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub steps: Vec<StepReport>,
}

impl MigrationReport {
    pub fn total_commands(&self) -> usize {
        self.steps.iter().map(|step| step.commands).sum()
    }
}

struct ResolvedStep {
    filters: Filters,
    transformations: Transformations,
}

/// Executes node migrations against one content repository
#[derive(Debug, Clone)]
pub struct NodeMigrationService {
    repository: Arc<ContentRepository>,
}

impl NodeMigrationService {
    pub fn new(repository: Arc<ContentRepository>) -> Self {
        Self { repository }
    }

    /// Resolve every step, then run them in order
    ///
    /// All filters and transformations are built before the first command
    /// is issued, so configuration errors never leave a partial migration.
    /// A failing command aborts the run; commands issued before it stay
    /// committed.
    ///
    /// The reading content stream only provides the enumeration of elements.
    /// Each transformation receives the element as currently found in the
    /// writing content stream, and elements that vanished there are skipped.
    pub async fn execute_migration(
        &self,
        migration: &MigrationConfiguration,
        command: ExecuteMigration,
    ) -> MigrationResult<MigrationReport> {
        let steps = self.resolve_steps(migration)?;

        let source = self
            .repository
            .find_workspace(&command.source_workspace_name)
            .ok_or_else(|| ContentRepositoryError::WorkspaceNotFound(command.source_workspace_name.clone()))?;
        let content_stream_for_writing = self.target_content_stream(&command).await?;

        info!(
            source = %command.source_workspace_name,
            target = %command.target_workspace_name,
            steps = steps.len(),
            "Executing migration"
        );

        let mut report = MigrationReport::default();
        for (index, step) in steps.iter().enumerate() {
            let content_stream_for_reading = if index == 0 {
                &source.current_content_stream_id
            } else {
                &content_stream_for_writing
            };
            info!(step = index + 1, "Running migration step");
            let step_report = self
                .execute_step(step, content_stream_for_reading, &content_stream_for_writing)
                .await?;
            info!(
                step = index + 1,
                visited = step_report.visited,
                commands = step_report.commands,
                "Migration step finished"
            );
            report.steps.push(step_report);
        }
        Ok(report)
    }

    fn resolve_steps(&self, migration: &MigrationConfiguration) -> MigrationResult<Vec<ResolvedStep>> {
        let filters_factory = FiltersFactory::new(&self.repository);
        let transformations_factory = TransformationsFactory::new(Arc::clone(&self.repository));

        let mut steps = Vec::with_capacity(migration.migration.len());
        for (index, step) in migration.migration.iter().enumerate() {
            let transformations = transformations_factory.build_transformations(&step.transformations)?;
            if transformations.contains_more_than_one_transformation_type() {
                return Err(MigrationError::InvalidMigrationConfiguration(format!(
                    "Step {} mixes global, node aggregate based and node based transformations; split it into separate steps",
                    index + 1
                )));
            }
            let filters = filters_factory.build_filters(&step.filters)?;
            if filters.has_node_based_filters() && !transformations.has_node_based_transformations() {
                warn!(step = index + 1, "Node based filters only apply to node based transformations");
            }
            steps.push(ResolvedStep {
                filters,
                transformations,
            });
        }
        Ok(steps)
    }

    async fn target_content_stream(&self, command: &ExecuteMigration) -> MigrationResult<ContentStreamId> {
        if let Some(target) = self.repository.find_workspace(&command.target_workspace_name) {
            return Ok(target.current_content_stream_id);
        }
        let new_content_stream_id = ContentStreamId::create();
        info!(
            workspace = %command.target_workspace_name,
            base = %command.source_workspace_name,
            "Creating migration target workspace"
        );
        self.repository
            .handle(CreateWorkspace {
                workspace_name: command.target_workspace_name.clone(),
                base_workspace_name: command.source_workspace_name.clone(),
                new_content_stream_id: new_content_stream_id.clone(),
            })
            .await?
            .block()
            .await?;
        Ok(new_content_stream_id)
    }

    async fn execute_step(
        &self,
        step: &ResolvedStep,
        content_stream_for_reading: &ContentStreamId,
        content_stream_for_writing: &ContentStreamId,
    ) -> MigrationResult<StepReport> {
        let transformations = &step.transformations;
        if transformations.has_global_transformations() {
            let commands = transformations
                .execute_global(content_stream_for_reading, content_stream_for_writing)
                .await?;
            return Ok(StepReport { visited: 1, commands });
        }
        if transformations.has_node_aggregate_based_transformations() {
            return self
                .execute_node_aggregate_based(step, content_stream_for_reading, content_stream_for_writing)
                .await;
        }
        if transformations.has_node_based_transformations() {
            return self
                .execute_node_based(step, content_stream_for_reading, content_stream_for_writing)
                .await;
        }
        Ok(StepReport::default())
    }

    /// Aggregates of every used node type, enumerated before anything is written
    fn matching_node_aggregates(
        &self,
        filters: &Filters,
        content_stream_for_reading: &ContentStreamId,
    ) -> MigrationResult<Vec<NodeAggregate>> {
        let graph = self.repository.content_graph_for_content_stream(content_stream_for_reading)?;
        Ok(graph
            .find_used_node_type_names()
            .iter()
            .flat_map(|node_type_name| graph.find_node_aggregates_by_type(node_type_name))
            .filter(|node_aggregate| filters.matches_node_aggregate(node_aggregate))
            .collect())
    }

    fn writing_graph(&self, content_stream_for_writing: &ContentStreamId) -> MigrationResult<ContentGraph> {
        Ok(self.repository.content_graph_for_content_stream(content_stream_for_writing)?)
    }

    async fn execute_node_aggregate_based(
        &self,
        step: &ResolvedStep,
        content_stream_for_reading: &ContentStreamId,
        content_stream_for_writing: &ContentStreamId,
    ) -> MigrationResult<StepReport> {
        let mut report = StepReport::default();
        for node_aggregate in self.matching_node_aggregates(&step.filters, content_stream_for_reading)? {
            report.visited += 1;
            let node_aggregate_id = &node_aggregate.node_aggregate_id;
            for transformation in step.transformations.node_aggregate_based() {
                let Some(current) = self
                    .writing_graph(content_stream_for_writing)?
                    .find_node_aggregate_by_id(node_aggregate_id)
                else {
                    debug!(node_aggregate = %node_aggregate_id, "Node aggregate vanished, skipping");
                    break;
                };
                let result = transformation.execute(&current, content_stream_for_writing).await?;
                report.commands += block_on_result(result).await?;
            }
        }
        Ok(report)
    }

    async fn execute_node_based(
        &self,
        step: &ResolvedStep,
        content_stream_for_reading: &ContentStreamId,
        content_stream_for_writing: &ContentStreamId,
    ) -> MigrationResult<StepReport> {
        let mut report = StepReport::default();
        for node_aggregate in self.matching_node_aggregates(&step.filters, content_stream_for_reading)? {
            for origin in node_aggregate.occupied_dimension_space_points() {
                let Some(node) = node_aggregate.node_by_occupied_dimension_space_point(&origin) else {
                    continue;
                };
                if !step.filters.matches_node(node) {
                    continue;
                }
                report.visited += 1;

                for transformation in step.transformations.node_based() {
                    let current = self.reread_node(&node_aggregate.node_aggregate_id, &origin, content_stream_for_writing)?;
                    let Some((node, covered_dimension_space_points)) = current.as_ref() else {
                        debug!(
                            node_aggregate = %node_aggregate.node_aggregate_id,
                            origin = %origin,
                            "Node vanished, skipping"
                        );
                        break;
                    };
                    let result = transformation
                        .execute(node, covered_dimension_space_points, content_stream_for_writing)
                        .await?;
                    report.commands += block_on_result(result).await?;
                }
            }
        }
        Ok(report)
    }

    fn reread_node(
        &self,
        node_aggregate_id: &NodeAggregateId,
        origin: &OriginDimensionSpacePoint,
        content_stream_for_writing: &ContentStreamId,
    ) -> MigrationResult<Option<(Node, DimensionSpacePointSet)>> {
        Ok(self
            .writing_graph(content_stream_for_writing)?
            .find_node_aggregate_by_id(node_aggregate_id)
            .and_then(|node_aggregate| {
                let node = node_aggregate.node_by_occupied_dimension_space_point(origin)?.clone();
                Some((node, node_aggregate.coverage_by_occupant(origin)))
            }))
    }
}
