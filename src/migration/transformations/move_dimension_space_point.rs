use async_trait::async_trait;
use std::sync::Arc;

use super::GlobalTransformation;
use crate::commands::MoveDimensionSpacePoint;
use crate::content_repository::{CommandResult, ContentRepository};
use crate::migration::error::MigrationResult;
use crate::value_objects::{ContentStreamId, DimensionSpacePoint};

/// Relabel a dimension space point throughout the content stream
#[derive(Debug)]
pub struct MoveDimensionSpacePointTransformation {
    from: DimensionSpacePoint,
    to: DimensionSpacePoint,
    repository: Arc<ContentRepository>,
}

impl MoveDimensionSpacePointTransformation {
    pub fn new(from: DimensionSpacePoint, to: DimensionSpacePoint, repository: Arc<ContentRepository>) -> Self {
        Self { from, to, repository }
    }
}

#[async_trait]
impl GlobalTransformation for MoveDimensionSpacePointTransformation {
    async fn execute(
        &self,
        _content_stream_for_reading: &ContentStreamId,
        content_stream_for_writing: &ContentStreamId,
    ) -> MigrationResult<Option<CommandResult>> {
        let result = self
            .repository
            .handle(MoveDimensionSpacePoint {
                content_stream_id: content_stream_for_writing.clone(),
                source: self.from.clone(),
                target: self.to.clone(),
            })
            .await?;
        Ok(Some(result))
    }
}
