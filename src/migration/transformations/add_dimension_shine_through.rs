use async_trait::async_trait;
use std::sync::Arc;

use super::GlobalTransformation;
use crate::commands::AddDimensionShineThrough;
use crate::content_repository::{CommandResult, ContentRepository};
use crate::migration::error::MigrationResult;
use crate::value_objects::{ContentStreamId, DimensionSpacePoint};

/// Make the content of `from` visible at `to`; `from` must generalize `to`
#[derive(Debug)]
pub struct AddDimensionShineThroughTransformation {
    from: DimensionSpacePoint,
    to: DimensionSpacePoint,
    repository: Arc<ContentRepository>,
}

impl AddDimensionShineThroughTransformation {
    pub fn new(from: DimensionSpacePoint, to: DimensionSpacePoint, repository: Arc<ContentRepository>) -> Self {
        Self { from, to, repository }
    }
}

#[async_trait]
impl GlobalTransformation for AddDimensionShineThroughTransformation {
    async fn execute(
        &self,
        _content_stream_for_reading: &ContentStreamId,
        content_stream_for_writing: &ContentStreamId,
    ) -> MigrationResult<Option<CommandResult>> {
        let result = self
            .repository
            .handle(AddDimensionShineThrough {
                content_stream_id: content_stream_for_writing.clone(),
                source: self.from.clone(),
                target: self.to.clone(),
            })
            .await?;
        Ok(Some(result))
    }
}
