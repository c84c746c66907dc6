use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::{set_properties, NodeBasedTransformation};
use crate::aggregate::Node;
use crate::content_repository::{CommandResult, ContentRepository};
use crate::migration::error::{MigrationError, MigrationResult};
use crate::value_objects::{ContentStreamId, DimensionSpacePointSet, PropertyValuesToWrite, SerializedPropertyValue};

/// Remove markup tags from a string property
#[derive(Debug)]
pub struct StripTagsOnPropertyTransformation {
    property: String,
    repository: Arc<ContentRepository>,
}

impl StripTagsOnPropertyTransformation {
    pub fn new(property: String, repository: Arc<ContentRepository>) -> Self {
        Self { property, repository }
    }
}

/// A `<` only opens a tag when followed by a letter, `/`, `!` or `?`.
/// Quoted `>` inside a tag does not close it.
pub(crate) fn strip_tags(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_tag = false;
    let mut quote: Option<char> = None;
    while let Some(c) = chars.next() {
        if in_tag {
            match (quote, c) {
                (Some(open), _) if c == open => quote = None,
                (Some(_), _) => {}
                (None, '"' | '\'') => quote = Some(c),
                (None, '>') => in_tag = false,
                (None, _) => {}
            }
            continue;
        }
        let opens_tag = c == '<'
            && chars
                .peek()
                .is_some_and(|next| next.is_ascii_alphabetic() || matches!(next, '/' | '!' | '?'));
        if opens_tag {
            in_tag = true;
        } else {
            output.push(c);
        }
    }
    output
}

#[async_trait]
impl NodeBasedTransformation for StripTagsOnPropertyTransformation {
    async fn execute(
        &self,
        node: &Node,
        _covered_dimension_space_points: &DimensionSpacePointSet,
        content_stream_for_writing: &ContentStreamId,
    ) -> MigrationResult<Option<CommandResult>> {
        let Some(property) = node.property(&self.property) else {
            return Ok(None);
        };
        let Value::String(value) = &property.value else {
            return Err(MigrationError::TransformationFailed(format!(
                "StripTagsOnProperty can only be applied to string properties, \"{}\" of node aggregate \"{}\" is {}",
                self.property, node.node_aggregate_id, property.value
            )));
        };
        let stripped = strip_tags(value);
        if &stripped == value {
            return Ok(None);
        }
        set_properties(
            &self.repository,
            node,
            content_stream_for_writing,
            PropertyValuesToWrite::new().set(
                self.property.clone(),
                SerializedPropertyValue::new(Value::String(stripped), property.type_name.clone()),
            ),
        )
        .await
    }
}
