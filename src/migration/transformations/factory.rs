//! Resolves configured transformation names

use std::sync::Arc;

use super::*;
use crate::content_repository::ContentRepository;
use crate::migration::configuration::{Settings, TransformationConfiguration};
use crate::migration::error::{MigrationError, MigrationResult};
use crate::value_objects::{
    NodeAggregateTypeChangeChildConstraintConflictResolutionStrategy, NodeName, NodeTypeName,
    NodeVariantSelectionStrategy, SerializedPropertyValue,
};

type TransformationBuilder = fn(&Settings, Arc<ContentRepository>) -> MigrationResult<Transformation>;

const TRANSFORMATIONS: &[(&str, TransformationBuilder)] = &[
    ("AddDimensionShineThrough", build_add_dimension_shine_through),
    ("MoveDimensionSpacePoint", build_move_dimension_space_point),
    ("UpdateRootNodeAggregateDimensions", build_update_root_node_aggregate_dimensions),
    ("AddNewProperty", build_add_new_property),
    ("ChangeNodeType", build_change_node_type),
    ("ChangePropertyValue", build_change_property_value),
    ("RemoveNode", build_remove_node),
    ("RemoveProperty", build_remove_property),
    ("RenameNodeAggregate", build_rename_node_aggregate),
    ("RenameProperty", build_rename_property),
    ("StripTagsOnProperty", build_strip_tags_on_property),
];

const LEGACY_TRANSFORMATIONS: &[(&str, &str)] = &[
    (
        "AddDimensions",
        "use AddDimensionShineThrough to let existing content shine through a new dimension value",
    ),
    (
        "RenameDimension",
        "use MoveDimensionSpacePoint to relabel dimension space points",
    ),
    (
        "SetDimensions",
        "use AddDimensionShineThrough or MoveDimensionSpacePoint instead",
    ),
    ("RenameNode", "use RenameNodeAggregate instead"),
];

/// Builds transformations bound to one content repository
pub struct TransformationsFactory {
    repository: Arc<ContentRepository>,
}

impl TransformationsFactory {
    pub fn new(repository: Arc<ContentRepository>) -> Self {
        Self { repository }
    }

    pub fn build_transformations(&self, configurations: &[TransformationConfiguration]) -> MigrationResult<Transformations> {
        let transformations = configurations
            .iter()
            .map(|configuration| self.build_transformation(configuration))
            .collect::<MigrationResult<Vec<_>>>()?;
        Ok(Transformations::new(transformations))
    }

    /// Resolve by exact name, then with a trailing `Transformation` removed
    pub fn build_transformation(&self, configuration: &TransformationConfiguration) -> MigrationResult<Transformation> {
        let name = configuration.type_name.as_str();
        let candidates = [name, name.strip_suffix("Transformation").unwrap_or(name)];

        for candidate in candidates {
            if let Some((_, replacement)) = LEGACY_TRANSFORMATIONS.iter().find(|(legacy, _)| *legacy == candidate) {
                return Err(MigrationError::Migration(format!(
                    "Transformation \"{name}\" is not supported anymore, {replacement}"
                )));
            }
            if let Some((_, build)) = TRANSFORMATIONS.iter().find(|(registered, _)| *registered == candidate) {
                return build(&configuration.settings, Arc::clone(&self.repository));
            }
        }
        Err(MigrationError::Migration(format!("Transformation \"{name}\" is not registered")))
    }
}

fn node_type_name(component: &str, key: &str, settings: &Settings) -> MigrationResult<NodeTypeName> {
    NodeTypeName::new(settings.require_string(component, key)?)
        .map_err(|e| MigrationError::invalid_setting(component, key, e))
}

fn build_add_dimension_shine_through(
    settings: &Settings,
    repository: Arc<ContentRepository>,
) -> MigrationResult<Transformation> {
    const NAME: &str = "AddDimensionShineThrough";
    Ok(Transformation::Global(Box::new(AddDimensionShineThroughTransformation::new(
        settings.require_dimension_space_point(NAME, "from")?,
        settings.require_dimension_space_point(NAME, "to")?,
        repository,
    ))))
}

fn build_move_dimension_space_point(
    settings: &Settings,
    repository: Arc<ContentRepository>,
) -> MigrationResult<Transformation> {
    const NAME: &str = "MoveDimensionSpacePoint";
    Ok(Transformation::Global(Box::new(MoveDimensionSpacePointTransformation::new(
        settings.require_dimension_space_point(NAME, "from")?,
        settings.require_dimension_space_point(NAME, "to")?,
        repository,
    ))))
}

fn build_update_root_node_aggregate_dimensions(
    settings: &Settings,
    repository: Arc<ContentRepository>,
) -> MigrationResult<Transformation> {
    let node_type_name = node_type_name("UpdateRootNodeAggregateDimensions", "nodeType", settings)?;
    if !repository.node_type_manager().has_node_type(&node_type_name) {
        return Err(MigrationError::Migration(format!(
            "UpdateRootNodeAggregateDimensions: node type \"{node_type_name}\" is not configured"
        )));
    }
    Ok(Transformation::Global(Box::new(
        UpdateRootNodeAggregateDimensionsTransformation::new(node_type_name, repository),
    )))
}

fn build_add_new_property(settings: &Settings, repository: Arc<ContentRepository>) -> MigrationResult<Transformation> {
    const NAME: &str = "AddNewProperty";
    let value = settings
        .get("serializedValue")
        .cloned()
        .ok_or_else(|| MigrationError::missing_setting(NAME, "serializedValue"))?;
    let type_name = settings
        .optional_string(NAME, "type")?
        .unwrap_or_else(|| "string".to_string());
    Ok(Transformation::NodeBased(Box::new(AddNewPropertyTransformation::new(
        settings.require_string(NAME, "newPropertyName")?,
        SerializedPropertyValue::new(value, type_name),
        repository,
    ))))
}

fn build_change_node_type(settings: &Settings, repository: Arc<ContentRepository>) -> MigrationResult<Transformation> {
    const NAME: &str = "ChangeNodeType";
    let new_type = node_type_name(NAME, "newType", settings)?;
    let strategy = if settings.bool_or(NAME, "forceDeleteNonMatchingChildren", false)? {
        NodeAggregateTypeChangeChildConstraintConflictResolutionStrategy::Delete
    } else {
        NodeAggregateTypeChangeChildConstraintConflictResolutionStrategy::HappyPath
    };
    Ok(Transformation::NodeAggregateBased(Box::new(ChangeNodeTypeTransformation::new(
        new_type, strategy, repository,
    ))))
}

fn build_change_property_value(
    settings: &Settings,
    repository: Arc<ContentRepository>,
) -> MigrationResult<Transformation> {
    const NAME: &str = "ChangePropertyValue";
    Ok(Transformation::NodeBased(Box::new(ChangePropertyValueTransformation::new(
        settings.require_string(NAME, "property")?,
        settings.optional_string(NAME, "newSerializedValue")?,
        settings.optional_string(NAME, "search")?.unwrap_or_default(),
        settings.optional_string(NAME, "replace")?.unwrap_or_default(),
        settings.optional_string(NAME, "currentValuePlaceholder")?,
        repository,
    ))))
}

fn build_remove_node(settings: &Settings, repository: Arc<ContentRepository>) -> MigrationResult<Transformation> {
    const NAME: &str = "RemoveNode";
    let strategy = match settings.optional_string(NAME, "strategy")? {
        Some(strategy) => strategy
            .parse::<NodeVariantSelectionStrategy>()
            .map_err(|e| MigrationError::invalid_setting(NAME, "strategy", e))?,
        None => NodeVariantSelectionStrategy::AllSpecializations,
    };
    let transformation = RemoveNodeTransformation::new(
        settings.optional_dimension_space_point(NAME, "overriddenDimensionSpacePoint")?,
        strategy,
        repository,
    )?;
    Ok(Transformation::NodeBased(Box::new(transformation)))
}

fn build_remove_property(settings: &Settings, repository: Arc<ContentRepository>) -> MigrationResult<Transformation> {
    Ok(Transformation::NodeBased(Box::new(RemovePropertyTransformation::new(
        settings.require_string("RemoveProperty", "property")?,
        repository,
    ))))
}

fn build_rename_node_aggregate(
    settings: &Settings,
    repository: Arc<ContentRepository>,
) -> MigrationResult<Transformation> {
    const NAME: &str = "RenameNodeAggregate";
    let new_node_name = NodeName::new(settings.require_string(NAME, "newNodeName")?)
        .map_err(|e| MigrationError::invalid_setting(NAME, "newNodeName", e))?;
    Ok(Transformation::NodeAggregateBased(Box::new(
        RenameNodeAggregateTransformation::new(new_node_name, repository),
    )))
}

fn build_rename_property(settings: &Settings, repository: Arc<ContentRepository>) -> MigrationResult<Transformation> {
    const NAME: &str = "RenameProperty";
    Ok(Transformation::NodeBased(Box::new(RenamePropertyTransformation::new(
        settings.require_string(NAME, "from")?,
        settings.require_string(NAME, "to")?,
        repository,
    ))))
}

fn build_strip_tags_on_property(
    settings: &Settings,
    repository: Arc<ContentRepository>,
) -> MigrationResult<Transformation> {
    Ok(Transformation::NodeBased(Box::new(StripTagsOnPropertyTransformation::new(
        settings.require_string("StripTagsOnProperty", "property")?,
        repository,
    ))))
}
