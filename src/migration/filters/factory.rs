//! Resolves configured filter names

use std::collections::HashSet;

use super::*;
use crate::content_repository::ContentRepository;
use crate::migration::configuration::{FilterConfiguration, Settings};
use crate::migration::error::{MigrationError, MigrationResult};
use crate::value_objects::DimensionSpacePoint;

type FilterBuilder = fn(&Settings, &ContentRepository) -> MigrationResult<Filter>;

const FILTERS: &[(&str, FilterBuilder)] = &[
    ("NodeType", build_node_type),
    ("NodeName", build_node_name),
    ("PropertyNotEmpty", build_property_not_empty),
    ("PropertyValue", build_property_value),
    ("DimensionSpacePoints", build_dimension_space_points),
];

const LEGACY_FILTERS: &[(&str, &str)] = &[
    (
        "Workspace",
        "the Workspace filter is gone; pass the workspace to the migration run instead",
    ),
    (
        "IsRemoved",
        "the IsRemoved filter is gone; removed nodes are no longer part of the content graph",
    ),
    (
        "DimensionValues",
        "the DimensionValues filter is gone; use DimensionSpacePoints instead",
    ),
];

/// Builds filters from their configuration
pub struct FiltersFactory<'a> {
    repository: &'a ContentRepository,
}

impl<'a> FiltersFactory<'a> {
    pub fn new(repository: &'a ContentRepository) -> Self {
        Self { repository }
    }

    pub fn build_filters(&self, configurations: &[FilterConfiguration]) -> MigrationResult<Filters> {
        let filters = configurations
            .iter()
            .map(|configuration| self.build_filter(configuration))
            .collect::<MigrationResult<Vec<_>>>()?;
        Ok(Filters::new(filters))
    }

    pub fn build_filter(&self, configuration: &FilterConfiguration) -> MigrationResult<Filter> {
        let name = configuration.type_name.as_str();
        let candidates = [name, name.strip_suffix("Filter").unwrap_or(name)];

        for candidate in candidates {
            if let Some((_, reason)) = LEGACY_FILTERS.iter().find(|(legacy, _)| *legacy == candidate) {
                return Err(MigrationError::Migration(format!(
                    "Filter \"{name}\" is not supported anymore: {reason}"
                )));
            }
            if let Some((_, build)) = FILTERS.iter().find(|(registered, _)| *registered == candidate) {
                return build(&configuration.settings, self.repository);
            }
        }
        Err(MigrationError::Migration(format!("Filter \"{name}\" is not registered")))
    }
}

fn build_node_type(settings: &Settings, repository: &ContentRepository) -> MigrationResult<Filter> {
    let node_type = settings.require_string("NodeType", "nodeType")?;
    let node_type =
        NodeTypeName::new(node_type).map_err(|e| MigrationError::invalid_setting("NodeType", "nodeType", e))?;
    let mut node_type_names = HashSet::from([node_type.clone()]);
    if settings.bool_or("NodeType", "withSubTypes", false)? {
        node_type_names.extend(repository.node_type_manager().sub_node_type_names(&node_type));
    }
    Ok(Filter::NodeAggregateBased(Box::new(NodeTypeFilter {
        node_type_names,
        exclude: settings.bool_or("NodeType", "exclude", false)?,
    })))
}

fn build_node_name(settings: &Settings, _: &ContentRepository) -> MigrationResult<Filter> {
    let node_name = settings.require_string("NodeName", "nodeName")?;
    let node_name = NodeName::new(node_name).map_err(|e| MigrationError::invalid_setting("NodeName", "nodeName", e))?;
    Ok(Filter::NodeAggregateBased(Box::new(NodeNameFilter { node_name })))
}

fn build_property_not_empty(settings: &Settings, _: &ContentRepository) -> MigrationResult<Filter> {
    Ok(Filter::NodeBased(Box::new(PropertyNotEmptyFilter {
        property_name: settings.require_string("PropertyNotEmpty", "propertyName")?,
    })))
}

fn build_property_value(settings: &Settings, _: &ContentRepository) -> MigrationResult<Filter> {
    let serialized_value = settings
        .get("serializedValue")
        .cloned()
        .ok_or_else(|| MigrationError::missing_setting("PropertyValue", "serializedValue"))?;
    Ok(Filter::NodeBased(Box::new(PropertyValueFilter {
        property_name: settings.require_string("PropertyValue", "propertyName")?,
        serialized_value,
    })))
}

fn build_dimension_space_points(settings: &Settings, repository: &ContentRepository) -> MigrationResult<Filter> {
    const NAME: &str = "DimensionSpacePoints";
    let configured = settings
        .get("points")
        .and_then(|points| points.as_array())
        .ok_or_else(|| MigrationError::missing_setting(NAME, "points"))?;
    let mut points = DimensionSpacePointSet::empty();
    for point in configured {
        let point =
            DimensionSpacePoint::from_json_value(point).map_err(|e| MigrationError::invalid_setting(NAME, "points", e))?;
        points = points.with(point);
    }
    if settings.bool_or(NAME, "includeSpecializations", false)? {
        let variation_graph = repository.variation_graph();
        for point in points.to_vec() {
            let specializations = variation_graph
                .specialization_set(&point)
                .map_err(|e| MigrationError::invalid_setting(NAME, "points", e))?;
            points = points.union(&specializations);
        }
    }
    Ok(Filter::NodeBased(Box::new(DimensionSpacePointsFilter { points })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContentRepositorySettings;
    use serde_json::json;

    fn repository() -> ContentRepository {
        let settings = ContentRepositorySettings::from_json_str(
            r#"{
                "dimensions": {"language": {"values": {"en": {"specializations": {"en_GB": {}}}, "de": {}}}},
                "node_types": {
                    "Acme:Content": {"abstract": true},
                    "Acme:Text": {"superTypes": ["Acme:Content"]}
                }
            }"#,
        )
        .unwrap();
        ContentRepository::new(settings).unwrap()
    }

    #[test]
    fn test_unknown_and_legacy_filters_are_rejected() {
        let repository = repository();
        let factory = FiltersFactory::new(&repository);

        match factory.build_filter(&FilterConfiguration::new("Nope", Settings::new())) {
            Err(MigrationError::Migration(message)) => assert!(message.contains("not registered")),
            _ => panic!("Expected Migration error"),
        }
        match factory.build_filter(&FilterConfiguration::new("Workspace", Settings::new())) {
            Err(MigrationError::Migration(message)) => assert!(message.contains("not supported anymore")),
            _ => panic!("Expected Migration error"),
        }
    }

    #[test]
    fn test_missing_setting_is_rejected() {
        let repository = repository();
        let result = FiltersFactory::new(&repository).build_filter(&FilterConfiguration::new("NodeType", Settings::new()));
        assert!(matches!(result, Err(MigrationError::Migration(_))));
    }

    #[test]
    fn test_node_type_filter_with_sub_types() {
        let repository = repository();
        let filter = FiltersFactory::new(&repository)
            .build_filter(&FilterConfiguration::new(
                "NodeTypeFilter",
                Settings::new()
                    .with("nodeType", json!("Acme:Content"))
                    .with("withSubTypes", json!(true)),
            ))
            .unwrap();
        match filter {
            Filter::NodeAggregateBased(_) => {}
            _ => panic!("Expected an aggregate based filter"),
        }
    }

    #[test]
    fn test_dimension_space_points_include_specializations() {
        let repository = repository();
        let settings = Settings::new()
            .with("points", json!([{"language": "en"}]))
            .with("includeSpecializations", json!(true));
        let filter = build_dimension_space_points(&settings, &repository).unwrap();
        match filter {
            Filter::NodeBased(_) => {}
            _ => panic!("Expected a node based filter"),
        }

        let bad = Settings::new().with("points", json!([{"language": "fr"}])).with("includeSpecializations", json!(true));
        assert!(build_dimension_space_points(&bad, &repository).is_err());
    }
}
