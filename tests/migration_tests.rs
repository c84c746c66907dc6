//! Node migrations end to end

use serde_json::json;
use std::sync::Arc;

use cim_content_graph::commands::*;
use cim_content_graph::migration::{MigrationConfiguration, MigrationError, MigrationReport};
use cim_content_graph::{
    CommandError, ContentRepository, ContentRepositoryError, ContentRepositorySettings, ContentStreamId,
    DimensionSpacePoint, DimensionSpacePointSet, EventStore, ExecuteMigration, Node, NodeAggregateId, NodeMigrationService,
    NodeName, NodeTypeName, OriginDimensionSpacePoint, SerializedPropertyValue, SerializedPropertyValues,
    WorkspaceName,
};

const NODE_TYPES: &str = r#"{
    "Acme:Sites": {"superTypes": ["Neos.ContentRepository:Root"]},
    "Acme:Document": {"abstract": true},
    "Acme:Page": {"superTypes": ["Acme:Document"]},
    "Acme:Folder": {"superTypes": ["Acme:Document"], "constraints": {"nodeTypes": {"Acme:Document": true}}},
    "Acme:Text": {}
}"#;

fn settings(dimension_values: serde_json::Value) -> ContentRepositorySettings {
    let settings = json!({
        "dimensions": {"language": {"values": dimension_values}},
        "node_types": serde_json::from_str::<serde_json::Value>(NODE_TYPES).unwrap(),
    });
    ContentRepositorySettings::from_json_str(&settings.to_string()).unwrap()
}

fn default_settings() -> ContentRepositorySettings {
    settings(json!({"en": {"specializations": {"en_GB": {}}}, "de": {}}))
}

fn point(language: &str) -> DimensionSpacePoint {
    DimensionSpacePoint::from_array([("language", language)]).unwrap()
}

fn origin(language: &str) -> OriginDimensionSpacePoint {
    OriginDimensionSpacePoint::from_dimension_space_point(point(language))
}

fn id(value: &str) -> NodeAggregateId {
    NodeAggregateId::new(value).unwrap()
}

fn migration(steps: serde_json::Value) -> MigrationConfiguration {
    serde_json::from_value(json!({ "migration": steps })).unwrap()
}

struct Fixture {
    repository: Arc<ContentRepository>,
    content_stream_id: ContentStreamId,
}

impl Fixture {
    async fn new(settings: ContentRepositorySettings) -> Self {
        let repository = Arc::new(ContentRepository::new(settings).unwrap());
        let content_stream_id = ContentStreamId::create();
        let fixture = Self {
            repository,
            content_stream_id: content_stream_id.clone(),
        };
        fixture
            .run(CreateRootWorkspace {
                workspace_name: WorkspaceName::live(),
                new_content_stream_id: content_stream_id.clone(),
            })
            .await;
        fixture
            .run(CreateRootNodeAggregateWithNode {
                content_stream_id,
                node_aggregate_id: id("sites"),
                node_type_name: NodeTypeName::new("Acme:Sites").unwrap(),
            })
            .await;
        fixture
    }

    async fn run(&self, command: impl Into<Command>) {
        self.repository.handle(command).await.unwrap().block().await.unwrap();
    }

    async fn create_node(
        &self,
        node_id: &str,
        node_type: &str,
        parent: &str,
        language: &str,
        properties: serde_json::Value,
    ) {
        let initial_property_values = properties
            .as_object()
            .unwrap()
            .iter()
            .map(|(name, value)| (name.clone(), SerializedPropertyValue::new(value.clone(), "string")))
            .collect::<SerializedPropertyValues>();
        self.run(CreateNodeAggregateWithNode {
            content_stream_id: self.content_stream_id.clone(),
            node_aggregate_id: id(node_id),
            node_type_name: NodeTypeName::new(node_type).unwrap(),
            origin_dimension_space_point: origin(language),
            parent_node_aggregate_id: id(parent),
            node_name: Some(NodeName::new(node_id).unwrap()),
            initial_property_values,
        })
        .await;
    }

    async fn create_peer_variant(&self, node_id: &str, from: &str, to: &str) {
        self.run(CreateNodeVariant {
            content_stream_id: self.content_stream_id.clone(),
            node_aggregate_id: id(node_id),
            source_origin: origin(from),
            target_origin: origin(to),
        })
        .await;
    }

    fn node_in(&self, workspace: &WorkspaceName, node_id: &str, language: &str) -> Option<Node> {
        self.repository
            .content_graph(workspace)
            .unwrap()
            .find_node_aggregate_by_id(&id(node_id))?
            .node_by_occupied_dimension_space_point(&origin(language))
            .cloned()
    }

    fn node(&self, node_id: &str, language: &str) -> Option<Node> {
        self.node_in(&WorkspaceName::live(), node_id, language)
    }

    async fn migrate(&self, migration: &MigrationConfiguration) -> Result<MigrationReport, MigrationError> {
        NodeMigrationService::new(Arc::clone(&self.repository))
            .execute_migration(migration, ExecuteMigration::in_place(WorkspaceName::live()))
            .await
    }
}

#[tokio::test]
async fn test_rename_property_end_to_end() {
    let fixture = Fixture::new(default_settings()).await;
    fixture
        .create_node("welcome", "Acme:Page", "sites", "en", json!({"headline": "Welcome"}))
        .await;

    let report = fixture
        .migrate(&migration(json!([{
            "transformations": [{"type": "RenamePropertyTransformation", "settings": {"from": "headline", "to": "title"}}]
        }])))
        .await
        .unwrap();
    assert_eq!(report.total_commands(), 1);

    let node = fixture.node("welcome", "en").unwrap();
    assert_eq!(node.property("title").unwrap().value, json!("Welcome"));
    assert!(!node.has_property("headline"));
    assert_eq!(node.origin_dimension_space_point, origin("en"));
    assert_eq!(node.content_stream_id, fixture.content_stream_id);
    assert_eq!(
        fixture
            .repository
            .find_workspace(&WorkspaceName::live())
            .unwrap()
            .current_content_stream_id,
        fixture.content_stream_id
    );
}

#[tokio::test]
async fn test_add_new_property_is_idempotent() {
    let fixture = Fixture::new(default_settings()).await;
    fixture.create_node("page", "Acme:Page", "sites", "en", json!({})).await;
    let add = migration(json!([{
        "filters": [{"type": "NodeType", "settings": {"nodeType": "Acme:Page"}}],
        "transformations": [{"type": "AddNewProperty", "settings": {"newPropertyName": "subtitle", "serializedValue": "Hi"}}]
    }]));

    let first = fixture.migrate(&add).await.unwrap();
    let second = fixture.migrate(&add).await.unwrap();

    assert_eq!(first.total_commands(), 1);
    assert_eq!(second.total_commands(), 0);
    let node = fixture.node("page", "en").unwrap();
    assert_eq!(node.property("subtitle").unwrap().value, json!("Hi"));
}

#[tokio::test]
async fn test_property_change_is_isolated_to_one_variant() {
    let fixture = Fixture::new(default_settings()).await;
    fixture
        .create_node("n1", "Acme:Page", "sites", "en", json!({"title": "Hello"}))
        .await;
    fixture.create_peer_variant("n1", "en", "de").await;
    fixture
        .run(SetSerializedNodeProperties {
            content_stream_id: fixture.content_stream_id.clone(),
            node_aggregate_id: id("n1"),
            origin_dimension_space_point: origin("de"),
            property_values: cim_content_graph::PropertyValuesToWrite::new()
                .set("title", SerializedPropertyValue::string("Hallo")),
        })
        .await;

    fixture
        .migrate(&migration(json!([{
            "filters": [{"type": "DimensionSpacePoints", "settings": {"points": [{"language": "en"}]}}],
            "transformations": [{
                "type": "ChangePropertyValue",
                "settings": {"property": "title", "newSerializedValue": "{current} (updated)"}
            }]
        }])))
        .await
        .unwrap();

    assert_eq!(fixture.node("n1", "en").unwrap().property("title").unwrap().value, json!("Hello (updated)"));
    assert_eq!(fixture.node("n1", "de").unwrap().property("title").unwrap().value, json!("Hallo"));
}

#[tokio::test]
async fn test_rename_property_round_trip() {
    let fixture = Fixture::new(default_settings()).await;
    fixture.create_node("page", "Acme:Page", "sites", "en", json!({"foo": "bar"})).await;

    let report = fixture
        .migrate(&migration(json!([{
            "transformations": [
                {"type": "RenameProperty", "settings": {"from": "foo", "to": "baz"}},
                {"type": "RenameProperty", "settings": {"from": "baz", "to": "foo"}}
            ]
        }])))
        .await
        .unwrap();

    assert_eq!(report.total_commands(), 2);
    let node = fixture.node("page", "en").unwrap();
    assert_eq!(node.property("foo").unwrap().value, json!("bar"));
    assert!(!node.has_property("baz"));
}

#[tokio::test]
async fn test_remove_node_rejects_all_variants_before_any_command() {
    let fixture = Fixture::new(default_settings()).await;
    fixture.create_node("page", "Acme:Page", "sites", "en", json!({})).await;
    let event_store = fixture.repository.event_store();
    let before = event_store.last_sequence_number().await.unwrap();

    let result = fixture
        .migrate(&migration(json!([{
            "transformations": [{"type": "RemoveNode", "settings": {"strategy": "allVariants"}}]
        }])))
        .await;

    match result {
        Err(MigrationError::InvalidMigrationConfiguration(_)) => {}
        other => panic!("Expected InvalidMigrationConfiguration, got {other:?}"),
    }
    assert_eq!(event_store.last_sequence_number().await.unwrap(), before);
    assert!(fixture.node("page", "en").is_some());
}

#[tokio::test]
async fn test_change_property_value_search_and_replace() {
    let fixture = Fixture::new(default_settings()).await;
    fixture.create_node("page", "Acme:Page", "sites", "en", json!({"count": "5"})).await;

    fixture
        .migrate(&migration(json!([{
            "transformations": [{
                "type": "ChangePropertyValue",
                "settings": {"property": "count", "newSerializedValue": "was {current}", "search": "5", "replace": "five"}
            }]
        }])))
        .await
        .unwrap();

    assert_eq!(fixture.node("page", "en").unwrap().property("count").unwrap().value, json!("was five"));
}

#[tokio::test]
async fn test_strip_tags_on_property() {
    let fixture = Fixture::new(default_settings()).await;
    fixture
        .create_node("page", "Acme:Page", "sites", "en", json!({"text": "<p>Hello <b>World</b></p>"}))
        .await;
    fixture.create_node("empty", "Acme:Page", "sites", "en", json!({"text": 42})).await;

    let strip = |node_name: &str| {
        migration(json!([{
            "filters": [{"type": "NodeName", "settings": {"nodeName": node_name}}],
            "transformations": [{"type": "StripTagsOnProperty", "settings": {"property": "text"}}]
        }]))
    };

    fixture.migrate(&strip("page")).await.unwrap();
    assert_eq!(fixture.node("page", "en").unwrap().property("text").unwrap().value, json!("Hello World"));

    match fixture.migrate(&strip("empty")).await {
        Err(MigrationError::TransformationFailed(_)) => {}
        other => panic!("Expected TransformationFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_change_node_type_respects_conflict_strategy() {
    let fixture = Fixture::new(default_settings()).await;
    fixture.create_node("page", "Acme:Page", "sites", "en", json!({})).await;
    fixture.create_node("text", "Acme:Text", "page", "en", json!({})).await;
    let change = |force: bool| {
        migration(json!([{
            "filters": [{"type": "NodeType", "settings": {"nodeType": "Acme:Page"}}],
            "transformations": [{
                "type": "ChangeNodeType",
                "settings": {"newType": "Acme:Folder", "forceDeleteNonMatchingChildren": force}
            }]
        }]))
    };

    match fixture.migrate(&change(false)).await {
        Err(MigrationError::ContentRepository(ContentRepositoryError::Command(CommandError::NodeConstraintViolation(_)))) => {}
        other => panic!("Expected NodeConstraintViolation, got {other:?}"),
    }
    assert_eq!(fixture.node("page", "en").unwrap().node_type_name.as_str(), "Acme:Page");

    fixture.migrate(&change(true)).await.unwrap();
    assert_eq!(fixture.node("page", "en").unwrap().node_type_name.as_str(), "Acme:Folder");
    assert!(fixture.node("text", "en").is_none());
}

#[tokio::test]
async fn test_rename_node_aggregate_with_name_filter() {
    let fixture = Fixture::new(default_settings()).await;
    fixture.create_node("old", "Acme:Page", "sites", "en", json!({})).await;
    fixture.create_node("other", "Acme:Page", "sites", "en", json!({})).await;

    let report = fixture
        .migrate(&migration(json!([{
            "filters": [{"type": "NodeName", "settings": {"nodeName": "old"}}],
            "transformations": [{"type": "RenameNodeAggregate", "settings": {"newNodeName": "renamed"}}]
        }])))
        .await
        .unwrap();

    assert_eq!(report.steps[0].visited, 1);
    assert_eq!(report.steps[0].commands, 1);
    assert_eq!(fixture.node("old", "en").unwrap().node_name.unwrap().as_str(), "renamed");
    assert_eq!(fixture.node("other", "en").unwrap().node_name.unwrap().as_str(), "other");
}

#[tokio::test]
async fn test_remove_node_removes_variant_and_its_specializations() {
    let fixture = Fixture::new(default_settings()).await;
    fixture.create_node("page", "Acme:Page", "sites", "en", json!({})).await;
    fixture.create_peer_variant("page", "en", "de").await;
    fixture
        .run(CreateNodeVariant {
            content_stream_id: fixture.content_stream_id.clone(),
            node_aggregate_id: id("page"),
            source_origin: origin("en"),
            target_origin: origin("en_GB"),
        })
        .await;

    fixture
        .migrate(&migration(json!([{
            "filters": [
                {"type": "NodeType", "settings": {"nodeType": "Acme:Page"}},
                {"type": "DimensionSpacePoints", "settings": {"points": [{"language": "en"}], "includeSpecializations": true}}
            ],
            "transformations": [{"type": "RemoveNode", "settings": {}}]
        }])))
        .await
        .unwrap();

    let page = fixture
        .repository
        .content_graph(&WorkspaceName::live())
        .unwrap()
        .find_node_aggregate_by_id(&id("page"))
        .unwrap();
    assert_eq!(page.occupied_dimension_space_points(), vec![origin("de")]);
}

#[tokio::test]
async fn test_remove_node_skips_variant_not_covering_overridden_point() {
    let fixture = Fixture::new(default_settings()).await;
    fixture.create_node("page", "Acme:Page", "sites", "de", json!({})).await;
    let event_store = fixture.repository.event_store();
    let before = event_store.last_sequence_number().await.unwrap();

    let report = fixture
        .migrate(&migration(json!([{
            "filters": [{"type": "NodeType", "settings": {"nodeType": "Acme:Page"}}],
            "transformations": [{"type": "RemoveNode", "settings": {"overriddenDimensionSpacePoint": {"language": "en"}}}]
        }])))
        .await
        .unwrap();

    assert_eq!(report.total_commands(), 0);
    assert_eq!(event_store.last_sequence_number().await.unwrap(), before);
    let page = fixture
        .repository
        .content_graph(&WorkspaceName::live())
        .unwrap()
        .find_node_aggregate_by_id(&id("page"))
        .unwrap();
    assert_eq!(page.occupied_dimension_space_points(), vec![origin("de")]);
    assert!(page.covers(&point("de")));
}

#[tokio::test]
async fn test_remove_node_removes_only_variant_covering_overridden_point() {
    let fixture = Fixture::new(default_settings()).await;
    fixture.create_node("page", "Acme:Page", "sites", "en", json!({})).await;
    fixture.create_peer_variant("page", "en", "de").await;

    let report = fixture
        .migrate(&migration(json!([{
            "filters": [{"type": "NodeType", "settings": {"nodeType": "Acme:Page"}}],
            "transformations": [{"type": "RemoveNode", "settings": {"overriddenDimensionSpacePoint": {"language": "de"}}}]
        }])))
        .await
        .unwrap();

    assert_eq!(report.total_commands(), 1);
    assert!(fixture.node("page", "de").is_none());
    assert!(fixture.node("page", "en").is_some());
    let page = fixture
        .repository
        .content_graph(&WorkspaceName::live())
        .unwrap()
        .find_node_aggregate_by_id(&id("page"))
        .unwrap();
    assert!(!page.covers(&point("de")));
    assert!(page.covers(&point("en_GB")));
}

#[tokio::test]
async fn test_rename_property_onto_itself_keeps_value() {
    let fixture = Fixture::new(default_settings()).await;
    fixture.create_node("page", "Acme:Page", "sites", "en", json!({"title": "Hello"})).await;

    let report = fixture
        .migrate(&migration(json!([{
            "transformations": [{"type": "RenameProperty", "settings": {"from": "title", "to": "title"}}]
        }])))
        .await
        .unwrap();

    assert_eq!(report.total_commands(), 0);
    let node = fixture.node("page", "en").unwrap();
    assert_eq!(node.property("title").unwrap().value, json!("Hello"));
}

#[tokio::test]
async fn test_migration_into_new_workspace_leaves_source_untouched() {
    let fixture = Fixture::new(default_settings()).await;
    fixture.create_node("page", "Acme:Page", "sites", "en", json!({"title": "Old"})).await;
    let target = WorkspaceName::new("migrated").unwrap();

    NodeMigrationService::new(Arc::clone(&fixture.repository))
        .execute_migration(
            &migration(json!([
                {"transformations": [{"type": "RenameProperty", "settings": {"from": "title", "to": "headline"}}]},
                {
                    "filters": [{"type": "PropertyNotEmpty", "settings": {"propertyName": "headline"}}],
                    "transformations": [{"type": "ChangePropertyValue", "settings": {"property": "headline", "newSerializedValue": "{current}!"}}]
                }
            ])),
            ExecuteMigration {
                source_workspace_name: WorkspaceName::live(),
                target_workspace_name: target.clone(),
            },
        )
        .await
        .unwrap();

    let migrated = fixture.node_in(&target, "page", "en").unwrap();
    assert_eq!(migrated.property("headline").unwrap().value, json!("Old!"));
    assert!(!migrated.has_property("title"));

    let live = fixture.node("page", "en").unwrap();
    assert_eq!(live.property("title").unwrap().value, json!("Old"));
}

#[tokio::test]
async fn test_unknown_transformation_fails_fast() {
    let fixture = Fixture::new(default_settings()).await;
    match fixture
        .migrate(&migration(json!([{"transformations": [{"type": "RenameNode", "settings": {}}]}])))
        .await
    {
        Err(MigrationError::Migration(message)) => assert!(message.contains("RenameNodeAggregate")),
        other => panic!("Expected Migration error, got {other:?}"),
    }
}

/// A repository over the same events with a changed dimension configuration
async fn reconfigured(fixture: &Fixture, settings: ContentRepositorySettings) -> Fixture {
    let repository = Arc::new(ContentRepository::with_event_store(settings, fixture.repository.event_store()).unwrap());
    repository.catch_up().await.unwrap();
    Fixture {
        repository,
        content_stream_id: fixture.content_stream_id.clone(),
    }
}

#[tokio::test]
async fn test_add_dimension_shine_through_for_new_specialization() {
    let fixture = Fixture::new(settings(json!({"en": {}, "de": {}}))).await;
    fixture.create_node("page", "Acme:Page", "sites", "en", json!({})).await;

    let extended = reconfigured(&fixture, default_settings()).await;
    extended
        .migrate(&migration(json!([{
            "transformations": [{
                "type": "AddDimensionShineThrough",
                "settings": {"from": {"language": "en"}, "to": {"language": "en_GB"}}
            }]
        }])))
        .await
        .unwrap();

    let graph = extended.repository.content_graph(&WorkspaceName::live()).unwrap();
    let page = graph.find_node_aggregate_by_id(&id("page")).unwrap();
    assert_eq!(
        page.covered_dimension_space_points(),
        DimensionSpacePointSet::new([point("en"), point("en_GB")])
    );
    let shown = graph.subgraph(point("en_GB")).find_node_by_id(&id("page")).unwrap();
    assert_eq!(shown.origin_dimension_space_point, origin("en"));
}

#[tokio::test]
async fn test_add_dimension_shine_through_requires_generalization() {
    let fixture = Fixture::new(default_settings()).await;
    match fixture
        .migrate(&migration(json!([{
            "transformations": [{
                "type": "AddDimensionShineThrough",
                "settings": {"from": {"language": "de"}, "to": {"language": "en_GB"}}
            }]
        }])))
        .await
    {
        Err(MigrationError::ContentRepository(ContentRepositoryError::Command(
            CommandError::DimensionSpacePointIsNoGeneralization { .. },
        ))) => {}
        other => panic!("Expected DimensionSpacePointIsNoGeneralization, got {other:?}"),
    }
}

#[tokio::test]
async fn test_move_dimension_space_point_relabels_content() {
    let fixture = Fixture::new(settings(json!({"en": {}, "de": {}}))).await;
    fixture.create_node("page", "Acme:Page", "sites", "de", json!({"title": "Hallo"})).await;

    let renamed = reconfigured(&fixture, settings(json!({"en": {}, "de_DE": {}}))).await;
    renamed
        .migrate(&migration(json!([{
            "transformations": [{
                "type": "MoveDimensionSpacePoint",
                "settings": {"from": {"language": "de"}, "to": {"language": "de_DE"}}
            }]
        }])))
        .await
        .unwrap();

    assert!(renamed.node("page", "de").is_none());
    let moved = renamed.node("page", "de_DE").unwrap();
    assert_eq!(moved.property("title").unwrap().value, json!("Hallo"));
}

#[tokio::test]
async fn test_update_root_node_aggregate_dimensions() {
    let fixture = Fixture::new(settings(json!({"en": {}}))).await;
    let extended = reconfigured(&fixture, settings(json!({"en": {}, "fr": {}}))).await;

    let report = extended
        .migrate(&migration(json!([{
            "transformations": [{"type": "UpdateRootNodeAggregateDimensions", "settings": {"nodeType": "Acme:Sites"}}]
        }])))
        .await
        .unwrap();

    assert_eq!(report.steps[0].visited, 1);
    let root = extended
        .repository
        .content_graph(&WorkspaceName::live())
        .unwrap()
        .find_root_node_aggregate_by_type(&NodeTypeName::new("Acme:Sites").unwrap())
        .unwrap();
    assert_eq!(
        root.covered_dimension_space_points(),
        DimensionSpacePointSet::new([point("en"), point("fr")])
    );
}
