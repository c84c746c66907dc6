//! Command handling and content graph queries

use cim_content_graph::commands::*;
use cim_content_graph::{
    CommandError, ContentRepository, ContentRepositoryError, ContentRepositorySettings, ContentStreamId,
    DimensionSpacePoint, DimensionSpacePointSet, NodeAggregateId,
    NodeAggregateTypeChangeChildConstraintConflictResolutionStrategy, NodeName, NodeTypeName,
    OriginDimensionSpacePoint, PropertyValuesToWrite, SerializedPropertyValue, SerializedPropertyValues,
    WorkspaceName,
};

const SETTINGS: &str = r#"{
    "dimensions": {
        "language": {"values": {"en": {"specializations": {"en_GB": {}}}, "de": {}}}
    },
    "node_types": {
        "Acme:Sites": {"superTypes": ["Neos.ContentRepository:Root"]},
        "Acme:Document": {"abstract": true},
        "Acme:Page": {"superTypes": ["Acme:Document"], "properties": {"title": {"type": "string"}}},
        "Acme:Folder": {"superTypes": ["Acme:Document"], "constraints": {"nodeTypes": {"Acme:Document": true}}},
        "Acme:Text": {}
    }
}"#;

fn point(language: &str) -> DimensionSpacePoint {
    DimensionSpacePoint::from_array([("language", language)]).unwrap()
}

fn origin(language: &str) -> OriginDimensionSpacePoint {
    OriginDimensionSpacePoint::from_dimension_space_point(point(language))
}

fn type_name(name: &str) -> NodeTypeName {
    NodeTypeName::new(name).unwrap()
}

fn id(value: &str) -> NodeAggregateId {
    NodeAggregateId::new(value).unwrap()
}

struct Fixture {
    repository: ContentRepository,
    content_stream_id: ContentStreamId,
}

impl Fixture {
    async fn new() -> Self {
        let repository = ContentRepository::new(ContentRepositorySettings::from_json_str(SETTINGS).unwrap()).unwrap();
        let content_stream_id = ContentStreamId::create();
        repository
            .handle(CreateRootWorkspace {
                workspace_name: WorkspaceName::live(),
                new_content_stream_id: content_stream_id.clone(),
            })
            .await
            .unwrap()
            .block()
            .await
            .unwrap();
        repository
            .handle(CreateRootNodeAggregateWithNode {
                content_stream_id: content_stream_id.clone(),
                node_aggregate_id: id("sites"),
                node_type_name: type_name("Acme:Sites"),
            })
            .await
            .unwrap()
            .block()
            .await
            .unwrap();
        Self {
            repository,
            content_stream_id,
        }
    }

    fn create(
        &self,
        node_id: &str,
        node_type: &str,
        parent: &str,
        language: &str,
        name: Option<&str>,
    ) -> CreateNodeAggregateWithNode {
        CreateNodeAggregateWithNode {
            content_stream_id: self.content_stream_id.clone(),
            node_aggregate_id: id(node_id),
            node_type_name: type_name(node_type),
            origin_dimension_space_point: origin(language),
            parent_node_aggregate_id: id(parent),
            node_name: name.map(|name| NodeName::new(name).unwrap()),
            initial_property_values: SerializedPropertyValues::new()
                .with("title", SerializedPropertyValue::string(format!("{node_id} {language}"))),
        }
    }

    async fn run(&self, command: impl Into<Command>) -> Result<(), ContentRepositoryError> {
        self.repository.handle(command).await?.block().await
    }
}

#[tokio::test]
async fn test_node_covers_specializations_of_its_origin() {
    let fixture = Fixture::new().await;
    fixture
        .run(fixture.create("home", "Acme:Page", "sites", "en", Some("home")))
        .await
        .unwrap();

    let graph = fixture.repository.content_graph(&WorkspaceName::live()).unwrap();
    let home = graph.find_node_aggregate_by_id(&id("home")).unwrap();
    assert_eq!(
        home.covered_dimension_space_points(),
        DimensionSpacePointSet::new([point("en"), point("en_GB")])
    );
    assert_eq!(home.occupied_dimension_space_points(), vec![origin("en")]);

    // en_GB shows the en variant
    let node = graph.subgraph(point("en_GB")).find_node_by_id(&id("home")).unwrap();
    assert_eq!(node.origin_dimension_space_point, origin("en"));
    assert!(graph.subgraph(point("de")).find_node_by_id(&id("home")).is_none());
}

#[tokio::test]
async fn test_root_aggregate_covers_allowed_subspace() {
    let fixture = Fixture::new().await;
    let graph = fixture.repository.content_graph(&WorkspaceName::live()).unwrap();
    let root = graph.find_root_node_aggregate_by_type(&type_name("Acme:Sites")).unwrap();
    assert!(root.is_root());
    assert_eq!(root.covered_dimension_space_points().len(), 3);

    match fixture
        .run(CreateRootNodeAggregateWithNode {
            content_stream_id: fixture.content_stream_id.clone(),
            node_aggregate_id: id("other-sites"),
            node_type_name: type_name("Acme:Sites"),
        })
        .await
    {
        Err(ContentRepositoryError::Command(CommandError::RootNodeAggregateTypeIsAlreadyOccupied(_))) => {}
        other => panic!("Expected RootNodeAggregateTypeIsAlreadyOccupied, got {other:?}"),
    }
}

#[tokio::test]
async fn test_create_node_preconditions() {
    let fixture = Fixture::new().await;

    match fixture.run(fixture.create("a", "Acme:Document", "sites", "en", None)).await {
        Err(ContentRepositoryError::Command(CommandError::NodeTypeIsAbstract(_))) => {}
        other => panic!("Expected NodeTypeIsAbstract, got {other:?}"),
    }
    match fixture.run(fixture.create("a", "Acme:Page", "sites", "fr", None)).await {
        Err(ContentRepositoryError::Command(CommandError::DimensionSpace(_))) => {}
        other => panic!("Expected a dimension space error, got {other:?}"),
    }
    match fixture.run(fixture.create("a", "Acme:Page", "missing", "en", None)).await {
        Err(ContentRepositoryError::Command(CommandError::NodeAggregateCurrentlyDoesNotExist { .. })) => {}
        other => panic!("Expected NodeAggregateCurrentlyDoesNotExist, got {other:?}"),
    }
    match fixture.run(fixture.create("a", "Acme:Sites", "sites", "en", None)).await {
        Err(ContentRepositoryError::Command(CommandError::NodeTypeIsOfTypeRoot(_))) => {}
        other => panic!("Expected NodeTypeIsOfTypeRoot, got {other:?}"),
    }

    fixture
        .run(fixture.create("a", "Acme:Page", "sites", "en", Some("about")))
        .await
        .unwrap();
    match fixture.run(fixture.create("a", "Acme:Page", "sites", "de", None)).await {
        Err(ContentRepositoryError::Command(CommandError::NodeAggregateCurrentlyExists(_))) => {}
        other => panic!("Expected NodeAggregateCurrentlyExists, got {other:?}"),
    }
    match fixture
        .run(fixture.create("b", "Acme:Page", "sites", "en", Some("about")))
        .await
    {
        Err(ContentRepositoryError::Command(CommandError::NodeNameIsAlreadyCovered { .. })) => {}
        other => panic!("Expected NodeNameIsAlreadyCovered, got {other:?}"),
    }
}

#[tokio::test]
async fn test_child_constraints_are_enforced() {
    let fixture = Fixture::new().await;
    fixture
        .run(fixture.create("folder", "Acme:Folder", "sites", "en", None))
        .await
        .unwrap();
    fixture
        .run(fixture.create("page", "Acme:Page", "folder", "en", None))
        .await
        .unwrap();
    match fixture.run(fixture.create("text", "Acme:Text", "folder", "en", None)).await {
        Err(ContentRepositoryError::Command(CommandError::NodeConstraintViolation(_))) => {}
        other => panic!("Expected NodeConstraintViolation, got {other:?}"),
    }
}

#[tokio::test]
async fn test_peer_variant_and_property_isolation() {
    let fixture = Fixture::new().await;
    fixture
        .run(fixture.create("home", "Acme:Page", "sites", "en", None))
        .await
        .unwrap();
    fixture
        .run(CreateNodeVariant {
            content_stream_id: fixture.content_stream_id.clone(),
            node_aggregate_id: id("home"),
            source_origin: origin("en"),
            target_origin: origin("de"),
        })
        .await
        .unwrap();
    fixture
        .run(SetSerializedNodeProperties {
            content_stream_id: fixture.content_stream_id.clone(),
            node_aggregate_id: id("home"),
            origin_dimension_space_point: origin("de"),
            property_values: PropertyValuesToWrite::new().set("title", SerializedPropertyValue::string("Hallo")),
        })
        .await
        .unwrap();

    let graph = fixture.repository.content_graph(&WorkspaceName::live()).unwrap();
    let home = graph.find_node_aggregate_by_id(&id("home")).unwrap();
    assert_eq!(home.coverage_by_occupant(&origin("de")), DimensionSpacePointSet::new([point("de")]));

    let en = home.node_by_occupied_dimension_space_point(&origin("en")).unwrap();
    let de = home.node_by_occupied_dimension_space_point(&origin("de")).unwrap();
    assert_eq!(en.property("title").unwrap().value, "home en");
    assert_eq!(de.property("title").unwrap().value, "Hallo");

    match fixture
        .run(CreateNodeVariant {
            content_stream_id: fixture.content_stream_id.clone(),
            node_aggregate_id: id("home"),
            source_origin: origin("en"),
            target_origin: origin("de"),
        })
        .await
    {
        Err(ContentRepositoryError::Command(CommandError::DimensionSpacePointIsAlreadyOccupied { .. })) => {}
        other => panic!("Expected DimensionSpacePointIsAlreadyOccupied, got {other:?}"),
    }
}

#[tokio::test]
async fn test_specialization_variant_takes_over_coverage() {
    let fixture = Fixture::new().await;
    fixture
        .run(fixture.create("home", "Acme:Page", "sites", "en", None))
        .await
        .unwrap();
    fixture
        .run(CreateNodeVariant {
            content_stream_id: fixture.content_stream_id.clone(),
            node_aggregate_id: id("home"),
            source_origin: origin("en"),
            target_origin: origin("en_GB"),
        })
        .await
        .unwrap();

    let graph = fixture.repository.content_graph(&WorkspaceName::live()).unwrap();
    let home = graph.find_node_aggregate_by_id(&id("home")).unwrap();
    assert_eq!(home.coverage_by_occupant(&origin("en")), DimensionSpacePointSet::new([point("en")]));
    assert_eq!(home.coverage_by_occupant(&origin("en_GB")), DimensionSpacePointSet::new([point("en_GB")]));
}

#[tokio::test]
async fn test_remove_node_aggregate_with_all_specializations() {
    let fixture = Fixture::new().await;
    fixture
        .run(fixture.create("home", "Acme:Page", "sites", "en", None))
        .await
        .unwrap();
    fixture
        .run(CreateNodeVariant {
            content_stream_id: fixture.content_stream_id.clone(),
            node_aggregate_id: id("home"),
            source_origin: origin("en"),
            target_origin: origin("de"),
        })
        .await
        .unwrap();

    fixture
        .run(RemoveNodeAggregate {
            content_stream_id: fixture.content_stream_id.clone(),
            node_aggregate_id: id("home"),
            covered_dimension_space_point: point("en"),
            node_variant_selection_strategy: Default::default(),
        })
        .await
        .unwrap();

    let graph = fixture.repository.content_graph(&WorkspaceName::live()).unwrap();
    let home = graph.find_node_aggregate_by_id(&id("home")).unwrap();
    assert_eq!(home.covered_dimension_space_points(), DimensionSpacePointSet::new([point("de")]));
    assert_eq!(home.occupied_dimension_space_points(), vec![origin("de")]);
}

#[tokio::test]
async fn test_move_rejects_descendant_as_new_parent() {
    let fixture = Fixture::new().await;
    fixture
        .run(fixture.create("parent", "Acme:Page", "sites", "en", None))
        .await
        .unwrap();
    fixture
        .run(fixture.create("child", "Acme:Page", "parent", "en", None))
        .await
        .unwrap();

    match fixture
        .run(MoveNodeAggregate {
            content_stream_id: fixture.content_stream_id.clone(),
            node_aggregate_id: id("parent"),
            dimension_space_point: point("en"),
            new_parent_node_aggregate_id: id("child"),
            relation_distribution_strategy: Default::default(),
        })
        .await
    {
        Err(ContentRepositoryError::Command(CommandError::NodeAggregateIsDescendant { .. })) => {}
        other => panic!("Expected NodeAggregateIsDescendant, got {other:?}"),
    }
}

#[tokio::test]
async fn test_subgraph_path_and_children() {
    let fixture = Fixture::new().await;
    fixture
        .run(fixture.create("home", "Acme:Page", "sites", "en", Some("home")))
        .await
        .unwrap();
    fixture
        .run(fixture.create("about", "Acme:Page", "home", "en", Some("about")))
        .await
        .unwrap();

    let subgraph = fixture
        .repository
        .content_graph(&WorkspaceName::live())
        .unwrap()
        .subgraph(point("en"));
    let path = [NodeName::new("home").unwrap(), NodeName::new("about").unwrap()];
    let about = subgraph.find_node_by_path(&id("sites"), &path).unwrap();
    assert_eq!(about.node_aggregate_id, id("about"));
    assert_eq!(subgraph.find_child_nodes(&id("home")).len(), 1);
    assert_eq!(subgraph.find_parent_node(&id("about")).unwrap().node_aggregate_id, id("home"));
}

#[tokio::test]
async fn test_workspace_changes_stay_isolated_until_fork() {
    let fixture = Fixture::new().await;
    let user = WorkspaceName::new("user").unwrap();
    fixture
        .run(CreateWorkspace {
            workspace_name: user.clone(),
            base_workspace_name: WorkspaceName::live(),
            new_content_stream_id: ContentStreamId::create(),
        })
        .await
        .unwrap();

    let user_stream = fixture.repository.find_workspace(&user).unwrap().current_content_stream_id;
    let mut command = fixture.create("draft", "Acme:Page", "sites", "en", None);
    command.content_stream_id = user_stream;
    fixture.run(command).await.unwrap();

    assert!(fixture
        .repository
        .content_graph(&user)
        .unwrap()
        .find_node_aggregate_by_id(&id("draft"))
        .is_some());
    assert!(fixture
        .repository
        .content_graph(&WorkspaceName::live())
        .unwrap()
        .find_node_aggregate_by_id(&id("draft"))
        .is_none());

    match fixture
        .run(CreateWorkspace {
            workspace_name: user,
            base_workspace_name: WorkspaceName::live(),
            new_content_stream_id: ContentStreamId::create(),
        })
        .await
    {
        Err(ContentRepositoryError::Command(CommandError::WorkspaceAlreadyExists(_))) => {}
        other => panic!("Expected WorkspaceAlreadyExists, got {other:?}"),
    }
}

#[tokio::test]
async fn test_change_node_type_strategies() {
    let fixture = Fixture::new().await;
    fixture
        .run(fixture.create("page", "Acme:Page", "sites", "en", None))
        .await
        .unwrap();
    fixture
        .run(fixture.create("text", "Acme:Text", "page", "en", None))
        .await
        .unwrap();

    let change = |strategy| ChangeNodeAggregateType {
        content_stream_id: fixture.content_stream_id.clone(),
        node_aggregate_id: id("page"),
        new_node_type_name: type_name("Acme:Folder"),
        strategy,
    };

    match fixture
        .run(change(NodeAggregateTypeChangeChildConstraintConflictResolutionStrategy::HappyPath))
        .await
    {
        Err(ContentRepositoryError::Command(CommandError::NodeConstraintViolation(_))) => {}
        other => panic!("Expected NodeConstraintViolation, got {other:?}"),
    }

    fixture
        .run(change(NodeAggregateTypeChangeChildConstraintConflictResolutionStrategy::Delete))
        .await
        .unwrap();
    let graph = fixture.repository.content_graph(&WorkspaceName::live()).unwrap();
    assert_eq!(
        graph.find_node_aggregate_by_id(&id("page")).unwrap().node_type_name,
        type_name("Acme:Folder")
    );
    assert!(graph.find_node_aggregate_by_id(&id("text")).is_none());
}
