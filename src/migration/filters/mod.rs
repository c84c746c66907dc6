//! Filters selecting the graph elements a migration step applies to
//!
//! Aggregate based filters gate whole node aggregates; node based filters
//! gate single variants. A step's filters are combined with AND.

mod factory;

pub use factory::FiltersFactory;

use std::collections::HashSet;
use std::fmt;

use crate::aggregate::{Node, NodeAggregate};
use crate::value_objects::{DimensionSpacePointSet, NodeName, NodeTypeName, SerializedPropertyValue};

pub trait NodeAggregateBasedFilter: fmt::Debug + Send + Sync {
    fn matches(&self, node_aggregate: &NodeAggregate) -> bool;
}

pub trait NodeBasedFilter: fmt::Debug + Send + Sync {
    fn matches(&self, node: &Node) -> bool;
}

/// A filter resolved into its kind
#[derive(Debug)]
pub enum Filter {
    NodeAggregateBased(Box<dyn NodeAggregateBasedFilter>),
    NodeBased(Box<dyn NodeBasedFilter>),
}

/// The filters of one migration step
#[derive(Debug, Default)]
pub struct Filters {
    node_aggregate_based: Vec<Box<dyn NodeAggregateBasedFilter>>,
    node_based: Vec<Box<dyn NodeBasedFilter>>,
}

impl Filters {
    pub fn new(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut result = Self::default();
        for filter in filters {
            match filter {
                Filter::NodeAggregateBased(filter) => result.node_aggregate_based.push(filter),
                Filter::NodeBased(filter) => result.node_based.push(filter),
            }
        }
        result
    }

    pub fn matches_node_aggregate(&self, node_aggregate: &NodeAggregate) -> bool {
        self.node_aggregate_based.iter().all(|filter| filter.matches(node_aggregate))
    }

    pub fn matches_node(&self, node: &Node) -> bool {
        self.node_based.iter().all(|filter| filter.matches(node))
    }

    pub fn has_node_based_filters(&self) -> bool {
        !self.node_based.is_empty()
    }
}

/// Aggregates of the given types; inverted with `exclude`
#[derive(Debug)]
pub struct NodeTypeFilter {
    pub(crate) node_type_names: HashSet<NodeTypeName>,
    pub(crate) exclude: bool,
}

impl NodeAggregateBasedFilter for NodeTypeFilter {
    fn matches(&self, node_aggregate: &NodeAggregate) -> bool {
        self.node_type_names.contains(&node_aggregate.node_type_name) != self.exclude
    }
}

/// Aggregates with the given name
#[derive(Debug)]
pub struct NodeNameFilter {
    pub(crate) node_name: NodeName,
}

impl NodeAggregateBasedFilter for NodeNameFilter {
    fn matches(&self, node_aggregate: &NodeAggregate) -> bool {
        node_aggregate.node_name.as_ref() == Some(&self.node_name)
    }
}

/// Variants with a non-empty value for the property
#[derive(Debug)]
pub struct PropertyNotEmptyFilter {
    pub(crate) property_name: String,
}

impl NodeBasedFilter for PropertyNotEmptyFilter {
    fn matches(&self, node: &Node) -> bool {
        node.property(&self.property_name).is_some_and(|property| !is_empty_value(property))
    }
}

fn is_empty_value(property: &SerializedPropertyValue) -> bool {
    match &property.value {
        serde_json::Value::Null => true,
        serde_json::Value::String(value) => value.is_empty(),
        serde_json::Value::Array(values) => values.is_empty(),
        serde_json::Value::Object(values) => values.is_empty(),
        _ => false,
    }
}

/// Variants whose property has exactly the given serialized value
#[derive(Debug)]
pub struct PropertyValueFilter {
    pub(crate) property_name: String,
    pub(crate) serialized_value: serde_json::Value,
}

impl NodeBasedFilter for PropertyValueFilter {
    fn matches(&self, node: &Node) -> bool {
        node.property(&self.property_name)
            .is_some_and(|property| property.value == self.serialized_value)
    }
}

/// Variants originating in one of the given points
#[derive(Debug)]
pub struct DimensionSpacePointsFilter {
    pub(crate) points: DimensionSpacePointSet,
}

impl NodeBasedFilter for DimensionSpacePointsFilter {
    fn matches(&self, node: &Node) -> bool {
        self.points
            .contains(node.origin_dimension_space_point.as_dimension_space_point())
    }
}
