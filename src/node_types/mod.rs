//! Node type schema
//!
//! Node types declare their super types, whether they are abstract, which
//! child node types they allow and which properties they carry. The root
//! node type `Neos.ContentRepository:Root` is always present.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::value_objects::NodeTypeName;

/// Name of the built-in root node type
pub const ROOT_NODE_TYPE_NAME: &str = "Neos.ContentRepository:Root";

/// Errors raised while building the node type schema
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeTypeError {
    #[error("Node type \"{node_type}\" declares unknown super type \"{super_type}\"")]
    UnknownSuperType { node_type: String, super_type: String },

    #[error("Invalid node type name: {0}")]
    InvalidName(String),
}

/// Configuration of one node type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypeConfiguration {
    #[serde(default)]
    pub super_types: Vec<String>,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub constraints: NodeTypeConstraintsConfiguration,
    #[serde(default)]
    pub properties: IndexMap<String, PropertyConfiguration>,
}

/// Child node type constraints; `*` is the fallback entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypeConstraintsConfiguration {
    #[serde(default)]
    pub node_types: IndexMap<String, bool>,
}

/// Declared property of a node type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyConfiguration {
    #[serde(rename = "type", default = "default_property_type")]
    pub type_name: String,
}

fn default_property_type() -> String {
    "string".to_string()
}

/// A resolved node type
#[derive(Debug, Clone, PartialEq)]
pub struct NodeType {
    pub name: NodeTypeName,
    pub is_abstract: bool,
    /// All super types, transitively, nearest first
    pub super_types: Vec<NodeTypeName>,
    constraints: IndexMap<String, bool>,
    properties: IndexMap<String, PropertyConfiguration>,
}

impl NodeType {
    /// True if this type is `name` or inherits from it
    pub fn is_of_type(&self, name: &str) -> bool {
        self.name.as_str() == name || self.super_types.iter().any(|t| t.as_str() == name)
    }

    pub fn is_root(&self) -> bool {
        self.is_of_type(ROOT_NODE_TYPE_NAME)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn property_type(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(|p| p.type_name.as_str())
    }

    /// Whether a child of type `child` may be placed below this type
    ///
    /// An empty constraint map allows everything. Otherwise the exact name
    /// decides, then the nearest super type of the child, then `*`.
    pub fn allows_child_node_type(&self, child: &NodeType) -> bool {
        if self.constraints.is_empty() {
            return true;
        }
        if let Some(allowed) = self.constraints.get(child.name.as_str()) {
            return *allowed;
        }
        for super_type in &child.super_types {
            if let Some(allowed) = self.constraints.get(super_type.as_str()) {
                return *allowed;
            }
        }
        self.constraints.get("*").copied().unwrap_or(false)
    }
}

/// Registry of all configured node types
#[derive(Debug, Clone)]
pub struct NodeTypeManager {
    node_types: IndexMap<String, NodeType>,
}

impl Default for NodeTypeManager {
    fn default() -> Self {
        Self::from_configuration(&IndexMap::new()).unwrap_or_else(|_| Self {
            node_types: IndexMap::new(),
        })
    }
}

impl NodeTypeManager {
    /// Resolve the configured node types, including inherited super types
    pub fn from_configuration(
        configuration: &IndexMap<String, NodeTypeConfiguration>,
    ) -> Result<Self, NodeTypeError> {
        let mut all = configuration.clone();
        all.entry(ROOT_NODE_TYPE_NAME.to_string())
            .or_insert_with(|| NodeTypeConfiguration {
                is_abstract: false,
                ..Default::default()
            });

        let mut node_types = IndexMap::new();
        for (name, node_type_configuration) in &all {
            let node_type_name =
                NodeTypeName::new(name.clone()).map_err(|e| NodeTypeError::InvalidName(e.to_string()))?;
            let super_types = Self::resolve_super_types(name, &all)?;

            let mut constraints = IndexMap::new();
            let mut properties = IndexMap::new();
            // inherited declarations first, so own declarations override them
            for super_type in super_types.iter().rev() {
                if let Some(inherited) = all.get(super_type.as_str()) {
                    constraints.extend(inherited.constraints.node_types.clone());
                    properties.extend(inherited.properties.clone());
                }
            }
            constraints.extend(node_type_configuration.constraints.node_types.clone());
            properties.extend(node_type_configuration.properties.clone());

            node_types.insert(
                name.clone(),
                NodeType {
                    name: node_type_name,
                    is_abstract: node_type_configuration.is_abstract,
                    super_types,
                    constraints,
                    properties,
                },
            );
        }
        Ok(Self { node_types })
    }

    fn resolve_super_types(
        name: &str,
        all: &IndexMap<String, NodeTypeConfiguration>,
    ) -> Result<Vec<NodeTypeName>, NodeTypeError> {
        let mut resolved: Vec<NodeTypeName> = Vec::new();
        let mut queue: VecDeque<(String, String)> = all
            .get(name)
            .map(|c| c.super_types.iter().map(|s| (name.to_string(), s.clone())).collect())
            .unwrap_or_default();

        while let Some((declaring, super_type)) = queue.pop_front() {
            if super_type == name || resolved.iter().any(|r| r.as_str() == super_type) {
                continue;
            }
            let configuration = all.get(&super_type).ok_or_else(|| NodeTypeError::UnknownSuperType {
                node_type: declaring.clone(),
                super_type: super_type.clone(),
            })?;
            resolved.push(
                NodeTypeName::new(super_type.clone()).map_err(|e| NodeTypeError::InvalidName(e.to_string()))?,
            );
            for next in &configuration.super_types {
                queue.push_back((super_type.clone(), next.clone()));
            }
        }
        Ok(resolved)
    }

    pub fn get_node_type(&self, name: &NodeTypeName) -> Option<&NodeType> {
        self.node_types.get(name.as_str())
    }

    pub fn has_node_type(&self, name: &NodeTypeName) -> bool {
        self.node_types.contains_key(name.as_str())
    }

    /// `name` and every type inheriting from it
    pub fn sub_node_type_names(&self, name: &NodeTypeName) -> Vec<NodeTypeName> {
        self.node_types
            .values()
            .filter(|node_type| node_type.is_of_type(name.as_str()))
            .map(|node_type| node_type.name.clone())
            .collect()
    }

    pub fn node_types(&self) -> impl Iterator<Item = &NodeType> {
        self.node_types.values()
    }
}
