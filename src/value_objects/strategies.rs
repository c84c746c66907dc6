//! Strategy and classification enums used by commands and read models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValueObjectError;

/// Which variants of a node aggregate a removal affects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum NodeVariantSelectionStrategy {
    /// The given point and all of its specializations
    #[default]
    AllSpecializations,
    /// Every variant of the aggregate, regardless of the given point
    AllVariants,
}

impl NodeVariantSelectionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllSpecializations => "allSpecializations",
            Self::AllVariants => "allVariants",
        }
    }
}

impl FromStr for NodeVariantSelectionStrategy {
    type Err = ValueObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allSpecializations" => Ok(Self::AllSpecializations),
            "allVariants" => Ok(Self::AllVariants),
            other => Err(ValueObjectError::UnknownStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for NodeVariantSelectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a node type change deals with children the new type does not allow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NodeAggregateTypeChangeChildConstraintConflictResolutionStrategy {
    /// Reject the change if any child conflicts
    #[default]
    #[serde(rename = "happypath")]
    HappyPath,
    /// Remove conflicting children together with the change
    #[serde(rename = "delete")]
    Delete,
}

impl FromStr for NodeAggregateTypeChangeChildConstraintConflictResolutionStrategy {
    type Err = ValueObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "happypath" => Ok(Self::HappyPath),
            "delete" => Ok(Self::Delete),
            other => Err(ValueObjectError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Which covered points a move re-parents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum RelationDistributionStrategy {
    /// Only the given point
    Scatter,
    /// The given point and its covered specializations
    #[default]
    GatherSpecializations,
    /// All covered points
    GatherAll,
}

/// Root aggregates are the entry points of the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeAggregateClassification {
    Root,
    Regular,
}

impl NodeAggregateClassification {
    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }
}

/// Relation of one dimension space point to another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VariantType {
    Same,
    Specialization,
    Generalization,
    Peer,
}
