//! String-backed identifiers of the content graph
//!
//! All identifiers are opaque, validated non-empty and compared by value.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValueObjectError;

macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create the identifier from a string, rejecting empty values
            pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(ValueObjectError::Empty($label));
                }
                Ok(Self(value))
            }

            /// The raw string value
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueObjectError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = ValueObjectError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_identifier!(
    /// Identifies one branch of history. Forked streams share all events
    /// of their source up to the fork point.
    ContentStreamId,
    "content stream id"
);

string_identifier!(
    /// Stable identity of a conceptual node across all of its dimension
    /// variants and across content streams
    NodeAggregateId,
    "node aggregate id"
);

string_identifier!(
    /// Name of a workspace, e.g. `live` or `user-admin`
    WorkspaceName,
    "workspace name"
);

string_identifier!(
    /// Fully qualified node type name, e.g. `Neos.Neos:Document`
    NodeTypeName,
    "node type name"
);

string_identifier!(
    /// Aggregate level name used as a path segment below the parent
    NodeName,
    "node name"
);

impl ContentStreamId {
    /// Generate a fresh random content stream id
    pub fn create() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl NodeAggregateId {
    /// Generate a fresh random node aggregate id
    pub fn create() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl WorkspaceName {
    /// The conventional name of the root workspace
    pub fn live() -> Self {
        Self("live".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers_reject_empty_values() {
        assert!(ContentStreamId::new("").is_err());
        assert!(NodeAggregateId::new("   ").is_err());
        assert!(NodeTypeName::new("Neos.Neos:Document").is_ok());
    }

    #[test]
    fn test_identifier_serializes_as_plain_string() {
        let id = NodeAggregateId::new("sir-david-nodenborough").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"sir-david-nodenborough\"");

        let parsed: Result<WorkspaceName, _> = serde_json::from_str("\"\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_created_ids_are_unique() {
        assert_ne!(ContentStreamId::create(), ContentStreamId::create());
        assert_ne!(NodeAggregateId::create(), NodeAggregateId::create());
    }
}
