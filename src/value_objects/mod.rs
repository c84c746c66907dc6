//! Content graph value objects
//!
//! Value objects are immutable types that represent concepts in the content graph domain.
//! They are compared by value rather than identity and encapsulate domain validation.

mod dimension_space;
mod identifiers;
mod properties;
mod strategies;

pub use dimension_space::*;
pub use identifiers::*;
pub use properties::*;
pub use strategies::*;

/// Errors raised while constructing value objects
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("Invalid dimension space point: {0}")]
    InvalidDimensionSpacePoint(String),

    #[error("Unknown strategy \"{0}\"")]
    UnknownStrategy(String),
}
