//! Event-sourced content graph with node migrations
//!
//! Content lives in node aggregates whose variants are spread over a
//! multi-dimensional dimension space. All writes go through command
//! handlers that append events to content streams; read models are
//! projected from those events. Node migrations walk the graph and rewrite
//! it through the same command path.

pub mod aggregate;
pub mod commands;
pub mod config;
pub mod content_repository;
pub mod dimension;
pub mod domain_events;
pub mod events;
pub mod export;
pub mod handlers;
pub mod infrastructure;
pub mod migration;
pub mod node_types;
pub mod projections;
pub mod queries;
pub mod value_objects;

// Re-export main types
pub use aggregate::*;
pub use domain_events::*;
pub use events::*;
pub use value_objects::*;

// Re-export commands and their types
pub use commands::{Command, CommandError, CommandHandlerResult};

// Re-export the repository facade
pub use config::{CatchUpMode, ContentRepositorySettings};
pub use content_repository::{CommandResult, ContentRepository, ContentRepositoryError, ContentRepositoryResult};

// Re-export read models
pub use projections::{ContentStream, Workspace};
pub use queries::{ContentGraph, ContentSubgraph};

// Re-export dimension and schema types
pub use dimension::{ContentDimensionSource, InterDimensionalVariationGraph};
pub use node_types::{NodeType, NodeTypeManager};

// Re-export event storage
pub use infrastructure::{EventEnvelope, EventStore, EventStoreError, InMemoryEventStore};

// Re-export migrations
pub use export::{EventExporter, EventImporter, ExportError};
pub use migration::{
    ExecuteMigration, MigrationConfiguration, MigrationError, MigrationReport, NodeMigrationService,
};
