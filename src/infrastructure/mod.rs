//! Infrastructure layer implementations
//!
//! Event storage for the content repository. Streams are append-only and
//! guarded by optimistic concurrency on their version.

mod event_store;

pub use event_store::*;
