//! Database access for the docgraph server.
//!
//! This module provides the PostgreSQL checkpoint store used by the
//! running service.

pub mod checkpoint;

pub use checkpoint::PostgresCheckpointStore;
