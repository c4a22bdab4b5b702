//! Workflow engine for docgraph.
//!
//! This crate provides:
//!
//! - **Graph Model**: Named nodes and `START`/`END` edges, validated with
//!   petgraph into a fixed execution plan
//! - **Execution**: Load the thread's checkpoint, run the plan, save the
//!   result
//! - **Checkpoint Storage**: The `CheckpointStore` contract and an
//!   in-memory implementation
//! - **Echo Workflow**: The reference single-node workflow

pub mod checkpoint;
pub mod echo;
pub mod edge;
pub mod error;
pub mod execution;
pub mod graph;
pub mod memory;
pub mod node;

pub use checkpoint::{Checkpoint, CheckpointMetadata, CheckpointStore};
pub use echo::{ECHO_NODE, GREETING, echo, echo_workflow};
pub use edge::{Edge, Endpoint};
pub use error::{GraphError, NodeError, StoreError, WorkflowError};
pub use execution::CompiledWorkflow;
pub use graph::StateGraph;
pub use memory::MemoryCheckpointStore;
pub use node::{Node, NodeResult, Transform};
