//! Error types for the workflow crate.
//!
//! Errors are layered:
//! - `GraphError`: Construction-time validation failures
//! - `NodeError`: Failures raised by a node transformation
//! - `StoreError`: Checkpoint storage failures
//! - `WorkflowError`: What a compiled workflow reports to its caller

use std::fmt;

/// Errors from graph validation at compile time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The graph declares no nodes.
    Empty,
    /// A node was declared with an empty name.
    EmptyNodeName,
    /// Two nodes share a name.
    DuplicateNode { name: String },
    /// An edge references a node that was never declared.
    UnknownNode { name: String },
    /// An edge points back into the start marker.
    EdgeIntoStart { from: String },
    /// An edge leaves the end marker.
    EdgeFromEnd { to: String },
    /// Nothing follows the start marker.
    MissingEntry,
    /// A step has more than one successor.
    Branching { from: String },
    /// A node has no successor, so the chain never reaches the end marker.
    DeadEnd { node: String },
    /// A declared node is not on the start-to-end chain.
    OrphanNode { name: String },
    /// Graph contains cycles.
    CycleDetected,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "graph has no nodes"),
            Self::EmptyNodeName => write!(f, "node names must not be empty"),
            Self::DuplicateNode { name } => write!(f, "node '{name}' declared twice"),
            Self::UnknownNode { name } => {
                write!(f, "edge references undeclared node '{name}'")
            }
            Self::EdgeIntoStart { from } => {
                write!(f, "edge from '{from}' points into START")
            }
            Self::EdgeFromEnd { to } => write!(f, "edge from END to '{to}'"),
            Self::MissingEntry => write!(f, "no edge leaves START"),
            Self::Branching { from } => {
                write!(f, "'{from}' has more than one successor")
            }
            Self::DeadEnd { node } => {
                write!(f, "node '{node}' has no successor and never reaches END")
            }
            Self::OrphanNode { name } => {
                write!(f, "node '{name}' is not reachable from START")
            }
            Self::CycleDetected => write!(f, "graph contains cycles"),
        }
    }
}

impl std::error::Error for GraphError {}

/// Error raised by a node transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeError {
    message: String,
}

impl NodeError {
    /// Creates a node error with a human-readable message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for NodeError {}

/// Errors from checkpoint storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing storage cannot be reached or rejected the operation.
    Unavailable { reason: String },
    /// A stored checkpoint could not be decoded.
    Corrupt {
        thread_id: String,
        sequence_number: i64,
        reason: String,
    },
}

impl StoreError {
    /// Shorthand for [`StoreError::Unavailable`].
    #[must_use]
    pub fn unavailable(reason: impl fmt::Display) -> Self {
        Self::Unavailable {
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => write!(f, "checkpoint storage unavailable: {reason}"),
            Self::Corrupt {
                thread_id,
                sequence_number,
                reason,
            } => write!(
                f,
                "checkpoint {sequence_number} of thread '{thread_id}' is corrupt: {reason}"
            ),
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors reported by a compiled workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// The graph failed validation.
    InvalidGraph(GraphError),
    /// Loading or saving a checkpoint failed.
    StorageUnavailable(StoreError),
    /// A node returned an error; nothing was persisted.
    NodeExecutionFailed { node: String, cause: NodeError },
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidGraph(e) => write!(f, "invalid graph: {e}"),
            Self::StorageUnavailable(e) => write!(f, "{e}"),
            Self::NodeExecutionFailed { node, cause } => {
                write!(f, "node '{node}' failed: {cause}")
            }
        }
    }
}

impl std::error::Error for WorkflowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidGraph(e) => Some(e),
            Self::StorageUnavailable(e) => Some(e),
            Self::NodeExecutionFailed { cause, .. } => Some(cause),
        }
    }
}

impl From<GraphError> for WorkflowError {
    fn from(e: GraphError) -> Self {
        Self::InvalidGraph(e)
    }
}

impl From<StoreError> for WorkflowError {
    fn from(e: StoreError) -> Self {
        Self::StorageUnavailable(e)
    }
}
