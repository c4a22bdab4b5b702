//! Workflow nodes.
//!
//! A node is a named, pure transformation of the conversation state. Nodes
//! never persist anything themselves; the compiled workflow saves the
//! final state once every node has run.

use crate::error::NodeError;
use docgraph_conversation::ConversationState;
use std::fmt;
use std::sync::Arc;

/// The result of running a node.
pub type NodeResult = Result<ConversationState, NodeError>;

/// A state transformation.
///
/// Implementations must be deterministic given their input so that a
/// retried invocation produces the same output.
pub type Transform = Arc<dyn Fn(ConversationState) -> NodeResult + Send + Sync>;

/// A named transformation step.
#[derive(Clone)]
pub struct Node {
    name: String,
    transform: Transform,
}

impl Node {
    /// Creates a node from a name and a transformation function.
    pub fn new<F>(name: impl Into<String>, transform: F) -> Self
    where
        F: Fn(ConversationState) -> NodeResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            transform: Arc::new(transform),
        }
    }

    /// Returns the node name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Applies the transformation.
    ///
    /// # Errors
    ///
    /// Returns whatever error the transformation raised.
    pub fn run(&self, state: ConversationState) -> NodeResult {
        (self.transform)(state)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node").field("name", &self.name).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docgraph_conversation::Message;

    #[test]
    fn node_runs_transform() {
        let node = Node::new("shout", |mut state: ConversationState| {
            state.push(Message::assistant("HEY"));
            Ok(state)
        });

        let out = node.run(ConversationState::new()).expect("runs");
        assert_eq!(node.name(), "shout");
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn node_propagates_error() {
        let node = Node::new("broken", |_state| Err(NodeError::new("nope")));
        let err = node.run(ConversationState::new()).unwrap_err();
        assert_eq!(err.message(), "nope");
    }

    #[test]
    fn debug_shows_name() {
        let node = Node::new("echo", Ok);
        assert!(format!("{node:?}").contains("echo"));
    }
}
