//! Compiled workflow execution.
//!
//! One invocation:
//! 1. Load the thread's latest state from the checkpoint store
//! 2. Append the input messages
//! 3. Run every node in plan order
//! 4. Save the result as a new checkpoint
//!
//! A node failure stops the run before step 4, so no partial state is
//! ever persisted.

use crate::checkpoint::{CheckpointMetadata, CheckpointStore};
use crate::error::WorkflowError;
use crate::node::Node;
use docgraph_conversation::{ConversationState, ThreadContext};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// A validated workflow bound to a checkpoint store.
///
/// Built by [`StateGraph::compile`](crate::graph::StateGraph::compile).
#[derive(Clone)]
pub struct CompiledWorkflow {
    plan: Arc<[Node]>,
    store: Arc<dyn CheckpointStore>,
}

impl CompiledWorkflow {
    pub(crate) fn new(plan: Vec<Node>, store: Arc<dyn CheckpointStore>) -> Self {
        Self {
            plan: plan.into(),
            store,
        }
    }

    /// Returns the node names in execution order.
    #[must_use]
    pub fn node_names(&self) -> Vec<&str> {
        self.plan.iter().map(Node::name).collect()
    }

    /// Returns the checkpoint store this workflow persists to.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn CheckpointStore> {
        &self.store
    }

    /// Runs the workflow for one conversation turn.
    ///
    /// # Errors
    ///
    /// - [`WorkflowError::StorageUnavailable`] if loading or saving fails
    /// - [`WorkflowError::NodeExecutionFailed`] if a node returns an error;
    ///   nothing is saved in that case
    #[instrument(skip_all, fields(thread_id = %context.thread_id, user_id = %context.user_id))]
    pub async fn invoke(
        &self,
        input: ConversationState,
        context: &ThreadContext,
    ) -> Result<ConversationState, WorkflowError> {
        let mut state = self.store.load(&context.thread_id).await?;
        debug!(prior_messages = state.len(), "loaded thread state");

        state.merge(input);

        for node in self.plan.iter() {
            state = node.run(state).map_err(|cause| {
                warn!(node = node.name(), error = %cause, "node failed");
                WorkflowError::NodeExecutionFailed {
                    node: node.name().to_string(),
                    cause,
                }
            })?;
        }

        let metadata = CheckpointMetadata {
            user_id: Some(context.user_id.clone()),
            invoke_count: context.invoke_count,
            ran_nodes: self.plan.iter().map(|n| n.name().to_string()).collect(),
        };
        let checkpoint = self.store.save(&context.thread_id, state, metadata).await?;
        debug!(
            sequence_number = checkpoint.sequence_number,
            messages = checkpoint.state.len(),
            "persisted checkpoint"
        );

        Ok(checkpoint.state)
    }
}

impl fmt::Debug for CompiledWorkflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledWorkflow")
            .field("plan", &self.node_names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::Checkpoint;
    use crate::edge::Endpoint;
    use crate::error::{NodeError, StoreError};
    use crate::graph::StateGraph;
    use crate::memory::MemoryCheckpointStore;
    use async_trait::async_trait;
    use docgraph_conversation::Message;
    use docgraph_core::ThreadId;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store whose backing database is never reachable.
    struct UnreachableStore;

    #[async_trait]
    impl CheckpointStore for UnreachableStore {
        async fn setup(&self) -> Result<(), StoreError> {
            Err(StoreError::unavailable("connection refused"))
        }

        async fn latest(&self, _: &ThreadId) -> Result<Option<Checkpoint>, StoreError> {
            Err(StoreError::unavailable("connection refused"))
        }

        async fn save(
            &self,
            _: &ThreadId,
            _: ConversationState,
            _: CheckpointMetadata,
        ) -> Result<Checkpoint, StoreError> {
            Err(StoreError::unavailable("connection refused"))
        }

        async fn history(&self, _: &ThreadId) -> Result<Vec<Checkpoint>, StoreError> {
            Err(StoreError::unavailable("connection refused"))
        }

        async fn close(&self) {}
    }

    fn context(thread: &str) -> ThreadContext {
        ThreadContext::from_raw(thread, "u1").expect("valid context")
    }

    fn chain(store: Arc<dyn CheckpointStore>) -> CompiledWorkflow {
        let mut graph = StateGraph::new();
        graph
            .add_node("first", |mut state: ConversationState| {
                state.push(Message::assistant("one"));
                Ok(state)
            })
            .add_node("second", |mut state: ConversationState| {
                state.push(Message::assistant("two"));
                Ok(state)
            })
            .add_edge(Endpoint::Start, "first")
            .add_edge("first", "second")
            .add_edge("second", Endpoint::End);
        graph.compile(store).expect("valid graph")
    }

    #[tokio::test]
    async fn invoke_runs_nodes_in_order_and_persists() {
        let store = Arc::new(MemoryCheckpointStore::new());
        let workflow = chain(store.clone());
        let ctx = context("t1");

        let result = workflow
            .invoke(ConversationState::from(Message::user("go")), &ctx)
            .await
            .unwrap();

        let contents: Vec<_> = result.messages().iter().map(|m| m.content()).collect();
        assert_eq!(contents, vec!["go", "one", "two"]);

        let latest = store.latest(&ctx.thread_id).await.unwrap().unwrap();
        assert_eq!(latest.sequence_number, 1);
        assert_eq!(latest.state, result);
        assert_eq!(latest.metadata.ran_nodes, vec!["first", "second"]);
        assert_eq!(latest.metadata.user_id, Some(ctx.user_id.clone()));
    }

    #[tokio::test]
    async fn invoke_resumes_from_latest_checkpoint() {
        let store = Arc::new(MemoryCheckpointStore::new());
        let workflow = chain(store.clone());
        let ctx = context("t1");

        workflow
            .invoke(ConversationState::from(Message::user("a")), &ctx)
            .await
            .unwrap();
        let second = workflow
            .invoke(ConversationState::from(Message::user("b")), &ctx)
            .await
            .unwrap();

        let contents: Vec<_> = second.messages().iter().map(|m| m.content()).collect();
        assert_eq!(contents, vec!["a", "one", "two", "b", "one", "two"]);
        assert_eq!(store.history(&ctx.thread_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failing_node_persists_nothing() {
        let store = Arc::new(MemoryCheckpointStore::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let after = Arc::clone(&calls);

        let mut graph = StateGraph::new();
        graph
            .add_node("explode", |_state| Err(NodeError::new("boom")))
            .add_node("after", move |state| {
                after.fetch_add(1, Ordering::SeqCst);
                Ok(state)
            })
            .add_edge(Endpoint::Start, "explode")
            .add_edge("explode", "after")
            .add_edge("after", Endpoint::End);
        let workflow = graph.compile(store.clone()).expect("valid graph");
        let ctx = context("t1");

        let err = workflow
            .invoke(ConversationState::from(Message::user("hi")), &ctx)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            WorkflowError::NodeExecutionFailed {
                node: "explode".to_string(),
                cause: NodeError::new("boom"),
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(store.history(&ctx.thread_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreachable_store_surfaces_storage_error() {
        let workflow = chain(Arc::new(UnreachableStore));
        let err = workflow
            .invoke(ConversationState::from(Message::user("hi")), &context("t1"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::StorageUnavailable(_)));
    }

    #[test]
    fn debug_lists_plan() {
        let workflow = chain(Arc::new(MemoryCheckpointStore::new()));
        let debug = format!("{workflow:?}");
        assert!(debug.contains("first"));
        assert!(debug.contains("second"));
    }
}
