//! The echo workflow.
//!
//! A single node that answers the latest message by quoting it back.

use crate::checkpoint::CheckpointStore;
use crate::edge::Endpoint;
use crate::error::GraphError;
use crate::execution::CompiledWorkflow;
use crate::graph::StateGraph;
use crate::node::NodeResult;
use docgraph_conversation::{ConversationState, Message};
use std::sync::Arc;

/// Name of the echo node in the compiled plan.
pub const ECHO_NODE: &str = "echo";

/// Greeting produced when the echo node sees an empty conversation.
pub const GREETING: &str = "Hello from test node!";

/// Appends `"Echo: <last content>"`, or replaces an empty conversation
/// with a single greeting.
pub fn echo(mut state: ConversationState) -> NodeResult {
    let reply = match state.last_message() {
        Some(last) => format!("Echo: {}", last.content()),
        None => GREETING.to_string(),
    };
    state.push(Message::assistant(reply));
    Ok(state)
}

/// Builds `START -> echo -> END` bound to `store`.
///
/// # Errors
///
/// Only fails if the graph definition itself is broken.
pub fn echo_workflow(store: Arc<dyn CheckpointStore>) -> Result<CompiledWorkflow, GraphError> {
    let mut graph = StateGraph::new();
    graph
        .add_node(ECHO_NODE, echo)
        .add_edge(Endpoint::Start, ECHO_NODE)
        .add_edge(ECHO_NODE, Endpoint::End);
    graph.compile(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCheckpointStore;
    use docgraph_conversation::{MessageRole, ThreadContext};

    #[test]
    fn echo_on_empty_greets() {
        let out = echo(ConversationState::new()).unwrap();
        assert_eq!(out, ConversationState::from(Message::assistant(GREETING)));
    }

    #[test]
    fn echo_quotes_last_message() {
        let out = echo(ConversationState::from(Message::user("hi"))).unwrap();
        assert_eq!(
            out,
            ConversationState::from_messages(vec![
                Message::user("hi"),
                Message::assistant("Echo: hi"),
            ])
        );
    }

    #[test]
    fn echo_is_deterministic() {
        let input = ConversationState::from(Message::user("same"));
        assert_eq!(echo(input.clone()).unwrap(), echo(input).unwrap());
    }

    #[test]
    fn echo_quotes_empty_content() {
        let out = echo(ConversationState::from(Message::user(""))).unwrap();
        let last = out.last_message().unwrap();
        assert_eq!(last.role(), MessageRole::Assistant);
        assert_eq!(last.content(), "Echo: ");
    }

    #[test]
    fn echo_workflow_compiles_single_node() {
        let workflow = echo_workflow(Arc::new(MemoryCheckpointStore::new())).unwrap();
        assert_eq!(workflow.node_names(), vec![ECHO_NODE]);
    }

    #[tokio::test]
    async fn repeated_turns_append_one_echo_each() {
        let store = Arc::new(MemoryCheckpointStore::new());
        let workflow = echo_workflow(store.clone()).unwrap();
        let ctx = ThreadContext::from_raw("t1", "u1").unwrap();

        for _ in 0..2 {
            workflow
                .invoke(ConversationState::from(Message::user("hello")), &ctx)
                .await
                .unwrap();
        }

        let history = store.history(&ctx.thread_id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].state.len(), 2);
        assert_eq!(history[1].state.len(), 4);
        let contents: Vec<_> = history[1]
            .state
            .messages()
            .iter()
            .map(|m| m.content())
            .collect();
        assert_eq!(
            contents,
            vec!["hello", "Echo: hello", "hello", "Echo: hello"]
        );
    }
}
