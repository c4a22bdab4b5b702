//! Workflow graph construction and validation using petgraph.
//!
//! A [`StateGraph`] collects named nodes and edges between them and the
//! reserved `START` / `END` markers. Compiling it validates that the edges
//! form a single chain `START -> n1 -> ... -> nk -> END` covering every
//! declared node, and produces a [`CompiledWorkflow`] whose execution plan
//! is fixed for its lifetime.

use crate::checkpoint::CheckpointStore;
use crate::edge::{Edge, Endpoint};
use crate::error::GraphError;
use crate::execution::CompiledWorkflow;
use crate::node::{Node, NodeResult};
use docgraph_conversation::ConversationState;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Builder for a workflow graph.
#[derive(Debug, Default)]
pub struct StateGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl StateGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a node.
    pub fn add_node<F>(&mut self, name: impl Into<String>, transform: F) -> &mut Self
    where
        F: Fn(ConversationState) -> NodeResult + Send + Sync + 'static,
    {
        self.nodes.push(Node::new(name, transform));
        self
    }

    /// Adds an edge between two endpoints.
    pub fn add_edge(&mut self, from: impl Into<Endpoint>, to: impl Into<Endpoint>) -> &mut Self {
        self.edges.push(Edge::new(from, to));
        self
    }

    /// Validates the graph and binds it to a checkpoint store.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] describing the first validation failure.
    pub fn compile(self, store: Arc<dyn CheckpointStore>) -> Result<CompiledWorkflow, GraphError> {
        let plan = self.plan()?;
        Ok(CompiledWorkflow::new(plan, store))
    }

    /// Validates the graph and returns its nodes in execution order.
    fn plan(self) -> Result<Vec<Node>, GraphError> {
        if self.nodes.is_empty() {
            return Err(GraphError::Empty);
        }

        let mut graph: DiGraph<Endpoint, ()> = DiGraph::new();
        let start = graph.add_node(Endpoint::Start);
        let end = graph.add_node(Endpoint::End);

        let mut index_by_name: HashMap<String, NodeIndex> = HashMap::new();
        for node in &self.nodes {
            if node.name().is_empty() {
                return Err(GraphError::EmptyNodeName);
            }
            let index = graph.add_node(Endpoint::node(node.name()));
            let previous = index_by_name.insert(node.name().to_string(), index);
            if previous.is_some() {
                return Err(GraphError::DuplicateNode {
                    name: node.name().to_string(),
                });
            }
        }

        let resolve = |endpoint: &Endpoint| -> Result<NodeIndex, GraphError> {
            match endpoint {
                Endpoint::Start => Ok(start),
                Endpoint::End => Ok(end),
                Endpoint::Node(name) => {
                    index_by_name
                        .get(name.as_str())
                        .copied()
                        .ok_or_else(|| GraphError::UnknownNode { name: name.clone() })
                }
            }
        };

        for edge in &self.edges {
            if edge.to == Endpoint::Start {
                return Err(GraphError::EdgeIntoStart {
                    from: edge.from.to_string(),
                });
            }
            if edge.from == Endpoint::End {
                return Err(GraphError::EdgeFromEnd {
                    to: edge.to.to_string(),
                });
            }
            let source = resolve(&edge.from)?;
            let target = resolve(&edge.to)?;
            graph.add_edge(source, target, ());
        }

        if petgraph::algo::is_cyclic_directed(&graph) {
            return Err(GraphError::CycleDetected);
        }

        // Walk the single chain from START; acyclicity guarantees termination.
        let mut order: Vec<NodeIndex> = Vec::new();
        let mut current = start;
        while current != end {
            let successors: Vec<NodeIndex> =
                graph.neighbors_directed(current, Direction::Outgoing).collect();
            match successors.as_slice() {
                [next] => {
                    if *next != end {
                        order.push(*next);
                    }
                    current = *next;
                }
                [] if current == start => return Err(GraphError::MissingEntry),
                [] => {
                    return Err(GraphError::DeadEnd {
                        node: graph[current].to_string(),
                    });
                }
                _ => {
                    return Err(GraphError::Branching {
                        from: graph[current].to_string(),
                    });
                }
            }
        }

        let on_chain: HashSet<NodeIndex> = order.iter().copied().collect();
        if let Some(orphan) = self
            .nodes
            .iter()
            .find(|node| !on_chain.contains(&index_by_name[node.name()]))
        {
            return Err(GraphError::OrphanNode {
                name: orphan.name().to_string(),
            });
        }

        let mut by_index: HashMap<NodeIndex, Node> = self
            .nodes
            .into_iter()
            .map(|node| (index_by_name[node.name()], node))
            .collect();

        Ok(order
            .into_iter()
            .filter_map(|index| by_index.remove(&index))
            .collect())
    }
}
