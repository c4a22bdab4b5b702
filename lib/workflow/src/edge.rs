//! Edge types for workflow graphs.
//!
//! Edges connect two endpoints: the reserved `Start` and `End` markers or
//! a declared node, referenced by name.

use std::fmt;

/// One end of an edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Reserved marker where execution begins.
    Start,
    /// Reserved marker where execution finishes.
    End,
    /// A declared node.
    Node(String),
}

impl Endpoint {
    /// Creates an endpoint referencing a node by name.
    #[must_use]
    pub fn node(name: impl Into<String>) -> Self {
        Self::Node(name.into())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("START"),
            Self::End => f.write_str("END"),
            Self::Node(name) => f.write_str(name),
        }
    }
}

impl From<&str> for Endpoint {
    fn from(name: &str) -> Self {
        Self::node(name)
    }
}

impl From<String> for Endpoint {
    fn from(name: String) -> Self {
        Self::Node(name)
    }
}

/// A directed edge between two endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Where the edge starts.
    pub from: Endpoint,
    /// Where the edge leads.
    pub to: Endpoint,
}

impl Edge {
    /// Creates a new edge.
    #[must_use]
    pub fn new(from: impl Into<Endpoint>, to: impl Into<Endpoint>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}
