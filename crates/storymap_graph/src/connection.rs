// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions for the story map.

use crate::binding::Binding;
use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new random connection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A connection between two distinct nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Node the connection was drawn from
    pub start_node: NodeId,
    /// Node the connection was drawn to
    pub end_node: NodeId,
    /// Free-text description shown in the annotation bubble
    pub description: String,
    /// Short annotation rendered as a badge at the midpoint
    pub symbol: String,
    /// Attachment point on the start node, assigned by the graph
    pub(crate) start_binding: Binding,
    /// Attachment point on the end node, assigned by the graph
    pub(crate) end_binding: Binding,
}

impl Connection {
    /// Create a new, not yet bound connection
    pub(crate) fn new(
        start_node: NodeId,
        end_node: NodeId,
        description: impl Into<String>,
        symbol: impl Into<String>,
    ) -> Self {
        Self {
            id: ConnectionId::new(),
            start_node,
            end_node,
            description: description.into(),
            symbol: symbol.into(),
            start_binding: Binding::None,
            end_binding: Binding::None,
        }
    }

    /// Binding point used on the start node
    pub fn start_binding(&self) -> Binding {
        self.start_binding
    }

    /// Binding point used on the end node
    pub fn end_binding(&self) -> Binding {
        self.end_binding
    }

    /// Check if this connection involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.start_node == node_id || self.end_node == node_id
    }

    /// Check if this connection joins exactly the given pair, in either direction
    pub fn joins(&self, a: NodeId, b: NodeId) -> bool {
        (self.start_node == a && self.end_node == b) || (self.start_node == b && self.end_node == a)
    }

    /// The unordered node pair this connection belongs to
    pub fn pair(&self) -> NodePair {
        NodePair::new(self.start_node, self.end_node)
    }

    /// First character of the symbol, as drawn in the midpoint badge
    pub fn badge(&self) -> Option<char> {
        self.symbol.chars().next()
    }
}

/// An unordered pair of node IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodePair(NodeId, NodeId);

impl NodePair {
    /// Create a pair; the order of arguments does not matter
    pub fn new(a: NodeId, b: NodeId) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    /// Both members of the pair
    pub fn nodes(&self) -> (NodeId, NodeId) {
        (self.0, self.1)
    }
}
