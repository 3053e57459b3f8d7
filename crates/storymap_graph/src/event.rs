// SPDX-License-Identifier: MIT OR Apache-2.0
//! Change notifications emitted by the graph for the renderer.

use crate::connection::ConnectionId;
use crate::node::NodeId;

/// Something observable changed in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphEvent {
    /// A node was created
    NodeCreated(NodeId),
    /// A node was removed
    NodeRemoved(NodeId),
    /// A node's position changed
    NodeMoved(NodeId),
    /// A node's name, story, reference or footprint changed
    NodeChanged(NodeId),
    /// A connection was created
    ConnectionCreated(ConnectionId),
    /// A connection was removed
    ConnectionRemoved(ConnectionId),
    /// A connection's binding points were reassigned or moved
    ConnectionRebound(ConnectionId),
    /// A connection's description or symbol changed
    ConnectionChanged(ConnectionId),
    /// The set of selected nodes changed
    SelectionChanged,
    /// Every node and connection was removed at once
    Cleared,
}
