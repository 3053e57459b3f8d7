// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph store owning nodes, connections and the selection.
//!
//! Every mutation goes through [`Graph`] methods so the structural
//! invariants hold at all times:
//! - connections join two distinct live nodes
//! - at most [`MAX_CONNECTIONS_PER_PAIR`] connections per node pair
//! - bindings of every pair are packed per [`binding::allocate`]
//! - the selection only holds live node IDs
//!
//! Mutations set the dirty flag (taken by the persister) and queue
//! [`GraphEvent`]s for the renderer.

use crate::binding::{self, BindingPoints, DEFAULT_BINDING_INSET, MAX_CONNECTIONS_PER_PAIR};
use crate::connection::{Connection, ConnectionId, NodePair};
use crate::event::GraphEvent;
use crate::label::LabelStyle;
use crate::node::{Node, NodeId};
use crate::selection::Selection;
use emath::{Pos2, Vec2};
use indexmap::IndexMap;

/// The story map graph
#[derive(Debug, Clone)]
pub struct Graph {
    /// Nodes in insertion order
    nodes: IndexMap<NodeId, Node>,
    /// Connections in insertion order
    connections: IndexMap<ConnectionId, Connection>,
    /// Selected nodes and the active marquee
    selection: Selection,
    /// Label sizing used for new and renamed nodes
    label_style: LabelStyle,
    /// Horizontal inset of left/right binding points
    binding_inset: f32,
    /// Set by every mutation, cleared by [`Graph::take_dirty`]
    dirty: bool,
    /// Pending renderer notifications
    events: Vec<GraphEvent>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::with_style(LabelStyle::default(), DEFAULT_BINDING_INSET)
    }

    /// Create a new empty graph with custom label sizing and binding inset
    pub fn with_style(label_style: LabelStyle, binding_inset: f32) -> Self {
        Self {
            nodes: IndexMap::new(),
            connections: IndexMap::new(),
            selection: Selection::new(),
            label_style,
            binding_inset,
            dirty: false,
            events: Vec::new(),
        }
    }

    /// Label sizing in use
    pub fn label_style(&self) -> &LabelStyle {
        &self.label_style
    }

    // --- Nodes -----------------------------------------------------------

    /// Add a node. Always succeeds; names are not checked for uniqueness.
    pub fn add_node(
        &mut self,
        position: Pos2,
        name: impl Into<String>,
        story: impl Into<String>,
        reference: impl Into<String>,
    ) -> NodeId {
        let name = name.into();
        let size = self.label_style.measure(crate::label::display_label(&name));
        let node = Node::new(position, size)
            .with_name(name)
            .with_story(story)
            .with_reference(reference);
        let id = node.id;
        tracing::debug!("Added node {} at ({}, {})", id, position.x, position.y);
        self.nodes.insert(id, node);
        self.touch(GraphEvent::NodeCreated(id));
        id
    }

    /// Remove a node together with its connections.
    ///
    /// Unknown IDs are ignored.
    pub fn delete_node(&mut self, node_id: NodeId) -> Option<Node> {
        if !self.nodes.contains_key(&node_id) {
            return None;
        }

        // Every pair touching this node becomes empty, so no repack is needed
        let incident: Vec<ConnectionId> = self
            .connections_for_node(node_id)
            .map(|c| c.id)
            .collect();
        for connection_id in incident {
            self.remove_connection(connection_id);
        }

        if self.selection.remove(node_id) {
            self.events.push(GraphEvent::SelectionChanged);
        }

        let node = self.nodes.shift_remove(&node_id);
        self.touch(GraphEvent::NodeRemoved(node_id));
        tracing::debug!("Deleted node {}", node_id);
        node
    }

    /// Remove every selected node. Returns how many were removed.
    pub fn delete_selected(&mut self) -> usize {
        let selected: Vec<NodeId> = self.selection.iter().collect();
        selected
            .into_iter()
            .filter_map(|id| self.delete_node(id))
            .count()
    }

    /// Rename a node.
    ///
    /// Fails with [`GraphError::NameConflict`] when another live node
    /// already has exactly this name. The footprint is re-measured and the
    /// node's connections rebound.
    pub fn rename_node(&mut self, node_id: NodeId, new_name: impl Into<String>) -> Result<(), GraphError> {
        let new_name = new_name.into();
        let node = self.nodes.get(&node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        if node.name == new_name {
            return Ok(());
        }
        if self.nodes.values().any(|n| n.id != node_id && n.name == new_name) {
            tracing::warn!("Rename rejected, name already in use: {:?}", new_name);
            return Err(GraphError::NameConflict(new_name));
        }

        let size = self.label_style.measure(crate::label::display_label(&new_name));
        if let Some(node) = self.nodes.get_mut(&node_id) {
            node.name = new_name;
            node.size = size;
        }
        self.touch(GraphEvent::NodeChanged(node_id));
        self.rebind_node(node_id);
        Ok(())
    }

    /// Replace a node's story text
    pub fn set_story(&mut self, node_id: NodeId, story: impl Into<String>) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(&node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        node.story = story.into();
        self.touch(GraphEvent::NodeChanged(node_id));
        Ok(())
    }

    /// Replace a node's reference text
    pub fn set_reference(&mut self, node_id: NodeId, reference: impl Into<String>) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(&node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        node.reference = reference.into();
        self.touch(GraphEvent::NodeChanged(node_id));
        Ok(())
    }

    /// Move a node's top-left corner
    pub fn move_node(&mut self, node_id: NodeId, position: Pos2) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(&node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        node.position = position;
        self.touch(GraphEvent::NodeMoved(node_id));
        self.rebind_node(node_id);
        Ok(())
    }

    /// Override a node's footprint with a size measured by the renderer
    pub fn set_node_size(&mut self, node_id: NodeId, size: Vec2) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(&node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        if node.size == size {
            return Ok(());
        }
        node.size = size;
        self.events.push(GraphEvent::NodeChanged(node_id));
        self.rebind_node(node_id);
        Ok(())
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get all nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all node IDs in insertion order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Position of a node in iteration order
    pub fn node_index(&self, node_id: NodeId) -> Option<usize> {
        self.nodes.get_index_of(&node_id)
    }

    /// First node with exactly this name
    pub fn find_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.values().find(|n| n.name == name)
    }

    /// Topmost node whose footprint contains a world point.
    ///
    /// Later nodes are drawn above earlier ones.
    pub fn node_at(&self, point: Pos2) -> Option<NodeId> {
        self.nodes
            .values()
            .rev()
            .find(|n| n.rect().contains(point))
            .map(|n| n.id)
    }

    /// Center of a node's footprint
    pub fn node_center(&self, node_id: NodeId) -> Option<Pos2> {
        self.nodes.get(&node_id).map(Node::center)
    }

    /// Binding points of a node's footprint
    pub fn binding_points(&self, node_id: NodeId) -> Option<BindingPoints> {
        self.nodes
            .get(&node_id)
            .map(|n| BindingPoints::for_rect(n.rect(), self.binding_inset))
    }

    // --- Connections -----------------------------------------------------

    /// Connect two nodes.
    ///
    /// Fails on self-connections, unknown nodes, and when the pair already
    /// holds [`MAX_CONNECTIONS_PER_PAIR`] connections.
    pub fn create_connection(
        &mut self,
        start_node: NodeId,
        end_node: NodeId,
        description: impl Into<String>,
        symbol: impl Into<String>,
    ) -> Result<ConnectionId, GraphError> {
        if start_node == end_node {
            return Err(GraphError::SelfConnection);
        }
        if !self.nodes.contains_key(&start_node) {
            return Err(GraphError::NodeNotFound(start_node));
        }
        if !self.nodes.contains_key(&end_node) {
            return Err(GraphError::NodeNotFound(end_node));
        }
        if self.connections_between(start_node, end_node).count() >= MAX_CONNECTIONS_PER_PAIR {
            tracing::warn!("Connection rejected, pair already has {} connections", MAX_CONNECTIONS_PER_PAIR);
            return Err(GraphError::TooManyConnections);
        }

        let connection = Connection::new(start_node, end_node, description, symbol);
        let id = connection.id;
        let pair = connection.pair();
        self.connections.insert(id, connection);
        self.touch(GraphEvent::ConnectionCreated(id));
        self.repack(pair);
        tracing::debug!("Connected {} -> {} ({})", start_node, end_node, id);
        Ok(id)
    }

    /// Remove a connection and repack the bindings of its pair
    pub fn delete_connection(&mut self, connection_id: ConnectionId) -> Option<Connection> {
        let connection = self.remove_connection(connection_id)?;
        self.repack(connection.pair());
        Some(connection)
    }

    /// Replace a connection's description
    pub fn set_description(
        &mut self,
        connection_id: ConnectionId,
        description: impl Into<String>,
    ) -> Result<(), GraphError> {
        let connection = self
            .connections
            .get_mut(&connection_id)
            .ok_or(GraphError::ConnectionNotFound(connection_id))?;
        connection.description = description.into();
        self.touch(GraphEvent::ConnectionChanged(connection_id));
        Ok(())
    }

    /// Replace a connection's symbol
    pub fn set_symbol(&mut self, connection_id: ConnectionId, symbol: impl Into<String>) -> Result<(), GraphError> {
        let connection = self
            .connections
            .get_mut(&connection_id)
            .ok_or(GraphError::ConnectionNotFound(connection_id))?;
        connection.symbol = symbol.into();
        self.touch(GraphEvent::ConnectionChanged(connection_id));
        Ok(())
    }

    /// Get a connection by ID
    pub fn connection(&self, connection_id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&connection_id)
    }

    /// Get all connections in insertion order
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Connections joining two nodes in either direction, in insertion order
    pub fn connections_between(&self, a: NodeId, b: NodeId) -> impl Iterator<Item = &Connection> {
        self.connections.values().filter(move |c| c.joins(a, b))
    }

    /// Get connections involving a node
    pub fn connections_for_node(&self, node_id: NodeId) -> impl Iterator<Item = &Connection> {
        self.connections.values().filter(move |c| c.involves_node(node_id))
    }

    /// World-space endpoints of a connection at its current bindings
    pub fn connection_endpoints(&self, connection_id: ConnectionId) -> Option<(Pos2, Pos2)> {
        let connection = self.connections.get(&connection_id)?;
        let start = self.binding_points(connection.start_node)?.get(connection.start_binding)?;
        let end = self.binding_points(connection.end_node)?.get(connection.end_binding)?;
        Some((start, end))
    }

    /// Midpoint of a connection, where its symbol badge sits
    pub fn connection_midpoint(&self, connection_id: ConnectionId) -> Option<Pos2> {
        let (start, end) = self.connection_endpoints(connection_id)?;
        Some(start.lerp(end, 0.5))
    }

    /// Topmost connection whose line passes within `tolerance` of a point
    pub fn connection_at(&self, point: Pos2, tolerance: f32) -> Option<ConnectionId> {
        self.connections
            .keys()
            .rev()
            .copied()
            .find(|&id| {
                self.connection_endpoints(id)
                    .is_some_and(|(start, end)| distance_to_segment(point, start, end) <= tolerance)
            })
    }

    /// Badge character shown at the midpoint, if the symbol is non-empty
    pub fn symbol_badge(&self, connection_id: ConnectionId) -> Option<char> {
        self.connection(connection_id)?.badge()
    }

    // --- Selection -------------------------------------------------------

    /// Current selection
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Select every live node
    pub fn select_all(&mut self) {
        let all: Vec<NodeId> = self.nodes.keys().copied().collect();
        self.replace_selection(all);
    }

    /// Deselect everything
    pub fn clear_selection(&mut self) {
        if self.selection.clear() {
            self.events.push(GraphEvent::SelectionChanged);
        }
    }

    /// Replace the selection, ignoring IDs that are not live nodes
    pub fn replace_selection<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = NodeId>,
    {
        let live: Vec<NodeId> = ids
            .into_iter()
            .filter(|id| self.nodes.contains_key(id))
            .collect();
        if self.selection.replace(live) {
            self.events.push(GraphEvent::SelectionChanged);
        }
    }

    /// Begin a marquee drag at a world point
    pub fn start_marquee(&mut self, origin: Pos2) {
        self.selection.start_marquee(origin);
    }

    /// Extend the active marquee to a world point
    pub fn update_marquee(&mut self, point: Pos2) {
        self.selection.update_marquee(point);
    }

    /// Abandon the active marquee, leaving the selection as it was
    pub fn cancel_marquee(&mut self) -> bool {
        self.selection.cancel_marquee()
    }

    /// Finish the marquee, replacing the selection with the overlapped nodes.
    ///
    /// Returns `false` when no marquee was active.
    pub fn finish_marquee(&mut self) -> bool {
        match self.selection.finish_marquee(self.nodes.values()) {
            Some(changed) => {
                if changed {
                    self.events.push(GraphEvent::SelectionChanged);
                }
                true
            }
            None => false,
        }
    }

    // --- Lifecycle -------------------------------------------------------

    /// Remove every node and connection at once
    pub fn clear(&mut self) {
        self.connections.clear();
        self.nodes.clear();
        self.selection = Selection::new();
        self.touch(GraphEvent::Cleared);
        tracing::debug!("Cleared graph");
    }

    /// Whether the graph changed since the flag was last taken
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Read and reset the dirty flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Drain pending renderer notifications
    pub fn take_events(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.events)
    }

    // --- Internals -------------------------------------------------------

    fn touch(&mut self, event: GraphEvent) {
        self.dirty = true;
        self.events.push(event);
    }

    /// Remove a connection without repacking its pair
    fn remove_connection(&mut self, connection_id: ConnectionId) -> Option<Connection> {
        let connection = self.connections.shift_remove(&connection_id)?;
        self.touch(GraphEvent::ConnectionRemoved(connection_id));
        Some(connection)
    }

    /// Assign bindings to every connection of a pair in insertion order
    fn repack(&mut self, pair: NodePair) {
        let (a, b) = pair.nodes();
        let members: Vec<ConnectionId> = self.connections_between(a, b).map(|c| c.id).collect();
        let bindings = binding::allocate(members.len());

        for (id, binding) in members.into_iter().zip(bindings.iter().copied()) {
            if let Some(connection) = self.connections.get_mut(&id) {
                connection.start_binding = binding;
                connection.end_binding = binding;
                self.events.push(GraphEvent::ConnectionRebound(id));
            }
        }
    }

    /// Notify that a node's binding points moved
    fn rebind_node(&mut self, node_id: NodeId) {
        let incident: Vec<ConnectionId> = self.connections_for_node(node_id).map(|c| c.id).collect();
        self.events
            .extend(incident.into_iter().map(GraphEvent::ConnectionRebound));
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

/// Error when mutating the graph
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Connection not found
    #[error("Connection not found: {0}")]
    ConnectionNotFound(ConnectionId),

    /// A connection must join two different nodes
    #[error("A node cannot be connected to itself")]
    SelfConnection,

    /// The pair already holds the maximum number of connections
    #[error("Maximum of {} connections between two nodes allowed", MAX_CONNECTIONS_PER_PAIR)]
    TooManyConnections,

    /// Another node already uses the name
    #[error("A node named {0:?} already exists")]
    NameConflict(String),
}

fn distance_to_segment(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let along = end - start;
    let length_sq = along.length_sq();
    if length_sq == 0.0 {
        return point.distance(start);
    }
    let t = ((point - start).dot(along) / length_sq).clamp(0.0, 1.0);
    point.distance(start + along * t)
}
