// SPDX-License-Identifier: MIT OR Apache-2.0
//! Copy and paste of selected sub-graphs.
//!
//! Copied nodes are stored relative to the top-left corner of the copied
//! set. Only connections with both endpoints inside the selection are kept;
//! their endpoints are indices into the copied node list. Pasting creates
//! fresh nodes and connections and never touches the buffer, so the same
//! copy can be pasted any number of times.

use crate::graph::Graph;
use crate::node::NodeId;
use emath::{pos2, Pos2, Vec2};

/// A node captured by [`Clipboard::copy`]
#[derive(Debug, Clone, PartialEq)]
pub struct ClipNode {
    /// Position relative to the copied set's top-left corner
    pub offset: Vec2,
    /// Name
    pub name: String,
    /// Story
    pub story: String,
    /// Reference
    pub reference: String,
}

/// A connection captured by [`Clipboard::copy`]
#[derive(Debug, Clone, PartialEq)]
pub struct ClipConnection {
    /// Index of the start node in [`ClipBuffer::nodes`]
    pub start: usize,
    /// Index of the end node in [`ClipBuffer::nodes`]
    pub end: usize,
    /// Description
    pub description: String,
    /// Symbol
    pub symbol: String,
}

/// Detached snapshot of a copied sub-graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipBuffer {
    /// Copied nodes, in selection order
    pub nodes: Vec<ClipNode>,
    /// Connections internal to the copied nodes
    pub connections: Vec<ClipConnection>,
}

impl ClipBuffer {
    /// Top-left corner of the stored offsets
    fn origin(&self) -> Option<Pos2> {
        self.nodes
            .iter()
            .map(|n| n.offset.to_pos2())
            .reduce(|a, b| a.min(b))
    }
}

/// Copy/paste buffer
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    buffer: Option<ClipBuffer>,
}

impl Clipboard {
    /// Create an empty clipboard
    pub fn new() -> Self {
        Self::default()
    }

    /// Current buffer, if something was copied
    pub fn buffer(&self) -> Option<&ClipBuffer> {
        self.buffer.as_ref()
    }

    /// Whether a paste would do anything
    pub fn is_empty(&self) -> bool {
        self.buffer.as_ref().map_or(true, |b| b.nodes.is_empty())
    }

    /// Capture the graph's selected nodes.
    ///
    /// Does nothing when the selection is empty. Returns the number of
    /// nodes copied.
    pub fn copy(&mut self, graph: &Graph) -> usize {
        let selected: Vec<NodeId> = graph
            .selection()
            .iter()
            .filter(|id| graph.node(*id).is_some())
            .collect();
        if selected.is_empty() {
            return 0;
        }

        let origin = selected
            .iter()
            .filter_map(|id| graph.node(*id))
            .map(|n| n.position)
            .fold(pos2(f32::INFINITY, f32::INFINITY), Pos2::min);

        let nodes = selected
            .iter()
            .filter_map(|id| graph.node(*id))
            .map(|n| ClipNode {
                offset: n.position - origin,
                name: n.name.clone(),
                story: n.story.clone(),
                reference: n.reference.clone(),
            })
            .collect();

        let index_of = |id: NodeId| selected.iter().position(|s| *s == id);
        let connections = graph
            .connections()
            .filter_map(|c| {
                Some(ClipConnection {
                    start: index_of(c.start_node)?,
                    end: index_of(c.end_node)?,
                    description: c.description.clone(),
                    symbol: c.symbol.clone(),
                })
            })
            .collect();

        let buffer = ClipBuffer { nodes, connections };
        tracing::debug!(
            "Copied {} nodes and {} connections",
            buffer.nodes.len(),
            buffer.connections.len()
        );
        let count = buffer.nodes.len();
        self.buffer = Some(buffer);
        count
    }

    /// Instantiate the buffer with its top-left corner at `anchor`.
    ///
    /// The new nodes replace the selection. Returns their IDs in buffer
    /// order; empty when there is nothing to paste.
    pub fn paste(&self, graph: &mut Graph, anchor: Pos2) -> Vec<NodeId> {
        let Some(buffer) = &self.buffer else {
            return Vec::new();
        };
        let Some(origin) = buffer.origin() else {
            return Vec::new();
        };
        let shift = anchor - origin;

        let created: Vec<NodeId> = buffer
            .nodes
            .iter()
            .map(|n| {
                graph.add_node(
                    n.offset.to_pos2() + shift,
                    n.name.clone(),
                    n.story.clone(),
                    n.reference.clone(),
                )
            })
            .collect();

        for c in &buffer.connections {
            let (Some(&start), Some(&end)) = (created.get(c.start), created.get(c.end)) else {
                continue;
            };
            if let Err(err) = graph.create_connection(start, end, c.description.clone(), c.symbol.clone()) {
                tracing::warn!("Skipped pasted connection: {err}");
            }
        }

        graph.replace_selection(created.iter().copied());
        created
    }
}
