// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node selection and marquee (rubber-band) selection.
//!
//! Marquee selection always replaces the current selection with the nodes
//! whose bounding box overlaps the rectangle; there is no additive mode.

use crate::node::{Node, NodeId};
use emath::{Pos2, Rect};
use indexmap::IndexSet;

/// An in-progress marquee drag, in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marquee {
    /// Where the drag started
    pub origin: Pos2,
    /// Latest pointer position
    pub current: Pos2,
}

impl Marquee {
    /// Start a zero-size marquee at a point
    pub fn new(origin: Pos2) -> Self {
        Self {
            origin,
            current: origin,
        }
    }

    /// Normalized rectangle spanning origin and current point
    pub fn rect(&self) -> Rect {
        Rect::from_two_pos(self.origin, self.current)
    }
}

/// The set of selected nodes, kept in selection order
#[derive(Debug, Clone, Default)]
pub struct Selection {
    nodes: IndexSet<NodeId>,
    marquee: Option<Marquee>,
}

impl Selection {
    /// Create an empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a node is selected
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    /// Selected node IDs in selection order
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    /// Number of selected nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if nothing is selected
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Empty the selection. Returns whether anything was deselected.
    pub fn clear(&mut self) -> bool {
        let changed = !self.nodes.is_empty();
        self.nodes.clear();
        changed
    }

    /// Replace the selection. Returns whether the contents changed.
    pub fn replace<I>(&mut self, ids: I) -> bool
    where
        I: IntoIterator<Item = NodeId>,
    {
        let next: IndexSet<NodeId> = ids.into_iter().collect();
        let changed = next != self.nodes;
        self.nodes = next;
        changed
    }

    /// Drop a node from the selection. Returns whether it was selected.
    pub fn remove(&mut self, id: NodeId) -> bool {
        self.nodes.shift_remove(&id)
    }

    /// Begin a marquee at a world point, discarding any previous one
    pub fn start_marquee(&mut self, origin: Pos2) {
        self.marquee = Some(Marquee::new(origin));
    }

    /// Move the free corner of the active marquee
    pub fn update_marquee(&mut self, point: Pos2) {
        if let Some(marquee) = &mut self.marquee {
            marquee.current = point;
        }
    }

    /// The active marquee, if a drag is in progress
    pub fn marquee(&self) -> Option<&Marquee> {
        self.marquee.as_ref()
    }

    /// Abandon the active marquee without touching the selection
    pub fn cancel_marquee(&mut self) -> bool {
        self.marquee.take().is_some()
    }

    /// Finish the marquee, replacing the selection with every node whose
    /// bounding box overlaps the rectangle.
    ///
    /// Returns `None` when no marquee was active, otherwise whether the
    /// selection changed.
    pub fn finish_marquee<'a, I>(&mut self, nodes: I) -> Option<bool>
    where
        I: IntoIterator<Item = &'a Node>,
    {
        let marquee = self.marquee.take()?;
        Some(self.replace(nodes_in_rect(nodes, marquee.rect())))
    }
}

/// IDs of nodes whose bounding box overlaps a rectangle (edges inclusive)
pub fn nodes_in_rect<'a, I>(nodes: I, rect: Rect) -> Vec<NodeId>
where
    I: IntoIterator<Item = &'a Node>,
{
    nodes
        .into_iter()
        .filter(|node| node.rect().intersects(rect))
        .map(|node| node.id)
        .collect()
}
