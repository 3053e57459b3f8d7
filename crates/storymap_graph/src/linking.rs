// SPDX-License-Identifier: MIT OR Apache-2.0
//! Two-click connection creation.
//!
//! ```text
//!            click node A
//!   Idle ─────────────────────▶ AwaitingSecondNode(A)
//!    ▲                               │
//!    │  click A again / click B      │
//!    │  (created or rejected) /      │
//!    └──────── cancel ◀──────────────┘
//! ```
//!
//! While awaiting the second node a guide line runs from the start node's
//! center to the pointer. [`Linker::cancel`] is the only way out of
//! [`LinkState::AwaitingSecondNode`], so the guide never outlives the
//! gesture.

use crate::binding::MAX_CONNECTIONS_PER_PAIR;
use crate::connection::ConnectionId;
use crate::graph::{Graph, GraphError};
use crate::node::NodeId;
use emath::Pos2;

/// Transient line drawn while picking the second node, in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideLine {
    /// Center of the start node
    pub from: Pos2,
    /// Latest pointer position
    pub to: Pos2,
}

/// State of the connection gesture
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LinkState {
    /// No connection in progress
    #[default]
    Idle,
    /// The first node was picked; waiting for the second
    AwaitingSecondNode {
        /// Node the connection starts from
        start: NodeId,
        /// Guide line tracking the pointer
        guide: GuideLine,
    },
}

/// What a click on a node did
#[derive(Debug, Clone, PartialEq)]
pub enum LinkOutcome {
    /// The click picked the start node
    Started(NodeId),
    /// A connection was created and the gesture ended
    Created(ConnectionId),
    /// The gesture ended without a connection
    Cancelled,
    /// The connection was refused; the gesture ended
    Rejected(GraphError),
}

/// Connection-creation state machine
#[derive(Debug, Clone, Default)]
pub struct Linker {
    state: LinkState,
}

impl Linker {
    /// Create an idle linker
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> &LinkState {
        &self.state
    }

    /// Whether a start node has been picked
    pub fn is_active(&self) -> bool {
        matches!(self.state, LinkState::AwaitingSecondNode { .. })
    }

    /// The start node while active
    pub fn start_node(&self) -> Option<NodeId> {
        match self.state {
            LinkState::AwaitingSecondNode { start, .. } => Some(start),
            LinkState::Idle => None,
        }
    }

    /// The guide line while active
    pub fn guide(&self) -> Option<GuideLine> {
        match self.state {
            LinkState::AwaitingSecondNode { guide, .. } => Some(guide),
            LinkState::Idle => None,
        }
    }

    /// Enter `AwaitingSecondNode` from `Idle`, anchoring the guide at the
    /// node's center.
    ///
    /// Returns `false` when already active or the node does not exist.
    pub fn enter(&mut self, graph: &Graph, start: NodeId) -> bool {
        if self.is_active() {
            return false;
        }
        let Some(center) = graph.node_center(start) else {
            return false;
        };
        self.state = LinkState::AwaitingSecondNode {
            start,
            guide: GuideLine {
                from: center,
                to: center,
            },
        };
        tracing::debug!("Linking from {}", start);
        true
    }

    /// Track the pointer with the guide line. Ignored while idle.
    pub fn pointer_moved(&mut self, world: Pos2) {
        if let LinkState::AwaitingSecondNode { guide, .. } = &mut self.state {
            guide.to = world;
        }
    }

    /// Leave the gesture, dropping the guide line.
    ///
    /// Returns whether a gesture was active.
    pub fn cancel(&mut self) -> bool {
        let was_active = self.is_active();
        self.state = LinkState::Idle;
        was_active
    }

    /// Handle a qualifying click on a node.
    ///
    /// In `Idle` the node becomes the start. Otherwise clicking the start
    /// again cancels, a saturated pair is rejected with
    /// [`GraphError::TooManyConnections`], and any other node is connected.
    /// Every path out of `AwaitingSecondNode` goes through [`Self::cancel`].
    pub fn click_node(&mut self, graph: &mut Graph, target: NodeId) -> LinkOutcome {
        let Some(start) = self.start_node() else {
            return if self.enter(graph, target) {
                LinkOutcome::Started(target)
            } else {
                LinkOutcome::Cancelled
            };
        };

        if target == start {
            self.cancel();
            return LinkOutcome::Cancelled;
        }

        if graph.connections_between(start, target).count() >= MAX_CONNECTIONS_PER_PAIR {
            self.cancel();
            return LinkOutcome::Rejected(GraphError::TooManyConnections);
        }

        let outcome = match graph.create_connection(start, target, "", "") {
            Ok(id) => LinkOutcome::Created(id),
            Err(err) => LinkOutcome::Rejected(err),
        };
        self.cancel();
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emath::pos2;

    fn two_nodes() -> (Graph, NodeId, NodeId) {
        let mut graph = Graph::new();
        let a = graph.add_node(pos2(0.0, 0.0), "A", "", "");
        let b = graph.add_node(pos2(200.0, 0.0), "B", "", "");
        (graph, a, b)
    }

    #[test]
    fn test_starts_idle() {
        let linker = Linker::new();
        assert_eq!(linker.state(), &LinkState::Idle);
        assert!(linker.guide().is_none());
    }

    #[test]
    fn test_first_click_enters_awaiting() {
        let (mut graph, a, _) = two_nodes();
        let mut linker = Linker::new();
        assert_eq!(linker.click_node(&mut graph, a), LinkOutcome::Started(a));
        assert_eq!(linker.start_node(), Some(a));
        let guide = linker.guide().unwrap();
        assert_eq!(guide.from, graph.node_center(a).unwrap());
    }

    #[test]
    fn test_guide_tracks_pointer() {
        let (mut graph, a, _) = two_nodes();
        let mut linker = Linker::new();
        linker.click_node(&mut graph, a);
        linker.pointer_moved(pos2(400.0, 300.0));
        assert_eq!(linker.guide().unwrap().to, pos2(400.0, 300.0));
    }

    #[test]
    fn test_pointer_move_while_idle_is_ignored() {
        let mut linker = Linker::new();
        linker.pointer_moved(pos2(1.0, 1.0));
        assert_eq!(linker.state(), &LinkState::Idle);
    }

    #[test]
    fn test_second_click_creates_connection() {
        let (mut graph, a, b) = two_nodes();
        let mut linker = Linker::new();
        linker.click_node(&mut graph, a);
        let outcome = linker.click_node(&mut graph, b);
        let LinkOutcome::Created(id) = outcome.clone() else {
            panic!("expected a connection, got {outcome:?}");
        };
        let connection = graph.connection(id).unwrap();
        assert_eq!((connection.start_node, connection.end_node), (a, b));
        assert!(!linker.is_active());
    }

    #[test]
    fn test_clicking_start_again_cancels() {
        let (mut graph, a, _) = two_nodes();
        let mut linker = Linker::new();
        linker.click_node(&mut graph, a);
        assert_eq!(linker.click_node(&mut graph, a), LinkOutcome::Cancelled);
        assert!(!linker.is_active());
        assert_eq!(graph.connection_count(), 0);
    }

    #[test]
    fn test_saturated_pair_rejected() {
        let (mut graph, a, b) = two_nodes();
        for _ in 0..3 {
            graph.create_connection(a, b, "", "").unwrap();
        }
        let mut linker = Linker::new();
        linker.click_node(&mut graph, b);
        assert_eq!(
            linker.click_node(&mut graph, a),
            LinkOutcome::Rejected(GraphError::TooManyConnections)
        );
        assert!(!linker.is_active());
        assert_eq!(graph.connection_count(), 3);
    }

    #[test]
    fn test_cancel_leaves_graph_unchanged() {
        let (mut graph, a, _) = two_nodes();
        graph.take_dirty();
        let mut linker = Linker::new();
        linker.click_node(&mut graph, a);
        assert!(linker.cancel());
        assert!(!linker.cancel());
        assert!(linker.guide().is_none());
        assert!(!graph.is_dirty());
    }

    #[test]
    fn test_enter_unknown_node() {
        let (graph, _, _) = two_nodes();
        let mut linker = Linker::new();
        assert!(!linker.enter(&graph, NodeId::new()));
        assert!(!linker.is_active());
    }

    #[test]
    fn test_start_node_deleted_mid_gesture() {
        let (mut graph, a, b) = two_nodes();
        let mut linker = Linker::new();
        linker.click_node(&mut graph, a);
        graph.delete_node(a);
        assert!(matches!(
            linker.click_node(&mut graph, b),
            LinkOutcome::Rejected(GraphError::NodeNotFound(_))
        ));
        assert!(!linker.is_active());
    }
}
