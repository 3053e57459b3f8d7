// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the story map.

use crate::label::display_label;
use emath::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A labeled node placed on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Top-left corner in world space
    pub position: Pos2,
    /// Name shown on the node (may be empty)
    pub name: String,
    /// Free-text story annotation
    pub story: String,
    /// Free-text reference annotation
    pub reference: String,
    /// Footprint size, derived from the label
    pub size: Vec2,
}

impl Node {
    /// Create a node at a position with the given footprint size
    pub fn new(position: Pos2, size: Vec2) -> Self {
        Self {
            id: NodeId::new(),
            position,
            name: String::new(),
            story: String::new(),
            reference: String::new(),
            size,
        }
    }

    /// Set the name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the story
    pub fn with_story(mut self, story: impl Into<String>) -> Self {
        self.story = story.into();
        self
    }

    /// Set the reference
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }

    /// The text drawn on the node
    pub fn label(&self) -> &str {
        display_label(&self.name)
    }

    /// Axis-aligned bounding box in world space
    pub fn rect(&self) -> Rect {
        Rect::from_min_size(self.position, self.size)
    }

    /// Geometric center of the footprint
    pub fn center(&self) -> Pos2 {
        self.rect().center()
    }
}
