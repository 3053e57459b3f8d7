// SPDX-License-Identifier: MIT OR Apache-2.0
//! Binding point allocation.
//!
//! Up to three connections may join the same pair of nodes. Each one
//! attaches to a fixed point on both footprints so parallel connections
//! never overlap:
//!
//! | Connections | Bindings (insertion order) |
//! |-------------|----------------------------|
//! | 1           | center                     |
//! | 2           | left, right                |
//! | 3           | left, center, right        |

use emath::{pos2, Pos2, Rect};
use serde::{Deserialize, Serialize};

/// Maximum number of connections between one pair of nodes
pub const MAX_CONNECTIONS_PER_PAIR: usize = 3;

/// Default horizontal inset of the left/right binding points
pub const DEFAULT_BINDING_INSET: f32 = 5.0;

/// Attachment point of a connection endpoint on a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Binding {
    /// Not yet allocated
    #[default]
    None,
    /// Near the left edge, at the vertical midpoint
    Left,
    /// Geometric center
    Center,
    /// Near the right edge, at the vertical midpoint
    Right,
}

const ONE: [Binding; 1] = [Binding::Center];
const TWO: [Binding; 2] = [Binding::Left, Binding::Right];
const THREE: [Binding; 3] = [Binding::Left, Binding::Center, Binding::Right];

/// Bindings for a pair holding `count` connections, in insertion order.
///
/// Returns an empty slice for zero or for counts above the cap.
pub fn allocate(count: usize) -> &'static [Binding] {
    match count {
        1 => &ONE,
        2 => &TWO,
        3 => &THREE,
        _ => &[],
    }
}

/// The three world-space binding points of a node footprint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BindingPoints {
    /// Left binding point
    pub left: Pos2,
    /// Center binding point
    pub center: Pos2,
    /// Right binding point
    pub right: Pos2,
}

impl BindingPoints {
    /// Compute binding points for a footprint
    pub fn for_rect(rect: Rect, inset: f32) -> Self {
        let mid_y = rect.center().y;
        Self {
            left: pos2(rect.min.x + inset, mid_y),
            center: rect.center(),
            right: pos2(rect.max.x - inset, mid_y),
        }
    }

    /// Point for a binding; `None` for an unallocated binding
    pub fn get(&self, binding: Binding) -> Option<Pos2> {
        match binding {
            Binding::None => None,
            Binding::Left => Some(self.left),
            Binding::Center => Some(self.center),
            Binding::Right => Some(self.right),
        }
    }
}
