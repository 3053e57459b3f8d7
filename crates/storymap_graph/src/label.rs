// SPDX-License-Identifier: MIT OR Apache-2.0
//! Label footprint estimation.
//!
//! A node is drawn as a rounded rectangle sized to its label text. The
//! renderer owns the real text metrics; the engine only needs a stable
//! approximation so binding points and marquee hits line up before the
//! renderer reports the measured size (see [`Graph::set_node_size`]).
//!
//! [`Graph::set_node_size`]: crate::graph::Graph::set_node_size

use emath::{vec2, Vec2};
use serde::{Deserialize, Serialize};

/// Text displayed for a node whose name is empty
pub const PLACEHOLDER_NAME: &str = "Name";

/// Font and padding parameters used to size node labels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelStyle {
    /// Font size in world units
    pub font_size: f32,
    /// Padding on every side of the text
    pub padding: f32,
    /// Average glyph advance as a fraction of the font size
    pub glyph_advance: f32,
}

impl LabelStyle {
    /// Estimate the footprint of a label.
    ///
    /// Width follows the longest line, height the number of lines.
    pub fn measure(&self, text: &str) -> Vec2 {
        let (lines, longest) = text
            .split('\n')
            .fold((0usize, 0usize), |(lines, longest), line| {
                (lines + 1, longest.max(line.chars().count()))
            });

        vec2(
            longest as f32 * self.font_size * self.glyph_advance + 2.0 * self.padding,
            lines as f32 * self.font_size + 2.0 * self.padding,
        )
    }
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            padding: 10.0,
            glyph_advance: 0.6,
        }
    }
}

/// The text shown for a node name, substituting the placeholder when empty
pub fn display_label(name: &str) -> &str {
    if name.is_empty() {
        PLACEHOLDER_NAME
    } else {
        name
    }
}
