// SPDX-License-Identifier: MIT OR Apache-2.0
//! Mapping between screen (pointer) space and world (canvas) space.
//!
//! `world = (screen - offset) / scale`, with a single uniform scale.

use emath::{vec2, Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Convert a pointer position to world space
pub fn to_world(pointer: Pos2, offset: Vec2, scale: f32) -> Pos2 {
    ((pointer - offset).to_vec2() / scale).to_pos2()
}

/// Convert a world position to screen space
pub fn to_screen(world: Pos2, offset: Vec2, scale: f32) -> Pos2 {
    (world.to_vec2() * scale + offset).to_pos2()
}

/// Pan offset and zoom of the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Screen position of the world origin
    pub offset: Vec2,
    /// Uniform zoom factor
    pub scale: f32,
}

impl Viewport {
    /// Identity viewport
    pub fn new() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
        }
    }

    /// Screen point to world point
    pub fn to_world(&self, pointer: Pos2) -> Pos2 {
        to_world(pointer, self.offset, self.scale)
    }

    /// World point to screen point
    pub fn to_screen(&self, world: Pos2) -> Pos2 {
        to_screen(world, self.offset, self.scale)
    }

    /// Shift the canvas by a screen-space delta
    pub fn pan_by(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom one wheel notch about the pointer, keeping the world point
    /// under it fixed.
    ///
    /// Negative `wheel_delta` zooms in, positive zooms out, matching
    /// browser wheel events. The result is clamped to `[min, max]`.
    pub fn zoom_at(&mut self, pointer: Pos2, wheel_delta: f32, step: f32, min: f32, max: f32) {
        if wheel_delta == 0.0 {
            return;
        }
        let anchor = self.to_world(pointer);
        let scale = if wheel_delta > 0.0 {
            self.scale / step
        } else {
            self.scale * step
        };
        self.scale = scale.clamp(min, max);
        self.offset = pointer.to_vec2() - anchor.to_vec2() * self.scale;
    }

    /// Pan so a world rectangle sits in the middle of the screen
    pub fn center_on(&mut self, rect: Rect, screen_size: Vec2) {
        self.offset = screen_size / 2.0 - rect.center().to_vec2() * self.scale;
    }

    /// Persistable form of the viewport
    pub fn to_document(&self) -> ViewDocument {
        ViewDocument {
            scale: self.scale,
            position: ViewPosition {
                x: self.offset.x,
                y: self.offset.y,
            },
        }
    }

    /// Restore from a persisted view, ignoring degenerate scales
    pub fn from_document(document: &ViewDocument) -> Self {
        let scale = if document.scale.is_finite() && document.scale > 0.0 {
            document.scale
        } else {
            1.0
        };
        Self {
            offset: vec2(document.position.x, document.position.y),
            scale,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialized view state: `{ "scale": 1.0, "position": { "x": 0, "y": 0 } }`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewDocument {
    /// Uniform zoom factor
    pub scale: f32,
    /// Pan offset
    pub position: ViewPosition,
}

/// Pan offset in a [`ViewDocument`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewPosition {
    /// Horizontal offset
    pub x: f32,
    /// Vertical offset
    pub y: f32,
}
