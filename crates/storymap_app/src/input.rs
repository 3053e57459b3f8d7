// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host-agnostic input events fed to a [`Session`](crate::session::Session).
//!
//! Pointer positions are in screen space.

use emath::Pos2;

/// Pointer button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Primary button
    Left,
    /// Secondary button
    Right,
}

/// Keys the session reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Cancel the current gesture
    Escape,
    /// Delete the selection
    Delete,
    /// Delete the selection
    Backspace,
    /// With ctrl: select all
    A,
    /// With ctrl: copy
    C,
    /// With ctrl: paste
    V,
}

/// Modifier keys held during an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    /// Ctrl (or Cmd on macOS)
    pub ctrl: bool,
    /// Shift
    pub shift: bool,
}

impl Modifiers {
    /// No modifiers
    pub const NONE: Self = Self {
        ctrl: false,
        shift: false,
    };

    /// Ctrl only
    pub const CTRL: Self = Self {
        ctrl: true,
        shift: false,
    };

    /// Shift only
    pub const SHIFT: Self = Self {
        ctrl: false,
        shift: true,
    };
}

/// A single input event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Button pressed
    PointerDown {
        /// Screen position
        pos: Pos2,
        /// Which button
        button: PointerButton,
        /// Held modifiers
        modifiers: Modifiers,
    },
    /// Pointer moved
    PointerMove {
        /// Screen position
        pos: Pos2,
    },
    /// Button released
    PointerUp {
        /// Screen position
        pos: Pos2,
        /// Which button
        button: PointerButton,
    },
    /// Mouse wheel; negative `delta` zooms in
    Wheel {
        /// Screen position
        pos: Pos2,
        /// Scroll amount
        delta: f32,
    },
    /// Key pressed
    Key {
        /// Which key
        key: Key,
        /// Held modifiers
        modifiers: Modifiers,
    },
}
