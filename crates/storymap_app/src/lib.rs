// SPDX-License-Identifier: MIT OR Apache-2.0
//! StoryMap editing session.
//!
//! Wraps the [`storymap_graph`] engine with everything needed to edit a
//! story map outside a browser:
//! - a key-value [`store`] for the canvas and view documents
//! - RON [`settings`]
//! - JSON import and export ([`transfer`])
//! - the input-driven [`session`]
//! - the `storymap` command line ([`cli`])

pub mod cli;
pub mod input;
pub mod session;
pub mod settings;
pub mod store;
pub mod transfer;

pub use input::{InputEvent, Key, Modifiers, PointerButton};
pub use session::{Gesture, Notice, Session, SessionError};
pub use settings::{Settings, SettingsError};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use transfer::TransferError;
