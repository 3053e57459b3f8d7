// SPDX-License-Identifier: MIT OR Apache-2.0
//! Story map graph model.
//!
//! A story map is a canvas of named nodes joined by directed, annotated
//! connections. This crate holds everything that does not depend on a
//! host surface:
//! - the [`Graph`] store with its structural invariants
//! - binding-slot allocation for parallel connections
//! - selection, marquee and the two-click [`Linker`]
//! - the [`Clipboard`]
//! - the screen/world [`Viewport`] transform
//! - the persisted [`GraphDocument`] format
//!
//! ## Architecture
//!
//! All mutation goes through [`Graph`], which keeps a dirty flag for
//! persistence and a queue of [`GraphEvent`]s for whatever draws the
//! canvas. Interaction state machines borrow the graph per call and never
//! hold references into it.

pub mod binding;
pub mod clipboard;
pub mod connection;
pub mod document;
pub mod event;
pub mod graph;
pub mod label;
pub mod linking;
pub mod node;
pub mod selection;
pub mod viewport;

pub use binding::{Binding, BindingPoints, MAX_CONNECTIONS_PER_PAIR};
pub use clipboard::{ClipBuffer, Clipboard};
pub use connection::{Connection, ConnectionId, NodePair};
pub use document::{DocumentError, GraphDocument, LoadReport};
pub use event::GraphEvent;
pub use graph::{Graph, GraphError};
pub use label::LabelStyle;
pub use linking::{GuideLine, LinkOutcome, LinkState, Linker};
pub use node::{Node, NodeId};
pub use selection::{Marquee, Selection};
pub use viewport::{ViewDocument, Viewport};
