// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editing session: routes pointer and keyboard input into the graph and
//! persists after every change.
//!
//! ## Gestures
//!
//! | Input                               | Effect                          |
//! |-------------------------------------|---------------------------------|
//! | Ctrl+click empty canvas             | add a node                      |
//! | Shift+drag from empty canvas        | marquee selection               |
//! | Ctrl+click node, then click node    | create a connection             |
//! | click node                          | focus it                        |
//! | click connection                    | open its annotation bubble      |
//! | drag node / drag empty canvas       | move node / pan                 |
//! | right click node / right drag       | delete node(s) under pointer    |
//! | wheel                               | zoom at pointer                 |
//! | Escape                              | cancel, deselect, close bubbles |
//! | Delete, Backspace                   | delete selection                |
//! | Ctrl+A / Ctrl+C / Ctrl+V            | select all / copy / paste       |
//!
//! Only one gesture runs at a time; a press while another gesture is
//! active is ignored. A pending connection blocks marquee and erase but
//! not dragging or panning. Holding Ctrl on a node keeps it in place.

use crate::input::{InputEvent, Key, Modifiers, PointerButton};
use crate::settings::Settings;
use crate::store::{KeyValueStore, StoreError};
use crate::transfer::{self, TransferError};
use emath::{Pos2, Vec2};
use indexmap::IndexSet;
use std::fmt;
use std::path::Path;
use storymap_graph::{
    Clipboard, ConnectionId, DocumentError, Graph, GraphDocument, GraphError, GraphEvent, LinkOutcome,
    Linker, LoadReport, Node, NodeId, ViewDocument, Viewport,
};

/// Screen distance a press may travel and still count as a click
pub const CLICK_SLOP: f32 = 3.0;

/// Screen distance from a connection line that still hits it
pub const CONNECTION_HIT_TOLERANCE: f32 = 6.0;

/// Pointer gesture in progress
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    /// Nothing pressed
    #[default]
    Idle,
    /// Left button down, not yet a drag
    Pressed {
        /// Screen position of the press
        origin: Pos2,
        /// Node under the press
        node: Option<NodeId>,
        /// Modifiers at the press
        modifiers: Modifiers,
    },
    /// Dragging a node
    DragNode {
        /// The node being moved
        node: NodeId,
        /// Offset from the node's position to the grab point, in world units
        grab: Vec2,
    },
    /// Panning the canvas
    Pan {
        /// Last screen position applied
        last: Pos2,
    },
    /// Rubber-band selection
    Marquee,
    /// Right-button erase drag
    Erase {
        /// Nodes deleted so far
        erased: usize,
    },
}

impl Gesture {
    /// Whether releasing `button` ends this gesture
    fn ends_with(&self, button: PointerButton) -> bool {
        match self {
            Self::Idle => false,
            Self::Erase { .. } => button == PointerButton::Right,
            _ => button == PointerButton::Left,
        }
    }
}

/// User-visible message raised while handling input
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// The graph refused an edit
    Rejected(GraphError),
    /// An import was refused; the graph is unchanged
    ImportFailed(String),
    /// A document loaded with some connections skipped
    PartialLoad {
        /// Number of skipped connections
        skipped: usize,
    },
    /// The stored graph could not be read at startup
    LoadFailed(String),
    /// Saving to the store failed
    PersistFailed(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(err) => write!(f, "{err}"),
            Self::ImportFailed(message) => write!(f, "Import failed: {message}"),
            Self::PartialLoad { skipped } => write!(f, "{skipped} connection(s) could not be restored"),
            Self::LoadFailed(message) => write!(f, "Could not load saved canvas: {message}"),
            Self::PersistFailed(message) => write!(f, "Could not save canvas: {message}"),
        }
    }
}

/// Error from session persistence
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Document encoding failure
    #[error("Failed to encode document: {0}")]
    Json(#[from] serde_json::Error),
}

/// A story map being edited
pub struct Session<S: KeyValueStore> {
    store: S,
    settings: Settings,
    graph: Graph,
    viewport: Viewport,
    linker: Linker,
    clipboard: Clipboard,
    gesture: Gesture,
    /// Last known pointer position, screen space
    pointer: Pos2,
    /// Node shown in the info panel
    focused: Option<NodeId>,
    /// Connections whose annotation bubble is open
    open_annotations: IndexSet<ConnectionId>,
    notices: Vec<Notice>,
    render_queue: Vec<GraphEvent>,
}

impl<S: KeyValueStore> Session<S> {
    /// Open a session, restoring the graph and view from the store.
    ///
    /// A missing graph document starts an empty canvas. An unreadable one
    /// also starts empty and raises [`Notice::LoadFailed`]; it is only
    /// overwritten by the next edit.
    pub fn open(store: S, settings: Settings) -> Result<Self, SessionError> {
        let mut session = Self {
            graph: settings.new_graph(),
            store,
            settings,
            viewport: Viewport::new(),
            linker: Linker::new(),
            clipboard: Clipboard::new(),
            gesture: Gesture::Idle,
            pointer: Pos2::ZERO,
            focused: None,
            open_annotations: IndexSet::new(),
            notices: Vec::new(),
            render_queue: Vec::new(),
        };

        if let Some(text) = session.store.get(&session.settings.graph_key)? {
            match GraphDocument::parse(&text) {
                Ok(document) => {
                    let report = document.load_into(&mut session.graph);
                    session.report_skipped(&report);
                }
                Err(err) => {
                    tracing::warn!("Stored canvas is unreadable, starting empty: {err}");
                    session.notices.push(Notice::LoadFailed(err.to_string()));
                }
            }
        }

        if let Some(text) = session.store.get(&session.settings.view_key)? {
            match serde_json::from_str::<ViewDocument>(&text) {
                Ok(view) => session.viewport = Viewport::from_document(&view),
                Err(err) => tracing::warn!("Ignoring stored view state: {err}"),
            }
        }

        // Restoring is not an edit
        session.graph.take_dirty();
        session.render_queue = session.graph.take_events();
        tracing::info!(
            "Opened canvas with {} nodes and {} connections",
            session.graph.node_count(),
            session.graph.connection_count()
        );
        Ok(session)
    }

    // --- Accessors -------------------------------------------------------

    /// The graph
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Active settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The backing store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current pan and zoom
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Connection-creation state
    pub fn linker(&self) -> &Linker {
        &self.linker
    }

    /// Copy buffer
    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    /// Pointer gesture in progress
    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    /// Node shown in the info panel
    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// Connections whose annotation bubble is open, in opening order
    pub fn open_annotations(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.open_annotations.iter().copied()
    }

    /// Drain user-visible notices
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Drain graph changes for the renderer
    pub fn take_render_events(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.render_queue)
    }

    // --- Direct edits ----------------------------------------------------

    /// Apply an edit to the graph, then publish and persist its effects.
    ///
    /// Used by panels and the command line for edits that do not come from
    /// pointer input.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut Graph) -> R) -> R {
        let result = f(&mut self.graph);
        self.sync();
        result
    }

    /// Rename a node from the info panel, raising a notice on conflict
    pub fn rename_node(&mut self, node: NodeId, name: &str) -> Result<(), GraphError> {
        let name = name.trim();
        let result = self.edit(|g| g.rename_node(node, name));
        if let Err(err) = &result {
            self.notices.push(Notice::Rejected(err.clone()));
        }
        result
    }

    /// Focus a node and pan so it sits in the middle of the screen
    pub fn focus_node(&mut self, node: NodeId, screen_size: Vec2) -> bool {
        let Some(rect) = self.graph.node(node).map(Node::rect) else {
            return false;
        };
        self.focused = Some(node);
        self.viewport.center_on(rect, screen_size);
        self.persist_view();
        true
    }

    /// Open the annotation bubble of a connection
    pub fn open_annotation(&mut self, connection: ConnectionId) -> bool {
        self.graph.connection(connection).is_some() && self.open_annotations.insert(connection)
    }

    /// Close one annotation bubble
    pub fn close_annotation(&mut self, connection: ConnectionId) -> bool {
        self.open_annotations.shift_remove(&connection)
    }

    /// Delete a connection from its annotation bubble
    pub fn delete_connection(&mut self, connection: ConnectionId) -> bool {
        self.close_annotation(connection);
        self.edit(|g| g.delete_connection(connection)).is_some()
    }

    /// Close every annotation bubble
    pub fn close_all_annotations(&mut self) {
        self.open_annotations.clear();
    }

    // --- Import / export -------------------------------------------------

    /// Replace the canvas with a JSON document
    pub fn import_str(&mut self, text: &str) -> Result<LoadReport, DocumentError> {
        let result = transfer::import_str(&mut self.graph, text);
        self.finish_import(result)
    }

    /// Replace the canvas with a JSON file
    pub fn import_path(&mut self, path: &Path) -> Result<LoadReport, TransferError> {
        let result = transfer::import_path(&mut self.graph, path);
        self.finish_import(result)
    }

    /// Pretty JSON of the canvas
    pub fn export_document(&self) -> Result<String, DocumentError> {
        transfer::export_document(&self.graph)
    }

    /// Write the canvas to a JSON file
    pub fn export_to_path(&self, path: &Path) -> Result<(), TransferError> {
        transfer::export_to_path(&self.graph, path)
    }

    fn finish_import<E: fmt::Display>(&mut self, result: Result<LoadReport, E>) -> Result<LoadReport, E> {
        match &result {
            Ok(report) => {
                self.linker.cancel();
                self.gesture = Gesture::Idle;
                self.report_skipped(report);
                self.sync();
            }
            Err(err) => self.notices.push(Notice::ImportFailed(err.to_string())),
        }
        result
    }

    // --- Persistence -----------------------------------------------------

    /// Write both documents to the store
    pub fn save(&mut self) -> Result<(), SessionError> {
        self.save_graph()?;
        self.save_view()
    }

    fn save_graph(&self) -> Result<(), SessionError> {
        let json = serde_json::to_string(&GraphDocument::from_graph(&self.graph))?;
        self.store.set(&self.settings.graph_key, &json)?;
        Ok(())
    }

    fn save_view(&self) -> Result<(), SessionError> {
        let json = serde_json::to_string(&self.viewport.to_document())?;
        self.store.set(&self.settings.view_key, &json)?;
        Ok(())
    }

    fn persist_graph(&mut self) {
        if let Err(err) = self.save_graph() {
            tracing::warn!("Failed to persist canvas: {err}");
            self.notices.push(Notice::PersistFailed(err.to_string()));
        }
    }

    fn persist_view(&mut self) {
        if let Err(err) = self.save_view() {
            tracing::warn!("Failed to persist view: {err}");
            self.notices.push(Notice::PersistFailed(err.to_string()));
        }
    }

    fn report_skipped(&mut self, report: &LoadReport) {
        if !report.is_complete() {
            self.notices.push(Notice::PartialLoad {
                skipped: report.skipped.len(),
            });
        }
    }

    /// Forward graph events to the renderer, drop session state that
    /// refers to removed items, and persist if anything changed
    fn sync(&mut self) {
        for event in self.graph.take_events() {
            match event {
                GraphEvent::ConnectionRemoved(id) => {
                    self.open_annotations.shift_remove(&id);
                }
                GraphEvent::NodeRemoved(id) => {
                    if self.focused == Some(id) {
                        self.focused = None;
                    }
                    if self.linker.start_node() == Some(id) {
                        self.linker.cancel();
                    }
                }
                GraphEvent::Cleared => {
                    self.open_annotations.clear();
                    self.focused = None;
                    self.linker.cancel();
                }
                _ => {}
            }
            self.render_queue.push(event);
        }

        if self.graph.take_dirty() {
            self.persist_graph();
        }
    }

    // --- Input -----------------------------------------------------------

    /// Handle one input event
    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerDown { pos, button, modifiers } => self.pointer_down(pos, button, modifiers),
            InputEvent::PointerMove { pos } => self.pointer_move(pos),
            InputEvent::PointerUp { pos, button } => self.pointer_up(pos, button),
            InputEvent::Wheel { pos, delta } => self.wheel(pos, delta),
            InputEvent::Key { key, modifiers } => self.key(key, modifiers),
        }
        self.sync();
    }

    fn pointer_down(&mut self, pos: Pos2, button: PointerButton, modifiers: Modifiers) {
        self.pointer = pos;
        if self.gesture != Gesture::Idle {
            tracing::debug!("Ignoring press during {:?}", self.gesture);
            return;
        }

        let world = self.viewport.to_world(pos);
        let hit = self.graph.node_at(world);
        let linking = self.linker.is_active();

        match button {
            PointerButton::Left if hit.is_none() && modifiers.shift && !linking => {
                self.graph.start_marquee(world);
                self.gesture = Gesture::Marquee;
            }
            PointerButton::Left => {
                self.gesture = Gesture::Pressed {
                    origin: pos,
                    node: hit,
                    modifiers,
                };
            }
            PointerButton::Right if linking => {}
            PointerButton::Right => {
                let erased = hit.and_then(|node| self.graph.delete_node(node)).map_or(0, |_| 1);
                self.gesture = Gesture::Erase { erased };
            }
        }
    }

    fn pointer_move(&mut self, pos: Pos2) {
        self.pointer = pos;
        let world = self.viewport.to_world(pos);
        self.linker.pointer_moved(world);

        if let Gesture::Pressed { origin, node, modifiers } = self.gesture {
            if (pos - origin).length() <= CLICK_SLOP || (modifiers.ctrl && node.is_some()) {
                return;
            }
            let grabbed = node.and_then(|id| self.graph.node(id));
            self.gesture = match grabbed {
                Some(n) => Gesture::DragNode {
                    node: n.id,
                    grab: self.viewport.to_world(origin) - n.position,
                },
                None => Gesture::Pan { last: origin },
            };
        }

        match self.gesture {
            Gesture::DragNode { node, grab } => {
                if let Err(err) = self.graph.move_node(node, world - grab) {
                    tracing::warn!("Drag ended: {err}");
                    self.gesture = Gesture::Idle;
                }
            }
            Gesture::Pan { last } => {
                self.viewport.pan_by(pos - last);
                self.gesture = Gesture::Pan { last: pos };
            }
            Gesture::Marquee => self.graph.update_marquee(world),
            Gesture::Erase { erased } => {
                if let Some(node) = self.graph.node_at(world) {
                    self.graph.delete_node(node);
                    self.gesture = Gesture::Erase { erased: erased + 1 };
                }
            }
            Gesture::Idle | Gesture::Pressed { .. } => {}
        }
    }

    fn pointer_up(&mut self, pos: Pos2, button: PointerButton) {
        self.pointer = pos;
        if !self.gesture.ends_with(button) {
            return;
        }

        let world = self.viewport.to_world(pos);
        match std::mem::take(&mut self.gesture) {
            Gesture::Pressed { origin, node, modifiers } if (pos - origin).length() <= CLICK_SLOP => {
                self.click(world, node, modifiers)
            }
            Gesture::Pan { .. } => self.persist_view(),
            Gesture::Marquee => {
                self.graph.update_marquee(world);
                self.graph.finish_marquee();
            }
            Gesture::Erase { erased } if erased > 0 => tracing::info!("Erased {erased} nodes"),
            Gesture::Erase { .. } | Gesture::DragNode { .. } | Gesture::Pressed { .. } | Gesture::Idle => {}
        }
    }

    fn click(&mut self, world: Pos2, hit: Option<NodeId>, modifiers: Modifiers) {
        match hit {
            Some(node) if modifiers.ctrl || self.linker.is_active() => self.link(node),
            Some(node) => self.focused = Some(node),
            None if self.linker.is_active() => {}
            None if modifiers.ctrl => {
                let id = self.graph.add_node(world, "", "", "");
                tracing::info!("Created node {id}");
            }
            None => {
                let tolerance = CONNECTION_HIT_TOLERANCE / self.viewport.scale;
                if let Some(connection) = self.graph.connection_at(world, tolerance) {
                    self.open_annotation(connection);
                } else if self.settings.close_objects_on_canvas_click {
                    self.close_all_annotations();
                    self.graph.clear_selection();
                }
            }
        }
    }

    fn link(&mut self, node: NodeId) {
        match self.linker.click_node(&mut self.graph, node) {
            LinkOutcome::Created(id) => tracing::info!("Created connection {id}"),
            LinkOutcome::Rejected(err) => {
                tracing::warn!("Connection rejected: {err}");
                self.notices.push(Notice::Rejected(err));
            }
            LinkOutcome::Started(_) | LinkOutcome::Cancelled => {}
        }
    }

    fn wheel(&mut self, pos: Pos2, delta: f32) {
        self.pointer = pos;
        let s = &self.settings;
        self.viewport.zoom_at(pos, delta, s.zoom_step, s.min_scale, s.max_scale);
        self.persist_view();
    }

    fn key(&mut self, key: Key, modifiers: Modifiers) {
        match key {
            Key::Escape => self.escape(),
            Key::Delete | Key::Backspace => {
                if self.gesture == Gesture::Idle {
                    let removed = self.graph.delete_selected();
                    if removed > 0 {
                        tracing::info!("Deleted {removed} selected nodes");
                    }
                }
            }
            Key::A if modifiers.ctrl => self.graph.select_all(),
            Key::C if modifiers.ctrl => {
                self.clipboard.copy(&self.graph);
            }
            Key::V if modifiers.ctrl => {
                let anchor = self.viewport.to_world(self.pointer);
                self.clipboard.paste(&mut self.graph, anchor);
            }
            Key::A | Key::C | Key::V => {}
        }
    }

    fn escape(&mut self) {
        self.linker.cancel();
        if self.gesture == Gesture::Marquee {
            self.graph.cancel_marquee();
            self.gesture = Gesture::Idle;
        }
        self.graph.clear_selection();
        self.close_all_annotations();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use emath::{pos2, vec2};

    fn session() -> Session<MemoryStore> {
        Session::open(MemoryStore::new(), Settings::default()).unwrap()
    }

    fn press(session: &mut Session<MemoryStore>, pos: Pos2, button: PointerButton, modifiers: Modifiers) {
        session.handle_input(InputEvent::PointerDown { pos, button, modifiers });
    }

    fn release(session: &mut Session<MemoryStore>, pos: Pos2, button: PointerButton) {
        session.handle_input(InputEvent::PointerUp { pos, button });
    }

    fn move_to(session: &mut Session<MemoryStore>, pos: Pos2) {
        session.handle_input(InputEvent::PointerMove { pos });
    }

    fn click(session: &mut Session<MemoryStore>, pos: Pos2, modifiers: Modifiers) {
        press(session, pos, PointerButton::Left, modifiers);
        release(session, pos, PointerButton::Left);
    }

    fn key(session: &mut Session<MemoryStore>, key: Key, modifiers: Modifiers) {
        session.handle_input(InputEvent::Key { key, modifiers });
    }

    fn stored_document(session: &Session<MemoryStore>) -> GraphDocument {
        let text = session.store().get("canvasData").unwrap().unwrap();
        GraphDocument::parse(&text).unwrap()
    }

    /// Three nodes in a row, 200 units apart
    fn with_row(session: &mut Session<MemoryStore>) -> Vec<NodeId> {
        session.edit(|g| {
            (0..3)
                .map(|i| g.add_node(pos2(i as f32 * 200.0, 0.0), format!("N{i}"), "", ""))
                .collect()
        })
    }

    #[test]
    fn test_open_empty_store() {
        let mut session = session();
        assert_eq!(session.graph().node_count(), 0);
        assert!(session.take_notices().is_empty());
        assert_eq!(session.store().get("canvasData").unwrap(), None);
    }

    #[test]
    fn test_ctrl_click_canvas_adds_node_and_persists() {
        let mut session = session();
        click(&mut session, pos2(100.0, 100.0), Modifiers::CTRL);

        assert_eq!(session.graph().node_count(), 1);
        let node = session.graph().nodes().next().unwrap();
        assert_eq!(node.position, pos2(100.0, 100.0));
        assert_eq!(node.label(), "Name");
        assert_eq!(stored_document(&session).nodes.len(), 1);
        assert!(session
            .take_render_events()
            .iter()
            .any(|e| matches!(e, GraphEvent::NodeCreated(_))));
    }

    #[test]
    fn test_plain_click_canvas_adds_nothing() {
        let mut session = session();
        click(&mut session, pos2(100.0, 100.0), Modifiers::NONE);
        assert_eq!(session.graph().node_count(), 0);
    }

    #[test]
    fn test_ctrl_click_then_click_creates_connection() {
        let mut session = session();
        let ids = with_row(&mut session);

        click(&mut session, pos2(10.0, 10.0), Modifiers::CTRL);
        assert_eq!(session.linker().start_node(), Some(ids[0]));
        move_to(&mut session, pos2(150.0, 40.0));
        assert_eq!(session.linker().guide().unwrap().to, pos2(150.0, 40.0));

        click(&mut session, pos2(210.0, 10.0), Modifiers::NONE);
        assert!(!session.linker().is_active());
        let connection = session.graph().connections().next().unwrap();
        assert_eq!((connection.start_node, connection.end_node), (ids[0], ids[1]));
        assert_eq!(stored_document(&session).connections.len(), 1);
    }

    #[test]
    fn test_fourth_connection_raises_notice() {
        let mut session = session();
        let ids = with_row(&mut session);
        session.edit(|g| {
            for _ in 0..3 {
                g.create_connection(ids[0], ids[1], "", "").unwrap();
            }
        });

        click(&mut session, pos2(10.0, 10.0), Modifiers::CTRL);
        click(&mut session, pos2(210.0, 10.0), Modifiers::NONE);
        assert_eq!(session.graph().connection_count(), 3);
        assert_eq!(
            session.take_notices(),
            vec![Notice::Rejected(GraphError::TooManyConnections)]
        );
    }

    #[test]
    fn test_linking_cancelled_when_start_deleted() {
        let mut session = session();
        let ids = with_row(&mut session);
        click(&mut session, pos2(10.0, 10.0), Modifiers::CTRL);
        session.edit(|g| g.delete_node(ids[0]));
        assert!(!session.linker().is_active());
    }

    #[test]
    fn test_plain_click_focuses_node() {
        let mut session = session();
        let ids = with_row(&mut session);
        click(&mut session, pos2(410.0, 10.0), Modifiers::NONE);
        assert_eq!(session.focused(), Some(ids[2]));
        assert!(!session.linker().is_active());
    }

    #[test]
    fn test_small_jitter_is_still_a_click() {
        let mut session = session();
        let ids = with_row(&mut session);
        press(&mut session, pos2(10.0, 10.0), PointerButton::Left, Modifiers::NONE);
        move_to(&mut session, pos2(12.0, 11.0));
        release(&mut session, pos2(12.0, 11.0), PointerButton::Left);
        assert_eq!(session.focused(), Some(ids[0]));
        assert_eq!(session.graph().node(ids[0]).unwrap().position, pos2(0.0, 0.0));
    }

    #[test]
    fn test_drag_moves_node() {
        let mut session = session();
        let ids = with_row(&mut session);
        press(&mut session, pos2(10.0, 10.0), PointerButton::Left, Modifiers::NONE);
        move_to(&mut session, pos2(60.0, 30.0));
        assert!(matches!(session.gesture(), Gesture::DragNode { .. }));
        release(&mut session, pos2(60.0, 30.0), PointerButton::Left);

        assert_eq!(session.graph().node(ids[0]).unwrap().position, pos2(50.0, 20.0));
        assert_eq!(stored_document(&session).nodes[0].x, 50.0);
        assert_eq!(session.gesture(), Gesture::Idle);
    }

    #[test]
    fn test_drag_canvas_pans_and_persists_view() {
        let mut session = session();
        press(&mut session, pos2(500.0, 500.0), PointerButton::Left, Modifiers::NONE);
        move_to(&mut session, pos2(510.0, 505.0));
        move_to(&mut session, pos2(520.0, 510.0));
        release(&mut session, pos2(520.0, 510.0), PointerButton::Left);

        assert_eq!(session.viewport().offset, vec2(20.0, 10.0));
        let view: ViewDocument =
            serde_json::from_str(&session.store().get("canvasViewState").unwrap().unwrap()).unwrap();
        assert_eq!(view.position.x, 20.0);
        assert_eq!(view.position.y, 10.0);
    }

    #[test]
    fn test_marquee_selects_and_escape_clears() {
        let mut session = session();
        let ids = with_row(&mut session);
        session.edit(|g| g.add_node(pos2(0.0, 300.0), "Below", "", ""));

        press(&mut session, pos2(-10.0, -10.0), PointerButton::Left, Modifiers::SHIFT);
        move_to(&mut session, pos2(250.0, 50.0));
        assert!(session.graph().selection().marquee().is_some());
        release(&mut session, pos2(250.0, 50.0), PointerButton::Left);

        let selected: Vec<_> = session.graph().selection().iter().collect();
        assert_eq!(selected, vec![ids[0], ids[1]]);
        assert!(session.graph().selection().marquee().is_none());

        key(&mut session, Key::Escape, Modifiers::NONE);
        assert!(session.graph().selection().is_empty());
    }

    #[test]
    fn test_escape_cancels_marquee_and_linking() {
        let mut session = session();
        with_row(&mut session);
        click(&mut session, pos2(10.0, 10.0), Modifiers::CTRL);
        key(&mut session, Key::Escape, Modifiers::NONE);
        assert!(!session.linker().is_active());

        press(&mut session, pos2(-10.0, -10.0), PointerButton::Left, Modifiers::SHIFT);
        key(&mut session, Key::Escape, Modifiers::NONE);
        assert_eq!(session.gesture(), Gesture::Idle);
        assert!(session.graph().selection().marquee().is_none());
    }

    #[test]
    fn test_right_click_deletes_node() {
        let mut session = session();
        let ids = with_row(&mut session);
        press(&mut session, pos2(210.0, 10.0), PointerButton::Right, Modifiers::NONE);
        release(&mut session, pos2(210.0, 10.0), PointerButton::Right);
        assert!(session.graph().node(ids[1]).is_none());
        assert_eq!(session.graph().node_count(), 2);
    }

    #[test]
    fn test_erase_drag_deletes_nodes_passed_over() {
        let mut session = session();
        let ids = with_row(&mut session);
        session.edit(|g| g.create_connection(ids[0], ids[2], "", "").unwrap());

        press(&mut session, pos2(-50.0, -50.0), PointerButton::Right, Modifiers::NONE);
        move_to(&mut session, pos2(10.0, 10.0));
        move_to(&mut session, pos2(100.0, 10.0));
        move_to(&mut session, pos2(210.0, 10.0));
        release(&mut session, pos2(210.0, 10.0), PointerButton::Right);

        let left: Vec<_> = session.graph().node_ids().collect();
        assert_eq!(left, vec![ids[2]]);
        assert_eq!(session.graph().connection_count(), 0);
    }

    #[test]
    fn test_press_during_gesture_is_ignored() {
        let mut session = session();
        let ids = with_row(&mut session);
        press(&mut session, pos2(-10.0, -10.0), PointerButton::Left, Modifiers::SHIFT);
        press(&mut session, pos2(10.0, 10.0), PointerButton::Right, Modifiers::NONE);
        assert!(session.graph().node(ids[0]).is_some());
        // The right release does not end the marquee
        release(&mut session, pos2(10.0, 10.0), PointerButton::Right);
        assert_eq!(session.gesture(), Gesture::Marquee);
    }

    #[test]
    fn test_no_marquee_while_linking() {
        let mut session = session();
        with_row(&mut session);
        click(&mut session, pos2(10.0, 10.0), Modifiers::CTRL);
        press(&mut session, pos2(-10.0, -10.0), PointerButton::Left, Modifiers::SHIFT);
        assert!(session.graph().selection().marquee().is_none());
        release(&mut session, pos2(-10.0, -10.0), PointerButton::Left);
        assert!(session.linker().is_active());
    }

    #[test]
    fn test_wheel_zoom_is_restored_on_reopen() {
        let store = MemoryStore::new();
        let mut session = Session::open(store.clone(), Settings::default()).unwrap();
        with_row(&mut session);
        session.handle_input(InputEvent::Wheel {
            pos: pos2(100.0, 100.0),
            delta: -1.0,
        });
        let viewport = *session.viewport();
        assert!((viewport.scale - 1.05).abs() < 1e-6);

        let mut reopened = Session::open(store, Settings::default()).unwrap();
        assert_eq!(*reopened.viewport(), viewport);
        assert_eq!(reopened.graph().node_count(), 3);
        assert!(reopened.take_notices().is_empty());
        assert!(!reopened.graph().is_dirty());
    }

    #[test]
    fn test_unreadable_store_starts_empty() {
        let store = MemoryStore::new();
        store.set("canvasData", "{\"nodes\": 5}").unwrap();
        let mut session = Session::open(store, Settings::default()).unwrap();
        assert_eq!(session.graph().node_count(), 0);
        assert!(matches!(session.take_notices()[..], [Notice::LoadFailed(_)]));
    }

    #[test]
    fn test_delete_key_removes_selection() {
        let mut session = session();
        let ids = with_row(&mut session);
        click(&mut session, pos2(10.0, 10.0), Modifiers::NONE);
        session.edit(|g| g.replace_selection([ids[0], ids[1]]));
        key(&mut session, Key::Delete, Modifiers::NONE);
        assert_eq!(session.graph().node_count(), 1);
        assert_eq!(session.focused(), None);
    }

    #[test]
    fn test_copy_paste_at_pointer() {
        let mut session = session();
        session.edit(|g| {
            let a = g.add_node(pos2(10.0, 10.0), "A", "", "");
            let b = g.add_node(pos2(50.0, 10.0), "B", "", "");
            g.create_connection(a, b, "", "").unwrap();
        });
        key(&mut session, Key::A, Modifiers::CTRL);
        key(&mut session, Key::C, Modifiers::CTRL);
        move_to(&mut session, pos2(100.0, 100.0));
        key(&mut session, Key::V, Modifiers::CTRL);

        assert_eq!(session.graph().node_count(), 4);
        assert_eq!(session.graph().connection_count(), 2);
        let pasted: Vec<_> = session
            .graph()
            .selection()
            .iter()
            .map(|id| session.graph().node(id).unwrap().position)
            .collect();
        assert_eq!(pasted, vec![pos2(100.0, 100.0), pos2(140.0, 100.0)]);
    }

    #[test]
    fn test_annotation_closes_with_connection() {
        let mut session = session();
        let ids = with_row(&mut session);
        let connection = session.edit(|g| g.create_connection(ids[0], ids[1], "", "").unwrap());
        assert!(session.open_annotation(connection));
        assert!(!session.open_annotation(connection));

        session.edit(|g| g.delete_connection(connection));
        assert_eq!(session.open_annotations().count(), 0);
    }

    #[test]
    fn test_canvas_click_closes_objects_when_enabled() {
        let settings = Settings {
            close_objects_on_canvas_click: true,
            ..Settings::default()
        };
        let mut session = Session::open(MemoryStore::new(), settings).unwrap();
        let ids = with_row(&mut session);
        let connection = session.edit(|g| {
            g.select_all();
            g.create_connection(ids[0], ids[1], "", "").unwrap()
        });
        session.open_annotation(connection);

        click(&mut session, pos2(100.0, 300.0), Modifiers::NONE);
        assert_eq!(session.open_annotations().count(), 0);
        assert!(session.graph().selection().is_empty());
    }

    #[test]
    fn test_canvas_click_keeps_objects_by_default() {
        let mut session = session();
        let ids = with_row(&mut session);
        let connection = session.edit(|g| {
            g.select_all();
            g.create_connection(ids[0], ids[1], "", "").unwrap()
        });
        session.open_annotation(connection);

        click(&mut session, pos2(100.0, 300.0), Modifiers::NONE);
        assert_eq!(session.open_annotations().count(), 1);
        assert_eq!(session.graph().selection().len(), 3);
    }

    #[test]
    fn test_failed_import_keeps_canvas() {
        let mut session = session();
        with_row(&mut session);
        let result = session.import_str(r#"{"nodes":"not-an-array","connections":[]}"#);
        assert!(matches!(result, Err(DocumentError::Validation(_))));
        assert_eq!(session.graph().node_count(), 3);
        assert!(matches!(session.take_notices()[..], [Notice::ImportFailed(_)]));
    }

    #[test]
    fn test_import_replaces_canvas_and_resets_focus() {
        let mut session = session();
        let ids = with_row(&mut session);
        session.focus_node(ids[0], vec2(800.0, 600.0));

        let report = session
            .import_str(
                r#"{"nodes":[{"x":0,"y":0,"name":"A"},{"x":100,"y":0,"name":"B"}],
                    "connections":[{"startNodeId":0,"endNodeId":1},{"startNodeId":0,"endNodeId":9}]}"#,
            )
            .unwrap();
        assert_eq!(report.connections, 1);
        assert_eq!(session.focused(), None);
        assert_eq!(session.graph().node_count(), 2);
        assert_eq!(session.take_notices(), vec![Notice::PartialLoad { skipped: 1 }]);
        assert_eq!(stored_document(&session).nodes.len(), 2);
    }

    #[test]
    fn test_rename_conflict_raises_notice() {
        let mut session = session();
        let ids = with_row(&mut session);
        assert!(session.rename_node(ids[0], "N1").is_err());
        assert_eq!(
            session.take_notices(),
            vec![Notice::Rejected(GraphError::NameConflict("N1".to_string()))]
        );
        session.rename_node(ids[0], "Opening").unwrap();
        assert_eq!(stored_document(&session).nodes[0].name, "Opening");
    }

    #[test]
    fn test_rename_trims_whitespace() {
        let mut session = session();
        let ids = with_row(&mut session);
        assert_eq!(
            session.rename_node(ids[0], " N1 "),
            Err(GraphError::NameConflict("N1".to_string()))
        );
        session.rename_node(ids[0], "  Opening\t").unwrap();
        assert_eq!(session.graph().node(ids[0]).unwrap().name, "Opening");
        assert!(session.graph().find_by_name("Opening").is_some());
    }

    #[test]
    fn test_drag_canvas_while_linking_pans() {
        let mut session = session();
        let ids = with_row(&mut session);
        click(&mut session, pos2(10.0, 10.0), Modifiers::CTRL);

        press(&mut session, pos2(500.0, 500.0), PointerButton::Left, Modifiers::NONE);
        move_to(&mut session, pos2(560.0, 540.0));
        assert!(matches!(session.gesture(), Gesture::Pan { .. }));
        release(&mut session, pos2(560.0, 540.0), PointerButton::Left);

        assert_eq!(session.viewport().offset, vec2(60.0, 40.0));
        assert_eq!(session.linker().start_node(), Some(ids[0]));
        assert_eq!(session.graph().connection_count(), 0);
    }

    #[test]
    fn test_drag_node_while_linking_moves_it() {
        let mut session = session();
        let ids = with_row(&mut session);
        click(&mut session, pos2(10.0, 10.0), Modifiers::CTRL);

        press(&mut session, pos2(210.0, 10.0), PointerButton::Left, Modifiers::NONE);
        move_to(&mut session, pos2(260.0, 60.0));
        release(&mut session, pos2(260.0, 60.0), PointerButton::Left);

        assert_eq!(session.graph().node(ids[1]).unwrap().position, pos2(250.0, 50.0));
        assert_eq!(session.graph().connection_count(), 0);
        assert!(session.linker().is_active());

        // A click still finishes the connection
        click(&mut session, pos2(260.0, 60.0), Modifiers::NONE);
        assert_eq!(session.graph().connection_count(), 1);
    }

    #[test]
    fn test_ctrl_drag_keeps_node_in_place() {
        let mut session = session();
        let ids = with_row(&mut session);
        press(&mut session, pos2(210.0, 10.0), PointerButton::Left, Modifiers::CTRL);
        move_to(&mut session, pos2(260.0, 60.0));
        assert!(matches!(session.gesture(), Gesture::Pressed { .. }));
        release(&mut session, pos2(260.0, 60.0), PointerButton::Left);

        assert_eq!(session.graph().node(ids[1]).unwrap().position, pos2(200.0, 0.0));
        assert_eq!(session.viewport().offset, Vec2::ZERO);
        assert!(!session.linker().is_active());
        assert_eq!(session.gesture(), Gesture::Idle);
    }

    #[test]
    fn test_click_connection_opens_annotation() {
        let mut session = session();
        let ids = with_row(&mut session);
        let connection = session.edit(|g| g.create_connection(ids[0], ids[1], "", "").unwrap());
        let midpoint = session.graph().connection_midpoint(connection).unwrap();

        click(&mut session, midpoint + vec2(0.0, 2.0), Modifiers::NONE);
        assert_eq!(session.open_annotations().collect::<Vec<_>>(), vec![connection]);
        assert_eq!(session.graph().node_count(), 3);

        assert!(session.delete_connection(connection));
        assert_eq!(session.open_annotations().count(), 0);
        assert_eq!(session.graph().connection_count(), 0);
        assert!(stored_document(&session).connections.is_empty());
        assert!(!session.delete_connection(connection));
    }

    #[test]
    fn test_connection_hit_tolerance_is_screen_space() {
        let mut session = session();
        let ids = with_row(&mut session);
        let connection = session.edit(|g| g.create_connection(ids[0], ids[1], "", "").unwrap());
        let midpoint = session.graph().connection_midpoint(connection).unwrap();

        click(&mut session, midpoint + vec2(0.0, 5.0), Modifiers::NONE);
        assert_eq!(session.open_annotations().count(), 1);
        session.close_all_annotations();

        // Zoomed in, 12px off the line is under the world tolerance but
        // outside the screen one
        for _ in 0..20 {
            session.handle_input(InputEvent::Wheel { pos: Pos2::ZERO, delta: -1.0 });
        }
        let on_screen = session.viewport().to_screen(midpoint);
        click(&mut session, on_screen + vec2(0.0, 12.0), Modifiers::NONE);
        assert_eq!(session.open_annotations().count(), 0);
        click(&mut session, on_screen + vec2(0.0, 5.0), Modifiers::NONE);
        assert_eq!(session.open_annotations().count(), 1);
    }

    #[test]
    fn test_focus_node_centers_view() {
        let mut session = session();
        let ids = with_row(&mut session);
        assert!(session.focus_node(ids[2], vec2(800.0, 600.0)));
        let center = session.graph().node_center(ids[2]).unwrap();
        let on_screen = session.viewport().to_screen(center);
        assert!((on_screen - pos2(400.0, 300.0)).length() < 1e-3);
        assert!(!session.focus_node(NodeId::new(), vec2(800.0, 600.0)));
    }
}
