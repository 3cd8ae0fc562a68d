//! Headless interaction state machine.
//!
//! The renderer forwards pointer, wheel and button intents here in canvas
//! coordinates. All graph changes go through [`GraphStore`]; user-facing
//! messages are queued as [`Notice`]s and picked up by whoever draws them.

use std::collections::VecDeque;
use std::path::Path;

use crate::graph_utils::error::GraphError;
use crate::graph_utils::geometry::{Bounds, Point};
use crate::graph_utils::graph::{GraphStore, VertexId};
use crate::persistence::persist::{self, CodecError};
use crate::persistence::settings::ZoomAnchor;

pub const ZOOM_IN_FACTOR: f32 = 1.1;
pub const ZOOM_OUT_FACTOR: f32 = 0.9;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    pub fn factor(self) -> f32 {
        match self {
            ZoomDirection::In => ZOOM_IN_FACTOR,
            ZoomDirection::Out => ZOOM_OUT_FACTOR,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Mode {
    Idle,
    Connecting { first: Option<VertexId> },
    Deleting,
    MovingVertex { id: VertexId, grab_offset: Point },
    Panning { last: Point, button: PointerButton },
}

/// Accumulated view transform, reported to the renderer. Not persisted.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ViewState {
    pub pan: Point,
    pub zoom: f32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self { pan: Point::ORIGIN, zoom: 1.0 }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    fn new(level: NoticeLevel, title: &str, message: impl Into<String>) -> Self {
        Self { level, title: title.to_string(), message: message.into() }
    }
}

/// The UI side of blocking dialogs. `prompt_text` may take as long as the
/// user needs; `None` means the dialog was cancelled.
pub trait UiHost {
    fn prompt_text(&mut self, title: &str, initial: &str) -> Option<String>;
    fn notify(&mut self, notice: &Notice);
}

pub struct InteractionController {
    store: GraphStore,
    mode: Mode,
    // Mode to go back to once a pan gesture ends
    resume: Mode,
    view: ViewState,
    zoom_anchor: ZoomAnchor,
    notices: VecDeque<Notice>,
}

impl InteractionController {
    pub fn new(store: GraphStore, zoom_anchor: ZoomAnchor) -> Self {
        Self {
            store,
            mode: Mode::Idle,
            resume: Mode::Idle,
            view: ViewState::default(),
            zoom_anchor,
            notices: VecDeque::new(),
        }
    }

    pub fn store(&self) -> &GraphStore { &self.store }
    pub fn mode(&self) -> Mode { self.mode }
    pub fn view(&self) -> ViewState { self.view }
    pub fn zoom_anchor(&self) -> ZoomAnchor { self.zoom_anchor }

    pub fn set_zoom_anchor(&mut self, anchor: ZoomAnchor) {
        self.zoom_anchor = anchor;
    }

    // The renderer reports its canvas size so new vertices land on screen
    pub fn set_canvas_size(&mut self, width: f32, height: f32) {
        let bounds = Bounds::from_size(width, height);
        if self.store.placement_bounds() != bounds {
            self.store.set_placement_bounds(bounds);
        }
    }

    fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            log::debug!("mode {:?} -> {:?}", self.mode, mode);
        }
        self.mode = mode;
    }

    fn push_notice(&mut self, notice: Notice) {
        log::debug!("notice [{:?}] {}: {}", notice.level, notice.title, notice.message);
        self.notices.push_back(notice);
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    pub fn flush_notices(&mut self, host: &mut dyn UiHost) {
        for notice in self.notices.drain(..) {
            host.notify(&notice);
        }
    }

    // Mode selection from toolbar buttons

    pub fn begin_connect(&mut self) {
        self.set_mode(Mode::Connecting { first: None });
        self.push_notice(Notice::new(
            NoticeLevel::Info,
            "Connect vertices",
            "Click the first vertex, then the second to draw an arrow.",
        ));
    }

    pub fn begin_delete(&mut self) {
        self.set_mode(Mode::Deleting);
        self.push_notice(Notice::new(
            NoticeLevel::Info,
            "Delete element",
            "Click a vertex or an arrow to delete it.",
        ));
    }

    pub fn cancel(&mut self) {
        self.resume = Mode::Idle;
        self.set_mode(Mode::Idle);
    }

    // Pointer handling

    pub fn pointer_pressed(&mut self, pos: Point, button: PointerButton) {
        if button != PointerButton::Primary {
            self.start_pan(pos, button);
            return;
        }
        match self.mode {
            Mode::Connecting { first } => self.connect_click(pos, first),
            Mode::Deleting => self.delete_click(pos),
            Mode::Idle => {
                if let Some(id) = self.store.vertex_at(pos) {
                    if let Some(v) = self.store.vertex(id) {
                        let grab_offset = Point::new(pos.x - v.position.x, pos.y - v.position.y);
                        self.set_mode(Mode::MovingVertex { id, grab_offset });
                    }
                }
            }
            Mode::MovingVertex { .. } | Mode::Panning { .. } => {}
        }
    }

    pub fn pointer_dragged(&mut self, pos: Point) {
        match self.mode {
            Mode::MovingVertex { id, grab_offset } => {
                if let Err(e) = self.store.move_vertex(id, pos.x - grab_offset.x, pos.y - grab_offset.y) {
                    log::warn!("dropping move gesture: {e}");
                    self.set_mode(Mode::Idle);
                }
            }
            Mode::Panning { last, button } => {
                let (dx, dy) = (pos.x - last.x, pos.y - last.y);
                if dx != 0.0 || dy != 0.0 {
                    self.store.translate(dx, dy);
                    self.view.pan = self.view.pan.offset(dx, dy);
                }
                self.mode = Mode::Panning { last: pos, button };
            }
            _ => {}
        }
    }

    pub fn pointer_released(&mut self, button: PointerButton) {
        match self.mode {
            Mode::MovingVertex { .. } if button == PointerButton::Primary => self.set_mode(Mode::Idle),
            Mode::Panning { button: pan_button, .. } if pan_button == button => {
                let resume = std::mem::replace(&mut self.resume, Mode::Idle);
                self.set_mode(resume);
            }
            _ => {}
        }
    }

    fn start_pan(&mut self, pos: Point, button: PointerButton) {
        match self.mode {
            // Finish the current gesture first
            Mode::MovingVertex { .. } | Mode::Panning { .. } => {}
            other => {
                self.resume = other;
                self.set_mode(Mode::Panning { last: pos, button });
            }
        }
    }

    fn connect_click(&mut self, pos: Point, first: Option<VertexId>) {
        let Some(hit) = self.store.vertex_at(pos) else {
            return;
        };
        let Some(first) = first else {
            self.set_mode(Mode::Connecting { first: Some(hit) });
            return;
        };
        if first == hit {
            self.push_notice(Notice::new(
                NoticeLevel::Info,
                "Connect vertices",
                "Pick a different vertex as the arrow target.",
            ));
            return;
        }
        match self.store.connect(first, hit) {
            Ok(_) => {}
            Err(e) if e.is_duplicate() => {
                self.push_notice(Notice::new(
                    NoticeLevel::Info,
                    "Connection exists",
                    "These vertices are already connected.",
                ));
            }
            Err(e) => self.report_error("Connect vertices", &e),
        }
        self.set_mode(Mode::Idle);
    }

    fn delete_click(&mut self, pos: Point) {
        // Vertices win over arrows so a click inside a circle cascades
        let result = if let Some(id) = self.store.vertex_at(pos) {
            self.store.delete_vertex(id)
        } else if let Some(id) = self.store.connection_at(pos) {
            self.store.delete_connection(id)
        } else {
            return;
        };
        if let Err(e) = result {
            self.report_error("Delete element", &e);
        }
        self.set_mode(Mode::Idle);
    }

    /// One wheel notch; rescales the whole graph about the configured anchor.
    pub fn scroll(&mut self, direction: ZoomDirection, cursor: Point) {
        let factor = direction.factor();
        let anchor = match self.zoom_anchor {
            ZoomAnchor::Origin => Point::ORIGIN,
            ZoomAnchor::Cursor => cursor,
        };
        self.view.zoom *= factor;
        self.store.rescale(factor, anchor);
        if let Mode::MovingVertex { id, grab_offset } = self.mode {
            let grab_offset = Point::new(grab_offset.x * factor, grab_offset.y * factor);
            self.mode = Mode::MovingVertex { id, grab_offset };
        }
    }

    /// Vertex to open the text editor for. Editing is only offered while no
    /// connect or delete gesture is pending.
    pub fn double_clicked(&self, pos: Point) -> Option<VertexId> {
        match self.mode {
            Mode::Idle | Mode::MovingVertex { .. } => self.store.vertex_at(pos),
            _ => None,
        }
    }

    // Text dialog results

    pub fn submit_new_vertex(&mut self, text: Option<String>) -> Option<VertexId> {
        let text = text?;
        match self.store.add_vertex(text, None) {
            Ok(id) => Some(id),
            Err(e) => {
                self.report_error("Add vertex", &e);
                None
            }
        }
    }

    pub fn submit_edit(&mut self, id: VertexId, text: Option<String>) -> bool {
        let Some(text) = text else {
            return false;
        };
        match self.store.edit_vertex_text(id, text) {
            Ok(()) => true,
            Err(e) => {
                self.report_error("Edit vertex", &e);
                false
            }
        }
    }

    // Blocking dialog flows

    pub fn add_vertex_via(&mut self, host: &mut dyn UiHost) -> Option<VertexId> {
        let text = host.prompt_text("Add vertex", "");
        let id = self.submit_new_vertex(text);
        self.flush_notices(host);
        id
    }

    pub fn edit_vertex_via(&mut self, host: &mut dyn UiHost, pos: Point) -> bool {
        let Some(id) = self.double_clicked(pos) else {
            return false;
        };
        let current = self.store.vertex(id).map(|v| v.note.clone()).unwrap_or_default();
        let text = host.prompt_text("Edit vertex", &current);
        let edited = self.submit_edit(id, text);
        self.flush_notices(host);
        edited
    }

    fn report_error(&mut self, title: &str, error: &GraphError) {
        let level = if error.is_validation() || error.is_duplicate() {
            NoticeLevel::Warning
        } else {
            log::error!("{title}: {error}");
            NoticeLevel::Error
        };
        self.push_notice(Notice::new(level, title, error.to_string()));
    }

    // Session boundaries

    pub fn save(&mut self, path: &Path) -> Result<(), CodecError> {
        persist::save_to_path(&self.store, path).inspect_err(|e| {
            log::error!("saving {} failed: {e}", path.display());
            self.push_notice(Notice::new(NoticeLevel::Error, "Save failed", e.to_string()));
        })
    }

    /// Replace the graph with the file's contents, or an empty graph when it
    /// cannot be read. The view transform starts over either way.
    pub fn load(&mut self, path: &Path) {
        let outcome = persist::load_or_empty(path);
        let bounds = self.store.placement_bounds();
        self.store = outcome.store;
        self.store.set_placement_bounds(bounds);
        self.view = ViewState::default();
        self.resume = Mode::Idle;
        self.mode = Mode::Idle;
        if let Some(error) = outcome.error {
            let mut message = format!("Starting with an empty graph ({error}).");
            if let Some(moved) = outcome.quarantined {
                message.push_str(&format!(" The unreadable file was kept as {}.", moved.display()));
            }
            self.push_notice(Notice::new(NoticeLevel::Warning, "Load failed", message));
        }
    }
}
