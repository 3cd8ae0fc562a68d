#![allow(clippy::collapsible_if)]
use std::path::PathBuf;
use std::time::{Duration, Instant};

use egui::{Color32, Pos2, Rect, Sense, Shape, Stroke, Vec2};

use crate::graph_utils::error::MAX_NOTE_CHARS;
use crate::graph_utils::geometry::{self, Point, FONT_SIZE, WRAP_WIDTH};
use crate::graph_utils::graph::VertexId;
use crate::gui::controller::{
    InteractionController, Mode, Notice, NoticeLevel, PointerButton, ZoomDirection,
};
use crate::persistence::settings::ZoomAnchor;

const VERTEX_FILL: Color32 = Color32::from_rgb(173, 216, 230);
const VERTEX_STROKE: Stroke = Stroke { width: 1.0, color: Color32::BLACK };
const PENDING_STROKE: Stroke = Stroke { width: 2.5, color: Color32::from_rgb(255, 160, 40) };
const ARROW_STROKE: Stroke = Stroke { width: 1.5, color: Color32::BLACK };
const CANVAS_FILL: Color32 = Color32::WHITE;
const TOAST_LIFETIME: Duration = Duration::from_secs(4);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum PromptTarget {
    NewVertex,
    Edit(VertexId),
}

// Open text dialog; egui cannot block, so the answer is delivered on a later frame
struct TextPrompt {
    target: PromptTarget,
    text: String,
    focus_requested: bool,
}

pub struct GraphApp {
    controller: InteractionController,
    data_file: PathBuf,
    prompt: Option<TextPrompt>,
    toasts: Vec<(Notice, Instant)>,
}

impl GraphApp {
    pub fn new(controller: InteractionController, data_file: PathBuf) -> Self {
        Self { controller, data_file, prompt: None, toasts: Vec::new() }
    }

    fn open_prompt(&mut self, target: PromptTarget) {
        let text = match target {
            PromptTarget::NewVertex => String::new(),
            PromptTarget::Edit(id) => self
                .controller
                .store()
                .vertex(id)
                .map(|v| v.note.clone())
                .unwrap_or_default(),
        };
        self.prompt = Some(TextPrompt { target, text, focus_requested: false });
    }

    fn finish_prompt(&mut self, answer: Option<String>) {
        let Some(prompt) = self.prompt.take() else { return };
        match prompt.target {
            PromptTarget::NewVertex => { self.controller.submit_new_vertex(answer); }
            PromptTarget::Edit(id) => { self.controller.submit_edit(id, answer); }
        }
    }

    fn save_now(&mut self) {
        // Failures are queued as notices by the controller
        let _ = self.controller.save(&self.data_file);
    }

    fn show_sidebar(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("tools_panel")
            .resizable(false)
            .exact_width(150.0)
            .show(ctx, |ui| {
                ui.add_space(10.0);
                let full = egui::vec2(ui.available_width(), 28.0);
                if ui.add_sized(full, egui::Button::new("Add vertex")).clicked() {
                    self.open_prompt(PromptTarget::NewVertex);
                }
                ui.add_space(6.0);
                if ui.add_sized(full, egui::Button::new("Connect vertices")).clicked() {
                    self.controller.begin_connect();
                }
                ui.add_space(6.0);
                if ui.add_sized(full, egui::Button::new("Delete element")).clicked() {
                    self.controller.begin_delete();
                }
                ui.add_space(6.0);
                if ui.add_sized(full, egui::Button::new("Save now")).clicked() {
                    self.save_now();
                }
                ui.add_space(6.0);
                let mut at_cursor = self.controller.zoom_anchor() == ZoomAnchor::Cursor;
                if ui.checkbox(&mut at_cursor, "Zoom at cursor").changed() {
                    let anchor = if at_cursor { ZoomAnchor::Cursor } else { ZoomAnchor::Origin };
                    self.controller.set_zoom_anchor(anchor);
                }
                ui.separator();
                let mode = match self.controller.mode() {
                    Mode::Idle => "Idle",
                    Mode::Connecting { first: None } => "Connect: pick source",
                    Mode::Connecting { first: Some(_) } => "Connect: pick target",
                    Mode::Deleting => "Delete: pick element",
                    Mode::MovingVertex { .. } => "Moving",
                    Mode::Panning { .. } => "Panning",
                };
                ui.small(format!("Mode: {mode}"));
                let view = self.controller.view();
                ui.small(format!("Zoom: {:.2}x", view.zoom));
                ui.small(format!("Pan: {:.0}, {:.0}", view.pan.x, view.pan.y));
                let store = self.controller.store();
                ui.small(format!("{} vertices, {} arrows", store.vertex_count(), store.connection_count()));
            });
    }

    fn show_prompt(&mut self, ctx: &egui::Context) {
        let Some(prompt) = self.prompt.as_mut() else { return };
        let title = match prompt.target {
            PromptTarget::NewVertex => "Add vertex",
            PromptTarget::Edit(_) => "Edit vertex",
        };
        let mut answer: Option<Option<String>> = None;
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(format!("Note text (max. {MAX_NOTE_CHARS} characters):"));
                let resp = ui.add(
                    egui::TextEdit::singleline(&mut prompt.text)
                        .char_limit(MAX_NOTE_CHARS)
                        .desired_width(260.0),
                );
                if !prompt.focus_requested {
                    resp.request_focus();
                    prompt.focus_requested = true;
                }
                let enter = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                ui.horizontal(|ui| {
                    if ui.button("OK").clicked() || enter {
                        answer = Some(Some(prompt.text.clone()));
                    }
                    if ui.button("Cancel").clicked() {
                        answer = Some(None);
                    }
                });
            });
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            answer = Some(None);
        }
        if let Some(answer) = answer {
            self.finish_prompt(answer);
        }
    }

    fn show_canvas(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(CANVAS_FILL))
            .show(ctx, |ui| {
                let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
                let rect = response.rect;
                self.controller.set_canvas_size(rect.width(), rect.height());

                let prompt_open = self.prompt.is_some();
                self.handle_input(ui, &response, rect, prompt_open);
                self.paint(&painter, rect);
            });
    }

    // While a prompt is open only releases get through, so a gesture that
    // started before the dialog still ends
    fn handle_input(&mut self, ui: &egui::Ui, response: &egui::Response, rect: Rect, prompt_open: bool) {
        let to_canvas = |p: Pos2| Point::new(p.x - rect.min.x, p.y - rect.min.y);

        let (buttons, latest, moved, scroll, escape) = ui.input(|i| {
            let buttons: Vec<(Pos2, egui::PointerButton, bool)> = i
                .events
                .iter()
                .filter_map(|e| match e {
                    egui::Event::PointerButton { pos, button, pressed, .. } => Some((*pos, *button, *pressed)),
                    _ => None,
                })
                .collect();
            (
                buttons,
                i.pointer.latest_pos(),
                i.pointer.delta() != Vec2::ZERO,
                i.raw_scroll_delta.y,
                i.key_pressed(egui::Key::Escape),
            )
        });

        for (pos, button, pressed) in buttons {
            let Some(button) = map_button(button) else { continue };
            let on_canvas = rect.contains(pos) && response.hovered();
            match route_button(pressed, on_canvas, prompt_open) {
                Some(ButtonRoute::Press) => self.controller.pointer_pressed(to_canvas(pos), button),
                Some(ButtonRoute::Release) => self.controller.pointer_released(button),
                None => {}
            }
        }

        if prompt_open {
            return;
        }

        if escape {
            self.controller.cancel();
        }

        if moved {
            if let Some(pos) = latest {
                self.controller.pointer_dragged(to_canvas(pos));
            }
        }

        if response.hovered() && scroll != 0.0 {
            if let Some(pos) = latest {
                let direction = if scroll > 0.0 { ZoomDirection::In } else { ZoomDirection::Out };
                self.controller.scroll(direction, to_canvas(pos));
            }
        }

        if response.double_clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                if let Some(id) = self.controller.double_clicked(to_canvas(pos)) {
                    self.open_prompt(PromptTarget::Edit(id));
                }
            }
        }
    }

    fn paint(&self, painter: &egui::Painter, rect: Rect) {
        let to_screen = |p: Point| Pos2::new(p.x + rect.min.x, p.y + rect.min.y);
        let store = self.controller.store();
        let zoom = self.controller.view().zoom;

        for c in store.connections() {
            draw_arrow(painter, to_screen(c.arrow.start), to_screen(c.arrow.end), zoom);
        }

        let pending = match self.controller.mode() {
            Mode::Connecting { first } => first,
            _ => None,
        };
        for v in store.vertices() {
            let center = to_screen(v.position);
            let stroke = if pending == Some(v.id) { PENDING_STROKE } else { VERTEX_STROKE };
            painter.circle(center, v.radius, VERTEX_FILL, stroke);
            let label = geometry::wrap_note(&v.note, WRAP_WIDTH).join("\n");
            let font = egui::FontId::proportional(label_font_size(&v.note, v.radius));
            painter.text(center, egui::Align2::CENTER_CENTER, label, font, Color32::BLACK);
        }
    }

    fn show_toasts(&mut self, ctx: &egui::Context) {
        let now = Instant::now();
        for notice in self.controller.take_notices() {
            self.toasts.push((notice, now));
        }
        self.toasts.retain(|(_, at)| now.duration_since(*at) <= TOAST_LIFETIME);
        if self.toasts.is_empty() {
            return;
        }
        let margin = egui::vec2(12.0, 12.0);
        egui::Area::new("bottom_right_toast".into())
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-margin.x, -margin.y))
            .interactable(false)
            .show(ctx, |ui| {
                for (notice, _) in &self.toasts {
                    let text_col = match notice.level {
                        NoticeLevel::Info => Color32::LIGHT_GREEN,
                        NoticeLevel::Warning => Color32::YELLOW,
                        NoticeLevel::Error => Color32::from_rgb(255, 110, 110),
                    };
                    egui::Frame::popup(ui.style())
                        .corner_radius(egui::CornerRadius::same(8))
                        .fill(Color32::from_rgba_premultiplied(30, 30, 30, 230))
                        .inner_margin(egui::Margin::symmetric(12, 8))
                        .show(ui, |ui| {
                            ui.colored_label(text_col, egui::RichText::new(&notice.title).strong());
                            ui.colored_label(Color32::from_gray(220), &notice.message);
                        });
                }
            });
        ctx.request_repaint_after(Duration::from_millis(250));
    }
}

impl eframe::App for GraphApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.show_sidebar(ctx);
        self.show_canvas(ctx);
        self.show_prompt(ctx);
        self.show_toasts(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        // The process exits regardless; a failed save is logged by the controller
        if self.controller.save(&self.data_file).is_err() {
            log::error!("graph was not saved to {}", self.data_file.display());
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ButtonRoute {
    Press,
    Release,
}

// Presses count only on the canvas with no dialog open; releases always end a gesture
fn route_button(pressed: bool, on_canvas: bool, prompt_open: bool) -> Option<ButtonRoute> {
    match (pressed, on_canvas && !prompt_open) {
        (true, true) => Some(ButtonRoute::Press),
        (true, false) => None,
        (false, _) => Some(ButtonRoute::Release),
    }
}

// Zoom is baked into the stored radius, so the label scales with it and not
// with the session's view zoom (which starts over at 1 after a load)
fn label_font_size(note: &str, radius: f32) -> f32 {
    let scale = radius / geometry::radius_for_note(note);
    (FONT_SIZE * 1.2 * scale).clamp(5.0, 48.0)
}

fn map_button(button: egui::PointerButton) -> Option<PointerButton> {
    match button {
        egui::PointerButton::Primary => Some(PointerButton::Primary),
        egui::PointerButton::Secondary => Some(PointerButton::Secondary),
        egui::PointerButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

fn draw_arrow(painter: &egui::Painter, from: Pos2, to: Pos2, zoom: f32) {
    painter.line_segment([from, to], ARROW_STROKE);

    let direction = to - from;
    let len = direction.length().max(1.0);
    let unit = direction / len;
    let head_length = (10.0 * zoom).clamp(4.0, 24.0);
    let head_half_width = head_length * 0.5;

    let base = to - unit * head_length;
    let normal = egui::vec2(-unit.y, unit.x);
    painter.add(Shape::convex_polygon(
        vec![to, base + normal * head_half_width, base - normal * head_half_width],
        ARROW_STROKE.color,
        Stroke::NONE,
    ));
}
