use eframe::egui::{
    self, pos2, vec2, Align2, Color32, FontId, PointerButton, Pos2, Rect, Response, Sense, Stroke,
    Ui, Widget,
};

use crate::diagram::PersistenceDiagram;
use crate::error::RenderError;
use crate::render::PassStatus;
use crate::surface::{Layer, Mark};
use crate::themes::{DiagramStyle, Styled};

fn resolve(color: Color32, layer: Layer, style: &DiagramStyle) -> Color32 {
    if color == Color32::TRANSPARENT {
        style.layer_color(layer)
    } else {
        color
    }
}

/// Paints the diagram's canvas and feeds pointer input into its brush.
#[must_use = "You should put this widget in a ui with `ui.add(widget);`"]
pub struct DiagramCanvas<'a> {
    diagram: &'a mut PersistenceDiagram,
    diagram_style: Option<DiagramStyle>,
}

impl<'a> DiagramCanvas<'a> {
    pub fn new(diagram: &'a mut PersistenceDiagram) -> Self {
        Self {
            diagram,
            diagram_style: None,
        }
    }

    fn brush_from_response(diagram: &mut PersistenceDiagram, response: &Response, rect: Rect) {
        let pointer_x = response.interact_pointer_pos().map(|pos| pos.x - rect.left());
        if response.drag_started_by(PointerButton::Primary) {
            if let Some(x) = pointer_x {
                diagram.brush_start(x);
            }
        }
        if response.dragged_by(PointerButton::Primary) {
            if let Some(x) = pointer_x {
                diagram.brush_move(x);
            }
        }
        if response.drag_stopped_by(PointerButton::Primary) {
            diagram.brush_end();
        }
        if response.secondary_clicked() {
            diagram.clear_selection();
        }
    }

    /// Follows the raw pointer so that containers underneath still see the
    /// drag.
    fn brush_from_input(diagram: &mut PersistenceDiagram, ui: &Ui, rect: Rect) {
        let pointer = ui.input(|input| PointerSnapshot {
            pos: input.pointer.interact_pos(),
            pressed: input.pointer.primary_pressed(),
            down: input.pointer.primary_down(),
            released: input.pointer.primary_released(),
            secondary: input.pointer.secondary_pressed(),
        });
        let brushing = diagram.brush_span().is_some();
        for step in brush_steps(pointer, rect, brushing) {
            match step {
                BrushStep::Start(x) => diagram.brush_start(x),
                BrushStep::Move(x) => diagram.brush_move(x),
                BrushStep::End => {
                    diagram.brush_end();
                }
                BrushStep::Clear => diagram.clear_selection(),
            }
        }
    }
}

/// Pointer state of one frame, as read from `egui::PointerState`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct PointerSnapshot {
    pos: Option<Pos2>,
    pressed: bool,
    down: bool,
    released: bool,
    secondary: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum BrushStep {
    Start(f32),
    Move(f32),
    End,
    Clear,
}

/// What one frame of raw pointer input does to the brush. `brushing` is
/// whether a brush was already active before this frame; x positions are
/// relative to `rect`.
fn brush_steps(pointer: PointerSnapshot, rect: Rect, brushing: bool) -> Vec<BrushStep> {
    let Some(pos) = pointer.pos else {
        return Vec::new();
    };
    let inside = rect.contains(pos);
    let x = pos.x - rect.left();
    let mut steps = Vec::new();

    let started = pointer.pressed && inside;
    if started {
        steps.push(BrushStep::Start(x));
    } else if pointer.down && brushing {
        steps.push(BrushStep::Move(x));
    }
    if pointer.released && (brushing || started) {
        steps.push(BrushStep::End);
    }
    if pointer.secondary && inside {
        steps.push(BrushStep::Clear);
    }
    steps
}

impl Widget for DiagramCanvas<'_> {
    fn ui(self, ui: &mut Ui) -> Response {
        let DiagramCanvas {
            diagram,
            diagram_style,
        } = self;

        let style = diagram_style.unwrap_or_else(|| DiagramStyle::from(ui.style().as_ref()));
        let options = diagram.options();
        let size = vec2(options.canvas_width, options.canvas_height);
        let brushing = options.enable_selection_filter;
        let stop_propagation = options.selection_stop_propagation;

        let sense = if brushing && stop_propagation {
            Sense::click_and_drag()
        } else {
            Sense::hover()
        };
        let (rect, response) = ui.allocate_exact_size(size, sense);

        if brushing {
            if stop_propagation {
                Self::brush_from_response(diagram, &response, rect);
            } else {
                Self::brush_from_input(diagram, ui, rect);
            }
        }

        let status = diagram.pass_status();
        if matches!(status, PassStatus::Running) {
            ui.ctx().request_repaint();
        }
        if !ui.is_rect_visible(rect) {
            return response;
        }

        let painter = ui.painter().with_clip_rect(rect);
        painter.rect_filled(rect, 0.0, style.background);

        let offset = rect.min.to_vec2();
        {
            let canvas = diagram.canvas().lock();
            for (layer, mark) in canvas.iter() {
                match mark {
                    Mark::Segment { points, stroke } => {
                        let color = resolve(stroke.color, layer, &style);
                        painter.line_segment(
                            [points[0] + offset, points[1] + offset],
                            Stroke::new(stroke.width, color),
                        );
                    }
                    Mark::Text {
                        pos,
                        anchor,
                        text,
                        size,
                        color,
                    } => {
                        painter.text(
                            *pos + offset,
                            *anchor,
                            text,
                            FontId::proportional(*size),
                            resolve(*color, layer, &style),
                        );
                    }
                }
            }
        }

        if let (Some(span), Ok(mapping)) = (diagram.brush_span(), diagram.mapping()) {
            let drawable = mapping.drawable().translate(offset);
            let brush = Rect::from_min_max(
                pos2(rect.left() + span.min, drawable.top()),
                pos2(rect.left() + span.max, drawable.bottom()),
            );
            painter.rect_filled(brush, 0.0, style.selection_fill);
            painter.rect_stroke(
                brush,
                0.0,
                Stroke::new(1.0, style.accent),
                egui::StrokeKind::Inside,
            );
        }

        let empty_message = match status {
            PassStatus::Failed(RenderError::EmptyPointSet) => Some("no points"),
            PassStatus::Failed(RenderError::MissingDomain) | PassStatus::Idle => Some("no data"),
            PassStatus::Running | PassStatus::Done(_) => None,
        };
        if let Some(message) = empty_message {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                message,
                FontId::proportional(14.0),
                style.outline,
            );
        }

        response
    }
}

impl Styled for DiagramCanvas<'_> {
    type Style = DiagramStyle;

    fn set_style(&mut self, style: Option<Self::Style>) {
        self.diagram_style = style;
    }
}
