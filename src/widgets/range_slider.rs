use eframe::egui::{
    pos2, vec2, Align2, FontId, Rangef, Rect, Response, Sense, Stroke, StrokeKind, Ui, Widget,
};

use crate::controls::Handle;
use crate::diagram::PersistenceDiagram;
use crate::point::Bounds;
use crate::themes::{RangeSliderStyle, Styled};

const KNOB_RADIUS: f32 = 6.0;
const LABEL_SIZE: f32 = 11.0;

/// Pixel position of `value` on a rail spanning `rail`.
fn value_to_x(range: Bounds, rail: Rangef, value: f64) -> f32 {
    let span = range.max - range.min;
    if span <= 0.0 {
        return rail.center();
    }
    let t = ((value - range.min) / span).clamp(0.0, 1.0) as f32;
    rail.min + t * rail.span()
}

fn x_to_value(range: Bounds, rail: Rangef, x: f32) -> f64 {
    if rail.span() <= 0.0 {
        return range.min;
    }
    let t = f64::from(((x - rail.min) / rail.span()).clamp(0.0, 1.0));
    range.min + t * (range.max - range.min)
}

/// Dual-handle slider over the loaded persistence range.
#[must_use = "You should put this widget in a ui with `ui.add(widget);`"]
pub struct RangeSliderWidget<'a> {
    diagram: &'a mut PersistenceDiagram,
    desired_width: Option<f32>,
    slider_style: Option<RangeSliderStyle>,
}

impl<'a> RangeSliderWidget<'a> {
    pub fn new(diagram: &'a mut PersistenceDiagram) -> Self {
        Self {
            diagram,
            desired_width: None,
            slider_style: None,
        }
    }

    pub fn desired_width(mut self, desired_width: f32) -> Self {
        self.desired_width = Some(desired_width);
        self
    }
}

impl Widget for RangeSliderWidget<'_> {
    fn ui(self, ui: &mut Ui) -> Response {
        let RangeSliderWidget {
            diagram,
            desired_width,
            slider_style,
        } = self;

        let gstyle = slider_style.unwrap_or_else(|| RangeSliderStyle::from(ui.style().as_ref()));
        let width = desired_width.unwrap_or(diagram.options().canvas_width);
        let height = ui.spacing().interact_size.y + LABEL_SIZE + 4.0;
        let (rect, response) = ui.allocate_exact_size(vec2(width, height), Sense::click_and_drag());

        let Some(range) = diagram.slider().map(|slider| slider.lock().range()) else {
            return response;
        };

        let slot = Rect::from_min_max(
            rect.left_top(),
            pos2(rect.right(), rect.top() + ui.spacing().interact_size.y),
        );
        let rail = slot.shrink2(vec2(KNOB_RADIUS, slot.height() * 0.35));
        let rail_x = rail.x_range();

        if let Some(range) = range {
            let pointer = response.interact_pointer_pos();
            if response.drag_started() {
                if let Some(pos) = pointer {
                    diagram.slider_grab(x_to_value(range, rail_x, pos.x));
                }
            }
            if response.dragged() {
                if let Some(pos) = pointer {
                    diagram.slider_drag(x_to_value(range, rail_x, pos.x));
                }
            }
            if response.drag_stopped() {
                diagram.slider_release();
            }
        }

        if !ui.is_rect_visible(rect) {
            return response;
        }

        let painter = ui.painter().with_clip_rect(rect.expand(KNOB_RADIUS));
        painter.rect_filled(rail, 0.0, gstyle.rail_bg);
        painter.rect_stroke(
            rail,
            0.0,
            Stroke::new(1.0, gstyle.rail_fill),
            StrokeKind::Inside,
        );

        let (values, grabbed) = match diagram.slider() {
            Some(slider) => {
                let slider = slider.lock();
                (slider.values(), slider.grabbed())
            }
            None => (None, None),
        };
        let (Some(range), Some(values)) = (range, values) else {
            return response;
        };

        let lower_x = value_to_x(range, rail_x, values.min);
        let upper_x = value_to_x(range, rail_x, values.max);
        let filled = Rect::from_x_y_ranges(Rangef::new(lower_x, upper_x), rail.y_range());
        painter.rect_filled(filled, 0.0, gstyle.rail_fill);

        let format = &diagram.options().axis.format;
        for (handle, x, value, anchor) in [
            (Handle::Lower, lower_x, values.min, Align2::RIGHT_TOP),
            (Handle::Upper, upper_x, values.max, Align2::LEFT_TOP),
        ] {
            let center = pos2(x, rail.center().y);
            let knob = if grabbed == Some(handle) {
                gstyle.knob_active
            } else {
                gstyle.knob
            };
            painter.circle_filled(center + gstyle.shadow_offset, KNOB_RADIUS, gstyle.shadow);
            painter.circle_filled(center, KNOB_RADIUS, knob);
            painter.circle_stroke(center, KNOB_RADIUS, Stroke::new(1.0, gstyle.rail_fill));
            painter.text(
                pos2(x, slot.bottom() + 2.0),
                anchor,
                format.format(value),
                FontId::proportional(LABEL_SIZE),
                ui.visuals().text_color(),
            );
        }

        response.on_hover_cursor(eframe::egui::CursorIcon::ResizeHorizontal)
    }
}

impl Styled for RangeSliderWidget<'_> {
    type Style = RangeSliderStyle;

    fn set_style(&mut self, style: Option<Self::Style>) {
        self.slider_style = style;
    }
}
