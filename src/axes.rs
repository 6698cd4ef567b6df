use egui::{pos2, Align2, Color32, Stroke};

use crate::options::{AxisOptions, DiagramOptions};
use crate::point::Bounds;
use crate::render::Mapping;
use crate::store::{Dependent, DiagramState};
use crate::surface::{Layer, SharedCanvas, Surface};

const LABEL_GAP: f32 = 2.0;

/// `count` evenly spaced values from `domain.min` to `domain.max`, both ends
/// included.
pub fn ticks(domain: Bounds, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![domain.min],
        _ => {
            let step = (domain.max - domain.min) / (count - 1) as f64;
            (0..count)
                .map(|i| {
                    if i == count - 1 {
                        domain.max
                    } else {
                        domain.min + step * i as f64
                    }
                })
                .collect()
        }
    }
}

/// Draws the bottom and left axis lines with their ticks and labels.
pub fn draw_axes(surface: &mut dyn Surface, mapping: &Mapping, axis: &AxisOptions) {
    let color = axis.color.unwrap_or(Color32::TRANSPARENT);
    let stroke = Stroke::new(1.0, color);
    let area = mapping.drawable();

    surface.line_segment([area.left_bottom(), area.right_bottom()], stroke);
    surface.line_segment([area.left_top(), area.left_bottom()], stroke);

    for value in ticks(mapping.x_domain(), axis.x_ticks) {
        let x = mapping.x(value);
        let tick_end = area.bottom() + axis.tick_length;
        surface.line_segment([pos2(x, area.bottom()), pos2(x, tick_end)], stroke);
        surface.text(
            pos2(x, tick_end + LABEL_GAP),
            Align2::CENTER_TOP,
            axis.format.format(value),
            axis.label_size,
            color,
        );
    }

    for value in ticks(mapping.y_domain(), axis.y_ticks) {
        let y = mapping.y(value);
        let tick_end = area.left() - axis.tick_length;
        surface.line_segment([pos2(tick_end, y), pos2(area.left(), y)], stroke);
        surface.text(
            pos2(tick_end - LABEL_GAP, y),
            Align2::RIGHT_CENTER,
            axis.format.format(value),
            axis.label_size,
            color,
        );
    }
}

/// Store dependent that rebuilds the axis layer on every update.
pub struct AxisOverlay {
    canvas: SharedCanvas,
    options: DiagramOptions,
}

impl AxisOverlay {
    pub fn new(canvas: SharedCanvas, options: DiagramOptions) -> Self {
        Self { canvas, options }
    }
}

impl Dependent for AxisOverlay {
    fn refresh(&mut self, state: &DiagramState) {
        let mapping = Mapping::for_state(state, &self.options);
        let mut canvas = self.canvas.lock();
        let layer = canvas.layer_mut(Layer::Axes);
        layer.clear();
        match mapping {
            Ok(mapping) => draw_axes(layer, &mapping, &self.options.axis),
            Err(err) => log::debug!("axes skipped: {err}"),
        }
    }
}
