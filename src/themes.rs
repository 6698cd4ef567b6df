use egui::style::{Selection, WidgetVisuals};
use egui::{Color32, Stroke, Style, Vec2, Visuals};

use crate::surface::Layer;

mod style;
pub use style::Styled;
pub mod ral;
use ral::RAL_COLORS;

/// Colours the diagram canvas paints with.
#[derive(Clone, Debug)]
pub struct DiagramStyle {
    pub background: Color32,
    pub outline: Color32,
    pub ink: Color32,
    pub grid: Color32,
    pub accent: Color32,
    pub selection_fill: Color32,
}

impl DiagramStyle {
    /// Replacement for marks recorded without a colour of their own.
    pub fn layer_color(&self, layer: Layer) -> Color32 {
        match layer {
            Layer::Axes => self.outline,
            Layer::Reference => self.grid,
            Layer::Points => self.ink,
        }
    }
}

impl From<&Style> for DiagramStyle {
    fn from(style: &Style) -> Self {
        let visuals = &style.visuals;
        let background = visuals.extreme_bg_color;
        let outline = visuals.widgets.noninteractive.bg_stroke.color;
        let accent = visuals.selection.stroke.color;
        Self {
            background,
            outline,
            ink: visuals.text_color(),
            grid: blend(outline, background, 0.5),
            accent,
            selection_fill: Color32::from_rgba_unmultiplied(accent.r(), accent.g(), accent.b(), 40),
        }
    }
}

/// Colours of the dual-handle persistence slider.
#[derive(Clone, Debug)]
pub struct RangeSliderStyle {
    pub rail_bg: Color32,
    pub rail_fill: Color32,
    pub knob: Color32,
    pub knob_active: Color32,
    pub shadow: Color32,
    pub shadow_offset: Vec2,
}

pub fn range_slider_style(dark_mode: bool) -> RangeSliderStyle {
    let outline = if dark_mode {
        blend(ral(9003), ral(7046), 0.4)
    } else {
        blend(ral(9011), ral(7047), 0.4)
    };

    RangeSliderStyle {
        rail_bg: ral(9004),
        rail_fill: outline,
        knob: ral(9003),
        knob_active: ral(2009),
        shadow: ral(9004),
        shadow_offset: egui::vec2(2.0, 2.0),
    }
}

impl From<&Style> for RangeSliderStyle {
    fn from(style: &Style) -> Self {
        let mut slider = range_slider_style(style.visuals.dark_mode);
        slider.knob_active = style.visuals.selection.stroke.color;
        slider
    }
}

pub fn blend(a: Color32, b: Color32, t: f32) -> Color32 {
    let r = (a.r() as f32 * (1.0 - t) + b.r() as f32 * t).round() as u8;
    let g = (a.g() as f32 * (1.0 - t) + b.g() as f32 * t).round() as u8;
    let bch = (a.b() as f32 * (1.0 - t) + b.b() as f32 * t).round() as u8;
    Color32::from_rgb(r, g, bch)
}

pub fn ral(num: u16) -> Color32 {
    RAL_COLORS
        .iter()
        .find(|(code, _, _)| *code == num)
        .map(|(_, _, c)| *c)
        .unwrap_or(Color32::from_rgb(0, 0, 0))
}

fn widget_visuals(fill: Color32, stroke: Stroke, foreground: Color32) -> WidgetVisuals {
    WidgetVisuals {
        bg_fill: fill,
        weak_bg_fill: fill,
        bg_stroke: stroke,
        fg_stroke: Stroke::new(1.0, foreground),
        corner_radius: 2.0.into(),
        expansion: 0.0,
    }
}

/// Flat RAL-based visuals for the viewer.
pub fn industrial(dark_mode: bool) -> Style {
    let (foreground, background, mut visuals) = if dark_mode {
        (ral(9003), ral(7046), Visuals::dark())
    } else {
        (ral(9011), ral(7047), Visuals::light())
    };
    let accent = ral(2009);
    let border = blend(foreground, background, 0.4);
    let hover = blend(background, foreground, 0.05);

    visuals.window_fill = background;
    visuals.panel_fill = background;
    visuals.extreme_bg_color = blend(background, foreground, 0.03);
    visuals.selection = Selection {
        bg_fill: blend(background, foreground, 0.12),
        stroke: Stroke::new(1.5, accent),
    };
    visuals.widgets.noninteractive =
        widget_visuals(background, Stroke::new(1.0, border), foreground);
    visuals.widgets.inactive = widget_visuals(background, Stroke::new(1.0, border), foreground);
    visuals.widgets.hovered = widget_visuals(hover, Stroke::new(1.4, border), foreground);
    visuals.widgets.active = widget_visuals(hover, Stroke::new(1.4, accent), foreground);
    visuals.window_shadow = egui::epaint::Shadow::NONE;

    let mut style = Style {
        visuals,
        ..Default::default()
    };
    style.spacing.item_spacing = egui::vec2(12.0, 10.0);
    style.spacing.interact_size = egui::vec2(34.0, 26.0);
    style.animation_time = 0.12;
    style
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_interpolates_per_channel() {
        let mid = blend(Color32::from_rgb(0, 100, 200), Color32::from_rgb(100, 200, 0), 0.5);
        assert_eq!(mid, Color32::from_rgb(50, 150, 100));
    }

    #[test]
    fn unknown_ral_codes_fall_back_to_black() {
        assert_eq!(ral(1), Color32::from_rgb(0, 0, 0));
        assert_ne!(ral(2009), Color32::from_rgb(0, 0, 0));
    }

    #[test]
    fn layer_colours_come_from_the_style() {
        let style = industrial(false);
        let diagram = DiagramStyle::from(&style);
        assert_eq!(diagram.layer_color(Layer::Points), style.visuals.text_color());
        assert_eq!(diagram.layer_color(Layer::Axes), diagram.outline);
        assert_eq!(diagram.accent, ral(2009));
    }
}
