use std::sync::Arc;
use std::time::Duration;

use egui::{Color32, Stroke};

use crate::filter::DEFAULT_CHUNK_SIZE;
use crate::point::PersistencePointTuple;
use crate::render::Mapping;
use crate::surface::Surface;

/// Replaces the default lower-to-upper segment for each point.
pub type PointDrawFn =
    Arc<dyn Fn(&mut dyn Surface, &Mapping, &PersistencePointTuple, Stroke) + Send + Sync>;

pub type TickFormatter = Arc<dyn Fn(f64) -> String + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Padding {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Padding {
    pub const fn uniform(value: f32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

impl Default for Padding {
    fn default() -> Self {
        Self::uniform(40.0)
    }
}

impl From<f32> for Padding {
    fn from(value: f32) -> Self {
        Self::uniform(value)
    }
}

#[derive(Clone)]
pub enum TickFormat {
    Fixed(usize),
    Custom(TickFormatter),
}

impl TickFormat {
    pub fn format(&self, value: f64) -> String {
        match self {
            TickFormat::Fixed(digits) => format!("{:.*}", *digits, value),
            TickFormat::Custom(formatter) => formatter(value),
        }
    }
}

impl std::fmt::Debug for TickFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TickFormat::Fixed(digits) => write!(f, "Fixed({digits})"),
            TickFormat::Custom(_) => write!(f, "Custom"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AxisOptions {
    pub x_ticks: usize,
    pub y_ticks: usize,
    pub tick_length: f32,
    /// `None` follows the theme outline colour.
    pub color: Option<Color32>,
    pub format: TickFormat,
    pub label_size: f32,
}

impl Default for AxisOptions {
    fn default() -> Self {
        Self {
            x_ticks: 5,
            y_ticks: 5,
            tick_length: 5.0,
            color: None,
            format: TickFormat::Fixed(2),
            label_size: 10.0,
        }
    }
}

#[derive(Clone)]
pub struct DiagramOptions {
    pub padding: Padding,
    pub canvas_width: f32,
    pub canvas_height: f32,
    /// Width and colour of point segments; a transparent colour follows the
    /// theme ink.
    pub stroke: Stroke,
    pub chunk_size: usize,
    /// Delay per chunk index within one redraw pass.
    pub wait_time: Duration,
    pub point_draw: Option<PointDrawFn>,
    pub enable_selection_filter: bool,
    pub enable_persistence_filter: bool,
    pub enable_axes: bool,
    pub axis: AxisOptions,
    pub selection_stop_propagation: bool,
    pub selection_min_width: f32,
}

impl Default for DiagramOptions {
    fn default() -> Self {
        Self {
            padding: Padding::default(),
            canvas_width: 600.0,
            canvas_height: 400.0,
            stroke: Stroke::new(1.0, Color32::TRANSPARENT),
            chunk_size: DEFAULT_CHUNK_SIZE,
            wait_time: Duration::from_millis(10),
            point_draw: None,
            enable_selection_filter: true,
            enable_persistence_filter: true,
            enable_axes: true,
            axis: AxisOptions::default(),
            selection_stop_propagation: true,
            selection_min_width: 10.0,
        }
    }
}

impl DiagramOptions {
    pub fn padding(mut self, padding: impl Into<Padding>) -> Self {
        self.padding = padding.into();
        self
    }

    pub fn canvas_size(mut self, width: f32, height: f32) -> Self {
        self.canvas_width = width.max(1.0);
        self.canvas_height = height.max(1.0);
        self
    }

    pub fn stroke(mut self, stroke: impl Into<Stroke>) -> Self {
        self.stroke = stroke.into();
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn wait_time(mut self, wait_time: Duration) -> Self {
        self.wait_time = wait_time;
        self
    }

    pub fn point_draw(
        mut self,
        draw: impl Fn(&mut dyn Surface, &Mapping, &PersistencePointTuple, Stroke)
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.point_draw = Some(Arc::new(draw));
        self
    }

    pub fn selection_filter(mut self, enabled: bool) -> Self {
        self.enable_selection_filter = enabled;
        self
    }

    pub fn persistence_filter(mut self, enabled: bool) -> Self {
        self.enable_persistence_filter = enabled;
        self
    }

    pub fn axes(mut self, enabled: bool) -> Self {
        self.enable_axes = enabled;
        self
    }

    pub fn axis(mut self, axis: AxisOptions) -> Self {
        self.axis = axis;
        self
    }

    pub fn tick_format(mut self, format: TickFormat) -> Self {
        self.axis.format = format;
        self
    }

    pub fn selection_stop_propagation(mut self, stop: bool) -> Self {
        self.selection_stop_propagation = stop;
        self
    }

    pub fn selection_min_width(mut self, min_width: f32) -> Self {
        self.selection_min_width = min_width.max(0.0);
        self
    }
}

impl std::fmt::Debug for DiagramOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagramOptions")
            .field("padding", &self.padding)
            .field("canvas_width", &self.canvas_width)
            .field("canvas_height", &self.canvas_height)
            .field("stroke", &self.stroke)
            .field("chunk_size", &self.chunk_size)
            .field("wait_time", &self.wait_time)
            .field("point_draw", &self.point_draw.is_some())
            .field("enable_selection_filter", &self.enable_selection_filter)
            .field("enable_persistence_filter", &self.enable_persistence_filter)
            .field("enable_axes", &self.enable_axes)
            .field("axis", &self.axis)
            .field("selection_stop_propagation", &self.selection_stop_propagation)
            .field("selection_min_width", &self.selection_min_width)
            .finish()
    }
}
