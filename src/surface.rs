//! A retained, layered display list the renderer and axis overlay draw into
//! and the egui widget replays every frame.

use std::sync::Arc;

use egui::{Align2, Color32, Pos2, Stroke};
use parking_lot::Mutex;

/// Anything the diagram can draw onto. Coordinates are canvas-local pixels
/// with the origin in the top-left corner.
pub trait Surface {
    fn line_segment(&mut self, points: [Pos2; 2], stroke: Stroke);
    fn text(&mut self, pos: Pos2, anchor: Align2, text: String, size: f32, color: Color32);
}

#[derive(Clone, Debug, PartialEq)]
pub enum Mark {
    Segment {
        points: [Pos2; 2],
        stroke: Stroke,
    },
    Text {
        pos: Pos2,
        anchor: Align2,
        text: String,
        size: f32,
        color: Color32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    Axes,
    Reference,
    Points,
}

impl Layer {
    pub const ALL: [Layer; 3] = [Layer::Axes, Layer::Reference, Layer::Points];

    fn index(self) -> usize {
        match self {
            Layer::Axes => 0,
            Layer::Reference => 1,
            Layer::Points => 2,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MarkList {
    marks: Vec<Mark>,
}

impl MarkList {
    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub fn clear(&mut self) {
        self.marks.clear();
    }

    pub fn segments(&self) -> impl Iterator<Item = [Pos2; 2]> + '_ {
        self.marks.iter().filter_map(|mark| match mark {
            Mark::Segment { points, .. } => Some(*points),
            Mark::Text { .. } => None,
        })
    }
}

impl Surface for MarkList {
    fn line_segment(&mut self, points: [Pos2; 2], stroke: Stroke) {
        self.marks.push(Mark::Segment { points, stroke });
    }

    fn text(&mut self, pos: Pos2, anchor: Align2, text: String, size: f32, color: Color32) {
        self.marks.push(Mark::Text {
            pos,
            anchor,
            text,
            size,
            color,
        });
    }
}

/// Fixed-size canvas made of independently clearable layers, painted in
/// [`Layer::ALL`] order.
#[derive(Clone, Debug)]
pub struct ShapeCanvas {
    width: f32,
    height: f32,
    layers: [MarkList; 3],
    revision: u64,
}

impl ShapeCanvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            layers: Default::default(),
            revision: 0,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn layer(&self, layer: Layer) -> &MarkList {
        &self.layers[layer.index()]
    }

    /// Mutable access bumps the revision so painters can tell something moved.
    pub fn layer_mut(&mut self, layer: Layer) -> &mut MarkList {
        self.revision += 1;
        &mut self.layers[layer.index()]
    }

    pub fn clear(&mut self, layer: Layer) {
        self.layer_mut(layer).clear();
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn iter(&self) -> impl Iterator<Item = (Layer, &Mark)> + '_ {
        Layer::ALL
            .into_iter()
            .flat_map(move |layer| self.layer(layer).marks().iter().map(move |mark| (layer, mark)))
    }
}

/// The drawing context shared by the render tasks and the UI thread.
pub type SharedCanvas = Arc<Mutex<ShapeCanvas>>;

pub fn shared_canvas(width: f32, height: f32) -> SharedCanvas {
    Arc::new(Mutex::new(ShapeCanvas::new(width, height)))
}
