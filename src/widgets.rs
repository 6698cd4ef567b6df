mod diagram_canvas;
mod range_slider;

pub use diagram_canvas::DiagramCanvas;
pub use range_slider::RangeSliderWidget;
