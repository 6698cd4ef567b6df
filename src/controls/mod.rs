//! Pointer-driven controls that write filters back into the store.

pub mod range_slider;
pub mod selection;

pub use range_slider::{Handle, RangeSlider};
pub use selection::{BrushState, SelectionControl};
