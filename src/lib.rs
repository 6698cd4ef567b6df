//! An interactive persistence-diagram widget for egui.
//!
//! A [`PersistenceDiagram`] owns a [`DiagramStore`] holding the loaded
//! critical-point pairs and both active filters. Every store mutation
//! re-renders the registered dependents: the chunked [`render::Renderer`],
//! the axis overlay and the persistence slider.

pub mod axes;
pub mod controls;
pub mod diagram;
pub mod error;
pub mod events;
pub mod filter;
pub mod loader;
pub mod options;
pub mod point;
pub mod prelude;
pub mod render;
pub mod store;
pub mod surface;
pub mod themes;
pub mod widgets;

pub use diagram::PersistenceDiagram;
pub use error::{LoadError, MalformedDatasetError, PreconditionError, RenderError};
pub use events::{DiagramEvent, EventBus};
pub use options::DiagramOptions;
pub use point::{Bounds, PersistencePointTuple};
pub use store::DiagramStore;
