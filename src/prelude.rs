// Preludes: re-export commonly used items for convenience
pub use crate::controls::{BrushState, Handle, RangeSlider, SelectionControl};
pub use crate::diagram::PersistenceDiagram;
pub use crate::events::{DiagramEvent, EventBus, SubscriptionId};
pub use crate::loader::{synthetic_dataset, DatasetLoader, JsonFileLoader, MemoryLoader};
pub use crate::options::{AxisOptions, DiagramOptions, Padding, TickFormat};
pub use crate::point::{Bounds, DatasetBounds, PersistencePointTuple, RawDataset, Vec3};
pub use crate::render::{PassOutcome, PassStatus};
pub use crate::store::{Dependent, DiagramState, DiagramStore};
pub use crate::themes::Styled;
pub use crate::widgets::{DiagramCanvas, RangeSliderWidget};
