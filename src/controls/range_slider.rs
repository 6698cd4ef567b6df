use crate::events::DiagramEvent;
use crate::point::Bounds;
use crate::store::DiagramState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handle {
    Lower,
    Upper,
}

/// Squeezes `bounds` into `range`, keeping `min <= max`.
fn fit(bounds: Bounds, range: Bounds) -> Bounds {
    let min = bounds.min.max(range.min).min(range.max);
    let max = bounds.max.min(range.max).max(min);
    Bounds::new(min, max)
}

/// Two-handle persistence range. Rebuilt whenever the store reports a new
/// dataset generation.
///
/// The slider never publishes anything itself: [`RangeSlider::sync`] hands
/// back the lifecycle events and the caller emits them once it has let go of
/// whatever lock guards the slider.
#[derive(Debug, Default)]
pub struct RangeSlider {
    generation: u64,
    range: Option<Bounds>,
    values: Option<Bounds>,
    grabbed: Option<Handle>,
}

impl RangeSlider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full extent the handles can move in.
    pub fn range(&self) -> Option<Bounds> {
        self.range
    }

    /// Current handle positions, including an uncommitted drag.
    pub fn values(&self) -> Option<Bounds> {
        self.values
    }

    pub fn grabbed(&self) -> Option<Handle> {
        self.grabbed
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Follows the store. Returns `sliderdestroyed`/`slidercreated` when a new
    /// dataset generation rebuilt the slider.
    #[must_use = "the returned events still have to be emitted"]
    pub fn sync(&mut self, state: &DiagramState) -> Vec<DiagramEvent> {
        if state.generation() != self.generation {
            return self.rebuild(state);
        }
        if self.grabbed.is_none() {
            self.values = self.committed(state);
        }
        Vec::new()
    }

    fn committed(&self, state: &DiagramState) -> Option<Bounds> {
        let range = self.range?;
        Some(
            state
                .active_persistence_bounds()
                .map_or(range, |active| fit(active, range)),
        )
    }

    fn rebuild(&mut self, state: &DiagramState) -> Vec<DiagramEvent> {
        let mut events = Vec::new();
        if self.range.take().is_some() {
            events.push(DiagramEvent::SliderDestroyed);
        }
        self.generation = state.generation();
        self.grabbed = None;
        self.range = state.persistence_bounds();
        self.values = self.committed(state);
        if let Some(range) = self.range {
            log::debug!("persistence slider spans [{}, {}]", range.min, range.max);
            events.push(DiagramEvent::SliderCreated { range });
        }
        events
    }

    /// The handle closest to `value`; ties go to the upper handle so a
    /// collapsed range can still be opened upwards.
    pub fn nearest(&self, value: f64) -> Option<Handle> {
        let values = self.values?;
        if (value - values.min).abs() < (value - values.max).abs() {
            Some(Handle::Lower)
        } else {
            Some(Handle::Upper)
        }
    }

    pub fn grab(&mut self, handle: Handle) {
        if self.values.is_some() {
            self.grabbed = Some(handle);
        }
    }

    /// Moves the grabbed handle, keeping it inside the range and on its side
    /// of the other handle. Returns the preview bounds.
    pub fn drag_to(&mut self, value: f64) -> Option<Bounds> {
        let handle = self.grabbed?;
        let range = self.range?;
        let values = fit(self.values?, range);

        let next = match handle {
            Handle::Lower => Bounds::new(value.max(range.min).min(values.max), values.max),
            Handle::Upper => Bounds::new(values.min, value.min(range.max).max(values.min)),
        };
        self.values = Some(next);
        Some(next)
    }

    /// Ends the drag and returns the bounds to commit to the store.
    pub fn release(&mut self) -> Option<Bounds> {
        self.grabbed.take()?;
        self.values
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::events::EventBus;
    use crate::loader::MemoryLoader;
    use crate::point::{DatasetBounds, RawDataset};
    use crate::store::{Dependents, DiagramStore};

    fn dataset(persistences: &[f64]) -> RawDataset {
        let mut coordinates = Vec::new();
        for (i, persistence) in persistences.iter().enumerate() {
            let x = i as f64;
            coordinates.extend_from_slice(&[x, 0.0, 0.0, x, *persistence, 0.0]);
        }
        RawDataset {
            coordinates,
            critical_types: vec![0; persistences.len() * 2],
            display_coordinates: Vec::new(),
            bounds: DatasetBounds([0.0, 10.0, -5.0, 10.0, 0.0, 0.0]),
        }
    }

    fn store() -> DiagramStore {
        let loader = MemoryLoader::new()
            .with("a", dataset(&[-3.0, 0.0, 4.0, 7.0, 9.0]))
            .with("b", dataset(&[1.0, 2.0]));
        DiagramStore::new(Arc::new(loader), Dependents::new(), Arc::new(EventBus::new()))
    }

    fn names(events: &[DiagramEvent]) -> Vec<&'static str> {
        events.iter().map(DiagramEvent::name).collect()
    }

    #[tokio::test]
    async fn reload_destroys_before_creating() {
        let mut store = store();
        let mut slider = RangeSlider::new();

        store.load("a").await.unwrap();
        assert_eq!(names(&slider.sync(store.state())), vec!["slidercreated"]);
        assert_eq!(slider.range(), Some(Bounds::new(-3.0, 9.0)));

        store.load("b").await.unwrap();
        assert_eq!(
            names(&slider.sync(store.state())),
            vec!["sliderdestroyed", "slidercreated"]
        );
        assert!(slider.sync(store.state()).is_empty());
        assert_eq!(slider.range(), Some(Bounds::new(1.0, 2.0)));
    }

    #[tokio::test]
    async fn handles_cannot_cross() {
        let mut store = store();
        let mut slider = RangeSlider::new();
        store.load("a").await.unwrap();
        let _ = slider.sync(store.state());

        slider.grab(Handle::Upper);
        assert_eq!(slider.drag_to(2.0), Some(Bounds::new(-3.0, 2.0)));
        slider.release();

        slider.grab(Handle::Lower);
        assert_eq!(slider.drag_to(5.0), Some(Bounds::new(2.0, 2.0)));
        assert_eq!(slider.drag_to(-40.0), Some(Bounds::new(-3.0, 2.0)));
    }

    #[tokio::test]
    async fn drag_previews_and_release_commits() {
        let mut store = store();
        let mut slider = RangeSlider::new();
        store.load("a").await.unwrap();
        let _ = slider.sync(store.state());

        assert_eq!(slider.nearest(-2.0), Some(Handle::Lower));
        slider.grab(Handle::Lower);
        assert_eq!(slider.drag_to(-1.0), Some(Bounds::new(-1.0, 9.0)));
        slider.drag_to(0.0);
        assert_eq!(store.state().active_persistence_bounds(), None);

        let committed = slider.release();
        assert_eq!(committed, Some(Bounds::new(0.0, 9.0)));
        store.set_active_persistence_bounds(committed);
        assert!(slider.sync(store.state()).is_empty());

        assert_eq!(slider.values(), committed);
        assert_eq!(store.filtered_points().len(), 4);
    }

    #[tokio::test]
    async fn bounds_outside_the_data_are_fitted_before_dragging() {
        let mut store = store();
        let mut slider = RangeSlider::new();
        store.load("b").await.unwrap();
        let _ = slider.sync(store.state());

        store.set_active_persistence_bounds(Some(Bounds::new(-10.0, -5.0)));
        let _ = slider.sync(store.state());
        assert_eq!(slider.values(), Some(Bounds::new(1.0, 1.0)));

        slider.grab(Handle::Upper);
        assert_eq!(slider.drag_to(0.0), Some(Bounds::new(1.0, 1.0)));
        assert_eq!(slider.drag_to(1.5), Some(Bounds::new(1.0, 1.5)));
        slider.release();

        store.set_active_persistence_bounds(Some(Bounds::new(30.0, 40.0)));
        let _ = slider.sync(store.state());
        assert_eq!(slider.values(), Some(Bounds::new(2.0, 2.0)));
        slider.grab(Handle::Lower);
        assert_eq!(slider.drag_to(-8.0), Some(Bounds::new(1.0, 2.0)));
    }

    #[test]
    fn nothing_to_drag_before_a_load() {
        let mut slider = RangeSlider::new();
        slider.grab(Handle::Upper);
        assert_eq!(slider.drag_to(1.0), None);
        assert_eq!(slider.release(), None);
    }
}
