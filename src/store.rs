use std::sync::Arc;

use tracing::Instrument as _;

use crate::error::LoadError;
use crate::events::{DiagramEvent, EventBus};
use crate::filter::{chunk_points, filter_points, DEFAULT_CHUNK_SIZE};
use crate::loader::DatasetLoader;
use crate::point::{Bounds, DatasetBounds, LoadedDataset, PersistencePointTuple};

/// Everything the diagram knows about the current dataset and filters.
///
/// The filtered and chunked views are recomputed on every call; nothing
/// derived is kept around across a filter change.
#[derive(Clone, Debug)]
pub struct DiagramState {
    points: Vec<PersistencePointTuple>,
    bounds: Option<DatasetBounds>,
    persistence_bounds: Option<Bounds>,
    active_persistence_bounds: Option<Bounds>,
    active_selection_bounds: Option<Bounds>,
    chunk_size: usize,
    generation: u64,
}

impl Default for DiagramState {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            bounds: None,
            persistence_bounds: None,
            active_persistence_bounds: None,
            active_selection_bounds: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            generation: 0,
        }
    }
}

impl DiagramState {
    pub fn points(&self) -> &[PersistencePointTuple] {
        &self.points
    }

    pub fn bounds(&self) -> Option<DatasetBounds> {
        self.bounds
    }

    /// Extent of persistence over all loaded points.
    pub fn persistence_bounds(&self) -> Option<Bounds> {
        self.persistence_bounds
    }

    pub fn active_persistence_bounds(&self) -> Option<Bounds> {
        self.active_persistence_bounds
    }

    pub fn active_selection_bounds(&self) -> Option<Bounds> {
        self.active_selection_bounds
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Bumped on every successful load.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn filtered_points(&self) -> Vec<PersistencePointTuple> {
        filter_points(
            &self.points,
            self.active_selection_bounds.as_ref(),
            self.active_persistence_bounds.as_ref(),
        )
    }

    pub fn filtered_points_chunked(&self) -> Vec<Vec<PersistencePointTuple>> {
        chunk_points(&self.filtered_points(), self.chunk_size)
    }

    /// Horizontal data range on screen: the active selection, or the full
    /// dataset's x extent.
    pub fn x_domain(&self) -> Option<Bounds> {
        self.active_selection_bounds
            .or_else(|| self.bounds.map(|bounds| bounds.x()))
    }

    /// Vertical data range on screen; never narrowed by filters.
    pub fn y_domain(&self) -> Option<Bounds> {
        self.bounds.map(|bounds| bounds.y())
    }
}

/// A control that re-renders itself from the store's state.
pub trait Dependent: Send {
    fn refresh(&mut self, state: &DiagramState);
}

impl<F> Dependent for F
where
    F: FnMut(&DiagramState) + Send,
{
    fn refresh(&mut self, state: &DiagramState) {
        self(state)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DependentId(u64);

/// Registry of dependents, notified in registration order.
#[derive(Default)]
pub struct Dependents {
    next_id: u64,
    entries: Vec<(DependentId, Box<dyn Dependent>)>,
}

impl Dependents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, dependent: impl Dependent + 'static) -> DependentId {
        let id = DependentId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(dependent)));
        id
    }

    pub fn unregister(&mut self, id: DependentId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(existing, _)| *existing != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn notify(&mut self, state: &DiagramState) {
        for (_, dependent) in &mut self.entries {
            dependent.refresh(state);
        }
    }
}

impl std::fmt::Debug for Dependents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dependents")
            .field("len", &self.entries.len())
            .finish()
    }
}

/// Single owner of the loaded points and both active filters.
pub struct DiagramStore {
    state: DiagramState,
    loader: Arc<dyn DatasetLoader>,
    dependents: Dependents,
    events: Arc<EventBus>,
}

impl DiagramStore {
    pub fn new(
        loader: Arc<dyn DatasetLoader>,
        dependents: Dependents,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            state: DiagramState::default(),
            loader,
            dependents,
            events,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.state.chunk_size = chunk_size.max(1);
        self
    }

    pub fn state(&self) -> &DiagramState {
        &self.state
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn loader(&self) -> &Arc<dyn DatasetLoader> {
        &self.loader
    }

    pub fn generation(&self) -> u64 {
        self.state.generation
    }

    pub fn register(&mut self, dependent: impl Dependent + 'static) -> DependentId {
        self.dependents.register(dependent)
    }

    pub fn unregister(&mut self, id: DependentId) -> bool {
        self.dependents.unregister(id)
    }

    /// Calls the loader and ingests its output without touching any store.
    pub async fn fetch(
        loader: &dyn DatasetLoader,
        source_ref: &str,
    ) -> Result<LoadedDataset, LoadError> {
        let raw = loader.fetch(source_ref).await?;
        Ok(LoadedDataset::try_from(raw)?)
    }

    /// Replaces the dataset. On failure the previous dataset and filters stay
    /// in place and the error is returned.
    pub async fn load(&mut self, source_ref: &str) -> Result<usize, LoadError> {
        let loader = self.loader.clone();
        let span = tracing::info_span!("diagram_load", source = source_ref);
        let dataset = Self::fetch(loader.as_ref(), source_ref)
            .instrument(span)
            .await
            .inspect_err(|err| log::warn!("loading `{source_ref}` failed: {err}"))?;
        let points = dataset.points.len();
        self.apply(dataset);
        Ok(points)
    }

    /// Commits an already ingested dataset and clears both filters.
    pub fn apply(&mut self, dataset: LoadedDataset) {
        let LoadedDataset {
            points,
            bounds,
            persistence_bounds,
        } = dataset;
        let count = points.len();

        self.state.points = points;
        self.state.bounds = Some(bounds);
        self.state.persistence_bounds = persistence_bounds;
        self.state.active_persistence_bounds = None;
        self.state.active_selection_bounds = None;
        self.state.generation += 1;
        log::debug!(
            "loaded {count} point pairs (generation {})",
            self.state.generation
        );

        self.events.emit(DiagramEvent::DataLoaded { points: count });
        self.update();
    }

    pub fn set_active_selection_bounds(&mut self, bounds: Option<Bounds>) {
        self.state.active_selection_bounds = bounds;
        self.update();
    }

    /// Returns `false` without notifying anyone when `bounds` equals the
    /// current range exactly.
    pub fn set_active_persistence_bounds(&mut self, bounds: Option<Bounds>) -> bool {
        if self.state.active_persistence_bounds == bounds {
            return false;
        }
        self.state.active_persistence_bounds = bounds;
        self.update();
        true
    }

    pub fn filtered_points(&self) -> Vec<PersistencePointTuple> {
        self.state.filtered_points()
    }

    pub fn filtered_points_chunked(&self) -> Vec<Vec<PersistencePointTuple>> {
        self.state.filtered_points_chunked()
    }

    /// Re-renders every dependent against the current state, synchronously.
    pub fn update(&mut self) {
        self.dependents.notify(&self.state);
    }
}

impl std::fmt::Debug for DiagramStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagramStore")
            .field("state", &self.state)
            .field("dependents", &self.dependents)
            .finish()
    }
}
