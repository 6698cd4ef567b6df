use std::sync::Arc;

use eframe::egui::{self, Rangef, Response, Ui};
use futures::FutureExt as _;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::axes::AxisOverlay;
use crate::controls::{RangeSlider, SelectionControl};
use crate::error::{LoadError, PreconditionError, RenderError};
use crate::events::{DiagramEvent, EventBus, SubscriptionId};
use crate::loader::DatasetLoader;
use crate::options::DiagramOptions;
use crate::point::{Bounds, LoadedDataset, PersistencePointTuple};
use crate::render::{Mapping, PassStatus, PassTracker, RedrawScheduler, Renderer};
use crate::store::{Dependents, DiagramState, DiagramStore};
use crate::surface::{shared_canvas, SharedCanvas};
use crate::widgets::{DiagramCanvas, RangeSliderWidget};

struct PendingLoad {
    source_ref: String,
    task: JoinHandle<Result<LoadedDataset, LoadError>>,
}

/// One embeddable persistence diagram: store, renderer, axes and both
/// filter controls wired together.
pub struct PersistenceDiagram {
    options: DiagramOptions,
    events: Arc<EventBus>,
    canvas: SharedCanvas,
    renderer: Arc<Renderer>,
    tracker: PassTracker,
    store: DiagramStore,
    selection: Option<SelectionControl>,
    slider: Option<Arc<Mutex<RangeSlider>>>,
    runtime: Handle,
    pending: Option<PendingLoad>,
    last_error: Option<String>,
}

impl PersistenceDiagram {
    /// Builds a diagram that schedules its redraws on the current tokio
    /// runtime.
    pub fn new(
        options: DiagramOptions,
        loader: Arc<dyn DatasetLoader>,
    ) -> Result<Self, PreconditionError> {
        let runtime = Handle::try_current().map_err(|_| PreconditionError::NoRuntime)?;
        Ok(Self::with_runtime(options, loader, runtime))
    }

    pub fn with_runtime(
        options: DiagramOptions,
        loader: Arc<dyn DatasetLoader>,
        runtime: Handle,
    ) -> Self {
        let events = Arc::new(EventBus::new());
        let canvas = shared_canvas(options.canvas_width, options.canvas_height);
        let renderer = Arc::new(Renderer::new(canvas.clone(), events.clone(), &options));

        let mut dependents = Dependents::new();
        let scheduler = RedrawScheduler::new(renderer.clone(), options.clone(), runtime.clone());
        let tracker = scheduler.tracker();
        dependents.register(scheduler);
        if options.enable_axes {
            dependents.register(AxisOverlay::new(canvas.clone(), options.clone()));
        }
        let slider = options.enable_persistence_filter.then(|| {
            let slider = Arc::new(Mutex::new(RangeSlider::new()));
            let synced = slider.clone();
            let bus = events.clone();
            dependents.register(move |state: &DiagramState| {
                let published = synced.lock().sync(state);
                for event in published {
                    bus.emit(event);
                }
            });
            slider
        });
        let selection = options
            .enable_selection_filter
            .then(|| SelectionControl::new(events.clone(), options.selection_min_width));

        let store = DiagramStore::new(loader, dependents, events.clone())
            .with_chunk_size(options.chunk_size);

        Self {
            options,
            events,
            canvas,
            renderer,
            tracker,
            store,
            selection,
            slider,
            runtime,
            pending: None,
            last_error: None,
        }
    }

    pub fn options(&self) -> &DiagramOptions {
        &self.options
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&DiagramEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    pub fn canvas(&self) -> &SharedCanvas {
        &self.canvas
    }

    pub fn renderer(&self) -> &Arc<Renderer> {
        &self.renderer
    }

    pub fn store(&self) -> &DiagramStore {
        &self.store
    }

    pub fn state(&self) -> &DiagramState {
        self.store.state()
    }

    pub fn filtered_points(&self) -> Vec<PersistencePointTuple> {
        self.store.filtered_points()
    }

    pub fn tracker(&self) -> &PassTracker {
        &self.tracker
    }

    pub fn pass_status(&self) -> PassStatus {
        self.tracker.status()
    }

    pub fn mapping(&self) -> Result<Mapping, RenderError> {
        Mapping::for_state(self.store.state(), &self.options)
    }

    /// Message of the most recent failed background load.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub async fn load(&mut self, source_ref: &str) -> Result<usize, LoadError> {
        self.store.load(source_ref).await
    }

    /// Starts fetching `source_ref` on the runtime; [`Self::poll`] commits
    /// the result. A load that is still running is aborted.
    pub fn load_in_background(&mut self, source_ref: impl Into<String>) {
        let source_ref = source_ref.into();
        if let Some(previous) = self.pending.take() {
            log::debug!("abandoning load of `{}`", previous.source_ref);
            previous.task.abort();
        }

        let loader = self.store.loader().clone();
        let source = source_ref.clone();
        let task = self
            .runtime
            .spawn(async move { DiagramStore::fetch(loader.as_ref(), &source).await });
        self.pending = Some(PendingLoad { source_ref, task });
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Applies a finished background load. Returns `None` while nothing has
    /// finished.
    pub fn poll(&mut self) -> Option<Result<usize, LoadError>> {
        if !self.pending.as_ref()?.task.is_finished() {
            return None;
        }
        let PendingLoad {
            source_ref,
            mut task,
        } = self.pending.take()?;
        let Some(joined) = (&mut task).now_or_never() else {
            self.pending = Some(PendingLoad { source_ref, task });
            return None;
        };

        let result = match joined {
            Ok(Ok(dataset)) => {
                let points = dataset.points.len();
                self.store.apply(dataset);
                Ok(points)
            }
            Ok(Err(err)) => Err(err),
            Err(err) => {
                log::warn!("load task for `{source_ref}` ended abnormally: {err}");
                Err(LoadError::Cancelled)
            }
        };

        if let Err(err) = &result {
            log::warn!("loading `{source_ref}` failed: {err}");
        }
        self.last_error = result.as_ref().err().map(ToString::to_string);
        Some(result)
    }

    pub fn set_selection(&mut self, bounds: Option<Bounds>) {
        self.store.set_active_selection_bounds(bounds);
    }

    pub fn set_persistence_range(&mut self, bounds: Option<Bounds>) -> bool {
        self.store.set_active_persistence_bounds(bounds)
    }

    /// Current brush span in canvas pixels.
    pub fn brush_span(&self) -> Option<Rangef> {
        self.selection.as_ref()?.brush().span()
    }

    pub fn brush_start(&mut self, x: f32) {
        let Ok(mapping) = self.mapping() else {
            return;
        };
        if let Some(selection) = &mut self.selection {
            selection.pointer_down(x, &mapping);
        }
    }

    pub fn brush_move(&mut self, x: f32) {
        if let Some(selection) = &mut self.selection {
            selection.pointer_move(x);
        }
    }

    pub fn brush_end(&mut self) -> Option<Bounds> {
        let mapping = self.mapping().ok()?;
        self.selection
            .as_mut()?
            .pointer_up(&mut self.store, &mapping)
    }

    pub fn clear_selection(&mut self) {
        if let Some(selection) = &mut self.selection {
            selection.clear(&mut self.store);
        }
    }

    pub fn slider(&self) -> Option<&Arc<Mutex<RangeSlider>>> {
        self.slider.as_ref()
    }

    pub fn slider_grab(&mut self, value: f64) {
        if let Some(slider) = &self.slider {
            let mut slider = slider.lock();
            if let Some(handle) = slider.nearest(value) {
                slider.grab(handle);
            }
        }
    }

    pub fn slider_drag(&mut self, value: f64) -> Option<Bounds> {
        let bounds = self.slider.as_ref()?.lock().drag_to(value)?;
        self.events.emit(DiagramEvent::PersistenceBoundsUpdating { bounds });
        Some(bounds)
    }

    /// Ends a slider drag and commits its range to the store.
    pub fn slider_release(&mut self) -> Option<Bounds> {
        let bounds = self.slider.as_ref()?.lock().release()?;
        self.events.emit(DiagramEvent::PersistenceBoundsSet { bounds });
        self.store.set_active_persistence_bounds(Some(bounds));
        Some(bounds)
    }

    /// Draws the canvas and, when enabled, the persistence slider below it.
    pub fn ui(&mut self, ui: &mut Ui) -> Response {
        self.poll();

        ui.vertical(|ui| {
            let response = ui.add(DiagramCanvas::new(self));
            if self.slider.is_some() {
                ui.add(RangeSliderWidget::new(self));
            }
            if self.is_loading() {
                ui.add(egui::widgets::Spinner::new());
                ui.ctx().request_repaint();
            } else if let Some(err) = &self.last_error {
                ui.colored_label(ui.visuals().error_fg_color, err.as_str());
            }
            response
        })
        .inner
    }
}

impl Drop for PersistenceDiagram {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.task.abort();
        }
        self.renderer.cancel();
    }
}

impl std::fmt::Debug for PersistenceDiagram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceDiagram")
            .field("options", &self.options)
            .field("store", &self.store)
            .field("status", &self.pass_status())
            .field("loading", &self.is_loading())
            .finish()
    }
}
