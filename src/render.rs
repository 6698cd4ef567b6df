//! Chunked, cooperatively scheduled drawing of the filtered point pairs.
//!
//! A redraw pass clears the point layers, draws the reference line, and then
//! fans out one task per chunk. Chunk `i` sleeps `wait_time * i` before it
//! draws; the pass resolves once every chunk task has settled. Each pass
//! claims a new epoch, and chunk tasks that wake up under a newer epoch skip
//! drawing, so a fresh pass always supersedes a stale one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use egui::{pos2, Pos2, Rect, Stroke};
use futures::future::join_all;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::Instrument as _;

use crate::error::{PreconditionError, RenderError};
use crate::events::{DiagramEvent, EventBus};
use crate::options::{DiagramOptions, Padding, PointDrawFn};
use crate::point::{Bounds, PersistencePointTuple};
use crate::store::{Dependent, DiagramState};
use crate::surface::{Layer, SharedCanvas, Surface};

/// Linear data-to-canvas scale. The y axis is flipped so larger values sit
/// higher up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mapping {
    x_domain: Bounds,
    y_domain: Bounds,
    drawable: Rect,
}

fn ratio(domain: &Bounds, value: f64) -> f64 {
    let span = domain.max - domain.min;
    if span == 0.0 {
        0.5
    } else {
        (value - domain.min) / span
    }
}

impl Mapping {
    pub fn new(
        x_domain: Bounds,
        y_domain: Bounds,
        width: f32,
        height: f32,
        padding: Padding,
    ) -> Self {
        // Padding wider than the canvas collapses the drawable area to a line.
        let min = pos2(padding.left, padding.top);
        let max = pos2(
            (width - padding.right).max(min.x),
            (height - padding.bottom).max(min.y),
        );
        let drawable = Rect::from_min_max(min, max);
        Self {
            x_domain,
            y_domain,
            drawable,
        }
    }

    /// Filtered x extent and global y extent of `state`, laid out per `options`.
    pub fn for_state(
        state: &DiagramState,
        options: &DiagramOptions,
    ) -> Result<Self, RenderError> {
        let (Some(x_domain), Some(y_domain)) = (state.x_domain(), state.y_domain()) else {
            return Err(RenderError::MissingDomain);
        };
        Ok(Self::new(
            x_domain,
            y_domain,
            options.canvas_width,
            options.canvas_height,
            options.padding,
        ))
    }

    pub fn x_domain(&self) -> Bounds {
        self.x_domain
    }

    pub fn y_domain(&self) -> Bounds {
        self.y_domain
    }

    /// The inner, non-padded part of the canvas.
    pub fn drawable(&self) -> Rect {
        self.drawable
    }

    pub fn x(&self, value: f64) -> f32 {
        let t = ratio(&self.x_domain, value) as f32;
        self.drawable.left() + t * self.drawable.width()
    }

    pub fn y(&self, value: f64) -> f32 {
        let t = ratio(&self.y_domain, value) as f32;
        self.drawable.bottom() - t * self.drawable.height()
    }

    pub fn point(&self, x: f64, y: f64) -> Pos2 {
        pos2(self.x(x), self.y(y))
    }

    /// Inverse of [`Mapping::x`].
    pub fn invert_x(&self, px: f32) -> f64 {
        let width = self.drawable.width();
        if width <= 0.0 {
            return self.x_domain.min;
        }
        let t = f64::from((px - self.drawable.left()) / width);
        self.x_domain.min + t * (self.x_domain.max - self.x_domain.min)
    }
}

/// Default per-point routine: a segment from the lower to the upper point,
/// placed at their display coordinates.
pub fn draw_point(
    surface: &mut dyn Surface,
    mapping: &Mapping,
    point: &PersistencePointTuple,
    stroke: Stroke,
) {
    let lower = point.display_lower();
    let upper = point.display_upper();
    surface.line_segment(
        [mapping.point(lower.x, lower.y), mapping.point(upper.x, upper.y)],
        stroke,
    );
}

/// Connects the points with the smallest and largest `lower.x`, drawn at
/// their display positions.
pub fn draw_persistence_line<'a>(
    surface: &mut dyn Surface,
    mapping: &Mapping,
    points: impl IntoIterator<Item = &'a PersistencePointTuple>,
    stroke: Stroke,
) -> Result<(), RenderError> {
    let mut points = points.into_iter();
    let first = points.next().ok_or(RenderError::EmptyPointSet)?;
    let (leftmost, rightmost) = points.fold((first, first), |(left, right), point| {
        let x = point.lower().x;
        (
            if x < left.lower().x { point } else { left },
            if x >= right.lower().x { point } else { right },
        )
    });

    let from = leftmost.display_lower();
    let to = rightmost.display_lower();
    surface.line_segment(
        [mapping.point(from.x, from.y), mapping.point(to.x, to.y)],
        stroke,
    );
    Ok(())
}

/// Snapshot handed to one redraw pass.
#[derive(Clone, Debug)]
pub struct Frame {
    pub chunks: Vec<Vec<PersistencePointTuple>>,
    pub mapping: Mapping,
}

impl Frame {
    pub fn from_state(
        state: &DiagramState,
        options: &DiagramOptions,
    ) -> Result<Self, RenderError> {
        Ok(Self {
            chunks: state.filtered_points_chunked(),
            mapping: Mapping::for_state(state, options)?,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.iter().all(Vec::is_empty)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassOutcome {
    Completed { points: usize, chunks: usize },
    /// A newer pass started before every chunk of this one was drawn.
    Superseded { drawn_chunks: usize },
}

pub struct Renderer {
    canvas: SharedCanvas,
    events: Arc<EventBus>,
    stroke: Stroke,
    reference_stroke: Stroke,
    wait_time: Duration,
    point_draw: Option<PointDrawFn>,
    epoch: AtomicU64,
}

impl Renderer {
    pub fn new(canvas: SharedCanvas, events: Arc<EventBus>, options: &DiagramOptions) -> Self {
        Self {
            canvas,
            events,
            stroke: options.stroke,
            reference_stroke: Stroke::new(1.0, egui::Color32::TRANSPARENT),
            wait_time: options.wait_time,
            point_draw: options.point_draw.clone(),
            epoch: AtomicU64::new(0),
        }
    }

    pub fn canvas(&self) -> &SharedCanvas {
        &self.canvas
    }

    /// Makes any in-flight pass skip its remaining chunks.
    pub fn cancel(&self) {
        let _canvas = self.canvas.lock();
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    pub async fn redraw(&self, frame: Frame) -> Result<PassOutcome, RenderError> {
        if frame.is_empty() {
            return Err(RenderError::EmptyPointSet);
        }
        let span = tracing::debug_span!(
            "redraw",
            points = frame.len(),
            chunks = frame.chunks.len()
        );
        self.run_pass(frame).instrument(span).await
    }

    async fn run_pass(&self, frame: Frame) -> Result<PassOutcome, RenderError> {
        let epoch = {
            let mut canvas = self.canvas.lock();
            let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
            canvas.clear(Layer::Points);
            let reference = canvas.layer_mut(Layer::Reference);
            reference.clear();
            draw_persistence_line(
                reference,
                &frame.mapping,
                frame.chunks.iter().flatten(),
                self.reference_stroke,
            )?;
            epoch
        };
        self.events.emit(DiagramEvent::PointsCleared);

        let tasks = frame
            .chunks
            .iter()
            .enumerate()
            .map(|(index, chunk)| self.draw_chunk(epoch, index, chunk, &frame.mapping));
        let drawn_chunks = join_all(tasks)
            .await
            .into_iter()
            .filter(|drawn| *drawn)
            .count();

        if drawn_chunks < frame.chunks.len() {
            log::debug!(
                "redraw superseded after {drawn_chunks}/{} chunks",
                frame.chunks.len()
            );
            return Ok(PassOutcome::Superseded { drawn_chunks });
        }

        let points = frame.len();
        self.events.emit(DiagramEvent::PointsDrawn {
            points,
            chunks: drawn_chunks,
        });
        Ok(PassOutcome::Completed {
            points,
            chunks: drawn_chunks,
        })
    }

    async fn draw_chunk(
        &self,
        epoch: u64,
        index: usize,
        chunk: &[PersistencePointTuple],
        mapping: &Mapping,
    ) -> bool {
        let delay = self.wait_time.saturating_mul(index as u32);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut canvas = self.canvas.lock();
        if self.epoch.load(Ordering::SeqCst) != epoch {
            return false;
        }
        let layer = canvas.layer_mut(Layer::Points);
        for point in chunk {
            match &self.point_draw {
                Some(draw) => draw(layer, mapping, point, self.stroke),
                None => draw_point(layer, mapping, point, self.stroke),
            }
        }
        true
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("stroke", &self.stroke)
            .field("wait_time", &self.wait_time)
            .field("epoch", &self.epoch.load(Ordering::Relaxed))
            .finish()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PassStatus {
    #[default]
    Idle,
    Running,
    Done(PassOutcome),
    Failed(RenderError),
}

#[derive(Default)]
struct TrackerInner {
    ticket: u64,
    status: PassStatus,
    task: Option<JoinHandle<Result<PassOutcome, RenderError>>>,
}

/// Shared view on the most recently scheduled pass.
#[derive(Clone, Default)]
pub struct PassTracker {
    inner: Arc<Mutex<TrackerInner>>,
}

impl PassTracker {
    pub fn status(&self) -> PassStatus {
        self.inner.lock().status
    }

    pub fn is_running(&self) -> bool {
        matches!(self.status(), PassStatus::Running)
    }

    /// Awaits the latest scheduled pass, if it has not been awaited yet.
    pub async fn wait(&self) -> Option<Result<PassOutcome, RenderError>> {
        let task = self.inner.lock().task.take()?;
        match task.await {
            Ok(result) => Some(result),
            Err(err) => {
                log::warn!("redraw task failed: {err}");
                None
            }
        }
    }

    fn begin(&self) -> u64 {
        let mut inner = self.inner.lock();
        inner.ticket += 1;
        inner.status = PassStatus::Running;
        inner.ticket
    }

    fn finish(&self, ticket: u64, result: &Result<PassOutcome, RenderError>) {
        let mut inner = self.inner.lock();
        if inner.ticket == ticket {
            inner.status = match result {
                Ok(outcome) => PassStatus::Done(*outcome),
                Err(err) => PassStatus::Failed(*err),
            };
        }
    }
}

impl std::fmt::Debug for PassTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassTracker")
            .field("status", &self.status())
            .finish()
    }
}

/// Store dependent that starts a redraw pass on every update.
pub struct RedrawScheduler {
    renderer: Arc<Renderer>,
    options: DiagramOptions,
    handle: Handle,
    tracker: PassTracker,
}

impl RedrawScheduler {
    pub fn new(renderer: Arc<Renderer>, options: DiagramOptions, handle: Handle) -> Self {
        Self {
            renderer,
            options,
            handle,
            tracker: PassTracker::default(),
        }
    }

    /// Uses the runtime the caller is running in.
    pub fn current(
        renderer: Arc<Renderer>,
        options: DiagramOptions,
    ) -> Result<Self, PreconditionError> {
        let handle = Handle::try_current().map_err(|_| PreconditionError::NoRuntime)?;
        Ok(Self::new(renderer, options, handle))
    }

    pub fn tracker(&self) -> PassTracker {
        self.tracker.clone()
    }

    /// Awaits the pass started by the most recent refresh.
    pub async fn wait(&self) -> Option<Result<PassOutcome, RenderError>> {
        self.tracker.wait().await
    }
}

impl Dependent for RedrawScheduler {
    fn refresh(&mut self, state: &DiagramState) {
        let ticket = self.tracker.begin();
        let frame = Frame::from_state(state, &self.options);
        let renderer = self.renderer.clone();
        let tracker = self.tracker.clone();

        let task = self.handle.spawn(async move {
            let result = match frame {
                Ok(frame) => renderer.redraw(frame).await,
                Err(err) => Err(err),
            };
            if let Err(err) = &result {
                log::debug!("redraw skipped: {err}");
            }
            tracker.finish(ticket, &result);
            result
        });
        self.tracker.inner.lock().task = Some(task);
    }
}

#[cfg(test)]
mod tests {
    use egui::Color32;

    use super::*;
    use crate::events::record;
    use crate::point::{CriticalType, Vec3};
    use crate::surface::{shared_canvas, Mark};

    fn pair(x: f64, lower: f64, upper: f64) -> PersistencePointTuple {
        PersistencePointTuple::new(
            Vec3::new(x, lower, 0.0),
            Vec3::new(x, upper, 0.0),
            CriticalType::default(),
        )
    }

    fn mapping() -> Mapping {
        Mapping::new(
            Bounds::new(0.0, 10.0),
            Bounds::new(0.0, 10.0),
            120.0,
            120.0,
            Padding::uniform(10.0),
        )
    }

    fn renderer(wait_time: Duration) -> (Renderer, Arc<EventBus>) {
        let events = Arc::new(EventBus::new());
        let options = DiagramOptions::default().wait_time(wait_time);
        (
            Renderer::new(shared_canvas(120.0, 120.0), events.clone(), &options),
            events,
        )
    }

    fn frame(points: usize, chunk_size: usize) -> Frame {
        let points: Vec<_> = (0..points).map(|i| pair(i as f64 % 10.0, 0.0, 1.0)).collect();
        Frame {
            chunks: crate::filter::chunk_points(&points, chunk_size),
            mapping: mapping(),
        }
    }

    #[test]
    fn mapping_flips_y_and_inverts_x() {
        let mapping = mapping();
        assert_eq!(mapping.point(0.0, 0.0), pos2(10.0, 110.0));
        assert_eq!(mapping.point(10.0, 10.0), pos2(110.0, 10.0));
        assert!(mapping.y(7.0) < mapping.y(3.0));
        assert!((mapping.invert_x(mapping.x(4.25)) - 4.25).abs() < 1e-5);
    }

    #[test]
    fn degenerate_domain_maps_to_the_middle() {
        let mapping = Mapping::new(
            Bounds::new(2.0, 2.0),
            Bounds::new(0.0, 1.0),
            120.0,
            120.0,
            Padding::uniform(10.0),
        );
        assert_eq!(mapping.x(2.0), 60.0);
    }

    #[test]
    fn oversized_padding_collapses_the_drawable_area() {
        let mapping = Mapping::new(
            Bounds::new(0.0, 10.0),
            Bounds::new(0.0, 10.0),
            600.0,
            400.0,
            Padding::uniform(400.0),
        );
        let drawable = mapping.drawable();
        assert!(drawable.width() >= 0.0 && drawable.height() >= 0.0);
        assert_eq!(drawable.x_range().clamp(300.0), 400.0);
        assert_eq!(mapping.invert_x(400.0), 0.0);
    }

    #[test]
    fn reference_line_spans_extreme_lower_x() {
        let mut surface = crate::surface::MarkList::default();
        let points = [pair(5.0, 5.0, 6.0), pair(1.0, 1.0, 3.0), pair(9.0, 9.0, 9.5)];
        let stroke = Stroke::new(1.0, Color32::RED);

        draw_persistence_line(&mut surface, &mapping(), &points, stroke).unwrap();
        let segments: Vec<_> = surface.segments().collect();
        assert_eq!(segments, vec![[mapping().point(1.0, 1.0), mapping().point(9.0, 9.0)]]);
    }

    #[test]
    fn segments_are_placed_at_display_coordinates() {
        let point = PersistencePointTuple::with_display(
            Vec3::new(8.0, 2.0, 0.0),
            Vec3::new(8.0, 6.0, 0.0),
            Vec3::new(4.0, 1.0, 0.0),
            Vec3::new(4.0, 3.0, 0.0),
            CriticalType::default(),
        );
        let stroke = Stroke::new(1.0, Color32::RED);

        let mut surface = crate::surface::MarkList::default();
        draw_point(&mut surface, &mapping(), &point, stroke);
        let segments: Vec<_> = surface.segments().collect();
        assert_eq!(segments, vec![[mapping().point(4.0, 1.0), mapping().point(4.0, 3.0)]]);

        let mut surface = crate::surface::MarkList::default();
        let shifted = PersistencePointTuple::with_display(
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.5, 0.5, 0.0),
            Vec3::new(0.5, 1.0, 0.0),
            CriticalType::default(),
        );
        draw_persistence_line(&mut surface, &mapping(), &[point, shifted], stroke).unwrap();
        let segments: Vec<_> = surface.segments().collect();
        assert_eq!(segments, vec![[mapping().point(0.5, 0.5), mapping().point(4.0, 1.0)]]);
    }

    #[test]
    fn reference_line_needs_a_point() {
        let mut surface = crate::surface::MarkList::default();
        let result =
            draw_persistence_line(&mut surface, &mapping(), std::iter::empty(), Stroke::NONE);
        assert_eq!(result, Err(RenderError::EmptyPointSet));
        assert!(surface.marks().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn redraw_draws_every_chunk_then_reports() {
        let (renderer, events) = renderer(Duration::from_millis(10));
        let log = record(&events);

        let outcome = renderer.redraw(frame(250, 100)).await.unwrap();
        assert_eq!(outcome, PassOutcome::Completed { points: 250, chunks: 3 });

        let canvas = renderer.canvas().lock();
        assert_eq!(canvas.layer(Layer::Points).marks().len(), 250);
        assert_eq!(canvas.layer(Layer::Reference).marks().len(), 1);
        let names: Vec<_> = log.lock().iter().map(DiagramEvent::name).collect();
        assert_eq!(names, vec!["pointscleared", "pointsdrawn"]);
    }

    #[tokio::test(start_paused = true)]
    async fn chunks_wait_in_index_order() {
        let (renderer, _) = renderer(Duration::from_millis(50));
        let renderer = Arc::new(renderer);
        let pass = tokio::spawn({
            let renderer = renderer.clone();
            async move { renderer.redraw(frame(30, 10)).await }
        });

        let drawn = || renderer.canvas().lock().layer(Layer::Points).marks().len();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(drawn(), 10);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(drawn(), 20);

        pass.await.unwrap().unwrap();
        assert_eq!(drawn(), 30);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_frame_fails_without_clearing() {
        let (renderer, events) = renderer(Duration::from_millis(10));
        renderer.redraw(frame(5, 2)).await.unwrap();
        let log = record(&events);

        let empty = Frame {
            chunks: Vec::new(),
            mapping: mapping(),
        };
        assert_eq!(renderer.redraw(empty).await, Err(RenderError::EmptyPointSet));
        assert_eq!(renderer.canvas().lock().layer(Layer::Points).marks().len(), 5);
        assert!(log.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn newer_pass_supersedes_stale_chunks() {
        let (renderer, events) = renderer(Duration::from_millis(20));
        let renderer = Arc::new(renderer);
        let log = record(&events);

        let stale = tokio::spawn({
            let renderer = renderer.clone();
            async move { renderer.redraw(frame(40, 10)).await }
        });
        tokio::task::yield_now().await;

        let fresh = renderer.redraw(frame(4, 10)).await.unwrap();
        assert_eq!(fresh, PassOutcome::Completed { points: 4, chunks: 1 });
        assert_eq!(
            stale.await.unwrap().unwrap(),
            PassOutcome::Superseded { drawn_chunks: 1 }
        );

        assert_eq!(renderer.canvas().lock().layer(Layer::Points).marks().len(), 4);
        let drawn = log
            .lock()
            .iter()
            .filter(|event| matches!(event, DiagramEvent::PointsDrawn { .. }))
            .count();
        assert_eq!(drawn, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_point_draw_replaces_segments() {
        let events = Arc::new(EventBus::new());
        let options = DiagramOptions::default().point_draw(|surface, mapping, point, _| {
            let lower = point.lower();
            surface.text(
                mapping.point(lower.x, lower.y),
                egui::Align2::CENTER_CENTER,
                "x".to_owned(),
                8.0,
                Color32::WHITE,
            );
        });
        let renderer = Renderer::new(shared_canvas(120.0, 120.0), events, &options);

        renderer.redraw(frame(3, 100)).await.unwrap();
        let canvas = renderer.canvas().lock();
        assert!(canvas
            .layer(Layer::Points)
            .marks()
            .iter()
            .all(|mark| matches!(mark, Mark::Text { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn scheduler_redraws_on_refresh() {
        let (renderer, _) = renderer(Duration::from_millis(10));
        let renderer = Arc::new(renderer);
        let mut scheduler =
            RedrawScheduler::current(renderer.clone(), DiagramOptions::default()).unwrap();
        let tracker = scheduler.tracker();

        scheduler.refresh(&DiagramState::default());
        assert!(tracker.is_running());
        assert_eq!(scheduler.wait().await, Some(Err(RenderError::MissingDomain)));
        assert_eq!(tracker.status(), PassStatus::Failed(RenderError::MissingDomain));
        assert_eq!(scheduler.wait().await, None);
    }

    #[test]
    fn scheduler_requires_a_runtime() {
        let (renderer, _) = renderer(Duration::ZERO);
        let result = RedrawScheduler::current(Arc::new(renderer), DiagramOptions::default());
        assert!(matches!(result, Err(PreconditionError::NoRuntime)));
    }
}
