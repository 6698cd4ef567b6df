use std::sync::Arc;

use egui::Rangef;

use crate::events::{DiagramEvent, EventBus};
use crate::point::Bounds;
use crate::render::Mapping;
use crate::store::DiagramStore;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Brush {
    clip: Rangef,
    start: f32,
    current: f32,
}

impl Brush {
    fn span(&self) -> Rangef {
        Rangef::new(self.start.min(self.current), self.start.max(self.current))
    }
}

/// Pixel geometry of an in-progress brush, clipped to the drawable width.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BrushState {
    brush: Option<Brush>,
}

impl BrushState {
    /// Starts a brush at `x`; returns the clipped start position.
    pub fn press(&mut self, x: f32, clip: Rangef) -> f32 {
        let start = clip.clamp(x);
        self.brush = Some(Brush {
            clip,
            start,
            current: start,
        });
        start
    }

    pub fn drag(&mut self, x: f32) -> Option<Rangef> {
        let brush = self.brush.as_mut()?;
        brush.current = brush.clip.clamp(x);
        Some(brush.span())
    }

    pub fn release(&mut self) -> Option<Rangef> {
        self.brush.take().map(|brush| brush.span())
    }

    pub fn cancel(&mut self) {
        self.brush = None;
    }

    pub fn span(&self) -> Option<Rangef> {
        self.brush.as_ref().map(Brush::span)
    }

    pub fn is_active(&self) -> bool {
        self.brush.is_some()
    }
}

/// Turns pointer input on the canvas into selection bounds on the store.
#[derive(Debug)]
pub struct SelectionControl {
    events: Arc<EventBus>,
    min_width: f32,
    brush: BrushState,
}

impl SelectionControl {
    pub fn new(events: Arc<EventBus>, min_width: f32) -> Self {
        Self {
            events,
            min_width,
            brush: BrushState::default(),
        }
    }

    pub fn brush(&self) -> &BrushState {
        &self.brush
    }

    pub fn pointer_down(&mut self, x: f32, mapping: &Mapping) {
        let start = self.brush.press(x, mapping.drawable().x_range());
        self.events.emit(DiagramEvent::SelectionStart { x: start });
    }

    pub fn pointer_move(&mut self, x: f32) {
        if let Some(span) = self.brush.drag(x) {
            self.events.emit(DiagramEvent::SelectionUpdating {
                start: span.min,
                end: span.max,
            });
        }
    }

    /// Commits the brush. Spans narrower than the minimum width clear the
    /// selection instead of applying it.
    pub fn pointer_up(&mut self, store: &mut DiagramStore, mapping: &Mapping) -> Option<Bounds> {
        let span = self.brush.release()?;
        let bounds = if span.span() < self.min_width {
            log::debug!("discarding {:.1}px brush", span.span());
            None
        } else {
            Some(Bounds::new(
                mapping.invert_x(span.min),
                mapping.invert_x(span.max),
            ))
        };

        store.set_active_selection_bounds(bounds);
        self.events.emit(DiagramEvent::SelectionEnd { bounds });
        bounds
    }

    pub fn clear(&mut self, store: &mut DiagramStore) {
        self.brush.cancel();
        store.set_active_selection_bounds(None);
        self.events.emit(DiagramEvent::SelectionCleared);
    }
}
