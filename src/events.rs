use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::point::Bounds;

/// Notifications a diagram publishes to whoever embeds it.
#[derive(Clone, Debug, PartialEq)]
pub enum DiagramEvent {
    DataLoaded { points: usize },
    SelectionStart { x: f32 },
    /// Drawable-space span of the brush while the button is held.
    SelectionUpdating { start: f32, end: f32 },
    SelectionCleared,
    /// `None` when the brush was narrower than the minimum width.
    SelectionEnd { bounds: Option<Bounds> },
    SliderDestroyed,
    SliderCreated { range: Bounds },
    PersistenceBoundsUpdating { bounds: Bounds },
    PersistenceBoundsSet { bounds: Bounds },
    PointsDrawn { points: usize, chunks: usize },
    PointsCleared,
}

impl DiagramEvent {
    /// The lowercase name the widget has always used for this event.
    pub fn name(&self) -> &'static str {
        match self {
            DiagramEvent::DataLoaded { .. } => "dataloaded",
            DiagramEvent::SelectionStart { .. } => "selectionstart",
            DiagramEvent::SelectionUpdating { .. } => "selectionupdating",
            DiagramEvent::SelectionCleared => "selectioncleared",
            DiagramEvent::SelectionEnd { .. } => "selectionend",
            DiagramEvent::SliderDestroyed => "sliderdestroyed",
            DiagramEvent::SliderCreated { .. } => "slidercreated",
            DiagramEvent::PersistenceBoundsUpdating { .. } => "persistenceboundsupdating",
            DiagramEvent::PersistenceBoundsSet { .. } => "persistenceboundsset",
            DiagramEvent::PointsDrawn { .. } => "pointsdrawn",
            DiagramEvent::PointsCleared => "pointscleared",
        }
    }
}

pub type Listener = Arc<dyn Fn(&DiagramEvent) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Listener registry shared between the store, the renderer and the controls.
///
/// Listeners run synchronously on the emitting thread, in subscription order.
#[derive(Default)]
pub struct EventBus {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(SubscriptionId, Listener)>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&DiagramEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn emit(&self, event: DiagramEvent) {
        log::trace!("emit {}", event.name());
        // Snapshot so listeners may subscribe or unsubscribe while handling.
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(&event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}

/// Collects every event into a shared vector; handy for embedding tests.
pub fn record(bus: &EventBus) -> Arc<parking_lot::Mutex<Vec<DiagramEvent>>> {
    let events = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = events.clone();
    bus.subscribe(move |event| sink.lock().push(event.clone()));
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listeners_run_in_subscription_order() {
        let bus = EventBus::new();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        for tag in ["first", "second"] {
            let order = order.clone();
            bus.subscribe(move |_| order.lock().push(tag));
        }

        bus.emit(DiagramEvent::PointsCleared);
        assert_eq!(*order.lock(), vec!["first", "second"]);
    }

    #[test]
    fn unsubscribed_listeners_stop_receiving() {
        let bus = EventBus::new();
        let events = record(&bus);
        let id = bus.subscribe(|_| panic!("should have been removed"));
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));

        bus.emit(DiagramEvent::SelectionCleared);
        assert_eq!(events.lock().len(), 1);
        assert_eq!(events.lock()[0].name(), "selectioncleared");
    }
}
