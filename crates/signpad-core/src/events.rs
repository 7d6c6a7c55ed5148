//! Publish/subscribe notifications from the capture engine.

use crate::stroke::Stroke;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};
use std::str::FromStr;

/// Why the ink layer was cleared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClearReason {
    /// Explicit user action.
    #[default]
    User,
    /// Geometry rewritten in place after a resize.
    Resize,
    /// Instance teardown.
    Destroy,
    /// Any other caller-supplied tag.
    Other(String),
}

impl ClearReason {
    pub fn as_str(&self) -> &str {
        match self {
            ClearReason::User => "user",
            ClearReason::Resize => "resize",
            ClearReason::Destroy => "destroy",
            ClearReason::Other(tag) => tag,
        }
    }
}

impl fmt::Display for ClearReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ClearReason {
    fn from(tag: &str) -> Self {
        match tag {
            "user" => ClearReason::User,
            "resize" => ClearReason::Resize,
            "destroy" => ClearReason::Destroy,
            other => ClearReason::Other(other.to_string()),
        }
    }
}

impl From<String> for ClearReason {
    fn from(tag: String) -> Self {
        ClearReason::from(tag.as_str())
    }
}

impl From<ClearReason> for String {
    fn from(reason: ClearReason) -> Self {
        reason.as_str().to_string()
    }
}

/// Event kinds observers can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    StrokeStart,
    StrokeEnd,
    Clear,
    Resized,
}

impl EventKind {
    /// Name used by host pages.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::StrokeStart => "onStrokeStart",
            EventKind::StrokeEnd => "onStrokeEnd",
            EventKind::Clear => "onClear",
            EventKind::Resized => "onResize",
        }
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "onStrokeStart" | "strokeStart" => Ok(EventKind::StrokeStart),
            "onStrokeEnd" | "strokeEnd" => Ok(EventKind::StrokeEnd),
            "onClear" | "clear" => Ok(EventKind::Clear),
            "onResize" | "resize" => Ok(EventKind::Resized),
            other => Err(format!("Unknown event name: {}", other)),
        }
    }
}

/// A notification from the capture engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum SignatureEvent {
    /// A down event began a stroke.
    StrokeStart { stroke_id: String },
    /// A stroke was committed.
    StrokeEnd { stroke: Stroke },
    /// The ink layer was cleared or its geometry rewritten.
    Clear { reason: ClearReason },
    /// The surfaces changed size.
    Resized {
        width: u32,
        height: u32,
        scale_x: f64,
        scale_y: f64,
        /// Whether committed strokes were rescaled.
        renormalized: bool,
    },
}

impl SignatureEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SignatureEvent::StrokeStart { .. } => EventKind::StrokeStart,
            SignatureEvent::StrokeEnd { .. } => EventKind::StrokeEnd,
            SignatureEvent::Clear { .. } => EventKind::Clear,
            SignatureEvent::Resized { .. } => EventKind::Resized,
        }
    }
}

type Handler = Rc<RefCell<dyn FnMut(&SignatureEvent)>>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: HashMap<EventKind, Vec<(u64, Handler)>>,
}

/// Handle returned by [`EventBus::subscribe`].
///
/// Dropping it keeps the handler registered; call [`Subscription::unsubscribe`]
/// to remove it.
#[derive(Debug, Clone)]
pub struct Subscription {
    kind: EventKind,
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Remove exactly this handler. Returns false if it was already gone.
    pub fn unsubscribe(&self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let mut registry = registry.borrow_mut();
        let Some(handlers) = registry.handlers.get_mut(&self.kind) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(id, _)| *id != self.id);
        before != handlers.len()
    }
}

/// Mapping from event kind to subscribed handlers.
///
/// Handlers run synchronously on emit. A panicking handler is contained and
/// logged; the remaining handlers still run.
#[derive(Default)]
pub struct EventBus {
    registry: Rc<RefCell<Registry>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.borrow();
        let counts: HashMap<EventKind, usize> = registry
            .handlers
            .iter()
            .map(|(kind, handlers)| (*kind, handlers.len()))
            .collect();
        f.debug_struct("EventBus").field("handlers", &counts).finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event kind.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: FnMut(&SignatureEvent) + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        let handler: Handler = Rc::new(RefCell::new(handler));
        registry.handlers.entry(kind).or_default().push((id, handler));

        Subscription {
            kind,
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Deliver an event to every current subscriber of its kind.
    pub fn emit(&self, event: &SignatureEvent) {
        // Snapshot so handlers may subscribe or unsubscribe while running
        let handlers: Vec<Handler> = self
            .registry
            .borrow()
            .handlers
            .get(&event.kind())
            .map(|handlers| handlers.iter().map(|(_, h)| Rc::clone(h)).collect())
            .unwrap_or_default();

        for entry in handlers {
            let Ok(mut handler) = entry.try_borrow_mut() else {
                log::warn!("Skipping re-entrant {} handler", event.kind().name());
                continue;
            };
            let result = panic::catch_unwind(AssertUnwindSafe(|| (&mut *handler)(event)));
            if result.is_err() {
                log::error!("{} handler panicked; continuing with remaining handlers", event.kind().name());
            }
        }
    }

    /// Number of handlers subscribed to `kind`.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.registry
            .borrow()
            .handlers
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Drop every subscriber.
    pub fn clear(&self) {
        self.registry.borrow_mut().handlers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn clear_event(reason: &str) -> SignatureEvent {
        SignatureEvent::Clear {
            reason: reason.into(),
        }
    }

    #[test]
    fn test_emit_reaches_matching_kind_only() {
        let bus = EventBus::new();
        let clears = Rc::new(Cell::new(0));
        let starts = Rc::new(Cell::new(0));

        let c = Rc::clone(&clears);
        bus.subscribe(EventKind::Clear, move |_| c.set(c.get() + 1));
        let s = Rc::clone(&starts);
        bus.subscribe(EventKind::StrokeStart, move |_| s.set(s.get() + 1));

        bus.emit(&clear_event("user"));
        assert_eq!(clears.get(), 1);
        assert_eq!(starts.get(), 0);
    }

    #[test]
    fn test_unsubscribe_removes_exactly_one() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));

        let h1 = Rc::clone(&hits);
        let first = bus.subscribe(EventKind::Clear, move |_| h1.set(h1.get() + 1));
        let h2 = Rc::clone(&hits);
        bus.subscribe(EventKind::Clear, move |_| h2.set(h2.get() + 10));

        assert!(first.unsubscribe());
        assert!(!first.unsubscribe());
        assert_eq!(bus.subscriber_count(EventKind::Clear), 1);

        bus.emit(&clear_event("user"));
        assert_eq!(hits.get(), 10);
    }

    #[test]
    fn test_panicking_handler_is_isolated() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));

        bus.subscribe(EventKind::Clear, |_| panic!("observer bug"));
        let h = Rc::clone(&hits);
        bus.subscribe(EventKind::Clear, move |_| h.set(h.get() + 1));

        bus.emit(&clear_event("user"));
        bus.emit(&clear_event("user"));
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_clear_drops_all() {
        let bus = EventBus::new();
        let sub = bus.subscribe(EventKind::StrokeEnd, |_| {});
        bus.subscribe(EventKind::Clear, |_| {});
        bus.clear();
        assert_eq!(bus.subscriber_count(EventKind::StrokeEnd), 0);
        assert_eq!(bus.subscriber_count(EventKind::Clear), 0);
        assert!(!sub.unsubscribe());
    }

    #[test]
    fn test_clear_reason_round_trip() {
        assert_eq!(ClearReason::from("resize"), ClearReason::Resize);
        assert_eq!(ClearReason::from("import").to_string(), "import");
        let json = serde_json::to_string(&ClearReason::Destroy).unwrap();
        assert_eq!(json, "\"destroy\"");
    }

    #[test]
    fn test_event_kind_names() {
        assert_eq!("onStrokeEnd".parse::<EventKind>(), Ok(EventKind::StrokeEnd));
        assert_eq!(EventKind::Resized.name(), "onResize");
        assert!("onWhatever".parse::<EventKind>().is_err());
    }
}
