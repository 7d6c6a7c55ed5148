//! Input adapter: raw platform events to one internal pointer event shape.
//!
//! Two sources exist. The native source consumes pointer events; the fallback
//! source consumes mouse and touch events for environments without pointer
//! events. One source is selected when capture starts, and its listener set is
//! recorded in an [`InputBinding`] so it can be detached exactly.

use crate::error::{SignatureError, SignatureResult};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Phase of a pointer interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

/// A single touch contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub identifier: i32,
    pub client: Point,
}

/// Raw event as delivered by the host environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawEvent {
    Pointer {
        phase: PointerPhase,
        client: Point,
        pointer_id: i32,
    },
    Mouse {
        phase: PointerPhase,
        client: Point,
    },
    Touch {
        phase: PointerPhase,
        /// Contacts currently on the surface.
        touches: Vec<TouchPoint>,
        /// Contacts that changed in this event (the lifted ones on touchend).
        changed_touches: Vec<TouchPoint>,
    },
}

/// Normalized input event consumed by the capture engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    pub phase: PointerPhase,
    /// Position in client (viewport) coordinates.
    pub client: Point,
    /// Identity of the pointer or touch contact; the stroke belongs to the
    /// contact that started it. `None` for the mouse.
    pub pointer_id: Option<i32>,
    /// Whether `pointer_id` can be used with platform pointer capture.
    pub capture: bool,
}

impl InputEvent {
    /// A pointer-events (or mouse, with `None`) event. Ids are capturable.
    pub fn new(phase: PointerPhase, client: Point, pointer_id: Option<i32>) -> Self {
        Self {
            phase,
            client,
            pointer_id,
            capture: pointer_id.is_some(),
        }
    }

    /// A touch contact. Touch identifiers own strokes but cannot be captured.
    pub fn touch(phase: PointerPhase, contact: &TouchPoint) -> Self {
        Self {
            phase,
            client: contact.client,
            pointer_id: Some(contact.identifier),
            capture: false,
        }
    }
}

/// Which input source a capture session uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputSourceKind {
    NativePointer,
    MouseTouchFallback,
}

/// Input mechanisms the host environment offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputCapabilities {
    pub pointer_events: bool,
    pub mouse_events: bool,
    pub touch_events: bool,
}

impl InputCapabilities {
    /// A modern browser.
    pub fn full() -> Self {
        Self {
            pointer_events: true,
            mouse_events: true,
            touch_events: true,
        }
    }

    /// Mouse and touch only, no pointer events.
    pub fn legacy() -> Self {
        Self {
            pointer_events: false,
            mouse_events: true,
            touch_events: true,
        }
    }

    pub fn none() -> Self {
        Self {
            pointer_events: false,
            mouse_events: false,
            touch_events: false,
        }
    }
}

/// DOM event type a listener is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RawEventKind {
    PointerDown,
    PointerMove,
    PointerUp,
    MouseDown,
    MouseMove,
    MouseUp,
    TouchStart,
    TouchMove,
    TouchEnd,
}

impl RawEventKind {
    /// DOM event name.
    pub fn dom_name(self) -> &'static str {
        match self {
            RawEventKind::PointerDown => "pointerdown",
            RawEventKind::PointerMove => "pointermove",
            RawEventKind::PointerUp => "pointerup",
            RawEventKind::MouseDown => "mousedown",
            RawEventKind::MouseMove => "mousemove",
            RawEventKind::MouseUp => "mouseup",
            RawEventKind::TouchStart => "touchstart",
            RawEventKind::TouchMove => "touchmove",
            RawEventKind::TouchEnd => "touchend",
        }
    }

    pub fn phase(self) -> PointerPhase {
        match self {
            RawEventKind::PointerDown | RawEventKind::MouseDown | RawEventKind::TouchStart => PointerPhase::Down,
            RawEventKind::PointerMove | RawEventKind::MouseMove | RawEventKind::TouchMove => PointerPhase::Move,
            RawEventKind::PointerUp | RawEventKind::MouseUp | RawEventKind::TouchEnd => PointerPhase::Up,
        }
    }
}

/// Where a listener is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListenerTarget {
    /// The ink surface element.
    Surface,
    /// The window, so releases outside the surface still end the stroke.
    Window,
}

/// One registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Listener {
    pub target: ListenerTarget,
    pub event: RawEventKind,
    /// Passive listeners cannot cancel the default gesture.
    pub passive: bool,
}

impl Listener {
    const fn new(target: ListenerTarget, event: RawEventKind, passive: bool) -> Self {
        Self { target, event, passive }
    }
}

/// The exact listener set attached for one capture session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputBinding {
    pub source: InputSourceKind,
    pub listeners: Vec<Listener>,
}

impl InputBinding {
    pub fn contains(&self, event: RawEventKind) -> bool {
        self.listeners.iter().any(|l| l.event == event)
    }
}

/// A way of turning raw events into [`InputEvent`]s.
pub trait InputSource {
    fn kind(&self) -> InputSourceKind;

    /// Listeners this source needs in an environment with `caps`.
    fn listeners(&self, caps: &InputCapabilities) -> Vec<Listener>;

    /// Translate a raw event. Events of other families yield nothing; a touch
    /// event yields one event per changed contact.
    fn translate(&self, raw: &RawEvent) -> Vec<InputEvent>;

    /// Build the binding to attach for this source.
    fn binding(&self, caps: &InputCapabilities) -> InputBinding {
        InputBinding {
            source: self.kind(),
            listeners: self.listeners(caps),
        }
    }
}

/// Native pointer events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativePointerSource;

impl InputSource for NativePointerSource {
    fn kind(&self) -> InputSourceKind {
        InputSourceKind::NativePointer
    }

    fn listeners(&self, _caps: &InputCapabilities) -> Vec<Listener> {
        vec![
            Listener::new(ListenerTarget::Surface, RawEventKind::PointerDown, false),
            Listener::new(ListenerTarget::Surface, RawEventKind::PointerMove, true),
            Listener::new(ListenerTarget::Window, RawEventKind::PointerUp, true),
        ]
    }

    fn translate(&self, raw: &RawEvent) -> Vec<InputEvent> {
        match *raw {
            RawEvent::Pointer {
                phase,
                client,
                pointer_id,
            } => vec![InputEvent::new(phase, client, Some(pointer_id))],
            _ => Vec::new(),
        }
    }
}

/// Mouse and touch events for environments without pointer events.
///
/// Touch identifiers decide which contact owns a stroke. Pointer capture
/// belongs to the pointer-events API and is skipped on this path.
#[derive(Debug, Clone, Copy, Default)]
pub struct MouseTouchFallbackSource;

impl InputSource for MouseTouchFallbackSource {
    fn kind(&self) -> InputSourceKind {
        InputSourceKind::MouseTouchFallback
    }

    fn listeners(&self, caps: &InputCapabilities) -> Vec<Listener> {
        let mut listeners = Vec::with_capacity(6);
        if caps.mouse_events {
            listeners.push(Listener::new(ListenerTarget::Surface, RawEventKind::MouseDown, false));
            listeners.push(Listener::new(ListenerTarget::Surface, RawEventKind::MouseMove, true));
            listeners.push(Listener::new(ListenerTarget::Window, RawEventKind::MouseUp, true));
        }
        if caps.touch_events {
            // Non-passive so the handler can cancel scrolling and synthetic mouse events
            listeners.push(Listener::new(ListenerTarget::Surface, RawEventKind::TouchStart, false));
            listeners.push(Listener::new(ListenerTarget::Surface, RawEventKind::TouchMove, false));
            listeners.push(Listener::new(ListenerTarget::Surface, RawEventKind::TouchEnd, false));
        }
        listeners
    }

    fn translate(&self, raw: &RawEvent) -> Vec<InputEvent> {
        match raw {
            RawEvent::Mouse { phase, client } => vec![InputEvent::new(*phase, *client, None)],
            RawEvent::Touch {
                phase,
                touches,
                changed_touches,
            } => {
                // Lifted contacts are only in `changed_touches`
                let contacts = match (phase, changed_touches.is_empty()) {
                    (PointerPhase::Down | PointerPhase::Move, true) => &touches[..touches.len().min(1)],
                    _ => &changed_touches[..],
                };
                contacts.iter().map(|contact| InputEvent::touch(*phase, contact)).collect()
            }
            RawEvent::Pointer { .. } => Vec::new(),
        }
    }
}

/// Pick the input source for an environment.
///
/// Native pointer events win. Without them the mouse/touch fallback is used
/// when `allow_fallback` is set and the environment has either mechanism;
/// otherwise the environment is unsupported.
pub fn select_input_source(
    caps: &InputCapabilities,
    allow_fallback: bool,
) -> SignatureResult<Box<dyn InputSource>> {
    if caps.pointer_events {
        return Ok(Box::new(NativePointerSource));
    }
    if allow_fallback && (caps.mouse_events || caps.touch_events) {
        log::info!("Pointer events unavailable, using mouse/touch fallback");
        return Ok(Box::new(MouseTouchFallbackSource));
    }
    Err(SignatureError::UnsupportedEnvironment)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(id: i32, x: f64, y: f64) -> TouchPoint {
        TouchPoint {
            identifier: id,
            client: Point::new(x, y),
        }
    }

    #[test]
    fn test_native_translates_pointer_only() {
        let source = NativePointerSource;
        let events = source.translate(&RawEvent::Pointer {
            phase: PointerPhase::Down,
            client: Point::new(10.0, 20.0),
            pointer_id: 7,
        });
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].phase, PointerPhase::Down);
        assert_eq!(events[0].pointer_id, Some(7));
        assert!(events[0].capture);

        assert!(source
            .translate(&RawEvent::Mouse {
                phase: PointerPhase::Down,
                client: Point::ZERO,
            })
            .is_empty());
    }

    #[test]
    fn test_native_binding_has_window_release() {
        let binding = NativePointerSource.binding(&InputCapabilities::full());
        assert_eq!(binding.source, InputSourceKind::NativePointer);
        assert_eq!(binding.listeners.len(), 3);
        assert!(binding
            .listeners
            .iter()
            .any(|l| l.event == RawEventKind::PointerUp && l.target == ListenerTarget::Window));
    }

    #[test]
    fn test_fallback_touch_carries_identifiers() {
        let source = MouseTouchFallbackSource;
        let down = source.translate(&RawEvent::Touch {
            phase: PointerPhase::Down,
            touches: vec![touch(3, 5.0, 6.0), touch(4, 50.0, 60.0)],
            changed_touches: vec![touch(4, 50.0, 60.0)],
        });
        assert_eq!(down.len(), 1);
        assert_eq!(down[0].client, Point::new(50.0, 60.0));
        assert_eq!(down[0].pointer_id, Some(4));
        assert!(!down[0].capture);

        // Lifted contacts come from the changed list
        let up = source.translate(&RawEvent::Touch {
            phase: PointerPhase::Up,
            touches: vec![touch(4, 50.0, 60.0)],
            changed_touches: vec![touch(3, 8.0, 9.0)],
        });
        assert_eq!(up.len(), 1);
        assert_eq!(up[0].client, Point::new(8.0, 9.0));
        assert_eq!(up[0].pointer_id, Some(3));

        let moved = source.translate(&RawEvent::Touch {
            phase: PointerPhase::Move,
            touches: vec![touch(3, 1.0, 1.0), touch(4, 2.0, 2.0)],
            changed_touches: vec![touch(3, 1.0, 1.0), touch(4, 2.0, 2.0)],
        });
        assert_eq!(
            moved.iter().map(|e| e.pointer_id).collect::<Vec<_>>(),
            vec![Some(3), Some(4)]
        );

        // Touch move without contacts carries nothing
        assert!(source
            .translate(&RawEvent::Touch {
                phase: PointerPhase::Move,
                touches: vec![],
                changed_touches: vec![],
            })
            .is_empty());
    }

    #[test]
    fn test_fallback_mouse_has_no_identity() {
        let events = MouseTouchFallbackSource.translate(&RawEvent::Mouse {
            phase: PointerPhase::Move,
            client: Point::new(3.0, 4.0),
        });
        assert_eq!(events, vec![InputEvent::new(PointerPhase::Move, Point::new(3.0, 4.0), None)]);
        assert!(!events[0].capture);
    }

    #[test]
    fn test_fallback_listeners_follow_capabilities() {
        let source = MouseTouchFallbackSource;
        assert_eq!(source.listeners(&InputCapabilities::legacy()).len(), 6);

        let mouse_only = InputCapabilities {
            pointer_events: false,
            mouse_events: true,
            touch_events: false,
        };
        let binding = source.binding(&mouse_only);
        assert_eq!(binding.listeners.len(), 3);
        assert!(binding.contains(RawEventKind::MouseUp));
        assert!(!binding.contains(RawEventKind::TouchStart));
    }

    #[test]
    fn test_select_input_source() {
        let native = select_input_source(&InputCapabilities::full(), false).unwrap();
        assert_eq!(native.kind(), InputSourceKind::NativePointer);

        let fallback = select_input_source(&InputCapabilities::legacy(), true).unwrap();
        assert_eq!(fallback.kind(), InputSourceKind::MouseTouchFallback);

        assert!(matches!(
            select_input_source(&InputCapabilities::legacy(), false),
            Err(SignatureError::UnsupportedEnvironment)
        ));
        assert!(matches!(
            select_input_source(&InputCapabilities::none(), true),
            Err(SignatureError::UnsupportedEnvironment)
        ));
    }

    #[test]
    fn test_raw_event_kind_names() {
        assert_eq!(RawEventKind::PointerUp.dom_name(), "pointerup");
        assert_eq!(RawEventKind::TouchStart.phase(), PointerPhase::Down);
    }
}
