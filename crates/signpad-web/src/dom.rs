//! DOM implementation of the platform seam.

use kurbo::Point;
use signpad_core::input::{ListenerTarget, RawEventKind};
use signpad_core::{
    InputBinding, InputCapabilities, Listener, Platform, PlatformError, PointerPhase, RawEvent, TouchAction,
    TouchPoint,
};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{AddEventListenerOptions, Event, EventTarget, HtmlElement, MouseEvent, PointerEvent, TouchEvent, TouchList, Window};

/// Where translated DOM events are delivered. Filled in once the engine exists.
pub type RawEventSink = Rc<RefCell<Option<Rc<dyn Fn(RawEvent)>>>>;

struct AttachedListener {
    listener: Listener,
    // Kept alive for as long as the listener is registered
    closure: Closure<dyn FnMut(Event)>,
}

/// Browser window plus the ink canvas element input is captured on.
pub struct DomPlatform {
    window: Window,
    surface: HtmlElement,
    sink: RawEventSink,
    attached: Vec<AttachedListener>,
}

impl DomPlatform {
    pub fn new(window: Window, surface: HtmlElement) -> Self {
        Self {
            window,
            surface,
            sink: Rc::new(RefCell::new(None)),
            attached: Vec::new(),
        }
    }

    /// Shared slot the engine handle installs its dispatcher into.
    pub fn sink(&self) -> RawEventSink {
        Rc::clone(&self.sink)
    }

    fn target(&self, target: ListenerTarget) -> &EventTarget {
        match target {
            ListenerTarget::Surface => self.surface.as_ref(),
            ListenerTarget::Window => self.window.as_ref(),
        }
    }

    fn window_has(&self, name: &str) -> bool {
        js_sys::Reflect::has(&self.window, &JsValue::from_str(name)).unwrap_or(false)
    }
}

fn touch_points(list: &TouchList) -> Vec<TouchPoint> {
    (0..list.length())
        .filter_map(|i| list.get(i))
        .map(|touch| TouchPoint {
            identifier: touch.identifier(),
            client: Point::new(f64::from(touch.client_x()), f64::from(touch.client_y())),
        })
        .collect()
}

/// Convert a DOM event delivered to a listener for `kind`.
fn to_raw_event(kind: RawEventKind, event: &Event) -> Option<RawEvent> {
    let phase: PointerPhase = kind.phase();
    match kind {
        RawEventKind::PointerDown | RawEventKind::PointerMove | RawEventKind::PointerUp => {
            let e = event.dyn_ref::<PointerEvent>()?;
            Some(RawEvent::Pointer {
                phase,
                client: Point::new(f64::from(e.client_x()), f64::from(e.client_y())),
                pointer_id: e.pointer_id(),
            })
        }
        RawEventKind::MouseDown | RawEventKind::MouseMove | RawEventKind::MouseUp => {
            let e = event.dyn_ref::<MouseEvent>()?;
            Some(RawEvent::Mouse {
                phase,
                client: Point::new(f64::from(e.client_x()), f64::from(e.client_y())),
            })
        }
        RawEventKind::TouchStart | RawEventKind::TouchMove | RawEventKind::TouchEnd => {
            let e = event.dyn_ref::<TouchEvent>()?;
            Some(RawEvent::Touch {
                phase,
                touches: touch_points(&e.touches()),
                changed_touches: touch_points(&e.changed_touches()),
            })
        }
    }
}

impl Platform for DomPlatform {
    fn capabilities(&self) -> InputCapabilities {
        InputCapabilities {
            pointer_events: self.window_has("PointerEvent"),
            mouse_events: self.window_has("MouseEvent"),
            touch_events: self.window_has("ontouchstart"),
        }
    }

    fn attach(&mut self, binding: &InputBinding) {
        for &listener in &binding.listeners {
            let sink = Rc::clone(&self.sink);
            let closure = Closure::wrap(Box::new(move |event: Event| {
                // Active listeners suppress scrolling and synthetic mouse events
                if !listener.passive {
                    event.prevent_default();
                }
                let Some(raw) = to_raw_event(listener.event, &event) else {
                    return;
                };
                // Release the slot before dispatching; handlers may re-enter
                let dispatch = sink.borrow().clone();
                if let Some(dispatch) = dispatch {
                    dispatch(raw);
                }
            }) as Box<dyn FnMut(Event)>);

            let options = AddEventListenerOptions::new();
            options.set_passive(listener.passive);
            let result = self.target(listener.target).add_event_listener_with_callback_and_add_event_listener_options(
                listener.event.dom_name(),
                closure.as_ref().unchecked_ref(),
                &options,
            );
            if let Err(e) = result {
                log::warn!("Failed to add {} listener: {:?}", listener.event.dom_name(), e);
                continue;
            }
            self.attached.push(AttachedListener { listener, closure });
        }
    }

    fn detach(&mut self, binding: &InputBinding) {
        for listener in &binding.listeners {
            let Some(pos) = self.attached.iter().position(|a| a.listener == *listener) else {
                continue;
            };
            let attached = self.attached.remove(pos);
            let result = self.target(listener.target).remove_event_listener_with_callback(
                listener.event.dom_name(),
                attached.closure.as_ref().unchecked_ref(),
            );
            if let Err(e) = result {
                log::warn!("Failed to remove {} listener: {:?}", listener.event.dom_name(), e);
            }
        }
    }

    fn set_touch_action(&mut self, action: TouchAction) {
        let style = self.surface.style();
        let result = match action {
            TouchAction::None => style.set_property("touch-action", "none"),
            TouchAction::Auto => style.remove_property("touch-action").map(|_| ()),
        };
        if let Err(e) = result {
            log::warn!("Failed to set touch-action: {:?}", e);
        }
    }

    fn surface_origin(&self) -> Point {
        let rect = self.surface.get_bounding_client_rect();
        Point::new(rect.left(), rect.top())
    }

    fn set_pointer_capture(&mut self, pointer_id: i32) -> Result<(), PlatformError> {
        self.surface
            .set_pointer_capture(pointer_id)
            .map_err(|e| PlatformError::PointerCapture {
                pointer_id,
                message: format!("{:?}", e),
            })
    }

    fn release_pointer_capture(&mut self, pointer_id: i32) -> Result<(), PlatformError> {
        self.surface
            .release_pointer_capture(pointer_id)
            .map_err(|e| PlatformError::PointerCapture {
                pointer_id,
                message: format!("{:?}", e),
            })
    }
}
