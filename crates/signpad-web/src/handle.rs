//! JavaScript-facing handle and wasm entry point.

use crate::canvas::CanvasSurface;
use crate::dom::DomPlatform;
use serde::Serialize;
use signpad_core::{EventKind, RawEvent, SignatureConfig, SignatureError, SignatureEvent, SignaturePad};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

type WebPad = SignaturePad<DomPlatform, CanvasSurface>;

/// JS callbacks queued while the engine is borrowed.
type PendingCalls = Rc<RefCell<Vec<(js_sys::Function, JsValue)>>>;

/// Initialize logging for the module.
#[wasm_bindgen(start)]
pub fn run_wasm() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();

    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"signpad: logger already initialized".into());
    }
}

/// A JS `Error` carrying a stable `code` property.
fn js_error(code: &str, message: &str) -> JsValue {
    let error = js_sys::Error::new(message);
    if let Err(e) = js_sys::Reflect::set(&error, &"code".into(), &code.into()) {
        log::warn!("Failed to attach code {} to error: {:?}", code, e);
    }
    error.into()
}

fn to_js(err: SignatureError) -> JsValue {
    js_error(err.code(), &err.to_string())
}

fn to_js_value<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| js_error("SERIALIZATION", &e.to_string()))
}

/// Argument passed to JS observers.
fn payload(event: &SignatureEvent) -> Result<JsValue, JsValue> {
    match event {
        SignatureEvent::StrokeStart { stroke_id } => Ok(JsValue::from_str(stroke_id)),
        SignatureEvent::StrokeEnd { stroke } => to_js_value(stroke),
        SignatureEvent::Clear { reason } => Ok(JsValue::from_str(reason.as_str())),
        SignatureEvent::Resized { .. } => to_js_value(event),
    }
}

/// Run queued JS callbacks. Must be called with the engine borrow released.
fn flush(pending: &PendingCalls) {
    let calls = std::mem::take(&mut *pending.borrow_mut());
    for (callback, arg) in calls {
        if let Err(e) = callback.call1(&JsValue::NULL, &arg) {
            log::error!("Signature event handler threw: {:?}", e);
        }
    }
}

/// Signature pad bound to two stacked canvases.
#[wasm_bindgen]
pub struct SignaturePadHandle {
    pad: Rc<RefCell<WebPad>>,
    pending: PendingCalls,
}

impl SignaturePadHandle {
    /// Run `f` on the engine, then deliver any events it produced.
    fn with_pad<R>(&self, f: impl FnOnce(&mut WebPad) -> R) -> Result<R, JsValue> {
        let result = {
            let mut pad = self
                .pad
                .try_borrow_mut()
                .map_err(|_| js_error("BUSY", "Signature pad is already handling a call"))?;
            f(&mut pad)
        };
        flush(&self.pending);
        Ok(result)
    }
}

#[wasm_bindgen]
impl SignaturePadHandle {
    /// Bind to the ink and background canvases. `options` uses the
    /// `SignatureConfig` keys; omitted keys take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(ink_canvas_id: &str, background_canvas_id: &str, options: JsValue) -> Result<SignaturePadHandle, JsValue> {
        let window = web_sys::window().ok_or_else(|| to_js(SignatureError::MissingPlatform))?;
        let document = window.document().ok_or_else(|| to_js(SignatureError::MissingPlatform))?;

        let config: SignatureConfig = if options.is_undefined() || options.is_null() {
            SignatureConfig::default()
        } else {
            serde_wasm_bindgen::from_value(options).map_err(|e| js_error("INVALID_CONFIG", &e.to_string()))?
        };

        let ink = CanvasSurface::from_element_id(&document, ink_canvas_id, "ink").map_err(to_js)?;
        let background =
            CanvasSurface::from_element_id(&document, background_canvas_id, "background").map_err(to_js)?;
        let platform = DomPlatform::new(window, HtmlElement::from(ink.canvas().clone()));
        let sink = platform.sink();

        let pad = SignaturePad::builder(config)
            .ink_surface(ink)
            .background_surface(background)
            .platform(platform)
            .build()
            .map_err(to_js)?;
        let pad = Rc::new(RefCell::new(pad));
        let pending: PendingCalls = Rc::new(RefCell::new(Vec::new()));

        // DOM listeners reach the engine weakly so dropping the handle frees it
        let weak = Rc::downgrade(&pad);
        let pending_input = Rc::clone(&pending);
        *sink.borrow_mut() = Some(Rc::new(move |raw: RawEvent| {
            let Some(pad) = weak.upgrade() else {
                return;
            };
            let Ok(mut engine) = pad.try_borrow_mut() else {
                log::debug!("Dropping input delivered during a pad call");
                return;
            };
            engine.handle_raw_event(&raw);
            drop(engine);
            flush(&pending_input);
        }));

        log::info!("Signature pad bound to #{} / #{}", ink_canvas_id, background_canvas_id);
        Ok(Self { pad, pending })
    }

    #[wasm_bindgen(js_name = startCapture)]
    pub fn start_capture(&self) -> Result<(), JsValue> {
        self.with_pad(|pad| pad.start_capture())?.map(|_| ()).map_err(to_js)
    }

    #[wasm_bindgen(js_name = stopCapture)]
    pub fn stop_capture(&self) -> Result<(), JsValue> {
        self.with_pad(|pad| pad.stop_capture())
    }

    /// Resize both canvases; returns `{width, height, clamped}`.
    pub fn resize(&self, width: u32, height: u32) -> Result<JsValue, JsValue> {
        let outcome = self.with_pad(|pad| pad.resize(width, height))?;
        let result = js_sys::Object::new();
        js_sys::Reflect::set(&result, &"width".into(), &outcome.width.into())?;
        js_sys::Reflect::set(&result, &"height".into(), &outcome.height.into())?;
        js_sys::Reflect::set(&result, &"clamped".into(), &outcome.clamped.into())?;
        Ok(result.into())
    }

    #[wasm_bindgen(js_name = getStrokeCount)]
    pub fn get_stroke_count(&self) -> Result<u32, JsValue> {
        self.with_pad(|pad| u32::try_from(pad.stroke_count()).unwrap_or(u32::MAX))
    }

    /// `{width, height, dpi, strokes: [{id, color, thickness, points: [{x, y, time}]}]}`
    #[wasm_bindgen(js_name = getStrokeData)]
    pub fn get_stroke_data(&self) -> Result<JsValue, JsValue> {
        let data = self.with_pad(|pad| pad.stroke_data())?;
        to_js_value(&data)
    }

    #[wasm_bindgen(js_name = getMetadata)]
    pub fn get_metadata(&self) -> Result<JsValue, JsValue> {
        let metadata = self.with_pad(|pad| pad.metadata())?;
        to_js_value(&metadata)
    }

    /// Clear the ink. `reason` defaults to `"user"`.
    #[wasm_bindgen(js_name = clearCanvas)]
    pub fn clear_canvas(&self, reason: Option<String>) -> Result<(), JsValue> {
        let reason = reason.unwrap_or_else(|| "user".to_string());
        self.with_pad(|pad| pad.clear_canvas(reason))
    }

    /// Remove the last stroke. Returns whether one was removed.
    pub fn undo(&self) -> Result<bool, JsValue> {
        self.with_pad(|pad| pad.undo().is_some())
    }

    #[wasm_bindgen(js_name = setStrokeColor)]
    pub fn set_stroke_color(&self, color: &str) -> Result<(), JsValue> {
        self.with_pad(|pad| pad.set_stroke_color(color))?.map_err(to_js)
    }

    #[wasm_bindgen(js_name = setStrokeThickness)]
    pub fn set_stroke_thickness(&self, thickness: f64) -> Result<(), JsValue> {
        self.with_pad(|pad| pad.set_stroke_thickness(thickness))?.map_err(to_js)
    }

    #[wasm_bindgen(js_name = isUsingFallbackInput)]
    pub fn is_using_fallback_input(&self) -> Result<bool, JsValue> {
        self.with_pad(|pad| pad.is_using_fallback_input())
    }

    /// Subscribe `callback` to `event_name` (`onStrokeStart`, `onStrokeEnd`,
    /// `onClear`, `onResize`). Returns a function removing exactly this
    /// subscription.
    pub fn on(&self, event_name: &str, callback: js_sys::Function) -> Result<js_sys::Function, JsValue> {
        let kind: EventKind = event_name.parse().map_err(|msg: String| js_error("UNKNOWN_EVENT", &msg))?;
        let pending = Rc::clone(&self.pending);
        let subscription = self.with_pad(|pad| {
            pad.subscribe(kind, move |event| match payload(event) {
                Ok(arg) => pending.borrow_mut().push((callback.clone(), arg)),
                Err(e) => log::error!("Failed to convert {} payload: {:?}", kind.name(), e),
            })
        })?;

        let unsubscribe = Closure::wrap(Box::new(move || {
            subscription.unsubscribe();
        }) as Box<dyn FnMut()>);
        Ok(unsubscribe.into_js_value().unchecked_into())
    }

    /// Stop capture, clear and drop every subscriber. The handle is unusable
    /// afterwards.
    pub fn destroy(&self) -> Result<(), JsValue> {
        self.with_pad(|pad| pad.destroy())
    }
}
