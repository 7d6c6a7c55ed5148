//! Host environment seam.
//!
//! The engine never touches the DOM (or any other windowing system) directly.
//! Everything it needs from the host goes through [`Platform`].

use crate::error::PlatformError;
use crate::input::{InputBinding, InputCapabilities, Listener};
use kurbo::Point;

/// Touch gesture handling on the ink surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TouchAction {
    /// Browser default (scroll, pinch-zoom).
    #[default]
    Auto,
    /// Default gestures disabled while capturing.
    None,
}

/// Services the host environment provides to the capture engine.
pub trait Platform {
    /// Input mechanisms available.
    fn capabilities(&self) -> InputCapabilities;

    /// Register every listener in `binding`.
    fn attach(&mut self, binding: &InputBinding);

    /// Remove exactly the listeners in `binding`.
    fn detach(&mut self, binding: &InputBinding);

    fn set_touch_action(&mut self, action: TouchAction);

    /// On-screen origin of the ink surface in client coordinates.
    fn surface_origin(&self) -> Point;

    /// Route all events of `pointer_id` to the surface. Best-effort.
    fn set_pointer_capture(&mut self, pointer_id: i32) -> Result<(), PlatformError>;

    /// Undo [`Platform::set_pointer_capture`]. Best-effort.
    fn release_pointer_capture(&mut self, pointer_id: i32) -> Result<(), PlatformError>;
}

/// In-process platform for tests, replays and server-side use.
///
/// Tracks the attached listeners and pointer capture so callers can inspect
/// what the engine asked for.
#[derive(Debug, Clone)]
pub struct HeadlessPlatform {
    capabilities: InputCapabilities,
    origin: Point,
    attached: Vec<Listener>,
    touch_action: TouchAction,
    captured_pointer: Option<i32>,
    /// Make pointer capture calls fail.
    pub fail_pointer_capture: bool,
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new(InputCapabilities::full())
    }
}

impl HeadlessPlatform {
    pub fn new(capabilities: InputCapabilities) -> Self {
        Self {
            capabilities,
            origin: Point::ZERO,
            attached: Vec::new(),
            touch_action: TouchAction::Auto,
            captured_pointer: None,
            fail_pointer_capture: false,
        }
    }

    /// Place the surface at `origin` in client coordinates.
    pub fn with_origin(mut self, origin: Point) -> Self {
        self.origin = origin;
        self
    }

    pub fn set_origin(&mut self, origin: Point) {
        self.origin = origin;
    }

    pub fn attached_listeners(&self) -> &[Listener] {
        &self.attached
    }

    pub fn touch_action(&self) -> TouchAction {
        self.touch_action
    }

    pub fn captured_pointer(&self) -> Option<i32> {
        self.captured_pointer
    }
}

impl Platform for HeadlessPlatform {
    fn capabilities(&self) -> InputCapabilities {
        self.capabilities
    }

    fn attach(&mut self, binding: &InputBinding) {
        self.attached.extend(binding.listeners.iter().copied());
    }

    fn detach(&mut self, binding: &InputBinding) {
        for listener in &binding.listeners {
            if let Some(pos) = self.attached.iter().position(|l| l == listener) {
                self.attached.remove(pos);
            }
        }
    }

    fn set_touch_action(&mut self, action: TouchAction) {
        self.touch_action = action;
    }

    fn surface_origin(&self) -> Point {
        self.origin
    }

    fn set_pointer_capture(&mut self, pointer_id: i32) -> Result<(), PlatformError> {
        if self.fail_pointer_capture {
            return Err(PlatformError::PointerCapture {
                pointer_id,
                message: "capture rejected".to_string(),
            });
        }
        self.captured_pointer = Some(pointer_id);
        Ok(())
    }

    fn release_pointer_capture(&mut self, pointer_id: i32) -> Result<(), PlatformError> {
        if self.fail_pointer_capture {
            return Err(PlatformError::PointerCapture {
                pointer_id,
                message: "release rejected".to_string(),
            });
        }
        if self.captured_pointer == Some(pointer_id) {
            self.captured_pointer = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputSource, MouseTouchFallbackSource, NativePointerSource};

    #[test]
    fn test_detach_removes_only_binding() {
        let mut platform = HeadlessPlatform::default();
        let native = NativePointerSource.binding(&InputCapabilities::full());
        let fallback = MouseTouchFallbackSource.binding(&InputCapabilities::full());

        platform.attach(&native);
        platform.attach(&fallback);
        assert_eq!(platform.attached_listeners().len(), 9);

        platform.detach(&native);
        assert_eq!(platform.attached_listeners().len(), 6);
        assert!(platform
            .attached_listeners()
            .iter()
            .all(|l| fallback.listeners.contains(l)));
    }

    #[test]
    fn test_pointer_capture_failure() {
        let mut platform = HeadlessPlatform::default();
        platform.fail_pointer_capture = true;
        assert!(platform.set_pointer_capture(1).is_err());
        assert_eq!(platform.captured_pointer(), None);
    }
}
