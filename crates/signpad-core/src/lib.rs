//! Signpad Core Library
//!
//! Platform-agnostic stroke capture for handwritten signatures: the data
//! model, input normalization, the capture engine and its observer bus.
//! Host environments plug in through the [`Platform`] and [`DrawingSurface`]
//! traits.

pub mod clock;
pub mod color;
pub mod config;
pub mod error;
pub mod events;
pub mod input;
pub mod pad;
pub mod platform;
pub mod render;
pub mod stroke;
pub mod surface;

pub use clock::{Clock, ManualClock, SystemClock};
pub use color::{parse_hex_color, to_hex, DEFAULT_INK_HEX};
pub use config::SignatureConfig;
pub use error::{PlatformError, SignatureError, SignatureResult};
pub use events::{ClearReason, EventBus, EventKind, SignatureEvent, Subscription};
pub use input::{
    InputBinding, InputCapabilities, InputEvent, InputSource, InputSourceKind, Listener, ListenerTarget,
    PointerPhase, RawEvent, RawEventKind, TouchPoint,
};
pub use pad::{ResizeOutcome, SignaturePad, SignaturePadBuilder};
pub use platform::{HeadlessPlatform, Platform, TouchAction};
pub use render::GridStyle;
pub use stroke::{SignatureMetadata, Stroke, StrokePoint, SurfaceState};
pub use surface::{DrawCommand, DrawingSurface, RecordingSurface};
