//! Signpad Web
//!
//! Browser shell for the capture engine: a 2D-canvas drawing surface, a DOM
//! platform binding and the `SignaturePadHandle` exported to JavaScript.

#[cfg(target_arch = "wasm32")]
mod canvas;
#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod handle;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasSurface;
#[cfg(target_arch = "wasm32")]
pub use dom::DomPlatform;
#[cfg(target_arch = "wasm32")]
pub use handle::SignaturePadHandle;
