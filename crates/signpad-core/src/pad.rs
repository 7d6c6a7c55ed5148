//! The stroke capture engine.
//!
//! [`SignaturePad`] owns the surface state and the capture session. Input
//! arrives either as raw platform events (routed through the input source
//! selected at [`SignaturePad::start_capture`]) or as already-normalized
//! [`InputEvent`]s. All methods run on the host's event loop; nothing here
//! blocks or spawns work.

use crate::clock::{Clock, SystemClock};
use crate::color::parse_hex_color;
use crate::config::SignatureConfig;
use crate::error::{SignatureError, SignatureResult};
use crate::events::{ClearReason, EventBus, EventKind, SignatureEvent, Subscription};
use crate::input::{InputBinding, InputEvent, InputSource, InputSourceKind, PointerPhase, RawEvent, select_input_source};
use crate::platform::{Platform, TouchAction};
use crate::render::{GridStyle, RenderSurface};
use crate::stroke::{SignatureMetadata, Stroke, StrokePoint, SurfaceState};
use crate::surface::DrawingSurface;
use kurbo::{Affine, Point};

/// Result of a resize request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeOutcome {
    /// Applied width after clamping.
    pub width: u32,
    /// Applied height after clamping.
    pub height: u32,
    /// Whether the request was outside the configured bounds.
    pub clamped: bool,
}

/// Size change applied by [`SignaturePad::apply_size`].
struct AppliedSize {
    outcome: ResizeOutcome,
    scale_x: f64,
    scale_y: f64,
    renormalized: bool,
}

/// Capture lifecycle.
enum CaptureState {
    Idle,
    Capturing {
        source: Box<dyn InputSource>,
        binding: InputBinding,
    },
}

/// The stroke being drawn, with the pointer and capture session that own it.
struct ActiveStroke {
    stroke: Stroke,
    pointer_id: Option<i32>,
    session: u64,
}

struct CaptureSession {
    state: CaptureState,
    active: Option<ActiveStroke>,
    /// Monotonic time of the last accepted move.
    last_move_ms: Option<f64>,
    /// Incremented on every start; strokes from older sessions are stale.
    generation: u64,
}

impl CaptureSession {
    fn new() -> Self {
        Self {
            state: CaptureState::Idle,
            active: None,
            last_move_ms: None,
            generation: 0,
        }
    }
}

/// Builder for [`SignaturePad`].
///
/// Both drawing surfaces and the platform are required; `build` fails without
/// them.
pub struct SignaturePadBuilder<P, S> {
    config: SignatureConfig,
    ink: Option<S>,
    background: Option<S>,
    platform: Option<P>,
    clock: Option<Box<dyn Clock>>,
}

impl<P: Platform, S: DrawingSurface> SignaturePadBuilder<P, S> {
    pub fn new(config: SignatureConfig) -> Self {
        Self {
            config,
            ink: None,
            background: None,
            platform: None,
            clock: None,
        }
    }

    /// Surface strokes are painted on. Its current size becomes the initial size.
    pub fn ink_surface(mut self, surface: S) -> Self {
        self.ink = Some(surface);
        self
    }

    /// Surface beneath the ink that carries the grid.
    pub fn background_surface(mut self, surface: S) -> Self {
        self.background = Some(surface);
        self
    }

    pub fn platform(mut self, platform: P) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Override the time source (defaults to [`SystemClock`]).
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Validate the configuration and create the pad.
    pub fn build(self) -> SignatureResult<SignaturePad<P, S>> {
        self.config.validate()?;
        let ink = self.ink.ok_or(SignatureError::MissingSurface("ink"))?;
        let background = self.background.ok_or(SignatureError::MissingSurface("background"))?;
        let platform = self.platform.ok_or(SignatureError::MissingPlatform)?;
        let clock = self.clock.unwrap_or_else(|| Box::new(SystemClock::new()));

        let (width, height) = ink.size();
        let grid = GridStyle::default().with_step(self.config.grid_step);

        let mut pad = SignaturePad {
            state: SurfaceState::new(width.max(1), height.max(1), self.config.dpi),
            session: CaptureSession::new(),
            render: RenderSurface::new(ink, background, grid),
            platform,
            clock,
            events: EventBus::new(),
            stroke_color: self.config.stroke_color.clone(),
            stroke_thickness: self.config.stroke_thickness,
            config: self.config,
            destroyed: false,
        };
        // Applies bounds to the initial size and paints the grid
        pad.apply_size(width, height);
        Ok(pad)
    }
}

/// Signature capture engine.
pub struct SignaturePad<P, S> {
    config: SignatureConfig,
    state: SurfaceState,
    session: CaptureSession,
    render: RenderSurface<S>,
    platform: P,
    clock: Box<dyn Clock>,
    events: EventBus,
    stroke_color: String,
    stroke_thickness: f64,
    destroyed: bool,
}

impl<P: Platform, S: DrawingSurface> SignaturePad<P, S> {
    /// Start building a pad.
    pub fn builder(config: SignatureConfig) -> SignaturePadBuilder<P, S> {
        SignaturePadBuilder::new(config)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Begin listening for input.
    ///
    /// Native pointer events are preferred. Without them the mouse/touch
    /// fallback is activated transparently if the config allows it; otherwise
    /// (or when no mechanism exists at all) `UnsupportedEnvironment` is
    /// returned and nothing is attached. Calling this while capturing returns
    /// the current source.
    pub fn start_capture(&mut self) -> SignatureResult<InputSourceKind> {
        if self.destroyed {
            return Err(SignatureError::Destroyed);
        }
        if let CaptureState::Capturing { binding, .. } = &self.session.state {
            return Ok(binding.source);
        }

        let caps = self.platform.capabilities();
        let source = select_input_source(&caps, self.config.allow_fallback_input)?;
        let binding = source.binding(&caps);

        self.platform.attach(&binding);
        self.platform.set_touch_action(TouchAction::None);
        self.session.generation += 1;

        let kind = binding.source;
        log::info!(
            "Signature capture started ({:?}, {} listeners)",
            kind,
            binding.listeners.len()
        );
        self.session.state = CaptureState::Capturing { source, binding };
        Ok(kind)
    }

    /// Stop listening for input.
    ///
    /// A stroke in progress is left uncommitted; it is discarded by the next
    /// interaction after capture restarts.
    pub fn stop_capture(&mut self) {
        let CaptureState::Capturing { binding, .. } =
            std::mem::replace(&mut self.session.state, CaptureState::Idle)
        else {
            return;
        };

        self.platform.detach(&binding);
        self.platform.set_touch_action(TouchAction::Auto);

        if let Some(active) = &self.session.active {
            log::debug!("Capture stopped mid-stroke; {} left uncommitted", active.stroke.id);
        }
        log::info!("Signature capture stopped ({:?})", binding.source);
    }

    /// Stop capture, clear everything and drop all subscribers. Irreversible.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.stop_capture();
        self.session.active = None;
        self.clear_canvas(ClearReason::Destroy);
        self.events.clear();
        self.destroyed = true;
        log::info!("Signature pad destroyed");
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    /// Route a raw platform event through the active input source.
    ///
    /// Ignored while idle and for event families the source does not handle.
    pub fn handle_raw_event(&mut self, raw: &RawEvent) {
        let CaptureState::Capturing { source, .. } = &self.session.state else {
            log::debug!("Ignoring input while not capturing");
            return;
        };
        for event in source.translate(raw) {
            self.handle_input(event);
        }
    }

    /// Dispatch a normalized event by phase.
    pub fn handle_input(&mut self, event: InputEvent) {
        match event.phase {
            PointerPhase::Down => self.pointer_down(event),
            PointerPhase::Move => self.pointer_move(event),
            PointerPhase::Up => self.pointer_up(event),
        }
    }

    /// Begin a stroke.
    pub fn pointer_down(&mut self, event: InputEvent) {
        if !self.accepts_input() {
            return;
        }
        if let Some(active) = &self.session.active {
            if active.session == self.session.generation {
                // Single-pointer model: the first pointer wins
                log::debug!("Ignoring down while {} is active", active.stroke.id);
                return;
            }
            log::debug!("Discarding stale stroke {}", active.stroke.id);
            self.session.active = None;
        }

        if let Some(pointer_id) = event.pointer_id.filter(|_| event.capture) {
            if let Err(e) = self.platform.set_pointer_capture(pointer_id) {
                log::warn!("Failed to set pointer capture: {}", e);
            }
        }

        let stroke = Stroke::new(self.stroke_color.clone(), self.stroke_thickness);
        let stroke_id = stroke.id.clone();
        self.session.active = Some(ActiveStroke {
            stroke,
            pointer_id: event.pointer_id,
            session: self.session.generation,
        });

        self.events.emit(&SignatureEvent::StrokeStart { stroke_id });
        self.record_point(event.client);
    }

    /// Extend the active stroke, subject to throttling.
    pub fn pointer_move(&mut self, event: InputEvent) {
        if !self.accepts_input() || !self.claim_active(&event) {
            return;
        }

        let now = self.clock.monotonic_ms();
        if let Some(last) = self.session.last_move_ms {
            if now - last < self.config.throttle_interval_ms {
                return;
            }
        }
        self.session.last_move_ms = Some(now);
        self.record_point(event.client);
    }

    /// Finish and commit the active stroke.
    pub fn pointer_up(&mut self, event: InputEvent) {
        if !self.accepts_input() || !self.claim_active(&event) {
            return;
        }

        if let Some(pointer_id) = event.pointer_id.filter(|_| event.capture) {
            if let Err(e) = self.platform.release_pointer_capture(pointer_id) {
                log::warn!("Failed to release pointer capture: {}", e);
            }
        }

        // The final point is always recorded, even if it repeats the last move
        self.record_point(event.client);

        let Some(active) = self.session.active.take() else {
            return;
        };
        let stroke = active.stroke;
        self.state.strokes.push(stroke.clone());
        self.events.emit(&SignatureEvent::StrokeEnd { stroke });
    }

    fn accepts_input(&self) -> bool {
        !self.destroyed && matches!(self.session.state, CaptureState::Capturing { .. })
    }

    /// Whether `event` may continue the active stroke.
    ///
    /// Stale strokes from a previous capture session are dropped here.
    fn claim_active(&mut self, event: &InputEvent) -> bool {
        let Some(active) = &self.session.active else {
            return false;
        };
        if active.session != self.session.generation {
            log::debug!("Discarding stale stroke {}", active.stroke.id);
            self.session.active = None;
            return false;
        }
        match (active.pointer_id, event.pointer_id) {
            (Some(owner), Some(other)) if owner != other => false,
            _ => true,
        }
    }

    /// Append a point to the active stroke and paint it.
    fn record_point(&mut self, client: Point) {
        let origin = self.platform.surface_origin();
        let point = StrokePoint::new(client.x - origin.x, client.y - origin.y, self.clock.wall_clock_ms());

        let Some(active) = self.session.active.as_mut() else {
            return;
        };
        active.stroke.add_point(point);
        self.render.extend_stroke(&active.stroke);
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// Remove the most recently committed stroke and repaint the ink layer.
    pub fn undo(&mut self) -> Option<Stroke> {
        let removed = self.state.strokes.pop()?;
        self.repaint_ink();
        Some(removed)
    }

    /// Erase the ink layer and drop every committed stroke.
    pub fn clear_canvas(&mut self, reason: impl Into<ClearReason>) {
        if self.destroyed {
            log::debug!("clear_canvas after destroy ignored");
            return;
        }
        let reason = reason.into();
        self.render.clear_ink();
        self.state.strokes.clear();
        self.events.emit(&SignatureEvent::Clear { reason });
    }

    /// Resize both surfaces, rescaling strokes to the new size.
    ///
    /// Out-of-bounds requests are clamped with a warning.
    pub fn resize(&mut self, width: u32, height: u32) -> ResizeOutcome {
        if self.destroyed {
            log::debug!("resize after destroy ignored");
            return ResizeOutcome {
                width: self.state.width,
                height: self.state.height,
                clamped: false,
            };
        }

        let applied = self.apply_size(width, height);

        if applied.renormalized {
            // Geometry was rewritten in place; observers listening for clears
            // rely on this to refresh
            self.events.emit(&SignatureEvent::Clear {
                reason: ClearReason::Resize,
            });
        }
        self.events.emit(&SignatureEvent::Resized {
            width: applied.outcome.width,
            height: applied.outcome.height,
            scale_x: applied.scale_x,
            scale_y: applied.scale_y,
            renormalized: applied.renormalized,
        });

        applied.outcome
    }

    /// Clamp, resize both surfaces, repaint the grid and rescale every stroke,
    /// including the one being drawn. Emits nothing.
    fn apply_size(&mut self, width: u32, height: u32) -> AppliedSize {
        let (new_width, new_height) = self.config.clamp_size(width, height);
        let clamped = (new_width, new_height) != (width, height);
        if clamped {
            log::warn!(
                "Canvas size clamped to {}x{} (requested: {}x{})",
                new_width,
                new_height,
                width,
                height
            );
        }

        let scale_x = f64::from(new_width) / f64::from(self.state.width.max(1));
        let scale_y = f64::from(new_height) / f64::from(self.state.height.max(1));
        let renormalized = !self.state.strokes.is_empty();

        self.state = self.state.renormalized(new_width, new_height);
        if let Some(active) = self.session.active.as_mut() {
            active.stroke.transform(Affine::scale_non_uniform(scale_x, scale_y));
        }

        self.render.set_size(new_width, new_height);
        self.render.render_background();
        if renormalized || self.session.active.is_some() {
            self.repaint_ink();
        }

        AppliedSize {
            outcome: ResizeOutcome {
                width: new_width,
                height: new_height,
                clamped,
            },
            scale_x,
            scale_y,
            renormalized,
        }
    }

    /// Replay committed strokes, then the active one, onto a blank ink layer.
    fn repaint_ink(&mut self) {
        let active = self.session.active.as_ref().map(|active| &active.stroke);
        self.render.redraw(&self.state.strokes, active);
    }

    /// Ink color for strokes started after this call.
    pub fn set_stroke_color(&mut self, color: &str) -> SignatureResult<()> {
        if self.destroyed {
            return Err(SignatureError::Destroyed);
        }
        if parse_hex_color(color).is_none() {
            return Err(SignatureError::InvalidColor(color.to_string()));
        }
        self.stroke_color = color.trim().to_string();
        Ok(())
    }

    /// Line width for strokes started after this call.
    pub fn set_stroke_thickness(&mut self, thickness: f64) -> SignatureResult<()> {
        if self.destroyed {
            return Err(SignatureError::Destroyed);
        }
        if !(thickness.is_finite() && thickness > 0.0) {
            return Err(SignatureError::InvalidThickness(thickness));
        }
        self.stroke_thickness = thickness;
        Ok(())
    }

    /// Register an observer.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: FnMut(&SignatureEvent) + 'static,
    {
        self.events.subscribe(kind, handler)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn stroke_count(&self) -> usize {
        self.state.strokes.len()
    }

    /// Snapshot of the surface state.
    pub fn stroke_data(&self) -> SurfaceState {
        self.state.clone()
    }

    pub fn metadata(&self) -> SignatureMetadata {
        self.state.metadata()
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.session.state, CaptureState::Capturing { .. })
    }

    /// Source of the running capture session.
    pub fn input_source(&self) -> Option<InputSourceKind> {
        match &self.session.state {
            CaptureState::Capturing { binding, .. } => Some(binding.source),
            CaptureState::Idle => None,
        }
    }

    pub fn is_using_fallback_input(&self) -> bool {
        self.input_source() == Some(InputSourceKind::MouseTouchFallback)
    }

    pub fn has_active_stroke(&self) -> bool {
        self.session.active.is_some()
    }

    /// Read view of the stroke being drawn.
    pub fn active_stroke(&self) -> Option<&Stroke> {
        self.session.active.as_ref().map(|active| &active.stroke)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn stroke_color(&self) -> &str {
        &self.stroke_color
    }

    pub fn stroke_thickness(&self) -> f64 {
        self.stroke_thickness
    }

    pub fn config(&self) -> &SignatureConfig {
        &self.config
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn ink_surface(&self) -> &S {
        self.render.ink()
    }

    pub fn background_surface(&self) -> &S {
        self.render.background()
    }
}
