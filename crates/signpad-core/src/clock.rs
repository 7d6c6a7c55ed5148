//! Time sources for throttling and point timestamps.

use std::cell::Cell;
use std::rc::Rc;

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
use web_time::{Instant, SystemTime, UNIX_EPOCH};
#[cfg(not(target_arch = "wasm32"))]
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Source of time for the capture engine.
pub trait Clock {
    /// Monotonic milliseconds, used to throttle move events.
    fn monotonic_ms(&self) -> f64;

    /// Wall-clock milliseconds since the Unix epoch, stored on points.
    fn wall_clock_ms(&self) -> u64;
}

/// Real clock backed by the platform.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn monotonic_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    fn wall_clock_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Manually advanced clock for tests and input replay.
///
/// Clones share the same time, so a handle kept outside the pad can advance
/// the clock the pad reads.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Rc<Cell<f64>>,
    epoch_ms: u64,
}

impl ManualClock {
    /// Create a clock at monotonic time zero whose wall clock starts at `epoch_ms`.
    pub fn new(epoch_ms: u64) -> Self {
        Self {
            now_ms: Rc::new(Cell::new(0.0)),
            epoch_ms,
        }
    }

    /// Move time forward.
    pub fn advance(&self, ms: f64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }

    pub fn set(&self, ms: f64) {
        self.now_ms.set(ms);
    }
}

impl Clock for ManualClock {
    fn monotonic_ms(&self) -> f64 {
        self.now_ms.get()
    }

    fn wall_clock_ms(&self) -> u64 {
        self.epoch_ms + self.now_ms.get().max(0.0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared() {
        let clock = ManualClock::new(1_000);
        let handle = clock.clone();
        handle.advance(12.5);
        assert_eq!(clock.monotonic_ms(), 12.5);
        assert_eq!(clock.wall_clock_ms(), 1_012);
    }

    #[test]
    fn test_system_clock_monotonic() {
        let clock = SystemClock::new();
        let a = clock.monotonic_ms();
        let b = clock.monotonic_ms();
        assert!(b >= a);
        assert!(clock.wall_clock_ms() > 0);
    }
}
