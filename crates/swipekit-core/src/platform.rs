//! Platform abstraction traits for the swipekit runtime.
//!
//! These traits let the runtime delegate frame scheduling and clock
//! responsibilities to the host, so the same controllers run under winit,
//! a browser event loop, or a test harness that drives time by hand.

use web_time::Instant;

/// Schedules frame processing on behalf of the runtime.
///
/// The runtime calls [`FrameScheduler::schedule_frame`] whenever a frame
/// callback or an interval timer is registered; the host is expected to
/// respond by draining the runtime on its next frame.
pub trait FrameScheduler {
    /// Request that the host schedule a new frame.
    fn schedule_frame(&self);
}

/// A scheduler that does nothing, for hosts that drain on a fixed cadence.
#[derive(Default)]
pub struct DefaultScheduler;

impl FrameScheduler for DefaultScheduler {
    fn schedule_frame(&self) {}
}

/// Provides monotonic timing information for the runtime.
pub trait Clock {
    /// Milliseconds elapsed since an arbitrary fixed origin.
    fn now_ms(&self) -> u64;
}

/// Production clock backed by [`web_time::Instant`], which degrades to
/// `performance.now()` on wasm targets.
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}
