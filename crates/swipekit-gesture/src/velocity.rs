//! Periodic two-point velocity estimation.
//!
//! Velocity is derived from the distance covered between sampling-timer
//! ticks rather than between input events, so the estimate stays stable
//! across devices with wildly different event rates.

use swipekit_geometry::Point;

use crate::constants::MAX_VELOCITY;

/// Tracks the last sampled position/timestamp pair and the velocity derived
/// from it, in px/ms, each axis independently clamped to
/// [`MAX_VELOCITY`](crate::constants::MAX_VELOCITY).
#[derive(Clone, Copy, Debug)]
pub struct VelocitySampler {
    last_time_ms: u64,
    last_position: Point,
    velocity: Point,
}

impl VelocitySampler {
    pub fn new(now_ms: u64, position: Point) -> Self {
        Self {
            last_time_ms: now_ms,
            last_position: position,
            velocity: Point::ZERO,
        }
    }

    /// Folds a new observation into the estimate and returns the updated
    /// velocity. An observation with no elapsed time keeps the previous
    /// estimate (no torn division, no NaN).
    pub fn sample(&mut self, now_ms: u64, position: Point) -> Point {
        let elapsed = now_ms.saturating_sub(self.last_time_ms);
        if elapsed == 0 {
            return self.velocity;
        }

        let delta = position - self.last_position;
        let elapsed = elapsed as f32;
        self.velocity = Point::new(
            (delta.x / elapsed).clamp(-MAX_VELOCITY, MAX_VELOCITY),
            (delta.y / elapsed).clamp(-MAX_VELOCITY, MAX_VELOCITY),
        );
        self.last_time_ms = now_ms;
        self.last_position = position;
        self.velocity
    }

    pub fn velocity(&self) -> Point {
        self.velocity
    }
}
