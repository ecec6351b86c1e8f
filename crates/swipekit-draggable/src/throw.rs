//! Momentum decay as an explicit state machine.
//!
//! Each animation frame advances the simulation by exactly one step, so the
//! decay is frame-rate-driven rather than time-interpolated, and tests can
//! call [`ThrowSim::step`] directly with synthetic frames.

use swipekit_geometry::{Point, Rect};

/// Outcome of one simulation step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ThrowStep {
    /// Still moving; the payload is the new position.
    Continue(Point),
    /// Clamping altered the position: the throw hit a boundary and stops
    /// there, with no bounce.
    Blocked(Point),
    /// Velocity decayed below the stop threshold.
    Settled(Point),
}

impl ThrowStep {
    pub fn position(&self) -> Point {
        match self {
            ThrowStep::Continue(p) | ThrowStep::Blocked(p) | ThrowStep::Settled(p) => *p,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ThrowStep::Continue(_))
    }
}

/// Discrete-time exponential decay: every step the position advances by the
/// current velocity (pixels per frame) and the velocity shrinks by the
/// friction factor.
#[derive(Clone, Copy, Debug)]
pub struct ThrowSim {
    position: Point,
    velocity: Point,
    throw_friction: f32,
    velocity_stop: f32,
}

impl ThrowSim {
    pub fn new(position: Point, velocity: Point, throw_friction: f32, velocity_stop: f32) -> Self {
        Self {
            position,
            velocity,
            throw_friction,
            velocity_stop,
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn velocity(&self) -> Point {
        self.velocity
    }

    /// Advances one frame. With `throw_friction < 1` and `velocity_stop > 0`
    /// the number of `Continue` results is bounded by
    /// `log(velocity_stop / |v0|) / log(throw_friction)`.
    pub fn step(&mut self, limits: &Rect) -> ThrowStep {
        let candidate = self.position + self.velocity;
        let clamped = limits.clamp_point(candidate);
        if clamped != candidate {
            self.position = clamped;
            self.velocity = Point::ZERO;
            return ThrowStep::Blocked(clamped);
        }

        self.position = candidate;
        self.velocity = self.velocity.scale(self.throw_friction);
        if self.velocity.magnitude() <= self.velocity_stop {
            ThrowStep::Settled(self.position)
        } else {
            ThrowStep::Continue(self.position)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decays_until_settled() {
        let mut sim = ThrowSim::new(Point::ZERO, Point::new(4.0, 0.0), 0.5, 0.5);
        assert_eq!(sim.step(&Rect::UNBOUNDED), ThrowStep::Continue(Point::new(4.0, 0.0)));
        assert_eq!(sim.step(&Rect::UNBOUNDED), ThrowStep::Continue(Point::new(6.0, 0.0)));
        // Velocity is now 1.0; after this step it decays to 0.5 == stop.
        assert_eq!(sim.step(&Rect::UNBOUNDED), ThrowStep::Settled(Point::new(7.0, 0.0)));
    }

    #[test]
    fn terminates_within_logarithmic_bound() {
        let v0 = 5.0f32;
        let friction = 0.95f32;
        let stop = 0.1f32;
        let bound = ((stop / v0).ln() / friction.ln()).ceil() as usize + 1;

        let mut sim = ThrowSim::new(Point::ZERO, Point::new(v0, 0.0), friction, stop);
        let mut frames = 0;
        loop {
            frames += 1;
            if sim.step(&Rect::UNBOUNDED).is_terminal() {
                break;
            }
            assert!(frames <= bound, "throw exceeded its termination bound");
        }
        assert!(frames <= bound);
    }

    #[test]
    fn stops_exactly_at_the_boundary() {
        let limits = Rect::new(0.0, 0.0, 100.0, 100.0);
        let mut sim = ThrowSim::new(Point::new(95.0, 0.0), Point::new(10.0, 0.0), 0.95, 0.1);

        let step = sim.step(&limits);
        assert_eq!(step, ThrowStep::Blocked(Point::new(100.0, 0.0)));
        assert_eq!(sim.velocity(), Point::ZERO);

        // No overshoot on a subsequent step either.
        assert_eq!(sim.step(&limits), ThrowStep::Settled(Point::new(100.0, 0.0)));
    }

    #[test]
    fn throw_from_a_boundary_blocks_on_first_frame() {
        let limits = Rect::new(0.0, 0.0, 100.0, 100.0);
        let mut sim = ThrowSim::new(Point::new(100.0, 50.0), Point::new(3.0, 0.0), 0.95, 0.1);
        assert_eq!(sim.step(&limits), ThrowStep::Blocked(Point::new(100.0, 50.0)));
    }

    #[test]
    fn unbounded_axis_never_blocks() {
        let limits = Rect::new(f32::NAN, 0.0, f32::NAN, 10.0);
        let mut sim = ThrowSim::new(Point::ZERO, Point::new(50.0, 0.0), 0.9, 0.1);
        for _ in 0..100 {
            if sim.step(&limits).is_terminal() {
                break;
            }
        }
        assert!(matches!(
            sim.step(&limits),
            ThrowStep::Settled(_) | ThrowStep::Continue(_)
        ));
        assert!(sim.position().x > 0.0);
    }
}
