//! Pointer gesture tracking for swipekit.
//!
//! [`PointerTracker`] normalizes mouse, touch, and pen input into a single
//! `start → move* → end` gesture stream with derived kinematics: a running
//! delta from gesture start, a periodically sampled velocity, and a
//! continuously evaluated axis-lock decision that yields diagonal gestures
//! back to the host's native scrolling.

pub mod constants;
pub mod events;
pub mod pointer;
pub mod surface;
pub mod velocity;


pub use events::{
    Axis, Direction, EventSource, GestureEvent, GesturePhase, PointerDevice, PositionInfo,
    RawEventKind, RawPointerEvent, Scope, SubscriptionId,
};
pub use pointer::{ListenerId, PointerConfig, PointerTracker};
pub use surface::Surface;
pub use velocity::VelocitySampler;
