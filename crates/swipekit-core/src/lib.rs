//! Single-threaded runtime services for swipekit.
//!
//! This crate provides the two asynchronous primitives the gesture and
//! draggable controllers are built on:
//! - one-shot animation-frame callbacks, drained by the host once per frame
//! - periodic interval timers, used for velocity sampling
//!
//! Neither blocks: "waiting" is always callback registration, and the host
//! decides when frames and timer ticks actually happen.

pub mod frame_clock;
pub mod platform;
pub mod runtime;

pub use frame_clock::{FrameCallbackRegistration, FrameClock};
pub use platform::{Clock, DefaultScheduler, FrameScheduler, MonotonicClock};
pub use runtime::{FrameCallbackId, Runtime, RuntimeHandle, TimerId};
