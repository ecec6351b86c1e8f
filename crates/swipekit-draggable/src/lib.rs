//! Draggable element control for swipekit.
//!
//! [`Draggable`] binds a [`swipekit_gesture::PointerTracker`]'s gesture
//! stream to an element position: each move becomes a friction-scaled,
//! limit-clamped position write, and a fast release can continue as a
//! decelerating "throw" that settles on its own or stops dead at a
//! boundary.

pub mod draggable;
pub mod registry;
pub mod throw;

#[cfg(test)]
mod tests;

pub use draggable::{DragEvent, Draggable, DraggableConfig, ListenerId};
pub use registry::{DraggableId, DraggableRegistry};
pub use throw::{ThrowSim, ThrowStep};

/// Errors surfaced by programmatic positioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionError {
    /// The containing block reports zero size on a configured axis, so a
    /// position there has no defined percentage representation. Callers
    /// typically retry once layout has run.
    EmptyContainer { axis: swipekit_gesture::Axis },
}

impl std::fmt::Display for PositionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionError::EmptyContainer { axis } => {
                write!(f, "containing block has zero size on the {axis:?} axis")
            }
        }
    }
}

impl std::error::Error for PositionError {}
