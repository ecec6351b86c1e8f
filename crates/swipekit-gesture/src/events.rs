//! Raw input events consumed by the tracker and the typed gesture events it
//! emits.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use swipekit_geometry::Point;

pub type SubscriptionId = u64;

/// Which input surface a subscription attaches to.
///
/// Presses are watched on the element itself; moves and releases are watched
/// on the document scope so a gesture keeps reporting after the pointer
/// leaves the element's bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    Element,
    Document,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RawEventKind {
    Down,
    Move,
    Up,
    Cancel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerDevice {
    Mouse,
    Touch,
    Pen,
    Unknown,
}

/// A host-normalized pointer input sample.
///
/// Hosts translate their native mouse/touch/pointer events into this shape
/// before dispatching. `target` is an opaque handle to whatever platform
/// object was under the pointer; the tracker passes it through untouched.
#[derive(Clone)]
pub struct RawPointerEvent {
    pub kind: RawEventKind,
    pub device: PointerDevice,
    /// Pointer position in page space.
    pub page: Point,
    /// Host timestamp in milliseconds.
    pub time_ms: u64,
    pub target: Option<Rc<dyn Any>>,
    default_prevented: Cell<bool>,
}

impl RawPointerEvent {
    pub fn new(kind: RawEventKind, device: PointerDevice, page: Point, time_ms: u64) -> Self {
        Self {
            kind,
            device,
            page,
            time_ms,
            target: None,
            default_prevented: Cell::new(false),
        }
    }

    pub fn with_target(mut self, target: Rc<dyn Any>) -> Self {
        self.target = Some(target);
        self
    }

    /// Asks the host to suppress the native default action (text selection,
    /// native scrolling) for this event.
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

impl fmt::Debug for RawPointerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawPointerEvent")
            .field("kind", &self.kind)
            .field("device", &self.device)
            .field("page", &self.page)
            .field("time_ms", &self.time_ms)
            .field("default_prevented", &self.default_prevented.get())
            .finish()
    }
}

/// Subscription interface to the host's low-level pointer events.
///
/// `unsubscribe` with an id that was never registered (or already removed)
/// is a silent no-op.
pub trait EventSource {
    fn subscribe(
        &self,
        scope: Scope,
        kind: RawEventKind,
        handler: Rc<dyn Fn(&RawPointerEvent)>,
    ) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);
}

/// The axis constraint a tracker or draggable is configured with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Axis {
    #[default]
    X,
    Y,
    Both,
}

impl Axis {
    pub fn is_x(&self) -> bool {
        matches!(self, Axis::X)
    }

    pub fn is_y(&self) -> bool {
        matches!(self, Axis::Y)
    }

    pub fn is_both(&self) -> bool {
        matches!(self, Axis::Both)
    }

    pub fn has_x(&self) -> bool {
        matches!(self, Axis::X | Axis::Both)
    }

    pub fn has_y(&self) -> bool {
        matches!(self, Axis::Y | Axis::Both)
    }
}

/// Discrete compass direction of a gesture, from the dominant delta sign.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    None,
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn from_delta(delta: Point) -> Self {
        if delta == Point::ZERO {
            return Direction::None;
        }
        if delta.x.abs() >= delta.y.abs() {
            if delta.x < 0.0 {
                Direction::Left
            } else {
                Direction::Right
            }
        } else if delta.y < 0.0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    /// Whether this direction lies on the given axis. `Axis::Both` accepts
    /// any concrete direction.
    pub fn is_on_axis(&self, axis: Axis) -> bool {
        match axis {
            Axis::X => matches!(self, Direction::Left | Direction::Right),
            Axis::Y => matches!(self, Direction::Up | Direction::Down),
            Axis::Both => !matches!(self, Direction::None),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GesturePhase {
    Start,
    Move,
    End,
}

/// The watched element's position at the time of a gesture event, as raw
/// pixels and as a percentage of the containing block's size.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct PositionInfo {
    pub px: Point,
    pub percent: Point,
}

/// A normalized gesture event, one per phase.
///
/// `delta` is the running displacement since gesture start, not since the
/// previous event. `velocity` is the most recent periodic sample in px/ms,
/// per-axis clamped to [`crate::constants::MAX_VELOCITY`].
#[derive(Clone)]
pub struct GestureEvent {
    pub phase: GesturePhase,
    /// Opaque platform object under the pointer, forwarded from the raw
    /// event.
    pub target: Option<Rc<dyn Any>>,
    /// Page-space pointer position at gesture start.
    pub start: Point,
    /// Current page-space pointer position.
    pub current: Point,
    pub delta: Point,
    /// Milliseconds since gesture start.
    pub delta_time: u64,
    pub velocity: Point,
    pub axis: Axis,
    pub direction: Direction,
    pub position: PositionInfo,
    /// True for an End phase produced by a platform cancellation rather
    /// than a normal release.
    pub is_cancel: bool,
    default_prevented: Rc<Cell<bool>>,
}

impl GestureEvent {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        phase: GesturePhase,
        target: Option<Rc<dyn Any>>,
        start: Point,
        current: Point,
        delta: Point,
        delta_time: u64,
        velocity: Point,
        axis: Axis,
        position: PositionInfo,
        is_cancel: bool,
    ) -> Self {
        Self {
            phase,
            target,
            start,
            current,
            delta,
            delta_time,
            velocity,
            axis,
            direction: Direction::from_delta(delta),
            position,
            is_cancel,
            default_prevented: Rc::new(Cell::new(false)),
        }
    }

    /// Marks the gesture as handled; the tracker forwards this onto the raw
    /// event so the host suppresses its native default action.
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    /// Whether the observed direction agrees with the configured axis.
    pub fn direction_on_axis(&self) -> bool {
        self.direction.is_on_axis(self.axis)
    }
}

impl fmt::Debug for GestureEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GestureEvent")
            .field("phase", &self.phase)
            .field("start", &self.start)
            .field("current", &self.current)
            .field("delta", &self.delta)
            .field("delta_time", &self.delta_time)
            .field("velocity", &self.velocity)
            .field("axis", &self.axis)
            .field("direction", &self.direction)
            .field("position", &self.position)
            .field("is_cancel", &self.is_cancel)
            .field("default_prevented", &self.default_prevented.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_from_dominant_delta() {
        assert_eq!(Direction::from_delta(Point::ZERO), Direction::None);
        assert_eq!(Direction::from_delta(Point::new(-4.0, 1.0)), Direction::Left);
        assert_eq!(Direction::from_delta(Point::new(9.0, -3.0)), Direction::Right);
        assert_eq!(Direction::from_delta(Point::new(2.0, -7.0)), Direction::Up);
        assert_eq!(Direction::from_delta(Point::new(-1.0, 6.0)), Direction::Down);
    }

    #[test]
    fn direction_axis_agreement() {
        assert!(Direction::Left.is_on_axis(Axis::X));
        assert!(!Direction::Left.is_on_axis(Axis::Y));
        assert!(Direction::Down.is_on_axis(Axis::Y));
        assert!(Direction::Down.is_on_axis(Axis::Both));
        assert!(!Direction::None.is_on_axis(Axis::Both));
    }

    #[test]
    fn prevent_default_round_trip() {
        let raw = RawPointerEvent::new(
            RawEventKind::Down,
            PointerDevice::Touch,
            Point::new(10.0, 20.0),
            0,
        );
        assert!(!raw.default_prevented());
        raw.prevent_default();
        assert!(raw.default_prevented());
    }
}
