//! The draggable element controller.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use smallvec::SmallVec;
use swipekit_core::{FrameCallbackRegistration, RuntimeHandle};
use swipekit_geometry::{Point, Rect};
use swipekit_gesture::{
    Axis, Direction, EventSource, GestureEvent, PointerConfig, PointerTracker, Surface,
};

use crate::throw::{ThrowSim, ThrowStep};
use crate::PositionError;

pub type ListenerId = u64;

pub const DEFAULT_THROW_FRICTION: f32 = 0.95;
pub const DEFAULT_AMPLIFIER: f32 = 1.0;
pub const DEFAULT_VELOCITY_STOP: f32 = 0.1;

/// Configuration for a [`Draggable`].
#[derive(Clone, Copy, Debug)]
pub struct DraggableConfig {
    pub axis: Axis,
    /// Whether a fast release continues as a decelerating throw.
    pub throwable: bool,
    /// Per-frame velocity decay factor, in `(0, 1)`.
    pub throw_friction: f32,
    /// Multiplier applied to the release velocity when a throw starts.
    pub amplifier: f32,
    /// Velocity magnitude below which a throw settles, `> 0`.
    pub velocity_stop: f32,
}

impl Default for DraggableConfig {
    fn default() -> Self {
        Self {
            axis: Axis::X,
            throwable: false,
            throw_friction: DEFAULT_THROW_FRICTION,
            amplifier: DEFAULT_AMPLIFIER,
            velocity_stop: DEFAULT_VELOCITY_STOP,
        }
    }
}

impl DraggableConfig {
    /// Replaces out-of-domain fields with their defaults. A
    /// `throw_friction` outside `(0, 1)` would either freeze the throw or
    /// keep it running forever, so it is never applied verbatim.
    pub fn normalized(mut self) -> Self {
        if !self.throw_friction.is_finite()
            || self.throw_friction <= 0.0
            || self.throw_friction >= 1.0
        {
            log::warn!(
                "throw_friction {} outside (0, 1), using {DEFAULT_THROW_FRICTION}",
                self.throw_friction
            );
            self.throw_friction = DEFAULT_THROW_FRICTION;
        }
        if !self.amplifier.is_finite() || self.amplifier <= 0.0 {
            log::warn!("amplifier {} must be > 0, using {DEFAULT_AMPLIFIER}", self.amplifier);
            self.amplifier = DEFAULT_AMPLIFIER;
        }
        if !self.velocity_stop.is_finite() || self.velocity_stop <= 0.0 {
            log::warn!(
                "velocity_stop {} must be > 0, using {DEFAULT_VELOCITY_STOP}",
                self.velocity_stop
            );
            self.velocity_stop = DEFAULT_VELOCITY_STOP;
        }
        self
    }
}

/// Payload of the draggable's move/end/settle events.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragEvent {
    /// The element's (rounded) position after this event.
    pub position: Point,
    /// Running gesture delta; zero for settle events.
    pub delta: Point,
    /// Velocity at the time of the event, px/ms; zero for settle events.
    pub velocity: Point,
    pub direction: Direction,
}

type DragHandler = Rc<dyn Fn(&DragEvent)>;
type ListenerTable = RefCell<SmallVec<[(ListenerId, DragHandler); 2]>>;

struct ThrowHandle {
    sim: ThrowSim,
    registration: Option<FrameCallbackRegistration>,
}

struct DraggableInner {
    surface: Rc<dyn Surface>,
    runtime: RuntimeHandle,
    axis: Axis,
    throwable: bool,
    throw_friction: f32,
    amplifier: f32,
    velocity_stop: f32,
    limits: Cell<Rect>,
    enabled: Cell<bool>,
    relative_zero: Cell<Point>,
    current: Cell<Point>,
    dragging: Cell<bool>,
    throw: RefCell<Option<ThrowHandle>>,
    pointer: RefCell<Option<PointerTracker>>,
    move_listeners: ListenerTable,
    end_listeners: ListenerTable,
    settle_listeners: ListenerTable,
    next_listener_id: Cell<u64>,
    disposed: Cell<bool>,
}

/// Binds a pointer gesture stream to an element position.
///
/// Dragging moves the element by the friction-scaled gesture delta on the
/// configured axis, clamped into the optional limit rect. Releasing with
/// enough velocity on a throwable instance starts a decelerating throw that
/// ends in a `settle` event; any other release emits `end` immediately.
pub struct Draggable {
    inner: Rc<DraggableInner>,
}

impl Draggable {
    pub fn new(
        surface: Rc<dyn Surface>,
        events: Rc<dyn EventSource>,
        runtime: RuntimeHandle,
        config: DraggableConfig,
    ) -> Self {
        let config = config.normalized();
        let inner = Rc::new(DraggableInner {
            surface: surface.clone(),
            runtime: runtime.clone(),
            axis: config.axis,
            throwable: config.throwable,
            throw_friction: config.throw_friction,
            amplifier: config.amplifier,
            velocity_stop: config.velocity_stop,
            limits: Cell::new(Rect::UNBOUNDED),
            enabled: Cell::new(true),
            relative_zero: Cell::new(surface.offset()),
            current: Cell::new(surface.offset()),
            dragging: Cell::new(false),
            throw: RefCell::new(None),
            pointer: RefCell::new(None),
            move_listeners: RefCell::new(SmallVec::new()),
            end_listeners: RefCell::new(SmallVec::new()),
            settle_listeners: RefCell::new(SmallVec::new()),
            next_listener_id: Cell::new(1),
            disposed: Cell::new(false),
        });

        // Dragging must win over native scrolling while a gesture is live.
        let tracker = PointerTracker::new(
            surface,
            events,
            runtime,
            PointerConfig {
                axis: config.axis,
                prevent_default: true,
                friction: 1.0,
            },
        );

        let weak = Rc::downgrade(&inner);
        tracker.on_start(move |event| {
            if let Some(inner) = weak.upgrade() {
                inner.on_gesture_start(event);
            }
        });
        let weak = Rc::downgrade(&inner);
        tracker.on_move(move |event| {
            if let Some(inner) = weak.upgrade() {
                inner.on_gesture_move(event);
            }
        });
        let weak = Rc::downgrade(&inner);
        tracker.on_end(move |event| {
            if let Some(inner) = weak.upgrade() {
                DraggableInner::on_gesture_end(&inner, event);
            }
        });

        *inner.pointer.borrow_mut() = Some(tracker);
        Self { inner }
    }

    // Positioning.

    /// Places the element at `(x, y)` in parent-relative pixels, clamped to
    /// the limits and rounded to whole pixels. Also resets the drag origin,
    /// so the next gesture moves relative to the new position.
    ///
    /// Errors when the containing block has zero size on a configured axis;
    /// callers typically retry after layout. Works while disabled.
    pub fn set_position(&self, x: f32, y: f32) -> Result<Point, PositionError> {
        let parent = self.inner.surface.parent_size();
        if self.inner.axis.has_x() && parent.width <= 0.0 {
            return Err(PositionError::EmptyContainer { axis: Axis::X });
        }
        if self.inner.axis.has_y() && parent.height <= 0.0 {
            return Err(PositionError::EmptyContainer { axis: Axis::Y });
        }

        let clamped = self.inner.write_clamped(Point::new(x, y));
        self.inner.relative_zero.set(clamped);
        Ok(clamped)
    }

    /// The element's current position in parent-relative pixels.
    pub fn position(&self) -> Point {
        self.inner.current.get()
    }

    /// The current position as a percentage (0–100 per axis) of the movable
    /// range `parent - element`; zero where the range is empty.
    pub fn position_percent(&self) -> Point {
        let current = self.inner.current.get();
        let parent = self.inner.surface.parent_size();
        let size = self.inner.surface.size();
        let range_x = parent.width - size.width;
        let range_y = parent.height - size.height;
        Point::new(
            if range_x > 0.0 {
                current.x / range_x * 100.0
            } else {
                0.0
            },
            if range_y > 0.0 {
                current.y / range_y * 100.0
            } else {
                0.0
            },
        )
    }

    /// Installs the limit rect applied to every subsequent position write.
    /// NaN components leave the corresponding bound open.
    pub fn set_limits(&self, limits: Rect) {
        self.inner.limits.set(limits);
    }

    pub fn limits(&self) -> Rect {
        self.inner.limits.get()
    }

    // Friction.

    pub fn friction(&self) -> f32 {
        self.inner
            .pointer
            .borrow()
            .as_ref()
            .map(|pointer| pointer.friction())
            .unwrap_or(1.0)
    }

    /// Sets the drag friction, clamped into `[0, 1]`. Zero freezes
    /// drag-driven movement entirely; programmatic positioning is
    /// unaffected.
    pub fn set_friction(&self, friction: f32) {
        if let Some(pointer) = self.inner.pointer.borrow().as_ref() {
            pointer.set_friction(friction);
        }
    }

    // Enablement.

    pub fn enabled(&self) -> bool {
        self.inner.enabled.get()
    }

    /// Gates pointer-driven updates. Programmatic positioning keeps
    /// working while disabled.
    pub fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.set(enabled);
    }

    // State queries.

    pub fn axis(&self) -> Axis {
        self.inner.axis
    }

    pub fn is_throwable(&self) -> bool {
        self.inner.throwable
    }

    pub fn is_dragging(&self) -> bool {
        self.inner.dragging.get()
    }

    pub fn is_throwing(&self) -> bool {
        self.inner.throw.borrow().is_some()
    }

    // Events.

    pub fn on_move(&self, handler: impl Fn(&DragEvent) + 'static) -> ListenerId {
        self.inner.add_listener(&self.inner.move_listeners, handler)
    }

    pub fn on_end(&self, handler: impl Fn(&DragEvent) + 'static) -> ListenerId {
        self.inner.add_listener(&self.inner.end_listeners, handler)
    }

    pub fn on_settle(&self, handler: impl Fn(&DragEvent) + 'static) -> ListenerId {
        self.inner
            .add_listener(&self.inner.settle_listeners, handler)
    }

    pub fn off_move(&self, id: ListenerId) {
        remove_listener(&self.inner.move_listeners, id);
    }

    pub fn off_end(&self, id: ListenerId) {
        remove_listener(&self.inner.end_listeners, id);
    }

    pub fn off_settle(&self, id: ListenerId) {
        remove_listener(&self.inner.settle_listeners, id);
    }

    /// Re-reads the world after a container resize: cancels an in-flight
    /// throw and re-clamps the stored position into the current limits.
    /// An actively held drag is left alone.
    pub fn refresh(&self) {
        if self.inner.disposed.get() {
            return;
        }
        self.inner.cancel_throw();
        if self.inner.dragging.get() {
            return;
        }
        let current = self.inner.current.get();
        let clamped = self.inner.limits.get().clamp_point(current).rounded();
        if clamped != current {
            self.inner.write(clamped);
            self.inner.relative_zero.set(clamped);
        }
    }

    /// Cancels any throw, disposes the owned tracker, and removes the
    /// written position from the element. Safe to call more than once.
    pub fn dispose(&self) {
        self.inner.dispose();
    }
}

impl Drop for Draggable {
    fn drop(&mut self) {
        self.inner.dispose();
    }
}

impl DraggableInner {
    fn on_gesture_start(&self, _event: &GestureEvent) {
        if self.disposed.get() || !self.enabled.get() {
            return;
        }
        // Grabbing a still-moving element: stop the throw where it is and
        // drag from there.
        self.cancel_throw();
        self.relative_zero.set(self.current.get());
        self.dragging.set(true);
    }

    fn on_gesture_move(&self, event: &GestureEvent) {
        if self.disposed.get() || !self.enabled.get() || !self.dragging.get() {
            return;
        }

        let scaled = self
            .pointer
            .borrow()
            .as_ref()
            .map(|pointer| pointer.apply_friction(event.delta))
            .unwrap_or(event.delta);

        let zero = self.relative_zero.get();
        let mut candidate = self.current.get();
        if self.axis.has_x() {
            candidate.x = zero.x + scaled.x;
        }
        if self.axis.has_y() {
            candidate.y = zero.y + scaled.y;
        }

        let written = self.write_clamped(candidate);
        self.emit(
            &self.move_listeners,
            &DragEvent {
                position: written,
                delta: event.delta,
                velocity: event.velocity,
                direction: event.direction,
            },
        );
    }

    fn on_gesture_end(inner: &Rc<Self>, event: &GestureEvent) {
        let was_dragging = inner.dragging.replace(false);
        if inner.disposed.get() || !inner.enabled.get() || !was_dragging {
            return;
        }
        let deactivated = inner
            .pointer
            .borrow()
            .as_ref()
            .map(|pointer| pointer.is_deactivated())
            .unwrap_or(false);
        if deactivated {
            return;
        }

        let has_velocity = inner
            .pointer
            .borrow()
            .as_ref()
            .map(|pointer| pointer.has_velocity(event.velocity))
            .unwrap_or(false);

        if inner.throwable && has_velocity {
            Self::start_throw(inner, event.velocity.scale(inner.amplifier));
        } else {
            inner.emit(
                &inner.end_listeners,
                &DragEvent {
                    position: inner.current.get(),
                    delta: event.delta,
                    velocity: event.velocity,
                    direction: event.direction,
                },
            );
        }
    }

    fn start_throw(inner: &Rc<Self>, velocity: Point) {
        log::trace!(
            "throw start: velocity ({:.2}, {:.2}) px/frame",
            velocity.x,
            velocity.y
        );
        let sim = ThrowSim::new(
            inner.current.get(),
            velocity,
            inner.throw_friction,
            inner.velocity_stop,
        );
        *inner.throw.borrow_mut() = Some(ThrowHandle {
            sim,
            registration: None,
        });
        Self::schedule_throw_frame(inner);
    }

    fn schedule_throw_frame(inner: &Rc<Self>) {
        let weak = Rc::downgrade(inner);
        let registration = inner.runtime.frame_clock().with_frame_millis(move |_| {
            if let Some(inner) = weak.upgrade() {
                Self::throw_frame(&inner);
            }
        });
        if let Some(handle) = inner.throw.borrow_mut().as_mut() {
            handle.registration = Some(registration);
        }
    }

    fn throw_frame(inner: &Rc<Self>) {
        let step = {
            let mut throw = inner.throw.borrow_mut();
            let Some(handle) = throw.as_mut() else {
                return;
            };
            // This frame's registration has fired; forget it so dropping
            // the handle later doesn't cancel an unrelated id.
            handle.registration = None;
            let limits = inner.limits.get();
            handle.sim.step(&limits)
        };

        let written = inner.write(step.position().rounded());
        match step {
            ThrowStep::Continue(_) => Self::schedule_throw_frame(inner),
            ThrowStep::Blocked(_) | ThrowStep::Settled(_) => {
                inner.throw.borrow_mut().take();
                log::trace!("throw settled at ({}, {})", written.x, written.y);
                inner.emit(
                    &inner.settle_listeners,
                    &DragEvent {
                        position: written,
                        delta: Point::ZERO,
                        velocity: Point::ZERO,
                        direction: Direction::None,
                    },
                );
            }
        }
    }

    fn cancel_throw(&self) {
        // Dropping the handle drops its frame registration, which cancels
        // the pending callback.
        self.throw.borrow_mut().take();
    }

    fn write_clamped(&self, candidate: Point) -> Point {
        self.write(self.limits.get().clamp_point(candidate).rounded())
    }

    fn write(&self, position: Point) -> Point {
        self.surface.set_offset(position);
        self.current.set(position);
        position
    }

    fn add_listener(
        &self,
        table: &ListenerTable,
        handler: impl Fn(&DragEvent) + 'static,
    ) -> ListenerId {
        let id = self.next_listener_id.get();
        self.next_listener_id.set(id + 1);
        table.borrow_mut().push((id, Rc::new(handler)));
        id
    }

    fn emit(&self, table: &ListenerTable, event: &DragEvent) {
        let handlers: SmallVec<[DragHandler; 2]> = table
            .borrow()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler(event);
        }
    }

    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.cancel_throw();
        if let Some(pointer) = self.pointer.borrow().as_ref() {
            pointer.dispose();
        }
        self.surface.clear_offset();
        self.move_listeners.borrow_mut().clear();
        self.end_listeners.borrow_mut().clear();
        self.settle_listeners.borrow_mut().clear();
    }
}

fn remove_listener(table: &ListenerTable, id: ListenerId) {
    table.borrow_mut().retain(|(entry_id, _)| *entry_id != id);
}
