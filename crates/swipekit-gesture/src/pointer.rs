//! Gesture tracking over host pointer events.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use smallvec::SmallVec;
use swipekit_core::{RuntimeHandle, TimerId};
use swipekit_geometry::Point;

use crate::constants::{DRAG_THRESHOLD, LOCK_THRESHOLD, SWIPE_VELOCITY, VELOCITY_INTERVAL_MS};
use crate::events::{
    Axis, EventSource, GestureEvent, GesturePhase, PositionInfo, RawEventKind, RawPointerEvent,
    Scope, SubscriptionId,
};
use crate::surface::Surface;
use crate::velocity::VelocitySampler;

pub type ListenerId = u64;

/// Configuration for a [`PointerTracker`].
#[derive(Clone, Copy, Debug)]
pub struct PointerConfig {
    /// Axis the gesture is constrained to. Single-axis trackers deactivate
    /// gestures that commit to the orthogonal axis.
    pub axis: Axis,
    /// Suppress the host's native default action for the tracked phases of
    /// every non-deactivated gesture.
    pub prevent_default: bool,
    /// Scale factor applied by [`PointerTracker::apply_friction`]; `1.0`
    /// passes deltas through unchanged.
    pub friction: f32,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            axis: Axis::X,
            prevent_default: false,
            friction: 1.0,
        }
    }
}

struct Session {
    page_start: Point,
    page: Point,
    start_time_ms: u64,
    sampler: VelocitySampler,
    timer: Option<TimerId>,
}

type GestureHandler = Rc<dyn Fn(&GestureEvent)>;
type ListenerTable = RefCell<SmallVec<[(ListenerId, GestureHandler); 2]>>;

struct PointerInner {
    surface: Rc<dyn Surface>,
    events: Rc<dyn EventSource>,
    runtime: RuntimeHandle,
    axis: Axis,
    prevent_default: bool,
    friction: Cell<f32>,
    session: RefCell<Option<Session>>,
    deactivated: Cell<bool>,
    velocity: Cell<Point>,
    start_listeners: ListenerTable,
    move_listeners: ListenerTable,
    end_listeners: ListenerTable,
    next_listener_id: Cell<u64>,
    subscriptions: RefCell<SmallVec<[SubscriptionId; 4]>>,
    disposed: Cell<bool>,
}

/// Normalizes heterogeneous pointer input into a typed three-phase gesture
/// stream with derived kinematics.
///
/// A tracker watches one element: presses on the element start a gesture,
/// and document-scope moves/releases continue and finish it. During the
/// gesture the tracker keeps a running delta, samples velocity on a
/// periodic timer, and — for single-axis trackers — continuously decides
/// whether the gesture belongs to the configured axis or should be yielded
/// back to native scrolling ("deactivated").
pub struct PointerTracker {
    inner: Rc<PointerInner>,
}

impl PointerTracker {
    pub fn new(
        surface: Rc<dyn Surface>,
        events: Rc<dyn EventSource>,
        runtime: RuntimeHandle,
        config: PointerConfig,
    ) -> Self {
        let friction = normalized_friction(config.friction);
        let inner = Rc::new(PointerInner {
            surface,
            events: events.clone(),
            runtime,
            axis: config.axis,
            prevent_default: config.prevent_default,
            friction: Cell::new(friction),
            session: RefCell::new(None),
            deactivated: Cell::new(false),
            velocity: Cell::new(Point::ZERO),
            start_listeners: RefCell::new(SmallVec::new()),
            move_listeners: RefCell::new(SmallVec::new()),
            end_listeners: RefCell::new(SmallVec::new()),
            next_listener_id: Cell::new(1),
            subscriptions: RefCell::new(SmallVec::new()),
            disposed: Cell::new(false),
        });

        let routes = [
            (Scope::Element, RawEventKind::Down),
            (Scope::Document, RawEventKind::Move),
            (Scope::Document, RawEventKind::Up),
            (Scope::Document, RawEventKind::Cancel),
        ];
        for (scope, kind) in routes {
            let weak = Rc::downgrade(&inner);
            let id = events.subscribe(
                scope,
                kind,
                Rc::new(move |raw| {
                    if let Some(inner) = weak.upgrade() {
                        PointerInner::route(&inner, raw);
                    }
                }),
            );
            inner.subscriptions.borrow_mut().push(id);
        }

        Self { inner }
    }

    // Listener registration, one channel per phase.

    pub fn on_start(&self, handler: impl Fn(&GestureEvent) + 'static) -> ListenerId {
        self.inner.add_listener(&self.inner.start_listeners, handler)
    }

    pub fn on_move(&self, handler: impl Fn(&GestureEvent) + 'static) -> ListenerId {
        self.inner.add_listener(&self.inner.move_listeners, handler)
    }

    pub fn on_end(&self, handler: impl Fn(&GestureEvent) + 'static) -> ListenerId {
        self.inner.add_listener(&self.inner.end_listeners, handler)
    }

    pub fn off_start(&self, id: ListenerId) {
        remove_listener(&self.inner.start_listeners, id);
    }

    pub fn off_move(&self, id: ListenerId) {
        remove_listener(&self.inner.move_listeners, id);
    }

    pub fn off_end(&self, id: ListenerId) {
        remove_listener(&self.inner.end_listeners, id);
    }

    // Axis queries.

    pub fn axis(&self) -> Axis {
        self.inner.axis
    }

    pub fn is_x_axis(&self) -> bool {
        self.inner.axis.is_x()
    }

    pub fn is_y_axis(&self) -> bool {
        self.inner.axis.is_y()
    }

    pub fn is_both_axis(&self) -> bool {
        self.inner.axis.is_both()
    }

    // Gesture state.

    pub fn is_active(&self) -> bool {
        self.inner.session.borrow().is_some()
    }

    /// Whether the current (or most recent) gesture failed the axis-lock
    /// check and is being ignored for its remainder.
    pub fn is_deactivated(&self) -> bool {
        self.inner.deactivated.get()
    }

    /// The most recent velocity sample, px/ms.
    pub fn last_velocity(&self) -> Point {
        self.inner.velocity.get()
    }

    // Friction.

    pub fn friction(&self) -> f32 {
        self.inner.friction.get()
    }

    /// Sets the friction factor, clamped into `[0, 1]`.
    pub fn set_friction(&self, friction: f32) {
        self.inner.friction.set(normalized_friction(friction));
    }

    /// Returns `value` scaled by this tracker's friction factor.
    pub fn apply_friction(&self, value: Point) -> Point {
        value.scale(self.inner.friction.get())
    }

    /// Whether `velocity`'s magnitude exceeds the default swipe threshold.
    pub fn has_velocity(&self, velocity: Point) -> bool {
        self.has_velocity_above(velocity, SWIPE_VELOCITY)
    }

    /// Whether `velocity`'s magnitude exceeds `threshold` (px/ms).
    /// `threshold` must be finite and non-negative; invalid thresholds are
    /// treated as zero.
    pub fn has_velocity_above(&self, velocity: Point, threshold: f32) -> bool {
        debug_assert!(
            threshold.is_finite() && threshold >= 0.0,
            "velocity threshold must be finite and >= 0"
        );
        let threshold = if threshold.is_finite() {
            threshold.max(0.0)
        } else {
            0.0
        };
        velocity.magnitude() > threshold
    }

    /// Removes all raw-event subscriptions and any velocity-sampling timer.
    /// Safe to call more than once.
    pub fn dispose(&self) {
        self.inner.dispose();
    }
}

impl Drop for PointerTracker {
    fn drop(&mut self) {
        self.inner.dispose();
    }
}

impl PointerInner {
    fn route(inner: &Rc<Self>, raw: &RawPointerEvent) {
        if inner.disposed.get() {
            return;
        }
        match raw.kind {
            RawEventKind::Down => Self::on_down(inner, raw),
            RawEventKind::Move => inner.on_move(raw),
            RawEventKind::Up => inner.on_up(raw, false),
            RawEventKind::Cancel => inner.on_up(raw, true),
        }
    }

    fn on_down(inner: &Rc<Self>, raw: &RawPointerEvent) {
        if inner.session.borrow().is_some() {
            // A second press while a gesture is live (e.g. another touch
            // point) is ignored; multi-touch is out of scope.
            return;
        }

        let now = inner.runtime.now_ms();
        inner.deactivated.set(false);
        inner.velocity.set(Point::ZERO);

        let weak = Rc::downgrade(inner);
        let timer = inner.runtime.set_interval(
            VELOCITY_INTERVAL_MS,
            Rc::new(move |now| {
                if let Some(inner) = weak.upgrade() {
                    inner.sample_velocity(now);
                }
            }),
        );

        *inner.session.borrow_mut() = Some(Session {
            page_start: raw.page,
            page: raw.page,
            start_time_ms: now,
            sampler: VelocitySampler::new(now, raw.page),
            timer,
        });

        log::trace!("gesture start at ({}, {})", raw.page.x, raw.page.y);
        let event =
            inner.build_event(GesturePhase::Start, raw, raw.page, raw.page, Point::ZERO, 0, false);
        inner.emit(&inner.start_listeners, &event);
        inner.forward_prevent_default(raw, &event);
    }

    fn on_move(&self, raw: &RawPointerEvent) {
        let (start, delta, delta_time) = {
            let mut session = self.session.borrow_mut();
            let Some(session) = session.as_mut() else {
                return;
            };
            session.page = raw.page;
            let now = self.runtime.now_ms();
            (
                session.page_start,
                session.page - session.page_start,
                now.saturating_sub(session.start_time_ms),
            )
        };

        // Axis lock is evaluated on every move, not just once: a gesture
        // may begin diagonally and only commit to one axis a few pixels in.
        if !self.deactivated.get() {
            let (on_axis, orthogonal) = match self.axis {
                Axis::X => (delta.x, delta.y),
                Axis::Y => (delta.y, delta.x),
                Axis::Both => (0.0, 0.0),
            };
            if !self.axis.is_both()
                && orthogonal.abs() > DRAG_THRESHOLD
                && on_axis.abs() <= LOCK_THRESHOLD
            {
                self.deactivated.set(true);
                log::debug!(
                    "gesture deactivated: off-axis {:.1}px before on-axis lock",
                    orthogonal.abs()
                );
            }
        }
        if self.deactivated.get() {
            return;
        }

        let event =
            self.build_event(GesturePhase::Move, raw, start, raw.page, delta, delta_time, false);
        self.emit(&self.move_listeners, &event);
        self.forward_prevent_default(raw, &event);
    }

    fn on_up(&self, raw: &RawPointerEvent, is_cancel: bool) {
        let Some(mut session) = self.session.borrow_mut().take() else {
            return;
        };
        if let Some(timer) = session.timer.take() {
            self.runtime.clear_interval(timer);
        }

        let now = self.runtime.now_ms();
        session.page = raw.page;
        // One last sample so a release shortly after the previous tick
        // still reflects the final flick.
        self.velocity.set(session.sampler.sample(now, session.page));

        let delta = session.page - session.page_start;
        let delta_time = now.saturating_sub(session.start_time_ms);
        log::trace!(
            "gesture end: delta ({:.1}, {:.1}) over {delta_time}ms, cancel={is_cancel}",
            delta.x,
            delta.y
        );

        let event = self.build_event(
            GesturePhase::End,
            raw,
            session.page_start,
            raw.page,
            delta,
            delta_time,
            is_cancel,
        );
        self.emit(&self.end_listeners, &event);
        if !self.deactivated.get() {
            self.forward_prevent_default(raw, &event);
        }
    }

    fn sample_velocity(&self, now_ms: u64) {
        let mut session = self.session.borrow_mut();
        if let Some(session) = session.as_mut() {
            let page = session.page;
            self.velocity.set(session.sampler.sample(now_ms, page));
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn build_event(
        &self,
        phase: GesturePhase,
        raw: &RawPointerEvent,
        start: Point,
        current: Point,
        delta: Point,
        delta_time: u64,
        is_cancel: bool,
    ) -> GestureEvent {
        GestureEvent::new(
            phase,
            raw.target.clone(),
            start,
            current,
            delta,
            delta_time,
            self.velocity.get(),
            self.axis,
            self.position_info(),
            is_cancel,
        )
    }

    fn position_info(&self) -> PositionInfo {
        let px = self.surface.offset();
        let parent = self.surface.parent_size();
        let percent = Point::new(
            if parent.width > 0.0 {
                px.x / parent.width * 100.0
            } else {
                0.0
            },
            if parent.height > 0.0 {
                px.y / parent.height * 100.0
            } else {
                0.0
            },
        );
        PositionInfo { px, percent }
    }

    fn add_listener(
        &self,
        table: &ListenerTable,
        handler: impl Fn(&GestureEvent) + 'static,
    ) -> ListenerId {
        let id = self.next_listener_id.get();
        self.next_listener_id.set(id + 1);
        table.borrow_mut().push((id, Rc::new(handler)));
        id
    }

    fn emit(&self, table: &ListenerTable, event: &GestureEvent) {
        // Snapshot so a handler may add or remove listeners re-entrantly.
        let handlers: SmallVec<[GestureHandler; 2]> = table
            .borrow()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler(event);
        }
    }

    fn forward_prevent_default(&self, raw: &RawPointerEvent, event: &GestureEvent) {
        if self.deactivated.get() {
            return;
        }
        if self.prevent_default || event.default_prevented() {
            raw.prevent_default();
        }
    }

    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        if let Some(session) = self.session.borrow_mut().take() {
            if let Some(timer) = session.timer {
                self.runtime.clear_interval(timer);
            }
        }
        for id in self.subscriptions.borrow_mut().drain(..) {
            self.events.unsubscribe(id);
        }
        self.start_listeners.borrow_mut().clear();
        self.move_listeners.borrow_mut().clear();
        self.end_listeners.borrow_mut().clear();
    }
}

fn remove_listener(table: &ListenerTable, id: ListenerId) {
    table.borrow_mut().retain(|(entry_id, _)| *entry_id != id);
}

fn normalized_friction(friction: f32) -> f32 {
    if !(0.0..=1.0).contains(&friction) {
        let clamped = if friction.is_finite() {
            friction.clamp(0.0, 1.0)
        } else {
            1.0
        };
        log::warn!("friction {friction} out of [0, 1], clamping to {clamped}");
        clamped
    } else {
        friction
    }
}
