//! Deterministic host doubles for swipekit tests.
//!
//! [`TestHost`] bundles a manually driven clock, an in-memory event source,
//! and a recording surface, and exposes robot-style helpers (`press`,
//! `move_to`, `release`, `frame`) so controller tests read as scripted
//! gestures rather than plumbing.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use swipekit_core::{Clock, FrameScheduler, Runtime, RuntimeHandle};
use swipekit_geometry::{Point, Size};
use swipekit_gesture::{
    EventSource, PointerDevice, RawEventKind, RawPointerEvent, Scope, SubscriptionId, Surface,
};

/// Clock whose time only moves when a test says so.
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new() -> Rc<Self> {
        Rc::new(Self { now: Cell::new(0) })
    }

    pub fn set(&self, now_ms: u64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Scheduler that counts frame requests instead of scheduling anything.
#[derive(Default)]
pub struct CountingScheduler {
    requests: Cell<usize>,
}

impl CountingScheduler {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn frame_requests(&self) -> usize {
        self.requests.get()
    }
}

impl FrameScheduler for CountingScheduler {
    fn schedule_frame(&self) {
        self.requests.set(self.requests.get() + 1);
    }
}

type RawHandler = Rc<dyn Fn(&RawPointerEvent)>;

/// In-memory [`EventSource`] that dispatches synchronously to whatever
/// handlers are currently subscribed.
pub struct TestEventSource {
    handlers: RefCell<Vec<(SubscriptionId, Scope, RawEventKind, RawHandler)>>,
    next_id: Cell<u64>,
}

impl TestEventSource {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            handlers: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        })
    }

    pub fn dispatch(&self, raw: &RawPointerEvent) {
        let matching: Vec<RawHandler> = self
            .handlers
            .borrow()
            .iter()
            .filter(|(_, _, kind, _)| *kind == raw.kind)
            .map(|(_, _, _, handler)| handler.clone())
            .collect();
        for handler in matching {
            handler(raw);
        }
    }

    pub fn subscription_count(&self) -> usize {
        self.handlers.borrow().len()
    }
}

impl EventSource for TestEventSource {
    fn subscribe(
        &self,
        scope: Scope,
        kind: RawEventKind,
        handler: RawHandler,
    ) -> SubscriptionId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.handlers.borrow_mut().push((id, scope, kind, handler));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.handlers.borrow_mut().retain(|(sub, ..)| *sub != id);
    }
}

/// Surface double that records every position write.
pub struct TestSurface {
    offset: Cell<Point>,
    size: Cell<Size>,
    parent: Cell<Size>,
    writes: RefCell<Vec<Point>>,
    cleared: Cell<bool>,
}

impl TestSurface {
    pub fn new() -> Rc<Self> {
        Self::with_geometry(Size::new(200.0, 100.0), Size::new(1000.0, 500.0))
    }

    pub fn with_geometry(size: Size, parent: Size) -> Rc<Self> {
        Rc::new(Self {
            offset: Cell::new(Point::ZERO),
            size: Cell::new(size),
            parent: Cell::new(parent),
            writes: RefCell::new(Vec::new()),
            cleared: Cell::new(false),
        })
    }

    pub fn set_size(&self, size: Size) {
        self.size.set(size);
    }

    pub fn set_parent_size(&self, parent: Size) {
        self.parent.set(parent);
    }

    pub fn writes(&self) -> Vec<Point> {
        self.writes.borrow().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.borrow().len()
    }

    pub fn was_cleared(&self) -> bool {
        self.cleared.get()
    }
}

impl Surface for TestSurface {
    fn offset(&self) -> Point {
        self.offset.get()
    }

    fn size(&self) -> Size {
        self.size.get()
    }

    fn parent_size(&self) -> Size {
        self.parent.get()
    }

    fn set_offset(&self, position: Point) {
        self.offset.set(position);
        self.writes.borrow_mut().push(position);
    }

    fn clear_offset(&self) {
        self.cleared.set(true);
        self.offset.set(Point::ZERO);
    }
}

/// A complete scripted host: runtime, clock, events, surface.
pub struct TestHost {
    _runtime: Runtime,
    handle: RuntimeHandle,
    pub clock: Rc<ManualClock>,
    pub scheduler: Rc<CountingScheduler>,
    pub events: Rc<TestEventSource>,
    pub surface: Rc<TestSurface>,
}

impl TestHost {
    pub fn new() -> Self {
        let clock = ManualClock::new();
        let scheduler = CountingScheduler::new();
        let runtime = Runtime::new(scheduler.clone(), clock.clone());
        let handle = runtime.handle();
        Self {
            _runtime: runtime,
            handle,
            clock,
            scheduler,
            events: TestEventSource::new(),
            surface: TestSurface::new(),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    fn emit(&self, kind: RawEventKind, x: f32, y: f32) -> RawPointerEvent {
        let raw = RawPointerEvent::new(
            kind,
            PointerDevice::Touch,
            Point::new(x, y),
            self.clock.now.get(),
        );
        self.events.dispatch(&raw);
        raw
    }

    pub fn press(&self, x: f32, y: f32) -> RawPointerEvent {
        self.emit(RawEventKind::Down, x, y)
    }

    pub fn move_to(&self, x: f32, y: f32) -> RawPointerEvent {
        self.emit(RawEventKind::Move, x, y)
    }

    pub fn release(&self, x: f32, y: f32) -> RawPointerEvent {
        self.emit(RawEventKind::Up, x, y)
    }

    pub fn cancel(&self, x: f32, y: f32) -> RawPointerEvent {
        self.emit(RawEventKind::Cancel, x, y)
    }

    /// Advances the clock and fires any velocity-sampling timers that came
    /// due.
    pub fn advance(&self, ms: u64) {
        self.clock.advance(ms);
        self.handle.run_due_timers();
    }

    /// Runs one animation frame at the current clock time.
    pub fn frame(&self) {
        self.handle.drain_frame_callbacks(self.clock.now.get());
    }

    /// Advances the clock by `dt_ms` and runs one frame, `count` times.
    /// Returns the number of frames that actually had callbacks to run.
    pub fn run_frames(&self, count: usize, dt_ms: u64) -> usize {
        let mut ran = 0;
        for _ in 0..count {
            if !self.handle.has_frame_callbacks() {
                break;
            }
            self.clock.advance(dt_ms);
            self.frame();
            ran += 1;
        }
        ran
    }
}

impl Default for TestHost {
    fn default() -> Self {
        Self::new()
    }
}
