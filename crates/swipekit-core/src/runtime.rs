use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::frame_clock::FrameClock;
use crate::platform::{Clock, FrameScheduler};

pub type FrameCallbackId = u64;
pub type TimerId = u64;

pub(crate) struct FrameCallbackEntry {
    id: FrameCallbackId,
    callback: Option<Box<dyn FnOnce(u64) + 'static>>,
}

struct TimerEntry {
    id: TimerId,
    period_ms: u64,
    next_due_ms: Cell<u64>,
    callback: Rc<dyn Fn(u64)>,
}

struct RuntimeInner {
    scheduler: Rc<dyn FrameScheduler>,
    clock: Rc<dyn Clock>,
    frame_callbacks: RefCell<VecDeque<FrameCallbackEntry>>,
    next_frame_callback_id: Cell<u64>,
    timers: RefCell<Vec<TimerEntry>>,
    next_timer_id: Cell<u64>,
}

impl RuntimeInner {
    fn new(scheduler: Rc<dyn FrameScheduler>, clock: Rc<dyn Clock>) -> Self {
        Self {
            scheduler,
            clock,
            frame_callbacks: RefCell::new(VecDeque::new()),
            next_frame_callback_id: Cell::new(1),
            timers: RefCell::new(Vec::new()),
            next_timer_id: Cell::new(1),
        }
    }

    fn register_frame_callback(&self, callback: Box<dyn FnOnce(u64) + 'static>) -> FrameCallbackId {
        let id = self.next_frame_callback_id.get();
        self.next_frame_callback_id.set(id + 1);
        self.frame_callbacks
            .borrow_mut()
            .push_back(FrameCallbackEntry {
                id,
                callback: Some(callback),
            });
        self.scheduler.schedule_frame();
        id
    }

    fn cancel_frame_callback(&self, id: FrameCallbackId) {
        let mut callbacks = self.frame_callbacks.borrow_mut();
        if let Some(index) = callbacks.iter().position(|entry| entry.id == id) {
            callbacks.remove(index);
        }
    }

    fn drain_frame_callbacks(&self, now_ms: u64) {
        // Pop everything first so callbacks may register the next frame
        // without invalidating the iteration.
        let mut pending: Vec<Box<dyn FnOnce(u64) + 'static>> = Vec::new();
        {
            let mut callbacks = self.frame_callbacks.borrow_mut();
            pending.reserve(callbacks.len());
            while let Some(mut entry) = callbacks.pop_front() {
                if let Some(callback) = entry.callback.take() {
                    pending.push(callback);
                }
            }
        }
        for callback in pending {
            callback(now_ms);
        }
    }

    fn has_frame_callbacks(&self) -> bool {
        !self.frame_callbacks.borrow().is_empty()
    }

    fn frame_callback_count(&self) -> usize {
        self.frame_callbacks.borrow().len()
    }

    fn set_interval(&self, period_ms: u64, callback: Rc<dyn Fn(u64)>) -> TimerId {
        let period_ms = period_ms.max(1);
        let id = self.next_timer_id.get();
        self.next_timer_id.set(id + 1);
        let now = self.clock.now_ms();
        self.timers.borrow_mut().push(TimerEntry {
            id,
            period_ms,
            next_due_ms: Cell::new(now + period_ms),
            callback,
        });
        self.scheduler.schedule_frame();
        id
    }

    fn clear_interval(&self, id: TimerId) {
        self.timers.borrow_mut().retain(|entry| entry.id != id);
    }

    fn run_due_timers(&self) {
        let now = self.clock.now_ms();
        // Snapshot the due callbacks, then fire without holding the borrow;
        // a callback may clear its own interval re-entrantly.
        let due: Vec<(TimerId, Rc<dyn Fn(u64)>)> = {
            let timers = self.timers.borrow();
            timers
                .iter()
                .filter(|entry| entry.next_due_ms.get() <= now)
                .map(|entry| {
                    let mut next = entry.next_due_ms.get();
                    while next <= now {
                        next += entry.period_ms;
                    }
                    entry.next_due_ms.set(next);
                    (entry.id, entry.callback.clone())
                })
                .collect()
        };
        for (id, callback) in due {
            let still_registered = self.timers.borrow().iter().any(|entry| entry.id == id);
            if still_registered {
                callback(now);
            }
        }
    }

    fn has_timers(&self) -> bool {
        !self.timers.borrow().is_empty()
    }
}

/// Owner of the frame-callback and timer registries.
///
/// The host keeps the `Runtime` alive for as long as controllers exist and
/// drains it from its frame loop:
///
/// ```ignore
/// let runtime = Runtime::new(Rc::new(DefaultScheduler), Rc::new(MonotonicClock::new()));
/// let handle = runtime.handle();
/// // each frame:
/// handle.run_due_timers();
/// handle.drain_frame_callbacks(handle.now_ms());
/// ```
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Rc<dyn FrameScheduler>, clock: Rc<dyn Clock>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new(scheduler, clock)),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn frame_clock(&self) -> FrameClock {
        FrameClock::new(self.handle())
    }
}

/// Weak handle to a [`Runtime`]; every operation is a no-op once the
/// runtime has been dropped, so late callbacks cannot fire into a dead
/// registry.
#[derive(Clone)]
pub struct RuntimeHandle {
    inner: Weak<RuntimeInner>,
}

impl RuntimeHandle {
    pub fn register_frame_callback(
        &self,
        callback: impl FnOnce(u64) + 'static,
    ) -> Option<FrameCallbackId> {
        self.inner
            .upgrade()
            .map(|inner| inner.register_frame_callback(Box::new(callback)))
    }

    pub fn cancel_frame_callback(&self, id: FrameCallbackId) {
        if let Some(inner) = self.inner.upgrade() {
            inner.cancel_frame_callback(id);
        }
    }

    /// Runs every registered frame callback once, in registration order.
    /// `now_ms` is forwarded to each callback.
    pub fn drain_frame_callbacks(&self, now_ms: u64) {
        if let Some(inner) = self.inner.upgrade() {
            inner.drain_frame_callbacks(now_ms);
        }
    }

    pub fn has_frame_callbacks(&self) -> bool {
        self.inner
            .upgrade()
            .map(|inner| inner.has_frame_callbacks())
            .unwrap_or(false)
    }

    pub fn frame_callback_count(&self) -> usize {
        self.inner
            .upgrade()
            .map(|inner| inner.frame_callback_count())
            .unwrap_or(0)
    }

    /// Registers a periodic callback fired from [`RuntimeHandle::run_due_timers`].
    /// A zero period is promoted to 1 ms.
    pub fn set_interval(&self, period_ms: u64, callback: Rc<dyn Fn(u64)>) -> Option<TimerId> {
        self.inner
            .upgrade()
            .map(|inner| inner.set_interval(period_ms, callback))
    }

    /// Removes an interval timer. Unknown ids are ignored.
    pub fn clear_interval(&self, id: TimerId) {
        if let Some(inner) = self.inner.upgrade() {
            inner.clear_interval(id);
        }
    }

    /// Fires every timer whose deadline has passed, at most once per call,
    /// and advances its deadline past the current time.
    pub fn run_due_timers(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.run_due_timers();
        }
    }

    pub fn has_timers(&self) -> bool {
        self.inner
            .upgrade()
            .map(|inner| inner.has_timers())
            .unwrap_or(false)
    }

    pub fn now_ms(&self) -> u64 {
        self.inner
            .upgrade()
            .map(|inner| inner.clock.now_ms())
            .unwrap_or(0)
    }

    pub fn frame_clock(&self) -> FrameClock {
        FrameClock::new(self.clone())
    }
}
