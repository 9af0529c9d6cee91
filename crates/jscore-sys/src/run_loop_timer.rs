//! WTF run-loop timer provided by the embedder.
//!
//! A statically linked bun-webkit build leaves the run-loop timer to the host
//! application and calls the `WTFTimer__*` functions below to schedule work
//! such as deferred garbage collection. All timers share one background
//! thread that sleeps until the earliest pending fire time.

#![allow(unsafe_op_in_unsafe_fn)]

use parking_lot::{Condvar, Mutex};
use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::ffi::c_void;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

type TimerCallback = unsafe extern "C" fn(*mut c_void);

struct TimerState {
    callback: TimerCallback,
    user_data: *mut c_void,
    active: AtomicBool,
    repeat: AtomicBool,
    /// Bumped on every update/cancel so superseded heap entries are skipped
    generation: AtomicU64,
    interval_nanos: AtomicU64,
    fire_time: Mutex<Option<Instant>>,
}

// SAFETY: user_data is owned by WTF, which only hands out thread-safe timer targets
unsafe impl Send for TimerState {}
unsafe impl Sync for TimerState {}

/// Opaque timer handle handed to WebKit
pub struct WTFTimer {
    state: Arc<TimerState>,
}

impl WTFTimer {
    fn new(callback: TimerCallback, user_data: *mut c_void) -> Self {
        Self {
            state: Arc::new(TimerState {
                callback,
                user_data,
                active: AtomicBool::new(false),
                repeat: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                interval_nanos: AtomicU64::new(0),
                fire_time: Mutex::new(None),
            }),
        }
    }

    fn update(&self, delay_seconds: f64, repeat: bool) {
        let delay = Duration::try_from_secs_f64(delay_seconds.max(0.0)).unwrap_or(Duration::MAX);
        let Some(fire_time) = Instant::now().checked_add(delay) else {
            // Effectively "never": keep the timer inactive
            self.cancel();
            return;
        };

        *self.state.fire_time.lock() = Some(fire_time);
        self.state
            .interval_nanos
            .store(delay.as_nanos().min(u64::MAX as u128) as u64, Ordering::SeqCst);
        self.state.repeat.store(repeat, Ordering::SeqCst);
        self.state.active.store(true, Ordering::SeqCst);
        let generation = self.state.generation.fetch_add(1, Ordering::SeqCst) + 1;

        schedule(self.state.clone(), fire_time, generation);
    }

    fn cancel(&self) {
        self.state.active.store(false, Ordering::SeqCst);
        self.state.generation.fetch_add(1, Ordering::SeqCst);
        *self.state.fire_time.lock() = None;
    }

    fn is_active(&self) -> bool {
        self.state.active.load(Ordering::SeqCst)
    }

    fn seconds_until_fire(&self) -> f64 {
        match *self.state.fire_time.lock() {
            Some(fire_time) => fire_time
                .saturating_duration_since(Instant::now())
                .as_secs_f64(),
            None => f64::INFINITY,
        }
    }
}

struct Scheduled {
    fire_time: Instant,
    generation: u64,
    state: Arc<TimerState>,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.fire_time == other.fire_time
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // Reversed so the BinaryHeap pops the earliest fire time first
        other.fire_time.cmp(&self.fire_time)
    }
}

struct TimerQueue {
    pending: Mutex<BinaryHeap<Scheduled>>,
    wakeup: Condvar,
}

static TIMER_QUEUE: OnceLock<TimerQueue> = OnceLock::new();

fn timer_queue() -> &'static TimerQueue {
    TIMER_QUEUE.get_or_init(|| {
        // If the thread cannot be spawned timers stay pending; WebKit treats
        // its timers as hints, so this degrades to "no deferred work".
        let _ = thread::Builder::new()
            .name("wtf-timer".into())
            .spawn(timer_thread_main);

        TimerQueue {
            pending: Mutex::new(BinaryHeap::new()),
            wakeup: Condvar::new(),
        }
    })
}

fn schedule(state: Arc<TimerState>, fire_time: Instant, generation: u64) {
    let queue = timer_queue();
    queue.pending.lock().push(Scheduled {
        fire_time,
        generation,
        state,
    });
    queue.wakeup.notify_one();
}

fn timer_thread_main() {
    let queue = timer_queue();
    let mut pending = queue.pending.lock();

    loop {
        let Some(next_fire) = pending.peek().map(|next| next.fire_time) else {
            queue.wakeup.wait(&mut pending);
            continue;
        };

        if next_fire > Instant::now() {
            queue.wakeup.wait_until(&mut pending, next_fire);
            continue;
        }

        if let Some(due) = pending.pop() {
            // Never hold the queue lock while WebKit runs; the callback may reschedule
            drop(pending);
            fire(due);
            pending = queue.pending.lock();
        }
    }
}

fn fire(due: Scheduled) {
    let state = &due.state;
    if !state.active.load(Ordering::SeqCst)
        || state.generation.load(Ordering::SeqCst) != due.generation
    {
        return;
    }

    if !state.repeat.load(Ordering::SeqCst) {
        state.active.store(false, Ordering::SeqCst);
        *state.fire_time.lock() = None;
    }

    // SAFETY: callback and user_data were supplied together by WTFTimer__create
    unsafe { (state.callback)(state.user_data) };

    if state.repeat.load(Ordering::SeqCst)
        && state.active.load(Ordering::SeqCst)
        && state.generation.load(Ordering::SeqCst) == due.generation
    {
        let interval = Duration::from_nanos(state.interval_nanos.load(Ordering::SeqCst));
        let fire_time = Instant::now() + interval;
        *state.fire_time.lock() = Some(fire_time);
        schedule(due.state.clone(), fire_time, due.generation);
    }
}

/// Create a new WTF timer.
///
/// # Safety
/// `user_data` must remain valid until the timer is deinitialized.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn WTFTimer__create(
    callback: TimerCallback,
    user_data: *mut c_void,
) -> *mut WTFTimer {
    Box::into_raw(Box::new(WTFTimer::new(callback, user_data)))
}

/// Schedule (or reschedule) a timer.
///
/// # Safety
/// `timer` must be null or a pointer returned by `WTFTimer__create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn WTFTimer__update(timer: *mut WTFTimer, delay_seconds: f64, repeat: bool) {
    if let Some(timer) = timer.as_ref() {
        timer.update(delay_seconds, repeat);
    }
}

/// # Safety
/// `timer` must be null or a pointer returned by `WTFTimer__create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn WTFTimer__cancel(timer: *mut WTFTimer) {
    if let Some(timer) = timer.as_ref() {
        timer.cancel();
    }
}

/// # Safety
/// `timer` must be null or a pointer returned by `WTFTimer__create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn WTFTimer__isActive(timer: *mut WTFTimer) -> bool {
    timer.as_ref().is_some_and(WTFTimer::is_active)
}

/// # Safety
/// `timer` must be null or a pointer returned by `WTFTimer__create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn WTFTimer__secondsUntilTimer(timer: *mut WTFTimer) -> f64 {
    timer
        .as_ref()
        .map_or(f64::INFINITY, WTFTimer::seconds_until_fire)
}

/// Cancel and free a timer.
///
/// # Safety
/// `timer` must be null or a pointer returned by `WTFTimer__create`, and must
/// not be used afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn WTFTimer__deinit(timer: *mut WTFTimer) {
    if timer.is_null() {
        return;
    }
    let timer = Box::from_raw(timer);
    timer.cancel();
}

/// Run timers that are about to fire. Timers already run on the timer
/// thread, so there is nothing to do synchronously.
///
/// # Safety
/// Callable from any thread.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn WTFTimer__runIfImminent() {}
