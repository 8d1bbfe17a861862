//! Single-threaded driver for self-rescheduling work.
//!
//! Both session loops are [`Task`]s: each run decides whether it wants to run
//! again after a delay (the audio scheduler) or on the next display refresh
//! (the step engine). The owning event loop calls [`LoopDriver::run_timers`]
//! and [`LoopDriver::run_frame`]; nothing here spawns threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Display refresh period (~60 fps)
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// What a task wants after a run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rearm {
    /// Run again once this much wall time has passed
    After(Duration),
    /// Run again on the next display refresh
    NextFrame,
    Finish,
}

pub trait Task {
    fn run(&mut self) -> Rearm;
}

/// Cancellation handle for a spawned task. Clones share the flag.
#[derive(Clone, Debug, Default)]
pub struct TaskHandle {
    cancelled: Arc<AtomicBool>,
}

impl TaskHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

struct Entry {
    task: Box<dyn Task>,
    handle: TaskHandle,
}

struct TimerEntry {
    due: Instant,
    entry: Entry,
}

/// Cooperative task queue: timer tasks and per-frame tasks
#[derive(Default)]
pub struct LoopDriver {
    timers: Vec<TimerEntry>,
    frame_tasks: Vec<Entry>,
}

impl LoopDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to first run once `delay` has passed after `now`.
    pub fn spawn_timer(
        &mut self,
        task: Box<dyn Task>,
        handle: TaskHandle,
        delay: Duration,
        now: Instant,
    ) {
        self.timers.push(TimerEntry {
            due: now + delay,
            entry: Entry { task, handle },
        });
    }

    /// Queue `task` to first run on the next display refresh.
    pub fn spawn_frame(&mut self, task: Box<dyn Task>, handle: TaskHandle) {
        self.frame_tasks.push(Entry { task, handle });
    }

    /// Run every timer task that is due at `now`. Returns how many ran.
    pub fn run_timers(&mut self, now: Instant) -> usize {
        let (due, waiting): (Vec<_>, Vec<_>) =
            self.timers.drain(..).partition(|timer| timer.due <= now);
        self.timers = waiting;

        let mut ran = 0;
        for timer in due {
            if self.run_entry(timer.entry, now).is_some() {
                ran += 1;
            }
        }
        ran
    }

    /// One display refresh: run every frame task once. Returns how many ran.
    pub fn run_frame(&mut self, now: Instant) -> usize {
        let tasks = std::mem::take(&mut self.frame_tasks);
        let mut ran = 0;
        for entry in tasks {
            if self.run_entry(entry, now).is_some() {
                ran += 1;
            }
        }
        ran
    }

    /// Earliest pending timer deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.iter().map(|timer| timer.due).min()
    }

    /// When the owning loop should next wake: the earlier of the next timer
    /// and the next display refresh.
    pub fn next_wake(&self, next_frame: Instant) -> Instant {
        self.next_deadline()
            .map_or(next_frame, |deadline| deadline.min(next_frame))
    }

    /// Number of queued tasks, timers and frame tasks together
    pub fn pending(&self) -> usize {
        self.timers.len() + self.frame_tasks.len()
    }

    /// Drop every queued task whose handle has been cancelled.
    pub fn purge_cancelled(&mut self) {
        self.timers.retain(|timer| !timer.entry.handle.is_cancelled());
        self.frame_tasks.retain(|entry| !entry.handle.is_cancelled());
    }

    /// Run one entry unless cancelled, then requeue it as it asks.
    /// Returns `None` when the entry was cancelled and not run.
    fn run_entry(&mut self, mut entry: Entry, now: Instant) -> Option<Rearm> {
        if entry.handle.is_cancelled() {
            return None;
        }

        let rearm = entry.task.run();
        // Cancelled while running: do not requeue
        if entry.handle.is_cancelled() {
            return Some(rearm);
        }

        match rearm {
            Rearm::After(delay) => self.timers.push(TimerEntry {
                due: now + delay,
                entry,
            }),
            Rearm::NextFrame => self.frame_tasks.push(entry),
            Rearm::Finish => {}
        }
        Some(rearm)
    }
}
