//! Per-instance deferred tasks on a host-driven virtual timeline.
//!
//! Nothing here sleeps or spawns: the host advances time and the owner pulls due tasks one at a
//! time, so a task that fires may schedule or cancel others before the next one is picked.

use std::time::Duration;

/// Handle of a scheduled task, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Debug)]
struct Entry<T> {
    handle: TaskHandle,
    due: Duration,
    period: Option<Duration>,
    task: T,
}

/// A timeline of one-shot and repeating tasks.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    next_id: u64,
    entries: Vec<Entry<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<T: Clone> Scheduler<T> {
    /// Create an empty scheduler at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of pending tasks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if `handle` is still pending.
    pub fn is_scheduled(&self, handle: TaskHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    fn push(&mut self, delay: Duration, period: Option<Duration>, task: T) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            handle,
            due: self.now + delay,
            period,
            task,
        });
        handle
    }

    /// Run `task` once after `delay`. A zero delay fires on the next pull.
    pub fn schedule_once(&mut self, delay: Duration, task: T) -> TaskHandle {
        self.push(delay, None, task)
    }

    /// Run `task` every `period` (clamped to at least 1ms), first after one period.
    pub fn schedule_interval(&mut self, period: Duration, task: T) -> TaskHandle {
        let period = period.max(Duration::from_millis(1));
        self.push(period, Some(period), task)
    }

    /// Cancel a task. Returns `false` if it already fired (one-shot) or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        self.entries.len() != before
    }

    /// Cancel every pending task.
    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    /// Take the earliest task due at or before `until`, moving the clock to its due time.
    ///
    /// Ties fire in scheduling order. Repeating tasks are re-armed one period later.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TaskHandle, T)> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= until)
            .min_by_key(|(_, e)| (e.due, e.handle.0))
            .map(|(idx, _)| idx)?;

        let due = self.entries[idx].due;
        self.now = self.now.max(due);

        match self.entries[idx].period {
            Some(period) => {
                let entry = &mut self.entries[idx];
                entry.due = due + period;
                Some((entry.handle, entry.task.clone()))
            }
            None => {
                let entry = self.entries.remove(idx);
                Some((entry.handle, entry.task))
            }
        }
    }

    /// Move the clock forward to `now` without firing anything.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }
}
