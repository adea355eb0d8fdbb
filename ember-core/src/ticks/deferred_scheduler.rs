//! Deferred callback scheduler.

use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use smallvec::SmallVec;

use super::{ScheduledTask, TaskHandle, TickEvent, TickHandler, TickKind, TickPhase};
use crate::config::CoreConfig;
use crate::error::ScheduleError;

/// Queues callbacks to run a number of ticks in the future.
///
/// Each call to [`on_tick`](Self::on_tick) examines every task that was queued
/// before the pass began, in the order they were scheduled. A task observed
/// with zero remaining ticks is removed and fired; every other task has its
/// counter decremented. A task scheduled with delay `d` therefore fires on the
/// `d + 1`th tick after it was queued.
///
/// Callbacks may schedule further callbacks. The queue lock is released while
/// callbacks run, and anything they queue is only examined from the next pass.
pub struct DeferredScheduler {
    /// Pending tasks in enqueue order.
    queue: Mutex<Vec<ScheduledTask>>,
    /// Source of task handles.
    next_id: AtomicU64,
    /// Number of completed tick passes.
    processed_ticks: AtomicU64,
    max_delay_ticks: u32,
    max_pending_tasks: usize,
}

impl DeferredScheduler {
    /// Creates an empty scheduler with the given limits.
    #[must_use]
    pub fn new(max_delay_ticks: u32, max_pending_tasks: usize) -> Self {
        Self {
            queue: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
            processed_ticks: AtomicU64::new(0),
            max_delay_ticks,
            max_pending_tasks,
        }
    }

    /// Creates an empty scheduler using the limits from `config`.
    #[must_use]
    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(config.max_delay_ticks, config.max_pending_tasks)
    }

    /// Schedules `action` to run after `delay_ticks` further ticks.
    ///
    /// A delay of 0 runs the action on the next tick, never synchronously.
    ///
    /// # Errors
    /// Returns an error and drops `action` if the delay is negative or above
    /// the configured maximum, or if the queue is full.
    pub fn schedule_delayed<F>(
        &self,
        action: F,
        delay_ticks: i32,
    ) -> Result<TaskHandle, ScheduleError>
    where
        F: FnOnce() + Send + 'static,
    {
        let delay =
            u32::try_from(delay_ticks).map_err(|_| ScheduleError::NegativeDelay(delay_ticks))?;
        if delay > self.max_delay_ticks {
            return Err(ScheduleError::DelayTooLong {
                delay,
                max: self.max_delay_ticks,
            });
        }

        let mut queue = self.queue.lock();
        if queue.len() >= self.max_pending_tasks {
            return Err(ScheduleError::QueueFull(queue.len()));
        }

        let handle = TaskHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        queue.push(ScheduledTask::new(handle, delay, Box::new(action)));

        log::trace!("Scheduled deferred task {handle} (delay={delay})");
        Ok(handle)
    }

    /// Schedules `action` to run on the next tick.
    pub fn schedule_next_tick<F>(&self, action: F) -> Result<TaskHandle, ScheduleError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule_delayed(action, 0)
    }

    /// Runs one tick pass and returns how many tasks fired.
    ///
    /// A panicking task is logged and discarded. It never stops the other due
    /// tasks of the pass and is never retried.
    pub fn on_tick(&self) -> usize {
        let due: SmallVec<[ScheduledTask; 8]> = {
            let mut queue = self.queue.lock();
            let pending = mem::take(&mut *queue);
            let mut due = SmallVec::new();
            for mut task in pending {
                if task.advance() {
                    due.push(task);
                } else {
                    queue.push(task);
                }
            }
            due
        };

        let fired = due.len();
        for task in due {
            let handle = task.handle;
            if let Err(msg) = task.fire() {
                log::error!("Deferred task {handle} panicked: {msg}");
            }
        }

        let tick = self.processed_ticks.fetch_add(1, Ordering::Relaxed) + 1;
        if fired > 0 {
            log::trace!("Tick {tick}: fired {fired} deferred task(s)");
        }
        fired
    }

    /// Cancels a pending task.
    ///
    /// Returns `false` if the task already fired, was already cancelled, or
    /// is being fired by the current pass.
    pub fn cancel(&self, handle: TaskHandle) -> bool {
        let mut queue = self.queue.lock();
        let Some(index) = queue.iter().position(|task| task.handle == handle) else {
            return false;
        };
        queue.remove(index);
        log::trace!("Cancelled deferred task {handle}");
        true
    }

    /// Checks if a task is still waiting to fire.
    #[must_use]
    pub fn is_scheduled(&self, handle: TaskHandle) -> bool {
        self.queue.lock().iter().any(|task| task.handle == handle)
    }

    /// Returns the number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Returns true if there are no pending tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Returns the number of tick passes run so far.
    #[must_use]
    pub fn processed_ticks(&self) -> u64 {
        self.processed_ticks.load(Ordering::Relaxed)
    }

    /// Drops every pending task without running it.
    ///
    /// Returns how many tasks were dropped.
    pub fn discard_pending(&self) -> usize {
        // Actions are dropped after the lock is released.
        let discarded = mem::take(&mut *self.queue.lock());
        let count = discarded.len();
        if count > 0 {
            log::debug!("Discarded {count} pending deferred task(s)");
        }
        count
    }
}

impl Default for DeferredScheduler {
    fn default() -> Self {
        Self::from_config(&CoreConfig::default())
    }
}

impl Drop for DeferredScheduler {
    fn drop(&mut self) {
        let pending = self.queue.get_mut().len();
        if pending > 0 {
            log::debug!("Dropping scheduler with {pending} unfired task(s)");
        }
    }
}

impl TickHandler for DeferredScheduler {
    fn name(&self) -> &str {
        "deferred-scheduler"
    }

    fn handled_kinds(&self) -> &[TickKind] {
        &[TickKind::Server]
    }

    fn can_fire(&self, phase: TickPhase) -> bool {
        phase == TickPhase::End
    }

    fn tick(&self, _event: &TickEvent) {
        self.on_tick();
    }
}
