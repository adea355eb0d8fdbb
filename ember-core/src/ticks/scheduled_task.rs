//! Scheduled task types.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::error::panic_message;

/// A deferred callback.
pub type TaskAction = Box<dyn FnOnce() + Send + 'static>;

/// Identifies a scheduled task so it can be cancelled.
///
/// Handles are unique for the lifetime of the scheduler that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(pub(crate) u64);

impl TaskHandle {
    /// Returns the raw id of this handle.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A callback waiting in the scheduler queue.
///
/// A task whose counter is observed at zero fires in that tick and is
/// removed. Otherwise its counter is decremented by one.
pub struct ScheduledTask {
    /// The handle returned to whoever scheduled this task.
    pub handle: TaskHandle,
    /// Ticks left before this task fires.
    pub remaining_ticks: u32,
    action: TaskAction,
}

impl ScheduledTask {
    /// Creates a task that fires after `delay` further ticks.
    pub fn new(handle: TaskHandle, delay: u32, action: TaskAction) -> Self {
        Self {
            handle,
            remaining_ticks: delay,
            action,
        }
    }

    /// Advances this task by one tick.
    ///
    /// Returns `true` if the task is due and must be fired now.
    #[must_use]
    pub fn advance(&mut self) -> bool {
        if self.remaining_ticks == 0 {
            return true;
        }
        self.remaining_ticks -= 1;
        false
    }

    /// Runs the action, consuming the task.
    ///
    /// A panic inside the action is caught and returned as its message.
    pub fn fire(self) -> Result<(), String> {
        panic::catch_unwind(AssertUnwindSafe(self.action))
            .map_err(|payload| panic_message(payload.as_ref()).to_owned())
    }
}

impl fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("handle", &self.handle)
            .field("remaining_ticks", &self.remaining_ticks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    #[test]
    fn test_advance_counts_down_then_fires() {
        let mut task = ScheduledTask::new(TaskHandle(0), 2, Box::new(|| {}));

        assert!(!task.advance());
        assert_eq!(task.remaining_ticks, 1);
        assert!(!task.advance());
        assert_eq!(task.remaining_ticks, 0);
        // Observed at zero
        assert!(task.advance());
    }

    #[test]
    fn test_zero_delay_is_due_immediately() {
        let mut task = ScheduledTask::new(TaskHandle(7), 0, Box::new(|| {}));
        assert!(task.advance());
    }

    #[test]
    fn test_fire_runs_action() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let task = ScheduledTask::new(
            TaskHandle(1),
            0,
            Box::new(move || flag.store(true, Ordering::SeqCst)),
        );

        assert!(task.fire().is_ok());
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_fire_catches_panic() {
        let task = ScheduledTask::new(TaskHandle(2), 0, Box::new(|| panic!("boom")));
        assert_eq!(task.fire(), Err("boom".to_owned()));
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(TaskHandle(42).to_string(), "#42");
        assert_eq!(TaskHandle(42).id(), 42);
    }
}
