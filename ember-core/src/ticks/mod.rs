//! Tick dispatch and deferred callbacks.
//!
//! # Architecture
//!
//! - [`TickManager`] - Registration table of [`TickHandler`]s keyed by [`TickKind`]
//! - [`DeferredScheduler`] - Queue of callbacks that fire after a number of ticks
//! - [`ScheduledTask`] - A single queued callback and its remaining delay
//!
//! The host delivers a [`TickEvent`] for every tick phase. The scheduler is
//! registered as a server tick handler that fires at [`TickPhase::End`].

mod deferred_scheduler;
mod scheduled_task;
mod tick_manager;

pub use deferred_scheduler::DeferredScheduler;
pub use scheduled_task::{ScheduledTask, TaskAction, TaskHandle};
pub use tick_manager::{TickEvent, TickHandler, TickKind, TickManager, TickPhase};
