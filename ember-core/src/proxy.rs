//! The common proxy owns the scheduler, tick manager and lifecycle
//! coordinator, and is the single entry point for host events.

use std::sync::Arc;

use crate::config::CoreConfig;
use crate::error::{ConfigError, ScheduleError};
use crate::lifecycle::{LifecycleCoordinator, LifecycleEvent, ServerLifecycleListener};
use crate::ticks::{DeferredScheduler, TaskHandle, TickEvent, TickHandler, TickManager};

/// Common-side wiring between the host and the scheduling components.
///
/// Subsystems receive the `Arc`s returned by [`scheduler`](Self::scheduler),
/// [`lifecycle`](Self::lifecycle) and [`tick_manager`](Self::tick_manager)
/// when they are constructed.
pub struct CommonProxy {
    config: CoreConfig,
    scheduler: Arc<DeferredScheduler>,
    tick_manager: Arc<TickManager>,
    lifecycle: Arc<LifecycleCoordinator>,
}

impl CommonProxy {
    /// Builds the proxy and registers the scheduler as a server tick handler.
    pub fn new(config: CoreConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let scheduler = Arc::new(DeferredScheduler::from_config(&config));
        let tick_manager = Arc::new(TickManager::new());
        tick_manager.register(scheduler.clone());

        log::debug!(
            "Common proxy ready ({} TPS, max delay {} ticks)",
            config.tick_rate,
            config.max_delay_ticks
        );

        Ok(Self {
            config,
            scheduler,
            tick_manager,
            lifecycle: Arc::new(LifecycleCoordinator::new()),
        })
    }

    /// The config this proxy was built with.
    #[must_use]
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// The shared deferred scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &Arc<DeferredScheduler> {
        &self.scheduler
    }

    /// The shared tick manager.
    #[must_use]
    pub fn tick_manager(&self) -> &Arc<TickManager> {
        &self.tick_manager
    }

    /// The shared lifecycle coordinator.
    #[must_use]
    pub fn lifecycle(&self) -> &Arc<LifecycleCoordinator> {
        &self.lifecycle
    }

    /// Schedules `action` to run after `delay_ticks` server ticks.
    pub fn schedule_delayed<F>(
        &self,
        action: F,
        delay_ticks: i32,
    ) -> Result<TaskHandle, ScheduleError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.scheduler.schedule_delayed(action, delay_ticks)
    }

    /// Schedules `action` to run on the next server tick.
    pub fn schedule_next_tick<F>(&self, action: F) -> Result<TaskHandle, ScheduleError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.scheduler.schedule_next_tick(action)
    }

    /// Registers a session lifecycle listener.
    pub fn add_lifecycle_listener<L>(&self, listener: L)
    where
        L: ServerLifecycleListener + 'static,
    {
        self.lifecycle.add_listener(listener);
    }

    /// Registers a tick handler.
    pub fn register_tick_handler(&self, handler: Arc<dyn TickHandler>) {
        self.tick_manager.register(handler);
    }

    /// Host entry point for ticks.
    pub fn on_tick(&self, event: &TickEvent) {
        self.tick_manager.dispatch(event);
    }

    /// Host entry point for session transitions.
    ///
    /// Pending tasks are discarded only when the coordinator accepts a
    /// `Stopped` event. Stray or duplicate deliveries leave the queue alone.
    pub fn on_lifecycle(&self, event: LifecycleEvent) {
        let applied = self.lifecycle.handle(event);

        if applied && event == LifecycleEvent::Stopped && self.config.discard_on_stop {
            let discarded = self.scheduler.discard_pending();
            if discarded > 0 {
                log::info!(
                    "Dropped {discarded} deferred task(s) left over from the stopped session"
                );
            }
        }
    }
}
