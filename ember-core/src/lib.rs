//! # Ember Core
//!
//! The common-side tick scheduler and lifecycle coordinator.
//!
//! The host drives everything in this crate: it delivers one [`ticks::TickEvent`]
//! per tick phase and one [`lifecycle::LifecycleEvent`] per session transition to a
//! [`proxy::CommonProxy`], which forwards them to the components it owns.

/// Configuration loading and validation.
pub mod config;
/// Error types.
pub mod error;
/// Server session lifecycle notifications.
pub mod lifecycle;
/// The common proxy wiring the scheduler, tick manager and lifecycle together.
pub mod proxy;
/// Tick handlers and the deferred callback scheduler.
pub mod ticks;

pub use config::CoreConfig;
pub use error::{ConfigError, ScheduleError};
pub use proxy::CommonProxy;
