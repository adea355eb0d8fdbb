//! Server session lifecycle.
//!
//! A session moves through [`SessionState::Unstarted`], `Starting`, `Running`,
//! `Stopping` and `Stopped`. Listeners registered with the
//! [`LifecycleCoordinator`] are told when a session starts running and when it
//! begins stopping, each at most once per session.

mod coordinator;
pub mod listener;

pub use coordinator::{LifecycleCoordinator, LifecycleEvent, SessionState};
pub use listener::ServerLifecycleListener;
