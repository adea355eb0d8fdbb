//! Session state machine and listener notification.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;

use super::ServerLifecycleListener;
use crate::error::panic_message;

/// Where the current session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// No session has started yet.
    #[default]
    Unstarted,
    /// The host is bringing a session up.
    Starting,
    /// The session is running. Start hooks have fired.
    Running,
    /// The host is shutting the session down. Stop hooks have fired if the
    /// session was running.
    Stopping,
    /// The session has ended. A new one may start.
    Stopped,
}

/// A session transition delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// The host began starting a session.
    Starting,
    /// The session finished starting.
    Started,
    /// The host began stopping the session.
    Stopping,
    /// The session has fully stopped.
    Stopped,
}

#[derive(Clone, Copy)]
enum Hook {
    Start,
    Stop,
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::Stop => "stop",
        })
    }
}

struct Inner {
    state: SessionState,
    session: u64,
}

/// Notifies [`ServerLifecycleListener`]s of session start and stop.
///
/// Listeners run in registration order. A hook that returns an error or
/// panics is logged and the remaining listeners still run. Each hook fires at
/// most once per session. Stray or duplicate deliveries are ignored.
pub struct LifecycleCoordinator {
    listeners: Mutex<Vec<Arc<dyn ServerLifecycleListener>>>,
    inner: Mutex<Inner>,
}

impl LifecycleCoordinator {
    /// Creates a coordinator with no listeners and no session.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            inner: Mutex::new(Inner {
                state: SessionState::Unstarted,
                session: 0,
            }),
        }
    }

    /// Appends a listener.
    pub fn add_listener<L>(&self, listener: L)
    where
        L: ServerLifecycleListener + 'static,
    {
        self.add_shared_listener(Arc::new(listener));
    }

    /// Appends a listener that is also held elsewhere.
    pub fn add_shared_listener(&self, listener: Arc<dyn ServerLifecycleListener>) {
        self.listeners.lock().push(listener);
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Returns the current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    /// Returns how many sessions have entered [`SessionState::Running`].
    #[must_use]
    pub fn session(&self) -> u64 {
        self.inner.lock().session
    }

    /// Applies a host transition.
    ///
    /// Returns `false` if the event was a stray or duplicate delivery and
    /// left the state unchanged.
    pub fn handle(&self, event: LifecycleEvent) -> bool {
        match event {
            LifecycleEvent::Starting => self.transition(event, |state| {
                matches!(state, SessionState::Unstarted | SessionState::Stopped)
                    .then_some(SessionState::Starting)
            }),
            LifecycleEvent::Started => self.notify_start(),
            LifecycleEvent::Stopping => self.notify_stop(),
            LifecycleEvent::Stopped => self.transition(event, |state| {
                matches!(state, SessionState::Stopping | SessionState::Starting)
                    .then_some(SessionState::Stopped)
            }),
        }
    }

    /// Marks the session as running and runs every start hook.
    ///
    /// Ignored if the session is already running or stopping. Returns whether
    /// the session moved to [`SessionState::Running`].
    pub fn notify_start(&self) -> bool {
        let session = {
            let mut inner = self.inner.lock();
            match inner.state {
                SessionState::Running | SessionState::Stopping => {
                    log::warn!(
                        "Ignoring duplicate start notification while {:?}",
                        inner.state
                    );
                    return false;
                }
                SessionState::Unstarted | SessionState::Starting | SessionState::Stopped => {
                    inner.state = SessionState::Running;
                    inner.session += 1;
                    inner.session
                }
            }
        };

        log::debug!("Session {session} started");
        self.run_hooks(Hook::Start);
        true
    }

    /// Marks the session as stopping and runs every stop hook.
    ///
    /// Stop hooks only run if the session was running. Ignored if the session
    /// is not running or starting. Returns whether the session moved to
    /// [`SessionState::Stopping`].
    pub fn notify_stop(&self) -> bool {
        let was_running = {
            let mut inner = self.inner.lock();
            match inner.state {
                SessionState::Running => {
                    inner.state = SessionState::Stopping;
                    true
                }
                SessionState::Starting => {
                    inner.state = SessionState::Stopping;
                    false
                }
                state => {
                    log::warn!("Ignoring stop notification while {state:?}");
                    return false;
                }
            }
        };

        if was_running {
            log::debug!("Session {} stopping", self.session());
            self.run_hooks(Hook::Stop);
        } else {
            log::debug!("Session stopped before it finished starting, skipping stop hooks");
        }
        true
    }

    fn transition(
        &self,
        event: LifecycleEvent,
        next: impl FnOnce(SessionState) -> Option<SessionState>,
    ) -> bool {
        let mut inner = self.inner.lock();
        if let Some(state) = next(inner.state) {
            log::trace!("Lifecycle {:?} -> {state:?}", inner.state);
            inner.state = state;
            true
        } else {
            log::warn!("Ignoring {event:?} while {:?}", inner.state);
            false
        }
    }

    fn run_hooks(&self, hook: Hook) {
        // Hooks may register listeners, so the list is not locked while they run.
        let listeners = self.listeners.lock().clone();

        for (index, listener) in listeners.iter().enumerate() {
            let result = panic::catch_unwind(AssertUnwindSafe(|| match hook {
                Hook::Start => listener.on_server_start(),
                Hook::Stop => listener.on_server_stop(),
            }));

            match result {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    log::error!("Lifecycle listener {index} failed in {hook} hook: {err:#}");
                }
                Err(payload) => {
                    log::error!(
                        "Lifecycle listener {index} panicked in {hook} hook: {}",
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
    }
}

impl Default for LifecycleCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
