//! Tick handler registration and dispatch.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::panic_message;

/// What is being ticked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickKind {
    /// The server as a whole, once per tick.
    Server,
    /// A single loaded world.
    World,
    /// A single connected player.
    Player,
}

/// Which half of a tick is being delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickPhase {
    /// Before the host runs its own tick logic.
    Start,
    /// After the host ran its own tick logic.
    End,
}

/// A tick delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEvent {
    /// What is being ticked.
    pub kind: TickKind,
    /// Which half of the tick this is.
    pub phase: TickPhase,
    /// The host's tick counter.
    pub tick: u64,
}

impl TickEvent {
    /// Creates a server tick event.
    #[must_use]
    pub const fn server(phase: TickPhase, tick: u64) -> Self {
        Self {
            kind: TickKind::Server,
            phase,
            tick,
        }
    }
}

/// Something that wants to run on host ticks.
pub trait TickHandler: Send + Sync {
    /// A name used in logs.
    fn name(&self) -> &str;

    /// The kinds of tick this handler receives.
    fn handled_kinds(&self) -> &[TickKind];

    /// Whether this handler runs in the given phase.
    fn can_fire(&self, phase: TickPhase) -> bool;

    /// Runs the handler.
    fn tick(&self, event: &TickEvent);
}

type HandlerList = SmallVec<[Arc<dyn TickHandler>; 4]>;

/// Dispatches host ticks to registered [`TickHandler`]s.
///
/// Handlers for the same kind run in registration order. A handler that
/// panics is logged and the remaining handlers still run.
#[derive(Default)]
pub struct TickManager {
    handlers: RwLock<FxHashMap<TickKind, HandlerList>>,
}

impl TickManager {
    /// Creates an empty tick manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for every kind it declares.
    pub fn register(&self, handler: Arc<dyn TickHandler>) {
        let mut handlers = self.handlers.write();
        for kind in handler.handled_kinds() {
            handlers.entry(*kind).or_default().push(handler.clone());
        }
        log::debug!(
            "Registered tick handler '{}' for {:?}",
            handler.name(),
            handler.handled_kinds()
        );
    }

    /// Delivers `event` to every matching handler.
    ///
    /// Returns how many handlers ran.
    pub fn dispatch(&self, event: &TickEvent) -> usize {
        // Handlers may register further handlers, so the table is not locked while they run.
        let targets: HandlerList = self
            .handlers
            .read()
            .get(&event.kind)
            .map(|list| {
                list.iter()
                    .filter(|handler| handler.can_fire(event.phase))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        for handler in &targets {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| handler.tick(event))) {
                log::error!(
                    "Tick handler '{}' panicked on {:?} {:?} tick {}: {}",
                    handler.name(),
                    event.kind,
                    event.phase,
                    event.tick,
                    panic_message(payload.as_ref())
                );
            }
        }
        targets.len()
    }

    /// Returns the number of handlers registered for `kind`.
    #[must_use]
    pub fn handler_count(&self, kind: TickKind) -> usize {
        self.handlers.read().get(&kind).map_or(0, SmallVec::len)
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    struct Recorder {
        name: &'static str,
        kinds: Vec<TickKind>,
        phase: TickPhase,
        seen: Arc<Mutex<Vec<(&'static str, u64)>>>,
    }

    impl TickHandler for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn handled_kinds(&self) -> &[TickKind] {
            &self.kinds
        }

        fn can_fire(&self, phase: TickPhase) -> bool {
            phase == self.phase
        }

        fn tick(&self, event: &TickEvent) {
            self.seen.lock().push((self.name, event.tick));
        }
    }

    struct Panicking;

    impl TickHandler for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }

        fn handled_kinds(&self) -> &[TickKind] {
            &[TickKind::Server]
        }

        fn can_fire(&self, _phase: TickPhase) -> bool {
            true
        }

        fn tick(&self, _event: &TickEvent) {
            panic!("handler failure");
        }
    }

    fn recorder(
        name: &'static str,
        kinds: &[TickKind],
        phase: TickPhase,
        seen: &Arc<Mutex<Vec<(&'static str, u64)>>>,
    ) -> Arc<Recorder> {
        Arc::new(Recorder {
            name,
            kinds: kinds.to_vec(),
            phase,
            seen: seen.clone(),
        })
    }

    #[test]
    fn test_dispatch_filters_by_kind_and_phase() {
        let manager = TickManager::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        manager.register(recorder("server-end", &[TickKind::Server], TickPhase::End, &seen));
        manager.register(recorder("server-start", &[TickKind::Server], TickPhase::Start, &seen));
        manager.register(recorder("world-end", &[TickKind::World], TickPhase::End, &seen));

        assert_eq!(manager.dispatch(&TickEvent::server(TickPhase::End, 5)), 1);
        assert_eq!(*seen.lock(), vec![("server-end", 5)]);

        assert_eq!(manager.dispatch(&TickEvent::server(TickPhase::Start, 6)), 1);
        assert_eq!(manager.dispatch(&TickEvent {
            kind: TickKind::Player,
            phase: TickPhase::End,
            tick: 6,
        }), 0);
        assert_eq!(*seen.lock(), vec![("server-end", 5), ("server-start", 6)]);
    }

    #[test]
    fn test_handler_registered_for_several_kinds() {
        let manager = TickManager::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        manager.register(recorder(
            "both",
            &[TickKind::World, TickKind::Player],
            TickPhase::End,
            &seen,
        ));

        assert_eq!(manager.handler_count(TickKind::World), 1);
        assert_eq!(manager.handler_count(TickKind::Player), 1);
        assert_eq!(manager.handler_count(TickKind::Server), 0);
    }

    #[test]
    fn test_dispatch_order_and_panic_isolation() {
        let manager = TickManager::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        manager.register(recorder("first", &[TickKind::Server], TickPhase::End, &seen));
        manager.register(Arc::new(Panicking));
        manager.register(recorder("last", &[TickKind::Server], TickPhase::End, &seen));

        assert_eq!(manager.dispatch(&TickEvent::server(TickPhase::End, 1)), 3);
        assert_eq!(*seen.lock(), vec![("first", 1), ("last", 1)]);
    }
}
