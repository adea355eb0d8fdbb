//! # Ember
//!
//! A standalone host for `ember-core`: a fixed-rate tick loop that delivers
//! tick and lifecycle events to a [`CommonProxy`].

use std::sync::Arc;
use std::time::Duration;

use ember_core::lifecycle::LifecycleEvent;
use ember_core::ticks::{TickEvent, TickPhase};
use ember_core::{CommonProxy, ConfigError, CoreConfig};
use tokio::select;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Host log output.
pub mod logger;
/// Tick duration sampling.
pub mod tick_stats;

use tick_stats::TickStats;

/// The host driving one [`CommonProxy`].
pub struct EmberHost {
    /// The cancellation token for graceful shutdown.
    pub cancel_token: CancellationToken,
    /// The shared common proxy.
    pub proxy: Arc<CommonProxy>,
    /// Tick timing for the running session.
    pub tick_stats: Arc<TickStats>,
    tick_count: u64,
}

impl EmberHost {
    /// Creates a host and its proxy.
    pub fn new(config: CoreConfig) -> Result<Self, ConfigError> {
        let proxy = CommonProxy::new(config)?;
        let tick_stats = Arc::new(TickStats::new(proxy.config().tick_rate));
        proxy.register_tick_handler(tick_stats.clone());

        Ok(Self {
            cancel_token: CancellationToken::new(),
            proxy: Arc::new(proxy),
            tick_stats,
            tick_count: 0,
        })
    }

    /// Returns the number of ticks run so far.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Runs one full tick: server start phase, then server end phase.
    pub fn step(&mut self) {
        self.tick_count += 1;
        let span = tracing::trace_span!("tick", n = self.tick_count);
        let _guard = span.enter();

        self.proxy.on_tick(&TickEvent::server(TickPhase::Start, self.tick_count));
        self.proxy.on_tick(&TickEvent::server(TickPhase::End, self.tick_count));
    }

    /// Runs a session until the cancel token is cancelled.
    pub async fn run(&mut self) {
        self.proxy.on_lifecycle(LifecycleEvent::Starting);
        log::info!("Starting Ember host");
        self.proxy.on_lifecycle(LifecycleEvent::Started);
        log::info!("Started Ember host at {} TPS", self.proxy.config().tick_rate);

        let period = Duration::from_secs_f32(1.0 / self.proxy.config().tick_rate);
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let cancel_token = self.cancel_token.clone();
        loop {
            select! {
                () = cancel_token.cancelled() => {
                    break;
                }
                _ = interval.tick() => {
                    self.step();
                }
            }
        }

        log::info!(
            "Stopping Ember host after {} ticks ({:.2} mspt)",
            self.tick_count,
            self.tick_stats.average_mspt()
        );
        self.proxy.on_lifecycle(LifecycleEvent::Stopping);
        self.proxy.on_lifecycle(LifecycleEvent::Stopped);
        log::info!("Stopped Ember host");
    }

    /// Stops the host.
    pub fn stop(&self) {
        self.cancel_token.cancel();
    }
}
