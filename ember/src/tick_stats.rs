//! Tick duration sampling.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ember_core::ticks::{TickEvent, TickHandler, TickKind, TickPhase};
use parking_lot::Mutex;

/// Number of ticks kept for averaging.
const SAMPLE_WINDOW: usize = 100;

struct Samples {
    tick_start: Option<Instant>,
    durations: VecDeque<Duration>,
}

/// Measures how long each server tick takes, from its start phase to its end
/// phase, over the last [`SAMPLE_WINDOW`] ticks.
pub struct TickStats {
    target: Duration,
    samples: Mutex<Samples>,
}

impl TickStats {
    /// Creates a sampler for a host running at `tick_rate` ticks per second.
    #[must_use]
    pub fn new(tick_rate: f32) -> Self {
        Self {
            target: Duration::from_secs_f32(1.0 / tick_rate),
            samples: Mutex::new(Samples {
                tick_start: None,
                durations: VecDeque::with_capacity(SAMPLE_WINDOW),
            }),
        }
    }

    /// Average milliseconds per tick over the sample window.
    #[must_use]
    pub fn average_mspt(&self) -> f32 {
        let samples = self.samples.lock();
        if samples.durations.is_empty() {
            return 0.0;
        }
        let total: Duration = samples.durations.iter().sum();
        total.as_secs_f32() * 1000.0 / samples.durations.len() as f32
    }

    /// Number of ticks currently sampled.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.samples.lock().durations.len()
    }

    fn record(&self, duration: Duration, tick: u64) {
        let mut samples = self.samples.lock();
        if samples.durations.len() == SAMPLE_WINDOW {
            samples.durations.pop_front();
        }
        samples.durations.push_back(duration);

        if duration > self.target {
            log::warn!(
                "Tick {tick} took {:.1}ms, target is {:.1}ms",
                duration.as_secs_f32() * 1000.0,
                self.target.as_secs_f32() * 1000.0
            );
        }
    }
}

impl TickHandler for TickStats {
    fn name(&self) -> &str {
        "tick-stats"
    }

    fn handled_kinds(&self) -> &[TickKind] {
        &[TickKind::Server]
    }

    fn can_fire(&self, _phase: TickPhase) -> bool {
        true
    }

    fn tick(&self, event: &TickEvent) {
        match event.phase {
            TickPhase::Start => self.samples.lock().tick_start = Some(Instant::now()),
            TickPhase::End => {
                let started = self.samples.lock().tick_start.take();
                if let Some(started) = started {
                    self.record(started.elapsed(), event.tick);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_start_to_end() {
        let stats = TickStats::new(20.0);
        assert!(stats.average_mspt().abs() < f32::EPSILON);

        stats.tick(&TickEvent::server(TickPhase::Start, 1));
        stats.tick(&TickEvent::server(TickPhase::End, 1));
        assert_eq!(stats.sample_count(), 1);

        // An end without a start is not sampled
        stats.tick(&TickEvent::server(TickPhase::End, 2));
        assert_eq!(stats.sample_count(), 1);
    }

    #[test]
    fn test_window_is_bounded() {
        let stats = TickStats::new(20.0);
        for tick in 0..(SAMPLE_WINDOW as u64 + 25) {
            stats.tick(&TickEvent::server(TickPhase::Start, tick));
            stats.tick(&TickEvent::server(TickPhase::End, tick));
        }
        assert_eq!(stats.sample_count(), SAMPLE_WINDOW);
    }
}
