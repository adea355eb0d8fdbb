//! Lifecycle listener trait and closure adapters.

/// Receives session start and stop notifications.
///
/// Both hooks default to doing nothing.
pub trait ServerLifecycleListener: Send + Sync {
    /// Called once when a session starts running.
    fn on_server_start(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once when a running session begins stopping.
    fn on_server_stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// A listener that runs a closure on start.
pub struct OnStart<F>(F);

impl<F> ServerLifecycleListener for OnStart<F>
where
    F: Fn() -> anyhow::Result<()> + Send + Sync,
{
    fn on_server_start(&self) -> anyhow::Result<()> {
        (self.0)()
    }
}

/// A listener that runs a closure on stop.
pub struct OnStop<F>(F);

impl<F> ServerLifecycleListener for OnStop<F>
where
    F: Fn() -> anyhow::Result<()> + Send + Sync,
{
    fn on_server_stop(&self) -> anyhow::Result<()> {
        (self.0)()
    }
}

/// Wraps `f` as a listener that only reacts to session start.
pub fn on_start<F>(f: F) -> OnStart<F>
where
    F: Fn() -> anyhow::Result<()> + Send + Sync,
{
    OnStart(f)
}

/// Wraps `f` as a listener that only reacts to session stop.
pub fn on_stop<F>(f: F) -> OnStop<F>
where
    F: Fn() -> anyhow::Result<()> + Send + Sync,
{
    OnStop(f)
}
