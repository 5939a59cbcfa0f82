use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::ServerControl;
use crate::error::Result;

/// Something that can be asked to reload the web server at some later point.
pub trait Restarter: Send + Sync {
    fn queue_restart(&self);
}

/// Restarter that never restarts anything; for setups without Apache.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRestarter;

impl Restarter for NoopRestarter {
    fn queue_restart(&self) {
        tracing::debug!("restart requested, ignoring");
    }
}

#[derive(Default)]
struct RestartState {
    queued: bool,
    timer: Option<JoinHandle<()>>,
    /// Bumped every time a restart is queued, so a timer can tell whether
    /// its restart was already flushed.
    episode: u64,
}

struct Inner {
    ctl: Arc<dyn ServerControl>,
    delay: Duration,
    state: Mutex<RestartState>,
    /// Held while the reload command runs.
    reload_lock: tokio::sync::Mutex<()>,
    runtime: Handle,
}

/// Debounces graceful Apache restarts.
///
/// The first [`Restarter::queue_restart`] arms a timer; further calls before
/// it fires are no-ops, so a burst of repository changes results in a single
/// reload. [`RestartCoordinator::flush`] runs a queued restart right away.
#[derive(Clone)]
pub struct RestartCoordinator {
    inner: Arc<Inner>,
}

impl RestartCoordinator {
    /// Creates the coordinator after checking that the server configuration
    /// is valid. A failing check must stop the process from starting.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn new(ctl: Arc<dyn ServerControl>, delay: Duration) -> Result<Self> {
        tracing::info!("testing Apache configuration");
        if let Err(e) = ctl.config_test().await {
            tracing::error!("Apache configuration test failed: {e}");
            return Err(e);
        }

        Ok(Self {
            inner: Arc::new(Inner {
                ctl,
                delay,
                state: Mutex::new(RestartState::default()),
                reload_lock: tokio::sync::Mutex::new(()),
                runtime: Handle::current(),
            }),
        })
    }

    pub fn is_queued(&self) -> bool {
        self.inner.state().queued
    }

    /// Restarts Apache immediately, cancelling any queued restart.
    pub async fn perform_restart(&self) -> Result<()> {
        let _reload = self.inner.reload_lock.lock().await;
        self.inner.take_queued();
        self.inner.reload().await
    }

    /// Performs a queued restart now instead of waiting for the timer.
    /// Does nothing when no restart is queued.
    pub async fn flush(&self) -> Result<()> {
        let _reload = self.inner.reload_lock.lock().await;
        if !self.inner.take_queued() {
            tracing::debug!("Apache restart not queued");
            return Ok(());
        }

        tracing::info!("flushing Apache restart");
        self.inner.reload().await
    }
}

impl Restarter for RestartCoordinator {
    fn queue_restart(&self) {
        let mut state = self.inner.state();
        if state.queued {
            tracing::debug!("Apache restart already queued");
            return;
        }

        state.episode += 1;
        let episode = state.episode;
        tracing::info!(delay = ?self.inner.delay, "queueing Apache graceful restart");

        let inner = Arc::clone(&self.inner);
        state.timer = Some(self.inner.runtime.spawn(async move {
            tokio::time::sleep(inner.delay).await;
            inner.fire(episode).await;
        }));
        state.queued = true;
    }
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, RestartState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Clears the queued flag and cancels the timer. Returns whether a
    /// restart was queued.
    fn take_queued(&self) -> bool {
        let mut state = self.state();
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        std::mem::replace(&mut state.queued, false)
    }

    async fn fire(&self, episode: u64) {
        let _reload = self.reload_lock.lock().await;
        {
            let mut state = self.state();
            if !state.queued || state.episode != episode {
                return;
            }
            state.queued = false;
            // Dropping our own handle detaches it; aborting would cancel this task.
            state.timer = None;
        }

        // Failures are already logged; the running configuration stays in place.
        let _ = self.reload().await;
    }

    async fn reload(&self) -> Result<()> {
        tracing::info!("performing graceful Apache restart");
        match self.ctl.graceful_reload().await {
            Ok(_) => {
                tracing::info!("Apache gracefully restarted");
                Ok(())
            }
            Err(e) => {
                tracing::error!("error restarting Apache: {e}");
                Err(e)
            }
        }
    }
}
