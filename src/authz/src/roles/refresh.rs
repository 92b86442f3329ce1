//! Background dirty check for the role resolver

use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::resolver::RolePermissionResolver;

/// Handle to the running dirty-check task
pub(super) struct RefreshTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl RolePermissionResolver {
    /// Start the periodic dirty check on the current tokio runtime
    ///
    /// Does nothing if the task is already running. The task holds a weak
    /// reference and exits once the resolver is dropped. Store reads run on
    /// the blocking pool.
    pub fn start_dirty_check(self: &Arc<Self>) {
        let mut slot = self.refresh_task.lock();
        if slot.is_some() {
            return;
        }

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let resolver: Weak<Self> = Arc::downgrade(self);
        let period = self.refresh_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(resolver) = resolver.upgrade() else {
                            break;
                        };
                        if let Err(e) =
                            tokio::task::spawn_blocking(move || resolver.check_dirty()).await
                        {
                            warn!(error = %e, "Dirty check task failed");
                        }
                    }
                }
            }

            debug!("Role permission dirty check stopped");
        });

        info!(interval_ms = period.as_millis() as u64, "Role permission dirty check started");
        *slot = Some(RefreshTask { token, handle });
    }

    pub fn is_dirty_check_running(&self) -> bool {
        self.refresh_task
            .lock()
            .as_ref()
            .map(|task| !task.handle.is_finished())
            .unwrap_or(false)
    }

    /// Stop the dirty check and clear all caches
    ///
    /// Waits at most the configured grace period for the task to finish
    /// before aborting it.
    pub async fn shutdown(&self) {
        let task = self.refresh_task.lock().take();

        if let Some(RefreshTask { token, mut handle }) = task {
            token.cancel();
            if timeout(self.shutdown_grace, &mut handle).await.is_err() {
                warn!(
                    grace_ms = self.shutdown_grace.as_millis() as u64,
                    "Dirty check did not stop in time, aborting"
                );
                handle.abort();
            }
        }

        self.invalidate();
        info!("Role permission resolver shut down");
    }
}
