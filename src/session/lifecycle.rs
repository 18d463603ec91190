use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{
    sync::{Notify, broadcast},
    time::Instant,
};

use super::plugin::LoginPluginExchange;
use crate::logging::SessionLogger;

pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Releases everything a connection holds. Must be idempotent.
pub trait SessionCleanup: Send + Sync {
    fn cleanup(&self);
}

impl SessionCleanup for LoginPluginExchange {
    fn cleanup(&self) {
        LoginPluginExchange::cleanup(self);
    }
}

impl<F> SessionCleanup for F
where
    F: Fn() + Send + Sync,
{
    fn cleanup(&self) {
        self()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Sessions alive when shutdown started.
    pub initial: usize,
    /// Sessions still alive after the grace period, cleaned up by force.
    pub forced: usize,
    pub elapsed: Duration,
}

/// Tracks live sessions and drives the stop sequence.
///
/// Shutdown broadcasts a stop notice, waits for sessions to finish on their
/// own for the grace period, then forces cleanup on whatever is left.
pub struct ShutdownCoordinator {
    stop: broadcast::Sender<()>,
    grace: Duration,
    sessions: Mutex<HashMap<u64, Arc<dyn SessionCleanup>>>,
    next_id: AtomicU64,
    drained: Notify,
    shutting_down: AtomicBool,
}

/// Registration of one session; dropping it deregisters the session.
#[must_use]
pub struct SessionGuard {
    coordinator: Arc<ShutdownCoordinator>,
    id: u64,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.coordinator.deregister(self.id);
    }
}

impl ShutdownCoordinator {
    pub fn new(grace: Duration) -> Arc<Self> {
        Arc::new(Self {
            stop: broadcast::channel(1).0,
            grace,
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            drained: Notify::new(),
            shutting_down: AtomicBool::new(false),
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, Arc<dyn SessionCleanup>>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.stop.subscribe()
    }

    pub fn grace_period(&self) -> Duration {
        self.grace
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    pub fn active_sessions(&self) -> usize {
        self.lock().len()
    }

    /// Registers a live session. Returns `None` once shutdown has begun.
    pub fn register(self: &Arc<Self>, cleanup: Arc<dyn SessionCleanup>) -> Option<SessionGuard> {
        let mut sessions = self.lock();
        if self.is_shutting_down() {
            return None;
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        sessions.insert(id, cleanup);
        Some(SessionGuard {
            coordinator: self.clone(),
            id,
        })
    }

    /// Subscribes to the stop notice, then registers. A shutdown that starts
    /// after a successful join is always seen on the returned receiver.
    pub fn join(
        self: &Arc<Self>,
        cleanup: Arc<dyn SessionCleanup>,
    ) -> Option<(SessionGuard, broadcast::Receiver<()>)> {
        let stop = self.subscribe();
        let guard = self.register(cleanup)?;
        Some((guard, stop))
    }

    fn deregister(&self, id: u64) {
        let empty = {
            let mut sessions = self.lock();
            sessions.remove(&id);
            sessions.is_empty()
        };
        if empty {
            self.drained.notify_waiters();
        }
    }

    async fn wait_drained(&self) {
        loop {
            let notified = self.drained.notified();
            if self.active_sessions() == 0 {
                return;
            }
            notified.await;
        }
    }

    pub async fn shutdown(&self) -> ShutdownReport {
        let started = Instant::now();
        let initial = {
            let sessions = self.lock();
            self.shutting_down.store(true, Ordering::Release);
            sessions.len()
        };
        SessionLogger::shutdown_started(initial, self.grace);
        let _ = self.stop.send(());

        let forced = if tokio::time::timeout(self.grace, self.wait_drained())
            .await
            .is_ok()
        {
            0
        } else {
            let leftover: Vec<_> = self.lock().drain().map(|(_, cleanup)| cleanup).collect();
            for cleanup in &leftover {
                cleanup.cleanup();
            }
            leftover.len()
        };

        let report = ShutdownReport {
            initial,
            forced,
            elapsed: started.elapsed(),
        };
        SessionLogger::shutdown_finished(&report);
        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[tokio::test]
    async fn empty_coordinator_shuts_down_immediately() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(10));
        let report = coordinator.shutdown().await;
        assert_eq!(report.initial, 0);
        assert_eq!(report.forced, 0);
        assert!(report.elapsed < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn sessions_that_leave_are_not_forced() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(10));
        let cleaned = Arc::new(AtomicUsize::new(0));
        let counter = cleaned.clone();
        let guard = coordinator
            .register(Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        let mut stop = coordinator.subscribe();
        tokio::spawn(async move {
            let _ = stop.recv().await;
            drop(guard);
        });

        let report = coordinator.shutdown().await;
        assert_eq!(report.initial, 1);
        assert_eq!(report.forced, 0);
        assert_eq!(cleaned.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stragglers_are_forced_after_grace() {
        let coordinator = ShutdownCoordinator::new(DEFAULT_GRACE_PERIOD);
        let cleaned = Arc::new(AtomicUsize::new(0));
        let counter = cleaned.clone();
        let _guard = coordinator
            .register(Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        let report = coordinator.shutdown().await;
        assert_eq!(report.forced, 1);
        assert_eq!(cleaned.load(Ordering::SeqCst), 1);
        assert!(report.elapsed >= DEFAULT_GRACE_PERIOD);
        assert_eq!(coordinator.active_sessions(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_sent_right_after_joining_is_seen() {
        let coordinator = ShutdownCoordinator::new(DEFAULT_GRACE_PERIOD);
        let (guard, mut stop) = coordinator.join(Arc::new(|| {})).unwrap();

        let shutdown = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.shutdown().await }
        });
        assert!(stop.recv().await.is_ok());
        drop(guard);

        let report = shutdown.await.unwrap();
        assert_eq!(report.initial, 1);
        assert_eq!(report.forced, 0);
        assert!(coordinator.join(Arc::new(|| {})).is_none());
    }

    #[tokio::test]
    async fn registration_closes_with_shutdown() {
        let coordinator = ShutdownCoordinator::new(Duration::from_millis(10));
        coordinator.shutdown().await;
        assert!(coordinator.register(Arc::new(|| {})).is_none());
    }
}
