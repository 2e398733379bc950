//! Process shutdown: OS signals, the listener's lifecycle state, and the
//! count of admitted RPC calls that must finish before the process exits.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::signal;
use tracing::{error, info};

/// Resolves on the first SIGINT or SIGTERM.
///
/// A handler that cannot be installed never resolves, so the other one still
/// decides when to stop.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                error!("failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received SIGINT, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}

/// Lifecycle of the HTTP listener: `Starting -> Ready -> Draining -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    /// Listener bound, routes not yet served.
    Starting,
    Ready,
    /// Shutdown requested; admitted calls are still running.
    Draining,
    /// Every admitted call has returned.
    Stopped,
}

impl HealthState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }
}

/// Gatekeeper for job RPC calls.
///
/// Job handlers call [`in_flight_guard`](Self::in_flight_guard) only while
/// [`is_accepting`](Self::is_accepting) holds. After
/// [`trigger_shutdown`](Self::trigger_shutdown) they answer `UNAVAILABLE`,
/// and [`wait_for_drain`](Self::wait_for_drain) blocks until every guard
/// handed out earlier has been dropped.
#[derive(Debug)]
pub struct ShutdownController {
    in_flight: Arc<AtomicU64>,
    health_state: ArcSwap<HealthState>,
}

impl ShutdownController {
    #[must_use]
    pub fn new() -> Self {
        Self {
            in_flight: Arc::new(AtomicU64::new(0)),
            health_state: ArcSwap::from_pointee(HealthState::Starting),
        }
    }

    fn transition(&self, state: HealthState) {
        self.health_state.store(Arc::new(state));
    }

    /// Marks the listener as serving.
    pub fn set_ready(&self) {
        self.transition(HealthState::Ready);
    }

    /// Stops admitting new calls.
    pub fn trigger_shutdown(&self) {
        self.transition(HealthState::Draining);
    }

    #[must_use]
    pub fn health_state(&self) -> HealthState {
        **self.health_state.load()
    }

    /// Whether a new RPC call may start.
    #[must_use]
    pub fn is_accepting(&self) -> bool {
        matches!(self.health_state(), HealthState::Starting | HealthState::Ready)
    }

    /// Counts one admitted call until the returned guard is dropped.
    #[must_use]
    pub fn in_flight_guard(&self) -> InFlightGuard {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        InFlightGuard {
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    #[must_use]
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Polls until no admitted call remains or `timeout` elapses.
    ///
    /// Moves to `Stopped` and returns `true` once the count reaches zero;
    /// leaves the state untouched and returns `false` on timeout.
    pub async fn wait_for_drain(&self, timeout: Duration) -> bool {
        let drained = tokio::time::timeout(timeout, async {
            while self.in_flight_count() > 0 {
                tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
            }
        })
        .await
        .is_ok();

        if drained {
            self.transition(HealthState::Stopped);
        }
        drained
    }
}

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the in-flight count on drop, including during unwinding.
#[derive(Debug)]
pub struct InFlightGuard {
    in_flight: Arc<AtomicU64>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calls_are_admitted_until_shutdown() {
        let controller = ShutdownController::new();
        assert!(controller.is_accepting());

        controller.set_ready();
        assert!(controller.is_accepting());

        controller.trigger_shutdown();
        assert!(!controller.is_accepting());
        assert_eq!(controller.health_state().as_str(), "draining");
    }

    #[test]
    fn guards_track_admitted_calls() {
        let controller = ShutdownController::new();
        let calls: Vec<_> = (0..3).map(|_| controller.in_flight_guard()).collect();
        assert_eq!(controller.in_flight_count(), 3);

        drop(calls);
        assert_eq!(controller.in_flight_count(), 0);
    }

    #[test]
    fn guard_is_released_when_the_call_panics() {
        let controller = Arc::new(ShutdownController::new());
        let inner = Arc::clone(&controller);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = inner.in_flight_guard();
            panic!("handler failed");
        }));

        assert!(result.is_err());
        assert_eq!(controller.in_flight_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn drain_waits_for_the_last_admitted_call() {
        let controller = Arc::new(ShutdownController::new());
        controller.set_ready();
        let call = controller.in_flight_guard();
        controller.trigger_shutdown();

        let finishing = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(250)).await;
            drop(call);
        });

        assert!(controller.wait_for_drain(Duration::from_secs(1)).await);
        assert_eq!(controller.health_state(), HealthState::Stopped);
        finishing.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn drain_gives_up_on_a_stuck_call() {
        let controller = ShutdownController::new();
        let _stuck = controller.in_flight_guard();
        controller.trigger_shutdown();

        assert!(!controller.wait_for_drain(Duration::from_secs(30)).await);
        assert_eq!(controller.health_state(), HealthState::Draining);
        assert!(!controller.is_accepting());
    }
}
