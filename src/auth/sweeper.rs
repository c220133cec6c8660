use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::auth::AuthService;

/// Background task that reclaims expired sessions.
///
/// Runs forever on a fixed interval regardless of request traffic. Each pass
/// holds the registry's write guard from start to finish, so aborting the
/// task between ticks never leaves a half-swept registry visible.
pub async fn run_sweep_loop(auth_service: Arc<AuthService>, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    // The first tick completes immediately.
    interval.tick().await;
    info!("Session sweeper started (every {}s)", interval_secs);

    loop {
        interval.tick().await;
        let now = auth_service.now();
        let removed = auth_service.sweep(now).await;
        debug!("Sweep tick at {} removed {} session(s)", now.to_rfc3339(), removed);
    }
}

/// How the sweeper task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweeperExit {
    Cancelled,
    Panicked,
    Returned,
}

/// Waits on the sweeper task and reports how it ended. Anything other than
/// cancellation means expired sessions are no longer being reclaimed.
pub async fn watch_sweeper(handle: JoinHandle<()>) -> SweeperExit {
    match handle.await {
        Ok(()) => {
            error!("Session sweeper exited unexpectedly; expired sessions will not be reclaimed");
            SweeperExit::Returned
        }
        Err(e) if e.is_panic() => {
            error!("Session sweeper panicked; expired sessions will not be reclaimed: {}", e);
            SweeperExit::Panicked
        }
        Err(_) => {
            info!("Session sweeper stopped");
            SweeperExit::Cancelled
        }
    }
}
