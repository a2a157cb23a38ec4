//! Graceful shutdown for the service tasks
//!
//! One `CancellationToken` fans out to every background task; the
//! controller keeps their join handles so `drain` can wait for them.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Owns the root cancellation token and the tasks listening on it
///
/// # Example
///
/// ```ignore
/// let mut shutdown = ShutdownController::with_ctrl_c();
///
/// let sweeper = RetrySweeper::new(engine.clone(), interval);
/// shutdown.track("sweeper", sweeper.spawn(shutdown.child_token()));
///
/// shutdown.wait_for_shutdown().await;
/// shutdown.drain(Duration::from_secs(5)).await;
/// ```
pub struct ShutdownController {
    token: CancellationToken,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownController {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            tasks: Vec::new(),
        }
    }

    /// Controller that cancels itself on Ctrl+C
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_ctrl_c() -> Self {
        let controller = Self::new();
        let token = controller.token.clone();

        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl+C, initiating graceful shutdown...");
                    token.cancel();
                }
                Err(e) => {
                    warn!("Failed to listen for Ctrl+C: {}", e);
                }
            }
        });

        controller
    }

    /// Token cancelled together with the controller
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Keep a task's handle so `drain` waits for it
    pub fn track(&mut self, name: &'static str, handle: JoinHandle<()>) {
        debug!(task = name, "Tracking background task");
        self.tasks.push((name, handle));
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn shutdown(&self) {
        info!("Manual shutdown triggered");
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn wait_for_shutdown(&self) {
        self.token.cancelled().await;
    }

    /// Cancel everything and wait up to `grace` for each tracked task
    ///
    /// Tasks still running after the grace period are aborted. Returns the
    /// number of tasks that did not stop on their own.
    pub async fn drain(self, grace: Duration) -> usize {
        self.token.cancel();

        let mut stragglers = 0;
        for (name, mut handle) in self.tasks {
            match tokio::time::timeout(grace, &mut handle).await {
                Ok(Ok(())) => debug!(task = name, "Task stopped"),
                Ok(Err(e)) => {
                    warn!(task = name, error = %e, "Task ended abnormally");
                    stragglers += 1;
                }
                Err(_) => {
                    warn!(task = name, grace_ms = grace.as_millis() as u64, "Task did not stop in time, aborting");
                    handle.abort();
                    stragglers += 1;
                }
            }
        }
        stragglers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_manual_shutdown() {
        let controller = ShutdownController::new();
        let token = controller.child_token();

        assert!(!controller.is_cancelled());
        assert!(!token.is_cancelled());

        controller.shutdown();

        assert!(controller.is_cancelled());
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_child_token_independence() {
        let controller = ShutdownController::new();
        let child1 = controller.child_token();
        let child2 = controller.child_token();

        // Cancelling child1 doesn't affect parent or child2
        child1.cancel();

        assert!(child1.is_cancelled());
        assert!(!child2.is_cancelled());
        assert!(!controller.is_cancelled());

        controller.shutdown();
        assert!(child2.is_cancelled());
    }

    #[tokio::test]
    async fn test_drain_waits_for_cooperative_tasks() {
        let mut controller = ShutdownController::new();
        for name in ["a", "b"] {
            let token = controller.child_token();
            controller.track(name, tokio::spawn(async move { token.cancelled().await }));
        }
        assert_eq!(controller.task_count(), 2);

        let stragglers = controller.drain(Duration::from_secs(1)).await;
        assert_eq!(stragglers, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_aborts_stuck_task() {
        let mut controller = ShutdownController::new();
        controller.track(
            "stuck",
            tokio::spawn(async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }),
        );

        let stragglers = controller.drain(Duration::from_millis(50)).await;
        assert_eq!(stragglers, 1);
    }
}
