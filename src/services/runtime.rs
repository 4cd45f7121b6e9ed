//! Tokio Runtime Bridge
//!
//! The board is pumped from a plain thread, while transport clients (fred)
//! need a tokio reactor. One process-wide runtime serves both.
//!
//! ```text
//! main thread
//!       │
//!       ▼
//! block_on(board.start())        spawn_named_in_tokio(forwarder)
//!       │                                 │
//!       └──────────► tokio::Runtime ◄─────┘
//! ```

use std::future::Future;
use std::sync::OnceLock;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;

/// Global tokio runtime instance
static TOKIO_RUNTIME: OnceLock<Runtime> = OnceLock::new();

fn get_runtime() -> &'static Runtime {
    TOKIO_RUNTIME.get_or_init(|| Runtime::new().expect("Failed to create tokio runtime"))
}

/// Spawn a named task in the tokio runtime
///
/// Used for long-running background loops like subscription forwarders.
/// Dropping the handle detaches the task.
pub fn spawn_named_in_tokio<F>(name: &'static str, future: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::debug!("Spawning tokio task: {}", name);
    get_runtime().spawn(async move {
        future.await;
        tracing::debug!("Tokio task completed: {}", name);
    })
}

/// Owns a spawned task and aborts it when dropped
///
/// Keeps background loops tied to the lifetime of the connection that
/// started them.
#[derive(Debug)]
pub struct TaskGuard(JoinHandle<()>);

impl TaskGuard {
    pub fn new(handle: JoinHandle<()>) -> Self {
        Self(handle)
    }

    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Block the current thread on a future
///
/// Only for the binary's control path (connect, join, shutdown); never call it
/// from inside a runtime task.
pub fn block_on<F, T>(future: F) -> T
where
    F: Future<Output = T>,
{
    get_runtime().block_on(future)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawned_task_runs() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        spawn_named_in_tokio("test-task", async move {
            let _ = tx.send(42);
        });
        assert_eq!(
            rx.recv_timeout(std::time::Duration::from_secs(5)).expect("task ran"),
            42
        );
    }

    #[test]
    fn test_task_guard_aborts_on_drop() {
        let (tx, rx) = crossbeam_channel::bounded::<()>(1);
        let guard = TaskGuard::new(spawn_named_in_tokio("guarded-task", async move {
            let _held = tx;
            std::future::pending::<()>().await;
        }));
        assert!(!guard.is_finished());
        drop(guard);

        // The aborted task drops its sender, which disconnects the receiver
        let result = rx.recv_timeout(std::time::Duration::from_secs(5));
        assert_eq!(result, Err(crossbeam_channel::RecvTimeoutError::Disconnected));
    }

    #[test]
    fn test_block_on_returns_value() {
        let value = block_on(async {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            "done"
        });
        assert_eq!(value, "done");
    }
}
