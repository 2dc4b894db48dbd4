// backend.rs — Capability interfaces the engine dispatches goals through.
//
// The engine never knows how Git or an agent actually executes work; it
// hands the task to whichever capability the task's kind selects, along
// with a context for cooperative cancellation and progress reporting.

use std::pin::pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Notify;

use crate::goal::{AgentId, GoalId};
use crate::store::GoalStore;

/// Errors a backend can report. These never cross the engine boundary
/// synchronously — they become a terminal `Failed` (or `Cancelled`) goal
/// state.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Spawning or talking to the underlying process/service failed.
    #[error("backend I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend ran and reported a failure.
    #[error("{0}")]
    Failed(String),

    /// The backend observed the goal's cancellation signal and stopped.
    #[error("cancelled")]
    Cancelled,
}

/// Cooperative cancellation token for one goal.
///
/// Armed once by the store when the goal is cancelled; backends poll
/// [`CancelSignal::is_cancelled`] at safe checkpoints or await
/// [`CancelSignal::cancelled`] alongside their work. Never forcefully
/// interrupts anything.
#[derive(Clone, Debug)]
pub struct CancelSignal {
    inner: Arc<CancelInner>,
}

#[derive(Debug)]
struct CancelInner {
    flag: AtomicBool,
    notify: Notify,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancelInner {
                flag: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    pub fn cancel(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Resolve once cancellation has been requested.
    pub async fn cancelled(&self) {
        // Register interest before the final check so a cancel landing in
        // between still wakes us.
        let mut notified = pin!(self.inner.notify.notified());
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-invocation context handed to a backend.
///
/// Progress flows back through the store so it is sequenced against the
/// goal's lifecycle events and dropped once the goal is terminal.
pub struct BackendContext {
    goal_id: GoalId,
    cancel: CancelSignal,
    store: Arc<GoalStore>,
}

impl BackendContext {
    pub fn new(goal_id: GoalId, cancel: CancelSignal, store: Arc<GoalStore>) -> Self {
        Self {
            goal_id,
            cancel,
            store,
        }
    }

    pub fn goal_id(&self) -> &GoalId {
        &self.goal_id
    }

    /// Emit a `GoalProgress` event for this goal.
    pub fn progress(&self, message: &str) {
        self.store.progress(&self.goal_id, message);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolve once this goal's cancellation has been requested.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }
}

/// Capability that performs Git operations.
#[async_trait]
pub trait GitBackend: Send + Sync {
    /// Execute a Git operation; `args` is the text after the `git ` prefix.
    async fn execute(&self, args: &str, ctx: &BackendContext) -> Result<String, BackendError>;
}

/// Capability that hands a command line to a coding agent.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    async fn execute(
        &self,
        agent: AgentId,
        command: &str,
        ctx: &BackendContext,
    ) -> Result<String, BackendError>;
}
