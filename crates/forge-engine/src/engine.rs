// engine.rs — ForgeEngine: the stable operation surface.
//
// Exactly four contractual operations: create_goal, subscribe_events,
// get_goal_status, cancel_goal. Everything else in this crate exists to
// serve them. Dispatch to a backend happens out-of-band on a spawned task;
// the caller of create_goal never waits on backend work.

use std::sync::Arc;

use crate::backend::{AgentBackend, BackendContext, BackendError, CancelSignal, GitBackend};
use crate::bus::{EventBus, Subscription};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::goal::{AgentId, BackendTask, Goal, GoalId, GoalResult, GoalStatus, TaskDescriptor};
use crate::router;
use crate::schema::SCHEMA_VERSION;
use crate::store::GoalStore;

/// The core engine: goal lifecycle, routing, and event fan-out behind one
/// facade. Cheap to clone-share via the `Arc`s it holds internally.
pub struct ForgeEngine {
    store: Arc<GoalStore>,
    bus: Arc<EventBus>,
    git: Arc<dyn GitBackend>,
    agent: Arc<dyn AgentBackend>,
}

impl ForgeEngine {
    /// Build an engine over the two backend capabilities.
    ///
    /// Must be called within a tokio runtime — goal dispatch spawns tasks.
    pub fn new(
        config: EngineConfig,
        git: Arc<dyn GitBackend>,
        agent: Arc<dyn AgentBackend>,
    ) -> Self {
        let bus = Arc::new(EventBus::new(config.subscriber_capacity, config.overflow));
        let store = Arc::new(GoalStore::new(Arc::clone(&bus)));
        Self {
            store,
            bus,
            git,
            agent,
        }
    }

    /// Create a goal and dispatch it to its backend.
    ///
    /// Returns as soon as the goal is stored as Pending and `GoalCreated`
    /// is published; execution proceeds on a spawned task. A caller-supplied
    /// id that collides with an existing goal fails with `Conflict`.
    pub fn create_goal(
        &self,
        goal_id: Option<GoalId>,
        task: TaskDescriptor,
    ) -> Result<GoalId, EngineError> {
        let (goal, cancel) = self.store.insert(goal_id, task)?;
        let id = goal.goal_id.clone();
        self.spawn_dispatch(goal, cancel);
        Ok(id)
    }

    /// Route one input line and create the resulting goal.
    ///
    /// The input-line → router → create_goal composition used by terminal
    /// frontends. Empty input is rejected before any goal or event exists.
    pub fn route_and_create(
        &self,
        input: &str,
        selected_agent: AgentId,
    ) -> Result<GoalId, EngineError> {
        let task = router::route(input, selected_agent)?;
        self.create_goal(None, task)
    }

    /// Open an event subscription at the engine's schema version.
    ///
    /// The subscription yields indefinitely until dropped; events published
    /// before this call are not replayed.
    pub fn subscribe_events(&self) -> Subscription {
        self.bus.subscribe(SCHEMA_VERSION)
    }

    /// Snapshot a goal's current state.
    pub fn get_goal_status(&self, goal_id: &GoalId) -> Result<Goal, EngineError> {
        self.store.get(goal_id)
    }

    /// Request cancellation of a goal.
    ///
    /// A request, not a guarantee of immediate backend termination: the
    /// backend observes the signal at its next safe checkpoint. On a goal
    /// already terminal this is a no-op returning the existing snapshot.
    pub fn cancel_goal(&self, goal_id: &GoalId) -> Result<Goal, EngineError> {
        self.store.cancel(goal_id)
    }

    /// All goals, newest first.
    pub fn list_goals(&self) -> Vec<Goal> {
        self.store.list()
    }

    fn spawn_dispatch(&self, goal: Goal, cancel: CancelSignal) {
        let store = Arc::clone(&self.store);
        let git = Arc::clone(&self.git);
        let agent = Arc::clone(&self.agent);

        tokio::spawn(async move {
            let goal_id = goal.goal_id.clone();

            // Pending → Running. A cancel that landed first wins: the goal
            // is already terminal and the backend is never invoked.
            match store.transition(&goal_id, GoalStatus::Running, None) {
                Ok(_) => {}
                Err(EngineError::InvalidTransition { .. }) => {
                    tracing::debug!(goal_id = %goal_id, "goal terminal before start; dispatch skipped");
                    return;
                }
                Err(err) => {
                    tracing::warn!(goal_id = %goal_id, error = %err, "dispatch aborted");
                    return;
                }
            }

            let ctx = BackendContext::new(goal_id.clone(), cancel, Arc::clone(&store));
            let outcome = match &goal.task.backend {
                BackendTask::Git { args } => git.execute(args, &ctx).await,
                BackendTask::Agent { agent: id, command } => {
                    agent.execute(*id, command, &ctx).await
                }
            };

            let report = match outcome {
                Ok(output) => store.transition(
                    &goal_id,
                    GoalStatus::Completed,
                    Some(GoalResult::Success { output }),
                ),
                Err(BackendError::Cancelled) => {
                    // The backend honored the signal; the store already
                    // recorded Cancelled when the request came in.
                    store.cancel(&goal_id)
                }
                Err(err) => store.transition(
                    &goal_id,
                    GoalStatus::Failed,
                    Some(GoalResult::Error {
                        detail: err.to_string(),
                    }),
                ),
            };

            match report {
                Ok(_) => {}
                Err(EngineError::InvalidTransition { .. }) => {
                    // Terminal race: cancellation (or another report) got
                    // there first. The recorded terminal state stands.
                    tracing::debug!(goal_id = %goal_id, "late terminal report ignored");
                }
                Err(err) => {
                    tracing::warn!(goal_id = %goal_id, error = %err, "terminal report failed");
                }
            }
        });
    }
}
