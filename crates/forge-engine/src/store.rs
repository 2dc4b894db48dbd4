// store.rs — GoalStore: authoritative state for every goal.
//
// Goals live in memory for the lifetime of the process; persistence across
// restarts is a non-goal of this core (the event journal is a log, not a
// store). Each goal has its own entry mutex under a shared map lock, so
// mutations to one goal serialize while distinct goals proceed
// concurrently.
//
// Lifecycle events are published while the entry lock is held: per-goal
// delivery order therefore always matches transition order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;

use crate::backend::CancelSignal;
use crate::bus::EventBus;
use crate::error::EngineError;
use crate::goal::{Goal, GoalId, GoalResult, GoalStatus, TaskDescriptor};
use crate::schema::{EventKind, SystemEvent};

struct GoalRecord {
    goal: Goal,
    cancel: CancelSignal,
}

/// In-memory store for goal records, the single source of truth for goal
/// state.
pub struct GoalStore {
    goals: RwLock<HashMap<GoalId, Arc<Mutex<GoalRecord>>>>,
    bus: Arc<EventBus>,
}

impl GoalStore {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            goals: RwLock::new(HashMap::new()),
            bus,
        }
    }

    /// Insert a new Pending goal and emit `GoalCreated`.
    ///
    /// A caller-supplied id that collides with an existing goal is a
    /// `Conflict`; generated ids are UUID v4 and treated as collision-free.
    /// Returns the goal snapshot plus the cancellation signal the dispatch
    /// task hands to the backend.
    pub fn insert(
        &self,
        goal_id: Option<GoalId>,
        task: TaskDescriptor,
    ) -> Result<(Goal, CancelSignal), EngineError> {
        let goal_id = goal_id.unwrap_or_else(GoalId::generate);

        let mut goals = self.goals.write().expect("goal map lock poisoned");
        if goals.contains_key(&goal_id) {
            return Err(EngineError::Conflict(goal_id));
        }

        let goal = Goal::new(goal_id.clone(), task);
        let cancel = CancelSignal::new();
        goals.insert(
            goal_id.clone(),
            Arc::new(Mutex::new(GoalRecord {
                goal: goal.clone(),
                cancel: cancel.clone(),
            })),
        );

        // Published under the map write lock: no transition can slip in
        // ahead of the creation event.
        self.bus.publish(&SystemEvent::for_goal(
            goal_id,
            EventKind::GoalCreated {
                task: goal.task.clone(),
            },
        ));
        tracing::debug!(goal_id = %goal.goal_id, "goal created");

        Ok((goal, cancel))
    }

    /// Snapshot a goal's current state.
    pub fn get(&self, goal_id: &GoalId) -> Result<Goal, EngineError> {
        let record = self.record(goal_id)?;
        let record = record.lock().expect("goal entry lock poisoned");
        Ok(record.goal.clone())
    }

    /// List all goals, newest first.
    pub fn list(&self) -> Vec<Goal> {
        let goals = self.goals.read().expect("goal map lock poisoned");
        let mut all: Vec<Goal> = goals
            .values()
            .map(|record| {
                record
                    .lock()
                    .expect("goal entry lock poisoned")
                    .goal
                    .clone()
            })
            .collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    /// Apply a state-machine transition and emit the matching event.
    ///
    /// `result` is recorded on Completed/Failed and ignored otherwise.
    pub fn transition(
        &self,
        goal_id: &GoalId,
        new_status: GoalStatus,
        result: Option<GoalResult>,
    ) -> Result<Goal, EngineError> {
        let record = self.record(goal_id)?;
        let mut record = record.lock().expect("goal entry lock poisoned");

        if !record.goal.status.can_transition_to(new_status) {
            return Err(EngineError::InvalidTransition {
                goal_id: goal_id.clone(),
                from: record.goal.status.to_string(),
                to: new_status.to_string(),
            });
        }

        tracing::debug!(
            goal_id = %goal_id,
            from = %record.goal.status,
            to = %new_status,
            "goal transition"
        );
        record.goal.status = new_status;
        record.goal.updated_at = Utc::now();
        if matches!(new_status, GoalStatus::Completed | GoalStatus::Failed) {
            record.goal.result = result;
        }

        let event = Self::event_for(&record.goal);
        self.bus
            .publish(&SystemEvent::for_goal(goal_id.clone(), event));
        Ok(record.goal.clone())
    }

    /// Request cancellation.
    ///
    /// A Pending or Running goal transitions to Cancelled immediately and
    /// its cancellation signal is armed for the backend to observe. A goal
    /// already terminal is a no-op: the existing terminal snapshot is
    /// returned without error and no event is emitted.
    pub fn cancel(&self, goal_id: &GoalId) -> Result<Goal, EngineError> {
        let record = self.record(goal_id)?;
        let mut record = record.lock().expect("goal entry lock poisoned");

        if record.goal.status.is_terminal() {
            return Ok(record.goal.clone());
        }

        tracing::debug!(goal_id = %goal_id, from = %record.goal.status, "goal cancelled");
        record.goal.status = GoalStatus::Cancelled;
        record.goal.updated_at = Utc::now();
        record.cancel.cancel();

        self.bus
            .publish(&SystemEvent::for_goal(goal_id.clone(), EventKind::GoalCancelled));
        Ok(record.goal.clone())
    }

    /// Publish a `GoalProgress` event for a Running goal.
    ///
    /// Dropped silently once the goal is terminal, so no subscriber ever
    /// sees progress after a terminal event.
    pub fn progress(&self, goal_id: &GoalId, message: &str) {
        let Ok(record) = self.record(goal_id) else {
            return;
        };
        let record = record.lock().expect("goal entry lock poisoned");
        if record.goal.status != GoalStatus::Running {
            return;
        }
        self.bus.publish(&SystemEvent::for_goal(
            goal_id.clone(),
            EventKind::GoalProgress {
                message: message.to_string(),
            },
        ));
    }

    fn record(&self, goal_id: &GoalId) -> Result<Arc<Mutex<GoalRecord>>, EngineError> {
        let goals = self.goals.read().expect("goal map lock poisoned");
        goals
            .get(goal_id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(goal_id.clone()))
    }

    fn event_for(goal: &Goal) -> EventKind {
        match (goal.status, &goal.result) {
            (GoalStatus::Running, _) => EventKind::GoalStarted,
            (GoalStatus::Cancelled, _) => EventKind::GoalCancelled,
            (GoalStatus::Completed, Some(GoalResult::Success { output })) => {
                EventKind::GoalCompleted {
                    output: output.clone(),
                }
            }
            (GoalStatus::Completed, _) => EventKind::GoalCompleted {
                output: String::new(),
            },
            (GoalStatus::Failed, Some(GoalResult::Error { detail })) => EventKind::GoalFailed {
                error: detail.clone(),
            },
            (GoalStatus::Failed, _) => EventKind::GoalFailed {
                error: String::new(),
            },
            // Pending is only ever announced through GoalCreated at insert.
            (GoalStatus::Pending, _) => EventKind::GoalCreated {
                task: goal.task.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::OverflowPolicy;
    use crate::goal::{AgentId, BackendTask};
    use crate::schema::SCHEMA_VERSION;

    fn store_with_bus() -> (GoalStore, Arc<EventBus>) {
        let bus = Arc::new(EventBus::new(64, OverflowPolicy::DropOldest));
        (GoalStore::new(Arc::clone(&bus)), bus)
    }

    fn git_task(args: &str) -> TaskDescriptor {
        TaskDescriptor {
            raw: format!("git {args}"),
            selected_agent: AgentId::Local,
            backend: BackendTask::Git {
                args: args.to_string(),
            },
        }
    }

    async fn drain_types(sub: &mut crate::bus::Subscription, n: usize) -> Vec<&'static str> {
        let mut types = Vec::new();
        for _ in 0..n {
            types.push(sub.recv().await.unwrap().event.type_name());
        }
        types
    }

    #[tokio::test]
    async fn insert_stores_pending_and_emits_created() {
        let (store, bus) = store_with_bus();
        let mut sub = bus.subscribe(SCHEMA_VERSION);

        let (goal, _cancel) = store.insert(None, git_task("status")).unwrap();
        assert_eq!(goal.status, GoalStatus::Pending);

        let event = sub.recv().await.unwrap();
        assert_eq!(event.event.type_name(), "goal_created");
        assert_eq!(event.goal_id, Some(goal.goal_id.clone()));
        assert_eq!(store.get(&goal.goal_id).unwrap().status, GoalStatus::Pending);
    }

    #[tokio::test]
    async fn caller_supplied_id_conflict() {
        let (store, _bus) = store_with_bus();
        store
            .insert(Some(GoalId::from("g-1")), git_task("status"))
            .unwrap();
        let err = store
            .insert(Some(GoalId::from("g-1")), git_task("log"))
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
    }

    #[tokio::test]
    async fn transitions_emit_matching_events() {
        let (store, bus) = store_with_bus();
        let mut sub = bus.subscribe(SCHEMA_VERSION);

        let (goal, _cancel) = store.insert(None, git_task("status")).unwrap();
        store
            .transition(&goal.goal_id, GoalStatus::Running, None)
            .unwrap();
        let done = store
            .transition(
                &goal.goal_id,
                GoalStatus::Completed,
                Some(GoalResult::Success {
                    output: "clean".to_string(),
                }),
            )
            .unwrap();

        assert_eq!(done.status, GoalStatus::Completed);
        assert_eq!(
            drain_types(&mut sub, 3).await,
            vec!["goal_created", "goal_started", "goal_completed"]
        );
    }

    #[tokio::test]
    async fn invalid_transition_is_rejected() {
        let (store, _bus) = store_with_bus();
        let (goal, _cancel) = store.insert(None, git_task("status")).unwrap();

        // Pending → Completed skips Running.
        let err = store
            .transition(&goal.goal_id, GoalStatus::Completed, None)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));
        assert_eq!(store.get(&goal.goal_id).unwrap().status, GoalStatus::Pending);
    }

    #[tokio::test]
    async fn unknown_goal_is_not_found() {
        let (store, _bus) = store_with_bus();
        assert!(matches!(
            store.get(&GoalId::from("missing")),
            Err(EngineError::NotFound(_))
        ));
        assert!(matches!(
            store.transition(&GoalId::from("missing"), GoalStatus::Running, None),
            Err(EngineError::NotFound(_))
        ));
        assert!(matches!(
            store.cancel(&GoalId::from("missing")),
            Err(EngineError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn cancel_arms_the_signal_and_emits_once() {
        let (store, bus) = store_with_bus();
        let mut sub = bus.subscribe(SCHEMA_VERSION);

        let (goal, cancel) = store.insert(None, git_task("status")).unwrap();
        assert!(!cancel.is_cancelled());

        let snapshot = store.cancel(&goal.goal_id).unwrap();
        assert_eq!(snapshot.status, GoalStatus::Cancelled);
        assert!(cancel.is_cancelled());

        // Second cancel: same terminal snapshot, no further event.
        let again = store.cancel(&goal.goal_id).unwrap();
        assert_eq!(again.status, GoalStatus::Cancelled);
        assert_eq!(again.updated_at, snapshot.updated_at);

        assert_eq!(
            drain_types(&mut sub, 2).await,
            vec!["goal_created", "goal_cancelled"]
        );
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn cancel_on_completed_goal_reports_existing_state() {
        let (store, _bus) = store_with_bus();
        let (goal, _cancel) = store.insert(None, git_task("status")).unwrap();
        store
            .transition(&goal.goal_id, GoalStatus::Running, None)
            .unwrap();
        store
            .transition(
                &goal.goal_id,
                GoalStatus::Completed,
                Some(GoalResult::Success {
                    output: "ok".to_string(),
                }),
            )
            .unwrap();

        let snapshot = store.cancel(&goal.goal_id).unwrap();
        assert_eq!(snapshot.status, GoalStatus::Completed);
    }

    #[tokio::test]
    async fn progress_is_dropped_outside_running() {
        let (store, bus) = store_with_bus();
        let mut sub = bus.subscribe(SCHEMA_VERSION);

        let (goal, _cancel) = store.insert(None, git_task("status")).unwrap();
        store.progress(&goal.goal_id, "too early"); // Pending — dropped
        store
            .transition(&goal.goal_id, GoalStatus::Running, None)
            .unwrap();
        store.progress(&goal.goal_id, "half way");
        store.cancel(&goal.goal_id).unwrap();
        store.progress(&goal.goal_id, "too late"); // terminal — dropped

        assert_eq!(
            drain_types(&mut sub, 4).await,
            vec![
                "goal_created",
                "goal_started",
                "goal_progress",
                "goal_cancelled"
            ]
        );
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn list_returns_goals_newest_first() {
        let (store, _bus) = store_with_bus();
        let (first, _) = store
            .insert(Some(GoalId::from("g-1")), git_task("status"))
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let (second, _) = store
            .insert(Some(GoalId::from("g-2")), git_task("log"))
            .unwrap();

        let all = store.list();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].goal_id, second.goal_id);
        assert_eq!(all[1].goal_id, first.goal_id);
    }
}
