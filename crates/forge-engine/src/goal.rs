// goal.rs — Goal: the trackable unit of work created from one routed
// input line.
//
// The state machine enforces a valid lifecycle:
//   Pending → Running → {Completed | Failed}
//   {Pending, Running} → Cancelled
// Terminal states are immutable; a cancelled goal never becomes Completed.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;

/// Opaque goal identifier, assigned at creation, immutable.
///
/// Generated ids are UUID v4 strings; callers may supply their own through
/// the engine facade.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoalId(String);

impl GoalId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GoalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GoalId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for GoalId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The agents a command line can be addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentId {
    Local,
    Claude,
    Cursor,
    Bgpt,
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentId::Local => write!(f, "local"),
            AgentId::Claude => write!(f, "claude"),
            AgentId::Cursor => write!(f, "cursor"),
            AgentId::Bgpt => write!(f, "bgpt"),
        }
    }
}

impl FromStr for AgentId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(AgentId::Local),
            "claude" => Ok(AgentId::Claude),
            "cursor" => Ok(AgentId::Cursor),
            "bgpt" => Ok(AgentId::Bgpt),
            other => Err(EngineError::UnknownAgent(other.to_string())),
        }
    }
}

/// The backend half of a task: which capability executes it, with what input.
///
/// Dispatch goes through the capability traits in [`crate::backend`] — the
/// engine never branches on command-text prefixes itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendTask {
    /// A Git operation; `args` is everything after the `git ` prefix.
    Git { args: String },
    /// An agent task; `command` is the full trimmed input line.
    Agent { agent: AgentId, command: String },
}

/// Description of the work behind a goal, produced by the router and
/// consumed verbatim at goal creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    /// The trimmed input line as the user typed it.
    pub raw: String,

    /// The agent selected in the UI when the line was entered. Recorded for
    /// every route — Git dispatch ignores it but keeps it for audit.
    pub selected_agent: AgentId,

    /// Which backend executes this task.
    pub backend: BackendTask,
}

/// The lifecycle state of a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalStatus::Pending => write!(f, "pending"),
            GoalStatus::Running => write!(f, "running"),
            GoalStatus::Completed => write!(f, "completed"),
            GoalStatus::Failed => write!(f, "failed"),
            GoalStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl GoalStatus {
    /// Check whether transitioning from this state to `next` is valid.
    ///
    /// The valid transitions form a directed graph:
    ///   Pending → Running → {Completed, Failed}
    ///   {Pending, Running} → Cancelled
    /// No transition leaves a terminal state.
    pub fn can_transition_to(&self, next: GoalStatus) -> bool {
        matches!(
            (self, next),
            (GoalStatus::Pending, GoalStatus::Running)
                | (GoalStatus::Pending, GoalStatus::Cancelled)
                | (GoalStatus::Running, GoalStatus::Completed)
                | (GoalStatus::Running, GoalStatus::Failed)
                | (GoalStatus::Running, GoalStatus::Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GoalStatus::Completed | GoalStatus::Failed | GoalStatus::Cancelled
        )
    }
}

/// Outcome recorded on a terminal goal. Present only on Completed/Failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GoalResult {
    /// Backend output text.
    Success { output: String },
    /// Backend error detail, surfaced verbatim to consumers.
    Error { detail: String },
}

/// A goal — one unit of trackable work.
///
/// Snapshots returned by the store are point-in-time clones; the store
/// remains the single source of truth for live state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub goal_id: GoalId,
    pub task: TaskDescriptor,
    pub status: GoalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<GoalResult>,
}

impl Goal {
    /// Create a new goal in the Pending state.
    pub fn new(goal_id: GoalId, task: TaskDescriptor) -> Self {
        let now = Utc::now();
        Self {
            goal_id,
            task,
            status: GoalStatus::Pending,
            created_at: now,
            updated_at: now,
            result: None,
        }
    }
}
