// error.rs — Error types for the engine.

use thiserror::Error;

use crate::goal::GoalId;

/// Errors returned synchronously by engine operations.
///
/// Backend execution failures are deliberately absent: dispatch is
/// asynchronous, so they surface as a terminal `Failed` goal state plus a
/// `GoalFailed` event, never as an error across the engine boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The requested goal does not exist.
    #[error("goal not found: {0}")]
    NotFound(GoalId),

    /// A caller-supplied goal id collides with an existing goal.
    #[error("goal already exists: {0}")]
    Conflict(GoalId),

    /// The requested state change violates the goal state machine.
    /// Unreachable from the external operation surface — seeing it there
    /// indicates a store bug.
    #[error("invalid transition from {from} to {to} for goal {goal_id}")]
    InvalidTransition {
        goal_id: GoalId,
        from: String,
        to: String,
    },

    /// Consumer and producer disagree on the event schema major version.
    #[error("schema version mismatch: supported {supported}, found {found:?}")]
    SchemaVersionMismatch { supported: u16, found: Option<u16> },

    /// The input line was empty after trimming — no goal is created.
    #[error("empty input line")]
    EmptyInput,

    /// The agent identifier is not one of the known agents.
    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Failed to serialize/deserialize engine data.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to parse a configuration file.
    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),
}
