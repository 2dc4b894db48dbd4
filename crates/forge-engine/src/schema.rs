// schema.rs — Versioned wire contract for engine-emitted events.
//
// Compatibility rules for `SystemEvent`:
// - The major event schema version must match exactly.
// - New event variants are additive within the same major version; consumers
//   must treat unknown variants as ignorable, never as errors.
// - Existing variant field names and semantics are backwards-compatible; a
//   breaking change to either bumps `SCHEMA_VERSION`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::goal::{GoalId, TaskDescriptor};

/// Current major version of the event schema.
pub const SCHEMA_VERSION: u16 = 1;

/// A notification describing a goal-state change or engine-level occurrence.
///
/// `goal_id` is absent for engine-wide events (none exist in v1, but the
/// envelope reserves the slot so adding one stays non-breaking).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemEvent {
    pub schema_version: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<GoalId>,
    pub timestamp: DateTime<Utc>,
    pub event: EventKind,
}

impl SystemEvent {
    /// Build a v1 event for the given goal.
    pub fn for_goal(goal_id: GoalId, event: EventKind) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            goal_id: Some(goal_id),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// The enumerated event variants.
///
/// `Unknown` is the consumer-side landing spot for variants added after the
/// consumer was built — deserialization maps unrecognized tags there instead
/// of failing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    GoalCreated { task: TaskDescriptor },
    GoalStarted,
    GoalProgress { message: String },
    GoalCompleted { output: String },
    GoalFailed { error: String },
    GoalCancelled,
    #[serde(other)]
    Unknown,
}

impl EventKind {
    /// The wire tag for this variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            EventKind::GoalCreated { .. } => "goal_created",
            EventKind::GoalStarted => "goal_started",
            EventKind::GoalProgress { .. } => "goal_progress",
            EventKind::GoalCompleted { .. } => "goal_completed",
            EventKind::GoalFailed { .. } => "goal_failed",
            EventKind::GoalCancelled => "goal_cancelled",
            EventKind::Unknown => "unknown",
        }
    }

    /// True for the variants that end a goal's event sequence.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EventKind::GoalCompleted { .. }
                | EventKind::GoalFailed { .. }
                | EventKind::GoalCancelled
        )
    }
}

/// Validate a raw event against a consumer's supported major version.
///
/// Rejects only on major-version mismatch — never on an unknown variant or
/// unknown field. A raw value with no readable `schema_version` cannot be
/// matched to any major and is reported as a mismatch with `found: None`.
pub fn check_compat(raw: &serde_json::Value, supported: u16) -> Result<(), EngineError> {
    let found = raw
        .get("schema_version")
        .and_then(|v| v.as_u64())
        .and_then(|v| u16::try_from(v).ok());

    match found {
        Some(version) if version == supported => Ok(()),
        found => Err(EngineError::SchemaVersionMismatch { supported, found }),
    }
}
