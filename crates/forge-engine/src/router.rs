// router.rs — Classify a raw input line into a task descriptor.
//
// Routing is pure and deterministic: identical (text, agent) pairs always
// yield identical decisions. The selected agent travels as an explicit
// parameter — the engine holds no ambient "active agent" state.

use crate::error::EngineError;
use crate::goal::{AgentId, BackendTask, TaskDescriptor};

/// Literal prefix that selects the Git route. Case-sensitive, single space.
const GIT_PREFIX: &str = "git ";

/// Produce the route decision for one input line.
///
/// - Empty (or all-whitespace) input is rejected; no goal is created.
/// - `git <args>` routes to the Git backend with `<args>` verbatim; the
///   selected agent is recorded on the descriptor for audit but ignored by
///   dispatch.
/// - Anything else routes to the agent backend under the selected agent,
///   with the full trimmed line as the command.
pub fn route(input: &str, selected_agent: AgentId) -> Result<TaskDescriptor, EngineError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(EngineError::EmptyInput);
    }

    let backend = match trimmed.strip_prefix(GIT_PREFIX) {
        Some(rest) => BackendTask::Git {
            args: rest.to_string(),
        },
        None => BackendTask::Agent {
            agent: selected_agent,
            command: trimmed.to_string(),
        },
    };

    Ok(TaskDescriptor {
        raw: trimmed.to_string(),
        selected_agent,
        backend,
    })
}
