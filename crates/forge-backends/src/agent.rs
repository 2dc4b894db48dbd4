// agent.rs — Local agent backend.
//
// The in-process stand-in for external coding-agent integrations: it
// acknowledges the routed command instead of calling out to a model.
// Claude/Cursor/BGPT integrations implement the same `AgentBackend` trait
// out of tree and are wired in at engine construction.

use async_trait::async_trait;

use forge_engine::{AgentBackend, AgentId, BackendContext, BackendError};

/// Agent capability that acknowledges commands locally.
#[derive(Default)]
pub struct LocalAgent;

impl LocalAgent {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AgentBackend for LocalAgent {
    async fn execute(
        &self,
        agent: AgentId,
        command: &str,
        ctx: &BackendContext,
    ) -> Result<String, BackendError> {
        if ctx.is_cancelled() {
            return Err(BackendError::Cancelled);
        }
        tracing::info!(%agent, command, "local agent handling command");
        ctx.progress("processing command");
        Ok(format!("{agent} agent acknowledged: {command}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_engine::{
        BackendTask, EventBus, GoalStore, OverflowPolicy, TaskDescriptor,
    };
    use std::sync::Arc;

    fn test_context() -> BackendContext {
        let bus = Arc::new(EventBus::new(16, OverflowPolicy::DropOldest));
        let store = Arc::new(GoalStore::new(bus));
        let task = TaskDescriptor {
            raw: "explain this diff".to_string(),
            selected_agent: AgentId::Claude,
            backend: BackendTask::Agent {
                agent: AgentId::Claude,
                command: "explain this diff".to_string(),
            },
        };
        let (goal, cancel) = store.insert(None, task).unwrap();
        BackendContext::new(goal.goal_id, cancel, store)
    }

    #[tokio::test]
    async fn acknowledges_with_agent_and_command() {
        let backend = LocalAgent::new();
        let output = backend
            .execute(AgentId::Claude, "explain this diff", &test_context())
            .await
            .unwrap();
        assert_eq!(output, "claude agent acknowledged: explain this diff");
    }

    #[tokio::test]
    async fn each_agent_id_is_reflected_in_the_reply() {
        let backend = LocalAgent::new();
        for agent in [AgentId::Local, AgentId::Cursor, AgentId::Bgpt] {
            let output = backend
                .execute(agent, "plan the release", &test_context())
                .await
                .unwrap();
            assert!(output.starts_with(&agent.to_string()));
        }
    }
}
