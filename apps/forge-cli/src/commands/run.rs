// run.rs — Route one input line, execute the goal, stream its events.

use std::path::Path;
use std::sync::Arc;

use forge_backends::{GitCli, LocalAgent};
use forge_engine::{
    AgentId, EngineConfig, EventKind, ForgeEngine, GoalStatus, Journal, SystemEvent,
};

pub async fn execute(
    line: &str,
    agent: &str,
    repo: &Path,
    config: Option<&Path>,
    journal: Option<&Path>,
) -> anyhow::Result<()> {
    let agent: AgentId = agent.parse()?;
    let config = match config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let engine = ForgeEngine::new(
        config,
        Arc::new(GitCli::new(repo)),
        Arc::new(LocalAgent::new()),
    );

    // Subscribe before creating the goal so no event is missed.
    let mut events = engine.subscribe_events();
    if let Some(path) = journal {
        let sink = Journal::open(path)?;
        tokio::spawn(sink.run(engine.subscribe_events()));
    }

    let goal_id = engine.route_and_create(line, agent)?;
    println!("Goal created: {goal_id}");

    let mut failed = false;
    while let Some(event) = events.recv().await {
        if event.goal_id.as_ref() != Some(&goal_id) {
            continue;
        }
        print_event(&event);
        if event.event.is_terminal() {
            failed = matches!(event.event, EventKind::GoalFailed { .. });
            break;
        }
    }

    let goal = engine.get_goal_status(&goal_id)?;
    println!("Final state: {}", goal.status);
    if failed || goal.status == GoalStatus::Failed {
        std::process::exit(1);
    }
    Ok(())
}

fn print_event(event: &SystemEvent) {
    match &event.event {
        EventKind::GoalCreated { task } => {
            println!("  [created] {}", task.raw);
        }
        EventKind::GoalStarted => println!("  [started]"),
        EventKind::GoalProgress { message } => println!("  [progress] {message}"),
        EventKind::GoalCompleted { output } => {
            println!("  [completed]");
            if !output.is_empty() {
                for line in output.lines() {
                    println!("    {line}");
                }
            }
        }
        EventKind::GoalFailed { error } => println!("  [failed] {error}"),
        EventKind::GoalCancelled => println!("  [cancelled]"),
        EventKind::Unknown => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_engine::GoalResult;

    // Drive an agent goal end to end through the same engine wiring the
    // command uses, without touching stdout.
    #[tokio::test]
    async fn agent_line_runs_to_completion() {
        let engine = ForgeEngine::new(
            EngineConfig::default(),
            Arc::new(GitCli::new(".")),
            Arc::new(LocalAgent::new()),
        );
        let mut events = engine.subscribe_events();

        let goal_id = engine
            .route_and_create("explain this diff", AgentId::Claude)
            .unwrap();

        let mut terminal = None;
        while let Some(event) = events.recv().await {
            if event.event.is_terminal() {
                terminal = Some(event);
                break;
            }
        }
        assert!(matches!(
            terminal.unwrap().event,
            EventKind::GoalCompleted { .. }
        ));

        let goal = engine.get_goal_status(&goal_id).unwrap();
        assert_eq!(goal.status, GoalStatus::Completed);
        assert!(matches!(goal.result, Some(GoalResult::Success { .. })));
    }

    #[tokio::test]
    async fn journal_captures_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        let engine = ForgeEngine::new(
            EngineConfig::default(),
            Arc::new(GitCli::new(".")),
            Arc::new(LocalAgent::new()),
        );
        let sink = Journal::open(&path).unwrap();
        tokio::spawn(sink.run(engine.subscribe_events()));
        let mut events = engine.subscribe_events();

        engine
            .route_and_create("plan the release", AgentId::Local)
            .unwrap();
        while let Some(event) = events.recv().await {
            if event.event.is_terminal() {
                break;
            }
        }
        // Let the journal pump drain what the terminal event left queued.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.lines().count() >= 3); // created, started, ..., completed
        assert!(content.contains("goal_created"));
        assert!(content.contains("goal_completed"));
    }
}
