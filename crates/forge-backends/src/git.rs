// git.rs — Git backend driving the `git` binary.
//
// Runs `git <args>` in a configured repository directory and returns the
// trimmed stdout. A non-zero exit surfaces stderr as the failure detail.
// Cancellation is observed while the child runs: the process is killed and
// `Cancelled` reported, which the engine resolves against the goal's
// already-recorded terminal state.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use forge_engine::{BackendContext, BackendError, GitBackend};

/// Git capability backed by the `git` CLI.
pub struct GitCli {
    repo: PathBuf,
}

impl GitCli {
    /// Create a backend operating on the given repository directory.
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self { repo: repo.into() }
    }

    /// True when a usable `git` binary is on the PATH.
    pub async fn available() -> bool {
        Command::new("git")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl GitBackend for GitCli {
    async fn execute(&self, args: &str, ctx: &BackendContext) -> Result<String, BackendError> {
        if ctx.is_cancelled() {
            return Err(BackendError::Cancelled);
        }

        // TODO: shell-style quoting so commit messages with spaces survive.
        let argv: Vec<&str> = args.split_whitespace().collect();
        if argv.is_empty() {
            return Err(BackendError::Failed("empty git arguments".to_string()));
        }

        tracing::info!(repo = %self.repo.display(), args, "running git");
        ctx.progress(&format!("git {}", argv.join(" ")));

        let child = Command::new("git")
            .args(&argv)
            .current_dir(&self.repo)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = tokio::select! {
            output = child.wait_with_output() => output?,
            _ = ctx.cancelled() => {
                // Dropping the select arm drops the child; kill_on_drop
                // reaps it.
                tracing::info!(args, "git command cancelled");
                return Err(BackendError::Cancelled);
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BackendError::Failed(format!(
                "git {} failed: {}",
                argv.join(" "),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_engine::{
        AgentId, BackendTask, CancelSignal, EventBus, GoalStore, OverflowPolicy, TaskDescriptor,
    };
    use std::sync::Arc;

    /// Build a context wired to a throwaway store so progress events have
    /// somewhere to go. Returns the goal's cancellation signal as the
    /// engine's cancel path would arm it.
    fn test_context_with_signal() -> (BackendContext, CancelSignal) {
        let bus = Arc::new(EventBus::new(16, OverflowPolicy::DropOldest));
        let store = Arc::new(GoalStore::new(bus));
        let task = TaskDescriptor {
            raw: "git status".to_string(),
            selected_agent: AgentId::Local,
            backend: BackendTask::Git {
                args: "status".to_string(),
            },
        };
        let (goal, cancel) = store.insert(None, task).unwrap();
        (
            BackendContext::new(goal.goal_id, cancel.clone(), store),
            cancel,
        )
    }

    fn test_context() -> BackendContext {
        test_context_with_signal().0
    }

    async fn init_repo(dir: &std::path::Path) {
        for args in [
            vec!["init"],
            vec!["config", "user.email", "forge@example.com"],
            vec!["config", "user.name", "Forge"],
        ] {
            let status = Command::new("git")
                .args(&args)
                .current_dir(dir)
                .status()
                .await
                .unwrap();
            assert!(status.success(), "git {args:?} failed");
        }
    }

    #[tokio::test]
    async fn status_succeeds_in_a_fresh_repo() {
        if !GitCli::available().await {
            eprintln!("git not installed; skipping");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path()).await;
        std::fs::write(dir.path().join("README.md"), "# forge\n").unwrap();

        let backend = GitCli::new(dir.path());
        let output = backend
            .execute("status --porcelain", &test_context())
            .await
            .unwrap();
        assert!(output.contains("README.md"));
    }

    #[tokio::test]
    async fn unknown_subcommand_reports_failure_detail() {
        if !GitCli::available().await {
            eprintln!("git not installed; skipping");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path()).await;

        let backend = GitCli::new(dir.path());
        let err = backend
            .execute("definitely-not-a-subcommand", &test_context())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Failed(_)));
        assert!(err.to_string().contains("definitely-not-a-subcommand"));
    }

    #[tokio::test]
    async fn empty_args_are_rejected() {
        let backend = GitCli::new(".");
        let err = backend.execute("   ", &test_context()).await.unwrap_err();
        assert!(matches!(err, BackendError::Failed(_)));
    }

    #[tokio::test]
    async fn pre_cancelled_context_short_circuits() {
        let (ctx, cancel) = test_context_with_signal();
        cancel.cancel();

        let backend = GitCli::new(".");
        let err = backend.execute("status", &ctx).await.unwrap_err();
        assert!(matches!(err, BackendError::Cancelled));
    }
}
