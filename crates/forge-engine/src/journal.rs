// journal.rs — Append-only JSONL journal of engine events.
//
// One JSON object per line, flushed after each event so the file is
// readable with standard tools (jq, tail -f) while the engine runs. The
// journal is an event log for observability — it is not the goal store and
// is never read back by the engine.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::bus::Subscription;
use crate::error::EngineError;
use crate::schema::SystemEvent;

/// JSONL sink for engine events.
pub struct Journal {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl Journal {
    /// Open (or create) a journal at the given path, in append mode.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| EngineError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| EngineError::Io {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Self {
            writer: BufWriter::new(file),
            path,
        })
    }

    /// Append one event as a JSON line and flush.
    pub fn append(&mut self, event: &SystemEvent) -> Result<(), EngineError> {
        let json = serde_json::to_string(event)?;
        writeln!(self.writer, "{}", json).map_err(|source| EngineError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        self.writer.flush().map_err(|source| EngineError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        Ok(())
    }

    /// Drain a subscription into this journal until it ends.
    ///
    /// Write failures are logged and skipped — the journal never disturbs
    /// the engine or other subscribers.
    pub async fn run(mut self, mut subscription: Subscription) {
        while let Some(event) = subscription.recv().await {
            if let Err(err) = self.append(&event) {
                tracing::warn!(error = %err, "journal write failed");
            }
        }
    }
}
