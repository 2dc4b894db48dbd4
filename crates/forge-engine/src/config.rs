// config.rs — Engine configuration.
//
// The two tunables that are explicit operator choices: how much an
// individual subscriber may lag (queue capacity) and what happens when it
// lags further (overflow policy). Loaded from a `forge.toml` when one is
// supplied, otherwise defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bus::OverflowPolicy;
use crate::error::EngineError;

/// Configuration for the goal engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bounded queue length per event subscriber.
    pub subscriber_capacity: usize,

    /// What to do when a subscriber's queue is full.
    pub overflow: OverflowPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            subscriber_capacity: 256,
            overflow: OverflowPolicy::DropOldest,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }
}
