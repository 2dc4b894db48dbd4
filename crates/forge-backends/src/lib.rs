//! # forge-backends
//!
//! Reference implementations of the Forge engine's backend capabilities:
//!
//! - [`GitCli`] — Git operations via the `git` binary
//! - [`LocalAgent`] — local acknowledgement agent standing in for external
//!   integrations
//!
//! Both implement the capability traits from `forge-engine` and are wired
//! into [`forge_engine::ForgeEngine::new`] by the embedding application.

pub mod agent;
pub mod git;

pub use agent::LocalAgent;
pub use git::GitCli;
