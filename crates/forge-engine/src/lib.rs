//! # forge-engine
//!
//! Goal execution and event-subscription engine for Forge: one terminal
//! input line becomes a routed, trackable, cancellable unit of work whose
//! lifecycle streams to any number of subscribers.
//!
//! ## Key components
//!
//! - [`SystemEvent`] / [`SCHEMA_VERSION`] — the versioned wire contract;
//!   consumers reject only on major-version mismatch
//! - [`GoalStore`] — authoritative goal state and the lifecycle state
//!   machine (Pending → Running → Completed/Failed/Cancelled)
//! - [`EventBus`] — fan-out delivery with independent bounded
//!   per-subscriber queues
//! - [`route`] — pure classification of an input line into a Git or agent
//!   task
//! - [`ForgeEngine`] — the stable facade: `create_goal`,
//!   `subscribe_events`, `get_goal_status`, `cancel_goal`
//! - [`GitBackend`] / [`AgentBackend`] — capability seams the engine
//!   dispatches through

pub mod backend;
pub mod bus;
pub mod config;
pub mod engine;
pub mod error;
pub mod goal;
pub mod journal;
pub mod router;
pub mod schema;
pub mod store;

pub use backend::{AgentBackend, BackendContext, BackendError, CancelSignal, GitBackend};
pub use bus::{EventBus, OverflowPolicy, Subscription};
pub use config::EngineConfig;
pub use engine::ForgeEngine;
pub use error::EngineError;
pub use goal::{AgentId, BackendTask, Goal, GoalId, GoalResult, GoalStatus, TaskDescriptor};
pub use journal::Journal;
pub use router::route;
pub use schema::{check_compat, EventKind, SystemEvent, SCHEMA_VERSION};
pub use store::GoalStore;
