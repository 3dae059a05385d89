//! # Secretary Core Library
//!
//! Scheduling core of the Secretary assistant. Everything here is pure and
//! synchronous: callers fetch provider payloads and persist collections, the
//! library decides what changes.
//!
//! ## Architecture
//!
//! - **Sync**: normalizes provider payloads, diffs them against the local copy
//!   by provider event id with last-write-wins, and applies the diff
//! - **Planner**: greedy placement of today's flexible tasks around fixed
//!   events inside working hours
//! - **Quick add**: turns free text like "Coffee tomorrow 5pm at Starbucks"
//!   into a draft task
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`ScheduleDiffEngine`]: create/update/delete diff of two event sets
//! - [`DailyPlanner`]: daily slot filling
//! - [`SyncEngine`]: per-provider detect-and-apply
//! - [`Config`]: Application configuration management

pub mod error;
pub mod planner;
pub mod quick_add;
pub mod record;
pub mod storage;
pub mod sync;

pub use error::{ConfigError, CoreError, NormalizeError, SyncError, ValidationError};
pub use planner::{
    plan, plan_detailed, ClockTime, DailyPlanner, PlacedTask, PlanOptions, PlanOutcome,
    PlannerConfig,
};
pub use quick_add::ParsedEntry;
pub use record::{Priority, RecordKind, TaskRecord};
pub use storage::Config;
pub use sync::{
    apply_diff, diff, EventDiff, EventRecord, PayloadFormat, Provider, ScheduleDiffEngine,
    SyncEngine, SyncOutcome, SyncStats, SyncStatus,
};
