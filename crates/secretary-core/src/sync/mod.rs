//! External calendar synchronization.
//!
//! Provider payloads are normalized into [`EventRecord`]s, diffed against the
//! locally stored events of the same provider, and the diff is applied to
//! produce the next event and task collections. Everything here is pure;
//! fetching and persisting belong to the caller.

pub mod apply;
pub mod diff;
pub mod normalize;
pub mod types;


pub use apply::{apply_diff, SyncEngine, SyncOutcome};
pub use diff::{diff, merge_external, ScheduleDiffEngine};
pub use normalize::{from_google, from_outlook, normalize_payload, parse_ics, PayloadFormat};
pub use types::{EventDiff, EventRecord, Provider, SyncStats, SyncStatus};
