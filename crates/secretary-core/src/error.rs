//! Core error types for secretary-core.
//!
//! The planner and the diff engine are total over well-formed input, so most
//! of this hierarchy covers the edges: configuration files, caller-supplied
//! options, provider payloads, and applying a diff to a stale snapshot.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for secretary-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Errors while applying a sync diff
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Provider payload normalization errors
    #[error("Normalization error: {0}")]
    Normalize(#[from] NormalizeError),

    /// Input document could not be read or decoded
    #[error("Cannot read {path}: {message}")]
    Input { path: PathBuf, message: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Could not determine or create the data directory
    #[error("Cannot resolve data directory: {0}")]
    DataDir(String),

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration tree
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Clock time not in `HH:MM` form or out of range
    #[error("Invalid clock time '{0}': expected HH:MM")]
    InvalidClockTime(String),

    /// Working window that does not move forward
    #[error("Invalid working hours: end ({end}) must be later than start ({start})")]
    InvalidWorkingHours { start: String, end: String },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors raised when a diff cannot be applied to a collection.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SyncError {
    /// An update targets a local event that is not in the collection anymore
    #[error("Local event '{id}' targeted by an update is not in the collection")]
    UnknownLocalEvent { id: String },

    /// Diff entry belongs to a different provider than the one being synced
    #[error("Event '{id}' belongs to provider '{found}', expected '{expected}'")]
    ProviderMismatch {
        id: String,
        expected: String,
        found: String,
    },
}

/// Errors raised while turning provider payloads into event records.
#[derive(Error, Debug)]
pub enum NormalizeError {
    /// Payload did not have the provider's expected shape
    #[error("Malformed {provider} payload: {message}")]
    BadPayload { provider: String, message: String },

    /// Timestamp could not be parsed
    #[error("Invalid timestamp '{0}'")]
    BadTimestamp(String),

    /// iCalendar feed could not be parsed
    #[error("ICS parse error: {0}")]
    Ics(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
