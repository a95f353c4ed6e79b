//! Core error types for launchplan-core.
//!
//! Pure planning components fail fast with [`ValidationError`]; the
//! placement coordinator reports [`AssignError`] so callers can tell a
//! vanished entity apart from a failed store call.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::schedule::Lane;

/// Core error type for launchplan-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Placement errors reported by the schedule coordinator
    #[error("Assignment error: {0}")]
    Assign(#[from] AssignError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Input rejected before any computation.
///
/// Every variant names the offending field so the caller can block the
/// originating action with a field-level reason.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Interval whose start lies after its end
    #[error("Invalid interval: start ({start}) must not be after end ({end})")]
    InvalidInterval { start: NaiveDate, end: NaiveDate },

    /// Risk window offsets outside `[1, cycle_length]` or reversed
    #[error(
        "Invalid risk window '{id}': offsets [{offset_start_day}, {offset_end_day}] must satisfy 0 < start <= end <= {cycle_length}"
    )]
    InvalidRiskWindow {
        id: String,
        offset_start_day: u32,
        offset_end_day: u32,
        cycle_length: u32,
    },

    /// Cycle with a non-positive length
    #[error("Invalid cycle: length must be at least one day (got {length_days})")]
    InvalidCycle { length_days: u32 },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl ValidationError {
    pub(crate) fn invalid_value(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Name of the field the error refers to.
    pub fn field(&self) -> &str {
        match self {
            Self::InvalidInterval { .. } => "interval",
            Self::InvalidRiskWindow { .. } => "risk_window",
            Self::InvalidCycle { .. } => "cycle",
            Self::InvalidValue { field, .. } => field,
        }
    }
}

/// Outcome of a placement write that did not succeed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssignError {
    /// The owning entity was deleted by another actor.
    #[error("Conflict: item '{item_id}' no longer exists")]
    Conflict { item_id: String },

    /// The backing store call failed; the intent is kept for retry.
    #[error("Transport error for '{item_id}': {message}")]
    Transport {
        item_id: String,
        lane: Option<Lane>,
        message: String,
    },

    /// A two-lane move where at least one lane failed.
    #[error("Partial move: applied {applied:?}, failed {}", failed_lanes(.failed))]
    PartialMove {
        applied: Vec<Lane>,
        failed: Vec<(Lane, AssignError)>,
    },
}

fn failed_lanes(failed: &[(Lane, AssignError)]) -> String {
    failed
        .iter()
        .map(|(lane, err)| format!("{lane}: {err}"))
        .collect::<Vec<_>>()
        .join("; ")
}

impl AssignError {
    pub(crate) fn from_store(err: StoreError, item_id: &str, lane: Option<Lane>) -> Self {
        match err {
            StoreError::NotFound(_) => AssignError::Conflict {
                item_id: item_id.to_string(),
            },
            StoreError::Transport(message) => AssignError::Transport {
                item_id: item_id.to_string(),
                lane,
                message,
            },
        }
    }

    /// Whether the user can retry without refreshing first.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Conflict { .. } => false,
            Self::Transport { .. } => true,
            Self::PartialMove { failed, .. } => failed.iter().all(|(_, e)| e.is_retryable()),
        }
    }
}

/// Error returned by a [`PlacementStore`](crate::schedule::PlacementStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The entity does not exist in the store.
    #[error("Item not found: {0}")]
    NotFound(String),

    /// The store could not be reached or the write failed.
    #[error("Transport failure: {0}")]
    Transport(String),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<DatabaseError> for StoreError {
    fn from(err: DatabaseError) -> Self {
        StoreError::Transport(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
