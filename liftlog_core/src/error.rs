//! Error types for the liftlog_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for liftlog_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation attempted in a session state that forbids it
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Referenced exercise or set does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Exercise name already present in the session ledger
    #[error("Duplicate exercise: {0}")]
    DuplicateExercise(String),

    /// Finish-and-save requested with zero completed sets
    #[error("Nothing to save: session has no completed sets")]
    NothingToSave,

    /// Session snapshot failed validation and could not be repaired
    #[error("Validation error: {0}")]
    Validation(String),

    /// Persistence adapter call failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
