//! Error types for the DTC configuration store.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=db, 3=not_found, 4=validation, etc.)
//! - Retryability flags for callers that want to try again
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

use crate::sync::SyncError;

/// Result type alias for configuration store operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    NotInitialized,
    AlreadyInitialized,
    OpenError,
    NotOpen,
    QueryError,
    WriteError,
    DatabaseError,

    // Not Found (exit 3)
    ConfigurationNotFound,

    // Validation (exit 4)
    ReservedId,
    InvalidArgument,

    // Sync (exit 6)
    DecodeError,
    EncodeError,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::OpenError => "OPEN_ERROR",
            Self::NotOpen => "NOT_OPEN",
            Self::QueryError => "QUERY_ERROR",
            Self::WriteError => "WRITE_ERROR",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::ConfigurationNotFound => "CONFIGURATION_NOT_FOUND",
            Self::ReservedId => "RESERVED_ID",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::DecodeError => "DECODE_ERROR",
            Self::EncodeError => "ENCODE_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized
            | Self::AlreadyInitialized
            | Self::OpenError
            | Self::NotOpen
            | Self::QueryError
            | Self::WriteError
            | Self::DatabaseError => 2,
            Self::ConfigurationNotFound => 3,
            Self::ReservedId | Self::InvalidArgument => 4,
            Self::DecodeError | Self::EncodeError => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether the failed operation may succeed if simply attempted again.
    ///
    /// Query and write failures are typically transient (a locked database,
    /// a busy file); everything else needs different input.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::QueryError | Self::WriteError | Self::DatabaseError | Self::EncodeError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in configuration store operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `dtc init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("Cannot open configuration store at {path}: {message}")]
    Open { path: PathBuf, message: String },

    #[error("Configuration store is not open")]
    NotOpen,

    #[error("Query failed: {0}")]
    Query(#[source] rusqlite::Error),

    #[error("Write failed for configuration {id}: {source}")]
    Write {
        id: u64,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Configuration id 0 is reserved")]
    ReservedId,

    #[error("Configuration not found: {id}")]
    ConfigurationNotFound { id: u64 },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::Open { .. } => ErrorCode::OpenError,
            Self::NotOpen => ErrorCode::NotOpen,
            Self::Query(_) => ErrorCode::QueryError,
            Self::Write { .. } => ErrorCode::WriteError,
            Self::ReservedId => ErrorCode::ReservedId,
            Self::ConfigurationNotFound { .. } => ErrorCode::ConfigurationNotFound,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Sync(SyncError::Encode { .. }) => ErrorCode::EncodeError,
            Self::Sync(_) => ErrorCode::DecodeError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => {
                Some("Run `dtc init` to create the configuration store".to_string())
            }

            Self::AlreadyInitialized { path } => Some(format!(
                "A store already exists at {}. Use `--force` to re-apply its schema, or pass another path with `--db`.",
                path.display()
            )),

            Self::Open { path, .. } => Some(format!(
                "Check that {} exists and was created by `dtc init`, or pass another path with `--db`.",
                path.display()
            )),

            Self::ConfigurationNotFound { id } => Some(format!(
                "No configuration with id {id}. Use `dtc list` to see stored configurations."
            )),

            Self::ReservedId => {
                Some("Id 0 marks an invalid record; choose a non-zero id.".to_string())
            }

            Self::Sync(SyncError::MissingMetadata { .. }) => Some(
                "Every .bin file needs a .json sibling with the same base name.".to_string(),
            ),

            Self::Sync(SyncError::MalformedMetadata { .. }) => Some(
                "Metadata must look like {\"id\": \"<decimal id>\", \"name\": \"<name>\"}."
                    .to_string(),
            ),

            Self::NotOpen
            | Self::Query(_)
            | Self::Write { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Sync(_)
            | Self::InvalidArgument(_)
            | Self::Config(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
