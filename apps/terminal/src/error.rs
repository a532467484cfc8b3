//! # Console Error Types
//!
//! Unified error type for console commands, plus startup failures.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Console                            │
//! │                                                                         │
//! │  Operator types ":pay pix"                                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command handler                                                 │  │
//! │  │  Result<Outcome, CommandError>                                   │  │
//! │  │         │                                                        │  │
//! │  │  Storage failure? ─── StoreError ─► CoreError::Storage ──┐      │  │
//! │  │         │                                                 │      │  │
//! │  │  Business rule? ───── CoreError::EmptyCart ──────── CommandError │  │
//! │  │         │                                                 │      │  │
//! │  │  Bad input? ───────── CommandError::usage ────────────────┘      │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  "[EMPTY_CART] Cart is empty" printed; the session keeps running       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::path::PathBuf;

use pdv_core::{CoreError, ErrorKind};
use pdv_db::DbError;
use serde::Serialize;
use thiserror::Error;

use crate::state::ConfigError;

/// Error returned from a console command.
///
/// ## Serialization
/// Serializes as:
/// ```json
/// { "code": "INSUFFICIENT_STOCK", "message": "Insufficient stock for ..." }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable message for the operator
    pub message: String,
}

/// Error codes for console responses.
///
/// Core failures serialize as their own kind (`"EMPTY_CART"`), the rest
/// as the variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Unknown command or malformed arguments
    Usage,

    /// Database could not be reached or queried
    DatabaseError,

    /// File read/write failed (backups)
    Io,

    /// Failure reported by the business core
    #[serde(untagged)]
    Core(ErrorKind),
}

impl CommandError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CommandError {
            code,
            message: message.into(),
        }
    }

    /// Creates a usage error, shown with the command's syntax.
    pub fn usage(message: impl Into<String>) -> Self {
        CommandError::new(ErrorCode::Usage, message)
    }

    pub fn io(path: &std::path::Path, err: std::io::Error) -> Self {
        CommandError::new(ErrorCode::Io, format!("{}: {}", path.display(), err))
    }

    /// True when the operator may simply try again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::Core(ErrorKind::StorageError) | ErrorCode::DatabaseError | ErrorCode::Io
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::String(code)) => f.write_str(&code),
            _ => write!(f, "{:?}", self),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for CommandError {}

/// Converts core errors to command errors.
impl From<CoreError> for CommandError {
    fn from(err: CoreError) -> Self {
        if let CoreError::Storage(e) = &err {
            tracing::error!(error = %e, "Storage failure");
        }
        CommandError::new(ErrorCode::Core(err.kind()), err.to_string())
    }
}

/// Converts database errors to command errors.
impl From<DbError> for CommandError {
    fn from(err: DbError) -> Self {
        tracing::error!(error = %err, "Database failure");
        CommandError::new(ErrorCode::DatabaseError, err.to_string())
    }
}

/// Failures that stop the console before the first prompt.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error at {path}: {source}")]
    Database {
        path: PathBuf,
        #[source]
        source: DbError,
    },

    #[error("Could not open session: {0}")]
    Session(#[from] CoreError),

    #[error("Console I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdv_core::StoreError;

    #[test]
    fn test_core_error_keeps_kind() {
        let err = CommandError::from(CoreError::EmptyCart);
        assert_eq!(err.code, ErrorCode::Core(ErrorKind::EmptyCart));
        assert_eq!(err.to_string(), "[EMPTY_CART] Cart is empty");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_storage_errors_are_retryable() {
        let err = CommandError::from(CoreError::from(StoreError::Backend("disk full".into())));
        assert!(err.is_retryable());
        assert!(CommandError::from(DbError::PoolExhausted).is_retryable());
    }

    #[test]
    fn test_serializes_code_and_message() {
        let json = serde_json::to_value(CommandError::usage("try :help")).unwrap();
        assert_eq!(json["code"], "USAGE");
        assert_eq!(json["message"], "try :help");
    }
}
