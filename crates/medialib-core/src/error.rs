//! Library error handling
//!
//! Every facade and repository operation reports one of a small set of
//! error kinds. SQLite failures are classified on the way in so that
//! callers can tell a duplicate insert from a broken database file.

use std::io;
use std::path::PathBuf;

use rusqlite::ffi;
use rusqlite::ErrorCode;
use thiserror::Error;

/// The API-level error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotInitialized,
    Validation,
    NotFound,
    Conflict,
    Schema,
    Storage,
}

impl ErrorKind {
    /// Stable lowercase name, used in JSON output
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotInitialized => "not_initialized",
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Schema => "schema",
            ErrorKind::Storage => "storage",
        }
    }
}

/// Errors that can occur during library operations
#[derive(Error, Debug)]
pub enum LibraryError {
    /// Operation called before `initialize()` or after `shutdown()`
    #[error("Library not initialized. Call initialize() first.")]
    NotInitialized,

    /// Input failed validation before any statement was built
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// Lookup, update or delete targeted a row that does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Duplicate membership or unique-constraint violation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Table or migration creation failed
    #[error("Schema error: {message}")]
    Schema {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    /// Failed to create the directory holding the database file
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Record could not be encoded to or decoded from JSON
    #[error("Invalid JSON record: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other SQLite failure
    #[error("Database error: {0}")]
    Storage(#[source] rusqlite::Error),
}

impl From<rusqlite::Error> for LibraryError {
    fn from(error: rusqlite::Error) -> Self {
        LibraryError::from_sqlite(error)
    }
}

impl LibraryError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        LibraryError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        LibraryError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn schema(message: impl Into<String>, source: rusqlite::Error) -> Self {
        LibraryError::Schema {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Classify a SQLite error by its extended result code
    ///
    /// Constraint failures map onto the API taxonomy; everything else
    /// stays a storage error.
    pub fn from_sqlite(error: rusqlite::Error) -> Self {
        let extended = match &error {
            rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
                e.extended_code
            }
            _ => return LibraryError::Storage(error),
        };

        match extended {
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => {
                LibraryError::Conflict(error.to_string())
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => LibraryError::NotFound {
                entity: "Referenced row",
                id: error.to_string(),
            },
            ffi::SQLITE_CONSTRAINT_CHECK | ffi::SQLITE_CONSTRAINT_NOTNULL => {
                LibraryError::Validation {
                    field: "record",
                    message: error.to_string(),
                }
            }
            _ => LibraryError::Storage(error),
        }
    }

    /// The taxonomy kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LibraryError::NotInitialized => ErrorKind::NotInitialized,
            LibraryError::Validation { .. } | LibraryError::Serialization(_) => {
                ErrorKind::Validation
            }
            LibraryError::NotFound { .. } => ErrorKind::NotFound,
            LibraryError::Conflict(_) => ErrorKind::Conflict,
            LibraryError::Schema { .. } => ErrorKind::Schema,
            LibraryError::CreateDirectory { .. } | LibraryError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Check if retrying the same call might succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            LibraryError::Storage(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            LibraryError::NotInitialized => Some("Run `medialib init` to create the database."),
            LibraryError::Schema { .. } => Some(
                "The database schema could not be created or migrated. Check that the file is a medialib database, or run `medialib reset --yes` to start over.",
            ),
            LibraryError::CreateDirectory { .. } => {
                Some("Check that the parent directory exists and you have write permissions.")
            }
            _ if self.is_retryable() => {
                Some("Another process is writing to the database. Try again in a moment.")
            }
            _ => None,
        }
    }
}

/// Result type for library operations
pub type Result<T> = std::result::Result<T, LibraryError>;
