//! SQLite connection management
//!
//! There is no long-lived connection. Every logical operation asks the
//! `Database` for a fresh connection and drops it before returning, so the
//! file is released on every exit path.
//!
//! Each connection gets:
//! - `PRAGMA foreign_keys = ON` (cascading deletes depend on it)
//! - a busy timeout for write-lock contention between processes

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::config::{Config, DEFAULT_BUSY_TIMEOUT_MS};
use crate::error::{LibraryError, Result};

/// Location and connection settings of the library database
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
    busy_timeout: Duration,
}

impl Database {
    /// Describe a database file; nothing is opened yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }

    /// Database described by a configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.database_path()).with_busy_timeout(Duration::from_millis(
            config.busy_timeout_ms,
        ))
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the directory holding the database file
    pub fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| LibraryError::CreateDirectory {
                    path: parent.to_path_buf(),
                    source,
                })?;
                debug!("Created data directory {:?}", parent);
            }
        }
        Ok(())
    }

    /// Open a new connection, creating the file if needed
    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
                | OpenFlags::SQLITE_OPEN_URI,
        )
        .map_err(LibraryError::Storage)?;

        conn.busy_timeout(self.busy_timeout)
            .map_err(LibraryError::Storage)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(LibraryError::Storage)?;

        Ok(conn)
    }

    /// Check if the database file exists on disk
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Size of the database file in bytes, 0 if it doesn't exist
    pub fn file_size(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }

    /// Human-readable database file size
    pub fn file_size_human(&self) -> String {
        format_bytes(self.file_size())
    }
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
