//! medialib core library
//!
//! This crate provides the data layer of medialib, a local media library
//! that keeps songs, playlists, playlist membership and subtitles in a
//! single SQLite file.
//!
//! # Architecture
//!
//! - **SQLite** (via rusqlite): the only store; one connection per operation
//! - **Repositories**: one per table, parameterized statements only
//! - **Library**: facade with an explicit initialize/shutdown lifecycle
//!
//! # Quick Start
//!
//! ```text
//! let mut library = Library::open()?;
//! library.initialize()?;
//!
//! let song = library.add_song(&NewSong::new("Song A", 200, "a.mp3"))?;
//! let songs = library.search_songs("song")?;
//! ```
//!
//! # Modules
//!
//! - `library`: the `Library` facade (main entry point)
//! - `models`: records and their JSON encoding
//! - `repository`: per-table data access
//! - `storage`: connection handling and schema migrations
//! - `validation`: input checks run before any statement
//! - `error`: the error taxonomy
//! - `config`: application configuration

pub mod config;
pub mod error;
pub mod library;
pub mod models;
pub mod repository;
pub mod storage;
pub mod validation;

pub use config::Config;
pub use error::{ErrorKind, LibraryError, Result};
pub use library::{Library, LibraryState};
pub use models::{DatabaseStats, JsonRecord, NewSong, Playlist, PlaylistSong, Song, Subtitle};
pub use storage::{Database, SCHEMA_VERSION};
