//! Library facade
//!
//! `Library` is the single entry point for callers. It owns the
//! initialization lifecycle, validates input before touching the
//! database, and remembers the message of the most recent failure.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized --initialize()--> Initialized --shutdown()--> Shutdown
//!                                      ^                          |
//!                                      +-------initialize()-------+
//! ```
//!
//! Every data operation fails with `NotInitialized` outside the
//! Initialized state. `reset` is the exception: it works in any state so
//! that a database whose schema cannot be migrated can still be wiped.
//!
//! ## Usage
//!
//! ```ignore
//! let mut library = Library::open()?;
//! library.initialize()?;
//!
//! let song = library.add_song(&NewSong::new("Song A", 200, "a.mp3"))?;
//! let playlist = library.create_playlist("Road Trip")?;
//! library.add_song_to_playlist(song.id, playlist.id)?;
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{LibraryError, Result};
use crate::models::{DatabaseStats, NewSong, Playlist, PlaylistSong, Song, Subtitle};
use crate::repository::{
    database_stats, PlaylistRepository, PlaylistSongRepository, SongRepository,
    SubtitleRepository,
};
use crate::storage::{self, Database};
use crate::validation::{
    validate_id, validate_length, validate_optional_text, validate_path, validate_text,
    validate_title, MAX_TEXT_LEN,
};

/// Lifecycle state of a [`Library`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryState {
    Uninitialized,
    Initialized,
    Shutdown,
}

/// Facade over the media library database
pub struct Library {
    database: Database,
    state: LibraryState,
    last_error: Option<String>,
}

impl Library {
    /// Create a library from the default configuration
    ///
    /// Nothing is opened until [`Library::initialize`] is called.
    pub fn open() -> anyhow::Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Ok(Self::from_config(&config))
    }

    /// Create a library for the database described by `config`
    pub fn from_config(config: &Config) -> Self {
        Self::with_database(Database::from_config(config))
    }

    /// Create a library for a database file at `path`
    pub fn with_database_path(path: impl Into<PathBuf>) -> Self {
        Self::with_database(Database::new(path))
    }

    pub fn with_database(database: Database) -> Self {
        Self {
            database,
            state: LibraryState::Uninitialized,
            last_error: None,
        }
    }

    pub fn database_path(&self) -> &Path {
        self.database.path()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn state(&self) -> LibraryState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state == LibraryState::Initialized
    }

    /// Create the data directory and bring the schema up to date
    ///
    /// Calling this on an initialized library is a no-op. On failure the
    /// library is left Uninitialized and the error is kept as the last error.
    pub fn initialize(&mut self) -> Result<()> {
        if self.is_initialized() {
            debug!("Library already initialized");
            return Ok(());
        }

        self.last_error = None;
        match self.prepare_database() {
            Ok(applied) => {
                self.state = LibraryState::Initialized;
                info!(
                    "Library initialized at {:?} ({} migrations applied)",
                    self.database.path(),
                    applied
                );
                Ok(())
            }
            Err(e) => {
                warn!("Library initialization failed: {}", e);
                self.state = LibraryState::Uninitialized;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn prepare_database(&self) -> Result<usize> {
        self.database.ensure_parent_dir()?;
        let mut conn = self.database.connect()?;
        storage::ensure_schema(&mut conn)
    }

    /// Stop serving operations and forget the last error
    pub fn shutdown(&mut self) {
        if self.state == LibraryState::Initialized {
            info!("Library shut down");
        }
        self.state = LibraryState::Shutdown;
        self.last_error = None;
    }

    /// Message of the most recent failed operation
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_last_error(&mut self) {
        self.last_error = None;
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(LibraryError::NotInitialized)
        }
    }

    /// Run one operation: check state, reset and record the last error
    fn run<T>(&mut self, op: impl FnOnce(&Database) -> Result<T>) -> Result<T> {
        self.last_error = None;
        let result = self.ensure_initialized().and_then(|()| op(&self.database));

        if let Err(e) = &result {
            debug!("Operation failed: {}", e);
            self.last_error = Some(e.to_string());
        }
        result
    }

    /// Apply `op` to each item independently, keeping the successes
    ///
    /// Failed items are skipped. The error of the last failed item becomes
    /// the last error; the outer `Result` only fails when the library is
    /// not initialized.
    fn run_batch<I, T>(
        &mut self,
        items: impl IntoIterator<Item = I>,
        mut op: impl FnMut(&Database, I) -> Result<T>,
    ) -> Result<Vec<T>> {
        self.last_error = None;
        if let Err(e) = self.ensure_initialized() {
            self.last_error = Some(e.to_string());
            return Err(e);
        }

        let mut succeeded = Vec::new();
        let mut last_failure = None;
        for (index, item) in items.into_iter().enumerate() {
            match op(&self.database, item) {
                Ok(value) => succeeded.push(value),
                Err(e) => {
                    warn!("Skipping batch item {}: {}", index, e);
                    last_failure = Some(e.to_string());
                }
            }
        }

        self.last_error = last_failure;
        Ok(succeeded)
    }

    // ==================== Song Operations ====================

    /// Add a song and return it with its new id
    pub fn add_song(&mut self, song: &NewSong) -> Result<Song> {
        self.run(|db| insert_song(db, song))
    }

    /// Add each song independently, returning the ones that were stored
    pub fn add_multiple_songs(&mut self, songs: &[NewSong]) -> Result<Vec<Song>> {
        self.run_batch(songs, insert_song)
    }

    /// Change a song's title, artist and album
    pub fn update_song(
        &mut self,
        id: i64,
        title: &str,
        artist: Option<&str>,
        album: &str,
    ) -> Result<Song> {
        self.run(|db| {
            validate_id("song id", id)?;
            validate_title(title)?;
            validate_optional_text("artist", artist)?;
            validate_optional_text("album", Some(album))?;

            let conn = db.connect()?;
            let song = SongRepository::new(&conn).update(id, title, non_empty(artist), album)?;
            debug!("Updated song {}", id);
            Ok(song)
        })
    }

    /// Delete a song together with its subtitles and memberships
    pub fn delete_song(&mut self, id: i64) -> Result<()> {
        self.run(|db| {
            validate_id("song id", id)?;
            let conn = db.connect()?;
            SongRepository::new(&conn).delete(id)?;
            info!("Deleted song {}", id);
            Ok(())
        })
    }

    pub fn get_song(&mut self, id: i64) -> Result<Song> {
        self.run(|db| {
            validate_id("song id", id)?;
            let conn = db.connect()?;
            SongRepository::new(&conn).get_by_id(id)
        })
    }

    pub fn get_all_songs(&mut self) -> Result<Vec<Song>> {
        self.run(|db| {
            let conn = db.connect()?;
            SongRepository::new(&conn).list_all()
        })
    }

    /// Songs whose title or artist contains `query`, ignoring case
    ///
    /// An empty query matches every song.
    pub fn search_songs(&mut self, query: &str) -> Result<Vec<Song>> {
        self.run(|db| {
            let conn = db.connect()?;
            let songs = SongRepository::new(&conn).list_all()?;
            let needle = query.to_lowercase();

            Ok(songs
                .into_iter()
                .filter(|song| song_matches(song, &needle))
                .collect())
        })
    }

    // ==================== Playlist Operations ====================

    /// Create an empty playlist
    pub fn create_playlist(&mut self, title: &str) -> Result<Playlist> {
        self.run(|db| {
            validate_title(title)?;
            let conn = db.connect()?;
            let playlist = PlaylistRepository::new(&conn).insert(title)?;
            info!("Created playlist {} ({})", playlist.id, playlist.title);
            Ok(playlist)
        })
    }

    /// Rename a playlist
    pub fn update_playlist(&mut self, id: i64, title: &str) -> Result<Playlist> {
        self.run(|db| {
            validate_id("playlist id", id)?;
            validate_title(title)?;
            let conn = db.connect()?;
            PlaylistRepository::new(&conn).update_title(id, title)
        })
    }

    /// Delete a playlist and its memberships; the songs stay
    pub fn delete_playlist(&mut self, id: i64) -> Result<()> {
        self.run(|db| {
            validate_id("playlist id", id)?;
            let conn = db.connect()?;
            PlaylistRepository::new(&conn).delete(id)?;
            info!("Deleted playlist {}", id);
            Ok(())
        })
    }

    pub fn get_playlist(&mut self, id: i64) -> Result<Playlist> {
        self.run(|db| {
            validate_id("playlist id", id)?;
            let conn = db.connect()?;
            PlaylistRepository::new(&conn).get_by_id(id)
        })
    }

    pub fn get_all_playlists(&mut self) -> Result<Vec<Playlist>> {
        self.run(|db| {
            let conn = db.connect()?;
            PlaylistRepository::new(&conn).list_all()
        })
    }

    /// Refresh a playlist's cached song count and total length
    ///
    /// Membership changes never touch these fields on their own.
    pub fn recompute_playlist_totals(&mut self, id: i64) -> Result<Playlist> {
        self.run(|db| {
            validate_id("playlist id", id)?;
            let mut conn = db.connect()?;
            let tx = write_transaction(&mut conn)?;
            let playlist = PlaylistRepository::new(&tx).recompute_totals(id)?;
            tx.commit()?;
            Ok(playlist)
        })
    }

    // ==================== Membership Operations ====================

    /// Append a song to a playlist
    ///
    /// Fails with `NotFound` if either side is missing and with `Conflict`
    /// if the song is already in the playlist.
    pub fn add_song_to_playlist(&mut self, song_id: i64, playlist_id: i64) -> Result<PlaylistSong> {
        self.run(|db| insert_membership(db, song_id, playlist_id))
    }

    /// Add several songs to one playlist, skipping the ones that fail
    pub fn add_multiple_songs_to_playlist(
        &mut self,
        song_ids: &[i64],
        playlist_id: i64,
    ) -> Result<Vec<PlaylistSong>> {
        self.run_batch(song_ids.iter().copied(), |db, song_id| {
            insert_membership(db, song_id, playlist_id)
        })
    }

    pub fn remove_song_from_playlist(&mut self, song_id: i64, playlist_id: i64) -> Result<()> {
        self.run(|db| {
            validate_id("song id", song_id)?;
            validate_id("playlist id", playlist_id)?;
            let conn = db.connect()?;
            PlaylistSongRepository::new(&conn).remove(song_id, playlist_id)?;
            debug!("Removed song {} from playlist {}", song_id, playlist_id);
            Ok(())
        })
    }

    /// Songs of a playlist in track order
    pub fn get_songs_in_playlist(&mut self, playlist_id: i64) -> Result<Vec<Song>> {
        self.run(|db| {
            validate_id("playlist id", playlist_id)?;
            let conn = db.connect()?;
            if !PlaylistRepository::new(&conn).exists(playlist_id)? {
                return Err(LibraryError::not_found("Playlist", playlist_id));
            }
            PlaylistSongRepository::new(&conn).songs_in_playlist(playlist_id)
        })
    }

    // ==================== Subtitle Operations ====================

    /// Attach a subtitle to a song
    pub fn add_subtitles(
        &mut self,
        song_id: i64,
        language: &str,
        path: Option<&str>,
    ) -> Result<Subtitle> {
        self.run(|db| {
            validate_id("song id", song_id)?;
            validate_text("language", language, MAX_TEXT_LEN)?;
            let path = non_empty(path);
            if let Some(path) = path {
                validate_path(path)?;
            }

            let mut conn = db.connect()?;
            let tx = write_transaction(&mut conn)?;
            if !SongRepository::new(&tx).exists(song_id)? {
                return Err(LibraryError::not_found("Song", song_id));
            }
            let subtitle = SubtitleRepository::new(&tx).insert(song_id, language, path)?;
            tx.commit()?;

            debug!(
                "Added subtitle {}/{} ({})",
                subtitle.song_id, subtitle.sub_id, subtitle.language
            );
            Ok(subtitle)
        })
    }

    pub fn delete_subtitles(&mut self, song_id: i64, sub_id: i64) -> Result<()> {
        self.run(|db| {
            validate_id("song id", song_id)?;
            validate_id("subtitle id", sub_id)?;
            let conn = db.connect()?;
            SubtitleRepository::new(&conn).delete(song_id, sub_id)
        })
    }

    pub fn get_subtitles_for_song(&mut self, song_id: i64) -> Result<Vec<Subtitle>> {
        self.run(|db| {
            validate_id("song id", song_id)?;
            let conn = db.connect()?;
            if !SongRepository::new(&conn).exists(song_id)? {
                return Err(LibraryError::not_found("Song", song_id));
            }
            SubtitleRepository::new(&conn).for_song(song_id)
        })
    }

    // ==================== Maintenance ====================

    /// Row counts of all four tables
    pub fn get_database_stats(&mut self) -> Result<DatabaseStats> {
        self.run(|db| {
            let conn = db.connect()?;
            database_stats(&conn)
        })
    }

    /// Highest applied schema migration
    pub fn schema_version(&mut self) -> Result<i64> {
        self.run(|db| {
            let conn = db.connect()?;
            storage::current_version(&conn)
        })
    }

    /// Drop every table and recreate an empty schema
    ///
    /// Allowed in any lifecycle state and does not change it. The drop and
    /// the rebuild share one transaction, so on failure the database is
    /// left untouched.
    pub fn reset(&mut self) -> Result<()> {
        self.last_error = None;
        match self.rebuild_database() {
            Ok(()) => {
                warn!("Library reset, all data removed");
                Ok(())
            }
            Err(e) => {
                warn!("Library reset failed: {}", e);
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn rebuild_database(&self) -> Result<()> {
        self.database.ensure_parent_dir()?;
        let mut conn = self.database.connect()?;
        storage::reset_schema(&mut conn)?;
        Ok(())
    }
}

fn write_transaction(conn: &mut Connection) -> Result<Transaction<'_>> {
    Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}

/// Treat an empty optional string as absent
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

fn song_matches(song: &Song, needle: &str) -> bool {
    song.title.to_lowercase().contains(needle)
        || song
            .artist
            .as_deref()
            .is_some_and(|artist| artist.to_lowercase().contains(needle))
}

fn validate_new_song(song: &NewSong) -> Result<()> {
    validate_title(&song.title)?;
    validate_optional_text("artist", song.artist.as_deref())?;
    validate_optional_text("album", Some(song.album.as_str()))?;
    validate_length(song.length)?;
    validate_path(&song.path)
}

fn insert_song(db: &Database, song: &NewSong) -> Result<Song> {
    validate_new_song(song)?;

    let normalized = NewSong {
        artist: non_empty(song.artist.as_deref()).map(str::to_string),
        ..song.clone()
    };

    let conn = db.connect()?;
    let song = SongRepository::new(&conn).insert(&normalized)?;
    debug!("Added song {} ({})", song.id, song.title);
    Ok(song)
}

fn insert_membership(db: &Database, song_id: i64, playlist_id: i64) -> Result<PlaylistSong> {
    validate_id("song id", song_id)?;
    validate_id("playlist id", playlist_id)?;

    let mut conn = db.connect()?;
    let tx = write_transaction(&mut conn)?;
    if !SongRepository::new(&tx).exists(song_id)? {
        return Err(LibraryError::not_found("Song", song_id));
    }
    if !PlaylistRepository::new(&tx).exists(playlist_id)? {
        return Err(LibraryError::not_found("Playlist", playlist_id));
    }
    let membership = PlaylistSongRepository::new(&tx).add(song_id, playlist_id)?;
    tx.commit()?;

    debug!("Added song {} to playlist {}", song_id, playlist_id);
    Ok(membership)
}
