//! Repositories
//!
//! One repository per table. Each borrows a connection (or a transaction,
//! which derefs to one) for the duration of a single facade call and
//! issues parameterized statements only.

pub mod playlist;
pub mod playlist_song;
pub mod song;
pub mod subtitle;

pub use playlist::PlaylistRepository;
pub use playlist_song::PlaylistSongRepository;
pub use song::SongRepository;
pub use subtitle::SubtitleRepository;

use rusqlite::Connection;

use crate::error::Result;
use crate::models::DatabaseStats;
use crate::validation::{validate_table_name, Table};

/// Count the rows of an allow-listed table
pub fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    let table = validate_table_name(table)?;
    let count = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })?;
    Ok(count)
}

/// Row counts of all four tables
pub fn database_stats(conn: &Connection) -> Result<DatabaseStats> {
    Ok(DatabaseStats {
        total_songs: count_rows(conn, Table::Song.as_str())?,
        total_playlists: count_rows(conn, Table::Playlist.as_str())?,
        total_subtitles: count_rows(conn, Table::Subtitle.as_str())?,
        total_playlist_songs: count_rows(conn, Table::PlaylistSong.as_str())?,
    })
}

#[cfg(test)]
pub(crate) fn test_connection() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
    crate::storage::ensure_schema(&mut conn).unwrap();
    conn
}
