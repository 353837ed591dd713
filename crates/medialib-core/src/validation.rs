//! Input validation
//!
//! Pure checks applied before any statement is prepared. Nothing in here
//! touches the database.

use std::fmt;
use std::path::Path;

use crate::error::{LibraryError, Result};

/// Default maximum length of titles, artists, albums and languages
pub const MAX_TEXT_LEN: usize = 255;

/// Maximum length of a media or subtitle path
pub const MAX_PATH_LEN: usize = 1000;

/// Maximum song length in seconds (24 hours)
pub const MAX_SONG_LENGTH: i64 = 86_400;

/// File extensions accepted for songs and subtitles
pub const ALLOWED_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "m4a", "ogg", "srt", "vtt"];

/// Tables that may appear in dynamically built SQL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Song,
    Subtitle,
    Playlist,
    PlaylistSong,
}

impl Table {
    pub const ALL: [Table; 4] = [
        Table::Song,
        Table::Playlist,
        Table::Subtitle,
        Table::PlaylistSong,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Song => "song",
            Table::Subtitle => "subtitle",
            Table::Playlist => "playlist",
            Table::PlaylistSong => "playlist_song",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validate a required text field
///
/// Rejects empty strings, strings longer than `max_len` characters and
/// control characters other than tab, newline and carriage return.
pub fn validate_text(field: &'static str, value: &str, max_len: usize) -> Result<()> {
    if value.is_empty() {
        return Err(LibraryError::validation(field, "must not be empty"));
    }
    if value.chars().count() > max_len {
        return Err(LibraryError::validation(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }
    if value
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\t' | '\n' | '\r'))
    {
        return Err(LibraryError::validation(
            field,
            "must not contain control characters",
        ));
    }
    Ok(())
}

/// Validate a title with the default length limit
pub fn validate_title(value: &str) -> Result<()> {
    validate_text("title", value, MAX_TEXT_LEN)
}

/// Validate an optional text field; absent or empty values pass
pub fn validate_optional_text(field: &'static str, value: Option<&str>) -> Result<()> {
    match value {
        Some(v) if !v.is_empty() => validate_text(field, v, MAX_TEXT_LEN),
        _ => Ok(()),
    }
}

/// Validate a media or subtitle file path
pub fn validate_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(LibraryError::validation("path", "must not be empty"));
    }
    if path.chars().count() > MAX_PATH_LEN {
        return Err(LibraryError::validation(
            "path",
            format!("must be at most {} characters", MAX_PATH_LEN),
        ));
    }
    if path.contains("..") || path.contains("//") {
        return Err(LibraryError::validation(
            "path",
            "must not contain '..' or '//'",
        ));
    }

    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        Some(ext) => Err(LibraryError::validation(
            "path",
            format!(
                "unsupported extension '{}' (expected one of: {})",
                ext,
                ALLOWED_EXTENSIONS.join(", ")
            ),
        )),
        None => Err(LibraryError::validation("path", "missing file extension")),
    }
}

/// Validate a song length in seconds
pub fn validate_length(seconds: i64) -> Result<()> {
    if seconds <= 0 || seconds > MAX_SONG_LENGTH {
        return Err(LibraryError::validation(
            "length",
            format!("must be between 1 and {} seconds", MAX_SONG_LENGTH),
        ));
    }
    Ok(())
}

/// Validate a row id supplied by a caller
pub fn validate_id(field: &'static str, id: i64) -> Result<()> {
    if id < 1 {
        return Err(LibraryError::validation(field, "must be a positive id"));
    }
    Ok(())
}

/// Check a table name against the allow-list
pub fn validate_table_name(name: &str) -> Result<Table> {
    Table::ALL
        .into_iter()
        .find(|table| table.as_str() == name)
        .ok_or_else(|| LibraryError::validation("table", format!("'{}' is not allowed", name)))
}
