//! Data models for medialib
//!
//! Plain records returned by the repositories and the `Library` facade.
//! Serialized field names are part of the public interface consumed by
//! the UI shell, so they are pinned with serde attributes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A song in the library
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Song {
    /// Row id, assigned on insert
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub album: String,
    /// Length in seconds
    pub length: i64,
    /// Path to the media file
    pub path: String,
}

/// Input for adding a song
///
/// Same shape as [`Song`] without the id; used by batch imports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewSong {
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub album: String,
    pub length: i64,
    pub path: String,
}

impl NewSong {
    pub fn new(title: impl Into<String>, length: i64, path: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: None,
            album: String::new(),
            length,
            path: path.into(),
        }
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = album.into();
        self
    }
}

/// A playlist
///
/// `length` and `num_songs` are cached totals. They are not updated when
/// membership changes; see `Library::recompute_playlist_totals`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Playlist {
    pub id: i64,
    pub title: String,
    /// Total length in seconds
    #[serde(default)]
    pub length: i64,
    #[serde(rename = "numSongs", default)]
    pub num_songs: i64,
}

/// A subtitle attached to a song
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subtitle {
    #[serde(rename = "songId")]
    pub song_id: i64,
    /// Per-song subtitle number, starting at 1
    #[serde(rename = "subId")]
    pub sub_id: i64,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// A playlist membership row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaylistSong {
    #[serde(rename = "songId")]
    pub song_id: i64,
    #[serde(rename = "playlistId")]
    pub playlist_id: i64,
    #[serde(rename = "trackNumber", default)]
    pub track_number: Option<i64>,
}

/// Row counts of all four tables
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStats {
    pub total_songs: i64,
    pub total_playlists: i64,
    pub total_subtitles: i64,
    pub total_playlist_songs: i64,
}

/// JSON encoding for records exchanged with the UI shell
pub trait JsonRecord: Serialize + DeserializeOwned {
    fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl JsonRecord for Song {}
impl JsonRecord for NewSong {}
impl JsonRecord for Playlist {}
impl JsonRecord for Subtitle {}
impl JsonRecord for PlaylistSong {}
impl JsonRecord for DatabaseStats {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::{json, Value};

    #[test]
    fn test_song_field_names() {
        let song = Song {
            id: 1,
            title: "Song A".to_string(),
            artist: Some("Artist A".to_string()),
            album: String::new(),
            length: 200,
            path: "a.mp3".to_string(),
        };

        let value: Value = serde_json::from_str(&song.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 1,
                "title": "Song A",
                "artist": "Artist A",
                "album": "",
                "length": 200,
                "path": "a.mp3"
            })
        );
    }

    #[test]
    fn test_playlist_uses_num_songs_key() {
        let playlist = Playlist {
            id: 3,
            title: "Road Trip".to_string(),
            length: 0,
            num_songs: 0,
        };

        let value: Value = serde_json::to_value(&playlist).unwrap();
        assert_eq!(value["numSongs"], 0);
        assert!(value.get("num_songs").is_none());
    }

    #[test]
    fn test_subtitle_field_names() {
        let subtitle = Subtitle {
            song_id: 4,
            sub_id: 2,
            language: "en".to_string(),
            path: None,
        };

        let value: Value = serde_json::to_value(&subtitle).unwrap();
        assert_eq!(value, json!({"songId": 4, "subId": 2, "language": "en"}));

        let with_path = Subtitle {
            path: Some("subs/a.srt".to_string()),
            ..subtitle
        };
        let value: Value = serde_json::to_value(&with_path).unwrap();
        assert_eq!(value["path"], "subs/a.srt");
    }

    #[test]
    fn test_stats_field_names() {
        let stats = DatabaseStats {
            total_songs: 1,
            total_playlists: 2,
            total_subtitles: 3,
            total_playlist_songs: 4,
        };

        let value: Value = serde_json::to_value(stats).unwrap();
        assert_eq!(
            value,
            json!({
                "totalSongs": 1,
                "totalPlaylists": 2,
                "totalSubtitles": 3,
                "totalPlaylistSongs": 4
            })
        );
    }

    #[test]
    fn test_new_song_from_json_defaults() {
        let song = NewSong::from_json(r#"{"title":"X","length":10,"path":"x.ogg"}"#).unwrap();
        assert_eq!(song, NewSong::new("X", 10, "x.ogg"));
    }

    #[test]
    fn test_from_json_rejects_malformed_input() {
        let err = Song::from_json(r#"{"id":"one"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_new_song_builder() {
        let song = NewSong::new("Title", 120, "t.flac")
            .with_artist("Someone")
            .with_album("Record");

        assert_eq!(song.artist.as_deref(), Some("Someone"));
        assert_eq!(song.album, "Record");
    }
}
