//! Playlist membership repository

use rusqlite::{params, Connection, Row};

use crate::error::{LibraryError, Result};
use crate::models::{PlaylistSong, Song};
use crate::repository::song::song_from_row;

fn membership_from_row(row: &Row) -> rusqlite::Result<PlaylistSong> {
    Ok(PlaylistSong {
        song_id: row.get(0)?,
        playlist_id: row.get(1)?,
        track_number: row.get(2)?,
    })
}

/// Data access for the `playlist_song` junction table
pub struct PlaylistSongRepository<'c> {
    conn: &'c Connection,
}

impl<'c> PlaylistSongRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Check if a song is already in a playlist
    pub fn contains(&self, song_id: i64, playlist_id: i64) -> Result<bool> {
        Ok(self
            .conn
            .prepare("SELECT 1 FROM playlist_song WHERE song_id = ?1 AND playlist_id = ?2")?
            .exists(params![song_id, playlist_id])?)
    }

    /// Append a song to the end of a playlist
    ///
    /// Fails with a conflict if the pair already exists.
    pub fn add(&self, song_id: i64, playlist_id: i64) -> Result<PlaylistSong> {
        if self.contains(song_id, playlist_id)? {
            return Err(LibraryError::Conflict(format!(
                "Song {} is already in playlist {}",
                song_id, playlist_id
            )));
        }

        self.conn.execute(
            r#"
            INSERT INTO playlist_song (song_id, playlist_id, track_number)
            SELECT ?1, ?2, COALESCE(MAX(track_number), 0) + 1
            FROM playlist_song WHERE playlist_id = ?2
            "#,
            params![song_id, playlist_id],
        )?;

        let track_number = self.conn.query_row(
            "SELECT track_number FROM playlist_song WHERE song_id = ?1 AND playlist_id = ?2",
            params![song_id, playlist_id],
            |row| row.get(0),
        )?;

        Ok(PlaylistSong {
            song_id,
            playlist_id,
            track_number,
        })
    }

    pub fn remove(&self, song_id: i64, playlist_id: i64) -> Result<()> {
        let deleted = self.conn.execute(
            "DELETE FROM playlist_song WHERE song_id = ?1 AND playlist_id = ?2",
            params![song_id, playlist_id],
        )?;

        if deleted == 0 {
            return Err(LibraryError::not_found(
                "Playlist entry",
                format!("song {} in playlist {}", song_id, playlist_id),
            ));
        }
        Ok(())
    }

    /// Songs of a playlist in track order
    pub fn songs_in_playlist(&self, playlist_id: i64) -> Result<Vec<Song>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT s.id, s.title, s.artist, s.album, s.length, s.path
            FROM song s
            JOIN playlist_song ps ON ps.song_id = s.id
            WHERE ps.playlist_id = ?1
            ORDER BY ps.track_number, s.id
            "#,
        )?;

        let songs = stmt
            .query_map(params![playlist_id], song_from_row)?
            .collect::<rusqlite::Result<Vec<Song>>>()?;
        Ok(songs)
    }

    pub fn list_all(&self) -> Result<Vec<PlaylistSong>> {
        let mut stmt = self.conn.prepare(
            "SELECT song_id, playlist_id, track_number FROM playlist_song ORDER BY playlist_id, track_number",
        )?;

        let rows = stmt
            .query_map([], membership_from_row)?
            .collect::<rusqlite::Result<Vec<PlaylistSong>>>()?;
        Ok(rows)
    }

    pub fn count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM playlist_song", [], |row| row.get(0))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::NewSong;
    use crate::repository::{test_connection, PlaylistRepository, SongRepository};

    fn setup(conn: &Connection) -> (i64, i64, i64) {
        let songs = SongRepository::new(conn);
        let a = songs.insert(&NewSong::new("A", 100, "a.mp3")).unwrap().id;
        let b = songs.insert(&NewSong::new("B", 200, "b.mp3")).unwrap().id;
        let p = PlaylistRepository::new(conn).insert("P").unwrap().id;
        (a, b, p)
    }

    #[test]
    fn test_add_assigns_track_numbers() {
        let conn = test_connection();
        let repo = PlaylistSongRepository::new(&conn);
        let (a, b, p) = setup(&conn);

        assert_eq!(repo.add(b, p).unwrap().track_number, Some(1));
        assert_eq!(repo.add(a, p).unwrap().track_number, Some(2));

        let titles: Vec<String> = repo
            .songs_in_playlist(p)
            .unwrap()
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["B", "A"]);
    }

    #[test]
    fn test_duplicate_is_conflict() {
        let conn = test_connection();
        let repo = PlaylistSongRepository::new(&conn);
        let (a, _, p) = setup(&conn);

        repo.add(a, p).unwrap();
        assert_eq!(repo.add(a, p).unwrap_err().kind(), ErrorKind::Conflict);
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_add_with_missing_parent_is_not_found() {
        let conn = test_connection();
        let repo = PlaylistSongRepository::new(&conn);
        let (a, _, p) = setup(&conn);

        assert_eq!(repo.add(a, 77).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(repo.add(77, p).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_remove() {
        let conn = test_connection();
        let repo = PlaylistSongRepository::new(&conn);
        let (a, _, p) = setup(&conn);

        repo.add(a, p).unwrap();
        repo.remove(a, p).unwrap();
        assert!(!repo.contains(a, p).unwrap());
        assert_eq!(repo.remove(a, p).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_cascades_from_both_parents() {
        let conn = test_connection();
        let repo = PlaylistSongRepository::new(&conn);
        let (a, b, p) = setup(&conn);
        repo.add(a, p).unwrap();
        repo.add(b, p).unwrap();

        SongRepository::new(&conn).delete(a).unwrap();
        assert_eq!(repo.songs_in_playlist(p).unwrap().len(), 1);

        PlaylistRepository::new(&conn).delete(p).unwrap();
        assert!(repo.list_all().unwrap().is_empty());
    }
}
