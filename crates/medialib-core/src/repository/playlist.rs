//! Playlist repository

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{LibraryError, Result};
use crate::models::Playlist;

const PLAYLIST_COLUMNS: &str = "id, title, length, num_songs";

fn playlist_from_row(row: &Row) -> rusqlite::Result<Playlist> {
    Ok(Playlist {
        id: row.get(0)?,
        title: row.get(1)?,
        length: row.get(2)?,
        num_songs: row.get(3)?,
    })
}

/// Data access for the `playlist` table
pub struct PlaylistRepository<'c> {
    conn: &'c Connection,
}

impl<'c> PlaylistRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Create an empty playlist; totals start at zero
    pub fn insert(&self, title: &str) -> Result<Playlist> {
        self.conn.execute(
            "INSERT INTO playlist (title, length, num_songs) VALUES (?1, 0, 0)",
            params![title],
        )?;

        Ok(Playlist {
            id: self.conn.last_insert_rowid(),
            title: title.to_string(),
            length: 0,
            num_songs: 0,
        })
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<Playlist>> {
        let playlist = self
            .conn
            .query_row(
                &format!("SELECT {} FROM playlist WHERE id = ?1", PLAYLIST_COLUMNS),
                params![id],
                playlist_from_row,
            )
            .optional()?;
        Ok(playlist)
    }

    pub fn get_by_id(&self, id: i64) -> Result<Playlist> {
        self.find_by_id(id)?
            .ok_or_else(|| LibraryError::not_found("Playlist", id))
    }

    pub fn exists(&self, id: i64) -> Result<bool> {
        Ok(self
            .conn
            .prepare("SELECT 1 FROM playlist WHERE id = ?1")?
            .exists(params![id])?)
    }

    /// Rename a playlist
    pub fn update_title(&self, id: i64, title: &str) -> Result<Playlist> {
        let changed = self.conn.execute(
            "UPDATE playlist SET title = ?1 WHERE id = ?2",
            params![title, id],
        )?;

        if changed == 0 {
            return Err(LibraryError::not_found("Playlist", id));
        }
        self.get_by_id(id)
    }

    /// Delete a playlist; memberships cascade
    pub fn delete(&self, id: i64) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM playlist WHERE id = ?1", params![id])?;

        if deleted == 0 {
            return Err(LibraryError::not_found("Playlist", id));
        }
        Ok(())
    }

    pub fn list_all(&self) -> Result<Vec<Playlist>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM playlist ORDER BY id",
            PLAYLIST_COLUMNS
        ))?;

        let playlists = stmt
            .query_map([], playlist_from_row)?
            .collect::<rusqlite::Result<Vec<Playlist>>>()?;
        Ok(playlists)
    }

    pub fn count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM playlist", [], |row| row.get(0))?)
    }

    /// Refresh the cached `num_songs` and `length` from current membership
    pub fn recompute_totals(&self, id: i64) -> Result<Playlist> {
        let changed = self.conn.execute(
            r#"
            UPDATE playlist SET
                num_songs = (SELECT COUNT(*) FROM playlist_song WHERE playlist_id = ?1),
                length = (
                    SELECT COALESCE(SUM(s.length), 0)
                    FROM playlist_song ps
                    JOIN song s ON s.id = ps.song_id
                    WHERE ps.playlist_id = ?1
                )
            WHERE id = ?1
            "#,
            params![id],
        )?;

        if changed == 0 {
            return Err(LibraryError::not_found("Playlist", id));
        }
        self.get_by_id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::NewSong;
    use crate::repository::{test_connection, PlaylistSongRepository, SongRepository};

    #[test]
    fn test_insert_starts_empty() {
        let conn = test_connection();
        let repo = PlaylistRepository::new(&conn);

        let playlist = repo.insert("Road Trip").unwrap();
        assert_eq!(playlist.id, 1);
        assert_eq!(playlist.num_songs, 0);
        assert_eq!(playlist.length, 0);
        assert_eq!(repo.get_by_id(1).unwrap(), playlist);
    }

    #[test]
    fn test_update_title() {
        let conn = test_connection();
        let repo = PlaylistRepository::new(&conn);
        let playlist = repo.insert("Old").unwrap();

        let renamed = repo.update_title(playlist.id, "New").unwrap();
        assert_eq!(renamed.title, "New");
        assert_eq!(
            repo.update_title(99, "x").unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_delete() {
        let conn = test_connection();
        let repo = PlaylistRepository::new(&conn);
        let playlist = repo.insert("Temp").unwrap();

        repo.delete(playlist.id).unwrap();
        assert!(repo.find_by_id(playlist.id).unwrap().is_none());
        assert_eq!(
            repo.delete(playlist.id).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_list_all() {
        let conn = test_connection();
        let repo = PlaylistRepository::new(&conn);
        assert!(repo.list_all().unwrap().is_empty());

        repo.insert("A").unwrap();
        repo.insert("B").unwrap();
        assert_eq!(repo.list_all().unwrap().len(), 2);
        assert_eq!(repo.count().unwrap(), 2);
    }

    #[test]
    fn test_totals_are_not_maintained_until_recomputed() {
        let conn = test_connection();
        let songs = SongRepository::new(&conn);
        let playlists = PlaylistRepository::new(&conn);
        let members = PlaylistSongRepository::new(&conn);

        let a = songs.insert(&NewSong::new("A", 100, "a.mp3")).unwrap();
        let b = songs.insert(&NewSong::new("B", 50, "b.mp3")).unwrap();
        let playlist = playlists.insert("Mix").unwrap();
        members.add(a.id, playlist.id).unwrap();
        members.add(b.id, playlist.id).unwrap();

        let stale = playlists.get_by_id(playlist.id).unwrap();
        assert_eq!((stale.num_songs, stale.length), (0, 0));

        let fresh = playlists.recompute_totals(playlist.id).unwrap();
        assert_eq!((fresh.num_songs, fresh.length), (2, 150));
    }

    #[test]
    fn test_recompute_totals_missing_playlist() {
        let conn = test_connection();
        let repo = PlaylistRepository::new(&conn);

        assert_eq!(
            repo.recompute_totals(5).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}
