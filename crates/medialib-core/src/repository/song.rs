//! Song repository

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{LibraryError, Result};
use crate::models::{NewSong, Song};

pub(crate) const SONG_COLUMNS: &str = "id, title, artist, album, length, path";

pub(crate) fn song_from_row(row: &Row) -> rusqlite::Result<Song> {
    Ok(Song {
        id: row.get(0)?,
        title: row.get(1)?,
        artist: row.get(2)?,
        album: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        length: row.get(4)?,
        path: row.get(5)?,
    })
}

/// Data access for the `song` table
pub struct SongRepository<'c> {
    conn: &'c Connection,
}

impl<'c> SongRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Insert a song and return it with its assigned id
    ///
    /// The id comes from SQLite's rowid allocator: one more than the
    /// current maximum, assigned atomically with the insert.
    pub fn insert(&self, song: &NewSong) -> Result<Song> {
        self.conn.execute(
            "INSERT INTO song (title, artist, album, length, path) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![song.title, song.artist, song.album, song.length, song.path],
        )?;

        Ok(Song {
            id: self.conn.last_insert_rowid(),
            title: song.title.clone(),
            artist: song.artist.clone(),
            album: song.album.clone(),
            length: song.length,
            path: song.path.clone(),
        })
    }

    /// Get a song by id, if it exists
    pub fn find_by_id(&self, id: i64) -> Result<Option<Song>> {
        let song = self
            .conn
            .query_row(
                &format!("SELECT {} FROM song WHERE id = ?1", SONG_COLUMNS),
                params![id],
                song_from_row,
            )
            .optional()?;
        Ok(song)
    }

    /// Get a song by id
    pub fn get_by_id(&self, id: i64) -> Result<Song> {
        self.find_by_id(id)?
            .ok_or_else(|| LibraryError::not_found("Song", id))
    }

    pub fn exists(&self, id: i64) -> Result<bool> {
        Ok(self
            .conn
            .prepare("SELECT 1 FROM song WHERE id = ?1")?
            .exists(params![id])?)
    }

    /// Update title, artist and album; length and path never change
    pub fn update(
        &self,
        id: i64,
        title: &str,
        artist: Option<&str>,
        album: &str,
    ) -> Result<Song> {
        let changed = self.conn.execute(
            "UPDATE song SET title = ?1, artist = ?2, album = ?3 WHERE id = ?4",
            params![title, artist, album, id],
        )?;

        if changed == 0 {
            return Err(LibraryError::not_found("Song", id));
        }
        self.get_by_id(id)
    }

    /// Delete a song; subtitles and memberships cascade
    pub fn delete(&self, id: i64) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM song WHERE id = ?1", params![id])?;

        if deleted == 0 {
            return Err(LibraryError::not_found("Song", id));
        }
        Ok(())
    }

    /// All songs ordered by id
    pub fn list_all(&self) -> Result<Vec<Song>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM song ORDER BY id", SONG_COLUMNS))?;

        let songs = stmt
            .query_map([], song_from_row)?
            .collect::<rusqlite::Result<Vec<Song>>>()?;
        Ok(songs)
    }

    pub fn count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM song", [], |row| row.get(0))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::repository::test_connection;

    fn new_song(title: &str) -> NewSong {
        NewSong::new(title, 180, format!("{}.mp3", title.to_lowercase()))
            .with_artist("Artist")
            .with_album("Album")
    }

    #[test]
    fn test_insert_and_get() {
        let conn = test_connection();
        let repo = SongRepository::new(&conn);

        let inserted = repo.insert(&new_song("First")).unwrap();
        assert_eq!(inserted.id, 1);

        let fetched = repo.get_by_id(inserted.id).unwrap();
        assert_eq!(fetched, inserted);
    }

    #[test]
    fn test_ids_are_max_plus_one() {
        let conn = test_connection();
        let repo = SongRepository::new(&conn);

        let a = repo.insert(&new_song("A")).unwrap();
        let b = repo.insert(&new_song("B")).unwrap();
        let c = repo.insert(&new_song("C")).unwrap();
        assert_eq!((a.id, b.id, c.id), (1, 2, 3));

        // Gaps are not filled
        repo.delete(b.id).unwrap();
        let d = repo.insert(&new_song("D")).unwrap();
        assert_eq!(d.id, 4);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let conn = test_connection();
        let repo = SongRepository::new(&conn);

        assert!(repo.find_by_id(9).unwrap().is_none());
        assert_eq!(repo.get_by_id(9).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_update_only_touches_metadata() {
        let conn = test_connection();
        let repo = SongRepository::new(&conn);
        let song = repo.insert(&new_song("Old")).unwrap();

        let updated = repo.update(song.id, "New", None, "Other").unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.artist, None);
        assert_eq!(updated.album, "Other");
        assert_eq!(updated.length, song.length);
        assert_eq!(updated.path, song.path);
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let conn = test_connection();
        let repo = SongRepository::new(&conn);

        let err = repo.update(3, "x", None, "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_delete() {
        let conn = test_connection();
        let repo = SongRepository::new(&conn);
        let song = repo.insert(&new_song("Gone")).unwrap();

        repo.delete(song.id).unwrap();
        assert!(!repo.exists(song.id).unwrap());
        assert_eq!(repo.delete(song.id).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_list_all_empty_and_ordered() {
        let conn = test_connection();
        let repo = SongRepository::new(&conn);
        assert!(repo.list_all().unwrap().is_empty());

        repo.insert(&new_song("One")).unwrap();
        repo.insert(&new_song("Two")).unwrap();

        let titles: Vec<String> = repo.list_all().unwrap().into_iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["One", "Two"]);
        assert_eq!(repo.count().unwrap(), 2);
    }

    #[test]
    fn test_length_check_constraint() {
        let conn = test_connection();
        let repo = SongRepository::new(&conn);

        let err = repo.insert(&NewSong::new("Zero", 0, "z.mp3")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
