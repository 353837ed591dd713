//! Subtitle repository

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{LibraryError, Result};
use crate::models::Subtitle;

const SUBTITLE_COLUMNS: &str = "song_id, sub_id, language, path";

fn subtitle_from_row(row: &Row) -> rusqlite::Result<Subtitle> {
    Ok(Subtitle {
        song_id: row.get(0)?,
        sub_id: row.get(1)?,
        language: row.get(2)?,
        path: row.get(3)?,
    })
}

/// Data access for the `subtitle` table
pub struct SubtitleRepository<'c> {
    conn: &'c Connection,
}

impl<'c> SubtitleRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Attach a subtitle to a song
    ///
    /// `sub_id` is one more than the song's current highest, computed in
    /// the same statement as the insert.
    pub fn insert(&self, song_id: i64, language: &str, path: Option<&str>) -> Result<Subtitle> {
        self.conn.execute(
            r#"
            INSERT INTO subtitle (song_id, sub_id, language, path)
            SELECT ?1, COALESCE(MAX(sub_id), 0) + 1, ?2, ?3
            FROM subtitle WHERE song_id = ?1
            "#,
            params![song_id, language, path],
        )?;

        let sub_id = self.conn.query_row(
            "SELECT sub_id FROM subtitle WHERE rowid = ?1",
            params![self.conn.last_insert_rowid()],
            |row| row.get(0),
        )?;

        Ok(Subtitle {
            song_id,
            sub_id,
            language: language.to_string(),
            path: path.map(str::to_string),
        })
    }

    pub fn find(&self, song_id: i64, sub_id: i64) -> Result<Option<Subtitle>> {
        let subtitle = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM subtitle WHERE song_id = ?1 AND sub_id = ?2",
                    SUBTITLE_COLUMNS
                ),
                params![song_id, sub_id],
                subtitle_from_row,
            )
            .optional()?;
        Ok(subtitle)
    }

    pub fn get(&self, song_id: i64, sub_id: i64) -> Result<Subtitle> {
        self.find(song_id, sub_id)?.ok_or_else(|| {
            LibraryError::not_found("Subtitle", format!("{}/{}", song_id, sub_id))
        })
    }

    pub fn delete(&self, song_id: i64, sub_id: i64) -> Result<()> {
        let deleted = self.conn.execute(
            "DELETE FROM subtitle WHERE song_id = ?1 AND sub_id = ?2",
            params![song_id, sub_id],
        )?;

        if deleted == 0 {
            return Err(LibraryError::not_found(
                "Subtitle",
                format!("{}/{}", song_id, sub_id),
            ));
        }
        Ok(())
    }

    /// Subtitles of one song, ordered by sub_id
    pub fn for_song(&self, song_id: i64) -> Result<Vec<Subtitle>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM subtitle WHERE song_id = ?1 ORDER BY sub_id",
            SUBTITLE_COLUMNS
        ))?;

        let subtitles = stmt
            .query_map(params![song_id], subtitle_from_row)?
            .collect::<rusqlite::Result<Vec<Subtitle>>>()?;
        Ok(subtitles)
    }

    pub fn list_all(&self) -> Result<Vec<Subtitle>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM subtitle ORDER BY song_id, sub_id",
            SUBTITLE_COLUMNS
        ))?;

        let subtitles = stmt
            .query_map([], subtitle_from_row)?
            .collect::<rusqlite::Result<Vec<Subtitle>>>()?;
        Ok(subtitles)
    }

    pub fn count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM subtitle", [], |row| row.get(0))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::NewSong;
    use crate::repository::{test_connection, SongRepository};

    fn song(conn: &Connection, title: &str) -> i64 {
        SongRepository::new(conn)
            .insert(&NewSong::new(title, 60, "s.mp3"))
            .unwrap()
            .id
    }

    #[test]
    fn test_sub_ids_are_per_song() {
        let conn = test_connection();
        let repo = SubtitleRepository::new(&conn);
        let a = song(&conn, "A");
        let b = song(&conn, "B");

        assert_eq!(repo.insert(a, "en", None).unwrap().sub_id, 1);
        assert_eq!(repo.insert(a, "fr", Some("a.fr.srt")).unwrap().sub_id, 2);
        assert_eq!(repo.insert(b, "en", None).unwrap().sub_id, 1);

        let for_a = repo.for_song(a).unwrap();
        assert_eq!(for_a.len(), 2);
        assert_eq!(for_a[1].language, "fr");
        assert_eq!(for_a[1].path.as_deref(), Some("a.fr.srt"));
    }

    #[test]
    fn test_sub_id_after_delete_continues_from_max() {
        let conn = test_connection();
        let repo = SubtitleRepository::new(&conn);
        let a = song(&conn, "A");

        repo.insert(a, "en", None).unwrap();
        repo.insert(a, "de", None).unwrap();
        repo.delete(a, 1).unwrap();

        assert_eq!(repo.insert(a, "es", None).unwrap().sub_id, 3);
    }

    #[test]
    fn test_insert_for_missing_song_is_not_found() {
        let conn = test_connection();
        let repo = SubtitleRepository::new(&conn);

        let err = repo.insert(999, "en", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let conn = test_connection();
        let repo = SubtitleRepository::new(&conn);
        let a = song(&conn, "A");

        assert_eq!(repo.delete(a, 1).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_cascade_on_song_delete() {
        let conn = test_connection();
        let repo = SubtitleRepository::new(&conn);
        let a = song(&conn, "A");
        repo.insert(a, "en", None).unwrap();

        SongRepository::new(&conn).delete(a).unwrap();
        assert!(repo.for_song(a).unwrap().is_empty());
        assert!(repo.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_get() {
        let conn = test_connection();
        let repo = SubtitleRepository::new(&conn);
        let a = song(&conn, "A");
        let inserted = repo.insert(a, "en", Some("a.vtt")).unwrap();

        assert_eq!(repo.get(a, 1).unwrap(), inserted);
        assert_eq!(repo.get(a, 2).unwrap_err().kind(), ErrorKind::NotFound);
    }
}
