//! SQLite schema and migrations
//!
//! Each migration runs in its own transaction together with the row that
//! records it in `schema_version`, so a failed migration leaves the
//! version unchanged.

use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};
use tracing::{debug, info};

use crate::error::{LibraryError, Result};

/// Current schema version for migrations
pub const SCHEMA_VERSION: i64 = 2;

/// A schema migration
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    apply: fn(&Transaction) -> rusqlite::Result<()>,
}

/// All migrations, in ascending version order
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        apply: initial_schema,
    },
    Migration {
        version: 2,
        name: "song_album",
        apply: song_album,
    },
];

fn initial_schema(tx: &Transaction) -> rusqlite::Result<()> {
    tx.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS song (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            artist TEXT,
            length INTEGER NOT NULL CHECK(length > 0 AND length <= 86400),
            path TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS playlist (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            length INTEGER NOT NULL DEFAULT 0 CHECK(length >= 0),
            num_songs INTEGER NOT NULL DEFAULT 0 CHECK(num_songs >= 0),
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS subtitle (
            song_id INTEGER NOT NULL,
            sub_id INTEGER NOT NULL,
            language TEXT NOT NULL,
            path TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (song_id, sub_id),
            FOREIGN KEY (song_id) REFERENCES song(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS playlist_song (
            song_id INTEGER NOT NULL,
            playlist_id INTEGER NOT NULL,
            track_number INTEGER,
            added_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (song_id, playlist_id),
            FOREIGN KEY (song_id) REFERENCES song(id) ON DELETE CASCADE,
            FOREIGN KEY (playlist_id) REFERENCES playlist(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_song_title ON song(title);
        CREATE INDEX IF NOT EXISTS idx_song_artist ON song(artist);
        CREATE INDEX IF NOT EXISTS idx_playlist_title ON playlist(title);
        CREATE INDEX IF NOT EXISTS idx_subtitle_song_id ON subtitle(song_id);
        CREATE INDEX IF NOT EXISTS idx_playlist_song_playlist_id ON playlist_song(playlist_id);
        CREATE INDEX IF NOT EXISTS idx_playlist_song_song_id ON playlist_song(song_id);
        "#,
    )
}

fn song_album(tx: &Transaction) -> rusqlite::Result<()> {
    // Databases written by older builds may already carry the column
    if !column_exists(tx, "song", "album")? {
        tx.execute_batch("ALTER TABLE song ADD COLUMN album TEXT NOT NULL DEFAULT '';")?;
    }
    tx.execute_batch("CREATE INDEX IF NOT EXISTS idx_song_album ON song(album);")
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    conn.prepare("SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2")?
        .exists([table, column])
}

fn create_version_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )
}

/// Make sure every table, index and migration is in place
pub fn ensure_schema(conn: &mut Connection) -> Result<usize> {
    let applied = apply_migrations(conn)?;
    if applied == 0 {
        debug!("Schema is up to date (version {})", SCHEMA_VERSION);
    }
    Ok(applied)
}

/// Get the highest applied migration version, 0 if none
pub fn current_version(conn: &Connection) -> Result<i64> {
    let table_exists = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version'")?
        .exists([])?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i64> = conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i64>>(0)
        })
        .optional()?
        .flatten();

    Ok(version.unwrap_or(0))
}

/// Check if the database is behind the current schema
pub fn needs_migration(conn: &Connection) -> Result<bool> {
    Ok(current_version(conn)? < SCHEMA_VERSION)
}

/// Run pending migrations in ascending order
///
/// Returns how many were applied; re-running after everything is applied
/// is a no-op that returns 0.
pub fn apply_migrations(conn: &mut Connection) -> Result<usize> {
    create_version_table(conn)
        .map_err(|e| LibraryError::schema("Failed to create schema_version table", e))?;

    let current = current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        debug!(
            "Applying migration {} ({})",
            migration.version, migration.name
        );
        run_migration(conn, migration).map_err(|e| {
            LibraryError::schema(
                format!(
                    "Migration {} ({}) failed",
                    migration.version, migration.name
                ),
                e,
            )
        })?;
        info!(
            "Applied migration {} ({})",
            migration.version, migration.name
        );
        applied += 1;
    }

    Ok(applied)
}

fn run_migration(conn: &mut Connection, migration: &Migration) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    apply_in(&tx, migration)?;
    tx.commit()
}

fn apply_in(tx: &Transaction, migration: &Migration) -> rusqlite::Result<()> {
    (migration.apply)(tx)?;
    tx.execute(
        "INSERT INTO schema_version (version, name) VALUES (?1, ?2)",
        rusqlite::params![migration.version, migration.name],
    )?;
    Ok(())
}

/// Names owned by the schema, children before parents
const SCHEMA_OBJECTS: &[&str] = &["playlist_song", "subtitle", "playlist", "song", "schema_version"];

/// Drop every table, including the version table
///
/// A view squatting on one of the table names is dropped too, so a
/// database that fails to migrate can still be wiped.
pub fn drop_schema(conn: &Connection) -> Result<()> {
    drop_objects(conn).map_err(|e| LibraryError::schema("Failed to drop tables", e))
}

fn drop_objects(conn: &Connection) -> rusqlite::Result<()> {
    for &name in SCHEMA_OBJECTS {
        let kind: Option<String> = conn
            .query_row(
                "SELECT type FROM sqlite_master WHERE name = ?1 AND type IN ('table', 'view')",
                [name],
                |row| row.get(0),
            )
            .optional()?;

        match kind.as_deref() {
            Some("view") => conn.execute_batch(&format!("DROP VIEW {};", name))?,
            Some(_) => conn.execute_batch(&format!("DROP TABLE {};", name))?,
            None => {}
        }
    }
    Ok(())
}

/// Drop everything and rebuild the latest schema in one transaction
///
/// Either the database ends up empty at [`SCHEMA_VERSION`] or it is left
/// exactly as it was.
pub fn reset_schema(conn: &mut Connection) -> Result<usize> {
    // Lock contention stays a storage error
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    drop_objects(&tx).map_err(|e| LibraryError::schema("Failed to drop tables", e))?;
    create_version_table(&tx)
        .map_err(|e| LibraryError::schema("Failed to create schema_version table", e))?;

    for migration in MIGRATIONS {
        apply_in(&tx, migration).map_err(|e| {
            LibraryError::schema(
                format!(
                    "Migration {} ({}) failed",
                    migration.version, migration.name
                ),
                e,
            )
        })?;
    }

    tx.commit()?;
    info!("Schema rebuilt at version {}", SCHEMA_VERSION);
    Ok(MIGRATIONS.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn names(conn: &Connection, kind: &str) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type = ?1 ORDER BY name")
            .unwrap()
            .query_map([kind], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect()
    }

    #[test]
    fn test_ensure_schema_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_schema(&mut conn).unwrap();

        let tables = names(&conn, "table");
        for table in ["song", "playlist", "subtitle", "playlist_song", "schema_version"] {
            assert!(tables.contains(&table.to_string()), "missing {}", table);
        }
        assert!(column_exists(&conn, "song", "album").unwrap());
    }

    #[test]
    fn test_indexes_exist() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_schema(&mut conn).unwrap();

        let indexes = names(&conn, "index");
        for index in [
            "idx_song_title",
            "idx_song_artist",
            "idx_song_album",
            "idx_playlist_title",
            "idx_subtitle_song_id",
            "idx_playlist_song_playlist_id",
            "idx_playlist_song_song_id",
        ] {
            assert!(indexes.contains(&index.to_string()), "missing {}", index);
        }
    }

    #[test]
    fn test_schema_version() {
        let mut conn = Connection::open_in_memory().unwrap();

        assert_eq!(current_version(&conn).unwrap(), 0);
        assert!(needs_migration(&conn).unwrap());

        let applied = ensure_schema(&mut conn).unwrap();
        assert_eq!(applied, MIGRATIONS.len());
        assert_eq!(current_version(&conn).unwrap(), SCHEMA_VERSION);
        assert!(!needs_migration(&conn).unwrap());
    }

    #[test]
    fn test_apply_migrations_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_schema(&mut conn).unwrap();

        assert_eq!(apply_migrations(&mut conn).unwrap(), 0);
        assert_eq!(ensure_schema(&mut conn).unwrap(), 0);

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, MIGRATIONS.len() as i64);
    }

    #[test]
    fn test_migrations_are_ordered() {
        let versions: Vec<i64> = MIGRATIONS.iter().map(|m| m.version).collect();
        let mut sorted = versions.clone();
        sorted.sort_unstable();
        assert_eq!(versions, sorted);
        assert_eq!(versions.last().copied(), Some(SCHEMA_VERSION));
    }

    #[test]
    fn test_album_migration_tolerates_existing_column() {
        let mut conn = Connection::open_in_memory().unwrap();
        // Song table as written by a build that already had the column
        conn.execute_batch(
            "CREATE TABLE song (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                artist TEXT,
                album TEXT DEFAULT '',
                length INTEGER NOT NULL,
                path TEXT NOT NULL
            );",
        )
        .unwrap();

        ensure_schema(&mut conn).unwrap();
        assert_eq!(current_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_failed_migration_is_schema_error() {
        let mut conn = Connection::open_in_memory().unwrap();
        // A view named like a table makes CREATE INDEX fail
        conn.execute_batch("CREATE VIEW song AS SELECT 1 AS title;")
            .unwrap();

        let err = ensure_schema(&mut conn).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert_eq!(current_version(&conn).unwrap(), 0);
    }

    #[test]
    fn test_drop_schema() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_schema(&mut conn).unwrap();

        drop_schema(&conn).unwrap();
        assert!(names(&conn, "table").is_empty());
        assert_eq!(current_version(&conn).unwrap(), 0);
    }

    #[test]
    fn test_drop_schema_removes_squatting_view() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE VIEW song AS SELECT 1 AS title;")
            .unwrap();

        drop_schema(&conn).unwrap();
        assert!(names(&conn, "view").is_empty());
        ensure_schema(&mut conn).unwrap();
        assert_eq!(current_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_reset_schema_rebuilds_broken_database() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE VIEW song AS SELECT 1 AS title;")
            .unwrap();
        assert!(ensure_schema(&mut conn).is_err());

        assert_eq!(reset_schema(&mut conn).unwrap(), MIGRATIONS.len());
        assert_eq!(current_version(&conn).unwrap(), SCHEMA_VERSION);
        assert!(names(&conn, "table").contains(&"song".to_string()));
        assert!(names(&conn, "view").is_empty());
    }

    #[test]
    fn test_reset_schema_clears_rows() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_schema(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO song (title, length, path) VALUES ('A', 10, 'a.mp3')",
            [],
        )
        .unwrap();

        reset_schema(&mut conn).unwrap();
        let songs: i64 = conn
            .query_row("SELECT COUNT(*) FROM song", [], |row| row.get(0))
            .unwrap();
        assert_eq!(songs, 0);
        assert_eq!(current_version(&conn).unwrap(), SCHEMA_VERSION);
    }
}
