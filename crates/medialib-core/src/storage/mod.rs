//! Storage layer
//!
//! Connection management and the SQLite schema.
//!
//! ## Tables
//!
//! - `song` - Song records
//! - `playlist` - Playlists with cached totals
//! - `subtitle` - Subtitles, keyed by (song_id, sub_id)
//! - `playlist_song` - Playlist membership junction
//! - `schema_version` - One row per applied migration

pub mod database;
pub mod schema;

pub use database::Database;
pub use schema::{
    apply_migrations, current_version, drop_schema, ensure_schema, needs_migration,
    reset_schema, SCHEMA_VERSION,
};
