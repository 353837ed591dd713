//! Song command handlers

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use medialib_core::{Library, NewSong, Song};

use crate::output::{Output, OutputFormat};
use crate::prompt::{confirm, prompt_with_default};

/// Add a song
pub fn add(
    library: &mut Library,
    title: String,
    length: i64,
    path: String,
    artist: Option<String>,
    album: Option<String>,
    output: &Output,
) -> Result<()> {
    let song = NewSong {
        title,
        artist,
        album: album.unwrap_or_default(),
        length,
        path,
    };

    let song = library.add_song(&song).context("Failed to add song")?;

    output.success(&format!("Added song: {}", song.id));
    output.print_song(&song);

    Ok(())
}

/// List all songs
pub fn list(library: &mut Library, output: &Output) -> Result<()> {
    let songs = library.get_all_songs()?;
    output.print_songs(&songs);
    Ok(())
}

/// Show a song with its subtitles
pub fn show(library: &mut Library, id: i64, output: &Output) -> Result<()> {
    let song = library.get_song(id)?;
    let subtitles = library.get_subtitles_for_song(id)?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "song": song,
                    "subtitles": subtitles,
                }))?
            );
        }
        OutputFormat::Quiet => println!("{}", song.id),
        OutputFormat::Human => {
            output.print_song(&song);
            if !subtitles.is_empty() {
                println!();
                println!("── Subtitles ({}) ──", subtitles.len());
                for subtitle in &subtitles {
                    println!(
                        "[{}] {} {}",
                        subtitle.sub_id,
                        subtitle.language,
                        subtitle.path.as_deref().unwrap_or("")
                    );
                }
            }
        }
    }

    Ok(())
}

/// Edit a song's title, artist or album
///
/// Without flags, prompts for each field in human mode.
pub fn edit(
    library: &mut Library,
    id: i64,
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    output: &Output,
) -> Result<()> {
    let current = library.get_song(id)?;

    let (title, artist, album) =
        if title.is_none() && artist.is_none() && album.is_none() && output.should_prompt() {
            prompt_for_changes(&current)?
        } else {
            (title, artist, album)
        };

    let edit = SongEdit::new(&current, title, artist, album);
    if !edit.changes(&current) {
        output.message("No changes.");
        return Ok(());
    }

    let song = library
        .update_song(id, &edit.title, edit.artist.as_deref(), &edit.album)
        .context("Failed to update song")?;

    output.success(&format!("Updated song: {}", song.id));
    output.print_song(&song);

    Ok(())
}

/// Delete a song
pub fn delete(library: &mut Library, id: i64, output: &Output) -> Result<()> {
    let song = library.get_song(id)?;

    // Confirm deletion
    if output.should_prompt() {
        println!("Delete song: {} - {}", song.id, song.title);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    library.delete_song(id).context("Failed to delete song")?;

    output.success(&format!("Deleted song: {}", id));

    Ok(())
}

/// Search songs by title or artist
pub fn search(library: &mut Library, query: &str, output: &Output) -> Result<()> {
    let songs = library.search_songs(query)?;
    output.print_songs(&songs);
    Ok(())
}

/// Add every song in a JSON array, skipping invalid entries
pub fn import(library: &mut Library, file: &Path, output: &Output) -> Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read import file: {:?}", file))?;
    let songs = parse_import(&content)
        .with_context(|| format!("Failed to parse import file: {:?}", file))?;

    let added = library.add_multiple_songs(&songs)?;
    let skipped = songs.len() - added.len();

    if skipped > 0 {
        output.warning(&format!(
            "Skipped {} of {} song(s). Last error: {}",
            skipped,
            songs.len(),
            library.last_error().unwrap_or("unknown")
        ));
    }
    output.success(&format!("Imported {} song(s)", added.len()));
    if !output.is_json() {
        output.print_songs(&added);
    }

    Ok(())
}

fn parse_import(content: &str) -> Result<Vec<NewSong>> {
    Ok(serde_json::from_str(content)?)
}

fn prompt_for_changes(current: &Song) -> Result<(Option<String>, Option<String>, Option<String>)> {
    println!("Editing song: {}", current.id);
    println!("Press Enter to keep current value, or type new value.\n");

    let title = prompt_with_default("Title", &current.title)?;
    let artist = prompt_with_default("Artist", current.artist.as_deref().unwrap_or(""))?;
    let album = prompt_with_default("Album", &current.album)?;
    Ok((title, artist, album))
}

/// Resolved field values for an update
#[derive(Debug, PartialEq)]
struct SongEdit {
    title: String,
    artist: Option<String>,
    album: String,
}

impl SongEdit {
    /// Merge requested changes over the current values
    ///
    /// An empty artist clears it.
    fn new(
        current: &Song,
        title: Option<String>,
        artist: Option<String>,
        album: Option<String>,
    ) -> Self {
        Self {
            title: title.unwrap_or_else(|| current.title.clone()),
            artist: match artist {
                Some(a) if a.is_empty() => None,
                Some(a) => Some(a),
                None => current.artist.clone(),
            },
            album: album.unwrap_or_else(|| current.album.clone()),
        }
    }

    fn changes(&self, current: &Song) -> bool {
        self.title != current.title || self.artist != current.artist || self.album != current.album
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current() -> Song {
        Song {
            id: 1,
            title: "Old".to_string(),
            artist: Some("Someone".to_string()),
            album: "Album".to_string(),
            length: 100,
            path: "old.mp3".to_string(),
        }
    }

    #[test]
    fn test_song_edit_keeps_unset_fields() {
        let edit = SongEdit::new(&current(), Some("New".to_string()), None, None);

        assert_eq!(edit.title, "New");
        assert_eq!(edit.artist.as_deref(), Some("Someone"));
        assert_eq!(edit.album, "Album");
        assert!(edit.changes(&current()));
    }

    #[test]
    fn test_song_edit_clears_artist() {
        let edit = SongEdit::new(&current(), None, Some(String::new()), Some(String::new()));

        assert_eq!(edit.artist, None);
        assert_eq!(edit.album, "");
    }

    #[test]
    fn test_song_edit_without_changes() {
        let edit = SongEdit::new(&current(), None, None, None);
        assert!(!edit.changes(&current()));
    }

    #[test]
    fn test_parse_import() {
        let songs = parse_import(
            r#"[
                {"title": "A", "artist": "X", "length": 120, "path": "a.mp3"},
                {"title": "B", "album": "Y", "length": 60, "path": "b.flac"}
            ]"#,
        )
        .unwrap();

        assert_eq!(songs.len(), 2);
        assert_eq!(songs[0].artist.as_deref(), Some("X"));
        assert_eq!(songs[1].album, "Y");
        assert_eq!(songs[1].artist, None);
    }

    #[test]
    fn test_parse_import_rejects_non_array() {
        assert!(parse_import(r#"{"title": "A"}"#).is_err());
    }
}
