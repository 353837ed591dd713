//! Subtitle command handlers

use anyhow::{Context, Result};

use medialib_core::Library;

use crate::output::Output;

/// Attach a subtitle to a song
pub fn add(
    library: &mut Library,
    song_id: i64,
    language: &str,
    path: Option<&str>,
    output: &Output,
) -> Result<()> {
    let subtitle = library
        .add_subtitles(song_id, language, path)
        .context("Failed to add subtitle")?;

    output.success(&format!(
        "Added subtitle {} ({}) to song {}",
        subtitle.sub_id, subtitle.language, subtitle.song_id
    ));
    output.print_subtitles(std::slice::from_ref(&subtitle));

    Ok(())
}

/// List subtitles of a song
pub fn list(library: &mut Library, song_id: i64, output: &Output) -> Result<()> {
    let subtitles = library.get_subtitles_for_song(song_id)?;
    output.print_subtitles(&subtitles);
    Ok(())
}

/// Delete a subtitle
pub fn delete(library: &mut Library, song_id: i64, sub_id: i64, output: &Output) -> Result<()> {
    library
        .delete_subtitles(song_id, sub_id)
        .context("Failed to delete subtitle")?;

    output.success(&format!("Deleted subtitle {} of song {}", sub_id, song_id));

    Ok(())
}
