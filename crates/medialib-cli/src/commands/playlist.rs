//! Playlist command handlers

use anyhow::{Context, Result};

use medialib_core::Library;

use crate::output::Output;
use crate::prompt::confirm;

/// Create an empty playlist
pub fn create(library: &mut Library, title: &str, output: &Output) -> Result<()> {
    let playlist = library
        .create_playlist(title)
        .context("Failed to create playlist")?;

    output.success(&format!("Created playlist: {}", playlist.id));
    output.print_playlist(&playlist, &[]);

    Ok(())
}

/// List all playlists
pub fn list(library: &mut Library, output: &Output) -> Result<()> {
    let playlists = library.get_all_playlists()?;
    output.print_playlists(&playlists);
    Ok(())
}

/// Show a playlist and its songs
pub fn show(library: &mut Library, id: i64, output: &Output) -> Result<()> {
    let playlist = library.get_playlist(id)?;
    let songs = library.get_songs_in_playlist(id)?;
    output.print_playlist(&playlist, &songs);
    Ok(())
}

/// Rename a playlist
pub fn rename(library: &mut Library, id: i64, title: &str, output: &Output) -> Result<()> {
    let playlist = library
        .update_playlist(id, title)
        .context("Failed to rename playlist")?;

    output.success(&format!("Renamed playlist {} to '{}'", playlist.id, playlist.title));

    Ok(())
}

/// Delete a playlist
pub fn delete(library: &mut Library, id: i64, output: &Output) -> Result<()> {
    let playlist = library.get_playlist(id)?;

    // Confirm deletion
    if output.should_prompt() {
        println!("Delete playlist: {} - {}", playlist.id, playlist.title);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    library
        .delete_playlist(id)
        .context("Failed to delete playlist")?;

    output.success(&format!("Deleted playlist: {}", id));

    Ok(())
}

/// Add a song to a playlist
pub fn add_song(library: &mut Library, playlist_id: i64, song_id: i64, output: &Output) -> Result<()> {
    let membership = library
        .add_song_to_playlist(song_id, playlist_id)
        .context("Failed to add song to playlist")?;

    output.success(&format!("Added song {} to playlist {}", song_id, playlist_id));
    output.print_memberships(std::slice::from_ref(&membership));

    Ok(())
}

/// Remove a song from a playlist
pub fn remove_song(
    library: &mut Library,
    playlist_id: i64,
    song_id: i64,
    output: &Output,
) -> Result<()> {
    library
        .remove_song_from_playlist(song_id, playlist_id)
        .context("Failed to remove song from playlist")?;

    output.success(&format!(
        "Removed song {} from playlist {}",
        song_id, playlist_id
    ));

    Ok(())
}

/// List the songs of a playlist
pub fn songs(library: &mut Library, id: i64, output: &Output) -> Result<()> {
    let songs = library.get_songs_in_playlist(id)?;
    output.print_songs(&songs);
    Ok(())
}

/// Add several songs, reporting the ones that were skipped
pub fn add_many(
    library: &mut Library,
    playlist_id: i64,
    song_ids: &[i64],
    output: &Output,
) -> Result<()> {
    let added = library.add_multiple_songs_to_playlist(song_ids, playlist_id)?;
    let skipped = song_ids.len() - added.len();

    if skipped > 0 {
        output.warning(&format!(
            "Skipped {} of {} song(s). Last error: {}",
            skipped,
            song_ids.len(),
            library.last_error().unwrap_or("unknown")
        ));
    }
    output.success(&format!(
        "Added {} song(s) to playlist {}",
        added.len(),
        playlist_id
    ));
    if !output.is_json() {
        output.print_memberships(&added);
    }

    Ok(())
}

/// Recompute cached song count and total length
pub fn refresh(library: &mut Library, id: i64, output: &Output) -> Result<()> {
    let playlist = library
        .recompute_playlist_totals(id)
        .context("Failed to refresh playlist totals")?;

    output.success(&format!(
        "Playlist {} has {} song(s)",
        playlist.id, playlist.num_songs
    ));
    output.print_playlists(std::slice::from_ref(&playlist));

    Ok(())
}
