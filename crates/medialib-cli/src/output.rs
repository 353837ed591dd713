//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use medialib_core::{DatabaseStats, Playlist, PlaylistSong, Song, Subtitle};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single song
    pub fn print_song(&self, song: &Song) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:     {}", song.id);
                println!("Title:  {}", song.title);
                println!("Artist: {}", song.artist.as_deref().unwrap_or("(unknown)"));
                if !song.album.is_empty() {
                    println!("Album:  {}", song.album);
                }
                println!("Length: {}", format_duration(song.length));
                println!("Path:   {}", song.path);
            }
            OutputFormat::Json => print_json(song),
            OutputFormat::Quiet => println!("{}", song.id),
        }
    }

    /// Print a list of songs
    pub fn print_songs(&self, songs: &[Song]) {
        match self.format {
            OutputFormat::Human => {
                if songs.is_empty() {
                    println!("No songs found.");
                    return;
                }
                for song in songs {
                    println!(
                        "{:>4} | {} | {} | {}",
                        song.id,
                        truncate(&song.title, 35),
                        truncate(song.artist.as_deref().unwrap_or("-"), 25),
                        format_duration(song.length)
                    );
                }
                println!("\n{} song(s)", songs.len());
            }
            OutputFormat::Json => print_json(songs),
            OutputFormat::Quiet => {
                for song in songs {
                    println!("{}", song.id);
                }
            }
        }
    }

    /// Print a single playlist with its songs
    pub fn print_playlist(&self, playlist: &Playlist, songs: &[Song]) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:     {}", playlist.id);
                println!("Title:  {}", playlist.title);
                println!(
                    "Totals: {} song(s), {} (cached)",
                    playlist.num_songs,
                    format_duration(playlist.length)
                );

                println!();
                println!("── Songs ({}) ──", songs.len());
                for (track, song) in songs.iter().enumerate() {
                    println!(
                        "{:>3}. {} - {} [{}]",
                        track + 1,
                        song.title,
                        song.artist.as_deref().unwrap_or("-"),
                        format_duration(song.length)
                    );
                }
            }
            OutputFormat::Json => {
                print_json(&serde_json::json!({
                    "playlist": playlist,
                    "songs": songs,
                }));
            }
            OutputFormat::Quiet => println!("{}", playlist.id),
        }
    }

    /// Print a list of playlists
    pub fn print_playlists(&self, playlists: &[Playlist]) {
        match self.format {
            OutputFormat::Human => {
                if playlists.is_empty() {
                    println!("No playlists found.");
                    return;
                }
                for playlist in playlists {
                    println!(
                        "{:>4} | {} | {} song(s) | {}",
                        playlist.id,
                        truncate(&playlist.title, 40),
                        playlist.num_songs,
                        format_duration(playlist.length)
                    );
                }
                println!("\n{} playlist(s)", playlists.len());
            }
            OutputFormat::Json => print_json(playlists),
            OutputFormat::Quiet => {
                for playlist in playlists {
                    println!("{}", playlist.id);
                }
            }
        }
    }

    /// Print membership rows created by an add
    pub fn print_memberships(&self, memberships: &[PlaylistSong]) {
        match self.format {
            OutputFormat::Human => {
                for membership in memberships {
                    println!(
                        "Song {} -> playlist {} (track {})",
                        membership.song_id,
                        membership.playlist_id,
                        membership
                            .track_number
                            .map(|n| n.to_string())
                            .unwrap_or_else(|| "-".to_string())
                    );
                }
            }
            OutputFormat::Json => print_json(memberships),
            OutputFormat::Quiet => {
                for membership in memberships {
                    println!("{}", membership.song_id);
                }
            }
        }
    }

    /// Print subtitles of a song
    pub fn print_subtitles(&self, subtitles: &[Subtitle]) {
        match self.format {
            OutputFormat::Human => {
                if subtitles.is_empty() {
                    println!("No subtitles found.");
                    return;
                }
                for subtitle in subtitles {
                    println!(
                        "{}/{} | {} | {}",
                        subtitle.song_id,
                        subtitle.sub_id,
                        subtitle.language,
                        subtitle.path.as_deref().unwrap_or("-")
                    );
                }
                println!("\n{} subtitle(s)", subtitles.len());
            }
            OutputFormat::Json => print_json(subtitles),
            OutputFormat::Quiet => {
                for subtitle in subtitles {
                    println!("{}", subtitle.sub_id);
                }
            }
        }
    }

    /// Print table row counts
    pub fn print_stats(&self, stats: &DatabaseStats) {
        match self.format {
            OutputFormat::Human => {
                println!("Songs:          {}", stats.total_songs);
                println!("Playlists:      {}", stats.total_playlists);
                println!("Subtitles:      {}", stats.total_subtitles);
                println!("Playlist songs: {}", stats.total_playlist_songs);
            }
            OutputFormat::Json => print_json(stats),
            OutputFormat::Quiet => {
                println!(
                    "{} {} {} {}",
                    stats.total_songs,
                    stats.total_playlists,
                    stats.total_subtitles,
                    stats.total_playlist_songs
                );
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a warning to stderr (suppressed in quiet mode)
    pub fn warning(&self, message: &str) {
        match self.format {
            OutputFormat::Human => eprintln!("⚠ {}", message),
            OutputFormat::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({"status": "warning", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a failed command to stderr
    pub fn error(&self, kind: Option<&str>, message: &str, hint: Option<&str>) {
        match self.format {
            OutputFormat::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "status": "error",
                        "kind": kind,
                        "message": message,
                        "hint": hint
                    })
                );
            }
            OutputFormat::Human | OutputFormat::Quiet => {
                eprintln!("Error: {}", message);
                if let Some(hint) = hint {
                    eprintln!();
                    eprintln!("{}", hint);
                }
            }
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: failed to encode JSON: {}", e),
    }
}

/// Format seconds as m:ss, or h:mm:ss past an hour
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let (hours, minutes, secs) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        assert_eq!(truncate("ééééééééééééé", 6), "ééé...");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(200), "3:20");
        assert_eq!(format_duration(3600), "1:00:00");
        assert_eq!(format_duration(86_400), "24:00:00");
    }
}
