//! medialib CLI
//!
//! Command-line interface for medialib - songs, playlists and subtitles.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use medialib_core::{Config, Library, LibraryError};

mod commands;
mod output;
mod prompt;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "medialib")]
#[command(about = "medialib - Local media library for songs, playlists and subtitles")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and apply migrations
    Init,
    /// Show database location, schema version and contents
    Status,
    /// Show row counts of all tables
    Stats,
    /// Manage songs
    Song {
        #[command(subcommand)]
        command: SongCommands,
    },
    /// Manage playlists
    Playlist {
        #[command(subcommand)]
        command: PlaylistCommands,
    },
    /// Manage subtitles
    Subtitle {
        #[command(subcommand)]
        command: SubtitleCommands,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Delete all data and recreate an empty database
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum SongCommands {
    /// Add a song
    Add {
        /// Song title
        title: String,
        /// Length in seconds
        #[arg(short, long)]
        length: i64,
        /// Path to the media file
        #[arg(short, long)]
        path: String,
        /// Artist name
        #[arg(short, long)]
        artist: Option<String>,
        /// Album name
        #[arg(short = 'A', long)]
        album: Option<String>,
    },
    /// List all songs
    #[command(alias = "ls")]
    List,
    /// Show song details (including subtitles)
    Show {
        /// Song ID
        id: i64,
    },
    /// Edit a song's title, artist or album
    Edit {
        /// Song ID
        id: i64,
        /// New title
        #[arg(short = 'T', long)]
        title: Option<String>,
        /// New artist (empty to clear)
        #[arg(short, long)]
        artist: Option<String>,
        /// New album (empty to clear)
        #[arg(short = 'A', long)]
        album: Option<String>,
    },
    /// Delete a song with its subtitles and playlist entries
    #[command(alias = "rm")]
    Delete {
        /// Song ID
        id: i64,
    },
    /// Search songs by title or artist
    Search {
        /// Search query (case-insensitive)
        query: String,
    },
    /// Add songs from a JSON file (array of songs)
    Import {
        /// JSON file to read
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum PlaylistCommands {
    /// Create an empty playlist
    #[command(alias = "new")]
    Create {
        /// Playlist title
        title: String,
    },
    /// List all playlists
    #[command(alias = "ls")]
    List,
    /// Show a playlist and its songs
    Show {
        /// Playlist ID
        id: i64,
    },
    /// Rename a playlist
    Rename {
        /// Playlist ID
        id: i64,
        /// New title
        title: String,
    },
    /// Delete a playlist (songs are kept)
    #[command(alias = "rm")]
    Delete {
        /// Playlist ID
        id: i64,
    },
    /// Add a song to a playlist
    Add {
        /// Playlist ID
        playlist_id: i64,
        /// Song ID
        song_id: i64,
    },
    /// Remove a song from a playlist
    Remove {
        /// Playlist ID
        playlist_id: i64,
        /// Song ID
        song_id: i64,
    },
    /// List the songs of a playlist
    Songs {
        /// Playlist ID
        id: i64,
    },
    /// Add several songs to a playlist, skipping failures
    AddMany {
        /// Playlist ID
        playlist_id: i64,
        /// Song IDs
        #[arg(required = true)]
        song_ids: Vec<i64>,
    },
    /// Recompute cached song count and length
    Refresh {
        /// Playlist ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum SubtitleCommands {
    /// Attach a subtitle to a song
    Add {
        /// Song ID
        song_id: i64,
        /// Language code (e.g. en)
        language: String,
        /// Path to the subtitle file
        #[arg(short, long)]
        path: Option<String>,
    },
    /// List subtitles of a song
    #[command(alias = "ls")]
    List {
        /// Song ID
        song_id: i64,
    },
    /// Delete a subtitle
    #[command(alias = "rm")]
    Delete {
        /// Song ID
        song_id: i64,
        /// Subtitle ID
        sub_id: i64,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, database_file, busy_timeout_ms, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    match run(cli, &output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e, &output);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, output: &Output) -> Result<()> {
    let config_path = cli.config.as_ref();

    // Config commands load the file themselves; `set` can repair a broken one
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), config_path, output);
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config, cli.verbose);

    let mut library = Library::from_config(&config);

    match cli.command {
        Commands::Init => commands::init::init(&mut library, output),
        Commands::Status => commands::status::show(&mut library, &config, output),
        Commands::Config { .. } => unreachable!(), // Handled above
        // Runs without initialize so a broken schema can be wiped
        Commands::Reset { yes } => commands::reset::reset(&mut library, yes, output),
        command => {
            library.initialize()?;
            let result = dispatch(command, &mut library, output);
            library.shutdown();
            result
        }
    }
}

fn dispatch(command: Commands, library: &mut Library, output: &Output) -> Result<()> {
    match command {
        Commands::Stats => commands::stats::show(library, output),
        Commands::Song { command } => handle_song_command(command, library, output),
        Commands::Playlist { command } => handle_playlist_command(command, library, output),
        Commands::Subtitle { command } => handle_subtitle_command(command, library, output),
        Commands::Init | Commands::Status | Commands::Config { .. } | Commands::Reset { .. } => {
            unreachable!()
        }
    }
}

fn handle_song_command(command: SongCommands, library: &mut Library, output: &Output) -> Result<()> {
    match command {
        SongCommands::Add {
            title,
            length,
            path,
            artist,
            album,
        } => commands::song::add(library, title, length, path, artist, album, output),
        SongCommands::List => commands::song::list(library, output),
        SongCommands::Show { id } => commands::song::show(library, id, output),
        SongCommands::Edit {
            id,
            title,
            artist,
            album,
        } => commands::song::edit(library, id, title, artist, album, output),
        SongCommands::Delete { id } => commands::song::delete(library, id, output),
        SongCommands::Search { query } => commands::song::search(library, &query, output),
        SongCommands::Import { file } => commands::song::import(library, &file, output),
    }
}

fn handle_playlist_command(
    command: PlaylistCommands,
    library: &mut Library,
    output: &Output,
) -> Result<()> {
    match command {
        PlaylistCommands::Create { title } => commands::playlist::create(library, &title, output),
        PlaylistCommands::List => commands::playlist::list(library, output),
        PlaylistCommands::Show { id } => commands::playlist::show(library, id, output),
        PlaylistCommands::Rename { id, title } => {
            commands::playlist::rename(library, id, &title, output)
        }
        PlaylistCommands::Delete { id } => commands::playlist::delete(library, id, output),
        PlaylistCommands::Add {
            playlist_id,
            song_id,
        } => commands::playlist::add_song(library, playlist_id, song_id, output),
        PlaylistCommands::Remove {
            playlist_id,
            song_id,
        } => commands::playlist::remove_song(library, playlist_id, song_id, output),
        PlaylistCommands::Songs { id } => commands::playlist::songs(library, id, output),
        PlaylistCommands::AddMany {
            playlist_id,
            song_ids,
        } => commands::playlist::add_many(library, playlist_id, &song_ids, output),
        PlaylistCommands::Refresh { id } => commands::playlist::refresh(library, id, output),
    }
}

fn handle_subtitle_command(
    command: SubtitleCommands,
    library: &mut Library,
    output: &Output,
) -> Result<()> {
    match command {
        SubtitleCommands::Add {
            song_id,
            language,
            path,
        } => commands::subtitle::add(library, song_id, &language, path.as_deref(), output),
        SubtitleCommands::List { song_id } => commands::subtitle::list(library, song_id, output),
        SubtitleCommands::Delete { song_id, sub_id } => {
            commands::subtitle::delete(library, song_id, sub_id, output)
        }
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Install the tracing subscriber
///
/// `RUST_LOG` wins over `--verbose`. Logs go to `log_file` when configured,
/// otherwise to stderr.
fn init_logging(config: &Config, verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "medialib_core={},medialib_cli={}",
            default_level, default_level
        ))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    let log_file = config.log_file.as_ref().and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!("Warning: Could not open log file {:?}: {}", path, e);
                None
            }
        }
    });

    // Ignore the error if a subscriber is already installed
    let _ = match log_file {
        Some(file) => builder.with_ansi(false).with_writer(file).try_init(),
        None => builder.with_writer(std::io::stderr).try_init(),
    };
}

/// Print an error with its taxonomy kind and a recovery hint when known
fn report_error(error: &anyhow::Error, output: &Output) {
    let library_error = error.downcast_ref::<LibraryError>();
    let kind = library_error.map(|e| e.kind().as_str());
    let hint = library_error.and_then(LibraryError::recovery_suggestion);

    output.error(kind, &format!("{:#}", error), hint);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_song_add() {
        let cli = Cli::try_parse_from([
            "medialib", "song", "add", "Song A", "--length", "200", "--path", "a.mp3", "-a",
            "Artist A",
        ])
        .unwrap();

        match cli.command {
            Commands::Song {
                command:
                    SongCommands::Add {
                        title,
                        length,
                        artist,
                        album,
                        ..
                    },
            } => {
                assert_eq!(title, "Song A");
                assert_eq!(length, 200);
                assert_eq!(artist.as_deref(), Some("Artist A"));
                assert_eq!(album, None);
            }
            _ => panic!("expected song add"),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["medialib", "stats", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Stats));
    }

    #[test]
    fn test_add_many_requires_song_ids() {
        assert!(Cli::try_parse_from(["medialib", "playlist", "add-many", "1"]).is_err());

        let cli = Cli::try_parse_from(["medialib", "playlist", "add-many", "1", "2", "3"]).unwrap();
        match cli.command {
            Commands::Playlist {
                command:
                    PlaylistCommands::AddMany {
                        playlist_id,
                        song_ids,
                    },
            } => {
                assert_eq!(playlist_id, 1);
                assert_eq!(song_ids, vec![2, 3]);
            }
            _ => panic!("expected playlist add-many"),
        }
    }
}
