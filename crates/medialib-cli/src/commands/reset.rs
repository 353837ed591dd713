//! Reset command handler

use anyhow::{bail, Context, Result};

use medialib_core::Library;

use crate::output::Output;
use crate::prompt::confirm;

/// Drop every table and start over with an empty schema
///
/// Does not require an initialized library, so it also recovers a database
/// whose schema fails to migrate.
pub fn reset(library: &mut Library, yes: bool, output: &Output) -> Result<()> {
    if !yes {
        if !output.should_prompt() {
            bail!("Refusing to reset without --yes in non-interactive mode");
        }

        match library.initialize().and_then(|()| library.get_database_stats()) {
            Ok(stats) => println!(
                "This deletes {} song(s), {} playlist(s) and {} subtitle(s) in {}",
                stats.total_songs,
                stats.total_playlists,
                stats.total_subtitles,
                library.database_path().display()
            ),
            Err(e) => println!(
                "The database at {} could not be opened ({}). Everything in it will be dropped.",
                library.database_path().display(),
                e
            ),
        }
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    library.reset().context("Failed to reset the library")?;
    output.success("Library reset");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use medialib_core::NewSong;
    use tempfile::TempDir;

    fn library_with_song() -> (Library, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut library = Library::with_database_path(temp_dir.path().join("lib.db"));
        library.initialize().unwrap();
        library.add_song(&NewSong::new("A", 10, "a.mp3")).unwrap();
        (library, temp_dir)
    }

    #[test]
    fn test_reset_requires_yes_when_not_interactive() {
        let (mut library, _temp) = library_with_song();
        let output = Output::new(OutputFormat::Json);

        assert!(reset(&mut library, false, &output).is_err());
        assert_eq!(library.get_database_stats().unwrap().total_songs, 1);
    }

    #[test]
    fn test_reset_with_yes() {
        let (mut library, _temp) = library_with_song();
        let output = Output::new(OutputFormat::Quiet);

        reset(&mut library, true, &output).unwrap();
        assert_eq!(library.get_database_stats().unwrap().total_songs, 0);
    }

    #[test]
    fn test_reset_runs_before_initialize() {
        let (library, _temp) = library_with_song();
        let path = library.database_path().to_path_buf();
        drop(library);

        let mut library = Library::with_database_path(&path);
        assert!(!library.is_initialized());

        let output = Output::new(OutputFormat::Quiet);
        reset(&mut library, true, &output).unwrap();

        library.initialize().unwrap();
        assert_eq!(library.get_database_stats().unwrap().total_songs, 0);
    }
}
