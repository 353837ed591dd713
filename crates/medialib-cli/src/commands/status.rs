//! Status command handler

use anyhow::Result;

use medialib_core::{Config, Library, SCHEMA_VERSION};

use crate::output::{Output, OutputFormat};

/// Show status information
///
/// Does not create the database when it is missing.
pub fn show(library: &mut Library, config: &Config, output: &Output) -> Result<()> {
    let database = library.database().clone();
    let exists = database.exists();

    let (version, stats) = if exists {
        library.initialize()?;
        let version = library.schema_version()?;
        let stats = library.get_database_stats()?;
        library.shutdown();
        (Some(version), Some(stats))
    } else {
        (None, None)
    };

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "database": database.path(),
                    "database_exists": exists,
                    "database_size": database.file_size(),
                    "schema_version": version,
                    "latest_schema_version": SCHEMA_VERSION,
                    "data_dir": config.data_dir,
                    "log_file": config.log_file,
                    "counts": stats
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", database.path().display());
        }
        OutputFormat::Human => {
            println!("medialib Status");
            println!("===============");
            println!();
            println!("Storage:");
            println!("  Database: {}", database.path().display());
            if !exists {
                println!("  Status:   not created yet (run `medialib init`)");
                return Ok(());
            }
            println!("  Size:     {}", database.file_size_human());
            if let Some(version) = version {
                println!("  Schema:   version {} (latest {})", version, SCHEMA_VERSION);
            }
            if let Some(stats) = stats {
                println!();
                println!("Contents:");
                println!("  Songs:     {}", stats.total_songs);
                println!("  Playlists: {}", stats.total_playlists);
                println!("  Subtitles: {}", stats.total_subtitles);
            }
        }
    }

    Ok(())
}
