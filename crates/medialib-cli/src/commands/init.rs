//! Init command handler

use anyhow::{Context, Result};

use medialib_core::Library;

use crate::output::{Output, OutputFormat};

/// Create the database file and bring the schema up to date
pub fn init(library: &mut Library, output: &Output) -> Result<()> {
    let existed = library.database().exists();

    library
        .initialize()
        .context("Failed to initialize the library")?;
    let version = library.schema_version()?;
    let path = library.database_path().to_path_buf();
    library.shutdown();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "database": path,
                    "schema_version": version,
                    "created": !existed
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", path.display());
        }
        OutputFormat::Human => {
            if existed {
                println!("Library already exists, schema is up to date.");
            } else {
                println!("Created new library.");
            }
            println!();
            println!("Database:       {}", path.display());
            println!("Schema version: {}", version);
        }
    }

    Ok(())
}
