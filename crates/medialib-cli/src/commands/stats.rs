//! Stats command handler

use anyhow::Result;

use medialib_core::Library;

use crate::output::Output;

/// Show row counts of all tables
pub fn show(library: &mut Library, output: &Output) -> Result<()> {
    let stats = library.get_database_stats()?;
    output.print_stats(&stats);
    Ok(())
}
