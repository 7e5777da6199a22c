//! Command line tool to record, export and import GPS tracks
mod cli; // command line interface
mod export; // GPX production
mod import; // GPX/KML import
mod record; // track recording and management
mod workspace; // data location

#[macro_use]
extern crate log;

use env_logger::{Builder, Target};
use std::sync::Arc;
use thiserror::Error;

use cli::Cli;
use workspace::Workspace;

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error")]
    StdioError(#[from] std::io::Error),
    #[error("tracklog error")]
    TracklogError(#[from] tracklog::Error),
    #[error("no active track: use --track or start a new one")]
    NoActiveTrack,
}

pub fn main() -> Result<(), Error> {
    let cli = Cli::new();

    let mut builder = Builder::from_default_env();
    builder
        .target(Target::Stdout)
        .format_timestamp_secs()
        .format_module_path(false);
    if cli.quiet() {
        builder.filter_level(log::LevelFilter::Error);
    }
    builder.init();

    let workspace = Workspace::new(&cli)?;
    let store = Arc::new(workspace.open_store()?);

    let outcome = match cli.matches.subcommand() {
        Some(("list", _)) => {
            record::list(&store);
            return Ok(());
        },
        Some(("new", submatches)) => record::new_track(&store, submatches),
        Some(("point", submatches)) => record::point(&store, submatches),
        Some(("waypoint", submatches)) => record::way_point(&store, submatches),
        Some(("stop", submatches)) => record::stop(&store, submatches),
        Some(("resume", submatches)) => record::resume(&store, submatches),
        Some(("delete", submatches)) => record::delete(&store, submatches),
        Some(("export", submatches)) => export::export(&store, submatches),
        Some(("import", submatches)) => import::import(&store, submatches),
        _ => return Ok(()),
    };
    // partial imports and successful exports are kept, whatever the outcome
    workspace.save_store(&store)?;
    outcome
}
