//! GPX/KML import
use clap::ArgMatches;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tracklog::prelude::{ImportJob, ImportOptions, Progress, TrackId, TrackStore};

use crate::Error;

/// Import options described by the import opmode
fn options(matches: &ArgMatches) -> ImportOptions {
    let mut options = ImportOptions::default();
    if matches.get_flag("no-hdop") {
        options.hdop_factor = None;
    } else if let Some(factor) = matches.get_one::<f64>("hdop-factor") {
        options.hdop_factor = Some(*factor);
    }
    options
}

/// Creates the track receiving the content of `path`,
/// named after the file and left inactive.
fn new_track(store: &TrackStore, path: &Path) -> Result<TrackId, Error> {
    let previous = store.active_track();
    let track = store.create_track();
    store.stop_tracking(track)?;
    if let Some(previous) = previous {
        store.set_active(previous)?;
    }
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    // remove extensions, including ".gpx.gz"
    let name = name.split('.').next().unwrap_or_default();
    store.rename(track, name)?;
    Ok(track)
}

pub fn import(store: &Arc<TrackStore>, matches: &ArgMatches) -> Result<(), Error> {
    let path = matches
        .get_one::<PathBuf>("file")
        .cloned()
        .unwrap_or_default();

    let track = match matches.get_one::<TrackId>("track") {
        Some(track) => *track,
        None => new_track(store, &path)?,
    };

    let job = ImportJob::new(Arc::clone(store), track, &path)
        .with_options(options(matches))
        .spawn();

    let mut imported = 0;
    for progress in job.progress.iter() {
        if let Progress::Advanced(n) = progress {
            imported += n;
            trace!("{} points imported", imported);
        }
    }

    let summary = job.join()?;
    info!(
        "\"{}\" -> track #{}: {} points, {} waypoints",
        path.display(),
        track,
        summary.track_points,
        summary.way_points
    );
    Ok(())
}
