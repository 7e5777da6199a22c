//! GPX production
use clap::ArgMatches;
use std::{path::PathBuf, sync::Arc};

use tracklog::prelude::{
    AccuracyMode, CompassMode, Error as TracklogError, ExportConfig, ExportJob, FilenameFormat,
    GpxOptions, Progress, TrackId, TrackStore, DEFAULT_HDOP_FACTOR,
};

use crate::Error;

/// Builds the [ExportConfig] described by the export opmode
fn config(matches: &ArgMatches) -> ExportConfig {
    let base = matches
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_default();

    let mut gpx = GpxOptions::default();
    if matches.get_flag("hdop") {
        let factor = matches
            .get_one::<f64>("hdop-factor")
            .copied()
            .unwrap_or(DEFAULT_HDOP_FACTOR);
        gpx = gpx.with_hdop(factor);
    }
    if let Some(mode) = matches.get_one::<CompassMode>("compass") {
        gpx = gpx.with_compass_mode(*mode);
    }
    if let Some(mode) = matches.get_one::<AccuracyMode>("accuracy") {
        gpx = gpx.with_accuracy_mode(*mode);
    }

    ExportConfig::new(base)
        .with_directory_per_track(matches.get_flag("per-track-dir"))
        .with_filename_format(
            matches
                .get_one::<FilenameFormat>("filename")
                .copied()
                .unwrap_or_default(),
        )
        .with_media(matches.get_flag("media"))
        .with_export_date_update(!matches.get_flag("no-date-update"))
        .with_gzip(matches.get_flag("gzip"))
        .with_gpx_options(gpx)
}

pub fn export(store: &Arc<TrackStore>, matches: &ArgMatches) -> Result<(), Error> {
    let tracks = if matches.get_flag("all") {
        store.tracks().iter().map(|track| track.id).collect::<Vec<_>>()
    } else {
        matches
            .get_many::<TrackId>("id")
            .map(|ids| ids.copied().collect::<Vec<_>>())
            .unwrap_or_default()
    };

    let config = config(matches);
    let job = ExportJob::new(Arc::clone(store), &tracks, config).spawn();

    let mut total = 0;
    let mut written = 0;
    for progress in job.progress.iter() {
        match progress {
            Progress::TrackStarted {
                track,
                points,
                way_points,
            } => {
                total = points + way_points;
                written = 0;
                debug!("track #{}: {} points to export", track, total);
            },
            Progress::Advanced(n) => {
                written += n;
                trace!("{}/{}", written, total);
            },
            Progress::TrackFinished { track, path } => {
                info!("track #{} -> \"{}\"", track, path.display());
            },
        }
    }

    match job.join() {
        Ok(report) => {
            info!("{} track(s) exported", report.files.len());
            Ok(())
        },
        Err(TracklogError::Batch(batch)) => {
            for (track, e) in batch.failures.iter() {
                error!("track #{}: {}", track, e);
            }
            Err(TracklogError::Batch(batch).into())
        },
        Err(e) => Err(e.into()),
    }
}
