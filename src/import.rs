//! Feeds imported points into a [TrackStore] track
use log::info;
use std::{
    io::BufRead,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    error::Error,
    gpx::{GpxImporter, ImportEvent, ImportOptions},
    job::{CancelToken, JobHandle, Progress, ProgressSender},
    model::TrackId,
    store::{TrackStore, WayPointInput},
};

/// Imported point counts
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub track_points: u64,
    pub way_points: u64,
}

/// Imports GPX (or KML) content into `track`. Points are stored as they
/// are read: on a structural failure (or cancellation) the points read
/// so far remain in the track.
pub fn import_into<R: BufRead>(
    store: &TrackStore,
    track: TrackId,
    reader: R,
    options: ImportOptions,
    progress: &ProgressSender,
    cancel: &CancelToken,
) -> Result<ImportSummary, Error> {
    // fail early on unknown tracks
    store.track(track)?;
    options.validate()?;

    let mut summary = ImportSummary::default();
    for event in GpxImporter::new(reader, options) {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        match event? {
            ImportEvent::TrackPoint {
                location,
                sensors,
                new_segment,
            } => {
                store.insert_segment_point(track, Some(&location), sensors, new_segment)?;
                summary.track_points += 1;
            },
            ImportEvent::WayPoint {
                location,
                sensors,
                name,
            } => {
                store.insert_way_point(
                    track,
                    Some(&location),
                    WayPointInput::named(&name),
                    sensors,
                )?;
                summary.way_points += 1;
            },
        }
        progress.send(Progress::Advanced(1));
    }
    info!(
        "track #{}: imported {} points and {} waypoints",
        track, summary.track_points, summary.way_points
    );
    Ok(summary)
}

/// Imports the GPX (or KML) file located at `path` into `track`.
/// ".gz" files are decompressed on the fly.
pub fn import_file<P: AsRef<Path>>(
    store: &TrackStore,
    track: TrackId,
    path: P,
    options: ImportOptions,
    progress: &ProgressSender,
    cancel: &CancelToken,
) -> Result<ImportSummary, Error> {
    let path = path.as_ref();
    let reader = crate::reader::BufferedReader::from_path(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    import_into(store, track, reader, options, progress, cancel)
}

/// Import running on its own thread
pub type ImportHandle = JobHandle<ImportSummary>;

/// Import job builder
#[derive(Debug, Clone)]
pub struct ImportJob {
    store: Arc<TrackStore>,
    track: TrackId,
    path: PathBuf,
    options: ImportOptions,
}

impl ImportJob {
    pub fn new<P: AsRef<Path>>(store: Arc<TrackStore>, track: TrackId, path: P) -> Self {
        Self {
            store,
            track,
            path: path.as_ref().to_path_buf(),
            options: ImportOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    /// Starts the import on a worker thread
    pub fn spawn(self) -> ImportHandle {
        JobHandle::spawn(move |progress, cancel| {
            import_file(
                &self.store,
                self.track,
                &self.path,
                self.options,
                &progress,
                &cancel,
            )
        })
    }
}
