//! Track export: directory and filename resolution, GPX production,
//! media copy and export date bookkeeping
use log::{debug, error, info};
use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    error::{BatchError, Error},
    filename::{gpx_filename, track_directory_name, FilenameFormat, GPX_EXTENSION},
    gpx::{GpxOptions, GpxWriter},
    job::{CancelToken, JobHandle, Progress, ProgressSender},
    media::copy_media,
    model::{Track, TrackId},
    store::TrackStore,
    writer::BufferedWriter,
};

/// Gzip compression level, when compressed output is requested
#[cfg(feature = "flate2")]
const GZIP_COMPRESSION_LEVEL: u32 = 6;

/// Export settings
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    /// Base export directory, created when missing
    pub base_directory: PathBuf,
    /// Creates one sub directory per track
    pub directory_per_track: bool,
    pub filename_format: FilenameFormat,
    /// Copies the track media files next to the GPX file
    pub export_media: bool,
    /// Records the export date in the store, on success
    pub update_export_date: bool,
    /// Produces ".gpx.gz" files (requires flate2)
    pub gzip: bool,
    pub gpx: GpxOptions,
}

impl ExportConfig {
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Self {
        Self {
            base_directory: base_directory.as_ref().to_path_buf(),
            directory_per_track: false,
            filename_format: FilenameFormat::default(),
            export_media: false,
            update_export_date: true,
            gzip: false,
            gpx: GpxOptions::default(),
        }
    }
    pub fn with_directory_per_track(&self, enabled: bool) -> Self {
        let mut s = self.clone();
        s.directory_per_track = enabled;
        s
    }
    pub fn with_filename_format(&self, format: FilenameFormat) -> Self {
        let mut s = self.clone();
        s.filename_format = format;
        s
    }
    pub fn with_media(&self, enabled: bool) -> Self {
        let mut s = self.clone();
        s.export_media = enabled;
        s
    }
    pub fn with_export_date_update(&self, enabled: bool) -> Self {
        let mut s = self.clone();
        s.update_export_date = enabled;
        s
    }
    pub fn with_gzip(&self, enabled: bool) -> Self {
        let mut s = self.clone();
        s.gzip = enabled;
        s
    }
    pub fn with_gpx_options(&self, options: GpxOptions) -> Self {
        let mut s = self.clone();
        s.gpx = options;
        s
    }
    /// Gzip compression is ignored when flate2 is not available
    fn extension(&self) -> String {
        if self.gzip && cfg!(feature = "flate2") {
            format!("{}.gz", GPX_EXTENSION)
        } else {
            GPX_EXTENSION.to_string()
        }
    }
}

/// Successful exports
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExportReport {
    /// Produced file, per track, in request order
    pub files: Vec<(TrackId, PathBuf)>,
}

/// Exports `tracks` sequentially. A failing track does not prevent
/// the next ones: all failures are reported at once, in a
/// [BatchError]. Cancellation interrupts the whole batch.
pub fn export_tracks(
    store: &TrackStore,
    tracks: &[TrackId],
    config: &ExportConfig,
    progress: &ProgressSender,
    cancel: &CancelToken,
) -> Result<ExportReport, Error> {
    config.gpx.validate()?;
    let mut report = ExportReport::default();
    let mut failures = Vec::<(TrackId, Error)>::new();

    for track in tracks {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        match export_track(store, *track, config, progress, cancel) {
            Ok(path) => report.files.push((*track, path)),
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => {
                error!("track #{} export failed: {}", track, e);
                failures.push((*track, e));
            },
        }
    }

    if failures.is_empty() {
        Ok(report)
    } else {
        Err(BatchError { failures }.into())
    }
}

/// Resolves (and creates) the directory that receives this track
fn output_directory(
    store: &TrackStore,
    track: TrackId,
    config: &ExportConfig,
) -> Result<(PathBuf, bool), Error> {
    let base = &config.base_directory;
    if !base.exists() {
        std::fs::create_dir_all(base).map_err(|source| Error::DirectoryCreationFailed {
            path: base.clone(),
            source,
        })?;
    }
    if !base.is_dir() {
        return Err(Error::DirectoryNotWritable(base.clone()));
    }
    // mode bits do not tell whether this process may write there
    if let Err(e) = tempfile::tempfile_in(base) {
        debug!("\"{}\" write test failed: {}", base.display(), e);
        return Err(Error::DirectoryNotWritable(base.clone()));
    }
    if !config.directory_per_track {
        return Ok((base.clone(), false));
    }
    let name = track_directory_name(&store.track(track)?, base);
    let directory = base.join(name);
    std::fs::create_dir(&directory).map_err(|source| Error::DirectoryCreationFailed {
        path: directory.clone(),
        source,
    })?;
    Ok((directory, true))
}

/// Removes what a failed export produced
fn discard(gpx: &Path, directory: Option<&Path>) {
    if let Err(e) = std::fs::remove_file(gpx) {
        debug!("failed to remove \"{}\": {}", gpx.display(), e);
    }
    if let Some(directory) = directory {
        // only succeeds when nothing else lives there
        let _ = std::fs::remove_dir(directory);
    }
}

/// Streams the track into `writer`, then terminates the stream
fn write_gpx(
    store: &TrackStore,
    track: &Track,
    gpx: &GpxWriter,
    mut writer: BufferedWriter<File>,
    path: &Path,
) -> Result<(), Error> {
    let points = store.points_of(track.id, None)?;
    let way_points = store.way_points_of(track.id)?;
    gpx.format(&mut writer, track, points, &way_points)
        .map_err(|e| Error::from_formatting(path.to_path_buf(), e))?;
    writer.finish().map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Exports a single track. On failure nothing remains on disk
/// and the export date is left untouched.
pub fn export_track(
    store: &TrackStore,
    id: TrackId,
    config: &ExportConfig,
    progress: &ProgressSender,
    cancel: &CancelToken,
) -> Result<PathBuf, Error> {
    let track = store.track(id)?;
    config.gpx.validate()?;
    let (directory, created) = output_directory(store, id, config)?;
    let created = if created { Some(directory.as_path()) } else { None };

    let filename = gpx_filename(
        &track,
        config.filename_format,
        &directory,
        &config.extension(),
    );
    let path = directory.join(filename);

    let (points, way_points) = store.point_counts(id)?;
    progress.send(Progress::TrackStarted {
        track: id,
        points,
        way_points,
    });
    debug!(
        "track #{}: exporting {} points and {} waypoints to \"{}\"",
        id,
        points,
        way_points,
        path.display()
    );

    let fd = match File::create(&path) {
        Ok(fd) => fd,
        Err(source) => {
            if let Some(directory) = created {
                let _ = std::fs::remove_dir(directory);
            }
            return Err(Error::Write { path, source });
        },
    };

    #[cfg(feature = "flate2")]
    let writer = if config.gzip {
        BufferedWriter::gzip(fd, GZIP_COMPRESSION_LEVEL)
    } else {
        BufferedWriter::plain(fd)
    };
    #[cfg(not(feature = "flate2"))]
    let writer = BufferedWriter::plain(fd);

    let gpx = GpxWriter::new(config.gpx)
        .with_progress(progress.clone())
        .with_cancel_token(cancel.clone());

    let produced = write_gpx(store, &track, &gpx, writer, &path);

    if let Err(e) = produced {
        discard(&path, created);
        return Err(e);
    }

    if config.export_media {
        if let Some(media) = store.media() {
            let copy = copy_media(&media.track_directory(id), &directory);
            if !copy.is_complete() {
                copy.revert();
                discard(&path, created);
                return Err(Error::MediaCopyIncomplete {
                    track: id,
                    destination: directory,
                });
            }
        }
    }

    if config.update_export_date {
        store.mark_exported(id, store.clock().now())?;
    }

    info!("track #{} exported to \"{}\"", id, path.display());
    progress.send(Progress::TrackFinished {
        track: id,
        path: path.clone(),
    });
    Ok(path)
}

/// Export running on its own thread
pub type ExportHandle = JobHandle<ExportReport>;

/// Export job builder
#[derive(Debug, Clone)]
pub struct ExportJob {
    store: Arc<TrackStore>,
    tracks: Vec<TrackId>,
    config: ExportConfig,
}

impl ExportJob {
    pub fn new(store: Arc<TrackStore>, tracks: &[TrackId], config: ExportConfig) -> Self {
        Self {
            store,
            config,
            tracks: tracks.to_vec(),
        }
    }

    /// Starts the export on a worker thread
    pub fn spawn(self) -> ExportHandle {
        JobHandle::spawn(move |progress, cancel| {
            export_tracks(
                &self.store,
                &self.tracks,
                &self.config,
                &progress,
                &cancel,
            )
        })
    }
}
