//! Track media files (photos, voice records)
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::{
    filename::{format_date, unique_child_name},
    model::TrackId,
};

/// Kind of media a waypoint may link to
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    VoiceRecord,
}

impl MediaKind {
    /// File extension, including the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Photo => ".jpg",
            Self::VoiceRecord => ".3gpp",
        }
    }
}

/// Layout of the private (per track) media directories.
/// Media directories are not user configurable: they all live
/// under one root, named after the track id.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaLayout {
    root: PathBuf,
}

impl MediaLayout {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Media directory of this track
    pub fn track_directory(&self, track: TrackId) -> PathBuf {
        self.root.join(format!("track{}", track))
    }

    /// Returns a free filename for a new media of this track,
    /// named after the capture time.
    pub fn media_name(&self, track: TrackId, kind: MediaKind, time: &DateTime<Utc>) -> String {
        unique_child_name(
            &self.track_directory(track),
            &format_date(time),
            kind.extension(),
        )
    }
}

/// Outcome of a media copy
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MediaCopy {
    /// Files created in the destination
    pub copied: Vec<PathBuf>,
    /// Entries that could not be copied
    pub failed: Vec<PathBuf>,
}

impl MediaCopy {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Removes every file this copy created
    pub fn revert(&self) {
        for target in self.copied.iter() {
            if let Err(e) = std::fs::remove_file(target) {
                warn!("failed to remove \"{}\": {}", target.display(), e);
            }
        }
    }
}

/// Copies every regular file of `source` into `destination`
/// (sub directories are not considered) and reports what was copied.
/// Best effort: failures are logged and do not stop the following files.
/// A missing `source` means there is nothing to copy.
pub fn copy_media(source: &Path, destination: &Path) -> MediaCopy {
    let mut report = MediaCopy::default();
    if !source.is_dir() {
        debug!("no media directory \"{}\"", source.display());
        return report;
    }
    if !destination.is_dir() {
        warn!(
            "unable to copy media: \"{}\" is not a directory",
            destination.display()
        );
        report.failed.push(destination.to_path_buf());
        return report;
    }

    let entries = match source.read_dir() {
        Ok(entries) => entries,
        Err(e) => {
            warn!("failed to list \"{}\": {}", source.display(), e);
            report.failed.push(source.to_path_buf());
            return report;
        },
    };

    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!("failed to list \"{}\": {}", source.display(), e);
                report.failed.push(source.to_path_buf());
                continue;
            },
        };
        if !path.is_file() {
            continue;
        }
        let Some(filename) = path.file_name() else {
            continue;
        };
        let target = destination.join(filename);
        match std::fs::copy(&path, &target) {
            Ok(_) => {
                debug!("copied \"{}\" to \"{}\"", path.display(), target.display());
                report.copied.push(target);
            },
            Err(e) => {
                warn!(
                    "failed to copy \"{}\" to \"{}\": {}",
                    path.display(),
                    destination.display(),
                    e
                );
                report.failed.push(path);
            },
        }
    }

    if report.is_complete() {
        info!(
            "media copied from \"{}\" to \"{}\"",
            source.display(),
            destination.display()
        );
    } else {
        warn!("{} media file(s) could not be copied", report.failed.len());
    }
    report
}

/// Copies every regular file of `source` into `destination`.
/// Returns true if all files were copied. See [copy_media].
pub fn copy_all(source: &Path, destination: &Path) -> bool {
    copy_media(source, destination).is_complete()
}
