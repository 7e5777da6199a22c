use std::path::PathBuf;
use thiserror::Error;

use crate::model::TrackId;

/// Errors that may rise when reading a GPX (or KML) document.
/// Only structural failures are reported here: malformed field values
/// are recovered locally and never abort the import.
#[derive(Error, Debug)]
pub enum ParsingError {
    /// Document could not be tokenized
    #[error("malformed xml at byte {position}: {source}")]
    Xml {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },
    /// Document ends within an open element
    #[error("unexpected end of document")]
    UnexpectedEof,
    /// Document holds no element at all
    #[error("document has no root element")]
    MissingRoot,
    /// Underlying stream failure
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that may rise in GPX formatting process
#[derive(Error, Debug)]
pub enum FormattingError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Options rejected before anything is written
    #[error("invalid options: {0}")]
    Options(#[from] ValidationError),
    /// Production interrupted by [crate::job::CancelToken]
    #[error("cancelled")]
    Cancelled,
}

/// Rejected store input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("point has no location")]
    MissingLocation,
    #[error("waypoint uuid \"{0}\" is already in use")]
    DuplicateUuid(String),
    #[error("hdop factor must be a positive number, got {0}")]
    InvalidHdopFactor(f64),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("directory \"{0}\" is not writable")]
    DirectoryNotWritable(PathBuf),
    #[error("failed to create directory \"{path}\": {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write \"{path}\": {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read \"{path}\": {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("import failed: {0}")]
    Parse(#[from] ParsingError),
    #[error("unknown track #{0}")]
    UnknownTrack(TrackId),
    #[error("unknown waypoint \"{0}\"")]
    UnknownWayPoint(String),
    #[error("media files of track #{track} could not all be copied to \"{destination}\"")]
    MediaCopyIncomplete { track: TrackId, destination: PathBuf },
    #[error("cancelled")]
    Cancelled,
    #[error("{0}")]
    Batch(#[from] BatchError),
    #[cfg(feature = "serde")]
    #[error("store snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl Error {
    /// Wraps a [FormattingError] that occurred while producing `path`.
    pub(crate) fn from_formatting(path: PathBuf, e: FormattingError) -> Self {
        match e {
            FormattingError::Io(source) => Self::Write { path, source },
            FormattingError::Options(e) => Self::Validation(e),
            FormattingError::Cancelled => Self::Cancelled,
        }
    }
}

/// Every track that failed within a multi track export.
/// Displays the first cause, followed by the number of other failures.
#[derive(Error, Debug)]
pub struct BatchError {
    pub failures: Vec<(TrackId, Error)>,
}

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.failures.first() {
            Some((track, e)) => {
                write!(f, "track #{}: {}", track, e)?;
                if self.failures.len() > 1 {
                    write!(f, " (and {} other failure(s))", self.failures.len() - 1)?;
                }
                Ok(())
            },
            None => write!(f, "no failure"),
        }
    }
}
