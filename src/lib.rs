#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

/*
 * tracklog: GPS track recording model, GPX production and import.
 * This library is shipped under the Mozilla Public License 2.0.
 */

#[macro_use]
extern crate lazy_static;

pub mod clock;
pub mod export;
pub mod filename;
pub mod gpx;
pub mod import;
pub mod job;
pub mod media;
pub mod model;
pub mod reader;
pub mod store;
pub mod writer;

mod error;

#[cfg(test)]
mod tests;

pub use error::{BatchError, Error, FormattingError, ParsingError, ValidationError};

/// Package to include all basic structures
pub mod prelude {
    pub use crate::{
        clock::{Clock, FixedClock, SystemClock},
        error::{BatchError, Error, FormattingError, ParsingError, ValidationError},
        export::{export_track, export_tracks, ExportConfig, ExportHandle, ExportJob, ExportReport},
        filename::FilenameFormat,
        gpx::{
            AccuracyMode, CompassMode, GpxImporter, GpxOptions, GpxWriter, ImportEvent,
            ImportOptions, DEFAULT_HDOP_FACTOR,
        },
        import::{import_file, import_into, ImportHandle, ImportJob, ImportSummary},
        job::{CancelToken, JobHandle, Progress, ProgressSender},
        media::{copy_all, copy_media, MediaCopy, MediaKind, MediaLayout},
        model::{
            Location, PointId, SensorReading, Track, TrackId, TrackPoint, Visibility, WayPoint,
        },
        store::{Change, ChangeSet, TrackStore, WayPointInput},
    };
    // pub re-export
    pub use chrono::{DateTime, Utc};
}
