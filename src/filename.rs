//! Collision free file and directory naming
use chrono::{DateTime, Utc};
use regex::Regex;
use std::path::Path;
use thiserror::Error;

use crate::model::Track;

/// GPX file extension
pub const GPX_EXTENSION: &str = ".gpx";

/// Timestamp format used in GPX and media filenames
pub const FILENAME_DATE_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

lazy_static! {
    /// Characters replaced in user provided names:
    /// (space) ' " / \ * ? ~ @ < >
    static ref FILENAME_BLACKLIST: Regex = Regex::new(r#"[ '"/\\*?~@<>]"#).unwrap();
}

#[derive(Error, Debug)]
#[error("unknown filename format \"{0}\"")]
pub struct FilenameFormatError(String);

/// Describes how a GPX filename is composed from the track attributes
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum FilenameFormat {
    /// Track name only
    NameOnly,
    /// Track name, followed by its start date
    #[default]
    NameThenDate,
    /// Track start date only
    DateOnly,
}

impl std::fmt::Display for FilenameFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::NameOnly => write!(f, "name"),
            Self::NameThenDate => write!(f, "name_date"),
            Self::DateOnly => write!(f, "date"),
        }
    }
}

impl std::str::FromStr for FilenameFormat {
    type Err = FilenameFormatError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(Self::NameOnly),
            "name_date" | "name-date" => Ok(Self::NameThenDate),
            "date" => Ok(Self::DateOnly),
            _ => Err(FilenameFormatError(s.to_string())),
        }
    }
}

/// Replaces characters that are not welcome in filenames by '_'.
/// ':' is turned into ';' first.
pub fn sanitize(name: &str) -> String {
    let name = name.trim().replace(':', ";");
    FILENAME_BLACKLIST.replace_all(&name, "_").to_string()
}

/// Formats a date the way it appears in filenames (UTC)
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format(FILENAME_DATE_FORMAT).to_string()
}

/// Composes a filename stem. Falls back to the date
/// whenever the name is requested but empty.
pub fn compose(format: FilenameFormat, sanitized_name: &str, formatted_date: &str) -> String {
    let has_name = !sanitized_name.is_empty();
    match format {
        FilenameFormat::NameOnly if has_name => sanitized_name.to_string(),
        FilenameFormat::NameThenDate if has_name => {
            format!("{}_{}", sanitized_name, formatted_date)
        },
        _ => formatted_date.to_string(),
    }
}

/// Returns a child name that does not exist yet in `parent`.
/// Starts with `base` + `extension`, then inserts a serial number
/// (0, 1, 2..) right before the extension until a free name is found.
/// `extension` should be empty for directories.
///
/// This only checks the file system: two resolutions made without
/// creating the returned entry in between return the same name.
pub fn unique_child_name(parent: &Path, base: &str, extension: &str) -> String {
    let mut candidate = format!("{}{}", base, extension);
    let mut serial = 0u64;
    while parent.join(&candidate).exists() {
        candidate = format!("{}{}{}", base, serial, extension);
        serial += 1;
    }
    candidate
}

/// Unique GPX filename for this [Track] in `parent`
pub fn gpx_filename(track: &Track, format: FilenameFormat, parent: &Path, extension: &str) -> String {
    let stem = compose(format, &sanitize(&track.name), &format_date(&track.start_date));
    unique_child_name(parent, &stem, extension)
}

/// Unique directory name for this [Track] in `parent`: its sanitized
/// name, or its start date when unnamed.
pub fn track_directory_name(track: &Track, parent: &Path) -> String {
    let stem = compose(
        FilenameFormat::NameOnly,
        &sanitize(&track.name),
        &format_date(&track.start_date),
    );
    unique_child_name(parent, &stem, "")
}
