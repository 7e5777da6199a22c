//! GPX 1.1 production and (GPX, KML) import
use chrono::{DateTime, Timelike, Utc};
use thiserror::Error;

use crate::error::ValidationError;

mod formatting;
mod parsing;

pub use formatting::GpxWriter;
pub use parsing::{GpxImporter, ImportEvent};

/// Default ratio between reported accuracy and HDOP
pub const DEFAULT_HDOP_FACTOR: f64 = 4.0;

pub(crate) const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" ?>";

pub(crate) const GPX_OPENING: &str = concat!(
    "<gpx xmlns=\"http://www.topografix.com/GPX/1/1\" version=\"1.1\"",
    " creator=\"tracklog - https://github.com/rtk-rs/tracklog\"",
    " xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\"",
    " xsi:schemaLocation=\"http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd\">"
);

#[derive(Error, Debug)]
pub enum OptionParsingError {
    #[error("unknown compass mode \"{0}\"")]
    CompassMode(String),
    #[error("unknown accuracy mode \"{0}\"")]
    AccuracyMode(String),
}

/// How compass readings are written
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum CompassMode {
    /// Not written
    #[default]
    None,
    /// Human readable, in the point `<cmt>`
    Comment,
    /// `<compass>` and `<compass_accuracy>` extensions
    Extension,
}

impl std::fmt::Display for CompassMode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Comment => write!(f, "comment"),
            Self::Extension => write!(f, "extension"),
        }
    }
}

impl std::str::FromStr for CompassMode {
    type Err = OptionParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "comment" | "cmt" => Ok(Self::Comment),
            "extension" | "ext" => Ok(Self::Extension),
            _ => Err(OptionParsingError::CompassMode(s.to_string())),
        }
    }
}

/// How waypoint accuracy is written
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum AccuracyMode {
    /// Not written
    #[default]
    None,
    /// Appended to the waypoint name, within parenthesis
    InName,
    /// In the waypoint `<cmt>`
    InComment,
}

impl std::fmt::Display for AccuracyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::InName => write!(f, "name"),
            Self::InComment => write!(f, "comment"),
        }
    }
}

impl std::str::FromStr for AccuracyMode {
    type Err = OptionParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "name" => Ok(Self::InName),
            "comment" | "cmt" => Ok(Self::InComment),
            _ => Err(OptionParsingError::AccuracyMode(s.to_string())),
        }
    }
}

/// GPX production options
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GpxOptions {
    /// Fill `<hdop>` with accuracy / [GpxOptions::hdop_factor]
    pub include_hdop_approximation: bool,
    pub hdop_factor: f64,
    pub compass_mode: CompassMode,
    pub accuracy_mode: AccuracyMode,
}

impl Default for GpxOptions {
    fn default() -> Self {
        Self {
            include_hdop_approximation: false,
            hdop_factor: DEFAULT_HDOP_FACTOR,
            compass_mode: CompassMode::default(),
            accuracy_mode: AccuracyMode::default(),
        }
    }
}

impl GpxOptions {
    /// Copies and enables HDOP approximation with given factor
    pub fn with_hdop(&self, factor: f64) -> Self {
        let mut s = *self;
        s.include_hdop_approximation = true;
        s.hdop_factor = factor;
        s
    }
    pub fn with_compass_mode(&self, mode: CompassMode) -> Self {
        let mut s = *self;
        s.compass_mode = mode;
        s
    }
    pub fn with_accuracy_mode(&self, mode: AccuracyMode) -> Self {
        let mut s = *self;
        s.accuracy_mode = mode;
        s
    }
    /// The HDOP factor is only considered when approximation is enabled
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.include_hdop_approximation {
            validate_hdop_factor(self.hdop_factor)?;
        }
        Ok(())
    }
}

/// Import options
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ImportOptions {
    /// When set, accuracy is recovered as `<hdop>` x factor
    /// for points that do not carry an `<accuracy>`.
    pub hdop_factor: Option<f64>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            hdop_factor: Some(DEFAULT_HDOP_FACTOR),
        }
    }
}

impl ImportOptions {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.hdop_factor {
            Some(factor) => validate_hdop_factor(factor),
            None => Ok(()),
        }
    }
}

/// HDOP factors divide (or multiply) accuracies
fn validate_hdop_factor(factor: f64) -> Result<(), ValidationError> {
    if factor.is_finite() && factor > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidHdopFactor(factor))
    }
}

/// Formats a float in shortest round trip form, always with a decimal point
pub(crate) fn fmt_float(value: f64) -> String {
    let s = value.to_string();
    if s.contains('.') || !value.is_finite() {
        s
    } else {
        format!("{}.0", s)
    }
}

/// Formats a timestamp as UTC ISO-8601, with milliseconds
/// only when there is a sub-second part.
pub(crate) fn fmt_time(t: &DateTime<Utc>) -> String {
    if t.nanosecond() == 0 {
        t.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    } else {
        t.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
    }
}

/// Protects free text with a CDATA section. A "]]>" sequence
/// within the text is split across two sections.
pub(crate) fn cdata(text: &str) -> String {
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}
