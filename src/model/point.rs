use chrono::{DateTime, Utc};

use super::{PointId, TrackId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Valid compass azimuth range, in degrees: [min, max[
const AZIMUTH_RANGE: (f64, f64) = (0.0, 360.0);

/// Position fix, as handed over by the location source (or the importer).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Altitude in meters
    pub elevation: Option<f64>,
    /// Horizontal accuracy in meters
    pub accuracy: Option<f64>,
    /// Speed in m/s
    pub speed: Option<f64>,
    /// Fix time. The store clock is used when missing.
    pub time: Option<DateTime<Utc>>,
    /// Number of satellites used in the fix
    pub satellites: Option<u32>,
}

impl Location {
    /// Builds a [Location] from decimal degrees
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            ..Default::default()
        }
    }
    pub fn with_elevation(&self, elevation: f64) -> Self {
        let mut s = self.clone();
        s.elevation = Some(elevation);
        s
    }
    pub fn with_accuracy(&self, accuracy: f64) -> Self {
        let mut s = self.clone();
        s.accuracy = Some(accuracy);
        s
    }
    pub fn with_speed(&self, speed: f64) -> Self {
        let mut s = self.clone();
        s.speed = Some(speed);
        s
    }
    pub fn with_time(&self, time: DateTime<Utc>) -> Self {
        let mut s = self.clone();
        s.time = Some(time);
        s
    }
    pub fn with_satellites(&self, satellites: u32) -> Self {
        let mut s = self.clone();
        s.satellites = Some(satellites);
        s
    }
}

/// Sensor readings attached to a point
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct SensorReading {
    /// Compass azimuth in degrees
    pub compass_heading: Option<f64>,
    /// Compass sensor accuracy class
    pub compass_accuracy: Option<i32>,
    /// Atmospheric pressure in hPa
    pub pressure: Option<f64>,
}

impl SensorReading {
    pub fn with_compass(&self, heading: f64, accuracy: i32) -> Self {
        let mut s = *self;
        s.compass_heading = Some(heading);
        s.compass_accuracy = Some(accuracy);
        s
    }
    pub fn with_pressure(&self, pressure: f64) -> Self {
        let mut s = *self;
        s.pressure = Some(pressure);
        s
    }
    /// Drops readings that carry no information:
    /// an azimuth outside [0, 360[ (accuracy is dropped along)
    /// and a null pressure.
    pub(crate) fn sanitized(&self) -> Self {
        let mut s = *self;
        match s.compass_heading {
            Some(heading) if heading >= AZIMUTH_RANGE.0 && heading < AZIMUTH_RANGE.1 => {},
            _ => {
                s.compass_heading = None;
                s.compass_accuracy = None;
            },
        }
        if s.pressure == Some(0.0) {
            s.pressure = None;
        }
        s
    }
}

/// Automatically logged position sample. Immutable once stored.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackPoint {
    pub id: PointId,
    pub track: TrackId,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
    pub accuracy: Option<f64>,
    pub speed: Option<f64>,
    pub timestamp: DateTime<Utc>,
    pub compass_heading: Option<f64>,
    pub compass_accuracy: Option<i32>,
    pub pressure: Option<f64>,
    /// True when this point opens a new polyline (imported segments)
    pub new_segment: bool,
}

/// User (or event) triggered named point,
/// optionally linked to a media file of the track.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WayPoint {
    pub id: PointId,
    pub track: TrackId,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
    pub accuracy: Option<f64>,
    pub timestamp: DateTime<Utc>,
    pub compass_heading: Option<f64>,
    pub compass_accuracy: Option<i32>,
    pub pressure: Option<f64>,
    pub name: String,
    /// Media filename, relative to the track media directory
    pub link: Option<String>,
    /// Caller assigned identity, used for later update/deletion
    pub uuid: Option<String>,
    pub satellites: Option<u32>,
}
