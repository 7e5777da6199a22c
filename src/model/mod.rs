//! Track data model
mod point;
mod track;

pub use point::{Location, SensorReading, TrackPoint, WayPoint};
pub use track::{Track, Visibility, VisibilityParsingError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifies a [Track] within a [crate::store::TrackStore]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackId(pub u64);

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TrackId {
    type Err = std::num::ParseIntError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse::<u64>()?))
    }
}

/// Insertion identity of a [TrackPoint] or [WayPoint].
/// Allocated from a single increasing sequence, it serves as
/// watermark when reading a track that is still being recorded.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointId(pub u64);

impl std::fmt::Display for PointId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
