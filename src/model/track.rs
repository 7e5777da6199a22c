use chrono::{DateTime, Utc};
use itertools::Itertools;
use thiserror::Error;

use super::TrackId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Error, Debug)]
#[error("unknown visibility \"{0}\"")]
pub struct VisibilityParsingError(String);

/// Visibility of a track, once published
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Visibility {
    #[default]
    Private,
    Public,
    Trackable,
    Identifiable,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Private => write!(f, "private"),
            Self::Public => write!(f, "public"),
            Self::Trackable => write!(f, "trackable"),
            Self::Identifiable => write!(f, "identifiable"),
        }
    }
}

impl std::str::FromStr for Visibility {
    type Err = VisibilityParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "private" => Ok(Self::Private),
            "public" => Ok(Self::Public),
            "trackable" => Ok(Self::Trackable),
            "identifiable" => Ok(Self::Identifiable),
            _ => Err(VisibilityParsingError(s.to_string())),
        }
    }
}

/// A recording session, grouping ordered [super::TrackPoint]s
/// and [super::WayPoint]s.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Track {
    pub id: TrackId,
    /// Track name, may be empty
    pub name: String,
    pub description: String,
    /// Tags, in user order. Duplicates are tolerated here
    /// and only removed on production, see [Track::keywords].
    pub tags: Vec<String>,
    pub visibility: Visibility,
    pub start_date: DateTime<Utc>,
    /// Only one track may be active across a store
    pub active: bool,
    pub export_date: Option<DateTime<Utc>>,
    pub upload_date: Option<DateTime<Utc>>,
}

impl Track {
    /// Builds a new active [Track], started at `start_date`
    pub fn new(id: TrackId, start_date: DateTime<Utc>) -> Self {
        Self {
            id,
            start_date,
            active: true,
            name: String::new(),
            description: String::new(),
            tags: Vec::new(),
            visibility: Visibility::default(),
            export_date: None,
            upload_date: None,
        }
    }

    /// Returns true if this track was given a (non blank) name
    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// Trimmed, non empty and deduplicated tags, in user order
    pub fn keywords(&self) -> impl Iterator<Item = &str> + '_ {
        self.tags
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .unique()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;
    #[test]
    fn visibility_parsing() {
        for (desc, expected) in [
            ("private", Visibility::Private),
            ("Public", Visibility::Public),
            (" trackable ", Visibility::Trackable),
            ("IDENTIFIABLE", Visibility::Identifiable),
        ] {
            let visibility = Visibility::from_str(desc).unwrap();
            assert_eq!(visibility, expected);
            let formatted = visibility.to_string();
            assert_eq!(Visibility::from_str(&formatted).unwrap(), visibility);
        }
        assert!(Visibility::from_str("friends").is_err());
    }
    #[test]
    fn keywords_are_deduplicated() {
        let mut track = Track::new(TrackId(1), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        track.tags = vec![
            "hiking".to_string(),
            " alps".to_string(),
            "hiking ".to_string(),
            "".to_string(),
            "snow".to_string(),
        ];
        let keywords = track.keywords().collect::<Vec<_>>();
        assert_eq!(keywords, vec!["hiking", "alps", "snow"]);
    }
}
