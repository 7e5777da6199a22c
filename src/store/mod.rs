//! Track repository
use log::{debug, warn};
use std::{
    collections::BTreeMap,
    path::Path,
    sync::{mpsc::Receiver, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use chrono::{DateTime, Utc};

use crate::{
    clock::{Clock, SystemClock},
    error::{Error, ValidationError},
    filename::format_date,
    media::MediaLayout,
    model::{Location, PointId, SensorReading, Track, TrackId, TrackPoint, Visibility, WayPoint},
};

mod change;
pub use change::{Change, ChangeSet};
use change::Observers;

#[cfg(feature = "serde")]
mod snapshot;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of tries when renaming a media file onto an already used name
const MAX_RENAME_ATTEMPTS: usize = 20;

/// Ordered, restartable sequence of [TrackPoint]s. Restart it by
/// querying again with the id of the last point seen as watermark.
pub type TrackPoints = std::vec::IntoIter<TrackPoint>;

/// Waypoint attributes, next to its [Location]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WayPointInput {
    pub name: String,
    /// Media filename, within the track media directory
    pub link: Option<String>,
    pub uuid: Option<String>,
}

impl WayPointInput {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
    pub fn with_link(&self, link: &str) -> Self {
        let mut s = self.clone();
        s.link = Some(link.to_string());
        s
    }
    pub fn with_uuid(&self, uuid: &str) -> Self {
        let mut s = self.clone();
        s.uuid = Some(uuid.to_string());
        s
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
struct TrackRecord {
    track: Track,
    points: Vec<TrackPoint>,
    way_points: Vec<WayPoint>,
}

#[derive(Debug, Clone, Default)]
struct Inner {
    next_track: u64,
    next_point: u64,
    records: BTreeMap<TrackId, TrackRecord>,
}

impl Inner {
    fn record(&self, id: TrackId) -> Result<&TrackRecord, Error> {
        self.records.get(&id).ok_or(Error::UnknownTrack(id))
    }
    fn record_mut(&mut self, id: TrackId) -> Result<&mut TrackRecord, Error> {
        self.records.get_mut(&id).ok_or(Error::UnknownTrack(id))
    }
    fn track_mut(&mut self, id: TrackId) -> Result<&mut Track, Error> {
        Ok(&mut self.record_mut(id)?.track)
    }
    fn next_point_id(&mut self) -> PointId {
        self.next_point += 1;
        PointId(self.next_point)
    }
    /// Deactivates the active track, if any
    fn deactivate_all(&mut self, changes: &mut ChangeSet) {
        for (id, record) in self.records.iter_mut() {
            if record.track.active {
                record.track.active = false;
                changes.push(Change::TrackDeactivated(*id));
            }
        }
    }
    fn way_point_mut(&mut self, uuid: &str) -> Option<&mut WayPoint> {
        self.records
            .values_mut()
            .flat_map(|record| record.way_points.iter_mut())
            .find(|wpt| wpt.uuid.as_deref() == Some(uuid))
    }
}

/// [TrackStore] holds [Track]s and their points.
/// All mutations are serialized, which maintains the single active
/// track invariant. Readers of a track being recorded should use the
/// point id watermark (see [TrackStore::points_of]) rather than
/// expecting a frozen track.
pub struct TrackStore {
    inner: RwLock<Inner>,
    clock: Box<dyn Clock>,
    media: Option<MediaLayout>,
    observers: Observers,
}

impl std::fmt::Debug for TrackStore {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("TrackStore")
            .field("inner", &self.inner)
            .field("media", &self.media)
            .finish()
    }
}

impl Default for TrackStore {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl TrackStore {
    /// Builds an empty [TrackStore] that timestamps with given [Clock]
    pub fn new<C: Clock + 'static>(clock: C) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            clock: Box::new(clock),
            media: None,
            observers: Observers::default(),
        }
    }

    /// Attaches the private media directories layout. Waypoint media
    /// get renamed on insertion, and are deleted with their track.
    pub fn with_media(mut self, layout: MediaLayout) -> Self {
        self.media = Some(layout);
        self
    }

    pub fn media(&self) -> Option<&MediaLayout> {
        self.media.as_ref()
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Subscribes to all future modifications
    pub fn subscribe(&self) -> Receiver<ChangeSet> {
        self.observers.subscribe()
    }

    /// Starts a new track. The currently active track (if any)
    /// is deactivated, the new one is active.
    pub fn create_track(&self) -> TrackId {
        let mut changes = ChangeSet::new();
        let id = {
            let mut inner = self.write();
            inner.deactivate_all(&mut changes);
            inner.next_track += 1;
            let id = TrackId(inner.next_track);
            let track = Track::new(id, self.clock.now());
            inner.records.insert(
                id,
                TrackRecord {
                    track,
                    points: Vec::new(),
                    way_points: Vec::new(),
                },
            );
            id
        };
        debug!("track #{} created", id);
        changes.push(Change::TrackCreated(id));
        changes.push(Change::TrackActivated(id));
        self.observers.notify(changes);
        id
    }

    /// Makes `id` the active track, deactivating the current one
    pub fn set_active(&self, id: TrackId) -> Result<(), Error> {
        let mut changes = ChangeSet::new();
        {
            let mut inner = self.write();
            inner.record(id)?;
            inner.deactivate_all(&mut changes);
            inner.track_mut(id)?.active = true;
        }
        changes.retain(|change| *change != Change::TrackDeactivated(id));
        changes.push(Change::TrackActivated(id));
        self.observers.notify(changes);
        Ok(())
    }

    /// Deactivates `id`. No-op if already inactive.
    pub fn stop_tracking(&self, id: TrackId) -> Result<(), Error> {
        let stopped = {
            let mut inner = self.write();
            let track = inner.track_mut(id)?;
            let active = track.active;
            track.active = false;
            active
        };
        if stopped {
            debug!("track #{} stopped", id);
            self.observers.notify(vec![Change::TrackDeactivated(id)]);
        }
        Ok(())
    }

    /// Returns the active track, if any
    pub fn active_track(&self) -> Option<TrackId> {
        self.read()
            .records
            .values()
            .map(|record| &record.track)
            .find(|track| track.active)
            .map(|track| track.id)
    }

    pub fn track(&self, id: TrackId) -> Result<Track, Error> {
        Ok(self.read().record(id)?.track.clone())
    }

    /// All tracks, by increasing id
    pub fn tracks(&self) -> Vec<Track> {
        self.read()
            .records
            .values()
            .map(|record| record.track.clone())
            .collect()
    }

    fn update_track<F: FnOnce(&mut Track)>(&self, id: TrackId, f: F) -> Result<(), Error> {
        {
            let mut inner = self.write();
            f(inner.track_mut(id)?);
        }
        self.observers.notify(vec![Change::TrackUpdated(id)]);
        Ok(())
    }

    pub fn rename(&self, id: TrackId, name: &str) -> Result<(), Error> {
        self.update_track(id, |track| track.name = name.to_string())
    }

    pub fn describe(&self, id: TrackId, description: &str) -> Result<(), Error> {
        self.update_track(id, |track| track.description = description.to_string())
    }

    pub fn set_tags(&self, id: TrackId, tags: &[&str]) -> Result<(), Error> {
        self.update_track(id, |track| {
            track.tags = tags.iter().map(|tag| tag.to_string()).collect()
        })
    }

    pub fn set_visibility(&self, id: TrackId, visibility: Visibility) -> Result<(), Error> {
        self.update_track(id, |track| track.visibility = visibility)
    }

    /// Records a successful export
    pub fn mark_exported(&self, id: TrackId, date: DateTime<Utc>) -> Result<(), Error> {
        self.update_track(id, |track| track.export_date = Some(date))
    }

    /// Records a successful upload
    pub fn mark_uploaded(&self, id: TrackId, date: DateTime<Utc>) -> Result<(), Error> {
        self.update_track(id, |track| track.upload_date = Some(date))
    }

    /// Deletes a track, its points, waypoints and media directory
    pub fn delete_track(&self, id: TrackId) -> Result<(), Error> {
        {
            let mut inner = self.write();
            inner.record(id)?;
            inner.records.remove(&id);
        }
        if let Some(media) = &self.media {
            let dir = media.track_directory(id);
            if dir.exists() {
                if let Err(e) = std::fs::remove_dir_all(&dir) {
                    warn!("failed to delete \"{}\": {}", dir.display(), e);
                }
            }
        }
        debug!("track #{} deleted", id);
        self.observers.notify(vec![Change::TrackDeleted(id)]);
        Ok(())
    }

    /// Stores a new [TrackPoint]. Fails if `location` is missing:
    /// a point is never silently dropped.
    pub fn insert_track_point(
        &self,
        track: TrackId,
        location: Option<&Location>,
        sensors: SensorReading,
    ) -> Result<PointId, Error> {
        self.insert_segment_point(track, location, sensors, false)
    }

    /// Stores a new [TrackPoint], that may open a new segment
    pub fn insert_segment_point(
        &self,
        track: TrackId,
        location: Option<&Location>,
        sensors: SensorReading,
        new_segment: bool,
    ) -> Result<PointId, Error> {
        let location = location.ok_or(ValidationError::MissingLocation)?;
        let sensors = sensors.sanitized();
        let timestamp = location.time.unwrap_or_else(|| self.clock.now());
        let id = {
            let mut inner = self.write();
            inner.record(track)?;
            let id = inner.next_point_id();
            inner.record_mut(track)?.points.push(TrackPoint {
                id,
                track,
                timestamp,
                new_segment,
                latitude: location.latitude,
                longitude: location.longitude,
                elevation: location.elevation,
                accuracy: location.accuracy,
                speed: location.speed,
                compass_heading: sensors.compass_heading,
                compass_accuracy: sensors.compass_accuracy,
                pressure: sensors.pressure,
            });
            id
        };
        self.observers
            .notify(vec![Change::TrackPointInserted { track, point: id }]);
        Ok(id)
    }

    /// Stores a new [WayPoint]. Fails if `location` is missing.
    /// A linked media file, when found in the track media directory,
    /// is renamed after the waypoint timestamp.
    pub fn insert_way_point(
        &self,
        track: TrackId,
        location: Option<&Location>,
        input: WayPointInput,
        sensors: SensorReading,
    ) -> Result<PointId, Error> {
        let location = location.ok_or(ValidationError::MissingLocation)?;
        let sensors = sensors.sanitized();
        let timestamp = location.time.unwrap_or_else(|| self.clock.now());
        debug!(
            "waypoint \"{}\" (track #{}, uuid={:?}, link={:?})",
            input.name, track, input.uuid, input.link
        );
        let id = {
            let mut inner = self.write();
            inner.record(track)?;
            if let Some(uuid) = &input.uuid {
                if inner.way_point_mut(uuid).is_some() {
                    return Err(ValidationError::DuplicateUuid(uuid.clone()).into());
                }
            }
            let link = input
                .link
                .map(|link| self.rename_media(track, &link, &timestamp));
            let id = inner.next_point_id();
            inner.record_mut(track)?.way_points.push(WayPoint {
                id,
                track,
                timestamp,
                link,
                name: input.name,
                uuid: input.uuid,
                latitude: location.latitude,
                longitude: location.longitude,
                elevation: location.elevation,
                accuracy: location.accuracy,
                satellites: location.satellites,
                compass_heading: sensors.compass_heading,
                compass_accuracy: sensors.compass_accuracy,
                pressure: sensors.pressure,
            });
            id
        };
        self.observers
            .notify(vec![Change::WayPointInserted { track, point: id }]);
        Ok(id)
    }

    /// Renames media `from` (within the track media directory)
    /// after `time`, keeping its extension. Returns the new name,
    /// or `from` when the file could not be found or renamed.
    fn rename_media(&self, track: TrackId, from: &str, time: &DateTime<Utc>) -> String {
        let Some(media) = &self.media else {
            return from.to_string();
        };
        let dir = media.track_directory(track);
        let origin = dir.join(from);
        if !origin.is_file() {
            return from.to_string();
        }
        let extension = Path::new(from)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let stem = format_date(time);

        let mut target = format!("{}{}", stem, extension);
        let mut attempt = 0;
        while dir.join(&target).exists() {
            if attempt == MAX_RENAME_ATTEMPTS {
                warn!("no free name for media \"{}\"", origin.display());
                return from.to_string();
            }
            target = format!("{}{}{}", stem, attempt, extension);
            attempt += 1;
        }
        match std::fs::rename(&origin, dir.join(&target)) {
            Ok(_) => target,
            Err(e) => {
                warn!("failed to rename \"{}\": {}", origin.display(), e);
                from.to_string()
            },
        }
    }

    /// Updates a waypoint name and/or link
    pub fn update_way_point(
        &self,
        uuid: &str,
        name: Option<&str>,
        link: Option<&str>,
    ) -> Result<(), Error> {
        let track = {
            let mut inner = self.write();
            let wpt = inner
                .way_point_mut(uuid)
                .ok_or_else(|| Error::UnknownWayPoint(uuid.to_string()))?;
            if let Some(name) = name {
                wpt.name = name.to_string();
            }
            if let Some(link) = link {
                wpt.link = Some(link.to_string());
            }
            wpt.track
        };
        self.observers.notify(vec![Change::WayPointUpdated {
            track,
            uuid: uuid.to_string(),
        }]);
        Ok(())
    }

    pub fn delete_way_point(&self, uuid: &str) -> Result<(), Error> {
        let track = {
            let mut inner = self.write();
            let mut found = None;
            for record in inner.records.values_mut() {
                if let Some(pos) = record
                    .way_points
                    .iter()
                    .position(|wpt| wpt.uuid.as_deref() == Some(uuid))
                {
                    found = Some(record.way_points.remove(pos).track);
                    break;
                }
            }
            found.ok_or_else(|| Error::UnknownWayPoint(uuid.to_string()))?
        };
        self.observers.notify(vec![Change::WayPointDeleted {
            track,
            uuid: uuid.to_string(),
        }]);
        Ok(())
    }

    /// Returns the points of `track`, by increasing timestamp
    /// (insertion order on equal timestamps). With `since`, only points
    /// inserted after that watermark are returned.
    pub fn points_of(&self, track: TrackId, since: Option<PointId>) -> Result<TrackPoints, Error> {
        let mut points = self
            .read()
            .record(track)?
            .points
            .iter()
            .filter(|pt| since.map(|since| pt.id > since).unwrap_or(true))
            .cloned()
            .collect::<Vec<_>>();
        points.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(points.into_iter())
    }

    /// Returns the waypoints of `track`, by increasing timestamp
    pub fn way_points_of(&self, track: TrackId) -> Result<Vec<WayPoint>, Error> {
        let mut way_points = self.read().record(track)?.way_points.clone();
        way_points.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(way_points)
    }

    /// Returns (track points, waypoints) counts
    pub fn point_counts(&self, track: TrackId) -> Result<(u64, u64), Error> {
        let inner = self.read();
        let record = inner.record(track)?;
        Ok((record.points.len() as u64, record.way_points.len() as u64))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;

    fn store() -> TrackStore {
        TrackStore::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
        ))
    }

    #[test]
    fn create_deactivates_previous() {
        let store = store();
        let a = store.create_track();
        assert_eq!(store.active_track(), Some(a));
        let b = store.create_track();
        assert_eq!(store.active_track(), Some(b));
        assert!(!store.track(a).unwrap().active);
        assert!(store.track(b).unwrap().active);
    }

    #[test]
    fn stop_tracking_is_idempotent() {
        let store = store();
        let a = store.create_track();
        store.stop_tracking(a).unwrap();
        store.stop_tracking(a).unwrap();
        assert_eq!(store.active_track(), None);
        assert!(matches!(
            store.stop_tracking(TrackId(99)),
            Err(Error::UnknownTrack(TrackId(99)))
        ));
    }

    #[test]
    fn missing_location() {
        let store = store();
        let a = store.create_track();
        let err = store
            .insert_track_point(a, None, SensorReading::default())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::MissingLocation)
        ));
        let err = store
            .insert_way_point(a, None, WayPointInput::named("x"), SensorReading::default())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::MissingLocation)
        ));
        assert_eq!(store.point_counts(a).unwrap(), (0, 0));
    }

    #[test]
    fn clock_fallback() {
        let store = store();
        let a = store.create_track();
        store
            .insert_track_point(a, Some(&Location::new(1.0, 2.0)), SensorReading::default())
            .unwrap();
        let point = store.points_of(a, None).unwrap().next().unwrap();
        assert_eq!(
            point.timestamp,
            Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
        );
    }
}
