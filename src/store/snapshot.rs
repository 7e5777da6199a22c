//! JSON persistence of a [TrackStore]
use log::info;
use serde::{Deserialize, Serialize};
use std::{fs::File, path::Path};

use super::{Inner, Observers, TrackRecord, TrackStore};
use crate::{
    clock::Clock,
    error::Error,
    reader::BufferedReader,
    writer::BufferedWriter,
};

#[derive(Serialize, Deserialize)]
struct Snapshot {
    next_track: u64,
    next_point: u64,
    records: Vec<TrackRecord>,
}

impl TrackStore {
    /// Dumps this store to `path` as JSON.
    /// Paths ending with ".gz" are gzip compressed (requires flate2).
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        let snapshot = {
            let inner = self.read();
            Snapshot {
                next_track: inner.next_track,
                next_point: inner.next_point,
                records: inner.records.values().cloned().collect(),
            }
        };
        let fd = File::create(path).map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })?;
        let gzip = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("gz"))
            .unwrap_or(false);

        #[cfg(feature = "flate2")]
        let mut writer = if gzip {
            BufferedWriter::gzip(fd, 6)
        } else {
            BufferedWriter::plain(fd)
        };
        #[cfg(not(feature = "flate2"))]
        let mut writer = {
            if gzip {
                log::warn!("flate2 feature disabled: \"{}\" stored uncompressed", path.display());
            }
            BufferedWriter::plain(fd)
        };

        serde_json::to_writer(&mut writer, &snapshot)?;
        writer.finish().map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!("store saved to \"{}\"", path.display());
        Ok(())
    }

    /// Restores a store previously dumped with [TrackStore::save]
    pub fn load<P: AsRef<Path>, C: Clock + 'static>(path: P, clock: C) -> Result<Self, Error> {
        let path = path.as_ref();
        let reader = BufferedReader::from_path(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot: Snapshot = serde_json::from_reader(reader)?;
        let inner = Inner {
            next_track: snapshot.next_track,
            next_point: snapshot.next_point,
            records: snapshot
                .records
                .into_iter()
                .map(|record| (record.track.id, record))
                .collect(),
        };
        Ok(Self {
            inner: std::sync::RwLock::new(inner),
            clock: Box::new(clock),
            media: None,
            observers: Observers::default(),
        })
    }
}
