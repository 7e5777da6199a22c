use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;

use crate::model::{PointId, TrackId};

/// Elementary modification of a [super::TrackStore]
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    TrackCreated(TrackId),
    TrackUpdated(TrackId),
    TrackActivated(TrackId),
    TrackDeactivated(TrackId),
    TrackDeleted(TrackId),
    TrackPointInserted { track: TrackId, point: PointId },
    WayPointInserted { track: TrackId, point: PointId },
    WayPointUpdated { track: TrackId, uuid: String },
    WayPointDeleted { track: TrackId, uuid: String },
}

/// All [Change]s caused by a single store operation
pub type ChangeSet = Vec<Change>;

/// Fans [ChangeSet]s out to all live subscribers
#[derive(Debug, Default)]
pub(crate) struct Observers(Mutex<Vec<Sender<ChangeSet>>>);

impl Observers {
    pub fn subscribe(&self) -> Receiver<ChangeSet> {
        let (tx, rx) = channel();
        let mut senders = self.0.lock().unwrap_or_else(|e| e.into_inner());
        senders.push(tx);
        rx
    }
    /// Notifies all subscribers, forgets the ones that hung up
    pub fn notify(&self, changes: ChangeSet) {
        if changes.is_empty() {
            return;
        }
        let mut senders = self.0.lock().unwrap_or_else(|e| e.into_inner());
        senders.retain(|tx| tx.send(changes.clone()).is_ok());
    }
}
