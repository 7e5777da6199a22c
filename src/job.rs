//! Background job plumbing: progress reports and cooperative cancellation
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{channel, Receiver, Sender},
        Arc,
    },
    thread::JoinHandle,
};

use crate::{error::Error, model::TrackId};

/// Cooperative cancellation flag, shared between a job and its owner.
/// Jobs check it between points and between tracks.
#[derive(Debug, Default, Clone)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }
    /// Requests cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress reports emitted by export and import jobs
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    /// A track is about to be produced
    TrackStarted {
        track: TrackId,
        points: u64,
        way_points: u64,
    },
    /// Number of points processed since previous report
    Advanced(u64),
    /// Track has been produced into given file
    TrackFinished { track: TrackId, path: PathBuf },
}

/// Progress sink. Reports are dropped once the receiving end
/// went away: a job never fails because nobody listens.
#[derive(Debug, Clone, Default)]
pub struct ProgressSender(Option<Sender<Progress>>);

impl ProgressSender {
    pub fn new(tx: Sender<Progress>) -> Self {
        Self(Some(tx))
    }
    /// Sink that discards all reports
    pub fn none() -> Self {
        Self(None)
    }
    pub fn send(&self, progress: Progress) {
        if let Some(tx) = &self.0 {
            let _ = tx.send(progress);
        }
    }
}

/// Handle on a job running on its own thread
#[derive(Debug)]
pub struct JobHandle<T> {
    /// Progress reports, until the job terminates
    pub progress: Receiver<Progress>,
    cancel: CancelToken,
    handle: JoinHandle<Result<T, Error>>,
}

impl<T: Send + 'static> JobHandle<T> {
    /// Runs `job` on a new thread
    pub(crate) fn spawn<F>(job: F) -> Self
    where
        F: FnOnce(ProgressSender, CancelToken) -> Result<T, Error> + Send + 'static,
    {
        let (tx, progress) = channel();
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let handle = std::thread::spawn(move || job(ProgressSender::new(tx), token));
        Self {
            progress,
            cancel,
            handle,
        }
    }

    /// Requests cancellation. The job stops at the next point.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the terminal result
    pub fn join(self) -> Result<T, Error> {
        match self.handle.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}
