//! Time sources
use chrono::{DateTime, Utc};

/// "Current time" source consumed by the store and the export process.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// [Clock] backed by the system time
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// [Clock] that always returns the same instant
#[derive(Debug, Copy, Clone)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
