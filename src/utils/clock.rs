use chrono::{DateTime, Utc};

/// Represents an entity responsible for providing dates across application. This allows the
/// stopwatch to be driven by a fake clock during testing.
pub trait Clock: Sync + Send {
    fn time(&self) -> DateTime<Utc>;
}

pub struct DefaultClock;

impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
pub use manual::ManualClock;
