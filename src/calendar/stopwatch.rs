use chrono::{DateTime, Duration, Utc};

use super::error::{CalendarError, CalendarResult};

/// Clock-in state of a calendar. The start time and description only exist together.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Stopwatch {
    #[default]
    Idle,
    Running {
        start: DateTime<Utc>,
        description: String,
    },
}

impl Stopwatch {
    pub fn is_running(&self) -> bool {
        matches!(self, Stopwatch::Running { .. })
    }

    /// Time passed since the stopwatch was started, if it is running.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<Duration> {
        match self {
            Stopwatch::Running { start, .. } => Some(now - *start),
            Stopwatch::Idle => None,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Stopwatch::Running { description, .. } => Some(description),
            Stopwatch::Idle => None,
        }
    }

    pub(super) fn start(
        &mut self,
        now: DateTime<Utc>,
        description: impl Into<String>,
    ) -> CalendarResult<()> {
        if let Stopwatch::Running {
            start,
            description: running,
        } = self
        {
            return Err(CalendarError::AlreadyRunning {
                since: *start,
                description: running.clone(),
            });
        }
        *self = Stopwatch::Running {
            start: now,
            description: description.into(),
        };
        Ok(())
    }

    /// Moves back to idle, handing out the interval that was running.
    pub(super) fn take(&mut self) -> CalendarResult<(DateTime<Utc>, String)> {
        match std::mem::take(self) {
            Stopwatch::Running { start, description } => Ok((start, description)),
            Stopwatch::Idle => Err(CalendarError::NotRunning),
        }
    }
}
