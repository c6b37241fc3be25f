use chrono::{DateTime, NaiveDate, Utc};

pub type CalendarResult<T> = Result<T, CalendarError>;

/// Failures of calendar operations. None of them leave the store half-modified.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalendarError {
    #[error("Index {index} is too large for list of {len} sessions on {date}")]
    IndexOutOfRange {
        date: NaiveDate,
        index: usize,
        len: usize,
    },

    #[error("No sessions recorded for {0}")]
    NoSessionsForDate(NaiveDate),

    #[error("Stopwatch is not running")]
    NotRunning,

    #[error("Stopwatch is already running since {since} ('{description}')")]
    AlreadyRunning {
        since: DateTime<Utc>,
        description: String,
    },

    /// Non-positive hours need an explicit go-ahead from the caller.
    #[error("Hours are not positive ({hours}), confirmation required")]
    ConfirmationRequired { hours: f64 },

    #[error("Hours must be a finite number, got {hours}")]
    InvalidHours { hours: f64 },

    #[error("{year}-{month} is not a valid month")]
    InvalidMonth { year: i32, month: u32 },
}

/// Pre-check shared by every operation that writes hours. Infinite and NaN hours are refused
/// even when confirmed, they can't be written to a calendar file.
pub fn check_hours(hours: f64, confirmed: bool) -> CalendarResult<()> {
    if !hours.is_finite() {
        Err(CalendarError::InvalidHours { hours })
    } else if hours > 0. || confirmed {
        Ok(())
    } else {
        Err(CalendarError::ConfirmationRequired { hours })
    }
}
