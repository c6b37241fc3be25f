use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::{stopwatch::Stopwatch, work_day::WorkDay, CalendarStore};

/// Format version written into every calendar file. Bump when the layout changes.
pub const CALENDAR_FORMAT_VERSION: u32 = 1;

/// The struct used for storing a whole calendar on the disk.
#[derive(PartialEq, Debug, Serialize, Deserialize, Clone)]
pub struct CalendarEntity {
    pub version: u32,
    #[serde(default)]
    pub days: Vec<WorkDayEntity>,
    #[serde(default)]
    pub stopwatch: Option<StopwatchEntity>,
}

#[derive(PartialEq, Debug, Serialize, Deserialize, Clone)]
pub struct WorkDayEntity {
    pub date: NaiveDate,
    pub sessions: Vec<WorkSessionEntity>,
}

#[derive(PartialEq, Debug, Serialize, Deserialize, Clone)]
pub struct WorkSessionEntity {
    pub hours: f64,
    #[serde(default)]
    pub description: String,
}

#[derive(PartialEq, Debug, Serialize, Deserialize, Clone)]
pub struct StopwatchEntity {
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
}

impl CalendarEntity {
    /// First date holding hours that JSON can't represent. serde_json writes those as `null`,
    /// which would make the whole file unreadable.
    pub fn non_finite_date(&self) -> Option<NaiveDate> {
        self.days
            .iter()
            .find(|day| day.sessions.iter().any(|s| !s.hours.is_finite()))
            .map(|day| day.date)
    }
}

impl From<&CalendarStore> for CalendarEntity {
    fn from(store: &CalendarStore) -> Self {
        let days = store
            .days()
            .map(|day| WorkDayEntity {
                date: day.date(),
                sessions: day
                    .sessions()
                    .iter()
                    .map(|session| WorkSessionEntity {
                        hours: session.hours(),
                        description: session.description().to_string(),
                    })
                    .collect(),
            })
            .collect();

        let stopwatch = match store.stopwatch() {
            Stopwatch::Idle => None,
            Stopwatch::Running { start, description } => Some(StopwatchEntity {
                start: *start,
                description: description.clone(),
            }),
        };

        CalendarEntity {
            version: CALENDAR_FORMAT_VERSION,
            days,
            stopwatch,
        }
    }
}

impl From<CalendarEntity> for CalendarStore {
    fn from(CalendarEntity { days, stopwatch, .. }: CalendarEntity) -> Self {
        let days = days.into_iter().map(|entity| {
            let mut day = WorkDay::new(entity.date);
            for WorkSessionEntity { hours, description } in entity.sessions {
                day.add_session(hours, description);
            }
            day
        });
        let stopwatch = match stopwatch {
            Some(StopwatchEntity { start, description }) => {
                Stopwatch::Running { start, description }
            }
            None => Stopwatch::Idle,
        };
        CalendarStore::from_parts(days, stopwatch)
    }
}
