//! In-memory model of a work calendar.
//!  - Every date with logged work has a [WorkDay] holding its sessions in entry order.
//!  - A day disappears as soon as its last session is deleted, so the store never holds empty days.
//!  - The [Stopwatch] lives next to the days and turns clocked time into a session when stopped.
//!
//! Nothing in here touches the disk, see [crate::storage] for that.

pub mod error;
pub mod grid;
pub mod stopwatch;
pub mod work_day;

use std::collections::{btree_map::Entry, BTreeMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use error::{CalendarError, CalendarResult};
use grid::{month_grid, MonthGrid};
use stopwatch::Stopwatch;
use tracing::{debug, info, warn};
use work_day::{DeletedSession, WorkDay, WorkSession};

use crate::utils::{
    clock::Clock,
    time::{duration_hours, local_date, month_bounds},
};

#[derive(Debug, Clone, PartialEq)]
pub struct SessionListing {
    pub index: usize,
    pub hours: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayListing {
    pub date: NaiveDate,
    pub total: f64,
    pub sessions: Vec<SessionListing>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthListing {
    pub year: i32,
    pub month: u32,
    /// Ascending by date.
    pub days: Vec<DayListing>,
    pub total: f64,
}

/// Session created by stopping the stopwatch.
#[derive(Debug, Clone, PartialEq)]
pub struct StoppedSession {
    pub date: NaiveDate,
    pub index: usize,
    pub hours: f64,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalendarStore {
    days: BTreeMap<NaiveDate, WorkDay>,
    stopwatch: Stopwatch,
}

impl CalendarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from loaded days. Empty days are skipped and days sharing a date are
    /// merged in the given order, so the store invariants hold whatever the input.
    pub fn from_parts(days: impl IntoIterator<Item = WorkDay>, stopwatch: Stopwatch) -> Self {
        let mut store = Self {
            days: BTreeMap::new(),
            stopwatch,
        };
        for day in days {
            if day.is_empty() {
                warn!("Dropping empty day {}", day.date());
                continue;
            }
            match store.days.entry(day.date()) {
                Entry::Vacant(entry) => {
                    entry.insert(day);
                }
                Entry::Occupied(mut entry) => {
                    warn!("Merging duplicate entries for {}", day.date());
                    for session in day.sessions() {
                        entry
                            .get_mut()
                            .add_session(session.hours(), session.description());
                    }
                }
            }
        }
        store
    }

    /// All days in ascending date order.
    pub fn days(&self) -> impl Iterator<Item = &WorkDay> {
        self.days.values()
    }

    pub fn day(&self, date: NaiveDate) -> Option<&WorkDay> {
        self.days.get(&date)
    }

    pub fn stopwatch(&self) -> &Stopwatch {
        &self.stopwatch
    }

    /// Logs a session on `date`, creating the day when needed. Returns the session index.
    pub fn add_session(
        &mut self,
        date: NaiveDate,
        hours: f64,
        description: impl Into<String>,
    ) -> usize {
        let description = description.into();
        let index = self
            .days
            .entry(date)
            .or_insert_with(|| WorkDay::new(date))
            .add_session(hours, description.as_str());
        info!("Session added to {date} ({hours:.2}h, '{description}')");
        index
    }

    pub fn delete_session(
        &mut self,
        date: NaiveDate,
        index: usize,
    ) -> CalendarResult<DeletedSession> {
        let day = self.day_mut(date)?;
        let mut deleted = day.delete_session(index)?;
        if day.is_empty() {
            self.days.remove(&date);
            deleted.day_removed = true;
        }
        info!(
            "Session [{index}] deleted from {date} ({:.2}h, '{}')",
            deleted.session.hours(),
            deleted.session.description()
        );
        Ok(deleted)
    }

    /// Overwrites a session, returning the values it had before.
    pub fn edit_session(
        &mut self,
        date: NaiveDate,
        index: usize,
        hours: f64,
        description: impl Into<String>,
        confirmed: bool,
    ) -> CalendarResult<WorkSession> {
        let previous = self
            .day_mut(date)?
            .edit_session(index, hours, description, confirmed)?;
        info!("Session [{index}] on {date} edited");
        Ok(previous)
    }

    pub fn day_total(&self, date: NaiveDate) -> f64 {
        self.days.get(&date).map_or(0., WorkDay::total)
    }

    /// Sessions of a date with their indices. `None` when nothing was logged.
    pub fn list_day(&self, date: NaiveDate) -> Option<DayListing> {
        debug!("Listing {date}");
        self.days.get(&date).map(day_listing)
    }

    pub fn list_month(&self, year: i32, month: u32) -> CalendarResult<MonthListing> {
        let (first, last) =
            month_bounds(year, month).ok_or(CalendarError::InvalidMonth { year, month })?;
        let days = self
            .days
            .range(first..=last)
            .map(|(_, day)| day_listing(day))
            .collect::<Vec<_>>();
        let total = days.iter().map(|d| d.total).sum();
        Ok(MonthListing {
            year,
            month,
            days,
            total,
        })
    }

    pub fn month_grid<Tag>(
        &self,
        year: i32,
        month: u32,
        tag: Tag,
    ) -> CalendarResult<MonthGrid<Tag>> {
        month_grid(year, month, tag, |date| self.day_total(date))
    }

    /// Clocks in. Fails when already running, leaving the running interval untouched.
    pub fn start_stopwatch(
        &mut self,
        description: impl Into<String>,
        clock: &dyn Clock,
    ) -> CalendarResult<DateTime<Utc>> {
        let now = clock.time();
        self.stopwatch.start(now, description)?;
        info!("Starting stopwatch at {now}");
        Ok(now)
    }

    /// Clocks out, logging the elapsed time as a session on the local date the stopwatch was
    /// started on.
    pub fn stop_stopwatch(&mut self, clock: &dyn Clock) -> CalendarResult<StoppedSession> {
        let (start, description) = self.stopwatch.take()?;
        let mut elapsed = clock.time() - start;
        if elapsed < Duration::zero() {
            warn!("Clock went backwards since {start}, recording 0 hours");
            elapsed = Duration::zero();
        }
        let hours = duration_hours(elapsed);
        let date = local_date(&start);
        let index = self.add_session(date, hours, description.as_str());
        Ok(StoppedSession {
            date,
            index,
            hours,
            description,
        })
    }

    /// Drops the running interval without logging it. Returns whether anything was running.
    pub fn clear_stopwatch(&mut self) -> bool {
        let was_running = std::mem::take(&mut self.stopwatch).is_running();
        info!("Stopwatch cleared");
        was_running
    }

    fn day_mut(&mut self, date: NaiveDate) -> CalendarResult<&mut WorkDay> {
        self.days
            .get_mut(&date)
            .ok_or(CalendarError::NoSessionsForDate(date))
    }
}

fn day_listing(day: &WorkDay) -> DayListing {
    DayListing {
        date: day.date(),
        total: day.total(),
        sessions: day
            .sessions()
            .iter()
            .enumerate()
            .map(|(index, session)| SessionListing {
                index,
                hours: session.hours(),
                description: session.description().to_string(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use super::{stopwatch::Stopwatch, work_day::WorkDay, CalendarStore, StoppedSession};
    use crate::{
        calendar::error::CalendarError,
        utils::{
            clock::{Clock, ManualClock},
            logging::TEST_LOGGING,
        },
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_total_sums_added_hours() {
        *TEST_LOGGING;
        let mut store = CalendarStore::new();
        let hours = [1.5, 2.25, 0.5, 3.];
        for h in hours {
            store.add_session(date(2024, 3, 5), h, "work");
        }
        store.add_session(date(2024, 3, 6), 8., "other day");
        assert_eq!(store.day_total(date(2024, 3, 5)), hours.iter().sum::<f64>());
        assert_eq!(store.day_total(date(2024, 3, 7)), 0.);
    }

    #[test]
    fn test_deleting_only_session_removes_day() {
        let mut store = CalendarStore::new();
        store.add_session(date(2024, 3, 5), 2., "only");
        let deleted = store.delete_session(date(2024, 3, 5), 0).unwrap();
        assert!(deleted.day_removed);
        assert!(!deleted.reindexed);
        assert_eq!(store.day_total(date(2024, 3, 5)), 0.);
        assert!(store.list_day(date(2024, 3, 5)).is_none());
        assert_eq!(store.days().count(), 0);
    }

    #[test]
    fn test_delete_out_of_range_leaves_store_unchanged() {
        let mut store = CalendarStore::new();
        store.add_session(date(2024, 3, 5), 2., "a");
        store.add_session(date(2024, 3, 5), 1., "b");
        let before = store.clone();
        let err = store.delete_session(date(2024, 3, 5), 2).unwrap_err();
        assert!(matches!(err, CalendarError::IndexOutOfRange { index: 2, len: 2, .. }));
        assert_eq!(store, before);
    }

    #[test]
    fn test_missing_date_errors() {
        let mut store = CalendarStore::new();
        assert_eq!(
            store.delete_session(date(2024, 3, 5), 0).unwrap_err(),
            CalendarError::NoSessionsForDate(date(2024, 3, 5))
        );
        assert_eq!(
            store
                .edit_session(date(2024, 3, 5), 0, 1., "x", false)
                .unwrap_err(),
            CalendarError::NoSessionsForDate(date(2024, 3, 5))
        );
    }

    #[test]
    fn test_edit_session() {
        let mut store = CalendarStore::new();
        store.add_session(date(2024, 3, 5), 2., "a");
        let previous = store
            .edit_session(date(2024, 3, 5), 0, 3.5, "b", false)
            .unwrap();
        assert_eq!(previous.hours(), 2.);
        assert_eq!(store.day_total(date(2024, 3, 5)), 3.5);

        let err = store
            .edit_session(date(2024, 3, 5), 0, -1., "c", false)
            .unwrap_err();
        assert_eq!(err, CalendarError::ConfirmationRequired { hours: -1. });
        assert_eq!(store.day_total(date(2024, 3, 5)), 3.5);
    }

    #[test]
    fn test_list_day_indices() {
        let mut store = CalendarStore::new();
        store.add_session(date(2024, 3, 5), 2., "a");
        store.add_session(date(2024, 3, 5), 1., "b");
        let listing = store.list_day(date(2024, 3, 5)).unwrap();
        assert_eq!(listing.total, 3.);
        assert_eq!(
            listing
                .sessions
                .iter()
                .map(|s| (s.index, s.description.as_str()))
                .collect::<Vec<_>>(),
            [(0, "a"), (1, "b")]
        );
    }

    #[test]
    fn test_list_month_sorted_with_total() {
        let mut store = CalendarStore::new();
        store.add_session(date(2024, 3, 20), 1., "late");
        store.add_session(date(2024, 4, 1), 9., "next month");
        store.add_session(date(2024, 3, 2), 2., "early");
        store.add_session(date(2024, 2, 29), 9., "previous month");
        store.add_session(date(2024, 3, 11), 4., "middle");
        store.add_session(date(2024, 3, 2), 0.5, "early again");

        let listing = store.list_month(2024, 3).unwrap();
        let dates = listing.days.iter().map(|d| d.date).collect::<Vec<_>>();
        assert_eq!(dates, [date(2024, 3, 2), date(2024, 3, 11), date(2024, 3, 20)]);
        assert_eq!(listing.total, 7.5);
        assert_eq!(
            listing.total,
            listing.days.iter().map(|d| d.total).sum::<f64>()
        );
    }

    #[test]
    fn test_list_month_invalid() {
        let store = CalendarStore::new();
        assert!(matches!(
            store.list_month(2024, 0),
            Err(CalendarError::InvalidMonth { .. })
        ));
    }

    #[test]
    fn test_month_grid_uses_day_totals() {
        let mut store = CalendarStore::new();
        store.add_session(date(2024, 2, 29), 3., "leap day");
        store.add_session(date(2024, 3, 1), 2., "filler");
        let grid = store.month_grid(2024, 2, ()).unwrap();
        let last_week = grid.weeks.last().unwrap();
        assert_eq!(last_week.total, 5.);
        assert_eq!(grid.total(), 5.);
    }

    #[test]
    fn test_stopwatch_logs_elapsed_session() {
        let start_date = date(2024, 3, 10);
        let clock = ManualClock::local_noon(start_date);
        let mut store = CalendarStore::new();
        store.start_stopwatch("task", &clock).unwrap();
        clock.advance(Duration::minutes(150));

        let stopped = store.stop_stopwatch(&clock).unwrap();
        assert_eq!(
            stopped,
            StoppedSession {
                date: start_date,
                index: 0,
                hours: 2.5,
                description: "task".into()
            }
        );
        let day = store.day(start_date).unwrap();
        assert_eq!(day.sessions().len(), 1);
        assert!((day.sessions()[0].hours() - 2.5).abs() < 1e-9);
        assert_eq!(day.sessions()[0].description(), "task");
        assert_eq!(*store.stopwatch(), Stopwatch::Idle);
    }

    #[test]
    fn test_stopwatch_session_goes_to_start_date() {
        let start_date = date(2024, 12, 31);
        let clock = ManualClock::local_noon(start_date);
        let mut store = CalendarStore::new();
        store.start_stopwatch("overnight", &clock).unwrap();
        clock.advance(Duration::hours(14));
        let stopped = store.stop_stopwatch(&clock).unwrap();
        assert_eq!(stopped.date, start_date);
        assert_eq!(store.day_total(date(2025, 1, 1)), 0.);
    }

    #[test]
    fn test_stop_while_idle() {
        let clock = ManualClock::local_noon(date(2024, 3, 10));
        let mut store = CalendarStore::new();
        assert_eq!(
            store.stop_stopwatch(&clock).unwrap_err(),
            CalendarError::NotRunning
        );
        assert_eq!(store.days().count(), 0);
    }

    #[test]
    fn test_start_while_running() {
        let clock = ManualClock::local_noon(date(2024, 3, 10));
        let mut store = CalendarStore::new();
        let since = store.start_stopwatch("first", &clock).unwrap();
        clock.advance(Duration::hours(1));
        assert_eq!(
            store.start_stopwatch("second", &clock).unwrap_err(),
            CalendarError::AlreadyRunning {
                since,
                description: "first".into()
            }
        );
        assert_eq!(
            store.stopwatch().elapsed(clock.time()),
            Some(Duration::hours(1))
        );
    }

    #[test]
    fn test_clear_discards_interval() {
        let clock = ManualClock::local_noon(date(2024, 3, 10));
        let mut store = CalendarStore::new();
        store.start_stopwatch("abandoned", &clock).unwrap();
        assert!(store.clear_stopwatch());
        assert!(!store.clear_stopwatch());
        assert_eq!(store.days().count(), 0);
        assert_eq!(*store.stopwatch(), Stopwatch::Idle);
    }

    #[test]
    fn test_backwards_clock_records_zero() {
        let clock = ManualClock::local_noon(date(2024, 3, 10));
        let mut store = CalendarStore::new();
        store.start_stopwatch("skew", &clock).unwrap();
        clock.advance(Duration::minutes(-5));
        assert_eq!(store.stop_stopwatch(&clock).unwrap().hours, 0.);
    }

    #[test]
    fn test_from_parts_keeps_invariants() {
        let mut a = WorkDay::new(date(2024, 3, 5));
        a.add_session(1., "a");
        let mut b = WorkDay::new(date(2024, 3, 5));
        b.add_session(2., "b");
        let empty = WorkDay::new(date(2024, 3, 6));

        let store = CalendarStore::from_parts([a, empty, b], Stopwatch::Idle);
        assert_eq!(store.days().count(), 1);
        assert_eq!(store.day_total(date(2024, 3, 5)), 3.);
        assert!(store.day(date(2024, 3, 6)).is_none());
    }
}
