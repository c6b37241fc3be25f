//!  Storage is organized through [CalendarStorage] and [PersistedCalendar].
//!  The basic idea is:
//!   - A calendar is saved as one snapshot holding every day and the stopwatch.
//!   - Loading never fails. A missing or unreadable snapshot gives an empty calendar and a
//!     [LoadStatus] describing what happened.
//!   - Every successful mutation is followed by a full save through [PersistedCalendar::apply].

pub mod entities;
pub mod file_storage;

use std::fmt::Display;

use async_trait::async_trait;
use chrono::NaiveDate;
#[cfg(test)]
use mockall::automock;
use tracing::{error, info};

use crate::calendar::{error::CalendarError, CalendarStore};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed calendar file: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Unsupported calendar format version {0}")]
    UnsupportedVersion(u32),

    #[error("Hours on {0} are not a finite number")]
    NonFiniteHours(NaiveDate),
}

/// What happened while loading a calendar.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Opened,
    /// Nothing saved yet, started with an empty calendar.
    Missing,
    /// The file exists but couldn't be read, started with an empty calendar.
    Unreadable(String),
}

impl Display for LoadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadStatus::Opened => write!(f, "opened"),
            LoadStatus::Missing => write!(f, "not found"),
            LoadStatus::Unreadable(reason) => write!(f, "unreadable ({reason})"),
        }
    }
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub store: CalendarStore,
    pub status: LoadStatus,
}

impl LoadOutcome {
    pub fn empty(status: LoadStatus) -> Self {
        Self {
            store: CalendarStore::new(),
            status,
        }
    }
}

/// Interface for abstracting where calendars are kept.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CalendarStorage: Send + Sync {
    async fn load(&self) -> LoadOutcome;

    /// Overwrites the stored snapshot with `store`.
    async fn save(&self, store: &CalendarStore) -> Result<(), StorageError>;

    /// Human readable location, used in messages.
    fn location(&self) -> String;
}

#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    /// The change is applied in memory but couldn't be written.
    #[error("Could not save calendar: {0}")]
    SaveFailure(#[source] StorageError),
}

/// A calendar bound to the storage it was loaded from.
pub struct PersistedCalendar<S: CalendarStorage> {
    storage: S,
    store: CalendarStore,
}

impl<S: CalendarStorage> PersistedCalendar<S> {
    pub async fn open(storage: S) -> (Self, LoadStatus) {
        let LoadOutcome { store, status } = storage.load().await;
        match &status {
            LoadStatus::Opened => info!("Opened {}", storage.location()),
            LoadStatus::Missing => info!("No calendar at {}, starting empty", storage.location()),
            LoadStatus::Unreadable(e) => error!("Cannot load {}: {e}", storage.location()),
        }
        (Self { storage, store }, status)
    }

    pub fn store(&self) -> &CalendarStore {
        &self.store
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Runs `operation` on the calendar and saves it if the operation succeeded. A failed
    /// operation leaves the calendar as it was and nothing is written.
    pub async fn apply<T>(
        &mut self,
        operation: impl FnOnce(&mut CalendarStore) -> Result<T, CalendarError>,
    ) -> Result<T, CommitError> {
        let value = operation(&mut self.store)?;
        self.persist().await?;
        Ok(value)
    }

    pub async fn persist(&self) -> Result<(), CommitError> {
        self.storage
            .save(&self.store)
            .await
            .inspect_err(|e| error!("Failed to save {}: {e:?}", self.storage.location()))
            .map_err(CommitError::SaveFailure)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::NaiveDate;

    use super::{
        CommitError, LoadOutcome, LoadStatus, MockCalendarStorage, PersistedCalendar, StorageError,
    };
    use crate::{
        calendar::{error::CalendarError, CalendarStore},
        utils::logging::TEST_LOGGING,
    };

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    fn storage_with(store: CalendarStore) -> MockCalendarStorage {
        let mut storage = MockCalendarStorage::new();
        storage.expect_load().return_once(move || LoadOutcome {
            store,
            status: LoadStatus::Opened,
        });
        storage.expect_location().returning(|| "test".into());
        storage
    }

    #[tokio::test]
    async fn test_apply_saves_after_mutation() -> Result<()> {
        *TEST_LOGGING;
        let mut storage = storage_with(CalendarStore::new());
        storage
            .expect_save()
            .withf(|store| store.day_total(date()) == 2.)
            .times(1)
            .returning(|_| Ok(()));

        let (mut calendar, status) = PersistedCalendar::open(storage).await;
        assert_eq!(status, LoadStatus::Opened);
        let index = calendar
            .apply(|store| Ok(store.add_session(date(), 2., "work")))
            .await?;
        assert_eq!(index, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_operation_is_not_saved() -> Result<()> {
        let mut storage = storage_with(CalendarStore::new());
        storage.expect_save().times(0);

        let (mut calendar, _) = PersistedCalendar::open(storage).await;
        let result = calendar
            .apply(|store| store.delete_session(date(), 0))
            .await;
        assert!(matches!(
            result,
            Err(CommitError::Calendar(CalendarError::NoSessionsForDate(_)))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_save_failure_keeps_memory_state() -> Result<()> {
        let mut storage = storage_with(CalendarStore::new());
        storage.expect_save().times(1).returning(|_| {
            Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        });

        let (mut calendar, _) = PersistedCalendar::open(storage).await;
        let result = calendar
            .apply(|store| Ok(store.add_session(date(), 1.25, "unsaved")))
            .await;
        assert!(matches!(result, Err(CommitError::SaveFailure(_))));
        assert_eq!(calendar.store().day_total(date()), 1.25);
        Ok(())
    }
}
