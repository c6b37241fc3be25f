use chrono::NaiveDate;

use super::error::{CalendarError, CalendarResult};

/// One logged interval of work.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkSession {
    hours: f64,
    description: String,
}

impl WorkSession {
    pub fn new(hours: f64, description: impl Into<String>) -> Self {
        Self {
            hours,
            description: description.into(),
        }
    }

    pub fn hours(&self) -> f64 {
        self.hours
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    fn edit(&mut self, hours: f64, description: String) -> WorkSession {
        let previous = self.clone();
        self.hours = hours;
        self.description = description;
        previous
    }
}

/// Result of removing a session from a day.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletedSession {
    pub date: NaiveDate,
    pub index: usize,
    pub session: WorkSession,
    /// Sessions after `index` moved down by one.
    pub reindexed: bool,
    /// The day had no sessions left and was dropped from the store.
    pub day_removed: bool,
}

/// Sessions logged for a single calendar date, in the order they were entered.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkDay {
    date: NaiveDate,
    sessions: Vec<WorkSession>,
}

impl WorkDay {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            sessions: Vec::new(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn sessions(&self) -> &[WorkSession] {
        &self.sessions
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Appends a session and returns its index.
    pub fn add_session(&mut self, hours: f64, description: impl Into<String>) -> usize {
        self.sessions.push(WorkSession::new(hours, description));
        self.sessions.len() - 1
    }

    pub fn delete_session(&mut self, index: usize) -> CalendarResult<DeletedSession> {
        self.check_index(index)?;
        let reindexed = index + 1 < self.sessions.len();
        let session = self.sessions.remove(index);
        Ok(DeletedSession {
            date: self.date,
            index,
            session,
            reindexed,
            day_removed: false,
        })
    }

    /// Replaces the session at `index`, returning its previous values. Hours that are not positive
    /// are only accepted when `confirmed` is set.
    pub fn edit_session(
        &mut self,
        index: usize,
        hours: f64,
        description: impl Into<String>,
        confirmed: bool,
    ) -> CalendarResult<WorkSession> {
        self.check_index(index)?;
        super::error::check_hours(hours, confirmed)?;
        Ok(self.sessions[index].edit(hours, description.into()))
    }

    pub fn total(&self) -> f64 {
        self.sessions.iter().map(WorkSession::hours).sum()
    }

    fn check_index(&self, index: usize) -> CalendarResult<()> {
        if index < self.sessions.len() {
            Ok(())
        } else {
            Err(CalendarError::IndexOutOfRange {
                date: self.date,
                index,
                len: self.sessions.len(),
            })
        }
    }
}
