//! Week aligned view of a month used for the calendar display. Weeks start on Monday and include
//! the days of neighbouring months needed to complete them.

use chrono::{Datelike, Duration, NaiveDate};

use crate::utils::time::{in_month, month_bounds};

use super::error::{CalendarError, CalendarResult};

#[derive(Debug, Clone, PartialEq)]
pub struct GridDay {
    pub date: NaiveDate,
    /// False for filler days of the previous or next month.
    pub in_month: bool,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridWeek {
    pub days: [GridDay; 7],
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthGrid<Tag> {
    pub year: i32,
    pub month: u32,
    /// Display tag handed over by the caller, untouched by the calendar.
    pub tag: Tag,
    pub weeks: Vec<GridWeek>,
}

impl<Tag> MonthGrid<Tag> {
    pub fn total(&self) -> f64 {
        self.weeks.iter().map(|w| w.total).sum()
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

/// Lays out `year`/`month` into weeks, asking `day_total` for the hours of every cell.
pub fn month_grid<Tag>(
    year: i32,
    month: u32,
    tag: Tag,
    day_total: impl Fn(NaiveDate) -> f64,
) -> CalendarResult<MonthGrid<Tag>> {
    let invalid = || CalendarError::InvalidMonth { year, month };
    let (first, last) = month_bounds(year, month).ok_or_else(invalid)?;

    // Weeks next to the first and last representable dates can't be completed.
    let lead = Duration::days(first.weekday().num_days_from_monday() as i64);
    let trail = Duration::days(6 - last.weekday().num_days_from_monday() as i64);
    let grid_start = first.checked_sub_signed(lead).ok_or_else(invalid)?;
    let grid_end = last.checked_add_signed(trail).ok_or_else(invalid)?;

    let mut weeks = Vec::new();
    let mut week_start = grid_start;
    while week_start <= grid_end {
        // every day up to grid_end exists
        let days: [GridDay; 7] = std::array::from_fn(|offset| {
            let date = week_start + Duration::days(offset as i64);
            GridDay {
                date,
                in_month: in_month(date, year, month),
                total: day_total(date),
            }
        });
        let total = days.iter().map(|d| d.total).sum();
        weeks.push(GridWeek { days, total });
        match week_start.checked_add_signed(Duration::weeks(1)) {
            Some(next) => week_start = next,
            None => break,
        }
    }

    Ok(MonthGrid {
        year,
        month,
        tag,
        weeks,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, NaiveDate, Weekday};

    use super::month_grid;
    use crate::calendar::error::CalendarError;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_leap_february_layout() {
        // 1 Feb 2024 is a Thursday, 29 Feb a Thursday.
        let grid = month_grid(2024, 2, (), |_| 1.).unwrap();
        assert_eq!(grid.weeks.len(), 5);
        assert_eq!(grid.weeks[0].days[0].date, date(2024, 1, 29));
        assert!(!grid.weeks[0].days[0].in_month);
        assert!(grid.weeks[0].days[3].in_month);
        assert_eq!(grid.weeks[4].days[6].date, date(2024, 3, 3));
        let in_month = grid
            .weeks
            .iter()
            .flat_map(|w| w.days.iter())
            .filter(|d| d.in_month)
            .count();
        assert_eq!(in_month, 29);
        for week in &grid.weeks {
            assert_eq!(week.days[0].date.weekday(), Weekday::Mon);
            assert_eq!(week.total, 7.);
        }
    }

    #[test]
    fn test_week_totals_across_year_boundary() {
        let worked = [
            (date(2023, 12, 31), 2.5),
            (date(2024, 1, 1), 3.),
            (date(2024, 1, 2), 0.5),
        ];
        let total_for = |d: NaiveDate| {
            worked
                .iter()
                .filter(|(w, _)| *w == d)
                .map(|(_, h)| *h)
                .sum::<f64>()
        };

        let december = month_grid(2023, 12, (), total_for).unwrap();
        let last_week = december.weeks.last().unwrap();
        // Mon 25 Dec .. Sun 31 Dec, no filler needed
        assert_eq!(last_week.days[6].date, date(2023, 12, 31));
        assert_eq!(last_week.total, 2.5);

        let january = month_grid(2024, 1, (), total_for).unwrap();
        assert_eq!(january.weeks[0].days[0].date, date(2024, 1, 1));
        assert_eq!(january.weeks[0].total, 3.5);

        for grid in [&december, &january] {
            for week in &grid.weeks {
                let sum: f64 = week.days.iter().map(|d| d.total).sum();
                assert_eq!(week.total, sum);
            }
        }
    }

    #[test]
    fn test_filler_days_count_towards_week() {
        // March 2024 ends on a Sunday, starts on a Friday.
        let grid = month_grid(2024, 3, "grey", |d| if d == date(2024, 2, 26) { 4. } else { 0. })
            .unwrap();
        assert_eq!(grid.tag, "grey");
        assert_eq!(grid.weeks[0].days[0].date, date(2024, 2, 26));
        assert_eq!(grid.weeks[0].total, 4.);
        assert_eq!(grid.weeks.last().unwrap().days[6].date, date(2024, 3, 31));
    }

    #[test]
    fn test_invalid_month() {
        assert_eq!(
            month_grid(2024, 13, (), |_| 0.).unwrap_err(),
            CalendarError::InvalidMonth {
                year: 2024,
                month: 13
            }
        );
    }

    #[test]
    fn test_months_at_date_limits() {
        let min_year = NaiveDate::MIN.year();
        let max_year = NaiveDate::MAX.year();
        assert!(matches!(
            month_grid(min_year, 1, (), |_| 0.),
            Err(CalendarError::InvalidMonth { .. })
        ));
        assert!(matches!(
            month_grid(max_year, 12, (), |_| 0.),
            Err(CalendarError::InvalidMonth { .. })
        ));
        assert!(matches!(
            month_grid(i32::MAX, 6, (), |_| 0.),
            Err(CalendarError::InvalidMonth { .. })
        ));
    }
}
