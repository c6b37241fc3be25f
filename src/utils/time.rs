use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, TimeZone};

const MILLIS_IN_HOUR: f64 = 60. * 60. * 1000.;

/// This is the standard way of showing a date to the user in jobcal.
pub fn display_date(date: NaiveDate) -> String {
    date.format("%d %b %Y").to_string()
}

/// Calendar date of an instant as seen on the local wall clock.
pub fn local_date<Tz: TimeZone>(moment: &DateTime<Tz>) -> NaiveDate {
    moment.with_timezone(&Local).date_naive()
}

/// Converts a duration into fractional hours.
pub fn duration_hours(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / MILLIS_IN_HOUR
}

/// First and last day of a month. `None` for a month outside of 1..=12.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

/// Returns true when `date` is in the given month.
pub fn in_month(date: NaiveDate, year: i32, month: u32) -> bool {
    date.year() == year && date.month() == month
}
