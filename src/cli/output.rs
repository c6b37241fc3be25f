//! Turns calendar results into terminal text.

use std::fmt::Write;

use chrono::{Datelike, Duration, NaiveDate};

use crate::{
    calendar::{
        grid::MonthGrid, stopwatch::Stopwatch, work_day::DeletedSession, DayListing, MonthListing,
    },
    utils::{
        clock::Clock,
        time::{display_date, duration_hours},
    },
};

use super::prefs::Colour;

const WEEKDAY_HEADER: &str = "Mo Tu We Th Fr Sa Su";
const GRID_WIDTH: usize = 20;

/// Month grid with two rows per week: day numbers, then the hours of every cell followed by the
/// week total.
pub fn format_month_grid(grid: &MonthGrid<Colour>, calendar_name: &str) -> String {
    let style = grid.tag.style();
    let mut out = String::new();

    let title = title_case(calendar_name);
    let _ = writeln!(out, "{}", style.paint(format!("{title:^GRID_WIDTH$}")));
    if let Some(first) = grid.first_day() {
        let heading = first.format("%B %Y").to_string();
        let _ = writeln!(out, "{heading:^GRID_WIDTH$}");
    }
    let _ = writeln!(out, "{WEEKDAY_HEADER}");

    for week in &grid.weeks {
        let days = week
            .days
            .iter()
            .map(|d| {
                if d.in_month {
                    format!("{:>2}", d.date.day())
                } else {
                    "  ".to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(out, "{days}");

        let mut totals = week
            .days
            .iter()
            .map(|d| format!("{:>2}", d.total as i64))
            .collect::<Vec<_>>();
        totals.push(format!("| {:.1}", week.total));
        let _ = writeln!(out, "{}", style.paint(totals.join(" ")));
    }
    out
}

pub fn format_day(date: NaiveDate, listing: Option<&DayListing>) -> String {
    let date_text = display_date(date);
    match listing {
        Some(listing) => {
            let mut out = format!("{date_text}: {:.2}h\n", listing.total);
            for session in &listing.sessions {
                let _ = writeln!(
                    out,
                    "--[{}] {:.2}h '{}'",
                    session.index, session.hours, session.description
                );
            }
            out
        }
        None => format!("{date_text}: 0h\n--No sessions recorded for {date_text}\n"),
    }
}

pub fn format_month(listing: &MonthListing) -> String {
    let mut out = listing
        .days
        .iter()
        .map(|day| format_day(day.date, Some(day)))
        .collect::<String>();
    let _ = writeln!(out, "TOTAL: {:.2}h", listing.total);
    out
}

pub fn format_deleted(deleted: &DeletedSession) -> String {
    format!(
        "Session [{}] deleted from {} ({:.2}h, '{}').{}",
        deleted.index,
        display_date(deleted.date),
        deleted.session.hours(),
        deleted.session.description(),
        if deleted.reindexed {
            " [Indices updated]"
        } else {
            ""
        }
    )
}

/// Reminder shown when a calendar is opened while clocked in. Elapsed time never goes below zero,
/// same as when the stopwatch is stopped.
pub fn format_running(stopwatch: &Stopwatch, clock: &dyn Clock) -> Option<String> {
    let elapsed = stopwatch.elapsed(clock.time())?.max(Duration::zero());
    let description = stopwatch.description()?;
    Some(format!(
        "Stopwatch is running ({:.2}h, '{description}')",
        duration_hours(elapsed)
    ))
}

fn title_case(value: &str) -> String {
    let stem = value.split('.').next().unwrap_or(value);
    let mut chars = stem.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
