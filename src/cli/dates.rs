use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate};
use chrono_english::{parse_date_string, Dialect};
use clap::CommandFactory;

use super::Args;

const MONTH_NAMES: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

/// Accepts `3`, `03`, `mar`, `sept` or `March`. Names need at least 3 letters.
pub fn parse_month(value: &str) -> Result<u32, String> {
    if let Ok(month) = value.parse::<u32>() {
        return if (1..=12).contains(&month) {
            Ok(month)
        } else {
            Err(format!("{month} is not a month"))
        };
    }
    let lower = value.to_lowercase();
    MONTH_NAMES
        .iter()
        .position(|name| lower.len() >= 3 && name.starts_with(&lower))
        .map(|i| i as u32 + 1)
        .ok_or_else(|| format!("Can't understand month {value}"))
}

/// Two digit years are taken as 20xx.
pub fn parse_year(value: &str) -> Result<i32, String> {
    let year = value
        .parse::<i32>()
        .map_err(|e| format!("Can't understand year {value}: {e}"))?;
    match (value.len(), year) {
        (1 | 2, 0..=99) => Ok(2000 + year),
        (_, 1..=9999) => Ok(year),
        _ => Err(format!("{year} is not a supported year")),
    }
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct MonthArgs {
    #[arg(
        value_parser = parse_month,
        help = "Month as a number or a name. Defaults to current month"
    )]
    pub month: Option<u32>,
    #[arg(value_parser = parse_year, help = "Year. Defaults to current year")]
    pub year: Option<i32>,
}

impl MonthArgs {
    pub fn resolve(&self, today: NaiveDate) -> (i32, u32) {
        (
            self.year.unwrap_or(today.year()),
            self.month.unwrap_or(today.month()),
        )
    }
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct DayArgs {
    #[arg(help = "Day of month. Defaults to today")]
    pub day: Option<u32>,
    #[arg(
        value_parser = parse_month,
        help = "Month as a number or a name. Defaults to current month"
    )]
    pub month: Option<u32>,
    #[arg(value_parser = parse_year, help = "Year. Defaults to current year")]
    pub year: Option<i32>,
    #[arg(
        long = "date",
        conflicts_with_all = ["day", "month", "year"],
        help = "Free form date instead of day/month/year. \
                Examples are \"yesterday\", \"15/03/2025\""
    )]
    pub date_text: Option<String>,
}

impl DayArgs {
    pub fn resolve(&self, today: NaiveDate) -> Result<NaiveDate> {
        if let Some(text) = &self.date_text {
            return match parse_date_string(text, Local::now(), Dialect::Uk) {
                Ok(v) => Ok(v.date_naive()),
                Err(e) => Err(Args::command()
                    .error(
                        clap::error::ErrorKind::ValueValidation,
                        format!("Failed to validate date {e}"),
                    )
                    .into()),
            };
        }
        let year = self.year.unwrap_or(today.year());
        let month = self.month.unwrap_or(today.month());
        let day = self.day.unwrap_or(today.day());
        NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            Args::command()
                .error(
                    clap::error::ErrorKind::ValueValidation,
                    format!("{day}/{month}/{year} is not a valid date"),
                )
                .into()
        })
    }
}
