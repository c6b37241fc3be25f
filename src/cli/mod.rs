pub mod dates;
pub mod output;
pub mod prefs;

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use dates::{DayArgs, MonthArgs};
use prefs::{calendar_path, Colour, Preferences, PREFERENCES_FILE};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, level_filters::LevelFilter};

use crate::{
    calendar::error::{check_hours, CalendarError},
    storage::{
        file_storage::FileCalendarStorage, CalendarStorage, CommitError, LoadStatus,
        PersistedCalendar,
    },
    utils::{
        clock::{Clock, DefaultClock},
        dir::{create_application_default_path, ensure_dir},
        logging::{enable_logging, CLI_PREFIX},
        time::display_date,
    },
};

#[derive(Parser, Debug)]
#[command(name = "Jobcal", version, long_about = None)]
#[command(about = "Calendar for logging hours of work", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or \
                $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        help = "Use this calendar for one command instead of the active one"
    )]
    calendar: Option<String>,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
}

/// Hours as typed by the user. Infinite and NaN values are refused.
fn parse_hours(value: &str) -> Result<f64, String> {
    match value.parse::<f64>() {
        Ok(hours) if hours.is_finite() => Ok(hours),
        Ok(_) => Err(format!("{value} is not a finite number of hours")),
        Err(e) => Err(format!("Can't understand hours {value}: {e}")),
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        visible_alias = "p",
        about = "Print the month calendar with hours per day and week"
    )]
    Print {
        #[command(flatten)]
        month: MonthArgs,
    },
    #[command(visible_alias = "li", about = "List sessions of a day")]
    List {
        #[command(flatten)]
        day: DayArgs,
    },
    #[command(visible_alias = "la", about = "List sessions of every day in a month")]
    Listall {
        #[command(flatten)]
        month: MonthArgs,
    },
    #[command(visible_alias = "a", about = "Add a session")]
    Add {
        #[arg(allow_negative_numbers = true, value_parser = parse_hours)]
        hours: f64,
        #[arg(default_value = "")]
        description: String,
        #[command(flatten)]
        day: DayArgs,
        #[arg(short, long, help = "Don't ask before adding hours that are not positive")]
        yes: bool,
    },
    #[command(
        visible_alias = "d",
        about = "Delete a session. Later sessions of the day are renumbered"
    )]
    Del {
        index: usize,
        #[command(flatten)]
        day: DayArgs,
    },
    #[command(visible_alias = "e", about = "Replace hours and description of a session")]
    Edit {
        index: usize,
        #[arg(allow_negative_numbers = true, value_parser = parse_hours)]
        hours: f64,
        description: String,
        #[command(flatten)]
        day: DayArgs,
        #[arg(short, long, help = "Don't ask before setting hours that are not positive")]
        yes: bool,
    },
    #[command(visible_aliases = ["in", "clockin", "ci"], about = "Start the stopwatch")]
    Start {
        #[arg(default_value = "")]
        description: String,
    },
    #[command(
        visible_aliases = ["out", "clockout", "co"],
        about = "Stop the stopwatch and log the elapsed time"
    )]
    Stop {},
    #[command(visible_alias = "c", about = "Discard the running stopwatch")]
    Clear {},
    #[command(visible_alias = "l", about = "Switch the active calendar")]
    Load {
        #[arg(
            value_name = "CALENDAR",
            help = "Calendar name. `.jobcal` is appended when there's no extension"
        )]
        name: String,
    },
    #[command(visible_aliases = ["chcolour", "chc"], about = "Change the display colour")]
    Chcol {
        #[arg(default_value_t = Colour::Grey)]
        colour: Colour,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args
        .dir
        .map_or_else(create_application_default_path, ensure_dir)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log)?;

    let prefs_path = app_dir.join(PREFERENCES_FILE);
    let mut prefs = Preferences::load(&prefs_path).await;

    match args.commands {
        Commands::Load { name } => {
            prefs.calendar = name;
            prefs.save(&prefs_path).await?;
            let calendar = open_calendar(&app_dir, &prefs.calendar, &DefaultClock).await;
            print_month(&calendar, &prefs, &MonthArgs::default())
        }
        Commands::Chcol { colour } => {
            prefs.colour = colour;
            prefs.save(&prefs_path).await?;
            println!("Colour changed to {colour}");
            Ok(())
        }
        command => {
            if let Some(calendar) = args.calendar {
                prefs.calendar = calendar;
            }
            let clock = DefaultClock;
            let mut calendar = open_calendar(&app_dir, &prefs.calendar, &clock).await;
            process_command(command, &mut calendar, &prefs, &clock).await
        }
    }
}

async fn open_calendar(
    app_dir: &std::path::Path,
    name: &str,
    clock: &dyn Clock,
) -> PersistedCalendar<FileCalendarStorage> {
    let storage = FileCalendarStorage::new(calendar_path(app_dir, name));
    let (calendar, status) = PersistedCalendar::open(storage).await;
    match status {
        LoadStatus::Opened => {}
        LoadStatus::Missing => println!(
            "Cannot load from file {}. Creating empty calendar.",
            calendar.storage().location()
        ),
        LoadStatus::Unreadable(reason) => println!(
            "Cannot load from file {} ({reason}). Creating empty calendar, the file is moved \
             aside on the next save.",
            calendar.storage().location()
        ),
    }
    if let Some(message) = output::format_running(calendar.store().stopwatch(), clock) {
        println!("{message}");
    }
    calendar
}

async fn process_command<S: CalendarStorage>(
    command: Commands,
    calendar: &mut PersistedCalendar<S>,
    prefs: &Preferences,
    clock: &dyn Clock,
) -> Result<()> {
    let today = Local::now().date_naive();
    match command {
        Commands::Print { month } => print_month(calendar, prefs, &month),
        Commands::List { day } => {
            let date = day.resolve(today)?;
            print!("{}", output::format_day(date, calendar.store().list_day(date).as_ref()));
            Ok(())
        }
        Commands::Listall { month } => {
            let (year, month) = month.resolve(today);
            let listing = calendar.store().list_month(year, month)?;
            print!("{}", output::format_month(&listing));
            Ok(())
        }
        Commands::Add {
            hours,
            description,
            day,
            yes,
        } => {
            let date = day.resolve(today)?;
            let confirmed = confirm_hours(hours, yes).await?;
            let result = calendar
                .apply(|store| {
                    check_hours(hours, confirmed)?;
                    Ok(store.add_session(date, hours, description.as_str()))
                })
                .await;
            report(result, |_| {
                format!(
                    "Session added to {} ({hours:.2}h, '{description}').",
                    display_date(date)
                )
            })
        }
        Commands::Del { index, day } => {
            let date = day.resolve(today)?;
            let result = calendar
                .apply(|store| store.delete_session(date, index))
                .await;
            report(result, |deleted| output::format_deleted(&deleted))
        }
        Commands::Edit {
            index,
            hours,
            description,
            day,
            yes,
        } => {
            let date = day.resolve(today)?;
            let confirmed = confirm_hours(hours, yes).await?;
            let result = calendar
                .apply(|store| {
                    store.edit_session(date, index, hours, description.as_str(), confirmed)
                })
                .await;
            report(result, |previous| {
                format!(
                    "Session [{index}] on {} changed from ({:.2}h, '{}') to \
                     ({hours:.2}h, '{description}').",
                    display_date(date),
                    previous.hours(),
                    previous.description()
                )
            })
        }
        Commands::Start { description } => {
            let result = calendar
                .apply(|store| store.start_stopwatch(description.as_str(), clock))
                .await;
            report(result, |_| "Starting stopwatch".to_string())
        }
        Commands::Stop {} => {
            let result = calendar.apply(|store| store.stop_stopwatch(clock)).await;
            report(result, |stopped| {
                format!(
                    "Session added to {} ({:.2}h, '{}').",
                    display_date(stopped.date),
                    stopped.hours,
                    stopped.description
                )
            })
        }
        Commands::Clear {} => {
            let result = calendar
                .apply(|store| Ok(store.clear_stopwatch()))
                .await;
            report(result, |cleared| {
                if cleared {
                    "Stopwatch cleared".to_string()
                } else {
                    "Stopwatch is not running".to_string()
                }
            })
        }
        Commands::Load { .. } | Commands::Chcol { .. } => {
            Err(anyhow!("Preference commands don't operate on a calendar"))
        }
    }
}

fn print_month<S: CalendarStorage>(
    calendar: &PersistedCalendar<S>,
    prefs: &Preferences,
    month: &MonthArgs,
) -> Result<()> {
    let (year, month) = month.resolve(Local::now().date_naive());
    let grid = calendar.store().month_grid(year, month, prefs.colour)?;
    print!("{}", output::format_month_grid(&grid, &prefs.calendar));
    Ok(())
}

/// Calendar errors are shown to the user and are not failures of the command. Failing to save is.
fn report<T>(result: Result<T, CommitError>, message: impl FnOnce(T) -> String) -> Result<()> {
    match result {
        Ok(value) => {
            let message = message(value);
            info!("{message}");
            println!("{message}");
            Ok(())
        }
        Err(CommitError::Calendar(CalendarError::ConfirmationRequired { .. })) => {
            println!("Nothing changed.");
            Ok(())
        }
        Err(CommitError::Calendar(e)) => {
            println!("{e}");
            Ok(())
        }
        Err(e @ CommitError::SaveFailure(_)) => Err(e.into()),
    }
}

/// Asks on stdin before accepting hours that are not positive.
async fn confirm_hours(hours: f64, yes: bool) -> Result<bool> {
    if hours > 0. || yes {
        return Ok(true);
    }
    let mut stdout = io::stdout();
    stdout
        .write_all(b"Hours are not positive! Are you sure you want to proceed? y/N: ")
        .await?;
    stdout.flush().await?;
    let mut answer = String::new();
    BufReader::new(io::stdin()).read_line(&mut answer).await?;
    Ok(answer.trim_start().to_lowercase().starts_with('y'))
}
