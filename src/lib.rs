//! Calendar for logging hours of work. Sessions are recorded against dates, summed per day, week
//! and month, and a stopwatch can turn clocked time into a session.
//!

pub mod calendar;
pub mod cli;
pub mod storage;
pub mod utils;
