//! Calendar-week arithmetic. Every week-boundary comparison in the crate goes
//! through this module so that generation, classification, and resolution all
//! agree on where a week starts.

use chrono::{Datelike, Duration, NaiveDate};

/// Monday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(elapsed_days(date)))
}

/// Monday of the week containing `date`, as the string-sortable ISO key used
/// for `week_of` columns.
pub fn week_start_key(date: NaiveDate) -> String {
    week_start(date).format("%Y-%m-%d").to_string()
}

/// Days elapsed since Monday: 0 on Monday through 6 on Sunday.
pub fn elapsed_days(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_monday()
}
