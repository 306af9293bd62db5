//! Month arithmetic on `chrono::NaiveDate`.

use chrono::{Datelike, Days, Months, NaiveDate};

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(date.day0())))
        .unwrap_or(date)
}

/// First day of the month `months` months before the month containing `date`.
pub fn months_back(date: NaiveDate, months: u32) -> NaiveDate {
    let start = month_start(date);
    start.checked_sub_months(Months::new(months)).unwrap_or(start)
}

/// Today's date in UTC.
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}
