use chrono::{Datelike, Duration, Local, Months, NaiveDate};

/// Today's date in the user's local calendar, unless `as_of` overrides it.
pub fn today(as_of: Option<NaiveDate>) -> NaiveDate {
    as_of.unwrap_or_else(|| Local::now().date_naive())
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Parse a strict `DD/MM/YYYY` date, as found in spreadsheet cells.
pub fn parse_day_month_year(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let bytes = s.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes[2] == b'/'
        && bytes[5] == b'/'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 2 || i == 5 || b.is_ascii_digit());
    if !shape_ok {
        return None;
    }
    NaiveDate::parse_from_str(s, "%d/%m/%Y").ok()
}

/// Parse a `YYYY-MM` month into its first day.
pub fn parse_month(s: &str) -> Option<NaiveDate> {
    let (year, month) = s.trim().split_once('-')?;
    if year.len() != 4 || month.len() != 2 {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
}

pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last day of the month containing `date`.
pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    let days = days_in_month(date.year(), date.month());
    date.with_day(days).unwrap_or(date)
}

/// The Sunday closing the ISO week that contains `date`.
pub fn end_of_week(date: NaiveDate) -> NaiveDate {
    let days_left = 6 - date.weekday().num_days_from_monday();
    date + Duration::days(days_left as i64)
}

/// Every day of the month containing `date`, in order.
pub fn month_days(date: NaiveDate) -> Vec<NaiveDate> {
    let first = start_of_month(date);
    let last = end_of_month(date);
    first.iter_days().take_while(|d| *d <= last).collect()
}

/// Add N months, clamping the day to the last valid day of the target month
/// (e.g., Dec 31 plus 2 months = Feb 28). Saturates at the last representable
/// date.
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months)).unwrap_or(NaiveDate::MAX)
}

/// Returns the number of days in a given month.
fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}
