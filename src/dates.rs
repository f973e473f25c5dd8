use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

pub const DISPLAY_FORMAT: &str = "%d/%m/%Y";

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{2})/([0-9]{2})/([0-9]{4})$").expect("valid date regex"));

/// Parses a strict `dd/mm/yyyy` string into a calendar date.
///
/// Returns `None` when the pattern does not match or the date does not exist
/// (e.g. `31/02/2024`). Year `0000` is rejected.
#[must_use]
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let caps = DATE_PATTERN.captures(input)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;

    if year < 1 {
        return None;
    }

    NaiveDate::from_ymd_opt(year, month, day)
}

#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}
