use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use chrono::{Datelike, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScrapeError};

/// The two slash-separated encodings seen at the portal's edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateEncoding {
    /// `DD/MM/YYYY`, used by the date-picker inputs.
    DayFirst,
    /// `MM/DD/YYYY`, used by inbound requests.
    MonthFirst,
}

impl std::fmt::Display for DateEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DayFirst => write!(f, "day-first"),
            Self::MonthFirst => write!(f, "month-first"),
        }
    }
}

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A calendar date that remembers which encoding it was read from.
///
/// Equality, ordering and hashing only look at the calendar date.
#[derive(Debug, Clone, Copy)]
pub struct DateValue {
    date: NaiveDate,
    source: DateEncoding,
}

impl DateValue {
    pub fn new(date: NaiveDate, source: DateEncoding) -> Self {
        Self { date, source }
    }

    pub fn naive(&self) -> NaiveDate {
        self.date
    }

    pub fn source(&self) -> DateEncoding {
        self.source
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[self.date.month0() as usize]
    }

    /// Same encoding, `days` later. `None` past the end of the calendar.
    pub fn plus_days(&self, days: i64) -> Option<Self> {
        self.date
            .checked_add_signed(TimeDelta::days(days))
            .map(|date| Self::new(date, self.source))
    }

    /// Whole days from `self` to `other`.
    pub fn days_until(&self, other: &Self) -> i64 {
        (other.date - self.date).num_days()
    }
}

impl PartialEq for DateValue {
    fn eq(&self, other: &Self) -> bool {
        self.date == other.date
    }
}

impl Eq for DateValue {}

impl PartialOrd for DateValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DateValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.date.cmp(&other.date)
    }
}

impl Hash for DateValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.date.hash(state);
    }
}

impl std::fmt::Display for DateValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&to_display_string(self, self.source, true))
    }
}

impl Serialize for DateValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// 1-based month index for a full English month name, case-insensitive.
pub fn month_index(name: &str) -> Option<u32> {
    let name = name.trim();
    MONTH_NAMES
        .iter()
        .position(|m| m.eq_ignore_ascii_case(name))
        .and_then(|i| u32::try_from(i + 1).ok())
}

/// Signed month distance from the displayed month to the target month.
///
/// Positive: the target is earlier, navigate backward ("previous").
/// Negative: the target is later, navigate forward ("next").
pub fn months_between(
    current_month: &str,
    current_year: i32,
    target_month: &str,
    target_year: i32,
) -> Result<i32> {
    let current = month_index(current_month).ok_or_else(|| unknown_month(current_month))?;
    let target = month_index(target_month).ok_or_else(|| unknown_month(target_month))?;
    let current_abs = current_year * 12 + i32::try_from(current).unwrap_or_default();
    let target_abs = target_year * 12 + i32::try_from(target).unwrap_or_default();
    Ok(current_abs - target_abs)
}

fn unknown_month(name: &str) -> ScrapeError {
    ScrapeError::Format {
        input: name.to_string(),
        reason: "unknown month name".into(),
    }
}

/// Split a calendar header such as `"January 2024"` into month name and year.
pub fn parse_month_header(header: &str) -> Result<(String, i32)> {
    let mut parts = header.split_whitespace();
    let (Some(month), Some(year), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ScrapeError::Format {
            input: header.to_string(),
            reason: "expected '<Month> <Year>'".into(),
        });
    };
    if month_index(month).is_none() {
        return Err(unknown_month(month));
    }
    let year = year.parse::<i32>().map_err(|_| ScrapeError::Format {
        input: header.to_string(),
        reason: format!("'{year}' is not a year"),
    })?;
    Ok((month.to_string(), year))
}

/// Parse a slash-separated date under the given encoding.
pub fn normalize_date(raw: &str, encoding: DateEncoding) -> Result<DateValue> {
    let fail = |reason: &str| ScrapeError::Format {
        input: raw.to_string(),
        reason: reason.to_string(),
    };

    let parts: Vec<&str> = raw.trim().split('/').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(fail("expected three slash-separated parts"));
    }
    if parts
        .iter()
        .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
    {
        return Err(fail("every part must be numeric"));
    }

    let (day_part, month_part) = match encoding {
        DateEncoding::DayFirst => (parts[0], parts[1]),
        DateEncoding::MonthFirst => (parts[1], parts[0]),
    };
    let day: u32 = day_part.parse().map_err(|_| fail("day is not a number"))?;
    let month: u32 = month_part
        .parse()
        .map_err(|_| fail("month is not a number"))?;
    let year: i32 = parts[2].parse().map_err(|_| fail("year is not a number"))?;

    if !(1..=31).contains(&day) {
        return Err(fail("day must be between 1 and 31"));
    }
    if !(1..=12).contains(&month) {
        return Err(fail("month must be between 1 and 12"));
    }
    if !(1..=9999).contains(&year) {
        return Err(fail("year must be between 1 and 9999"));
    }

    let date =
        NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| fail("no such calendar day"))?;
    Ok(DateValue::new(date, encoding))
}

/// Render a date the way the portal might: padded (`05/01/2024`) or not (`5/1/2024`).
pub fn to_display_string(date: &DateValue, encoding: DateEncoding, zero_padded: bool) -> String {
    let (first, second) = match encoding {
        DateEncoding::DayFirst => (date.day(), date.month()),
        DateEncoding::MonthFirst => (date.month(), date.day()),
    };
    if zero_padded {
        format!("{first:02}/{second:02}/{:04}", date.year())
    } else {
        format!("{first}/{second}/{}", date.year())
    }
}

/// Both renderings the portal has been observed to use for one date.
pub fn display_variants(date: &DateValue, encoding: DateEncoding) -> [String; 2] {
    [
        to_display_string(date, encoding, true),
        to_display_string(date, encoding, false),
    ]
}

/// Whether `shown` is one of the accepted renderings of `date`.
pub fn matches_display(shown: &str, date: &DateValue, encoding: DateEncoding) -> bool {
    let shown = shown.trim();
    display_variants(date, encoding).iter().any(|v| v == shown)
}
