//! French date fragments to calendar dates.
//!
//! Result pages print dates as a weekday plus day number, a French month name
//! and sometimes a year ("Dimanche 30", "mars 2025"), or as `dd/mm` tokens
//! whose year comes from an enclosing week header. Everything here is pure.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::error::DateError;

/// French month names, January first. Index + 1 is the month number.
pub const MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

/// Unaccented spellings seen in hand-edited pages.
const MONTH_ALIASES: &[(&str, u32)] = &[("fevrier", 2), ("aout", 8), ("decembre", 12)];

/// Resolve a month name (case-insensitive) or a `1`-`12` numeral.
pub fn resolve_month(text: &str) -> Option<u32> {
    let lower = text.trim().to_lowercase();
    if let Some(idx) = MONTHS.iter().position(|m| *m == lower) {
        return Some(idx as u32 + 1);
    }
    if let Some((_, n)) = MONTH_ALIASES.iter().find(|(alias, _)| *alias == lower) {
        return Some(*n);
    }
    if !lower.is_empty() && lower.chars().all(|c| c.is_ascii_digit()) {
        return lower.parse::<u32>().ok().filter(|m| (1..=12).contains(m));
    }
    None
}

/// Build a calendar date from a day number, month text and year.
pub fn normalize(day: u32, month_text: &str, year: i32) -> Result<NaiveDate, DateError> {
    let month =
        resolve_month(month_text).ok_or_else(|| DateError::UnknownMonth(month_text.to_string()))?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or(DateError::InvalidDate { year, month, day })
}

/// Attach a draw hour, or midnight when the source gives none.
pub fn at_hour(date: NaiveDate, hour: Option<u32>) -> Result<NaiveDateTime, DateError> {
    let h = hour.unwrap_or(0);
    date.and_hms_opt(h, 0, 0).ok_or(DateError::InvalidHour(h))
}

/// Parse a `dd/mm/yyyy` token.
pub fn parse_dmy(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%d/%m/%Y").ok()
}

/// Split a `dd/mm` token into the day number and the month text.
pub fn split_day_month(token: &str) -> Option<(u32, String)> {
    let (day, month) = token.trim().split_once('/')?;
    let day = day.trim().parse::<u32>().ok()?;
    let month = month.trim();
    if month.is_empty() {
        return None;
    }
    Some((day, month.to_string()))
}

/// The period label a source's month selector shows for `date` ("mars 2025").
pub fn period_label(date: NaiveDate) -> String {
    format!("{} {}", MONTHS[date.month0() as usize], date.year())
}

/// Month number and year of a "<mois> <année>" period label.
pub fn parse_period(period: &str) -> Result<(u32, i32), DateError> {
    let invalid = || DateError::InvalidPeriod(period.to_string());
    let mut parts = period.split_whitespace();
    let month = parts.next().and_then(resolve_month).ok_or_else(invalid)?;
    let year = parts
        .next()
        .and_then(|y| y.parse::<i32>().ok())
        .ok_or_else(invalid)?;
    Ok((month, year))
}

/// The period immediately before `period`, in the same "<mois> <année>" form.
///
/// Callers walking history backwards use this to advance their cursor
/// between runs.
pub fn previous_period(period: &str) -> Result<String, DateError> {
    let (month, year) = parse_period(period)?;
    let (month, year) = if month == 1 {
        let year = year
            .checked_sub(1)
            .ok_or_else(|| DateError::InvalidPeriod(period.to_string()))?;
        (12, year)
    } else {
        (month - 1, year)
    };
    Ok(format!("{} {}", MONTHS[(month - 1) as usize], year))
}
