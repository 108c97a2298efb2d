//! Calendar arithmetic shared by the snapshot, the resolver and the views.
//!
//! Everything here is date-only: schedule rules recur on a weekday and are
//! bounded by calendar dates, so time-of-day never takes part in eligibility.
//! Inputs that carry a time (an exclusion stored as a timestamp, a
//! `valid_until` saved as `2026-05-31T23:59:59`) are truncated to their
//! calendar day when they are parsed.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};

/// Number of distinct weekday buckets.
pub const DAYS_PER_WEEK: usize = 7;

// ── Configurable week start ─────────────────────────────────────────────────

/// Which weekday is numbered `0` in a rule's `weekday` field.
///
/// The rule store numbers weekdays from Sunday, so that is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStartDay {
    /// US/Canada convention (Sunday = 0, Saturday = 6).
    #[default]
    Sunday,
    /// ISO 8601 convention (Monday = 0, Sunday = 6).
    Monday,
}

/// Options for [`resolve_window_with_options`](crate::resolver::resolve_window_with_options).
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// How weekday numbers are interpreted.
    pub week_start: WeekStartDay,
}

/// The weekday number (0–6) of `date` under the given numbering.
pub fn weekday_number(date: NaiveDate, week_start: WeekStartDay) -> u8 {
    days_from_week_start(date.weekday(), week_start)
}

/// How many days `weekday` is from the week-start day.
fn days_from_week_start(weekday: Weekday, week_start: WeekStartDay) -> u8 {
    let days = match week_start {
        WeekStartDay::Sunday => weekday.num_days_from_sunday(),
        WeekStartDay::Monday => weekday.num_days_from_monday(),
    };
    // num_days_from_* is always 0..=6
    days as u8
}

/// `date + days`, or `None` past the last representable date.
pub fn add_days(date: NaiveDate, days: u64) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(days))
}

// ── Date parsing ────────────────────────────────────────────────────────────

/// Parse a window anchor given as `YYYY-MM-DD`.
///
/// # Errors
///
/// Returns [`ScheduleError::InvalidArgument`] if `s` is not a valid calendar date.
///
/// # Examples
///
/// ```
/// use schedule_engine::calendar::parse_anchor_date;
///
/// let anchor = parse_anchor_date("2026-10-19").unwrap();
/// assert_eq!(anchor.to_string(), "2026-10-19");
/// assert!(parse_anchor_date("2026-02-30").is_err());
/// ```
pub fn parse_anchor_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| ScheduleError::InvalidArgument(format!("anchor date '{}': {}", s, e)))
}

/// Parse a stored date, dropping any time-of-day component.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 (`2026-03-04T18:00:00+01:00`, whose local
/// date is kept) and naive ISO datetimes with either a `T` or a space
/// separator.
pub fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}

/// Serde adapters that read stored dates through [`parse_calendar_date`].
pub(crate) mod serde_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer};

    use super::parse_calendar_date;

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_calendar_date(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid calendar date '{raw}'")))
    }

    pub mod option {
        use super::*;

        pub fn deserialize<'de, D>(
            deserializer: D,
        ) -> std::result::Result<Option<NaiveDate>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                None => Ok(None),
                Some(raw) => parse_calendar_date(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid calendar date '{raw}'"))),
            }
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
