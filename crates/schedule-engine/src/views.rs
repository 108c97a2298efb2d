//! Caller-side views over resolved windows.
//!
//! These are what the presentation layer asks for: the site-wide week page,
//! a location's upcoming days, and one owner group's window. Display fields
//! (time range text, owner label) are derived here from the resolver output
//! and the rule's cached owner-group reference; nothing is stored back on the
//! rule.

use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::add_days;
use crate::clock::Clock;
use crate::error::{Result, ScheduleError};
use crate::model::RuleId;
use crate::resolver::{resolve_window, resolve_window_with_filter, ResolvedDay, ResolvedEntry};
use crate::snapshot::RuleSnapshot;

/// Days shown on the week page.
pub const WEEK_VIEW_DAYS: i64 = 7;
/// Days shown on a location's detail page.
pub const LOCATION_VIEW_DAYS: i64 = 14;

const TIME_FORMAT: &str = "%H:%M";

/// One rule as the presentation layer renders it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayEntry {
    pub rule_id: RuleId,
    pub name: String,
    pub description: Option<String>,
    /// `"18:00-21:00"`.
    pub time_range: String,
    /// `"Crew (CR)"`, or the bare group name without a short code.
    pub owner_label: Option<String>,
    pub location_id: Option<u64>,
    pub is_excluded_today: bool,
}

impl From<&ResolvedEntry> for DisplayEntry {
    fn from(entry: &ResolvedEntry) -> Self {
        let rule = &entry.rule;
        let owner_label = rule.owner_group.as_ref().map(|group| {
            match group.short_code.as_deref().filter(|code| !code.is_empty()) {
                Some(code) => format!("{} ({})", group.name, code),
                None => group.name.clone(),
            }
        });
        Self {
            rule_id: rule.id,
            name: rule.name.clone(),
            description: rule.description.clone(),
            time_range: format!(
                "{}-{}",
                rule.start_time.format(TIME_FORMAT),
                rule.end_time.format(TIME_FORMAT)
            ),
            owner_label,
            location_id: rule.location_id,
            is_excluded_today: entry.is_excluded_today,
        }
    }
}

/// A resolved day with display entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayDay {
    pub date: NaiveDate,
    pub weekday: u8,
    pub has_active_entry: bool,
    pub is_fully_excluded: bool,
    pub entries: Vec<DisplayEntry>,
}

impl From<&ResolvedDay> for DisplayDay {
    fn from(day: &ResolvedDay) -> Self {
        Self {
            date: day.date,
            weekday: day.weekday,
            has_active_entry: day.has_active_entry,
            is_fully_excluded: day.is_fully_excluded,
            entries: day.entries.iter().map(DisplayEntry::from).collect(),
        }
    }
}

/// The site-wide week page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekView {
    /// The offset actually used, after clamping.
    pub week_offset: i64,
    pub anchor: NaiveDate,
    pub days: Vec<DisplayDay>,
}

/// One day on a location's page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationDay {
    pub date: NaiveDate,
    pub weekday: u8,
    /// The first entry not excluded on this date.
    pub slot: Option<DisplayEntry>,
    /// Something was scheduled but every entry is excluded.
    pub is_closed: bool,
}

/// Resolve the 7-day week page `week_offset` weeks from today.
///
/// Negative offsets are clamped to 0, so the page never shows past weeks.
///
/// # Errors
///
/// Returns [`ScheduleError::InvalidArgument`] if the offset moves the anchor
/// past the last representable date.
pub fn week_view(
    snapshot: &RuleSnapshot,
    clock: &dyn Clock,
    week_offset: i64,
) -> Result<WeekView> {
    let week_offset = week_offset.max(0);
    let today = clock.today();
    let anchor = week_offset
        .unsigned_abs()
        .checked_mul(7)
        .and_then(|days| add_days(today, days))
        .ok_or_else(|| {
            ScheduleError::InvalidArgument(format!(
                "week offset {week_offset} from {today} is out of range"
            ))
        })?;

    let days = resolve_window(snapshot, anchor, WEEK_VIEW_DAYS)?;
    Ok(WeekView {
        week_offset,
        anchor,
        days: days.iter().map(DisplayDay::from).collect(),
    })
}

/// Resolve the next 14 days of a location, starting today.
///
/// Only rules linked to `location_id` take part, and each day shows the
/// first entry that is not excluded. A location normally has at most one
/// rule per weekday, but that is not enforced here.
pub fn location_view(
    snapshot: &RuleSnapshot,
    clock: &dyn Clock,
    location_id: u64,
) -> Result<Vec<LocationDay>> {
    let days = resolve_window_with_filter(snapshot, clock.today(), LOCATION_VIEW_DAYS, |rule| {
        rule.location_id == Some(location_id)
    })?;

    Ok(days
        .iter()
        .map(|day| LocationDay {
            date: day.date,
            weekday: day.weekday,
            slot: day.first_active_entry().map(DisplayEntry::from),
            is_closed: day.is_fully_excluded,
        })
        .collect())
}

/// Resolve a window starting today, narrowed to one owner group.
pub fn owner_group_view(
    snapshot: &RuleSnapshot,
    clock: &dyn Clock,
    group_id: u64,
    window_days: i64,
) -> Result<Vec<ResolvedDay>> {
    resolve_window_with_filter(snapshot, clock.today(), window_days, |rule| {
        rule.owner_group.as_ref().is_some_and(|group| group.id == group_id)
    })
}

/// The first day in `days` with an entry that is not excluded.
pub fn next_open_day(days: &[ResolvedDay]) -> Option<&ResolvedDay> {
    days.iter().find(|day| day.has_active_entry)
}
