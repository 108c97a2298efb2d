//! Window resolution: which rules are in effect on each date of a window.
//!
//! All functions are pure over a [`RuleSnapshot`]. They read no clock and do
//! no I/O; the caller picks the anchor date (see [`crate::clock`]) and passes
//! in a fully materialized snapshot.
//!
//! For each date the resolver looks up the snapshot bucket for that date's
//! weekday, keeps the rules that pass the caller's filter and are eligible on
//! the date, and flags the ones whose exclusion set contains the date.
//! Excluded rules stay in `entries`; they only stop counting towards
//! `has_active_entry`.

use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::{add_days, weekday_number, ResolveOptions};
use crate::error::{Result, ScheduleError};
use crate::model::ScheduleRule;
use crate::snapshot::RuleSnapshot;

/// A rule eligible on a resolved date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedEntry {
    #[serde(flatten)]
    pub rule: ScheduleRule,
    /// The rule has an exclusion on this exact date.
    pub is_excluded_today: bool,
}

/// Resolution result for one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDay {
    pub date: NaiveDate,
    /// 0–6 under the snapshot's numbering.
    pub weekday: u8,
    /// At least one entry is not excluded today.
    pub has_active_entry: bool,
    /// There are entries and every one of them is excluded today.
    pub is_fully_excluded: bool,
    /// Eligible rules in store order, excluded ones included.
    pub entries: Vec<ResolvedEntry>,
}

impl ResolvedDay {
    /// Entries not excluded on this date, in store order.
    pub fn active_entries(&self) -> impl Iterator<Item = &ResolvedEntry> {
        self.entries.iter().filter(|e| !e.is_excluded_today)
    }

    pub fn first_active_entry(&self) -> Option<&ResolvedEntry> {
        self.active_entries().next()
    }
}

/// Resolve `window_days` consecutive dates starting at `anchor` over every
/// rule in the snapshot.
///
/// # Errors
///
/// Returns [`ScheduleError::InvalidArgument`] if `window_days` is zero or
/// negative, or if the window runs past the last representable date.
///
/// # Examples
///
/// ```
/// use chrono::{NaiveDate, NaiveTime};
/// use schedule_engine::{resolve_window, ExclusionDate, RuleSnapshot, ScheduleRule};
///
/// let evening = NaiveTime::from_hms_opt(18, 0, 0).unwrap();
/// let late = NaiveTime::from_hms_opt(21, 0, 0).unwrap();
/// // Wednesday Oct 21 2026 is excluded
/// let wednesday = NaiveDate::from_ymd_opt(2026, 10, 21).unwrap();
/// let snapshot = RuleSnapshot::build(
///     vec![ScheduleRule::new(1, 3, "Open gym", evening, late)],
///     vec![ExclusionDate::new(1, wednesday)],
/// )
/// .unwrap();
///
/// let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
/// let days = resolve_window(&snapshot, monday, 7).unwrap();
/// assert_eq!(days.len(), 7);
/// assert_eq!(days[2].date, wednesday);
/// assert!(days[2].is_fully_excluded);
/// assert!(!days[2].has_active_entry);
/// ```
pub fn resolve_window(
    snapshot: &RuleSnapshot,
    anchor: NaiveDate,
    window_days: i64,
) -> Result<Vec<ResolvedDay>> {
    resolve_window_with_filter(snapshot, anchor, window_days, |_| true)
}

/// Like [`resolve_window`], but only rules for which `filter` returns `true`
/// take part (e.g. one owner group or one location).
///
/// The full window is always computed; stopping at the first open day is up
/// to the caller.
pub fn resolve_window_with_filter<F>(
    snapshot: &RuleSnapshot,
    anchor: NaiveDate,
    window_days: i64,
    filter: F,
) -> Result<Vec<ResolvedDay>>
where
    F: Fn(&ScheduleRule) -> bool,
{
    let options = ResolveOptions {
        week_start: snapshot.week_start(),
    };
    resolve_window_with_options(snapshot, anchor, window_days, filter, &options)
}

/// Resolve a window with explicit options.
///
/// # Errors
///
/// In addition to the [`resolve_window`] errors, returns
/// [`ScheduleError::InvalidArgument`] if `options.week_start` differs from
/// the numbering the snapshot was built with, since the weekday buckets
/// would then be looked up under the wrong numbers.
pub fn resolve_window_with_options<F>(
    snapshot: &RuleSnapshot,
    anchor: NaiveDate,
    window_days: i64,
    filter: F,
    options: &ResolveOptions,
) -> Result<Vec<ResolvedDay>>
where
    F: Fn(&ScheduleRule) -> bool,
{
    let day_count = validate_window(anchor, window_days)?;
    if options.week_start != snapshot.week_start() {
        return Err(ScheduleError::InvalidArgument(format!(
            "week start {:?} does not match snapshot numbering {:?}",
            options.week_start,
            snapshot.week_start()
        )));
    }

    let days = (0..day_count)
        .map(|offset| {
            add_days(anchor, offset).map(|date| resolve_day(snapshot, date, &filter, options))
        })
        .collect::<Option<Vec<ResolvedDay>>>()
        .ok_or_else(|| past_last_date(anchor, window_days))?;

    tracing::trace!(
        %anchor,
        window_days,
        entries = days.iter().map(|d| d.entries.len()).sum::<usize>(),
        "Resolved schedule window"
    );

    Ok(days)
}

/// Check the window length and that its last date exists.
fn validate_window(anchor: NaiveDate, window_days: i64) -> Result<u64> {
    if window_days <= 0 {
        return Err(ScheduleError::InvalidArgument(format!(
            "window length must be positive, got {window_days}"
        )));
    }
    let day_count = window_days.unsigned_abs();
    if add_days(anchor, day_count - 1).is_none() {
        return Err(past_last_date(anchor, window_days));
    }
    Ok(day_count)
}

fn past_last_date(anchor: NaiveDate, window_days: i64) -> ScheduleError {
    ScheduleError::InvalidArgument(format!(
        "a {window_days}-day window from {anchor} runs past the last supported date"
    ))
}

fn resolve_day<F>(
    snapshot: &RuleSnapshot,
    date: NaiveDate,
    filter: &F,
    options: &ResolveOptions,
) -> ResolvedDay
where
    F: Fn(&ScheduleRule) -> bool,
{
    let weekday = weekday_number(date, options.week_start);

    let entries: Vec<ResolvedEntry> = snapshot
        .rules_for_weekday(weekday)
        .iter()
        .filter(|candidate| filter(&candidate.rule) && candidate.rule.is_eligible_on(date))
        .map(|candidate| ResolvedEntry {
            rule: candidate.rule.clone(),
            is_excluded_today: candidate.is_excluded_on(date),
        })
        .collect();

    let has_active_entry = entries.iter().any(|e| !e.is_excluded_today);
    let is_fully_excluded = !entries.is_empty() && !has_active_entry;

    ResolvedDay {
        date,
        weekday,
        has_active_entry,
        is_fully_excluded,
        entries,
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::WeekStartDay;
    use crate::model::{ExclusionDate, OwnerGroupRef, RuleId};
    use chrono::NaiveTime;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rule(id: RuleId, weekday: u8) -> ScheduleRule {
        ScheduleRule::new(
            id,
            weekday,
            format!("rule {id}"),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
        )
    }

    /// Monday, October 19, 2026.
    fn monday() -> NaiveDate {
        date(2026, 10, 19)
    }

    /// Wednesday, October 21, 2026.
    fn wednesday() -> NaiveDate {
        date(2026, 10, 21)
    }

    fn ids(day: &ResolvedDay) -> Vec<RuleId> {
        day.entries.iter().map(|e| e.rule.id).collect()
    }

    // ── window shape ────────────────────────────────────────────────────

    #[test]
    fn test_window_has_requested_length_and_consecutive_dates() {
        let snapshot = RuleSnapshot::empty();
        let days = resolve_window(&snapshot, monday(), 14).unwrap();
        assert_eq!(days.len(), 14);
        for (i, day) in days.iter().enumerate() {
            assert_eq!(day.date, add_days(monday(), i as u64).unwrap());
        }
    }

    #[test]
    fn test_weekday_numbers_follow_sunday_start() {
        let days = resolve_window(&RuleSnapshot::empty(), monday(), 7).unwrap();
        let weekdays: Vec<u8> = days.iter().map(|d| d.weekday).collect();
        assert_eq!(weekdays, vec![1, 2, 3, 4, 5, 6, 0]);
    }

    #[test]
    fn test_window_crosses_year_boundary() {
        let days = resolve_window(&RuleSnapshot::empty(), date(2026, 12, 30), 4).unwrap();
        assert_eq!(days[3].date, date(2027, 1, 2));
    }

    // ── scenarios ───────────────────────────────────────────────────────

    #[test]
    fn test_partial_exclusion_keeps_day_active() {
        let snapshot = RuleSnapshot::build(
            vec![rule(1, 3), rule(2, 3)],
            vec![ExclusionDate::new(2, wednesday())],
        )
        .unwrap();
        let days = resolve_window(&snapshot, monday(), 7).unwrap();
        let wed = &days[2];
        assert_eq!(wed.date, wednesday());
        assert_eq!(ids(wed), vec![1, 2]);
        assert!(!wed.entries[0].is_excluded_today);
        assert!(wed.entries[1].is_excluded_today);
        assert!(wed.has_active_entry);
        assert!(!wed.is_fully_excluded);
    }

    #[test]
    fn test_single_excluded_rule_marks_day_fully_excluded() {
        let snapshot =
            RuleSnapshot::build(vec![rule(3, 3)], vec![ExclusionDate::new(3, wednesday())])
                .unwrap();
        let days = resolve_window(&snapshot, monday(), 7).unwrap();
        let wed = &days[2];
        assert_eq!(ids(wed), vec![3]);
        assert!(wed.entries[0].is_excluded_today);
        assert!(!wed.has_active_entry);
        assert!(wed.is_fully_excluded);
    }

    #[test]
    fn test_exclusion_only_affects_its_date() {
        let snapshot =
            RuleSnapshot::build(vec![rule(3, 3)], vec![ExclusionDate::new(3, wednesday())])
                .unwrap();
        let days = resolve_window(&snapshot, monday(), 14).unwrap();
        let next_wed = &days[9];
        assert_eq!(next_wed.date, date(2026, 10, 28));
        assert!(next_wed.has_active_entry);
        assert!(!next_wed.entries[0].is_excluded_today);
    }

    #[test]
    fn test_no_rules_yields_empty_days() {
        let days = resolve_window(&RuleSnapshot::empty(), monday(), 10).unwrap();
        assert_eq!(days.len(), 10);
        assert!(days
            .iter()
            .all(|d| !d.has_active_entry && !d.is_fully_excluded && d.entries.is_empty()));
    }

    #[test]
    fn test_valid_until_today_is_inclusive() {
        // One rule per weekday, all ending on Monday Oct 26
        let until = date(2026, 10, 26);
        let rules: Vec<ScheduleRule> = (0..7u8)
            .map(|wd| ScheduleRule {
                valid_until: Some(until),
                ..rule(u64::from(wd) + 1, wd)
            })
            .collect();
        let snapshot = RuleSnapshot::build(rules, vec![]).unwrap();
        let days = resolve_window(&snapshot, until, 2).unwrap();
        assert!(days[0].has_active_entry);
        assert!(days[1].entries.is_empty());
        assert!(!days[1].has_active_entry);
        assert!(!days[1].is_fully_excluded);
    }

    #[test]
    fn test_valid_from_excludes_earlier_dates() {
        let snapshot = RuleSnapshot::build(
            vec![ScheduleRule {
                valid_from: Some(date(2026, 10, 28)),
                ..rule(1, 3)
            }],
            vec![],
        )
        .unwrap();
        let days = resolve_window(&snapshot, monday(), 14).unwrap();
        assert!(days[2].entries.is_empty());
        assert_eq!(ids(&days[9]), vec![1]);
    }

    #[test]
    fn test_inactive_and_ended_rules_never_appear() {
        let snapshot = RuleSnapshot::build(
            vec![
                ScheduleRule {
                    active: false,
                    ..rule(1, 3)
                },
                ScheduleRule {
                    is_ended: true,
                    ..rule(2, 3)
                },
                rule(3, 3),
            ],
            vec![],
        )
        .unwrap();
        let days = resolve_window(&snapshot, monday(), 7).unwrap();
        assert_eq!(ids(&days[2]), vec![3]);
    }

    #[test]
    fn test_ineligible_excluded_rule_does_not_mark_day_excluded() {
        let snapshot = RuleSnapshot::build(
            vec![ScheduleRule {
                active: false,
                ..rule(1, 3)
            }],
            vec![ExclusionDate::new(1, wednesday())],
        )
        .unwrap();
        let days = resolve_window(&snapshot, monday(), 7).unwrap();
        assert!(days[2].entries.is_empty());
        assert!(!days[2].is_fully_excluded);
    }

    #[test]
    fn test_entries_keep_store_order() {
        let snapshot =
            RuleSnapshot::build(vec![rule(30, 3), rule(10, 3), rule(20, 3)], vec![]).unwrap();
        let days = resolve_window(&snapshot, monday(), 7).unwrap();
        assert_eq!(ids(&days[2]), vec![30, 10, 20]);
    }

    // ── filtering ───────────────────────────────────────────────────────

    #[test]
    fn test_filter_narrows_to_owner_group() {
        let crew = OwnerGroupRef {
            id: 4,
            name: "Crew".to_string(),
            short_code: Some("CR".to_string()),
            description: None,
        };
        let snapshot = RuleSnapshot::build(
            vec![
                rule(1, 3),
                ScheduleRule {
                    owner_group: Some(crew),
                    ..rule(2, 3)
                },
            ],
            vec![],
        )
        .unwrap();
        let days = resolve_window_with_filter(&snapshot, monday(), 7, |r| {
            r.owner_group.as_ref().is_some_and(|g| g.id == 4)
        })
        .unwrap();
        assert_eq!(days.len(), 7);
        assert_eq!(ids(&days[2]), vec![2]);
    }

    #[test]
    fn test_first_active_entry_skips_excluded() {
        let snapshot = RuleSnapshot::build(
            vec![rule(1, 3), rule(2, 3)],
            vec![ExclusionDate::new(1, wednesday())],
        )
        .unwrap();
        let days = resolve_window(&snapshot, monday(), 7).unwrap();
        assert_eq!(days[2].first_active_entry().map(|e| e.rule.id), Some(2));
        assert_eq!(days[0].first_active_entry(), None);
    }

    // ── numbering ───────────────────────────────────────────────────────

    #[test]
    fn test_monday_numbering_snapshot() {
        let snapshot =
            RuleSnapshot::build_with_week_start(vec![rule(1, 2)], vec![], WeekStartDay::Monday)
                .unwrap();
        let days = resolve_window(&snapshot, monday(), 7).unwrap();
        // weekday 2 counted from Monday is Wednesday
        assert_eq!(days[0].weekday, 0);
        assert_eq!(ids(&days[2]), vec![1]);
    }

    #[test]
    fn test_numbering_mismatch_rejected() {
        let options = ResolveOptions {
            week_start: WeekStartDay::Monday,
        };
        let err =
            resolve_window_with_options(&RuleSnapshot::empty(), monday(), 7, |_| true, &options)
                .unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidArgument(_)));
    }

    // ── errors ──────────────────────────────────────────────────────────

    #[test]
    fn test_zero_window_rejected() {
        let err = resolve_window(&RuleSnapshot::empty(), monday(), 0).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidArgument(_)));
    }

    #[test]
    fn test_negative_window_rejected() {
        let err = resolve_window(&RuleSnapshot::empty(), monday(), -7).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidArgument(_)));
    }

    #[test]
    fn test_window_past_last_date_rejected() {
        let err = resolve_window(&RuleSnapshot::empty(), NaiveDate::MAX, 2).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidArgument(_)));
    }

    #[test]
    fn test_single_day_at_last_date_allowed() {
        let days = resolve_window(&RuleSnapshot::empty(), NaiveDate::MAX, 1).unwrap();
        assert_eq!(days[0].date, NaiveDate::MAX);
    }

    #[test]
    fn test_huge_window_rejected_without_panic() {
        let err = resolve_window(&RuleSnapshot::empty(), monday(), i64::MAX).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidArgument(_)));
    }
}
