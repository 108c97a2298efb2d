//! Materialized, weekday-grouped view of the rule store.
//!
//! The store hands over every rule and every exclusion once; building a
//! [`RuleSnapshot`] groups the rules into seven weekday buckets (keeping the
//! store's order inside each bucket) and attaches each rule's exclusion dates
//! to it. Resolution then only ever touches the bucket for the weekday being
//! resolved and never goes back to the store.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::calendar::{WeekStartDay, DAYS_PER_WEEK};
use crate::error::{Result, ScheduleError};
use crate::model::{ExclusionDate, RuleId, ScheduleRule};

/// A rule together with the dates on which it is suppressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRule {
    pub rule: ScheduleRule,
    pub exclusions: BTreeSet<NaiveDate>,
}

impl SnapshotRule {
    pub fn is_excluded_on(&self, date: NaiveDate) -> bool {
        self.exclusions.contains(&date)
    }
}

/// Read-only snapshot of all rules, bucketed by weekday number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSnapshot {
    week_start: WeekStartDay,
    by_weekday: [Vec<SnapshotRule>; DAYS_PER_WEEK],
}

/// On-disk / wire layout of a snapshot.
#[derive(Debug, Deserialize)]
struct SnapshotDocument {
    #[serde(default)]
    rules: Vec<ScheduleRule>,
    #[serde(default)]
    exclusions: Vec<ExclusionDate>,
}

impl RuleSnapshot {
    /// Build a snapshot whose weekday numbers start at Sunday.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidSnapshot`] if a rule's weekday is
    /// outside 0–6 or two rules share an id.
    pub fn build(rules: Vec<ScheduleRule>, exclusions: Vec<ExclusionDate>) -> Result<Self> {
        Self::build_with_week_start(rules, exclusions, WeekStartDay::default())
    }

    /// Build a snapshot with an explicit weekday numbering.
    ///
    /// Exclusions for rule ids that are not in `rules` are dropped; they
    /// could never suppress anything.
    pub fn build_with_week_start(
        rules: Vec<ScheduleRule>,
        exclusions: Vec<ExclusionDate>,
        week_start: WeekStartDay,
    ) -> Result<Self> {
        let mut by_weekday: [Vec<SnapshotRule>; DAYS_PER_WEEK] =
            std::array::from_fn(|_| Vec::new());
        let mut positions: HashMap<RuleId, (usize, usize)> = HashMap::with_capacity(rules.len());

        for rule in rules {
            let bucket = usize::from(rule.weekday);
            if bucket >= DAYS_PER_WEEK {
                return Err(ScheduleError::InvalidSnapshot(format!(
                    "rule {} has weekday {}, expected 0-6",
                    rule.id, rule.weekday
                )));
            }
            if positions.contains_key(&rule.id) {
                return Err(ScheduleError::InvalidSnapshot(format!(
                    "duplicate rule id {}",
                    rule.id
                )));
            }
            positions.insert(rule.id, (bucket, by_weekday[bucket].len()));
            by_weekday[bucket].push(SnapshotRule {
                rule,
                exclusions: BTreeSet::new(),
            });
        }

        let mut orphaned = 0usize;
        for exclusion in exclusions {
            match positions.get(&exclusion.rule_id) {
                Some(&(bucket, index)) => {
                    by_weekday[bucket][index].exclusions.insert(exclusion.date);
                }
                None => {
                    orphaned += 1;
                    tracing::debug!(
                        rule_id = exclusion.rule_id,
                        date = %exclusion.date,
                        "Dropping exclusion for unknown rule"
                    );
                }
            }
        }

        tracing::debug!(
            rules = positions.len(),
            orphaned_exclusions = orphaned,
            ?week_start,
            "Built rule snapshot"
        );

        Ok(Self {
            week_start,
            by_weekday,
        })
    }

    /// Parse a `{"rules": [...], "exclusions": [...]}` document.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidSnapshot`] for malformed JSON or any
    /// error [`RuleSnapshot::build`] reports.
    ///
    /// # Examples
    ///
    /// ```
    /// use schedule_engine::RuleSnapshot;
    ///
    /// let snapshot = RuleSnapshot::from_json(r#"{
    ///     "rules": [{"id": 1, "weekday": 3, "name": "Open gym",
    ///                "start_time": "18:00:00", "end_time": "21:00:00"}],
    ///     "exclusions": [{"rule_id": 1, "date": "2026-10-21"}]
    /// }"#).unwrap();
    /// assert_eq!(snapshot.rule_count(), 1);
    /// assert_eq!(snapshot.rules_for_weekday(3).len(), 1);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_json_with_week_start(json, WeekStartDay::default())
    }

    pub fn from_json_with_week_start(json: &str, week_start: WeekStartDay) -> Result<Self> {
        let doc: SnapshotDocument = serde_json::from_str(json)
            .map_err(|e| ScheduleError::InvalidSnapshot(e.to_string()))?;
        Self::build_with_week_start(doc.rules, doc.exclusions, week_start)
    }

    /// A snapshot with no rules.
    pub fn empty() -> Self {
        Self {
            week_start: WeekStartDay::default(),
            by_weekday: std::array::from_fn(|_| Vec::new()),
        }
    }

    pub fn week_start(&self) -> WeekStartDay {
        self.week_start
    }

    /// Rules recurring on `weekday`, in store order. Empty for numbers above 6.
    pub fn rules_for_weekday(&self, weekday: u8) -> &[SnapshotRule] {
        self.by_weekday
            .get(usize::from(weekday))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every rule, bucket by bucket.
    pub fn rules(&self) -> impl Iterator<Item = &SnapshotRule> {
        self.by_weekday.iter().flatten()
    }

    pub fn rule_count(&self) -> usize {
        self.by_weekday.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_weekday.iter().all(Vec::is_empty)
    }
}

impl Default for RuleSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}
