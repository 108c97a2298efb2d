//! Records supplied by the rule store.
//!
//! These are read-only inputs: the store owns and mutates them, the resolver
//! only reads a materialized copy (see [`RuleSnapshot`](crate::snapshot::RuleSnapshot)).

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::calendar::serde_date;

/// Identifier of a [`ScheduleRule`].
pub type RuleId = u64;

/// Weak reference to the group (team, crew) that owns a rule.
///
/// Carries cached display fields so views never have to reach back into the
/// store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerGroupRef {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub short_code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A recurring weekly schedule entry tied to one weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRule {
    pub id: RuleId,
    /// 0–6, numbered from the snapshot's [`WeekStartDay`](crate::calendar::WeekStartDay).
    pub weekday: u8,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Display only.
    pub start_time: NaiveTime,
    /// Display only.
    pub end_time: NaiveTime,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Computed by the store; a set flag removes the rule from resolution for good.
    #[serde(default)]
    pub is_ended: bool,
    #[serde(default, deserialize_with = "serde_date::option::deserialize")]
    pub valid_from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "serde_date::option::deserialize")]
    pub valid_until: Option<NaiveDate>,
    #[serde(default)]
    pub owner_group: Option<OwnerGroupRef>,
    #[serde(default)]
    pub location_id: Option<u64>,
}

fn default_active() -> bool {
    true
}

impl ScheduleRule {
    /// An active, unbounded rule with no owner group or location.
    pub fn new(
        id: RuleId,
        weekday: u8,
        name: impl Into<String>,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Self {
        Self {
            id,
            weekday,
            name: name.into(),
            description: None,
            start_time,
            end_time,
            active: true,
            is_ended: false,
            valid_from: None,
            valid_until: None,
            owner_group: None,
            location_id: None,
        }
    }

    /// Whether the rule applies on `date`, ignoring per-date exclusions.
    ///
    /// Both bounds are inclusive; a missing bound leaves that side open.
    /// The weekday is not checked here, the snapshot buckets by weekday.
    pub fn is_eligible_on(&self, date: NaiveDate) -> bool {
        if !self.active || self.is_ended {
            return false;
        }
        if self.valid_from.is_some_and(|from| date < from) {
            return false;
        }
        if self.valid_until.is_some_and(|until| date > until) {
            return false;
        }
        true
    }
}

/// A single calendar date on which one rule is suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExclusionDate {
    pub rule_id: RuleId,
    #[serde(deserialize_with = "serde_date::deserialize")]
    pub date: NaiveDate,
}

impl ExclusionDate {
    pub fn new(rule_id: RuleId, date: NaiveDate) -> Self {
        Self { rule_id, date }
    }
}
