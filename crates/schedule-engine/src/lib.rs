//! # schedule-engine
//!
//! Deterministic weekday schedule resolution.
//!
//! Given recurring weekly rules ("open gym every Wednesday 18:00-21:00") and
//! per-date exclusions ("not on Oct 21"), the engine answers which rules are
//! in effect on each day of a date window, and whether a day is open,
//! cancelled, or simply has nothing scheduled.
//!
//! ## Modules
//!
//! - [`model`] — Rule, owner group and exclusion records from the rule store
//! - [`snapshot`] — Weekday-grouped, exclusion-attached snapshot of the store
//! - [`resolver`] — Window resolution over a snapshot
//! - [`views`] — Week page, location page and owner-group windows for the presentation layer
//! - [`clock`] — The injectable source of "today"
//! - [`calendar`] — Weekday numbering and date parsing
//! - [`error`] — Error types

pub mod calendar;
pub mod clock;
pub mod error;
pub mod model;
pub mod resolver;
pub mod snapshot;
pub mod views;

pub use calendar::{parse_anchor_date, weekday_number, ResolveOptions, WeekStartDay};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::ScheduleError;
pub use model::{ExclusionDate, OwnerGroupRef, RuleId, ScheduleRule};
pub use resolver::{
    resolve_window, resolve_window_with_filter, resolve_window_with_options, ResolvedDay,
    ResolvedEntry,
};
pub use snapshot::{RuleSnapshot, SnapshotRule};
pub use views::{
    location_view, next_open_day, owner_group_view, week_view, DisplayDay, DisplayEntry,
    LocationDay, WeekView,
};
