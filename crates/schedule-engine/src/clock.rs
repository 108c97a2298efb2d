//! The single source of "today".
//!
//! Resolution itself never reads the clock. Callers that need to anchor a
//! window at the current date go through a [`Clock`], so tests can pin the
//! date with [`FixedClock`].

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

use crate::error::{Result, ScheduleError};

pub trait Clock {
    /// The current calendar date.
    fn today(&self) -> NaiveDate;
}

/// Wall clock, read in a fixed IANA timezone.
///
/// "Today" is the local date in `timezone`, so a site in Europe/Berlin rolls
/// over at local midnight rather than at 00:00 UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemClock {
    pub timezone: Tz,
}

impl SystemClock {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// Build from an IANA name such as `"Europe/Berlin"`.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidTimezone`] if the name is not a known zone.
    pub fn from_name(name: &str) -> Result<Self> {
        name.trim()
            .parse::<Tz>()
            .map(Self::new)
            .map_err(|_| ScheduleError::InvalidTimezone(format!("'{}'", name)))
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }
}

/// A clock stuck on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
